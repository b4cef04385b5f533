use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

use crate::leads::RetryPolicy;

/// Borrowing capacity service configuration.
#[derive(Debug, Clone, Parser)]
#[command(name = "borrowr")]
#[command(about = "Reverse-mortgage borrowing capacity engine with lead capture")]
pub struct Config {
    /// HTTP server listen address
    #[arg(long, default_value = "0.0.0.0:8080", env = "BORROWR_LISTEN_ADDR")]
    pub listen_addr: String,

    /// Path to calculator config YAML file
    #[arg(long, default_value = "calculator.yaml", env = "BORROWR_CONFIG_PATH")]
    pub config_path: PathBuf,

    /// LVR policy name, overriding `active_lvr_policy` in the config file
    #[arg(long, env = "BORROWR_LVR_POLICY")]
    pub lvr_policy: Option<String>,

    /// Config reload check interval in seconds
    #[arg(long, default_value = "30", env = "BORROWR_CONFIG_RELOAD_SECS")]
    pub config_reload_secs: u64,

    /// Latency budget in milliseconds for the calculate endpoint
    #[arg(long, default_value = "100", env = "BORROWR_LATENCY_BUDGET_MS")]
    pub latency_budget_ms: u64,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info", env = "RUST_LOG")]
    pub log_level: String,

    /// Emit logs as JSON lines
    #[arg(long, default_value = "false", env = "BORROWR_LOG_JSON")]
    pub log_json: bool,

    /// Require a phone number on lead submissions
    #[arg(long, default_value = "false", env = "BORROWR_REQUIRE_PHONE")]
    pub require_phone: bool,

    /// Maximum delivery attempts per follow-up sink
    #[arg(long, default_value = "5", env = "BORROWR_FOLLOWUP_MAX_ATTEMPTS")]
    pub followup_max_attempts: u32,

    /// Initial follow-up retry backoff in milliseconds
    #[arg(long, default_value = "200", env = "BORROWR_FOLLOWUP_INITIAL_BACKOFF_MS")]
    pub followup_initial_backoff_ms: u64,

    /// Upper bound on follow-up retry backoff in milliseconds
    #[arg(long, default_value = "10000", env = "BORROWR_FOLLOWUP_MAX_BACKOFF_MS")]
    pub followup_max_backoff_ms: u64,

    /// Enable graceful shutdown
    #[arg(long, default_value = "true", env = "BORROWR_GRACEFUL_SHUTDOWN")]
    pub graceful_shutdown: bool,

    /// Graceful shutdown timeout in seconds
    #[arg(long, default_value = "30", env = "BORROWR_SHUTDOWN_TIMEOUT_SECS")]
    pub shutdown_timeout_secs: u64,
}

impl Config {
    /// Get config reload interval as Duration.
    pub fn config_reload_interval(&self) -> Duration {
        Duration::from_secs(self.config_reload_secs)
    }

    /// Get shutdown timeout as Duration.
    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.shutdown_timeout_secs)
    }

    /// Retry policy for follow-up sinks.
    pub fn followup_retry(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.followup_max_attempts.max(1),
            initial_backoff: Duration::from_millis(self.followup_initial_backoff_ms),
            max_backoff: Duration::from_millis(self.followup_max_backoff_ms),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            listen_addr: "0.0.0.0:8080".to_string(),
            config_path: PathBuf::from("calculator.yaml"),
            lvr_policy: None,
            config_reload_secs: 30,
            latency_budget_ms: 100,
            log_level: "info".to_string(),
            log_json: false,
            require_phone: false,
            followup_max_attempts: 5,
            followup_initial_backoff_ms: 200,
            followup_max_backoff_ms: 10_000,
            graceful_shutdown: true,
            shutdown_timeout_secs: 30,
        }
    }
}
