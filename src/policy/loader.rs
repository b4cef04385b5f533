use std::fs;
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;

use crate::domain::{CalculatorConfig, ConfigurationError};
use crate::engine::{CalculationOverride, Calculator};

/// Errors that can occur during configuration loading.
#[derive(Error, Debug)]
pub enum PolicyError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigurationError),
}

/// Load and validate a calculator configuration from a YAML file.
pub fn load_config(path: impl AsRef<Path>) -> Result<CalculatorConfig, PolicyError> {
    let content = fs::read_to_string(path)?;
    let config: CalculatorConfig = serde_yaml::from_str(&content)?;

    if config.version.is_empty() {
        return Err(PolicyError::Validation(
            "Config version cannot be empty".to_string(),
        ));
    }

    config.validate()?;

    Ok(config)
}

/// Loads the calculator configuration and builds calculators from it.
#[derive(Debug, Clone)]
pub struct PolicyLoader {
    config_path: String,
    policy_override: Option<String>,
    strategy: Option<Arc<dyn CalculationOverride>>,
}

impl PolicyLoader {
    /// Create a new loader for the given config file.
    pub fn new(config_path: impl Into<String>) -> Self {
        PolicyLoader {
            config_path: config_path.into(),
            policy_override: None,
            strategy: None,
        }
    }

    /// Select an LVR policy by name instead of the file's `active_lvr_policy`.
    pub fn with_policy_override(mut self, policy: Option<String>) -> Self {
        self.policy_override = policy;
        self
    }

    /// Attach an override strategy to every calculator this loader builds.
    pub fn with_strategy(mut self, strategy: Arc<dyn CalculationOverride>) -> Self {
        self.strategy = Some(strategy);
        self
    }

    /// Load the config and build a calculator from it.
    pub fn load(&self) -> Result<(CalculatorConfig, Calculator), PolicyError> {
        let config = self.load_config()?;
        let mut calculator = Calculator::new(&config)?;

        if let Some(strategy) = &self.strategy {
            calculator = calculator.with_override(Arc::clone(strategy));
        }

        Ok((config, calculator))
    }

    /// Load only the config, with the policy override applied.
    pub fn load_config(&self) -> Result<CalculatorConfig, PolicyError> {
        let mut config = load_config(&self.config_path)?;

        if let Some(policy) = &self.policy_override {
            config.active_lvr_policy = policy.clone();
            config.validate()?;
        }

        Ok(config)
    }

    /// Get the config file path.
    pub fn config_path(&self) -> &str {
        &self.config_path
    }
}
