use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::interval;
use tracing::{info, warn};

use crate::engine::Calculator;
use crate::observability::MetricsRegistry;

use super::loader::{PolicyError, PolicyLoader};

/// Watch the calculator config and broadcast rebuilt calculators.
pub struct PolicyWatcher {
    loader: PolicyLoader,
    check_interval: Duration,
    last_version: Option<String>,
    metrics: Option<Arc<MetricsRegistry>>,
}

impl PolicyWatcher {
    /// Create a new config watcher.
    pub fn new(loader: PolicyLoader, check_interval: Duration) -> Self {
        PolicyWatcher {
            loader,
            check_interval,
            last_version: None,
            metrics: None,
        }
    }

    /// Count reloads and reload failures in the given registry.
    pub fn with_metrics(mut self, metrics: Arc<MetricsRegistry>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Start watching for config changes.
    ///
    /// The initial load must succeed; a service must not start with an
    /// invalid configuration. Later failures keep the current calculator.
    pub fn start(
        mut self,
    ) -> Result<(watch::Receiver<Arc<Calculator>>, tokio::task::JoinHandle<()>), PolicyError> {
        let (config, calculator) = self.loader.load()?;
        info!(
            version = %config.version,
            policy = %config.active_lvr_policy,
            "Loaded initial calculator config"
        );
        self.last_version = Some(config.version);

        let (tx, rx) = watch::channel(Arc::new(calculator));

        let handle = tokio::spawn(async move {
            let mut interval = interval(self.check_interval);
            // First tick completes immediately
            interval.tick().await;

            loop {
                interval.tick().await;

                match self.check_for_updates(&tx) {
                    Ok(true) => {
                        info!("Calculator config reloaded successfully");
                        if let Some(metrics) = &self.metrics {
                            metrics.record_config_reload(true);
                        }
                    }
                    Ok(false) => {}
                    Err(e) => {
                        warn!("Error checking for config updates: {}", e);
                        if let Some(metrics) = &self.metrics {
                            metrics.record_config_reload(false);
                        }
                    }
                }
            }
        });

        Ok((rx, handle))
    }

    /// Rebuild and broadcast when the config version changes.
    fn check_for_updates(&mut self, tx: &watch::Sender<Arc<Calculator>>) -> Result<bool, PolicyError> {
        let config = self.loader.load_config()?;

        if self.last_version.as_ref() == Some(&config.version) {
            return Ok(false);
        }

        let (config, calculator) = self.loader.load()?;

        info!(
            "Calculator config version changed: {:?} -> {}",
            self.last_version, config.version
        );

        self.last_version = Some(config.version);
        let _ = tx.send(Arc::new(calculator));

        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{BANDED_POLICY, LINEAR_POLICY};
    use crate::policy::loader::tests::config_yaml;
    use std::io::Write;
    use std::sync::atomic::Ordering;
    use tempfile::NamedTempFile;

    fn create_config_file(version: &str, active: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "{}", config_yaml(version, active)).unwrap();
        file
    }

    #[tokio::test]
    async fn test_watcher_initial_load() {
        let file = create_config_file("v1", LINEAR_POLICY);

        let watcher = PolicyWatcher::new(
            PolicyLoader::new(file.path().to_string_lossy()),
            Duration::from_secs(60),
        );
        let (rx, handle) = watcher.start().unwrap();

        let calculator = rx.borrow();
        assert_eq!(calculator.version(), "v1");
        assert_eq!(calculator.policy().name(), LINEAR_POLICY);

        handle.abort();
    }

    #[tokio::test]
    async fn test_watcher_initial_load_failure_is_fatal() {
        let file = create_config_file("v1", "unknown");

        let watcher = PolicyWatcher::new(
            PolicyLoader::new(file.path().to_string_lossy()),
            Duration::from_secs(60),
        );

        assert!(watcher.start().is_err());
    }

    #[tokio::test]
    async fn test_watcher_detects_changes() {
        let file = create_config_file("v1", LINEAR_POLICY);
        let path = file.path().to_path_buf();
        let metrics = Arc::new(MetricsRegistry::new());

        let watcher = PolicyWatcher::new(
            PolicyLoader::new(file.path().to_string_lossy()),
            Duration::from_millis(50),
        )
        .with_metrics(Arc::clone(&metrics));
        let (mut rx, handle) = watcher.start().unwrap();

        assert_eq!(rx.borrow().version(), "v1");

        tokio::time::sleep(Duration::from_millis(10)).await;
        std::fs::write(&path, config_yaml("v2", BANDED_POLICY)).unwrap();

        tokio::time::timeout(Duration::from_secs(1), rx.changed())
            .await
            .expect("Timeout waiting for config change")
            .unwrap();

        assert_eq!(rx.borrow().version(), "v2");
        assert_eq!(rx.borrow().policy().name(), BANDED_POLICY);
        assert_eq!(metrics.config_reloads_total.load(Ordering::Relaxed), 1);

        handle.abort();
    }

    #[tokio::test]
    async fn test_watcher_keeps_calculator_on_invalid_reload() {
        let file = create_config_file("v1", LINEAR_POLICY);
        let path = file.path().to_path_buf();
        let metrics = Arc::new(MetricsRegistry::new());

        let watcher = PolicyWatcher::new(
            PolicyLoader::new(file.path().to_string_lossy()),
            Duration::from_millis(20),
        )
        .with_metrics(Arc::clone(&metrics));
        let (rx, handle) = watcher.start().unwrap();

        std::fs::write(&path, config_yaml("v2", "unknown")).unwrap();
        tokio::time::sleep(Duration::from_millis(120)).await;

        assert_eq!(rx.borrow().version(), "v1");
        assert!(metrics.config_reload_errors.load(Ordering::Relaxed) >= 1);

        handle.abort();
    }
}
