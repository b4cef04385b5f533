use std::future::IntoFuture;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use clap::Parser;
use tokio::signal;
use tokio::sync::Notify;
use tracing::{error, info};

use borrowr::api::{create_router, AppState};
use borrowr::config::Config;
use borrowr::leads::{FollowUpDispatcher, LogNotifier};
use borrowr::observability::{init_tracing, MetricsRegistry};
use borrowr::policy::{PolicyLoader, PolicyWatcher};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::parse();

    init_tracing(&config.log_level, config.log_json);

    info!(
        version = env!("CARGO_PKG_VERSION"),
        "Starting borrowr calculation service"
    );

    let metrics = Arc::new(MetricsRegistry::new());

    let loader = PolicyLoader::new(config.config_path.to_string_lossy())
        .with_policy_override(config.lvr_policy.clone());

    // An invalid config at startup is fatal
    let watcher = PolicyWatcher::new(loader, config.config_reload_interval())
        .with_metrics(Arc::clone(&metrics));
    let (calculator_rx, policy_handle) = match watcher.start() {
        Ok(started) => started,
        Err(e) => {
            error!(path = %config.config_path.display(), error = %e, "Failed to load calculator config");
            return Err(e.into());
        }
    };

    let followups = FollowUpDispatcher::new(config.followup_retry(), Arc::clone(&metrics))
        .with_sink(Arc::new(LogNotifier::new("leads@localhost")));

    let state = Arc::new(AppState {
        calculator_rx,
        metrics,
        followups: followups.clone(),
        start_time: Instant::now(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        latency_budget_ms: config.latency_budget_ms,
        require_phone: config.require_phone,
    });

    let app = create_router(state);

    let addr: SocketAddr = config.listen_addr.parse()?;

    info!(addr = %addr, "Starting HTTP server");

    let listener = tokio::net::TcpListener::bind(addr).await?;

    if config.graceful_shutdown {
        let shutdown_timeout = config.shutdown_timeout();
        let signalled = Arc::new(Notify::new());
        let notifier = Arc::clone(&signalled);

        let server = axum::serve(listener, app).with_graceful_shutdown(async move {
            shutdown_signal().await;
            notifier.notify_one();
        });

        // In-flight requests get `shutdown_timeout` to drain after the signal
        let deadline = async {
            signalled.notified().await;
            tokio::time::sleep(shutdown_timeout).await;
        };

        tokio::select! {
            result = server.into_future() => result?,
            _ = deadline => error!(timeout_secs = shutdown_timeout.as_secs(), "Graceful shutdown timed out"),
        }
    } else {
        axum::serve(listener, app).await?;
    }

    info!("Shutting down...");
    policy_handle.abort();

    // Accepted leads still waiting on a sink get the same drain window
    let outcomes = followups.drain(config.shutdown_timeout()).await;
    info!(deliveries = outcomes.len(), "Lead deliveries drained");

    info!("Shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install signal handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Received shutdown signal");
}
