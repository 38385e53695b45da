//! driftd — the Driftboard daemon.
//!
//! Single binary that assembles all Driftboard subsystems:
//! - Registry (driftboard.toml)
//! - Fetch layer (reqwest transport + retry)
//! - Aggregation store + refresh orchestrator
//! - Background poll loop
//! - JSON API
//!
//! # Usage
//!
//! ```text
//! driftd serve --port 8090 --config driftboard.toml
//! ```

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use tokio::sync::watch;
use tracing::{debug, info};

use drift_agg::{AggregationStore, RefreshOrchestrator};
use drift_core::DashboardConfig;
use drift_fetch::{Fetcher, HttpTransport, RetryPolicy};

#[derive(Parser)]
#[command(name = "driftd", about = "Driftboard daemon")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Poll the configured matrix and serve the dashboard API.
    Serve {
        /// Port to listen on.
        #[arg(long, default_value = "8090")]
        port: u16,

        /// Path to the driftboard.toml config file.
        #[arg(long, default_value = "driftboard.toml")]
        config: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,driftd=debug,drift=debug".parse().unwrap()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Serve { port, config } => run_serve(port, config).await,
    }
}

async fn run_serve(port: u16, config_path: PathBuf) -> anyhow::Result<()> {
    info!("Driftboard daemon starting");

    // ── Initialize subsystems ──────────────────────────────────

    let config = DashboardConfig::from_file(&config_path)?;
    let registry = Arc::new(config.registry()?);
    info!(
        path = ?config_path,
        environments = registry.environments().len(),
        services = registry.services().len(),
        "registry loaded"
    );

    let transport = Arc::new(HttpTransport::new(config.fetch_timeout())?);
    let fetcher = Fetcher::new(transport, RetryPolicy::default());

    let store = Arc::new(AggregationStore::new(registry));
    let orchestrator = Arc::new(RefreshOrchestrator::new(
        store.clone(),
        fetcher,
        config.refresh_deadline(),
    ));
    info!(
        deadline_ms = config.refresh_deadline().as_millis() as u64,
        "refresh orchestrator initialized"
    );

    // ── Shutdown signal ────────────────────────────────────────

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    // ── Start background tasks ─────────────────────────────────

    // Initial fetch so the table has data before the first poll tick.
    let initial = orchestrator.clone();
    let initial_store = store.clone();
    tokio::spawn(async move {
        initial.refresh_all().await;
        let settled = initial_store.settled_count().await;
        info!(settled, "initial refresh settled");
    });

    let poll_handle = config.poll_interval().map(|interval| {
        info!(interval_secs = interval.as_secs(), "poll loop starting");
        tokio::spawn(run_poll_loop(
            orchestrator.clone(),
            interval,
            shutdown_rx.clone(),
        ))
    });

    // ── Start API server ───────────────────────────────────────

    let dashboard_state = drift_dashboard::DashboardState::new(store, orchestrator);
    let router = axum::Router::new().nest(
        "/api/v1",
        drift_dashboard::dashboard_router(dashboard_state),
    );
    let addr = SocketAddr::from(([0, 0, 0, 0], port));

    info!(%addr, "API server starting");

    let listener = tokio::net::TcpListener::bind(addr).await?;

    // Graceful shutdown on Ctrl-C.
    let server = axum::serve(listener, router).with_graceful_shutdown(async move {
        let _ = tokio::signal::ctrl_c().await;
        info!("shutdown signal received");
        let _ = shutdown_tx.send(true);
    });

    server.await?;

    if let Some(handle) = poll_handle {
        let _ = handle.await;
    }

    info!("Driftboard daemon stopped");
    Ok(())
}

/// Periodically re-drive the full matrix until shutdown. Ticks that
/// land while a refresh is already in flight (manual or initial) are
/// skipped rather than superseding it.
async fn run_poll_loop(
    orchestrator: Arc<RefreshOrchestrator>,
    interval: Duration,
    mut shutdown: watch::Receiver<bool>,
) {
    let refreshing = orchestrator.subscribe_refreshing();
    loop {
        tokio::select! {
            _ = tokio::time::sleep(interval) => {
                if *refreshing.borrow() {
                    debug!("refresh in flight; skipping poll tick");
                    continue;
                }
                debug!("poll tick");
                orchestrator.refresh_all().await;
            }
            _ = shutdown.changed() => {
                debug!("poll loop shutting down");
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use drift_core::{EnvironmentDescriptor, Registry, ServiceDescriptor};
    use drift_fetch::{BoxFuture, FetchError, Transport};
    use serde_json::{json, Value};
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Transport that counts calls and answers after a 30s delay.
    struct SlowTransport {
        calls: AtomicUsize,
    }

    impl Transport for SlowTransport {
        fn get<'a>(&'a self, _url: &'a str) -> BoxFuture<'a, Result<Value, FetchError>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Box::pin(async {
                tokio::time::sleep(Duration::from_secs(30)).await;
                Ok(json!({"status": "HEALTHY", "version": {"commit": "a1b2c3d4"}}))
            })
        }
    }

    fn test_registry() -> Arc<Registry> {
        let environments = vec![EnvironmentDescriptor {
            title: "Staging".to_string(),
            base_url: "https://admin-api.staging.example.com".to_string(),
            frontend_url: None,
        }];
        let services = vec![ServiceDescriptor {
            name: "admin".to_string(),
            display_name: "Admin API".to_string(),
            endpoint: "/healthcheck?detailed=true".to_string(),
            version_path: "version".to_string(),
        }];
        Arc::new(Registry::new(environments, services, None).unwrap())
    }

    #[tokio::test(start_paused = true)]
    async fn poll_loop_skips_ticks_while_a_refresh_is_in_flight() {
        let transport = Arc::new(SlowTransport {
            calls: AtomicUsize::new(0),
        });
        let store = Arc::new(AggregationStore::new(test_registry()));
        let fetcher = Fetcher::new(transport.clone(), RetryPolicy::default());
        let orchestrator = Arc::new(RefreshOrchestrator::new(
            store,
            fetcher,
            Duration::from_secs(60),
        ));

        // A manual refresh is already running when the loop starts.
        let manual = orchestrator.clone();
        tokio::spawn(async move { manual.refresh_all().await });

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let loop_handle = tokio::spawn(run_poll_loop(
            orchestrator,
            Duration::from_secs(7),
            shutdown_rx,
        ));

        // The 7s tick lands inside the manual refresh and is skipped.
        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(transport.calls.load(Ordering::SeqCst), 1);

        // The manual refresh settles at 30s; the 35s tick drives a new
        // session.
        tokio::time::sleep(Duration::from_secs(26)).await;
        assert_eq!(transport.calls.load(Ordering::SeqCst), 2);

        let _ = shutdown_tx.send(true);
        loop_handle.await.unwrap();
    }
}
