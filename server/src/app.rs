//! Component wiring and lifecycle.

use crate::config::Config;
use anyhow::Context;
use axum::{Router, routing::get};
use boxoffice_core::environment::SystemClock;
use boxoffice_postgres::{PostgresSeatLedger, seed_demo_event};
use boxoffice_runtime::metrics::MetricsExporter;
use boxoffice_runtime::{AvailabilityNotifier, BookingEngine, RandomReferenceGenerator, SeatQuery};
use boxoffice_web::{AppState, build_router};
use std::future::IntoFuture;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::signal;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

/// Connect, migrate, seed, serve until a shutdown signal, then drain.
///
/// # Errors
///
/// Returns an error if the ledger cannot be reached or migrated, a listener
/// cannot be bound, or the server fails.
pub async fn run(config: Config) -> anyhow::Result<()> {
    let mut exporter = MetricsExporter::new();
    exporter.install()?;
    let metrics_task = match config.metrics_addr() {
        Some(addr) => Some(spawn_metrics_listener(&addr, exporter).await?),
        None => None,
    };

    info!("Connecting to seat ledger database...");
    let ledger = PostgresSeatLedger::connect(&config.database.url, &config.ledger_options())
        .await
        .context("connecting to the seat ledger")?;
    ledger.migrate().await.context("running migrations")?;
    info!("Seat ledger ready");

    if config.seed_demo_data {
        match seed_demo_event(&ledger).await.context("seeding demo data")? {
            Some(event_id) => info!(event_id = %event_id, "Demo event seeded"),
            None => info!("Ledger already has events, skipping demo seed"),
        }
    }
    let ledger = Arc::new(ledger);

    let notifier = Arc::new(AvailabilityNotifier::new(&config.notifier_config()));
    let (notifier_handle, dispatcher) = notifier.spawn_dispatcher(config.notifier.queue_capacity);

    let engine = BookingEngine::new(
        Arc::clone(&ledger),
        Arc::new(SystemClock),
        Arc::new(RandomReferenceGenerator),
        notifier_handle,
        config.booking_config(),
    );
    let state = AppState::new(engine, SeatQuery::new(Arc::clone(&ledger)), notifier);
    let app = build_router(state, config.server.static_dir.as_deref());

    let addr = config.http_addr();
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("binding {addr}"))?;
    info!(address = %addr, "HTTP server listening");

    serve_until_shutdown(listener, app, config.shutdown_timeout()).await?;

    // The router owned every NotifierHandle; the dispatcher drains and exits.
    if tokio::time::timeout(config.shutdown_timeout(), dispatcher)
        .await
        .is_err()
    {
        warn!("Availability dispatcher did not stop in time");
    }

    ledger.pool().close().await;
    if let Some(task) = metrics_task {
        task.abort();
    }

    info!("Server stopped");
    Ok(())
}

/// Serve until a shutdown signal. In-flight requests get `drain_timeout` to
/// finish; long-lived `/ws` connections are cut after that.
async fn serve_until_shutdown(
    listener: TcpListener,
    app: Router,
    drain_timeout: std::time::Duration,
) -> anyhow::Result<()> {
    let (signalled_tx, mut signalled_rx) = watch::channel(false);

    let server = axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            shutdown_signal().await;
            let _ = signalled_tx.send(true);
        })
        .into_future();

    let deadline = async move {
        if signalled_rx.wait_for(|signalled| *signalled).await.is_ok() {
            tokio::time::sleep(drain_timeout).await;
        } else {
            std::future::pending::<()>().await;
        }
    };

    tokio::select! {
        result = server => result.context("HTTP server failed")?,
        () = deadline => warn!(
            timeout_secs = drain_timeout.as_secs(),
            "Shutdown timeout elapsed, closing remaining connections"
        ),
    }
    Ok(())
}

/// Serve `GET /metrics` in Prometheus text format on its own listener.
async fn spawn_metrics_listener(
    addr: &str,
    exporter: MetricsExporter,
) -> anyhow::Result<JoinHandle<()>> {
    let exporter = Arc::new(exporter);
    let app = Router::new().route(
        "/metrics",
        get(move || {
            let exporter = Arc::clone(&exporter);
            async move { exporter.render().unwrap_or_default() }
        }),
    );

    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding metrics listener {addr}"))?;
    info!("Metrics server started - available at http://{addr}/metrics");

    Ok(tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            error!(error = %e, "Metrics server failed");
        }
    }))
}

/// Resolves on Ctrl+C or SIGTERM.
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
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            info!("Received Ctrl+C signal");
        }
        () = terminate => {
            info!("Received SIGTERM signal");
        }
    }
}
