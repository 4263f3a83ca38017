//! boxoffice HTTP server.
//!
//! # Usage
//!
//! ```bash
//! # Start PostgreSQL
//! docker run -d -p 5432:5432 -e POSTGRES_PASSWORD=postgres -e POSTGRES_DB=ticketing_db postgres:16
//!
//! # Run server
//! cargo run --bin boxoffice
//! ```

use boxoffice_server::{Config, run};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file
    let _ = dotenvy::dotenv();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "boxoffice=info,tower_http=debug,sqlx=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting boxoffice server");

    let config = Config::from_env();
    tracing::info!(
        http = %config.http_addr(),
        metrics = config.metrics_addr().as_deref().unwrap_or("disabled"),
        seed_demo_data = config.seed_demo_data,
        "Configuration loaded"
    );

    run(config).await
}
