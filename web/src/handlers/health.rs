//! Health check endpoints.
//!
//! Used by load balancers and orchestrators to decide whether the service is
//! alive and whether it should receive traffic.

use crate::error::AppError;
use crate::state::AppState;
use axum::{Json, extract::State, http::StatusCode};
use boxoffice_core::SeatLedger;
use serde::Serialize;

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Service status
    pub status: String,
    /// Service version
    pub version: String,
}

/// Liveness: 200 while the process is running. Does not touch the ledger.
///
/// ```bash
/// curl http://localhost:8080/health
/// # {"status":"ok","version":"0.1.0"}
/// ```
#[allow(clippy::unused_async)] // Axum handler signature requires async
pub async fn health_check() -> (StatusCode, Json<HealthResponse>) {
    (
        StatusCode::OK,
        Json(HealthResponse {
            status: "ok".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }),
    )
}

/// Readiness check response.
#[derive(Debug, Serialize)]
pub struct ReadinessResponse {
    /// Overall readiness status
    pub ready: bool,
    /// Ledger connectivity
    pub database: bool,
    /// Connected `/ws` observers
    pub observers: usize,
}

/// Readiness: 200 when the ledger answers a ping, 503 otherwise.
///
/// ```bash
/// curl http://localhost:8080/ready
/// # {"ready":true,"database":true,"observers":3}
/// ```
///
/// # Errors
///
/// [`AppError`] with 503 when the ledger is unreachable.
pub async fn readiness_check<L: SeatLedger>(
    State(state): State<AppState<L>>,
) -> Result<Json<ReadinessResponse>, AppError> {
    state.query.ping().await?;

    Ok(Json(ReadinessResponse {
        ready: true,
        database: true,
        observers: state.notifier.observer_count(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_simple_health_check() {
        let (status, Json(body)) = health_check().await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.status, "ok");
    }
}
