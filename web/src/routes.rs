//! Router assembly.

use crate::handlers::{bookings, events, health_check, readiness_check, seats, websocket};
use crate::middleware::correlation_id_layer;
use crate::state::AppState;
use axum::{Router, routing::get, routing::post};
use boxoffice_core::SeatLedger;
use std::path::Path;
use tower_http::{cors::CorsLayer, services::ServeDir, trace::TraceLayer};

/// Build the application router.
///
/// ```text
/// GET  /health              liveness
/// GET  /ready               ledger ping
/// GET  /api/events          event list
/// GET  /api/seats/:event_id seat map
/// POST /api/bookings        create booking
/// GET  /ws                  seat_update stream
/// *    (fallback)           files under `static_dir`, when given
/// ```
pub fn build_router<L: SeatLedger>(state: AppState<L>, static_dir: Option<&Path>) -> Router {
    let api_routes = Router::new()
        .route("/events", get(events::list_events::<L>))
        .route("/seats/:event_id", get(seats::get_seat_map::<L>))
        .route("/bookings", post(bookings::create_booking::<L>));

    let router = Router::new()
        // Health checks
        .route("/health", get(health_check))
        .route("/ready", get(readiness_check::<L>))
        .route("/ws", get(websocket::handle::<L>))
        .nest("/api", api_routes);

    let router = match static_dir {
        Some(dir) => router.fallback_service(ServeDir::new(dir)),
        None => router,
    };

    router
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .layer(correlation_id_layer())
        .with_state(state)
}
