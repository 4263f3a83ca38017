//! Event listing.
//!
//! - GET /api/events - every event, camelCase fields

use crate::WebResult;
use crate::state::AppState;
use axum::{Json, extract::State};
use boxoffice_core::{Event, SeatLedger};

/// List every event.
///
/// ```bash
/// curl http://localhost:8080/api/events
/// # [{"id":1,"name":"Ultimate Music Experience","description":"...",
/// #   "date":"2025-03-25T19:00:00Z","venue":"Grand Arena, Downtown","duration":180}]
/// ```
///
/// # Errors
///
/// 503 when the ledger is unreachable, 500 on any other read failure.
pub async fn list_events<L: SeatLedger>(
    State(state): State<AppState<L>>,
) -> WebResult<Json<Vec<Event>>> {
    let events = state.query.list_events().await?;
    Ok(Json(events))
}
