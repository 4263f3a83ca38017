//! Seat map endpoint.
//!
//! - GET /api/seats/:event_id - every seat of one event plus availability counts

use crate::error::AppError;
use crate::extractors::ApiPath;
use crate::state::AppState;
use axum::{Json, extract::State};
use boxoffice_core::{EventId, SeatId, SeatLedger, SeatMap, SeatStatus, SectionId};
use serde::Serialize;
use std::collections::BTreeMap;

/// One seat as shown on the seat map.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SeatResponse {
    /// Seat id
    pub id: SeatId,
    /// Section id
    pub section_id: SectionId,
    /// Section name
    pub section: String,
    /// Row label
    pub row: String,
    /// Number within the row
    pub number: i32,
    /// Row + number
    pub seat_code: String,
    /// `available` or `booked`
    pub status: SeatStatus,
    /// Price in currency units
    pub price: f64,
    /// Section VIP flag
    pub is_vip: bool,
}

/// Seat map of one event.
///
/// `availableSeats` and `bookedSeats` are derived from the same snapshot as
/// `seats`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SeatMapResponse {
    /// Number of seats
    pub total_seats: usize,
    /// Number of seats still available
    pub available_seats: usize,
    /// Seats ordered by section, row and number
    pub seats: Vec<SeatResponse>,
    /// Booked seat ids, each mapped to `true`
    pub booked_seats: BTreeMap<SeatId, bool>,
}

impl From<SeatMap> for SeatMapResponse {
    fn from(map: SeatMap) -> Self {
        let total_seats = map.total();
        let available_seats = map.available();
        let booked_seats = map.booked_ids().map(|id| (id, true)).collect();

        let seats = map
            .seats
            .into_iter()
            .map(|view| SeatResponse {
                id: view.seat.id,
                section_id: view.seat.section_id,
                section: view.section,
                row: view.seat.row,
                number: view.seat.number,
                seat_code: view.seat.code,
                status: view.seat.status,
                price: view.seat.price.as_units(),
                is_vip: view.is_vip,
            })
            .collect();

        Self {
            total_seats,
            available_seats,
            seats,
            booked_seats,
        }
    }
}

/// Seat map of one event.
///
/// ```bash
/// curl http://localhost:8080/api/seats/1
/// # {"totalSeats":245,"availableSeats":243,"seats":[...],"bookedSeats":{"7":true,"8":true}}
/// ```
///
/// # Errors
///
/// 400 for a non-numeric or non-positive id, 404 for an unknown event, 503 when the ledger is
/// unreachable.
pub async fn get_seat_map<L: SeatLedger>(
    State(state): State<AppState<L>>,
    ApiPath(event_id): ApiPath<i64>,
) -> Result<Json<SeatMapResponse>, AppError> {
    if event_id < 1 {
        return Err(AppError::bad_request(format!("Invalid event id {event_id}")));
    }
    let map = state.query.seat_map(EventId::new(event_id)).await?;
    Ok(Json(map.into()))
}
