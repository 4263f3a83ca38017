//! Booking endpoint.
//!
//! - POST /api/bookings - claim a set of seats atomically

use crate::error::AppError;
use crate::extractors::ApiJson;
use crate::middleware::CorrelationId;
use crate::state::AppState;
use axum::{Json, extract::State, http::StatusCode};
use boxoffice_core::{Booking, BookingRequest, Customer, SeatId, SeatLedger};
use serde::{Deserialize, Serialize};
use tracing::{Instrument, info_span};

/// Request to book seats.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateBookingRequest {
    /// Customer name
    #[serde(default)]
    pub customer_name: String,
    /// Customer email
    #[serde(default)]
    pub customer_email: String,
    /// Customer phone
    #[serde(default)]
    pub customer_phone: String,
    /// Ticket type tag
    #[serde(default)]
    pub ticket_type: String,
    /// Seats to claim
    pub seat_ids: Vec<SeatId>,
}

impl From<CreateBookingRequest> for BookingRequest {
    fn from(request: CreateBookingRequest) -> Self {
        Self {
            customer: Customer {
                name: request.customer_name,
                email: request.customer_email,
                phone: request.customer_phone,
            },
            ticket_type: request.ticket_type,
            seat_ids: request.seat_ids,
        }
    }
}

/// Response after a committed booking.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateBookingResponse {
    /// Success message
    pub message: String,
    /// Booking reference
    pub booking_id: String,
    /// Customer name
    pub customer_name: String,
    /// Ticket type tag
    pub ticket_type: String,
    /// Codes of the booked seats
    pub seats: Vec<String>,
    /// Sum of the seat prices, in currency units
    pub total_amount: f64,
}

impl From<Booking> for CreateBookingResponse {
    fn from(booking: Booking) -> Self {
        Self {
            message: "Booking created successfully".to_string(),
            seats: booking.seat_codes(),
            booking_id: booking.reference.to_string(),
            customer_name: booking.customer.name,
            ticket_type: booking.ticket_type,
            total_amount: booking.total.as_units(),
        }
    }
}

/// Book every requested seat or none.
///
/// ```bash
/// curl -X POST http://localhost:8080/api/bookings \
///   -H "Content-Type: application/json" \
///   -d '{"customerName":"Ada","customerEmail":"ada@example.com",
///        "customerPhone":"555-0100","ticketType":"standard","seatIds":[1,2]}'
/// # 201 {"message":"Booking created successfully","bookingId":"TKT-7QK2M9XD",...}
/// # 409 {"code":"SEATS_UNAVAILABLE","message":"Seats A1 are not available","seats":["A1"]}
/// ```
///
/// # Errors
///
/// 400 for a malformed body or an empty seat list, 409 when any seat is taken,
/// 503 when the ledger is busy or unreachable, 500 when the commit fails.
pub async fn create_booking<L: SeatLedger>(
    State(state): State<AppState<L>>,
    correlation_id: CorrelationId,
    ApiJson(request): ApiJson<CreateBookingRequest>,
) -> Result<(StatusCode, Json<CreateBookingResponse>), AppError> {
    let span = info_span!(
        "create_booking",
        correlation_id = %correlation_id,
        seats = request.seat_ids.len(),
    );

    let booking = state
        .engine
        .create_booking(request.into())
        .instrument(span)
        .await?;

    Ok((StatusCode::CREATED, Json(booking.into())))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)] // Test code can use unwrap
mod tests {
    use super::*;

    #[test]
    fn request_accepts_camel_case_and_defaults_contact_fields() {
        let request: CreateBookingRequest =
            serde_json::from_str(r#"{"customerName":"Ada","seatIds":[3,1,3]}"#).unwrap();

        assert_eq!(request.customer_name, "Ada");
        assert_eq!(request.customer_email, "");
        assert_eq!(
            request.seat_ids,
            vec![SeatId::new(3), SeatId::new(1), SeatId::new(3)]
        );
    }

    #[test]
    fn seat_ids_are_required() {
        assert!(serde_json::from_str::<CreateBookingRequest>(r#"{"customerName":"Ada"}"#).is_err());
    }
}
