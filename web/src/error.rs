//! Error types for web handlers.
//!
//! [`AppError`] bridges the booking and query error enums to HTTP responses:
//!
//! | error | status | code |
//! |---|---|---|
//! | `BookingError::BadRequest`, malformed JSON | 400 | `BAD_REQUEST` |
//! | `QueryError::EventNotFound` | 404 | `NOT_FOUND` |
//! | `BookingError::SeatsUnavailable` | 409 | `SEATS_UNAVAILABLE` |
//! | `Busy`, `StoreUnavailable` | 503 | `SERVICE_UNAVAILABLE` |
//! | `CommitFailed`, `QueryError::Failed` | 500 | `INTERNAL_SERVER_ERROR` |

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use boxoffice_core::{BookingError, QueryError};
use serde::Serialize;
use std::fmt;

/// Application error type for web handlers.
///
/// # Examples
///
/// ```ignore
/// async fn handler(State(state): State<AppState<L>>) -> Result<Json<SeatMapResponse>, AppError> {
///     let map = state.query.seat_map(event_id).await?;
///     Ok(Json(SeatMapResponse::from(map)))
/// }
/// ```
#[derive(Debug)]
pub struct AppError {
    /// HTTP status code
    status: StatusCode,
    /// Error message (user-facing)
    message: String,
    /// Error code (for client error handling)
    code: String,
    /// Conflicting seat codes, for `SEATS_UNAVAILABLE`
    seats: Option<Vec<String>>,
    /// Internal error (for logging, not exposed to client)
    source: Option<anyhow::Error>,
}

impl AppError {
    /// Create a new application error.
    #[must_use]
    pub const fn new(status: StatusCode, message: String, code: String) -> Self {
        Self {
            status,
            message,
            code,
            seats: None,
            source: None,
        }
    }

    /// Attach the underlying error for logging.
    #[must_use]
    pub fn with_source(mut self, source: anyhow::Error) -> Self {
        self.source = Some(source);
        self
    }

    /// Create a 400 Bad Request error.
    #[must_use]
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(
            StatusCode::BAD_REQUEST,
            message.into(),
            "BAD_REQUEST".to_string(),
        )
    }

    /// Create a 404 Not Found error.
    #[must_use]
    pub fn not_found(resource: impl fmt::Display, id: impl fmt::Display) -> Self {
        Self::new(
            StatusCode::NOT_FOUND,
            format!("{resource} with id {id} not found"),
            "NOT_FOUND".to_string(),
        )
    }

    /// Create a 409 Conflict listing the seats that could not be claimed.
    #[must_use]
    pub fn seats_unavailable(seat_codes: Vec<String>) -> Self {
        let mut err = Self::new(
            StatusCode::CONFLICT,
            format!("Seats {} are not available", seat_codes.join(", ")),
            "SEATS_UNAVAILABLE".to_string(),
        );
        err.seats = Some(seat_codes);
        err
    }

    /// Create a 500 Internal Server Error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            message.into(),
            "INTERNAL_SERVER_ERROR".to_string(),
        )
    }

    /// Create a 503 Service Unavailable error.
    #[must_use]
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::new(
            StatusCode::SERVICE_UNAVAILABLE,
            message.into(),
            "SERVICE_UNAVAILABLE".to_string(),
        )
    }

    /// HTTP status this error maps to.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        self.status
    }

    /// Machine-readable error code.
    #[must_use]
    pub fn code(&self) -> &str {
        &self.code
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn std::error::Error + 'static))
    }
}

/// Error response body (JSON).
#[derive(Debug, Serialize)]
struct ErrorResponse {
    code: String,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    seats: Option<Vec<String>>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            match &self.source {
                Some(source) => tracing::error!(
                    status = %self.status,
                    code = %self.code,
                    message = %self.message,
                    error = %source,
                    "Request failed"
                ),
                None => tracing::error!(
                    status = %self.status,
                    code = %self.code,
                    message = %self.message,
                    "Request failed"
                ),
            }
        }

        let body = ErrorResponse {
            code: self.code,
            message: self.message,
            seats: self.seats,
        };

        (self.status, Json(body)).into_response()
    }
}

impl From<BookingError> for AppError {
    fn from(err: BookingError) -> Self {
        match err {
            BookingError::BadRequest(message) => Self::bad_request(message),
            BookingError::SeatsUnavailable { seat_codes } => Self::seats_unavailable(seat_codes),
            BookingError::Busy(_) => Self::unavailable("Seats are busy, please retry shortly")
                .with_source(anyhow::Error::new(err)),
            BookingError::StoreUnavailable(_) => {
                Self::unavailable("Booking is temporarily unavailable")
                    .with_source(anyhow::Error::new(err))
            }
            BookingError::CommitFailed(_) => {
                Self::internal("Booking could not be completed").with_source(anyhow::Error::new(err))
            }
        }
    }
}

impl From<QueryError> for AppError {
    fn from(err: QueryError) -> Self {
        match err {
            QueryError::EventNotFound(id) => Self::not_found("Event", id),
            QueryError::StoreUnavailable(_) => {
                Self::unavailable("Seat data is temporarily unavailable")
                    .with_source(anyhow::Error::new(err))
            }
            QueryError::Failed(_) => {
                Self::internal("Failed to load seat data").with_source(anyhow::Error::new(err))
            }
        }
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        Self::internal("An internal error occurred").with_source(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use boxoffice_core::EventId;

    #[test]
    fn test_error_display() {
        let err = AppError::bad_request("Invalid booking data");
        assert_eq!(err.to_string(), "[BAD_REQUEST] Invalid booking data");
    }

    #[test]
    fn conflict_lists_seat_codes() {
        let err = AppError::from(BookingError::SeatsUnavailable {
            seat_codes: vec!["A1".to_string(), "A3".to_string()],
        });
        assert_eq!(err.status, StatusCode::CONFLICT);
        assert_eq!(err.code, "SEATS_UNAVAILABLE");
        assert_eq!(err.message, "Seats A1, A3 are not available");
        assert_eq!(err.seats, Some(vec!["A1".to_string(), "A3".to_string()]));
    }

    #[test]
    fn infrastructure_failures_are_5xx() {
        let busy = AppError::from(BookingError::Busy("lock timeout".to_string()));
        assert_eq!(busy.status, StatusCode::SERVICE_UNAVAILABLE);
        assert!(busy.source.is_some());

        let down = AppError::from(BookingError::StoreUnavailable("refused".to_string()));
        assert_eq!(down.status, StatusCode::SERVICE_UNAVAILABLE);

        let failed = AppError::from(BookingError::CommitFailed("serialization".to_string()));
        assert_eq!(failed.status, StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn unknown_event_is_404() {
        let err = AppError::from(QueryError::EventNotFound(EventId::new(42)));
        assert_eq!(err.status, StatusCode::NOT_FOUND);
        assert_eq!(err.to_string(), "[NOT_FOUND] Event with id 42 not found");
    }

    #[test]
    fn internal_detail_is_not_exposed() {
        let err = AppError::from(BookingError::CommitFailed("relation seats is locked".to_string()));
        assert!(!err.message.contains("relation"));
    }
}
