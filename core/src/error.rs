//! Error taxonomy for the seat ledger, booking engine and query surface.
//!
//! Each layer has its own enum. Ledger failures are translated upwards so the
//! HTTP layer only has to distinguish client-correctable conditions
//! (bad input, conflict, not found) from infrastructure failures.

use crate::types::EventId;
use thiserror::Error;

/// Errors raised by a [`SeatLedger`](crate::ledger::SeatLedger) implementation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    /// The backing store could not be reached (connect, pool, I/O).
    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),

    /// A row lock could not be acquired within the lock timeout, or the
    /// store aborted the transaction to break a deadlock.
    #[error("Store busy: {0}")]
    Busy(String),

    /// The booking reference collided with an existing booking.
    #[error("Duplicate booking reference: {0}")]
    DuplicateReference(String),

    /// Any other statement failure.
    #[error("Ledger query failed: {0}")]
    Query(String),
}

/// Result type for ledger operations.
pub type LedgerResult<T> = Result<T, LedgerError>;

/// Errors returned by the booking engine.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BookingError {
    /// Malformed or empty request. Not retryable without a client fix.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// One or more seats are missing or already booked.
    #[error("Seats {} are not available", .seat_codes.join(", "))]
    SeatsUnavailable {
        /// Codes of the conflicting seats
        seat_codes: Vec<String>,
    },

    /// Lock wait exceeded or deadlock detected. Retry with backoff.
    #[error("Seat ledger busy: {0}")]
    Busy(String),

    /// Ledger unreachable. Retry with backoff.
    #[error("Seat ledger unavailable: {0}")]
    StoreUnavailable(String),

    /// The transaction could not be committed; nothing was written.
    #[error("Booking could not be committed: {0}")]
    CommitFailed(String),
}

impl BookingError {
    /// Whether the same request may succeed if simply retried later.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Busy(_) | Self::StoreUnavailable(_) | Self::CommitFailed(_)
        )
    }
}

impl From<LedgerError> for BookingError {
    fn from(err: LedgerError) -> Self {
        match err {
            LedgerError::StoreUnavailable(reason) => Self::StoreUnavailable(reason),
            LedgerError::Busy(reason) => Self::Busy(reason),
            LedgerError::DuplicateReference(reference) => {
                Self::CommitFailed(format!("booking reference {reference} already exists"))
            }
            LedgerError::Query(reason) => Self::CommitFailed(reason),
        }
    }
}

/// Errors returned by the read-only query surface.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum QueryError {
    /// No event with this id.
    #[error("Event {0} not found")]
    EventNotFound(EventId),

    /// Ledger unreachable or busy.
    #[error("Seat ledger unavailable: {0}")]
    StoreUnavailable(String),

    /// Any other read failure.
    #[error("Query failed: {0}")]
    Failed(String),
}

impl From<LedgerError> for QueryError {
    fn from(err: LedgerError) -> Self {
        match err {
            LedgerError::StoreUnavailable(reason) | LedgerError::Busy(reason) => {
                Self::StoreUnavailable(reason)
            }
            LedgerError::DuplicateReference(reason) | LedgerError::Query(reason) => {
                Self::Failed(reason)
            }
        }
    }
}
