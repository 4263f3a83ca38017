//! # Boxoffice Core
//!
//! Domain types and traits for the boxoffice seat-booking backend.
//!
//! This crate has no I/O. It defines:
//!
//! - **Types**: events, sections, seats, bookings, money ([`types`])
//! - **Errors**: the ledger / booking / query taxonomy ([`error`])
//! - **Ledger**: the transactional seat store contract ([`ledger`])
//! - **Environment**: injected clock and reference generator ([`environment`])
//!
//! ## Architecture
//!
//! ```text
//! Query Surface ──read──▶ SeatLedger ◀──tx── Booking Engine ──handoff──▶ Notifier ──▶ observers
//! ```
//!
//! The ledger is the only mutable store; the booking engine is its only
//! writer; the notifier keeps nothing but the set of connected observers.

#![forbid(unsafe_code)]

pub mod error;
pub mod ledger;
pub mod types;

// Re-export commonly used types
pub use chrono::{DateTime, Utc};
pub use error::{BookingError, LedgerError, LedgerResult, QueryError};
pub use ledger::{LedgerTransaction, SeatLedger};
pub use types::{
    BookedSeat, Booking, BookingId, BookingReference, BookingRequest, Customer, Event, EventId,
    Money, NewBooking, Seat, SeatClaim, SeatId, SeatMap, SeatStatus, SeatUpdate, SeatView,
    Section, SectionId,
};

/// Environment module - Injected dependencies
///
/// Time and reference generation are behind traits so tests can pin them.
pub mod environment {
    use crate::types::BookingReference;
    use chrono::{DateTime, Utc};

    /// Clock trait - abstracts time operations for testability
    ///
    /// # Examples
    ///
    /// ```
    /// use boxoffice_core::environment::{Clock, SystemClock};
    ///
    /// let clock = SystemClock;
    /// let _now = clock.now();
    /// ```
    pub trait Clock: Send + Sync {
        /// Get the current time
        fn now(&self) -> DateTime<Utc>;
    }

    /// Wall-clock time.
    #[derive(Debug, Clone, Copy, Default)]
    pub struct SystemClock;

    impl Clock for SystemClock {
        fn now(&self) -> DateTime<Utc> {
            Utc::now()
        }
    }

    /// Source of booking references.
    ///
    /// Generators need not be collision-free on their own; the ledger's
    /// uniqueness constraint is the final arbiter and the booking engine
    /// retries with a fresh reference on collision.
    pub trait ReferenceGenerator: Send + Sync {
        /// Produce the next candidate reference.
        fn next_reference(&self) -> BookingReference;
    }
}

#[cfg(test)]
mod tests {
    use super::environment::{Clock, SystemClock};

    #[test]
    fn system_clock_moves_forward() {
        let clock = SystemClock;
        let first = clock.now();
        let second = clock.now();
        assert!(second >= first);
    }
}
