//! # Boxoffice Testing
//!
//! Testing utilities for the boxoffice booking backend.
//!
//! This crate provides:
//! - An in-memory [`SeatLedger`](boxoffice_core::SeatLedger) with real per-seat locking
//! - Mock implementations of the environment traits
//! - Fixture builders for events, sections and seats
//!
//! ## Example
//!
//! ```ignore
//! use boxoffice_testing::{EventFixture, InMemorySeatLedger, test_clock};
//!
//! #[tokio::test]
//! async fn books_a_seat() {
//!     let ledger = Arc::new(InMemorySeatLedger::new());
//!     let seeded = EventFixture::scenario().seed(&ledger);
//!     let engine = BookingEngine::new(ledger.clone(), Arc::new(test_clock()), ...);
//!
//!     engine.create_booking(request_for(seeded.seat_ids_for(&["A1"]))).await.unwrap();
//!     assert_eq!(ledger.booked_seat_count(), 1);
//! }
//! ```

use boxoffice_core::environment::{Clock, ReferenceGenerator};
use chrono::{DateTime, Utc};

pub mod fixtures;
pub mod ledger;

/// Mock implementations for testing.
pub mod mocks {
    use super::{Clock, DateTime, ReferenceGenerator, Utc};
    use boxoffice_core::{BookingReference, Customer, Money, NewBooking};
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::sync::{Mutex, PoisonError};

    /// Fixed clock for deterministic tests
    ///
    /// Always returns the same time, making tests reproducible.
    ///
    /// # Example
    ///
    /// ```
    /// use boxoffice_testing::mocks::FixedClock;
    /// use boxoffice_core::environment::Clock;
    /// use chrono::Utc;
    ///
    /// let clock = FixedClock::new(Utc::now());
    /// assert_eq!(clock.now(), clock.now());
    /// ```
    #[derive(Debug, Clone)]
    pub struct FixedClock {
        time: DateTime<Utc>,
    }

    impl FixedClock {
        /// Create a new fixed clock with the given time
        #[must_use]
        pub const fn new(time: DateTime<Utc>) -> Self {
            Self { time }
        }
    }

    impl Clock for FixedClock {
        fn now(&self) -> DateTime<Utc> {
            self.time
        }
    }

    /// Create a default fixed clock for tests (2025-01-01 00:00:00 UTC)
    #[must_use]
    pub fn test_clock() -> FixedClock {
        FixedClock::new(DateTime::<Utc>::from_timestamp(1_735_689_600, 0).unwrap_or_default())
    }

    /// Predictable references: `TKT-00000001`, `TKT-00000002`, ...
    #[derive(Debug, Default)]
    pub struct SequentialReferenceGenerator {
        next: AtomicU64,
    }

    impl SequentialReferenceGenerator {
        /// Start at `TKT-00000001`.
        #[must_use]
        pub const fn new() -> Self {
            Self {
                next: AtomicU64::new(0),
            }
        }
    }

    impl ReferenceGenerator for SequentialReferenceGenerator {
        fn next_reference(&self) -> BookingReference {
            let n = self.next.fetch_add(1, Ordering::SeqCst) + 1;
            BookingReference::new(format!("TKT-{n:08}"))
        }
    }

    /// Hands out a fixed script of references, then falls back to sequential ones.
    ///
    /// Used to force reference collisions.
    #[derive(Debug)]
    pub struct ScriptedReferenceGenerator {
        script: Mutex<VecDeque<String>>,
        fallback: SequentialReferenceGenerator,
    }

    impl ScriptedReferenceGenerator {
        /// Yield `references` in order before falling back.
        #[must_use]
        pub fn new<I, S>(references: I) -> Self
        where
            I: IntoIterator<Item = S>,
            S: Into<String>,
        {
            Self {
                script: Mutex::new(references.into_iter().map(Into::into).collect()),
                fallback: SequentialReferenceGenerator::new(),
            }
        }
    }

    impl ReferenceGenerator for ScriptedReferenceGenerator {
        fn next_reference(&self) -> BookingReference {
            let scripted = self
                .script
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .pop_front();
            scripted.map_or_else(|| self.fallback.next_reference(), BookingReference::new)
        }
    }

    /// A booking row ready for `insert_booking`.
    #[must_use]
    pub fn new_booking(reference: &str, total: Money) -> NewBooking {
        NewBooking {
            reference: BookingReference::new(reference),
            customer: test_customer(),
            ticket_type: "standard".to_string(),
            total,
            created_at: test_clock().now(),
        }
    }

    /// A customer with plausible contact details.
    #[must_use]
    pub fn test_customer() -> Customer {
        Customer {
            name: "Ada Lovelace".to_string(),
            email: "ada@example.com".to_string(),
            phone: "+44 20 7946 0000".to_string(),
        }
    }
}

// Re-export commonly used items
pub use fixtures::{EventFixture, SeededEvent};
pub use ledger::{InMemorySeatLedger, InMemoryTransaction, LedgerOperation};
pub use mocks::{
    FixedClock, ScriptedReferenceGenerator, SequentialReferenceGenerator, test_clock,
    test_customer,
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_clock() {
        let clock = test_clock();
        assert_eq!(clock.now(), clock.now());
        assert_eq!(clock.now().to_rfc3339(), "2025-01-01T00:00:00+00:00");
    }

    #[test]
    fn scripted_references_fall_back_to_sequence() {
        let generator = ScriptedReferenceGenerator::new(["TKT-TAKEN001"]);
        assert_eq!(generator.next_reference().as_str(), "TKT-TAKEN001");
        assert_eq!(generator.next_reference().as_str(), "TKT-00000001");
    }
}
