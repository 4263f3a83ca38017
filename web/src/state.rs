//! Application state for Axum handlers.

use boxoffice_core::SeatLedger;
use boxoffice_runtime::{AvailabilityNotifier, BookingEngine, SeatQuery};
use std::sync::Arc;

/// Application state shared across all HTTP handlers.
///
/// Generic over the ledger so the same router serves `PostgreSQL` in
/// production and the in-memory ledger in tests.
pub struct AppState<L: SeatLedger> {
    /// Write path
    pub engine: BookingEngine<L>,
    /// Read path
    pub query: SeatQuery<L>,
    /// Observer registry for `/ws`
    pub notifier: Arc<AvailabilityNotifier>,
}

impl<L: SeatLedger> AppState<L> {
    /// Bundle the booking engine, query surface and notifier.
    #[must_use]
    pub const fn new(
        engine: BookingEngine<L>,
        query: SeatQuery<L>,
        notifier: Arc<AvailabilityNotifier>,
    ) -> Self {
        Self {
            engine,
            query,
            notifier,
        }
    }
}

impl<L: SeatLedger> Clone for AppState<L> {
    fn clone(&self) -> Self {
        Self {
            engine: self.engine.clone(),
            query: self.query.clone(),
            notifier: Arc::clone(&self.notifier),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use boxoffice_testing::InMemorySeatLedger;

    #[test]
    fn test_state_is_clone() {
        // Axum requires Clone state
        fn assert_clone<T: Clone + Send + Sync + 'static>() {}
        assert_clone::<AppState<InMemorySeatLedger>>();
    }
}
