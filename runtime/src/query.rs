//! Read-only query surface over the seat ledger.
//!
//! Every read is a single ledger call, so a seat map's counts and seat list
//! always come from one snapshot.

use boxoffice_core::{Event, EventId, QueryError, Seat, SeatId, SeatLedger, SeatMap};
use std::sync::Arc;
use tracing::{debug, instrument};

/// Reads events and seat maps.
pub struct SeatQuery<L: SeatLedger> {
    ledger: Arc<L>,
}

impl<L: SeatLedger> Clone for SeatQuery<L> {
    fn clone(&self) -> Self {
        Self {
            ledger: Arc::clone(&self.ledger),
        }
    }
}

impl<L: SeatLedger> SeatQuery<L> {
    /// Create a query surface over `ledger`.
    #[must_use]
    pub const fn new(ledger: Arc<L>) -> Self {
        Self { ledger }
    }

    /// Every event.
    ///
    /// # Errors
    ///
    /// [`QueryError::StoreUnavailable`] or [`QueryError::Failed`] on ledger failure.
    #[instrument(skip(self))]
    pub async fn list_events(&self) -> Result<Vec<Event>, QueryError> {
        let events = self.ledger.list_events().await?;
        debug!(count = events.len(), "Listed events");
        Ok(events)
    }

    /// Seat map of one event.
    ///
    /// # Errors
    ///
    /// [`QueryError::EventNotFound`] if the event does not exist, otherwise a
    /// ledger failure.
    #[instrument(skip(self))]
    pub async fn seat_map(&self, event_id: EventId) -> Result<SeatMap, QueryError> {
        let (event, seats) = self
            .ledger
            .load_seat_map(event_id)
            .await?
            .ok_or(QueryError::EventNotFound(event_id))?;

        let map = SeatMap::new(event, seats);
        debug!(total = map.total(), available = map.available(), "Loaded seat map");
        Ok(map)
    }

    /// Current state of specific seats, in request order. Unknown ids yield `None`.
    ///
    /// # Errors
    ///
    /// Returns a [`QueryError`] on ledger failure.
    pub async fn find_seats(&self, seat_ids: &[SeatId]) -> Result<Vec<Option<Seat>>, QueryError> {
        Ok(self.ledger.find_seats(seat_ids).await?)
    }

    /// Whether the ledger is reachable.
    ///
    /// # Errors
    ///
    /// [`QueryError::StoreUnavailable`] if the ledger cannot be reached.
    pub async fn ping(&self) -> Result<(), QueryError> {
        Ok(self.ledger.ping().await?)
    }
}
