//! Seat ledger traits.
//!
//! The ledger is the durable source of truth for seat identity and status.
//! Reads go straight through [`SeatLedger`]; every write happens inside a
//! [`LedgerTransaction`] opened with [`SeatLedger::begin`].
//!
//! # Transaction contract
//!
//! ```text
//! begin()
//!   └─ lock_and_check_available(ids)   rows locked in ascending id order
//!        ├─ unavailable ≠ ∅  → rollback()
//!        └─ insert_booking(new)         reference uniqueness enforced here
//!             └─ mark_booked(id, ids)   link rows + status flip
//!                  └─ commit()
//! ```
//!
//! Row locks are held from `lock_and_check_available` until the transaction
//! ends, which closes the window between the availability check and the
//! status write. Lock waits are bounded; a timeout surfaces as
//! [`LedgerError::Busy`]. Dropping a transaction without committing rolls it
//! back.
//!
//! # Implementations
//!
//! - `PostgresSeatLedger` (in `boxoffice-postgres`): production ledger
//! - `InMemorySeatLedger` (in `boxoffice-testing`): fast, deterministic tests

use crate::error::LedgerResult;
use crate::types::{BookingId, Event, EventId, NewBooking, Seat, SeatClaim, SeatId, SeatView};
use std::future::Future;

/// Durable store of events, seats and bookings.
pub trait SeatLedger: Send + Sync + 'static {
    /// Transaction scope type.
    type Transaction: LedgerTransaction;

    /// Open a transaction scope with a bounded lock wait.
    ///
    /// # Errors
    ///
    /// [`LedgerError::StoreUnavailable`](crate::error::LedgerError::StoreUnavailable)
    /// if no connection can be obtained.
    fn begin(&self) -> impl Future<Output = LedgerResult<Self::Transaction>> + Send;

    /// Look up seats by id, preserving input order. Unknown ids yield `None`.
    ///
    /// # Errors
    ///
    /// Returns a ledger error if the read fails.
    fn find_seats(
        &self,
        seat_ids: &[SeatId],
    ) -> impl Future<Output = LedgerResult<Vec<Option<Seat>>>> + Send;

    /// All events, in no particular order.
    ///
    /// # Errors
    ///
    /// Returns a ledger error if the read fails.
    fn list_events(&self) -> impl Future<Output = LedgerResult<Vec<Event>>> + Send;

    /// An event and its seats read from one consistent snapshot.
    ///
    /// Seats are ordered by section, row and number. `None` if the event does
    /// not exist.
    ///
    /// # Errors
    ///
    /// Returns a ledger error if the read fails.
    fn load_seat_map(
        &self,
        event_id: EventId,
    ) -> impl Future<Output = LedgerResult<Option<(Event, Vec<SeatView>)>>> + Send;

    /// Cheap connectivity check for readiness probes.
    ///
    /// # Errors
    ///
    /// Returns a ledger error if the store cannot be reached.
    fn ping(&self) -> impl Future<Output = LedgerResult<()>> + Send;
}

/// A single ledger transaction. Rolled back on drop unless committed.
pub trait LedgerTransaction: Send {
    /// Lock the given seats and report which of them cannot be claimed.
    ///
    /// `seat_ids` must already be deduplicated and sorted ascending.
    ///
    /// # Errors
    ///
    /// [`LedgerError::Busy`](crate::error::LedgerError::Busy) if the locks
    /// cannot be acquired within the lock timeout.
    fn lock_and_check_available(
        &mut self,
        seat_ids: &[SeatId],
    ) -> impl Future<Output = LedgerResult<SeatClaim>> + Send;

    /// Insert the booking row.
    ///
    /// # Errors
    ///
    /// [`LedgerError::DuplicateReference`](crate::error::LedgerError::DuplicateReference)
    /// if the reference is already taken. The transaction is unusable afterwards.
    fn insert_booking(
        &mut self,
        booking: &NewBooking,
    ) -> impl Future<Output = LedgerResult<BookingId>> + Send;

    /// Link the seats to the booking and flip them to booked.
    ///
    /// # Errors
    ///
    /// Returns a ledger error if any write fails.
    fn mark_booked(
        &mut self,
        booking_id: BookingId,
        seat_ids: &[SeatId],
    ) -> impl Future<Output = LedgerResult<()>> + Send;

    /// Make every write in this transaction durable.
    ///
    /// # Errors
    ///
    /// Returns a ledger error if the commit fails; nothing is persisted then.
    fn commit(self) -> impl Future<Output = LedgerResult<()>> + Send;

    /// Discard every write in this transaction.
    ///
    /// # Errors
    ///
    /// Returns a ledger error if the store reports a failure while rolling back.
    fn rollback(self) -> impl Future<Output = LedgerResult<()>> + Send;
}
