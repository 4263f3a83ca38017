//! In-memory seat ledger.
//!
//! Behaves like the Postgres ledger where the booking engine can tell:
//!
//! - seat rows are locked per seat, in ascending id order, and held until
//!   the transaction commits, rolls back or is dropped
//! - a lock wait longer than the lock timeout fails with `Busy`
//! - writes are staged in the transaction and applied atomically on commit
//! - booking references are unique; a collision fails with `DuplicateReference`
//!
//! Faults can be injected per operation to exercise error paths.

use boxoffice_core::{
    BookedSeat, Booking, BookingId, BookingReference, Customer, Event, EventId, LedgerError,
    LedgerResult, LedgerTransaction, Money, NewBooking, Seat, SeatClaim, SeatId, SeatLedger,
    SeatStatus, SeatView, Section, SectionId,
};
use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicI64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::{Mutex as SeatLock, OwnedMutexGuard};

/// Ledger operation a fault can be injected into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LedgerOperation {
    /// `SeatLedger::begin`
    Begin,
    /// `LedgerTransaction::lock_and_check_available`
    LockSeats,
    /// `LedgerTransaction::insert_booking`
    InsertBooking,
    /// `LedgerTransaction::mark_booked`
    MarkBooked,
    /// `LedgerTransaction::commit`
    Commit,
    /// Any read on `SeatLedger`
    Read,
}

#[derive(Debug, Default)]
struct Tables {
    events: BTreeMap<EventId, Event>,
    sections: BTreeMap<SectionId, Section>,
    seats: BTreeMap<SeatId, Seat>,
    bookings: BTreeMap<BookingId, Booking>,
    seat_bookings: HashMap<SeatId, BookingId>,
    next_event: i64,
    next_section: i64,
    next_seat: i64,
}

#[derive(Debug, Default)]
struct Shared {
    tables: Mutex<Tables>,
    seat_locks: Mutex<HashMap<SeatId, Arc<SeatLock<()>>>>,
    faults: Mutex<HashMap<LedgerOperation, LedgerError>>,
    next_booking: AtomicI64,
    begun: AtomicUsize,
    committed: AtomicUsize,
    rolled_back: AtomicUsize,
}

impl Shared {
    fn tables(&self) -> MutexGuard<'_, Tables> {
        self.tables.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn seat_lock(&self, id: SeatId) -> Arc<SeatLock<()>> {
        let mut locks = self.seat_locks.lock().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(locks.entry(id).or_default())
    }

    fn check_fault(&self, operation: LedgerOperation) -> LedgerResult<()> {
        let fault = self
            .faults
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&operation);
        fault.map_or(Ok(()), Err)
    }
}

/// Thread-safe in-memory [`SeatLedger`]. Cheap to clone; clones share state.
#[derive(Debug, Clone)]
pub struct InMemorySeatLedger {
    shared: Arc<Shared>,
    lock_timeout: Duration,
}

impl Default for InMemorySeatLedger {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemorySeatLedger {
    /// Empty ledger with a 5 second lock timeout.
    #[must_use]
    pub fn new() -> Self {
        Self::with_lock_timeout(Duration::from_secs(5))
    }

    /// Empty ledger with a custom lock timeout.
    #[must_use]
    pub fn with_lock_timeout(lock_timeout: Duration) -> Self {
        Self {
            shared: Arc::new(Shared {
                next_booking: AtomicI64::new(1),
                ..Shared::default()
            }),
            lock_timeout,
        }
    }

    // ------------------------------------------------------------------
    // Seeding
    // ------------------------------------------------------------------

    /// Insert an event and return its id.
    pub fn insert_event(
        &self,
        name: &str,
        venue: &str,
        date: DateTime<Utc>,
        duration: i32,
    ) -> EventId {
        let mut tables = self.shared.tables();
        tables.next_event += 1;
        let id = EventId::new(tables.next_event);
        tables.events.insert(
            id,
            Event {
                id,
                name: name.to_string(),
                description: format!("{name} at {venue}"),
                date,
                venue: venue.to_string(),
                duration,
            },
        );
        id
    }

    /// Insert a section and return its id.
    pub fn insert_section(&self, event_id: EventId, name: &str, is_vip: bool) -> SectionId {
        let mut tables = self.shared.tables();
        tables.next_section += 1;
        let id = SectionId::new(tables.next_section);
        tables.sections.insert(
            id,
            Section {
                id,
                event_id,
                name: name.to_string(),
                is_vip,
            },
        );
        id
    }

    /// Insert an available seat and return its id.
    pub fn insert_seat(&self, section_id: SectionId, row: &str, number: i32, price: Money) -> SeatId {
        let mut tables = self.shared.tables();
        let event_id = tables
            .sections
            .get(&section_id)
            .map_or(EventId::new(0), |section| section.event_id);
        tables.next_seat += 1;
        let id = SeatId::new(tables.next_seat);
        tables.seats.insert(
            id,
            Seat {
                id,
                event_id,
                section_id,
                row: row.to_string(),
                number,
                code: format!("{row}{number}"),
                status: SeatStatus::Available,
                price,
            },
        );
        id
    }

    /// Record a committed booking with `reference` and no seats, as if an
    /// earlier request had taken it.
    pub fn insert_reference(&self, reference: &str) -> BookingId {
        let id = BookingId::new(self.shared.next_booking.fetch_add(1, Ordering::SeqCst));
        self.shared.tables().bookings.insert(
            id,
            Booking {
                id,
                reference: BookingReference::new(reference),
                customer: Customer::default(),
                ticket_type: "standard".to_string(),
                total: Money::ZERO,
                created_at: Utc::now(),
                seats: Vec::new(),
            },
        );
        id
    }

    // ------------------------------------------------------------------
    // Inspection
    // ------------------------------------------------------------------

    /// Current committed state of a seat.
    #[must_use]
    pub fn seat(&self, id: SeatId) -> Option<Seat> {
        self.shared.tables().seats.get(&id).cloned()
    }

    /// Booking a seat is linked to, if any.
    #[must_use]
    pub fn booking_for_seat(&self, id: SeatId) -> Option<BookingId> {
        self.shared.tables().seat_bookings.get(&id).copied()
    }

    /// Every committed booking, ascending by id.
    #[must_use]
    pub fn bookings(&self) -> Vec<Booking> {
        self.shared.tables().bookings.values().cloned().collect()
    }

    /// Number of seats in `Booked` status.
    #[must_use]
    pub fn booked_seat_count(&self) -> usize {
        self.shared
            .tables()
            .seats
            .values()
            .filter(|seat| seat.status == SeatStatus::Booked)
            .count()
    }

    /// Transactions opened so far.
    #[must_use]
    pub fn transactions_begun(&self) -> usize {
        self.shared.begun.load(Ordering::SeqCst)
    }

    /// Transactions committed so far.
    #[must_use]
    pub fn transactions_committed(&self) -> usize {
        self.shared.committed.load(Ordering::SeqCst)
    }

    /// Transactions rolled back explicitly or by drop.
    #[must_use]
    pub fn transactions_rolled_back(&self) -> usize {
        self.shared.rolled_back.load(Ordering::SeqCst)
    }

    /// Fail the next call of `operation` with `error`.
    pub fn fail_next(&self, operation: LedgerOperation, error: LedgerError) {
        self.shared
            .faults
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(operation, error);
    }

    fn seat_map_snapshot(&self, event_id: EventId) -> Option<(Event, Vec<SeatView>)> {
        let tables = self.shared.tables();
        let event = tables.events.get(&event_id)?.clone();

        let mut seats: Vec<SeatView> = tables
            .seats
            .values()
            .filter(|seat| seat.event_id == event_id)
            .map(|seat| {
                let section = tables.sections.get(&seat.section_id);
                SeatView {
                    seat: seat.clone(),
                    section: section.map(|s| s.name.clone()).unwrap_or_default(),
                    is_vip: section.is_some_and(|s| s.is_vip),
                }
            })
            .collect();
        seats.sort_by(|a, b| {
            (a.seat.section_id, &a.seat.row, a.seat.number).cmp(&(
                b.seat.section_id,
                &b.seat.row,
                b.seat.number,
            ))
        });

        Some((event, seats))
    }
}

impl SeatLedger for InMemorySeatLedger {
    type Transaction = InMemoryTransaction;

    async fn begin(&self) -> LedgerResult<InMemoryTransaction> {
        self.shared.check_fault(LedgerOperation::Begin)?;
        self.shared.begun.fetch_add(1, Ordering::SeqCst);
        Ok(InMemoryTransaction {
            shared: Arc::clone(&self.shared),
            lock_timeout: self.lock_timeout,
            guards: BTreeMap::new(),
            staged: None,
            finished: false,
        })
    }

    async fn find_seats(&self, seat_ids: &[SeatId]) -> LedgerResult<Vec<Option<Seat>>> {
        self.shared.check_fault(LedgerOperation::Read)?;
        let tables = self.shared.tables();
        Ok(seat_ids.iter().map(|id| tables.seats.get(id).cloned()).collect())
    }

    async fn list_events(&self) -> LedgerResult<Vec<Event>> {
        self.shared.check_fault(LedgerOperation::Read)?;
        Ok(self.shared.tables().events.values().cloned().collect())
    }

    async fn load_seat_map(&self, event_id: EventId) -> LedgerResult<Option<(Event, Vec<SeatView>)>> {
        self.shared.check_fault(LedgerOperation::Read)?;
        Ok(self.seat_map_snapshot(event_id))
    }

    async fn ping(&self) -> LedgerResult<()> {
        self.shared.check_fault(LedgerOperation::Read)
    }
}

#[derive(Debug)]
struct StagedBooking {
    id: BookingId,
    booking: NewBooking,
    seat_ids: Vec<SeatId>,
}

/// Transaction on an [`InMemorySeatLedger`]. Rolled back on drop.
#[derive(Debug)]
pub struct InMemoryTransaction {
    shared: Arc<Shared>,
    lock_timeout: Duration,
    guards: BTreeMap<SeatId, OwnedMutexGuard<()>>,
    staged: Option<StagedBooking>,
    finished: bool,
}

impl InMemoryTransaction {
    fn apply(&mut self) -> LedgerResult<()> {
        let mut tables = self.shared.tables();
        let Some(staged) = self.staged.take() else {
            return Ok(());
        };

        if tables
            .bookings
            .values()
            .any(|existing| existing.reference == staged.booking.reference)
        {
            return Err(LedgerError::DuplicateReference(
                staged.booking.reference.to_string(),
            ));
        }
        if let Some(taken) = staged
            .seat_ids
            .iter()
            .find(|id| tables.seat_bookings.contains_key(*id))
        {
            return Err(LedgerError::Query(format!(
                "seat {taken} is already linked to a booking"
            )));
        }

        let mut seats = Vec::with_capacity(staged.seat_ids.len());
        for id in &staged.seat_ids {
            if let Some(seat) = tables.seats.get_mut(id) {
                seat.status = SeatStatus::Booked;
                seats.push(BookedSeat {
                    id: *id,
                    code: seat.code.clone(),
                });
            }
            tables.seat_bookings.insert(*id, staged.id);
        }

        let NewBooking {
            reference,
            customer,
            ticket_type,
            total,
            created_at,
        } = staged.booking;
        tables.bookings.insert(
            staged.id,
            Booking {
                id: staged.id,
                reference,
                customer,
                ticket_type,
                total,
                created_at,
                seats,
            },
        );
        Ok(())
    }
}

impl LedgerTransaction for InMemoryTransaction {
    async fn lock_and_check_available(&mut self, seat_ids: &[SeatId]) -> LedgerResult<SeatClaim> {
        self.shared.check_fault(LedgerOperation::LockSeats)?;

        let mut ordered = seat_ids.to_vec();
        ordered.sort_unstable();
        ordered.dedup();

        for id in ordered {
            if self.guards.contains_key(&id) {
                continue;
            }
            let lock = self.shared.seat_lock(id);
            let guard = tokio::time::timeout(self.lock_timeout, lock.lock_owned())
                .await
                .map_err(|_| LedgerError::Busy(format!("lock timeout waiting for seat {id}")))?;
            self.guards.insert(id, guard);
        }

        let locked = {
            let tables = self.shared.tables();
            seat_ids
                .iter()
                .filter_map(|id| tables.seats.get(id).cloned())
                .collect()
        };
        Ok(SeatClaim::from_locked(seat_ids, locked))
    }

    async fn insert_booking(&mut self, booking: &NewBooking) -> LedgerResult<BookingId> {
        self.shared.check_fault(LedgerOperation::InsertBooking)?;

        let taken = self
            .shared
            .tables()
            .bookings
            .values()
            .any(|existing| existing.reference == booking.reference);
        if taken {
            return Err(LedgerError::DuplicateReference(booking.reference.to_string()));
        }

        let id = BookingId::new(self.shared.next_booking.fetch_add(1, Ordering::SeqCst));
        self.staged = Some(StagedBooking {
            id,
            booking: booking.clone(),
            seat_ids: Vec::new(),
        });
        Ok(id)
    }

    async fn mark_booked(&mut self, booking_id: BookingId, seat_ids: &[SeatId]) -> LedgerResult<()> {
        self.shared.check_fault(LedgerOperation::MarkBooked)?;

        if let Some(unlocked) = seat_ids.iter().find(|id| !self.guards.contains_key(*id)) {
            return Err(LedgerError::Query(format!(
                "seat {unlocked} is not locked by this transaction"
            )));
        }
        match self.staged.as_mut() {
            Some(staged) if staged.id == booking_id => {
                staged.seat_ids.extend_from_slice(seat_ids);
                Ok(())
            }
            _ => Err(LedgerError::Query(format!(
                "booking {booking_id} was not inserted in this transaction"
            ))),
        }
    }

    async fn commit(mut self) -> LedgerResult<()> {
        self.shared.check_fault(LedgerOperation::Commit)?;
        self.apply()?;
        self.finished = true;
        self.shared.committed.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn rollback(self) -> LedgerResult<()> {
        // Drop discards staged writes and releases the seat locks.
        Ok(())
    }
}

impl Drop for InMemoryTransaction {
    fn drop(&mut self) {
        if !self.finished {
            self.shared.rolled_back.fetch_add(1, Ordering::SeqCst);
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::fixtures::EventFixture;

    #[tokio::test]
    async fn uncommitted_writes_are_discarded_on_drop() {
        let ledger = InMemorySeatLedger::new();
        let seeded = EventFixture::scenario().seed(&ledger);
        let a1 = seeded.seat_id("A1");

        let mut tx = ledger.begin().await.unwrap();
        tx.lock_and_check_available(&[a1]).await.unwrap();
        let booking = crate::mocks::new_booking("TKT-DROPPED1", Money::from_cents(100));
        let id = tx.insert_booking(&booking).await.unwrap();
        tx.mark_booked(id, &[a1]).await.unwrap();
        drop(tx);

        assert_eq!(ledger.seat(a1).unwrap().status, SeatStatus::Available);
        assert!(ledger.bookings().is_empty());
        assert_eq!(ledger.transactions_rolled_back(), 1);
    }

    #[tokio::test]
    async fn second_locker_waits_for_first_commit() {
        let ledger = InMemorySeatLedger::new();
        let seeded = EventFixture::scenario().seed(&ledger);
        let a1 = seeded.seat_id("A1");

        let mut first = ledger.begin().await.unwrap();
        assert!(first.lock_and_check_available(&[a1]).await.unwrap().is_clear());

        let contender = {
            let ledger = ledger.clone();
            tokio::spawn(async move {
                let mut second = ledger.begin().await.unwrap();
                second.lock_and_check_available(&[a1]).await.unwrap()
            })
        };

        let booking = crate::mocks::new_booking("TKT-FIRST001", Money::from_cents(100));
        let id = first.insert_booking(&booking).await.unwrap();
        first.mark_booked(id, &[a1]).await.unwrap();
        first.commit().await.unwrap();

        let claim = contender.await.unwrap();
        assert_eq!(claim.unavailable, vec!["A1".to_string()]);
    }

    #[tokio::test]
    async fn lock_wait_beyond_timeout_is_busy() {
        let ledger = InMemorySeatLedger::with_lock_timeout(Duration::from_millis(20));
        let seeded = EventFixture::scenario().seed(&ledger);
        let a1 = seeded.seat_id("A1");

        let mut holder = ledger.begin().await.unwrap();
        holder.lock_and_check_available(&[a1]).await.unwrap();

        let mut waiter = ledger.begin().await.unwrap();
        let err = waiter.lock_and_check_available(&[a1]).await.unwrap_err();
        assert!(matches!(err, LedgerError::Busy(_)));
    }

    #[tokio::test]
    async fn duplicate_reference_is_rejected_on_insert() {
        let ledger = InMemorySeatLedger::new();
        ledger.insert_reference("TKT-TAKEN001");

        let mut tx = ledger.begin().await.unwrap();
        let err = tx
            .insert_booking(&crate::mocks::new_booking("TKT-TAKEN001", Money::ZERO))
            .await
            .unwrap_err();
        assert_eq!(err, LedgerError::DuplicateReference("TKT-TAKEN001".to_string()));
    }

    #[tokio::test]
    async fn injected_fault_fires_once() {
        let ledger = InMemorySeatLedger::new();
        ledger.fail_next(LedgerOperation::Read, LedgerError::StoreUnavailable("down".to_string()));

        assert!(ledger.list_events().await.is_err());
        assert!(ledger.list_events().await.is_ok());
    }

    #[tokio::test]
    async fn seat_map_is_ordered_by_section_row_number() {
        let ledger = InMemorySeatLedger::new();
        let seeded = EventFixture::demo().seed(&ledger);

        let (_, seats) = ledger.load_seat_map(seeded.event_id).await.unwrap().unwrap();
        let codes: Vec<_> = seats.iter().take(3).map(|v| v.seat.code.as_str()).collect();
        assert_eq!(codes, vec!["A1", "A2", "A3"]);
        assert!(seats[0].is_vip);
    }
}
