//! Booking engine: the single writer of the seat ledger.
//!
//! # Flow
//!
//! ```text
//! request ─▶ canonical ids ─▶ begin ─▶ lock + check ─┬─ conflict ─▶ rollback ─▶ SeatsUnavailable
//!                                                    └─ clear ─▶ insert ─▶ mark booked ─▶ commit ─▶ notify
//!                      ▲                                            │
//!                      └──────── fresh reference on collision ──────┘
//! ```
//!
//! Correctness under concurrency comes entirely from the ledger's row locks:
//! every request locks its seats in ascending id order and holds the locks
//! until commit or rollback, so two overlapping requests are serialized and
//! the second one sees the first one's writes.

use crate::metrics::BookingMetrics;
use crate::notifier::NotifierHandle;
use crate::retry::{RetryPolicy, retry_when};
use boxoffice_core::environment::{Clock, ReferenceGenerator};
use boxoffice_core::{
    BookedSeat, Booking, BookingError, BookingId, BookingRequest, LedgerError, LedgerTransaction,
    NewBooking, SeatClaim, SeatId, SeatLedger,
};
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{debug, info, instrument, warn};

/// Booking engine tuning.
#[derive(Debug, Clone, PartialEq)]
pub struct BookingConfig {
    /// Backoff between attempts after a reference collision. `max_attempts`
    /// is the total number of references tried per request.
    pub reference_retry: RetryPolicy,
}

impl BookingConfig {
    /// Default number of references tried before giving up.
    pub const DEFAULT_MAX_REFERENCE_ATTEMPTS: usize = 3;

    /// Config trying at most `attempts` references per request.
    #[must_use]
    pub fn with_max_reference_attempts(attempts: usize) -> Self {
        Self {
            reference_retry: RetryPolicy::builder()
                .max_attempts(attempts)
                .initial_delay(Duration::from_millis(5))
                .max_delay(Duration::from_millis(100))
                .build(),
        }
    }
}

impl Default for BookingConfig {
    fn default() -> Self {
        Self::with_max_reference_attempts(Self::DEFAULT_MAX_REFERENCE_ATTEMPTS)
    }
}

/// Outcome of a single transactional attempt.
#[derive(Error, Debug)]
enum AttemptError {
    /// Final answer for this request; never retried.
    #[error(transparent)]
    Rejected(BookingError),
    /// Ledger failure; retried only for reference collisions.
    #[error(transparent)]
    Ledger(#[from] LedgerError),
}

impl AttemptError {
    const fn is_reference_collision(&self) -> bool {
        matches!(self, Self::Ledger(LedgerError::DuplicateReference(_)))
    }
}

impl From<AttemptError> for BookingError {
    fn from(err: AttemptError) -> Self {
        match err {
            AttemptError::Rejected(err) => err,
            AttemptError::Ledger(err) => err.into(),
        }
    }
}

/// Creates bookings against a [`SeatLedger`].
pub struct BookingEngine<L: SeatLedger> {
    ledger: Arc<L>,
    clock: Arc<dyn Clock>,
    references: Arc<dyn ReferenceGenerator>,
    notifier: NotifierHandle,
    config: BookingConfig,
}

impl<L: SeatLedger> Clone for BookingEngine<L> {
    fn clone(&self) -> Self {
        Self {
            ledger: Arc::clone(&self.ledger),
            clock: Arc::clone(&self.clock),
            references: Arc::clone(&self.references),
            notifier: self.notifier.clone(),
            config: self.config.clone(),
        }
    }
}

impl<L: SeatLedger> BookingEngine<L> {
    /// Create an engine.
    #[must_use]
    pub fn new(
        ledger: Arc<L>,
        clock: Arc<dyn Clock>,
        references: Arc<dyn ReferenceGenerator>,
        notifier: NotifierHandle,
        config: BookingConfig,
    ) -> Self {
        Self {
            ledger,
            clock,
            references,
            notifier,
            config,
        }
    }

    /// The ledger this engine writes to.
    #[must_use]
    pub const fn ledger(&self) -> &Arc<L> {
        &self.ledger
    }

    /// Claim every requested seat or none of them.
    ///
    /// On success the booked seat ids are handed to the notifier; a lost
    /// notification never fails the booking.
    ///
    /// # Errors
    ///
    /// - [`BookingError::BadRequest`] for an empty seat set, a seat id below 1
    ///   or seats of different events
    /// - [`BookingError::SeatsUnavailable`] with the codes of missing or
    ///   already booked seats
    /// - [`BookingError::Busy`] / [`BookingError::StoreUnavailable`] when the
    ///   ledger cannot serve the request now
    /// - [`BookingError::CommitFailed`] when nothing could be committed,
    ///   including repeated reference collisions
    #[instrument(skip_all, fields(seats = request.seat_ids.len()))]
    pub async fn create_booking(&self, request: BookingRequest) -> Result<Booking, BookingError> {
        let started = Instant::now();

        let seat_ids = request.canonical_seat_ids();
        if seat_ids.is_empty() {
            debug!("Rejecting booking without seats");
            return Err(BookingError::BadRequest(
                "at least one seat must be selected".to_string(),
            ));
        }
        if let Some(invalid) = seat_ids.iter().find(|id| id.get() < 1) {
            debug!(seat_id = invalid.get(), "Rejecting booking with an invalid seat id");
            return Err(BookingError::BadRequest(format!(
                "invalid seat id {}",
                invalid.get()
            )));
        }

        let outcome = retry_when(
            &self.config.reference_retry,
            || self.attempt(&request, &seat_ids),
            AttemptError::is_reference_collision,
        )
        .await
        .map_err(BookingError::from);

        match &outcome {
            Ok(booking) => {
                BookingMetrics::record_committed(booking.seats.len(), started.elapsed());
                info!(
                    reference = %booking.reference,
                    booking_id = %booking.id,
                    seats = ?booking.seat_codes(),
                    total = %booking.total,
                    "Booking committed"
                );
                self.notifier.notify(booking.seat_ids());
            }
            Err(BookingError::SeatsUnavailable { seat_codes }) => {
                BookingMetrics::record_conflict(started.elapsed());
                info!(unavailable = ?seat_codes, "Booking rejected, seats unavailable");
            }
            Err(BookingError::BadRequest(reason)) => {
                debug!(%reason, "Booking rejected");
            }
            Err(err) => {
                BookingMetrics::record_failure(started.elapsed());
                warn!(error = %err, "Booking failed");
            }
        }

        outcome
    }

    async fn attempt(
        &self,
        request: &BookingRequest,
        seat_ids: &[SeatId],
    ) -> Result<Booking, AttemptError> {
        let mut tx = self.ledger.begin().await?;

        let claim = tx.lock_and_check_available(seat_ids).await?;
        if !claim.is_clear() {
            abandon(tx).await;
            return Err(AttemptError::Rejected(BookingError::SeatsUnavailable {
                seat_codes: claim.unavailable,
            }));
        }
        if claim.event_ids().len() > 1 {
            abandon(tx).await;
            return Err(AttemptError::Rejected(BookingError::BadRequest(
                "all seats must belong to the same event".to_string(),
            )));
        }
        let Some(total) = claim.total() else {
            abandon(tx).await;
            return Err(AttemptError::Rejected(BookingError::CommitFailed(
                "booking total overflows".to_string(),
            )));
        };

        let new_booking = NewBooking {
            reference: self.references.next_reference(),
            customer: request.customer.clone(),
            ticket_type: request.ticket_type.clone(),
            total,
            created_at: self.clock.now(),
        };

        let booking_id = match tx.insert_booking(&new_booking).await {
            Ok(id) => id,
            Err(err @ LedgerError::DuplicateReference(_)) => {
                BookingMetrics::record_reference_collision();
                warn!(reference = %new_booking.reference, "Booking reference collision");
                return Err(err.into());
            }
            Err(err) => return Err(err.into()),
        };
        tx.mark_booked(booking_id, seat_ids).await?;
        tx.commit().await.map_err(|err| match err {
            LedgerError::DuplicateReference(_) => AttemptError::Ledger(err),
            other => AttemptError::Rejected(BookingError::CommitFailed(other.to_string())),
        })?;

        Ok(booked(booking_id, new_booking, claim))
    }
}

fn booked(id: BookingId, new_booking: NewBooking, claim: SeatClaim) -> Booking {
    Booking {
        id,
        reference: new_booking.reference,
        customer: new_booking.customer,
        ticket_type: new_booking.ticket_type,
        total: new_booking.total,
        created_at: new_booking.created_at,
        seats: claim
            .locked
            .into_iter()
            .map(|seat| BookedSeat {
                id: seat.id,
                code: seat.code,
            })
            .collect(),
    }
}

/// Roll back a transaction whose outcome is already decided.
async fn abandon<T: LedgerTransaction>(tx: T) {
    if let Err(err) = tx.rollback().await {
        warn!(error = %err, "Rollback failed; transaction is discarded on drop");
    }
}
