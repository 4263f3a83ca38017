//! `PostgreSQL` seat ledger.
//!
//! # Locking
//!
//! `lock_and_check_available` issues
//!
//! ```sql
//! SELECT ... FROM seats WHERE id = ANY($1) ORDER BY id FOR UPDATE
//! ```
//!
//! so every transaction acquires its row locks in ascending id order. Two
//! overlapping bookings therefore queue on the first shared seat instead of
//! deadlocking, and the second one re-reads the rows after the first commits.
//! Lock waits are bounded by a transaction-local `lock_timeout`.

use crate::error::classify;
use boxoffice_core::{
    BookingId, Event, EventId, LedgerError, LedgerResult, LedgerTransaction, Money, NewBooking,
    Seat, SeatClaim, SeatId, SeatLedger, SeatStatus, SeatView, SectionId,
};
use chrono::{DateTime, Utc};
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::{Postgres, Transaction};
use std::time::Duration;
use tracing::{debug, info};

/// Connection settings for [`PostgresSeatLedger::connect`].
#[derive(Debug, Clone)]
pub struct LedgerOptions {
    /// Maximum pool size
    pub max_connections: u32,
    /// How long to wait for a pooled connection
    pub connect_timeout: Duration,
    /// Upper bound on any row-lock wait inside a booking transaction
    pub lock_timeout: Duration,
}

impl Default for LedgerOptions {
    fn default() -> Self {
        Self {
            max_connections: 10,
            connect_timeout: Duration::from_secs(5),
            lock_timeout: Duration::from_secs(5),
        }
    }
}

/// `PostgreSQL`-backed [`SeatLedger`].
///
/// # Example
///
/// ```ignore
/// use boxoffice_postgres::{LedgerOptions, PostgresSeatLedger};
///
/// let ledger = PostgresSeatLedger::connect(&database_url, &LedgerOptions::default()).await?;
/// ledger.migrate().await?;
/// ```
#[derive(Clone, Debug)]
pub struct PostgresSeatLedger {
    pool: PgPool,
    lock_timeout: Duration,
}

impl PostgresSeatLedger {
    /// Connect a new pool.
    ///
    /// # Errors
    ///
    /// [`LedgerError::StoreUnavailable`] if the database cannot be reached.
    pub async fn connect(database_url: &str, options: &LedgerOptions) -> LedgerResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(options.max_connections)
            .acquire_timeout(options.connect_timeout)
            .connect(database_url)
            .await
            .map_err(|e| LedgerError::StoreUnavailable(format!("Failed to connect: {e}")))?;

        info!(
            max_connections = options.max_connections,
            "Connected to seat ledger database"
        );
        Ok(Self::from_pool(pool, options.lock_timeout))
    }

    /// Wrap an existing pool.
    #[must_use]
    pub const fn from_pool(pool: PgPool, lock_timeout: Duration) -> Self {
        Self { pool, lock_timeout }
    }

    /// Run the embedded schema migrations.
    ///
    /// # Errors
    ///
    /// [`LedgerError::Query`] if a migration fails.
    pub async fn migrate(&self) -> LedgerResult<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| LedgerError::Query(format!("Migration failed: {e}")))?;
        Ok(())
    }

    /// Get the underlying connection pool.
    #[must_use]
    pub const fn pool(&self) -> &PgPool {
        &self.pool
    }

    fn lock_timeout_setting(&self) -> String {
        format!("{}ms", self.lock_timeout.as_millis().max(1))
    }
}

#[derive(Debug, sqlx::FromRow)]
struct EventRow {
    id: i64,
    name: String,
    description: String,
    event_date: DateTime<Utc>,
    venue: String,
    duration_minutes: i32,
}

impl From<EventRow> for Event {
    fn from(row: EventRow) -> Self {
        Self {
            id: EventId::new(row.id),
            name: row.name,
            description: row.description,
            date: row.event_date,
            venue: row.venue,
            duration: row.duration_minutes,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct SeatRow {
    id: i64,
    event_id: i64,
    section_id: i64,
    row_label: String,
    seat_number: i32,
    seat_code: String,
    status: String,
    price_cents: i64,
}

impl TryFrom<SeatRow> for Seat {
    type Error = LedgerError;

    fn try_from(row: SeatRow) -> LedgerResult<Self> {
        let status = SeatStatus::parse(&row.status).map_err(LedgerError::Query)?;
        let cents = u64::try_from(row.price_cents).map_err(|_| {
            LedgerError::Query(format!("seat {} has a negative price", row.id))
        })?;
        Ok(Self {
            id: SeatId::new(row.id),
            event_id: EventId::new(row.event_id),
            section_id: SectionId::new(row.section_id),
            row: row.row_label,
            number: row.seat_number,
            code: row.seat_code,
            status,
            price: Money::from_cents(cents),
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct SeatViewRow {
    #[sqlx(flatten)]
    seat: SeatRow,
    section_name: String,
    is_vip: bool,
}

const SEAT_COLUMNS: &str =
    "s.id, s.event_id, s.section_id, s.row_label, s.seat_number, s.seat_code, s.status, s.price_cents";

fn raw_ids(seat_ids: &[SeatId]) -> Vec<i64> {
    seat_ids.iter().map(|id| id.get()).collect()
}

impl SeatLedger for PostgresSeatLedger {
    type Transaction = PostgresTransaction;

    async fn begin(&self) -> LedgerResult<PostgresTransaction> {
        let mut tx = self.pool.begin().await.map_err(classify)?;

        sqlx::query("SELECT set_config('lock_timeout', $1, true)")
            .bind(self.lock_timeout_setting())
            .execute(&mut *tx)
            .await
            .map_err(classify)?;

        Ok(PostgresTransaction { tx })
    }

    async fn find_seats(&self, seat_ids: &[SeatId]) -> LedgerResult<Vec<Option<Seat>>> {
        let rows: Vec<SeatRow> = sqlx::query_as(&format!(
            "SELECT {SEAT_COLUMNS} FROM seats s WHERE s.id = ANY($1)"
        ))
        .bind(raw_ids(seat_ids))
        .fetch_all(&self.pool)
        .await
        .map_err(classify)?;

        let found = rows
            .into_iter()
            .map(Seat::try_from)
            .collect::<LedgerResult<Vec<_>>>()?;

        Ok(seat_ids
            .iter()
            .map(|id| found.iter().find(|seat| seat.id == *id).cloned())
            .collect())
    }

    async fn list_events(&self) -> LedgerResult<Vec<Event>> {
        let rows: Vec<EventRow> = sqlx::query_as(
            r"
            SELECT id, name, description, event_date, venue, duration_minutes
            FROM events
            ORDER BY event_date, id
            ",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(classify)?;

        Ok(rows.into_iter().map(Event::from).collect())
    }

    async fn load_seat_map(&self, event_id: EventId) -> LedgerResult<Option<(Event, Vec<SeatView>)>> {
        // One snapshot for the event row and every seat row.
        let mut tx = self.pool.begin().await.map_err(classify)?;
        sqlx::query("SET TRANSACTION ISOLATION LEVEL REPEATABLE READ, READ ONLY")
            .execute(&mut *tx)
            .await
            .map_err(classify)?;

        let event: Option<EventRow> = sqlx::query_as(
            r"
            SELECT id, name, description, event_date, venue, duration_minutes
            FROM events
            WHERE id = $1
            ",
        )
        .bind(event_id.get())
        .fetch_optional(&mut *tx)
        .await
        .map_err(classify)?;

        let Some(event) = event else {
            tx.rollback().await.map_err(classify)?;
            return Ok(None);
        };

        let rows: Vec<SeatViewRow> = sqlx::query_as(&format!(
            r"
            SELECT {SEAT_COLUMNS}, sec.name AS section_name, sec.is_vip
            FROM seats s
            JOIN sections sec ON sec.id = s.section_id
            WHERE s.event_id = $1
            ORDER BY s.section_id, s.row_label, s.seat_number
            "
        ))
        .bind(event_id.get())
        .fetch_all(&mut *tx)
        .await
        .map_err(classify)?;

        tx.commit().await.map_err(classify)?;

        let seats = rows
            .into_iter()
            .map(|row| {
                Ok(SeatView {
                    seat: Seat::try_from(row.seat)?,
                    section: row.section_name,
                    is_vip: row.is_vip,
                })
            })
            .collect::<LedgerResult<Vec<_>>>()?;

        debug!(event_id = %event_id, seats = seats.len(), "Loaded seat map snapshot");
        Ok(Some((event.into(), seats)))
    }

    async fn ping(&self) -> LedgerResult<()> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(classify)?;
        Ok(())
    }
}

/// One booking transaction. Rolled back by `sqlx` when dropped uncommitted.
pub struct PostgresTransaction {
    tx: Transaction<'static, Postgres>,
}

impl LedgerTransaction for PostgresTransaction {
    async fn lock_and_check_available(&mut self, seat_ids: &[SeatId]) -> LedgerResult<SeatClaim> {
        let rows: Vec<SeatRow> = sqlx::query_as(&format!(
            "SELECT {SEAT_COLUMNS} FROM seats s WHERE s.id = ANY($1) ORDER BY s.id FOR UPDATE"
        ))
        .bind(raw_ids(seat_ids))
        .fetch_all(&mut *self.tx)
        .await
        .map_err(classify)?;

        let locked = rows
            .into_iter()
            .map(Seat::try_from)
            .collect::<LedgerResult<Vec<_>>>()?;

        Ok(SeatClaim::from_locked(seat_ids, locked))
    }

    async fn insert_booking(&mut self, booking: &NewBooking) -> LedgerResult<BookingId> {
        let total = i64::try_from(booking.total.cents())
            .map_err(|_| LedgerError::Query("booking total exceeds BIGINT".to_string()))?;

        let id: (i64,) = sqlx::query_as(
            r"
            INSERT INTO bookings (
                reference, customer_name, customer_email, customer_phone,
                ticket_type, total_cents, created_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id
            ",
        )
        .bind(booking.reference.as_str())
        .bind(&booking.customer.name)
        .bind(&booking.customer.email)
        .bind(&booking.customer.phone)
        .bind(&booking.ticket_type)
        .bind(total)
        .bind(booking.created_at)
        .fetch_one(&mut *self.tx)
        .await
        .map_err(|e| match classify(e) {
            LedgerError::DuplicateReference(_) => {
                LedgerError::DuplicateReference(booking.reference.to_string())
            }
            other => other,
        })?;

        Ok(BookingId::new(id.0))
    }

    async fn mark_booked(&mut self, booking_id: BookingId, seat_ids: &[SeatId]) -> LedgerResult<()> {
        let ids = raw_ids(seat_ids);

        sqlx::query(
            r"
            INSERT INTO booking_seats (booking_id, seat_id)
            SELECT $1, UNNEST($2::BIGINT[])
            ",
        )
        .bind(booking_id.get())
        .bind(&ids)
        .execute(&mut *self.tx)
        .await
        .map_err(classify)?;

        let updated = sqlx::query(
            r"
            UPDATE seats
            SET status = 'booked'
            WHERE id = ANY($1) AND status = 'available'
            ",
        )
        .bind(&ids)
        .execute(&mut *self.tx)
        .await
        .map_err(classify)?;

        if updated.rows_affected() != ids.len() as u64 {
            return Err(LedgerError::Query(format!(
                "expected to book {} seats, updated {}",
                ids.len(),
                updated.rows_affected()
            )));
        }
        Ok(())
    }

    async fn commit(self) -> LedgerResult<()> {
        self.tx.commit().await.map_err(classify)
    }

    async fn rollback(self) -> LedgerResult<()> {
        self.tx.rollback().await.map_err(classify)
    }
}
