//! Demo inventory for an empty ledger.

use crate::error::classify;
use crate::ledger::PostgresSeatLedger;
use boxoffice_core::{EventId, LedgerResult};
use chrono::{TimeZone, Utc};
use tracing::info;

struct SectionLayout {
    name: &'static str,
    is_vip: bool,
    rows: &'static [&'static str],
    seats_per_row: i32,
    price_cents: i64,
}

const DEMO_SECTIONS: &[SectionLayout] = &[
    SectionLayout {
        name: "VIP",
        is_vip: true,
        rows: &["A", "B"],
        seats_per_row: 10,
        price_cents: 20_000,
    },
    SectionLayout {
        name: "Premium",
        is_vip: false,
        rows: &["C", "D", "E", "F", "G"],
        seats_per_row: 15,
        price_cents: 10_000,
    },
    SectionLayout {
        name: "Standard",
        is_vip: false,
        rows: &["H", "I", "J", "K", "L", "M", "N", "O", "P", "Q"],
        seats_per_row: 15,
        price_cents: 5_000,
    },
];

/// Insert the demo event unless the ledger already has events.
///
/// Returns the new event's id, or `None` if nothing was seeded.
///
/// # Errors
///
/// Returns a ledger error if any insert fails; nothing is written then.
pub async fn seed_demo_event(ledger: &PostgresSeatLedger) -> LedgerResult<Option<EventId>> {
    let mut tx = ledger.pool().begin().await.map_err(classify)?;

    // Serialize concurrent seeders so only one of them sees an empty table.
    sqlx::query("LOCK TABLE events IN SHARE ROW EXCLUSIVE MODE")
        .execute(&mut *tx)
        .await
        .map_err(classify)?;

    let existing: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM events")
        .fetch_one(&mut *tx)
        .await
        .map_err(classify)?;
    if existing.0 > 0 {
        tx.rollback().await.map_err(classify)?;
        return Ok(None);
    }

    let starts_at = Utc
        .with_ymd_and_hms(2025, 3, 25, 19, 0, 0)
        .single()
        .unwrap_or_else(Utc::now);
    let event_id: (i64,) = sqlx::query_as(
        r"
        INSERT INTO events (name, description, event_date, venue, duration_minutes)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING id
        ",
    )
    .bind("Ultimate Music Experience")
    .bind("Experience an unforgettable night of music with the world's top performers.")
    .bind(starts_at)
    .bind("Grand Arena, Downtown")
    .bind(180_i32)
    .fetch_one(&mut *tx)
    .await
    .map_err(classify)?;

    let mut seats = 0usize;
    for layout in DEMO_SECTIONS {
        let section_id: (i64,) = sqlx::query_as(
            "INSERT INTO sections (event_id, name, is_vip) VALUES ($1, $2, $3) RETURNING id",
        )
        .bind(event_id.0)
        .bind(layout.name)
        .bind(layout.is_vip)
        .fetch_one(&mut *tx)
        .await
        .map_err(classify)?;

        let rows: Vec<String> = layout.rows.iter().map(ToString::to_string).collect();
        let inserted = sqlx::query(
            r"
            INSERT INTO seats (event_id, section_id, row_label, seat_number, seat_code, price_cents)
            SELECT $1, $2, r.label, n, r.label || n, $3
            FROM UNNEST($4::TEXT[]) AS r(label)
            CROSS JOIN generate_series(1, $5) AS n
            ",
        )
        .bind(event_id.0)
        .bind(section_id.0)
        .bind(layout.price_cents)
        .bind(&rows)
        .bind(layout.seats_per_row)
        .execute(&mut *tx)
        .await
        .map_err(classify)?;

        seats += usize::try_from(inserted.rows_affected()).unwrap_or_default();
    }

    tx.commit().await.map_err(classify)?;

    info!(event_id = event_id.0, seats, "Seeded demo event");
    Ok(Some(EventId::new(event_id.0)))
}
