//! `PostgreSQL` seat ledger for the boxoffice booking backend.
//!
//! This crate implements the [`SeatLedger`](boxoffice_core::SeatLedger)
//! contract from `boxoffice-core` on top of `sqlx`:
//!
//! - Row locks taken in ascending seat id order (`SELECT ... FOR UPDATE`)
//! - Bounded lock waits via a transaction-local `lock_timeout`
//! - Booking reference uniqueness enforced by a unique constraint
//! - Seat maps read from one `REPEATABLE READ` snapshot
//! - Embedded migrations and demo seeding
//!
//! # Example
//!
//! ```ignore
//! use boxoffice_postgres::{LedgerOptions, PostgresSeatLedger, seed_demo_event};
//!
//! async fn example() -> Result<(), Box<dyn std::error::Error>> {
//!     let ledger = PostgresSeatLedger::connect("postgres://localhost/ticketing_db", &LedgerOptions::default()).await?;
//!     ledger.migrate().await?;
//!     seed_demo_event(&ledger).await?;
//!     Ok(())
//! }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod error;
pub mod ledger;
pub mod seed;

pub use ledger::{LedgerOptions, PostgresSeatLedger, PostgresTransaction};
pub use seed::seed_demo_event;
