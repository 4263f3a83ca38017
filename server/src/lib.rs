//! boxoffice server: configuration, component wiring and process lifecycle.
//!
//! ```text
//! Config::from_env ─▶ PostgresSeatLedger ─▶ migrate ─▶ seed (optional)
//!                          │
//!                          ├─▶ BookingEngine ──▶ NotifierHandle ─▶ dispatcher ─▶ /ws observers
//!                          └─▶ SeatQuery
//!                                   │
//!                     build_router ─┴─▶ axum::serve (graceful shutdown)
//! ```

pub mod app;
pub mod config;

pub use app::run;
pub use config::Config;
