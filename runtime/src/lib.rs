//! # Boxoffice Runtime
//!
//! The concurrency core of the seat-booking backend.
//!
//! ## Core Components
//!
//! - **Booking Engine**: claims a seat set all-or-nothing inside one ledger transaction
//! - **Availability Notifier**: fans seat changes out to connected observers
//! - **Query Surface**: snapshot reads of events and seat maps
//!
//! ## Example
//!
//! ```ignore
//! use boxoffice_runtime::{BookingEngine, BookingConfig, AvailabilityNotifier, NotifierConfig};
//! use boxoffice_runtime::reference::RandomReferenceGenerator;
//! use boxoffice_core::environment::SystemClock;
//!
//! let notifier = Arc::new(AvailabilityNotifier::new(&NotifierConfig::default()));
//! let (handle, _dispatcher) = notifier.spawn_dispatcher(256);
//!
//! let engine = BookingEngine::new(
//!     ledger,
//!     Arc::new(SystemClock),
//!     Arc::new(RandomReferenceGenerator),
//!     handle,
//!     BookingConfig::default(),
//! );
//!
//! let booking = engine.create_booking(request).await?;
//! ```

/// All-or-nothing seat booking
pub mod booking;

/// Prometheus metrics for observability
pub mod metrics;

/// Fan-out of seat changes to observers
pub mod notifier;

/// Snapshot reads of events and seat maps
pub mod query;

/// Booking reference generation
pub mod reference;

/// Retry logic with exponential backoff
pub mod retry;

pub use booking::{BookingConfig, BookingEngine};
pub use notifier::{
    AvailabilityNotifier, BroadcastReport, NotifierConfig, NotifierHandle, Observer, ObserverId,
};
pub use query::SeatQuery;
pub use reference::RandomReferenceGenerator;
pub use retry::{RetryPolicy, retry_when};
