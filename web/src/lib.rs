//! HTTP and WebSocket surface of the boxoffice booking backend.
//!
//! Handlers are thin adapters: they parse the request, call the
//! [`BookingEngine`](boxoffice_runtime::BookingEngine) or
//! [`SeatQuery`](boxoffice_runtime::SeatQuery), and map the result or error
//! onto the wire format.
//!
//! # Request Flow
//!
//! 1. **Correlation id** attached by [`middleware::correlation_id_layer`]
//! 2. **Extract** path and JSON body ([`extractors`]); malformed input is 400
//! 3. **Call** the booking engine or query surface
//! 4. **Map** errors through [`AppError`]
//!
//! # Example
//!
//! ```ignore
//! use boxoffice_web::{AppState, build_router};
//!
//! let state = AppState::new(engine, query, notifier);
//! let app = build_router(state, None);
//! axum::serve(listener, app).await?;
//! ```

#![allow(clippy::module_name_repetitions)]

pub mod error;
pub mod extractors;
pub mod handlers;
pub mod middleware;
pub mod routes;
pub mod state;

// Re-export key types for convenience
pub use error::AppError;
pub use extractors::{ApiJson, ApiPath};
pub use middleware::{CORRELATION_ID_HEADER, CorrelationId, correlation_id_layer};
pub use routes::build_router;
pub use state::AppState;

/// Result type alias for web handlers.
pub type WebResult<T> = Result<T, AppError>;
