//! Prometheus metrics for the booking path and the availability notifier.
//!
//! Recording goes through the small recorder structs below so metric names
//! live in one place. Without an installed recorder every call is a no-op,
//! which keeps tests free of global state.
//!
//! # Example
//!
//! ```rust,no_run
//! use boxoffice_runtime::metrics::MetricsExporter;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let mut exporter = MetricsExporter::new();
//! exporter.install()?;
//!
//! // Serve `exporter.render()` on GET /metrics
//! # Ok(())
//! # }
//! ```

use metrics::{describe_counter, describe_gauge, describe_histogram};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};
use std::time::Duration;
use thiserror::Error;

pub use metrics::{counter, gauge, histogram};

/// Errors from metrics operations.
#[derive(Error, Debug)]
pub enum MetricsError {
    /// Failed to build metrics exporter
    #[error("Failed to build metrics exporter: {0}")]
    Build(String),
    /// Failed to install metrics exporter
    #[error("Failed to install metrics exporter: {0}")]
    Install(String),
}

/// Process-wide Prometheus recorder.
#[derive(Default)]
pub struct MetricsExporter {
    handle: Option<PrometheusHandle>,
}

impl MetricsExporter {
    /// Create an exporter with no recorder installed yet.
    #[must_use]
    pub const fn new() -> Self {
        Self { handle: None }
    }

    /// Describe every metric and install the global recorder.
    ///
    /// A recorder installed earlier in the same process (tests) is tolerated;
    /// [`render`](Self::render) then returns `None` for this exporter.
    ///
    /// # Errors
    ///
    /// Returns error if the exporter cannot be built or installed.
    pub fn install(&mut self) -> Result<(), MetricsError> {
        register_metrics();

        let builder = PrometheusBuilder::new()
            .set_buckets_for_metric(
                Matcher::Suffix("duration_seconds".to_string()),
                &[0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0],
            )
            .map_err(|e| MetricsError::Build(e.to_string()))?;

        match builder.install_recorder() {
            Ok(handle) => {
                self.handle = Some(handle);
                tracing::info!("Prometheus recorder installed");
                Ok(())
            }
            Err(e) => {
                let err_msg = e.to_string();
                if err_msg.contains("already initialized") {
                    tracing::warn!("Metrics recorder already initialized, skipping re-initialization");
                    Ok(())
                } else {
                    Err(MetricsError::Install(err_msg))
                }
            }
        }
    }

    /// Handle for rendering, if this exporter owns the recorder.
    #[must_use]
    pub const fn handle(&self) -> Option<&PrometheusHandle> {
        self.handle.as_ref()
    }

    /// Render current metrics in Prometheus text format.
    #[must_use]
    pub fn render(&self) -> Option<String> {
        self.handle.as_ref().map(PrometheusHandle::render)
    }
}

fn register_metrics() {
    // Booking engine
    describe_counter!(
        "bookings_committed_total",
        "Bookings committed to the seat ledger"
    );
    describe_counter!("booked_seats_total", "Seats claimed by committed bookings");
    describe_counter!(
        "bookings_conflicted_total",
        "Booking attempts rejected because seats were missing or already booked"
    );
    describe_counter!(
        "bookings_failed_total",
        "Booking attempts that failed on the ledger (busy, unavailable, commit)"
    );
    describe_counter!(
        "booking_reference_collisions_total",
        "Generated booking references that collided with an existing booking"
    );
    describe_histogram!(
        "booking_duration_seconds",
        "Time from request to booking outcome"
    );

    // Notifier
    describe_gauge!("notifier_observers", "Currently connected observers");
    describe_counter!(
        "notifier_updates_broadcast_total",
        "Seat updates fanned out to observers"
    );
    describe_counter!(
        "notifier_updates_dropped_total",
        "Seat updates dropped before reaching the dispatcher"
    );
    describe_counter!(
        "notifier_observers_dropped_total",
        "Observers disconnected because they were full or closed"
    );

    // Retry
    describe_counter!("retry_attempts_total", "Total number of retry attempts");
    describe_counter!(
        "retry_exhausted_total",
        "Operations that failed after using every attempt"
    );
}

/// Booking engine metrics recorder.
pub struct BookingMetrics;

impl BookingMetrics {
    /// Record a committed booking.
    pub fn record_committed(seats: usize, duration: Duration) {
        counter!("bookings_committed_total").increment(1);
        counter!("booked_seats_total").increment(seats as u64);
        histogram!("booking_duration_seconds").record(duration.as_secs_f64());
    }

    /// Record a seat conflict.
    pub fn record_conflict(duration: Duration) {
        counter!("bookings_conflicted_total").increment(1);
        histogram!("booking_duration_seconds").record(duration.as_secs_f64());
    }

    /// Record a ledger failure.
    pub fn record_failure(duration: Duration) {
        counter!("bookings_failed_total").increment(1);
        histogram!("booking_duration_seconds").record(duration.as_secs_f64());
    }

    /// Record a reference collision.
    pub fn record_reference_collision() {
        counter!("booking_reference_collisions_total").increment(1);
    }
}

/// Notifier metrics recorder.
pub struct NotifierMetrics;

impl NotifierMetrics {
    /// Record the number of connected observers.
    #[allow(clippy::cast_precision_loss)]
    pub fn record_observers(count: usize) {
        gauge!("notifier_observers").set(count as f64);
    }

    /// Record one broadcast pass.
    pub fn record_broadcast(dropped_observers: usize) {
        counter!("notifier_updates_broadcast_total").increment(1);
        if dropped_observers > 0 {
            counter!("notifier_observers_dropped_total").increment(dropped_observers as u64);
        }
    }

    /// Record an update lost before reaching the dispatcher.
    pub fn record_update_dropped() {
        counter!("notifier_updates_dropped_total").increment(1);
    }
}

/// Retry metrics recorder.
pub struct RetryMetrics;

impl RetryMetrics {
    /// Record a retry attempt.
    pub fn record_attempt() {
        counter!("retry_attempts_total").increment(1);
    }

    /// Record exhausted retries.
    pub fn record_exhausted() {
        counter!("retry_exhausted_total").increment(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exporter_starts_without_handle() {
        assert!(MetricsExporter::new().render().is_none());
    }

    #[test]
    fn install_tolerates_existing_recorder() {
        let mut first = MetricsExporter::new();
        let mut second = MetricsExporter::new();

        assert!(first.install().is_ok());
        assert!(second.install().is_ok());
    }

    #[test]
    fn recorded_booking_metrics_are_rendered() {
        let mut exporter = MetricsExporter::new();
        exporter.install().ok();

        BookingMetrics::record_committed(2, Duration::from_millis(5));
        NotifierMetrics::record_broadcast(1);

        // Another test may own the recorder; rendering is only checked when we do.
        if let Some(rendered) = exporter.render() {
            assert!(rendered.contains("bookings_committed_total"));
            assert!(rendered.contains("notifier_observers_dropped_total"));
        }
    }
}
