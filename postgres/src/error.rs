//! Translation of `sqlx` failures into [`LedgerError`].

use boxoffice_core::LedgerError;

/// `lock_not_available`: `lock_timeout` expired.
const LOCK_NOT_AVAILABLE: &str = "55P03";
/// `deadlock_detected`.
const DEADLOCK_DETECTED: &str = "40P01";
/// `query_canceled`: `statement_timeout` expired.
const QUERY_CANCELED: &str = "57014";
/// `unique_violation`.
const UNIQUE_VIOLATION: &str = "23505";
/// Unique constraint on `bookings.reference`.
pub(crate) const REFERENCE_CONSTRAINT: &str = "bookings_reference_key";

/// Classify a `sqlx` error.
///
/// - connection, pool and I/O failures → `StoreUnavailable`
/// - lock timeout, deadlock, statement timeout → `Busy`
/// - unique violation on the booking reference → `DuplicateReference`
/// - everything else → `Query`
pub(crate) fn classify(err: sqlx::Error) -> LedgerError {
    match &err {
        sqlx::Error::Database(db) => {
            let code = db.code();
            match code.as_deref() {
                Some(LOCK_NOT_AVAILABLE | DEADLOCK_DETECTED | QUERY_CANCELED) => {
                    LedgerError::Busy(db.message().to_string())
                }
                Some(UNIQUE_VIOLATION) if db.constraint() == Some(REFERENCE_CONSTRAINT) => {
                    LedgerError::DuplicateReference(db.message().to_string())
                }
                // Class 08: connection exception; class 57P: operator intervention
                Some(code) if code.starts_with("08") || code.starts_with("57P") => {
                    LedgerError::StoreUnavailable(db.message().to_string())
                }
                _ => LedgerError::Query(err.to_string()),
            }
        }
        sqlx::Error::Io(_)
        | sqlx::Error::Tls(_)
        | sqlx::Error::PoolTimedOut
        | sqlx::Error::PoolClosed
        | sqlx::Error::WorkerCrashed
        | sqlx::Error::Configuration(_) => LedgerError::StoreUnavailable(err.to_string()),
        _ => LedgerError::Query(err.to_string()),
    }
}
