//! Store Transaction Helpers
//!
//! The store's counter allocations run in SERIALIZABLE transactions and
//! are retried on serialization conflict up to a bounded attempt count,
//! after which they surface as Internal. Callers of a committed
//! transaction never observe a skipped or duplicated counter value.

/// Maximum attempts for a conflicting serializable transaction
pub(crate) const MAX_TXN_ATTEMPTS: u32 = 3;

/// PostgreSQL SQLSTATE codes that mean "retry the transaction"
///
/// 40001 serialization_failure, 40P01 deadlock_detected.
pub(crate) fn is_serialization_conflict(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => {
            matches!(db_err.code().as_deref(), Some("40001") | Some("40P01"))
        }
        _ => false,
    }
}
