//! The module contains the error the engine can throw.
//!
//! The ledger-specific errors are:
//!
//! - [`OwnershipViolation`] thrown when a referenced record belongs to another
//!   owner.
//! - [`InvalidTransferCategory`] thrown when a transfer leg would carry a
//!   category of the wrong direction.
//! - [`ImmutableTransferAccount`] thrown when an update tries to move one leg
//!   of a transfer to another account.
//! - [`CorruptedTransferState`] thrown when a transfer id does not resolve to
//!   exactly one outgoing and one incoming leg.
//! - [`ResourceInUse`] thrown when an account or category still has
//!   transactions booked on it and cannot be deleted.
//! - [`LockConflict`] thrown when the database aborted the unit of work
//!   because of a concurrent mutation. The caller may resubmit.
//!
//!  [`OwnershipViolation`]: EngineError::OwnershipViolation
//!  [`InvalidTransferCategory`]: EngineError::InvalidTransferCategory
//!  [`ImmutableTransferAccount`]: EngineError::ImmutableTransferAccount
//!  [`CorruptedTransferState`]: EngineError::CorruptedTransferState
//!  [`ResourceInUse`]: EngineError::ResourceInUse
//!  [`LockConflict`]: EngineError::LockConflict
use sea_orm::DbErr;
use thiserror::Error;

/// Engine custom errors.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("\"{0}\" key not found!")]
    KeyNotFound(String),
    #[error("\"{0}\" already present!")]
    ExistingKey(String),
    #[error("Ownership violation: {0}")]
    OwnershipViolation(String),
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),
    #[error("Invalid name: {0}")]
    InvalidName(String),
    #[error("Invalid transfer: {0}")]
    InvalidTransfer(String),
    #[error("Invalid transfer category: {0}")]
    InvalidTransferCategory(String),
    #[error("Transfer account is immutable: {0}")]
    ImmutableTransferAccount(String),
    #[error("Corrupted transfer state: {0}")]
    CorruptedTransferState(String),
    #[error("Invalid budget: {0}")]
    InvalidBudget(String),
    #[error("Invalid cursor: {0}")]
    InvalidCursor(String),
    #[error("Invalid filter: {0}")]
    InvalidFilter(String),
    #[error("Invalid category: {0}")]
    InvalidCategory(String),
    #[error("Resource in use: {0}")]
    ResourceInUse(String),
    #[error("Lock conflict, retry the operation: {0}")]
    LockConflict(String),
    #[error(transparent)]
    Database(DbErr),
}

impl EngineError {
    /// Returns `true` when resubmitting the same operation may succeed.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::LockConflict(_))
    }
}

/// Markers of a transaction aborted by the database because another unit of
/// work holds (or raced for) the same rows. SQLite reports `SQLITE_BUSY` /
/// `SQLITE_LOCKED`, Postgres deadlocks and serialization failures, MySQL
/// lock-wait timeouts.
const LOCK_CONFLICT_MARKERS: [&str; 6] = [
    "database is locked",
    "database table is locked",
    "deadlock",
    "could not serialize",
    "lock wait timeout",
    "database is busy",
];

fn is_lock_conflict(err: &DbErr) -> bool {
    let message = err.to_string().to_lowercase();
    LOCK_CONFLICT_MARKERS
        .iter()
        .any(|marker| message.contains(marker))
}

impl From<DbErr> for EngineError {
    fn from(err: DbErr) -> Self {
        if is_lock_conflict(&err) {
            return Self::LockConflict(err.to_string());
        }
        Self::Database(err)
    }
}

impl PartialEq for EngineError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::KeyNotFound(a), Self::KeyNotFound(b)) => a == b,
            (Self::ExistingKey(a), Self::ExistingKey(b)) => a == b,
            (Self::OwnershipViolation(a), Self::OwnershipViolation(b)) => a == b,
            (Self::InvalidAmount(a), Self::InvalidAmount(b)) => a == b,
            (Self::InvalidName(a), Self::InvalidName(b)) => a == b,
            (Self::InvalidTransfer(a), Self::InvalidTransfer(b)) => a == b,
            (Self::InvalidTransferCategory(a), Self::InvalidTransferCategory(b)) => a == b,
            (Self::ImmutableTransferAccount(a), Self::ImmutableTransferAccount(b)) => a == b,
            (Self::CorruptedTransferState(a), Self::CorruptedTransferState(b)) => a == b,
            (Self::InvalidBudget(a), Self::InvalidBudget(b)) => a == b,
            (Self::InvalidCursor(a), Self::InvalidCursor(b)) => a == b,
            (Self::InvalidFilter(a), Self::InvalidFilter(b)) => a == b,
            (Self::InvalidCategory(a), Self::InvalidCategory(b)) => a == b,
            (Self::ResourceInUse(a), Self::ResourceInUse(b)) => a == b,
            (Self::LockConflict(a), Self::LockConflict(b)) => a == b,
            (Self::Database(a), Self::Database(b)) => a.to_string() == b.to_string(),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn busy_database_maps_to_lock_conflict() {
        let err = EngineError::from(DbErr::Custom(
            "error returned from database: (code: 5) database is locked".to_string(),
        ));
        assert!(matches!(err, EngineError::LockConflict(_)));
        assert!(err.is_retryable());
    }

    #[test]
    fn deadlock_maps_to_lock_conflict() {
        let err = EngineError::from(DbErr::Custom("ERROR: deadlock detected".to_string()));
        assert!(matches!(err, EngineError::LockConflict(_)));
    }

    #[test]
    fn other_database_errors_stay_database() {
        let err = EngineError::from(DbErr::RecordNotFound("accounts".to_string()));
        assert!(matches!(err, EngineError::Database(_)));
        assert!(!err.is_retryable());
    }
}
