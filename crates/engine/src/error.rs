//! The module contains the error the engine can throw.
//!
//! The errors are:
//!
//! - [`CapacityExceeded`] thrown when an allocation would push a goal past
//!   its target; it carries the remaining capacity for the caller's message.
//! - [`NotFound`] thrown when an item is missing or not owned by the caller.
//! - [`LockTimeout`] thrown when the goal row lock could not be acquired;
//!   transient, the whole operation may be retried.
//!
//!  [`CapacityExceeded`]: EngineError::CapacityExceeded
//!  [`NotFound`]: EngineError::NotFound
//!  [`LockTimeout`]: EngineError::LockTimeout
use sea_orm::DbErr;
use thiserror::Error;

use crate::MoneyCents;

/// Engine custom errors.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("validation failed: {0}")]
    Validation(String),
    #[error("\"{0}\" not found!")]
    NotFound(String),
    #[error("goal capacity exceeded, {available} available")]
    CapacityExceeded { available: MoneyCents },
    #[error("lock not acquired: {0}")]
    LockTimeout(String),
    #[error("inconsistent state: {0}")]
    Inconsistent(String),
    #[error(transparent)]
    Database(DbErr),
}

impl From<DbErr> for EngineError {
    fn from(err: DbErr) -> Self {
        // SQLite reports contention as "database is locked"/"database table is
        // locked"; other backends mention lock timeouts. Both are transient.
        let message = err.to_string();
        let lowered = message.to_lowercase();
        if lowered.contains("locked") || lowered.contains("busy") || lowered.contains("deadlock") {
            return Self::LockTimeout(message);
        }
        Self::Database(err)
    }
}

impl PartialEq for EngineError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Validation(a), Self::Validation(b)) => a == b,
            (Self::NotFound(a), Self::NotFound(b)) => a == b,
            (
                Self::CapacityExceeded { available: a },
                Self::CapacityExceeded { available: b },
            ) => a == b,
            (Self::LockTimeout(a), Self::LockTimeout(b)) => a == b,
            (Self::Inconsistent(a), Self::Inconsistent(b)) => a == b,
            (Self::Database(a), Self::Database(b)) => a.to_string() == b.to_string(),
            _ => false,
        }
    }
}
