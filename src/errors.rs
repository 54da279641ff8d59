//! Unified error type for the budget engine.
//!
//! Business rejections (`BudgetExceeded`, `InvalidAmount`, `Unauthorized`, ...) and
//! infrastructure failures share one enum so every layer can propagate with `?`.
//! [`Error::code`] gives the stable string used in outcome documents.

use crate::{core::lifecycle::Stage, money::Money};
use sea_orm::{DbErr, RuntimeErr};
use thiserror::Error;

/// All errors produced by the crate.
#[derive(Debug, Error)]
pub enum Error {
    /// Admission rejected: the prospective commitment does not fit the capacity.
    #[error(
        "Budget exceeded for sector {sector} / unit {unit}: reserved {reserved} + requested {requested} exceeds capacity {capacity}. Increase the allocation, register a surplus, or cancel existing reservations"
    )]
    BudgetExceeded {
        /// Requesting sector
        sector: String,
        /// Budgetary unit
        unit: String,
        /// Amount already reserved by other active records
        reserved: Money,
        /// Amount the rejected write would reserve
        requested: Money,
        /// Effective capacity (allocation plus surpluses)
        capacity: Money,
    },

    /// A zero or negative amount where a positive one is required (or negative allocation).
    #[error("Invalid amount: {amount}")]
    InvalidAmount {
        /// The offending amount
        amount: Money,
    },

    /// Surplus approval attempted by someone who is not an active administrator.
    #[error("User {user_id} is not authorized to approve budget surpluses")]
    Unauthorized {
        /// The identity that attempted the approval
        user_id: String,
    },

    /// No procurement record with the given id.
    #[error("Procurement record {id} not found")]
    RecordNotFound {
        /// Requested record id
        id: i64,
    },

    /// Stage change not allowed by the record lifecycle.
    #[error("Invalid stage transition from {from} to {to}")]
    InvalidTransition {
        /// Current stage
        from: Stage,
        /// Requested stage
        to: Stage,
    },

    /// Malformed or blank input.
    #[error("Invalid input: {message}")]
    InvalidInput {
        /// What was wrong
        message: String,
    },

    /// Configuration file or environment problem.
    #[error("Configuration error: {message}")]
    Config {
        /// What was wrong
        message: String,
    },

    /// Database error from `SeaORM`.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error (audit snapshots, outcomes).
    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Stable error code used in outcome documents.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::BudgetExceeded { .. } => "BudgetExceeded",
            Self::InvalidAmount { .. } => "InvalidAmount",
            Self::Unauthorized { .. } => "Unauthorized",
            Self::RecordNotFound { .. } => "NotFound",
            Self::InvalidTransition { .. } => "InvalidTransition",
            Self::InvalidInput { .. } => "InvalidInput",
            Self::Config { .. } => "ConfigError",
            Self::Database(_) | Self::Io(_) | Self::Json(_) => "StoreError",
        }
    }

    /// Whether the failure is a business rejection that must not be retried.
    #[must_use]
    pub const fn is_rejection(&self) -> bool {
        matches!(
            self,
            Self::BudgetExceeded { .. }
                | Self::InvalidAmount { .. }
                | Self::Unauthorized { .. }
                | Self::RecordNotFound { .. }
                | Self::InvalidTransition { .. }
                | Self::InvalidInput { .. }
        )
    }

    /// Whether the failure is worth retrying with backoff: a lost connection,
    /// or `SQLite` reporting the file busy or locked by another connection.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Database(DbErr::Conn(_) | DbErr::ConnectionAcquire(_)) => true,
            Self::Database(
                DbErr::Exec(RuntimeErr::SqlxError(err)) | DbErr::Query(RuntimeErr::SqlxError(err)),
            ) => err
                .as_database_error()
                .and_then(|db| db.code())
                .is_some_and(|code| is_busy_code(&code)),
            _ => false,
        }
    }
}

/// `SQLITE_BUSY` (5) or `SQLITE_LOCKED` (6), extended codes included.
fn is_busy_code(code: &str) -> bool {
    code.parse::<i32>()
        .is_ok_and(|code| matches!(code & 0xff, 5 | 6))
}

/// Convenience `Result` type
pub type Result<T> = std::result::Result<T, Error>;
