//! SQLite storage bootstrap and schema initialization entry points.
//!
//! # Responsibility
//! - Open and configure one SQLite connection per unit of work.
//! - Run blocking SQLite work off the async runtime with cancellation.
//! - Create tables and seed rows idempotently at startup.
//!
//! # Invariants
//! - Every connection has `foreign_keys=ON`.
//! - Constraint failures are classified into duplicate-key and generic
//!   constraint errors instead of being surfaced as raw driver errors.

use rusqlite::ffi;
use rusqlite::ErrorCode;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

mod open;
pub mod schema;

pub use open::{ConnectionProvider, DbConnection};

pub type DbResult<T> = Result<T, DbError>;

const DEFAULT_BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Immutable data-source settings shared by every acquired connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DbConfig {
    pub path: PathBuf,
    pub busy_timeout: Duration,
}

impl DbConfig {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            busy_timeout: DEFAULT_BUSY_TIMEOUT,
        }
    }

    pub fn with_busy_timeout(mut self, busy_timeout: Duration) -> Self {
        self.busy_timeout = busy_timeout;
        self
    }
}

#[derive(Debug)]
pub enum DbError {
    /// Data source could not be opened or bootstrapped.
    Connection(rusqlite::Error),
    /// Primary-key or unique constraint violation.
    DuplicateKey(rusqlite::Error),
    /// Any other constraint violation, e.g. a dangling foreign key.
    ConstraintViolation(rusqlite::Error),
    /// Caller cancellation fired before commit.
    Cancelled,
    /// The blocking worker died before handing the connection back.
    Worker(String),
    Sqlite(rusqlite::Error),
}

impl DbError {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

impl Display for DbError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Connection(err) => write!(f, "database connection failed: {err}"),
            Self::DuplicateKey(err) => write!(f, "duplicate key: {err}"),
            Self::ConstraintViolation(err) => write!(f, "constraint violation: {err}"),
            Self::Cancelled => write!(f, "database operation cancelled"),
            Self::Worker(message) => write!(f, "database worker failed: {message}"),
            Self::Sqlite(err) => write!(f, "{err}"),
        }
    }
}

impl Error for DbError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Connection(err)
            | Self::DuplicateKey(err)
            | Self::ConstraintViolation(err)
            | Self::Sqlite(err) => Some(err),
            Self::Cancelled | Self::Worker(_) => None,
        }
    }
}

impl From<rusqlite::Error> for DbError {
    fn from(value: rusqlite::Error) -> Self {
        let (code, extended_code) = match &value {
            rusqlite::Error::SqliteFailure(failure, _) => (failure.code, failure.extended_code),
            _ => return Self::Sqlite(value),
        };

        match code {
            ErrorCode::ConstraintViolation => match extended_code {
                ffi::SQLITE_CONSTRAINT_PRIMARYKEY | ffi::SQLITE_CONSTRAINT_UNIQUE => {
                    Self::DuplicateKey(value)
                }
                _ => Self::ConstraintViolation(value),
            },
            ErrorCode::OperationInterrupted => Self::Cancelled,
            _ => Self::Sqlite(value),
        }
    }
}

/// Fails with [`DbError::Cancelled`] once `cancel` has fired.
///
/// Write paths call this right before `commit`, which is the last point at
/// which cancellation still rolls the unit of work back.
pub fn ensure_not_cancelled(cancel: &CancellationToken) -> DbResult<()> {
    if cancel.is_cancelled() {
        return Err(DbError::Cancelled);
    }
    Ok(())
}
