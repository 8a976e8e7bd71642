//! Connection provider for the catalog database.
//!
//! # Responsibility
//! - Open one independent SQLite connection per unit of work.
//! - Configure connection pragmas required by store behavior.
//! - Execute blocking SQLite work on the Tokio blocking pool with
//!   cooperative cancellation.
//!
//! # Invariants
//! - Returned connections have `foreign_keys=ON` and have proven the target
//!   file is a readable database.
//! - A connection is closed when its `DbConnection` is dropped, on every exit
//!   path.
//! - Once work has committed, cancellation no longer changes its result.

use super::{DbConfig, DbError, DbResult};
use log::{debug, error};
use rusqlite::Connection;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Instant;
use tokio_util::sync::CancellationToken;

const PROGRESS_CHECK_INTERVAL_OPS: i32 = 1_000;

/// Opens ready-to-use connections against one configured data source.
///
/// Cloning is cheap; all clones share the same immutable configuration.
#[derive(Debug, Clone)]
pub struct ConnectionProvider {
    config: Arc<DbConfig>,
}

impl ConnectionProvider {
    pub fn new(config: DbConfig) -> Self {
        Self {
            config: Arc::new(config),
        }
    }

    /// Opens a new live connection.
    ///
    /// # Errors
    /// - [`DbError::Connection`] when the file cannot be opened or is not a
    ///   SQLite database.
    ///
    /// # Side effects
    /// - Emits `db_open` logging events with duration and status.
    pub async fn acquire(&self) -> DbResult<DbConnection> {
        let config = Arc::clone(&self.config);
        let conn = tokio::task::spawn_blocking(move || open_connection(&config))
            .await
            .map_err(|err| DbError::Worker(err.to_string()))??;
        Ok(DbConnection { conn: Some(conn) })
    }
}

/// One acquired connection.
pub struct DbConnection {
    conn: Option<Connection>,
}

impl DbConnection {
    /// Runs blocking `work` against this connection.
    ///
    /// `work` receives the caller's token so that write paths can re-check it
    /// right before committing. When the token fires mid-flight, the running
    /// statement is interrupted and this call waits for `work` to unwind, so
    /// any open transaction is rolled back before the error is returned.
    ///
    /// Work that starts after the token fired never runs. Work that is
    /// already past its last statement only observes the token through
    /// [`super::ensure_not_cancelled`].
    pub async fn run<T, E, F>(&mut self, cancel: &CancellationToken, work: F) -> Result<T, E>
    where
        F: FnOnce(&mut Connection, &CancellationToken) -> Result<T, E> + Send + 'static,
        T: Send + 'static,
        E: From<DbError> + Send + 'static,
    {
        if cancel.is_cancelled() {
            return Err(DbError::Cancelled.into());
        }

        let mut conn = self
            .conn
            .take()
            .ok_or_else(|| DbError::Worker("connection was lost by a previous task".into()))?;
        let interrupt = conn.get_interrupt_handle();
        let worker_cancel = cancel.clone();
        let mut task = tokio::task::spawn_blocking(move || {
            // Catches statements that start after the token already fired,
            // which `interrupt()` alone would miss.
            let watched = AssertUnwindSafe(worker_cancel.clone());
            conn.progress_handler(
                PROGRESS_CHECK_INTERVAL_OPS,
                Some(move || watched.is_cancelled()),
            );
            // The token may fire while this task waits for a blocking thread.
            let result = if worker_cancel.is_cancelled() {
                Err(DbError::Cancelled.into())
            } else {
                work(&mut conn, &worker_cancel)
            };
            conn.progress_handler(0, None::<fn() -> bool>);
            (conn, result)
        });

        let joined = tokio::select! {
            biased;
            joined = &mut task => joined,
            () = cancel.cancelled() => {
                debug!("event=db_cancel module=db status=interrupt");
                interrupt.interrupt();
                task.await
            }
        };

        let (conn, result) = joined.map_err(|err| DbError::Worker(err.to_string()))?;
        self.conn = Some(conn);
        result
    }
}

fn open_connection(config: &DbConfig) -> DbResult<Connection> {
    let started_at = Instant::now();
    debug!("event=db_open module=db status=start mode=file");

    let conn = Connection::open(&config.path).and_then(|conn| {
        bootstrap_connection(&conn, config)?;
        Ok(conn)
    });

    match conn {
        Ok(conn) => {
            debug!(
                "event=db_open module=db status=ok mode=file duration_ms={}",
                started_at.elapsed().as_millis()
            );
            Ok(conn)
        }
        Err(err) => {
            error!(
                "event=db_open module=db status=error mode=file duration_ms={} error_code=db_open_failed error={}",
                started_at.elapsed().as_millis(),
                err
            );
            Err(DbError::Connection(err))
        }
    }
}

fn bootstrap_connection(conn: &Connection, config: &DbConfig) -> rusqlite::Result<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.busy_timeout(config.busy_timeout)?;
    // Forces a header read so non-database files fail here, not mid-operation.
    conn.query_row("PRAGMA schema_version;", [], |row| row.get::<_, i64>(0))?;
    Ok(())
}
