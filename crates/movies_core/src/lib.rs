//! Data-access layer for the movie catalog.
//! This crate owns the storage invariants for movies and their genre tags.

pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;

pub use config::{CatalogConfig, ConfigError};
pub use db::schema::{InitError, InitStep, SchemaInitializer};
pub use db::{ConnectionProvider, DbConfig, DbConnection, DbError, DbResult};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::movie::{derive_slug, Movie, MovieId, MovieValidationError};
pub use repo::movie_repo::{MovieRepository, SqliteMovieRepository, StoreError, StoreResult};
pub use tokio_util::sync::CancellationToken;

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
