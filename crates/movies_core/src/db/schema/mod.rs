//! Idempotent schema creation and seed data.
//!
//! # Responsibility
//! - Create the `movies` and `genres` tables when they are missing.
//! - Insert the fixed seed catalog without duplicating existing rows.
//!
//! # Invariants
//! - Steps run in dependency order: `movies` before `genres`, movie seeds
//!   before genre seeds.
//! - Each step commits on its own; a failed step aborts initialization.
//! - Running initialization any number of times leaves the same rows.

use super::{ConnectionProvider, DbError, DbResult};
use log::{error, info};
use rusqlite::{params, Connection};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Instant;
use tokio_util::sync::CancellationToken;

mod seed;

use seed::SEED_MOVIES;

const CREATE_MOVIES_SQL: &str = include_str!("0001_movies.sql");
const CREATE_GENRES_SQL: &str = include_str!("0002_genres.sql");

/// Ordered initialization steps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InitStep {
    CreateMoviesTable,
    CreateGenresTable,
    SeedMovies,
    SeedGenres,
}

impl InitStep {
    pub const ALL: [InitStep; 4] = [
        Self::CreateMoviesTable,
        Self::CreateGenresTable,
        Self::SeedMovies,
        Self::SeedGenres,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::CreateMoviesTable => "create_movies_table",
            Self::CreateGenresTable => "create_genres_table",
            Self::SeedMovies => "seed_movies",
            Self::SeedGenres => "seed_genres",
        }
    }
}

/// Fatal startup failure; the process must not serve requests after it.
#[derive(Debug)]
pub struct InitError {
    pub step: InitStep,
    pub source: DbError,
}

impl Display for InitError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "schema initialization failed at step `{}`: {}",
            self.step.as_str(),
            self.source
        )
    }
}

impl Error for InitError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        Some(&self.source)
    }
}

/// Ensures tables and seed rows exist before the store is used.
pub struct SchemaInitializer {
    provider: ConnectionProvider,
}

impl SchemaInitializer {
    pub fn new(provider: ConnectionProvider) -> Self {
        Self { provider }
    }

    /// Runs every initialization step in order.
    ///
    /// # Errors
    /// - Returns [`InitError`] naming the first step that failed. Acquiring
    ///   the connection is attributed to the first step.
    pub async fn initialize(&self) -> Result<(), InitError> {
        let started_at = Instant::now();
        info!("event=schema_init module=db status=start");

        let mut conn = self.provider.acquire().await.map_err(|source| InitError {
            step: InitStep::CreateMoviesTable,
            source,
        })?;
        // Startup work is never cancelled by callers.
        let cancel = CancellationToken::new();

        for step in InitStep::ALL {
            let step_started_at = Instant::now();
            let outcome = conn.run(&cancel, move |db, _| run_step(db, step)).await;
            match outcome {
                Ok(affected) => info!(
                    "event=schema_init module=db step={} status=ok rows={} duration_ms={}",
                    step.as_str(),
                    affected,
                    step_started_at.elapsed().as_millis()
                ),
                Err(source) => {
                    error!(
                        "event=schema_init module=db step={} status=error duration_ms={} error={}",
                        step.as_str(),
                        step_started_at.elapsed().as_millis(),
                        source
                    );
                    return Err(InitError { step, source });
                }
            }
        }

        info!(
            "event=schema_init module=db status=ok duration_ms={}",
            started_at.elapsed().as_millis()
        );
        Ok(())
    }
}

fn run_step(conn: &mut Connection, step: InitStep) -> DbResult<usize> {
    let tx = conn.transaction()?;
    let affected = match step {
        InitStep::CreateMoviesTable => {
            tx.execute_batch(CREATE_MOVIES_SQL)?;
            0
        }
        InitStep::CreateGenresTable => {
            tx.execute_batch(CREATE_GENRES_SQL)?;
            0
        }
        InitStep::SeedMovies => {
            let mut stmt = tx.prepare(
                "INSERT INTO movies (id, title, slug, year_of_release)
                 SELECT ?1, ?2, ?3, ?4
                 WHERE NOT EXISTS (SELECT 1 FROM movies WHERE id = ?1);",
            )?;
            let mut inserted = 0;
            for movie in SEED_MOVIES {
                inserted += stmt.execute(params![
                    movie.id,
                    movie.title,
                    movie.slug,
                    movie.year_of_release
                ])?;
            }
            inserted
        }
        InitStep::SeedGenres => {
            let mut stmt = tx.prepare(
                "INSERT INTO genres (movie_id, name)
                 SELECT ?1, ?2
                 WHERE NOT EXISTS (
                    SELECT 1 FROM genres WHERE movie_id = ?1 AND name = ?2
                 );",
            )?;
            let mut inserted = 0;
            for movie in SEED_MOVIES {
                for genre in movie.genres {
                    inserted += stmt.execute(params![movie.id, genre])?;
                }
            }
            inserted
        }
    };
    tx.commit()?;
    Ok(affected)
}
