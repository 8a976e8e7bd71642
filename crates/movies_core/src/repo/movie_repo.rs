//! Movie repository contract and SQLite implementation.
//!
//! # Responsibility
//! - Provide async CRUD/list/exists APIs over `movies` + `genres` storage.
//! - Compose multi-statement writes into single transactions.
//! - Keep SQL and row mapping inside the persistence boundary.
//!
//! # Invariants
//! - Write paths call `Movie::validate()` before any SQL is issued.
//! - Genre rows are deleted before their movie row, in the same transaction.
//! - A genre set is always rewritten in full, never merged.
//! - `update` on a missing id rolls back, leaving no orphaned genre rows.
//! - Read paths reject unparseable persisted ids instead of masking them.

use crate::db::{ensure_not_cancelled, ConnectionProvider, DbError};
use crate::model::movie::{split_genre_list, Movie, MovieId, MovieValidationError};
use async_trait::async_trait;
use log::{debug, info, warn};
use rusqlite::{params, Connection, Row, Transaction, TransactionBehavior};
use std::collections::BTreeSet;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Instant;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

const MOVIE_SELECT_SQL: &str = "SELECT
    id,
    title,
    slug,
    year_of_release
FROM movies";

pub(crate) const MOVIE_LIST_SQL: &str = "SELECT
    m.id,
    m.title,
    m.slug,
    m.year_of_release,
    group_concat(g.name, ',' ORDER BY g.name) AS genre_list
FROM movies m
LEFT JOIN genres g ON g.movie_id = m.id
GROUP BY m.id, m.title, m.slug, m.year_of_release;";

pub type StoreResult<T> = Result<T, StoreError>;

/// Error for movie persistence and query operations.
#[derive(Debug)]
pub enum StoreError {
    Validation(MovieValidationError),
    Db(DbError),
    InvalidData(String),
}

impl StoreError {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Db(DbError::Cancelled))
    }

    pub fn is_duplicate_key(&self) -> bool {
        matches!(self, Self::Db(DbError::DuplicateKey(_)))
    }
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::InvalidData(message) => write!(f, "invalid persisted movie data: {message}"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            Self::InvalidData(_) => None,
        }
    }
}

impl From<MovieValidationError> for StoreError {
    fn from(value: MovieValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for StoreError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::from(value))
    }
}

/// Repository interface for catalog operations.
///
/// Every call takes a cancellation token; firing it aborts in-flight
/// database work and the call fails with [`DbError::Cancelled`].
#[async_trait]
pub trait MovieRepository: Send + Sync {
    async fn create(&self, movie: &Movie, cancel: &CancellationToken) -> StoreResult<bool>;
    async fn exists_by_id(&self, id: MovieId, cancel: &CancellationToken) -> StoreResult<bool>;
    async fn get_all(&self, cancel: &CancellationToken) -> StoreResult<Vec<Movie>>;
    async fn get_by_id(
        &self,
        id: MovieId,
        cancel: &CancellationToken,
    ) -> StoreResult<Option<Movie>>;
    async fn get_by_slug(
        &self,
        slug: &str,
        cancel: &CancellationToken,
    ) -> StoreResult<Option<Movie>>;
    async fn update(&self, movie: &Movie, cancel: &CancellationToken) -> StoreResult<bool>;
    async fn delete_by_id(&self, id: MovieId, cancel: &CancellationToken) -> StoreResult<bool>;
}

/// SQLite-backed movie repository.
///
/// Each operation acquires its own connection from the provider and releases
/// it when the operation returns.
#[derive(Debug, Clone)]
pub struct SqliteMovieRepository {
    provider: ConnectionProvider,
}

impl SqliteMovieRepository {
    pub fn new(provider: ConnectionProvider) -> Self {
        Self { provider }
    }

    async fn with_connection<T, F>(
        &self,
        event: &'static str,
        cancel: &CancellationToken,
        work: F,
    ) -> StoreResult<T>
    where
        F: FnOnce(&mut Connection, &CancellationToken) -> StoreResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let started_at = Instant::now();
        let result = if cancel.is_cancelled() {
            Err(DbError::Cancelled.into())
        } else {
            match self.provider.acquire().await {
                Ok(mut conn) => conn.run(cancel, work).await,
                Err(err) => Err(err.into()),
            }
        };

        let duration_ms = started_at.elapsed().as_millis();
        match &result {
            Ok(_) => debug!("event={event} module=repo status=ok duration_ms={duration_ms}"),
            Err(err) if err.is_cancelled() => {
                info!("event={event} module=repo status=cancelled duration_ms={duration_ms}")
            }
            Err(err) => warn!(
                "event={event} module=repo status=error duration_ms={duration_ms} error={err}"
            ),
        }
        result
    }
}

#[async_trait]
impl MovieRepository for SqliteMovieRepository {
    async fn create(&self, movie: &Movie, cancel: &CancellationToken) -> StoreResult<bool> {
        movie.validate()?;
        let movie = movie.clone();

        self.with_connection("movie_create", cancel, move |conn, cancel| {
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
            let id_text = movie.id.to_string();
            let inserted = tx.execute(
                "INSERT INTO movies (id, title, slug, year_of_release)
                 VALUES (?1, ?2, ?3, ?4);",
                params![
                    id_text.as_str(),
                    movie.title.as_str(),
                    movie.slug.as_str(),
                    movie.year_of_release
                ],
            )?;

            if inserted > 0 {
                insert_genres(&tx, &id_text, &movie.genres)?;
            }

            ensure_not_cancelled(cancel)?;
            tx.commit()?;
            Ok(inserted > 0)
        })
        .await
    }

    async fn exists_by_id(&self, id: MovieId, cancel: &CancellationToken) -> StoreResult<bool> {
        self.with_connection("movie_exists", cancel, move |conn, cancel| {
            let count: i64 = conn.query_row(
                "SELECT COUNT(1) FROM movies WHERE id = ?1;",
                [id.to_string()],
                |row| row.get(0),
            )?;
            ensure_not_cancelled(cancel)?;
            Ok(count > 0)
        })
        .await
    }

    async fn get_all(&self, cancel: &CancellationToken) -> StoreResult<Vec<Movie>> {
        self.with_connection("movie_list", cancel, |conn, cancel| {
            let mut stmt = conn.prepare(MOVIE_LIST_SQL)?;
            let mut rows = stmt.query([])?;
            let mut movies = Vec::new();

            while let Some(row) = rows.next()? {
                let genre_list: Option<String> = row.get("genre_list")?;
                movies.push(parse_movie_row(row, split_genre_list(genre_list.as_deref()))?);
            }

            ensure_not_cancelled(cancel)?;
            Ok(movies)
        })
        .await
    }

    async fn get_by_id(
        &self,
        id: MovieId,
        cancel: &CancellationToken,
    ) -> StoreResult<Option<Movie>> {
        self.with_connection("movie_get_by_id", cancel, move |conn, cancel| {
            let movie = load_movie(conn, "id", &id.to_string())?;
            ensure_not_cancelled(cancel)?;
            Ok(movie)
        })
        .await
    }

    async fn get_by_slug(
        &self,
        slug: &str,
        cancel: &CancellationToken,
    ) -> StoreResult<Option<Movie>> {
        let slug = slug.to_string();
        self.with_connection("movie_get_by_slug", cancel, move |conn, cancel| {
            let movie = load_movie(conn, "slug", &slug)?;
            ensure_not_cancelled(cancel)?;
            Ok(movie)
        })
        .await
    }

    async fn update(&self, movie: &Movie, cancel: &CancellationToken) -> StoreResult<bool> {
        movie.validate()?;
        let movie = movie.clone();

        self.with_connection("movie_update", cancel, move |conn, cancel| {
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
            let id_text = movie.id.to_string();

            tx.execute("DELETE FROM genres WHERE movie_id = ?1;", [id_text.as_str()])?;

            let updated = tx.execute(
                "UPDATE movies
                 SET
                    title = ?1,
                    slug = ?2,
                    year_of_release = ?3
                 WHERE id = ?4;",
                params![
                    movie.title.as_str(),
                    movie.slug.as_str(),
                    movie.year_of_release,
                    id_text.as_str()
                ],
            )?;

            if updated == 0 {
                tx.rollback()?;
                return Ok(false);
            }

            insert_genres(&tx, &id_text, &movie.genres)?;

            ensure_not_cancelled(cancel)?;
            tx.commit()?;
            Ok(true)
        })
        .await
    }

    async fn delete_by_id(&self, id: MovieId, cancel: &CancellationToken) -> StoreResult<bool> {
        self.with_connection("movie_delete", cancel, move |conn, cancel| {
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
            let id_text = id.to_string();

            tx.execute("DELETE FROM genres WHERE movie_id = ?1;", [id_text.as_str()])?;
            let deleted = tx.execute("DELETE FROM movies WHERE id = ?1;", [id_text.as_str()])?;

            ensure_not_cancelled(cancel)?;
            tx.commit()?;
            Ok(deleted > 0)
        })
        .await
    }
}

fn insert_genres(
    tx: &Transaction<'_>,
    movie_id: &str,
    genres: &BTreeSet<String>,
) -> StoreResult<()> {
    let mut stmt = tx.prepare("INSERT INTO genres (movie_id, name) VALUES (?1, ?2);")?;
    for genre in genres {
        stmt.execute(params![movie_id, genre.as_str()])?;
    }
    Ok(())
}

/// Loads one movie row keyed by `column`, then its genre labels.
fn load_movie(conn: &Connection, column: &'static str, key: &str) -> StoreResult<Option<Movie>> {
    let mut stmt = conn.prepare(&format!("{MOVIE_SELECT_SQL} WHERE {column} = ?1;"))?;
    let mut rows = stmt.query([key])?;
    let Some(row) = rows.next()? else {
        return Ok(None);
    };

    let id_text: String = row.get("id")?;
    let genres = load_genres(conn, &id_text)?;
    Ok(Some(parse_movie_row(row, genres)?))
}

fn load_genres(conn: &Connection, movie_id: &str) -> StoreResult<BTreeSet<String>> {
    let mut stmt = conn.prepare("SELECT name FROM genres WHERE movie_id = ?1 ORDER BY name;")?;
    let genres = stmt
        .query_map([movie_id], |row| row.get::<_, String>(0))?
        .collect::<Result<BTreeSet<_>, _>>()?;
    Ok(genres)
}

fn parse_movie_row(row: &Row<'_>, genres: BTreeSet<String>) -> StoreResult<Movie> {
    let id_text: String = row.get("id")?;
    let id = Uuid::parse_str(&id_text).map_err(|_| {
        StoreError::InvalidData(format!("invalid uuid value `{id_text}` in movies.id"))
    })?;

    Ok(Movie {
        id,
        title: row.get("title")?,
        slug: row.get("slug")?,
        year_of_release: row.get("year_of_release")?,
        genres,
    })
}
