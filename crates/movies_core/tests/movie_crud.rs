use movies_core::{
    CancellationToken, ConnectionProvider, DbConfig, DbError, Movie, MovieRepository,
    MovieValidationError, SchemaInitializer, SqliteMovieRepository, StoreError,
};
use rusqlite::Connection;
use std::collections::BTreeSet;
use std::path::PathBuf;
use tempfile::TempDir;
use uuid::Uuid;

const INCEPTION_ID: &str = "11111111-1111-4111-8111-111111111111";
const MATRIX_ID: &str = "3d68b6c1-6ed8-4e99-a3e3-f19b92d49705";
const SEED_MOVIE_COUNT: usize = 10;

struct Fixture {
    _dir: TempDir,
    path: PathBuf,
    repo: SqliteMovieRepository,
    cancel: CancellationToken,
}

async fn fixture() -> Fixture {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("movies.db");
    let provider = ConnectionProvider::new(DbConfig::new(&path));
    SchemaInitializer::new(provider.clone())
        .initialize()
        .await
        .unwrap();

    Fixture {
        _dir: dir,
        path,
        repo: SqliteMovieRepository::new(provider),
        cancel: CancellationToken::new(),
    }
}

fn inception() -> Movie {
    let id = Uuid::parse_str(INCEPTION_ID).unwrap();
    Movie::with_id(id, "Inception", 2010, ["Sci-Fi", "Action"]).unwrap()
}

fn genres(labels: &[&str]) -> BTreeSet<String> {
    labels.iter().map(|label| label.to_string()).collect()
}

#[tokio::test]
async fn create_and_get_by_id_roundtrip() {
    let fx = fixture().await;
    let movie = inception();

    assert!(fx.repo.create(&movie, &fx.cancel).await.unwrap());

    let loaded = fx
        .repo
        .get_by_id(movie.id, &fx.cancel)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(loaded, movie);
    assert_eq!(loaded.slug, "inception-2010");
    assert_eq!(
        loaded.genres.iter().collect::<Vec<_>>(),
        vec!["Action", "Sci-Fi"]
    );
}

#[tokio::test]
async fn get_all_aggregates_genres_in_sorted_order() {
    let fx = fixture().await;
    let movie = inception();
    fx.repo.create(&movie, &fx.cancel).await.unwrap();

    let all = fx.repo.get_all(&fx.cancel).await.unwrap();
    assert_eq!(all.len(), SEED_MOVIE_COUNT + 1);

    let listed = all.iter().find(|item| item.id == movie.id).unwrap();
    assert_eq!(listed, &movie);
    assert_eq!(
        movies_core::model::movie::join_genre_list(&listed.genres),
        "Action,Sci-Fi"
    );
}

#[tokio::test]
async fn create_twice_fails_with_duplicate_key() {
    let fx = fixture().await;
    let movie = inception();
    fx.repo.create(&movie, &fx.cancel).await.unwrap();

    let err = fx.repo.create(&movie, &fx.cancel).await.unwrap_err();
    assert!(err.is_duplicate_key(), "unexpected error: {err}");
}

#[tokio::test]
async fn create_with_taken_slug_fails_and_writes_nothing() {
    let fx = fixture().await;
    let mut copycat = Movie::new("The Matrix", 1999, ["Action"]);
    assert_eq!(copycat.slug, "the-matrix-1999");

    let err = fx.repo.create(&copycat, &fx.cancel).await.unwrap_err();
    assert!(err.is_duplicate_key(), "unexpected error: {err}");
    assert!(!fx.repo.exists_by_id(copycat.id, &fx.cancel).await.unwrap());
    assert_eq!(genre_rows_for(&fx, copycat.id), 0);

    copycat.title = "The Matrix (Director's Cut)".to_string();
    copycat.refresh_slug();
    assert!(fx.repo.create(&copycat, &fx.cancel).await.unwrap());
}

#[tokio::test]
async fn movie_without_genres_lists_with_empty_set() {
    let fx = fixture().await;
    let movie = Movie::new("Untagged Film", 2021, Vec::<String>::new());
    fx.repo.create(&movie, &fx.cancel).await.unwrap();

    let all = fx.repo.get_all(&fx.cancel).await.unwrap();
    let listed = all.iter().find(|item| item.id == movie.id).unwrap();
    assert!(listed.genres.is_empty());

    let loaded = fx
        .repo
        .get_by_id(movie.id, &fx.cancel)
        .await
        .unwrap()
        .unwrap();
    assert!(loaded.genres.is_empty());
}

#[tokio::test]
async fn update_replaces_fields_and_whole_genre_set() {
    let fx = fixture().await;
    let mut movie = inception();
    fx.repo.create(&movie, &fx.cancel).await.unwrap();

    movie.title = "Inception: Extended".to_string();
    movie.year_of_release = 2011;
    movie.refresh_slug();
    movie.genres = genres(&["Thriller", "Action"]);
    assert!(fx.repo.update(&movie, &fx.cancel).await.unwrap());

    let loaded = fx
        .repo
        .get_by_id(movie.id, &fx.cancel)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(loaded.slug, "inception-extended-2011");
    assert_eq!(loaded.genres, genres(&["Action", "Thriller"]));
    assert!(!loaded.genres.contains("Sci-Fi"));
    assert!(fx
        .repo
        .get_by_slug("inception-2010", &fx.cancel)
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn update_missing_id_returns_false_and_leaves_no_genre_rows() {
    let fx = fixture().await;
    let ghost = Movie::new("Ghost Movie", 1999, ["Horror"]);

    assert!(!fx.repo.update(&ghost, &fx.cancel).await.unwrap());
    assert!(!fx.repo.exists_by_id(ghost.id, &fx.cancel).await.unwrap());
    assert_eq!(genre_rows_for(&fx, ghost.id), 0);
}

#[tokio::test]
async fn update_to_taken_slug_fails_and_keeps_previous_genres() {
    let fx = fixture().await;
    let mut movie = inception();
    fx.repo.create(&movie, &fx.cancel).await.unwrap();

    movie.slug = "the-matrix-1999".to_string();
    movie.genres = genres(&["Drama"]);
    let err = fx.repo.update(&movie, &fx.cancel).await.unwrap_err();
    assert!(err.is_duplicate_key(), "unexpected error: {err}");

    let loaded = fx
        .repo
        .get_by_id(movie.id, &fx.cancel)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(loaded, inception());
}

#[tokio::test]
async fn delete_removes_movie_and_its_genres() {
    let fx = fixture().await;
    let movie = inception();
    fx.repo.create(&movie, &fx.cancel).await.unwrap();

    assert!(fx.repo.delete_by_id(movie.id, &fx.cancel).await.unwrap());

    assert!(!fx.repo.exists_by_id(movie.id, &fx.cancel).await.unwrap());
    assert_eq!(genre_rows_for(&fx, movie.id), 0);
    let all = fx.repo.get_all(&fx.cancel).await.unwrap();
    assert!(all.iter().all(|item| item.id != movie.id));
    assert_eq!(all.len(), SEED_MOVIE_COUNT);
}

#[tokio::test]
async fn delete_missing_id_returns_false_and_changes_nothing() {
    let fx = fixture().await;
    let before = sorted(fx.repo.get_all(&fx.cancel).await.unwrap());

    assert!(!fx
        .repo
        .delete_by_id(Uuid::new_v4(), &fx.cancel)
        .await
        .unwrap());

    let after = sorted(fx.repo.get_all(&fx.cancel).await.unwrap());
    assert_eq!(before, after);
}

#[tokio::test]
async fn get_by_slug_and_get_by_id_agree() {
    let fx = fixture().await;
    let matrix_id = Uuid::parse_str(MATRIX_ID).unwrap();

    let by_id = fx
        .repo
        .get_by_id(matrix_id, &fx.cancel)
        .await
        .unwrap()
        .unwrap();
    let by_slug = fx
        .repo
        .get_by_slug("the-matrix-1999", &fx.cancel)
        .await
        .unwrap()
        .unwrap();

    assert_eq!(by_id, by_slug);
    assert_eq!(by_id.title, "The Matrix");
    assert_eq!(by_id.genres, genres(&["Action", "Sci-Fi"]));
}

#[tokio::test]
async fn lookups_for_unknown_keys_return_none() {
    let fx = fixture().await;

    assert!(fx
        .repo
        .get_by_id(Uuid::new_v4(), &fx.cancel)
        .await
        .unwrap()
        .is_none());
    assert!(fx
        .repo
        .get_by_slug("no-such-movie-1900", &fx.cancel)
        .await
        .unwrap()
        .is_none());
    assert!(!fx
        .repo
        .exists_by_id(Uuid::new_v4(), &fx.cancel)
        .await
        .unwrap());
}

#[tokio::test]
async fn validation_rejects_comma_genre_before_writing() {
    let fx = fixture().await;
    let movie = Movie::new("Split Genres", 2005, ["Action,Drama"]);

    let err = fx.repo.create(&movie, &fx.cancel).await.unwrap_err();
    assert!(matches!(
        err,
        StoreError::Validation(MovieValidationError::InvalidGenre(ref label)) if label == "Action,Drama"
    ));
    assert!(!fx.repo.exists_by_id(movie.id, &fx.cancel).await.unwrap());
}

#[tokio::test]
async fn invalid_persisted_id_surfaces_as_invalid_data() {
    let fx = fixture().await;
    let conn = Connection::open(&fx.path).unwrap();
    conn.execute(
        "INSERT INTO movies (id, title, slug, year_of_release)
         VALUES ('not-a-uuid', 'Broken', 'broken-2000', 2000);",
        [],
    )
    .unwrap();

    let err = fx.repo.get_all(&fx.cancel).await.unwrap_err();
    assert!(matches!(err, StoreError::InvalidData(_)));
    let err = fx
        .repo
        .get_by_slug("broken-2000", &fx.cancel)
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::InvalidData(_)));
}

#[tokio::test]
async fn concurrent_creates_for_distinct_ids_all_succeed() {
    let fx = fixture().await;
    let mut tasks = tokio::task::JoinSet::new();

    for index in 0..8 {
        let repo = fx.repo.clone();
        let cancel = fx.cancel.clone();
        tasks.spawn(async move {
            let movie = Movie::new(format!("Parallel {index}"), 2000 + index, ["Drama"]);
            repo.create(&movie, &cancel).await.map(|created| (created, movie.id))
        });
    }

    let mut ids = Vec::new();
    while let Some(joined) = tasks.join_next().await {
        let (created, id) = joined.unwrap().unwrap();
        assert!(created);
        ids.push(id);
    }

    for id in ids {
        assert!(fx.repo.exists_by_id(id, &fx.cancel).await.unwrap());
    }
    assert_eq!(
        fx.repo.get_all(&fx.cancel).await.unwrap().len(),
        SEED_MOVIE_COUNT + 8
    );
}

#[tokio::test]
async fn store_is_usable_through_trait_object() {
    let fx = fixture().await;
    let repo: Box<dyn MovieRepository> = Box::new(fx.repo.clone());
    let movie = inception();

    assert!(repo.create(&movie, &fx.cancel).await.unwrap());
    assert!(repo.exists_by_id(movie.id, &fx.cancel).await.unwrap());
    assert!(repo.delete_by_id(movie.id, &fx.cancel).await.unwrap());
}

#[tokio::test]
async fn dangling_genre_rows_are_rejected_by_foreign_key() {
    let fx = fixture().await;
    let provider = ConnectionProvider::new(DbConfig::new(&fx.path));
    let mut conn = provider.acquire().await.unwrap();

    let err = conn
        .run(&fx.cancel, |db, _| {
            db.execute(
                "INSERT INTO genres (movie_id, name) VALUES (?1, 'Drama');",
                [Uuid::new_v4().to_string()],
            )?;
            Ok::<_, StoreError>(())
        })
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::Db(DbError::ConstraintViolation(_))));
}

fn genre_rows_for(fx: &Fixture, id: Uuid) -> i64 {
    let conn = Connection::open(&fx.path).unwrap();
    conn.query_row(
        "SELECT COUNT(*) FROM genres WHERE movie_id = ?1;",
        [id.to_string()],
        |row| row.get(0),
    )
    .unwrap()
}

fn sorted(mut movies: Vec<Movie>) -> Vec<Movie> {
    movies.sort_by_key(|movie| movie.id);
    movies
}
