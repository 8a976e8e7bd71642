//! Catalog command-line entry point.
//!
//! # Responsibility
//! - Load configuration, start logging and initialize the schema before any
//!   store call.
//! - Expose the store operations for local inspection and maintenance.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use log::error;
use movies_core::{
    default_log_level, init_logging, CancellationToken, CatalogConfig, ConnectionProvider,
    Movie, MovieRepository, SchemaInitializer, SqliteMovieRepository,
};
use std::path::PathBuf;
use std::process::ExitCode;
use uuid::Uuid;

#[derive(Parser)]
#[command(name = "movies", version, about = "Movie catalog maintenance tool")]
struct Cli {
    /// TOML configuration file.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Database file; overrides configuration and environment.
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create tables and seed rows, then exit.
    Init,
    /// List every movie with its genres.
    List,
    /// Show one movie by id or slug.
    Get { key: String },
    /// Add a movie; the slug is derived from title and year.
    Add {
        #[arg(long)]
        title: String,
        #[arg(long)]
        year: i32,
        #[arg(long = "genre")]
        genres: Vec<String>,
    },
    /// Delete a movie and its genres.
    Delete { id: Uuid },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("event=cli_exit module=cli status=error error={err:#}");
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let mut config = CatalogConfig::load(cli.config.as_deref()).context("loading configuration")?;
    if let Some(db) = cli.db {
        config.database_path = db;
    }

    if let Some(log_dir) = config.log_dir.as_deref() {
        let level = config.log_level.as_deref().unwrap_or(default_log_level());
        init_logging(level, log_dir).context("starting logging")?;
    }

    let provider = ConnectionProvider::new(config.db_config());
    SchemaInitializer::new(provider.clone())
        .initialize()
        .await
        .context("initializing schema")?;

    let repo = SqliteMovieRepository::new(provider);
    let cancel = CancellationToken::new();
    let ctrl_c = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            ctrl_c.cancel();
        }
    });

    match cli.command {
        Commands::Init => println!("schema ready at {}", config.database_path.display()),
        Commands::List => {
            let mut movies = repo.get_all(&cancel).await?;
            movies.sort_by(|a, b| a.title.cmp(&b.title));
            for movie in &movies {
                print_movie(movie);
            }
        }
        Commands::Get { key } => {
            let found = match Uuid::parse_str(&key) {
                Ok(id) => repo.get_by_id(id, &cancel).await?,
                Err(_) => repo.get_by_slug(&key, &cancel).await?,
            };
            match found {
                Some(movie) => print_movie(&movie),
                None => bail!("no movie matches `{key}`"),
            }
        }
        Commands::Add {
            title,
            year,
            genres,
        } => {
            let movie = Movie::new(title, year, genres);
            if !repo.create(&movie, &cancel).await? {
                bail!("movie `{}` was not stored", movie.slug);
            }
            println!("{}", movie.id);
        }
        Commands::Delete { id } => {
            if !repo.delete_by_id(id, &cancel).await? {
                bail!("no movie with id {id}");
            }
        }
    }

    Ok(())
}

fn print_movie(movie: &Movie) {
    let genres = movie
        .genres
        .iter()
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join(", ");
    println!(
        "{}  {} ({})  [{}]  {}",
        movie.id, movie.title, movie.year_of_release, genres, movie.slug
    );
}
