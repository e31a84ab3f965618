use anyhow::Context;
use clap::{Parser, Subcommand};
use std::{path::PathBuf, sync::Arc};

use crate::catalog::{CatalogClient, deezer::DeezerClient};
use crate::config;
use crate::domain::quiz::{NewQuiz, QuizId};
use crate::engine::resolver::CatalogResolver;
use crate::storage::{QuizStore, operations::SqliteStore};

mod play;

#[derive(Parser)]
#[command(name = "tunequiz")]
#[command(version = "0.1")]
#[command(about = "Guess-the-song music quizzes")]
pub struct Cli {
    /// Path to the config TOML file
    #[arg(short, long, default_value = "config.toml")]
    pub config: PathBuf,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List stored quizzes
    List,
    /// Show a quiz and its tracks
    Show { id: String },
    /// Import a quiz from a JSON file
    Import { file: PathBuf },
    /// Delete a quiz
    Delete { id: String },
    /// Search the music catalog
    Search {
        query: String,
        #[arg(short, long, default_value_t = 10)]
        limit: usize,
    },
    /// Play a quiz in the terminal
    Play { id: String },
    /// Run http server exposing quizzes and catalog search
    Serve,
}

/// Entrypoint for CLI
pub fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cfg = config::Config::load(&cli.config.to_string_lossy())?;

    match cli.command {
        Commands::List => {
            let mut store = SqliteStore::new(&cfg.database)?;
            let quizzes = store.list_quizzes()?;

            if quizzes.is_empty() {
                println!("No quizzes yet. Import one with \"import\".");
            }
            for quiz in quizzes {
                println!(
                    "{}  {} ({} tracks, created {})",
                    quiz.id,
                    quiz.title,
                    quiz.track_count,
                    quiz.created_at.format("%Y-%m-%d %H:%M")
                );
            }
        }

        Commands::Show { id } => {
            let mut store = SqliteStore::new(&cfg.database)?;
            let quiz = store.get_quiz(&QuizId(id))?;

            println!("{} by {}", quiz.title, quiz.owner);
            if let Some(description) = &quiz.description {
                println!("  {description}");
            }
            for (i, track) in quiz.tracks.iter().enumerate() {
                let preview = if track.preview_url().is_some() {
                    ""
                } else {
                    " [no preview]"
                };
                println!("  {:>2}. {} - {}{}", i + 1, track.artist, track.title, preview);
            }
        }

        Commands::Import { file } => {
            let contents = std::fs::read_to_string(&file)
                .with_context(|| format!("Failed to read {}", file.display()))?;
            let new_quiz: NewQuiz = serde_json::from_str(&contents)
                .with_context(|| format!("Failed to parse quiz JSON in {}", file.display()))?;

            let mut store = SqliteStore::new(&cfg.database)?;
            let quiz = store.insert_quiz(new_quiz)?;
            println!("Imported quiz {} ({} tracks)", quiz.id, quiz.tracks.len());
        }

        Commands::Delete { id } => {
            let mut store = SqliteStore::new(&cfg.database)?;
            store.delete_quiz(&QuizId(id.clone()))?;
            println!("Deleted quiz {id}");
        }

        Commands::Search { query, limit } => {
            let catalog = DeezerClient::new(&cfg.catalog)?;
            for track in catalog.search(&query, limit)? {
                let preview = if track.preview_url().is_some() {
                    ""
                } else {
                    " [no preview]"
                };
                println!(
                    "{:>12}  {} - {}{}",
                    track.catalog_id.0, track.artist, track.title, preview
                );
            }
        }

        Commands::Play { id } => {
            let mut store = SqliteStore::new(&cfg.database)?;
            let quiz = store.get_quiz(&QuizId(id))?;
            let resolver = CatalogResolver::new(DeezerClient::new(&cfg.catalog)?);

            let stdin = std::io::stdin();
            let mut input = stdin.lock();
            let mut out = std::io::stdout();
            play::play_quiz(quiz, &resolver, &cfg.play, &mut input, &mut out)?;
        }

        Commands::Serve => {
            println!("Starting HTTP server...");

            let store = SqliteStore::new(&cfg.database)?;
            let catalog = Arc::new(DeezerClient::new(&cfg.catalog)?);
            let http_server = crate::http::server::HttpServer::new(store, catalog, cfg.http);

            println!(
                "HTTP server running at http://{}:{}",
                http_server.config.bind_addr, http_server.config.port
            );
            http_server.run();
        }
    }

    Ok(())
}
