//! MedAssist CLI — the main entry point.
//!
//! Commands:
//! - `chat`     — Interactive chat or single-message mode
//! - `onboard`  — Write the default config
//! - `doctor`   — Diagnose configuration and corpus

use std::path::PathBuf;
use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "medassist",
    about = "MedAssist — chat about your medical reports, images and prescriptions",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Chat with the assistant
    Chat {
        /// Send a single message instead of entering interactive mode
        #[arg(short, long)]
        message: Option<String>,

        /// Override the answer model
        #[arg(long)]
        model: Option<String>,

        /// Override the embedding model
        #[arg(long)]
        embedding_model: Option<String>,

        /// Passages per retrieval
        #[arg(long)]
        top_k: Option<usize>,

        /// Corpus file written by the other workers
        #[arg(long)]
        data: Option<PathBuf>,

        /// Rank passages by term overlap instead of embeddings
        #[arg(long)]
        keyword: bool,
    },

    /// Initialize configuration
    Onboard,

    /// Diagnose configuration and corpus
    Doctor,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Chat { message, model, embedding_model, top_k, data, keyword } => {
            let options = commands::chat::ChatOptions {
                model,
                embedding_model,
                top_k,
                data,
                keyword,
            };
            commands::chat::run(message, options).await?
        }
        Commands::Onboard => commands::onboard::run().await?,
        Commands::Doctor => commands::doctor::run().await?,
    }

    Ok(())
}
