use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "nwsg",
    about = "Schema-constrained knowledge graph extraction from financial news",
    version
)]
pub struct Cli {
    /// Model identifier to request from the completions endpoint
    #[arg(long, global = true)]
    pub model: Option<String>,

    /// Base URL of the completions endpoint
    #[arg(long = "base-url", global = true)]
    pub base_url: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Extract draft triples from a scraped news JSON file
    Extract {
        /// Path to the news JSON file
        #[arg(long)]
        news: PathBuf,
        /// Target stock ticker the extraction is anchored to (e.g. TSLA)
        #[arg(long)]
        ticker: String,
    },
    /// Verify and reconcile a draft triples file against its source news
    Verify {
        /// Path to the draft triples JSON file
        #[arg(long)]
        draft: PathBuf,
        /// Path to the news JSON file the draft was extracted from
        #[arg(long)]
        news: PathBuf,
        /// Target stock ticker (names the output file)
        #[arg(long)]
        ticker: String,
    },
    /// Run extraction and verification back to back
    Run {
        /// Path to the news JSON file
        #[arg(long)]
        news: PathBuf,
        /// Target stock ticker the run is anchored to
        #[arg(long)]
        ticker: String,
    },
}
