mod analyze;
mod extract;
mod insights;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "tikpulse")]
#[command(about = "TikTok video and account statistics from the command line")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Run the extraction cascade over a saved HTML page
    Extract {
        /// Path to the saved page
        #[arg(long)]
        file: PathBuf,

        /// Stop running numeric strategies as soon as a view count is found
        #[arg(long)]
        views_only: bool,
    },
    /// Fetch and analyse a public video
    Analyze {
        /// Video URL, e.g. https://www.tiktok.com/@user/video/123
        url: String,

        /// Fetch through the rendering proxy instead of directly
        #[arg(long)]
        proxy: bool,

        /// Ask the configured LLM for advice instead of using heuristics
        #[arg(long)]
        ai: bool,
    },
    /// Fetch and analyse a public account
    Account {
        /// Username, @handle or profile URL
        username: String,

        /// Ask the configured LLM for advice instead of using heuristics
        #[arg(long)]
        ai: bool,
    },
    /// Show stored insights for a niche
    Insights {
        /// Niche slug (e.g. cuisine, humour, education)
        niche: String,

        /// Also list the most recent analyses
        #[arg(long)]
        recent: Option<usize>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    // Logs go to stderr so JSON on stdout stays pipeable.
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Some(Commands::Extract { file, views_only }) => {
            extract::run_extract(&file, views_only)?;
        }
        Some(Commands::Analyze { url, proxy, ai }) => {
            let config = tikpulse_core::load_app_config()?;
            analyze::run_analyze(&config, &url, proxy, ai).await?;
        }
        Some(Commands::Account { username, ai }) => {
            let config = tikpulse_core::load_app_config()?;
            analyze::run_account(&config, &username, ai).await?;
        }
        Some(Commands::Insights { niche, recent }) => {
            let config = tikpulse_core::load_app_config()?;
            insights::run_insights(&config, &niche, recent).await?;
        }
        None => println!("tikpulse: run with --help to list commands"),
    }

    Ok(())
}
