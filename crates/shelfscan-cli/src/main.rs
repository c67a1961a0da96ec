mod extract;
mod fetch;
mod output;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use shelfscan_extract::ContentKind;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "shelfscan")]
#[command(about = "Extract normalized product listings from retailer pages")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Extract products from a saved page or API response
    Extract {
        /// Retailer id (woolworths, coles, aldi, or any profile id)
        #[arg(long)]
        retailer: String,
        /// Payload kind; inferred from the file extension or body when omitted
        #[arg(long)]
        kind: Option<ContentKind>,
        /// Input file, or `-` for stdin
        #[arg(long, default_value = "-")]
        input: PathBuf,
    },
    /// Fetch one or more pages and extract products from each
    Fetch {
        #[arg(long)]
        retailer: String,
        /// Page or API URL; repeat for several
        #[arg(long = "url", required = true)]
        urls: Vec<String>,
    },
    /// List the retailer profiles in effect
    Retailers,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = shelfscan_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Extract {
            retailer,
            kind,
            input,
        } => extract::run_extract(&config, &retailer, kind, &input).await,
        Commands::Fetch { retailer, urls } => fetch::run_fetch(&config, &retailer, &urls).await,
        Commands::Retailers => extract::run_list_retailers(&config),
    }
}

#[cfg(test)]
mod tests;
