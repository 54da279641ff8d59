use clap::Parser;
use dotenvy::dotenv;
use pca_budget::cli::Cli;
use std::process::ExitCode;
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    // 1. Initialize tracing (as early as possible). Stdout is reserved for JSON.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    // 2. Load .env before parsing so DATABASE_URL and PCA_CONFIG can come from it
    dotenv().ok(); // Make it non-fatal, env vars can be set externally
    debug!("Attempted to load .env file.");

    // 3. Parse and run
    Cli::parse().run().await
}
