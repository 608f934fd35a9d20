//! CLI entry point.

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use unoloader_cli::{BootstrapConfig, Cli, bootstrap};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = BootstrapConfig::from_cli(cli).context("resolving the current directory")?;
    if let Err(e) = bootstrap::run(config).await {
        eprintln!("unoloader: {e}");
        std::process::exit(e.exit_code());
    }
    Ok(())
}

/// Log to stderr so stdout stays with the application.
fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
