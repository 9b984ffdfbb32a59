//! campusdesk CLI binary.

use anyhow::Result;
use campusdesk::cli::Cli;
use tracing_subscriber::EnvFilter;

/// Single-threaded runtime: every command is a short sequence of store calls.
#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // RUST_LOG overrides, e.g. RUST_LOG=campusdesk=debug
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("campusdesk=info")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    tracing::debug!("Starting campusdesk");

    let cli = Cli::parse_args();
    cli.execute().await?;

    Ok(())
}
