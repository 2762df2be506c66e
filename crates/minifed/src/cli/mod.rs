//! CLI entry point.

pub mod args;

use anyhow::{Context, Result};
use args::Cli;
use clap::Parser;
use minifed_core::{FedError, FederationConfig};
use tracing::info;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Run the CLI application.
pub async fn run() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(&cli.log))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = FederationConfig::load(&cli.config)
        .map_err(startup_error)
        .with_context(|| format!("loading {}", cli.config.display()))?;
    let settings = cli.settings();

    if cli.check {
        let federation = crate::build_federation(&config, &settings).map_err(startup_error)?;
        for node in federation.topology().nodes() {
            println!("{node}");
        }
        info!(
            entities = federation.topology().len(),
            trust_records = federation.trust_records(),
            "configuration ok"
        );
        return Ok(());
    }

    crate::run(&config, &settings).await.map_err(startup_error)?;
    Ok(())
}

/// Tag errors in the federation document so they read apart from runtime
/// failures.
fn startup_error(err: FedError) -> anyhow::Error {
    if err.is_config_error() {
        anyhow::Error::new(err).context("invalid federation document")
    } else {
        err.into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_startup_error_tags_config_errors() {
        let err = startup_error(FedError::Config("TA-A: kind must be present".into()));
        assert_eq!(err.to_string(), "invalid federation document");
        assert_eq!(
            err.root_cause().to_string(),
            "config error: TA-A: kind must be present"
        );

        let err = startup_error(FedError::Server("TCP bind 0.0.0.0:8080: in use".into()));
        assert_eq!(err.to_string(), "server error: TCP bind 0.0.0.0:8080: in use");
    }
}
