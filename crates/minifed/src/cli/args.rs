//! Command-line argument definitions using clap.

use clap::Parser;
use minifed_core::SigningAlgorithm;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use crate::settings::{validity_days, EntitySettings, Settings, DEFAULT_VALIDITY_DAYS};

/// Stand up a local OpenID Federation from a YAML document.
///
/// Every entity is served on the same listener and selected by the
/// request's Host header, so point each entity hostname at this machine.
#[derive(Parser, Debug)]
#[command(name = "minifed")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Federation document (entities and edges)
    #[arg(env = "MINIFED_CONFIG")]
    pub config: PathBuf,

    /// Address all entities listen on
    #[arg(short, long, env = "MINIFED_LISTEN", default_value = "0.0.0.0:8080")]
    pub listen: SocketAddr,

    /// Signing algorithm of generated entity keys (es256 or es384)
    #[arg(short, long, default_value_t = SigningAlgorithm::Es256)]
    pub algorithm: SigningAlgorithm,

    /// Entity configuration lifetime in days
    #[arg(long, default_value_t = DEFAULT_VALIDITY_DAYS)]
    pub validity_days: u64,

    /// Subordinate statement lifetime in seconds (defaults to the entity
    /// configuration lifetime)
    #[arg(long)]
    pub statement_lifetime_secs: Option<u64>,

    /// Log filter directive
    #[arg(long, env = "RUST_LOG", default_value = "info")]
    pub log: String,

    /// Also serve entities no edge references
    #[arg(long)]
    pub isolated: bool,

    /// Fail when two entities share a hostname
    #[arg(long)]
    pub strict_hosts: bool,

    /// Build and print the topology, then exit without listening
    #[arg(long)]
    pub check: bool,
}

impl Cli {
    /// Process settings derived from the flags.
    #[must_use]
    pub fn settings(&self) -> Settings {
        let mut entity = EntitySettings {
            validity: validity_days(self.validity_days),
            ..EntitySettings::default()
        };
        entity.statements.lifetime = self.statement_lifetime_secs.map(Duration::from_secs);

        Settings {
            listen: self.listen,
            algorithm: self.algorithm,
            entity,
            include_isolated: self.isolated,
            strict_hosts: self.strict_hosts,
        }
    }
}
