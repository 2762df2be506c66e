//! # minifed
//!
//! Stands up a whole OpenID Federation on one listener from a YAML document.
//!
//! Startup is a linear sequence; any step failing aborts before the
//! listener binds:
//!
//! 1. Build the [`Topology`] from entities and edges, one signing key per
//!    referenced entity.
//! 2. Attach a federation entity to every node. Intermediates and trust
//!    anchors also get list, fetch and resolve endpoints.
//! 3. Write one subordinate record per edge into the superior's trust store.
//! 4. Register every entity under its hostname in the [`HostDispatcher`].
//! 5. Serve.

pub mod cli;
pub mod dispatch;
pub mod server;
pub mod settings;
pub mod topology;
pub mod trust;

use axum::Router;
use minifed_core::{FederationConfig, Result};
use tracing::{info, warn};

pub use dispatch::HostDispatcher;
pub use settings::{EntitySettings, Settings};
pub use topology::{EntityNode, Topology};

/// A fully built federation, ready to serve.
#[derive(Debug)]
pub struct Federation {
    topology: Topology,
    dispatcher: HostDispatcher,
    trust_records: usize,
}

impl Federation {
    /// The entity graph.
    #[must_use]
    pub const fn topology(&self) -> &Topology {
        &self.topology
    }

    /// The host dispatcher.
    #[must_use]
    pub const fn dispatcher(&self) -> &HostDispatcher {
        &self.dispatcher
    }

    /// Number of subordinate records written at startup.
    #[must_use]
    pub const fn trust_records(&self) -> usize {
        self.trust_records
    }

    /// Router serving every entity.
    pub fn into_router(self) -> Router {
        self.dispatcher.into_router()
    }
}

/// Run steps 1 to 4 of the startup sequence.
pub fn build_federation(config: &FederationConfig, settings: &Settings) -> Result<Federation> {
    let mut topology = Topology::build(&config.entities, &config.edges, settings.algorithm)?;

    if settings.include_isolated {
        topology.add_isolated(&config.entities, settings.algorithm)?;
    } else {
        for name in config.unreferenced() {
            warn!(entity = %name, "entity is not referenced by any edge, skipping");
        }
    }

    if settings.strict_hosts {
        topology.validate_hosts()?;
    }

    topology.attach_entities(&settings.entity)?;
    let trust_records = trust::materialize(&topology)?;
    let dispatcher = HostDispatcher::from_topology(&topology)?;

    info!(
        entities = topology.len(),
        hosts = dispatcher.len(),
        trust_records,
        "federation ready"
    );

    Ok(Federation {
        topology,
        dispatcher,
        trust_records,
    })
}

/// Build the federation and serve it until interrupted.
pub async fn run(config: &FederationConfig, settings: &Settings) -> Result<()> {
    let federation = build_federation(config, settings)?;
    server::serve(settings.listen, federation.into_router()).await
}
