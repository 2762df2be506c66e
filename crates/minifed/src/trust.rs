//! Trust materialization: one subordinate record per edge.

use minifed_core::{FedError, Result, SubordinateRecord};
use minifed_entity::FEDERATION_ENTITY;
use tracing::info;

use crate::topology::Topology;

/// Write, for every superior, one active record per direct subordinate.
///
/// Every node must have its entity attached. The first failed write aborts
/// with [`FedError::TrustWrite`]. Returns the number of records written.
pub fn materialize(topology: &Topology) -> Result<usize> {
    if let Some(node) = topology.nodes().find(|node| node.entity().is_none()) {
        return Err(FedError::Construction(format!(
            "{}: entity not attached",
            node.name()
        )));
    }

    let mut written = 0;
    for parent in topology.nodes() {
        let Some(store) = parent.store() else {
            continue;
        };

        for name in parent.subordinates() {
            let trust_error = |reason: String| FedError::TrustWrite {
                parent: parent.name().to_string(),
                child: name.clone(),
                reason,
            };

            let child = topology
                .get(name)
                .ok_or_else(|| trust_error("subordinate is not a node".into()))?;
            let child_entity = child
                .entity()
                .ok_or_else(|| trust_error("subordinate has no entity".into()))?;

            let payload = child_entity.entity_configuration_payload();
            let mut entity_types = child_entity.metadata().entity_types();
            if entity_types.is_empty() {
                entity_types.push(FEDERATION_ENTITY.to_string());
            }

            let record = SubordinateRecord::active(child.entity_id(), payload.jwks, entity_types);
            store
                .write(child.entity_id(), record)
                .map_err(|e| trust_error(e.to_string()))?;

            info!(parent = %parent.name(), child = %child.name(), "established trust");
            written += 1;
        }
    }

    Ok(written)
}
