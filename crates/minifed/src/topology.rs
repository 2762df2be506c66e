//! Topology builder: federation declarations -> entity graph.
//!
//! Nodes live in one name-keyed arena. Superior/subordinate links are
//! stored as names, so cycles are representable without shared ownership.

use minifed_core::{
    EdgeConfig, EntityConfig, EntityKind, FedError, MemoryTrustStore, Result, SigningAlgorithm,
    SigningIdentity, TrustStore,
};
use minifed_entity::{EndpointConf, EntityError, FedEntity, Metadata};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info};
use url::Url;

use crate::settings::{EntitySettings, FETCH_PATH, LIST_PATH, RESOLVE_PATH};

/// One entity in the federation graph.
#[derive(Debug)]
pub struct EntityNode {
    name: String,
    kind: EntityKind,
    entity_id: String,
    url: Url,
    identity: Arc<SigningIdentity>,
    superiors: Vec<String>,
    subordinates: Vec<String>,
    entity: Option<FedEntity>,
    store: Option<Arc<dyn TrustStore>>,
}

impl EntityNode {
    fn new(config: &EntityConfig, identity: SigningIdentity) -> Result<Self> {
        let url = Url::parse(&config.identifier)
            .map_err(|e| FedError::Config(format!("invalid url for node {}: {e}", config.name)))?;
        if url.host_str().is_none() {
            return Err(FedError::Config(format!(
                "invalid url for node {}: '{}' has no host",
                config.name, config.identifier
            )));
        }

        let store = config
            .kind
            .owns_trust_store()
            .then(|| Arc::new(MemoryTrustStore::new()) as Arc<dyn TrustStore>);

        Ok(Self {
            name: config.name.clone(),
            kind: config.kind,
            entity_id: config.identifier.clone(),
            url,
            identity: Arc::new(identity),
            superiors: Vec::new(),
            subordinates: Vec::new(),
            entity: None,
            store,
        })
    }

    /// Config name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Role of the entity.
    #[must_use]
    pub const fn kind(&self) -> EntityKind {
        self.kind
    }

    /// Entity identifier as configured.
    #[must_use]
    pub fn entity_id(&self) -> &str {
        &self.entity_id
    }

    /// Parsed identifier.
    #[must_use]
    pub const fn url(&self) -> &Url {
        &self.url
    }

    /// Virtual hostname the entity is served under (port excluded).
    #[must_use]
    pub fn host(&self) -> &str {
        self.url.host_str().unwrap_or_default()
    }

    /// Signing identity, generated once when the node was created.
    #[must_use]
    pub const fn identity(&self) -> &Arc<SigningIdentity> {
        &self.identity
    }

    /// Names of direct superiors, in edge order.
    #[must_use]
    pub fn superiors(&self) -> &[String] {
        &self.superiors
    }

    /// Names of direct subordinates, in edge order.
    #[must_use]
    pub fn subordinates(&self) -> &[String] {
        &self.subordinates
    }

    /// Protocol handler, once attached.
    #[must_use]
    pub const fn entity(&self) -> Option<&FedEntity> {
        self.entity.as_ref()
    }

    /// Subordinate trust store (intermediates and trust anchors only).
    #[must_use]
    pub const fn store(&self) -> Option<&Arc<dyn TrustStore>> {
        self.store.as_ref()
    }

    fn create_entity(
        &self,
        authority_hints: Vec<String>,
        settings: &EntitySettings,
    ) -> std::result::Result<FedEntity, EntityError> {
        let mut entity = FedEntity::new(
            &self.entity_id,
            authority_hints,
            Metadata::new(),
            Arc::clone(&self.identity),
            settings.validity,
            settings.statements.clone(),
        )?;

        if let Some(store) = &self.store {
            entity.add_subordinate_listing_endpoint(EndpointConf::new(LIST_PATH), Arc::clone(store))?;
            entity.add_fetch_endpoint(EndpointConf::new(FETCH_PATH), Arc::clone(store))?;
            entity.add_resolve_endpoint(EndpointConf::new(RESOLVE_PATH))?;
        }

        Ok(entity)
    }
}

impl fmt::Display for EntityNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "EntityNode{{Superiors:{:?}, Subordinates:{:?}, Name:{}, Kind:{}, Identifier:{}}}",
            self.superiors, self.subordinates, self.name, self.kind, self.entity_id
        )
    }
}

/// The federation graph, keyed by entity name.
#[derive(Debug, Default)]
pub struct Topology {
    nodes: BTreeMap<String, EntityNode>,
}

impl Topology {
    /// Build the graph from declarations, generating one `algorithm` key per
    /// referenced entity.
    ///
    /// Entities no edge references are left out; see [`Self::add_isolated`].
    pub fn build(
        entities: &BTreeMap<String, EntityConfig>,
        edges: &[EdgeConfig],
        algorithm: SigningAlgorithm,
    ) -> Result<Self> {
        Self::build_with(entities, edges, |_| SigningIdentity::generate(algorithm))
    }

    /// Like [`Self::build`], with a caller-supplied key generator. The
    /// generator runs exactly once per created node.
    pub fn build_with<F>(
        entities: &BTreeMap<String, EntityConfig>,
        edges: &[EdgeConfig],
        mut keygen: F,
    ) -> Result<Self>
    where
        F: FnMut(&EntityConfig) -> Result<SigningIdentity>,
    {
        for (name, config) in entities {
            if config.identifier.trim().is_empty() {
                return Err(FedError::Config(format!("{name}: identifier must be present")));
            }
        }

        let mut topology = Self::default();
        for (index, edge) in edges.iter().enumerate() {
            let head = lookup(entities, &edge.head, index)?;
            let tail = lookup(entities, &edge.tail, index)?;

            topology.ensure_node(head, &mut keygen)?;
            topology.ensure_node(tail, &mut keygen)?;
            topology.link(&edge.head, &edge.tail);
        }

        for node in topology.nodes.values() {
            debug!(entity = %node, "parsed entity");
        }
        info!(
            entities = topology.nodes.len(),
            edges = edges.len(),
            "built federation topology"
        );

        Ok(topology)
    }

    /// Add every declared entity that is not yet a node, with no links.
    /// Returns the names added.
    pub fn add_isolated(
        &mut self,
        entities: &BTreeMap<String, EntityConfig>,
        algorithm: SigningAlgorithm,
    ) -> Result<Vec<String>> {
        let mut added = Vec::new();
        let mut keygen = |_: &EntityConfig| SigningIdentity::generate(algorithm);
        for config in entities.values() {
            if self.ensure_node(config, &mut keygen)? {
                info!(entity = %config.name, "added isolated entity");
                added.push(config.name.clone());
            }
        }
        Ok(added)
    }

    /// Create the node for `config` unless it exists. Returns true if created.
    fn ensure_node<F>(&mut self, config: &EntityConfig, keygen: &mut F) -> Result<bool>
    where
        F: FnMut(&EntityConfig) -> Result<SigningIdentity>,
    {
        if self.nodes.contains_key(&config.name) {
            return Ok(false);
        }
        let node = EntityNode::new(config, keygen(config)?)?;
        self.nodes.insert(config.name.clone(), node);
        Ok(true)
    }

    /// Record `tail` under `head` and `head` above `tail`, both or neither.
    fn link(&mut self, head: &str, tail: &str) {
        if !self.nodes.contains_key(head) || !self.nodes.contains_key(tail) {
            return;
        }
        if let Some(node) = self.nodes.get_mut(head) {
            push_unique(&mut node.subordinates, tail);
        }
        if let Some(node) = self.nodes.get_mut(tail) {
            push_unique(&mut node.superiors, head);
        }
    }

    /// Node by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&EntityNode> {
        self.nodes.get(name)
    }

    /// All nodes, ordered by name.
    pub fn nodes(&self) -> impl Iterator<Item = &EntityNode> {
        self.nodes.values()
    }

    /// Number of nodes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns true if no edge produced a node.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Reject two entities sharing a hostname.
    pub fn validate_hosts(&self) -> Result<()> {
        let mut seen: HashMap<&str, &str> = HashMap::new();
        for node in self.nodes.values() {
            if let Some(previous) = seen.insert(node.host(), node.name()) {
                return Err(FedError::Config(format!(
                    "entities {previous} and {} share hostname {}",
                    node.name(),
                    node.host()
                )));
            }
        }
        Ok(())
    }

    /// Create every node's protocol handler. Authority hints are the
    /// superiors' identifiers, in edge order.
    pub fn attach_entities(&mut self, settings: &EntitySettings) -> Result<()> {
        let hints: Vec<(String, Vec<String>)> = self
            .nodes
            .values()
            .map(|node| {
                let authority_hints = node
                    .superiors
                    .iter()
                    .filter_map(|name| self.nodes.get(name))
                    .map(|superior| superior.entity_id.clone())
                    .collect();
                (node.name.clone(), authority_hints)
            })
            .collect();

        for (name, authority_hints) in hints {
            let Some(node) = self.nodes.get_mut(&name) else {
                continue;
            };
            let entity = node
                .create_entity(authority_hints, settings)
                .map_err(|e| FedError::Construction(format!("{node}: {e}")))?;
            debug!(entity = %node.name, host = %node.host(), "attached protocol handler");
            node.entity = Some(entity);
        }

        Ok(())
    }

    #[cfg(test)]
    pub(crate) fn replace_store(&mut self, name: &str, store: Arc<dyn TrustStore>) {
        if let Some(node) = self.nodes.get_mut(name) {
            node.store = Some(store);
        }
    }
}

fn lookup<'a>(
    entities: &'a BTreeMap<String, EntityConfig>,
    name: &str,
    index: usize,
) -> Result<&'a EntityConfig> {
    entities.get(name).ok_or_else(|| {
        FedError::Config(format!("undefined reference to node {name} in edge {index}"))
    })
}

fn push_unique(names: &mut Vec<String>, name: &str) {
    if !names.iter().any(|existing| existing == name) {
        names.push(name.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entities() -> BTreeMap<String, EntityConfig> {
        [
            EntityConfig::new("TA-A", EntityKind::TrustAnchor, "https://ta-a.example.com"),
            EntityConfig::new("IM-A", EntityKind::Intermediate, "https://im-a.example.com"),
            EntityConfig::new("OP-A", EntityKind::Leaf, "https://op-a.example.com"),
            EntityConfig::new("RP-A", EntityKind::Leaf, "https://rp-a.example.com:8443"),
        ]
        .into_iter()
        .map(|config| (config.name.clone(), config))
        .collect()
    }

    fn edges(specs: &[&str]) -> Vec<EdgeConfig> {
        specs.iter().map(|spec| spec.parse().unwrap()).collect()
    }

    fn assert_symmetric(topology: &Topology) {
        for node in topology.nodes() {
            for sub in node.subordinates() {
                let child = topology.get(sub).unwrap();
                assert!(child.superiors().contains(&node.name().to_string()));
            }
            for sup in node.superiors() {
                let parent = topology.get(sup).unwrap();
                assert!(parent.subordinates().contains(&node.name().to_string()));
            }
        }
    }

    #[test]
    fn test_example_topology() {
        let topology = Topology::build(
            &entities(),
            &edges(&["TA-A -> OP-A", "TA-A -> IM-A"]),
            SigningAlgorithm::Es256,
        )
        .unwrap();

        assert_eq!(topology.len(), 3);
        let ta = topology.get("TA-A").unwrap();
        assert_eq!(ta.subordinates(), ["OP-A", "IM-A"]);
        assert!(ta.superiors().is_empty());
        assert_eq!(topology.get("OP-A").unwrap().superiors(), ["TA-A"]);
        assert_eq!(topology.get("IM-A").unwrap().superiors(), ["TA-A"]);
        assert!(topology.get("RP-A").is_none());
        assert_symmetric(&topology);
    }

    #[test]
    fn test_trust_store_by_kind() {
        let topology = Topology::build(
            &entities(),
            &edges(&["TA-A -> IM-A", "IM-A -> OP-A"]),
            SigningAlgorithm::Es256,
        )
        .unwrap();

        assert!(topology.get("TA-A").unwrap().store().is_some());
        assert!(topology.get("IM-A").unwrap().store().is_some());
        assert!(topology.get("OP-A").unwrap().store().is_none());
    }

    #[test]
    fn test_keys_generated_once_per_node() {
        let mut generated = Vec::new();
        let topology = Topology::build_with(
            &entities(),
            &edges(&["TA-A -> OP-A", "TA-A -> IM-A", "IM-A -> OP-A", "TA-A -> OP-A"]),
            |config| {
                generated.push(config.name.clone());
                SigningIdentity::generate(SigningAlgorithm::Es256)
            },
        )
        .unwrap();

        assert_eq!(generated, vec!["TA-A", "OP-A", "IM-A"]);
        assert_eq!(topology.len(), 3);
    }

    #[test]
    fn test_repeated_edge_not_duplicated() {
        let topology = Topology::build(
            &entities(),
            &edges(&["TA-A -> OP-A", "TA-A -> OP-A"]),
            SigningAlgorithm::Es256,
        )
        .unwrap();

        assert_eq!(topology.get("TA-A").unwrap().subordinates(), ["OP-A"]);
        assert_eq!(topology.get("OP-A").unwrap().superiors(), ["TA-A"]);
    }

    #[test]
    fn test_edge_order_is_irrelevant() {
        let forward = Topology::build(
            &entities(),
            &edges(&["TA-A -> IM-A", "IM-A -> OP-A", "TA-A -> OP-A"]),
            SigningAlgorithm::Es256,
        )
        .unwrap();
        let backward = Topology::build(
            &entities(),
            &edges(&["TA-A -> OP-A", "IM-A -> OP-A", "TA-A -> IM-A"]),
            SigningAlgorithm::Es256,
        )
        .unwrap();

        for node in forward.nodes() {
            let other = backward.get(node.name()).unwrap();
            let sorted = |names: &[String]| {
                let mut names = names.to_vec();
                names.sort();
                names
            };
            assert_eq!(sorted(node.subordinates()), sorted(other.subordinates()));
            assert_eq!(sorted(node.superiors()), sorted(other.superiors()));
        }
    }

    #[test]
    fn test_cycles_are_accepted() {
        let topology = Topology::build(
            &entities(),
            &edges(&["TA-A -> IM-A", "IM-A -> TA-A"]),
            SigningAlgorithm::Es256,
        )
        .unwrap();

        assert_eq!(topology.get("TA-A").unwrap().superiors(), ["IM-A"]);
        assert_symmetric(&topology);
    }

    #[test]
    fn test_undefined_reference() {
        let err = Topology::build(
            &entities(),
            &edges(&["TA-A -> OP-A", "TA-A -> GHOST"]),
            SigningAlgorithm::Es256,
        )
        .unwrap_err();

        assert!(err.is_config_error());
        assert_eq!(
            err.to_string(),
            "config error: undefined reference to node GHOST in edge 1"
        );
    }

    #[test]
    fn test_invalid_identifier() {
        let mut entities = entities();
        entities.insert(
            "BAD".into(),
            EntityConfig::new("BAD", EntityKind::Leaf, "not a url"),
        );
        let err = Topology::build(&entities, &edges(&["TA-A -> BAD"]), SigningAlgorithm::Es256)
            .unwrap_err();
        assert!(err.to_string().contains("invalid url for node BAD"));
    }

    #[test]
    fn test_empty_identifier() {
        let mut entities = entities();
        entities.insert("EMPTY".into(), EntityConfig::new("EMPTY", EntityKind::Leaf, " "));
        let err = Topology::build(&entities, &edges(&["TA-A -> OP-A"]), SigningAlgorithm::Es256)
            .unwrap_err();
        assert!(err.to_string().contains("EMPTY: identifier must be present"));
    }

    #[test]
    fn test_add_isolated() {
        let mut topology = Topology::build(
            &entities(),
            &edges(&["TA-A -> OP-A"]),
            SigningAlgorithm::Es256,
        )
        .unwrap();
        let kid = topology.get("TA-A").unwrap().identity().kid().to_string();

        let added = topology.add_isolated(&entities(), SigningAlgorithm::Es256).unwrap();
        assert_eq!(added, vec!["IM-A", "RP-A"]);
        assert_eq!(topology.len(), 4);
        assert!(topology.get("RP-A").unwrap().superiors().is_empty());
        assert_eq!(topology.get("TA-A").unwrap().identity().kid(), kid);
    }

    #[test]
    fn test_host_excludes_port() {
        let topology = Topology::build(
            &entities(),
            &edges(&["TA-A -> RP-A"]),
            SigningAlgorithm::Es256,
        )
        .unwrap();
        let rp = topology.get("RP-A").unwrap();
        assert_eq!(rp.host(), "rp-a.example.com");
        assert_eq!(rp.url().port(), Some(8443));
    }

    #[test]
    fn test_validate_hosts() {
        let mut entities = entities();
        entities.insert(
            "TWIN".into(),
            EntityConfig::new("TWIN", EntityKind::Leaf, "https://op-a.example.com:9000"),
        );
        let topology = Topology::build(
            &entities,
            &edges(&["TA-A -> OP-A", "TA-A -> TWIN"]),
            SigningAlgorithm::Es256,
        )
        .unwrap();

        let err = topology.validate_hosts().unwrap_err();
        assert!(err.to_string().contains("share hostname op-a.example.com"));
    }

    #[test]
    fn test_attach_entities_sets_authority_hints() {
        let mut topology = Topology::build(
            &entities(),
            &edges(&["TA-A -> IM-A", "IM-A -> OP-A", "TA-A -> OP-A"]),
            SigningAlgorithm::Es256,
        )
        .unwrap();
        topology.attach_entities(&EntitySettings::default()).unwrap();

        let op = topology.get("OP-A").unwrap().entity().unwrap();
        assert_eq!(
            op.authority_hints(),
            ["https://im-a.example.com", "https://ta-a.example.com"]
        );
        assert!(op.metadata().is_empty());

        let im = topology.get("IM-A").unwrap().entity().unwrap();
        assert_eq!(im.authority_hints(), ["https://ta-a.example.com"]);
        assert!(!im.metadata().is_empty());
    }

    #[test]
    fn test_display_format() {
        let topology = Topology::build(
            &entities(),
            &edges(&["TA-A -> OP-A"]),
            SigningAlgorithm::Es256,
        )
        .unwrap();
        assert_eq!(
            topology.get("OP-A").unwrap().to_string(),
            "EntityNode{Superiors:[\"TA-A\"], Subordinates:[], Name:OP-A, Kind:leaf, Identifier:https://op-a.example.com}"
        );
    }
}
