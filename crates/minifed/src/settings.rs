//! Process settings for a minifed run.

use minifed_core::SigningAlgorithm;
use minifed_entity::SubordinateStatementsConfig;
use std::net::{Ipv4Addr, SocketAddr};
use std::time::Duration;

/// Default listen port shared by every entity.
pub const DEFAULT_PORT: u16 = 8080;

/// Default entity configuration lifetime in days.
pub const DEFAULT_VALIDITY_DAYS: u64 = 365;

/// Paths of the superior-only endpoints.
pub const LIST_PATH: &str = "/list";
/// See [`LIST_PATH`].
pub const FETCH_PATH: &str = "/fetch";
/// See [`LIST_PATH`].
pub const RESOLVE_PATH: &str = "/resolve";

const SECS_PER_DAY: u64 = 24 * 60 * 60;

/// Parameters handed to every federation entity.
#[derive(Debug, Clone, PartialEq)]
pub struct EntitySettings {
    /// Entity configuration lifetime.
    pub validity: Duration,
    /// How superiors issue subordinate statements.
    pub statements: SubordinateStatementsConfig,
}

impl Default for EntitySettings {
    fn default() -> Self {
        Self {
            validity: validity_days(DEFAULT_VALIDITY_DAYS),
            statements: SubordinateStatementsConfig::default(),
        }
    }
}

/// Settings for one run of the harness.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    /// Single listen address for all entities.
    pub listen: SocketAddr,
    /// Algorithm of every generated entity key.
    pub algorithm: SigningAlgorithm,
    /// Per-entity parameters.
    pub entity: EntitySettings,
    /// Instantiate entities no edge references as isolated nodes.
    pub include_isolated: bool,
    /// Treat two entities sharing a hostname as a config error.
    pub strict_hosts: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            listen: SocketAddr::from((Ipv4Addr::UNSPECIFIED, DEFAULT_PORT)),
            algorithm: SigningAlgorithm::default(),
            entity: EntitySettings::default(),
            include_isolated: false,
            strict_hosts: false,
        }
    }
}

/// Duration of `days` whole days.
#[must_use]
pub const fn validity_days(days: u64) -> Duration {
    Duration::from_secs(days.saturating_mul(SECS_PER_DAY))
}
