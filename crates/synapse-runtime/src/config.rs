//! System configuration: an order-independent builder plus optional
//! TOML-backed settings for the plain-data knobs.

use crate::error::Result;
use crate::mailbox::Mailbox;
use crate::materializer::Materializer;
use crate::resolver::Resolver;
use crate::supervisor::{EscalateSupervisor, Supervisor};
use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

/// Everything `ActorSystem::with` needs.
///
/// Build one with the `with_*` methods in any order; every field has the
/// documented default.
pub struct SystemConfig {
    /// Mailbox shared by all actors (default: a fresh empty mailbox).
    pub mailbox: Mailbox,

    /// Resource tags offered to the fiber (default: `["default"]`).
    pub resources: Vec<String>,

    /// Fiber tick interval (default: 1ms).
    pub tick_interval: Duration,

    /// Observation hooks attached to every actor (default: none).
    pub materializers: Vec<Arc<dyn Materializer>>,

    /// Lookup chain for `actor_for` (default: none).
    pub resolvers: Vec<Arc<dyn Resolver>>,

    /// System-level supervisor, the root of every escalation chain
    /// (default: the terminal [`EscalateSupervisor`]).
    pub supervisor: Arc<dyn Supervisor>,
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            mailbox: Mailbox::new(),
            resources: vec!["default".to_string()],
            tick_interval: Duration::from_millis(1),
            materializers: Vec::new(),
            resolvers: Vec::new(),
            supervisor: Arc::new(EscalateSupervisor),
        }
    }
}

impl SystemConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_mailbox(mut self, mailbox: Mailbox) -> Self {
        self.mailbox = mailbox;
        self
    }

    pub fn with_resources(mut self, resources: Vec<String>) -> Self {
        self.resources = resources;
        self
    }

    pub fn with_tick_interval(mut self, tick_interval: Duration) -> Self {
        self.tick_interval = tick_interval;
        self
    }

    /// Append a materializer; hooks fire in the order they were added.
    pub fn with_materializer(mut self, materializer: Arc<dyn Materializer>) -> Self {
        self.materializers.push(materializer);
        self
    }

    /// Append a resolver; the chain is walked in the order they were added.
    pub fn with_resolver(mut self, resolver: Arc<dyn Resolver>) -> Self {
        self.resolvers.push(resolver);
        self
    }

    pub fn with_supervisor(mut self, supervisor: Arc<dyn Supervisor>) -> Self {
        self.supervisor = supervisor;
        self
    }
}

/// Plain-data settings loadable from a TOML file.
///
/// Covers the knobs that make sense outside code; materializers, resolvers
/// and supervisors are wired up with the builder.
///
/// ```toml
/// resources = ["default", "io"]
/// tick_interval_ms = 5
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct SystemSettings {
    #[serde(default = "default_resources")]
    pub resources: Vec<String>,

    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,
}

fn default_resources() -> Vec<String> {
    vec!["default".to_string()]
}

fn default_tick_interval_ms() -> u64 {
    1
}

impl Default for SystemSettings {
    fn default() -> Self {
        Self {
            resources: default_resources(),
            tick_interval_ms: default_tick_interval_ms(),
        }
    }
}

impl SystemSettings {
    /// Load settings from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        let settings = toml::from_str(&contents)?;
        Ok(settings)
    }
}

impl From<SystemSettings> for SystemConfig {
    fn from(settings: SystemSettings) -> Self {
        SystemConfig::default()
            .with_resources(settings.resources)
            .with_tick_interval(Duration::from_millis(settings.tick_interval_ms))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = SystemConfig::default();
        assert_eq!(config.resources, vec!["default"]);
        assert_eq!(config.tick_interval, Duration::from_millis(1));
        assert!(config.materializers.is_empty());
        assert!(config.resolvers.is_empty());
    }

    #[test]
    fn test_builder_is_order_independent() {
        let a = SystemConfig::new()
            .with_tick_interval(Duration::from_millis(7))
            .with_resources(vec!["io".to_string()]);
        let b = SystemConfig::new()
            .with_resources(vec!["io".to_string()])
            .with_tick_interval(Duration::from_millis(7));

        assert_eq!(a.resources, b.resources);
        assert_eq!(a.tick_interval, b.tick_interval);
    }

    #[test]
    fn test_settings_from_toml() {
        let settings: SystemSettings = toml::from_str(
            r#"
            resources = ["default", "io"]
            tick_interval_ms = 5
            "#,
        )
        .unwrap();

        assert_eq!(settings.resources, vec!["default", "io"]);
        assert_eq!(settings.tick_interval_ms, 5);

        let config = SystemConfig::from(settings);
        assert_eq!(config.tick_interval, Duration::from_millis(5));
    }

    #[test]
    fn test_settings_defaults_apply() {
        let settings: SystemSettings = toml::from_str("").unwrap();
        assert_eq!(settings.resources, vec!["default"]);
        assert_eq!(settings.tick_interval_ms, 1);
    }

    #[test]
    fn test_settings_load_from_file() {
        use std::io::Write;

        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "tick_interval_ms = 3").unwrap();

        let settings = SystemSettings::load(file.path()).unwrap();
        assert_eq!(settings.tick_interval_ms, 3);
    }
}
