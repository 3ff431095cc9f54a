//! The config-driven provider's configuration tree and its snapshot handle.
//!
//! Mirrors a `ConfigPermissionProcessor`-style allow/deny tree. This crate
//! never reads a file or parses YAML/JSON text itself (an
//! explicit non-goal): `EngineConfig` is a plain `Deserialize` struct tree
//! and the embedder is responsible for producing a value of it however it
//! likes (file, env, hardcoded test fixture).

use std::collections::HashMap;
use std::sync::Arc;

use arc_swap::ArcSwap;
use serde::{Deserialize, Serialize};

/// An allow block: actor-attribute key → expected literal or list of
/// literals. The sentinel value `"*"` matches any non-null actor value.
pub type AllowBlock = serde_json::Map<String, serde_json::Value>;

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct TableConfig {
    #[serde(default)]
    pub permissions: HashMap<String, AllowBlock>,
    #[serde(default)]
    pub allow: Option<AllowBlock>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct DatabaseConfig {
    #[serde(default)]
    pub permissions: HashMap<String, AllowBlock>,
    #[serde(default)]
    pub allow: Option<AllowBlock>,
    #[serde(default)]
    pub allow_sql: Option<AllowBlock>,
    #[serde(default)]
    pub tables: HashMap<String, TableConfig>,
    #[serde(default)]
    pub queries: HashMap<String, TableConfig>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct Settings {
    pub default_allow_sql: bool,
    pub allow_signed_tokens: bool,
    pub max_signed_tokens_ttl: Option<i64>,
    pub default_deny: bool,
    pub root_enabled: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            default_allow_sql: false,
            allow_signed_tokens: true,
            max_signed_tokens_ttl: None,
            default_deny: false,
            root_enabled: false,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct EngineConfig {
    pub permissions: HashMap<String, AllowBlock>,
    pub allow: Option<AllowBlock>,
    pub allow_sql: Option<AllowBlock>,
    pub databases: HashMap<String, DatabaseConfig>,
    pub settings: Settings,
}

/// An atomically swappable [`EngineConfig`] snapshot. Readers call
/// [`ConfigHandle::load`] once at the top of a request and use that single
/// `Arc` throughout, so a concurrent [`ConfigHandle::store`] never produces
/// a torn read within one resolution.
#[derive(Debug)]
pub struct ConfigHandle {
    inner: ArcSwap<EngineConfig>,
}

impl ConfigHandle {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            inner: ArcSwap::from_pointee(config),
        }
    }

    pub fn load(&self) -> Arc<EngineConfig> {
        self.inner.load_full()
    }

    pub fn store(&self, config: EngineConfig) {
        self.inner.store(Arc::new(config));
    }
}

impl Default for ConfigHandle {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

/// Evaluates whether `actor` matches an allow block: for every key in the
/// block, the actor's corresponding attribute must intersect the expected
/// set (or the expected set contains `"*"` and the attribute is non-null).
/// An actor key absent entirely means "no match".
pub fn actor_matches_allow(actor: &authz_sdk::Actor, block: &AllowBlock) -> bool {
    for (key, expected) in block {
        let Some(actual) = actor.attribute(key) else {
            return false;
        };
        let expected_values: Vec<&serde_json::Value> = match expected.as_array() {
            Some(items) => items.iter().collect(),
            None => vec![expected],
        };
        if expected_values
            .iter()
            .any(|value| value.as_str() == Some("*"))
        {
            if actual.is_null() {
                return false;
            }
            continue;
        }
        let actual_values: Vec<&serde_json::Value> = match actual.as_array() {
            Some(items) => items.iter().collect(),
            None => vec![actual],
        };
        let intersects = actual_values
            .iter()
            .any(|value| expected_values.contains(value));
        if !intersects {
            return false;
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use authz_sdk::Actor;
    use serde_json::json;

    fn block(value: serde_json::Value) -> AllowBlock {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn wildcard_matches_any_non_null() {
        let actor = Actor::new(json!({"id": "alice", "role": "admin"}));
        assert!(actor_matches_allow(&actor, &block(json!({"role": "*"}))));
    }

    #[test]
    fn missing_actor_key_never_matches() {
        let actor = Actor::new(json!({"id": "alice"}));
        assert!(!actor_matches_allow(&actor, &block(json!({"role": "*"}))));
    }

    #[test]
    fn list_expected_intersects_scalar_actor_value() {
        let actor = Actor::new(json!({"id": "alice", "role": "editor"}));
        assert!(actor_matches_allow(
            &actor,
            &block(json!({"role": ["editor", "admin"]}))
        ));
        assert!(!actor_matches_allow(
            &actor,
            &block(json!({"role": ["viewer"]}))
        ));
    }

    #[test]
    fn actor_list_value_intersects_expected_scalar() {
        let actor = Actor::new(json!({"id": "alice", "groups": ["eng", "ops"]}));
        assert!(actor_matches_allow(&actor, &block(json!({"groups": "eng"}))));
    }

    #[test]
    fn config_handle_swap_is_atomic() {
        let handle = ConfigHandle::new(EngineConfig::default());
        let before = handle.load();
        assert!(!before.settings.default_deny);
        let mut next = EngineConfig::default();
        next.settings.default_deny = true;
        handle.store(next);
        let after = handle.load();
        assert!(after.settings.default_deny);
        assert!(!before.settings.default_deny);
    }
}
