//! A composable, SQL-native authorization engine.
//!
//! Rules are contributed by independent [`RulesProvider`] implementations as
//! parameterized SQL fragments, fanned out concurrently and composed into a
//! single query by [`resolver`] rather than evaluated in memory.

pub mod catalog;
pub mod config;
pub mod dispatcher;
pub mod providers;
pub mod resolver;
pub mod sql;
pub mod token;

use std::sync::Arc;

use authz_sdk::{ActionRegistry, RulesProvider};

pub use authz_sdk::{
    Action, Actor, AuthzError, Candidate, RegistryError, ResourceKind, RuleFragment, Restrictions,
    Signer, Verdict,
};

pub use catalog::CatalogReader;
pub use config::{ConfigHandle, EngineConfig};
pub use dispatcher::Dispatcher;
pub use token::{actor_from_bearer, actor_from_cookie, HmacSigner, TokenSettings};

/// Builds the five built-in providers against a shared config snapshot, in
/// the conventional default-check order: root user, config rules, default
/// allow, default-deny SQL, then the
/// actor-restrictions filter. Order has no effect on the resolved verdict
/// (resolution is order-independent by construction) but does affect which
/// fragment the composer sees first when diagnosing with `tracing`.
pub fn default_providers(config: Arc<ConfigHandle>) -> Vec<Arc<dyn RulesProvider>> {
    let settings = config.load().settings.clone();
    vec![
        Arc::new(providers::RootUserProvider::new(settings.root_enabled)),
        Arc::new(providers::ConfigProvider::new(Arc::clone(&config))),
        Arc::new(providers::DefaultAllowProvider::new(settings.default_deny)),
        Arc::new(providers::DefaultDenySqlProvider::new(settings.default_allow_sql)),
        Arc::new(providers::ActorRestrictionsProvider),
    ]
}

/// Convenience assembly: the default provider set plus the built-in action
/// registry, wired into a ready-to-use [`Dispatcher`].
pub fn default_dispatcher(config: Arc<ConfigHandle>, pool: sqlx::SqlitePool) -> Dispatcher {
    let registry = Arc::new(ActionRegistry::with_defaults());
    let providers = default_providers(Arc::clone(&config));
    let catalog = Arc::new(CatalogReader::new(config));
    Dispatcher::new(registry, providers, catalog, pool)
}
