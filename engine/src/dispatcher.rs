//! The engine's public entry points: `can`, `permitted_resources`, `explain`.

use std::sync::Arc;
use std::time::Duration;

use authz_sdk::{Action, ActionRegistry, Actor, AuthzError, Candidate, ResourceKind, RulesProvider, Verdict};
use sqlx::SqlitePool;

use crate::catalog::CatalogReader;
use crate::resolver::{partition_fragments, resolve, ResolveError};
use crate::sql::sql_literal;

/// Assembles the provider fan-out barrier, SQL resolution, and candidate
/// generation behind the three public operations.
pub struct Dispatcher {
    registry: Arc<ActionRegistry>,
    providers: Vec<Arc<dyn RulesProvider>>,
    catalog: Arc<CatalogReader>,
    pool: SqlitePool,
    resolve_timeout: Duration,
}

impl Dispatcher {
    pub fn new(
        registry: Arc<ActionRegistry>,
        providers: Vec<Arc<dyn RulesProvider>>,
        catalog: Arc<CatalogReader>,
        pool: SqlitePool,
    ) -> Self {
        Self {
            registry,
            providers,
            catalog,
            pool,
            resolve_timeout: Duration::from_secs(5),
        }
    }

    #[must_use]
    pub fn with_resolve_timeout(mut self, timeout: Duration) -> Self {
        self.resolve_timeout = timeout;
        self
    }

    fn lookup(&self, action_name: &str) -> Result<&Action, AuthzError> {
        self.registry
            .lookup(action_name)
            .ok_or_else(|| AuthzError::UnknownAction(action_name.to_string()))
    }

    #[tracing::instrument(skip(self, actor), fields(action = action.name.as_str()))]
    async fn resolve_candidates(
        &self,
        actor: &Actor,
        action: &Action,
        candidate_sql: &str,
        implicit_deny: bool,
    ) -> Result<Vec<Verdict>, AuthzError> {
        let fan_out = self.providers.iter().map(|provider| {
            let provider = Arc::clone(provider);
            let actor = actor.clone();
            let action = action.clone();
            async move {
                let outcome = provider.fragments(&actor, &action).await;
                (provider.name().to_string(), outcome)
            }
        });

        let results = futures::future::join_all(fan_out).await;

        let mut fragments = Vec::new();
        for (source, outcome) in results {
            let provider_fragments =
                outcome.map_err(|error| AuthzError::Provider { source: source.clone(), error })?;
            for mut fragment in provider_fragments {
                if fragment.source.is_empty() {
                    fragment.source = source.clone();
                }
                fragments.push(fragment);
            }
        }

        let (rule_fragments, restriction_fragments) = partition_fragments(fragments);

        let outcome = tokio::time::timeout(
            self.resolve_timeout,
            resolve(
                &self.pool,
                candidate_sql,
                &rule_fragments,
                &restriction_fragments,
                actor,
                &action.name,
                implicit_deny,
            ),
        )
        .await
        .map_err(|_elapsed| AuthzError::Cancelled)?;

        match outcome {
            Ok(verdicts) => Ok(verdicts),
            Err(ResolveError::Sql(error)) => Err(AuthzError::Sql(error)),
            Err(ResolveError::Rewrite(error)) => Err(AuthzError::Provider {
                source: "sql-rewrite".to_string(),
                error: error.into(),
            }),
        }
    }

    /// `can(actor, action, resource) -> bool`.
    pub async fn can(
        &self,
        actor: &Actor,
        action_name: &str,
        resource: &Candidate,
    ) -> Result<bool, AuthzError> {
        Ok(self.explain(actor, action_name, resource).await?.is_allowed())
    }

    /// `explain(actor, action, resource) -> Verdict`.
    pub async fn explain(
        &self,
        actor: &Actor,
        action_name: &str,
        resource: &Candidate,
    ) -> Result<Verdict, AuthzError> {
        let action = self.lookup(action_name)?.clone();
        validate_shape(&action, resource)?;

        let candidate_sql = single_candidate_sql(resource);
        let mut verdicts = self
            .resolve_candidates(actor, &action, &candidate_sql, true)
            .await?;
        verdicts
            .pop()
            .ok_or_else(|| AuthzError::Internal("resolver returned no row for a single candidate".to_string()))
    }

    /// `permitted_resources(actor, action, kind) -> iterator<(parent, child)>`.
    ///
    /// Materialised as a `Vec` rather than a true stream: the single
    /// resolver SQL execution already returns the full result set, so a
    /// lazy stream would add no cancellation benefit beyond what the
    /// `resolve_timeout` already provides.
    pub async fn permitted_resources(
        &self,
        actor: &Actor,
        action_name: &str,
        kind_override: Option<ResourceKind>,
    ) -> Result<Vec<Candidate>, AuthzError> {
        let action = self.lookup(action_name)?.clone();
        let kind = kind_override.unwrap_or(action.resource_kind);
        let candidate_sql = self.catalog.candidate_sql(kind);

        let verdicts = self
            .resolve_candidates(actor, &action, &candidate_sql, true)
            .await?;

        Ok(verdicts
            .into_iter()
            .filter(Verdict::is_allowed)
            .map(|verdict| Candidate { parent: verdict.parent, child: verdict.child })
            .collect())
    }
}

fn single_candidate_sql(resource: &Candidate) -> String {
    let parent = resource
        .parent
        .as_deref()
        .map(sql_literal)
        .unwrap_or_else(|| "NULL".to_string());
    let child = resource
        .child
        .as_deref()
        .map(sql_literal)
        .unwrap_or_else(|| "NULL".to_string());
    format!("SELECT {parent} AS parent, {child} AS child")
}

fn validate_shape(action: &Action, resource: &Candidate) -> Result<(), AuthzError> {
    let shape_ok = match (action.takes_parent, action.takes_child) {
        (false, false) => resource.parent.is_none() && resource.child.is_none(),
        (true, false) => resource.parent.is_some() && resource.child.is_none(),
        (true, true) => resource.parent.is_some() && resource.child.is_some(),
        (false, true) => false,
    };
    if shape_ok {
        Ok(())
    } else {
        Err(AuthzError::ResourceShapeMismatch {
            action: action.name.clone(),
            parent: resource.parent.clone(),
            child: resource.child.clone(),
        })
    }
}
