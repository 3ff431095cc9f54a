//! If root is enabled and the actor is `root`, allow everything.

use async_trait::async_trait;
use authz_sdk::{Action, Actor, RuleFragment, RulesProvider};

pub struct RootUserProvider {
    root_enabled: bool,
}

impl RootUserProvider {
    pub fn new(root_enabled: bool) -> Self {
        Self { root_enabled }
    }
}

#[async_trait]
impl RulesProvider for RootUserProvider {
    fn name(&self) -> &str {
        "root_user"
    }

    async fn fragments(
        &self,
        actor: &Actor,
        _action: &Action,
    ) -> Result<Vec<RuleFragment>, anyhow::Error> {
        if self.root_enabled && actor.id() == Some("root") {
            return Ok(vec![RuleFragment::rule(
                self.name(),
                "SELECT NULL AS parent, NULL AS child, 1 AS allow, 'root user' AS reason",
            )]);
        }
        Ok(vec![])
    }
}
