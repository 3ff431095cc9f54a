//! A recoverable default deny for `execute-sql` when SQL execution isn't
//! allowed by default; more specific allow fragments win by depth.

use async_trait::async_trait;
use authz_sdk::{Action, Actor, RuleFragment, RulesProvider};

pub struct DefaultDenySqlProvider {
    default_allow_sql: bool,
}

impl DefaultDenySqlProvider {
    pub fn new(default_allow_sql: bool) -> Self {
        Self { default_allow_sql }
    }
}

#[async_trait]
impl RulesProvider for DefaultDenySqlProvider {
    fn name(&self) -> &str {
        "default_deny_sql"
    }

    async fn fragments(
        &self,
        _actor: &Actor,
        action: &Action,
    ) -> Result<Vec<RuleFragment>, anyhow::Error> {
        if action.name != "execute-sql" || self.default_allow_sql {
            return Ok(vec![]);
        }
        Ok(vec![RuleFragment::rule(
            self.name(),
            "SELECT NULL AS parent, NULL AS child, 0 AS allow, 'default_allow_sql is false' AS reason",
        )])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use authz_sdk::ResourceKind;
    use serde_json::json;

    fn execute_sql() -> Action {
        Action::new("execute-sql", "es", true, false, ResourceKind::Database).unwrap()
    }

    #[tokio::test]
    async fn denies_execute_sql_by_default() {
        let provider = DefaultDenySqlProvider::new(false);
        let actor = Actor::new(json!({"id": "alice"}));
        let fragments = provider.fragments(&actor, &execute_sql()).await.unwrap();
        assert_eq!(fragments.len(), 1);
    }

    #[tokio::test]
    async fn no_opinion_when_default_allow_sql_is_true() {
        let provider = DefaultDenySqlProvider::new(true);
        let actor = Actor::new(json!({"id": "alice"}));
        assert!(provider
            .fragments(&actor, &execute_sql())
            .await
            .unwrap()
            .is_empty());
    }
}
