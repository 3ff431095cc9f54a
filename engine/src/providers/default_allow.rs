//! Default allow for a fixed set of low-risk actions, suppressed entirely
//! in default-deny mode.

use async_trait::async_trait;
use authz_sdk::{Action, Actor, RuleFragment, RulesProvider};

const DEFAULT_ALLOW_ACTIONS: &[&str] = &[
    "view-instance",
    "view-database",
    "view-database-download",
    "view-table",
    "view-query",
    "execute-sql",
];

pub struct DefaultAllowProvider {
    default_deny: bool,
}

impl DefaultAllowProvider {
    pub fn new(default_deny: bool) -> Self {
        Self { default_deny }
    }
}

#[async_trait]
impl RulesProvider for DefaultAllowProvider {
    fn name(&self) -> &str {
        "default_allow"
    }

    async fn fragments(
        &self,
        _actor: &Actor,
        action: &Action,
    ) -> Result<Vec<RuleFragment>, anyhow::Error> {
        if self.default_deny || !DEFAULT_ALLOW_ACTIONS.contains(&action.name.as_str()) {
            return Ok(vec![]);
        }
        Ok(vec![RuleFragment::rule(
            self.name(),
            format!(
                "SELECT NULL AS parent, NULL AS child, 1 AS allow, 'default allow for {}' AS reason",
                action.name
            ),
        )])
    }
}
