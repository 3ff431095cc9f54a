//! Example external `RulesProvider`.
//!
//! Demonstrates the provider contract end to end, the way a first-time
//! plugin author would use it: a blanket deny for `view-table`, plus two
//! named-actor allows scoped to a specific database and a specific table.
//! This crate is demo code — it is not part of the engine's own default
//! provider set and an embedder opts into it explicitly.

use async_trait::async_trait;
use authz_sdk::{Action, Actor, RuleFragment, RulesProvider};

pub struct ExamplePermissionsPlugin;

#[async_trait]
impl RulesProvider for ExamplePermissionsPlugin {
    fn name(&self) -> &str {
        "example_permissions_plugin"
    }

    async fn fragments(
        &self,
        actor: &Actor,
        action: &Action,
    ) -> Result<Vec<RuleFragment>, anyhow::Error> {
        if action.name != "view-table" {
            return Ok(Vec::new());
        }

        let actor_id = actor.id().unwrap_or_default().to_string();

        let root_deny = RuleFragment::rule(
            "example_default_deny",
            "SELECT NULL AS parent, NULL AS child, 0 AS allow, \
             'example plugin default deny' AS reason",
        );

        let pelican_allow = RuleFragment::rule(
            "pelican_content_tables",
            "SELECT database_name AS parent, table_name AS child, 1 AS allow, \
             'pelican allowed all content tables' AS reason \
             FROM catalog_tables \
             WHERE database_name = 'content' AND :actor_id = 'pelican'",
        )
        .with_param("actor_id", actor_id.as_str());

        let violin_allow = RuleFragment::rule(
            "violin_content_repos",
            "SELECT 'content' AS parent, 'repos' AS child, 1 AS allow, \
             'violin allowed content/repos' AS reason \
             WHERE :actor_id = 'violin'",
        )
        .with_param("actor_id", actor_id.as_str());

        Ok(vec![root_deny, pelican_allow, violin_allow])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use authz_sdk::ResourceKind;
    use serde_json::json;

    fn view_table_action() -> Action {
        Action::new("view-table", "vt", true, true, ResourceKind::Table).unwrap()
    }

    #[tokio::test]
    async fn non_view_table_actions_get_no_opinion() {
        let plugin = ExamplePermissionsPlugin;
        let actor = Actor::anonymous();
        let action = Action::new("view-instance", "vi", false, false, ResourceKind::Instance).unwrap();
        let fragments = plugin.fragments(&actor, &action).await.unwrap();
        assert!(fragments.is_empty());
    }

    #[tokio::test]
    async fn view_table_always_yields_three_fragments() {
        let plugin = ExamplePermissionsPlugin;
        let actor = Actor::new(json!({"id": "someone_else"}));
        let fragments = plugin.fragments(&actor, &view_table_action()).await.unwrap();
        assert_eq!(fragments.len(), 3);
        assert_eq!(fragments[0].source, "example_default_deny");
    }

    #[tokio::test]
    async fn pelican_actor_id_is_bound_into_its_allow_fragment() {
        let plugin = ExamplePermissionsPlugin;
        let actor = Actor::new(json!({"id": "pelican"}));
        let fragments = plugin.fragments(&actor, &view_table_action()).await.unwrap();
        let pelican = fragments
            .iter()
            .find(|fragment| fragment.source == "pelican_content_tables")
            .unwrap();
        assert_eq!(
            pelican.params.get("actor_id"),
            Some(&authz_sdk::SqlValue::Text("pelican".to_string()))
        );
    }
}
