//! The filter-only provider that turns `_r` into a restriction relation.
//! Contributes no decisions, only candidate filtering.

use async_trait::async_trait;
use authz_sdk::{Action, Actor, RuleFragment, RulesProvider, SqlValue};

pub struct ActorRestrictionsProvider;

#[async_trait]
impl RulesProvider for ActorRestrictionsProvider {
    fn name(&self) -> &str {
        "actor_restrictions"
    }

    async fn fragments(
        &self,
        actor: &Actor,
        action: &Action,
    ) -> Result<Vec<RuleFragment>, anyhow::Error> {
        let Some(restrictions) = actor.restrictions() else {
            return Ok(vec![]);
        };
        if restrictions.is_globally_allowed(&action.abbr, &action.name) {
            return Ok(vec![]);
        }

        let parents = restrictions.allowed_parents(&action.abbr, &action.name);
        let children = restrictions.allowed_children(&action.abbr, &action.name);

        if parents.is_empty() && children.is_empty() {
            return Ok(vec![RuleFragment::restriction(
                self.name(),
                "SELECT NULL AS parent, NULL AS child WHERE 0",
            )]);
        }

        let mut parts = Vec::with_capacity(parents.len() + children.len());
        let mut fragment = RuleFragment::restriction(self.name(), String::new());

        for (idx, parent) in parents.iter().enumerate() {
            let key = format!("parent_{idx}");
            parts.push(format!("SELECT :{key} AS parent, NULL AS child"));
            fragment
                .params
                .insert(key, SqlValue::Text((*parent).to_string()));
        }
        for (idx, (parent, child)) in children.iter().enumerate() {
            let parent_key = format!("child_{idx}_parent");
            let child_key = format!("child_{idx}_child");
            parts.push(format!(
                "SELECT :{parent_key} AS parent, :{child_key} AS child"
            ));
            fragment
                .params
                .insert(parent_key, SqlValue::Text((*parent).to_string()));
            fragment
                .params
                .insert(child_key, SqlValue::Text((*child).to_string()));
        }

        fragment.restriction_sql = Some(parts.join("\nUNION ALL\n"));
        Ok(vec![fragment])
    }
}
