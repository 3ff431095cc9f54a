//! Translates the nested configuration document into rule fragments,
//! including the restriction-gate algorithm that prevents a narrower
//! downstream allow from widening access a restriction allowlist already
//! cut off.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use authz_sdk::{Action, Actor, RuleFragment, RulesProvider, SqlValue};

use crate::config::{actor_matches_allow, AllowBlock, ConfigHandle};

pub struct ConfigProvider {
    config: Arc<ConfigHandle>,
}

impl ConfigProvider {
    pub fn new(config: Arc<ConfigHandle>) -> Self {
        Self { config }
    }
}

struct Row {
    parent: Option<String>,
    child: Option<String>,
    allow: bool,
    reason: String,
}

fn lookup_block<'a>(
    map: &'a std::collections::HashMap<String, AllowBlock>,
    action: &Action,
) -> Option<&'a AllowBlock> {
    map.get(&action.name).or_else(|| map.get(&action.abbr))
}

fn evaluate(
    parent: Option<String>,
    child: Option<String>,
    actor: &Actor,
    block: &AllowBlock,
    label: &str,
) -> Row {
    if actor_matches_allow(actor, block) {
        Row {
            parent,
            child,
            allow: true,
            reason: format!("{label}: allow"),
        }
    } else {
        Row {
            parent,
            child,
            allow: false,
            reason: format!("{label}: present but not matched"),
        }
    }
}

fn rows_to_fragment(source: &str, rows: Vec<Row>) -> RuleFragment {
    let mut parts = Vec::with_capacity(rows.len());
    let mut params = BTreeMap::new();
    for (idx, row) in rows.into_iter().enumerate() {
        let key = format!("row_{idx}");
        parts.push(format!(
            "SELECT :{key}_parent AS parent, :{key}_child AS child, :{key}_allow AS allow, :{key}_reason AS reason"
        ));
        params.insert(format!("{key}_parent"), row.parent.into());
        params.insert(format!("{key}_child"), row.child.into());
        params.insert(format!("{key}_allow"), SqlValue::Bool(row.allow));
        params.insert(format!("{key}_reason"), SqlValue::Text(row.reason));
    }
    let mut fragment = RuleFragment::rule(source, parts.join("\nUNION ALL\n"));
    fragment.params = params;
    fragment
}

#[async_trait]
impl RulesProvider for ConfigProvider {
    fn name(&self) -> &str {
        "config"
    }

    async fn fragments(
        &self,
        actor: &Actor,
        action: &Action,
    ) -> Result<Vec<RuleFragment>, anyhow::Error> {
        let config = self.config.load();
        let mut rows: Vec<Row> = Vec::new();

        if let Some(block) = lookup_block(&config.permissions, action) {
            rows.push(evaluate(None, None, actor, block, "config permissions"));
        }
        if matches!(
            action.name.as_str(),
            "view-instance" | "view-database" | "view-table" | "view-query"
        ) {
            if let Some(block) = &config.allow {
                rows.push(evaluate(None, None, actor, block, "config allow"));
            }
        }
        if action.name == "execute-sql" {
            if let Some(block) = &config.allow_sql {
                rows.push(evaluate(None, None, actor, block, "config allow_sql"));
            }
        }

        for (database, db_config) in &config.databases {
            if let Some(block) = lookup_block(&db_config.permissions, action) {
                rows.push(evaluate(
                    Some(database.clone()),
                    None,
                    actor,
                    block,
                    "config database permissions",
                ));
            }
            if let Some(block) = &db_config.allow {
                if action.name == "view-database" || action.name == "view-table" || action.name == "view-query" {
                    let label = if action.name == "view-database" {
                        "config database allow"
                    } else {
                        "config database allow (inherited)"
                    };
                    rows.push(evaluate(Some(database.clone()), None, actor, block, label));
                }
            }
            if action.name == "execute-sql" {
                if let Some(block) = &db_config.allow_sql {
                    rows.push(evaluate(
                        Some(database.clone()),
                        None,
                        actor,
                        block,
                        "config database allow_sql",
                    ));
                }
            }

            for (table, table_config) in &db_config.tables {
                if let Some(block) = lookup_block(&table_config.permissions, action) {
                    rows.push(evaluate(
                        Some(database.clone()),
                        Some(table.clone()),
                        actor,
                        block,
                        "config table permissions",
                    ));
                }
                if action.name == "view-table" {
                    if let Some(block) = &table_config.allow {
                        rows.push(evaluate(
                            Some(database.clone()),
                            Some(table.clone()),
                            actor,
                            block,
                            "config table allow",
                        ));
                    }
                }
            }
            for (query, query_config) in &db_config.queries {
                if let Some(block) = lookup_block(&query_config.permissions, action) {
                    rows.push(evaluate(
                        Some(database.clone()),
                        Some(query.clone()),
                        actor,
                        block,
                        "config query permissions",
                    ));
                }
                if action.name == "view-query" {
                    if let Some(block) = &query_config.allow {
                        rows.push(evaluate(
                            Some(database.clone()),
                            Some(query.clone()),
                            actor,
                            block,
                            "config query allow",
                        ));
                    }
                }
            }
        }

        // Restriction gate: a root/parent-scope deny combined with an
        // actor that holds `_r` restrictions must not let a narrower
        // downstream allow widen access back beyond the restriction
        // allowlist — so gate every restricted child in the denied scope
        // with an explicit child-scope deny of our own.
        if let Some(restrictions) = actor.restrictions() {
            let covered_children = restrictions.allowed_children(&action.abbr, &action.name);
            let mut gate_rows = Vec::new();
            for row in rows.iter().filter(|row| !row.allow) {
                match (&row.parent, &row.child) {
                    (None, None) => {
                        for (parent, child) in &covered_children {
                            gate_rows.push(Row {
                                parent: Some((*parent).to_string()),
                                child: Some((*child).to_string()),
                                allow: false,
                                reason: format!("restriction gate ({})", row.reason),
                            });
                        }
                    }
                    (Some(denied_parent), None) => {
                        for (parent, child) in &covered_children {
                            if parent == denied_parent {
                                gate_rows.push(Row {
                                    parent: Some((*parent).to_string()),
                                    child: Some((*child).to_string()),
                                    allow: false,
                                    reason: format!("restriction gate ({})", row.reason),
                                });
                            }
                        }
                    }
                    (Some(_), Some(_)) => {}
                }
            }
            rows.extend(gate_rows);
        }

        if rows.is_empty() {
            return Ok(vec![]);
        }

        Ok(vec![rows_to_fragment(self.name(), rows)])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{DatabaseConfig, EngineConfig, TableConfig};
    use authz_sdk::ResourceKind;
    use serde_json::json;

    fn action(name: &str, abbr: &str, parent: bool, child: bool, kind: ResourceKind) -> Action {
        Action::new(name, abbr, parent, child, kind).unwrap()
    }

    fn view_table() -> Action {
        action("view-table", "vt", true, true, ResourceKind::Table)
    }

    #[tokio::test]
    async fn root_permissions_block_emits_allow_or_deny() {
        let mut config = EngineConfig::default();
        config
            .permissions
            .insert("view-table".to_string(), json!({"role": "admin"}).as_object().unwrap().clone());
        let provider = ConfigProvider::new(Arc::new(ConfigHandle::new(config)));

        let admin = Actor::new(json!({"id": "alice", "role": "admin"}));
        let fragments = provider.fragments(&admin, &view_table()).await.unwrap();
        assert_eq!(fragments.len(), 1);
        assert!(fragments[0].params.values().any(|v| matches!(v, SqlValue::Bool(true))));

        let stranger = Actor::new(json!({"id": "bob"}));
        let fragments = provider.fragments(&stranger, &view_table()).await.unwrap();
        assert!(fragments[0].params.values().any(|v| matches!(v, SqlValue::Bool(false))));
    }

    #[tokio::test]
    async fn database_allow_inherits_to_view_table() {
        let mut config = EngineConfig::default();
        let mut db = DatabaseConfig::default();
        db.allow = Some(json!({"role": "*"}).as_object().unwrap().clone());
        config.databases.insert("accounting".to_string(), db);
        let provider = ConfigProvider::new(Arc::new(ConfigHandle::new(config)));

        let actor = Actor::new(json!({"id": "alice", "role": "viewer"}));
        let fragments = provider.fragments(&actor, &view_table()).await.unwrap();
        assert_eq!(fragments.len(), 1);
    }

    #[tokio::test]
    async fn restriction_gate_denies_restricted_children_under_parent_deny() {
        let mut config = EngineConfig::default();
        let mut db = DatabaseConfig::default();
        db.permissions.insert(
            "view-table".to_string(),
            json!({"role": "nobody"}).as_object().unwrap().clone(),
        );
        db.tables.insert("sales".to_string(), TableConfig::default());
        config.databases.insert("accounting".to_string(), db);
        let provider = ConfigProvider::new(Arc::new(ConfigHandle::new(config)));

        let actor = Actor::new(json!({
            "id": "alice",
            "_r": {"r": {"accounting": {"sales": ["vt"]}}}
        }));
        let fragments = provider.fragments(&actor, &view_table()).await.unwrap();
        assert_eq!(fragments.len(), 1);
        // Two rows expected: the parent-scope deny itself, plus the gated
        // child-scope deny for accounting/sales.
        let row_count = fragments[0].params.len() / 4;
        assert_eq!(row_count, 2);
    }

    #[tokio::test]
    async fn no_config_entries_is_no_opinion() {
        let provider = ConfigProvider::new(Arc::new(ConfigHandle::default()));
        let actor = Actor::new(json!({"id": "alice"}));
        assert!(provider.fragments(&actor, &view_table()).await.unwrap().is_empty());
    }
}
