//! Per-`resource_kind` candidate SQL.

use std::sync::Arc;

use authz_sdk::ResourceKind;

use crate::config::ConfigHandle;
use crate::sql::sql_literal;

/// Read-only accessor yielding candidate `(parent, child)` rows as embeddable
/// SQL fragments, not materialised rows — the embedding statement runs the
/// actual query.
pub struct CatalogReader {
    config: Arc<ConfigHandle>,
}

impl CatalogReader {
    pub fn new(config: Arc<ConfigHandle>) -> Self {
        Self { config }
    }

    pub fn candidate_sql(&self, kind: ResourceKind) -> String {
        match kind {
            ResourceKind::Instance => "SELECT NULL AS parent, NULL AS child".to_string(),
            ResourceKind::Database => {
                "SELECT database_name AS parent, NULL AS child FROM catalog_databases".to_string()
            }
            ResourceKind::Table => {
                "SELECT database_name AS parent, table_name AS child FROM catalog_tables".to_string()
            }
            ResourceKind::Query => self.query_candidate_sql(),
        }
    }

    /// There is no `catalog_queries` table: queries are config-defined, not
    /// catalog-discovered, so candidates are rendered as literal rows drawn
    /// from the active config snapshot.
    fn query_candidate_sql(&self) -> String {
        let config = self.config.load();
        let rows: Vec<String> = config
            .databases
            .iter()
            .flat_map(|(database, db_config)| {
                db_config
                    .queries
                    .keys()
                    .map(move |query| format!("SELECT {} AS parent, {} AS child", sql_literal(database), sql_literal(query)))
            })
            .collect();

        if rows.is_empty() {
            "SELECT NULL AS parent, NULL AS child WHERE 0".to_string()
        } else {
            rows.join("\nUNION ALL\n")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{DatabaseConfig, EngineConfig, TableConfig};

    #[test]
    fn instance_and_database_kinds_are_fixed_sql() {
        let reader = CatalogReader::new(Arc::new(ConfigHandle::default()));
        assert!(reader.candidate_sql(ResourceKind::Instance).contains("NULL AS parent"));
        assert!(reader
            .candidate_sql(ResourceKind::Database)
            .contains("catalog_databases"));
    }

    #[test]
    fn query_candidates_drawn_from_config() {
        let mut config = EngineConfig::default();
        let mut db = DatabaseConfig::default();
        db.queries.insert("top_sales".to_string(), TableConfig::default());
        config.databases.insert("accounting".to_string(), db);
        let reader = CatalogReader::new(Arc::new(ConfigHandle::new(config)));
        let sql = reader.candidate_sql(ResourceKind::Query);
        assert!(sql.contains("'accounting'"));
        assert!(sql.contains("'top_sales'"));
    }

    #[test]
    fn no_queries_configured_yields_empty_candidate_set() {
        let reader = CatalogReader::new(Arc::new(ConfigHandle::default()));
        let sql = reader.candidate_sql(ResourceKind::Query);
        assert!(sql.contains("WHERE 0"));
    }
}
