//! Fragment composition and the resolution CTE.

use std::collections::BTreeMap;

use authz_sdk::{Actor, RuleFragment, SqlValue, Verdict};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};

use crate::sql::{rewrite_named_params, sql_literal, SqlRewriteError};

/// Names no provider may set itself; the engine supplies them on every
/// fragment so providers can reference
/// `:actor_id`/`:actor`/`:action` without threading them through by hand.
fn reserved_params(actor: &Actor, action: &str) -> BTreeMap<String, SqlValue> {
    let mut reserved = BTreeMap::new();
    reserved.insert("actor_id".to_string(), actor.id().into());
    reserved.insert(
        "actor".to_string(),
        SqlValue::Text(actor.as_json().to_string()),
    );
    reserved.insert("action".to_string(), SqlValue::Text(action.to_string()));
    reserved
}

/// A provider's own params win on collision (mirrors the Python
/// implementation's `params.setdefault` for the reserved keys, seen from the
/// other direction: the caller already owns the key it explicitly set).
fn with_reserved(fragment_params: &BTreeMap<String, SqlValue>, reserved: &BTreeMap<String, SqlValue>) -> BTreeMap<String, SqlValue> {
    let mut effective = reserved.clone();
    effective.extend(fragment_params.iter().map(|(k, v)| (k.clone(), v.clone())));
    effective
}

#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
    #[error(transparent)]
    Rewrite(#[from] SqlRewriteError),
    #[error(transparent)]
    Sql(#[from] sqlx::Error),
}

pub struct ComposedQuery {
    pub sql: String,
    pub bindings: Vec<SqlValue>,
}

/// Partitions raw fragments into rule fragments (have `sql`) and
/// restriction fragments (have `restriction_sql`).
pub fn partition_fragments(fragments: Vec<RuleFragment>) -> (Vec<RuleFragment>, Vec<RuleFragment>) {
    fragments
        .into_iter()
        .partition(|fragment| fragment.sql.is_some())
}

/// Builds the full resolution CTE text and its ordered bind-value vector.
/// `candidate_sql` must already be safe to embed (see `CatalogReader`).
pub fn compose(
    candidate_sql: &str,
    rule_fragments: &[RuleFragment],
    restriction_fragments: &[RuleFragment],
    actor: &Actor,
    action: &str,
    implicit_deny: bool,
) -> Result<ComposedQuery, SqlRewriteError> {
    let mut bindings = Vec::new();
    let reserved = reserved_params(actor, action);

    let rules_union = if rule_fragments.is_empty() {
        "SELECT NULL AS parent, NULL AS child, NULL AS allow, NULL AS reason, NULL AS source WHERE 0"
            .to_string()
    } else {
        let mut selects = Vec::with_capacity(rule_fragments.len());
        for fragment in rule_fragments {
            let Some(sql) = fragment.sql.as_deref() else {
                debug_assert!(false, "partition_fragments guarantees rule fragments carry sql");
                continue;
            };
            let params = with_reserved(&fragment.params, &reserved);
            let (rewritten, values) = rewrite_named_params(sql, &params)?;
            bindings.extend(values);
            let source = sql_literal(&fragment.source);
            selects.push(format!(
                "SELECT parent, child, allow, reason, {source} AS source FROM ({rewritten})"
            ));
        }
        selects.join("\nUNION ALL\n")
    };

    let restr_select = if restriction_fragments.is_empty() {
        None
    } else {
        let mut selects = Vec::with_capacity(restriction_fragments.len());
        for fragment in restriction_fragments {
            let Some(sql) = fragment.restriction_sql.as_deref() else {
                debug_assert!(
                    false,
                    "partition_fragments guarantees restriction fragments carry restriction_sql"
                );
                continue;
            };
            let params = with_reserved(&fragment.params, &reserved);
            let (rewritten, values) = rewrite_named_params(sql, &params)?;
            bindings.extend(values);
            selects.push(format!("SELECT parent, child FROM ({rewritten})"));
        }
        Some(selects.join("\nUNION ALL\n"))
    };

    let restr_cte = restr_select
        .as_ref()
        .map(|sql| format!(",\n  restr AS ( {sql} )"))
        .unwrap_or_default();

    let filtered_cands_body = if restr_select.is_some() {
        "SELECT c.* FROM cands c JOIN restr r\n        ON (r.parent IS NULL OR r.parent = c.parent)\n       AND (r.child IS NULL OR r.child = c.child)"
    } else {
        "SELECT c.* FROM cands c"
    };

    bindings.push(SqlValue::Bool(implicit_deny));
    bindings.push(SqlValue::Bool(implicit_deny));
    bindings.push(SqlValue::Text(action.to_string()));

    let sql = format!(
        "WITH\n\
         \x20 cands AS ( {candidate_sql} ),\n\
         \x20 rules AS ( {rules_union} ){restr_cte},\n\
         \x20 filtered_cands AS (\n\
         \x20   {filtered_cands_body}\n\
         \x20 ),\n\
         \x20 matched AS (\n\
         \x20   SELECT c.parent, c.child, r.allow, r.reason, r.source,\n\
         \x20          CASE WHEN r.child IS NOT NULL THEN 2\n\
         \x20               WHEN r.parent IS NOT NULL THEN 1\n\
         \x20               ELSE 0 END AS depth\n\
         \x20   FROM filtered_cands c JOIN rules r\n\
         \x20     ON (r.parent IS NULL OR r.parent = c.parent)\n\
         \x20    AND (r.child IS NULL OR r.child = c.child)\n\
         \x20 ),\n\
         \x20 ranked AS (\n\
         \x20   SELECT *, ROW_NUMBER() OVER (\n\
         \x20     PARTITION BY parent, child\n\
         \x20     ORDER BY depth DESC,\n\
         \x20              CASE WHEN allow = 0 THEN 0 ELSE 1 END,\n\
         \x20              source\n\
         \x20   ) AS rn FROM matched\n\
         \x20 ),\n\
         \x20 winner AS ( SELECT parent, child, allow, reason, source, depth FROM ranked WHERE rn = 1 )\n\
         SELECT c.parent, c.child,\n\
         \x20      COALESCE(w.allow, CASE WHEN ? THEN 0 ELSE NULL END) AS allow,\n\
         \x20      COALESCE(w.reason, CASE WHEN ? THEN 'implicit deny' ELSE NULL END) AS reason,\n\
         \x20      w.source, COALESCE(w.depth, -1) AS depth,\n\
         \x20      ? AS action,\n\
         \x20      CASE WHEN c.parent IS NULL THEN '/'\n\
         \x20           WHEN c.child IS NULL THEN '/'||c.parent\n\
         \x20           ELSE '/'||c.parent||'/'||c.child END AS resource\n\
         FROM cands c LEFT JOIN winner w\n\
         \x20 ON ((w.parent = c.parent) OR (w.parent IS NULL AND c.parent IS NULL))\n\
         \x20AND ((w.child = c.child) OR (w.child IS NULL AND c.child IS NULL))\n\
         ORDER BY c.parent, c.child"
    );

    Ok(ComposedQuery { sql, bindings })
}

/// Executes the composed query against `pool` and returns one [`Verdict`]
/// per candidate, in `ORDER BY parent, child` order.
pub async fn resolve(
    pool: &SqlitePool,
    candidate_sql: &str,
    rule_fragments: &[RuleFragment],
    restriction_fragments: &[RuleFragment],
    actor: &Actor,
    action: &str,
    implicit_deny: bool,
) -> Result<Vec<Verdict>, ResolveError> {
    let composed = compose(
        candidate_sql,
        rule_fragments,
        restriction_fragments,
        actor,
        action,
        implicit_deny,
    )?;

    let mut query = sqlx::query(&composed.sql);
    for value in &composed.bindings {
        query = match value {
            SqlValue::Null => query.bind(Option::<String>::None),
            SqlValue::Bool(b) => query.bind(*b),
            SqlValue::Int(i) => query.bind(*i),
            SqlValue::Text(s) => query.bind(s.clone()),
        };
    }

    let rows = query.fetch_all(pool).await?;
    Ok(rows.iter().map(row_to_verdict).collect())
}

fn row_to_verdict(row: &SqliteRow) -> Verdict {
    let parent: Option<String> = row.try_get("parent").ok().flatten();
    let child: Option<String> = row.try_get("child").ok().flatten();
    let allow: Option<i64> = row.try_get("allow").ok().flatten();
    let reason: Option<String> = row.try_get("reason").ok().flatten();
    let source: Option<String> = row.try_get("source").ok().flatten();
    let depth: i64 = row.try_get("depth").unwrap_or(-1);
    let action: String = row.try_get("action").unwrap_or_default();
    let resource: String = row.try_get("resource").unwrap_or_default();

    Verdict {
        parent,
        child,
        allow: allow.map(|value| value != 0),
        reason,
        source,
        depth: depth as i32,
        action,
        resource,
    }
}
