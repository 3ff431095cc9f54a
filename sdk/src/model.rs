//! The wire types exchanged between providers, the composer, and the resolver.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A scalar value bound into a provider's SQL as a named parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SqlValue {
    Null,
    Bool(bool),
    Int(i64),
    Text(String),
}

impl From<&str> for SqlValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for SqlValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<i64> for SqlValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<bool> for SqlValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl<T: Into<SqlValue>> From<Option<T>> for SqlValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(SqlValue::Null, Into::into)
    }
}

/// A SQL-expressed source of verdict rows contributed by a provider.
///
/// Exactly one of `sql` or `restriction_sql` should be meaningful for a
/// given fragment: a fragment with `sql` contributes to `rules`, a fragment
/// with `restriction_sql` contributes only to the restriction filter.
#[derive(Debug, Clone, Default)]
pub struct RuleFragment {
    /// Identifier of the originating provider; used for tracing and as the
    /// final tie-break key. Left empty, the dispatcher fills it in from the
    /// provider's own `name()`.
    pub source: String,
    /// A `SELECT` returning `(parent, child, allow, reason)`.
    pub sql: Option<String>,
    /// A `SELECT` returning `(parent, child)`, restriction-filter only.
    pub restriction_sql: Option<String>,
    pub params: BTreeMap<String, SqlValue>,
}

impl RuleFragment {
    pub fn rule(source: impl Into<String>, sql: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            sql: Some(sql.into()),
            restriction_sql: None,
            params: BTreeMap::new(),
        }
    }

    pub fn restriction(source: impl Into<String>, restriction_sql: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            sql: None,
            restriction_sql: Some(restriction_sql.into()),
            params: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn with_param(mut self, name: impl Into<String>, value: impl Into<SqlValue>) -> Self {
        self.params.insert(name.into(), value.into());
        self
    }
}

/// A `(parent, child)` resource to be decided. `child` is `None` for
/// parent-scoped actions; both are `None` for root-scoped actions.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Candidate {
    pub parent: Option<String>,
    pub child: Option<String>,
}

impl Candidate {
    pub fn root() -> Self {
        Self { parent: None, child: None }
    }

    pub fn parent(parent: impl Into<String>) -> Self {
        Self { parent: Some(parent.into()), child: None }
    }

    pub fn child(parent: impl Into<String>, child: impl Into<String>) -> Self {
        Self { parent: Some(parent.into()), child: Some(child.into()) }
    }

    /// `"/"`, `"/"+parent`, or `"/"+parent+"/"+child`.
    pub fn resource_path(&self) -> String {
        match (&self.parent, &self.child) {
            (None, _) => "/".to_string(),
            (Some(parent), None) => format!("/{parent}"),
            (Some(parent), Some(child)) => format!("/{parent}/{child}"),
        }
    }
}

/// The single resolved decision for an `(actor, action, resource)` triple.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Verdict {
    pub parent: Option<String>,
    pub child: Option<String>,
    pub allow: Option<bool>,
    pub reason: Option<String>,
    pub source: Option<String>,
    /// 2 = child scope, 1 = parent scope, 0 = root scope, -1 = no match.
    pub depth: i32,
    pub action: String,
    pub resource: String,
}

impl Verdict {
    pub fn is_allowed(&self) -> bool {
        self.allow == Some(true)
    }
}
