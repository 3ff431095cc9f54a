//! The opaque actor record and its typed accessors.

use serde_json::Value;

use crate::restrictions::Restrictions;

/// An opaque identity record evaluated against rules.
///
/// Actors are a flat JSON object; the engine recognises a handful of keys
/// (`id`, `_r`, `token`, `token_expires`) and treats everything else as
/// passthrough data available to providers via the bound `:actor` parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor {
    attributes: Value,
}

impl Actor {
    /// Wraps a JSON object as an actor record. Non-object values are still
    /// accepted (an anonymous actor is conventionally `Value::Null`) but
    /// `id`/`restrictions`/`token_source` will all report `None`.
    pub fn new(attributes: Value) -> Self {
        Self { attributes }
    }

    pub fn anonymous() -> Self {
        Self::new(Value::Null)
    }

    pub fn with_id(id: impl Into<String>) -> Self {
        Self::new(serde_json::json!({ "id": id.into() }))
    }

    pub fn id(&self) -> Option<&str> {
        self.attributes.get("id")?.as_str()
    }

    pub fn restrictions(&self) -> Option<Restrictions> {
        let raw = self.attributes.get("_r")?;
        Some(Restrictions::from_value(raw))
    }

    pub fn token_source(&self) -> Option<&str> {
        self.attributes.get("token")?.as_str()
    }

    pub fn token_expires(&self) -> Option<i64> {
        self.attributes.get("token_expires")?.as_i64()
    }

    /// Raw attribute lookup, for providers that read actor-specific fields
    /// beyond the recognised keys (e.g. a `role` claim).
    pub fn attribute(&self, key: &str) -> Option<&Value> {
        self.attributes.get(key)
    }

    /// The JSON form bound to SQL parameter `:actor`.
    pub fn as_json(&self) -> &Value {
        &self.attributes
    }
}

impl From<Value> for Actor {
    fn from(value: Value) -> Self {
        Self::new(value)
    }
}
