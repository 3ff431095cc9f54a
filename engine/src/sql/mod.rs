//! SQL composition glue.
//!
//! `sqlx`'s SQLite driver only supports positional (`?`) bind parameters;
//! the provider contract is built entirely around named `:param`
//! placeholders. [`rewrite::rewrite_named_params`] bridges the two without
//! any decision logic of its own.

pub mod rewrite;

pub use rewrite::{rewrite_named_params, SqlRewriteError};

/// Renders `value` as a single-quoted SQL string literal, doubling embedded
/// quotes. Used only for provider/source names we control, never for actor
/// or config data — those always travel as bound parameters.
pub fn sql_literal(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}
