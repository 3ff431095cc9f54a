//! Named-to-positional SQL parameter rewriting.

use std::collections::BTreeMap;

use authz_sdk::SqlValue;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SqlRewriteError {
    #[error("SQL references unbound parameter `:{0}`")]
    UnboundParameter(String),
}

/// Rewrites every `:ident` placeholder in `sql` (outside single-quoted
/// string literals) into `?`, returning the rewritten text alongside an
/// ordered bind-value vector aligned to occurrence order. A parameter
/// referenced more than once is duplicated in the output vector once per
/// occurrence, since positional binds have no notion of reuse.
pub fn rewrite_named_params(
    sql: &str,
    params: &BTreeMap<String, SqlValue>,
) -> Result<(String, Vec<SqlValue>), SqlRewriteError> {
    let chars: Vec<char> = sql.chars().collect();
    let n = chars.len();
    let mut out = String::with_capacity(sql.len());
    let mut bound = Vec::new();
    let mut in_string = false;
    let mut i = 0;

    while i < n {
        let c = chars[i];

        if in_string {
            out.push(c);
            if c == '\'' {
                if i + 1 < n && chars[i + 1] == '\'' {
                    out.push(chars[i + 1]);
                    i += 2;
                    continue;
                }
                in_string = false;
            }
            i += 1;
            continue;
        }

        if c == '\'' {
            in_string = true;
            out.push(c);
            i += 1;
            continue;
        }

        let starts_ident = i + 1 < n && (chars[i + 1].is_ascii_alphabetic() || chars[i + 1] == '_');
        if c == ':' && starts_ident {
            let start = i + 1;
            let mut j = start;
            while j < n && (chars[j].is_ascii_alphanumeric() || chars[j] == '_') {
                j += 1;
            }
            let name: String = chars[start..j].iter().collect();
            let value = params
                .get(&name)
                .ok_or_else(|| SqlRewriteError::UnboundParameter(name.clone()))?;
            out.push('?');
            bound.push(value.clone());
            i = j;
            continue;
        }

        out.push(c);
        i += 1;
    }

    Ok((out, bound))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(pairs: &[(&str, SqlValue)]) -> BTreeMap<String, SqlValue> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.clone())).collect()
    }

    #[test]
    fn single_placeholder_rewritten() {
        let params = params(&[("actor_id", SqlValue::Text("alice".into()))]);
        let (sql, bound) =
            rewrite_named_params("SELECT 1 WHERE id = :actor_id", &params).unwrap();
        assert_eq!(sql, "SELECT 1 WHERE id = ?");
        assert_eq!(bound, vec![SqlValue::Text("alice".into())]);
    }

    #[test]
    fn repeated_placeholder_duplicates_value() {
        let params = params(&[("x", SqlValue::Int(1))]);
        let (sql, bound) = rewrite_named_params(":x = :x", &params).unwrap();
        assert_eq!(sql, "? = ?");
        assert_eq!(bound, vec![SqlValue::Int(1), SqlValue::Int(1)]);
    }

    #[test]
    fn colon_inside_string_literal_ignored() {
        let params = BTreeMap::new();
        let (sql, bound) = rewrite_named_params("SELECT 'a:b'", &params).unwrap();
        assert_eq!(sql, "SELECT 'a:b'");
        assert!(bound.is_empty());
    }

    #[test]
    fn escaped_quote_inside_string_handled() {
        let params = BTreeMap::new();
        let (sql, _) = rewrite_named_params("SELECT 'it''s :not_a_param'", &params).unwrap();
        assert_eq!(sql, "SELECT 'it''s :not_a_param'");
    }

    #[test]
    fn unbound_parameter_is_an_error() {
        let params = BTreeMap::new();
        let err = rewrite_named_params("SELECT :missing", &params).unwrap_err();
        assert_eq!(err, SqlRewriteError::UnboundParameter("missing".to_string()));
    }
}
