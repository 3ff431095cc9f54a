//! Parsed form of the actor-embedded `_r` restrictions record.
//!
//! Ported from the `ActorRestrictions` dataclass in the original
//! implementation: a global allowlist, a parent-scoped allowlist, and a
//! child-scoped allowlist, each keyed by action name or abbreviation.

use std::collections::{HashMap, HashSet};

use serde_json::Value;

/// An actor-embedded allowlist that narrows (never widens) the candidate set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Restrictions {
    global_actions: HashSet<String>,
    parent_actions: HashMap<String, HashSet<String>>,
    child_actions: HashMap<String, HashMap<String, HashSet<String>>>,
}

impl Restrictions {
    /// Parses an `_r` JSON value. Malformed shapes degrade to empty sets
    /// rather than erroring — restrictions are a filter, and an
    /// unparseable entry should narrow to "nothing allowed", not panic.
    pub fn from_value(value: &Value) -> Self {
        let global_actions = value
            .get("a")
            .and_then(Value::as_array)
            .map(|items| items.iter().filter_map(Value::as_str).map(String::from).collect())
            .unwrap_or_default();

        let parent_actions = value
            .get("d")
            .and_then(Value::as_object)
            .map(|map| {
                map.iter()
                    .filter_map(|(parent, actions)| {
                        let actions = actions.as_array()?;
                        let set = actions.iter().filter_map(Value::as_str).map(String::from).collect();
                        Some((parent.clone(), set))
                    })
                    .collect()
            })
            .unwrap_or_default();

        let child_actions = value
            .get("r")
            .and_then(Value::as_object)
            .map(|parents| {
                parents
                    .iter()
                    .filter_map(|(parent, children)| {
                        let children = children.as_object()?;
                        let per_child = children
                            .iter()
                            .filter_map(|(child, actions)| {
                                let actions = actions.as_array()?;
                                let set =
                                    actions.iter().filter_map(Value::as_str).map(String::from).collect();
                                Some((child.clone(), set))
                            })
                            .collect();
                        Some((parent.clone(), per_child))
                    })
                    .collect()
            })
            .unwrap_or_default();

        Self {
            global_actions,
            parent_actions,
            child_actions,
        }
    }

    fn covered(allowed: &HashSet<String>, variants: &[&str]) -> bool {
        variants.iter().any(|variant| allowed.contains(*variant))
    }

    /// True if any of the action's name/abbreviation variants is present in
    /// the global (`a`) allowlist.
    pub fn is_globally_allowed(&self, abbr: &str, name: &str) -> bool {
        Self::covered(&self.global_actions, &[abbr, name])
    }

    /// Parents for which some variant of the action is covered by `d`.
    pub fn allowed_parents(&self, abbr: &str, name: &str) -> Vec<&str> {
        let variants = [abbr, name];
        self.parent_actions
            .iter()
            .filter(|(_, actions)| Self::covered(actions, &variants))
            .map(|(parent, _)| parent.as_str())
            .collect()
    }

    /// `(parent, child)` pairs for which some variant of the action is
    /// covered by `r`.
    pub fn allowed_children(&self, abbr: &str, name: &str) -> Vec<(&str, &str)> {
        let variants = [abbr, name];
        self.child_actions
            .iter()
            .flat_map(|(parent, children)| {
                children
                    .iter()
                    .filter(move |(_, actions)| Self::covered(actions, &variants))
                    .map(move |(child, _)| (parent.as_str(), child.as_str()))
            })
            .collect()
    }

    /// True if neither a parent nor a child entry covers the action —
    /// callers should emit the empty-restriction sentinel in this case.
    pub fn covers_nothing(&self, abbr: &str, name: &str) -> bool {
        self.allowed_parents(abbr, name).is_empty() && self.allowed_children(abbr, name).is_empty()
    }
}
