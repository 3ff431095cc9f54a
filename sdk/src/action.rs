//! The action registry: a process-wide catalog of named, append-only actions.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::RegistryError;

/// Which catalog source an action's candidates are drawn from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ResourceKind {
    Instance,
    Database,
    Table,
    Query,
}

/// A named verb that can be performed against a resource.
///
/// `takes_child` without `takes_parent` is invalid and rejected at
/// construction time; see [`Action::new`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Action {
    pub name: String,
    pub abbr: String,
    pub takes_parent: bool,
    pub takes_child: bool,
    pub resource_kind: ResourceKind,
}

impl Action {
    /// Builds a new action, rejecting the invalid `(takes_parent=false, takes_child=true)`
    /// combination described in the data model.
    pub fn new(
        name: impl Into<String>,
        abbr: impl Into<String>,
        takes_parent: bool,
        takes_child: bool,
        resource_kind: ResourceKind,
    ) -> Result<Self, RegistryError> {
        let name = name.into();
        if takes_child && !takes_parent {
            return Err(RegistryError::InvalidShape { name });
        }
        Ok(Self {
            name,
            abbr: abbr.into(),
            takes_parent,
            takes_child,
            resource_kind,
        })
    }

    /// `{name, abbr}`, or just `{name}` if the abbreviation equals the name.
    pub fn variants(&self) -> [&str; 2] {
        [self.name.as_str(), self.abbr.as_str()]
    }

    fn conflicts_with(&self, other: &Action) -> bool {
        self != other
    }
}

/// Append-only catalog of registered actions, keyed by both full name and
/// abbreviation so either form resolves identically.
#[derive(Debug, Default)]
pub struct ActionRegistry {
    by_name: HashMap<String, Action>,
    by_abbr: HashMap<String, String>,
}

impl ActionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The built-in default action set.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        if let Err(err) = registry.register_all(default_actions()) {
            debug_assert!(false, "default action set is internally inconsistent: {err:?}");
        }
        registry
    }

    /// Registers a single action. Re-registering the identical definition is
    /// a no-op; registering a conflicting definition under the same name or
    /// abbreviation is a `DuplicateAction` error.
    pub fn register(&mut self, action: Action) -> Result<(), RegistryError> {
        if let Some(existing) = self.by_name.get(&action.name) {
            if existing.conflicts_with(&action) {
                return Err(RegistryError::DuplicateAction {
                    name: action.name.clone(),
                    existing: Box::new(existing.clone()),
                    attempted: Box::new(action),
                });
            }
            return Ok(());
        }
        if let Some(owner) = self.by_abbr.get(&action.abbr) {
            if owner != &action.name {
                let existing = self.by_name[owner].clone();
                return Err(RegistryError::DuplicateAction {
                    name: action.name.clone(),
                    existing: Box::new(existing),
                    attempted: Box::new(action),
                });
            }
        }
        self.by_abbr.insert(action.abbr.clone(), action.name.clone());
        self.by_name.insert(action.name.clone(), action);
        Ok(())
    }

    pub fn register_all(
        &mut self,
        actions: impl IntoIterator<Item = Action>,
    ) -> Result<(), RegistryError> {
        for action in actions {
            self.register(action)?;
        }
        Ok(())
    }

    /// Looks up an action by its full name or its abbreviation.
    pub fn lookup(&self, name_or_abbr: &str) -> Option<&Action> {
        if let Some(action) = self.by_name.get(name_or_abbr) {
            return Some(action);
        }
        let name = self.by_abbr.get(name_or_abbr)?;
        self.by_name.get(name)
    }
}

fn default_actions() -> Vec<Action> {
    use ResourceKind::{Database, Instance, Query, Table};
    // name, abbr, takes_parent, takes_child, resource_kind
    let rows: &[(&str, &str, bool, bool, ResourceKind)] = &[
        ("view-instance", "vi", false, false, Instance),
        ("view-database", "vd", true, false, Database),
        ("view-database-download", "vdd", true, false, Database),
        ("view-table", "vt", true, true, Table),
        ("view-query", "vq", true, true, Query),
        ("insert-row", "ir", true, true, Table),
        ("delete-row", "dr", true, true, Table),
        ("update-row", "ur", true, true, Table),
        ("create-table", "ct", true, false, Database),
        ("alter-table", "at", true, true, Table),
        ("drop-table", "dt", true, true, Table),
        ("execute-sql", "es", true, false, Database),
        ("permissions-debug", "pd", false, false, Instance),
        ("debug-menu", "dm", false, false, Instance),
    ];
    rows.iter()
        .map(|(name, abbr, parent, child, kind)| {
            debug_assert!(
                *parent || !*child,
                "action `{name}` has takes_child without takes_parent"
            );
            Action {
                name: (*name).to_string(),
                abbr: (*abbr).to_string(),
                takes_parent: *parent,
                takes_child: *child,
                resource_kind: *kind,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_register_without_conflict() {
        let registry = ActionRegistry::with_defaults();
        let view_table = registry.lookup("view-table").unwrap();
        assert_eq!(view_table.abbr, "vt");
        assert!(view_table.takes_parent && view_table.takes_child);
        assert_eq!(registry.lookup("vt").unwrap().name, "view-table");
    }

    #[test]
    fn invalid_shape_rejected() {
        let err = Action::new("bogus", "bg", false, true, ResourceKind::Table).unwrap_err();
        assert!(matches!(err, RegistryError::InvalidShape { .. }));
    }

    #[test]
    fn identical_reregistration_is_noop() {
        let mut registry = ActionRegistry::new();
        let action = Action::new("view-table", "vt", true, true, ResourceKind::Table).unwrap();
        registry.register(action.clone()).unwrap();
        registry.register(action).unwrap();
    }

    #[test]
    fn conflicting_reregistration_is_duplicate_action() {
        let mut registry = ActionRegistry::new();
        registry
            .register(Action::new("view-table", "vt", true, true, ResourceKind::Table).unwrap())
            .unwrap();
        let conflicting =
            Action::new("view-table", "vt", true, false, ResourceKind::Table).unwrap();
        let err = registry.register(conflicting).unwrap_err();
        assert!(matches!(err, RegistryError::DuplicateAction { .. }));
    }

    #[test]
    fn abbr_clash_across_names_is_duplicate() {
        let mut registry = ActionRegistry::new();
        registry
            .register(Action::new("view-table", "vt", true, true, ResourceKind::Table).unwrap())
            .unwrap();
        let clash = Action::new("void-table", "vt", true, true, ResourceKind::Table).unwrap();
        let err = registry.register(clash).unwrap_err();
        assert!(matches!(err, RegistryError::DuplicateAction { .. }));
    }
}
