//! Authorization SDK
//!
//! Shared types for the declarative catalog authorization engine: the
//! [`Action`] registry, the opaque [`Actor`] record and its [`Restrictions`],
//! the [`RuleFragment`] contributed by providers, the [`Candidate`] resource
//! shape, and the resolved [`Verdict`].
//!
//! - [`ActionRegistry`] - process-wide action catalog
//! - [`Actor`], [`Restrictions`] - actor record and restriction allowlist
//! - [`RuleFragment`], [`SqlValue`] - provider output
//! - [`RulesProvider`] - the provider trait implemented by built-ins and plugins
//! - [`Signer`] - abstraction over signed-token verification
//! - [`AuthzError`], [`RegistryError`], [`SignatureError`] - error taxonomy
//!
//! ```ignore
//! use authz_sdk::{ActionRegistry, Actor, RulesProvider};
//!
//! let registry = ActionRegistry::with_defaults();
//! let action = registry.lookup("vt").expect("view-table is registered");
//! assert_eq!(action.name, "view-table");
//! ```

pub mod action;
pub mod actor;
pub mod error;
pub mod model;
pub mod provider;
pub mod restrictions;
pub mod signer;

pub use action::{Action, ActionRegistry, ResourceKind};
pub use actor::Actor;
pub use error::{AuthzError, RegistryError};
pub use model::{Candidate, RuleFragment, SqlValue, Verdict};
pub use provider::RulesProvider;
pub use restrictions::Restrictions;
pub use signer::{SignatureError, Signer};
