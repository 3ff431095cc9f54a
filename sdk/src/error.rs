//! Error taxonomy shared by the dispatcher and its embedders.

use thiserror::Error;

use crate::action::Action;

/// Startup-time action registration failures. Fatal: the embedder is
/// expected to abort the process rather than recover.
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("action `{name}` has an invalid shape: takes_child without takes_parent")]
    InvalidShape { name: String },

    #[error("action `{name}` conflicts with an existing registration")]
    DuplicateAction {
        name: String,
        existing: Box<Action>,
        attempted: Box<Action>,
    },
}

/// Errors surfaced by the dispatcher. Token/cookie failures are never
/// converted into this type — they are collapsed to an anonymous actor
/// before reaching the dispatcher (see [`crate::signer::SignatureError`]).
#[derive(Debug, Error)]
pub enum AuthzError {
    #[error("unknown action `{0}`")]
    UnknownAction(String),

    #[error("resource shape mismatch for action `{action}`: parent={parent:?}, child={child:?}")]
    ResourceShapeMismatch {
        action: String,
        parent: Option<String>,
        child: Option<String>,
    },

    #[error("provider `{source}` failed")]
    Provider {
        source: String,
        #[source]
        error: anyhow::Error,
    },

    #[error("resolver SQL failed")]
    Sql(#[from] sqlx::Error),

    #[error("resolution was cancelled")]
    Cancelled,

    #[error("internal invariant violated: {0}")]
    Internal(String),
}
