//! The provider contract: an independent source of [`RuleFragment`]s.

use async_trait::async_trait;

use crate::action::Action;
use crate::actor::Actor;
use crate::model::RuleFragment;

/// A source of rule fragments, built-in or external.
///
/// Implementations are invoked concurrently with every other registered
/// provider for a given `(actor, action)` query; returning an empty vector
/// means "no opinion", not "deny". Providers that fail should return `Err`
/// rather than swallow the failure — the dispatcher surfaces provider
/// errors with the offending `name()` attached rather than silently
/// dropping the contribution, since that would change decision semantics.
///
/// `action` is the already-resolved [`Action`] (dispatcher does the
/// name-or-abbr registry lookup once, up front) so providers that care
/// about abbreviations — e.g. the actor-restrictions provider matching
/// against `_r` entries — don't need their own registry handle.
#[async_trait]
pub trait RulesProvider: Send + Sync {
    /// Used as `RuleFragment::source` when a fragment doesn't set one, and
    /// as the error-attribution key on failure.
    fn name(&self) -> &str;

    async fn fragments(
        &self,
        actor: &Actor,
        action: &Action,
    ) -> Result<Vec<RuleFragment>, anyhow::Error>;
}
