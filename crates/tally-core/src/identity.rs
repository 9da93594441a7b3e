use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Lightweight authenticated user identity for cross-crate passing.
///
/// Contains only data fields. Authentication happens elsewhere; Tally only
/// needs the owner key that scopes title uniqueness.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
pub struct UserIdentity {
    /// Stable user ID from the session provider.
    pub user_id: String,
    /// Display name, if the provider exposes one.
    pub display_name: Option<String>,
}

impl UserIdentity {
    #[must_use]
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            display_name: None,
        }
    }
}

/// Source of the currently authenticated user, or `None` while logged out.
pub trait IdentityProvider: Send + Sync {
    fn current_user(&self) -> Option<UserIdentity>;
}

/// Fixed identity, useful for CLIs and tests.
#[derive(Debug, Clone, Default)]
pub struct StaticIdentity(pub Option<UserIdentity>);

impl IdentityProvider for StaticIdentity {
    fn current_user(&self) -> Option<UserIdentity> {
        self.0.clone()
    }
}

impl<F> IdentityProvider for F
where
    F: Fn() -> Option<UserIdentity> + Send + Sync,
{
    fn current_user(&self) -> Option<UserIdentity> {
        self()
    }
}
