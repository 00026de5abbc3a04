use async_trait::async_trait;

use crate::error::BotdeskResult;
use crate::types::{Identity, Session};

/// The identity layer the request handlers are written against.
#[async_trait]
pub trait IdentityProvider: Send + Sync + 'static {
    /// Resolve a bearer credential to the caller's identity.
    async fn resolve_bearer(&self, token: &str) -> BotdeskResult<Identity>;

    /// Issue a one-time sign-in credential for the user with this email,
    /// creating the user if needed. Returns the plaintext code.
    async fn issue_sign_in_code(&self, email: &str) -> BotdeskResult<String>;

    /// Exchange a one-time credential for a session.
    async fn complete_sign_in(&self, email: &str, code: &str) -> BotdeskResult<Session>;
}
