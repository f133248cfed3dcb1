//! Authentication user types.

use crate::db::User;
use crate::jwt::SessionClaims;

/// User that passed the authentication gate.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    /// User record loaded from the credential store
    pub user: User,
    /// Verified claims from the session token
    pub claims: SessionClaims,
    /// The raw token as presented by the client
    pub token: String,
}
