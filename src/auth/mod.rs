//! JWT session authentication with role-based access control.
//!
//! A single one-hour session token lives in the `token` cookie. Every
//! protected request re-checks the signature, the user record and the
//! denylist. Logout adds the token to the denylist until its `exp`.

mod cookie;
mod errors;
mod extractors;
mod gate;
mod logout;
mod state;
mod types;

pub use cookie::{TOKEN_COOKIE_NAME, clear_session_cookie, get_cookie, session_cookie};
pub use errors::{ApiAuthError, AuthErrorKind};
pub use extractors::{AdminOnly, AnyRole, Auth, RoleConstraint};
pub use gate::authenticate;
pub use logout::{LogoutError, revoke_session};
pub use state::HasAuthBackend;
pub use types::AuthenticatedUser;
