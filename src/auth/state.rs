//! Authentication state trait and macro.

use crate::db::CredentialStore;
use crate::denylist::TokenDenylist;
use crate::jwt::JwtConfig;

/// Trait for state types that provide what the authentication gate needs.
pub trait HasAuthBackend {
    fn jwt(&self) -> &JwtConfig;
    fn users(&self) -> &dyn CredentialStore;
    fn denylist(&self) -> &dyn TokenDenylist;
}

/// Macro to implement `HasAuthBackend` for state structs with the standard fields.
///
/// The struct must have these fields:
/// - `jwt: Arc<JwtConfig>`
/// - `users: Arc<dyn CredentialStore>`
/// - `denylist: Arc<dyn TokenDenylist>`
///
/// # Example
/// ```ignore
/// use crate::impl_has_auth_backend;
///
/// #[derive(Clone)]
/// pub struct MyState {
///     pub jwt: Arc<JwtConfig>,
///     pub users: Arc<dyn CredentialStore>,
///     pub denylist: Arc<dyn TokenDenylist>,
/// }
///
/// impl_has_auth_backend!(MyState);
/// ```
#[macro_export]
macro_rules! impl_has_auth_backend {
    ($state_type:ty) => {
        impl $crate::auth::HasAuthBackend for $state_type {
            fn jwt(&self) -> &$crate::jwt::JwtConfig {
                &self.jwt
            }
            fn users(&self) -> &dyn $crate::db::CredentialStore {
                self.users.as_ref()
            }
            fn denylist(&self) -> &dyn $crate::denylist::TokenDenylist {
                self.denylist.as_ref()
            }
        }
    };
}
