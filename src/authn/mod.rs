mod static_users;

pub mod config;

use crate::authz::AuthzRequest;

pub use static_users::{get_password_hash, StaticAuthenticator};

#[cfg(test)]
pub use static_users::tests::new_test_user;

/// Verifies the credentials of a token request.
pub trait Authenticator: Send + Sync {
    /// Returns the principal to authorize, or `None` if the credentials are
    /// wrong. Callers decide between a 401 and a soft-deny token.
    fn authenticate(&self, user: &str, password: &str) -> Option<AuthzRequest>;
}
