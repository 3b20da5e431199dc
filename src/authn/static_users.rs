use std::collections::HashMap;

use log::debug;
use openssl::memcmp;
use sha2::{Digest, Sha256};

use crate::authz::AuthzRequest;

use super::config::{AuthnConfig, UserConfig};
use super::Authenticator;

/// Authenticates against the users listed in the config file.
pub struct StaticAuthenticator {
    users: HashMap<String, UserConfig>,
}

impl StaticAuthenticator {
    pub fn new(cfg: &AuthnConfig) -> Self {
        let users = cfg
            .users
            .iter()
            .map(|user| (user.name.clone(), user.clone()))
            .collect();
        Self { users }
    }
}

impl Authenticator for StaticAuthenticator {
    fn authenticate(&self, user: &str, password: &str) -> Option<AuthzRequest> {
        let record = match self.users.get(user) {
            Some(record) => record,
            None => {
                debug!("Authenticate '{user}': user not found");
                return None;
            }
        };

        let hash = get_password_hash(password, &record.salt);
        if !password_hash_eq(&hash, &record.password) {
            debug!("Authenticate '{user}': password mismatch");
            return None;
        }

        Some(AuthzRequest {
            user: record.name.clone(),
            groups: record.groups.clone(),
        })
    }
}

/// The value stored in the `password` field of a configured user.
pub fn get_password_hash(password: &str, salt: &str) -> String {
    let combined = format!("{password}{salt}");
    let hash = Sha256::digest(combined.as_bytes());
    format!("{:x}", hash)
}

/// Constant time comparison of two password hashes.
fn password_hash_eq(a: &str, b: &str) -> bool {
    a.len() == b.len() && memcmp::eq(a.as_bytes(), b.as_bytes())
}
