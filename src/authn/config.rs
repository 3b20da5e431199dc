use std::collections::HashSet;

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};

use crate::config::{CommonConfig, PathSet};

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct AuthnConfig {
    /// Issue a token granting nothing, instead of 401, when the credentials
    /// are wrong. Registries then answer with their own "denied" error.
    #[serde(default = "AuthnConfig::default_soft_deny")]
    pub soft_deny: bool,

    #[serde(default)]
    pub users: Vec<UserConfig>,
}

/// A statically configured account.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct UserConfig {
    pub name: String,

    /// Hex encoded sha256 of the password followed by the salt.
    pub password: String,

    #[serde(default)]
    pub salt: String,

    #[serde(default)]
    pub groups: Vec<String>,
}

impl CommonConfig for AuthnConfig {
    fn default() -> Self {
        Self {
            soft_deny: Self::default_soft_deny(),
            users: vec![],
        }
    }

    fn complete(&mut self, _ps: &PathSet) -> Result<()> {
        let mut names = HashSet::with_capacity(self.users.len());
        for (idx, user) in self.users.iter_mut().enumerate() {
            if user.name.is_empty() {
                bail!("users[{idx}]: name should not be empty");
            }
            if !names.insert(user.name.clone()) {
                bail!("users[{idx}]: duplicate user '{}'", user.name);
            }

            user.password = user.password.to_lowercase();
            let valid = user.password.len() == 64
                && user.password.chars().all(|c| c.is_ascii_hexdigit());
            if !valid {
                bail!(
                    "users[{idx}]: password of '{}' should be a sha256 hex digest",
                    user.name
                );
            }
        }
        Ok(())
    }
}

impl AuthnConfig {
    pub fn default_soft_deny() -> bool {
        true
    }
}
