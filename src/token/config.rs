use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};

use crate::config::{expandenv, CommonConfig, PathSet};

/// Token issuing configuration
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct TokenConfig {
    /// Value of the `iss` claim, must match the `issuer` the registry expects.
    #[serde(default = "TokenConfig::default_issuer")]
    pub issuer: String,

    /// Path to the PEM private key (RSA or EC P-256) used to sign tokens.
    /// Default: {config_path}/pki/token.key
    /// If not exists, a new RSA key and certificate will be generated.
    #[serde(default = "TokenConfig::default_path")]
    pub key_path: String,

    /// Path to the PEM certificate of the signing key, only written when the
    /// key is generated. Default: {config_path}/pki/token.crt
    #[serde(default = "TokenConfig::default_path")]
    pub cert_path: String,

    /// Validity of a generated certificate, in days. Default: 3650.
    #[serde(default = "TokenConfig::default_cert_days")]
    pub cert_days: u32,

    /// Add a `scopes` claim listing the granted scopes in compact form.
    #[serde(default)]
    pub embed_scopes: bool,

    #[serde(skip)]
    pub generate_if_not_exists: bool,
}

impl CommonConfig for TokenConfig {
    fn default() -> Self {
        Self {
            issuer: Self::default_issuer(),
            key_path: Self::default_path(),
            cert_path: Self::default_path(),
            cert_days: Self::default_cert_days(),
            embed_scopes: false,
            generate_if_not_exists: false,
        }
    }

    fn complete(&mut self, ps: &PathSet) -> Result<()> {
        if self.issuer.is_empty() {
            bail!("issuer should not be empty");
        }

        if self.cert_days == 0 {
            bail!("cert_days should not be 0");
        }

        self.key_path = expandenv("key_path", &self.key_path)?;
        self.cert_path = expandenv("cert_path", &self.cert_path)?;

        if self.key_path.is_empty() {
            self.generate_if_not_exists = true;

            let path = ps.pki_path.join("token.key");
            self.key_path = format!("{}", path.display());

            if self.cert_path.is_empty() {
                let path = ps.pki_path.join("token.crt");
                self.cert_path = format!("{}", path.display());
            }
        }

        Ok(())
    }
}

impl TokenConfig {
    pub fn default_issuer() -> String {
        String::from("regauth")
    }

    pub fn default_path() -> String {
        String::new()
    }

    pub fn default_cert_days() -> u32 {
        3650
    }
}

#[cfg(test)]
mod tests {
    use crate::config::tests::new_test_path_set;

    use super::*;

    #[test]
    fn test_complete() {
        let ps = new_test_path_set();

        let mut cfg = TokenConfig::default();
        cfg.complete(&ps).unwrap();
        assert!(cfg.generate_if_not_exists);
        assert_eq!(
            cfg.key_path,
            format!("{}", ps.pki_path.join("token.key").display())
        );
        assert_eq!(
            cfg.cert_path,
            format!("{}", ps.pki_path.join("token.crt").display())
        );

        let mut cfg = TokenConfig::default();
        cfg.key_path = String::from("/etc/keys/token.key");
        cfg.complete(&ps).unwrap();
        assert!(!cfg.generate_if_not_exists);
        assert_eq!(cfg.key_path, "/etc/keys/token.key");
        assert!(cfg.cert_path.is_empty());

        let mut cfg = TokenConfig::default();
        cfg.issuer = String::new();
        assert!(cfg.complete(&ps).is_err());

        let mut cfg = TokenConfig::default();
        cfg.cert_days = 0;
        assert!(cfg.complete(&ps).is_err());
    }
}
