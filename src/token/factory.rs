use std::{fs, io};

use anyhow::{bail, Context, Result};
use log::info;

use crate::authz::Authorizer;

use super::config::TokenConfig;
use super::issuer::Issuer;
use super::keys::{generate_certificate, generate_rsa_key};
use super::signer::KeySigner;

pub struct TokenFactory {
    private_key: Vec<u8>,
    issuer: String,
    embed_scopes: bool,
}

impl TokenFactory {
    pub fn new(cfg: &TokenConfig) -> Result<Self> {
        let private_key = match fs::read(&cfg.key_path) {
            Ok(data) => data,
            Err(err) if err.kind() == io::ErrorKind::NotFound && cfg.generate_if_not_exists => {
                info!("Private key for token not found, generating with rsa");
                let private_key = generate_rsa_key()?;
                let cert = generate_certificate(&private_key, &cfg.issuer, cfg.cert_days)?;
                fs::write(&cfg.key_path, &private_key)
                    .with_context(|| format!("write token key: {}", cfg.key_path))?;
                fs::write(&cfg.cert_path, &cert)
                    .with_context(|| format!("write token cert: {}", cfg.cert_path))?;
                info!(
                    "Generated token key '{}', registries should trust certificate '{}'",
                    cfg.key_path, cfg.cert_path
                );
                private_key
            }
            Err(err) => {
                return Err(err).with_context(|| format!("read token key: {}", cfg.key_path))
            }
        };

        if private_key.is_empty() {
            bail!("token key '{}' is empty", cfg.key_path);
        }

        Ok(Self {
            private_key,
            issuer: cfg.issuer.clone(),
            embed_scopes: cfg.embed_scopes,
        })
    }

    pub fn build_signer(&self) -> Result<KeySigner> {
        KeySigner::from_pem(&self.private_key)
    }

    pub fn build_issuer(&self, authorizer: Authorizer) -> Result<Issuer> {
        let signer = self.build_signer().context("init token signer")?;
        Ok(Issuer::new(
            &self.issuer,
            self.embed_scopes,
            authorizer,
            Box::new(signer),
        ))
    }
}

#[cfg(test)]
mod tests {
    use openssl::pkey::PKey;
    use openssl::x509::X509;

    use crate::authz::config::PolicyConfig;
    use crate::config::tests::new_test_path_set;
    use crate::config::CommonConfig;
    use crate::token::signer::Signer;

    use super::*;

    #[test]
    fn test_generate_key() {
        let ps = new_test_path_set();
        let mut cfg = TokenConfig::default();
        cfg.complete(&ps).unwrap();

        let factory = TokenFactory::new(&cfg).unwrap();
        let key = fs::read(&cfg.key_path).unwrap();
        let cert = X509::from_pem(&fs::read(&cfg.cert_path).unwrap()).unwrap();
        let key = PKey::private_key_from_pem(&key).unwrap();
        assert!(cert.public_key().unwrap().public_eq(&key));

        // Second start reuses the generated key
        let kid = factory.build_signer().unwrap().key_id().to_string();
        let factory = TokenFactory::new(&cfg).unwrap();
        assert_eq!(factory.build_signer().unwrap().key_id(), kid);

        let issuer = factory
            .build_issuer(Authorizer::new(&PolicyConfig::default()))
            .unwrap();
        let issued = issuer.issue_denied(&[], "registry", 100).unwrap();
        assert_eq!(issued.claims.issuer, "regauth");
    }

    #[test]
    fn test_missing_key() {
        let ps = new_test_path_set();
        let mut cfg = TokenConfig::default();
        cfg.key_path = format!("{}", ps.pki_path.join("missing.key").display());
        cfg.complete(&ps).unwrap();

        assert!(TokenFactory::new(&cfg).is_err());
    }
}
