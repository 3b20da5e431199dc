use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

use crate::authn::config::AuthnConfig;
use crate::authz::config::PolicyConfig;
use crate::config::{expandenv, CommonConfig, PathSet};
use crate::logs::LogsConfig;
use crate::token::config::TokenConfig;

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "ServerConfig::default_bind")]
    pub bind: String,

    #[serde(default = "ServerConfig::default_ssl")]
    pub ssl: bool,

    #[serde(default = "ServerConfig::default_cert_path")]
    pub cert_path: String,

    #[serde(default = "ServerConfig::default_key_path")]
    pub key_path: String,

    #[serde(default = "ServerConfig::default_keep_alive_secs")]
    pub keep_alive_secs: u64,

    #[serde(default = "ServerConfig::default_workers")]
    pub workers: u64,

    #[serde(default = "LogsConfig::default")]
    pub logs: LogsConfig,

    #[serde(default = "AuthnConfig::default")]
    pub authn: AuthnConfig,

    #[serde(default = "PolicyConfig::default")]
    pub authz: PolicyConfig,

    #[serde(default = "TokenConfig::default")]
    pub token: TokenConfig,
}

impl CommonConfig for ServerConfig {
    fn default() -> Self {
        Self {
            bind: Self::default_bind(),
            ssl: Self::default_ssl(),
            cert_path: Self::default_cert_path(),
            key_path: Self::default_key_path(),
            keep_alive_secs: Self::default_keep_alive_secs(),
            workers: Self::default_workers(),
            logs: LogsConfig::default(),
            authn: AuthnConfig::default(),
            authz: PolicyConfig::default(),
            token: TokenConfig::default(),
        }
    }

    fn complete(&mut self, ps: &PathSet) -> Result<()> {
        self.bind = expandenv("bind", &self.bind)?;
        if self.bind.is_empty() {
            bail!("bind cannot be empty");
        }

        self.cert_path = expandenv("cert_path", &self.cert_path)?;
        if self.cert_path.is_empty() {
            let path = ps.pki_path.join("server.crt");
            self.cert_path = format!("{}", path.display());
        }

        self.key_path = expandenv("key_path", &self.key_path)?;
        if self.key_path.is_empty() {
            let path = ps.pki_path.join("server.key");
            self.key_path = format!("{}", path.display());
        }

        if self.workers > Self::MAX_WORKERS {
            bail!("workers must be less than or equal to {}", Self::MAX_WORKERS);
        }

        self.logs.complete(ps).context("logs")?;
        self.authn.complete(ps).context("authn")?;
        self.authz.complete(ps).context("authz")?;
        self.token.complete(ps).context("token")?;

        Ok(())
    }
}

impl ServerConfig {
    const MAX_WORKERS: u64 = 1024;

    pub fn default_bind() -> String {
        String::from("127.0.0.1:5001")
    }

    pub fn default_ssl() -> bool {
        false
    }

    pub fn default_cert_path() -> String {
        String::new()
    }

    pub fn default_key_path() -> String {
        String::new()
    }

    pub fn default_keep_alive_secs() -> u64 {
        0
    }

    pub fn default_workers() -> u64 {
        0
    }
}
