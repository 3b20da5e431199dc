use std::path::PathBuf;
use std::{env, fs, io};

use anyhow::{Context, Result};
use clap::Args;
use log::warn;
use serde::de::DeserializeOwned;

use crate::dirs::{self, ensure_dir_exists};

/// Command line flags locating the configuration and data directories.
#[derive(Args, Debug, Clone, Default)]
pub struct ConfigArgs {
    /// The config directory, default is `/etc/regauth` for root and
    /// `~/.config/regauth` for other users.
    #[arg(long)]
    pub config_path: Option<PathBuf>,

    /// The data directory, default is `/var/lib/regauth` for root and
    /// `~/.local/share/regauth` for other users.
    #[arg(long)]
    pub data_path: Option<PathBuf>,
}

impl ConfigArgs {
    pub fn build_path_set(&self) -> Result<PathSet> {
        PathSet::new(self.config_path.clone(), self.data_path.clone())
    }
}

pub struct PathSet {
    pub config_path: PathBuf,
    pub data_path: PathBuf,
    pub pki_path: PathBuf,
}

impl PathSet {
    pub fn new(config_path: Option<PathBuf>, data_path: Option<PathBuf>) -> Result<Self> {
        let config_path = match config_path {
            Some(path) => path,
            None => match env::var("REGAUTH_CONFIG") {
                Ok(path) => PathBuf::from(path),
                Err(_) => dirs::config_dir()?,
            },
        };

        let data_path = match data_path {
            Some(path) => path,
            None => match env::var("REGAUTH_DATA") {
                Ok(path) => PathBuf::from(path),
                Err(_) => dirs::data_dir()?,
            },
        };

        // PKI path is always under config path
        let pki_path = config_path.join("pki");

        ensure_dir_exists(&config_path)
            .with_context(|| format!("ensure config directory: {}", config_path.display()))?;
        ensure_dir_exists(&data_path)
            .with_context(|| format!("ensure data directory: {}", data_path.display()))?;
        ensure_dir_exists(&pki_path)
            .with_context(|| format!("ensure pki directory: {}", pki_path.display()))?;

        Ok(Self {
            config_path,
            data_path,
            pki_path,
        })
    }

    pub fn load_config<T, F>(&self, name: &str, default_func: F) -> Result<T>
    where
        T: CommonConfig + DeserializeOwned,
        F: FnOnce() -> T,
    {
        let path = self.config_path.join(format!("{name}.toml"));
        let mut cfg: T = match fs::read_to_string(&path) {
            Ok(s) => toml::from_str(&s)
                .with_context(|| format!("parse config toml: {}", path.display()))?,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                warn!("Config file for {name} not found, using defaults");
                default_func()
            }
            Err(err) => {
                return Err(err).context(format!("read config file: {}", path.display()));
            }
        };

        cfg.complete(self).context("validate config")?;
        Ok(cfg)
    }
}

pub trait CommonConfig {
    fn default() -> Self;
    fn complete(&mut self, ps: &PathSet) -> Result<()>;
}

/// See: [`shellexpand::full`].
pub fn expandenv(name: &str, s: impl AsRef<str>) -> Result<String> {
    let s =
        shellexpand::full(s.as_ref()).with_context(|| format!("expand env value for '{name}'"))?;
    Ok(s.to_string())
}
