use std::io::{self, IsTerminal};
use std::path::PathBuf;
use std::time::SystemTime;

use anyhow::{bail, Context, Result};
use fern::colors::{Color, ColoredLevelConfig};
use log::LevelFilter;
use serde::{Deserialize, Serialize};

use crate::config::{CommonConfig, PathSet};
use crate::dirs;

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct LogsConfig {
    #[serde(default = "LogsConfig::default_level")]
    pub level: String,

    #[serde(default = "LogTarget::default")]
    pub target: LogTarget,

    #[serde(skip)]
    logs_dir: PathBuf,
}

#[derive(Debug, Deserialize, Serialize, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogTarget {
    #[serde(rename = "stdout")]
    #[default]
    Stdout,

    #[serde(rename = "stderr")]
    Stderr,

    #[serde(rename = "file")]
    File,
}

impl CommonConfig for LogsConfig {
    fn default() -> Self {
        Self {
            level: Self::default_level(),
            target: LogTarget::default(),
            logs_dir: PathBuf::new(),
        }
    }

    fn complete(&mut self, ps: &PathSet) -> Result<()> {
        Self::parse_level(&self.level)?;

        if matches!(self.target, LogTarget::File) {
            self.logs_dir = ps.data_path.join("logs");
            dirs::ensure_dir_exists(&self.logs_dir).context("ensure logs dir")?;
        }

        Ok(())
    }
}

impl LogsConfig {
    pub fn init(&self, name: &str) -> Result<()> {
        let level = Self::parse_level(&self.level)?;

        let is_terminal = match self.target {
            LogTarget::Stdout => io::stdout().is_terminal(),
            LogTarget::Stderr => io::stderr().is_terminal(),
            LogTarget::File => false,
        };

        let colors = ColoredLevelConfig::new()
            .info(Color::Green)
            .debug(Color::Magenta);

        let dispatch = fern::Dispatch::new()
            .format(move |out, message, record| {
                let now = humantime::format_rfc3339_millis(SystemTime::now());
                if is_terminal {
                    out.finish(format_args!(
                        "{now} [{}] {message}",
                        colors.color(record.level())
                    ))
                } else {
                    out.finish(format_args!("{now} [{}] {message}", record.level()))
                }
            })
            .level(level);

        let dispatch = match self.target {
            LogTarget::Stdout => dispatch.chain(io::stdout()),
            LogTarget::Stderr => dispatch.chain(io::stderr()),
            LogTarget::File => {
                let path = self.logs_dir.join(format!("{name}.log"));
                let file = fern::log_file(&path)
                    .with_context(|| format!("open log file: {}", path.display()))?;
                dispatch.chain(file)
            }
        };

        dispatch.apply().context("init logger")?;
        Ok(())
    }

    fn parse_level(level: &str) -> Result<LevelFilter> {
        Ok(match level {
            "error" => LevelFilter::Error,
            "warn" | "warning" => LevelFilter::Warn,
            "info" => LevelFilter::Info,
            "debug" => LevelFilter::Debug,
            _ => bail!("unknown log level '{}'", level),
        })
    }

    fn default_level() -> String {
        String::from("info")
    }
}
