use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};

use crate::config::{CommonConfig, PathSet};

use super::rule::Rule;

/// Authorization policy. Loaded once at startup and shared read-only by every
/// request afterwards.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct PolicyConfig {
    /// Rules evaluated for every requested scope. An empty list grants nothing.
    #[serde(default = "PolicyConfig::default_rules")]
    pub rules: Vec<Rule>,

    /// Which placeholder the group value replaces in rule patterns, see
    /// [`GroupPlaceholder`]. Defaults to `legacy`.
    #[serde(default)]
    pub group_placeholder: GroupPlaceholder,

    /// Escape user and group names before substituting them into patterns, so
    /// regex metacharacters in names match literally. Defaults to false.
    #[serde(default)]
    pub escape_substitutions: bool,

    /// Number of compiled patterns kept in memory, 0 disables the cache.
    /// Defaults to 1024.
    #[serde(default = "PolicyConfig::default_pattern_cache_size")]
    pub pattern_cache_size: usize,
}

/// Rules advertise `${group}` as the group placeholder. Older deployments
/// shipped with the value being substituted into `${fgroup}` instead (only
/// when the pattern also mentions `${group}`), and existing policies may rely
/// on that.
#[derive(Debug, Deserialize, Serialize, Clone, Copy, Default, PartialEq, Eq)]
pub enum GroupPlaceholder {
    /// Substitute `${fgroup}` when the pattern contains `${group}`; `${group}`
    /// itself is left untouched.
    #[serde(rename = "legacy")]
    #[default]
    Legacy,

    /// Substitute `${group}`.
    #[serde(rename = "fixed")]
    Fixed,
}

impl CommonConfig for PolicyConfig {
    fn default() -> Self {
        Self {
            rules: Self::default_rules(),
            group_placeholder: GroupPlaceholder::default(),
            escape_substitutions: false,
            pattern_cache_size: Self::default_pattern_cache_size(),
        }
    }

    fn complete(&mut self, _ps: &PathSet) -> Result<()> {
        for (idx, rule) in self.rules.iter().enumerate() {
            if rule.actions.is_empty() {
                bail!("rules[{idx}]: actions should not be empty");
            }
        }

        if self.pattern_cache_size > Self::MAX_PATTERN_CACHE_SIZE {
            bail!(
                "pattern_cache_size must be less than or equal to {}",
                Self::MAX_PATTERN_CACHE_SIZE
            );
        }

        Ok(())
    }
}

impl PolicyConfig {
    const MAX_PATTERN_CACHE_SIZE: usize = 1024 * 1024;

    pub fn default_rules() -> Vec<Rule> {
        vec![]
    }

    pub fn default_pattern_cache_size() -> usize {
        1024
    }
}
