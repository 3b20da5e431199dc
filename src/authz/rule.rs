use std::collections::HashSet;

use anyhow::Result;
use log::{error, warn};
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::scope::{Access, Scope, TYPE_REPOSITORY};

use super::config::{GroupPlaceholder, PolicyConfig};
use super::pattern::{self, PatternCache, GROUP_PLACEHOLDER};

/// A policy statement: repositories whose name matches `pattern` may be
/// granted at most `actions`, optionally only for one user or one group.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Rule {
    /// Regular expression template, may contain `${user}` and `${group}`.
    #[serde(rename = "match")]
    pub pattern: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub user: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub group: String,

    pub actions: HashSet<String>,
}

/// Compiles rule patterns for a concrete user and group.
pub struct Matcher {
    group_placeholder: GroupPlaceholder,
    escape: bool,
    cache: PatternCache,
}

impl Rule {
    pub fn new(pattern: &str, actions: &[&str]) -> Self {
        Self {
            pattern: pattern.to_string(),
            user: String::new(),
            group: String::new(),
            actions: actions.iter().map(|a| a.to_string()).collect(),
        }
    }

    pub fn with_user(mut self, user: &str) -> Self {
        self.user = user.to_string();
        self
    }

    pub fn with_group(mut self, group: &str) -> Self {
        self.group = group.to_string();
        self
    }

    /// A rule that neither filters on a group nor mentions the group
    /// placeholder yields the same result for every group.
    pub fn is_group_independent(&self) -> bool {
        self.group.is_empty() && !self.pattern.contains(GROUP_PLACEHOLDER)
    }

    /// Evaluates this rule for one (user, group, scope) triple and adds the
    /// requested actions it allows to `access`.
    pub fn eval(&self, matcher: &Matcher, user: &str, group: &str, scope: &Scope, access: &mut Access) {
        if scope.resource_type != TYPE_REPOSITORY {
            warn!(
                "Requested scope is not {TYPE_REPOSITORY} ({}), skip rule",
                scope.resource_type
            );
            return;
        }

        let re = match matcher.compile(self, user, group) {
            Ok(re) => re,
            Err(e) => {
                error!("Skip rule '{}': {e:#}", self.pattern);
                return;
            }
        };
        if !re.is_match(&scope.name) {
            return;
        }

        if !self.user.is_empty() && self.user != user {
            return;
        }
        if !self.group.is_empty() && self.group != group {
            return;
        }

        for action in scope.actions.iter() {
            if self.actions.contains(action) && !access.actions.contains(action) {
                access.actions.insert(action.clone());
            }
        }
    }
}

impl Matcher {
    pub fn new(cfg: &PolicyConfig) -> Self {
        Self {
            group_placeholder: cfg.group_placeholder,
            escape: cfg.escape_substitutions,
            cache: PatternCache::new(cfg.pattern_cache_size),
        }
    }

    fn compile(&self, rule: &Rule, user: &str, group: &str) -> Result<Regex> {
        let expanded = pattern::expand(
            &rule.pattern,
            user,
            group,
            self.group_placeholder,
            self.escape,
        );
        self.cache.compile(&expanded)
    }
}
