use std::borrow::Cow;
use std::collections::HashMap;
use std::sync::RwLock;

use anyhow::{Context, Result};
use regex::Regex;

use super::config::GroupPlaceholder;

pub const USER_PLACEHOLDER: &str = "${user}";
pub const GROUP_PLACEHOLDER: &str = "${group}";
const LEGACY_GROUP_TARGET: &str = "${fgroup}";
const LEFTOVER_PLACEHOLDER: &str = "${";

/// Substitutes the user and group placeholders of a rule pattern.
///
/// Values are inserted verbatim unless `escape` is set. Without escaping, a
/// user named `a.b` produces a pattern that also matches `aXb`.
pub fn expand<'a>(
    pattern: &'a str,
    user: &str,
    group: &str,
    mode: GroupPlaceholder,
    escape: bool,
) -> Cow<'a, str> {
    let mut expanded = Cow::Borrowed(pattern);

    if expanded.contains(USER_PLACEHOLDER) {
        let user = quote(user, escape);
        expanded = Cow::Owned(expanded.replace(USER_PLACEHOLDER, &user));
    }

    if expanded.contains(GROUP_PLACEHOLDER) {
        let group = quote(group, escape);
        let target = match mode {
            GroupPlaceholder::Legacy => LEGACY_GROUP_TARGET,
            GroupPlaceholder::Fixed => GROUP_PLACEHOLDER,
        };
        expanded = Cow::Owned(expanded.replace(target, &group));
    }

    // Leftover `${...}` braces are literals in legacy policies, the regex
    // crate would reject them as a repetition.
    if mode == GroupPlaceholder::Legacy && expanded.contains(LEFTOVER_PLACEHOLDER) {
        expanded = Cow::Owned(expanded.replace(LEFTOVER_PLACEHOLDER, r"$\{"));
    }

    expanded
}

fn quote(value: &str, escape: bool) -> Cow<'_, str> {
    if escape {
        Cow::Owned(regex::escape(value))
    } else {
        Cow::Borrowed(value)
    }
}

/// Read-through cache of compiled patterns, keyed by the expanded pattern
/// string. Failed compilations are never stored.
pub struct PatternCache {
    capacity: usize,
    patterns: RwLock<HashMap<String, Regex>>,
}

impl PatternCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            patterns: RwLock::new(HashMap::new()),
        }
    }

    pub fn compile(&self, pattern: &str) -> Result<Regex> {
        if self.capacity == 0 {
            return Self::build(pattern);
        }

        if let Ok(patterns) = self.patterns.read() {
            if let Some(re) = patterns.get(pattern) {
                return Ok(re.clone());
            }
        }

        let re = Self::build(pattern)?;
        if let Ok(mut patterns) = self.patterns.write() {
            if patterns.len() < self.capacity {
                patterns.insert(pattern.to_string(), re.clone());
            }
        }
        Ok(re)
    }

    pub fn len(&self) -> usize {
        self.patterns.read().map(|p| p.len()).unwrap_or_default()
    }

    fn build(pattern: &str) -> Result<Regex> {
        Regex::new(pattern).with_context(|| format!("compile pattern '{pattern}'"))
    }
}
