use std::fmt;
use std::str::FromStr;

use anyhow::{bail, Result};
use indexmap::IndexSet;
use serde::{Deserialize, Serialize};

/// The only resource type rules are ever evaluated against.
pub const TYPE_REPOSITORY: &str = "repository";

/// A requested resource and the actions wanted on it, e.g.
/// `repository:library/alpine:pull,push`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scope {
    #[serde(rename = "type")]
    pub resource_type: String,
    pub name: String,
    pub actions: Vec<String>,
}

/// The access granted for one requested [`Scope`]. Actions keep the order in
/// which rules first granted them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Access {
    #[serde(rename = "type")]
    pub resource_type: String,
    pub name: String,
    pub actions: IndexSet<String>,
}

impl Scope {
    pub fn new(resource_type: impl ToString, name: impl ToString, actions: &[&str]) -> Self {
        Self {
            resource_type: resource_type.to_string(),
            name: name.to_string(),
            actions: actions.iter().map(|a| a.to_string()).collect(),
        }
    }

    /// Returns an empty grant for this scope.
    pub fn empty_access(&self) -> Access {
        Access {
            resource_type: self.resource_type.clone(),
            name: self.name.clone(),
            actions: IndexSet::new(),
        }
    }
}

impl FromStr for Scope {
    type Err = anyhow::Error;

    /// The first segment is the type and the last one is the action list, every
    /// segment in between belongs to the name (names may contain `:`, such as a
    /// registry host with a port).
    fn from_str(s: &str) -> Result<Self> {
        let (resource_type, rest) = match s.split_once(':') {
            Some(split) => split,
            None => bail!("invalid scope '{s}', expect 'type:name:actions'"),
        };
        let (name, actions) = match rest.rsplit_once(':') {
            Some(split) => split,
            None => bail!("invalid scope '{s}', missing actions"),
        };

        if resource_type.is_empty() {
            bail!("invalid scope '{s}', empty type");
        }
        if name.is_empty() {
            bail!("invalid scope '{s}', empty name");
        }

        let actions = actions
            .split(',')
            .filter(|a| !a.is_empty())
            .map(String::from)
            .collect();

        Ok(Self {
            resource_type: resource_type.to_string(),
            name: name.to_string(),
            actions,
        })
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}:{}",
            self.resource_type,
            self.name,
            self.actions.join(",")
        )
    }
}

impl Access {
    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }
}

impl fmt::Display for Access {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let actions: Vec<&str> = self.actions.iter().map(String::as_str).collect();
        write!(
            f,
            "{}:{}:{}",
            self.resource_type,
            self.name,
            actions.join(",")
        )
    }
}

/// Parses a space separated list of compact scopes, as sent in the `scope`
/// parameter of a token request. Any malformed scope fails the whole list.
pub fn parse_scopes(s: &str) -> Result<Vec<Scope>> {
    s.split_whitespace().map(Scope::from_str).collect()
}
