//! Picking the specialist that should answer a query.
//!
//! Two strategies implement [`RouteStrategy`]: a [`ClassifierRouter`] that
//! asks the model for a bare specialist name, and a [`HandoffRouter`] that
//! offers one transfer tool per specialist and reads the model's choice.
//! Both fall back to the configured default when the model's answer does
//! not name a specialist.

mod classifier;
mod handoff;

pub use classifier::ClassifierRouter;
pub use handoff::{HandoffRouter, TRANSFER_PREFIX};

use crate::query::Query;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::future::Future;
use tracing::warn;

/// Name of a specialist, e.g. `weather_agent` or `french_agent`.
///
/// Restricted to ASCII letters, digits, `_` and `-` so it can be embedded in
/// a tool name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SpecialistId(String);

impl SpecialistId {
    pub fn new(name: impl Into<String>) -> Result<Self> {
        let name = name.into();
        let valid = !name.is_empty()
            && name
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
        if !valid {
            return Err(Error::Config(format!("invalid specialist name {name:?}")));
        }
        Ok(Self(name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for SpecialistId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for SpecialistId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::new(s)
    }
}

impl TryFrom<String> for SpecialistId {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        Self::new(value)
    }
}

impl From<SpecialistId> for String {
    fn from(id: SpecialistId) -> Self {
        id.0
    }
}

/// An ordered set of specialists with an optional default member.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Specialists {
    members: Vec<SpecialistId>,
    default: Option<SpecialistId>,
}

impl Specialists {
    pub fn new(members: impl IntoIterator<Item = SpecialistId>) -> Result<Self> {
        let mut unique: Vec<SpecialistId> = Vec::new();
        for member in members {
            if unique.contains(&member) {
                return Err(Error::Config(format!("duplicate specialist {member}")));
            }
            unique.push(member);
        }
        if unique.is_empty() {
            return Err(Error::Config("no specialists configured".into()));
        }
        Ok(Self {
            members: unique,
            default: None,
        })
    }

    /// Set the specialist used when the model's choice is unrecognized.
    pub fn with_default(mut self, default: SpecialistId) -> Result<Self> {
        if !self.members.contains(&default) {
            return Err(Error::Config(format!(
                "default specialist {default} is not a member"
            )));
        }
        self.default = Some(default);
        Ok(self)
    }

    pub fn members(&self) -> &[SpecialistId] {
        &self.members
    }

    pub fn default_member(&self) -> Option<&SpecialistId> {
        self.default.as_ref()
    }

    pub fn find(&self, name: &str) -> Option<&SpecialistId> {
        self.members.iter().find(|m| m.as_str() == name)
    }

    /// Resolve an unusable model answer to the default, or fail.
    fn fallback(&self, answer: &str) -> Result<SpecialistId> {
        match &self.default {
            Some(default) => {
                warn!(answer, fallback = %default, "unrecognized specialist, using default");
                Ok(default.clone())
            }
            None => Err(Error::UnrecognizedSpecialist(answer.to_string())),
        }
    }

    /// `'a', 'b', or 'c'`
    fn quoted_list(&self) -> String {
        let quoted: Vec<String> = self.members.iter().map(|m| format!("'{m}'")).collect();
        match quoted.as_slice() {
            [] => String::new(),
            [only] => only.clone(),
            [first, second] => format!("{first} or {second}"),
            [init @ .., last] => format!("{}, or {last}", init.join(", ")),
        }
    }

    /// Prompt sentence steering uncertain decisions to the default.
    fn default_hint(&self) -> String {
        match &self.default {
            Some(default) => format!(" If you are unsure, choose '{default}'."),
            None => String::new(),
        }
    }
}

/// A strategy for choosing one specialist for a query.
pub trait RouteStrategy: Send + Sync {
    /// Always returns a member of `specialists`, or an error.
    fn route(
        &self,
        query: &Query,
        specialists: &Specialists,
    ) -> impl Future<Output = Result<SpecialistId>> + Send;
}
