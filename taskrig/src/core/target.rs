//! The closed set of execution targets.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Where an operation runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Target {
    Local,
    Remote,
}

impl Target {
    pub const ALL: [Target; 2] = [Target::Local, Target::Remote];

    /// The opposite target, used by operations that move data between the two.
    pub fn reverse(self) -> Target {
        match self {
            Target::Local => Target::Remote,
            Target::Remote => Target::Local,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Target::Local => "local",
            Target::Remote => "remote",
        }
    }

    /// Interpret an argument value as a target. Only the exact lowercase names match.
    pub fn from_value(value: &Value) -> Option<Target> {
        value.as_str().and_then(|raw| raw.parse().ok())
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownTarget(pub String);

impl fmt::Display for UnknownTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown target '{}' (expected local|remote)", self.0)
    }
}

impl std::error::Error for UnknownTarget {}

impl FromStr for Target {
    type Err = UnknownTarget;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw {
            "local" => Ok(Target::Local),
            "remote" => Ok(Target::Remote),
            other => Err(UnknownTarget(other.to_string())),
        }
    }
}
