//! Output channels a task can hide or show while its operation runs.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Channel {
    /// Echo of each command before it runs.
    Running,
    Stdout,
    Stderr,
    Warnings,
}

impl Channel {
    pub const ALL: [Channel; 4] = [
        Channel::Running,
        Channel::Stdout,
        Channel::Stderr,
        Channel::Warnings,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Channel::Running => "running",
            Channel::Stdout => "stdout",
            Channel::Stderr => "stderr",
            Channel::Warnings => "warnings",
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Expand a channel or group name (`commands`, `output`, `everything`).
pub fn expand_group(name: &str) -> Option<Vec<Channel>> {
    let channels = match name.trim() {
        "everything" => Channel::ALL.to_vec(),
        "commands" => vec![Channel::Running, Channel::Stdout],
        "output" => vec![Channel::Stdout, Channel::Stderr],
        "running" => vec![Channel::Running],
        "stdout" => vec![Channel::Stdout],
        "stderr" => vec![Channel::Stderr],
        "warnings" => vec![Channel::Warnings],
        _ => return None,
    };
    Some(channels)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelList(pub Vec<Channel>);

impl ChannelList {
    /// Parse a `hide=`/`show=` control value: names joined with `+`, or a
    /// JSON array of names. Returns the offending name on failure.
    pub fn from_value(value: &Value) -> Result<Self, String> {
        match value {
            Value::String(raw) => raw.parse(),
            Value::Array(items) => {
                let mut channels = Vec::new();
                for item in items {
                    let name = item.as_str().ok_or_else(|| item.to_string())?;
                    channels.extend(expand_group(name).ok_or_else(|| name.to_string())?);
                }
                Ok(Self(channels))
            }
            other => Err(other.to_string()),
        }
    }
}

impl FromStr for ChannelList {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let mut channels = Vec::new();
        for name in raw.split('+').filter(|n| !n.trim().is_empty()) {
            channels.extend(expand_group(name).ok_or_else(|| name.trim().to_string())?);
        }
        Ok(Self(channels))
    }
}

/// The set of hidden channels in one scope. Scopes nest by value: a child
/// starts from a copy of its parent, so leaving the child restores the parent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Visibility {
    hidden: BTreeSet<Channel>,
}

impl Visibility {
    /// Everything shown.
    pub fn everything() -> Self {
        Self::default()
    }

    pub fn hiding(channels: &[Channel]) -> Self {
        Self::default().hide(channels)
    }

    pub fn hide(mut self, channels: &[Channel]) -> Self {
        self.hidden.extend(channels.iter().copied());
        self
    }

    pub fn show(mut self, channels: &[Channel]) -> Self {
        for channel in channels {
            self.hidden.remove(channel);
        }
        self
    }

    /// Child scope: this scope's state, then `hide`, then `show`.
    pub fn nested(&self, hide: &[Channel], show: &[Channel]) -> Self {
        self.clone().hide(hide).show(show)
    }

    pub fn shows(&self, channel: Channel) -> bool {
        !self.hidden.contains(&channel)
    }

    pub fn hidden(&self) -> impl Iterator<Item = Channel> + '_ {
        self.hidden.iter().copied()
    }
}
