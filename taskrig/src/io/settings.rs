//! Settings stored in `taskrig.toml`.
//!
//! The file has a few typed sections the engine itself needs (`[engine]`,
//! `[remote]`) and is otherwise an open table read through
//! [`SettingsProvider`]: target paths, hook mappings and anything operations
//! want to look up.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};
use toml::{Table, Value};
use tracing::debug;

use crate::core::target::Target;

pub const DEFAULT_SETTINGS_FILE: &str = "taskrig.toml";

const SETTINGS_TEMPLATE: &str = r#"# taskrig settings

[engine]
# Per-command wall-clock budget in seconds.
command_timeout_secs = 1800
# Truncate captured stdout/stderr beyond this many bytes.
output_limit_bytes = 1000000

[remote]
# host = "deploy@example.com"
ssh_command = ["ssh"]
scp_command = ["scp", "-r"]

[paths]
local = "."
# remote = "/srv/www"

[media]
dir = "media"

# Hooks run after a task completes, keyed by task id.
# A value is a callback name, [callback, args...], or a list of those.
[hooks]
# "media.sync" = ["log", "media synced"]

[hooks.remote]
# "media.sync" = ["run_remote", "touch .synced"]
"#;

/// Read-only lookup into the settings table.
pub trait SettingsProvider {
    /// Value at a nested key path, e.g. `["paths", "remote"]`.
    fn get(&self, path: &[&str]) -> Option<&Value>;

    fn get_str(&self, path: &[&str]) -> Option<&str> {
        self.get(path).and_then(Value::as_str)
    }

    fn get_or(&self, path: &[&str], default: Value) -> Value {
        self.get(path).cloned().unwrap_or(default)
    }

    /// Working directory configured for `target`, if any.
    fn target_path(&self, target: Target) -> Option<&str> {
        self.get_str(&["paths", target.as_str()])
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct EngineConfig {
    /// Per-command wall-clock budget in seconds.
    pub command_timeout_secs: u64,

    /// Truncate captured stdout/stderr beyond this many bytes.
    pub output_limit_bytes: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            command_timeout_secs: 30 * 60,
            output_limit_bytes: 1_000_000,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct RemoteConfig {
    /// `user@host` the remote target lives on.
    pub host: Option<String>,
    pub ssh_command: Vec<String>,
    pub scp_command: Vec<String>,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            host: None,
            ssh_command: vec!["ssh".to_string()],
            scp_command: vec!["scp".to_string(), "-r".to_string()],
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct TypedSections {
    engine: EngineConfig,
    remote: RemoteConfig,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Settings {
    pub engine: EngineConfig,
    pub remote: RemoteConfig,
    table: Table,
}

impl Settings {
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let table: Table = toml::from_str(contents).context("parse settings table")?;
        let typed: TypedSections = toml::from_str(contents).context("parse settings sections")?;
        let settings = Self {
            engine: typed.engine,
            remote: typed.remote,
            table,
        };
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<()> {
        if self.engine.command_timeout_secs == 0 {
            return Err(anyhow!("engine.command_timeout_secs must be > 0"));
        }
        if self.engine.output_limit_bytes == 0 {
            return Err(anyhow!("engine.output_limit_bytes must be > 0"));
        }
        if self.remote.ssh_command.is_empty() || self.remote.ssh_command[0].trim().is_empty() {
            return Err(anyhow!("remote.ssh_command must be a non-empty array"));
        }
        if self.remote.scp_command.is_empty() || self.remote.scp_command[0].trim().is_empty() {
            return Err(anyhow!("remote.scp_command must be a non-empty array"));
        }
        Ok(())
    }
}

impl SettingsProvider for Settings {
    fn get(&self, path: &[&str]) -> Option<&Value> {
        let (first, rest) = path.split_first()?;
        let mut current = self.table.get(*first)?;
        for key in rest {
            current = current.as_table()?.get(*key)?;
        }
        Some(current)
    }
}

/// Load settings from a TOML file.
///
/// If the file is missing, returns `Settings::default()`.
pub fn load_settings(path: &Path) -> Result<Settings> {
    if !path.exists() {
        debug!(path = %path.display(), "settings file missing, using defaults");
        let settings = Settings::default();
        settings.validate()?;
        return Ok(settings);
    }
    let contents = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    Settings::from_toml_str(&contents).with_context(|| format!("parse {}", path.display()))
}

/// Write the commented default settings file. Returns `false` when the file
/// exists and `force` is not set.
pub fn init_settings(path: &Path, force: bool) -> Result<bool> {
    if path.exists() && !force {
        return Ok(false);
    }
    write_atomic(path, SETTINGS_TEMPLATE)?;
    Ok(true)
}

fn write_atomic(path: &Path, contents: &str) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("create directory {}", parent.display()))?;
    }
    let tmp_path = path.with_extension("toml.tmp");
    fs::write(&tmp_path, contents)
        .with_context(|| format!("write temp settings {}", tmp_path.display()))?;
    fs::rename(&tmp_path, path).with_context(|| format!("replace settings {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_missing_returns_default() {
        let temp = tempfile::tempdir().expect("tempdir");
        let settings = load_settings(&temp.path().join("missing.toml")).expect("load");
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn init_writes_a_loadable_template_once() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("taskrig.toml");
        assert!(init_settings(&path, false).expect("init"));
        assert!(!init_settings(&path, false).expect("second init"));
        let settings = load_settings(&path).expect("load");
        assert_eq!(settings.engine, EngineConfig::default());
        assert_eq!(settings.target_path(Target::Local), Some("."));
        assert_eq!(settings.get_str(&["media", "dir"]), Some("media"));
    }

    #[test]
    fn nested_lookup_walks_tables() {
        let settings = Settings::from_toml_str(
            r#"
            [paths]
            remote = "/srv/www"

            [hooks.remote]
            "media.sync" = "notify"
            "#,
        )
        .expect("parse");
        assert_eq!(settings.target_path(Target::Remote), Some("/srv/www"));
        assert_eq!(settings.target_path(Target::Local), None);
        assert_eq!(
            settings.get_str(&["hooks", "remote", "media.sync"]),
            Some("notify")
        );
        assert_eq!(settings.get(&["paths", "remote", "deeper"]), None);
        assert_eq!(
            settings.get_or(&["media", "dir"], Value::from("media")),
            Value::from("media")
        );
    }

    #[test]
    fn rejects_zero_timeout() {
        let err = Settings::from_toml_str("[engine]\ncommand_timeout_secs = 0\n").unwrap_err();
        assert!(format!("{err:#}").contains("command_timeout_secs"));
    }
}
