//! Raw invocation requests and the reserved control options they carry.

use std::collections::BTreeMap;

use serde_json::Value;

use crate::core::argument::{display_raw, to_bool};
use crate::core::visibility::{Channel, ChannelList};
use crate::error::ValidationError;

pub const SUBTASK: &str = "subtask";
pub const SILENT: &str = "silent";
pub const HIDE: &str = "hide";
pub const SHOW: &str = "show";

/// Control keys every task understands. Capabilities may reserve more.
pub const BASE_CONTROL_KEYS: [&str; 4] = [SUBTASK, SILENT, HIDE, SHOW];

/// Where an invocation came from; decides how arguments are checked and how
/// failures surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    /// Typed by a user through the command-line surface. Fully validated;
    /// the dispatcher reports failures and exits.
    CommandLine,
    /// Built by code. Fully validated; failures return as typed errors.
    Programmatic,
    /// Already-typed values from a caller that vouches for them. Values are
    /// bound by name without arity, parser or checker steps.
    Trusted,
}

impl Origin {
    pub fn validates(self) -> bool {
        !matches!(self, Origin::Trusted)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Invocation {
    pub origin: Origin,
    pub positional: Vec<Value>,
    pub named: BTreeMap<String, Value>,
}

impl Invocation {
    pub fn new(origin: Origin) -> Self {
        Self {
            origin,
            positional: Vec::new(),
            named: BTreeMap::new(),
        }
    }

    pub fn command_line(positional: Vec<String>, named: BTreeMap<String, String>) -> Self {
        Self {
            origin: Origin::CommandLine,
            positional: positional.into_iter().map(Value::String).collect(),
            named: named
                .into_iter()
                .map(|(k, v)| (k, Value::String(v)))
                .collect(),
        }
    }

    pub fn programmatic() -> Self {
        Self::new(Origin::Programmatic)
    }

    pub fn trusted() -> Self {
        Self::new(Origin::Trusted)
    }

    /// Append a positional value.
    pub fn arg(mut self, value: impl Into<Value>) -> Self {
        self.positional.push(value.into());
        self
    }

    /// Set a named value (later calls overwrite earlier ones).
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.named.insert(name.into(), value.into());
        self
    }

    /// Total number of supplied values.
    pub fn len(&self) -> usize {
        self.positional.len() + self.named.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The single literal argument `help` asks for usage instead of a run.
    pub fn is_help(&self) -> bool {
        self.named.is_empty()
            && self.positional.len() == 1
            && self.positional[0].as_str() == Some("help")
    }
}

/// Reserved keys consumed before schema validation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ControlOptions {
    pub subtask: bool,
    /// `None` when the caller did not say; the engine picks the default.
    pub silent: Option<bool>,
    pub hide: Option<Vec<Channel>>,
    pub show: Option<Vec<Channel>>,
    /// Keys reserved by capabilities (e.g. `confirm`), still raw.
    pub extra: BTreeMap<String, Value>,
}

impl ControlOptions {
    /// Remove every reserved key from `named`. `extra_keys` are the keys the
    /// task's capabilities reserve on top of the base set.
    pub fn extract(
        named: &mut BTreeMap<String, Value>,
        extra_keys: &[&str],
    ) -> Result<Self, ValidationError> {
        let mut controls = ControlOptions::default();

        if let Some(raw) = named.remove(SUBTASK) {
            controls.subtask = control_bool(SUBTASK, &raw)?;
        }
        if let Some(raw) = named.remove(SILENT) {
            controls.silent = Some(control_bool(SILENT, &raw)?);
        }
        if let Some(raw) = named.remove(HIDE) {
            controls.hide = Some(control_channels(HIDE, &raw)?);
        }
        if let Some(raw) = named.remove(SHOW) {
            controls.show = Some(control_channels(SHOW, &raw)?);
        }
        for key in extra_keys {
            if let Some(raw) = named.remove(*key) {
                controls.extra.insert((*key).to_string(), raw);
            }
        }

        Ok(controls)
    }
}

fn control_bool(name: &str, raw: &Value) -> Result<bool, ValidationError> {
    to_bool(raw).map_err(|raw| ValidationError::InvalidControlValue {
        name: name.to_string(),
        raw,
    })
}

fn control_channels(name: &str, raw: &Value) -> Result<Vec<Channel>, ValidationError> {
    ChannelList::from_value(raw)
        .map(|list| list.0)
        .map_err(|_| ValidationError::InvalidControlValue {
            name: name.to_string(),
            raw: display_raw(raw),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn named(pairs: &[(&str, Value)]) -> BTreeMap<String, Value> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn extract_strips_reserved_keys() {
        let mut map = named(&[
            ("silent", json!("yes")),
            ("hide", json!("running")),
            ("confirm", json!("y")),
            ("target", json!("local")),
        ]);
        let controls = ControlOptions::extract(&mut map, &["confirm"]).expect("extract");
        assert_eq!(controls.silent, Some(true));
        assert_eq!(controls.hide, Some(vec![Channel::Running]));
        assert_eq!(controls.extra.get("confirm"), Some(&json!("y")));
        assert_eq!(map.keys().collect::<Vec<_>>(), vec!["target"]);
    }

    #[test]
    fn confirm_is_left_alone_when_not_reserved() {
        let mut map = named(&[("confirm", json!("y"))]);
        let controls = ControlOptions::extract(&mut map, &[]).expect("extract");
        assert!(controls.extra.is_empty());
        assert!(map.contains_key("confirm"));
    }

    #[test]
    fn bad_control_value_is_rejected() {
        let mut map = named(&[("silent", json!("sometimes"))]);
        let err = ControlOptions::extract(&mut map, &[]).unwrap_err();
        assert_eq!(
            err,
            ValidationError::InvalidControlValue {
                name: "silent".to_string(),
                raw: "sometimes".to_string(),
            }
        );
    }

    #[test]
    fn help_needs_a_single_literal() {
        assert!(Invocation::command_line(vec!["help".into()], BTreeMap::new()).is_help());
        assert!(!Invocation::programmatic().arg("help").arg("x").is_help());
        assert!(!Invocation::programmatic().with("help", "1").is_help());
    }
}
