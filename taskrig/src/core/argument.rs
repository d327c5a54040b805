//! Declared task parameters and the merged schema built from them.

use serde_json::Value;

/// Turns a raw value into its parsed form. The error is a short reason, the
/// caller reports the raw value and helper text.
pub type Parser = fn(&Value) -> Result<Value, String>;

/// Accepts or rejects an already parsed value.
pub type Checker = fn(&Value) -> bool;

/// One declared parameter of a task or capability.
#[derive(Debug, Clone)]
pub struct ArgumentSpec {
    pub name: &'static str,
    pub required: bool,
    /// Human readable description of accepted values (usage text only).
    pub helper: &'static str,
    pub parser: Parser,
    pub checker: Checker,
}

impl ArgumentSpec {
    pub fn required(name: &'static str, helper: &'static str) -> Self {
        Self {
            name,
            required: true,
            helper,
            parser: parse::text,
            checker: check::any,
        }
    }

    pub fn optional(name: &'static str, helper: &'static str) -> Self {
        Self {
            required: false,
            ..Self::required(name, helper)
        }
    }

    pub fn parser(mut self, parser: Parser) -> Self {
        self.parser = parser;
        self
    }

    pub fn checker(mut self, checker: Checker) -> Self {
        self.checker = checker;
        self
    }

    /// Run parser then checker; `None` means the value is rejected.
    pub fn accept(&self, raw: &Value) -> Option<Value> {
        let parsed = (self.parser)(raw).ok()?;
        (self.checker)(&parsed).then_some(parsed)
    }
}

/// A task's arguments after merging the capability chain with its own
/// declarations. Required specs come first; relative order is kept within
/// each group.
#[derive(Debug, Clone, Default)]
pub struct Schema {
    specs: Vec<ArgumentSpec>,
}

impl Schema {
    /// Merge spec groups in composition order, then move required specs ahead
    /// of optional ones (stable).
    pub fn merge<I>(groups: I) -> Self
    where
        I: IntoIterator<Item = Vec<ArgumentSpec>>,
    {
        let all: Vec<ArgumentSpec> = groups.into_iter().flatten().collect();
        let (mut specs, optional): (Vec<_>, Vec<_>) = all.into_iter().partition(|s| s.required);
        specs.extend(optional);
        Self { specs }
    }

    /// Specs in the order positional values are bound to them.
    pub fn expected_order(&self) -> &[ArgumentSpec] {
        &self.specs
    }

    pub fn len(&self) -> usize {
        self.specs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }

    pub fn required_count(&self) -> usize {
        self.specs.iter().filter(|s| s.required).count()
    }

    pub fn find(&self, name: &str) -> Option<&ArgumentSpec> {
        self.specs.iter().find(|s| s.name == name)
    }

    /// First name declared more than once, if any.
    pub fn first_duplicate(&self) -> Option<&'static str> {
        self.specs
            .iter()
            .enumerate()
            .find(|(idx, spec)| self.specs[..*idx].iter().any(|s| s.name == spec.name))
            .map(|(_, spec)| spec.name)
    }
}

/// Render a raw value the way a user typed it (strings unquoted).
pub fn display_raw(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Coerce the accepted boolean spellings: `y`, `yes`, `1`, `true` and
/// their negative counterparts, case-insensitive, plus JSON booleans and 0/1.
pub fn to_bool(value: &Value) -> Result<bool, String> {
    match value {
        Value::Bool(b) => Ok(*b),
        Value::Number(n) if n.as_i64() == Some(1) => Ok(true),
        Value::Number(n) if n.as_i64() == Some(0) => Ok(false),
        Value::String(s) => match s.trim().to_lowercase().as_str() {
            "y" | "yes" | "1" | "true" => Ok(true),
            "n" | "no" | "0" | "false" => Ok(false),
            _ => Err(display_raw(value)),
        },
        other => Err(display_raw(other)),
    }
}

/// Stock parsers.
pub mod parse {
    use serde_json::Value;

    use super::to_bool;

    /// Keep the value as is.
    pub fn identity(value: &Value) -> Result<Value, String> {
        Ok(value.clone())
    }

    /// Accept strings and render other scalars as strings.
    pub fn text(value: &Value) -> Result<Value, String> {
        match value {
            Value::String(_) => Ok(value.clone()),
            Value::Number(n) => Ok(Value::String(n.to_string())),
            Value::Bool(b) => Ok(Value::String(b.to_string())),
            _ => Err("expected a scalar".to_string()),
        }
    }

    pub fn boolean(value: &Value) -> Result<Value, String> {
        to_bool(value)
            .map(Value::Bool)
            .map_err(|raw| format!("cannot convert {raw} to boolean"))
    }

    pub fn integer(value: &Value) -> Result<Value, String> {
        match value {
            Value::Number(n) if n.is_i64() => Ok(value.clone()),
            Value::String(s) => s
                .trim()
                .parse::<i64>()
                .map(Value::from)
                .map_err(|err| err.to_string()),
            _ => Err("expected an integer".to_string()),
        }
    }
}

/// Stock checkers.
pub mod check {
    use serde_json::Value;

    use crate::core::target::Target;

    pub fn any(_: &Value) -> bool {
        true
    }

    pub fn non_empty(value: &Value) -> bool {
        value.as_str().is_some_and(|s| !s.trim().is_empty())
    }

    pub fn target(value: &Value) -> bool {
        Target::from_value(value).is_some()
    }

    pub fn is_bool(value: &Value) -> bool {
        value.is_boolean()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn names(schema: &Schema) -> Vec<&'static str> {
        schema.expected_order().iter().map(|s| s.name).collect()
    }

    #[test]
    fn merge_puts_required_first_and_keeps_group_order() {
        let schema = Schema::merge([
            vec![ArgumentSpec::optional("confirm", "yes|y|1")],
            vec![ArgumentSpec::required("target", "local|remote")],
            vec![
                ArgumentSpec::optional("capture", "bool"),
                ArgumentSpec::required("command", "any"),
            ],
        ]);
        assert_eq!(names(&schema), vec!["target", "command", "confirm", "capture"]);
        assert_eq!(schema.required_count(), 2);
        assert_eq!(schema.len(), 4);
    }

    #[test]
    fn first_duplicate_reports_repeated_name() {
        let schema = Schema::merge([
            vec![ArgumentSpec::required("target", "local|remote")],
            vec![ArgumentSpec::optional("target", "again")],
        ]);
        assert_eq!(schema.first_duplicate(), Some("target"));
    }

    #[test]
    fn to_bool_accepts_documented_spellings() {
        for raw in [json!("y"), json!("YES"), json!("1"), json!("true"), json!(true), json!(1)] {
            assert_eq!(to_bool(&raw), Ok(true), "{raw}");
        }
        for raw in [json!("n"), json!("No"), json!("0"), json!("false"), json!(false), json!(0)] {
            assert_eq!(to_bool(&raw), Ok(false), "{raw}");
        }
        assert_eq!(to_bool(&json!("maybe")), Err("maybe".to_string()));
        assert!(to_bool(&json!(2)).is_err());
    }

    #[test]
    fn accept_runs_parser_then_checker() {
        let spec = ArgumentSpec::required("target", "local|remote").checker(check::target);
        assert_eq!(spec.accept(&json!("local")), Some(json!("local")));
        assert_eq!(spec.accept(&json!("bogus")), None);

        let count = ArgumentSpec::required("count", "integer").parser(parse::integer);
        assert_eq!(count.accept(&json!("12")), Some(json!(12)));
        assert_eq!(count.accept(&json!("twelve")), None);
    }
}
