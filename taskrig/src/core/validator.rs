//! Reconciles an invocation's positional and named values with a schema.

use std::collections::{BTreeMap, HashSet};

use serde_json::Value;

use crate::core::args::Args;
use crate::core::argument::{ArgumentSpec, Schema, display_raw};
use crate::error::ValidationError;

/// Validate `positional` and `named` against `schema`.
///
/// Arity is checked first, then positional values are bound in expected
/// order (required first), then named values. Every bound value goes
/// through its spec's parser and checker.
pub fn validate(
    schema: &Schema,
    positional: &[Value],
    named: &BTreeMap<String, Value>,
) -> Result<Args, ValidationError> {
    let given = positional.len() + named.len();
    if given > schema.len() {
        return Err(ValidationError::TooManyArguments {
            given,
            expected: schema.len(),
        });
    }
    let required = schema.required_count();
    if given < required {
        return Err(ValidationError::MissingRequiredArguments { given, required });
    }

    bind(schema, positional, named, check_value)
}

/// Bind values by name without arity, parser or checker steps.
///
/// Positional values beyond the schema and unknown or doubled names are still
/// rejected: there is nothing to bind them to.
pub fn bind_trusted(
    schema: &Schema,
    positional: &[Value],
    named: &BTreeMap<String, Value>,
) -> Result<Args, ValidationError> {
    if positional.len() > schema.len() {
        return Err(ValidationError::TooManyArguments {
            given: positional.len() + named.len(),
            expected: schema.len(),
        });
    }
    bind(schema, positional, named, |_, raw| Ok(raw.clone()))
}

fn bind<F>(
    schema: &Schema,
    positional: &[Value],
    named: &BTreeMap<String, Value>,
    accept: F,
) -> Result<Args, ValidationError>
where
    F: Fn(&ArgumentSpec, &Value) -> Result<Value, ValidationError>,
{
    let mut consumed: HashSet<&str> = HashSet::new();
    let mut values = BTreeMap::new();

    for (spec, raw) in schema.expected_order().iter().zip(positional) {
        values.insert(spec.name.to_string(), accept(spec, raw)?);
        consumed.insert(spec.name);
    }

    for (name, raw) in named {
        if consumed.contains(name.as_str()) {
            return Err(ValidationError::DuplicateArgument { name: name.clone() });
        }
        let spec = schema
            .find(name)
            .ok_or_else(|| ValidationError::UnknownArgument { name: name.clone() })?;
        values.insert(spec.name.to_string(), accept(spec, raw)?);
        consumed.insert(spec.name);
    }

    Ok(Args::new(values))
}

fn check_value(spec: &ArgumentSpec, raw: &Value) -> Result<Value, ValidationError> {
    spec.accept(raw)
        .ok_or_else(|| ValidationError::InvalidArgumentValue {
            name: spec.name.to_string(),
            raw: display_raw(raw),
            helper: spec.helper.to_string(),
        })
}
