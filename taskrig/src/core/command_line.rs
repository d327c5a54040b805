//! Parsing of `<namespace>.<name>:<arg>,<name>=<value>,...` task strings.

use std::collections::BTreeMap;

use crate::core::invocation::Invocation;
use crate::error::CommandLineError;

/// A task string split into its id and an invocation of command-line origin.
#[derive(Debug, Clone, PartialEq)]
pub struct TaskCall {
    pub task_id: String,
    pub invocation: Invocation,
}

/// Parse one task string.
///
/// Arguments are separated by unescaped commas; an argument containing an
/// unescaped `=` is named. `\,`, `\=` and `\\` escape. Every value stays a
/// raw string.
pub fn parse_task_call(raw: &str) -> Result<TaskCall, CommandLineError> {
    let (task_id, rest) = match raw.split_once(':') {
        Some((id, rest)) => (id.trim(), Some(rest)),
        None => (raw.trim(), None),
    };
    if task_id.is_empty() {
        return Err(CommandLineError::MissingTaskId {
            raw: raw.to_string(),
        });
    }

    let mut positional = Vec::new();
    let mut named = BTreeMap::new();
    if let Some(rest) = rest.filter(|r| !r.is_empty()) {
        for piece in split_unescaped(rest, raw)? {
            match piece.name {
                Some(name) if name.is_empty() => {
                    return Err(CommandLineError::EmptyName {
                        raw: raw.to_string(),
                    });
                }
                Some(name) => {
                    if named.insert(name.clone(), piece.value).is_some() {
                        return Err(CommandLineError::RepeatedName { name });
                    }
                }
                None => positional.push(piece.value),
            }
        }
    }

    Ok(TaskCall {
        task_id: task_id.to_string(),
        invocation: Invocation::command_line(positional, named),
    })
}

struct Piece {
    name: Option<String>,
    value: String,
}

fn split_unescaped(args: &str, raw: &str) -> Result<Vec<Piece>, CommandLineError> {
    let mut pieces = Vec::new();
    let mut name: Option<String> = None;
    let mut current = String::new();
    let mut chars = args.chars();

    while let Some(c) = chars.next() {
        match c {
            '\\' => match chars.next() {
                Some(escaped) => current.push(escaped),
                None => {
                    return Err(CommandLineError::DanglingEscape {
                        raw: raw.to_string(),
                    });
                }
            },
            '=' if name.is_none() => name = Some(std::mem::take(&mut current)),
            ',' => pieces.push(Piece {
                name: name.take(),
                value: std::mem::take(&mut current),
            }),
            other => current.push(other),
        }
    }
    // A trailing comma closes the last piece without opening another.
    if name.is_some() || !current.is_empty() {
        pieces.push(Piece {
            name,
            value: current,
        });
    }

    Ok(pieces)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_positional_and_named() {
        let call = parse_task_call("base.run_target:local,command=ls -la").expect("parse");
        assert_eq!(call.task_id, "base.run_target");
        assert_eq!(call.invocation.positional, vec![json!("local")]);
        assert_eq!(call.invocation.named.get("command"), Some(&json!("ls -la")));
    }

    #[test]
    fn bare_task_id_has_no_arguments() {
        let call = parse_task_call("media.sync").expect("parse");
        assert!(call.invocation.is_empty());
    }

    #[test]
    fn escapes_keep_separators_literal() {
        let call = parse_task_call(r"base.run_target:local,echo a\,b\=c").expect("parse");
        assert_eq!(
            call.invocation.positional,
            vec![json!("local"), json!("echo a,b=c")]
        );
    }

    #[test]
    fn trailing_comma_adds_no_argument() {
        let call = parse_task_call("fixture.echo:hi,").expect("parse");
        assert_eq!(call.invocation.positional, vec![json!("hi")]);
        assert!(call.invocation.named.is_empty());

        let call = parse_task_call("fixture.echo:hi,times=2,").expect("parse");
        assert_eq!(call.invocation.positional, vec![json!("hi")]);
        assert_eq!(call.invocation.named.get("times"), Some(&json!("2")));

        // Empty values in the middle are still arguments.
        let call = parse_task_call("fixture.echo:hi,,x").expect("parse");
        assert_eq!(
            call.invocation.positional,
            vec![json!("hi"), json!(""), json!("x")]
        );
    }

    #[test]
    fn value_may_contain_equals_after_the_name() {
        let call = parse_task_call("base.run_target:target=local,command=a=b").expect("parse");
        assert_eq!(call.invocation.named.get("command"), Some(&json!("a=b")));
    }

    #[test]
    fn rejects_malformed_strings() {
        assert!(matches!(
            parse_task_call(":local"),
            Err(CommandLineError::MissingTaskId { .. })
        ));
        assert!(matches!(
            parse_task_call(r"fs.drop:local\"),
            Err(CommandLineError::DanglingEscape { .. })
        ));
        assert!(matches!(
            parse_task_call("fs.drop:target=local,target=remote"),
            Err(CommandLineError::RepeatedName { .. })
        ));
        assert!(matches!(
            parse_task_call("fs.drop:=local"),
            Err(CommandLineError::EmptyName { .. })
        ));
    }
}
