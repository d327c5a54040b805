//! Usage and introduction text, rendered with `minijinja`.

use anyhow::{Context, Result};
use minijinja::{Environment, context};

use super::ControlKey;
use crate::core::args::Args;
use crate::core::argument::{Schema, display_raw};

const USAGE_TEMPLATE: &str = "
Task description:

\t{{ description }}

Task usage: 

\ttaskrig run {{ task_id }}:{{ arguments | join(\",\") }}
";

const LAUNCH_TEMPLATE: &str = "{{ description }}
{% if arguments %}
The task was launched with the following arguments:

{% for name, value in arguments %}\t- {{ name }} : {{ value }}
{% endfor %}{% endif %}";

/// Collapse an indented multi-line description into display form.
pub fn description_text(description: &str) -> String {
    description
        .lines()
        .map(str::trim)
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string()
}

/// `name=<helper>` for required arguments, bracketed for optional ones,
/// then the reserved control keys.
pub fn usage_arguments(schema: &Schema, control_keys: &[ControlKey]) -> Vec<String> {
    let arguments = schema.expected_order().iter().map(|spec| {
        let text = format!("{}=<{}>", spec.name, spec.helper);
        if spec.required {
            text
        } else {
            format!("[{text}]")
        }
    });
    let controls = control_keys
        .iter()
        .map(|key| format!("[{}=<{}>]", key.name, key.helper));
    arguments.chain(controls).collect()
}

pub fn render_usage(
    task_id: &str,
    description: &str,
    schema: &Schema,
    control_keys: &[ControlKey],
) -> Result<String> {
    Environment::new()
        .render_str(
            USAGE_TEMPLATE,
            context! {
                task_id,
                description => description_text(description),
                arguments => usage_arguments(schema, control_keys),
            },
        )
        .context("render task usage")
}

/// Description followed by the arguments a top-level run was launched with.
pub fn render_launch(description: &str, args: &Args) -> Result<String> {
    let arguments: Vec<(String, String)> = args
        .iter()
        .map(|(name, value)| (name.to_string(), display_raw(value)))
        .collect();
    Environment::new()
        .render_str(
            LAUNCH_TEMPLATE,
            context! {
                description => description_text(description),
                arguments,
            },
        )
        .context("render launch description")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::argument::ArgumentSpec;
    use serde_json::json;
    use std::collections::BTreeMap;

    fn schema() -> Schema {
        Schema::merge([
            vec![ArgumentSpec::required("target", "local|remote")],
            vec![
                ArgumentSpec::optional("directory", "path"),
                ArgumentSpec::required("path", "path"),
            ],
        ])
    }

    const CONFIRM: ControlKey = ControlKey {
        name: "confirm",
        helper: "yes|y|1",
    };

    #[test]
    fn usage_lists_required_then_optional_then_controls() {
        let usage = render_usage(
            "fs.drop",
            "\n    Remove files.\n    Careful.\n",
            &schema(),
            &[CONFIRM],
        )
        .expect("render");
        assert!(usage.contains("Task description:\n\n\tRemove files.\nCareful."));
        assert!(usage.contains(
            "\ttaskrig run fs.drop:target=<local|remote>,path=<path>,[directory=<path>],[confirm=<yes|y|1>]"
        ));
    }

    #[test]
    fn usage_of_argumentless_task_has_empty_list() {
        let usage = render_usage("base.noop", "Nothing.", &Schema::default(), &[]).expect("render");
        assert!(usage.contains("\ttaskrig run base.noop:"));
    }

    #[test]
    fn launch_lists_bound_arguments() {
        let args = Args::new(BTreeMap::from([
            ("target".to_string(), json!("remote")),
            ("path".to_string(), json!("/srv/app")),
        ]));
        let text = render_launch("Copy things.", &args).expect("render");
        assert!(text.starts_with("Copy things.\n"));
        assert!(text.contains("The task was launched with the following arguments:"));
        assert!(text.contains("\t- path : /srv/app\n"));
        assert!(text.contains("\t- target : remote\n"));
    }

    #[test]
    fn launch_without_arguments_is_just_the_description() {
        let text = render_launch("Copy things.", &Args::default()).expect("render");
        assert_eq!(text.trim_end(), "Copy things.");
    }
}
