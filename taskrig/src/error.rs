//! Typed errors for validation, confirmation and task execution.

use thiserror::Error;

pub type TaskResult<T, E = TaskError> = Result<T, E>;

/// Why an invocation was rejected against a task's merged schema.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("too many arguments for this task ({given} given, at most {expected} accepted)")]
    TooManyArguments { given: usize, expected: usize },

    #[error("missing required arguments for this task ({given} given, {required} required)")]
    MissingRequiredArguments { given: usize, required: usize },

    #[error(
        "value {raw} does not pass validation for argument {name}.\n\tAccepted values: {helper}"
    )]
    InvalidArgumentValue {
        name: String,
        raw: String,
        helper: String,
    },

    #[error("multiple values passed for argument {name}")]
    DuplicateArgument { name: String },

    #[error("{name} is not a registered argument for this task")]
    UnknownArgument { name: String },

    #[error("value {raw} is not valid for control option {name}")]
    InvalidControlValue { name: String, raw: String },
}

impl ValidationError {
    /// Name of the argument the error is about, when there is one.
    pub fn argument(&self) -> Option<&str> {
        match self {
            ValidationError::InvalidArgumentValue { name, .. }
            | ValidationError::DuplicateArgument { name }
            | ValidationError::UnknownArgument { name }
            | ValidationError::InvalidControlValue { name, .. } => Some(name),
            ValidationError::TooManyArguments { .. }
            | ValidationError::MissingRequiredArguments { .. } => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfirmError {
    #[error("confirmation declined")]
    Declined,

    #[error("cannot convert value {raw} to boolean")]
    NotBoolean { raw: String },
}

/// Problems with a task definition, caught when it is registered.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    #[error("task `{task_id}` declares argument `{name}` more than once")]
    DuplicateName { task_id: String, name: String },

    #[error("task `{task_id}` declares reserved control key `{name}` as an argument")]
    ReservedName { task_id: String, name: String },

    #[error("invalid task id `{id}` (expected <namespace>.<name>)")]
    InvalidTaskId { id: String },

    #[error("task `{id}` is already registered")]
    AlreadyRegistered { id: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandLineError {
    #[error("missing task id in `{raw}`")]
    MissingTaskId { raw: String },

    #[error("dangling escape at the end of `{raw}`")]
    DanglingEscape { raw: String },

    #[error("named argument `{name}` given more than once")]
    RepeatedName { name: String },

    #[error("empty argument name in `{raw}`")]
    EmptyName { raw: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HookError {
    #[error("hook for `{task_id}` names unregistered callback `{callback}`")]
    UnknownCallback { task_id: String, callback: String },

    #[error("hook entry `{key}` must be a callback name or [callback, args...]")]
    Malformed { key: String },
}

/// Everything a task run can fail with.
#[derive(Debug, Error)]
pub enum TaskError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Confirmation(#[from] ConfirmError),

    #[error("unknown task `{id}`")]
    UnknownTask { id: String },

    /// Raised inside an operation or a dispatched hook; never classified further.
    #[error(transparent)]
    Operation(anyhow::Error),
}

impl From<HookError> for TaskError {
    fn from(err: HookError) -> Self {
        TaskError::Operation(err.into())
    }
}

impl TaskError {
    pub fn operation(err: impl Into<anyhow::Error>) -> Self {
        TaskError::Operation(err.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_value_message_names_argument_and_helper() {
        let err = ValidationError::InvalidArgumentValue {
            name: "target".to_string(),
            raw: "bogus".to_string(),
            helper: "local|remote".to_string(),
        };
        let message = err.to_string();
        assert!(message.contains("argument target"));
        assert!(message.contains("local|remote"));
        assert_eq!(err.argument(), Some("target"));
    }

    #[test]
    fn hook_errors_become_operation_failures() {
        let err: TaskError = HookError::Malformed {
            key: "media.sync".to_string(),
        }
        .into();
        assert!(matches!(err, TaskError::Operation(_)));
    }
}
