//! Task registry keyed by task id. Schemas are merged and checked once, at
//! registration.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::LazyLock;

use regex::Regex;

use super::{ControlKey, Task, control_keys, merged_schema};
use crate::core::argument::Schema;
use crate::core::invocation::BASE_CONTROL_KEYS;
use crate::error::SchemaError;

static TASK_ID_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z][a-z0-9_]*\.[a-z][a-z0-9_]*$").unwrap());

pub struct RegisteredTask {
    pub task: Box<dyn Task>,
    pub schema: Schema,
    pub control_keys: Vec<ControlKey>,
}

/// One line of `taskrig list`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskSummary {
    pub id: String,
    pub summary: String,
}

#[derive(Default)]
pub struct TaskRegistry {
    tasks: BTreeMap<String, RegisteredTask>,
}

impl TaskRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, task: Box<dyn Task>) -> Result<(), SchemaError> {
        let id = task.task_id();
        if !TASK_ID_RE.is_match(&id) {
            return Err(SchemaError::InvalidTaskId { id });
        }
        if self.tasks.contains_key(&id) {
            return Err(SchemaError::AlreadyRegistered { id });
        }

        let schema = merged_schema(task.as_ref());
        if let Some(name) = schema.first_duplicate() {
            return Err(SchemaError::DuplicateName {
                task_id: id,
                name: name.to_string(),
            });
        }

        let keys = control_keys(task.as_ref());
        let reserved: BTreeSet<&str> = BASE_CONTROL_KEYS
            .iter()
            .copied()
            .chain(keys.iter().map(|k| k.name))
            .collect();
        if let Some(spec) = schema
            .expected_order()
            .iter()
            .find(|spec| reserved.contains(spec.name))
        {
            return Err(SchemaError::ReservedName {
                task_id: id,
                name: spec.name.to_string(),
            });
        }

        tracing::debug!(task = %id, arguments = schema.len(), "registered task");
        self.tasks.insert(
            id,
            RegisteredTask {
                task,
                schema,
                control_keys: keys,
            },
        );
        Ok(())
    }

    pub fn get(&self, id: &str) -> Option<&RegisteredTask> {
        self.tasks.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.tasks.contains_key(id)
    }

    /// Registered tasks sorted by id, with the first description line.
    pub fn list(&self) -> Vec<TaskSummary> {
        self.tasks
            .iter()
            .map(|(id, entry)| TaskSummary {
                id: id.clone(),
                summary: entry
                    .task
                    .description()
                    .lines()
                    .map(str::trim)
                    .find(|line| !line.is_empty())
                    .unwrap_or_default()
                    .to_string(),
            })
            .collect()
    }
}
