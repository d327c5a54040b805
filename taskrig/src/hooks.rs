//! Post-run hooks configured in settings and resolved against callbacks
//! registered in code.

use std::collections::BTreeMap;
use std::fmt;

use anyhow::Result;
use serde_json::Value;

use crate::context::TaskContext;
use crate::core::argument::display_raw;
use crate::core::target::Target;
use crate::error::HookError;
use crate::io::settings::SettingsProvider;

pub type HookFn = Box<dyn Fn(&TaskContext<'_>, &[Value]) -> Result<()>>;

/// A configured hook with its callback resolved.
pub enum Hook<'a> {
    Callback {
        name: String,
        callback: &'a HookFn,
    },
    CallbackWithArgs {
        name: String,
        callback: &'a HookFn,
        args: Vec<Value>,
    },
}

impl Hook<'_> {
    pub fn name(&self) -> &str {
        match self {
            Hook::Callback { name, .. } | Hook::CallbackWithArgs { name, .. } => name,
        }
    }

    pub fn args(&self) -> &[Value] {
        match self {
            Hook::Callback { .. } => &[],
            Hook::CallbackWithArgs { args, .. } => args,
        }
    }

    pub fn invoke(&self, ctx: &TaskContext<'_>) -> Result<()> {
        match self {
            Hook::Callback { callback, .. } => callback(ctx, &[]),
            Hook::CallbackWithArgs { callback, args, .. } => callback(ctx, args),
        }
    }
}

impl fmt::Debug for Hook<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Hook::Callback { name, .. } => f.debug_struct("Callback").field("name", name).finish(),
            Hook::CallbackWithArgs { name, args, .. } => f
                .debug_struct("CallbackWithArgs")
                .field("name", name)
                .field("args", args)
                .finish(),
        }
    }
}

/// Callbacks addressable by name from the `[hooks]` settings tables.
pub struct HookRegistry {
    callbacks: BTreeMap<String, HookFn>,
}

impl Default for HookRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}

impl HookRegistry {
    /// A registry with no callbacks at all.
    pub fn new() -> Self {
        Self {
            callbacks: BTreeMap::new(),
        }
    }

    /// `log`, `run_local` and `run_remote`.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register("log", |ctx, args| {
            ctx.log(&join_args(args));
            Ok(())
        });
        registry.register("run_local", |ctx, args| {
            ctx.run(Target::Local, &join_args(args)).map(|_| ())
        });
        registry.register("run_remote", |ctx, args| {
            ctx.run(Target::Remote, &join_args(args)).map(|_| ())
        });
        registry
    }

    /// Register (or replace) a callback.
    pub fn register<F>(&mut self, name: impl Into<String>, callback: F)
    where
        F: Fn(&TaskContext<'_>, &[Value]) -> Result<()> + 'static,
    {
        self.callbacks.insert(name.into(), Box::new(callback));
    }

    pub fn contains(&self, name: &str) -> bool {
        self.callbacks.contains_key(name)
    }

    /// Hooks under `[hooks]` for `task_id`.
    pub fn lookup_global<'a>(
        &'a self,
        settings: &dyn SettingsProvider,
        task_id: &str,
    ) -> Result<Vec<Hook<'a>>, HookError> {
        match settings.get(&["hooks", task_id]) {
            Some(value) => self.resolve(task_id, &format!("hooks.\"{task_id}\""), value),
            None => Ok(Vec::new()),
        }
    }

    /// Hooks under `[hooks.<scope>]` for `task_id`.
    pub fn lookup_scoped<'a>(
        &'a self,
        settings: &dyn SettingsProvider,
        task_id: &str,
        scope: &str,
    ) -> Result<Vec<Hook<'a>>, HookError> {
        match settings.get(&["hooks", scope, task_id]) {
            Some(value) => {
                self.resolve(task_id, &format!("hooks.{scope}.\"{task_id}\""), value)
            }
            None => Ok(Vec::new()),
        }
    }

    /// Resolve one settings value: a callback name, `[name, args...]`, or a
    /// list of those.
    pub fn resolve<'a>(
        &'a self,
        task_id: &str,
        key: &str,
        value: &toml::Value,
    ) -> Result<Vec<Hook<'a>>, HookError> {
        let malformed = || HookError::Malformed {
            key: key.to_string(),
        };
        let value = serde_json::to_value(value).map_err(|_| malformed())?;

        match &value {
            Value::Array(entries) if entries.first().is_some_and(Value::is_array) => entries
                .iter()
                .map(|entry| match entry {
                    Value::Array(items) => self.entry(task_id, items).ok_or_else(malformed)?,
                    _ => Err(malformed()),
                })
                .collect(),
            Value::Array(items) => Ok(vec![self.entry(task_id, items).ok_or_else(malformed)??]),
            Value::String(name) => {
                let items = [Value::String(name.clone())];
                Ok(vec![self.entry(task_id, &items).ok_or_else(malformed)??])
            }
            _ => Err(malformed()),
        }
    }

    /// `None` when the entry has no callback name at its head.
    fn entry<'a>(
        &'a self,
        task_id: &str,
        items: &[Value],
    ) -> Option<Result<Hook<'a>, HookError>> {
        let (head, args) = items.split_first()?;
        let name = head.as_str()?;
        let Some(callback) = self.callbacks.get(name) else {
            return Some(Err(HookError::UnknownCallback {
                task_id: task_id.to_string(),
                callback: name.to_string(),
            }));
        };
        let name = name.to_string();
        Some(Ok(if args.is_empty() {
            Hook::Callback { name, callback }
        } else {
            Hook::CallbackWithArgs {
                name,
                callback,
                args: args.to_vec(),
            }
        }))
    }
}

fn join_args(args: &[Value]) -> String {
    args.iter().map(display_raw).collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::settings::Settings;
    use serde_json::json;

    fn settings(toml: &str) -> Settings {
        Settings::from_toml_str(toml).expect("settings")
    }

    fn names(hooks: &[Hook<'_>]) -> Vec<String> {
        hooks.iter().map(|h| h.name().to_string()).collect()
    }

    #[test]
    fn resolves_every_supported_shape() {
        let registry = HookRegistry::with_builtins();
        let settings = settings(
            r#"
            [hooks]
            "fs.drop" = "log"
            "media.sync" = ["run_local", "touch", ".synced"]
            "base.get_file" = [["log", "one"], ["log"], ["run_remote", "ls"]]
            "#,
        );

        let hooks = registry.lookup_global(&settings, "fs.drop").expect("hooks");
        assert!(matches!(hooks.as_slice(), [Hook::Callback { .. }]));

        let hooks = registry
            .lookup_global(&settings, "media.sync")
            .expect("hooks");
        assert_eq!(names(&hooks), vec!["run_local"]);
        assert_eq!(hooks[0].args(), &[json!("touch"), json!(".synced")]);

        let hooks = registry
            .lookup_global(&settings, "base.get_file")
            .expect("hooks");
        assert_eq!(names(&hooks), vec!["log", "log", "run_remote"]);
        assert!(matches!(hooks[1], Hook::Callback { .. }));
    }

    #[test]
    fn scoped_lookup_reads_target_table() {
        let registry = HookRegistry::with_builtins();
        let settings = settings(
            r#"
            [hooks.remote]
            "media.sync" = ["log", "remote done"]
            "#,
        );
        assert!(
            registry
                .lookup_global(&settings, "media.sync")
                .expect("hooks")
                .is_empty()
        );
        assert!(
            registry
                .lookup_scoped(&settings, "media.sync", "local")
                .expect("hooks")
                .is_empty()
        );
        let hooks = registry
            .lookup_scoped(&settings, "media.sync", "remote")
            .expect("hooks");
        assert_eq!(names(&hooks), vec!["log"]);
    }

    #[test]
    fn unknown_callback_is_reported() {
        let registry = HookRegistry::with_builtins();
        let settings = settings(
            r#"
            [hooks]
            "fs.drop" = ["notify", "ops"]
            "#,
        );
        let err = registry.lookup_global(&settings, "fs.drop").unwrap_err();
        assert_eq!(
            err,
            HookError::UnknownCallback {
                task_id: "fs.drop".to_string(),
                callback: "notify".to_string(),
            }
        );
    }

    #[test]
    fn malformed_entries_are_rejected() {
        let registry = HookRegistry::with_builtins();
        for body in [
            r#""fs.drop" = 3"#,
            r#""fs.drop" = []"#,
            r#""fs.drop" = [["log"], "log"]"#,
            r#""fs.drop" = [1, "x"]"#,
        ] {
            let settings = settings(&format!("[hooks]\n{body}\n"));
            let err = registry.lookup_global(&settings, "fs.drop").unwrap_err();
            assert!(matches!(err, HookError::Malformed { .. }), "{body}");
        }
    }

    #[test]
    fn custom_callbacks_can_be_registered() {
        let mut registry = HookRegistry::new();
        assert!(!registry.contains("log"));
        registry.register("notify", |_, _| Ok(()));
        let settings = settings("[hooks]\n\"fs.drop\" = \"notify\"\n");
        let hooks = registry.lookup_global(&settings, "fs.drop").expect("hooks");
        assert_eq!(names(&hooks), vec!["notify"]);
    }
}
