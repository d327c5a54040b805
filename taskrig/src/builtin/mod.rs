//! Tasks registered by default: shell wrappers that also show how tasks
//! compose through subtasks.

pub mod base;
pub mod fs;
pub mod media;

use crate::engine::Engine;
use crate::error::SchemaError;

pub fn register_all(engine: &mut Engine) -> Result<(), SchemaError> {
    engine.register(base::RunTarget::default())?;
    engine.register(base::GetFile::default())?;
    engine.register(fs::DropFiles::default())?;
    engine.register(fs::Symlink)?;
    engine.register(media::SyncMedia::default())?;
    Ok(())
}

/// Join `rest` under `base` with exactly one slash; absolute `rest` wins.
pub(crate) fn join_path(base: &str, rest: &str) -> String {
    if rest.is_empty() {
        return base.to_string();
    }
    if rest.starts_with('/') || base.is_empty() {
        return rest.to_string();
    }
    format!("{}/{rest}", base.trim_end_matches('/'))
}
