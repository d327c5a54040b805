//! Stable exit codes for `taskrig` commands.

/// Every task ran to completion.
pub const OK: i32 = 0;
/// A task string, argument, settings file or task id was invalid.
pub const INVALID: i32 = 1;
/// The user declined a confirmation prompt.
pub const ABORTED: i32 = 2;
/// An operation or one of its hooks failed.
pub const FAILED: i32 = 3;
