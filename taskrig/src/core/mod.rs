//! Deterministic, pure logic shared by the engine.
//!
//! Core modules are free of I/O side effects. They operate on in-memory
//! values and return deterministic outputs suitable for tests.

pub mod args;
pub mod argument;
pub mod command_line;
pub mod invocation;
pub mod target;
pub mod types;
pub mod validator;
pub mod visibility;
