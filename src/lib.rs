//! browser_ide - session coordinator for a sandbox-backed mini IDE
//!
//! Module layout:
//! - kernel: the session coordinator, its data model and errors
//! - kernel::services::ports: contracts for the sandbox, editor, terminal and page
//! - kernel::services::adapters: local sandbox and console host implementations

pub mod kernel;
