//! Sandbox adapters.
//!
//! Provides a directory-backed sandbox so the session can run without a
//! browser host.

pub mod local;
pub mod server_url;

pub use local::{LocalSandbox, LocalSandboxBooter};
pub use server_url::ServerUrlScanner;
