//! Headless session core: the coordinator plus the ports it drives.

pub mod binding;
pub mod error;
pub mod explorer;
pub mod fixture;
pub mod language;
pub mod services;
pub mod session;

pub use binding::ProcessBinding;
pub use error::{ConfigurationError, SessionError};
pub use explorer::{explorer_rows, ExplorerRow};
pub use fixture::starter_files;
pub use language::LanguageTag;
pub use session::{OpenFile, SessionCoordinator};

#[cfg(test)]
#[path = "../../tests/unit/support.rs"]
pub(crate) mod test_support;
