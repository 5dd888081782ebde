//! Service ports: traits + data contracts.

pub mod config;
pub mod editor;
pub mod page;
pub mod runtime;
pub mod sandbox;
pub mod terminal;

pub use config::{AnchorIds, SessionConfig, TerminalMode};
pub use editor::{EditorHost, EditorOptions, ModelId, TextEditor};
pub use page::{Anchor, ExplorerView, Page, PreviewFrame};
pub use runtime::LocalBoxFuture;
pub use sandbox::{
    BootOptions, FileEntry, FileSet, ProcessHandle, ProcessResizer, Result as SandboxResult,
    Sandbox, SandboxBooter, SandboxError, ServerReady, SpawnRequest, TerminalSize,
};
pub use terminal::TerminalView;
