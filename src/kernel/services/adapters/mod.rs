//! Service adapters: OS/runtime specific implementations (IO/async).

#[cfg(feature = "console")]
pub mod console;
pub mod sandbox;
pub mod settings;

#[cfg(feature = "console")]
pub use console::{
    apply_console_command, drive_console_input, parse_console_line, ConsoleCommand,
    ConsoleEditor, ConsoleEditorHost, ConsoleExplorer, ConsolePage, ConsolePreview,
    ConsoleTerminal,
};
pub use sandbox::{LocalSandbox, LocalSandboxBooter, ServerUrlScanner};
pub use settings::{ensure_log_dir, get_log_dir, load_config, ConfigLoadError};
