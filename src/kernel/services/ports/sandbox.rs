//! Sandbox port: the execution environment that owns the filesystem and
//! the process model. Hosts provide the implementation; the session only
//! calls through these traits.

use std::collections::BTreeMap;
use std::rc::Rc;

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use super::runtime::LocalBoxFuture;
use crate::kernel::services::bus::SessionEventSender;

pub type Result<T> = std::result::Result<T, SandboxError>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SandboxError {
    NotFound(String),
    Decode(String),
    InvalidPath(String),
    Io { path: String, message: String },
    Boot(String),
    Spawn { command: String, message: String },
}

impl std::fmt::Display for SandboxError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SandboxError::NotFound(p) => write!(f, "Not found: {}", p),
            SandboxError::Decode(p) => write!(f, "Not valid UTF-8 text: {}", p),
            SandboxError::InvalidPath(p) => write!(f, "Invalid path: {}", p),
            SandboxError::Io { path, message } => write!(f, "IO error on {}: {}", path, message),
            SandboxError::Boot(msg) => write!(f, "Sandbox failed to boot: {}", msg),
            SandboxError::Spawn { command, message } => {
                write!(f, "Failed to spawn `{}`: {}", command, message)
            }
        }
    }
}

impl std::error::Error for SandboxError {}

/// One row of a directory listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileEntry {
    pub name: String,
    #[serde(default)]
    pub is_dir: bool,
}

impl FileEntry {
    pub fn file(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            is_dir: false,
        }
    }

    pub fn dir(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            is_dir: true,
        }
    }
}

/// Relative path → text content, mounted once at boot.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FileSet {
    files: BTreeMap<String, String>,
}

impl FileSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_file(mut self, path: impl Into<String>, contents: impl Into<String>) -> Self {
        self.insert(path, contents);
        self
    }

    pub fn insert(&mut self, path: impl Into<String>, contents: impl Into<String>) {
        self.files.insert(path.into(), contents.into());
    }

    pub fn get(&self, path: &str) -> Option<&str> {
        self.files.get(path).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.files.iter().map(|(p, c)| (p.as_str(), c.as_str()))
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TerminalSize {
    pub cols: u16,
    pub rows: u16,
}

impl TerminalSize {
    pub fn new(cols: u16, rows: u16) -> Self {
        Self {
            cols: cols.max(1),
            rows: rows.max(1),
        }
    }
}

impl Default for TerminalSize {
    fn default() -> Self {
        Self::new(80, 24)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerReady {
    pub port: u16,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpawnRequest {
    pub command: String,
    pub args: Vec<String>,
    pub terminal: Option<TerminalSize>,
}

impl SpawnRequest {
    pub fn new(command: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            command: command.into(),
            args,
            terminal: None,
        }
    }

    pub fn sized(mut self, size: TerminalSize) -> Self {
        self.terminal = Some(size);
        self
    }

    pub fn display(&self) -> String {
        if self.args.is_empty() {
            self.command.clone()
        } else {
            format!("{} {}", self.command, self.args.join(" "))
        }
    }
}

pub trait ProcessResizer {
    fn resize(&self, size: TerminalSize);
}

/// A spawned process. `output` closes when the process ends; dropping
/// `input` relinquishes the input sink.
pub struct ProcessHandle {
    pub output: mpsc::UnboundedReceiver<Vec<u8>>,
    pub input: mpsc::UnboundedSender<Vec<u8>>,
    pub resizer: Option<Box<dyn ProcessResizer>>,
}

impl std::fmt::Debug for ProcessHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProcessHandle")
            .field("resizable", &self.resizer.is_some())
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BootOptions {
    pub workdir_name: String,
}

pub trait Sandbox {
    fn mount<'a>(&'a self, files: &'a FileSet) -> LocalBoxFuture<'a, Result<()>>;

    fn read_file<'a>(&'a self, path: &'a str) -> LocalBoxFuture<'a, Result<String>>;

    fn write_file<'a>(&'a self, path: &'a str, contents: &'a str)
        -> LocalBoxFuture<'a, Result<()>>;

    /// Non-recursive listing, in the order the sandbox reports it.
    fn read_dir<'a>(&'a self, path: &'a str) -> LocalBoxFuture<'a, Result<Vec<FileEntry>>>;

    fn spawn(&self, request: SpawnRequest) -> LocalBoxFuture<'_, Result<ProcessHandle>>;
}

/// Boots the sandbox once per session. `events` receives
/// `SessionEvent::ServerReady` whenever a sandboxed process starts listening.
pub trait SandboxBooter {
    fn boot<'a>(
        &'a self,
        options: &'a BootOptions,
        events: SessionEventSender,
    ) -> LocalBoxFuture<'a, Result<Rc<dyn Sandbox>>>;
}
