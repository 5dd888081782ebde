use crate::kernel::services::ports::SandboxError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigurationError {
    MissingAnchor(String),
    WrongAnchorKind {
        id: String,
        expected: &'static str,
        found: &'static str,
    },
}

impl std::fmt::Display for ConfigurationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigurationError::MissingAnchor(id) => write!(f, "Element #{} not found", id),
            ConfigurationError::WrongAnchorKind {
                id,
                expected,
                found,
            } => write!(f, "Element #{} is not a {} (found {})", id, expected, found),
        }
    }
}

impl std::error::Error for ConfigurationError {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    Configuration(ConfigurationError),
    SandboxBoot(SandboxError),
    FileIo {
        op: &'static str,
        path: String,
        source: SandboxError,
    },
    ModelBinding,
    Spawn {
        command: String,
        source: SandboxError,
    },
}

impl SessionError {
    pub fn file_io(op: &'static str, path: impl Into<String>, source: SandboxError) -> Self {
        SessionError::FileIo {
            op,
            path: path.into(),
            source,
        }
    }

    pub fn spawn(command: impl Into<String>, source: SandboxError) -> Self {
        SessionError::Spawn {
            command: command.into(),
            source,
        }
    }
}

impl std::fmt::Display for SessionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionError::Configuration(e) => write!(f, "Configuration error: {}", e),
            SessionError::SandboxBoot(e) => write!(f, "Error initializing sandbox: {}", e),
            SessionError::FileIo { op, path, source } => {
                write!(f, "Error {} {}: {}", op, path, source)
            }
            SessionError::ModelBinding => write!(f, "Editor model not found"),
            SessionError::Spawn { command, source } => {
                write!(f, "Failed to run `{}`: {}", command, source)
            }
        }
    }
}

impl std::error::Error for SessionError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SessionError::Configuration(e) => Some(e),
            SessionError::SandboxBoot(e) => Some(e),
            SessionError::FileIo { source, .. } | SessionError::Spawn { source, .. } => {
                Some(source)
            }
            SessionError::ModelBinding => None,
        }
    }
}

impl From<ConfigurationError> for SessionError {
    fn from(e: ConfigurationError) -> Self {
        SessionError::Configuration(e)
    }
}
