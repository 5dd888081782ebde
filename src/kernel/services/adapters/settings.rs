use crate::kernel::services::ports::config::SessionConfig;
use std::path::{Path, PathBuf};

const APP_DIR: &str = "browser_ide";
const LOG_DIR: &str = "logs";

#[derive(Debug)]
pub enum ConfigLoadError {
    Io { path: PathBuf, error: std::io::Error },
    Parse { path: PathBuf, error: serde_json::Error },
}

impl std::fmt::Display for ConfigLoadError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigLoadError::Io { path, error } => {
                write!(f, "Cannot read config {}: {}", path.display(), error)
            }
            ConfigLoadError::Parse { path, error } => {
                write!(f, "Invalid config {}: {}", path.display(), error)
            }
        }
    }
}

impl std::error::Error for ConfigLoadError {}

pub fn load_config(path: &Path) -> Result<SessionConfig, ConfigLoadError> {
    let data = std::fs::read_to_string(path).map_err(|error| ConfigLoadError::Io {
        path: path.to_path_buf(),
        error,
    })?;
    SessionConfig::from_json_str(&data).map_err(|error| ConfigLoadError::Parse {
        path: path.to_path_buf(),
        error,
    })
}

pub fn get_log_dir() -> Option<PathBuf> {
    get_cache_dir().map(|dir| dir.join(APP_DIR).join(LOG_DIR))
}

pub fn ensure_log_dir() -> std::io::Result<PathBuf> {
    let dir = get_log_dir().ok_or_else(|| {
        std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "Cannot determine log directory",
        )
    })?;
    if !dir.exists() {
        std::fs::create_dir_all(&dir)?;
    }
    Ok(dir)
}

fn get_cache_dir() -> Option<PathBuf> {
    #[cfg(target_os = "macos")]
    {
        return std::env::var("HOME")
            .ok()
            .map(|home| PathBuf::from(home).join("Library/Caches"));
    }

    #[cfg(target_os = "linux")]
    {
        if let Ok(xdg) = std::env::var("XDG_CACHE_HOME") {
            return Some(PathBuf::from(xdg));
        }
        return std::env::var("HOME")
            .ok()
            .map(|home| PathBuf::from(home).join(".cache"));
    }

    #[cfg(target_os = "windows")]
    {
        if let Ok(local) = std::env::var("LOCALAPPDATA") {
            return Some(PathBuf::from(local));
        }
        return std::env::var("APPDATA").ok().map(PathBuf::from);
    }

    #[cfg(not(any(target_os = "macos", target_os = "linux", target_os = "windows")))]
    {
        None
    }
}

#[cfg(test)]
#[path = "../../../../tests/unit/kernel/services/adapters/settings.rs"]
mod tests;
