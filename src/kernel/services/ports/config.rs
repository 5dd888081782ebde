use serde::{Deserialize, Serialize};

use super::sandbox::FileSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TerminalMode {
    /// Spawn a shell at startup and bind the terminal to it.
    #[default]
    InteractiveShell,
    /// No shell; run/install triggers spawn the package manager on demand.
    ManualCommands,
}

impl TerminalMode {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "interactive-shell" | "shell" => Some(Self::InteractiveShell),
            "manual-commands" | "manual" => Some(Self::ManualCommands),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct AnchorIds {
    pub editor: String,
    pub terminal: String,
    pub explorer: String,
    pub preview: String,
    pub run: String,
    pub install: String,
}

impl Default for AnchorIds {
    fn default() -> Self {
        Self {
            editor: "editor-container".to_string(),
            terminal: "terminal".to_string(),
            explorer: "file-explorer".to_string(),
            preview: "preview".to_string(),
            run: "run-button".to_string(),
            install: "install-button".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct SessionConfig {
    pub terminal_mode: TerminalMode,
    pub workdir_name: String,
    pub anchors: AnchorIds,
    pub editor_theme: String,
    pub default_file: String,
    pub shell: String,
    pub package_manager: String,
    pub run_args: Vec<String>,
    pub install_args: Vec<String>,
    /// Replaces the starter project when set.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub files: Option<FileSet>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            terminal_mode: TerminalMode::default(),
            workdir_name: "my-workdir".to_string(),
            anchors: AnchorIds::default(),
            editor_theme: "vs-dark".to_string(),
            default_file: "index.js".to_string(),
            shell: "jsh".to_string(),
            package_manager: "npm".to_string(),
            run_args: vec!["start".to_string()],
            install_args: vec!["install".to_string()],
            files: None,
        }
    }
}

impl SessionConfig {
    pub fn from_json_str(data: &str) -> serde_json::Result<Self> {
        serde_json::from_str(data)
    }
}
