use crate::kernel::services::ports::FileEntry;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExplorerRow {
    pub name: String,
    pub is_dir: bool,
    pub selected: bool,
}

impl ExplorerRow {
    /// Plain-text rendering used by console hosts.
    pub fn label(&self) -> String {
        let marker = if self.selected { '>' } else { ' ' };
        if self.is_dir {
            format!("{marker} {}/", self.name)
        } else {
            format!("{marker} {}", self.name)
        }
    }
}

/// Project a flat root listing into explorer rows, keeping listing order.
/// The row whose name equals `open_path` is marked selected.
pub fn explorer_rows(entries: &[FileEntry], open_path: Option<&str>) -> Vec<ExplorerRow> {
    entries
        .iter()
        .map(|entry| ExplorerRow {
            name: entry.name.clone(),
            is_dir: entry.is_dir,
            selected: !entry.is_dir && open_path == Some(entry.name.as_str()),
        })
        .collect()
}

#[cfg(test)]
#[path = "../../tests/unit/kernel/explorer.rs"]
mod tests;
