use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

/// Persisted TUI state (written to .state.json next to dashboard.toml).
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UiState {
    /// Which floor tab was showing.
    #[serde(default)]
    pub floor: String,
    /// Room opened inside that floor, if any.
    #[serde(default)]
    pub room: Option<String>,
    /// Scroll offset of the visible grid.
    #[serde(default)]
    pub scroll_offset: usize,
}

/// Read .state.json from the dashboard directory.
pub fn read_ui_state(dir: &Path) -> Option<UiState> {
    let path = dir.join(".state.json");
    let content = fs::read_to_string(&path).ok()?;
    serde_json::from_str(&content).ok()
}

/// Write .state.json to the dashboard directory.
pub fn write_ui_state(dir: &Path, state: &UiState) -> Result<(), std::io::Error> {
    let path = dir.join(".state.json");
    let content = serde_json::to_string_pretty(state)?;
    fs::write(&path, content)
}
