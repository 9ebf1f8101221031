use serde::{Deserialize, Serialize};

/// Configuration from dashboard.toml's non-layout tables.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct DashboardConfig {
    #[serde(default)]
    pub gesture: GestureTimings,
    #[serde(default)]
    pub grid: GridConfig,
    #[serde(default)]
    pub ui: UiConfig,
}

/// Gesture timing knobs. All durations in milliseconds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GestureTimings {
    /// Press-and-hold duration before a drag starts.
    #[serde(default = "default_long_press_ms")]
    pub long_press_ms: u64,
    /// Hover duration over a foreign floor zone before migration commits.
    #[serde(default = "default_migrate_hold_ms")]
    pub migrate_hold_ms: u64,
    /// How long an optimistic value masks the authoritative one.
    #[serde(default = "default_optimistic_ms")]
    pub optimistic_ms: u64,
    /// Optimistic hold used in demo mode (the simulated hub is slower).
    #[serde(default = "default_demo_optimistic_ms")]
    pub demo_optimistic_ms: u64,
    /// Movement in cells that reinterprets a pending press as scroll.
    #[serde(default = "default_move_threshold")]
    pub move_threshold: f64,
}

impl Default for GestureTimings {
    fn default() -> Self {
        GestureTimings {
            long_press_ms: default_long_press_ms(),
            migrate_hold_ms: default_migrate_hold_ms(),
            optimistic_ms: default_optimistic_ms(),
            demo_optimistic_ms: default_demo_optimistic_ms(),
            move_threshold: default_move_threshold(),
        }
    }
}

/// Grid layout knobs for the card views, in terminal cells.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GridConfig {
    #[serde(default = "default_columns")]
    pub columns: usize,
    #[serde(default = "default_cell_width")]
    pub cell_width: f64,
    #[serde(default = "default_cell_height")]
    pub cell_height: f64,
    #[serde(default = "default_gap")]
    pub gap: f64,
}

impl Default for GridConfig {
    fn default() -> Self {
        GridConfig {
            columns: default_columns(),
            cell_width: default_cell_width(),
            cell_height: default_cell_height(),
            gap: default_gap(),
        }
    }
}

/// Color overrides for the TUI theme (hex strings like "#RRGGBB").
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UiConfig {
    #[serde(default)]
    pub background: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub highlight: Option<String>,
    #[serde(default)]
    pub dim: Option<String>,
    #[serde(default)]
    pub accent: Option<String>,
}

fn default_long_press_ms() -> u64 {
    500
}

fn default_migrate_hold_ms() -> u64 {
    500
}

fn default_optimistic_ms() -> u64 {
    5000
}

fn default_demo_optimistic_ms() -> u64 {
    15000
}

fn default_move_threshold() -> f64 {
    10.0
}

fn default_columns() -> usize {
    3
}

fn default_cell_width() -> f64 {
    24.0
}

fn default_cell_height() -> f64 {
    5.0
}

fn default_gap() -> f64 {
    1.0
}
