use std::path::{Path, PathBuf};

use crate::io::dashboard_io::{load_dashboard, write_dashboard};
use crate::io::hub_log::read_hub_log;
use crate::ops::check::check_dashboard;

const SAMPLE_DASHBOARD: &str = r#"# hearth dashboard
# Floors contain rooms, rooms contain devices. Reorder by dragging in
# the TUI or by editing the order values here; lower sorts first.

[[floors]]
id = "ground"
name = "Ground Floor"
order = 10

[[floors.rooms]]
id = "living"
name = "Living Room"
order = 10

[[floors.rooms.devices]]
key = "living-ceiling"
entity_id = "light.living_ceiling"
name = "Ceiling"
kind = "light"
order = 10

[[floors.rooms.devices]]
key = "living-lamp"
entity_id = "light.living_lamp"
name = "Reading Lamp"
kind = "light"
order = 20

[[floors.rooms.devices]]
key = "living-blinds"
entity_id = "cover.living_blinds"
name = "Blinds"
kind = "cover"
order = 30

[[floors.rooms]]
id = "kitchen"
name = "Kitchen"
order = 20

[[floors.rooms.devices]]
key = "kitchen-spots"
entity_id = "light.kitchen_spots"
name = "Spots"
kind = "light"
order = 10

[[floors.rooms.devices]]
key = "kitchen-kettle"
entity_id = "switch.kitchen_kettle"
name = "Kettle"
kind = "switch"
order = 20

[[floors]]
id = "upstairs"
name = "Upstairs"
order = 20

[[floors.rooms]]
id = "bedroom"
name = "Bedroom"
order = 10

[[floors.rooms.devices]]
key = "bedroom-main"
entity_id = "light.bedroom_main"
name = "Main Light"
kind = "light"
order = 10

[[floors.rooms.devices]]
key = "bedroom-thermostat"
entity_id = "climate.bedroom"
name = "Thermostat"
kind = "climate"
order = 20
"#;

/// Where dashboard.toml lives for this invocation.
pub fn dashboard_path(dir: Option<&Path>) -> PathBuf {
    dir.unwrap_or_else(|| Path::new("."))
        .join("dashboard.toml")
}

/// Scaffold a sample dashboard. Refuses to overwrite an existing one.
pub fn cmd_init(dir: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    let path = dashboard_path(dir);
    if path.exists() {
        return Err(format!("{} already exists", path.display()).into());
    }
    write_dashboard(&path, SAMPLE_DASHBOARD)?;
    println!("created {}", path.display());
    println!("run `hearth --demo` to try it against a simulated hub");
    Ok(())
}

/// Validate the dashboard file and report every issue found.
pub fn cmd_check(dir: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    let path = dashboard_path(dir);
    let (dashboard, _) = load_dashboard(&path)?;
    let issues = check_dashboard(&dashboard);
    if issues.is_empty() {
        println!("ok: {} checks out", path.display());
        return Ok(());
    }
    for issue in &issues {
        println!("  {}", issue);
    }
    Err(format!("{} issue(s) found", issues.len()).into())
}

/// Print the tail of the hub activity log.
pub fn cmd_log(dir: Option<&Path>, count: usize) -> Result<(), Box<dyn std::error::Error>> {
    let dir = dir.unwrap_or_else(|| Path::new("."));
    let lines = read_hub_log(dir, count);
    if lines.is_empty() {
        println!("no hub activity recorded");
        return Ok(());
    }
    for line in lines {
        println!("{}", line);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_init_writes_a_valid_dashboard() {
        let dir = TempDir::new().unwrap();
        cmd_init(Some(dir.path())).unwrap();
        let (dashboard, config) = load_dashboard(&dashboard_path(Some(dir.path()))).unwrap();
        assert_eq!(dashboard.floors.len(), 2);
        assert_eq!(config.grid.columns, 3);
        assert!(check_dashboard(&dashboard).is_empty());
    }

    #[test]
    fn test_init_refuses_to_overwrite() {
        let dir = TempDir::new().unwrap();
        cmd_init(Some(dir.path())).unwrap();
        assert!(cmd_init(Some(dir.path())).is_err());
    }
}
