use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::Path;

use chrono::Local;

const LOG_FILE: &str = ".hub.log";

/// Append one line to the hub activity log. Best-effort: persistence
/// failures are reported to the user through the status row; this log
/// exists so they can be inspected afterwards.
pub fn append_hub_log(dir: &Path, kind: &str, detail: &str) -> Result<(), std::io::Error> {
    let path = dir.join(LOG_FILE);
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    let stamp = Local::now().format("%Y-%m-%d %H:%M:%S");
    writeln!(file, "[{}] {}: {}", stamp, kind, detail)
}

/// The last `count` log lines, oldest first.
pub fn read_hub_log(dir: &Path, count: usize) -> Vec<String> {
    let path = dir.join(LOG_FILE);
    let content = match fs::read_to_string(&path) {
        Ok(c) => c,
        Err(_) => return Vec::new(),
    };
    let lines: Vec<String> = content.lines().map(|l| l.to_string()).collect();
    let skip = lines.len().saturating_sub(count);
    lines.into_iter().skip(skip).collect()
}
