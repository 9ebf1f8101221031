use std::path::{Path, PathBuf};
use std::sync::mpsc;

use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};

/// Events sent from the file watcher to the TUI event loop.
#[derive(Debug)]
pub enum FileEvent {
    /// The dashboard file changed on disk (external edit or hub write).
    Changed,
}

/// Watches the dashboard file's directory for external edits. These are
/// the authoritative order/layout pushes the reconciliation path reads;
/// the event loop polls `poll()` each tick and never blocks on it.
pub struct DashboardWatcher {
    _watcher: RecommendedWatcher,
    rx: mpsc::Receiver<FileEvent>,
}

impl DashboardWatcher {
    pub fn start(dashboard_path: &Path) -> Result<Self, notify::Error> {
        let (tx, rx) = mpsc::channel();
        let target: PathBuf = dashboard_path.to_path_buf();
        let dir = dashboard_path
            .parent()
            .map(|p| p.to_path_buf())
            .unwrap_or_else(|| PathBuf::from("."));

        let mut watcher = RecommendedWatcher::new(
            move |result: Result<Event, notify::Error>| {
                let event = match result {
                    Ok(e) => e,
                    Err(_) => return,
                };
                match event.kind {
                    EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_) => {}
                    _ => return,
                }
                // Editors rename/replace; match on file name, not full path.
                let name = target.file_name();
                if event.paths.iter().any(|p| p.file_name() == name) {
                    let _ = tx.send(FileEvent::Changed);
                }
            },
            Config::default(),
        )?;

        watcher.watch(&dir, RecursiveMode::NonRecursive)?;
        Ok(DashboardWatcher {
            _watcher: watcher,
            rx,
        })
    }

    /// Non-blocking poll; collapses a burst of events into at most one.
    pub fn poll(&self) -> Option<FileEvent> {
        let mut seen = None;
        while let Ok(event) = self.rx.try_recv() {
            seen = Some(event);
        }
        seen
    }
}
