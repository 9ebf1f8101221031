pub mod dashboard_io;
pub mod hub_log;
pub mod state;
pub mod watcher;
