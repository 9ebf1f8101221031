use std::path::PathBuf;
use std::sync::mpsc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crate::io::{dashboard_io, hub_log};
use crate::model::entity::EntityState;

/// A request dispatched to the hub worker. All of these are
/// fire-and-forget from the gesture handlers' perspective: the UI thread
/// never waits for the result.
#[derive(Debug)]
pub enum HubCommand {
    CallService {
        domain: String,
        action: String,
        payload: serde_json::Value,
    },
    PersistOrder {
        key: String,
        order: i64,
    },
    ReassignParent {
        room: String,
        floor: String,
    },
    Shutdown,
}

/// Asynchronous results and pushes surfaced back to the event loop.
#[derive(Debug, Clone)]
pub enum HubEvent {
    /// The hub pushed an authoritative entity state (demo simulator, or
    /// a future live transport). Drives optimistic reconciliation.
    StateChanged {
        entity_id: String,
        state: EntityState,
    },
    /// A persistence call failed. Reported, never rolled back.
    Failed { what: String, error: String },
}

/// Demo-mode hub simulation: service calls are confirmed by a pushed
/// state update after a latency, with the level quantized the way the
/// real hub's 0-255 scale would.
#[derive(Debug, Clone)]
pub struct DemoConfig {
    pub push_latency: Duration,
}

impl Default for DemoConfig {
    fn default() -> Self {
        DemoConfig {
            push_latency: Duration::from_millis(1200),
        }
    }
}

/// Handle to the background hub worker. Owns the command channel; the
/// worker owns the dashboard writes so the UI thread never does file
/// I/O inside a pointer handler.
pub struct HubClient {
    tx: mpsc::Sender<HubCommand>,
    rx: mpsc::Receiver<HubEvent>,
    handle: Option<JoinHandle<()>>,
}

impl HubClient {
    pub fn start(dashboard_path: PathBuf, demo: Option<DemoConfig>) -> Self {
        let (cmd_tx, cmd_rx) = mpsc::channel::<HubCommand>();
        let (event_tx, event_rx) = mpsc::channel::<HubEvent>();
        let handle = thread::spawn(move || worker(dashboard_path, demo, cmd_rx, event_tx));
        HubClient {
            tx: cmd_tx,
            rx: event_rx,
            handle: Some(handle),
        }
    }

    /// `callService(domain, action, payload)`: no return value consumed.
    pub fn call_service(&self, domain: &str, action: &str, payload: serde_json::Value) {
        let _ = self.tx.send(HubCommand::CallService {
            domain: domain.to_string(),
            action: action.to_string(),
            payload,
        });
    }

    pub fn persist_order(&self, key: &str, order: i64) {
        let _ = self.tx.send(HubCommand::PersistOrder {
            key: key.to_string(),
            order,
        });
    }

    pub fn reassign_parent(&self, room: &str, floor: &str) {
        let _ = self.tx.send(HubCommand::ReassignParent {
            room: room.to_string(),
            floor: floor.to_string(),
        });
    }

    /// Non-blocking drain of pending hub events.
    pub fn poll(&self) -> Vec<HubEvent> {
        let mut events = Vec::new();
        while let Ok(event) = self.rx.try_recv() {
            events.push(event);
        }
        events
    }
}

impl Drop for HubClient {
    fn drop(&mut self) {
        let _ = self.tx.send(HubCommand::Shutdown);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

fn worker(
    dashboard_path: PathBuf,
    demo: Option<DemoConfig>,
    cmd_rx: mpsc::Receiver<HubCommand>,
    event_tx: mpsc::Sender<HubEvent>,
) {
    let log_dir = dashboard_path
        .parent()
        .map(|p| p.to_path_buf())
        .unwrap_or_else(|| PathBuf::from("."));
    // Confirmations waiting for their simulated push latency.
    let mut pending: Vec<(Instant, HubEvent)> = Vec::new();

    loop {
        let timeout = next_timeout(&pending);
        let command = match cmd_rx.recv_timeout(timeout) {
            Ok(command) => Some(command),
            Err(mpsc::RecvTimeoutError::Timeout) => None,
            Err(mpsc::RecvTimeoutError::Disconnected) => break,
        };

        match command {
            Some(HubCommand::Shutdown) => break,
            Some(HubCommand::CallService {
                domain,
                action,
                payload,
            }) => {
                let _ = hub_log::append_hub_log(
                    &log_dir,
                    "service",
                    &format!("{}.{} {}", domain, action, payload),
                );
                if let Some(demo) = &demo
                    && let Some(event) = simulate_confirmation(&domain, &action, &payload)
                {
                    pending.push((Instant::now() + demo.push_latency, event));
                }
            }
            Some(HubCommand::PersistOrder { key, order }) => {
                if let Err(e) = dashboard_io::persist_order(&dashboard_path, &key, order) {
                    let what = format!("persist order for {}", key);
                    let _ = hub_log::append_hub_log(&log_dir, "error", &format!("{}: {}", what, e));
                    let _ = event_tx.send(HubEvent::Failed {
                        what,
                        error: e.to_string(),
                    });
                }
            }
            Some(HubCommand::ReassignParent { room, floor }) => {
                if let Err(e) = dashboard_io::reassign_parent(&dashboard_path, &room, &floor) {
                    let what = format!("move {} to {}", room, floor);
                    let _ = hub_log::append_hub_log(&log_dir, "error", &format!("{}: {}", what, e));
                    let _ = event_tx.send(HubEvent::Failed {
                        what,
                        error: e.to_string(),
                    });
                }
            }
            None => {}
        }

        // Deliver due confirmations.
        let now = Instant::now();
        let mut i = 0;
        while i < pending.len() {
            if pending[i].0 <= now {
                let (_, event) = pending.remove(i);
                let _ = event_tx.send(event);
            } else {
                i += 1;
            }
        }
    }
}

fn next_timeout(pending: &[(Instant, HubEvent)]) -> Duration {
    let now = Instant::now();
    pending
        .iter()
        .map(|(due, _)| due.saturating_duration_since(now))
        .min()
        .unwrap_or(Duration::from_millis(250))
}

/// What the simulated hub pushes back for a service call. Levels pass
/// through the hub's 0-255 quantization, so the confirmed value can
/// differ from the requested one by a fraction — within the optimistic
/// store's tolerance.
fn simulate_confirmation(
    domain: &str,
    action: &str,
    payload: &serde_json::Value,
) -> Option<HubEvent> {
    let entity_id = payload.get("entity_id")?.as_str()?.to_string();
    let state = match (domain, action) {
        ("light", "turn_on") | ("cover", "set_position") => {
            let requested = payload
                .get("level")
                .and_then(|v| v.as_f64())
                .unwrap_or(100.0);
            let quantized = (requested * 2.55).round() / 2.55;
            EntityState {
                on: quantized > 0.0,
                level: Some(quantized),
                temperature: None,
            }
        }
        ("light", "turn_off") | ("switch", "turn_off") => EntityState::default(),
        ("switch", "turn_on") => EntityState {
            on: true,
            level: None,
            temperature: None,
        },
        _ => return None,
    };
    Some(HubEvent::StateChanged { entity_id, state })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simulated_confirmation_quantizes_level() {
        let payload = serde_json::json!({
            "entity_id": "light.kitchen_ceiling",
            "level": 47.0,
        });
        match simulate_confirmation("light", "turn_on", &payload) {
            Some(HubEvent::StateChanged { entity_id, state }) => {
                assert_eq!(entity_id, "light.kitchen_ceiling");
                let level = state.level.unwrap();
                // Quantization keeps the confirmation within tolerance.
                assert!((level - 47.0).abs() < 0.5, "level={level}");
                assert!(state.on);
            }
            other => panic!("expected state change, got {:?}", other),
        }
    }

    #[test]
    fn test_turn_off_confirms_off() {
        let payload = serde_json::json!({ "entity_id": "light.lamp" });
        match simulate_confirmation("light", "turn_off", &payload) {
            Some(HubEvent::StateChanged { state, .. }) => {
                assert!(!state.on);
                assert_eq!(state.display_level(), 0.0);
            }
            other => panic!("expected state change, got {:?}", other),
        }
    }

    #[test]
    fn test_unknown_service_has_no_confirmation() {
        let payload = serde_json::json!({ "entity_id": "scene.movie" });
        assert!(simulate_confirmation("scene", "activate", &payload).is_none());
    }

    #[test]
    fn test_worker_persists_order_and_reports_failures() {
        use tempfile::TempDir;

        let dir = TempDir::new().unwrap();
        let path = dir.path().join("dashboard.toml");
        std::fs::write(
            &path,
            "[[floors]]\nid = \"ground\"\nname = \"Ground\"\n\n[[floors.rooms]]\nid = \"kitchen\"\nname = \"Kitchen\"\n",
        )
        .unwrap();

        let client = HubClient::start(path.clone(), None);
        client.persist_order("kitchen", 20);
        client.persist_order("missing-room", 10);
        // Give the worker a moment; then the failure (and only the
        // failure) surfaces as an event.
        std::thread::sleep(Duration::from_millis(300));
        let events = client.poll();
        assert_eq!(events.len(), 1);
        assert!(matches!(&events[0], HubEvent::Failed { what, .. } if what.contains("missing-room")));

        let (dashboard, _) = dashboard_io::load_dashboard(&path).unwrap();
        assert_eq!(dashboard.find_room("kitchen").unwrap().order, 20);
    }
}
