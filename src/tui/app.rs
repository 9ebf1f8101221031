use std::collections::{BTreeSet, HashMap};
use std::io;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use crossterm::event::{
    self, DisableMouseCapture, EnableMouseCapture, Event, KeyEventKind,
};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use unicode_width::UnicodeWidthStr;

use crate::gesture::brightness::{BrightnessGestureController, SwipeConfig};
use crate::gesture::drag::DragConfig;
use crate::gesture::geometry::GridGeometry;
use crate::gesture::migrate::{
    CoordinatorEvent, DragCoordinator, MigrationConfig, MigrationZone, ZoneRect,
};
use crate::gesture::optimistic::OptimisticStore;
use crate::hub::{DemoConfig, HubClient, HubEvent};
use crate::io::dashboard_io::load_dashboard;
use crate::io::state::{UiState, read_ui_state, write_ui_state};
use crate::io::watcher::{DashboardWatcher, FileEvent};
use crate::model::{Dashboard, DashboardConfig, Device, EntityState};
use crate::ops::reorder_ops;

use super::input;
use super::render;
use super::theme::Theme;

/// Synthetic collection key for the floor-reorder grid.
pub const FLOORS_COLLECTION: &str = "\u{0}floors";
/// Synthetic collection key for the flattened all-devices grid.
pub const ALL_DEVICES_COLLECTION: &str = "\u{0}all-devices";

/// Which grid is currently displayed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum View {
    /// A floor's rooms (index into floor_ids).
    Floor(usize),
    /// One room's devices.
    Room(String),
    /// Every device on the dashboard, flattened.
    AllDevices,
}

/// Current interaction mode. Selections live inside the mode that owns
/// them, so leaving a mode can never leak a stale selection into the
/// next one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditMode {
    Normal {
        /// Devices selected for a group brightness edit.
        selection: BTreeSet<usize>,
    },
    ReorderRooms {
        floor_id: String,
    },
    ReorderDevices {
        room_id: String,
        selection: BTreeSet<usize>,
    },
    ReorderAllDevices {
        selection: BTreeSet<usize>,
    },
    ReorderFloors,
}

impl EditMode {
    pub fn normal() -> Self {
        EditMode::Normal {
            selection: BTreeSet::new(),
        }
    }

    pub fn is_reorder(&self) -> bool {
        !matches!(self, EditMode::Normal { .. })
    }

    pub fn selection(&self) -> Option<&BTreeSet<usize>> {
        match self {
            EditMode::Normal { selection }
            | EditMode::ReorderDevices { selection, .. }
            | EditMode::ReorderAllDevices { selection } => Some(selection),
            _ => None,
        }
    }

    pub fn selection_mut(&mut self) -> Option<&mut BTreeSet<usize>> {
        match self {
            EditMode::Normal { selection }
            | EditMode::ReorderDevices { selection, .. }
            | EditMode::ReorderAllDevices { selection } => Some(selection),
            _ => None,
        }
    }
}

/// A floor tab's hit region in screen cells.
#[derive(Debug, Clone)]
pub struct TabHit {
    pub floor_id: String,
    pub x_start: u16,
    pub x_end: u16,
}

/// Main application state.
pub struct App {
    pub dashboard: Dashboard,
    pub config: DashboardConfig,
    pub theme: Theme,
    pub dashboard_path: PathBuf,
    pub dir: PathBuf,
    pub view: View,
    pub edit_mode: EditMode,
    pub should_quit: bool,
    pub show_help: bool,
    pub demo: bool,
    /// One-line toast shown in the status row.
    pub status_message: Option<String>,
    /// Keyboard cursor into the current grid.
    pub cursor: usize,
    /// First visible grid row.
    pub scroll_offset: usize,
    /// Authoritative entity states by entity_id, as pushed by the hub.
    pub states: HashMap<String, EntityState>,
    /// Optimistic 0-100 level overlay by device key.
    pub optimistic: OptimisticStore<f64>,
    pub coordinator: DragCoordinator,
    pub swipe: BrightnessGestureController,
    /// Keys of the block being mouse-dragged (ids for rooms/floors).
    pub drag_keys: Vec<String>,
    /// Snapshot for Esc-restore while a reorder mode is active.
    pub reorder_snapshot: Option<Dashboard>,
    /// Flattened device keys backing the all-devices grid.
    pub flat_devices: Vec<String>,
    pub hub: HubClient,
    pub watcher: Option<DashboardWatcher>,
    /// An external edit arrived mid-gesture; reload once it ends.
    pub pending_reload: bool,
    /// Pointer-down bookkeeping for tap detection in normal mode.
    pub pressed_at: Option<(f64, f64)>,
    pub pressed_index: Option<usize>,
    pub viewport: (u16, u16),
    pub grid_origin: (u16, u16),
    pub geometry: GridGeometry,
    pub tab_hits: Vec<TabHit>,
}

impl App {
    pub fn new(
        dashboard: Dashboard,
        config: DashboardConfig,
        dashboard_path: PathBuf,
        demo: bool,
    ) -> Self {
        let theme = Theme::from_config(&config.ui);
        let dir = dashboard_path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));

        let hold_ms = if demo {
            config.gesture.demo_optimistic_ms
        } else {
            config.gesture.optimistic_ms
        };
        let optimistic = OptimisticStore::for_levels(Duration::from_millis(hold_ms));

        let drag_config = DragConfig {
            long_press: Duration::from_millis(config.gesture.long_press_ms),
            move_threshold: config.gesture.move_threshold,
        };
        let migration_config = MigrationConfig {
            hold: Duration::from_millis(config.gesture.migrate_hold_ms),
        };
        let geometry = GridGeometry::new(
            config.grid.cell_width,
            config.grid.cell_height,
            config.grid.columns,
            config.grid.gap,
        );
        let coordinator = DragCoordinator::new(
            migration_config,
            drag_config,
            geometry,
            dashboard.floor_ids(),
        );
        let swipe = BrightnessGestureController::new(SwipeConfig {
            move_threshold: config.gesture.move_threshold,
            ..SwipeConfig::default()
        });

        let demo_config = demo.then(DemoConfig::default);
        let hub = HubClient::start(dashboard_path.clone(), demo_config);
        let watcher = DashboardWatcher::start(&dashboard_path).ok();

        App {
            dashboard,
            config,
            theme,
            dashboard_path,
            dir,
            view: View::Floor(0),
            edit_mode: EditMode::normal(),
            should_quit: false,
            show_help: false,
            demo,
            status_message: None,
            cursor: 0,
            scroll_offset: 0,
            states: HashMap::new(),
            optimistic,
            coordinator,
            swipe,
            drag_keys: Vec::new(),
            reorder_snapshot: None,
            flat_devices: Vec::new(),
            hub,
            watcher,
            pending_reload: false,
            pressed_at: None,
            pressed_index: None,
            viewport: (0, 0),
            grid_origin: (1, 2),
            geometry,
            tab_hits: Vec::new(),
        }
    }

    pub fn toast(&mut self, message: impl Into<String>) {
        self.status_message = Some(message.into());
    }

    // --- current grid -------------------------------------------------

    pub fn current_floor_id(&self) -> Option<String> {
        let ids = self.dashboard.floor_ids();
        match &self.view {
            View::Floor(idx) => ids.get(*idx).cloned(),
            View::Room(room_id) => self.dashboard.floor_of_room(room_id),
            View::AllDevices => None,
        }
    }

    /// Number of cards in the grid the user is looking at.
    pub fn grid_len(&self) -> usize {
        match &self.edit_mode {
            EditMode::ReorderFloors => self.dashboard.floors.len(),
            _ => match &self.view {
                View::Floor(_) => self
                    .current_floor_id()
                    .and_then(|id| self.dashboard.rooms_of(&id).map(|r| r.len()))
                    .unwrap_or(0),
                View::Room(room_id) => self
                    .dashboard
                    .find_room(room_id)
                    .map(|r| r.devices.len())
                    .unwrap_or(0),
                View::AllDevices => self.flat_devices.len(),
            },
        }
    }

    /// Device shown in grid slot `index`, for device grids.
    pub fn device_at(&self, index: usize) -> Option<&Device> {
        match &self.view {
            View::Room(room_id) => self
                .dashboard
                .find_room(room_id)
                .and_then(|r| r.devices.get(index)),
            View::AllDevices => self
                .flat_devices
                .get(index)
                .and_then(|key| self.dashboard.find_device(key)),
            View::Floor(_) => None,
        }
    }

    /// The 0-100 level a device card should show right now, optimistic
    /// overlay included.
    pub fn display_level(&mut self, device_key: &str, now: Instant) -> f64 {
        let actual = self
            .dashboard
            .find_device(device_key)
            .and_then(|d| self.states.get(&d.entity_id))
            .map(|s| s.display_level())
            .unwrap_or(0.0);
        self.optimistic.display(device_key, actual, now)
    }

    pub fn is_on(&self, device: &Device, now: Instant) -> bool {
        if self.optimistic.is_pending(&device.key, now) {
            return true;
        }
        self.states
            .get(&device.entity_id)
            .map(|s| s.on)
            .unwrap_or(false)
    }

    /// Rebuild the flattened all-devices key list from the model.
    pub fn rebuild_flat_devices(&mut self) {
        let mut devices: Vec<(String, i64, String)> = self
            .dashboard
            .all_devices()
            .map(|d| (d.key.clone(), d.order, d.name.clone()))
            .collect();
        devices.sort_by(|a, b| a.1.cmp(&b.1).then_with(|| a.2.cmp(&b.2)));
        self.flat_devices = devices.into_iter().map(|(key, _, _)| key).collect();
    }

    // --- layout -------------------------------------------------------

    /// Recompute cell layout from the viewport: tab hit regions, grid
    /// geometry (column count adapts to width), coordinator zones.
    pub fn recompute_layout(&mut self) {
        let (width, height) = self.viewport;

        // Tab bar: " name " runs separated by a space, starting at x=1.
        self.tab_hits.clear();
        let mut x = 1u16;
        for floor_id in self.dashboard.floor_ids() {
            let name = self.dashboard.floor_name(&floor_id);
            let tab_width = UnicodeWidthStr::width(name.as_str()) as u16 + 2;
            self.tab_hits.push(TabHit {
                floor_id,
                x_start: x,
                x_end: x.saturating_add(tab_width),
            });
            x = x.saturating_add(tab_width + 1);
        }

        let cell_width = self.config.grid.cell_width;
        let gap = self.config.grid.gap;
        let usable = width.saturating_sub(2) as f64;
        let fit = ((usable + gap) / (cell_width + gap)).floor() as usize;
        let columns = self.config.grid.columns.min(fit.max(1));
        self.geometry = GridGeometry::new(
            cell_width,
            self.config.grid.cell_height,
            columns,
            gap,
        );
        self.coordinator.set_geometry(self.geometry);
        self.coordinator
            .set_viewport(width as f64, height as f64);

        self.sync_migration_zones();
        let (ox, _) = self.grid_origin;
        self.swipe.set_margins(
            -(ox as f64),
            width as f64 - ox as f64,
        );
    }

    /// Register the floor tabs as migration zones. Only a rooms reorder
    /// can migrate across floors; every other mode gets an empty
    /// registry so a drag parked on a tab stays inert. Rects live in
    /// the same scrolled grid-local frame `to_grid_local` maps pointer
    /// events into, so they track the scroll offset.
    pub fn sync_migration_zones(&mut self) {
        if !matches!(self.edit_mode, EditMode::ReorderRooms { .. }) {
            self.coordinator.set_zones(Vec::new());
            return;
        }
        let (ox, oy) = self.grid_origin;
        let row_stride = self.config.grid.cell_height + self.config.grid.gap;
        let scroll_px = self.scroll_offset as f64 * row_stride;
        let zones = self
            .tab_hits
            .iter()
            .map(|tab| MigrationZone {
                target: tab.floor_id.clone(),
                rect: ZoneRect {
                    x: tab.x_start as f64 - ox as f64,
                    y: scroll_px - oy as f64,
                    width: (tab.x_end - tab.x_start) as f64,
                    height: 1.0,
                },
            })
            .collect();
        self.coordinator.set_zones(zones);
    }

    /// Screen cell -> grid-local layout units, scroll included.
    pub fn to_grid_local(&self, column: u16, row: u16) -> (f64, f64) {
        let (ox, oy) = self.grid_origin;
        let row_stride = self.config.grid.cell_height + self.config.grid.gap;
        let x = column as f64 - ox as f64;
        let y = row as f64 - oy as f64 + self.scroll_offset as f64 * row_stride;
        (x, y)
    }

    // --- reorder mode lifecycle --------------------------------------

    /// Enter a reorder mode for the current view. Snapshots the model
    /// for Esc-restore and points the coordinator at the grid.
    pub fn enter_reorder_mode(&mut self) {
        let mode = match &self.view {
            View::Floor(_) => match self.current_floor_id() {
                Some(floor_id) => EditMode::ReorderRooms { floor_id },
                None => return,
            },
            View::Room(room_id) => EditMode::ReorderDevices {
                room_id: room_id.clone(),
                selection: BTreeSet::new(),
            },
            View::AllDevices => EditMode::ReorderAllDevices {
                selection: BTreeSet::new(),
            },
        };
        self.edit_mode = mode;
        self.reorder_snapshot = Some(self.dashboard.clone());
        self.sync_reorder_grid();
    }

    pub fn enter_floor_reorder(&mut self) {
        if self.dashboard.floors.len() < 2 {
            return;
        }
        self.edit_mode = EditMode::ReorderFloors;
        self.reorder_snapshot = Some(self.dashboard.clone());
        self.cursor = 0;
        self.sync_reorder_grid();
    }

    /// Leave the active reorder mode. `restore` rolls the model back to
    /// the snapshot (Esc); otherwise in-memory keyboard moves are
    /// committed by the caller first.
    pub fn exit_reorder_mode(&mut self, restore: bool) {
        let _ = self.coordinator.cancel();
        if restore {
            if let Some(snapshot) = self.reorder_snapshot.take() {
                self.dashboard = snapshot;
            }
        }
        self.reorder_snapshot = None;
        self.drag_keys.clear();
        self.edit_mode = EditMode::normal();
        self.sync_migration_zones();
        if matches!(self.view, View::AllDevices) {
            self.rebuild_flat_devices();
        }
        self.clamp_cursor();
        self.apply_pending_reload();
    }

    /// Re-point the coordinator at the grid the active mode edits.
    pub fn sync_reorder_grid(&mut self) {
        let (collection, count) = match &self.edit_mode {
            EditMode::ReorderRooms { floor_id } => (
                floor_id.clone(),
                self.dashboard
                    .rooms_of(floor_id)
                    .map(|r| r.len())
                    .unwrap_or(0),
            ),
            EditMode::ReorderDevices { room_id, .. } => (
                room_id.clone(),
                self.dashboard
                    .find_room(room_id)
                    .map(|r| r.devices.len())
                    .unwrap_or(0),
            ),
            EditMode::ReorderAllDevices { .. } => {
                self.rebuild_flat_devices();
                (ALL_DEVICES_COLLECTION.to_string(), self.flat_devices.len())
            }
            EditMode::ReorderFloors => {
                (FLOORS_COLLECTION.to_string(), self.dashboard.floors.len())
            }
            EditMode::Normal { .. } => return,
        };
        self.coordinator.begin(&collection, count);
        // Sibling floor counts feed migration bookkeeping for rooms.
        if matches!(self.edit_mode, EditMode::ReorderRooms { .. }) {
            for floor_id in self.dashboard.floor_ids() {
                let count = self
                    .dashboard
                    .rooms_of(&floor_id)
                    .map(|r| r.len())
                    .unwrap_or(0);
                self.coordinator.set_item_count(&floor_id, count);
            }
        }
        self.sync_migration_zones();
        self.clamp_cursor();
    }

    /// Apply a coordinator outcome to the model and the store.
    pub fn handle_coordinator_event(&mut self, event: CoordinatorEvent) {
        match event {
            CoordinatorEvent::None => {}
            CoordinatorEvent::Started => {
                self.capture_drag_keys();
            }
            CoordinatorEvent::Reordered => {}
            CoordinatorEvent::Tap { index } => {
                self.cursor = index;
                self.drag_keys.clear();
                self.apply_pending_reload();
            }
            CoordinatorEvent::Cancelled => {
                self.drag_keys.clear();
                self.apply_pending_reload();
            }
            CoordinatorEvent::Migrated { to, .. } => {
                // Zones are only armed while reordering rooms; a stray
                // migration in any other mode must not hijack the grid.
                if matches!(self.edit_mode, EditMode::ReorderRooms { .. }) {
                    self.apply_migration(&to);
                }
            }
            CoordinatorEvent::Commit {
                collection,
                permutation,
                migrated_to,
            } => {
                let rooms_mode = matches!(self.edit_mode, EditMode::ReorderRooms { .. });
                if let Some(to) = migrated_to.filter(|_| rooms_mode) {
                    self.apply_migration(&to);
                    reorder_ops::commit_room_order(
                        &mut self.dashboard,
                        &self.hub,
                        &collection,
                        &permutation,
                    );
                } else {
                    self.commit_permutation(&collection, &permutation);
                }
                self.drag_keys.clear();
                self.reorder_snapshot = Some(self.dashboard.clone());
                self.sync_reorder_grid();
                self.apply_pending_reload();
            }
        }
    }

    /// Record which model items the live session is dragging, before
    /// any migration moves them out of their source list.
    fn capture_drag_keys(&mut self) {
        let Some(session) = self.coordinator.session() else {
            return;
        };
        let order = self.coordinator.display_order().to_vec();
        let backing: Vec<usize> = session
            .indices
            .iter()
            .filter_map(|&slot| order.get(slot).copied())
            .collect();
        self.drag_keys = match &self.edit_mode {
            EditMode::ReorderRooms { floor_id } => self
                .dashboard
                .rooms_of(floor_id)
                .map(|rooms| {
                    backing
                        .iter()
                        .filter_map(|&i| rooms.get(i).map(|r| r.id.clone()))
                        .collect()
                })
                .unwrap_or_default(),
            _ => Vec::new(),
        };
    }

    /// A mid-drag hop landed the block on another floor: mirror it in
    /// the model and follow the drag there.
    fn apply_migration(&mut self, to: &str) {
        let keys = self.drag_keys.clone();
        reorder_ops::migrate_rooms(&mut self.dashboard, &self.hub, &keys, to);
        self.edit_mode = EditMode::ReorderRooms {
            floor_id: to.to_string(),
        };
        let ids = self.dashboard.floor_ids();
        if let Some(idx) = ids.iter().position(|id| id == to) {
            self.view = View::Floor(idx);
        }
        let to_name = self.dashboard.floor_name(to);
        self.toast(format!("moved to {}", to_name));
    }

    fn commit_permutation(&mut self, collection: &str, permutation: &[usize]) {
        let writes = match &self.edit_mode {
            EditMode::ReorderRooms { .. } => reorder_ops::commit_room_order(
                &mut self.dashboard,
                &self.hub,
                collection,
                permutation,
            ),
            EditMode::ReorderDevices { room_id, .. } => {
                let room_id = room_id.clone();
                reorder_ops::commit_device_order(
                    &mut self.dashboard,
                    &self.hub,
                    &room_id,
                    permutation,
                )
            }
            EditMode::ReorderAllDevices { .. } => {
                reorder_ops::apply_permutation(&mut self.flat_devices, permutation);
                let keys = self.flat_devices.clone();
                reorder_ops::commit_flat_device_order(&mut self.dashboard, &self.hub, &keys)
            }
            EditMode::ReorderFloors => {
                reorder_ops::commit_floor_order(&mut self.dashboard, &self.hub, permutation)
            }
            EditMode::Normal { .. } => 0,
        };
        if writes > 0 {
            self.toast(format!("saved {} order change(s)", writes));
        }
    }

    /// Commit the current in-memory list arrangement (keyboard moves
    /// arrange the model directly, so the permutation is identity).
    pub fn commit_keyboard_order(&mut self) {
        let (collection, len) = match &self.edit_mode {
            EditMode::ReorderRooms { floor_id } => (
                floor_id.clone(),
                self.dashboard
                    .rooms_of(floor_id)
                    .map(|r| r.len())
                    .unwrap_or(0),
            ),
            EditMode::ReorderDevices { room_id, .. } => (
                room_id.clone(),
                self.dashboard
                    .find_room(room_id)
                    .map(|r| r.devices.len())
                    .unwrap_or(0),
            ),
            EditMode::ReorderAllDevices { .. } => {
                (ALL_DEVICES_COLLECTION.to_string(), self.flat_devices.len())
            }
            EditMode::ReorderFloors => {
                (FLOORS_COLLECTION.to_string(), self.dashboard.floors.len())
            }
            EditMode::Normal { .. } => return,
        };
        let identity: Vec<usize> = (0..len).collect();
        self.commit_permutation(&collection, &identity);
        self.reorder_snapshot = Some(self.dashboard.clone());
        self.sync_reorder_grid();
    }

    // --- external updates --------------------------------------------

    /// Drain hub pushes and the file watcher. Order pushes arriving
    /// mid-gesture are buffered; entity state lands immediately (it only
    /// affects card values, never the permutation being dragged).
    pub fn poll_external(&mut self, now: Instant) {
        for event in self.hub.poll() {
            match event {
                HubEvent::StateChanged { entity_id, state } => {
                    let key = self
                        .dashboard
                        .all_devices()
                        .find(|d| d.entity_id == entity_id)
                        .map(|d| d.key.clone());
                    if let Some(key) = key {
                        // Proactive reconciliation: a confirming push
                        // clears the overlay early.
                        let _ = self.optimistic.display(&key, state.display_level(), now);
                    }
                    self.states.insert(entity_id, state);
                }
                HubEvent::Failed { what, error } => {
                    self.toast(format!("{} failed: {}", what, error));
                }
            }
        }
        let changed = self
            .watcher
            .as_ref()
            .is_some_and(|w| matches!(w.poll(), Some(FileEvent::Changed)));
        if changed {
            if self.gesture_active() {
                self.pending_reload = true;
            } else {
                self.reload_dashboard();
            }
        }
        self.optimistic.sweep(now);
    }

    pub fn gesture_active(&self) -> bool {
        self.coordinator.session().is_some()
            || self.swipe.is_active()
            || self.pressed_at.is_some()
    }

    fn apply_pending_reload(&mut self) {
        if self.pending_reload && !self.gesture_active() {
            self.pending_reload = false;
            self.reload_dashboard();
        }
    }

    /// Re-read dashboard.toml after an external edit.
    pub fn reload_dashboard(&mut self) {
        match load_dashboard(&self.dashboard_path) {
            Ok((dashboard, config)) => {
                self.dashboard = dashboard;
                self.theme = Theme::from_config(&config.ui);
                self.config = config;
                if matches!(self.view, View::AllDevices) {
                    self.rebuild_flat_devices();
                }
                if let View::Room(room_id) = &self.view {
                    if self.dashboard.find_room(room_id).is_none() {
                        self.view = View::Floor(0);
                    }
                }
                if self.edit_mode.is_reorder() {
                    self.reorder_snapshot = Some(self.dashboard.clone());
                    self.sync_reorder_grid();
                }
                self.recompute_layout();
                self.clamp_cursor();
                self.toast("dashboard reloaded");
            }
            Err(e) => self.toast(format!("reload failed: {}", e)),
        }
    }

    pub fn clamp_cursor(&mut self) {
        let len = self.grid_len();
        if len == 0 {
            self.cursor = 0;
        } else if self.cursor >= len {
            self.cursor = len - 1;
        }
    }
}

fn restore_ui_state(app: &mut App) {
    let Some(state) = read_ui_state(&app.dir) else {
        return;
    };
    let ids = app.dashboard.floor_ids();
    if let Some(idx) = ids.iter().position(|id| *id == state.floor) {
        app.view = View::Floor(idx);
    }
    if let Some(room_id) = state.room {
        if app.dashboard.find_room(&room_id).is_some() {
            app.view = View::Room(room_id);
        }
    }
    app.scroll_offset = state.scroll_offset;
}

fn save_ui_state(app: &App) {
    let (floor, room) = match &app.view {
        View::Floor(idx) => (
            app.dashboard.floor_ids().get(*idx).cloned().unwrap_or_default(),
            None,
        ),
        View::Room(room_id) => (
            app.dashboard.floor_of_room(room_id).unwrap_or_default(),
            Some(room_id.clone()),
        ),
        View::AllDevices => (String::new(), None),
    };
    let state = UiState {
        floor,
        room,
        scroll_offset: app.scroll_offset,
    };
    let _ = write_ui_state(&app.dir, &state);
}

/// Run the TUI against a dashboard file.
pub fn run(dashboard_path: &Path, demo: bool) -> Result<(), Box<dyn std::error::Error>> {
    let (dashboard, config) = load_dashboard(dashboard_path)?;
    let mut app = App::new(dashboard, config, dashboard_path.to_path_buf(), demo);
    restore_ui_state(&mut app);

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;
    terminal.clear()?;

    // Restore the terminal on panic.
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen, DisableMouseCapture);
        original_hook(panic_info);
    }));

    let result = run_event_loop(&mut terminal, &mut app);

    save_ui_state(&app);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen, DisableMouseCapture)?;
    terminal.show_cursor()?;

    result
}

fn run_event_loop(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
) -> Result<(), Box<dyn std::error::Error>> {
    loop {
        let size = terminal.size()?;
        if app.viewport != (size.width, size.height) {
            app.viewport = (size.width, size.height);
            app.recompute_layout();
        }

        terminal.draw(|frame| render::render(frame, app))?;

        // Short poll so the long-press and migration hold timers fire
        // between input events.
        if event::poll(Duration::from_millis(50))? {
            match event::read()? {
                Event::Key(key) if key.kind == KeyEventKind::Press => {
                    input::handle_key(app, key);
                }
                Event::Mouse(mouse) => {
                    input::handle_mouse(app, mouse);
                }
                Event::Resize(width, height) => {
                    app.viewport = (width, height);
                    app.recompute_layout();
                }
                _ => {}
            }
        }

        let now = Instant::now();
        let event = app.coordinator.tick(now);
        app.handle_coordinator_event(event);
        app.poll_external(now);

        if app.should_quit {
            break;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gesture::pointer::PointerPos;
    use tempfile::TempDir;

    const SAMPLE: &str = r#"
[[floors]]
id = "ground"
name = "Ground"
order = 10

[[floors.rooms]]
id = "living"
name = "Living Room"
order = 10

[[floors.rooms.devices]]
key = "lamp"
entity_id = "light.lamp"
name = "Lamp"
kind = "light"
order = 10

[[floors.rooms.devices]]
key = "ceiling"
entity_id = "light.ceiling"
name = "Ceiling"
kind = "light"
order = 20

[[floors.rooms]]
id = "kitchen"
name = "Kitchen"
order = 20

[[floors]]
id = "upstairs"
name = "Upstairs"
order = 20

[[floors.rooms]]
id = "bedroom"
name = "Bedroom"
order = 10
"#;

    fn test_app() -> (TempDir, App) {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("dashboard.toml");
        std::fs::write(&path, SAMPLE).unwrap();
        let (dashboard, config) = load_dashboard(&path).unwrap();
        let mut app = App::new(dashboard, config, path, false);
        app.watcher = None;
        app.viewport = (80, 24);
        app.recompute_layout();
        (dir, app)
    }

    #[test]
    fn test_external_edit_mid_drag_applies_after_gesture() {
        let (dir, mut app) = test_app();
        app.enter_reorder_mode();

        let now = Instant::now();
        app.coordinator
            .pointer_down(PointerPos::new(2.0, 2.0), 0, &BTreeSet::new(), now);
        let event = app.coordinator.tick(now + Duration::from_millis(500));
        app.handle_coordinator_event(event);
        assert!(app.coordinator.session().is_some());

        // An external edit lands mid-drag: it must not disturb the
        // session, only apply once the gesture ends.
        let edited = SAMPLE.replace("name = \"Kitchen\"", "name = \"Pantry\"");
        std::fs::write(dir.path().join("dashboard.toml"), edited).unwrap();
        app.pending_reload = true;
        assert_eq!(app.dashboard.find_room("kitchen").unwrap().name, "Kitchen");

        let event = app.coordinator.cancel();
        app.handle_coordinator_event(event);
        assert!(!app.pending_reload);
        assert_eq!(app.dashboard.find_room("kitchen").unwrap().name, "Pantry");
    }

    #[test]
    fn test_device_drag_over_floor_tab_stays_in_device_mode() {
        let (_dir, mut app) = test_app();
        app.view = View::Room("living".to_string());
        app.enter_reorder_mode();
        assert!(matches!(app.edit_mode, EditMode::ReorderDevices { .. }));

        let now = Instant::now();
        app.coordinator
            .pointer_down(PointerPos::new(2.0, 2.0), 0, &BTreeSet::new(), now);
        let t0 = now + Duration::from_millis(500);
        let event = app.coordinator.tick(t0);
        app.handle_coordinator_event(event);
        assert!(app.coordinator.is_dragging());

        // Park the drag on a floor tab well past the hold duration.
        let tab_x = app.tab_hits[0].x_start;
        let (x, y) = app.to_grid_local(tab_x, 0);
        let event = app.coordinator.pointer_move(PointerPos::new(x, y), t0);
        app.handle_coordinator_event(event);
        let event = app.coordinator.tick(t0 + Duration::from_millis(600));
        app.handle_coordinator_event(event);

        assert!(app.coordinator.armed_target().is_none());
        assert!(matches!(app.edit_mode, EditMode::ReorderDevices { .. }));
        assert_eq!(app.view, View::Room("living".to_string()));
    }

    #[test]
    fn test_tab_migration_arms_while_scrolled() {
        let (_dir, mut app) = test_app();
        app.scroll_offset = 1;
        app.enter_reorder_mode();
        assert!(matches!(app.edit_mode, EditMode::ReorderRooms { .. }));

        let now = Instant::now();
        app.coordinator
            .pointer_down(PointerPos::new(2.0, 2.0), 0, &BTreeSet::new(), now);
        let t0 = now + Duration::from_millis(500);
        let event = app.coordinator.tick(t0);
        app.handle_coordinator_event(event);
        assert!(app.coordinator.is_dragging());

        // The pointer maps through the scrolled frame; the zone rects
        // must land in the same frame for the tab to register.
        assert_eq!(app.tab_hits[1].floor_id, "upstairs");
        let tab_x = app.tab_hits[1].x_start;
        let (x, y) = app.to_grid_local(tab_x, 0);
        let event = app.coordinator.pointer_move(PointerPos::new(x, y), t0);
        app.handle_coordinator_event(event);

        assert_eq!(app.coordinator.armed_target(), Some("upstairs"));
    }

    #[test]
    fn test_selection_does_not_survive_mode_switch() {
        let (_dir, mut app) = test_app();
        app.view = View::Room("living".to_string());
        app.enter_reorder_mode();
        app.edit_mode.selection_mut().unwrap().insert(0);

        app.exit_reorder_mode(false);
        assert_eq!(
            app.edit_mode,
            EditMode::Normal {
                selection: BTreeSet::new()
            }
        );
    }

    #[test]
    fn test_esc_restores_reorder_snapshot() {
        let (_dir, mut app) = test_app();
        app.enter_reorder_mode();
        let rooms = app.dashboard.rooms_of_mut("ground").unwrap();
        rooms.swap(0, 1);

        app.exit_reorder_mode(true);
        let ids: Vec<&str> = app
            .dashboard
            .rooms_of("ground")
            .unwrap()
            .iter()
            .map(|r| r.id.as_str())
            .collect();
        assert_eq!(ids, vec!["living", "kitchen"]);
    }
}
