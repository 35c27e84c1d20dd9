//! The Reactor's job is to keep the model and the screen coherent.
//!
//! It takes events from the rest of the system one at a time, updates the
//! owning container (workspaces, monitors or scratchpads), then re-renders the
//! affected monitors and issues the resulting surface commands.

mod error;
mod replay;

#[cfg(test)]
mod testing;

pub use error::{IndexTarget, ReactorError};
pub use replay::{Record, ReplayEvent, read_events};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, trace, warn};

use crate::actor;
use crate::common::config::{Config, Settings};
use crate::layout_engine::{LayoutKind, LayoutSystem, ScratchpadOutcome, ScratchpadRegistry, ScratchpadState};
use crate::model::{MonitorSet, Snapshot, Window, WorkspaceSet};
use crate::sys::geometry::Rect;
use crate::sys::screen::OutputProbe;
use crate::sys::spawn::{SpawnCommand, Spawner};
use crate::sys::surface::{SurfaceHandle, WindowId};

pub type Sender = actor::Sender<Event>;
pub type Receiver = actor::Receiver<Event>;

#[derive(Debug, Clone)]
pub enum Event {
    /// A new top-level window was mapped.
    WindowAppeared {
        surface: SurfaceHandle,
        class: Vec<String>,
        title: String,
    },
    WindowGone(WindowId),
    /// The user clicked or otherwise asked to focus a window.
    WindowFocused(WindowId),
    /// Outputs were added, removed or reconfigured.
    ScreenParametersChanged,
    Command(Command),
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Command {
    NextLayout,
    PrevLayout,
    SetLayout(String),
    SwitchWorkspace(usize),
    NextWorkspace,
    PrevWorkspace,
    MoveFocusedToWorkspace(usize),
    SwitchMonitor(usize),
    MoveFocusedToMonitor(usize),
    ToggleScratchpad(String),
    CycleScratchpads,
    ToggleAllScratchpads,
    ToggleFloating,
    MoveFloating { dx: i32, dy: i32 },
    ResizeFloating { dw: i32, dh: i32 },
    SelectTab(usize),
}

pub struct Reactor {
    settings: Settings,
    workspaces: WorkspaceSet,
    monitors: MonitorSet,
    scratchpads: ScratchpadRegistry,
    probe: Box<dyn OutputProbe>,
    spawner: Box<dyn Spawner>,
    focus: Option<WindowId>,
    record: Record,
}

impl Reactor {
    pub fn new(
        config: &Config,
        probe: Box<dyn OutputProbe>,
        spawner: Box<dyn Spawner>,
        record: Record,
    ) -> Self {
        let monitors = MonitorSet::new(probe.as_ref());
        info!(
            workspaces = config.workspaces.names.len(),
            monitors = monitors.len(),
            scratchpads = config.scratchpads.len(),
            "reactor starting"
        );
        Reactor {
            settings: config.settings.clone(),
            workspaces: WorkspaceSet::new(&config.workspaces, &config.settings.layout),
            monitors,
            scratchpads: ScratchpadRegistry::new(&config.scratchpads, config.settings.border_width),
            probe,
            spawner,
            focus: None,
            record,
        }
    }

    /// Runs the configured startup commands. Failures are logged and
    /// skipped.
    pub fn run_startup_commands(&self) {
        for (i, command) in self.settings.run_on_start.iter().enumerate() {
            trace!("Executing startup command {}: {}", i + 1, command);
            if let Err(e) = self.spawner.spawn(&SpawnCommand::Line(command.clone())) {
                warn!(%e, "startup command {} failed", i + 1);
            }
        }
    }

    /// Processes events until every sender is gone, then hands the reactor
    /// back.
    pub async fn run(mut self, mut events: Receiver) -> Self {
        while let Some((span, event)) = events.recv().await {
            let _guard = span.enter();
            if let Err(e) = self.handle_event(event) {
                warn!(%e, "request rejected");
            }
        }
        self
    }

    fn log_event(&self, event: &Event) {
        match event {
            Event::WindowFocused(..) => trace!(?event, "Event"),
            _ => debug!(?event, "Event"),
        }
    }

    #[instrument(name = "reactor::handle_event", skip(self), fields(event = ?event))]
    pub fn handle_event(&mut self, event: Event) -> Result<(), ReactorError> {
        self.log_event(&event);
        self.record.on_event(&event);

        let result = match event {
            Event::WindowAppeared { surface, class, title } => {
                self.on_window_appeared(surface, class, title)
            }
            Event::WindowGone(id) => {
                self.on_window_gone(id);
                Ok(())
            }
            Event::WindowFocused(id) => self.on_window_focused(id),
            Event::ScreenParametersChanged => {
                self.on_screen_parameters_changed();
                Ok(())
            }
            Event::Command(cmd) => self.handle_command(cmd),
        };
        self.ensure_focus();
        result
    }

    pub fn handle_events(&mut self, events: impl IntoIterator<Item = Event>) {
        for event in events {
            if let Err(e) = self.handle_event(event) {
                warn!(%e, "request rejected");
            }
        }
    }

    fn handle_command(&mut self, cmd: Command) -> Result<(), ReactorError> {
        match cmd {
            Command::NextLayout => {
                let kind = self.workspaces.current_mut().layout_mut().next_layout();
                debug!(layout = %kind, "next layout");
                self.render_all();
            }
            Command::PrevLayout => {
                let kind = self.workspaces.current_mut().layout_mut().prev_layout();
                debug!(layout = %kind, "previous layout");
                self.render_all();
            }
            Command::SetLayout(name) => {
                self.workspaces.current_mut().set_layout(&name)?;
                self.render_all();
            }
            Command::SwitchWorkspace(index) => self.switch_workspace(index)?,
            Command::NextWorkspace => self.switch_workspace(self.workspaces.next_index())?,
            Command::PrevWorkspace => self.switch_workspace(self.workspaces.prev_index())?,
            Command::MoveFocusedToWorkspace(index) => self.move_focused_to_workspace(index)?,
            Command::SwitchMonitor(index) => self.switch_monitor(index)?,
            Command::MoveFocusedToMonitor(index) => self.move_focused_to_monitor(index)?,
            Command::ToggleScratchpad(identifier) => {
                let area = self.monitors.focused_bounds();
                let outcome = self.scratchpads.toggle(&identifier, area, self.spawner.as_ref())?;
                self.apply_scratchpad_outcome(outcome);
            }
            Command::CycleScratchpads => {
                let area = self.monitors.focused_bounds();
                if let Some(outcome) = self.scratchpads.cycle_next(area) {
                    self.apply_scratchpad_outcome(outcome);
                } else {
                    debug!("no scratchpad has a window to cycle to");
                }
            }
            Command::ToggleAllScratchpads => {
                let area = self.monitors.focused_bounds();
                let mut first_error = None;
                for (identifier, result) in self.scratchpads.toggle_all(area, self.spawner.as_ref()) {
                    match result {
                        Ok(outcome) => self.apply_scratchpad_outcome(outcome),
                        Err(e) => {
                            warn!(%identifier, %e, "scratchpad toggle failed");
                            first_error.get_or_insert(e);
                        }
                    }
                }
                if let Some(e) = first_error {
                    return Err(e.into());
                }
            }
            Command::ToggleFloating => self.toggle_floating(),
            Command::MoveFloating { dx, dy } => self.adjust_floating(|floating, id| {
                floating.move_window(id, dx, dy)
            }),
            Command::ResizeFloating { dw, dh } => self.adjust_floating(|floating, id| {
                floating.resize_window(id, dw, dh)
            }),
            Command::SelectTab(index) => self.select_tab(index)?,
        }
        Ok(())
    }

    fn on_window_appeared(
        &mut self,
        surface: SurfaceHandle,
        class: Vec<String>,
        title: String,
    ) -> Result<(), ReactorError> {
        let id = surface.id();
        if !surface.is_alive() {
            debug!(window = %id, "ignoring window that is already gone");
            return Ok(());
        }
        if self.workspaces.workspace_of(id).is_some() || self.scratchpads.contains_window(id) {
            trace!(window = %id, "window already managed");
            return Ok(());
        }

        if let Some(identifier) = self.scratchpads.matching(&class, &title).map(str::to_owned) {
            let area = self.monitors.focused_bounds();
            let outcome = self.scratchpads.attach(&identifier, surface, area)?;
            self.apply_scratchpad_outcome(outcome);
            return Ok(());
        }

        let geometry = match surface.geometry() {
            Ok(rect) => Some(rect),
            Err(e) => {
                debug!(window = %id, %e, "no initial geometry, using focused monitor");
                None
            }
        };
        info!(window = %id, ?class, %title, "managing window");
        self.workspaces.add_window(Window::new(surface, class, title));
        let monitor = self.monitors.assign(id, geometry);
        self.render_monitor(monitor);
        self.focus_window(id);
        Ok(())
    }

    fn on_window_gone(&mut self, id: WindowId) {
        if let Some(identifier) = self.scratchpads.detach(id) {
            debug!(window = %id, %identifier, "scratchpad window gone");
            return;
        }
        let Some(workspace) = self.workspaces.workspace_of(id) else {
            trace!(window = %id, "unmanaged window gone");
            return;
        };
        let monitor = self.monitors.remove(id);
        self.workspaces.remove_window(id);
        debug!(window = %id, workspace, "window gone");
        if workspace == self.workspaces.current_index() {
            if let Some(monitor) = monitor {
                self.render_monitor(monitor);
            }
        }
    }

    fn on_window_focused(&mut self, id: WindowId) -> Result<(), ReactorError> {
        if self.scratchpads.contains_window(id) {
            self.focus_window(id);
            return Ok(());
        }
        let workspace = self.workspaces.set_focus(id)?;
        self.focus_window(id);
        if workspace == self.workspaces.current_index() {
            if let Some(monitor) = self.monitors.monitor_of(id) {
                // The tabbed layout shows the focused window.
                self.render_monitor(monitor);
            }
        }
        Ok(())
    }

    fn on_screen_parameters_changed(&mut self) {
        if let Err(e) = self.monitors.detect(self.probe.as_ref()) {
            warn!(%e, "monitor detection fell back");
        }
        let windows: Vec<(WindowId, Option<Rect>)> = self
            .workspaces
            .iter()
            .flat_map(|ws| ws.windows())
            .map(|w| (w.id(), w.last_geometry.or_else(|| w.surface().geometry().ok())))
            .collect();
        for (id, geometry) in windows {
            self.monitors.assign(id, geometry);
        }
        self.render_all();
    }

    fn switch_workspace(&mut self, index: usize) -> Result<(), ReactorError> {
        let previous = self.workspaces.switch_to(index)?;
        if previous == index {
            return Ok(());
        }
        if self.settings.hide_inactive_workspaces {
            let ids = self.workspaces.get(previous).map(|ws| ws.window_ids()).unwrap_or_default();
            for id in ids {
                self.hide_window(id);
            }
        }
        self.render_all();
        self.refresh_focus();
        Ok(())
    }

    fn move_focused_to_workspace(&mut self, index: usize) -> Result<(), ReactorError> {
        let Some(id) = self.workspaces.current().focus() else {
            return self.check_workspace_index(index);
        };
        let source = self.workspaces.move_window(id, index)?;
        if source == index {
            return Ok(());
        }
        if self.settings.hide_inactive_workspaces {
            self.hide_window(id);
        }
        if let Some(monitor) = self.monitors.monitor_of(id) {
            self.render_monitor(monitor);
        }
        self.refresh_focus();
        Ok(())
    }

    fn check_workspace_index(&self, index: usize) -> Result<(), ReactorError> {
        if index < self.workspaces.len() {
            Ok(())
        } else {
            Err(ReactorError::InvalidIndex {
                target: IndexTarget::Workspace,
                index,
                len: self.workspaces.len(),
            })
        }
    }

    fn check_monitor_index(&self, index: usize) -> Result<(), ReactorError> {
        if index < self.monitors.len() {
            Ok(())
        } else {
            Err(ReactorError::InvalidIndex {
                target: IndexTarget::Monitor,
                index,
                len: self.monitors.len(),
            })
        }
    }

    fn switch_monitor(&mut self, index: usize) -> Result<(), ReactorError> {
        self.check_monitor_index(index)?;
        if let Err(e) = self.monitors.focus_monitor(index) {
            warn!(%e, "could not focus monitor");
        }
        if let Some(first) = self.current_windows_on(index).first().copied() {
            self.focus_window(first);
        }
        Ok(())
    }

    fn move_focused_to_monitor(&mut self, index: usize) -> Result<(), ReactorError> {
        self.check_monitor_index(index)?;
        let Some(id) = self.workspaces.current().focus() else {
            return Ok(());
        };
        let (from, to) = match self.monitors.move_to_monitor(id, index) {
            Ok(moved) => moved,
            Err(e) => {
                warn!(window = %id, %e, "could not move window between monitors");
                return Ok(());
            }
        };
        if from == to {
            return Ok(());
        }
        // Floating frames are absolute; start over on the new monitor.
        if let Some(floating) = self.workspaces.current_mut().layout_mut().floating_mut() {
            floating.on_window_removed(id);
        }
        self.render_monitor(from);
        self.render_monitor(to);
        self.focus_window(id);
        Ok(())
    }

    fn select_tab(&mut self, index: usize) -> Result<(), ReactorError> {
        let monitor = self.monitors.focused_index();
        let tiled: Vec<WindowId> = self
            .current_windows_on(monitor)
            .into_iter()
            .filter(|id| self.workspaces.window(*id).is_some_and(|w| !w.floating))
            .collect();
        let Some(&id) = tiled.get(index) else {
            return Err(ReactorError::InvalidIndex {
                target: IndexTarget::Tab,
                index,
                len: tiled.len(),
            });
        };
        self.workspaces.set_focus(id)?;
        self.render_monitor(monitor);
        self.focus_window(id);
        Ok(())
    }

    fn toggle_floating(&mut self) {
        let Some(id) = self.workspaces.current().focus() else {
            return;
        };
        let workspace = self.workspaces.current_mut();
        let Some(window) = workspace.window_mut(id) else {
            return;
        };
        window.floating = !window.floating;
        let (floating, last_geometry) = (window.floating, window.last_geometry);
        if let Some(system) = workspace.layout_mut().floating_mut() {
            match (floating, last_geometry) {
                (true, Some(rect)) => system.store_position(id, rect),
                (false, _) => system.on_window_removed(id),
                _ => {}
            }
        }
        debug!(window = %id, floating, "toggled floating");
        if let Some(monitor) = self.monitors.monitor_of(id) {
            self.render_monitor(monitor);
        }
    }

    /// Runs `adjust` on the focused window's floating frame, when the window
    /// is placed by the floating layout.
    fn adjust_floating(
        &mut self,
        adjust: impl FnOnce(&mut crate::layout_engine::FloatingLayoutSystem, WindowId) -> bool,
    ) {
        let Some(id) = self.workspaces.current().focus() else {
            return;
        };
        let workspace = self.workspaces.current_mut();
        let floating_layout = workspace.layout().current() == LayoutKind::Floating;
        let Some(window) = workspace.window(id) else {
            return;
        };
        if !floating_layout && !window.floating {
            debug!(window = %id, "not floating, ignoring floating adjustment");
            return;
        }
        let last_geometry = window.last_geometry;
        let Some(system) = workspace.layout_mut().floating_mut() else {
            return;
        };
        if system.position(id).is_none() {
            if let Some(rect) = last_geometry {
                system.store_position(id, rect);
            }
        }
        if adjust(system, id) {
            if let Some(monitor) = self.monitors.monitor_of(id) {
                self.render_monitor(monitor);
            }
        }
    }

    fn apply_scratchpad_outcome(&mut self, outcome: ScratchpadOutcome) {
        match outcome {
            ScratchpadOutcome::Shown { focus } => {
                self.focus_window(focus);
            }
            ScratchpadOutcome::Spawned | ScratchpadOutcome::Hidden | ScratchpadOutcome::Vanished => {}
        }
    }

    /// Windows of the current workspace on `monitor`, in workspace order.
    fn current_windows_on(&self, monitor: usize) -> Vec<WindowId> {
        let on_monitor = self.monitors.windows_on(monitor);
        self.workspaces
            .current()
            .windows()
            .iter()
            .map(|w| w.id())
            .filter(|id| on_monitor.contains(id))
            .collect()
    }

    fn surface_of(&self, id: WindowId) -> Option<SurfaceHandle> {
        self.workspaces
            .window(id)
            .map(|w| w.surface().clone())
            .or_else(|| self.scratchpads.surface(id).cloned())
    }

    /// Drops every reference to a window that no longer exists.
    fn forget_window(&mut self, id: WindowId) {
        warn!(window = %id, "window vanished, dropping it");
        self.workspaces.remove_window(id);
        self.monitors.remove(id);
        self.scratchpads.detach(id);
        if self.focus == Some(id) {
            self.focus = None;
        }
    }

    fn hide_window(&mut self, id: WindowId) {
        let Some(surface) = self.surface_of(id) else {
            return;
        };
        match surface.hide() {
            Ok(()) => {}
            Err(e) if e.is_stale() => self.forget_window(id),
            Err(e) => warn!(window = %id, %e, "failed to hide window"),
        }
    }

    /// Gives input focus to `id`. Returns false if the window could not take
    /// it.
    fn focus_window(&mut self, id: WindowId) -> bool {
        let Some(surface) = self.surface_of(id) else {
            return false;
        };
        match surface.focus() {
            Ok(()) => {
                trace!(window = %id, "focused");
                self.focus = Some(id);
                // Scratchpad windows take input focus without becoming the
                // workspace's focus.
                if !self.scratchpads.contains_window(id) {
                    if let Err(e) = self.workspaces.set_focus(id) {
                        warn!(window = %id, %e, "focused window is not managed");
                    }
                }
                if let Some(monitor) = self.monitors.monitor_of(id) {
                    if let Err(e) = self.monitors.focus_monitor(monitor) {
                        warn!(window = %id, %e, "could not focus the window's monitor");
                    }
                }
                true
            }
            Err(e) if e.is_stale() => {
                self.forget_window(id);
                false
            }
            Err(e) => {
                warn!(window = %id, %e, "failed to focus window");
                false
            }
        }
    }

    /// Focuses the current workspace's focused window, falling back through
    /// the workspace as windows turn out to be gone.
    fn refresh_focus(&mut self) {
        loop {
            let Some(target) = self.workspaces.current().focus() else {
                self.focus = None;
                return;
            };
            if self.focus_window(target) {
                return;
            }
            if self.workspaces.workspace_of(target).is_some() {
                // Alive but refused focus; keep it as the logical focus.
                self.focus = Some(target);
                return;
            }
        }
    }

    fn focus_is_valid(&self, id: WindowId) -> bool {
        if let Some(workspace) = self.workspaces.workspace_of(id) {
            return workspace == self.workspaces.current_index();
        }
        self.scratchpads.owner_of(id).and_then(|pad| self.scratchpads.state(pad))
            == Some(ScratchpadState::Visible)
    }

    fn ensure_focus(&mut self) {
        if self.focus.is_some_and(|id| self.focus_is_valid(id)) {
            return;
        }
        self.refresh_focus();
    }

    fn render_all(&mut self) {
        for monitor in 0..self.monitors.len() {
            self.render_monitor(monitor);
        }
    }

    /// Lays out the current workspace's windows on `monitor` and applies the
    /// result. Windows found dead along the way are dropped and the pass
    /// starts over.
    fn render_monitor(&mut self, monitor: usize) {
        while let Err(stale) = self.try_render_monitor(monitor) {
            self.forget_window(stale);
        }
    }

    fn try_render_monitor(&mut self, monitor: usize) -> Result<(), WindowId> {
        let Some(bounds) = self.monitors.bounds(monitor) else {
            return Ok(());
        };
        let border_width = self.settings.border_width;
        let ids = self.current_windows_on(monitor);

        let workspace = self.workspaces.current_mut();
        let mut tiled = Vec::new();
        let mut floating = Vec::new();
        for id in ids {
            let Some(window) = workspace.window(id) else { continue };
            if !window.surface().is_alive() {
                return Err(id);
            }
            if window.floating {
                floating.push(id);
            } else {
                tiled.push(id);
            }
        }

        let focus = workspace.focus();
        let layout = workspace.layout().current();
        if let Some(pos) = focus.and_then(|f| tiled.iter().position(|w| *w == f)) {
            if let Some(tabbed) = workspace.layout_mut().tabbed_mut() {
                tabbed.set_current_tab(pos);
            }
        }

        let mut placements = workspace.layout_mut().calculate(&tiled, bounds);
        placements.extend(workspace.layout_mut().calculate_floating(&floating, bounds));
        trace!(monitor, %layout, count = placements.len(), "rendering");

        for placement in placements {
            let Some(window) = workspace.window_mut(placement.window) else { continue };
            let surface = window.surface().clone();
            let result = if placement.visible {
                surface.apply_geometry(placement.rect, border_width).and_then(|_| surface.show())
            } else {
                surface.hide()
            };
            match result {
                Ok(()) if placement.visible => window.last_geometry = Some(placement.rect),
                Ok(()) => {}
                Err(e) if e.is_stale() => return Err(placement.window),
                Err(e) => warn!(window = %placement.window, %e, "surface command failed"),
            }
        }

        let mut raise = floating;
        if matches!(layout, LayoutKind::Floating | LayoutKind::Stacking) {
            raise.extend(focus.filter(|f| tiled.contains(f)));
        }
        for id in raise {
            let Some(window) = workspace.window(id) else { continue };
            match window.surface().raise_to_top() {
                Ok(()) => {}
                Err(e) if e.is_stale() => return Err(id),
                Err(e) => warn!(window = %id, %e, "failed to raise window"),
            }
        }
        Ok(())
    }

    pub fn current_layout_name(&self) -> &'static str { self.workspaces.current().layout().current_name() }

    /// The window holding input focus and its title.
    pub fn focused_window(&self) -> Option<(WindowId, &str)> {
        let id = self.focus?;
        if let Some(window) = self.workspaces.window(id) {
            return Some((id, window.title.as_str()));
        }
        self.scratchpads.contains_window(id).then_some((id, ""))
    }

    pub fn workspace_count(&self) -> usize { self.workspaces.len() }

    pub fn current_workspace_index(&self) -> usize { self.workspaces.current_index() }

    /// The windows of a workspace in tiling order. Empty for an unknown
    /// index.
    pub fn windows_on(&self, workspace: usize) -> Vec<WindowId> {
        self.workspaces.get(workspace).map(|ws| ws.window_ids()).unwrap_or_default()
    }

    pub fn monitor_count(&self) -> usize { self.monitors.len() }

    pub fn monitor_bounds(&self, index: usize) -> Option<Rect> { self.monitors.bounds(index) }

    pub fn scratchpad_state(&self, identifier: &str) -> Option<ScratchpadState> {
        self.scratchpads.state(identifier)
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot::capture(&self.workspaces, &self.monitors, &self.scratchpads, self.focus)
    }
}
