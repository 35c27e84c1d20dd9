use thiserror::Error;
use tracing::{debug, trace, warn};

use crate::common::collections::HashMap;
use crate::common::config::{LayoutSettings, WorkspaceSettings};
use crate::layout_engine::{LayoutEngine, LayoutKind};
use crate::sys::geometry::Rect;
use crate::sys::surface::{SurfaceHandle, WindowId};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum WorkspaceError {
    #[error("workspace index {index} out of range (have {len})")]
    InvalidIndex { index: usize, len: usize },
    #[error("window {0} is not managed by any workspace")]
    UnknownWindow(WindowId),
    #[error("unknown layout {0:?}")]
    UnknownLayout(String),
}

/// A managed window. The surface belongs to the windowing system; this only
/// records what the core knows about it.
#[derive(Debug, Clone)]
pub struct Window {
    surface: SurfaceHandle,
    /// Placed by the floating layout whatever the workspace layout is.
    pub floating: bool,
    /// The last rect the window was rendered at.
    pub last_geometry: Option<Rect>,
    pub class: Vec<String>,
    pub title: String,
}

impl Window {
    pub fn new(surface: SurfaceHandle, class: Vec<String>, title: impl Into<String>) -> Self {
        Self {
            surface,
            floating: false,
            last_geometry: None,
            class,
            title: title.into(),
        }
    }

    pub fn id(&self) -> WindowId { self.surface.id() }

    pub fn surface(&self) -> &SurfaceHandle { &self.surface }
}

#[derive(Debug, Clone)]
pub struct Workspace {
    pub name: String,
    windows: Vec<Window>,
    layout: LayoutEngine,
    focus: Option<WindowId>,
}

impl Workspace {
    pub fn new(name: impl Into<String>, layout: LayoutEngine) -> Self {
        Self {
            name: name.into(),
            windows: Vec::new(),
            layout,
            focus: None,
        }
    }

    pub fn windows(&self) -> &[Window] { &self.windows }

    pub fn window_ids(&self) -> Vec<WindowId> { self.windows.iter().map(|w| w.id()).collect() }

    pub fn window(&self, id: WindowId) -> Option<&Window> { self.windows.iter().find(|w| w.id() == id) }

    pub fn window_mut(&mut self, id: WindowId) -> Option<&mut Window> {
        self.windows.iter_mut().find(|w| w.id() == id)
    }

    pub fn contains(&self, id: WindowId) -> bool { self.window(id).is_some() }

    pub fn len(&self) -> usize { self.windows.len() }

    pub fn is_empty(&self) -> bool { self.windows.is_empty() }

    pub fn focus(&self) -> Option<WindowId> { self.focus }

    pub fn layout(&self) -> &LayoutEngine { &self.layout }

    pub fn layout_mut(&mut self) -> &mut LayoutEngine { &mut self.layout }

    /// Appends `window` and focuses it. A window already present is left
    /// where it is.
    pub fn add_window(&mut self, window: Window) -> bool {
        let id = window.id();
        if self.contains(id) {
            return false;
        }
        self.windows.push(window);
        self.focus = Some(id);
        trace!(workspace = %self.name, window = %id, "window added");
        true
    }

    /// Removes `id`. When it held focus, focus falls back to the first
    /// remaining window.
    pub fn remove_window(&mut self, id: WindowId) -> Option<Window> {
        let index = self.windows.iter().position(|w| w.id() == id)?;
        let window = self.windows.remove(index);
        self.layout.window_removed(id);
        if self.focus == Some(id) {
            self.focus = self.windows.first().map(|w| w.id());
        }
        trace!(workspace = %self.name, window = %id, focus = ?self.focus, "window removed");
        Some(window)
    }

    pub fn set_focus(&mut self, id: WindowId) -> bool {
        if !self.contains(id) {
            return false;
        }
        self.focus = Some(id);
        true
    }

    pub fn set_layout(&mut self, name: &str) -> Result<LayoutKind, WorkspaceError> {
        self.layout
            .set_layout(name)
            .ok_or_else(|| WorkspaceError::UnknownLayout(name.to_string()))
    }
}

/// The fixed, ordered set of workspaces and the cursor of the current one.
///
/// Every managed window lives in exactly one workspace.
#[derive(Debug, Clone)]
pub struct WorkspaceSet {
    workspaces: Vec<Workspace>,
    current: usize,
    window_to_workspace: HashMap<WindowId, usize>,
}

impl WorkspaceSet {
    pub fn new(settings: &WorkspaceSettings, layout: &LayoutSettings) -> Self {
        let mut workspaces: Vec<Workspace> = settings
            .names
            .iter()
            .enumerate()
            .map(|(index, name)| {
                Workspace::new(name.clone(), LayoutEngine::new(settings.layout_for(index), layout))
            })
            .collect();

        if workspaces.is_empty() {
            warn!("No workspaces configured, creating default workspace");
            workspaces.push(Workspace::new("1", LayoutEngine::new(LayoutKind::default(), layout)));
        }

        Self {
            workspaces,
            current: 0,
            window_to_workspace: HashMap::default(),
        }
    }

    pub fn len(&self) -> usize { self.workspaces.len() }

    pub fn is_empty(&self) -> bool { self.workspaces.is_empty() }

    pub fn current_index(&self) -> usize { self.current }

    pub fn current(&self) -> &Workspace { &self.workspaces[self.current] }

    pub fn current_mut(&mut self) -> &mut Workspace { &mut self.workspaces[self.current] }

    pub fn get(&self, index: usize) -> Option<&Workspace> { self.workspaces.get(index) }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut Workspace> { self.workspaces.get_mut(index) }

    pub fn iter(&self) -> impl Iterator<Item = &Workspace> + '_ { self.workspaces.iter() }

    pub fn workspace_of(&self, id: WindowId) -> Option<usize> { self.window_to_workspace.get(&id).copied() }

    pub fn window(&self, id: WindowId) -> Option<&Window> {
        self.workspaces.get(self.workspace_of(id)?)?.window(id)
    }

    pub fn window_mut(&mut self, id: WindowId) -> Option<&mut Window> {
        let index = self.workspace_of(id)?;
        self.workspaces.get_mut(index)?.window_mut(id)
    }

    fn check_index(&self, index: usize) -> Result<(), WorkspaceError> {
        if index < self.workspaces.len() {
            Ok(())
        } else {
            Err(WorkspaceError::InvalidIndex { index, len: self.workspaces.len() })
        }
    }

    /// Makes `index` the current workspace and returns the previous one.
    pub fn switch_to(&mut self, index: usize) -> Result<usize, WorkspaceError> {
        self.check_index(index)?;
        let previous = std::mem::replace(&mut self.current, index);
        debug!(from = previous, to = index, "switched workspace");
        Ok(previous)
    }

    pub fn next_index(&self) -> usize { (self.current + 1) % self.workspaces.len() }

    pub fn prev_index(&self) -> usize { (self.current + self.workspaces.len() - 1) % self.workspaces.len() }

    /// Adds `window` to the current workspace. A window that is already
    /// managed stays where it is.
    pub fn add_window(&mut self, window: Window) -> bool {
        let id = window.id();
        if self.window_to_workspace.contains_key(&id) {
            return false;
        }
        let current = self.current;
        self.workspaces[current].add_window(window);
        self.window_to_workspace.insert(id, current);
        true
    }

    pub fn remove_window(&mut self, id: WindowId) -> Option<Window> {
        let index = self.window_to_workspace.remove(&id)?;
        self.workspaces.get_mut(index)?.remove_window(id)
    }

    /// Moves `id` to workspace `target`. Both arguments are checked before
    /// anything changes; moving to the window's own workspace is a no-op.
    /// Returns the source workspace index.
    pub fn move_window(&mut self, id: WindowId, target: usize) -> Result<usize, WorkspaceError> {
        self.check_index(target)?;
        let source = self.workspace_of(id).ok_or(WorkspaceError::UnknownWindow(id))?;
        if source == target {
            return Ok(source);
        }

        let window = self.workspaces[source]
            .remove_window(id)
            .ok_or(WorkspaceError::UnknownWindow(id))?;
        self.workspaces[target].add_window(window);
        self.window_to_workspace.insert(id, target);
        debug!(window = %id, from = source, to = target, "moved window");
        Ok(source)
    }

    /// Focuses `id` within its own workspace.
    pub fn set_focus(&mut self, id: WindowId) -> Result<usize, WorkspaceError> {
        let index = self.workspace_of(id).ok_or(WorkspaceError::UnknownWindow(id))?;
        self.workspaces[index].set_focus(id);
        Ok(index)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::sys::headless::HeadlessDisplay;

    fn setup(names: &[&str]) -> (WorkspaceSet, HeadlessDisplay) {
        let settings = WorkspaceSettings {
            names: names.iter().map(|n| n.to_string()).collect(),
            layouts: vec!["monocle".into()],
        };
        (
            WorkspaceSet::new(&settings, &LayoutSettings::default()),
            HeadlessDisplay::new(Rect::new(0, 0, 1000, 800)),
        )
    }

    fn window(display: &HeadlessDisplay, id: u32) -> Window {
        Window::new(display.create_surface(WindowId::new(id), Rect::default()), vec![], "")
    }

    #[test]
    fn test_layouts_by_index() {
        let (set, _) = setup(&["a", "b"]);
        assert_eq!(set.len(), 2);
        assert_eq!(set.get(0).unwrap().layout().current(), LayoutKind::Monocle);
        assert_eq!(set.get(1).unwrap().layout().current(), LayoutKind::Tile);
    }

    #[test]
    fn test_empty_names_yield_one_workspace() {
        let (set, _) = setup(&[]);
        assert_eq!(set.len(), 1);
        assert_eq!(set.current().name, "1");
    }

    #[test]
    fn test_add_appends_and_focuses() {
        let (mut set, display) = setup(&["a"]);
        assert!(set.add_window(window(&display, 1)));
        assert!(set.add_window(window(&display, 2)));
        assert!(!set.add_window(window(&display, 2)));
        let ws = set.current();
        assert_eq!(ws.window_ids(), vec![WindowId::new(1), WindowId::new(2)]);
        assert_eq!(ws.focus(), Some(WindowId::new(2)));
    }

    #[test]
    fn test_removing_focused_falls_back_to_first() {
        let (mut set, display) = setup(&["a"]);
        for id in 1..=3 {
            set.add_window(window(&display, id));
        }
        set.set_focus(WindowId::new(2)).unwrap();
        set.remove_window(WindowId::new(2));
        assert_eq!(set.current().focus(), Some(WindowId::new(1)));

        set.remove_window(WindowId::new(1));
        set.remove_window(WindowId::new(3));
        assert_eq!(set.current().focus(), None);
        assert!(set.remove_window(WindowId::new(3)).is_none());
    }

    #[test]
    fn test_removing_unfocused_keeps_focus() {
        let (mut set, display) = setup(&["a"]);
        for id in 1..=3 {
            set.add_window(window(&display, id));
        }
        set.remove_window(WindowId::new(1));
        assert_eq!(set.current().focus(), Some(WindowId::new(3)));
    }

    #[test]
    fn test_move_window() {
        let (mut set, display) = setup(&["a", "b"]);
        let w = WindowId::new(1);
        set.add_window(window(&display, 1));

        assert_eq!(set.move_window(w, 1), Ok(0));
        assert!(!set.get(0).unwrap().contains(w));
        assert_eq!(set.get(1).unwrap().window_ids(), vec![w]);
        assert_eq!(set.workspace_of(w), Some(1));

        assert_eq!(set.move_window(w, 1), Ok(1));
        assert_eq!(set.get(1).unwrap().window_ids(), vec![w]);
    }

    #[test]
    fn test_invalid_move_changes_nothing() {
        let (mut set, display) = setup(&["a", "b"]);
        let w = WindowId::new(1);
        set.add_window(window(&display, 1));
        assert_eq!(set.move_window(w, 5), Err(WorkspaceError::InvalidIndex { index: 5, len: 2 }));
        assert_eq!(
            set.move_window(WindowId::new(9), 1),
            Err(WorkspaceError::UnknownWindow(WindowId::new(9)))
        );
        assert_eq!(set.workspace_of(w), Some(0));
        assert_eq!(set.current().window_ids(), vec![w]);
    }

    #[test]
    fn test_switch_and_wrap() {
        let (mut set, _) = setup(&["a", "b", "c"]);
        assert_eq!(set.prev_index(), 2);
        assert_eq!(set.switch_to(2), Ok(0));
        assert_eq!(set.next_index(), 0);
        assert_eq!(set.switch_to(3), Err(WorkspaceError::InvalidIndex { index: 3, len: 3 }));
        assert_eq!(set.current_index(), 2);
    }

    #[test]
    fn test_unknown_layout_is_rejected() {
        let (mut set, _) = setup(&["a"]);
        assert_eq!(
            set.current_mut().set_layout("spiral"),
            Err(WorkspaceError::UnknownLayout("spiral".into()))
        );
        assert_eq!(set.current_mut().set_layout("grid"), Ok(LayoutKind::Grid));
    }
}
