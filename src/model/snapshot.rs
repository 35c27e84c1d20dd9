//! Read-only views of the window manager state for status readers.

use serde::{Deserialize, Serialize};

use super::monitor::MonitorSet;
use super::workspace::{Window, WorkspaceSet};
use crate::layout_engine::{LayoutKind, ScratchpadRegistry, ScratchpadState};
use crate::sys::geometry::Rect;
use crate::sys::surface::WindowId;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowSnapshot {
    pub id: WindowId,
    pub title: String,
    pub class: Vec<String>,
    pub floating: bool,
    pub geometry: Option<Rect>,
}

impl From<&Window> for WindowSnapshot {
    fn from(window: &Window) -> Self {
        Self {
            id: window.id(),
            title: window.title.clone(),
            class: window.class.clone(),
            floating: window.floating,
            geometry: window.last_geometry,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkspaceSnapshot {
    pub name: String,
    pub layout: LayoutKind,
    pub focus: Option<WindowId>,
    pub windows: Vec<WindowSnapshot>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonitorSnapshot {
    pub name: String,
    pub bounds: Rect,
    pub windows: Vec<WindowId>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScratchpadSnapshot {
    pub identifier: String,
    pub state: ScratchpadState,
    pub windows: Vec<WindowId>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    pub current_workspace: usize,
    pub focused_monitor: usize,
    pub focused_window: Option<WindowId>,
    pub workspaces: Vec<WorkspaceSnapshot>,
    pub monitors: Vec<MonitorSnapshot>,
    pub scratchpads: Vec<ScratchpadSnapshot>,
}

impl Snapshot {
    pub fn capture(
        workspaces: &WorkspaceSet,
        monitors: &MonitorSet,
        scratchpads: &ScratchpadRegistry,
        focused_window: Option<WindowId>,
    ) -> Self {
        Self {
            current_workspace: workspaces.current_index(),
            focused_monitor: monitors.focused_index(),
            focused_window,
            workspaces: workspaces
                .iter()
                .map(|ws| WorkspaceSnapshot {
                    name: ws.name.clone(),
                    layout: ws.layout().current(),
                    focus: ws.focus(),
                    windows: ws.windows().iter().map(WindowSnapshot::from).collect(),
                })
                .collect(),
            monitors: monitors
                .iter()
                .map(|m| MonitorSnapshot {
                    name: m.name.clone(),
                    bounds: m.bounds,
                    windows: m.windows().to_vec(),
                })
                .collect(),
            scratchpads: scratchpads
                .identifiers()
                .map(|id| ScratchpadSnapshot {
                    identifier: id.to_string(),
                    state: scratchpads.state(id).unwrap_or(ScratchpadState::Absent),
                    windows: scratchpads.windows(id),
                })
                .collect(),
        }
    }
}
