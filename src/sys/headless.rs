//! An in-memory windowing system.
//!
//! Backs the `weft` binary's replay mode and the test suite. Surfaces record
//! every command issued against them so callers can inspect the outcome.

use std::sync::Arc;

use parking_lot::Mutex;
use tracing::trace;

use super::geometry::Rect;
use super::screen::{OutputInfo, OutputProbe, ProbeError};
use super::spawn::{SpawnCommand, SpawnError, Spawner};
use super::surface::{Surface, SurfaceError, SurfaceHandle, WindowId};
use crate::common::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SurfaceState {
    pub geometry: Rect,
    pub border_width: u32,
    pub visible: bool,
    pub alive: bool,
    pub raised: usize,
    pub configured: usize,
}

#[derive(Debug)]
pub struct HeadlessSurface {
    id: WindowId,
    state: Mutex<SurfaceState>,
    focus: Arc<Mutex<Option<WindowId>>>,
}

impl HeadlessSurface {
    pub fn state(&self) -> SurfaceState { self.state.lock().clone() }

    pub fn is_visible(&self) -> bool { self.state.lock().visible }

    pub fn frame(&self) -> Rect { self.state.lock().geometry }

    pub fn kill(&self) { self.state.lock().alive = false; }

    fn live(&self) -> Result<parking_lot::MutexGuard<'_, SurfaceState>, SurfaceError> {
        let state = self.state.lock();
        if state.alive {
            Ok(state)
        } else {
            Err(SurfaceError::Stale(self.id))
        }
    }
}

impl Surface for HeadlessSurface {
    fn id(&self) -> WindowId { self.id }

    fn apply_geometry(&self, rect: Rect, border_width: u32) -> Result<(), SurfaceError> {
        let mut state = self.live()?;
        state.geometry = rect;
        state.border_width = border_width;
        state.configured += 1;
        Ok(())
    }

    fn show(&self) -> Result<(), SurfaceError> {
        self.live()?.visible = true;
        Ok(())
    }

    fn hide(&self) -> Result<(), SurfaceError> {
        self.live()?.visible = false;
        Ok(())
    }

    fn raise_to_top(&self) -> Result<(), SurfaceError> {
        self.live()?.raised += 1;
        Ok(())
    }

    fn focus(&self) -> Result<(), SurfaceError> {
        drop(self.live()?);
        *self.focus.lock() = Some(self.id);
        Ok(())
    }

    fn is_alive(&self) -> bool { self.state.lock().alive }

    fn geometry(&self) -> Result<Rect, SurfaceError> { Ok(self.live()?.geometry) }
}

#[derive(Debug, Default)]
struct DisplayState {
    surfaces: BTreeMap<WindowId, Arc<HeadlessSurface>>,
    outputs: Option<Vec<OutputInfo>>,
    spawned: Vec<SpawnCommand>,
}

/// A fake display server. Cloning yields another handle onto the same
/// display.
#[derive(Debug, Clone)]
pub struct HeadlessDisplay {
    root: Rect,
    state: Arc<Mutex<DisplayState>>,
    focus: Arc<Mutex<Option<WindowId>>>,
}

impl HeadlessDisplay {
    /// A display with a single output covering `root`.
    pub fn new(root: Rect) -> Self {
        let display = Self::without_outputs(root);
        display.set_outputs(vec![OutputInfo::new("headless-0", root)]);
        display
    }

    /// A display whose output query reports failure until
    /// [`HeadlessDisplay::set_outputs`] is called.
    pub fn without_outputs(root: Rect) -> Self {
        Self {
            root,
            state: Arc::default(),
            focus: Arc::default(),
        }
    }

    pub fn set_outputs(&self, outputs: Vec<OutputInfo>) { self.state.lock().outputs = Some(outputs); }

    pub fn create_surface(&self, id: WindowId, geometry: Rect) -> SurfaceHandle {
        let surface = Arc::new(HeadlessSurface {
            id,
            state: Mutex::new(SurfaceState {
                geometry,
                border_width: 0,
                visible: false,
                alive: true,
                raised: 0,
                configured: 0,
            }),
            focus: self.focus.clone(),
        });
        trace!(%id, %geometry, "headless surface created");
        self.state.lock().surfaces.insert(id, surface.clone());
        surface
    }

    pub fn surface(&self, id: WindowId) -> Option<Arc<HeadlessSurface>> {
        self.state.lock().surfaces.get(&id).cloned()
    }

    /// Destroys the window without telling anybody, as happens when a client
    /// dies between an event and the command that follows it.
    pub fn kill(&self, id: WindowId) -> bool {
        match self.surface(id) {
            Some(surface) => {
                surface.kill();
                true
            }
            None => false,
        }
    }

    pub fn focused(&self) -> Option<WindowId> { *self.focus.lock() }

    pub fn spawned(&self) -> Vec<SpawnCommand> { self.state.lock().spawned.clone() }
}

impl OutputProbe for HeadlessDisplay {
    fn outputs(&self) -> Result<Vec<OutputInfo>, ProbeError> {
        self.state
            .lock()
            .outputs
            .clone()
            .ok_or_else(|| ProbeError::Query("headless display has no outputs".into()))
    }

    fn root_bounds(&self) -> Rect { self.root }
}

impl Spawner for HeadlessDisplay {
    fn spawn(&self, command: &SpawnCommand) -> Result<(), SpawnError> {
        if command.is_empty() {
            return Err(SpawnError::Empty);
        }
        self.state.lock().spawned.push(command.clone());
        Ok(())
    }
}
