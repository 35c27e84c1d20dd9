use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::common::collections::{BTreeMap, btree_map};
use crate::sys::geometry::Rect;
use crate::sys::spawn::{SpawnCommand, SpawnError, Spawner};
use crate::sys::surface::{SurfaceHandle, WindowId};

/// Offset of a scratchpad from the monitor origin when no geometry is
/// configured.
const DEFAULT_OFFSET: i32 = 100;

#[derive(Serialize, Deserialize, Debug, PartialEq, Eq, Clone, Default)]
#[serde(deny_unknown_fields)]
pub struct WindowMatch {
    /// Matches when equal to any entry of the window's class list.
    #[serde(default)]
    pub class: Option<String>,
    /// Matches the window title exactly.
    #[serde(default)]
    pub title: Option<String>,
}

impl WindowMatch {
    pub fn is_empty(&self) -> bool { self.class.is_none() && self.title.is_none() }

    pub fn matches(&self, class: &[String], title: &str) -> bool {
        let by_class = self.class.as_ref().is_some_and(|want| class.iter().any(|c| c == want));
        by_class || self.title.as_deref().is_some_and(|want| want == title)
    }
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Eq, Clone)]
#[serde(deny_unknown_fields)]
pub struct ScratchpadSpec {
    pub identifier: String,
    pub command: SpawnCommand,
    #[serde(default, rename = "match")]
    pub matcher: Option<WindowMatch>,
    #[serde(default)]
    pub geometry: Option<Rect>,
    #[serde(default = "yes")]
    pub floating: bool,
}

fn yes() -> bool { true }

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ScratchpadState {
    Absent,
    Spawning,
    Visible,
    Hidden,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScratchpadOutcome {
    /// The spawn command was issued; a matching window is expected later.
    Spawned,
    Shown { focus: WindowId },
    Hidden,
    /// Every attached window turned out to be gone.
    Vanished,
}

#[derive(Debug, Error)]
pub enum ScratchpadError {
    #[error("no scratchpad named {0:?}")]
    Unmatched(String),
    #[error("could not spawn scratchpad {identifier:?}")]
    Spawn {
        identifier: String,
        #[source]
        source: SpawnError,
    },
}

#[derive(Debug)]
struct Scratchpad {
    spec: ScratchpadSpec,
    surfaces: Vec<SurfaceHandle>,
    state: ScratchpadState,
}

impl Scratchpad {
    fn new(spec: ScratchpadSpec) -> Self {
        Self {
            spec,
            surfaces: Vec::new(),
            state: ScratchpadState::Absent,
        }
    }

    fn any_alive(&self) -> bool { self.surfaces.iter().any(|s| s.is_alive()) }

    fn reap(&mut self) {
        let before = self.surfaces.len();
        self.surfaces.retain(|s| s.is_alive());
        if self.surfaces.len() != before {
            debug!(
                identifier = %self.spec.identifier,
                reaped = before - self.surfaces.len(),
                "reaped dead scratchpad windows"
            );
        }
        if self.surfaces.is_empty()
            && matches!(self.state, ScratchpadState::Visible | ScratchpadState::Hidden)
        {
            self.state = ScratchpadState::Absent;
        }
    }

    fn target_rect(&self, area: Rect) -> Rect {
        if !self.spec.floating {
            return area;
        }
        self.spec.geometry.unwrap_or(Rect::new(
            area.x + DEFAULT_OFFSET,
            area.y + DEFAULT_OFFSET,
            area.width / 2,
            area.height / 2,
        ))
    }

    fn spawn(&mut self, spawner: &dyn Spawner) -> Result<ScratchpadOutcome, ScratchpadError> {
        info!(identifier = %self.spec.identifier, command = %self.spec.command, "spawning scratchpad");
        match spawner.spawn(&self.spec.command) {
            Ok(()) => {
                self.state = ScratchpadState::Spawning;
                Ok(ScratchpadOutcome::Spawned)
            }
            Err(source) => {
                error!(identifier = %self.spec.identifier, %source, "scratchpad spawn failed");
                self.state = ScratchpadState::Absent;
                Err(ScratchpadError::Spawn {
                    identifier: self.spec.identifier.clone(),
                    source,
                })
            }
        }
    }

    fn hide(&mut self) {
        let identifier = &self.spec.identifier;
        self.surfaces.retain(|s| match s.hide() {
            Ok(()) => true,
            Err(e) if e.is_stale() => {
                debug!(%identifier, window = %s.id(), "dropping stale scratchpad window");
                false
            }
            Err(e) => {
                warn!(%identifier, window = %s.id(), %e, "failed to hide scratchpad window");
                true
            }
        });
        self.state = if self.surfaces.is_empty() {
            ScratchpadState::Absent
        } else {
            ScratchpadState::Hidden
        };
    }

    /// Shows, places and raises every attached window. Returns false when
    /// none of them could be shown.
    fn show(&mut self, area: Rect, border_width: u32) -> bool {
        let rect = self.target_rect(area).clamped();
        let identifier = &self.spec.identifier;
        self.surfaces.retain(|s| {
            let result = s
                .apply_geometry(rect, border_width)
                .and_then(|_| s.show())
                .and_then(|_| s.raise_to_top());
            match result {
                Ok(()) => true,
                Err(e) if e.is_stale() => {
                    debug!(%identifier, window = %s.id(), "dropping stale scratchpad window");
                    false
                }
                Err(e) => {
                    warn!(%identifier, window = %s.id(), %e, "failed to show scratchpad window");
                    true
                }
            }
        });
        if self.surfaces.is_empty() {
            self.state = ScratchpadState::Absent;
            false
        } else {
            self.state = ScratchpadState::Visible;
            true
        }
    }

    fn first(&self) -> Option<WindowId> { self.surfaces.first().map(|s| s.id()) }
}

/// Named, on-demand utility windows, kept apart from workspace tiling.
///
/// Dead windows are reaped lazily, on `toggle` and `cycle_next`.
#[derive(Debug, Default)]
pub struct ScratchpadRegistry {
    pads: BTreeMap<String, Scratchpad>,
    border_width: u32,
}

impl ScratchpadRegistry {
    pub fn new(specs: &[ScratchpadSpec], border_width: u32) -> Self {
        let mut pads = BTreeMap::new();
        for spec in specs {
            if spec.identifier.is_empty() {
                warn!("ignoring scratchpad without identifier");
                continue;
            }
            match pads.entry(spec.identifier.clone()) {
                btree_map::Entry::Vacant(entry) => {
                    entry.insert(Scratchpad::new(spec.clone()));
                }
                btree_map::Entry::Occupied(_) => {
                    warn!(identifier = %spec.identifier, "duplicate scratchpad identifier ignored");
                }
            }
        }
        Self { pads, border_width }
    }

    pub fn len(&self) -> usize { self.pads.len() }

    pub fn is_empty(&self) -> bool { self.pads.is_empty() }

    pub fn identifiers(&self) -> impl Iterator<Item = &str> + '_ { self.pads.keys().map(|k| k.as_str()) }

    pub fn state(&self, identifier: &str) -> Option<ScratchpadState> {
        self.pads.get(identifier).map(|p| p.state)
    }

    pub fn windows(&self, identifier: &str) -> Vec<WindowId> {
        self.pads
            .get(identifier)
            .map(|p| p.surfaces.iter().map(|s| s.id()).collect())
            .unwrap_or_default()
    }

    pub fn owner_of(&self, window: WindowId) -> Option<&str> {
        self.pads
            .iter()
            .find(|(_, p)| p.surfaces.iter().any(|s| s.id() == window))
            .map(|(id, _)| id.as_str())
    }

    pub fn contains_window(&self, window: WindowId) -> bool { self.owner_of(window).is_some() }

    pub fn surface(&self, window: WindowId) -> Option<&SurfaceHandle> {
        self.pads.values().flat_map(|p| p.surfaces.iter()).find(|s| s.id() == window)
    }

    /// The first scratchpad (in identifier order) whose match criteria
    /// accept a window with this class list and title.
    pub fn matching(&self, class: &[String], title: &str) -> Option<&str> {
        self.pads
            .iter()
            .find(|(_, p)| p.spec.matcher.as_ref().is_some_and(|m| m.matches(class, title)))
            .map(|(id, _)| id.as_str())
    }

    pub fn toggle(
        &mut self,
        identifier: &str,
        area: Rect,
        spawner: &dyn Spawner,
    ) -> Result<ScratchpadOutcome, ScratchpadError> {
        let border_width = self.border_width;
        let pad = self
            .pads
            .get_mut(identifier)
            .ok_or_else(|| ScratchpadError::Unmatched(identifier.to_string()))?;

        if !pad.any_alive() {
            pad.surfaces.clear();
            return pad.spawn(spawner);
        }

        if pad.state == ScratchpadState::Visible {
            pad.hide();
            debug!(%identifier, "scratchpad hidden");
            return Ok(ScratchpadOutcome::Hidden);
        }

        pad.reap();
        if pad.show(area, border_width) {
            let focus = pad.first().map(|focus| ScratchpadOutcome::Shown { focus });
            Ok(focus.unwrap_or(ScratchpadOutcome::Vanished))
        } else {
            pad.spawn(spawner)
        }
    }

    /// Binds a newly appeared window to `identifier` and brings the
    /// scratchpad up with the new window focused.
    pub fn attach(
        &mut self,
        identifier: &str,
        surface: SurfaceHandle,
        area: Rect,
    ) -> Result<ScratchpadOutcome, ScratchpadError> {
        let border_width = self.border_width;
        let pad = self
            .pads
            .get_mut(identifier)
            .ok_or_else(|| ScratchpadError::Unmatched(identifier.to_string()))?;

        let window = surface.id();
        if !pad.surfaces.iter().any(|s| s.id() == window) {
            pad.surfaces.push(surface);
        }
        info!(%identifier, %window, "window attached to scratchpad");

        if pad.show(area, border_width) && pad.surfaces.iter().any(|s| s.id() == window) {
            Ok(ScratchpadOutcome::Shown { focus: window })
        } else {
            Ok(pad.first().map_or(ScratchpadOutcome::Vanished, |focus| {
                ScratchpadOutcome::Shown { focus }
            }))
        }
    }

    /// Forgets a window that went away. Returns the scratchpad it belonged
    /// to.
    pub fn detach(&mut self, window: WindowId) -> Option<String> {
        let (identifier, pad) =
            self.pads.iter_mut().find(|(_, p)| p.surfaces.iter().any(|s| s.id() == window))?;
        pad.surfaces.retain(|s| s.id() != window);
        if pad.surfaces.is_empty() {
            pad.state = ScratchpadState::Absent;
        }
        debug!(%identifier, %window, "window detached from scratchpad");
        Some(identifier.clone())
    }

    /// Hides the visible scratchpad, if any, and shows the next one that has
    /// windows, in identifier order. Returns `None` when no scratchpad has
    /// any window.
    pub fn cycle_next(&mut self, area: Rect) -> Option<ScratchpadOutcome> {
        for pad in self.pads.values_mut() {
            pad.reap();
        }

        let active: Vec<String> = self
            .pads
            .iter()
            .filter(|(_, p)| !p.surfaces.is_empty())
            .map(|(id, _)| id.clone())
            .collect();
        if active.is_empty() {
            return None;
        }

        let current = active.iter().position(|id| self.state(id) == Some(ScratchpadState::Visible));
        for id in &active {
            if let Some(pad) = self.pads.get_mut(id) {
                if pad.state == ScratchpadState::Visible {
                    pad.hide();
                }
            }
        }

        let next = current.map_or(0, |i| (i + 1) % active.len());
        let border_width = self.border_width;
        let pad = self.pads.get_mut(&active[next])?;
        debug!(identifier = %active[next], "cycling to scratchpad");
        if pad.show(area, border_width) {
            pad.first().map(|focus| ScratchpadOutcome::Shown { focus })
        } else {
            Some(ScratchpadOutcome::Vanished)
        }
    }

    /// Toggles every scratchpad, in identifier order.
    pub fn toggle_all(
        &mut self,
        area: Rect,
        spawner: &dyn Spawner,
    ) -> Vec<(String, Result<ScratchpadOutcome, ScratchpadError>)> {
        let identifiers: Vec<String> = self.pads.keys().cloned().collect();
        identifiers
            .into_iter()
            .map(|id| {
                let result = self.toggle(&id, area, spawner);
                (id, result)
            })
            .collect()
    }
}
