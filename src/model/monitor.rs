use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::sys::geometry::Rect;
use crate::sys::screen::OutputProbe;
use crate::sys::surface::WindowId;

/// Name of the monitor made up when detection finds nothing usable.
pub const FALLBACK_MONITOR: &str = "default";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MonitorError {
    #[error("monitor index {index} out of range (have {len})")]
    InvalidIndex { index: usize, len: usize },
    /// Detection found no usable output. The set still holds one synthetic
    /// monitor covering the root area.
    #[error("no usable monitor detected, using the root area")]
    NoUsableMonitor,
    #[error("window {0} is not assigned to any monitor")]
    UnknownWindow(WindowId),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Monitor {
    pub name: String,
    pub bounds: Rect,
    windows: Vec<WindowId>,
}

impl Monitor {
    fn new(name: impl Into<String>, bounds: Rect) -> Self {
        Self {
            name: name.into(),
            bounds,
            windows: Vec::new(),
        }
    }

    pub fn windows(&self) -> &[WindowId] { &self.windows }
}

/// The detected monitors and which windows are rendered on each.
///
/// Never empty. Assignment here is derived from geometry; which workspace a
/// window belongs to is tracked elsewhere.
#[derive(Debug, Clone)]
pub struct MonitorSet {
    monitors: Vec<Monitor>,
    focused: usize,
}

impl MonitorSet {
    /// Detects monitors through `probe`. Detection failures are logged and
    /// leave a single synthetic monitor.
    pub fn new(probe: &dyn OutputProbe) -> Self {
        let mut set = Self {
            monitors: Vec::new(),
            focused: 0,
        };
        let _ = set.detect(probe);
        set
    }

    /// Replaces the monitor list wholesale. Window assignments are cleared;
    /// callers re-assign afterwards.
    ///
    /// Returns the number of monitors, or [`MonitorError::NoUsableMonitor`]
    /// after falling back to the root area.
    pub fn detect(&mut self, probe: &dyn OutputProbe) -> Result<usize, MonitorError> {
        let outputs = match probe.outputs() {
            Ok(outputs) => outputs,
            Err(e) => {
                warn!(%e, "output query failed");
                Vec::new()
            }
        };

        let monitors: Vec<Monitor> = outputs
            .into_iter()
            .filter(|o| {
                let usable = o.is_usable();
                if !usable {
                    debug!(name = %o.name, bounds = %o.bounds, "skipping unusable output");
                }
                usable
            })
            .map(|o| Monitor::new(o.name, o.bounds))
            .collect();

        if monitors.is_empty() {
            let root = probe.root_bounds().clamped();
            warn!(%root, "no usable monitor detected, falling back to root area");
            self.monitors = vec![Monitor::new(FALLBACK_MONITOR, root)];
            self.focused = 0;
            return Err(MonitorError::NoUsableMonitor);
        }

        for m in &monitors {
            info!(name = %m.name, bounds = %m.bounds, "monitor detected");
        }
        self.monitors = monitors;
        if self.focused >= self.monitors.len() {
            self.focused = 0;
        }
        Ok(self.monitors.len())
    }

    pub fn len(&self) -> usize { self.monitors.len() }

    pub fn is_empty(&self) -> bool { self.monitors.is_empty() }

    pub fn iter(&self) -> impl Iterator<Item = &Monitor> + '_ { self.monitors.iter() }

    pub fn get(&self, index: usize) -> Option<&Monitor> { self.monitors.get(index) }

    pub fn bounds(&self, index: usize) -> Option<Rect> { self.monitors.get(index).map(|m| m.bounds) }

    pub fn focused_index(&self) -> usize { self.focused }

    pub fn focused_bounds(&self) -> Rect { self.monitors[self.focused].bounds }

    fn check_index(&self, index: usize) -> Result<(), MonitorError> {
        if index < self.monitors.len() {
            Ok(())
        } else {
            Err(MonitorError::InvalidIndex { index, len: self.monitors.len() })
        }
    }

    pub fn focus_monitor(&mut self, index: usize) -> Result<(), MonitorError> {
        self.check_index(index)?;
        self.focused = index;
        Ok(())
    }

    /// The monitor a window with this geometry belongs on: the first one
    /// containing it fully, else the first containing its center, else
    /// monitor 0.
    pub fn assign_index(&self, geometry: Rect) -> usize {
        if let Some(i) = self.monitors.iter().position(|m| m.bounds.contains_rect(&geometry)) {
            return i;
        }
        let center = geometry.center();
        self.monitors.iter().position(|m| m.bounds.contains_point(center)).unwrap_or(0)
    }

    /// Assigns `window` from its geometry, or to the focused monitor when
    /// the geometry is unknown. Returns the monitor index.
    pub fn assign(&mut self, window: WindowId, geometry: Option<Rect>) -> usize {
        self.remove(window);
        let index = match geometry {
            Some(rect) => self.assign_index(rect),
            None => self.focused,
        };
        self.monitors[index].windows.push(window);
        debug!(%window, monitor = index, "window assigned to monitor");
        index
    }

    pub fn remove(&mut self, window: WindowId) -> Option<usize> {
        let index = self.monitor_of(window)?;
        self.monitors[index].windows.retain(|w| *w != window);
        Some(index)
    }

    pub fn monitor_of(&self, window: WindowId) -> Option<usize> {
        self.monitors.iter().position(|m| m.windows.contains(&window))
    }

    pub fn windows_on(&self, index: usize) -> &[WindowId] {
        self.monitors.get(index).map_or(&[], |m| m.windows.as_slice())
    }

    /// Moves `window` to the end of monitor `target`'s list. Returns the
    /// source and target indices.
    pub fn move_to_monitor(
        &mut self,
        window: WindowId,
        target: usize,
    ) -> Result<(usize, usize), MonitorError> {
        self.check_index(target)?;
        let source = self.monitor_of(window).ok_or(MonitorError::UnknownWindow(window))?;
        if source != target {
            self.monitors[source].windows.retain(|w| *w != window);
            self.monitors[target].windows.push(window);
            debug!(%window, from = source, to = target, "window moved to monitor");
        }
        Ok((source, target))
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::sys::headless::HeadlessDisplay;
    use crate::sys::screen::OutputInfo;

    const ROOT: Rect = Rect::new(0, 0, 3840, 1080);

    fn dual() -> (MonitorSet, HeadlessDisplay) {
        let display = HeadlessDisplay::new(ROOT);
        display.set_outputs(vec![
            OutputInfo::new("left", Rect::new(0, 0, 1920, 1080)),
            OutputInfo::new("right", Rect::new(1920, 0, 1920, 1080)),
        ]);
        (MonitorSet::new(&display), display)
    }

    #[test]
    fn test_assignment_prefers_containment_then_center() {
        let (set, _) = dual();
        assert_eq!(set.assign_index(Rect::new(100, 100, 800, 600)), 0);
        assert_eq!(set.assign_index(Rect::new(1900, 100, 800, 600)), 1);
        assert_eq!(set.assign_index(Rect::new(1000, 100, 1000, 600)), 0);
        assert_eq!(set.assign_index(Rect::new(5000, 5000, 10, 10)), 0);
    }

    #[test]
    fn test_assign_moves_between_lists() {
        let (mut set, _) = dual();
        let w = WindowId::new(1);
        assert_eq!(set.assign(w, Some(Rect::new(2000, 0, 100, 100))), 1);
        assert_eq!(set.assign(w, Some(Rect::new(0, 0, 100, 100))), 0);
        assert_eq!(set.windows_on(0), &[w]);
        assert!(set.windows_on(1).is_empty());

        set.focus_monitor(1).unwrap();
        assert_eq!(set.assign(WindowId::new(2), None), 1);
    }

    #[test]
    fn test_move_to_monitor() {
        let (mut set, _) = dual();
        let w = WindowId::new(1);
        set.assign(w, Some(Rect::new(0, 0, 100, 100)));
        assert_eq!(set.move_to_monitor(w, 1), Ok((0, 1)));
        assert_eq!(set.monitor_of(w), Some(1));
        assert_eq!(set.move_to_monitor(w, 2), Err(MonitorError::InvalidIndex { index: 2, len: 2 }));
        assert_eq!(
            set.move_to_monitor(WindowId::new(7), 0),
            Err(MonitorError::UnknownWindow(WindowId::new(7)))
        );
    }

    #[test]
    fn test_fallback_when_query_fails() {
        let display = HeadlessDisplay::without_outputs(Rect::new(0, 0, 1280, 720));
        let mut set = MonitorSet::new(&display);
        assert_eq!(set.len(), 1);
        assert_eq!(set.get(0).unwrap().name, FALLBACK_MONITOR);
        assert_eq!(set.bounds(0), Some(Rect::new(0, 0, 1280, 720)));
        assert_eq!(set.detect(&display), Err(MonitorError::NoUsableMonitor));
    }

    #[test]
    fn test_unusable_outputs_are_skipped() {
        let display = HeadlessDisplay::new(ROOT);
        display.set_outputs(vec![
            OutputInfo::new("off", Rect::new(0, 0, 0, 0)),
            OutputInfo::new("on", Rect::new(0, 0, 1920, 1080)),
        ]);
        let mut set = MonitorSet::new(&display);
        assert_eq!(set.detect(&display), Ok(1));
        assert_eq!(set.get(0).unwrap().name, "on");

        display.set_outputs(vec![OutputInfo::new("off", Rect::new(0, 0, 0, 0))]);
        assert_eq!(set.detect(&display), Err(MonitorError::NoUsableMonitor));
        assert_eq!(set.get(0).unwrap().name, FALLBACK_MONITOR);
    }

    #[test]
    fn test_redetect_clamps_focus() {
        let (mut set, display) = dual();
        set.focus_monitor(1).unwrap();
        display.set_outputs(vec![OutputInfo::new("only", Rect::new(0, 0, 1920, 1080))]);
        assert_eq!(set.detect(&display), Ok(1));
        assert_eq!(set.focused_index(), 0);
    }
}
