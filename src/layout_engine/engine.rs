use std::str::FromStr;

use strum::IntoEnumIterator;
use tracing::debug;

use super::systems::{
    FloatingLayoutSystem, LayoutKind, LayoutSystem, LayoutSystemKind, Placement,
    TabbedLayoutSystem,
};
use crate::common::config::LayoutSettings;
use crate::sys::geometry::Rect;
use crate::sys::surface::WindowId;

/// The layout selection of one workspace.
///
/// Holds one instance of every layout system so that state kept by a system
/// (floating frames, the current tab) survives cycling away and back.
#[derive(Debug, Clone)]
pub struct LayoutEngine {
    systems: Vec<LayoutSystemKind>,
    current: usize,
}

impl LayoutEngine {
    pub fn new(initial: LayoutKind, settings: &LayoutSettings) -> Self {
        let systems: Vec<_> =
            LayoutKind::iter().map(|kind| LayoutSystemKind::new(kind, settings)).collect();
        let current = systems.iter().position(|s| s.kind() == initial).unwrap_or(0);
        Self { systems, current }
    }

    pub fn current(&self) -> LayoutKind { self.systems[self.current].kind() }

    pub fn current_name(&self) -> &'static str { self.current().name() }

    pub fn set_kind(&mut self, kind: LayoutKind) {
        if let Some(idx) = self.systems.iter().position(|s| s.kind() == kind) {
            debug!(from = %self.current(), to = %kind, "layout changed");
            self.current = idx;
        }
    }

    /// Selects a layout by its configuration name. Returns `None`, leaving
    /// the selection untouched, for unknown names.
    pub fn set_layout(&mut self, name: &str) -> Option<LayoutKind> {
        let kind = LayoutKind::from_str(name).ok()?;
        self.set_kind(kind);
        Some(kind)
    }

    pub fn next_layout(&mut self) -> LayoutKind {
        self.current = (self.current + 1) % self.systems.len();
        self.current()
    }

    pub fn prev_layout(&mut self) -> LayoutKind {
        self.current = (self.current + self.systems.len() - 1) % self.systems.len();
        self.current()
    }

    /// Lays out `windows` inside `bounds` with the current layout. Every
    /// resulting rect is at least 1x1.
    pub fn calculate(&mut self, windows: &[WindowId], bounds: Rect) -> Vec<Placement> {
        let mut placements = self.systems[self.current].calculate_layout(windows, bounds);
        for placement in &mut placements {
            placement.rect = placement.rect.clamped();
        }
        placements
    }

    /// Lays out windows flagged floating with the floating system, whatever
    /// the current layout is.
    pub fn calculate_floating(&mut self, windows: &[WindowId], bounds: Rect) -> Vec<Placement> {
        let Some(floating) = self.floating_mut() else {
            return Vec::new();
        };
        let mut placements = floating.calculate_layout(windows, bounds);
        for placement in &mut placements {
            placement.rect = placement.rect.clamped();
        }
        placements
    }

    pub fn window_removed(&mut self, window: WindowId) {
        for system in &mut self.systems {
            system.on_window_removed(window);
        }
    }

    pub fn floating(&self) -> Option<&FloatingLayoutSystem> {
        self.systems.iter().find_map(|s| match s {
            LayoutSystemKind::Floating(f) => Some(f),
            _ => None,
        })
    }

    pub fn floating_mut(&mut self) -> Option<&mut FloatingLayoutSystem> {
        self.systems.iter_mut().find_map(|s| match s {
            LayoutSystemKind::Floating(f) => Some(f),
            _ => None,
        })
    }

    pub fn tabbed_mut(&mut self) -> Option<&mut TabbedLayoutSystem> {
        self.systems.iter_mut().find_map(|s| match s {
            LayoutSystemKind::Tabbed(t) => Some(t),
            _ => None,
        })
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::layout_engine::systems::test_util::windows;

    fn engine(kind: LayoutKind) -> LayoutEngine { LayoutEngine::new(kind, &LayoutSettings::default()) }

    #[test]
    fn cycles_through_every_layout_and_wraps() {
        let mut engine = engine(LayoutKind::Tile);
        let mut seen = vec![engine.current_name()];
        for _ in 0..7 {
            seen.push(engine.next_layout().name());
        }
        assert_eq!(
            seen,
            vec!["tile", "monocle", "floating", "bsp", "grid", "tabbed", "stacking", "tile"]
        );
        assert_eq!(engine.prev_layout(), LayoutKind::Stacking);
    }

    #[test]
    fn set_layout_by_name() {
        let mut engine = engine(LayoutKind::Tile);
        assert_eq!(engine.set_layout("grid"), Some(LayoutKind::Grid));
        assert_eq!(engine.set_layout("spiral"), None);
        assert_eq!(engine.current(), LayoutKind::Grid);
    }

    #[test]
    fn degenerate_bounds_are_clamped() {
        for kind in LayoutKind::iter() {
            let mut engine = engine(kind);
            for p in engine.calculate(&windows(5), Rect::new(0, 0, 0, 0)) {
                assert!(p.rect.width >= 1 && p.rect.height >= 1, "{kind}: {:?}", p.rect);
            }
        }
    }

    #[test]
    fn floating_state_survives_cycling() {
        let mut engine = engine(LayoutKind::Floating);
        let w = WindowId::new(1);
        engine.calculate(&[w], Rect::new(0, 0, 1000, 800));
        engine.floating_mut().unwrap().move_window(w, 100, 100);
        engine.next_layout();
        engine.prev_layout();
        let out = engine.calculate(&[w], Rect::new(0, 0, 1000, 800));
        assert_eq!(out[0].rect, Rect::new(150, 150, 500, 400));
    }

    #[test]
    fn floating_pass_ignores_current_layout() {
        let mut engine = engine(LayoutKind::Monocle);
        let out = engine.calculate_floating(&windows(2), Rect::new(0, 0, 1000, 800));
        assert_eq!(out.len(), 2);
        assert!(out.iter().all(|p| p.visible && p.rect == Rect::new(50, 50, 500, 400)));
    }

    #[test]
    fn removal_reaches_every_system() {
        let mut engine = engine(LayoutKind::Tile);
        let w = WindowId::new(1);
        engine.floating_mut().unwrap().store_position(w, Rect::new(0, 0, 10, 10));
        engine.window_removed(w);
        assert_eq!(engine.floating().unwrap().position(w), None);
    }
}
