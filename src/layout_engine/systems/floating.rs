use super::{LayoutKind, LayoutSystem, Placement};
use crate::common::collections::HashMap;
use crate::sys::geometry::Rect;
use crate::sys::surface::WindowId;

/// Offset of a floating window from the bounds origin on first appearance.
const DEFAULT_OFFSET: i32 = 50;
/// Floating windows never shrink below this in either dimension.
pub const MIN_FLOATING_SIZE: i32 = 50;

/// Free placement with remembered per-window frames and edge snapping.
#[derive(Debug, Clone)]
pub struct FloatingLayoutSystem {
    positions: HashMap<WindowId, Rect>,
    snap_threshold: i32,
}

impl Default for FloatingLayoutSystem {
    fn default() -> Self { Self::new(20) }
}

impl FloatingLayoutSystem {
    pub fn new(snap_threshold: i32) -> Self {
        Self {
            positions: HashMap::default(),
            snap_threshold,
        }
    }

    pub fn position(&self, window: WindowId) -> Option<Rect> { self.positions.get(&window).copied() }

    pub fn store_position(&mut self, window: WindowId, rect: Rect) {
        self.positions.insert(window, rect);
    }

    /// Moves a remembered window. Windows that were never laid out are left
    /// alone.
    pub fn move_window(&mut self, window: WindowId, dx: i32, dy: i32) -> bool {
        match self.positions.get_mut(&window) {
            Some(rect) => {
                *rect = rect.translate(dx, dy);
                true
            }
            None => false,
        }
    }

    pub fn resize_window(&mut self, window: WindowId, dw: i32, dh: i32) -> bool {
        match self.positions.get_mut(&window) {
            Some(rect) => {
                rect.width = rect.width.saturating_add(dw).max(MIN_FLOATING_SIZE);
                rect.height = rect.height.saturating_add(dh).max(MIN_FLOATING_SIZE);
                true
            }
            None => false,
        }
    }

    fn default_position(bounds: Rect) -> Rect {
        Rect::new(
            bounds.x.saturating_add(DEFAULT_OFFSET),
            bounds.y.saturating_add(DEFAULT_OFFSET),
            bounds.width / 2,
            bounds.height / 2,
        )
    }

    /// Pulls any edge lying within the threshold of the matching bounds edge
    /// flush onto it. The left/top check runs first and the right/bottom
    /// check sees its result, so right/bottom win when both qualify.
    fn snap_to_edges(rect: &mut Rect, bounds: Rect, threshold: i32) {
        let threshold = u64::from(threshold.max(0).unsigned_abs());
        let near = |a: i32, b: i32| i64::from(a).abs_diff(i64::from(b)) < threshold;
        if near(rect.x, bounds.x) {
            rect.x = bounds.x;
        }
        if near(rect.max_x(), bounds.max_x()) {
            rect.x = bounds.max_x().saturating_sub(rect.width);
        }
        if near(rect.y, bounds.y) {
            rect.y = bounds.y;
        }
        if near(rect.max_y(), bounds.max_y()) {
            rect.y = bounds.max_y().saturating_sub(rect.height);
        }
    }
}

impl LayoutSystem for FloatingLayoutSystem {
    fn kind(&self) -> LayoutKind { LayoutKind::Floating }

    fn calculate_layout(&mut self, windows: &[WindowId], bounds: Rect) -> Vec<Placement> {
        let threshold = self.snap_threshold;
        windows
            .iter()
            .map(|&w| {
                let rect = self.positions.entry(w).or_insert_with(|| Self::default_position(bounds));
                // Snapping is written back, so it sticks across renders.
                Self::snap_to_edges(rect, bounds, threshold);
                Placement::shown(w, *rect)
            })
            .collect()
    }

    fn on_window_removed(&mut self, window: WindowId) { self.positions.remove(&window); }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    const SCREEN: Rect = Rect::new(0, 0, 1000, 800);

    #[test]
    fn first_appearance_is_half_screen_at_offset() {
        let mut floating = FloatingLayoutSystem::default();
        let out = floating.calculate_layout(&[WindowId::new(1)], SCREEN);
        assert_eq!(out[0].rect, Rect::new(50, 50, 500, 400));
        assert!(out[0].visible);
    }

    #[test]
    fn snaps_near_left_edge() {
        let mut floating = FloatingLayoutSystem::default();
        let w = WindowId::new(1);
        floating.store_position(w, Rect::new(15, 300, 200, 200));
        let out = floating.calculate_layout(&[w], SCREEN);
        assert_eq!(out[0].rect.x, 0);
        assert_eq!(floating.position(w), Some(Rect::new(0, 300, 200, 200)));
    }

    #[test]
    fn snaps_near_right_and_bottom_edges() {
        let mut floating = FloatingLayoutSystem::default();
        let w = WindowId::new(1);
        // Right edge 18 inside, bottom edge 5 past the screen.
        floating.store_position(w, Rect::new(682, 505, 300, 300));
        let out = floating.calculate_layout(&[w], SCREEN);
        assert_eq!(out[0].rect, Rect::new(700, 500, 300, 300));
    }

    #[test]
    fn right_and_bottom_win_when_both_edges_qualify() {
        let mut floating = FloatingLayoutSystem::default();
        let w = WindowId::new(1);
        floating.store_position(w, Rect::new(5, 8, 990, 785));
        let out = floating.calculate_layout(&[w], SCREEN);
        assert_eq!(out[0].rect, Rect::new(10, 15, 990, 785));
    }

    #[test]
    fn extreme_moves_and_resizes_saturate() {
        let mut floating = FloatingLayoutSystem::default();
        let w = WindowId::new(1);
        floating.store_position(w, Rect::new(200, 200, 300, 300));
        assert!(floating.move_window(w, i32::MAX, i32::MIN));
        assert_eq!(floating.position(w), Some(Rect::new(i32::MAX, i32::MIN, 300, 300)));
        assert!(floating.resize_window(w, i32::MAX, i32::MIN));
        assert_eq!(floating.position(w), Some(Rect::new(i32::MAX, i32::MIN, i32::MAX, MIN_FLOATING_SIZE)));
        // Rendering far off-screen frames must not overflow either.
        assert_eq!(floating.calculate_layout(&[w], SCREEN).len(), 1);
    }

    #[test]
    fn threshold_is_exclusive() {
        let mut floating = FloatingLayoutSystem::default();
        let w = WindowId::new(1);
        floating.store_position(w, Rect::new(20, 400, 100, 100));
        assert_eq!(floating.calculate_layout(&[w], SCREEN)[0].rect.x, 20);
    }

    #[test]
    fn snapping_is_sticky() {
        let mut floating = FloatingLayoutSystem::default();
        let w = WindowId::new(1);
        floating.store_position(w, Rect::new(10, 300, 100, 100));
        floating.calculate_layout(&[w], SCREEN);
        floating.move_window(w, 25, 0);
        // The snapped x is the base for the move; 25 is outside the threshold.
        assert_eq!(floating.calculate_layout(&[w], SCREEN)[0].rect.x, 25);
    }

    #[test]
    fn resize_has_a_floor() {
        let mut floating = FloatingLayoutSystem::default();
        let w = WindowId::new(1);
        assert!(!floating.resize_window(w, 10, 10));
        floating.store_position(w, Rect::new(200, 200, 300, 300));
        assert!(floating.resize_window(w, -1000, 40));
        assert_eq!(floating.position(w), Some(Rect::new(200, 200, 50, 340)));
    }

    #[test]
    fn removal_forgets_position() {
        let mut floating = FloatingLayoutSystem::default();
        let w = WindowId::new(1);
        floating.store_position(w, Rect::new(200, 200, 300, 300));
        floating.on_window_removed(w);
        assert_eq!(floating.position(w), None);
    }
}
