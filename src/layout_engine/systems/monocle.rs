use super::{LayoutKind, LayoutSystem, Placement};
use crate::sys::geometry::Rect;
use crate::sys::surface::WindowId;

/// The first window fills the bounds; every other window is hidden.
#[derive(Debug, Clone, Default)]
pub struct MonocleLayoutSystem {}

impl LayoutSystem for MonocleLayoutSystem {
    fn kind(&self) -> LayoutKind { LayoutKind::Monocle }

    fn calculate_layout(&mut self, windows: &[WindowId], bounds: Rect) -> Vec<Placement> {
        windows
            .iter()
            .enumerate()
            .map(|(i, &w)| {
                if i == 0 {
                    Placement::shown(w, bounds)
                } else {
                    Placement::hidden(w, bounds)
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout_engine::systems::test_util::windows;

    #[test]
    fn only_the_first_window_is_visible() {
        let bounds = Rect::new(0, 0, 1280, 720);
        let out = MonocleLayoutSystem::default().calculate_layout(&windows(4), bounds);
        assert_eq!(out.iter().filter(|p| p.visible).count(), 1);
        assert_eq!(out[0], Placement::shown(WindowId::new(1), bounds));
        assert!(out[1..].iter().all(|p| !p.visible));
    }
}
