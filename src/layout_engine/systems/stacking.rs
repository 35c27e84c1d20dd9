use super::{LayoutKind, LayoutSystem, Placement};
use crate::sys::geometry::Rect;
use crate::sys::surface::WindowId;

/// A cascade: every window is shown, each one step further down and right,
/// all sized to the bounds shrunk by two steps.
#[derive(Debug, Clone)]
pub struct StackingLayoutSystem {
    step: i32,
}

impl Default for StackingLayoutSystem {
    fn default() -> Self { Self::new(20) }
}

impl StackingLayoutSystem {
    pub fn new(step: i32) -> Self { Self { step } }
}

impl LayoutSystem for StackingLayoutSystem {
    fn kind(&self) -> LayoutKind { LayoutKind::Stacking }

    fn calculate_layout(&mut self, windows: &[WindowId], bounds: Rect) -> Vec<Placement> {
        let shrink = self.step.saturating_mul(2);
        let width = bounds.width.saturating_sub(shrink);
        let height = bounds.height.saturating_sub(shrink);
        windows
            .iter()
            .enumerate()
            .map(|(i, &w)| {
                let offset = self.step.saturating_mul(i32::try_from(i).unwrap_or(i32::MAX));
                Placement::shown(
                    w,
                    Rect::new(
                        bounds.x.saturating_add(offset),
                        bounds.y.saturating_add(offset),
                        width,
                        height,
                    ),
                )
            })
            .collect()
    }
}
