use super::{LayoutKind, LayoutSystem, Placement};
use crate::layout_engine::Orientation;
use crate::sys::geometry::Rect;
use crate::sys::surface::WindowId;

/// Binary space partitioning over the window order.
///
/// Each level halves its area, alternating the split axis, and hands the
/// larger half of the window list (`ceil(k/2)`) to the first child. The root
/// split places its children side by side.
#[derive(Debug, Clone, Default)]
pub struct BspLayoutSystem {}

impl BspLayoutSystem {
    fn calculate_layout_recursive(
        windows: &[WindowId],
        rect: Rect,
        orientation: Orientation,
        out: &mut Vec<Placement>,
    ) {
        match windows.len() {
            0 => {}
            1 => out.push(Placement::shown(windows[0], rect)),
            k => {
                let (first, second) = windows.split_at(k.div_ceil(2));
                let (r1, r2) = match orientation {
                    Orientation::Horizontal => {
                        let first_w = rect.width / 2;
                        (
                            Rect::new(rect.x, rect.y, first_w, rect.height),
                            Rect::new(rect.x + first_w, rect.y, rect.width - first_w, rect.height),
                        )
                    }
                    Orientation::Vertical => {
                        let first_h = rect.height / 2;
                        (
                            Rect::new(rect.x, rect.y, rect.width, first_h),
                            Rect::new(rect.x, rect.y + first_h, rect.width, rect.height - first_h),
                        )
                    }
                };
                Self::calculate_layout_recursive(first, r1, orientation.flip(), out);
                Self::calculate_layout_recursive(second, r2, orientation.flip(), out);
            }
        }
    }
}

impl LayoutSystem for BspLayoutSystem {
    fn kind(&self) -> LayoutKind { LayoutKind::Bsp }

    fn calculate_layout(&mut self, windows: &[WindowId], bounds: Rect) -> Vec<Placement> {
        let mut out = Vec::with_capacity(windows.len());
        Self::calculate_layout_recursive(windows, bounds, Orientation::Horizontal, &mut out);
        out
    }
}
