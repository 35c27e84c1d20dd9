use super::{LayoutKind, LayoutSystem, Placement};
use crate::sys::geometry::Rect;
use crate::sys::surface::WindowId;

/// Master on the left half, the rest stacked top to bottom on the right.
#[derive(Debug, Clone, Default)]
pub struct TileLayoutSystem {}

impl LayoutSystem for TileLayoutSystem {
    fn kind(&self) -> LayoutKind { LayoutKind::Tile }

    fn calculate_layout(&mut self, windows: &[WindowId], bounds: Rect) -> Vec<Placement> {
        let Some((&master, stack)) = windows.split_first() else {
            return Vec::new();
        };
        if stack.is_empty() {
            return vec![Placement::shown(master, bounds)];
        }

        let master_width = bounds.width / 2;
        let stack_width = bounds.width - master_width;
        let rows = stack.len() as i32;
        let row_height = bounds.height / rows;

        let mut out = Vec::with_capacity(windows.len());
        out.push(Placement::shown(
            master,
            Rect::new(bounds.x, bounds.y, master_width, bounds.height),
        ));
        for (i, &window) in stack.iter().enumerate() {
            let i = i as i32;
            // The last row absorbs the rounding remainder.
            let height = if i == rows - 1 {
                bounds.height - row_height * (rows - 1)
            } else {
                row_height
            };
            out.push(Placement::shown(
                window,
                Rect::new(bounds.x + master_width, bounds.y + i * row_height, stack_width, height),
            ));
        }
        out
    }
}
