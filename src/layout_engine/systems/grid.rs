use super::{LayoutKind, LayoutSystem, Placement};
use crate::sys::geometry::Rect;
use crate::sys::surface::WindowId;

/// Returns `(cols, rows)` for `n` windows: `cols = floor(sqrt(n))`,
/// `rows = ceil(n / cols)`.
pub fn grid_dimensions(n: usize) -> (usize, usize) {
    if n == 0 {
        return (0, 0);
    }
    let mut cols = (n as f64).sqrt() as usize;
    // Guard against float rounding on perfect squares.
    while (cols + 1) * (cols + 1) <= n {
        cols += 1;
    }
    while cols * cols > n {
        cols -= 1;
    }
    let cols = cols.max(1);
    (cols, n.div_ceil(cols))
}

#[derive(Debug, Clone, Default)]
pub struct GridLayoutSystem {}

impl LayoutSystem for GridLayoutSystem {
    fn kind(&self) -> LayoutKind { LayoutKind::Grid }

    fn calculate_layout(&mut self, windows: &[WindowId], bounds: Rect) -> Vec<Placement> {
        let (cols, rows) = grid_dimensions(windows.len());
        if cols == 0 {
            return Vec::new();
        }
        let cell_w = bounds.width / cols as i32;
        let cell_h = bounds.height / rows as i32;

        windows
            .iter()
            .enumerate()
            .map(|(i, &w)| {
                let col = (i % cols) as i32;
                let row = (i / cols) as i32;
                Placement::shown(
                    w,
                    Rect::new(bounds.x + col * cell_w, bounds.y + row * cell_h, cell_w, cell_h),
                )
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::layout_engine::systems::test_util::windows;

    #[test]
    fn dimensions() {
        assert_eq!(grid_dimensions(1), (1, 1));
        assert_eq!(grid_dimensions(3), (1, 3));
        assert_eq!(grid_dimensions(4), (2, 2));
        assert_eq!(grid_dimensions(5), (2, 3));
        assert_eq!(grid_dimensions(9), (3, 3));
        assert_eq!(grid_dimensions(10), (3, 4));
    }

    #[test]
    fn places_row_major() {
        let out = GridLayoutSystem::default().calculate_layout(&windows(5), Rect::new(0, 0, 800, 600));
        let rects: Vec<_> = out.iter().map(|p| p.rect).collect();
        assert_eq!(
            rects,
            vec![
                Rect::new(0, 0, 400, 200),
                Rect::new(400, 0, 400, 200),
                Rect::new(0, 200, 400, 200),
                Rect::new(400, 200, 400, 200),
                Rect::new(0, 400, 400, 200),
            ]
        );
    }
}
