use super::{LayoutKind, LayoutSystem, Placement};
use crate::sys::geometry::Rect;
use crate::sys::surface::WindowId;

/// One window at a time, below a strip reserved for tab titles.
#[derive(Debug, Clone)]
pub struct TabbedLayoutSystem {
    current_tab: usize,
    tab_bar_height: i32,
}

impl Default for TabbedLayoutSystem {
    fn default() -> Self { Self::new(20) }
}

impl TabbedLayoutSystem {
    pub fn new(tab_bar_height: i32) -> Self { Self { current_tab: 0, tab_bar_height } }

    pub fn current_tab(&self) -> usize { self.current_tab }

    pub fn set_current_tab(&mut self, index: usize) { self.current_tab = index; }
}

impl LayoutSystem for TabbedLayoutSystem {
    fn kind(&self) -> LayoutKind { LayoutKind::Tabbed }

    fn calculate_layout(&mut self, windows: &[WindowId], bounds: Rect) -> Vec<Placement> {
        if windows.is_empty() {
            return Vec::new();
        }
        let shown = self.current_tab.min(windows.len() - 1);
        let content = Rect::new(
            bounds.x,
            bounds.y.saturating_add(self.tab_bar_height),
            bounds.width,
            bounds.height.saturating_sub(self.tab_bar_height),
        );
        windows
            .iter()
            .enumerate()
            .map(|(i, &w)| {
                if i == shown {
                    Placement::shown(w, content)
                } else {
                    Placement::hidden(w, content)
                }
            })
            .collect()
    }
}
