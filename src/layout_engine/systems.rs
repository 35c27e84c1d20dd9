use enum_dispatch::enum_dispatch;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoStaticStr};

use crate::common::config::LayoutSettings;
use crate::sys::geometry::Rect;
use crate::sys::surface::WindowId;

/// Where one window goes, and whether it is shown at all.
///
/// Hidden placements still carry the rect the window would occupy; the
/// caller only hides them.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Placement {
    pub window: WindowId,
    pub rect: Rect,
    pub visible: bool,
}

impl Placement {
    pub fn shown(window: WindowId, rect: Rect) -> Self { Self { window, rect, visible: true } }

    pub fn hidden(window: WindowId, rect: Rect) -> Self { Self { window, rect, visible: false } }
}

/// The closed set of layout algorithms, in cycling order.
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumIter,
    EnumString,
    IntoStaticStr
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum LayoutKind {
    #[default]
    Tile,
    Monocle,
    Floating,
    Bsp,
    Grid,
    Tabbed,
    Stacking,
}

impl LayoutKind {
    pub fn name(self) -> &'static str { self.into() }
}

#[enum_dispatch]
pub trait LayoutSystem {
    fn kind(&self) -> LayoutKind;

    /// Computes one placement per window, in window order.
    ///
    /// Never fails. An empty window list yields no placements. Sizes may come
    /// out degenerate for tiny bounds; [`super::LayoutEngine`] clamps them.
    fn calculate_layout(&mut self, windows: &[WindowId], bounds: Rect) -> Vec<Placement>;

    fn on_window_removed(&mut self, _window: WindowId) {}
}

mod bsp;
mod floating;
mod grid;
mod monocle;
mod stacking;
mod tabbed;
mod tile;

pub use bsp::BspLayoutSystem;
pub use floating::{FloatingLayoutSystem, MIN_FLOATING_SIZE};
pub use grid::{GridLayoutSystem, grid_dimensions};
pub use monocle::MonocleLayoutSystem;
pub use stacking::StackingLayoutSystem;
pub use tabbed::TabbedLayoutSystem;
pub use tile::TileLayoutSystem;

#[derive(Debug, Clone)]
#[enum_dispatch(LayoutSystem)]
pub enum LayoutSystemKind {
    Tile(TileLayoutSystem),
    Monocle(MonocleLayoutSystem),
    Floating(FloatingLayoutSystem),
    Bsp(BspLayoutSystem),
    Grid(GridLayoutSystem),
    Tabbed(TabbedLayoutSystem),
    Stacking(StackingLayoutSystem),
}

impl LayoutSystemKind {
    pub fn new(kind: LayoutKind, settings: &LayoutSettings) -> Self {
        match kind {
            LayoutKind::Tile => TileLayoutSystem::default().into(),
            LayoutKind::Monocle => MonocleLayoutSystem::default().into(),
            LayoutKind::Floating => FloatingLayoutSystem::new(settings.snap_threshold).into(),
            LayoutKind::Bsp => BspLayoutSystem::default().into(),
            LayoutKind::Grid => GridLayoutSystem::default().into(),
            LayoutKind::Tabbed => TabbedLayoutSystem::new(settings.tab_bar_height).into(),
            LayoutKind::Stacking => StackingLayoutSystem::new(settings.stack_offset).into(),
        }
    }
}
