pub mod engine;
pub(crate) mod graph;
pub mod scratchpad;
pub mod systems;

pub use engine::LayoutEngine;
pub use graph::Orientation;
pub use scratchpad::{ScratchpadOutcome, ScratchpadRegistry, ScratchpadSpec, ScratchpadState};
pub use systems::{
    FloatingLayoutSystem, LayoutKind, LayoutSystem, LayoutSystemKind, Placement,
    TabbedLayoutSystem,
};
