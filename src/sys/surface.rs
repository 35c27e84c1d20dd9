use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::geometry::Rect;

/// Identity of a window as assigned by the windowing system.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WindowId(u32);

impl WindowId {
    pub const fn new(raw: u32) -> WindowId { WindowId(raw) }

    pub fn get(&self) -> u32 { self.0 }
}

impl fmt::Display for WindowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "{:#x}", self.0) }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SurfaceError {
    /// The window was destroyed between the event that named it and the
    /// command issued against it.
    #[error("window {0} no longer exists")]
    Stale(WindowId),
    #[error("window {id} did not report its {attribute}")]
    Unavailable { id: WindowId, attribute: &'static str },
}

impl SurfaceError {
    pub fn is_stale(&self) -> bool { matches!(self, SurfaceError::Stale(_)) }
}

/// A handle to an on-screen window owned by the windowing system.
///
/// The core only ever borrows these. Every command may fail with
/// [`SurfaceError::Stale`] when the window went away underneath us; callers
/// drop their reference in that case instead of treating it as fatal.
pub trait Surface: fmt::Debug + Send + Sync {
    fn id(&self) -> WindowId;

    fn apply_geometry(&self, rect: Rect, border_width: u32) -> Result<(), SurfaceError>;
    fn show(&self) -> Result<(), SurfaceError>;
    fn hide(&self) -> Result<(), SurfaceError>;
    fn raise_to_top(&self) -> Result<(), SurfaceError>;
    fn focus(&self) -> Result<(), SurfaceError>;

    fn is_alive(&self) -> bool;

    /// Best-effort read of the window's current frame.
    fn geometry(&self) -> Result<Rect, SurfaceError>;
}

pub type SurfaceHandle = Arc<dyn Surface>;
