use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::geometry::Rect;

/// One output as reported by the windowing system.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputInfo {
    pub name: String,
    pub bounds: Rect,
}

impl OutputInfo {
    pub fn new(name: impl Into<String>, bounds: Rect) -> Self {
        Self { name: name.into(), bounds }
    }

    /// Disabled outputs are still listed by some servers, with a zero sized
    /// mode.
    pub fn is_usable(&self) -> bool { !self.bounds.is_degenerate() }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ProbeError {
    #[error("output query failed: {0}")]
    Query(String),
}

/// Source of display geometry.
pub trait OutputProbe {
    /// The currently active outputs. The first one is treated as primary.
    fn outputs(&self) -> Result<Vec<OutputInfo>, ProbeError>;

    /// The area of the root window, used when no usable output is reported.
    fn root_bounds(&self) -> Rect;
}
