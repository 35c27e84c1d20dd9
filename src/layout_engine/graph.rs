use serde::{Deserialize, Serialize};

/// Axis along which a split lays out its two children.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Orientation {
    /// Children side by side.
    Horizontal,
    /// Children one above the other.
    Vertical,
}

impl Orientation {
    pub fn flip(self) -> Self {
        match self {
            Orientation::Horizontal => Orientation::Vertical,
            Orientation::Vertical => Orientation::Horizontal,
        }
    }
}
