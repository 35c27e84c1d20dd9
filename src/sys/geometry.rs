use serde::{Deserialize, Serialize};

/// Smallest width or height ever handed to a surface.
pub const MIN_DIMENSION: i32 = 1;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub const fn new(x: i32, y: i32) -> Self { Self { x, y } }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl Rect {
    pub const fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self { x, y, width, height }
    }

    pub fn max_x(&self) -> i32 { self.x.saturating_add(self.width) }

    pub fn max_y(&self) -> i32 { self.y.saturating_add(self.height) }

    pub fn center(&self) -> Point {
        Point::new(self.x.saturating_add(self.width / 2), self.y.saturating_add(self.height / 2))
    }

    pub fn is_degenerate(&self) -> bool { self.width <= 0 || self.height <= 0 }

    /// Half-open containment: the right and bottom edges belong to the
    /// neighbouring area.
    pub fn contains_point(&self, point: Point) -> bool {
        point.x >= self.x && point.y >= self.y && point.x < self.max_x() && point.y < self.max_y()
    }

    pub fn contains_rect(&self, other: &Rect) -> bool {
        other.x >= self.x
            && other.y >= self.y
            && other.max_x() <= self.max_x()
            && other.max_y() <= self.max_y()
    }

    /// Returns the rect with width and height raised to at least
    /// [`MIN_DIMENSION`]; the origin is left untouched.
    pub fn clamped(self) -> Rect {
        Rect {
            width: self.width.max(MIN_DIMENSION),
            height: self.height.max(MIN_DIMENSION),
            ..self
        }
    }

    pub fn translate(self, dx: i32, dy: i32) -> Rect {
        Rect {
            x: self.x.saturating_add(dx),
            y: self.y.saturating_add(dy),
            ..self
        }
    }
}

impl std::fmt::Display for Rect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}+{}+{}", self.width, self.height, self.x, self.y)
    }
}
