//! Plane geometry for node boxes and connection lines.

use serde::{Deserialize, Serialize};

/// A point in scene coordinates.
///
/// Serialized as a two-element array `[x, y]`, the form used by `pos` in the
/// snapshot file.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(from = "[f64; 2]", into = "[f64; 2]")]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn offset(self, dx: f64, dy: f64) -> Self {
        Self::new(self.x + dx, self.y + dy)
    }

    pub fn distance_to(self, other: Point) -> f64 {
        (other.x - self.x).hypot(other.y - self.y)
    }
}

impl From<[f64; 2]> for Point {
    fn from(value: [f64; 2]) -> Self {
        Self::new(value[0], value[1])
    }
}

impl From<Point> for [f64; 2] {
    fn from(value: Point) -> Self {
        [value.x, value.y]
    }
}

/// Width and height of a node box.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

/// Axis-aligned rectangle anchored at its top-left corner.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub origin: Point,
    pub size: Size,
}

impl Rect {
    pub fn new(origin: Point, size: Size) -> Self {
        Self { origin, size }
    }

    pub fn center(&self) -> Point {
        self.origin
            .offset(self.size.width / 2.0, self.size.height / 2.0)
    }
}

/// A directed line segment, start to end.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct LineSegment {
    pub start: Point,
    pub end: Point,
}

impl LineSegment {
    pub fn new(start: Point, end: Point) -> Self {
        Self { start, end }
    }

    pub fn length(&self) -> f64 {
        self.start.distance_to(self.end)
    }

    /// A zero-length segment, produced when both endpoints share a center.
    pub fn is_degenerate(&self) -> bool {
        self.length() < f64::EPSILON
    }

    /// Direction of the segment in degrees, counter-clockwise from the +x axis
    /// with y growing downwards (screen convention), in `[0, 360)`.
    pub fn angle_degrees(&self) -> f64 {
        let dx = self.end.x - self.start.x;
        let dy = self.end.y - self.start.y;
        let angle = (-dy).atan2(dx).to_degrees();
        if angle < 0.0 { angle + 360.0 } else { angle }
    }

    /// The two wing points of an arrowhead drawn at `end`.
    ///
    /// Wings sit at +/-135 degrees from the segment direction, each
    /// `size * sqrt(2)` away from the tip.
    pub fn arrow_head(&self, size: f64) -> [Point; 2] {
        let reach = size * std::f64::consts::SQRT_2;
        let angle = self.angle_degrees();
        let wing = |deg: f64| {
            let rad = deg.to_radians();
            // Screen y points down, so the y component flips sign.
            self.end.offset(reach * rad.cos(), -reach * rad.sin())
        };
        [wing(angle - 135.0), wing(angle + 135.0)]
    }
}
