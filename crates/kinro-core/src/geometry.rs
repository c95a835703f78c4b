//! Geometric primitives for diagram layout and positioning.
//!
//! # Overview
//!
//! - [`Point`] - A 2D coordinate in diagram space
//! - [`Size`] - Width and height dimensions
//! - [`Bounds`] - A rectangular bounding box defined by minimum and maximum coordinates
//!
//! # Coordinate System
//!
//! Kinro uses a coordinate system consistent with SVG and the browser canvas
//! the backend positions were recorded on:
//!
//! ```text
//!   (0,0) ────────► +X
//!     │
//!     │
//!     ▼
//!    +Y
//! ```
//!
//! Node positions are anchored at the node's top-left corner. The origin
//! itself doubles as the "unset" sentinel for persisted class positions, see
//! [`Point::is_zero`].

use serde::{Deserialize, Serialize};

/// A 2D point representing a position in diagram coordinate space.
///
/// # Examples
///
/// ```
/// # use kinro_core::geometry::Point;
/// let p1 = Point::new(10.0, 20.0);
/// let p2 = Point::new(5.0, 5.0);
///
/// let sum = p1.add_point(p2);
/// assert_eq!(sum.x(), 15.0);
/// assert_eq!(sum.y(), 25.0);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    x: f32,
    y: f32,
}

impl Point {
    /// Creates a new point with the specified coordinates
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Returns the x-coordinate of the point
    pub fn x(self) -> f32 {
        self.x
    }

    /// Returns the y-coordinate of the point
    pub fn y(self) -> f32 {
        self.y
    }

    /// Checks if both x and y coordinates are exactly zero
    pub fn is_zero(self) -> bool {
        self.x == 0.0 && self.y == 0.0
    }

    /// Adds another point to this point, returning a new point
    pub fn add_point(self, other: Point) -> Self {
        Self {
            x: self.x + other.x,
            y: self.y + other.y,
        }
    }

    /// Subtracts another point from this point, returning a new point
    pub fn sub_point(self, other: Point) -> Self {
        Self {
            x: self.x - other.x,
            y: self.y - other.y,
        }
    }

    /// Calculates the midpoint between this point and another point
    pub fn midpoint(self, other: Point) -> Self {
        Self {
            x: (self.x + other.x) / 2.0,
            y: (self.y + other.y) / 2.0,
        }
    }
}

/// Width and height of a rectangular element.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Size {
    width: f32,
    height: f32,
}

impl Size {
    /// Creates a new size with the specified dimensions
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    /// Returns the width
    pub fn width(self) -> f32 {
        self.width
    }

    /// Returns the height
    pub fn height(self) -> f32 {
        self.height
    }

    /// Returns the offset from a box's top-left corner to its center
    pub fn half(self) -> Point {
        Point::new(self.width / 2.0, self.height / 2.0)
    }
}

/// An axis-aligned bounding box.
///
/// # Examples
///
/// ```
/// # use kinro_core::geometry::{Bounds, Point, Size};
/// let a = Bounds::new_from_top_left(Point::new(0.0, 0.0), Size::new(10.0, 10.0));
/// let b = Bounds::new_from_top_left(Point::new(20.0, 5.0), Size::new(10.0, 10.0));
///
/// let merged = a.merge(&b);
/// assert_eq!(merged.to_size(), Size::new(30.0, 15.0));
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Bounds {
    min_x: f32,
    min_y: f32,
    max_x: f32,
    max_y: f32,
}

impl Bounds {
    /// Creates bounds from a top-left corner and a size
    pub fn new_from_top_left(top_left: Point, size: Size) -> Self {
        Self {
            min_x: top_left.x(),
            min_y: top_left.y(),
            max_x: top_left.x() + size.width(),
            max_y: top_left.y() + size.height(),
        }
    }

    pub fn min_x(&self) -> f32 {
        self.min_x
    }

    pub fn min_y(&self) -> f32 {
        self.min_y
    }

    pub fn max_x(&self) -> f32 {
        self.max_x
    }

    pub fn max_y(&self) -> f32 {
        self.max_y
    }

    /// Returns the top-left corner
    pub fn min_point(&self) -> Point {
        Point::new(self.min_x, self.min_y)
    }

    /// Returns the midpoint of the top edge
    pub fn top_center(&self) -> Point {
        Point::new((self.min_x + self.max_x) / 2.0, self.min_y)
    }

    /// Returns the midpoint of the bottom edge
    pub fn bottom_center(&self) -> Point {
        Point::new((self.min_x + self.max_x) / 2.0, self.max_y)
    }

    /// Returns the smallest bounds containing both `self` and `other`
    pub fn merge(&self, other: &Bounds) -> Self {
        Self {
            min_x: self.min_x.min(other.min_x),
            min_y: self.min_y.min(other.min_y),
            max_x: self.max_x.max(other.max_x),
            max_y: self.max_y.max(other.max_y),
        }
    }

    /// Converts the bounds into its width and height
    pub fn to_size(&self) -> Size {
        Size::new(self.max_x - self.min_x, self.max_y - self.min_y)
    }
}
