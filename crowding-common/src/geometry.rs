use serde::{Deserialize, Serialize};
use std::ops::{Add, Mul, Sub};

/// A 2D vector, also used as a point in the plane.
#[derive(Debug, Copy, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Vec2 {
    pub x: f64,
    pub y: f64,
}

/// Particles and circle centers are plain positions.
pub type Point = Vec2;

impl Vec2 {
    /// Creates a new Vec2.
    pub fn new(x: f64, y: f64) -> Self {
        Vec2 { x, y }
    }

    /// Creates a zero vector.
    pub fn zero() -> Self {
        Vec2 { x: 0.0, y: 0.0 }
    }

    pub fn length_squared(&self) -> f64 {
        self.x * self.x + self.y * self.y
    }

    pub fn length(&self) -> f64 {
        self.length_squared().sqrt()
    }

    /// Calculates the squared distance to another point.
    pub fn distance_squared(&self, other: Vec2) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        dx * dx + dy * dy
    }

    /// Calculates the distance to another point.
    pub fn distance(&self, other: Vec2) -> f64 {
        self.distance_squared(other).sqrt()
    }

    pub fn scale(&self, scalar: f64) -> Self {
        Vec2 { x: self.x * scalar, y: self.y * scalar }
    }

    /// Point reflection of `self` through `pivot`: `2 * pivot - self`.
    pub fn reflect_through(&self, pivot: Vec2) -> Self {
        Vec2 {
            x: 2.0 * pivot.x - self.x,
            y: 2.0 * pivot.y - self.y,
        }
    }

    pub fn as_array(&self) -> [f64; 2] {
        [self.x, self.y]
    }
}

impl Add for Vec2 {
    type Output = Self;
    fn add(self, other: Self) -> Self {
        Self { x: self.x + other.x, y: self.y + other.y }
    }
}

impl Sub for Vec2 {
    type Output = Self;
    fn sub(self, other: Self) -> Self {
        Self { x: self.x - other.x, y: self.y - other.y }
    }
}

impl Mul<f64> for Vec2 {
    type Output = Self;
    fn mul(self, scalar: f64) -> Self {
        Self { x: self.x * scalar, y: self.y * scalar }
    }
}

/// Converts an angle (in radians) to a unit vector.
pub fn angle_to_vec(angle_rad: f64) -> Vec2 {
    Vec2::new(angle_rad.cos(), angle_rad.sin())
}

/// Euclidean distance between two points.
pub fn distance(a: Point, b: Point) -> f64 {
    a.distance(b)
}

/// A circle with its axis-aligned bounding box cached at construction.
///
/// Fields are private so the box can never drift from `center ± radius`; only the
/// center and radius are serialized.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "CircleRepr", into = "CircleRepr")]
pub struct Circle {
    center: Point,
    radius: f64,
    min_x: f64,
    min_y: f64,
    max_x: f64,
    max_y: f64,
}

#[derive(Serialize, Deserialize)]
struct CircleRepr {
    center: Point,
    radius: f64,
}

impl From<CircleRepr> for Circle {
    fn from(repr: CircleRepr) -> Self {
        Circle::new(repr.center, repr.radius)
    }
}

impl From<Circle> for CircleRepr {
    fn from(circle: Circle) -> Self {
        CircleRepr { center: circle.center, radius: circle.radius }
    }
}

impl Circle {
    pub fn new(center: Point, radius: f64) -> Self {
        Circle {
            center,
            radius,
            min_x: center.x - radius,
            min_y: center.y - radius,
            max_x: center.x + radius,
            max_y: center.y + radius,
        }
    }

    /// A circle centered on the origin.
    pub fn centered(radius: f64) -> Self {
        Circle::new(Vec2::zero(), radius)
    }

    pub fn center(&self) -> Point {
        self.center
    }

    pub fn radius(&self) -> f64 {
        self.radius
    }

    pub fn min_x(&self) -> f64 {
        self.min_x
    }

    pub fn min_y(&self) -> f64 {
        self.min_y
    }

    pub fn max_x(&self) -> f64 {
        self.max_x
    }

    pub fn max_y(&self) -> f64 {
        self.max_y
    }

    /// Area of the bounding box, `(2r)^2`.
    pub fn bounding_box_area(&self) -> f64 {
        (self.max_x - self.min_x) * (self.max_y - self.min_y)
    }

    /// Distance from the center to `point`, minus the radius.
    /// Negative inside, zero on the boundary, positive outside.
    pub fn signed_distance(&self, point: Point) -> f64 {
        self.center.distance(point) - self.radius
    }

    /// Strict interior test; boundary points are not contained.
    pub fn contains(&self, point: Point) -> bool {
        self.signed_distance(point) < 0.0
    }

    /// The point on the boundary closest to `point`.
    ///
    /// If `point` coincides with the center every boundary point is equally
    /// close and the one at angle 0 (`center + (radius, 0)`) is returned.
    pub fn nearest_boundary_point(&self, point: Point) -> Point {
        let offset = point - self.center;
        let len = offset.length();
        if len == 0.0 {
            return self.center + Vec2::new(self.radius, 0.0);
        }
        self.center + offset.scale(self.radius / len)
    }

    /// Reflects `point` through its nearest boundary point.
    /// Single bounce: the result is not re-checked against this or any other circle.
    pub fn reflect(&self, point: Point) -> Point {
        point.reflect_through(self.nearest_boundary_point(point))
    }

    /// True iff the two boundaries cross: `|r_a - r_b| < d < r_a + r_b`.
    /// Nested circles and tangent or separated circles do not intersect.
    pub fn intersects(&self, other: &Circle) -> bool {
        let d = self.center.distance(other.center);
        let radii_difference = (self.radius - other.radius).abs();
        let radii_sum = self.radius + other.radius;
        radii_difference < d && d < radii_sum
    }

    /// Uniformly parameterized point on the boundary at `angle` radians.
    pub fn boundary_point_at(&self, angle: f64) -> Point {
        self.center + angle_to_vec(angle).scale(self.radius)
    }
}

/// Free-function forms of the circle predicates.
pub fn signed_distance(circle: &Circle, point: Point) -> f64 {
    circle.signed_distance(point)
}

pub fn contains(circle: &Circle, point: Point) -> bool {
    circle.contains(point)
}

pub fn nearest_boundary_point(circle: &Circle, point: Point) -> Point {
    circle.nearest_boundary_point(point)
}

pub fn intersects(a: &Circle, b: &Circle) -> bool {
    a.intersects(b)
}
