//! Geometric primitives for class-diagram layout and connection routing.
//!
//! # Overview
//!
//! - [`Point`] - A 2D coordinate in canvas space
//! - [`Size`] - Width and height dimensions
//! - [`Bounds`] - A rectangle defined by minimum and maximum coordinates
//! - [`boundary_intersection`] - Where a center-to-target ray leaves a rectangle
//!
//! # Coordinate System
//!
//! The canvas uses the SVG convention:
//!
//! ```text
//!   (0,0) ────────► +X
//!     │
//!     │
//!     ▼
//!    +Y
//! ```
//!
//! Class shapes are stored by their top-left corner; connection geometry is
//! computed from shape centers.

/// A 2D point in canvas coordinates.
///
/// # Examples
///
/// ```
/// # use umlcanvas_core::geometry::Point;
/// let p1 = Point::new(10.0, 20.0);
/// let p2 = Point::new(5.0, 5.0);
///
/// let mid = p1.midpoint(p2);
/// assert_eq!(mid.x(), 7.5);
/// assert_eq!(mid.y(), 12.5);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq)]
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

    /// Creates a new point with the specified y-coordinate
    pub fn with_y(mut self, y: f32) -> Self {
        self.y = y;
        self
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

    /// Euclidean length of the point taken as a vector
    pub fn hypot(self) -> f32 {
        self.x.hypot(self.y)
    }

    /// Angle of the direction from this point toward `other`, in radians.
    pub fn angle_to(self, other: Point) -> f32 {
        (other.y - self.y).atan2(other.x - self.x)
    }

    /// Moves `distance` units from this point in the direction `angle`.
    ///
    /// Negative distances move backwards along the same direction.
    ///
    /// ```
    /// # use umlcanvas_core::geometry::Point;
    /// let moved = Point::new(10.0, 10.0).offset_polar(0.0, 5.0);
    /// assert_eq!(moved, Point::new(15.0, 10.0));
    /// ```
    pub fn offset_polar(self, angle: f32, distance: f32) -> Self {
        Self {
            x: angle.cos().mul_add(distance, self.x),
            y: angle.sin().mul_add(distance, self.y),
        }
    }

    /// Returns true when both coordinates are finite.
    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

/// Represents the dimensions of an element with width and height
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Size {
    width: f32,
    height: f32,
}

impl Size {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    /// Returns the width dimension of this size
    pub fn width(self) -> f32 {
        self.width
    }

    /// Returns the height dimension of this size
    pub fn height(self) -> f32 {
        self.height
    }
}

/// A rectangle with minimum and maximum coordinates.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Bounds {
    min_x: f32,
    min_y: f32,
    max_x: f32,
    max_y: f32,
}

impl Bounds {
    /// Creates bounds from a top-left point and a size
    pub fn new_from_top_left(top_left: Point, size: Size) -> Self {
        Self {
            min_x: top_left.x,
            min_y: top_left.y,
            max_x: top_left.x + size.width,
            max_y: top_left.y + size.height,
        }
    }

    /// Creates bounds centered on `center`
    pub fn new_from_center(center: Point, size: Size) -> Self {
        let half_width = size.width / 2.0;
        let half_height = size.height / 2.0;
        Self {
            min_x: center.x - half_width,
            min_y: center.y - half_height,
            max_x: center.x + half_width,
            max_y: center.y + half_height,
        }
    }

    pub fn min_x(self) -> f32 {
        self.min_x
    }

    pub fn min_y(self) -> f32 {
        self.min_y
    }

    pub fn max_x(self) -> f32 {
        self.max_x
    }

    pub fn max_y(self) -> f32 {
        self.max_y
    }

    pub fn width(self) -> f32 {
        self.max_x - self.min_x
    }

    pub fn height(self) -> f32 {
        self.max_y - self.min_y
    }

    /// Returns the top-left corner
    pub fn min_point(self) -> Point {
        Point::new(self.min_x, self.min_y)
    }

    /// Returns the center point of the bounds
    pub fn center(self) -> Point {
        Point::new(
            (self.min_x + self.max_x) / 2.0,
            (self.min_y + self.max_y) / 2.0,
        )
    }

    /// Smallest bounds containing both `self` and `other`.
    ///
    /// ```
    /// # use umlcanvas_core::geometry::{Bounds, Point, Size};
    /// let a = Bounds::new_from_top_left(Point::new(0.0, 0.0), Size::new(100.0, 30.0));
    /// let b = Bounds::new_from_top_left(Point::new(10.0, 40.0), Size::new(120.0, 80.0));
    ///
    /// let combined = a.merge(&b);
    /// assert_eq!(combined.width(), 130.0);
    /// assert_eq!(combined.height(), 120.0);
    /// ```
    pub fn merge(&self, other: &Self) -> Self {
        Self {
            min_x: self.min_x.min(other.min_x),
            min_y: self.min_y.min(other.min_y),
            max_x: self.max_x.max(other.max_x),
            max_y: self.max_y.max(other.max_y),
        }
    }

    /// Grows the bounds by `margin` on every side.
    pub fn expand(&self, margin: f32) -> Self {
        Self {
            min_x: self.min_x - margin,
            min_y: self.min_y - margin,
            max_x: self.max_x + margin,
            max_y: self.max_y + margin,
        }
    }

    /// Moves the bounds by the given offset.
    pub fn translate(&self, offset: Point) -> Self {
        Self {
            min_x: self.min_x + offset.x,
            min_y: self.min_y + offset.y,
            max_x: self.max_x + offset.x,
            max_y: self.max_y + offset.y,
        }
    }

    /// Returns true when the top-left corners of `self` and `other` are
    /// closer than `tolerance` on both axes.
    ///
    /// This is the loose overlap test used when placing new class boxes; it
    /// ignores the real extents of the two rectangles.
    pub fn overlaps_within(&self, other: &Self, tolerance: Size) -> bool {
        (self.min_x - other.min_x).abs() < tolerance.width
            && (self.min_y - other.min_y).abs() < tolerance.height
    }

    /// Returns true when `point` lies inside or on the edge of the bounds.
    pub fn contains(&self, point: Point) -> bool {
        point.x >= self.min_x
            && point.x <= self.max_x
            && point.y >= self.min_y
            && point.y <= self.max_y
    }
}

/// Finds where the ray from the center of `rect` toward `target` crosses the
/// rectangle's boundary.
///
/// The ray is parametrized as `center + t * (target - center)`; each of the
/// four sides yields a candidate `t`, candidates whose other coordinate falls
/// outside the side are discarded, and the smallest positive `t` wins.
///
/// When `target` coincides with the center, or the rectangle is degenerate
/// and no side is crossed, the center itself is returned.
///
/// ```
/// # use umlcanvas_core::geometry::{boundary_intersection, Bounds, Point, Size};
/// let rect = Bounds::new_from_top_left(Point::new(80.0, 80.0), Size::new(40.0, 40.0));
/// let hit = boundary_intersection(rect, Point::new(200.0, 100.0));
/// assert_eq!(hit, Point::new(120.0, 100.0));
/// ```
pub fn boundary_intersection(rect: Bounds, target: Point) -> Point {
    let center = rect.center();
    let direction = target.sub_point(center);
    let (dx, dy) = (direction.x, direction.y);

    if dx == 0.0 && dy == 0.0 {
        return center;
    }

    let mut best: Option<(f32, Point)> = None;
    let mut consider = |t: f32, point: Point| {
        if t.is_finite() && t > 0.0 && best.is_none_or(|(best_t, _)| t < best_t) {
            best = Some((t, point));
        }
    };

    if dx != 0.0 {
        for side_x in [rect.min_x, rect.max_x] {
            let t = (side_x - center.x) / dx;
            let y = dy.mul_add(t, center.y);
            if y >= rect.min_y && y <= rect.max_y {
                consider(t, Point::new(side_x, y));
            }
        }
    }

    if dy != 0.0 {
        for side_y in [rect.min_y, rect.max_y] {
            let t = (side_y - center.y) / dy;
            let x = dx.mul_add(t, center.x);
            if x >= rect.min_x && x <= rect.max_x {
                consider(t, Point::new(x, side_y));
            }
        }
    }

    best.map_or(center, |(_, point)| point)
}


#[cfg(test)]
mod proptest_tests {
    use float_cmp::approx_eq;
    use proptest::prelude::*;

    use super::*;

    fn point_strategy() -> impl Strategy<Value = Point> {
        (-1000.0f32..1000.0, -1000.0f32..1000.0).prop_map(|(x, y)| Point::new(x, y))
    }

    fn rect_strategy() -> impl Strategy<Value = Bounds> {
        (point_strategy(), 1.0f32..400.0, 1.0f32..400.0)
            .prop_map(|(top_left, w, h)| Bounds::new_from_top_left(top_left, Size::new(w, h)))
    }

    /// For targets outside the rectangle the result lies exactly on one side.
    fn check_result_on_boundary(rect: Bounds, target: Point) -> Result<(), TestCaseError> {
        prop_assume!(!rect.expand(0.5).contains(target));

        let result = boundary_intersection(rect, target);
        let eps = 0.05;

        let on_vertical_side = (approx_eq!(f32, result.x(), rect.min_x(), epsilon = eps)
            || approx_eq!(f32, result.x(), rect.max_x(), epsilon = eps))
            && result.y() >= rect.min_y() - eps
            && result.y() <= rect.max_y() + eps;
        let on_horizontal_side = (approx_eq!(f32, result.y(), rect.min_y(), epsilon = eps)
            || approx_eq!(f32, result.y(), rect.max_y(), epsilon = eps))
            && result.x() >= rect.min_x() - eps
            && result.x() <= rect.max_x() + eps;

        prop_assert!(
            on_vertical_side || on_horizontal_side,
            "Result {result:?} is not on the boundary of {rect:?} (target {target:?})"
        );
        Ok(())
    }

    fn check_result_is_finite(rect: Bounds, target: Point) -> Result<(), TestCaseError> {
        let result = boundary_intersection(rect, target);
        prop_assert!(result.is_finite(), "non-finite result {result:?}");
        Ok(())
    }

    proptest! {
        #[test]
        fn intersection_on_boundary(rect in rect_strategy(), target in point_strategy()) {
            check_result_on_boundary(rect, target)?;
        }

        #[test]
        fn intersection_is_finite(rect in rect_strategy(), target in point_strategy()) {
            check_result_is_finite(rect, target)?;
        }

        #[test]
        fn center_target_returns_center(rect in rect_strategy()) {
            let center = rect.center();
            prop_assert_eq!(boundary_intersection(rect, center), center);
        }
    }
}
