// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Geometric primitives carried by entities.
//!
//! Only what the graph engine needs: positions for node-like entities and
//! connecting curves for links. Distance queries go through nalgebra.

use nalgebra::{Point3, Vector3};
use serde::{Deserialize, Serialize};

/// A point in 3D space.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Returns the point as a nalgebra `Point3`.
    pub fn to_point3(&self) -> Point3<f64> {
        Point3::new(self.x, self.y, self.z)
    }

    /// Euclidean distance to another point.
    pub fn distance(&self, other: &Point) -> f64 {
        nalgebra::distance(&self.to_point3(), &other.to_point3())
    }

    /// Squared Euclidean distance to another point.
    pub fn distance_squared(&self, other: &Point) -> f64 {
        nalgebra::distance_squared(&self.to_point3(), &other.to_point3())
    }
}

impl From<Point3<f64>> for Point {
    fn from(p: Point3<f64>) -> Self {
        Self::new(p.x, p.y, p.z)
    }
}

impl From<[f64; 3]> for Point {
    fn from(c: [f64; 3]) -> Self {
        Self::new(c[0], c[1], c[2])
    }
}

/// A connecting curve between two positions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Curve {
    /// Straight segment.
    Line { start: Point, end: Point },
    /// Ordered chain of straight segments.
    Polyline { points: Vec<Point> },
}

impl Curve {
    /// Creates a straight line between two points.
    pub fn line(start: Point, end: Point) -> Self {
        Curve::Line { start, end }
    }

    /// First point of the curve. `None` for an empty polyline.
    pub fn start_point(&self) -> Option<Point> {
        match self {
            Curve::Line { start, .. } => Some(*start),
            Curve::Polyline { points } => points.first().copied(),
        }
    }

    /// Last point of the curve. `None` for an empty polyline.
    pub fn end_point(&self) -> Option<Point> {
        match self {
            Curve::Line { end, .. } => Some(*end),
            Curve::Polyline { points } => points.last().copied(),
        }
    }

    /// Total length of the curve.
    pub fn length(&self) -> f64 {
        self.segments().map(|(a, b)| a.distance(&b)).sum()
    }

    /// Returns the same curve traversed in the opposite direction.
    pub fn reversed(&self) -> Self {
        match self {
            Curve::Line { start, end } => Curve::Line {
                start: *end,
                end: *start,
            },
            Curve::Polyline { points } => Curve::Polyline {
                points: points.iter().rev().copied().collect(),
            },
        }
    }

    /// Shortest distance from `point` to any segment of the curve.
    pub fn distance_to(&self, point: &Point) -> f64 {
        let mut best = f64::INFINITY;
        for (a, b) in self.segments() {
            best = best.min(segment_distance(&a, &b, point));
        }
        if best.is_infinite() {
            // Single-point polyline
            if let Some(p) = self.start_point() {
                return p.distance(point);
            }
        }
        best
    }

    fn segments(&self) -> Box<dyn Iterator<Item = (Point, Point)> + '_> {
        match self {
            Curve::Line { start, end } => Box::new(std::iter::once((*start, *end))),
            Curve::Polyline { points } => Box::new(points.windows(2).map(|w| (w[0], w[1]))),
        }
    }
}

/// Distance from `p` to the segment `a`-`b`.
fn segment_distance(a: &Point, b: &Point, p: &Point) -> f64 {
    let a3 = a.to_point3();
    let ab: Vector3<f64> = b.to_point3() - a3;
    let ap: Vector3<f64> = p.to_point3() - a3;
    let len_sq = ab.norm_squared();
    if len_sq < 1e-30 {
        return ap.norm();
    }
    let t = (ap.dot(&ab) / len_sq).clamp(0.0, 1.0);
    let closest = a3 + ab * t;
    nalgebra::distance(&closest, &p.to_point3())
}

/// Geometry an entity can expose.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Geometry {
    Point(Point),
    Curve(Curve),
}

impl Geometry {
    /// Shortest distance from this geometry to a point.
    pub fn distance_to(&self, point: &Point) -> f64 {
        match self {
            Geometry::Point(p) => p.distance(point),
            Geometry::Curve(c) => c.distance_to(point),
        }
    }

    /// Returns the point if this geometry is a point.
    pub fn as_point(&self) -> Option<&Point> {
        match self {
            Geometry::Point(p) => Some(p),
            Geometry::Curve(_) => None,
        }
    }
}

/// Axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min: Point,
    pub max: Point,
}

impl BoundingBox {
    /// Creates a box from two corners, normalizing min/max per axis.
    pub fn new(a: Point, b: Point) -> Self {
        Self {
            min: Point::new(a.x.min(b.x), a.y.min(b.y), a.z.min(b.z)),
            max: Point::new(a.x.max(b.x), a.y.max(b.y), a.z.max(b.z)),
        }
    }

    /// Returns `true` if the point lies inside or on the box.
    pub fn contains(&self, p: &Point) -> bool {
        p.x >= self.min.x
            && p.x <= self.max.x
            && p.y >= self.min.y
            && p.y <= self.max.y
            && p.z >= self.min.z
            && p.z <= self.max.z
    }

    /// Extent of the box along each axis.
    pub fn size(&self) -> [f64; 3] {
        [
            self.max.x - self.min.x,
            self.max.y - self.min.y,
            self.max.z - self.min.z,
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn point_distance() {
        let a = Point::new(0.0, 0.0, 0.0);
        let b = Point::new(3.0, 4.0, 0.0);
        assert_relative_eq!(a.distance(&b), 5.0);
        assert_relative_eq!(a.distance_squared(&b), 25.0);
    }

    #[test]
    fn line_endpoints_and_length() {
        let c = Curve::line(Point::new(0.0, 0.0, 0.0), Point::new(0.0, 2.0, 0.0));
        assert_eq!(c.start_point(), Some(Point::new(0.0, 0.0, 0.0)));
        assert_eq!(c.end_point(), Some(Point::new(0.0, 2.0, 0.0)));
        assert_relative_eq!(c.length(), 2.0);
    }

    #[test]
    fn polyline_length_and_reverse() {
        let c = Curve::Polyline {
            points: vec![
                Point::new(0.0, 0.0, 0.0),
                Point::new(1.0, 0.0, 0.0),
                Point::new(1.0, 1.0, 0.0),
            ],
        };
        assert_relative_eq!(c.length(), 2.0);
        let r = c.reversed();
        assert_eq!(r.start_point(), Some(Point::new(1.0, 1.0, 0.0)));
        assert_eq!(r.end_point(), Some(Point::new(0.0, 0.0, 0.0)));
    }

    #[test]
    fn empty_polyline_has_no_endpoints() {
        let c = Curve::Polyline { points: vec![] };
        assert!(c.start_point().is_none());
        assert!(c.distance_to(&Point::default()).is_infinite());
    }

    #[test]
    fn curve_distance_projects_onto_segment() {
        let c = Curve::line(Point::new(0.0, 0.0, 0.0), Point::new(10.0, 0.0, 0.0));
        assert_relative_eq!(c.distance_to(&Point::new(5.0, 2.0, 0.0)), 2.0);
        // Beyond the end: distance to the endpoint
        assert_relative_eq!(c.distance_to(&Point::new(13.0, 4.0, 0.0)), 5.0);
    }

    #[test]
    fn bounding_box_normalizes_corners() {
        let bb = BoundingBox::new(Point::new(5.0, 0.0, 2.0), Point::new(0.0, 5.0, 0.0));
        assert_eq!(bb.min, Point::new(0.0, 0.0, 0.0));
        assert_eq!(bb.max, Point::new(5.0, 5.0, 2.0));
        assert!(bb.contains(&Point::new(1.0, 1.0, 1.0)));
        assert!(!bb.contains(&Point::new(6.0, 1.0, 1.0)));
        assert_eq!(bb.size(), [5.0, 5.0, 2.0]);
    }
}
