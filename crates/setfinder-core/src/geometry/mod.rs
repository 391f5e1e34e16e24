//! Corner geometry for card and symbol outlines
//!
//! `Point` and `Quad` are plain values. Every operation returns a new quad;
//! nothing is rescaled in place.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GeometryError {
    #[error("a quad needs exactly 4 vertices, got {0}")]
    VertexCount(usize),
}

/// A 2D image coordinate, x to the right and y down
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    fn sum(&self) -> f64 {
        self.x + self.y
    }

    fn diff(&self) -> f64 {
        self.x - self.y
    }

    /// Total order on coordinates, used to break ties
    fn cmp_xy(&self, other: &Point) -> Ordering {
        self.x
            .total_cmp(&other.x)
            .then_with(|| self.y.total_cmp(&other.y))
    }
}

/// Target orientation for `Quad::rectify`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Orientation {
    /// Wider than tall (whole cards)
    Landscape,
    /// Taller than wide (single symbols)
    Portrait,
}

/// Four corner points
///
/// Unordered as it comes out of contour approximation; after `rectify` the
/// order is top-left, top-right, bottom-right, bottom-left.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Quad {
    points: [Point; 4],
}

impl Quad {
    pub const fn new(points: [Point; 4]) -> Self {
        Self { points }
    }

    /// Axis-aligned rectangle with corners `(0,0)` to `(w-1,h-1)`, already rectified
    pub fn rectangle(width: u32, height: u32) -> Self {
        let right = f64::from(width.saturating_sub(1));
        let bottom = f64::from(height.saturating_sub(1));
        Self::new([
            Point::new(0.0, 0.0),
            Point::new(right, 0.0),
            Point::new(right, bottom),
            Point::new(0.0, bottom),
        ])
    }

    pub fn points(&self) -> &[Point; 4] {
        &self.points
    }

    pub fn centroid(&self) -> Point {
        let (sx, sy) = self
            .points
            .iter()
            .fold((0.0, 0.0), |(sx, sy), p| (sx + p.x, sy + p.y));
        Point::new(sx / 4.0, sy / 4.0)
    }

    /// Width and height of the axis-aligned bounding box
    pub fn bounding_size(&self) -> (f64, f64) {
        let (min_x, max_x, min_y, max_y) = self.points.iter().fold(
            (f64::INFINITY, f64::NEG_INFINITY, f64::INFINITY, f64::NEG_INFINITY),
            |(min_x, max_x, min_y, max_y), p| {
                (min_x.min(p.x), max_x.max(p.x), min_y.min(p.y), max_y.max(p.y))
            },
        );
        (max_x - min_x, max_y - min_y)
    }

    /// Put the corners into top-left, top-right, bottom-right, bottom-left order
    ///
    /// Smallest `x+y` is top-left and largest is bottom-right; the other two
    /// are split on `x-y`. When the bounding box disagrees with `orientation`
    /// the labels are rotated by a quarter turn so the long side ends up where
    /// the caller wants it. Near-square quads can go either way.
    pub fn rectify(&self, orientation: Orientation) -> Quad {
        let by_sum = |a: &usize, b: &usize| {
            let (pa, pb) = (self.points[*a], self.points[*b]);
            pa.sum().total_cmp(&pb.sum()).then_with(|| pa.cmp_xy(&pb))
        };

        let min_sum = (0..4).min_by(by_sum).unwrap_or(0);
        let max_sum = (0..4)
            .filter(|i| *i != min_sum)
            .max_by(by_sum)
            .unwrap_or(2);

        let mut rest = (0..4).filter(|i| *i != min_sum && *i != max_sum);
        let (a, b) = (rest.next().unwrap_or(1), rest.next().unwrap_or(3));
        let (pa, pb) = (self.points[a], self.points[b]);
        let a_first = pa
            .diff()
            .total_cmp(&pb.diff())
            .then_with(|| pa.cmp_xy(&pb))
            .is_le();
        let (min_diff, max_diff) = if a_first { (a, b) } else { (b, a) };

        let (width, height) = self.bounding_size();
        let is_landscape = width > height;
        let wants_landscape = orientation == Orientation::Landscape;

        let order = if is_landscape == wants_landscape {
            [min_sum, max_diff, max_sum, min_diff]
        } else {
            [min_diff, min_sum, max_diff, max_sum]
        };

        Quad::new(order.map(|i| self.points[i]))
    }

    /// Push every corner away from the centroid by per-axis factors
    pub fn scale_from_center(&self, xscale: f64, yscale: f64) -> Quad {
        let c = self.centroid();
        Quad::new(
            self.points
                .map(|p| Point::new(c.x + (p.x - c.x) * xscale, c.y + (p.y - c.y) * yscale)),
        )
    }
}

impl TryFrom<&[Point]> for Quad {
    type Error = GeometryError;

    fn try_from(points: &[Point]) -> Result<Self, Self::Error> {
        let points: [Point; 4] = points
            .try_into()
            .map_err(|_| GeometryError::VertexCount(points.len()))?;
        Ok(Quad::new(points))
    }
}
