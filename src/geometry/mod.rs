//! Geometry value types shared by the transform, clip, predicate and label
//! modules. Coordinates are either map units or device pixels depending on
//! where a shape is in the draw pipeline; the types do not track which.

pub mod clip;
pub mod label_point;
pub mod predicates;
pub mod transform;

use serde::{Deserialize, Serialize};

pub use clip::{clip_polygon, clip_polyline};
pub use label_point::{LinePoint, polygon_label_point, polyline_label_point};
pub use transform::{TransformMode, adjust_extent, to_map, to_pixel, transform_shape};

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(from = "PointRepr", into = "PointRepr")]
pub struct Point {
    pub x: f64,
    pub y: f64,
    pub m: Option<f64>,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y, m: None }
    }

    pub const fn with_m(x: f64, y: f64, m: f64) -> Self {
        Self { x, y, m: Some(m) }
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }

    pub fn offset(self, dx: f64, dy: f64) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
            m: self.m,
        }
    }
}

// Points are written as `[x, y]` or `[x, y, m]` in map documents.
#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum PointRepr {
    Xy([f64; 2]),
    Xym([f64; 3]),
}

impl From<PointRepr> for Point {
    fn from(repr: PointRepr) -> Self {
        match repr {
            PointRepr::Xy([x, y]) => Point::new(x, y),
            PointRepr::Xym([x, y, m]) => Point::with_m(x, y, m),
        }
    }
}

impl From<Point> for PointRepr {
    fn from(point: Point) -> Self {
        match point.m {
            Some(m) => PointRepr::Xym([point.x, point.y, m]),
            None => PointRepr::Xy([point.x, point.y]),
        }
    }
}

/// Axis-aligned rectangle. Valid when `minx <= maxx` and `miny <= maxy`.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(from = "[f64; 4]", into = "[f64; 4]")]
pub struct Rect {
    pub minx: f64,
    pub miny: f64,
    pub maxx: f64,
    pub maxy: f64,
}

impl From<[f64; 4]> for Rect {
    fn from([minx, miny, maxx, maxy]: [f64; 4]) -> Self {
        Self {
            minx,
            miny,
            maxx,
            maxy,
        }
    }
}

impl From<Rect> for [f64; 4] {
    fn from(rect: Rect) -> Self {
        [rect.minx, rect.miny, rect.maxx, rect.maxy]
    }
}

impl Rect {
    pub const fn new(minx: f64, miny: f64, maxx: f64, maxy: f64) -> Self {
        Self {
            minx,
            miny,
            maxx,
            maxy,
        }
    }

    pub fn is_valid(&self) -> bool {
        self.minx <= self.maxx && self.miny <= self.maxy
    }

    pub fn width(&self) -> f64 {
        self.maxx - self.minx
    }

    pub fn height(&self) -> f64 {
        self.maxy - self.miny
    }

    pub fn center(&self) -> Point {
        Point::new((self.minx + self.maxx) / 2.0, (self.miny + self.maxy) / 2.0)
    }

    pub fn expand(&self, amount: f64) -> Self {
        Self::new(
            self.minx - amount,
            self.miny - amount,
            self.maxx + amount,
            self.maxy + amount,
        )
    }

    /// Closed five-vertex ring walking the rectangle corners.
    pub fn to_polygon(&self) -> Vec<Point> {
        vec![
            Point::new(self.minx, self.miny),
            Point::new(self.maxx, self.miny),
            Point::new(self.maxx, self.maxy),
            Point::new(self.minx, self.maxy),
            Point::new(self.minx, self.miny),
        ]
    }

    /// Bounding box of a point set, `None` when the set is empty.
    pub fn from_points<'a>(points: impl IntoIterator<Item = &'a Point>) -> Option<Self> {
        let mut iter = points.into_iter();
        let first = iter.next()?;
        let mut rect = Self::new(first.x, first.y, first.x, first.y);
        for p in iter {
            rect.minx = rect.minx.min(p.x);
            rect.miny = rect.miny.min(p.y);
            rect.maxx = rect.maxx.max(p.x);
            rect.maxy = rect.maxy.max(p.y);
        }
        Some(rect)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShapeType {
    #[default]
    Null,
    Point,
    Line,
    Polygon,
}

/// An ordered list of parts, each an ordered list of vertices. Polygon parts
/// are closed rings (first vertex repeated as the last).
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Shape {
    #[serde(rename = "type")]
    pub kind: ShapeType,
    #[serde(default)]
    pub parts: Vec<Vec<Point>>,
}

impl Shape {
    pub fn new(kind: ShapeType) -> Self {
        Self {
            kind,
            parts: Vec::new(),
        }
    }

    pub fn with_part(mut self, part: Vec<Point>) -> Self {
        self.parts.push(part);
        self
    }

    pub fn point(p: Point) -> Self {
        Self::new(ShapeType::Point).with_part(vec![p])
    }

    pub fn line(points: Vec<Point>) -> Self {
        Self::new(ShapeType::Line).with_part(points)
    }

    pub fn polygon(ring: Vec<Point>) -> Self {
        Self::new(ShapeType::Polygon).with_part(ring)
    }

    pub fn is_empty(&self) -> bool {
        self.parts.iter().all(|part| part.is_empty())
    }

    pub fn num_parts(&self) -> usize {
        self.parts.len()
    }

    pub fn bounds(&self) -> Option<Rect> {
        Rect::from_points(self.parts.iter().flatten())
    }

    pub fn vertices(&self) -> impl Iterator<Item = &Point> {
        self.parts.iter().flatten()
    }
}
