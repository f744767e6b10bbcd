// Where a label attaches to a line or polygon feature.

use super::predicates::{distance_point_to_point, intersect_point_polygon};
use super::{Point, Shape};

/// Annotation point for a polyline feature.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinePoint {
    pub point: Point,
    /// Degrees, counter-clockwise on screen, kept within (-90, 90].
    pub angle: f64,
    /// Length of the part the point was taken from.
    pub length: f64,
}

fn part_length(part: &[Point]) -> f64 {
    part.windows(2)
        .map(|w| distance_point_to_point(&w[0], &w[1]))
        .sum()
}

/// Midpoint of the longest segment of the longest part. `None` when the
/// shape has no segments or the longest part is shorter than `min_length`.
pub fn polyline_label_point(shape: &Shape, min_length: f64) -> Option<LinePoint> {
    let (part, length) = shape
        .parts
        .iter()
        .filter(|part| part.len() >= 2)
        .map(|part| (part, part_length(part)))
        .max_by(|a, b| a.1.total_cmp(&b.1))?;

    if length < min_length {
        return None;
    }

    let segment = part
        .windows(2)
        .max_by(|a, b| {
            distance_point_to_point(&a[0], &a[1]).total_cmp(&distance_point_to_point(&b[0], &b[1]))
        })?;
    let (a, b) = (segment[0], segment[1]);

    // device y grows downward, so negate dy for a screen angle
    let mut angle = (-(b.y - a.y)).atan2(b.x - a.x).to_degrees();
    if angle > 90.0 {
        angle -= 180.0;
    } else if angle <= -90.0 {
        angle += 180.0;
    }

    Some(LinePoint {
        point: Point::new((a.x + b.x) / 2.0, (a.y + b.y) / 2.0),
        angle,
        length,
    })
}

const SCANLINE_STEPS: usize = 16;

/// Label point inside a polygon. Uses the bounding-box centre when it falls
/// inside the polygon, otherwise the middle of the widest interior span on a
/// horizontal scanline, searching outward from the centre.
pub fn polygon_label_point(shape: &Shape, min_dimension: f64) -> Option<Point> {
    let bounds = shape.bounds()?;
    if bounds.width() < min_dimension || bounds.height() < min_dimension {
        return None;
    }

    let center = bounds.center();
    if intersect_point_polygon(&center, shape) {
        return Some(center);
    }

    let step = bounds.height() / (SCANLINE_STEPS as f64 * 2.0);
    let mut best: Option<(f64, Point)> = None;
    for i in 0..SCANLINE_STEPS {
        for y in [center.y + step * i as f64, center.y - step * i as f64] {
            if let Some((width, point)) = widest_span(shape, y)
                && best.is_none_or(|(w, _)| width > w)
            {
                best = Some((width, point));
            }
        }
        if best.is_some() {
            break;
        }
    }
    best.map(|(_, p)| p)
}

fn widest_span(shape: &Shape, y: f64) -> Option<(f64, Point)> {
    let mut xs: Vec<f64> = Vec::new();
    for ring in &shape.parts {
        for w in ring.windows(2) {
            let (a, b) = (&w[0], &w[1]);
            if (a.y > y) != (b.y > y) {
                xs.push(a.x + (y - a.y) * (b.x - a.x) / (b.y - a.y));
            }
        }
    }
    xs.sort_by(f64::total_cmp);

    xs.chunks_exact(2)
        .map(|pair| (pair[1] - pair[0], Point::new((pair[0] + pair[1]) / 2.0, y)))
        .filter(|(width, _)| *width > 0.0)
        .max_by(|a, b| a.0.total_cmp(&b.0))
}
