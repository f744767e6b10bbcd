//! Pure geometry tests shared by the label cache and spatial queries.
//!
//! Every function is total: empty or degenerate input yields "no overlap",
//! "not contained" or an infinite distance instead of an error, so callers
//! can use them unconditionally inside the placement loop.

use super::{Point, Rect, Shape, ShapeType};

const EPSILON: f64 = 1e-9;

pub fn point_in_rect(p: &Point, rect: &Rect) -> bool {
    p.x >= rect.minx && p.x <= rect.maxx && p.y >= rect.miny && p.y <= rect.maxy
}

pub fn rect_overlap(a: &Rect, b: &Rect) -> bool {
    a.minx <= b.maxx && a.maxx >= b.minx && a.miny <= b.maxy && a.maxy >= b.miny
}

/// True when `inner` lies completely inside `outer`.
pub fn rect_contains(outer: &Rect, inner: &Rect) -> bool {
    inner.minx >= outer.minx
        && inner.maxx <= outer.maxx
        && inner.miny >= outer.miny
        && inner.maxy <= outer.maxy
}

pub fn distance_point_to_point(a: &Point, b: &Point) -> f64 {
    (a.x - b.x).hypot(a.y - b.y)
}

pub fn distance_point_to_segment(p: &Point, a: &Point, b: &Point) -> f64 {
    let vx = b.x - a.x;
    let vy = b.y - a.y;
    let len2 = vx * vx + vy * vy;
    if len2 <= EPSILON {
        return distance_point_to_point(p, a);
    }
    let t = (((p.x - a.x) * vx + (p.y - a.y) * vy) / len2).clamp(0.0, 1.0);
    let proj = Point::new(a.x + vx * t, a.y + vy * t);
    distance_point_to_point(p, &proj)
}

pub fn distance_segment_to_segment(pa: &Point, pb: &Point, pc: &Point, pd: &Point) -> f64 {
    if intersect_segments(pa, pb, pc, pd) {
        return 0.0;
    }
    distance_point_to_segment(pa, pc, pd)
        .min(distance_point_to_segment(pb, pc, pd))
        .min(distance_point_to_segment(pc, pa, pb))
        .min(distance_point_to_segment(pd, pa, pb))
}

fn segments(shape: &Shape) -> impl Iterator<Item = (&Point, &Point)> {
    shape
        .parts
        .iter()
        .flat_map(|part| part.windows(2).map(|w| (&w[0], &w[1])))
}

pub fn distance_point_to_shape(p: &Point, shape: &Shape) -> f64 {
    match shape.kind {
        ShapeType::Point => shape
            .vertices()
            .map(|v| distance_point_to_point(p, v))
            .fold(f64::INFINITY, f64::min),
        ShapeType::Line => segments(shape)
            .map(|(a, b)| distance_point_to_segment(p, a, b))
            .fold(f64::INFINITY, f64::min),
        ShapeType::Polygon => {
            if intersect_point_polygon(p, shape) {
                0.0
            } else {
                segments(shape)
                    .map(|(a, b)| distance_point_to_segment(p, a, b))
                    .fold(f64::INFINITY, f64::min)
            }
        }
        ShapeType::Null => f64::INFINITY,
    }
}

pub fn distance_shape_to_shape(a: &Shape, b: &Shape) -> f64 {
    match (a.kind, b.kind) {
        (ShapeType::Null, _) | (_, ShapeType::Null) => f64::INFINITY,
        (ShapeType::Point, _) => a
            .vertices()
            .map(|p| distance_point_to_shape(p, b))
            .fold(f64::INFINITY, f64::min),
        (_, ShapeType::Point) => distance_shape_to_shape(b, a),
        (ShapeType::Line, ShapeType::Line) => {
            if intersect_polylines(a, b) {
                return 0.0;
            }
            segment_pairs_distance(a, b)
        }
        (ShapeType::Line, ShapeType::Polygon) | (ShapeType::Polygon, ShapeType::Line) => {
            let (line, poly) = if a.kind == ShapeType::Line { (a, b) } else { (b, a) };
            if intersect_polyline_polygon(line, poly) {
                return 0.0;
            }
            segment_pairs_distance(a, b)
        }
        (ShapeType::Polygon, ShapeType::Polygon) => {
            if intersect_polygons(a, b) {
                return 0.0;
            }
            segment_pairs_distance(a, b)
        }
    }
}

fn segment_pairs_distance(a: &Shape, b: &Shape) -> f64 {
    let mut best = f64::INFINITY;
    for (p1, p2) in segments(a) {
        for (p3, p4) in segments(b) {
            best = best.min(distance_segment_to_segment(p1, p2, p3, p4));
        }
    }
    best
}

fn orientation(a: &Point, b: &Point, c: &Point) -> f64 {
    (b.x - a.x) * (c.y - a.y) - (b.y - a.y) * (c.x - a.x)
}

fn point_on_segment(p: &Point, a: &Point, b: &Point) -> bool {
    p.x >= a.x.min(b.x) - EPSILON
        && p.x <= a.x.max(b.x) + EPSILON
        && p.y >= a.y.min(b.y) - EPSILON
        && p.y <= a.y.max(b.y) + EPSILON
}

/// Segments `ab` and `cd` share at least one point (touching counts).
pub fn intersect_segments(a: &Point, b: &Point, c: &Point, d: &Point) -> bool {
    let o1 = orientation(a, b, c);
    let o2 = orientation(a, b, d);
    let o3 = orientation(c, d, a);
    let o4 = orientation(c, d, b);

    let crosses = ((o1 > EPSILON && o2 < -EPSILON) || (o1 < -EPSILON && o2 > EPSILON))
        && ((o3 > EPSILON && o4 < -EPSILON) || (o3 < -EPSILON && o4 > EPSILON));
    if crosses {
        return true;
    }
    (o1.abs() <= EPSILON && point_on_segment(c, a, b))
        || (o2.abs() <= EPSILON && point_on_segment(d, a, b))
        || (o3.abs() <= EPSILON && point_on_segment(a, c, d))
        || (o4.abs() <= EPSILON && point_on_segment(b, c, d))
}

/// Ray casting against a single ring (even-odd rule).
pub fn point_in_ring(p: &Point, ring: &[Point]) -> bool {
    if ring.len() < 3 {
        return false;
    }
    let mut inside = false;
    let mut j = ring.len() - 1;
    for i in 0..ring.len() {
        let (pi, pj) = (&ring[i], &ring[j]);
        if (pi.y > p.y) != (pj.y > p.y)
            && p.x < (pj.x - pi.x) * (p.y - pi.y) / (pj.y - pi.y) + pi.x
        {
            inside = !inside;
        }
        j = i;
    }
    inside
}

/// Point inside a polygon with holes: toggles once per containing ring.
pub fn intersect_point_polygon(p: &Point, polygon: &Shape) -> bool {
    polygon
        .parts
        .iter()
        .filter(|ring| point_in_ring(p, ring))
        .count()
        % 2
        == 1
}

pub fn intersect_multipoint_polygon(points: &[Point], polygon: &Shape) -> bool {
    points.iter().any(|p| intersect_point_polygon(p, polygon))
}

pub fn intersect_polyline_polygon(line: &Shape, polygon: &Shape) -> bool {
    for (a, b) in segments(line) {
        for (c, d) in segments(polygon) {
            if intersect_segments(a, b, c, d) {
                return true;
            }
        }
    }
    // no crossing, so the line is either wholly inside or wholly outside
    line.parts
        .iter()
        .filter_map(|part| part.first())
        .any(|p| intersect_point_polygon(p, polygon))
}

pub fn intersect_polylines(a: &Shape, b: &Shape) -> bool {
    segments(a).any(|(p1, p2)| segments(b).any(|(p3, p4)| intersect_segments(p1, p2, p3, p4)))
}

/// Any pair of rings crosses, or one polygon contains the other.
pub fn intersect_polygons(a: &Shape, b: &Shape) -> bool {
    if a.is_empty() || b.is_empty() {
        return false;
    }
    if intersect_polylines(a, b) {
        return true;
    }
    let first_vertex = |s: &Shape| s.parts.iter().filter_map(|part| part.first()).copied().collect::<Vec<_>>();
    intersect_multipoint_polygon(&first_vertex(a), b)
        || intersect_multipoint_polygon(&first_vertex(b), a)
}

/// Overlap test used by label placement: bounding boxes first, then ring
/// crossings, then containment either way.
pub fn intersect_label_polygons(a: &[Point], b: &[Point]) -> bool {
    let (Some(ra), Some(rb)) = (Rect::from_points(a), Rect::from_points(b)) else {
        return false;
    };
    if !rect_overlap(&ra, &rb) {
        return false;
    }
    for sa in a.windows(2) {
        for sb in b.windows(2) {
            if intersect_segments(&sa[0], &sa[1], &sb[0], &sb[1]) {
                return true;
            }
        }
    }
    point_in_ring(&a[0], b) || point_in_ring(&b[0], a)
}

/// Every vertex of the label polygon lies within the image shrunk by
/// `buffer` on all sides.
pub fn label_in_image(width: f64, height: f64, poly: &[Point], buffer: f64) -> bool {
    if poly.is_empty() {
        return false;
    }
    poly.iter().all(|p| {
        p.x >= buffer && p.x <= width - buffer && p.y >= buffer && p.y <= height - buffer
    })
}
