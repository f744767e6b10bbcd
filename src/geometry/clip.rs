//! Rectangle clipping for polylines (Liang-Barsky per segment) and polygons
//! (Sutherland-Hodgman per ring). Parts that fall entirely outside the
//! rectangle are dropped, so a clipped shape can end up with no parts.

use super::{Point, Rect, Shape};

fn lerp(a: Point, b: Point, t: f64) -> Point {
    if t <= 0.0 {
        return a;
    }
    if t >= 1.0 {
        return b;
    }
    let m = match (a.m, b.m) {
        (Some(ma), Some(mb)) => Some(ma + (mb - ma) * t),
        _ => None,
    };
    Point {
        x: a.x + (b.x - a.x) * t,
        y: a.y + (b.y - a.y) * t,
        m,
    }
}

fn clamp_to(p: Point, rect: &Rect) -> Point {
    Point {
        x: p.x.clamp(rect.minx, rect.maxx),
        y: p.y.clamp(rect.miny, rect.maxy),
        m: p.m,
    }
}

fn same_xy(a: &Point, b: &Point) -> bool {
    a.x == b.x && a.y == b.y
}

/// Clip one segment, returning the visible portion.
pub fn clip_segment(a: Point, b: Point, rect: &Rect) -> Option<(Point, Point)> {
    let dx = b.x - a.x;
    let dy = b.y - a.y;
    let mut t0 = 0.0f64;
    let mut t1 = 1.0f64;

    let edges = [
        (-dx, a.x - rect.minx),
        (dx, rect.maxx - a.x),
        (-dy, a.y - rect.miny),
        (dy, rect.maxy - a.y),
    ];
    for (p, q) in edges {
        if p == 0.0 {
            // parallel to this edge
            if q < 0.0 {
                return None;
            }
            continue;
        }
        let r = q / p;
        if p < 0.0 {
            if r > t1 {
                return None;
            }
            t0 = t0.max(r);
        } else {
            if r < t0 {
                return None;
            }
            t1 = t1.min(r);
        }
    }

    Some((
        clamp_to(lerp(a, b, t0), rect),
        clamp_to(lerp(a, b, t1), rect),
    ))
}

pub fn clip_polyline(shape: &mut Shape, rect: &Rect) {
    let mut clipped: Vec<Vec<Point>> = Vec::new();

    for part in &shape.parts {
        let mut current: Vec<Point> = Vec::new();
        for seg in part.windows(2) {
            match clip_segment(seg[0], seg[1], rect) {
                Some((a, b)) => {
                    let continues = current.last().is_some_and(|last| same_xy(last, &a));
                    if !continues {
                        flush_part(&mut clipped, &mut current);
                        current.push(a);
                    }
                    current.push(b);
                }
                None => flush_part(&mut clipped, &mut current),
            }
        }
        flush_part(&mut clipped, &mut current);
    }

    shape.parts = clipped;
}

fn flush_part(parts: &mut Vec<Vec<Point>>, current: &mut Vec<Point>) {
    if current.len() >= 2 {
        parts.push(std::mem::take(current));
    } else {
        current.clear();
    }
}

#[derive(Clone, Copy)]
enum Edge {
    Left(f64),
    Right(f64),
    Bottom(f64),
    Top(f64),
}

impl Edge {
    fn inside(self, p: &Point) -> bool {
        match self {
            Edge::Left(x) => p.x >= x,
            Edge::Right(x) => p.x <= x,
            Edge::Bottom(y) => p.y >= y,
            Edge::Top(y) => p.y <= y,
        }
    }

    fn intersect(self, a: Point, b: Point) -> Point {
        match self {
            Edge::Left(x) | Edge::Right(x) => {
                let t = (x - a.x) / (b.x - a.x);
                Point { x, ..lerp(a, b, t) }
            }
            Edge::Bottom(y) | Edge::Top(y) => {
                let t = (y - a.y) / (b.y - a.y);
                Point { y, ..lerp(a, b, t) }
            }
        }
    }
}

fn clip_ring(ring: &[Point], rect: &Rect) -> Vec<Point> {
    let mut output: Vec<Point> = ring.to_vec();
    if output.len() > 1 && output.first().zip(output.last()).is_some_and(|(a, b)| same_xy(a, b)) {
        output.pop();
    }

    let edges = [
        Edge::Left(rect.minx),
        Edge::Right(rect.maxx),
        Edge::Bottom(rect.miny),
        Edge::Top(rect.maxy),
    ];
    for edge in edges {
        if output.is_empty() {
            break;
        }
        let input = std::mem::take(&mut output);
        let mut prev = input[input.len() - 1];
        for &cur in &input {
            match (edge.inside(&cur), edge.inside(&prev)) {
                (true, true) => output.push(cur),
                (true, false) => {
                    output.push(edge.intersect(prev, cur));
                    output.push(cur);
                }
                (false, true) => output.push(edge.intersect(prev, cur)),
                (false, false) => {}
            }
            prev = cur;
        }
    }

    output.dedup_by(|a, b| same_xy(a, b));
    if output.len() < 3 {
        return Vec::new();
    }
    let first = output[0];
    output.push(first);
    output
}

pub fn clip_polygon(shape: &mut Shape, rect: &Rect) {
    shape.parts = shape
        .parts
        .iter()
        .map(|ring| clip_ring(ring, rect))
        .filter(|ring| !ring.is_empty())
        .collect();
}
