// Positioning of a measured label around its anchor point.

use crate::geometry::{Point, Rect};

use super::style::{Position, Style};

/// Extra gap between a label and the marker it sits next to.
pub const MARKER_SLOP: f64 = 2.0;

/// A label placed for one candidate: where its text baseline starts and the
/// (buffered, rotated) polygon it occupies.
#[derive(Debug, Clone, PartialEq)]
pub struct Placement {
    pub origin: Point,
    pub poly: Vec<Point>,
}

/// Rotate a screen-space vector counter-clockwise by `angle` degrees.
/// Screen y grows downward, which flips the sign of the sine terms.
pub fn rotate(x: f64, y: f64, angle: f64) -> (f64, f64) {
    let (sin, cos) = angle.to_radians().sin_cos();
    (x * cos + y * sin, -x * sin + y * cos)
}

// Top-left corner of the unrotated label box, relative to the anchor.
fn box_corner(position: Position, w: f64, h: f64, ox: f64, oy: f64) -> (f64, f64) {
    match position {
        Position::Ul => (-w - ox, -h - oy),
        Position::Uc => (-w / 2.0, -h - oy - MARKER_SLOP),
        Position::Ur => (ox, -h - oy),
        Position::Cl => (-w - ox - MARKER_SLOP, -h / 2.0),
        Position::Cc | Position::Auto => (-w / 2.0 + ox, -h / 2.0 + oy),
        Position::Cr => (ox + MARKER_SLOP, -h / 2.0),
        Position::Ll => (-w - ox, oy),
        Position::Lc => (-w / 2.0, oy + MARKER_SLOP),
        Position::Lr => (ox, oy),
        Position::Xy => (ox, oy),
    }
}

/// Place a label rectangle (as returned by
/// [`LabelMetrics::label_size`](crate::text_metrics::LabelMetrics::label_size))
/// at `position` around `anchor`.
///
/// Compass positions put the named side of the box against the anchor, so
/// `Ul` grows up and to the left. `Xy` adds the offset straight to the anchor
/// and uses it as the text origin. The polygon is the box grown by `buffer`
/// on every side, then rotated about the anchor by `angle` degrees.
/// `Auto` is resolved by the caller; here it behaves like `Cc`.
pub fn get_metrics(
    anchor: &Point,
    position: Position,
    rect: &Rect,
    offset: (f64, f64),
    angle: f64,
    buffer: f64,
) -> Placement {
    let w = rect.width();
    let h = rect.height();
    let (ox, oy) = offset;

    let (left, top) = match position {
        Position::Xy => (ox + rect.minx, oy + rect.miny),
        other => box_corner(other, w, h, ox, oy),
    };

    let (dx, dy) = rotate(left - rect.minx, top - rect.miny, angle);
    let origin = Point::new(anchor.x + dx.round(), anchor.y + dy.round());

    let corners = [
        (left - buffer, top - buffer),
        (left + w + buffer, top - buffer),
        (left + w + buffer, top + h + buffer),
        (left - buffer, top + h + buffer),
    ];
    let mut poly: Vec<Point> = corners
        .iter()
        .map(|&(x, y)| {
            let (rx, ry) = rotate(x, y, angle);
            Point::new(anchor.x + rx.round(), anchor.y + ry.round())
        })
        .collect();
    poly.push(poly[0]);

    Placement { origin, poly }
}

/// Largest symbol size among a feature's marker styles.
pub fn marker_size(styles: &[Style]) -> f64 {
    styles.iter().map(|s| s.size).fold(0.0, f64::max)
}

/// Pixel footprint of a square marker of `size` centred on `point`.
pub fn marker_rect(point: &Point, size: f64) -> Rect {
    let minx = (point.x - 0.5 * size).round();
    let miny = (point.y - 0.5 * size).round();
    Rect::new(minx, miny, minx + size - 1.0, miny + size - 1.0)
}

/// Distance a label is pushed away from a marker of `size`.
pub fn marker_offset(size: f64) -> f64 {
    (size / 2.0).round()
}
