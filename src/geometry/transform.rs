// World <-> device coordinate conversion. Device rows grow downward while map
// Y grows upward, hence the inverted Y terms.

use super::{Point, Rect, Shape};
use crate::error::{Error, Result};

/// How a backend wants map coordinates converted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransformMode {
    /// Snap every vertex to the nearest whole pixel.
    #[default]
    Pixel,
    /// Same affine mapping without rounding, for vector outputs.
    FullResolution,
}

fn map_to_image_x(x: f64, minx: f64, cellsize: f64) -> f64 {
    ((x - minx) / cellsize).round()
}

fn map_to_image_y(y: f64, maxy: f64, cellsize: f64) -> f64 {
    ((maxy - y) / cellsize).round()
}

pub fn point_to_pixel(p: Point, extent: &Rect, cellsize: f64) -> Point {
    Point {
        x: map_to_image_x(p.x, extent.minx, cellsize),
        y: map_to_image_y(p.y, extent.maxy, cellsize),
        m: p.m,
    }
}

pub fn to_pixel(shape: &mut Shape, extent: &Rect, cellsize: f64) {
    for p in shape.parts.iter_mut().flatten() {
        *p = point_to_pixel(*p, extent, cellsize);
    }
}

pub fn to_map(shape: &mut Shape, extent: &Rect, cellsize: f64) {
    for p in shape.parts.iter_mut().flatten() {
        p.x = extent.minx + p.x * cellsize;
        p.y = extent.maxy - p.y * cellsize;
    }
}

fn to_full_resolution(shape: &mut Shape, extent: &Rect, cellsize: f64) {
    for p in shape.parts.iter_mut().flatten() {
        p.x = (p.x - extent.minx) / cellsize;
        p.y = (extent.maxy - p.y) / cellsize;
    }
}

/// Convert a shape to output coordinates the way the active backend wants.
pub fn transform_shape(shape: &mut Shape, extent: &Rect, cellsize: f64, mode: TransformMode) {
    match mode {
        TransformMode::Pixel => to_pixel(shape, extent, cellsize),
        TransformMode::FullResolution => to_full_resolution(shape, extent, cellsize),
    }
}

/// Grow `extent` so it has the aspect ratio of a `width` x `height` image and
/// return it with the resulting cell size (map units per pixel).
pub fn adjust_extent(extent: &Rect, width: u32, height: u32) -> Result<(Rect, f64)> {
    if width < 2 || height < 2 {
        return Err(Error::Geometry(format!(
            "image size {width}x{height} is too small to map an extent onto"
        )));
    }
    if !extent.is_valid() || (extent.width() <= 0.0 && extent.height() <= 0.0) {
        return Err(Error::Geometry(format!(
            "extent {:?} is degenerate",
            <[f64; 4]>::from(*extent)
        )));
    }

    let cellsize = (extent.width() / f64::from(width - 1))
        .max(extent.height() / f64::from(height - 1));
    let center = extent.center();
    let half_w = cellsize * f64::from(width - 1) / 2.0;
    let half_h = cellsize * f64::from(height - 1) / 2.0;
    let adjusted = Rect::new(
        center.x - half_w,
        center.y - half_h,
        center.x + half_w,
        center.y + half_h,
    );
    Ok((adjusted, cellsize))
}
