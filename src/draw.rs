//! One map draw: walk the layers, draw geometry, queue labels, then place
//! and paint the queued labels once every layer has been visited.

use crate::config::{LayerDefinition, MapDefinition};
use crate::error::{Error, Result};
use crate::geometry::predicates::point_in_rect;
use crate::geometry::{
    Point, Rect, Shape, ShapeType, TransformMode, adjust_extent, clip_polygon, clip_polyline,
    polygon_label_point, polyline_label_point, transform_shape,
};
use crate::label::{LabelCache, LabelRequest, LabelStyle, LayerType, Position, Style, get_metrics};
use crate::render::{LabelRenderer, draw_label_cache};
use crate::text_metrics::{FontSet, LabelMetrics};

/// Counts from one [`draw_map`] call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DrawSummary {
    /// Labels queued in the cache.
    pub appended: usize,
    /// Cached labels that were placed and painted.
    pub drawn: usize,
    pub rejected: usize,
    /// Labels painted straight away by layers that bypass the cache.
    pub immediate: usize,
}

// Device mapping for the current draw.
struct View {
    extent: Rect,
    cellsize: f64,
    clip: Rect,
    image: Rect,
    pixel_clip: Rect,
    mode: TransformMode,
}

impl View {
    fn new(map: &MapDefinition, mode: TransformMode) -> Result<Self> {
        let (extent, cellsize) = adjust_extent(&map.extent, map.width, map.height)?;
        let image = Rect::new(0.0, 0.0, f64::from(map.width), f64::from(map.height));
        Ok(Self {
            extent,
            cellsize,
            clip: extent.expand(2.0 * cellsize),
            image,
            pixel_clip: image.expand(2.0),
            mode,
        })
    }

    /// Clip to the visible area (plus a two cell margin) and convert to
    /// device coordinates. Points outside the extent are dropped.
    fn project(&self, shape: &Shape, transform: bool) -> Shape {
        let mut shape = shape.clone();
        let (visible, clip) = if transform {
            (&self.extent, &self.clip)
        } else {
            (&self.image, &self.pixel_clip)
        };
        match shape.kind {
            ShapeType::Line => clip_polyline(&mut shape, clip),
            ShapeType::Polygon => clip_polygon(&mut shape, clip),
            ShapeType::Point => {
                for part in &mut shape.parts {
                    part.retain(|p| point_in_rect(p, visible));
                }
                shape.parts.retain(|part| !part.is_empty());
            }
            ShapeType::Null => shape.parts.clear(),
        }
        if transform {
            transform_shape(&mut shape, &self.extent, self.cellsize, self.mode);
        }
        shape
    }
}

/// Where and how big a feature's label is.
struct Anchor {
    point: Point,
    feature_size: f64,
    angle: Option<f64>,
}

fn anchors(shape: &Shape, label: &LabelStyle) -> Vec<Anchor> {
    match shape.kind {
        ShapeType::Point => shape
            .vertices()
            .map(|p| Anchor {
                point: *p,
                feature_size: -1.0,
                angle: None,
            })
            .collect(),
        ShapeType::Line => polyline_label_point(shape, label.min_feature_size)
            .map(|lp| Anchor {
                point: lp.point,
                feature_size: lp.length,
                angle: Some(lp.angle),
            })
            .into_iter()
            .collect(),
        ShapeType::Polygon => polygon_label_point(shape, label.min_feature_size)
            .zip(shape.bounds())
            .map(|(point, bounds)| Anchor {
                point,
                feature_size: bounds.width(),
                angle: None,
            })
            .into_iter()
            .collect(),
        ShapeType::Null => Vec::new(),
    }
}

fn scale_factor(map: &MapDefinition, layer: &LayerDefinition) -> f64 {
    match (layer.symbol_scale, map.scale_denominator) {
        (Some(symbol_scale), Some(scale)) if scale > 0.0 => symbol_scale / scale,
        _ => 1.0,
    }
}

/// Draw `map` through `renderer`, using `cache` for label placement.
///
/// The cache is reset first and left `Processed` on success. Any metrics or
/// backend failure fails the whole draw.
pub fn draw_map<R>(
    map: &MapDefinition,
    fonts: &FontSet,
    cache: &mut LabelCache,
    renderer: &mut R,
) -> Result<DrawSummary>
where
    R: LabelRenderer + ?Sized,
{
    cache.reset();
    let view = View::new(map, renderer.transform_mode())?;
    let mut summary = DrawSummary::default();

    for (layer_index, layer) in map.layers.iter().enumerate() {
        if matches!(layer.kind, LayerType::Raster | LayerType::Query | LayerType::Circle) {
            log::warn!("layer `{}`: {:?} layers are not drawn", layer.name, layer.kind);
            continue;
        }
        let factor = scale_factor(map, layer);

        for (shape_index, feature) in layer.features.iter().enumerate() {
            let class = layer.classes.get(feature.class).ok_or_else(|| {
                Error::Config(format!(
                    "layer `{}` has no class {}",
                    layer.name, feature.class
                ))
            })?;
            let styles: Vec<Style> = class.styles.iter().map(|s| s.scaled(factor)).collect();

            let shape = view.project(&feature.shape, layer.transform);
            if shape.is_empty() {
                continue;
            }

            match layer.kind {
                LayerType::Point => {
                    for p in shape.vertices() {
                        for style in &styles {
                            renderer.draw_marker(p, style)?;
                        }
                    }
                }
                LayerType::Line | LayerType::Polygon => {
                    for style in &styles {
                        renderer.draw_shape(&shape, style)?;
                    }
                }
                _ => {}
            }

            let (Some(template), Some(text)) = (class.label.as_ref(), feature.text.as_deref()) else {
                continue;
            };
            let mut label = template.clone();
            if let Some(angle) = feature.angle {
                label.angle = angle;
            }
            if let Some(size) = feature.size {
                label.set_size(size);
            }
            let label = label.scaled(factor);

            for anchor in anchors(&shape, &label) {
                let mut label = label.clone();
                if label.auto_angle
                    && let Some(angle) = anchor.angle
                {
                    label.angle = angle;
                }

                if !layer.label_cache {
                    draw_immediate(renderer, fonts, &anchor.point, text, label)?;
                    summary.immediate += 1;
                    continue;
                }

                let markers = if layer.kind.has_markers() {
                    styles.clone()
                } else {
                    Vec::new()
                };
                cache.append(
                    LabelRequest::new(text, anchor.point, label)
                        .layer(layer.kind, layer_index)
                        .class(feature.class)
                        .feature_size(anchor.feature_size)
                        .markers(markers)
                        .shape(None, Some(shape_index)),
                )?;
                summary.appended += 1;
            }
        }
    }

    cache.process(fonts, f64::from(map.width), f64::from(map.height))?;
    summary.drawn = draw_label_cache(cache, fonts, renderer)?;
    summary.rejected = summary.appended - summary.drawn;
    log::info!(
        "placed {} of {} cached labels ({} rejected, {} drawn directly)",
        summary.drawn,
        summary.appended,
        summary.rejected,
        summary.immediate
    );
    Ok(summary)
}

// Layers that bypass the cache get their fixed position with no collision
// testing; automatic placement falls back to centre-centre.
fn draw_immediate<R>(
    renderer: &mut R,
    fonts: &FontSet,
    point: &Point,
    text: &str,
    mut label: LabelStyle,
) -> Result<()>
where
    R: LabelRenderer + ?Sized,
{
    if label.position == Position::Auto {
        label.position = Position::Cc;
    }
    let rect = fonts.label_size(text, &label)?;
    let placement = get_metrics(point, label.position, &rect, label.offset, label.angle, 0.0);
    renderer.draw_label_box(&placement.poly, text, &label)?;
    renderer.draw_text(&placement.origin, text, &label, fonts)
}
