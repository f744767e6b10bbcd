//! Output backends. All of them are driven by one draw loop,
//! [`draw_label_cache`], so every format paints the same labels in the same
//! order with the same anchor points.

pub mod imagemap;
#[cfg(feature = "png")]
pub mod png;
pub mod svg;

use std::path::Path;

use crate::error::Result;
use crate::geometry::{Point, Shape, TransformMode};
use crate::label::{LabelCache, LabelStyle, Style};
use crate::text_metrics::FontSet;

pub use imagemap::ImageMapRenderer;
#[cfg(feature = "png")]
pub use png::PngRenderer;
pub use svg::SvgRenderer;

/// Drawing primitives a backend provides. Coordinates are device units in
/// the backend's [`TransformMode`].
pub trait LabelRenderer {
    fn name(&self) -> &'static str;

    fn transform_mode(&self) -> TransformMode {
        TransformMode::Pixel
    }

    /// A clipped, transformed feature geometry.
    fn draw_shape(&mut self, _shape: &Shape, _style: &Style) -> Result<()> {
        Ok(())
    }

    fn draw_marker(&mut self, point: &Point, style: &Style) -> Result<()>;

    /// The placed label polygon, called before the text itself.
    fn draw_label_box(&mut self, _poly: &[Point], _text: &str, _label: &LabelStyle) -> Result<()> {
        Ok(())
    }

    /// Text with its first baseline starting at `origin`, rotated by
    /// `label.angle` degrees about it.
    fn draw_text(
        &mut self,
        origin: &Point,
        text: &str,
        label: &LabelStyle,
        fonts: &FontSet,
    ) -> Result<()>;
}

/// Paint every placed label, oldest entry first: its markers (annotation
/// layers), then its box, then its text. Returns how many labels were drawn.
pub fn draw_label_cache<R>(cache: &LabelCache, fonts: &FontSet, renderer: &mut R) -> Result<usize>
where
    R: LabelRenderer + ?Sized,
{
    cache.require_processed()?;
    let mut count = 0;
    for (_, entry) in cache.drawn() {
        if entry.draw_marker {
            for style in &entry.styles {
                renderer.draw_marker(&entry.point, style)?;
            }
        }
        renderer.draw_label_box(&entry.poly, &entry.text, &entry.label)?;
        renderer.draw_text(&entry.label_point, &entry.text, &entry.label, fonts)?;
        count += 1;
    }
    log::debug!("{} backend drew {count} cached labels", renderer.name());
    Ok(count)
}

pub fn write_output_text(text: &str, output: Option<&Path>) -> anyhow::Result<()> {
    match output {
        Some(path) => {
            std::fs::write(path, text)?;
        }
        None => {
            print!("{}", text);
        }
    }
    Ok(())
}

pub(crate) fn escape_xml(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}
