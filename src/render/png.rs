use crate::error::{Error, Result};
use crate::geometry::{Point, Shape, TransformMode};
use crate::label::{Color, LabelStyle, Style};
use crate::text_metrics::FontSet;

use super::{LabelRenderer, SvgRenderer};

/// Raster output: draws through an [`SvgRenderer`] and rasterises the
/// finished document with resvg.
#[derive(Debug, Clone)]
pub struct PngRenderer {
    svg: SvgRenderer,
}

impl PngRenderer {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            svg: SvgRenderer::new(width, height),
        }
    }

    pub fn background(mut self, color: Option<Color>) -> Self {
        self.svg = self.svg.background(color);
        self
    }

    /// Encoded PNG bytes.
    pub fn finish(self) -> Result<Vec<u8>> {
        let (width, height) = self.svg.size();
        rasterize(&self.svg.finish(), width, height)
    }
}

fn backend_error(message: impl ToString) -> Error {
    Error::Backend {
        backend: "png",
        message: message.to_string(),
    }
}

pub fn rasterize(svg: &str, width: u32, height: u32) -> Result<Vec<u8>> {
    let mut opt = usvg::Options::default();
    opt.fontdb_mut().load_system_fonts();
    opt.default_size = usvg::Size::from_wh(width as f32, height as f32)
        .ok_or_else(|| backend_error(format!("invalid image size {width}x{height}")))?;

    let tree = usvg::Tree::from_str(svg, &opt).map_err(backend_error)?;
    let size = tree.size().to_int_size();
    let mut pixmap = resvg::tiny_skia::Pixmap::new(size.width(), size.height())
        .ok_or_else(|| backend_error("failed to allocate pixmap"))?;

    let mut pixmap_mut = pixmap.as_mut();
    resvg::render(&tree, resvg::tiny_skia::Transform::default(), &mut pixmap_mut);
    pixmap.encode_png().map_err(backend_error)
}

impl LabelRenderer for PngRenderer {
    fn name(&self) -> &'static str {
        "png"
    }

    fn transform_mode(&self) -> TransformMode {
        TransformMode::Pixel
    }

    fn draw_shape(&mut self, shape: &Shape, style: &Style) -> Result<()> {
        self.svg.draw_shape(shape, style)
    }

    fn draw_marker(&mut self, point: &Point, style: &Style) -> Result<()> {
        self.svg.draw_marker(point, style)
    }

    fn draw_label_box(&mut self, poly: &[Point], text: &str, label: &LabelStyle) -> Result<()> {
        self.svg.draw_label_box(poly, text, label)
    }

    fn draw_text(
        &mut self,
        origin: &Point,
        text: &str,
        label: &LabelStyle,
        fonts: &FontSet,
    ) -> Result<()> {
        self.svg.draw_text(origin, text, label, fonts)
    }
}
