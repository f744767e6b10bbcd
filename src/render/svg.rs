use std::fmt::Write as _;

use crate::error::Result;
use crate::geometry::{Point, Shape, ShapeType, TransformMode};
use crate::label::{Color, LabelFont, LabelStyle, Style, Symbol};
use crate::text_metrics::FontSet;

use super::{LabelRenderer, escape_xml};

/// Builds an SVG document in memory. Shapes and labels are appended in the
/// order they are drawn, so later elements paint over earlier ones.
#[derive(Debug, Clone)]
pub struct SvgRenderer {
    width: u32,
    height: u32,
    background: Option<Color>,
    full_resolution: bool,
    body: String,
}

impl SvgRenderer {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            background: None,
            full_resolution: false,
            body: String::new(),
        }
    }

    pub fn background(mut self, color: Option<Color>) -> Self {
        self.background = color;
        self
    }

    /// Keep fractional device coordinates instead of snapping to pixels.
    pub fn full_resolution(mut self, enabled: bool) -> Self {
        self.full_resolution = enabled;
        self
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn finish(self) -> String {
        let (width, height) = (self.width, self.height);
        let mut svg = String::with_capacity(self.body.len() + 256);
        svg.push_str(&format!(
            "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{width}\" height=\"{height}\" viewBox=\"0 0 {width} {height}\">",
        ));
        if let Some(bg) = self.background {
            svg.push_str(&format!(
                "<rect width=\"100%\" height=\"100%\" {}/>",
                paint("fill", Some(bg))
            ));
        }
        svg.push_str(&self.body);
        svg.push_str("</svg>");
        svg
    }

    fn push_polygon(&mut self, poly: &[Point], fill: Option<Color>, dx: f64, dy: f64) {
        let points = poly
            .iter()
            .map(|p| format!("{:.2},{:.2}", p.x + dx, p.y + dy))
            .collect::<Vec<_>>()
            .join(" ");
        let _ = write!(
            self.body,
            "<polygon points=\"{points}\" {} stroke=\"none\"/>",
            paint("fill", fill)
        );
    }

    fn push_text(
        &mut self,
        origin: &Point,
        lines: &[&str],
        font: &SvgFont,
        fill: Color,
        outline: Option<Color>,
        angle: f64,
    ) {
        let (x, y) = (origin.x, origin.y);
        let rotate = if angle != 0.0 {
            format!(" transform=\"rotate({:.2} {x:.2} {y:.2})\"", -angle)
        } else {
            String::new()
        };
        let stroke = match outline {
            Some(color) => format!(
                " {} stroke-width=\"2\" paint-order=\"stroke\" stroke-linejoin=\"round\"",
                paint("stroke", Some(color))
            ),
            None => String::new(),
        };
        let _ = write!(
            self.body,
            "<text x=\"{x:.2}\" y=\"{y:.2}\" font-family=\"{}\" font-size=\"{:.2}\" {}{stroke}{rotate}>",
            escape_xml(&font.family),
            font.size,
            paint("fill", Some(fill)),
        );
        if let [single] = lines {
            self.body.push_str(&escape_xml(single));
        } else {
            for (i, line) in lines.iter().enumerate() {
                let dy = if i == 0 { 0.0 } else { font.line_height };
                let _ = write!(
                    self.body,
                    "<tspan x=\"{x:.2}\" dy=\"{dy:.2}\">{}</tspan>",
                    escape_xml(line)
                );
            }
        }
        self.body.push_str("</text>");
    }
}

struct SvgFont {
    family: String,
    size: f64,
    line_height: f64,
}

fn svg_font(label: &LabelStyle, fonts: &FontSet) -> Result<SvgFont> {
    match &label.font {
        LabelFont::Bitmap(size) => {
            let (_, h) = size.cell();
            Ok(SvgFont {
                family: "monospace".to_string(),
                size: h,
                line_height: h,
            })
        }
        LabelFont::Truetype { alias, size } => {
            let face = fonts.face(alias)?;
            Ok(SvgFont {
                family: face.family.clone(),
                size: *size,
                line_height: face.line_height(*size),
            })
        }
    }
}

fn paint(attr: &str, color: Option<Color>) -> String {
    match color {
        None => format!("{attr}=\"none\""),
        Some(c) if c.is_opaque() => format!("{attr}=\"#{:02x}{:02x}{:02x}\"", c.r, c.g, c.b),
        Some(c) => format!(
            "{attr}=\"#{:02x}{:02x}{:02x}\" {attr}-opacity=\"{:.3}\"",
            c.r,
            c.g,
            c.b,
            c.opacity()
        ),
    }
}

fn path_data(parts: &[Vec<Point>], close: bool) -> String {
    let mut d = String::new();
    for part in parts {
        for (i, p) in part.iter().enumerate() {
            let cmd = if i == 0 { 'M' } else { 'L' };
            let _ = write!(d, "{cmd}{:.2},{:.2} ", p.x, p.y);
        }
        if close && !part.is_empty() {
            d.push_str("Z ");
        }
    }
    d.trim_end().to_string()
}

impl LabelRenderer for SvgRenderer {
    fn name(&self) -> &'static str {
        "svg"
    }

    fn transform_mode(&self) -> TransformMode {
        if self.full_resolution {
            TransformMode::FullResolution
        } else {
            TransformMode::Pixel
        }
    }

    fn draw_shape(&mut self, shape: &Shape, style: &Style) -> Result<()> {
        match shape.kind {
            ShapeType::Null => {}
            ShapeType::Point => {
                let points: Vec<Point> = shape.vertices().copied().collect();
                for p in &points {
                    self.draw_marker(p, style)?;
                }
            }
            ShapeType::Line => {
                let _ = write!(
                    self.body,
                    "<path d=\"{}\" fill=\"none\" {} stroke-width=\"{:.2}\"/>",
                    path_data(&shape.parts, false),
                    paint("stroke", style.color.or(style.outline_color)),
                    style.width
                );
            }
            ShapeType::Polygon => {
                let _ = write!(
                    self.body,
                    "<path d=\"{}\" fill-rule=\"evenodd\" {} {} stroke-width=\"{:.2}\"/>",
                    path_data(&shape.parts, true),
                    paint("fill", style.color),
                    paint("stroke", style.outline_color),
                    style.width
                );
            }
        }
        Ok(())
    }

    fn draw_marker(&mut self, point: &Point, style: &Style) -> Result<()> {
        let (x, y) = (point.x, point.y);
        let half = style.size / 2.0;
        let fill = paint("fill", style.color);
        let stroke = paint("stroke", style.outline_color);
        let _ = match style.symbol {
            Symbol::Circle => write!(
                self.body,
                "<circle cx=\"{x:.2}\" cy=\"{y:.2}\" r=\"{half:.2}\" {fill} {stroke}/>"
            ),
            Symbol::Square => write!(
                self.body,
                "<rect x=\"{:.2}\" y=\"{:.2}\" width=\"{:.2}\" height=\"{:.2}\" {fill} {stroke}/>",
                x - half,
                y - half,
                style.size,
                style.size
            ),
            Symbol::Triangle => write!(
                self.body,
                "<polygon points=\"{:.2},{:.2} {:.2},{:.2} {:.2},{:.2}\" {fill} {stroke}/>",
                x,
                y - half,
                x + half,
                y + half,
                x - half,
                y + half
            ),
            Symbol::Cross => write!(
                self.body,
                "<path d=\"M{:.2},{y:.2} L{:.2},{y:.2} M{x:.2},{:.2} L{x:.2},{:.2}\" fill=\"none\" {} stroke-width=\"{:.2}\"/>",
                x - half,
                x + half,
                y - half,
                y + half,
                paint("stroke", style.color.or(style.outline_color)),
                style.width
            ),
        };
        Ok(())
    }

    fn draw_label_box(&mut self, poly: &[Point], _text: &str, label: &LabelStyle) -> Result<()> {
        let Some(background) = label.background_color else {
            return Ok(());
        };
        if let Some(shadow) = label.background_shadow_color {
            let (dx, dy) = label.background_shadow_offset;
            self.push_polygon(poly, Some(shadow), dx, dy);
        }
        self.push_polygon(poly, Some(background), 0.0, 0.0);
        Ok(())
    }

    fn draw_text(
        &mut self,
        origin: &Point,
        text: &str,
        label: &LabelStyle,
        fonts: &FontSet,
    ) -> Result<()> {
        if text.is_empty() {
            return Ok(());
        }
        let font = svg_font(label, fonts)?;
        let lines = label.lines(text);
        if let Some(shadow) = label.shadow_color {
            let (dx, dy) = label.shadow_offset;
            self.push_text(&origin.offset(dx, dy), &lines, &font, shadow, None, label.angle);
        }
        self.push_text(origin, &lines, &font, label.color, label.outline_color, label.angle);
        Ok(())
    }
}
