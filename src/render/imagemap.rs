use std::fmt::Write as _;

use crate::error::Result;
use crate::geometry::Point;
use crate::label::{LabelStyle, Style};
use crate::text_metrics::FontSet;

use super::{LabelRenderer, escape_xml};

/// Client-side HTML image map: one clickable area per drawn label polygon
/// and per drawn marker.
#[derive(Debug, Clone)]
pub struct ImageMapRenderer {
    name: String,
    href: Option<String>,
    areas: Vec<String>,
}

impl ImageMapRenderer {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            href: None,
            areas: Vec::new(),
        }
    }

    /// Link template; `{text}` is replaced by the label text.
    pub fn href(mut self, template: impl Into<String>) -> Self {
        self.href = Some(template.into());
        self
    }

    fn link(&self, text: &str) -> String {
        match &self.href {
            Some(template) => format!(" href=\"{}\"", escape_xml(&template.replace("{text}", text))),
            None => String::new(),
        }
    }

    pub fn finish(self) -> String {
        let mut html = format!("<map name=\"{}\">\n", escape_xml(&self.name));
        for area in &self.areas {
            html.push_str(area);
            html.push('\n');
        }
        html.push_str("</map>\n");
        html
    }
}

impl LabelRenderer for ImageMapRenderer {
    fn name(&self) -> &'static str {
        "imagemap"
    }

    fn draw_marker(&mut self, point: &Point, style: &Style) -> Result<()> {
        self.areas.push(format!(
            "<area shape=\"circle\" coords=\"{},{},{}\" />",
            point.x.round(),
            point.y.round(),
            (style.size / 2.0).round()
        ));
        Ok(())
    }

    fn draw_label_box(&mut self, poly: &[Point], text: &str, _label: &LabelStyle) -> Result<()> {
        // the ring is closed, the area wants each vertex once
        let ring = match poly {
            [rest @ .., last] if poly.len() > 1 && rest.first() == Some(last) => rest,
            _ => poly,
        };
        let mut coords = String::new();
        for (i, p) in ring.iter().enumerate() {
            if i > 0 {
                coords.push(',');
            }
            let _ = write!(coords, "{},{}", p.x.round(), p.y.round());
        }
        let area = format!(
            "<area shape=\"poly\" coords=\"{coords}\"{} title=\"{}\" alt=\"{}\" />",
            self.link(text),
            escape_xml(text),
            escape_xml(text)
        );
        self.areas.push(area);
        Ok(())
    }

    fn draw_text(
        &mut self,
        _origin: &Point,
        _text: &str,
        _label: &LabelStyle,
        _fonts: &FontSet,
    ) -> Result<()> {
        Ok(())
    }
}
