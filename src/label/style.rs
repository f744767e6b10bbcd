use std::fmt;
use std::str::FromStr;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::Error;

static HEX_COLOR_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^#([0-9a-fA-F]{2})([0-9a-fA-F]{2})([0-9a-fA-F]{2})([0-9a-fA-F]{2})?$").unwrap());
static RGB_COLOR_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d{1,3})[\s,]+(\d{1,3})[\s,]+(\d{1,3})$").unwrap());

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const BLACK: Color = Color::rgb(0, 0, 0);
    pub const WHITE: Color = Color::rgb(255, 255, 255);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    pub fn opacity(&self) -> f64 {
        f64::from(self.a) / 255.0
    }

    pub fn is_opaque(&self) -> bool {
        self.a == 255
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)?;
        if !self.is_opaque() {
            write!(f, "{:02x}", self.a)?;
        }
        Ok(())
    }
}

impl FromStr for Color {
    type Err = Error;

    /// Accepts `#rrggbb`, `#rrggbbaa` and `r g b` (space or comma separated).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if let Some(caps) = HEX_COLOR_RE.captures(s) {
            let channel = |i: usize| {
                caps.get(i)
                    .map(|m| u8::from_str_radix(m.as_str(), 16).unwrap_or(255))
                    .unwrap_or(255)
            };
            return Ok(Color {
                r: channel(1),
                g: channel(2),
                b: channel(3),
                a: channel(4),
            });
        }
        if let Some(caps) = RGB_COLOR_RE.captures(s) {
            let mut channels = [0u8; 3];
            for (slot, i) in channels.iter_mut().zip(1..=3) {
                *slot = caps[i]
                    .parse::<u8>()
                    .map_err(|_| Error::Config(format!("color channel out of range in `{s}`")))?;
            }
            return Ok(Color::rgb(channels[0], channels[1], channels[2]));
        }
        Err(Error::Config(format!("unrecognised color `{s}`")))
    }
}

impl TryFrom<String> for Color {
    type Error = Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Color> for String {
    fn from(color: Color) -> Self {
        color.to_string()
    }
}

/// Where a label sits relative to its anchor point. The first eight are the
/// outer compass positions tried, in this order, by automatic placement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Position {
    Ul,
    Lr,
    Ur,
    Ll,
    Cr,
    Cl,
    Uc,
    Lc,
    #[default]
    Cc,
    Auto,
    Xy,
}

impl Position {
    pub const AUTO_ORDER: [Position; 8] = [
        Position::Ul,
        Position::Lr,
        Position::Ur,
        Position::Ll,
        Position::Cr,
        Position::Cl,
        Position::Uc,
        Position::Lc,
    ];

    /// Positions that ignore the marker offset.
    pub fn is_centered_or_explicit(self) -> bool {
        matches!(self, Position::Cc | Position::Xy)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LayerType {
    Point,
    Line,
    Polygon,
    Raster,
    Annotation,
    Query,
    Circle,
}

impl LayerType {
    /// Layer types whose labels carry a marker footprint.
    pub fn has_markers(self) -> bool {
        matches!(self, LayerType::Point | LayerType::Annotation)
    }
}

/// Fixed-cell fonts that need no font file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BitmapSize {
    Tiny,
    Small,
    #[default]
    Medium,
    Large,
    Giant,
}

impl BitmapSize {
    /// Character cell (width, height) in pixels.
    pub fn cell(self) -> (f64, f64) {
        match self {
            BitmapSize::Tiny => (5.0, 8.0),
            BitmapSize::Small => (6.0, 12.0),
            BitmapSize::Medium => (7.0, 13.0),
            BitmapSize::Large => (8.0, 16.0),
            BitmapSize::Giant => (9.0, 15.0),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LabelFont {
    Bitmap(BitmapSize),
    Truetype { alias: String, size: f64 },
}

impl Default for LabelFont {
    fn default() -> Self {
        LabelFont::Bitmap(BitmapSize::default())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Symbol {
    #[default]
    Circle,
    Square,
    Triangle,
    Cross,
}

/// Symbolisation for markers and shapes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Style {
    pub color: Option<Color>,
    pub outline_color: Option<Color>,
    pub symbol: Symbol,
    /// Marker size in pixels.
    pub size: f64,
    /// Stroke width for lines and outlines.
    pub width: f64,
}

impl Default for Style {
    fn default() -> Self {
        Self {
            color: None,
            outline_color: None,
            symbol: Symbol::Circle,
            size: 1.0,
            width: 1.0,
        }
    }
}

impl Style {
    pub fn scaled(&self, factor: f64) -> Self {
        Self {
            size: (self.size * factor).max(1.0),
            width: (self.width * factor).max(1.0),
            ..self.clone()
        }
    }
}

/// Label parameters of a class. Copied by value into every cache entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LabelStyle {
    pub font: LabelFont,
    pub color: Color,
    pub outline_color: Option<Color>,
    pub shadow_color: Option<Color>,
    pub shadow_offset: (f64, f64),
    pub background_color: Option<Color>,
    pub background_shadow_color: Option<Color>,
    pub background_shadow_offset: (f64, f64),
    pub min_size: f64,
    pub max_size: f64,
    pub position: Position,
    pub offset: (f64, f64),
    /// Degrees, counter-clockwise.
    pub angle: f64,
    pub auto_angle: bool,
    /// Pixels reserved around the label.
    pub buffer: f64,
    pub min_feature_size: f64,
    pub auto_min_feature_size: bool,
    /// Minimum distance between identical labels of one class; `None`
    /// disables duplicate suppression.
    pub min_distance: Option<f64>,
    pub partials: bool,
    pub force: bool,
    pub wrap: Option<char>,
    pub antialias: bool,
}

impl Default for LabelStyle {
    fn default() -> Self {
        Self {
            font: LabelFont::default(),
            color: Color::BLACK,
            outline_color: None,
            shadow_color: None,
            shadow_offset: (1.0, 1.0),
            background_color: None,
            background_shadow_color: None,
            background_shadow_offset: (1.0, 1.0),
            min_size: 4.0,
            max_size: 256.0,
            position: Position::Cc,
            offset: (0.0, 0.0),
            angle: 0.0,
            auto_angle: false,
            buffer: 0.0,
            min_feature_size: -1.0,
            auto_min_feature_size: false,
            min_distance: None,
            partials: true,
            force: false,
            wrap: None,
            antialias: false,
        }
    }
}

impl LabelStyle {
    /// TrueType sizes scale with the layer; bitmap fonts have fixed cells.
    pub fn scaled(&self, factor: f64) -> Self {
        let mut scaled = self.clone();
        if let LabelFont::Truetype { size, .. } = &mut scaled.font {
            *size = (*size * factor).max(self.min_size).min(self.max_size);
        }
        scaled
    }

    pub fn set_size(&mut self, value: f64) {
        if let LabelFont::Truetype { size, .. } = &mut self.font {
            *size = value;
        }
    }

    /// Text split on the wrap character.
    pub fn lines<'a>(&self, text: &'a str) -> Vec<&'a str> {
        match self.wrap {
            Some(wrap) => text.split(wrap).collect(),
            None => vec![text],
        }
    }
}
