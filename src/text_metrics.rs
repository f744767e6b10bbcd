use fontdb::{Database, Family, Query, Stretch, Style, Weight};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use ttf_parser::Face;

use crate::error::{Error, Result};
use crate::geometry::Rect;
use crate::label::{BitmapSize, LabelFont, LabelStyle};

// System fonts are scanned once per process and shared by every FontSet.
static SYSTEM_FONTS: Lazy<Mutex<Database>> = Lazy::new(|| {
    let mut db = Database::new();
    db.load_system_fonts();
    Mutex::new(db)
});

/// Resolves the unrotated size of a label's text. The returned rectangle is
/// relative to the baseline origin of the first line: `miny` is negative
/// (above the baseline) and `maxy` covers descenders and any extra lines.
pub trait LabelMetrics {
    fn label_size(&self, text: &str, label: &LabelStyle) -> Result<Rect>;
}

/// Where a font alias gets its glyph data from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FontSource {
    File(PathBuf),
    System(String),
}

/// Catalogue of TrueType fonts addressed by alias. Faces are loaded lazily
/// and cached behind a lock, so a set can be shared between draws.
#[derive(Debug, Default)]
pub struct FontSet {
    sources: HashMap<String, FontSource>,
    faces: Mutex<HashMap<String, Arc<FontFace>>>,
}

impl Clone for FontSet {
    fn clone(&self) -> Self {
        Self {
            sources: self.sources.clone(),
            faces: Mutex::new(HashMap::new()),
        }
    }
}

impl FontSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, alias: impl Into<String>, source: FontSource) {
        let alias = alias.into();
        if let Ok(mut faces) = self.faces.lock() {
            faces.remove(&alias);
        }
        self.sources.insert(alias, source);
    }

    pub fn with_font(mut self, alias: impl Into<String>, source: FontSource) -> Self {
        self.insert(alias, source);
        self
    }

    /// Make relative font file paths relative to `base`.
    pub fn resolve_paths(&mut self, base: &Path) {
        for source in self.sources.values_mut() {
            if let FontSource::File(path) = source
                && path.is_relative()
            {
                *path = base.join(&*path);
            }
        }
    }

    pub fn contains(&self, alias: &str) -> bool {
        self.sources.contains_key(alias)
    }

    pub fn source(&self, alias: &str) -> Option<&FontSource> {
        self.sources.get(alias)
    }

    /// Family name to emit in vector output for `alias`.
    pub fn family_name(&self, alias: &str) -> Result<String> {
        Ok(self.face(alias)?.family.clone())
    }

    pub fn face(&self, alias: &str) -> Result<Arc<FontFace>> {
        let mut faces = self.faces.lock().map_err(|_| Error::FontLoad {
            alias: alias.to_string(),
            reason: "font cache lock poisoned".to_string(),
        })?;
        if let Some(face) = faces.get(alias) {
            return Ok(Arc::clone(face));
        }
        let source = self
            .sources
            .get(alias)
            .ok_or_else(|| Error::UnknownFont(alias.to_string()))?;
        let face = Arc::new(load_face(alias, source)?);
        log::debug!("loaded font `{alias}` ({})", face.family);
        faces.insert(alias.to_string(), Arc::clone(&face));
        Ok(face)
    }
}

impl LabelMetrics for FontSet {
    fn label_size(&self, text: &str, label: &LabelStyle) -> Result<Rect> {
        if text.is_empty() {
            return Ok(Rect::default());
        }
        let lines = label.lines(text);
        match &label.font {
            LabelFont::Bitmap(size) => Ok(bitmap_size(&lines, *size)),
            LabelFont::Truetype { alias, size } => {
                let face = self.face(alias)?;
                Ok(face.text_rect(&lines, *size))
            }
        }
    }
}

fn bitmap_size(lines: &[&str], size: BitmapSize) -> Rect {
    let (char_w, char_h) = size.cell();
    let longest = lines.iter().map(|l| l.chars().count()).max().unwrap_or(0);
    Rect::new(
        0.0,
        -char_h,
        char_w * longest as f64,
        char_h * (lines.len().saturating_sub(1)) as f64,
    )
}

fn load_face(alias: &str, source: &FontSource) -> Result<FontFace> {
    let load_error = |reason: String| Error::FontLoad {
        alias: alias.to_string(),
        reason,
    };
    match source {
        FontSource::File(path) => {
            let bytes = fs::read(path).map_err(|e| load_error(format!("{}: {e}", path.display())))?;
            FontFace::parse(bytes, 0, None).map_err(load_error)
        }
        FontSource::System(family) => {
            let db = SYSTEM_FONTS
                .lock()
                .map_err(|_| load_error("system font database lock poisoned".to_string()))?;
            let families = [system_family(family)];
            let query = Query {
                families: &families,
                weight: Weight::NORMAL,
                stretch: Stretch::Normal,
                style: Style::Normal,
            };
            let id = db
                .query(&query)
                .ok_or_else(|| load_error(format!("no system font matches `{family}`")))?;
            let name = db
                .face(id)
                .and_then(|info| info.families.first().map(|(name, _)| name.clone()));
            db.with_face_data(id, |data, index| FontFace::parse(data.to_vec(), index, name))
                .ok_or_else(|| load_error("system font data unavailable".to_string()))?
                .map_err(load_error)
        }
    }
}

fn system_family(name: &str) -> Family<'_> {
    match name.trim().to_ascii_lowercase().as_str() {
        "serif" => Family::Serif,
        "sans-serif" | "sans" => Family::SansSerif,
        "monospace" | "mono" => Family::Monospace,
        "cursive" => Family::Cursive,
        "fantasy" => Family::Fantasy,
        _ => Family::Name(name.trim()),
    }
}

/// Owned font data plus the metrics needed for label sizing. Glyph advances
/// for ASCII are read once; other characters are looked up on demand.
#[derive(Debug)]
pub struct FontFace {
    data: Vec<u8>,
    index: u32,
    pub family: String,
    units_per_em: f64,
    ascender: f64,
    descender: f64,
    line_gap: f64,
    ascii_advances: [u16; 128],
    fallback_advance: f64,
}

impl FontFace {
    fn parse(data: Vec<u8>, index: u32, family: Option<String>) -> std::result::Result<Self, String> {
        let face = Face::parse(&data, index).map_err(|e| e.to_string())?;
        let mut ascii_advances = [0u16; 128];
        for byte in 0u8..=127 {
            if let Some(glyph) = face.glyph_index(byte as char) {
                ascii_advances[byte as usize] = face.glyph_hor_advance(glyph).unwrap_or(0);
            }
        }
        let units_per_em = f64::from(face.units_per_em().max(1));
        let family = family
            .or_else(|| {
                face.names()
                    .into_iter()
                    .find(|name| name.name_id == ttf_parser::name_id::FAMILY && name.is_unicode())
                    .and_then(|name| name.to_string())
            })
            .unwrap_or_else(|| "sans-serif".to_string());
        let ascender = f64::from(face.ascender());
        let descender = f64::from(face.descender());
        let line_gap = f64::from(face.line_gap());
        Ok(Self {
            family,
            units_per_em,
            ascender,
            descender,
            line_gap,
            ascii_advances,
            fallback_advance: units_per_em * 0.56,
            data,
            index,
        })
    }

    /// Advance width of one line at `size` pixels.
    pub fn line_width(&self, text: &str, size: f64) -> f64 {
        let scale = size / self.units_per_em;
        let mut units = 0.0;
        let mut face: Option<Face<'_>> = None;
        for ch in text.chars() {
            let advance = if ch.is_ascii() {
                self.ascii_advances[ch as usize]
            } else {
                if face.is_none() {
                    face = Face::parse(&self.data, self.index).ok();
                }
                face.as_ref()
                    .and_then(|f| f.glyph_index(ch).and_then(|g| f.glyph_hor_advance(g)))
                    .unwrap_or(0)
            };
            units += if advance == 0 {
                self.fallback_advance
            } else {
                f64::from(advance)
            };
        }
        units * scale
    }

    pub fn ascent(&self, size: f64) -> f64 {
        self.ascender * size / self.units_per_em
    }

    pub fn descent(&self, size: f64) -> f64 {
        -self.descender * size / self.units_per_em
    }

    pub fn line_height(&self, size: f64) -> f64 {
        (self.ascender - self.descender + self.line_gap) * size / self.units_per_em
    }

    fn text_rect(&self, lines: &[&str], size: f64) -> Rect {
        let width = lines
            .iter()
            .map(|line| self.line_width(line, size))
            .fold(0.0, f64::max);
        let extra_lines = lines.len().saturating_sub(1) as f64;
        Rect::new(
            0.0,
            -self.ascent(size),
            width,
            self.descent(size) + extra_lines * self.line_height(size),
        )
    }
}
