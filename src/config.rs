use crate::error::{Error, Result};
use crate::geometry::{Rect, Shape};
use crate::label::{Color, LabelStyle, LayerType, Style};
use crate::text_metrics::{FontSet, FontSource};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

fn default_true() -> bool {
    true
}

/// A map document: image size, visible extent, fonts and layers.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MapDefinition {
    pub width: u32,
    pub height: u32,
    pub extent: Rect,
    pub background: Option<Color>,
    pub scale_denominator: Option<f64>,
    pub fontset: BTreeMap<String, FontSource>,
    pub layers: Vec<LayerDefinition>,
}

impl Default for MapDefinition {
    fn default() -> Self {
        Self {
            width: 400,
            height: 300,
            extent: Rect::new(0.0, 0.0, 400.0, 300.0),
            background: Some(Color::WHITE),
            scale_denominator: None,
            fontset: BTreeMap::new(),
            layers: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayerDefinition {
    #[serde(default)]
    pub name: String,
    #[serde(rename = "type")]
    pub kind: LayerType,
    #[serde(default = "default_true")]
    pub label_cache: bool,
    /// `false` when feature coordinates are already pixels.
    #[serde(default = "default_true")]
    pub transform: bool,
    #[serde(default)]
    pub symbol_scale: Option<f64>,
    #[serde(default)]
    pub classes: Vec<ClassDefinition>,
    #[serde(default)]
    pub features: Vec<Feature>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassDefinition {
    pub name: String,
    pub styles: Vec<Style>,
    pub label: Option<LabelStyle>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Feature {
    /// Index into the layer's classes.
    pub class: usize,
    pub text: Option<String>,
    /// Per-feature label angle, degrees.
    pub angle: Option<f64>,
    /// Per-feature label size, TrueType fonts only.
    pub size: Option<f64>,
    pub shape: Shape,
}

impl MapDefinition {
    pub fn font_set(&self) -> FontSet {
        let mut fonts = FontSet::new();
        for (alias, source) in &self.fontset {
            fonts.insert(alias.clone(), source.clone());
        }
        fonts
    }

    /// Check cross references that serde cannot.
    pub fn validate(&self) -> Result<()> {
        if !self.extent.is_valid() {
            return Err(Error::Config(format!(
                "extent {:?} has min greater than max",
                <[f64; 4]>::from(self.extent)
            )));
        }
        for layer in &self.layers {
            for class in &layer.classes {
                let Some(label) = &class.label else {
                    continue;
                };
                if !label.min_size.is_finite()
                    || !label.max_size.is_finite()
                    || label.min_size > label.max_size
                {
                    return Err(Error::Config(format!(
                        "layer `{}` class `{}`: label size range {}..{} is invalid",
                        layer.name, class.name, label.min_size, label.max_size
                    )));
                }
            }
            for (i, feature) in layer.features.iter().enumerate() {
                if feature.class >= layer.classes.len() {
                    return Err(Error::Config(format!(
                        "layer `{}` feature {i} refers to class {} but the layer has {}",
                        layer.name,
                        feature.class,
                        layer.classes.len()
                    )));
                }
            }
        }
        Ok(())
    }
}

/// Parse a map document. Strict JSON first, then JSON5 so hand-written
/// documents may carry comments and trailing commas.
pub fn parse_map(contents: &str) -> Result<MapDefinition> {
    let map: MapDefinition = match serde_json::from_str(contents) {
        Ok(map) => map,
        Err(json_err) => json5::from_str(contents)
            .map_err(|json5_err| Error::Config(format!("{json_err} (json5: {json5_err})")))?,
    };
    map.validate()?;
    Ok(map)
}

/// Load a map document from disk. Relative font files resolve against the
/// document's directory.
pub fn load_map(path: &Path) -> Result<MapDefinition> {
    let contents = std::fs::read_to_string(path)?;
    let mut map = parse_map(&contents)?;
    if let Some(base) = path.parent() {
        for source in map.fontset.values_mut() {
            if let FontSource::File(file) = source
                && file.is_relative()
            {
                *file = base.join(&*file);
            }
        }
    }
    Ok(map)
}
