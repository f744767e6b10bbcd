use crate::config::{MapDefinition, load_map, parse_map};
use crate::draw::{DrawSummary, draw_map};
use crate::label::LabelCache;
use crate::render::{ImageMapRenderer, LabelRenderer, SvgRenderer, write_output_text};
use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use std::io::{self, Read};
use std::path::{Path, PathBuf};

#[derive(Parser, Debug)]
#[command(name = "maplabel", version, about = "Render a JSON map document with collision-free labels")]
pub struct Args {
    /// Map document (.json) or '-' for stdin
    #[arg(short = 'i', long = "input")]
    pub input: Option<PathBuf>,

    /// Output file. Defaults to stdout for SVG and image-map output.
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,

    /// Output format
    #[arg(short = 'e', long = "outputFormat", value_enum, default_value = "svg")]
    pub output_format: OutputFormat,

    /// Override the document's image width
    #[arg(short = 'w', long = "width")]
    pub width: Option<u32>,

    /// Override the document's image height
    #[arg(short = 'H', long = "height")]
    pub height: Option<u32>,

    /// Keep fractional coordinates in SVG output
    #[arg(long = "full-resolution")]
    pub full_resolution: bool,

    /// Name of the HTML <map> element for image-map output
    #[arg(long = "map-name", default_value = "map")]
    pub map_name: String,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Svg,
    Png,
    Imagemap,
}

pub fn run() -> Result<()> {
    let args = Args::parse();
    let mut map = read_map(args.input.as_deref())?;
    if let Some(width) = args.width {
        map.width = width;
    }
    if let Some(height) = args.height {
        map.height = height;
    }

    let fonts = map.font_set();
    let mut cache = LabelCache::new();

    match args.output_format {
        OutputFormat::Svg => {
            let mut renderer = SvgRenderer::new(map.width, map.height)
                .background(map.background)
                .full_resolution(args.full_resolution);
            render(&map, &fonts, &mut cache, &mut renderer)?;
            write_output_text(&renderer.finish(), args.output.as_deref())?;
        }
        OutputFormat::Imagemap => {
            let mut renderer = ImageMapRenderer::new(&args.map_name);
            render(&map, &fonts, &mut cache, &mut renderer)?;
            write_output_text(&renderer.finish(), args.output.as_deref())?;
        }
        OutputFormat::Png => write_png(&map, &fonts, &mut cache, args.output.as_ref())?,
    }
    Ok(())
}

fn render<R: LabelRenderer>(
    map: &MapDefinition,
    fonts: &crate::text_metrics::FontSet,
    cache: &mut LabelCache,
    renderer: &mut R,
) -> Result<DrawSummary> {
    let summary = draw_map(map, fonts, cache, renderer)
        .with_context(|| format!("failed to draw map with the {} backend", renderer.name()))?;
    log::info!(
        "{} labels placed, {} rejected",
        summary.drawn + summary.immediate,
        summary.rejected
    );
    Ok(summary)
}

#[cfg(feature = "png")]
fn write_png(
    map: &MapDefinition,
    fonts: &crate::text_metrics::FontSet,
    cache: &mut LabelCache,
    output: Option<&PathBuf>,
) -> Result<()> {
    let output = ensure_output(output, "png")?;
    let mut renderer = crate::render::PngRenderer::new(map.width, map.height).background(map.background);
    render(map, fonts, cache, &mut renderer)?;
    let bytes = renderer.finish()?;
    std::fs::write(&output, bytes)
        .with_context(|| format!("failed to write {}", output.display()))?;
    Ok(())
}

#[cfg(not(feature = "png"))]
fn write_png(
    _map: &MapDefinition,
    _fonts: &crate::text_metrics::FontSet,
    _cache: &mut LabelCache,
    _output: Option<&PathBuf>,
) -> Result<()> {
    Err(anyhow::anyhow!("PNG output requires the `png` feature"))
}

fn read_map(path: Option<&Path>) -> Result<MapDefinition> {
    match path {
        Some(path) if path != Path::new("-") => {
            load_map(path).with_context(|| format!("failed to load {}", path.display()))
        }
        _ => {
            let mut buf = String::new();
            io::stdin().read_to_string(&mut buf)?;
            Ok(parse_map(&buf)?)
        }
    }
}

fn ensure_output(output: Option<&PathBuf>, ext: &str) -> Result<PathBuf> {
    if let Some(path) = output {
        return Ok(path.clone());
    }
    Err(anyhow::anyhow!("Output path required for {} output", ext))
}
