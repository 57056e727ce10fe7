// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Mapmaker — pull maps out of PDFs and tile them across printable pages.
//
// Entry point. Initialises logging, loads configuration, applies command-line
// overrides, and dispatches one command onto the document pipeline.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand, ValueEnum};
use mapmaker_core::error::{MapmakerError, Result};
use mapmaker_core::types::{BorderSpec, OutputMode, OverlapSpec, PageRange};
use mapmaker_core::{GridSpec, MapConfig};
use mapmaker_document::{MapPipeline, RasterImage, plan};
use serde_json::json;

#[derive(Parser, Debug)]
#[command(
    name = "mapmaker",
    about = "Pull maps out of PDFs and tile them across printable pages",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Save every embedded map image of a PDF as PNG
    Extract {
        /// PDF to search for images
        #[arg(value_name = "INPUT")]
        input: PathBuf,

        /// Existing directory that receives image-<n>.png files
        #[arg(value_name = "OUTPUT_DIR")]
        output_dir: PathBuf,

        /// Only scan from this page (1-based); alone, only this page
        #[arg(short, long, value_name = "N")]
        page: Option<u32>,

        /// Scan up to this page (inclusive)
        #[arg(short, long, value_name = "N")]
        to_page: Option<u32>,

        /// Skip images narrower than this many pixels
        #[arg(long, value_name = "PX")]
        min_width: Option<u32>,

        /// Skip images shorter than this many pixels
        #[arg(long, value_name = "PX")]
        min_height: Option<u32>,

        #[command(flatten)]
        config: ConfigArgs,
    },
    /// Lay a map image out as a printable PDF
    Tile {
        /// Map image (PNG, JPEG, ...)
        #[arg(value_name = "IMAGE")]
        image: PathBuf,

        /// Squares across and down, as <W>x<H>
        #[arg(value_name = "GRID")]
        grid: String,

        /// PDF to write
        #[arg(value_name = "OUTPUT")]
        output: PathBuf,

        #[command(flatten)]
        layout: LayoutArgs,
    },
    /// Print the page layout of a map image as JSON without rendering
    Plan {
        /// Map image (PNG, JPEG, ...)
        #[arg(value_name = "IMAGE")]
        image: PathBuf,

        /// Squares across and down, as <W>x<H>
        #[arg(value_name = "GRID")]
        grid: String,

        #[command(flatten)]
        layout: LayoutArgs,
    },
}

/// Configuration file and preset, shared by every command.
#[derive(Args, Debug)]
struct ConfigArgs {
    /// JSON configuration file
    #[arg(short, long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Named preset from the configuration file
    #[arg(long, value_name = "NAME")]
    preset: Option<String>,
}

/// Layout overrides applied on top of the configuration.
#[derive(Args, Debug)]
struct LayoutArgs {
    #[command(flatten)]
    config: ConfigArgs,

    /// Paper size for tiled output (A0 to A4)
    #[arg(long, value_name = "SIZE")]
    paper: Option<String>,

    /// Page margin in mm, one value or N,E,S,W
    #[arg(long, value_name = "MM", value_parser = parse_border)]
    border: Option<BorderSpec>,

    /// Overlap between pages in mm, one value or EAST,SOUTH
    #[arg(long, value_name = "MM", value_parser = parse_overlap)]
    overlap: Option<OverlapSpec>,

    /// Tiled pages or a single page sized to the map
    #[arg(long, value_enum)]
    mode: Option<Mode>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Mode {
    /// Split across pages with trim and overlap guides
    Tiled,
    /// One page sized exactly to the map and its border
    Single,
}

impl From<Mode> for OutputMode {
    fn from(mode: Mode) -> Self {
        match mode {
            Mode::Tiled => OutputMode::Tiled,
            Mode::Single => OutputMode::Single,
        }
    }
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match run(cli.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!(error = %err, "mapmaker failed");
            ExitCode::FAILURE
        }
    }
}

/// Millimetre values separated by commas.
fn parse_mm_list(value: &str) -> std::result::Result<Vec<f64>, String> {
    value
        .split(',')
        .map(|part| {
            let part = part.trim();
            match part.parse::<f64>() {
                Ok(mm) if mm.is_finite() && mm >= 0.0 => Ok(mm),
                _ => Err(format!("'{}' is not a length in mm", part)),
            }
        })
        .collect()
}

fn parse_border(value: &str) -> std::result::Result<BorderSpec, String> {
    match parse_mm_list(value)?.as_slice() {
        [mm] => Ok(BorderSpec::uniform(*mm)),
        [north, east, south, west] => Ok(BorderSpec {
            north: *north,
            east: *east,
            south: *south,
            west: *west,
        }),
        _ => Err("expected one value or four (N,E,S,W)".to_string()),
    }
}

fn parse_overlap(value: &str) -> std::result::Result<OverlapSpec, String> {
    match parse_mm_list(value)?.as_slice() {
        [mm] => Ok(OverlapSpec::uniform(*mm)),
        [east, south] => Ok(OverlapSpec {
            east: *east,
            south: *south,
        }),
        _ => Err("expected one value or two (EAST,SOUTH)".to_string()),
    }
}

fn load_config(args: &ConfigArgs) -> Result<MapConfig> {
    let config = match &args.config {
        Some(path) => MapConfig::load(path)?,
        None => MapConfig::default(),
    };
    match &args.preset {
        Some(name) => config.with_preset(name),
        None => Ok(config),
    }
}

/// Configuration for `tile` and `plan`: file, then preset, then flags.
fn layout_config(args: LayoutArgs) -> Result<MapConfig> {
    let mut config = load_config(&args.config)?;
    if let Some(paper) = args.paper {
        config.paper = paper;
    }
    if let Some(border) = args.border {
        config.border = border;
    }
    if let Some(overlap) = args.overlap {
        config.overlap = overlap;
    }
    if let Some(mode) = args.mode {
        config.mode = mode.into();
    }
    Ok(config)
}

/// Pages to scan. `--page` alone selects that page only.
fn page_range(page: Option<u32>, to_page: Option<u32>) -> Option<PageRange> {
    match (page, to_page) {
        (None, None) => None,
        (Some(first), None) => Some(PageRange::single(first)),
        (first, last) => Some(PageRange { first, last }),
    }
}

fn run(command: Command) -> Result<()> {
    match command {
        Command::Extract {
            input,
            output_dir,
            page,
            to_page,
            min_width,
            min_height,
            config,
        } => {
            let mut config = load_config(&config)?;
            if let Some(pages) = page_range(page, to_page) {
                config.pages = pages;
            }
            if let Some(min_width) = min_width {
                config.extraction.min_width = min_width;
            }
            if let Some(min_height) = min_height {
                config.extraction.min_height = min_height;
            }
            extract(&MapPipeline::new(config), &input, &output_dir)
        }
        Command::Tile {
            image,
            grid,
            output,
            layout,
        } => {
            let grid: GridSpec = grid.parse()?;
            let config = layout_config(layout)?;
            let source = RasterImage::open(&image)?;
            let document = MapPipeline::new(config).render_to_file(source, &grid, &output)?;
            tracing::info!(
                pages = document.page_count(),
                output = %output.display(),
                "Map written"
            );
            Ok(())
        }
        Command::Plan { image, grid, layout } => {
            let grid: GridSpec = grid.parse()?;
            let config = layout_config(layout)?;
            let source = RasterImage::open(&image)?;
            let layout = plan(
                source.width(),
                source.height(),
                &grid,
                config.paper_size()?,
                &config.border,
                &config.overlap,
            )?;
            let tiles = layout.tiles();
            let report = json!({
                "image_size_mm": [layout.image_width_mm(), layout.image_height_mm()],
                "plan": &layout,
                "tiles": &tiles,
            });
            println!("{}", serde_json::to_string_pretty(&report)?);
            Ok(())
        }
    }
}

/// Write every extracted image as `image-<n>.png` under `output_dir`.
fn extract(pipeline: &MapPipeline, input: &Path, output_dir: &Path) -> Result<()> {
    if !output_dir.is_dir() {
        return Err(MapmakerError::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("output directory {} does not exist", output_dir.display()),
        )));
    }

    let images = pipeline.extract_images(input)?;
    for (index, image) in images.iter().enumerate() {
        let path = output_dir.join(format!("image-{}.png", index + 1));
        image.save(&path)?;
        tracing::info!(path = %path.display(), width = image.width(), height = image.height(), "Saved image");
    }
    tracing::info!(count = images.len(), "Extraction finished");
    Ok(())
}
