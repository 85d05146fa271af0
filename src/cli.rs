//
// cli.rs
// Dicom-Convert-rs
//
// Defines the CLI surface with Clap and dispatches user-selected commands to the conversion library.
//
// Thales Matheus Mendonça Santos - December 2025

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use tracing::Level;

use crate::config::ConverterConfig;
use crate::converter::DcmConverter;
use crate::options::ConvertOptions;
use crate::scratch::ScratchSpace;
use crate::source::DicomSource;
use crate::toolkit::{SystemRunner, Toolkit, CONVERT, DCMCJPLS, DCMJ2PNM, MONTAGE};
use crate::units::Dimension;

/// Command-line interface glue code: defines the available verbs and dispatches to modules.
#[derive(Parser)]
#[command(name = "dicom-convert")]
#[command(
    about = "Convert DICOM files to JPEG/TIFF/BMP/PNG and compose mosaics using DCMTK and ImageMagick",
    long_about = None
)]
pub struct Cli {
    /// JSON configuration file
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
    /// Directory for intermediate files (overrides the config file)
    #[arg(long, global = true)]
    pub scratch_dir: Option<PathBuf>,
    /// Default DPI for physical units (overrides the config file)
    #[arg(long, global = true)]
    pub dpi: Option<f64>,
    #[arg(short, long, global = true)]
    pub verbose: bool,
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Convert one DICOM file to a raster image
    Convert {
        input: PathBuf,
        #[arg(short, long)]
        output: PathBuf,
        /// jpg, jpeg, tiff, bmp or png (defaults to the output extension)
        #[arg(long)]
        format: Option<String>,
        #[arg(long)]
        quality: Option<u8>,
        #[arg(long)]
        flip_h: bool,
        #[arg(long)]
        flip_v: bool,
        /// JSON file with conversion options
        #[arg(long)]
        options: Option<PathBuf>,
    },
    /// Compress a DICOM file with lossless JPEG-LS
    Compress {
        input: PathBuf,
        #[arg(short, long)]
        output: PathBuf,
    },
    /// Compose several DICOM files into one grid image ("-" leaves a cell empty)
    Mosaic {
        #[arg(required = true)]
        inputs: Vec<String>,
        #[arg(short, long)]
        output: PathBuf,
        /// Intermediate format for each cell
        #[arg(long, default_value = "png")]
        format: String,
        #[arg(long)]
        columns: Option<u32>,
        #[arg(long)]
        rows: Option<u32>,
        /// Film width, e.g. 2000, "14in" or "35cm"
        #[arg(long)]
        film_width: Option<Dimension>,
        #[arg(long)]
        film_height: Option<Dimension>,
        #[arg(long)]
        page_margin: Option<Dimension>,
        #[arg(long)]
        box_spacing: Option<Dimension>,
        #[arg(long, allow_negative_numbers = true)]
        page_rotation: Option<f64>,
        #[arg(long)]
        background: Option<String>,
        #[arg(long)]
        trim: bool,
        /// JSON file with conversion options
        #[arg(long)]
        options: Option<PathBuf>,
    },
    /// Delete stale files from the scratch directory
    Sweep,
    /// Check that the external toolkits can be launched
    Doctor,
}

pub async fn run() -> anyhow::Result<()> {
    // Parse the raw CLI arguments once and dispatch to a subcommand handler.
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    let config = load_config(&cli)?;

    match cli.command {
        Commands::Convert {
            input,
            output,
            format,
            quality,
            flip_h,
            flip_v,
            options,
        } => {
            let format = match format {
                Some(format) => format,
                None => output
                    .extension()
                    .and_then(|e| e.to_str())
                    .map(str::to_string)
                    .context("Cannot infer format from output path; pass --format")?,
            };
            let mut opts = load_options(options.as_deref())?;
            opts.quality = quality.or(opts.quality);
            if flip_h {
                opts.flip_h = Some(true);
            }
            if flip_v {
                opts.flip_v = Some(true);
            }

            let converter = DcmConverter::from_config(&config)?;
            converter
                .convert(&format, &DicomSource::from(input.as_path()), &output, &opts)
                .await
                .with_context(|| format!("Failed to convert {:?}", input))?;
            println!("Image saved to: {:?}", output);
        }
        Commands::Compress { input, output } => {
            let converter = DcmConverter::from_config(&config)?;
            converter
                .compress(&DicomSource::from(input.as_path()), &output)
                .await
                .with_context(|| format!("Failed to compress {:?}", input))?;
            println!("Compressed to: {:?}", output);
        }
        Commands::Mosaic {
            inputs,
            output,
            format,
            columns,
            rows,
            film_width,
            film_height,
            page_margin,
            box_spacing,
            page_rotation,
            background,
            trim,
            options,
        } => {
            let mut opts = load_options(options.as_deref())?;
            opts.columns = columns.or(opts.columns);
            opts.rows = rows.or(opts.rows);
            opts.film_width = film_width.or(opts.film_width);
            opts.film_height = film_height.or(opts.film_height);
            opts.page_margin = page_margin.or(opts.page_margin);
            opts.box_spacing = box_spacing.or(opts.box_spacing);
            opts.page_rotation = page_rotation.or(opts.page_rotation);
            opts.background = background.or(opts.background);
            if trim {
                opts.trim = Some(true);
            }

            let sources: Vec<Option<DicomSource>> = inputs
                .iter()
                .map(|input| (input != "-").then(|| DicomSource::from(input.as_str())))
                .collect();

            let converter = DcmConverter::from_config(&config)?;
            let mosaic = converter
                .mosaic(&format, &sources, &output, &opts)
                .await
                .context("Failed to compose mosaic")?;
            println!(
                "Mosaic saved to: {:?} ({} cells, {} failed)",
                mosaic.path,
                mosaic.slots.len(),
                mosaic.failed_slots()
            );
        }
        Commands::Sweep => {
            let scratch = ScratchSpace::new(&config.scratch_dir)?
                .with_max_age(config.scratch_max_age());
            let report = scratch.sweep();
            println!(
                "Removed {} stale file(s) from {:?} ({} skipped)",
                report.removed.len(),
                scratch.root(),
                report.skipped
            );
        }
        Commands::Doctor => {
            let runner = SystemRunner::new(config.toolkit_paths());
            let mut missing = 0;
            for (toolkit, program) in [
                (Toolkit::Dcmtk, DCMJ2PNM),
                (Toolkit::Dcmtk, DCMCJPLS),
                (Toolkit::ImageMagick, MONTAGE),
                (Toolkit::ImageMagick, CONVERT),
            ] {
                let available = runner.probe(toolkit, program).await;
                if !available {
                    missing += 1;
                }
                println!(
                    "  {:<10} {:?} -> {}",
                    program,
                    runner.paths().executable(toolkit, program),
                    if available { "ok" } else { "not found" }
                );
            }
            if missing > 0 {
                bail!("{} toolkit program(s) could not be launched", missing);
            }
        }
    }

    Ok(())
}

fn init_tracing(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(cli: &Cli) -> anyhow::Result<ConverterConfig> {
    let mut config = match &cli.config {
        Some(path) => ConverterConfig::from_json_file(path)?,
        None => ConverterConfig::default(),
    };
    if let Some(dir) = &cli.scratch_dir {
        config.scratch_dir = dir.clone();
    }
    if let Some(dpi) = cli.dpi {
        config.default_dpi = dpi;
    }
    Ok(config)
}

fn load_options(path: Option<&Path>) -> anyhow::Result<ConvertOptions> {
    let Some(path) = path else {
        return Ok(ConvertOptions::default());
    };
    let text =
        fs::read_to_string(path).with_context(|| format!("Failed to read options {:?}", path))?;
    serde_json::from_str(&text).with_context(|| format!("Invalid options file {:?}", path))
}
