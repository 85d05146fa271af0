//
// mosaic.rs
// Dicom-Convert-rs
//
// Composes several DICOM sources into one grid image: per-slot conversion, ImageMagick montage, then shave/border/rotate post-processing.
//
// Thales Matheus Mendonça Santos - December 2025

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use futures::future::join_all;
use tracing::{info, warn};

use crate::convert::RasterFormat;
use crate::converter::DcmConverter;
use crate::error::{ConvertError, Result};
use crate::options::{mosaic_defaults, ConvertOptions, NormalizedOptions};
use crate::source::DicomSource;
use crate::toolkit::{Invocation, ToolRunner, CONVERT, MONTAGE};

/// Token ImageMagick reads as an empty, transparent tile.
pub const EMPTY_TILE: &str = "null:";

/// What happened to one cell of the grid.
#[derive(Debug, Clone, PartialEq)]
pub enum SlotOutcome {
    Rendered(PathBuf),
    Empty,
    /// Conversion failed; the cell is drawn empty and the error text is kept for reporting.
    Failed(String),
}

impl SlotOutcome {
    pub fn tile(&self) -> OsString {
        match self {
            SlotOutcome::Rendered(path) => path.clone().into_os_string(),
            SlotOutcome::Empty | SlotOutcome::Failed(_) => EMPTY_TILE.into(),
        }
    }
}

/// Result of a successful composition.
#[derive(Debug, Clone)]
pub struct Mosaic {
    pub path: PathBuf,
    pub slots: Vec<SlotOutcome>,
}

impl Mosaic {
    pub fn failed_slots(&self) -> usize {
        self.slots
            .iter()
            .filter(|s| matches!(s, SlotOutcome::Failed(_)))
            .count()
    }
}

/// Per-cell geometry derived from the film size, margin and spacing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MosaicGeometry {
    /// Half the box spacing, applied to each cell edge.
    pub padding: f64,
    pub cell_width: Option<f64>,
    pub cell_height: Option<f64>,
}

impl MosaicGeometry {
    pub fn from_options(options: &NormalizedOptions) -> Self {
        let padding = options.box_spacing / 2.0;
        let cell = |film: Option<f64>, count: u32| {
            film.filter(|f| *f != 0.0)
                .map(|f| (f - options.page_margin * 2.0 + padding * 2.0) / f64::from(count))
        };
        Self {
            padding,
            cell_width: cell(options.film_width, options.columns),
            cell_height: cell(options.film_height, options.rows),
        }
    }

    /// `-geometry` value: `[W]x[H]+P+P`, each side left empty when its film size is unknown.
    pub fn geometry_arg(&self) -> String {
        let inner = |cell: Option<f64>| {
            cell.map(|c| (c - self.padding * 2.0).to_string())
                .unwrap_or_default()
        };
        format!(
            "{}x{}+{}+{}",
            inner(self.cell_width),
            inner(self.cell_height),
            self.padding,
            self.padding
        )
    }
}

/// Grid must have room for every supplied source. An empty grid with no sources is still
/// rejected, since it leaves no cell to size.
pub fn check_layout(options: &NormalizedOptions, sources: usize) -> Result<()> {
    let cells = options.columns as usize * options.rows as usize;
    if cells < sources {
        return Err(ConvertError::LayoutOverflow {
            columns: options.columns,
            rows: options.rows,
            sources,
        });
    }
    if cells == 0 {
        return Err(ConvertError::InvalidConfiguration(format!(
            "Layout {}x{} has no cells",
            options.columns, options.rows
        )));
    }
    Ok(())
}

pub fn montage_args(
    slots: &[SlotOutcome],
    geometry: &MosaicGeometry,
    options: &NormalizedOptions,
    destination: &Path,
) -> Vec<OsString> {
    let mut args: Vec<OsString> = slots.iter().map(SlotOutcome::tile).collect();
    args.push("-tile".into());
    args.push(format!("{}x{}", options.columns, options.rows).into());
    args.push("-geometry".into());
    args.push(geometry.geometry_arg().into());
    args.push("-background".into());
    args.push(options.background.clone().into());
    args.push("-gravity".into());
    args.push("Center".into());
    if options.trim {
        args.push("-trim".into());
    }
    args.push(destination.into());
    args
}

/// In-place pass over the montage: shave the cell padding, then optional border and rotation.
pub fn post_process_args(
    geometry: &MosaicGeometry,
    options: &NormalizedOptions,
    destination: &Path,
) -> Vec<OsString> {
    let mut args: Vec<OsString> = vec![
        destination.into(),
        "-shave".into(),
        format!("{}x{}", geometry.padding, geometry.padding).into(),
        "+repage".into(),
    ];
    if options.page_margin != 0.0 {
        args.push("-bordercolor".into());
        args.push(options.background.clone().into());
        args.push("-border".into());
        args.push(options.page_margin.to_string().into());
        args.push("+repage".into());
    }
    if options.page_rotation != 0.0 {
        args.push("-rotate".into());
        args.push(options.page_rotation.to_string().into());
    }
    args.push(destination.into());
    args
}

impl<R: ToolRunner> DcmConverter<R> {
    /// Compose `sources` into a `columns x rows` grid written to `destination`.
    ///
    /// `None` (or a blank path) keeps its cell empty. Every slot is converted concurrently
    /// and all of them settle before the montage starts; a slot that fails to convert is
    /// drawn as an empty cell instead of failing the composition. Only the montage and the
    /// post-processing pass can reject the whole call.
    pub async fn mosaic(
        &self,
        format: &str,
        sources: &[Option<DicomSource>],
        destination: &Path,
        config: &ConvertOptions,
    ) -> Result<Mosaic> {
        let format: RasterFormat = format.parse()?;
        let options = config.normalize(mosaic_defaults(), self.default_dpi)?;
        check_layout(&options, sources.len())?;

        // Blank paths mean the same as `None` from here on.
        let sources: Vec<Option<&DicomSource>> = sources
            .iter()
            .map(|slot| slot.as_ref().filter(|s| !s.is_blank()))
            .collect();
        let slots = self.render_slots(format, &sources, &options).await;
        let geometry = MosaicGeometry::from_options(&options);

        let montage = Invocation::imagemagick(
            MONTAGE,
            montage_args(&slots, &geometry, &options, destination),
        );
        self.runner.run(&montage).await?;

        let post = Invocation::imagemagick(
            CONVERT,
            post_process_args(&geometry, &options, destination),
        );
        self.runner.run(&post).await?;

        let mosaic = Mosaic {
            path: destination.to_path_buf(),
            slots,
        };
        info!(
            output = %destination.display(),
            layout = %format!("{}x{}", options.columns, options.rows),
            failed = mosaic.failed_slots(),
            "Mosaic composed"
        );
        Ok(mosaic)
    }

    /// Convert every slot, collecting one outcome per slot in slot order. Never fails.
    async fn render_slots(
        &self,
        format: RasterFormat,
        sources: &[Option<&DicomSource>],
        options: &NormalizedOptions,
    ) -> Vec<SlotOutcome> {
        let conversions = sources.iter().enumerate().map(|(index, slot)| async move {
            let Some(source) = *slot else {
                return SlotOutcome::Empty;
            };
            let converted = match self.scratch.allocate(None) {
                Ok(target) => self
                    .convert_normalized(format, source, &target, options)
                    .await
                    .map(|()| target),
                Err(err) => Err(err),
            };
            match converted {
                Ok(target) => SlotOutcome::Rendered(target),
                Err(err) => {
                    warn!(slot = index, error = %err, "Slot conversion failed, leaving the cell empty");
                    SlotOutcome::Failed(err.to_string())
                }
            }
        });
        join_all(conversions).await
    }
}
