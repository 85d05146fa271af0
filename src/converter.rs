//
// converter.rs
// Dicom-Convert-rs
//
// The conversion context shared by every operation: scratch space, default DPI and the runner that executes toolkit invocations.
//
// Thales Matheus Mendonça Santos - December 2025

use tracing::debug;

use crate::config::ConverterConfig;
use crate::error::Result;
use crate::scratch::ScratchSpace;
use crate::toolkit::{SystemRunner, ToolRunner};
use crate::units::DEFAULT_DPI;

/// Entry point for compression, single-image conversion and mosaic composition.
///
/// The operations themselves live in [`crate::compress`], [`crate::convert`] and
/// [`crate::mosaic`].
#[derive(Debug)]
pub struct DcmConverter<R = SystemRunner> {
    pub(crate) scratch: ScratchSpace,
    pub(crate) runner: R,
    pub(crate) default_dpi: f64,
}

impl DcmConverter<SystemRunner> {
    /// Build a converter that spawns the real toolkits as configured.
    pub fn from_config(config: &ConverterConfig) -> Result<Self> {
        let scratch =
            ScratchSpace::new(&config.scratch_dir)?.with_max_age(config.scratch_max_age());
        let runner = SystemRunner::new(config.toolkit_paths());
        Ok(Self::new(scratch, runner).with_default_dpi(config.default_dpi))
    }
}

impl<R: ToolRunner> DcmConverter<R> {
    /// Wrap a scratch space and a runner. Leftovers from earlier runs are swept immediately.
    pub fn new(scratch: ScratchSpace, runner: R) -> Self {
        let report = scratch.sweep();
        debug!(
            root = %scratch.root().display(),
            removed = report.removed.len(),
            "Scratch space ready"
        );
        Self {
            scratch,
            runner,
            default_dpi: DEFAULT_DPI,
        }
    }

    pub fn with_default_dpi(mut self, dpi: f64) -> Self {
        self.default_dpi = dpi;
        self
    }

    pub fn scratch(&self) -> &ScratchSpace {
        &self.scratch
    }

    pub fn runner(&self) -> &R {
        &self.runner
    }

    pub fn default_dpi(&self) -> f64 {
        self.default_dpi
    }
}
