//
// lib.rs
// Dicom-Convert-rs
//
// Exposes the conversion library (compress, single-image convert, mosaic) and re-exports the CLI entry point.
//
// Thales Matheus Mendonça Santos - December 2025

// Public surface of the library: operations hang off `DcmConverter`, helpers live in their own modules.
pub mod cli;
pub mod compress;
pub mod config;
pub mod convert;
pub mod converter;
pub mod error;
pub mod mosaic;
pub mod options;
pub mod scratch;
pub mod source;
pub mod toolkit;
pub mod units;

pub use cli::{run as run_cli, Cli, Commands};
pub use config::ConverterConfig;
pub use convert::RasterFormat;
pub use converter::DcmConverter;
pub use error::{ConvertError, Result};
pub use mosaic::{Mosaic, SlotOutcome};
pub use options::{ConvertOptions, NormalizedOptions};
pub use scratch::{ScratchSpace, SweepReport};
pub use source::{DatasetWriter, DicomSource};
pub use toolkit::{Invocation, SystemRunner, ToolRunner, Toolkit, ToolkitPaths};
pub use units::{normalize, string_to_pixels, to_pixels, Dimension};
