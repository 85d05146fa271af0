//
// convert.rs
// Dicom-Convert-rs
//
// Converts a single DICOM source into a JPEG, TIFF, BMP or PNG file through dcmj2pnm.
//
// Thales Matheus Mendonça Santos - December 2025

use std::ffi::OsString;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde_json::json;
use tracing::info;

use crate::converter::DcmConverter;
use crate::error::{ConvertError, Result};
use crate::options::{ConvertOptions, NormalizedOptions};
use crate::source::DicomSource;
use crate::toolkit::{Invocation, ToolRunner, DCMJ2PNM};

/// Raster formats dcmj2pnm can write.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum RasterFormat {
    Jpg,
    Jpeg,
    Tiff,
    Bmp,
    Png,
}

impl RasterFormat {
    fn write_flag(self) -> &'static str {
        match self {
            RasterFormat::Jpg | RasterFormat::Jpeg => "--write-jpeg",
            RasterFormat::Tiff => "--write-tiff",
            RasterFormat::Bmp => "--write-bmp",
            RasterFormat::Png => "--write-png",
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            RasterFormat::Jpg => "jpg",
            RasterFormat::Jpeg => "jpeg",
            RasterFormat::Tiff => "tiff",
            RasterFormat::Bmp => "bmp",
            RasterFormat::Png => "png",
        }
    }
}

impl FromStr for RasterFormat {
    type Err = ConvertError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "jpg" => Ok(RasterFormat::Jpg),
            "jpeg" => Ok(RasterFormat::Jpeg),
            "tiff" => Ok(RasterFormat::Tiff),
            "bmp" => Ok(RasterFormat::Bmp),
            "png" => Ok(RasterFormat::Png),
            _ => Err(ConvertError::UnsupportedFormat(s.to_string())),
        }
    }
}

impl fmt::Display for RasterFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// dcmj2pnm orientation flag for the requested flips, if any.
fn flip_flag(flip_h: bool, flip_v: bool) -> Option<&'static str> {
    match (flip_h, flip_v) {
        (true, true) => Some("+Lhv"),
        (true, false) => Some("+Lh"),
        (false, true) => Some("+Lv"),
        (false, false) => None,
    }
}

/// Argument vector for dcmj2pnm: `<write flag> <input> [--compr-quality Q] [flip] <output>`.
pub fn dcmj2pnm_args(
    format: RasterFormat,
    input: &Path,
    output: &Path,
    options: &NormalizedOptions,
) -> Vec<OsString> {
    let mut args: Vec<OsString> = vec![format.write_flag().into(), input.into()];
    if matches!(format, RasterFormat::Jpg | RasterFormat::Jpeg) {
        args.push("--compr-quality".into());
        args.push(options.quality.to_string().into());
    }
    if let Some(flag) = flip_flag(options.flip_h, options.flip_v) {
        args.push(flag.into());
    }
    args.push(output.into());
    args
}

impl<R: ToolRunner> DcmConverter<R> {
    /// Convert `source` into `destination` using the given raster format name.
    ///
    /// The format is checked before anything touches the filesystem. Whatever the outcome,
    /// the scratch space is swept once the conversion has settled.
    pub async fn convert(
        &self,
        format: &str,
        source: &DicomSource,
        destination: &Path,
        options: &ConvertOptions,
    ) -> Result<()> {
        let format: RasterFormat = format.parse()?;
        let options = options.normalize(json!({}), self.default_dpi)?;
        self.convert_normalized(format, source, destination, &options)
            .await
    }

    pub(crate) async fn convert_normalized(
        &self,
        format: RasterFormat,
        source: &DicomSource,
        destination: &Path,
        options: &NormalizedOptions,
    ) -> Result<()> {
        let result = self.render(format, source, destination, options).await;
        self.scratch.sweep();
        result
    }

    async fn render(
        &self,
        format: RasterFormat,
        source: &DicomSource,
        destination: &Path,
        options: &NormalizedOptions,
    ) -> Result<()> {
        let input = source.materialize(&self.scratch)?;
        let invocation =
            Invocation::dcmtk(DCMJ2PNM, dcmj2pnm_args(format, &input, destination, options));
        self.runner.run(&invocation).await?;
        info!(
            input = %input.display(),
            output = %destination.display(),
            %format,
            "Converted DICOM image"
        );
        Ok(())
    }
}
