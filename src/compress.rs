//
// compress.rs
// Dicom-Convert-rs
//
// Re-encodes a DICOM source with the lossless JPEG-LS transfer syntax through dcmcjpls.
//
// Thales Matheus Mendonça Santos - December 2025

use std::path::{Path, PathBuf};

use tracing::info;

use crate::converter::DcmConverter;
use crate::error::Result;
use crate::source::DicomSource;
use crate::toolkit::{Invocation, ToolRunner, DCMCJPLS};

impl<R: ToolRunner> DcmConverter<R> {
    /// Compress `source` into `destination`.
    ///
    /// Resolves to the input file that was handed to the toolkit: the original path, or the
    /// scratch file a dataset was written to. Unlike conversion, no sweep follows.
    pub async fn compress(&self, source: &DicomSource, destination: &Path) -> Result<PathBuf> {
        let input = source.materialize(&self.scratch)?;
        let invocation = Invocation::dcmtk(
            DCMCJPLS,
            vec![input.clone().into_os_string(), destination.into()],
        );
        self.runner.run(&invocation).await?;
        info!(
            input = %input.display(),
            output = %destination.display(),
            "Compressed DICOM file (JPEG-LS lossless)"
        );
        Ok(input)
    }
}
