//
// error.rs
// Dicom-Convert-rs
//
// Error kinds surfaced by the conversion library: validation failures raised before any process starts and failures reported by the external toolkits.
//
// Thales Matheus Mendonça Santos - December 2025

use std::path::PathBuf;

use thiserror::Error;

pub type Result<T, E = ConvertError> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum ConvertError {
    /// A measurement or option could not be interpreted (e.g. physical unit with no DPI).
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// An in-memory dataset could not be serialized to its scratch path.
    #[error("Unable to write DICOM dataset to {path:?}")]
    SourceWrite {
        path: PathBuf,
        #[source]
        source: anyhow::Error,
    },

    #[error("Unsupported output format: {0}")]
    UnsupportedFormat(String),

    #[error("Layout {columns}x{rows} has {} cells but {sources} sources were supplied", .columns * .rows)]
    LayoutOverflow {
        columns: u32,
        rows: u32,
        sources: usize,
    },

    /// The external program ran and reported a failure.
    #[error("{program} failed ({}): {stderr}", describe_status(.status))]
    Toolkit {
        program: String,
        status: Option<i32>,
        stderr: String,
    },

    #[error("Failed to launch {program}")]
    Launch {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Scratch space error at {path:?}")]
    Scratch {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to read configuration from {path:?}")]
    Config {
        path: PathBuf,
        #[source]
        source: anyhow::Error,
    },
}

fn describe_status(status: &Option<i32>) -> String {
    match status {
        Some(code) => format!("exit code {code}"),
        None => "terminated by signal".to_string(),
    }
}
