//
// toolkit.rs
// Dicom-Convert-rs
//
// Describes invocations of the external DCMTK and ImageMagick programs and runs them as child processes.
//
// Thales Matheus Mendonça Santos - December 2025

use std::ffi::OsString;
use std::path::PathBuf;
use std::process::Stdio;

use tokio::process::Command;
use tracing::debug;

use crate::error::{ConvertError, Result};

/// DCMTK: DICOM to raster image.
pub const DCMJ2PNM: &str = "dcmj2pnm";
/// DCMTK: DICOM to JPEG-LS lossless.
pub const DCMCJPLS: &str = "dcmcjpls";
/// ImageMagick: tile several images into one.
pub const MONTAGE: &str = "montage";
/// ImageMagick: single image processing.
pub const CONVERT: &str = "convert";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Toolkit {
    Dcmtk,
    ImageMagick,
}

/// One external program call with its full argument vector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub toolkit: Toolkit,
    pub program: &'static str,
    pub args: Vec<OsString>,
}

impl Invocation {
    pub fn dcmtk(program: &'static str, args: Vec<OsString>) -> Self {
        Self {
            toolkit: Toolkit::Dcmtk,
            program,
            args,
        }
    }

    pub fn imagemagick(program: &'static str, args: Vec<OsString>) -> Self {
        Self {
            toolkit: Toolkit::ImageMagick,
            program,
            args,
        }
    }

    /// Arguments as UTF-8 text, replacing anything that is not.
    pub fn args_lossy(&self) -> Vec<String> {
        self.args
            .iter()
            .map(|a| a.to_string_lossy().into_owned())
            .collect()
    }
}

/// Executes invocations. Operations only talk to the toolkits through this trait.
#[allow(async_fn_in_trait)]
pub trait ToolRunner: Send + Sync {
    async fn run(&self, invocation: &Invocation) -> Result<()>;
}

/// Where each toolkit's executables live. `None` means "search PATH".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ToolkitPaths {
    pub dcmtk_dir: Option<PathBuf>,
    pub imagemagick_dir: Option<PathBuf>,
}

impl ToolkitPaths {
    pub fn executable(&self, toolkit: Toolkit, program: &str) -> PathBuf {
        let dir = match toolkit {
            Toolkit::Dcmtk => self.dcmtk_dir.as_ref(),
            Toolkit::ImageMagick => self.imagemagick_dir.as_ref(),
        };
        match dir {
            Some(dir) => dir.join(program),
            None => PathBuf::from(program),
        }
    }
}

/// Runs invocations as real child processes.
#[derive(Debug, Clone, Default)]
pub struct SystemRunner {
    paths: ToolkitPaths,
}

impl SystemRunner {
    pub fn new(paths: ToolkitPaths) -> Self {
        Self { paths }
    }

    pub fn paths(&self) -> &ToolkitPaths {
        &self.paths
    }

    /// Check whether a program can be launched and answers its version query.
    pub async fn probe(&self, toolkit: Toolkit, program: &str) -> bool {
        let version_flag = match toolkit {
            Toolkit::Dcmtk => "--version",
            Toolkit::ImageMagick => "-version",
        };
        Command::new(self.paths.executable(toolkit, program))
            .arg(version_flag)
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await
            .map(|s| s.success())
            .unwrap_or(false)
    }
}

impl ToolRunner for SystemRunner {
    async fn run(&self, invocation: &Invocation) -> Result<()> {
        let executable = self.paths.executable(invocation.toolkit, invocation.program);
        debug!(
            program = %executable.display(),
            args = ?invocation.args_lossy(),
            "Invoking external toolkit"
        );

        let output = Command::new(&executable)
            .args(&invocation.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|source| ConvertError::Launch {
                program: executable.display().to_string(),
                source,
            })?;

        if output.status.success() {
            return Ok(());
        }

        // Prefer stderr, but some tools only report on stdout.
        let stderr = String::from_utf8_lossy(&output.stderr);
        let message = if stderr.trim().is_empty() {
            String::from_utf8_lossy(&output.stdout).trim().to_string()
        } else {
            stderr.trim().to_string()
        };
        Err(ConvertError::Toolkit {
            program: invocation.program.to_string(),
            status: output.status.code(),
            stderr: message,
        })
    }
}
