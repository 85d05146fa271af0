//
// config.rs
// Dicom-Convert-rs
//
// Converter settings (scratch location, DPI default, sweep age, toolkit directories) with JSON-file loading.
//
// Thales Matheus Mendonça Santos - December 2025

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::error::{ConvertError, Result};
use crate::scratch::DEFAULT_MAX_AGE;
use crate::toolkit::ToolkitPaths;
use crate::units::DEFAULT_DPI;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConverterConfig {
    pub scratch_dir: PathBuf,
    pub default_dpi: f64,
    pub scratch_max_age_secs: u64,
    pub dcmtk_dir: Option<PathBuf>,
    pub imagemagick_dir: Option<PathBuf>,
}

impl Default for ConverterConfig {
    fn default() -> Self {
        Self {
            scratch_dir: std::env::temp_dir().join("dicom-convert").join(".temp"),
            default_dpi: DEFAULT_DPI,
            scratch_max_age_secs: DEFAULT_MAX_AGE.as_secs(),
            dcmtk_dir: None,
            imagemagick_dir: None,
        }
    }
}

impl ConverterConfig {
    /// Load a JSON config file. Missing keys keep their defaults.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .context("Failed to read config file")
            .map_err(|source| ConvertError::Config {
                path: path.to_path_buf(),
                source,
            })?;
        serde_json::from_str(&text).map_err(|err| ConvertError::Config {
            path: path.to_path_buf(),
            source: err.into(),
        })
    }

    pub fn scratch_max_age(&self) -> Duration {
        Duration::from_secs(self.scratch_max_age_secs)
    }

    pub fn toolkit_paths(&self) -> ToolkitPaths {
        ToolkitPaths {
            dcmtk_dir: self.dcmtk_dir.clone(),
            imagemagick_dir: self.imagemagick_dir.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn partial_file_keeps_defaults() {
        let dir = tempdir().expect("tmpdir");
        let path = dir.path().join("convert.json");
        fs::write(&path, r#"{"default_dpi": 600, "dcmtk_dir": "/opt/dcmtk/bin"}"#).expect("write");

        let config = ConverterConfig::from_json_file(&path).expect("load");
        assert_eq!(config.default_dpi, 600.0);
        assert_eq!(config.scratch_max_age(), DEFAULT_MAX_AGE);
        assert_eq!(
            config.toolkit_paths().dcmtk_dir,
            Some(PathBuf::from("/opt/dcmtk/bin"))
        );
        assert_eq!(config.toolkit_paths().imagemagick_dir, None);
    }

    #[test]
    fn malformed_file_reports_its_path() {
        let dir = tempdir().expect("tmpdir");
        let path = dir.path().join("broken.json");
        fs::write(&path, "{ not json").expect("write");

        match ConverterConfig::from_json_file(&path) {
            Err(ConvertError::Config { path: reported, .. }) => assert_eq!(reported, path),
            other => panic!("unexpected result: {other:?}"),
        }
        assert!(ConverterConfig::from_json_file(&dir.path().join("missing.json")).is_err());
    }
}
