//
// source.rs
// Dicom-Convert-rs
//
// DICOM inputs accepted by every operation: a file on disk or an in-memory dataset that is serialized to scratch space on demand.
//
// Thales Matheus Mendonça Santos - December 2025

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use dicom::object::DefaultDicomObject;

use crate::error::{ConvertError, Result};
use crate::scratch::ScratchSpace;

/// Anything that can write itself out as a DICOM file.
pub trait DatasetWriter: Send + Sync {
    fn serialize_to(&self, path: &Path) -> anyhow::Result<()>;
}

impl DatasetWriter for DefaultDicomObject {
    fn serialize_to(&self, path: &Path) -> anyhow::Result<()> {
        self.write_to_file(path)
            .with_context(|| format!("Failed to write DICOM file {:?}", path))
    }
}

#[derive(Clone)]
pub enum DicomSource {
    Path(PathBuf),
    Dataset(Arc<dyn DatasetWriter>),
}

impl DicomSource {
    pub fn dataset(dataset: impl DatasetWriter + 'static) -> Self {
        DicomSource::Dataset(Arc::new(dataset))
    }

    /// An empty path marks an unused mosaic cell.
    pub fn is_blank(&self) -> bool {
        matches!(self, DicomSource::Path(path) if path.as_os_str().is_empty())
    }

    /// Produce a file path the toolkits can read. Datasets are written to a fresh scratch path;
    /// the dataset itself is never modified.
    pub fn materialize(&self, scratch: &ScratchSpace) -> Result<PathBuf> {
        match self {
            DicomSource::Path(path) => Ok(path.clone()),
            DicomSource::Dataset(dataset) => {
                let path = scratch.allocate(None)?;
                dataset
                    .serialize_to(&path)
                    .map_err(|source| ConvertError::SourceWrite {
                        path: path.clone(),
                        source,
                    })?;
                Ok(path)
            }
        }
    }
}

impl fmt::Debug for DicomSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DicomSource::Path(path) => f.debug_tuple("Path").field(path).finish(),
            DicomSource::Dataset(_) => f.write_str("Dataset(..)"),
        }
    }
}

impl From<PathBuf> for DicomSource {
    fn from(path: PathBuf) -> Self {
        DicomSource::Path(path)
    }
}

impl From<&Path> for DicomSource {
    fn from(path: &Path) -> Self {
        DicomSource::Path(path.to_path_buf())
    }
}

impl From<&str> for DicomSource {
    fn from(path: &str) -> Self {
        DicomSource::Path(PathBuf::from(path))
    }
}

impl From<DefaultDicomObject> for DicomSource {
    fn from(dataset: DefaultDicomObject) -> Self {
        DicomSource::dataset(dataset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::bail;
    use tempfile::tempdir;

    struct BrokenDataset;

    impl DatasetWriter for BrokenDataset {
        fn serialize_to(&self, _path: &Path) -> anyhow::Result<()> {
            bail!("disk full")
        }
    }

    #[test]
    fn paths_are_used_as_is() {
        let dir = tempdir().expect("tmpdir");
        let scratch = ScratchSpace::new(dir.path()).expect("scratch");
        let source = DicomSource::from("/data/study/IM0001.dcm");

        let resolved = source.materialize(&scratch).expect("materialize");
        assert_eq!(resolved, PathBuf::from("/data/study/IM0001.dcm"));
        assert_eq!(fs_entries(dir.path()), 0);
    }

    #[test]
    fn failed_serialization_is_wrapped() {
        let dir = tempdir().expect("tmpdir");
        let scratch = ScratchSpace::new(dir.path()).expect("scratch");

        let err = DicomSource::dataset(BrokenDataset)
            .materialize(&scratch)
            .unwrap_err();
        match err {
            ConvertError::SourceWrite { path, source } => {
                assert!(path.starts_with(dir.path()));
                assert_eq!(source.to_string(), "disk full");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn blank_paths_mark_empty_cells() {
        assert!(DicomSource::from("").is_blank());
        assert!(!DicomSource::from("a.dcm").is_blank());
        assert!(!DicomSource::dataset(BrokenDataset).is_blank());
    }

    fn fs_entries(dir: &Path) -> usize {
        std::fs::read_dir(dir).expect("read dir").count()
    }
}
