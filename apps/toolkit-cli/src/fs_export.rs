//! Export of artifacts to a directory on disk

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use toolkit_core::{Artifact, ArtifactExporter, ToolkitError};

/// Handle to an artifact staged for saving
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StagedArtifact(u64);

/// Keeps artifacts in memory until a download writes them to `out_dir`.
///
/// Downloads write with blocking `std::fs` calls: the exporter interface is
/// synchronous and the CLI writes a single file per run.
#[derive(Debug)]
pub struct FsExporter {
    out_dir: PathBuf,
    next_id: u64,
    staged: HashMap<StagedArtifact, (String, Rc<[u8]>)>,
    written: Vec<PathBuf>,
}

impl FsExporter {
    pub fn new(out_dir: impl Into<PathBuf>) -> Self {
        Self {
            out_dir: out_dir.into(),
            next_id: 0,
            staged: HashMap::new(),
            written: Vec::new(),
        }
    }

    pub fn out_dir(&self) -> &Path {
        &self.out_dir
    }

    /// Paths written by downloads so far
    pub fn written(&self) -> &[PathBuf] {
        &self.written
    }
}

impl ArtifactExporter for FsExporter {
    type Handle = StagedArtifact;

    fn wrap(&mut self, artifact: &Artifact) -> Result<StagedArtifact, ToolkitError> {
        self.next_id += 1;
        let handle = StagedArtifact(self.next_id);
        self.staged
            .insert(handle, (artifact.filename.clone(), Rc::clone(&artifact.bytes)));
        Ok(handle)
    }

    fn release(&mut self, handle: &StagedArtifact) {
        self.staged.remove(handle);
    }

    fn trigger_download(&mut self, handle: &StagedArtifact) -> Result<(), ToolkitError> {
        let (filename, bytes) = self.staged.get(handle).ok_or_else(|| {
            ToolkitError::OperationError("Download link is no longer available".into())
        })?;

        std::fs::create_dir_all(&self.out_dir).map_err(|e| {
            ToolkitError::OperationError(format!(
                "Cannot create output directory {}: {}",
                self.out_dir.display(),
                e
            ))
        })?;

        let path = self.out_dir.join(filename);
        std::fs::write(&path, bytes).map_err(|e| {
            ToolkitError::OperationError(format!("Cannot write {}: {}", path.display(), e))
        })?;

        tracing::debug!(path = %path.display(), bytes = bytes.len(), "artifact written");
        self.written.push(path);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use toolkit_core::{ProcessMetrics, PDF_MIME};

    fn artifact() -> Artifact {
        Artifact {
            filename: "images-to-pdf.pdf".into(),
            mime_type: PDF_MIME,
            bytes: Rc::from(&b"%PDF-1.7"[..]),
            metrics: ProcessMetrics::default(),
        }
    }

    #[test]
    fn test_download_writes_into_out_dir() {
        let dir = tempfile::tempdir().unwrap();
        let out_dir = dir.path().join("nested");
        let mut exporter = FsExporter::new(&out_dir);

        let handle = exporter.wrap(&artifact()).unwrap();
        exporter.trigger_download(&handle).unwrap();

        let path = out_dir.join("images-to-pdf.pdf");
        assert_eq!(exporter.written(), [path.clone()]);
        assert_eq!(std::fs::read(path).unwrap(), b"%PDF-1.7");
    }

    #[test]
    fn test_released_handle_cannot_download() {
        let dir = tempfile::tempdir().unwrap();
        let mut exporter = FsExporter::new(dir.path());

        let handle = exporter.wrap(&artifact()).unwrap();
        exporter.release(&handle);
        exporter.release(&handle);

        assert!(exporter.trigger_download(&handle).is_err());
        assert!(exporter.written().is_empty());
    }

    #[test]
    fn test_staging_does_not_copy_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let mut exporter = FsExporter::new(dir.path());
        let artifact = artifact();

        let handle = exporter.wrap(&artifact).unwrap();
        assert_eq!(Rc::strong_count(&artifact.bytes), 2);

        exporter.release(&handle);
        assert_eq!(Rc::strong_count(&artifact.bytes), 1);
    }
}
