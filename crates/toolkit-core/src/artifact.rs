//! Artifacts and their export handles
//!
//! An exporter turns an artifact into a transient handle (an object URL in the
//! browser, a path on disk) and owns the lifecycle of that handle.

use crate::error::ToolkitError;
use crate::report::ProcessMetrics;
use std::collections::HashMap;
use std::rc::Rc;

/// Output of a successful transformation
///
/// `bytes` is shared, so exporters can hold on to it without copying.
#[derive(Debug, Clone, PartialEq)]
pub struct Artifact {
    pub filename: String,
    pub mime_type: &'static str,
    pub bytes: Rc<[u8]>,
    pub metrics: ProcessMetrics,
}

/// Wraps artifacts as downloadable handles.
///
/// `release` must tolerate handles that were already released.
pub trait ArtifactExporter {
    type Handle;

    fn wrap(&mut self, artifact: &Artifact) -> Result<Self::Handle, ToolkitError>;

    fn release(&mut self, handle: &Self::Handle);

    fn trigger_download(&mut self, handle: &Self::Handle) -> Result<(), ToolkitError>;
}

/// Handle issued by [`MemoryExporter`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MemoryHandle(u64);

/// Exporter that keeps artifacts in memory and records downloads.
///
/// Used by tests and embedders that collect the bytes themselves.
#[derive(Debug, Default)]
pub struct MemoryExporter {
    next_id: u64,
    live: HashMap<MemoryHandle, Artifact>,
    downloads: Vec<String>,
}

impl MemoryExporter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of handles issued and not yet released
    pub fn live_count(&self) -> usize {
        self.live.len()
    }

    pub fn is_live(&self, handle: &MemoryHandle) -> bool {
        self.live.contains_key(handle)
    }

    /// Bytes behind a live handle
    pub fn bytes(&self, handle: &MemoryHandle) -> Option<&[u8]> {
        self.live.get(handle).map(|a| &a.bytes[..])
    }

    /// Filenames of every download triggered so far
    pub fn downloads(&self) -> &[String] {
        &self.downloads
    }
}

impl ArtifactExporter for MemoryExporter {
    type Handle = MemoryHandle;

    fn wrap(&mut self, artifact: &Artifact) -> Result<MemoryHandle, ToolkitError> {
        self.next_id += 1;
        let handle = MemoryHandle(self.next_id);
        self.live.insert(handle, artifact.clone());
        Ok(handle)
    }

    fn release(&mut self, handle: &MemoryHandle) {
        self.live.remove(handle);
    }

    fn trigger_download(&mut self, handle: &MemoryHandle) -> Result<(), ToolkitError> {
        let artifact = self.live.get(handle).ok_or_else(|| {
            ToolkitError::OperationError("Download link is no longer available".into())
        })?;
        self.downloads.push(artifact.filename.clone());
        Ok(())
    }
}
