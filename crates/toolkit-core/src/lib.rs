//! PDF toolkit core
//!
//! Client-side PDF tools built on lopdf: merge several PDFs, rotate every page
//! of a PDF, and turn PNG/JPEG images into a PDF.
//!
//! - [`FileSet`]: ordered staging area for the user's files
//! - [`profile`]: static registry of per-tool constraints
//! - [`engine`]: the transformations themselves
//! - [`ProcessingPipeline`]: the state machine tying them together
//! - [`ArtifactExporter`]: lifecycle of the downloadable result

pub mod artifact;
pub mod engine;
pub mod error;
pub mod file_set;
pub mod pipeline;
pub mod profile;
pub mod report;

pub use artifact::{Artifact, ArtifactExporter, MemoryExporter, MemoryHandle};
pub use engine::{LopdfEngine, Transform, TransformOutput, TransformRequest};
pub use error::{ToolkitError, ValidationError};
pub use file_set::{ContentSource, Direction, FileSet, MemoryContent, SelectedFile};
pub use pipeline::{JobOutcome, PendingJob, PipelineConfig, PipelineState, ProcessingPipeline};
pub use profile::{RotationAngle, ToolId, ToolProfile, PDF_MIME};
pub use report::{format_file_size, ProcessMetrics, SessionSnapshot, Status};

/// Parse PDF bytes and return page count
pub fn get_page_count(bytes: &[u8]) -> Result<u32, ToolkitError> {
    let doc = lopdf::Document::load_mem(bytes).map_err(|e| ToolkitError::InvalidPdfInput {
        name: "document".to_string(),
        reason: e.to_string(),
    })?;
    Ok(doc.get_pages().len() as u32)
}
