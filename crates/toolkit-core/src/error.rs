use thiserror::Error;

/// Rejections raised before a transformation starts.
///
/// These never move the pipeline out of its current state.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("{message}")]
    TooManyFiles { tool: &'static str, message: String },

    #[error("Invalid rotation angle: {0} (expected 90, 180, 270 or 360)")]
    InvalidRotationAngle(i32),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ToolkitError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Failed to parse PDF '{name}': {reason}")]
    InvalidPdfInput { name: String, reason: String },

    #[error("Unsupported image format: {0}")]
    UnsupportedImageFormat(String),

    #[error("Failed to decode image '{name}': {reason}")]
    InvalidImage { name: String, reason: String },

    #[error("Generated file does not have valid PDF header")]
    CorruptOutput,

    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    #[error("File index {index} is out of range ({len} files selected)")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("Failed to read '{name}': {reason}")]
    Read { name: String, reason: String },

    #[error("A file is already being processed")]
    Busy,

    #[error("PDF operation failed: {0}")]
    OperationError(String),
}

impl ToolkitError {
    /// Configuration defects, as opposed to conditions a user can recover from.
    pub fn is_fatal(&self) -> bool {
        matches!(self, ToolkitError::UnknownTool(_))
    }
}
