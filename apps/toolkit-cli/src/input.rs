//! Input files read from disk

use anyhow::Context;
use futures::future::LocalBoxFuture;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use toolkit_core::{ContentSource, SelectedFile, ToolkitError, PDF_MIME};

/// File content read lazily from a path
#[derive(Debug, Clone)]
pub struct DiskFile {
    path: PathBuf,
}

impl DiskFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl ContentSource for DiskFile {
    fn read(&self) -> LocalBoxFuture<'_, Result<Vec<u8>, ToolkitError>> {
        Box::pin(async move {
            tokio::fs::read(&self.path)
                .await
                .map_err(|e| ToolkitError::Read {
                    name: self.path.display().to_string(),
                    reason: e.to_string(),
                })
        })
    }
}

/// MIME type guessed from the file extension
pub fn mime_from_path(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase);

    match ext.as_deref() {
        Some("pdf") => PDF_MIME,
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("bmp") => "image/bmp",
        Some("tif") | Some("tiff") => "image/tiff",
        _ => "application/octet-stream",
    }
}

/// Stage a file on disk without reading its content
pub async fn selected_file(path: &Path) -> anyhow::Result<SelectedFile> {
    let metadata = tokio::fs::metadata(path)
        .await
        .with_context(|| format!("Cannot open input file {}", path.display()))?;
    if !metadata.is_file() {
        anyhow::bail!("Input is not a file: {}", path.display());
    }

    let name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());

    Ok(SelectedFile::new(
        name,
        metadata.len(),
        mime_from_path(path),
        Rc::new(DiskFile::new(path)),
    ))
}
