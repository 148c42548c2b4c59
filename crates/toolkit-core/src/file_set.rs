//! Staged input files
//!
//! `FileSet` is the ordered collection of files the user has selected. Order is
//! meaningful: it becomes document order for merges and page order for
//! image conversion.

use crate::error::ToolkitError;
use crate::profile::ToolProfile;
use futures::future::{self, LocalBoxFuture};
use std::fmt;
use std::rc::Rc;

/// Something that can produce the bytes of a selected file on demand.
///
/// Browser files are read through a promise, so reading is asynchronous and
/// may fail. Implementations are read once per transformation attempt.
pub trait ContentSource {
    fn read(&self) -> LocalBoxFuture<'_, Result<Vec<u8>, ToolkitError>>;
}

/// File content already held in memory
#[derive(Debug, Clone)]
pub struct MemoryContent(Rc<[u8]>);

impl MemoryContent {
    pub fn new(bytes: impl Into<Rc<[u8]>>) -> Self {
        Self(bytes.into())
    }
}

impl ContentSource for MemoryContent {
    fn read(&self) -> LocalBoxFuture<'_, Result<Vec<u8>, ToolkitError>> {
        Box::pin(future::ready(Ok(self.0.to_vec())))
    }
}

/// A file chosen by the user
#[derive(Clone)]
pub struct SelectedFile {
    pub name: String,
    pub size_bytes: u64,
    pub mime_type: String,
    content: Rc<dyn ContentSource>,
}

impl SelectedFile {
    pub fn new(
        name: impl Into<String>,
        size_bytes: u64,
        mime_type: impl Into<String>,
        content: Rc<dyn ContentSource>,
    ) -> Self {
        Self {
            name: name.into(),
            size_bytes,
            mime_type: mime_type.into(),
            content,
        }
    }

    /// Build a file whose bytes are already loaded
    pub fn from_bytes(
        name: impl Into<String>,
        mime_type: impl Into<String>,
        bytes: impl Into<Vec<u8>>,
    ) -> Self {
        let bytes = bytes.into();
        let size_bytes = bytes.len() as u64;
        Self::new(
            name,
            size_bytes,
            mime_type,
            Rc::new(MemoryContent::new(bytes)),
        )
    }

    /// Read the file's bytes
    pub async fn read(&self) -> Result<Vec<u8>, ToolkitError> {
        tracing::debug!(name = %self.name, size = self.size_bytes, "reading file");
        self.content.read().await
    }
}

impl fmt::Debug for SelectedFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SelectedFile")
            .field("name", &self.name)
            .field("size_bytes", &self.size_bytes)
            .field("mime_type", &self.mime_type)
            .finish_non_exhaustive()
    }
}

/// Direction for moving a file one slot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
}

impl Direction {
    pub fn reverse(self) -> Self {
        match self {
            Direction::Up => Direction::Down,
            Direction::Down => Direction::Up,
        }
    }
}

/// Ordered, mutable collection of selected files
#[derive(Debug, Clone, Default)]
pub struct FileSet {
    files: Vec<SelectedFile>,
}

impl FileSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply a fresh selection batch.
    ///
    /// Multi-file tools append the batch; single-file tools replace the set
    /// with at most the first file of the batch.
    pub fn set_from_selection(&mut self, batch: Vec<SelectedFile>, profile: &ToolProfile) {
        if profile.allows_multiple {
            self.files.extend(batch);
        } else {
            self.files = batch.into_iter().take(1).collect();
        }
    }

    /// Remove and return the file at `index`
    pub fn remove_at(&mut self, index: usize) -> Result<SelectedFile, ToolkitError> {
        if index >= self.files.len() {
            return Err(ToolkitError::IndexOutOfRange {
                index,
                len: self.files.len(),
            });
        }
        Ok(self.files.remove(index))
    }

    /// Swap the file at `index` with its neighbour.
    ///
    /// Returns false, leaving the order untouched, when the move would leave
    /// the bounds of the set.
    pub fn swap_adjacent(&mut self, index: usize, direction: Direction) -> bool {
        let target = match direction {
            Direction::Up => index.checked_sub(1),
            Direction::Down => index.checked_add(1),
        };
        match target {
            Some(target) if index < self.files.len() && target < self.files.len() => {
                self.files.swap(index, target);
                true
            }
            _ => false,
        }
    }

    pub fn clear(&mut self) {
        self.files.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn get(&self, index: usize) -> Option<&SelectedFile> {
        self.files.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, SelectedFile> {
        self.files.iter()
    }

    pub fn as_slice(&self) -> &[SelectedFile] {
        &self.files
    }

    /// Sum of the declared file sizes
    pub fn total_size(&self) -> u64 {
        self.files.iter().map(|f| f.size_bytes).sum()
    }
}

impl<'a> IntoIterator for &'a FileSet {
    type Item = &'a SelectedFile;
    type IntoIter = std::slice::Iter<'a, SelectedFile>;

    fn into_iter(self) -> Self::IntoIter {
        self.files.iter()
    }
}
