//! Browser-backed file content
//!
//! Files picked or dropped in the page are read lazily through
//! `Blob.arrayBuffer()`, once per transformation attempt.

use futures::future::LocalBoxFuture;
use std::rc::Rc;
use toolkit_core::{ContentSource, SelectedFile, ToolkitError};
use wasm_bindgen_futures::JsFuture;

/// A `File` handed over by the file picker or a drop event
pub struct BrowserFile {
    file: web_sys::File,
}

impl BrowserFile {
    pub fn new(file: web_sys::File) -> Self {
        Self { file }
    }
}

impl ContentSource for BrowserFile {
    fn read(&self) -> LocalBoxFuture<'_, Result<Vec<u8>, ToolkitError>> {
        Box::pin(async move {
            let buffer = JsFuture::from(self.file.array_buffer())
                .await
                .map_err(|e| ToolkitError::Read {
                    name: self.file.name(),
                    reason: format!("{:?}", e),
                })?;
            Ok(js_sys::Uint8Array::new(&buffer).to_vec())
        })
    }
}

/// Wrap a browser `File` as a staged file without reading it
pub fn selected_file(file: web_sys::File) -> SelectedFile {
    let name = file.name();
    let mime_type = file.type_();
    let size_bytes = file.size().max(0.0) as u64;
    SelectedFile::new(name, size_bytes, mime_type, Rc::new(BrowserFile::new(file)))
}

/// Collect every file of a `FileList`, in list order
pub fn from_file_list(list: &web_sys::FileList) -> Vec<SelectedFile> {
    (0..list.length())
        .filter_map(|i| list.get(i))
        .map(selected_file)
        .collect()
}
