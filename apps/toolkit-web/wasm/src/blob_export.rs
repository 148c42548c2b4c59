//! Object-URL export of artifacts
//!
//! Each artifact becomes a `Blob` behind an object URL. URLs are revoked when
//! the pipeline supersedes or discards the artifact.

use std::collections::HashSet;
use toolkit_core::{Artifact, ArtifactExporter, ToolkitError};
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{Blob, BlobPropertyBag, HtmlElement, Url};

/// A live object URL and the filename to save it under
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectUrl {
    pub url: String,
    pub filename: String,
}

/// Exporter creating `blob:` URLs and saving them through a temporary anchor
#[derive(Debug, Default)]
pub struct BlobUrlExporter {
    live: HashSet<String>,
}

impl BlobUrlExporter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of object URLs not yet revoked
    pub fn live_count(&self) -> usize {
        self.live.len()
    }
}

fn js_error(context: &str, err: JsValue) -> ToolkitError {
    ToolkitError::OperationError(format!("{}: {:?}", context, err))
}

impl ArtifactExporter for BlobUrlExporter {
    type Handle = ObjectUrl;

    fn wrap(&mut self, artifact: &Artifact) -> Result<ObjectUrl, ToolkitError> {
        let bytes = js_sys::Uint8Array::from(&artifact.bytes[..]);
        let parts = js_sys::Array::of1(&bytes);

        let options = BlobPropertyBag::new();
        options.set_type(artifact.mime_type);

        let blob = Blob::new_with_u8_array_sequence_and_options(&parts, &options)
            .map_err(|e| js_error("Failed to create blob", e))?;
        let url = Url::create_object_url_with_blob(&blob)
            .map_err(|e| js_error("Failed to create object URL", e))?;

        self.live.insert(url.clone());
        Ok(ObjectUrl {
            url,
            filename: artifact.filename.clone(),
        })
    }

    fn release(&mut self, handle: &ObjectUrl) {
        if !self.live.remove(&handle.url) {
            return;
        }
        if let Err(e) = Url::revoke_object_url(&handle.url) {
            tracing::error!(url = %handle.url, error = ?e, "failed to revoke object URL");
        }
    }

    fn trigger_download(&mut self, handle: &ObjectUrl) -> Result<(), ToolkitError> {
        if !self.live.contains(&handle.url) {
            return Err(ToolkitError::OperationError(
                "Download link is no longer available".into(),
            ));
        }

        let document = web_sys::window()
            .and_then(|w| w.document())
            .ok_or_else(|| ToolkitError::OperationError("No document available".into()))?;

        let anchor = document
            .create_element("a")
            .map_err(|e| js_error("Failed to create link", e))?;
        anchor
            .set_attribute("href", &handle.url)
            .map_err(|e| js_error("Failed to set link target", e))?;
        anchor
            .set_attribute("download", &handle.filename)
            .map_err(|e| js_error("Failed to set download name", e))?;

        let anchor: HtmlElement = anchor
            .dyn_into()
            .map_err(|_| ToolkitError::OperationError("Link is not an HTML element".into()))?;
        anchor.click();
        Ok(())
    }
}

#[cfg(all(test, target_arch = "wasm32"))]
mod tests {
    use super::*;
    use toolkit_core::{ProcessMetrics, PDF_MIME};
    use wasm_bindgen_test::*;

    wasm_bindgen_test_configure!(run_in_browser);

    fn artifact() -> Artifact {
        Artifact {
            filename: "rotated-pdf.pdf".into(),
            mime_type: PDF_MIME,
            bytes: std::rc::Rc::from(&b"%PDF-1.7\n%%EOF"[..]),
            metrics: ProcessMetrics::default(),
        }
    }

    #[wasm_bindgen_test]
    fn test_wrap_creates_blob_url() {
        let mut exporter = BlobUrlExporter::new();
        let handle = exporter.wrap(&artifact()).unwrap();

        assert!(handle.url.starts_with("blob:"));
        assert_eq!(handle.filename, "rotated-pdf.pdf");
        assert_eq!(exporter.live_count(), 1);
    }

    #[wasm_bindgen_test]
    fn test_release_twice_is_noop() {
        let mut exporter = BlobUrlExporter::new();
        let handle = exporter.wrap(&artifact()).unwrap();

        exporter.release(&handle);
        exporter.release(&handle);
        assert_eq!(exporter.live_count(), 0);
        assert!(exporter.trigger_download(&handle).is_err());
    }
}
