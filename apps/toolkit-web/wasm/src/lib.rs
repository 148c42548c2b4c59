//! WASM bindings for the PDF toolkit
//!
//! This module provides a stateful, session-based API for the toolkit's
//! tools. All state is held in Rust, minimizing JavaScript complexity.
//!
//! ## Architecture
//!
//! - State management in Rust via `ToolkitSession`
//! - File bytes read lazily from browser `File` objects
//! - Results exported as object URLs, revoked when superseded
//! - JavaScript only handles DOM events and rendering
//!
//! ## Usage (JavaScript)
//!
//! ```javascript
//! import init, { ToolkitSession } from './pkg/toolkit_wasm.js';
//!
//! await init();
//!
//! const session = new ToolkitSession("merge-pdf");
//! session.selectFiles(input.files);
//! session.moveFileDown(0);
//! const snapshot = await session.process();
//! if (snapshot.status === "succeeded") session.download();
//! session.reset();
//! ```

pub mod blob_export;
pub mod browser_file;
pub mod session;

use wasm_bindgen::prelude::*;

// Re-export main types for JavaScript
pub use blob_export::{BlobUrlExporter, ObjectUrl};
pub use session::ToolkitSession;

/// Initialize the WASM module
/// Called automatically by wasm-bindgen
#[wasm_bindgen(start)]
pub fn init() {
    console_error_panic_hook::set_once();
}

/// Get the library version
#[wasm_bindgen]
pub fn get_version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

/// Profiles of every available tool, in dashboard order
#[wasm_bindgen]
pub fn list_tools() -> Result<JsValue, JsValue> {
    serde_wasm_bindgen::to_value(toolkit_core::profile::all_profiles())
        .map_err(|e| JsValue::from_str(&format!("Serialization error: {}", e)))
}

/// Get page count from PDF bytes (convenience function)
#[wasm_bindgen]
pub fn get_page_count(bytes: &[u8]) -> Result<u32, JsValue> {
    toolkit_core::get_page_count(bytes).map_err(|e| JsValue::from_str(&e.to_string()))
}

/// Format bytes as human-readable string
#[wasm_bindgen]
pub fn format_bytes(bytes: f64) -> String {
    toolkit_core::format_file_size(bytes.max(0.0) as u64)
}
