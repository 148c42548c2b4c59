//! Stateful tool session
//!
//! Holds one processing pipeline in Rust memory. JavaScript forwards DOM
//! events (file picks, drops, button clicks) and renders the snapshot it gets
//! back.

use crate::blob_export::BlobUrlExporter;
use crate::browser_file;
use std::cell::RefCell;
use std::rc::Rc;
use toolkit_core::{
    Direction, LopdfEngine, ProcessingPipeline, SelectedFile, SessionSnapshot, ToolId,
};
use wasm_bindgen::prelude::*;

type Pipeline = ProcessingPipeline<LopdfEngine, BlobUrlExporter>;

/// One tool page: staged files, processing state and the downloadable result
#[wasm_bindgen]
pub struct ToolkitSession {
    // Shared so `process` can release its borrow while the transformation runs
    pipeline: Rc<RefCell<Pipeline>>,
}

fn to_js(value: &SessionSnapshot) -> Result<JsValue, JsValue> {
    serde_wasm_bindgen::to_value(value)
        .map_err(|e| JsValue::from_str(&format!("Serialization error: {}", e)))
}

impl ToolkitSession {
    /// Internal constructor (testable without JsValue)
    fn new_internal(tool: &str) -> Result<Self, String> {
        let tool = ToolId::from_slug(tool).map_err(|e| e.to_string())?;
        let pipeline = ProcessingPipeline::new(tool, LopdfEngine, BlobUrlExporter::new())
            .map_err(|e| e.to_string())?;
        Ok(Self {
            pipeline: Rc::new(RefCell::new(pipeline)),
        })
    }

    fn select_internal(&self, batch: Vec<SelectedFile>) -> Result<(), String> {
        self.pipeline
            .borrow_mut()
            .select_files(batch)
            .map_err(|e| e.to_string())
    }

    fn remove_internal(&self, index: usize) -> Result<(), String> {
        self.pipeline
            .borrow_mut()
            .remove_file(index)
            .map(|_| ())
            .map_err(|e| e.to_string())
    }

    fn move_internal(&self, index: usize, direction: Direction) -> Result<bool, String> {
        self.pipeline
            .borrow_mut()
            .move_file(index, direction)
            .map_err(|e| e.to_string())
    }

    async fn process_internal(&self) -> SessionSnapshot {
        let job = self.pipeline.borrow_mut().begin_processing();
        if let Some(job) = job {
            let outcome = job.run().await;
            self.pipeline.borrow_mut().finish_processing(outcome);
        }
        self.snapshot_internal()
    }

    fn snapshot_internal(&self) -> SessionSnapshot {
        self.pipeline.borrow().snapshot()
    }
}

#[wasm_bindgen]
impl ToolkitSession {
    /// Create a session for a tool slug ("image-to-pdf", "merge-pdf", "rotate-pdf")
    #[wasm_bindgen(constructor)]
    pub fn new(tool: &str) -> Result<ToolkitSession, JsValue> {
        Self::new_internal(tool).map_err(|e| JsValue::from_str(&e))
    }

    /// Slug of the active tool
    #[wasm_bindgen(getter)]
    pub fn tool(&self) -> String {
        self.pipeline.borrow().profile().slug.to_string()
    }

    /// Stage the files of a picker or drop event
    #[wasm_bindgen(js_name = selectFiles)]
    pub fn select_files(&self, files: &web_sys::FileList) -> Result<(), JsValue> {
        self.select_internal(browser_file::from_file_list(files))
            .map_err(|e| JsValue::from_str(&e))
    }

    /// Stage a single in-memory file
    #[wasm_bindgen(js_name = addFileBytes)]
    pub fn add_file_bytes(
        &self,
        name: &str,
        mime_type: &str,
        bytes: &[u8],
    ) -> Result<(), JsValue> {
        let file = SelectedFile::from_bytes(name, mime_type, bytes);
        self.select_internal(vec![file]).map_err(|e| JsValue::from_str(&e))
    }

    #[wasm_bindgen(js_name = removeFile)]
    pub fn remove_file(&self, index: usize) -> Result<(), JsValue> {
        self.remove_internal(index).map_err(|e| JsValue::from_str(&e))
    }

    /// Move a file one slot towards the start; false at the top
    #[wasm_bindgen(js_name = moveFileUp)]
    pub fn move_file_up(&self, index: usize) -> Result<bool, JsValue> {
        self.move_internal(index, Direction::Up).map_err(|e| JsValue::from_str(&e))
    }

    /// Move a file one slot towards the end; false at the bottom
    #[wasm_bindgen(js_name = moveFileDown)]
    pub fn move_file_down(&self, index: usize) -> Result<bool, JsValue> {
        self.move_internal(index, Direction::Down).map_err(|e| JsValue::from_str(&e))
    }

    /// Set the rotation angle: 90, 180, 270 or 360
    #[wasm_bindgen(js_name = setRotation)]
    pub fn set_rotation(&self, degrees: i32) -> Result<(), JsValue> {
        self.pipeline
            .borrow_mut()
            .set_rotation_degrees(degrees)
            .map_err(|e| JsValue::from_str(&e.to_string()))
    }

    #[wasm_bindgen(js_name = canProcess)]
    pub fn can_process(&self) -> bool {
        self.pipeline.borrow().can_process()
    }

    /// Run the tool over the staged files and resolve with the new snapshot.
    ///
    /// Transformation errors are reported in the snapshot, not as rejections.
    pub async fn process(&self) -> Result<JsValue, JsValue> {
        let snapshot = self.process_internal().await;
        to_js(&snapshot)
    }

    /// Save the artifact under its tool-specific filename
    pub fn download(&self) -> Result<(), JsValue> {
        self.pipeline
            .borrow_mut()
            .download()
            .map_err(|e| JsValue::from_str(&e.to_string()))
    }

    /// Clear files, messages and the artifact ("process another")
    pub fn reset(&self) -> Result<(), JsValue> {
        self.pipeline
            .borrow_mut()
            .reset()
            .map_err(|e| JsValue::from_str(&e.to_string()))
    }

    /// Current state for rendering
    pub fn snapshot(&self) -> Result<JsValue, JsValue> {
        to_js(&self.snapshot_internal())
    }
}
