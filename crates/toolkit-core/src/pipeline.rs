//! Processing pipeline
//!
//! One pipeline drives one tool. It owns the staged files, the current
//! [`PipelineState`] and the export handle of the last artifact, and it is
//! the only place where transformation errors are turned into user-facing
//! state.
//!
//! State machine:
//!
//! ```text
//! Idle --select--> Validating --ok--> Idle
//!                             --too many files--> (previous state)
//! Idle/Failed/Succeeded --begin--> Validating --> Processing
//! Processing --finish--> Succeeded(artifact) | Failed(message)
//! Succeeded/Failed --reset--> Idle
//! ```
//!
//! Processing is split into [`ProcessingPipeline::begin_processing`],
//! [`PendingJob::run`] and [`ProcessingPipeline::finish_processing`] so that
//! callers sharing the pipeline behind a `RefCell` do not hold a borrow across
//! the transformation's await points.

use crate::artifact::{Artifact, ArtifactExporter, MemoryExporter};
use crate::engine::{
    has_pdf_signature, LopdfEngine, Transform, TransformOutput, TransformRequest,
};
use crate::error::{ToolkitError, ValidationError};
use crate::file_set::{Direction, FileSet, SelectedFile};
use crate::profile::{self, RotationAngle, ToolId, ToolProfile, PDF_MIME};
use crate::report::{
    format_file_size, ArtifactSummary, FileEntry, ProcessMetrics, SessionSnapshot, Status,
};
use std::mem;
use std::rc::Rc;
use tracing::{debug, info, warn};

/// Current processing status of a pipeline
#[derive(Debug, Clone, PartialEq, Default)]
pub enum PipelineState {
    #[default]
    Idle,
    Validating,
    Processing,
    Succeeded(Artifact),
    Failed(String),
}

impl PipelineState {
    pub fn status(&self) -> Status {
        match self {
            PipelineState::Idle => Status::Idle,
            PipelineState::Validating => Status::Validating,
            PipelineState::Processing => Status::Processing,
            PipelineState::Succeeded(_) => Status::Succeeded,
            PipelineState::Failed(_) => Status::Failed,
        }
    }

    pub fn is_processing(&self) -> bool {
        matches!(self, PipelineState::Processing)
    }

    pub fn artifact(&self) -> Option<&Artifact> {
        match self {
            PipelineState::Succeeded(artifact) => Some(artifact),
            _ => None,
        }
    }

    /// Message of a failed run
    pub fn error(&self) -> Option<&str> {
        match self {
            PipelineState::Failed(message) => Some(message),
            _ => None,
        }
    }
}

/// Per-session settings
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PipelineConfig {
    /// Only read by the rotate tool
    pub rotation: RotationAngle,
}

/// A transformation detached from the pipeline that started it
pub struct PendingJob<E> {
    generation: u64,
    request: TransformRequest,
    engine: Rc<E>,
    input_size_bytes: u64,
}

impl<E: Transform> PendingJob<E> {
    /// Run the transformation to completion
    pub async fn run(self) -> JobOutcome {
        let result = self.engine.transform(&self.request).await;
        JobOutcome {
            generation: self.generation,
            file_count: self.request.files.len(),
            input_size_bytes: self.input_size_bytes,
            result,
        }
    }
}

/// Result of a [`PendingJob`], to be handed back to its pipeline
#[derive(Debug)]
pub struct JobOutcome {
    generation: u64,
    file_count: usize,
    input_size_bytes: u64,
    result: Result<TransformOutput, ToolkitError>,
}

/// Drives one tool from file selection to a downloadable artifact
pub struct ProcessingPipeline<E: Transform = LopdfEngine, X: ArtifactExporter = MemoryExporter> {
    profile: &'static ToolProfile,
    files: FileSet,
    config: PipelineConfig,
    state: PipelineState,
    validation_error: Option<ValidationError>,
    engine: Rc<E>,
    exporter: X,
    handle: Option<X::Handle>,
    generation: u64,
}

impl ProcessingPipeline {
    /// Pipeline with the lopdf engine and an in-memory exporter
    pub fn for_tool(tool: ToolId) -> Result<Self, ToolkitError> {
        Self::new(tool, LopdfEngine, MemoryExporter::new())
    }
}

impl<E: Transform, X: ArtifactExporter> ProcessingPipeline<E, X> {
    /// Create a pipeline for `tool`.
    ///
    /// Fails with `UnknownTool` if the tool has no registered profile.
    pub fn new(tool: ToolId, engine: E, exporter: X) -> Result<Self, ToolkitError> {
        let profile = profile::lookup(tool)?;
        Ok(Self {
            profile,
            files: FileSet::new(),
            config: PipelineConfig::default(),
            state: PipelineState::Idle,
            validation_error: None,
            engine: Rc::new(engine),
            exporter,
            handle: None,
            generation: 0,
        })
    }

    pub fn with_config(mut self, config: PipelineConfig) -> Self {
        self.config = config;
        self
    }

    pub fn profile(&self) -> &'static ToolProfile {
        self.profile
    }

    pub fn state(&self) -> &PipelineState {
        &self.state
    }

    pub fn files(&self) -> &FileSet {
        &self.files
    }

    pub fn config(&self) -> PipelineConfig {
        self.config
    }

    /// The last rejected selection, if it has not been superseded
    pub fn validation_error(&self) -> Option<&ValidationError> {
        self.validation_error.as_ref()
    }

    /// Handle of the current artifact
    pub fn artifact_handle(&self) -> Option<&X::Handle> {
        self.handle.as_ref()
    }

    pub fn exporter(&self) -> &X {
        &self.exporter
    }

    pub fn exporter_mut(&mut self) -> &mut X {
        &mut self.exporter
    }

    pub fn can_process(&self) -> bool {
        !self.files.is_empty() && !self.state.is_processing()
    }

    /// Stage a freshly chosen batch of files.
    ///
    /// Several files dropped on a single-file tool are rejected with
    /// `TooManyFiles`; neither the files nor the state change. Otherwise the
    /// batch is applied and any previous artifact or error is discarded.
    pub fn select_files(&mut self, batch: Vec<SelectedFile>) -> Result<(), ToolkitError> {
        self.ensure_idle_for_edit()?;

        // An empty batch is a cancelled picker
        if batch.is_empty() {
            return Ok(());
        }

        let previous = mem::replace(&mut self.state, PipelineState::Validating);

        if !self.profile.allows_multiple && batch.len() > 1 {
            warn!(
                tool = self.profile.slug,
                count = batch.len(),
                "rejected multi-file selection"
            );
            self.state = previous;
            let err = self.profile.too_many_files();
            self.validation_error = Some(err.clone());
            return Err(err.into());
        }

        for file in &batch {
            if !self.profile.accepts(&file.mime_type, &file.name) {
                warn!(
                    tool = self.profile.slug,
                    name = %file.name,
                    mime = %file.mime_type,
                    "file does not match the accept filter"
                );
            }
        }

        self.files.set_from_selection(batch, self.profile);
        self.validation_error = None;
        self.state = previous;
        self.discard_outcome();
        debug!(tool = self.profile.slug, count = self.files.len(), "files selected");
        Ok(())
    }

    /// Remove the staged file at `index`
    pub fn remove_file(&mut self, index: usize) -> Result<SelectedFile, ToolkitError> {
        self.ensure_idle_for_edit()?;
        let removed = self.files.remove_at(index)?;
        self.invalidate_artifact();
        debug!(tool = self.profile.slug, name = %removed.name, "file removed");
        Ok(removed)
    }

    /// Move the staged file at `index` one slot.
    ///
    /// Returns false if the move would leave the bounds of the set.
    pub fn move_file(
        &mut self,
        index: usize,
        direction: Direction,
    ) -> Result<bool, ToolkitError> {
        self.ensure_idle_for_edit()?;
        let moved = self.files.swap_adjacent(index, direction);
        if moved {
            self.invalidate_artifact();
        }
        Ok(moved)
    }

    pub fn set_rotation(&mut self, rotation: RotationAngle) -> Result<(), ToolkitError> {
        self.ensure_idle_for_edit()?;
        if self.config.rotation != rotation {
            self.config.rotation = rotation;
            self.invalidate_artifact();
        }
        Ok(())
    }

    /// Same as [`Self::set_rotation`], from a raw degree value
    pub fn set_rotation_degrees(&mut self, degrees: i32) -> Result<(), ToolkitError> {
        let rotation = RotationAngle::try_from(degrees)?;
        self.set_rotation(rotation)
    }

    /// Enter `Processing` and hand out the transformation to run.
    ///
    /// Returns `None` without touching the state when nothing is staged or a
    /// transformation is already in flight.
    pub fn begin_processing(&mut self) -> Option<PendingJob<E>> {
        if self.state.is_processing() {
            warn!(tool = self.profile.slug, "transformation already in flight");
            return None;
        }
        if self.files.is_empty() {
            debug!(tool = self.profile.slug, "nothing to process");
            return None;
        }

        let previous = mem::replace(&mut self.state, PipelineState::Validating);
        if !self.profile.allows_multiple && self.files.len() > 1 {
            self.state = previous;
            self.validation_error = Some(self.profile.too_many_files());
            return None;
        }

        self.validation_error = None;
        self.release_handle();
        self.generation += 1;
        self.state = PipelineState::Processing;

        info!(
            tool = self.profile.slug,
            files = self.files.len(),
            "processing started"
        );

        Some(PendingJob {
            generation: self.generation,
            request: TransformRequest {
                tool: self.profile.id,
                files: self.files.as_slice().to_vec(),
                angle_degrees: self.config.rotation.degrees(),
            },
            engine: Rc::clone(&self.engine),
            input_size_bytes: self.files.total_size(),
        })
    }

    /// Settle the pipeline with the outcome of the job it handed out
    pub fn finish_processing(&mut self, outcome: JobOutcome) -> &PipelineState {
        if !self.state.is_processing() || outcome.generation != self.generation {
            warn!(tool = self.profile.slug, "discarding stale job outcome");
            return &self.state;
        }

        let JobOutcome {
            file_count,
            input_size_bytes,
            result,
            ..
        } = outcome;

        let artifact = result.and_then(|output| {
            if !has_pdf_signature(&output.bytes) {
                return Err(ToolkitError::CorruptOutput);
            }
            Ok(Artifact {
                filename: self.profile.output_filename.to_string(),
                mime_type: PDF_MIME,
                metrics: ProcessMetrics {
                    file_count,
                    input_size_bytes,
                    output_size_bytes: output.bytes.len() as u64,
                    page_count: output.page_count,
                },
                bytes: output.bytes.into(),
            })
        });

        self.state = match artifact.and_then(|a| self.exporter.wrap(&a).map(|h| (a, h))) {
            Ok((artifact, handle)) => {
                info!(
                    tool = self.profile.slug,
                    filename = %artifact.filename,
                    pages = artifact.metrics.page_count,
                    bytes = artifact.metrics.output_size_bytes,
                    "processing succeeded"
                );
                self.handle = Some(handle);
                PipelineState::Succeeded(artifact)
            }
            Err(err) => {
                warn!(tool = self.profile.slug, error = %err, "processing failed");
                PipelineState::Failed(err.to_string())
            }
        };

        &self.state
    }

    /// Run the active tool over the staged files.
    ///
    /// Every transformation error ends up in [`PipelineState::Failed`]; this
    /// never returns an error itself.
    pub async fn process(&mut self) -> &PipelineState {
        if let Some(job) = self.begin_processing() {
            let outcome = job.run().await;
            self.finish_processing(outcome);
        }
        &self.state
    }

    /// Start the download of the current artifact
    pub fn download(&mut self) -> Result<(), ToolkitError> {
        match &self.handle {
            Some(handle) => self.exporter.trigger_download(handle),
            None => Err(ToolkitError::OperationError(
                "No processed file is available for download".into(),
            )),
        }
    }

    /// Start over: clears the files, the artifact and every message
    pub fn reset(&mut self) -> Result<(), ToolkitError> {
        self.ensure_idle_for_edit()?;
        self.files.clear();
        self.validation_error = None;
        self.discard_outcome();
        info!(tool = self.profile.slug, "pipeline reset");
        Ok(())
    }

    /// Serializable view of the pipeline
    pub fn snapshot(&self) -> SessionSnapshot {
        let profile = self.profile;
        SessionSnapshot {
            tool: profile.slug,
            display_name: profile.display_name,
            description: profile.description,
            accept: profile.accept,
            allows_multiple: profile.allows_multiple,
            status: self.state.status(),
            error: self.state.error().map(str::to_string),
            validation_error: self.validation_error.as_ref().map(|e| e.to_string()),
            files: self
                .files
                .iter()
                .map(|file| FileEntry {
                    name: file.name.clone(),
                    size_bytes: file.size_bytes,
                    size_label: format_file_size(file.size_bytes),
                    mime_type: file.mime_type.clone(),
                })
                .collect(),
            total_size_label: format_file_size(self.files.total_size()),
            can_process: self.can_process(),
            process_label: profile.process_label(self.files.len()),
            upload_title: profile.upload_title(),
            rotation_degrees: self.config.rotation.degrees(),
            success_message: self
                .state
                .artifact()
                .map(|_| profile.success_message(self.config.rotation)),
            artifact: self.state.artifact().map(|artifact| ArtifactSummary {
                filename: artifact.filename.clone(),
                mime_type: artifact.mime_type,
                metrics: artifact.metrics.clone(),
            }),
        }
    }

    fn ensure_idle_for_edit(&self) -> Result<(), ToolkitError> {
        if self.state.is_processing() {
            warn!(tool = self.profile.slug, "pipeline is busy");
            return Err(ToolkitError::Busy);
        }
        Ok(())
    }

    /// Drop a finished artifact whose inputs changed
    fn invalidate_artifact(&mut self) {
        if matches!(self.state, PipelineState::Succeeded(_)) {
            self.discard_outcome();
        }
    }

    /// Release the artifact handle and return to `Idle`
    fn discard_outcome(&mut self) {
        self.release_handle();
        if !matches!(self.state, PipelineState::Idle) {
            info!(tool = self.profile.slug, "pipeline idle");
        }
        self.state = PipelineState::Idle;
    }

    fn release_handle(&mut self) {
        if let Some(handle) = self.handle.take() {
            self.exporter.release(&handle);
        }
    }
}

impl<E: Transform, X: ArtifactExporter> Drop for ProcessingPipeline<E, X> {
    fn drop(&mut self) {
        self.release_handle();
    }
}
