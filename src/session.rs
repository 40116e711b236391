//! The conversion session: one file, one conversion at a time.
//!
//! ```text
//!            select_file           begin_convert            finish(Ok)
//!   Idle ───────────────► Loaded ───────────────► Converting ──────────► Completed
//!     ▲                     ▲                         │
//!     │                     │                         │ finish(Err)
//!     │                     └──── begin_convert ──────┼──────────────── Failed
//!     │                           (re-conversion)     ▼
//!     └─────────────────────── reset (from any state) ─┘
//! ```
//!
//! A conversion is split into three steps so the pipeline can run off the
//! caller's thread:
//!
//! 1. [`Session::begin_convert`] moves to `Converting` and hands out a
//!    [`ConversionTask`] stamped with the session generation.
//! 2. [`ConversionTask::run`] does the decode/encode against a backend and
//!    reports coarse progress over an optional channel.
//! 3. [`Session::finish`] commits the [`TaskOutput`], but only if its
//!    generation still matches. Selecting another file or resetting bumps the
//!    generation, so a late result is discarded instead of landing on the new
//!    session.

use crate::config::ConverterConfig;
use crate::formats::TargetFormat;
use crate::imaging::{
    BackendError, ConversionRequest, ConversionResult, Quality, RasterBackend, Strategy, pipeline,
};
use crate::loader::{LoadError, SelectedFile, SourceAsset, file_len, load_file};
use crate::naming::converted_file_name;
use crate::outcome::ConversionOutcome;
use crate::save::SaveTarget;
use crate::validation::{FormatValidator, ValidationError};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::mpsc::Sender;
use std::time::Duration;
use thiserror::Error;

/// User-visible text for any pipeline failure.
pub const CONVERSION_FAILED_MESSAGE: &str = "Conversion failed. Please try again.";

#[derive(Error, Debug)]
pub enum ConversionError {
    #[error(transparent)]
    Rejected(#[from] ValidationError),
    #[error(transparent)]
    Load(#[from] LoadError),
    #[error("Conversion failed. Please try again.")]
    ConversionFailed(#[source] BackendError),
    #[error("No file selected")]
    NoFile,
    #[error("A conversion is already in progress")]
    Busy,
    #[error("No converted file to download")]
    NotCompleted,
    #[error("Discarded result from a superseded session (generation {generation})")]
    Stale { generation: u64 },
    #[error("Failed to save {file_name}: {source}")]
    Save {
        file_name: String,
        #[source]
        source: std::io::Error,
    },
}

/// Coarse progress of an in-flight conversion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressState {
    pub percent: u8,
    pub status: String,
}

impl ProgressState {
    fn empty() -> Self {
        Self {
            percent: 0,
            status: String::new(),
        }
    }
}

/// A progress milestone, tagged with the generation of the task that sent it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConvertEvent {
    pub generation: u64,
    pub progress: ProgressState,
}

/// Target format and quality restored by [`Session::reset`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionDefaults {
    pub target: TargetFormat,
    pub quality: Quality,
}

impl Default for SessionDefaults {
    fn default() -> Self {
        Self {
            target: TargetFormat::Png,
            quality: Quality::default(),
        }
    }
}

#[derive(Debug)]
pub enum SessionState {
    Idle,
    Loaded {
        asset: Arc<SourceAsset>,
    },
    Converting {
        asset: Arc<SourceAsset>,
        progress: ProgressState,
    },
    Completed {
        asset: Arc<SourceAsset>,
        result: ConversionResult,
        outcome: ConversionOutcome,
    },
    Failed {
        asset: Arc<SourceAsset>,
        message: String,
    },
}

impl SessionState {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Loaded { .. } => "loaded",
            Self::Converting { .. } => "converting",
            Self::Completed { .. } => "completed",
            Self::Failed { .. } => "failed",
        }
    }

    fn asset(&self) -> Option<&Arc<SourceAsset>> {
        match self {
            Self::Idle => None,
            Self::Loaded { asset }
            | Self::Converting { asset, .. }
            | Self::Completed { asset, .. }
            | Self::Failed { asset, .. } => Some(asset),
        }
    }
}

/// Single-file conversion session.
pub struct Session {
    state: SessionState,
    generation: u64,
    validator: FormatValidator,
    defaults: SessionDefaults,
    target: TargetFormat,
    quality: Quality,
    file_error: Option<String>,
    completion_delay: Duration,
}

impl Session {
    pub fn new(validator: FormatValidator, defaults: SessionDefaults) -> Self {
        Self {
            state: SessionState::Idle,
            generation: 0,
            validator,
            defaults,
            target: defaults.target,
            quality: defaults.quality,
            file_error: None,
            completion_delay: Duration::ZERO,
        }
    }

    pub fn from_config(config: &ConverterConfig) -> Self {
        Self::new(config.validator(), config.session_defaults())
            .with_completion_delay(config.completion_delay())
    }

    /// Pause after the final milestone so fast conversions stay visible.
    pub fn with_completion_delay(mut self, delay: Duration) -> Self {
        self.completion_delay = delay;
        self
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn target(&self) -> TargetFormat {
        self.target
    }

    pub fn quality(&self) -> Quality {
        self.quality
    }

    pub fn asset(&self) -> Option<&SourceAsset> {
        self.state.asset().map(|a| a.as_ref())
    }

    pub fn result(&self) -> Option<&ConversionResult> {
        match &self.state {
            SessionState::Completed { result, .. } => Some(result),
            _ => None,
        }
    }

    pub fn outcome(&self) -> Option<&ConversionOutcome> {
        match &self.state {
            SessionState::Completed { outcome, .. } => Some(outcome),
            _ => None,
        }
    }

    pub fn progress(&self) -> Option<&ProgressState> {
        match &self.state {
            SessionState::Converting { progress, .. } => Some(progress),
            _ => None,
        }
    }

    /// The one error line to show. File-stage errors win over a stale
    /// conversion failure.
    pub fn error_message(&self) -> Option<&str> {
        if let Some(message) = &self.file_error {
            return Some(message);
        }
        match &self.state {
            SessionState::Failed { message, .. } => Some(message),
            _ => None,
        }
    }

    pub fn is_converting(&self) -> bool {
        matches!(self.state, SessionState::Converting { .. })
    }

    pub fn set_target(&mut self, target: TargetFormat) -> Result<(), ConversionError> {
        if self.is_converting() {
            return Err(ConversionError::Busy);
        }
        self.target = target;
        Ok(())
    }

    /// Set quality, clamped into 10–100. Returns the stored value.
    pub fn set_quality(&mut self, value: u32) -> Result<Quality, ConversionError> {
        if self.is_converting() {
            return Err(ConversionError::Busy);
        }
        self.quality = Quality::new(value);
        Ok(self.quality)
    }

    /// Admit a new file. On rejection the session keeps its current state and
    /// records the reason as the visible error.
    pub fn select_file(&mut self, file: SelectedFile) -> Result<(), ConversionError> {
        let kind = match self.validator.validate(&file.media_type, file.byte_len()) {
            Ok(kind) => kind,
            Err(err) => {
                tracing::warn!(
                    name = %file.name,
                    media_type = %file.media_type,
                    %err,
                    "file rejected"
                );
                self.file_error = Some(err.to_string());
                return Err(err.into());
            }
        };

        if self.is_converting() {
            tracing::info!(
                generation = self.generation,
                "new file selected mid-conversion; in-flight result will be discarded"
            );
        }
        self.generation += 1;
        self.file_error = None;
        tracing::debug!(
            name = %file.name,
            %kind,
            generation = self.generation,
            "file loaded into session"
        );
        self.state = SessionState::Loaded {
            asset: Arc::new(SourceAsset::new(file, kind)),
        };
        Ok(())
    }

    /// Read `path` and admit it. A read failure is a file-stage error, like a
    /// rejection. The size ceiling is checked against the file's metadata
    /// first, so an oversized file is never read into memory.
    pub fn select_path(&mut self, path: &Path) -> Result<(), ConversionError> {
        let size_check = file_len(path)
            .map_err(ConversionError::from)
            .and_then(|len| self.validator.check_size(len).map_err(ConversionError::from));
        if let Err(err) = size_check {
            tracing::warn!(path = %path.display(), %err, "file not read");
            self.file_error = Some(err.to_string());
            return Err(err);
        }

        let file = match load_file(path) {
            Ok(file) => file,
            Err(err) => {
                tracing::warn!(%err, "file could not be read");
                self.file_error = Some(err.to_string());
                return Err(err.into());
            }
        };
        self.select_file(file)
    }

    /// Start converting the loaded asset with the current target and quality.
    ///
    /// Accepted from `Loaded`, and from `Completed`/`Failed` as a
    /// re-conversion of the same asset (which drops the previous result or
    /// error). Rejected while `Converting`. Any leftover file-stage error is
    /// cleared, since the conversion runs on the asset that was admitted.
    pub fn begin_convert(
        &mut self,
        events: Option<Sender<ConvertEvent>>,
    ) -> Result<ConversionTask, ConversionError> {
        let asset = match &self.state {
            SessionState::Idle => return Err(ConversionError::NoFile),
            SessionState::Converting { .. } => return Err(ConversionError::Busy),
            SessionState::Loaded { asset }
            | SessionState::Completed { asset, .. }
            | SessionState::Failed { asset, .. } => Arc::clone(asset),
        };

        let request = ConversionRequest::new(self.target, self.quality);
        tracing::info!(
            name = asset.name(),
            target = %request.target,
            quality = request.quality.value(),
            generation = self.generation,
            "conversion started"
        );
        self.file_error = None;
        self.state = SessionState::Converting {
            asset: Arc::clone(&asset),
            progress: ProgressState::empty(),
        };

        Ok(ConversionTask {
            generation: self.generation,
            asset,
            request,
            events,
            completion_delay: self.completion_delay,
        })
    }

    /// Record a progress milestone if it belongs to the current conversion.
    pub fn apply_event(&mut self, event: &ConvertEvent) {
        if event.generation != self.generation {
            return;
        }
        if let SessionState::Converting { progress, .. } = &mut self.state {
            *progress = event.progress.clone();
        }
    }

    /// Commit a finished task.
    ///
    /// Stale outputs (from before a reset or a new file) are discarded and
    /// leave the session untouched.
    pub fn finish(&mut self, output: TaskOutput) -> Result<ConversionOutcome, ConversionError> {
        if output.generation != self.generation || !self.is_converting() {
            tracing::warn!(
                task_generation = output.generation,
                session_generation = self.generation,
                state = self.state.name(),
                "discarding stale conversion result"
            );
            return Err(ConversionError::Stale {
                generation: output.generation,
            });
        }

        let SessionState::Converting { asset, .. } =
            std::mem::replace(&mut self.state, SessionState::Idle)
        else {
            return Err(ConversionError::Stale {
                generation: output.generation,
            });
        };

        match output.result {
            Ok(result) => {
                let outcome = ConversionOutcome::new(&asset, &result);
                tracing::info!(
                    from = %outcome.original_format,
                    to = %outcome.target_format,
                    original_size = outcome.original_size,
                    new_size = outcome.new_size,
                    delta_percent = outcome.delta_percent,
                    "conversion completed"
                );
                self.state = SessionState::Completed {
                    asset,
                    result,
                    outcome: outcome.clone(),
                };
                Ok(outcome)
            }
            Err(err) => {
                tracing::warn!(%err, "conversion failed");
                self.state = SessionState::Failed {
                    asset,
                    message: CONVERSION_FAILED_MESSAGE.to_string(),
                };
                Err(ConversionError::ConversionFailed(err))
            }
        }
    }

    /// Begin, run, and finish a conversion on the current thread.
    pub fn convert(
        &mut self,
        backend: &impl RasterBackend,
        events: Option<Sender<ConvertEvent>>,
    ) -> Result<ConversionOutcome, ConversionError> {
        let task = self.begin_convert(events)?;
        let output = task.run(backend);
        self.finish(output)
    }

    /// Hand the converted bytes to `target` as `<stem>_converted.<ext>`.
    pub fn download(&self, target: &impl SaveTarget) -> Result<PathBuf, ConversionError> {
        let SessionState::Completed { asset, result, .. } = &self.state else {
            return Err(ConversionError::NotCompleted);
        };
        let file_name = converted_file_name(asset.name(), result.target);
        target
            .save(&file_name, &result.bytes)
            .map_err(|source| ConversionError::Save { file_name, source })
    }

    /// Drop everything and return to `Idle` with default target and quality.
    pub fn reset(&mut self) {
        if self.is_converting() {
            tracing::info!(
                generation = self.generation,
                "reset mid-conversion; in-flight result will be discarded"
            );
        }
        self.generation += 1;
        self.state = SessionState::Idle;
        self.file_error = None;
        self.target = self.defaults.target;
        self.quality = self.defaults.quality;
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new(FormatValidator::default(), SessionDefaults::default())
    }
}

/// A conversion detached from the session, ready to run on any thread.
#[derive(Debug)]
pub struct ConversionTask {
    generation: u64,
    asset: Arc<SourceAsset>,
    request: ConversionRequest,
    events: Option<Sender<ConvertEvent>>,
    completion_delay: Duration,
}

impl ConversionTask {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn request(&self) -> &ConversionRequest {
        &self.request
    }

    fn emit(&self, percent: u8, status: impl Into<String>) {
        if let Some(tx) = &self.events {
            // A dropped receiver just means nobody is watching.
            tx.send(ConvertEvent {
                generation: self.generation,
                progress: ProgressState {
                    percent,
                    status: status.into(),
                },
            })
            .ok();
        }
    }

    fn pause(&self) {
        if !self.completion_delay.is_zero() {
            std::thread::sleep(self.completion_delay);
        }
    }

    /// Run the pipeline. Consumes the task, closing its event channel.
    pub fn run(self, backend: &impl RasterBackend) -> TaskOutput {
        let strategy = pipeline::strategy_for(self.asset.kind(), self.request.target);

        let result = if strategy == Strategy::Passthrough {
            let result = pipeline::encode(backend, &self.asset, &self.request);
            if result.is_ok() {
                self.emit(100, "GIF preserved (animation maintained)");
                self.pause();
            }
            result
        } else {
            self.emit(30, "Analyzing image...");
            self.emit(
                60,
                format!("Converting to {}...", self.request.target.label()),
            );
            let result = pipeline::encode(backend, &self.asset, &self.request);
            if result.is_ok() {
                self.emit(80, "Finalizing...");
                self.emit(100, "Complete!");
                self.pause();
            }
            result
        };

        TaskOutput {
            generation: self.generation,
            result,
        }
    }
}

/// What a [`ConversionTask`] produced, to be committed with [`Session::finish`].
#[derive(Debug)]
pub struct TaskOutput {
    generation: u64,
    result: Result<ConversionResult, BackendError>,
}

impl TaskOutput {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn is_ok(&self) -> bool {
        self.result.is_ok()
    }
}
