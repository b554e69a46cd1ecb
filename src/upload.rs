//! Upload workflow: select, validate, dedupe, compress, submit, reconcile
//!
//! One workflow instance manages one batch at a time. Selection problems are
//! reported per file and never abort the rest of the batch; a transport
//! failure during submission leaves the candidate list and the dedupe set
//! untouched so the user can retry without re-selecting.

use crate::api::{UploadPart, WardrobeApi};
use crate::compress::ImageCompressor;
use crate::config::UploadConfig;
use crate::error::ClientError;
use crate::models::UploadResponse;
use crate::notify::{Severity, UiAdapter};
use crate::preview::{ImagePreviews, PreviewHandle};
use crate::session::{ClientContext, SessionState, UploadedNames};
use std::sync::Arc;
use tokio::task::JoinSet;

/// One file as handed over by the picker or drag-drop zone
#[derive(Debug, Clone)]
pub struct FileInput {
    pub file_name: String,
    /// Declared media type; may be empty on some mobile browsers
    pub content_type: String,
    pub bytes: Vec<u8>,
}

/// A validated candidate awaiting submission
struct Candidate {
    file_name: String,
    bytes: Vec<u8>,
    preview: PreviewHandle,
}

/// Read-only view of a candidate for rendering
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateView {
    pub file_name: String,
    pub size_bytes: u64,
    pub preview: PreviewHandle,
}

/// Where the workflow currently is in the batch lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadPhase {
    Idle,
    Previewing,
    Compressing,
    Submitting,
}

pub struct UploadWorkflow {
    config: UploadConfig,
    session: SessionState,
    uploaded: UploadedNames,
    api: Arc<dyn WardrobeApi>,
    compressor: Arc<dyn ImageCompressor>,
    previews: Arc<dyn ImagePreviews>,
    ui: Arc<dyn UiAdapter>,
    candidates: Vec<Candidate>,
    phase: UploadPhase,
}

impl UploadWorkflow {
    pub fn new(
        context: &ClientContext,
        api: Arc<dyn WardrobeApi>,
        compressor: Arc<dyn ImageCompressor>,
        previews: Arc<dyn ImagePreviews>,
        ui: Arc<dyn UiAdapter>,
    ) -> Self {
        Self {
            config: context.config.upload.clone(),
            session: context.session.clone(),
            uploaded: context.uploaded.clone(),
            api,
            compressor,
            previews,
            ui,
            candidates: Vec::new(),
            phase: UploadPhase::Idle,
        }
    }

    pub fn phase(&self) -> UploadPhase {
        self.phase
    }

    pub fn candidate_count(&self) -> usize {
        self.candidates.len()
    }

    pub fn candidate_views(&self) -> Vec<CandidateView> {
        self.candidates
            .iter()
            .map(|c| CandidateView {
                file_name: c.file_name.clone(),
                size_bytes: c.bytes.len() as u64,
                preview: c.preview,
            })
            .collect()
    }

    /// Takes a picked batch and turns the valid, not-yet-uploaded files into
    /// previewed candidates. Replaces any previous selection.
    ///
    /// The whole batch is rejected when it exceeds the configured maximum;
    /// individual files are rejected with a per-file notice without
    /// affecting the rest.
    pub fn select_files(&mut self, files: Vec<FileInput>) {
        if files.len() > self.config.max_batch_size {
            self.ui.notify(
                Severity::Error,
                &format!(
                    "You can upload at most {} photos at once, you selected {}",
                    self.config.max_batch_size,
                    files.len()
                ),
            );
            return;
        }

        let mut survivors = Vec::new();
        for file in files {
            log::debug!(
                "Validating {}: type={}, size={}",
                file.file_name,
                file.content_type,
                file.bytes.len()
            );

            if let Err(reason) = validate_file(&self.config, &file) {
                self.ui
                    .notify(Severity::Error, &format!("{}: {}", file.file_name, reason));
                continue;
            }

            if self.uploaded.contains(&file.file_name) {
                self.ui.notify(
                    Severity::Warning,
                    &format!("{} was already uploaded, skipped", file.file_name),
                );
                continue;
            }

            survivors.push(file);
        }

        if survivors.is_empty() {
            self.ui.notify(Severity::Info, "No valid new files");
            return;
        }

        self.clear_candidates();
        for file in survivors {
            let preview = self.previews.create(&file.file_name, &file.bytes);
            self.candidates.push(Candidate {
                file_name: file.file_name,
                bytes: file.bytes,
                preview,
            });
        }
        self.phase = UploadPhase::Previewing;
    }

    /// Removes one candidate before submission, releasing its preview
    pub fn remove_candidate(&mut self, index: usize) -> bool {
        if index >= self.candidates.len() {
            return false;
        }
        let candidate = self.candidates.remove(index);
        self.previews.release(candidate.preview);
        if self.candidates.is_empty() {
            self.phase = UploadPhase::Idle;
        }
        true
    }

    /// Drops the whole selection, releasing every preview
    pub fn clear_candidates(&mut self) {
        for candidate in self.candidates.drain(..) {
            self.previews.release(candidate.preview);
        }
        self.phase = UploadPhase::Idle;
    }

    /// Compresses all candidates concurrently, submits them as one multipart
    /// request and reconciles the result.
    ///
    /// Returns `Ok(None)` when there was nothing to submit. Any compression
    /// failure aborts the submission with per-file notices; nothing is sent
    /// partially. On a transport failure the candidates and the dedupe set
    /// stay untouched.
    pub async fn submit(&mut self) -> Result<Option<UploadResponse>, ClientError> {
        if self.candidates.is_empty() {
            self.ui
                .notify(Severity::Warning, "Select images to upload first");
            return Ok(None);
        }

        let _guard = self.session.begin_loading();

        self.phase = UploadPhase::Compressing;
        self.ui.notify(Severity::Info, "Compressing images...");
        let parts = match self.compress_candidates().await {
            Ok(parts) => parts,
            Err(e) => {
                self.phase = UploadPhase::Previewing;
                return Err(e);
            }
        };

        self.phase = UploadPhase::Submitting;
        self.ui.notify(
            Severity::Info,
            &format!("Uploading {} images...", parts.len()),
        );
        let response = match self.api.upload_images(parts).await {
            Ok(response) => response,
            Err(e) => {
                self.phase = UploadPhase::Previewing;
                self.ui.notify(
                    Severity::Error,
                    &format!("Upload failed: {}", e.user_message()),
                );
                return Err(e);
            }
        };

        if !response.success {
            self.phase = UploadPhase::Previewing;
            let message = response
                .message
                .clone()
                .unwrap_or_else(|| "Upload failed".to_string());
            self.ui.notify(Severity::Error, &message);
            return Ok(Some(response));
        }

        self.reconcile(&response);
        Ok(Some(response))
    }

    /// Runs the compressor over every candidate on the blocking pool,
    /// awaited jointly
    async fn compress_candidates(&self) -> Result<Vec<UploadPart>, ClientError> {
        let mut join_set = JoinSet::new();
        for (index, candidate) in self.candidates.iter().enumerate() {
            let compressor = self.compressor.clone();
            let options = self.config.compression;
            let file_name = candidate.file_name.clone();
            let bytes = candidate.bytes.clone();

            join_set.spawn_blocking(move || {
                let result = compressor.compress(&file_name, &bytes, &options);
                (index, file_name, result)
            });
        }

        let mut parts: Vec<Option<UploadPart>> = Vec::new();
        parts.resize_with(self.candidates.len(), || None);
        let mut failures = 0;

        while let Some(joined) = join_set.join_next().await {
            match joined {
                Ok((index, file_name, Ok(bytes))) => {
                    parts[index] = Some(UploadPart { file_name, bytes });
                }
                Ok((_, file_name, Err(e))) => {
                    failures += 1;
                    self.ui.notify(
                        Severity::Error,
                        &format!("{}: {}", file_name, e.user_message()),
                    );
                }
                Err(e) => {
                    failures += 1;
                    self.ui
                        .notify(Severity::Error, &format!("Compression task failed: {}", e));
                }
            }
        }

        if failures > 0 {
            return Err(ClientError::Compression(format!(
                "{} of {} files failed to compress",
                failures,
                self.candidates.len()
            )));
        }

        Ok(parts.into_iter().flatten().collect())
    }

    /// Applies a successful upload response: records filenames in the
    /// dedupe set, clears the selection and surfaces each outcome category
    /// as its own notice
    fn reconcile(&mut self, response: &UploadResponse) {
        for candidate in &self.candidates {
            self.uploaded.insert(&candidate.file_name);
        }
        self.clear_candidates();

        self.ui.notify(
            Severity::Success,
            &format!("Uploaded {} new items", response.success_count),
        );

        if response.duplicate_count > 0 {
            self.ui.notify(
                Severity::Warning,
                &format!("{} duplicate items were filtered", response.duplicate_count),
            );
        }

        if response.fail_count > 0 {
            self.ui.notify(
                Severity::Error,
                &format!("{} uploads failed", response.fail_count),
            );
            if let Some(details) = &response.fail_details {
                if !details.is_empty() {
                    self.ui.notify(
                        Severity::Error,
                        &format!("Failure reasons: {}", details.join("; ")),
                    );
                }
            }
        }

        log::info!(
            "Upload reconciled: {} ok, {} duplicates, {} failed, {} items returned",
            response.success_count,
            response.duplicate_count,
            response.fail_count,
            response.items.len()
        );
    }
}

/// Accepts files whose declared type carries the image prefix; otherwise
/// falls back to the extension allow-list. Size is capped independently.
fn validate_file(config: &UploadConfig, file: &FileInput) -> Result<(), String> {
    if !file.content_type.starts_with("image/") {
        let extension = file
            .file_name
            .rsplit('.')
            .next()
            .filter(|ext| *ext != &file.file_name)
            .map(|ext| ext.to_ascii_lowercase());

        let allowed = extension
            .as_deref()
            .map(|ext| config.allowed_extensions.iter().any(|a| a == ext))
            .unwrap_or(false);

        if !allowed {
            let shown = if file.content_type.is_empty() {
                "unknown"
            } else {
                &file.content_type
            };
            return Err(format!("Unsupported file type: {}", shown));
        }
    }

    let size = file.bytes.len() as u64;
    if size > config.max_file_bytes {
        return Err(format!(
            "File too large: {:.2} MiB (max {} MiB)",
            size as f64 / 1024.0 / 1024.0,
            config.max_file_bytes / 1024 / 1024
        ));
    }

    Ok(())
}

/// Human-readable file size, used by the preview cards
pub fn format_file_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["Bytes", "KB", "MB", "GB"];
    if bytes == 0 {
        return "0 Bytes".to_string();
    }
    let exponent = (bytes as f64).log(1024.0).floor() as usize;
    let exponent = exponent.min(UNITS.len() - 1);
    let value = bytes as f64 / 1024f64.powi(exponent as i32);
    format!("{} {}", (value * 100.0).round() / 100.0, UNITS[exponent])
}
