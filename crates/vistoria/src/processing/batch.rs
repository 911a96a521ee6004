//! Artifact batch jobs: photos, audio notes and documents.

use std::path::Path;

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use super::{ProcessingContext, ReportStatus};
use crate::ai::{
    determine_repair_priority, detect_voice_commands, extract_document_info, DocumentInfo,
    VoiceCommand,
};
use crate::db::{checklist_repo, file_repo, DatabaseError};
use crate::model::{DetectedObject, FileAnalysis, FileKind, FileRecord, Priority};
use crate::sanitize::{hash_path, redact_path};

const VISION_PLACEHOLDER: &str = "Image analysis unavailable";
const TRANSCRIPTION_PLACEHOLDER: &str = "Transcription unavailable";
const OCR_PLACEHOLDER: &str = "Text extraction unavailable";

/// Per-file status in a batch report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileOutcomeStatus {
    Processed,
    Transcribed,
    OcrCompleted,
}

impl FileOutcomeStatus {
    fn for_kind(kind: FileKind) -> Self {
        match kind {
            FileKind::Photo => Self::Processed,
            FileKind::Audio => Self::Transcribed,
            FileKind::Document => Self::OcrCompleted,
        }
    }
}

/// Result for one completed file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileOutcome {
    pub file_path: String,
    pub status: FileOutcomeStatus,
    pub file_size: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_length: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub detected_objects: Vec<DetectedObject>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub voice_commands: Vec<VoiceCommand>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub document_fields: Option<DocumentInfo>,
    /// Collaborator failure that was replaced by a placeholder.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

impl FileOutcome {
    fn new(file_path: &str, kind: FileKind, file_size: u64) -> Self {
        Self {
            file_path: file_path.to_string(),
            status: FileOutcomeStatus::for_kind(kind),
            file_size,
            text_length: None,
            priority: None,
            detected_objects: Vec::new(),
            voice_commands: Vec::new(),
            document_fields: None,
            warning: None,
        }
    }

    fn warn(&mut self, message: String) {
        match &mut self.warning {
            Some(existing) => {
                existing.push_str("; ");
                existing.push_str(&message);
            }
            None => self.warning = Some(message),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchReport {
    pub inspection_id: i64,
    pub kind: FileKind,
    /// Files that reached `completed`. Missing and unregistered files are not counted.
    pub processed_files: usize,
    pub results: Vec<FileOutcome>,
    pub status: ReportStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

enum Step {
    Skipped,
    Done(FileOutcome),
}

/// Processes every path of one artifact class for an inspection.
///
/// Missing files are recorded as `missing` and skipped. Files without a
/// matching record are read and discarded. Collaborator failures become
/// placeholders. A database error stops the batch and fails the report.
pub fn process_artifacts(
    ctx: &ProcessingContext,
    kind: FileKind,
    inspection_id: i64,
    paths: &[String],
) -> BatchReport {
    let mut report = BatchReport {
        inspection_id,
        kind,
        processed_files: 0,
        results: Vec::new(),
        status: ReportStatus::Success,
        error: None,
    };

    for path in paths {
        let _span = tracing::info_span!(
            "artifact",
            kind = %kind,
            file = %redact_path(Path::new(path)),
            path_hash = %hash_path(Path::new(path))
        )
        .entered();

        match process_one(ctx, kind, inspection_id, path) {
            Ok(Step::Done(outcome)) => {
                report.processed_files += 1;
                report.results.push(outcome);
            }
            Ok(Step::Skipped) => {}
            Err(e) => {
                warn!(
                    "Batch for inspection {} stopped on {}: {}",
                    inspection_id,
                    redact_path(Path::new(path)),
                    e
                );
                report.status = ReportStatus::Failed;
                report.error = Some(e.to_string());
                break;
            }
        }
    }

    info!(
        "{} batch for inspection {}: {} of {} files processed",
        kind,
        inspection_id,
        report.processed_files,
        paths.len()
    );
    report
}

fn process_one(
    ctx: &ProcessingContext,
    kind: FileKind,
    inspection_id: i64,
    path: &str,
) -> Result<Step, DatabaseError> {
    let db = &ctx.db;
    let file_path = Path::new(path);

    if !file_path.exists() {
        let marked =
            db.with_conn(|conn| file_repo::mark_missing_in(conn, inspection_id, path))?;
        debug!("File missing on disk ({} records marked)", marked);
        return Ok(Step::Skipped);
    }

    let bytes = match std::fs::read(file_path) {
        Ok(bytes) => bytes,
        Err(e) => {
            warn!("Failed to read {}: {}", redact_path(file_path), e);
            let message = format!("read failed: {}", e);
            db.with_conn(|conn| {
                match file_repo::find_for_inspection_in(conn, inspection_id, path)? {
                    Some(record) => file_repo::mark_failed_in(conn, record.id, &message),
                    None => Ok(()),
                }
            })?;
            return Ok(Step::Skipped);
        }
    };

    let record = match db.with_conn(|conn| {
        let record = file_repo::find_for_inspection_in(conn, inspection_id, path)?;
        if let Some(record) = &record {
            file_repo::begin_attempt_in(conn, record.id)?;
        }
        Ok(record)
    })? {
        Some(record) => record,
        None => {
            debug!("No file record for path, discarding {} bytes", bytes.len());
            return Ok(Step::Skipped);
        }
    };

    let result = analyze_and_store(ctx, kind, &record, &bytes);
    if let Err(e) = &result {
        let message = e.to_string();
        if let Err(mark_err) =
            db.with_conn(|conn| file_repo::mark_failed_in(conn, record.id, &message))
        {
            warn!("Failed to mark file {} as failed: {}", record.id, mark_err);
        }
    }
    result.map(Step::Done)
}

fn analyze_and_store(
    ctx: &ProcessingContext,
    kind: FileKind,
    record: &FileRecord,
    bytes: &[u8],
) -> Result<FileOutcome, DatabaseError> {
    let outcome = FileOutcome::new(&record.file_path, kind, bytes.len() as u64);

    match kind {
        FileKind::Photo => analyze_photo(ctx, record, bytes, outcome),
        FileKind::Audio => analyze_audio(ctx, record, bytes, outcome),
        FileKind::Document => analyze_document(ctx, record, outcome),
    }
}

fn analyze_photo(
    ctx: &ProcessingContext,
    record: &FileRecord,
    bytes: &[u8],
    mut outcome: FileOutcome,
) -> Result<FileOutcome, DatabaseError> {
    let collaborators = &ctx.collaborators;
    let linked_entry = match record.checklist_entry_id {
        Some(entry_id) => checklist_repo::find_by_id(&ctx.db, entry_id)?,
        None => None,
    };
    let mime_type = mime_guess::from_path(&record.file_path)
        .first_or(mime_guess::mime::IMAGE_JPEG)
        .to_string();

    let described = collaborators.vision.describe_image(
        bytes,
        &mime_type,
        linked_entry.as_ref().map(|e| e.item.as_str()),
    );
    let (analysis, analysed) = match described {
        Ok(text) => (text, true),
        Err(e) => {
            warn!("Vision analysis failed: {}", e);
            outcome.warn(format!("vision: {}", e));
            (VISION_PLACEHOLDER.to_string(), false)
        }
    };
    let priority = determine_repair_priority(&analysis);

    let detected_objects = match collaborators.detector.detect(bytes) {
        Ok(objects) => objects,
        Err(e) => {
            warn!("Object detection failed: {}", e);
            outcome.warn(format!("detector: {}", e));
            Vec::new()
        }
    };

    outcome.priority = Some(priority);
    outcome.detected_objects = detected_objects.clone();

    let analysis_record = FileAnalysis::Photo {
        analysis: analysis.clone(),
        detected_objects,
    };
    ctx.db.with_conn(|conn| {
        file_repo::complete_in(conn, record.id, &analysis_record, outcome.warning.as_deref())?;
        // A placeholder must not overwrite an earlier real analysis.
        if let (Some(entry), true) = (&linked_entry, analysed) {
            checklist_repo::update_analysis_in(conn, entry.id, &analysis, priority)?;
        }
        Ok(())
    })?;

    Ok(outcome)
}

fn analyze_audio(
    ctx: &ProcessingContext,
    record: &FileRecord,
    bytes: &[u8],
    mut outcome: FileOutcome,
) -> Result<FileOutcome, DatabaseError> {
    let collaborators = &ctx.collaborators;

    let (transcription, summary) = match collaborators
        .speech
        .transcribe(bytes, &record.original_filename)
    {
        Ok(text) => {
            outcome.voice_commands = detect_voice_commands(&text);
            if !outcome.voice_commands.is_empty() {
                info!(
                    "Detected {} voice commands in {}",
                    outcome.voice_commands.len(),
                    record.original_filename
                );
            }
            let summary = if text.trim().is_empty() {
                None
            } else {
                match collaborators.summarizer.summarize(&text) {
                    Ok(summary) => Some(summary),
                    Err(e) => {
                        debug!("Summary skipped: {}", e);
                        None
                    }
                }
            };
            (text, summary)
        }
        Err(e) => {
            warn!("Transcription failed: {}", e);
            outcome.warn(format!("transcription: {}", e));
            (TRANSCRIPTION_PLACEHOLDER.to_string(), None)
        }
    };
    outcome.text_length = Some(transcription.chars().count());

    let analysis = FileAnalysis::Audio {
        transcription,
        summary,
    };
    ctx.db.with_conn(|conn| {
        file_repo::complete_in(conn, record.id, &analysis, outcome.warning.as_deref())
    })?;

    Ok(outcome)
}

fn analyze_document(
    ctx: &ProcessingContext,
    record: &FileRecord,
    mut outcome: FileOutcome,
) -> Result<FileOutcome, DatabaseError> {
    let path = Path::new(&record.file_path);
    let ocr_text = match ctx.collaborators.extractor.extract_text(path) {
        Ok(text) => {
            let fields = extract_document_info(&text);
            if !fields.is_empty() {
                outcome.document_fields = Some(fields);
            }
            text
        }
        Err(e) => {
            warn!("Text extraction failed: {}", e);
            outcome.warn(format!("ocr: {}", e));
            OCR_PLACEHOLDER.to_string()
        }
    };
    outcome.text_length = Some(ocr_text.chars().count());

    let analysis = FileAnalysis::Document { ocr_text };
    ctx.db.with_conn(|conn| {
        file_repo::complete_in(conn, record.id, &analysis, outcome.warning.as_deref())
    })?;

    Ok(outcome)
}
