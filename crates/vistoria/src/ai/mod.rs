//! External AI collaborators and the pure helpers built on their output.
//!
//! Processing jobs only see the traits below. The binary wires concrete
//! implementations from config; tests inject fakes.

pub mod client;
pub mod detector;
pub mod document_info;
pub mod priority;
pub mod voice;

use std::path::Path;

use crate::error::{AiError, ProcessError};
use crate::model::DetectedObject;

pub use client::AiClient;
pub use detector::{
    suggest_checklist_items, to_detected_objects, ChecklistSuggestion, HttpObjectDetector,
};
pub use document_info::{extract_document_info, DocumentInfo};
pub use priority::determine_repair_priority;
pub use voice::{detect_voice_commands, VoiceAction, VoiceCommand};

/// Describes the condition of an inspected item from a photo.
pub trait VisionAnalyzer: Send + Sync {
    /// `item` is the checklist item the photo belongs to, when known.
    fn describe_image(
        &self,
        image: &[u8],
        mime_type: &str,
        item: Option<&str>,
    ) -> Result<String, AiError>;
}

pub trait SpeechToText: Send + Sync {
    fn transcribe(&self, audio: &[u8], filename: &str) -> Result<String, AiError>;
}

/// Finds known household objects in a photo.
///
/// Implementations return objects already filtered by confidence and mapped
/// to checklist item names.
pub trait ObjectDetector: Send + Sync {
    fn detect(&self, image: &[u8]) -> Result<Vec<DetectedObject>, AiError>;
}

pub trait TextSummarizer: Send + Sync {
    fn summarize(&self, text: &str) -> Result<String, AiError>;
}

/// Plain text from a stored document (text file, PDF or scanned image).
pub trait TextExtractor: Send + Sync {
    fn extract_text(&self, path: &Path) -> Result<String, ProcessError>;
}

/// Stand-in used when no AI provider is configured. Every call fails with
/// [`AiError::NotConfigured`], which jobs turn into placeholders.
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledAi;

impl VisionAnalyzer for DisabledAi {
    fn describe_image(&self, _: &[u8], _: &str, _: Option<&str>) -> Result<String, AiError> {
        Err(AiError::NotConfigured("vision analysis"))
    }
}

impl SpeechToText for DisabledAi {
    fn transcribe(&self, _: &[u8], _: &str) -> Result<String, AiError> {
        Err(AiError::NotConfigured("speech to text"))
    }
}

impl TextSummarizer for DisabledAi {
    fn summarize(&self, _: &str) -> Result<String, AiError> {
        Err(AiError::NotConfigured("summarization"))
    }
}

/// Detector that never finds anything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopDetector;

impl ObjectDetector for NoopDetector {
    fn detect(&self, _: &[u8]) -> Result<Vec<DetectedObject>, AiError> {
        Ok(Vec::new())
    }
}
