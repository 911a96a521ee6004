//! Deterministic stand-ins for the external collaborators.

#![allow(dead_code)]

use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use vistoria::ai::{ObjectDetector, SpeechToText, TextExtractor, TextSummarizer, VisionAnalyzer};
use vistoria::model::DetectedObject;
use vistoria::processing::Collaborators;
use vistoria::{AiError, ProcessError};

/// Returns a fixed description and records the item hint it was given.
pub struct FakeVision {
    pub description: String,
    pub calls: AtomicUsize,
    pub last_item: std::sync::Mutex<Option<String>>,
}

impl FakeVision {
    pub fn new(description: &str) -> Self {
        Self {
            description: description.to_string(),
            calls: AtomicUsize::new(0),
            last_item: std::sync::Mutex::new(None),
        }
    }
}

impl VisionAnalyzer for FakeVision {
    fn describe_image(
        &self,
        _image: &[u8],
        _mime_type: &str,
        item: Option<&str>,
    ) -> Result<String, AiError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_item.lock().unwrap() = item.map(str::to_string);
        Ok(self.description.clone())
    }
}

/// Holds the worker for `delay` before answering.
pub struct SlowVision(pub Duration);

impl VisionAnalyzer for SlowVision {
    fn describe_image(&self, _: &[u8], _: &str, _: Option<&str>) -> Result<String, AiError> {
        std::thread::sleep(self.0);
        Ok("Slow but fine.".to_string())
    }
}

pub struct FailingVision;

impl VisionAnalyzer for FailingVision {
    fn describe_image(&self, _: &[u8], _: &str, _: Option<&str>) -> Result<String, AiError> {
        Err(AiError::Api {
            status: 503,
            body: "overloaded".to_string(),
        })
    }
}

pub struct FakeSpeech(pub String);

impl SpeechToText for FakeSpeech {
    fn transcribe(&self, _audio: &[u8], _filename: &str) -> Result<String, AiError> {
        Ok(self.0.clone())
    }
}

pub struct FakeDetector(pub Vec<DetectedObject>);

impl ObjectDetector for FakeDetector {
    fn detect(&self, _image: &[u8]) -> Result<Vec<DetectedObject>, AiError> {
        Ok(self.0.clone())
    }
}

pub struct FakeSummarizer;

impl TextSummarizer for FakeSummarizer {
    fn summarize(&self, text: &str) -> Result<String, AiError> {
        Ok(format!("summary of {} chars", text.chars().count()))
    }
}

/// Reads the file as UTF-8 text.
pub struct PlainTextExtractor;

impl TextExtractor for PlainTextExtractor {
    fn extract_text(&self, path: &Path) -> Result<String, ProcessError> {
        std::fs::read_to_string(path).map_err(|e| ProcessError::ReadDocument {
            path: path.to_path_buf(),
            source: e,
        })
    }
}

/// Collaborators that always succeed with the given canned answers.
pub fn fake_collaborators(description: &str, transcription: &str) -> Collaborators {
    Collaborators {
        vision: Arc::new(FakeVision::new(description)),
        speech: Arc::new(FakeSpeech(transcription.to_string())),
        detector: Arc::new(FakeDetector(vec![DetectedObject {
            label: "table".to_string(),
            confidence: 0.91,
            source_label: "dining table".to_string(),
        }])),
        summarizer: Arc::new(FakeSummarizer),
        extractor: Arc::new(PlainTextExtractor),
    }
}
