//! Object detection through an HTTP inference service.
//!
//! The service receives raw image bytes and answers with a JSON array of
//! `{"label": "...", "confidence": 0.0..1.0}` items using COCO class names.

use std::collections::HashSet;
use std::time::Duration;

use log::debug;
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};

use super::ObjectDetector;
use crate::config::DetectorConfig;
use crate::error::AiError;
use crate::model::DetectedObject;

/// COCO classes that correspond to checklist items under another name.
const LABEL_MAP: &[(&str, &str)] = &[
    ("dining table", "table"),
    ("tv", "television"),
    ("couch", "sofa"),
];

/// One detection as reported by the service.
#[derive(Debug, Clone, Deserialize)]
pub struct RawDetection {
    pub label: String,
    pub confidence: f64,
}

/// Maps a detector class to the checklist item name used in inspections.
pub fn checklist_label(source_label: &str) -> String {
    let source = source_label.trim().to_lowercase();
    LABEL_MAP
        .iter()
        .find(|(from, _)| *from == source)
        .map(|(_, to)| (*to).to_string())
        .unwrap_or(source)
}

/// Keeps detections strictly above `min_confidence` and maps their labels.
pub fn to_detected_objects(raw: Vec<RawDetection>, min_confidence: f64) -> Vec<DetectedObject> {
    raw.into_iter()
        .filter(|d| d.confidence > min_confidence)
        .map(|d| DetectedObject {
            label: checklist_label(&d.label),
            confidence: (d.confidence * 100.0).round() / 100.0,
            source_label: d.label,
        })
        .collect()
}

/// Checklist items suggested from the objects found in a room's photos.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChecklistSuggestion {
    /// Distinct item names in first-seen order.
    pub detected_items: Vec<String>,
    pub total_objects: usize,
    pub unique_objects: usize,
}

pub fn suggest_checklist_items(objects: &[DetectedObject]) -> ChecklistSuggestion {
    let mut seen = HashSet::new();
    let detected_items: Vec<String> = objects
        .iter()
        .filter(|o| seen.insert(o.label.as_str()))
        .map(|o| o.label.clone())
        .collect();

    ChecklistSuggestion {
        unique_objects: detected_items.len(),
        total_objects: objects.len(),
        detected_items,
    }
}

pub struct HttpObjectDetector {
    client: Client,
    endpoint: String,
    min_confidence: f64,
}

impl HttpObjectDetector {
    pub fn new(endpoint: &str, min_confidence: f64, timeout: Duration) -> Result<Self, AiError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            endpoint: endpoint.to_string(),
            min_confidence,
        })
    }

    pub fn from_config(config: &DetectorConfig) -> Result<Self, AiError> {
        let endpoint = config
            .endpoint
            .as_deref()
            .ok_or(AiError::NotConfigured("object detector endpoint"))?;
        Self::new(
            endpoint,
            config.min_confidence,
            Duration::from_secs(config.timeout_secs),
        )
    }
}

impl ObjectDetector for HttpObjectDetector {
    fn detect(&self, image: &[u8]) -> Result<Vec<DetectedObject>, AiError> {
        let response = self
            .client
            .post(&self.endpoint)
            .header(reqwest::header::CONTENT_TYPE, "application/octet-stream")
            .body(image.to_vec())
            .send()?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(AiError::Api {
                status: status.as_u16(),
                body: super::client::truncate_body(&body),
            });
        }

        let raw: Vec<RawDetection> = response
            .json()
            .map_err(|e| AiError::InvalidResponse(e.to_string()))?;
        debug!("Detector returned {} raw detections", raw.len());

        Ok(to_detected_objects(raw, self.min_confidence))
    }
}
