use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// Kind of artifact attached to an inspection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileKind {
    #[serde(alias = "foto")]
    Photo,
    Audio,
    #[serde(alias = "documento")]
    Document,
}

impl FileKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Photo => "photo",
            Self::Audio => "audio",
            Self::Document => "document",
        }
    }

    /// Guesses the kind from a file name using its MIME type.
    /// Anything that is neither an image nor audio is treated as a document.
    pub fn from_path(path: &Path) -> Self {
        match mime_guess::from_path(path).first() {
            Some(mime) if mime.type_() == mime_guess::mime::IMAGE => Self::Photo,
            Some(mime) if mime.type_() == mime_guess::mime::AUDIO => Self::Audio,
            _ => Self::Document,
        }
    }
}

impl FromStr for FileKind {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "photo" | "foto" => Ok(Self::Photo),
            "audio" | "áudio" => Ok(Self::Audio),
            "document" | "documento" => Ok(Self::Document),
            _ => Err(DomainError::InvalidStatus {
                kind: "file kind",
                value: s.to_string(),
            }),
        }
    }
}

impl fmt::Display for FileKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Background processing state of a stored artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProcessingStatus {
    Pending,
    Processing,
    Completed,
    Failed,
    /// The file was gone from disk when a job reached it.
    Missing,
}

impl ProcessingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Processing => "processing",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Missing => "missing",
        }
    }

    /// Pending and processing artifacts are picked up again on resume.
    pub fn is_resumable(&self) -> bool {
        matches!(self, Self::Pending | Self::Processing)
    }
}

impl FromStr for ProcessingStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "pending" => Ok(Self::Pending),
            "processing" => Ok(Self::Processing),
            "completed" => Ok(Self::Completed),
            "failed" => Ok(Self::Failed),
            "missing" => Ok(Self::Missing),
            _ => Err(DomainError::InvalidStatus {
                kind: "processing status",
                value: s.to_string(),
            }),
        }
    }
}

impl fmt::Display for ProcessingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One object found in a photo by the detector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectedObject {
    /// Checklist item name the detector label maps to.
    pub label: String,
    pub confidence: f64,
    /// Label as reported by the detection model.
    pub source_label: String,
}

/// Content derived from one artifact by a processing job.
#[derive(Debug, Clone, PartialEq)]
pub enum FileAnalysis {
    Photo {
        analysis: String,
        detected_objects: Vec<DetectedObject>,
    },
    Audio {
        transcription: String,
        /// Short summary of the transcription, stored as the analysis.
        summary: Option<String>,
    },
    Document {
        ocr_text: String,
    },
}

/// A stored artifact and the content derived from it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileRecord {
    pub id: i64,
    pub inspection_id: i64,
    pub checklist_entry_id: Option<i64>,
    pub kind: FileKind,
    pub file_path: String,
    pub original_filename: String,
    pub ai_analysis: Option<String>,
    pub transcription: Option<String>,
    pub ocr_text: Option<String>,
    pub detected_objects: Vec<DetectedObject>,
    pub processing_status: ProcessingStatus,
    pub attempts: u32,
    pub last_error: Option<String>,
    pub uploaded_at: String,
}

/// Fields recorded when a file is uploaded.
#[derive(Debug, Clone)]
pub struct NewFileRecord {
    pub inspection_id: i64,
    pub checklist_entry_id: Option<i64>,
    pub kind: FileKind,
    pub file_path: String,
    pub original_filename: String,
}

impl NewFileRecord {
    /// Builds an upload record, deriving the kind and original name from the path.
    pub fn from_path(inspection_id: i64, path: &Path) -> Self {
        let original_filename = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "unknown".to_string());
        Self {
            inspection_id,
            checklist_entry_id: None,
            kind: FileKind::from_path(path),
            file_path: path.to_string_lossy().to_string(),
            original_filename,
        }
    }

    pub fn linked_to(mut self, checklist_entry_id: i64) -> Self {
        self.checklist_entry_id = Some(checklist_entry_id);
        self
    }
}
