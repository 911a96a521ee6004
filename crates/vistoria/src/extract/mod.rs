//! Plain text extraction from uploaded documents.

pub mod ocr;
pub mod pdf;

use std::path::Path;

use crate::ai::TextExtractor;
use crate::config::OcrConfig;
use crate::error::ProcessError;

pub use ocr::OcrProcessor;
pub use pdf::PdfTextExtractor;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    Text,
    Pdf,
    Image,
}

impl DocumentFormat {
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "txt" | "md" | "text" => Some(Self::Text),
            "pdf" => Some(Self::Pdf),
            "png" | "jpg" | "jpeg" | "tiff" | "tif" | "bmp" | "gif" | "webp" => Some(Self::Image),
            _ => None,
        }
    }
}

/// Routes a document to the right extractor by file extension.
pub struct DocumentTextExtractor {
    ocr: Option<OcrProcessor>,
    pdf: PdfTextExtractor,
}

impl DocumentTextExtractor {
    pub fn new(ocr_enabled: bool, ocr_languages: &[String], ocr_dpi: u32) -> Self {
        let ocr = ocr_enabled.then(|| OcrProcessor::new(ocr_languages, ocr_dpi));
        Self {
            pdf: PdfTextExtractor::new(ocr.clone()),
            ocr,
        }
    }

    pub fn from_config(config: &OcrConfig) -> Self {
        Self::new(config.enabled, &config.languages, config.dpi)
    }
}

impl TextExtractor for DocumentTextExtractor {
    fn extract_text(&self, path: &Path) -> Result<String, ProcessError> {
        let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("");
        let format = DocumentFormat::from_extension(extension)
            .ok_or_else(|| ProcessError::UnsupportedFormat(extension.to_string()))?;

        match format {
            DocumentFormat::Text => {
                std::fs::read_to_string(path).map_err(|e| ProcessError::ReadDocument {
                    path: path.to_path_buf(),
                    source: e,
                })
            }
            DocumentFormat::Pdf => self.pdf.extract(path),
            DocumentFormat::Image => match &self.ocr {
                Some(ocr) => ocr.process_image(path),
                None => Err(ProcessError::OcrFailed("OCR is disabled".to_string())),
            },
        }
    }
}
