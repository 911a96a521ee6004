use std::path::{Path, PathBuf};
use std::process::Command;

use log::warn;

use super::ocr::OcrProcessor;
use crate::error::ProcessError;

/// Text layer extraction with an OCR fallback for scanned or unreadable PDFs.
pub struct PdfTextExtractor {
    ocr: Option<OcrProcessor>,
}

impl PdfTextExtractor {
    pub fn new(ocr: Option<OcrProcessor>) -> Self {
        Self { ocr }
    }

    pub fn extract(&self, path: &Path) -> Result<String, ProcessError> {
        let _span = tracing::info_span!("extract.pdf").entered();

        let pdf_bytes = std::fs::read(path).map_err(|e| ProcessError::ReadDocument {
            path: path.to_path_buf(),
            source: e,
        })?;

        match lopdf::Document::load_mem(&pdf_bytes) {
            Ok(doc) => {
                let text = extract_text_layer(&doc);
                match &self.ocr {
                    Some(ocr) if should_use_ocr(&text) => {
                        let _ocr_span =
                            tracing::info_span!("extract.ocr_fallback", reason = "text_quality")
                                .entered();
                        Ok(ocr_pages(&pdf_bytes, doc.get_pages().len(), ocr))
                    }
                    _ => Ok(text),
                }
            }
            Err(e) => {
                warn!(
                    "lopdf failed to parse {}: {}. Falling back to OCR.",
                    crate::sanitize::redact_path(path),
                    e
                );
                let ocr = self.ocr.as_ref().ok_or_else(|| {
                    ProcessError::PdfProcessing(format!(
                        "Failed to load PDF: {}. OCR fallback unavailable.",
                        e
                    ))
                })?;
                let _ocr_span =
                    tracing::info_span!("extract.ocr_fallback", reason = "lopdf_parse_failed")
                        .entered();
                let page_count = count_pdf_pages(&pdf_bytes)?;
                Ok(ocr_pages(&pdf_bytes, page_count, ocr))
            }
        }
    }
}

fn extract_text_layer(doc: &lopdf::Document) -> String {
    let mut text = String::new();
    for (page_num, _) in doc.get_pages() {
        if let Ok(page_text) = doc.extract_text(&[page_num]) {
            text.push_str(&page_text);
            text.push('\n');
        }
    }
    text
}

/// Pages that fail to render or recognise are skipped.
fn ocr_pages(pdf_bytes: &[u8], page_count: usize, ocr: &OcrProcessor) -> String {
    let mut all_text = String::new();
    for page_num in 1..=page_count {
        match render_pdf_page_to_image(pdf_bytes, page_num as u32, ocr.dpi()) {
            Ok(image_data) => match ocr.process_image_bytes(&image_data) {
                Ok(page_text) => {
                    all_text.push_str(&page_text);
                    all_text.push('\n');
                }
                Err(e) => warn!("OCR failed on page {}: {}", page_num, e),
            },
            Err(e) => warn!("Failed to render page {}: {}", page_num, e),
        }
    }
    all_text
}

/// Pattern for Identity-H Unimplemented errors (common with CID fonts).
const IDENTITY_H_PATTERN: &str = "?Identity-H Unimplemented?";

/// Text shorter than this is accepted regardless of composition.
const MIN_TOTAL_CHARS: usize = 50;

const MIN_ALPHANUMERIC_PERCENT: usize = 10;

/// True when the text layer is empty, only font-encoding markers, or
/// mostly non-alphanumeric noise.
pub(crate) fn should_use_ocr(text: &str) -> bool {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return true;
    }

    let cleaned = trimmed
        .replace(IDENTITY_H_PATTERN, "")
        .replace(['\n', ' '], "");
    if cleaned.is_empty() {
        return true;
    }

    let total_chars = trimmed.chars().count();
    let alphanumeric_chars = trimmed.chars().filter(|c| c.is_alphanumeric()).count();
    total_chars > MIN_TOTAL_CHARS
        && alphanumeric_chars * 100 < total_chars * MIN_ALPHANUMERIC_PERCENT
}

/// Temp file removed on drop.
struct TempPath(PathBuf);

impl TempPath {
    fn new(prefix: &str, extension: &str) -> Self {
        Self(std::env::temp_dir().join(format!(
            "vistoria_{}_{}{}",
            prefix,
            uuid::Uuid::new_v4(),
            extension
        )))
    }
}

impl Drop for TempPath {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.0);
    }
}

fn write_temp_pdf(pdf_bytes: &[u8]) -> Result<TempPath, ProcessError> {
    let pdf_path = TempPath::new("pdf", ".pdf");
    std::fs::write(&pdf_path.0, pdf_bytes)
        .map_err(|e| ProcessError::PdfProcessing(format!("Failed to write temp PDF: {}", e)))?;
    Ok(pdf_path)
}

/// Page count via pdfinfo (poppler-utils), for PDFs lopdf cannot parse.
fn count_pdf_pages(pdf_bytes: &[u8]) -> Result<usize, ProcessError> {
    let pdf_path = write_temp_pdf(pdf_bytes)?;

    let output = Command::new("pdfinfo")
        .arg(&pdf_path.0)
        .output()
        .map_err(|e| {
            ProcessError::PdfProcessing(format!(
                "Failed to run pdfinfo: {}. Make sure poppler-utils is installed.",
                e
            ))
        })?;

    if !output.status.success() {
        return Err(ProcessError::PdfProcessing(format!(
            "pdfinfo failed: {}",
            String::from_utf8_lossy(&output.stderr)
        )));
    }

    Ok(parse_page_count(&String::from_utf8_lossy(&output.stdout)))
}

/// Reads the `Pages:` line of pdfinfo output, defaulting to one page.
fn parse_page_count(pdfinfo_output: &str) -> usize {
    pdfinfo_output
        .lines()
        .filter_map(|line| line.strip_prefix("Pages:"))
        .find_map(|count| count.trim().parse::<usize>().ok())
        .unwrap_or(1)
}

fn render_pdf_page_to_image(
    pdf_bytes: &[u8],
    page_num: u32,
    dpi: u32,
) -> Result<Vec<u8>, ProcessError> {
    let pdf_path = write_temp_pdf(pdf_bytes)?;
    let output_prefix = TempPath::new("page", "");

    let page = page_num.to_string();
    let output = Command::new("pdftoppm")
        .args(["-png", "-r", &dpi.to_string(), "-f", &page, "-l", &page])
        .arg(&pdf_path.0)
        .arg(&output_prefix.0)
        .output()
        .map_err(|e| {
            ProcessError::PdfProcessing(format!(
                "Failed to run pdftoppm: {}. Make sure poppler-utils is installed.",
                e
            ))
        })?;

    if !output.status.success() {
        return Err(ProcessError::PdfProcessing(format!(
            "pdftoppm failed: {}",
            String::from_utf8_lossy(&output.stderr)
        )));
    }

    // pdftoppm pads the page suffix depending on the page count
    let prefix = output_prefix.0.display().to_string();
    let rendered = [
        format!("{}-{}.png", prefix, page_num),
        format!("{}-{:02}.png", prefix, page_num),
        format!("{}-{:03}.png", prefix, page_num),
    ]
    .into_iter()
    .map(PathBuf::from)
    .find(|p| p.exists())
    .map(TempPath)
    .ok_or_else(|| ProcessError::PdfProcessing("Failed to find rendered page image".to_string()))?;

    std::fs::read(&rendered.0)
        .map_err(|e| ProcessError::PdfProcessing(format!("Failed to read rendered image: {}", e)))
}
