use std::io::Cursor;
use std::path::Path;
use std::sync::Arc;

use image::{DynamicImage, GrayImage, Luma};

use crate::error::ProcessError;

/// Grey level above which a pixel becomes white when binarising scans.
const BINARY_THRESHOLD: u8 = 127;

#[derive(Clone)]
pub struct OcrProcessor {
    inner: Arc<OcrProcessorInner>,
}

struct OcrProcessorInner {
    languages: String,
    dpi: u32,
}

impl OcrProcessor {
    pub fn new(languages: &[String], dpi: u32) -> Self {
        let lang_str = if languages.is_empty() {
            "por".to_string()
        } else {
            languages.join("+")
        };

        Self {
            inner: Arc::new(OcrProcessorInner {
                languages: lang_str,
                dpi,
            }),
        }
    }

    pub fn dpi(&self) -> u32 {
        self.inner.dpi
    }

    pub fn languages(&self) -> &str {
        &self.inner.languages
    }

    pub fn process_image(&self, image_path: &Path) -> Result<String, ProcessError> {
        self.process_image_bytes(&std::fs::read(image_path).map_err(|e| {
            ProcessError::ReadDocument {
                path: image_path.to_path_buf(),
                source: e,
            }
        })?)
    }

    /// Binarises the image and runs tesseract over it.
    pub fn process_image_bytes(&self, image_data: &[u8]) -> Result<String, ProcessError> {
        let _span = tracing::info_span!("extract.ocr", languages = %self.inner.languages).entered();

        let img = image::load_from_memory(image_data)
            .map_err(|e| ProcessError::OcrFailed(format!("Failed to load image: {}", e)))?;
        let binary = binarize(&img);

        // leptess reads encoded images, not raw buffers
        let mut png_data = Vec::new();
        DynamicImage::ImageLuma8(binary)
            .write_to(&mut Cursor::new(&mut png_data), image::ImageFormat::Png)
            .map_err(|e| ProcessError::OcrFailed(format!("Failed to convert image: {}", e)))?;

        let mut lt = leptess::LepTess::new(None, &self.inner.languages).map_err(|e| {
            ProcessError::OcrFailed(format!("Failed to initialize Tesseract: {}", e))
        })?;
        lt.set_image_from_mem(&png_data)
            .map_err(|e| ProcessError::OcrFailed(format!("Failed to set image for OCR: {}", e)))?;

        lt.get_utf8_text()
            .map_err(|e| ProcessError::OcrFailed(format!("OCR failed: {}", e)))
    }
}

/// Converts to greyscale and thresholds every pixel to pure black or white.
pub fn binarize(img: &DynamicImage) -> GrayImage {
    let mut gray = img.to_luma8();
    for pixel in gray.pixels_mut() {
        let Luma([value]) = *pixel;
        *pixel = Luma([if value > BINARY_THRESHOLD { 255 } else { 0 }]);
    }
    gray
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    #[test]
    fn test_languages_joined() {
        let processor = OcrProcessor::new(&["por".to_string(), "eng".to_string()], 300);
        assert_eq!(processor.languages(), "por+eng");
        assert_eq!(processor.dpi(), 300);
    }

    #[test]
    fn test_default_language_is_portuguese() {
        let processor = OcrProcessor::new(&[], 150);
        assert_eq!(processor.languages(), "por");
        assert_eq!(processor.clone().dpi(), 150);
    }

    #[test]
    fn test_binarize_thresholds_pixels() {
        let mut rgb = RgbImage::new(3, 1);
        rgb.put_pixel(0, 0, Rgb([10, 10, 10]));
        rgb.put_pixel(1, 0, Rgb([127, 127, 127]));
        rgb.put_pixel(2, 0, Rgb([240, 240, 240]));

        let binary = binarize(&DynamicImage::ImageRgb8(rgb));
        assert_eq!(binary.get_pixel(0, 0), &Luma([0]));
        assert_eq!(binary.get_pixel(1, 0), &Luma([0]));
        assert_eq!(binary.get_pixel(2, 0), &Luma([255]));
    }

    #[test]
    fn test_invalid_image_data_error() {
        let processor = OcrProcessor::new(&[], 300);
        match processor.process_image_bytes(b"not an image") {
            Err(ProcessError::OcrFailed(msg)) => assert!(msg.contains("Failed to load image")),
            other => panic!("Expected OcrFailed, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_nonexistent_file_error() {
        let processor = OcrProcessor::new(&[], 300);
        assert!(matches!(
            processor.process_image(Path::new("/nonexistent/scan.png")),
            Err(ProcessError::ReadDocument { .. })
        ));
    }
}
