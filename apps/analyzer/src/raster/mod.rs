// Raster boundary: everything that turns uploaded bytes into a PixelBuffer (plus the PDF
// text layer). The pixel analyses downstream never see encoded bytes.

pub mod decode;
pub mod pdf;
pub mod pixels;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use decode::decode_image;
pub use pdf::{LopdfTextRuns, PdfiumRenderer};
pub use pixels::{PixelBuffer, Rgba};

/// Failure modes of a whole analysis run. There is no partial result.
#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("Decode failure: {0}")]
    DecodeFailure(String),

    #[error("Analysis task failed: {0}")]
    Internal(String),
}

/// Input formats the analyzer accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceFormat {
    Png,
    Jpeg,
    Pdf,
}

impl SourceFormat {
    /// Resolves a declared MIME type. Parameters (`; charset=...`) and case are ignored.
    pub fn from_mime(mime: &str) -> Result<Self, AnalysisError> {
        let essence = mime
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();

        match essence.as_str() {
            "image/png" => Ok(SourceFormat::Png),
            "image/jpeg" | "image/jpg" => Ok(SourceFormat::Jpeg),
            "application/pdf" => Ok(SourceFormat::Pdf),
            _ => Err(AnalysisError::UnsupportedFormat(format!(
                "'{mime}' (expected image/png, image/jpeg or application/pdf)"
            ))),
        }
    }
}

/// A run of text on a PDF page as seen by the text layer.
#[derive(Debug, Clone, PartialEq)]
pub struct TextRun {
    pub font_name: String,
    pub font_size: f32,
}

/// Renders one page of a PDF into pixels.
pub trait PageRenderer: Send + Sync {
    fn render_page(
        &self,
        bytes: &[u8],
        page_index: u16,
        scale: f32,
    ) -> Result<PixelBuffer, AnalysisError>;
}

/// Reads the text layer of one PDF page.
pub trait TextRunExtractor: Send + Sync {
    fn extract_text_runs(&self, bytes: &[u8], page_index: u16)
        -> Result<Vec<TextRun>, AnalysisError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_mime_accepts_supported_types() {
        assert_eq!(SourceFormat::from_mime("image/png").unwrap(), SourceFormat::Png);
        assert_eq!(SourceFormat::from_mime("image/jpeg").unwrap(), SourceFormat::Jpeg);
        assert_eq!(SourceFormat::from_mime("image/jpg").unwrap(), SourceFormat::Jpeg);
        assert_eq!(SourceFormat::from_mime("application/pdf").unwrap(), SourceFormat::Pdf);
    }

    #[test]
    fn test_from_mime_ignores_case_and_parameters() {
        assert_eq!(
            SourceFormat::from_mime("Image/PNG; name=template.png").unwrap(),
            SourceFormat::Png
        );
    }

    #[test]
    fn test_from_mime_rejects_others() {
        for mime in ["image/gif", "image/webp", "text/plain", ""] {
            assert!(matches!(
                SourceFormat::from_mime(mime),
                Err(AnalysisError::UnsupportedFormat(_))
            ));
        }
    }
}
