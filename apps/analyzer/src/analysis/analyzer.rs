//! Template analyzer entry point.
//!
//! `analyze` validates the declared format up front, then does all decoding, rendering and pixel
//! work inside `tokio::task::spawn_blocking`. A run yields exactly one result or one error.

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Instant;

use bytes::Bytes;
use tracing::{debug, info, warn};

use crate::analysis::result::AnalysisResult;
use crate::analysis::session::{AnalysisSession, PooledScratch, ScratchPool};
use crate::analysis::thresholds::AnalyzerThresholds;
use crate::raster::{
    decode_image, AnalysisError, PageRenderer, PixelBuffer, SourceFormat, TextRunExtractor,
};

/// Only the first page of a PDF template is analyzed.
const FIRST_PAGE: u16 = 0;
/// PDF user space unit.
const POINTS_PER_INCH: f32 = 72.0;
/// Raster templates are assumed to span a US-letter page width.
const ASSUMED_PAGE_WIDTH_IN: f32 = 8.5;

/// Result plus the facts a consumer needs to map pixels back to page units.
#[derive(Debug, Clone)]
pub struct AnalysisOutcome {
    pub result: AnalysisResult,
    pub format: SourceFormat,
    pub pixels_per_inch: f32,
}

pub struct TemplateAnalyzer {
    renderer: Arc<dyn PageRenderer>,
    text_runs: Arc<dyn TextRunExtractor>,
    scratch: Arc<ScratchPool>,
    render_scale: f32,
    thresholds: AnalyzerThresholds,
}

impl TemplateAnalyzer {
    pub fn new(
        renderer: Arc<dyn PageRenderer>,
        text_runs: Arc<dyn TextRunExtractor>,
        scratch: Arc<ScratchPool>,
        render_scale: f32,
    ) -> Self {
        Self {
            renderer,
            text_runs,
            scratch,
            render_scale,
            thresholds: AnalyzerThresholds::default(),
        }
    }

    #[cfg(test)]
    pub fn with_thresholds(mut self, thresholds: AnalyzerThresholds) -> Self {
        self.thresholds = thresholds;
        self
    }

    /// Analyzes one uploaded template.
    ///
    /// Unsupported MIME types fail before any pixel work. Decode and render failures abort the
    /// whole run. There is no retry and no internal cancellation point; dropping the future
    /// abandons the result but the blocking task still runs to completion.
    pub async fn analyze(&self, bytes: Bytes, mime: &str) -> Result<AnalysisOutcome, AnalysisError> {
        let format = SourceFormat::from_mime(mime)?;

        let renderer = Arc::clone(&self.renderer);
        let text_runs = Arc::clone(&self.text_runs);
        let scratch = self.scratch.checkout();
        let thresholds = self.thresholds.clone();
        let scale = self.render_scale;
        let byte_len = bytes.len();
        let started = Instant::now();

        let outcome = tokio::task::spawn_blocking(move || {
            run_pipeline(
                &bytes,
                format,
                renderer.as_ref(),
                text_runs.as_ref(),
                scale,
                scratch,
                &thresholds,
            )
        })
        .await
        .map_err(|e| AnalysisError::Internal(format!("spawn_blocking failed in analysis: {e}")))?
        .inspect_err(|e| warn!(?format, byte_len, "Template analysis failed: {e}"))?;

        info!(
            ?format,
            byte_len,
            width = outcome.result.dimensions.width,
            height = outcome.result.dimensions.height,
            swatches = outcome.result.color_palette.len(),
            text_blocks = outcome.result.layout.text_blocks.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Template analysis complete"
        );

        Ok(outcome)
    }
}

/// Synchronous body of an analysis run (executes inside `spawn_blocking`).
fn run_pipeline(
    bytes: &[u8],
    format: SourceFormat,
    renderer: &dyn PageRenderer,
    text_runs: &dyn TextRunExtractor,
    render_scale: f32,
    scratch: PooledScratch,
    thresholds: &AnalyzerThresholds,
) -> Result<AnalysisOutcome, AnalysisError> {
    let (pixels, fonts, pixels_per_inch) = match format {
        SourceFormat::Pdf => {
            let pixels = renderer.render_page(bytes, FIRST_PAGE, render_scale)?;
            let fonts = distinct_fonts(text_runs, bytes)?;
            (pixels, fonts, POINTS_PER_INCH * render_scale)
        }
        SourceFormat::Png | SourceFormat::Jpeg => {
            let pixels = decode_image(bytes, format)?;
            let ppi = raster_pixels_per_inch(&pixels);
            (pixels, Vec::new(), ppi)
        }
    };

    let result = AnalysisSession::new(pixels, scratch).run(fonts, thresholds);

    Ok(AnalysisOutcome {
        result,
        format,
        pixels_per_inch,
    })
}

/// Set semantics: duplicates collapse, order is alphabetical rather than by usage.
fn distinct_fonts(
    text_runs: &dyn TextRunExtractor,
    bytes: &[u8],
) -> Result<Vec<String>, AnalysisError> {
    let runs = text_runs.extract_text_runs(bytes, FIRST_PAGE)?;
    let largest_size = runs.iter().map(|run| run.font_size).fold(0.0_f32, f32::max);
    debug!(runs = runs.len(), largest_size, "PDF text layer read");

    let names: BTreeSet<String> = runs
        .into_iter()
        .map(|run| run.font_name)
        .filter(|name| !name.is_empty())
        .collect();
    Ok(names.into_iter().collect())
}

fn raster_pixels_per_inch(pixels: &PixelBuffer) -> f32 {
    pixels.width() as f32 / ASSUMED_PAGE_WIDTH_IN
}
