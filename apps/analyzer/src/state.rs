use std::sync::Arc;

use crate::analysis::{ScratchPool, TemplateAnalyzer};
use crate::config::Config;
use crate::raster::{LopdfTextRuns, PdfiumRenderer};

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    /// Stateless apart from the scratch pool, which hands out buffers one run at a time.
    pub analyzer: Arc<TemplateAnalyzer>,
}

impl AppState {
    /// Wires the production PDF backends (pdfium rendering, lopdf text layer).
    pub fn new(config: Config) -> Self {
        let analyzer = TemplateAnalyzer::new(
            Arc::new(PdfiumRenderer::new(config.pdfium_library_path.clone())),
            Arc::new(LopdfTextRuns),
            Arc::new(ScratchPool::new(config.scratch_pool_size)),
            config.pdf_render_scale,
        );
        Self::with_analyzer(config, analyzer)
    }

    pub fn with_analyzer(config: Config, analyzer: TemplateAnalyzer) -> Self {
        Self {
            config,
            analyzer: Arc::new(analyzer),
        }
    }
}
