// Template analysis: a forward-only pixel-statistics pipeline over one rendered page.
// palette → text regions → layout → design elements, all pure functions of the PixelBuffer.
// The CPU-bound part runs inside tokio::task::spawn_blocking (see analyzer.rs).

pub mod analyzer;
pub mod design_elements;
pub mod layout;
pub mod palette;
pub mod result;
pub mod session;
pub mod text_regions;
pub mod thresholds;

pub use analyzer::TemplateAnalyzer;
pub use result::AnalysisResult;
pub use session::ScratchPool;
