//! Heuristic thresholds of the template analyzer.
//!
//! These are empirically chosen values, not derived constants. They are grouped in
//! [`AnalyzerThresholds`] so tests and callers can tune a run without touching the stages.

use serde::{Deserialize, Serialize};

/// Sample every Nth pixel (row-major) when building the palette.
pub const PALETTE_SAMPLE_STRIDE: usize = 10;
/// Samples with alpha below this are ignored by the palette.
pub const PALETTE_MIN_ALPHA: u8 = 128;
/// Channel quantization bucket width.
pub const PALETTE_BUCKET_WIDTH: u8 = 20;
/// Maximum number of swatches returned.
pub const PALETTE_MAX_SWATCHES: usize = 8;

/// Side of the square text-scoring cell, in pixels.
pub const TEXT_BLOCK_SIZE: u32 = 20;
/// Luminance delta above which a pixel counts as an edge.
pub const TEXT_EDGE_THRESHOLD: f32 = 30.0;
/// Cells must score strictly above this to become candidate text blocks.
pub const TEXT_SCORE_THRESHOLD: f32 = 0.3;
/// Bounding boxes are expanded by this many pixels before the adjacency test.
pub const TEXT_MERGE_TOLERANCE: u32 = 30;

/// Pixels darker than this are page content (sections, margins).
pub const CONTENT_LUMINANCE: f32 = 240.0;
/// A row has content when its content-pixel count exceeds this fraction of the width.
pub const SECTION_ROW_FILL: f32 = 0.10;
/// A run of content rows must be taller than this fraction of the height to be a section.
pub const SECTION_MIN_HEIGHT: f32 = 0.05;
/// Block left/top edges are rounded to this grid when estimating columns and rows.
pub const GRID_SNAP: u32 = 10;

/// Pixels darker than this can belong to a divider line.
pub const LINE_LUMINANCE: f32 = 200.0;
/// Only every Nth row is scanned for divider lines.
pub const LINE_ROW_STEP: u32 = 5;
/// A dark run must be longer than this fraction of the width to count as a line.
pub const LINE_MIN_LENGTH: f32 = 0.10;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyzerThresholds {
    pub palette_sample_stride: usize,
    pub palette_min_alpha: u8,
    pub palette_bucket_width: u8,
    pub palette_max_swatches: usize,
    pub text_block_size: u32,
    pub text_edge_threshold: f32,
    pub text_score_threshold: f32,
    pub text_merge_tolerance: u32,
    pub content_luminance: f32,
    pub section_row_fill: f32,
    pub section_min_height: f32,
    pub grid_snap: u32,
    pub line_luminance: f32,
    pub line_row_step: u32,
    pub line_min_length: f32,
}

impl Default for AnalyzerThresholds {
    fn default() -> Self {
        Self {
            palette_sample_stride: PALETTE_SAMPLE_STRIDE,
            palette_min_alpha: PALETTE_MIN_ALPHA,
            palette_bucket_width: PALETTE_BUCKET_WIDTH,
            palette_max_swatches: PALETTE_MAX_SWATCHES,
            text_block_size: TEXT_BLOCK_SIZE,
            text_edge_threshold: TEXT_EDGE_THRESHOLD,
            text_score_threshold: TEXT_SCORE_THRESHOLD,
            text_merge_tolerance: TEXT_MERGE_TOLERANCE,
            content_luminance: CONTENT_LUMINANCE,
            section_row_fill: SECTION_ROW_FILL,
            section_min_height: SECTION_MIN_HEIGHT,
            grid_snap: GRID_SNAP,
            line_luminance: LINE_LUMINANCE,
            line_row_step: LINE_ROW_STEP,
            line_min_length: LINE_MIN_LENGTH,
        }
    }
}
