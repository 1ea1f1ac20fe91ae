//! Layout analysis: content sections, a coarse grid, and outer margins.
//!
//! Sections and margins read pixels; the grid reads only merged text blocks. The three are
//! independent of each other.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::analysis::session::LuminanceMap;
use crate::analysis::text_regions::TextBlock;
use crate::analysis::thresholds::AnalyzerThresholds;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SectionKind {
    Content,
}

/// Full-width horizontal band containing non-background pixels.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Section {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
    pub kind: SectionKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Gutters {
    pub horizontal: u32,
    pub vertical: u32,
}

/// Coarse alignment statistics over merged text blocks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridInfo {
    pub columns: u32,
    pub rows: u32,
    pub gutters: Gutters,
}

impl GridInfo {
    /// Single cell, no gutters. Used when fewer than two blocks exist.
    pub fn degenerate() -> Self {
        Self {
            columns: 1,
            rows: 1,
            gutters: Gutters::default(),
        }
    }
}

/// Distance in pixels from each edge to the first row/column with content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Margins {
    pub top: u32,
    pub bottom: u32,
    pub left: u32,
    pub right: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayoutInfo {
    pub sections: Vec<Section>,
    pub text_blocks: Vec<TextBlock>,
    pub grid: GridInfo,
    pub margins: Margins,
}

// ────────────────────────────────────────────────────────────────────────────
// Sections
// ────────────────────────────────────────────────────────────────────────────

/// Groups contiguous content rows into sections.
///
/// A row has content when more than `section_row_fill × width` of its pixels are darker than
/// `content_luminance`. Runs no taller than `section_min_height × height` are dropped as noise,
/// except a run still open at the bottom edge, which is always emitted.
pub fn detect_sections(luma: &LuminanceMap<'_>, thresholds: &AnalyzerThresholds) -> Vec<Section> {
    let (width, height) = (luma.width(), luma.height());
    let min_row_count = width as f32 * thresholds.section_row_fill;
    let min_height = height as f32 * thresholds.section_min_height;

    let band = |start: u32, end: u32| Section {
        x: 0,
        y: start,
        width,
        height: end - start,
        kind: SectionKind::Content,
    };

    let mut sections = Vec::new();
    let mut run_start: Option<u32> = None;

    for y in 0..height {
        let count = luma
            .row(y)
            .iter()
            .filter(|&&l| l < thresholds.content_luminance)
            .count();
        let has_content = count as f32 > min_row_count;

        match (has_content, run_start) {
            (true, None) => run_start = Some(y),
            (false, Some(start)) => {
                if (y - start) as f32 > min_height {
                    sections.push(band(start, y));
                }
                run_start = None;
            }
            _ => {}
        }
    }

    if let Some(start) = run_start {
        sections.push(band(start, height));
    }

    sections
}

// ────────────────────────────────────────────────────────────────────────────
// Grid
// ────────────────────────────────────────────────────────────────────────────

fn snap(v: u32, step: u32) -> u32 {
    if step == 0 {
        return v;
    }
    ((v as f32 / step as f32).round() as u32) * step
}

/// Estimates columns, rows and gutters from merged text blocks.
///
/// - columns: distinct left edges after snapping to `grid_snap`
/// - rows: distinct top edges after snapping to `grid_snap`
/// - horizontal gutter: distance between the two smallest distinct snapped left edges
/// - vertical gutter: mean positive gap between consecutive blocks ordered by top edge
pub fn derive_grid(blocks: &[TextBlock], thresholds: &AnalyzerThresholds) -> GridInfo {
    if blocks.len() < 2 {
        return GridInfo::degenerate();
    }

    let step = thresholds.grid_snap;
    let lefts: BTreeSet<u32> = blocks.iter().map(|b| snap(b.x, step)).collect();
    let tops: BTreeSet<u32> = blocks.iter().map(|b| snap(b.y, step)).collect();

    let horizontal = {
        let mut it = lefts.iter();
        match (it.next(), it.next()) {
            (Some(first), Some(second)) => second - first,
            _ => 0,
        }
    };

    let mut by_top: Vec<&TextBlock> = blocks.iter().collect();
    by_top.sort_by_key(|b| b.y);
    let gaps: Vec<u32> = by_top
        .windows(2)
        .filter_map(|pair| pair[1].y.checked_sub(pair[0].bottom()))
        .filter(|&gap| gap > 0)
        .collect();
    let vertical = if gaps.is_empty() {
        0
    } else {
        (gaps.iter().sum::<u32>() as f32 / gaps.len() as f32).round() as u32
    };

    GridInfo {
        columns: lefts.len() as u32,
        rows: tops.len() as u32,
        gutters: Gutters {
            horizontal,
            vertical,
        },
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Margins
// ────────────────────────────────────────────────────────────────────────────

/// Scans inward from each edge to the first row/column holding a content pixel.
///
/// A blank page reports zero on every side.
pub fn detect_margins(luma: &LuminanceMap<'_>, thresholds: &AnalyzerThresholds) -> Margins {
    let (width, height) = (luma.width(), luma.height());
    let threshold = thresholds.content_luminance;

    let row_has_content = |y: u32| luma.row(y).iter().any(|&l| l < threshold);
    let col_has_content = |x: u32| luma.column(x).any(|l| l < threshold);

    let Some(first_row) = (0..height).find(|&y| row_has_content(y)) else {
        return Margins::default();
    };
    let last_row = (0..height).rev().find(|&y| row_has_content(y)).unwrap_or(first_row);
    let first_col = (0..width).find(|&x| col_has_content(x)).unwrap_or(0);
    let last_col = (0..width)
        .rev()
        .find(|&x| col_has_content(x))
        .unwrap_or(first_col);

    Margins {
        top: first_row,
        bottom: height - 1 - last_row,
        left: first_col,
        right: width - 1 - last_col,
    }
}
