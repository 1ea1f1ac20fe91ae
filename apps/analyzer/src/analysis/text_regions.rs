//! Text region detection.
//!
//! # Scoring
//! The page is tiled with non-overlapping `text_block_size` cells (partial cells at the right and
//! bottom edges are skipped). Each cell gets a text score from edge density and local contrast:
//!
//! ```text
//! edge_ratio   = edge_pixels / sampled_pixels
//! avg_contrast = Σ max(|dx|, |dy|) / sampled_pixels
//! score        = min(edge_ratio * 2, 1) * min(avg_contrast / 100, 1)
//! ```
//!
//! Sampled pixels exclude the last row and column of the cell, so both neighbours exist.
//! Character strokes give many edges with real contrast; flat fills and smooth photos do not.
//!
//! # Merging
//! Candidate cells are clustered in a single pass. Each unvisited block seeds a cluster and
//! absorbs every other unvisited block adjacent to the *seed*. Adjacency is not followed
//! through absorbed members (single hop), which keeps merged shapes stable for grid inference.

use serde::{Deserialize, Serialize};

use crate::analysis::session::LuminanceMap;
use crate::analysis::thresholds::AnalyzerThresholds;

/// A rectangle hypothesized to contain text: a raw grid cell or a merged cluster of them.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TextBlock {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
    /// Text score in [0, 1]; for merged blocks the max over the cluster.
    pub confidence: f32,
}

impl TextBlock {
    pub fn right(&self) -> u32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> u32 {
        self.y + self.height
    }

    /// True when both boxes, each grown by `tolerance` on every side, overlap on both axes.
    pub fn is_adjacent(&self, other: &TextBlock, tolerance: u32) -> bool {
        let t = i64::from(tolerance);
        let overlaps = |a0: u32, a1: u32, b0: u32, b1: u32| {
            i64::from(a0) - t < i64::from(b1) + t && i64::from(b0) - t < i64::from(a1) + t
        };
        overlaps(self.x, self.right(), other.x, other.right())
            && overlaps(self.y, self.bottom(), other.y, other.bottom())
    }
}

/// Text score of the `size`×`size` cell at `(x0, y0)`. The cell must lie inside the map.
pub fn score_cell(luma: &LuminanceMap<'_>, x0: u32, y0: u32, size: u32, edge_threshold: f32) -> f32 {
    if size < 2 {
        return 0.0;
    }

    let mut edge_count = 0u32;
    let mut contrast_sum = 0.0_f32;
    let mut sampled = 0u32;

    for y in y0..y0 + size - 1 {
        for x in x0..x0 + size - 1 {
            let here = luma.at(x, y);
            let dx = (here - luma.at(x + 1, y)).abs();
            let dy = (here - luma.at(x, y + 1)).abs();

            if dx > edge_threshold || dy > edge_threshold {
                edge_count += 1;
            }
            contrast_sum += dx.max(dy);
            sampled += 1;
        }
    }

    let edge_ratio = edge_count as f32 / sampled as f32;
    let avg_contrast = contrast_sum / sampled as f32;
    (edge_ratio * 2.0).min(1.0) * (avg_contrast / 100.0).min(1.0)
}

/// Scores every whole cell of the grid and keeps those above the score threshold.
pub fn detect_raw_blocks(luma: &LuminanceMap<'_>, thresholds: &AnalyzerThresholds) -> Vec<TextBlock> {
    let size = thresholds.text_block_size;
    let mut blocks = Vec::new();
    if size == 0 {
        return blocks;
    }

    let mut y = 0;
    while y + size <= luma.height() {
        let mut x = 0;
        while x + size <= luma.width() {
            let score = score_cell(luma, x, y, size, thresholds.text_edge_threshold);
            if score > thresholds.text_score_threshold {
                blocks.push(TextBlock {
                    x,
                    y,
                    width: size,
                    height: size,
                    confidence: score,
                });
            }
            x += size;
        }
        y += size;
    }

    blocks
}

/// Single-hop clustering of raw blocks into bounding boxes. Input order defines the seeds.
pub fn merge_blocks(blocks: &[TextBlock], tolerance: u32) -> Vec<TextBlock> {
    let mut visited = vec![false; blocks.len()];
    let mut merged = Vec::new();

    for (i, seed) in blocks.iter().enumerate() {
        if visited[i] {
            continue;
        }
        visited[i] = true;

        let mut bounds = *seed;
        let (mut right, mut bottom) = (seed.right(), seed.bottom());

        for (j, other) in blocks.iter().enumerate() {
            if visited[j] || !seed.is_adjacent(other, tolerance) {
                continue;
            }
            visited[j] = true;
            bounds.x = bounds.x.min(other.x);
            bounds.y = bounds.y.min(other.y);
            right = right.max(other.right());
            bottom = bottom.max(other.bottom());
            bounds.confidence = bounds.confidence.max(other.confidence);
        }

        bounds.width = right - bounds.x;
        bounds.height = bottom - bounds.y;
        merged.push(bounds);
    }

    merged
}

/// Raw detection followed by merging.
pub fn detect_text_blocks(luma: &LuminanceMap<'_>, thresholds: &AnalyzerThresholds) -> Vec<TextBlock> {
    let raw = detect_raw_blocks(luma, thresholds);
    merge_blocks(&raw, thresholds.text_merge_tolerance)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::session::luminance_plane;
    use crate::raster::{PixelBuffer, Rgba};

    const BLACK: Rgba = Rgba::opaque(0, 0, 0);
    const WHITE: Rgba = Rgba::opaque(255, 255, 255);

    fn block(x: u32, y: u32, confidence: f32) -> TextBlock {
        TextBlock {
            x,
            y,
            width: 20,
            height: 20,
            confidence,
        }
    }

    fn detect(buf: &PixelBuffer) -> (Vec<TextBlock>, Vec<TextBlock>) {
        let plane = luminance_plane(buf);
        let luma = LuminanceMap::new(buf.width(), buf.height(), &plane);
        let t = AnalyzerThresholds::default();
        (detect_raw_blocks(&luma, &t), detect_text_blocks(&luma, &t))
    }

    // ── scoring ─────────────────────────────────────────────────────────────

    #[test]
    fn test_flat_buffer_has_no_text_blocks() {
        let buf = PixelBuffer::filled(200, 200, Rgba::opaque(120, 40, 200));
        let (raw, merged) = detect(&buf);
        assert!(raw.is_empty());
        assert!(merged.is_empty());
    }

    #[test]
    fn test_checkerboard_scores_maximum() {
        let buf = PixelBuffer::from_fn(20, 20, |x, y| if (x + y) % 2 == 0 { BLACK } else { WHITE });
        let plane = luminance_plane(&buf);
        let luma = LuminanceMap::new(20, 20, &plane);
        let score = score_cell(&luma, 0, 0, 20, 30.0);
        assert!(score > 0.99, "checkerboard should score ~1.0, got {score}");

        let (raw, _) = detect(&buf);
        assert_eq!(raw.len(), 1);
        assert!(raw[0].confidence > 0.3);
    }

    #[test]
    fn test_gentle_gradient_is_not_text() {
        let buf = PixelBuffer::from_fn(40, 40, |x, _| {
            let v = (x * 3) as u8;
            Rgba::opaque(v, v, v)
        });
        let (raw, _) = detect(&buf);
        assert!(raw.is_empty(), "3-level steps are below the edge threshold");
    }

    #[test]
    fn test_partial_cells_at_edges_are_skipped() {
        // 39×39: only the top-left 20×20 cell fits.
        let buf = PixelBuffer::from_fn(39, 39, |x, y| if (x + y) % 2 == 0 { BLACK } else { WHITE });
        let (raw, _) = detect(&buf);
        assert_eq!(raw.len(), 1);
        assert_eq!((raw[0].x, raw[0].y), (0, 0));
    }

    #[test]
    fn test_cells_step_by_block_size() {
        let buf = PixelBuffer::from_fn(60, 20, |x, y| if (x + y) % 2 == 0 { BLACK } else { WHITE });
        let (raw, merged) = detect(&buf);
        let xs: Vec<u32> = raw.iter().map(|b| b.x).collect();
        assert_eq!(xs, vec![0, 20, 40]);
        assert_eq!(merged.len(), 1);
        assert_eq!((merged[0].x, merged[0].width), (0, 60));
    }

    // ── merging ─────────────────────────────────────────────────────────────

    #[test]
    fn test_nearby_blocks_merge_into_union() {
        let merged = merge_blocks(&[block(0, 0, 0.4), block(45, 25, 0.9)], 30);
        assert_eq!(merged.len(), 1);
        let m = merged[0];
        assert_eq!((m.x, m.y, m.width, m.height), (0, 0, 65, 45));
        assert!((m.confidence - 0.9).abs() < f32::EPSILON);
    }

    #[test]
    fn test_distant_blocks_stay_separate() {
        let merged = merge_blocks(&[block(0, 0, 0.5), block(200, 0, 0.6)], 30);
        assert_eq!(merged.len(), 2);
        assert_eq!(merged[1].x, 200);
    }

    #[test]
    fn test_adjacency_needs_both_axes() {
        let a = block(0, 0, 0.5);
        let b = block(0, 300, 0.5);
        assert!(!a.is_adjacent(&b, 30));
        assert!(a.is_adjacent(&block(0, 70, 0.5), 30));
        assert!(!a.is_adjacent(&block(0, 80, 0.5), 30));
    }

    #[test]
    fn test_merge_is_single_hop_from_seed() {
        // b touches the seed, c touches only b: c starts its own cluster.
        let a = block(0, 0, 0.5);
        let b = block(70, 0, 0.5);
        let c = block(140, 0, 0.5);
        assert!(a.is_adjacent(&b, 30) && b.is_adjacent(&c, 30) && !a.is_adjacent(&c, 30));

        let merged = merge_blocks(&[a, b, c], 30);
        assert_eq!(merged.len(), 2);
        assert_eq!((merged[0].x, merged[0].width), (0, 90));
        assert_eq!((merged[1].x, merged[1].width), (140, 20));
    }

    #[test]
    fn test_merge_empty_input() {
        assert!(merge_blocks(&[], 30).is_empty());
    }
}
