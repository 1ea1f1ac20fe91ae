//! Per-run analysis state.
//!
//! An [`AnalysisSession`] owns the run's [`PixelBuffer`] and an exclusively checked-out scratch
//! buffer holding the luminance plane. `run` consumes the session, so neither the pixels nor the
//! scratch can leak into another analysis. Idle scratch buffers go back to the [`ScratchPool`].

use std::sync::{Arc, Mutex};
use std::time::Instant;

use tracing::debug;

use crate::analysis::design_elements::detect_design_elements;
use crate::analysis::layout::{derive_grid, detect_margins, detect_sections, LayoutInfo};
use crate::analysis::palette::extract_palette;
use crate::analysis::result::{AnalysisResult, Dimensions};
use crate::analysis::text_regions::detect_text_blocks;
use crate::analysis::thresholds::AnalyzerThresholds;
use crate::raster::PixelBuffer;

// ────────────────────────────────────────────────────────────────────────────
// Scratch pool
// ────────────────────────────────────────────────────────────────────────────

/// Bounded pool of idle luminance buffers.
#[derive(Debug)]
pub struct ScratchPool {
    idle: Mutex<Vec<Vec<f32>>>,
    max_idle: usize,
}

impl ScratchPool {
    pub fn new(max_idle: usize) -> Self {
        Self {
            idle: Mutex::new(Vec::new()),
            max_idle,
        }
    }

    /// Hands out a buffer owned by the caller until the returned guard is dropped.
    pub fn checkout(self: &Arc<Self>) -> PooledScratch {
        let buf = self
            .idle
            .lock()
            .ok()
            .and_then(|mut idle| idle.pop())
            .unwrap_or_default();
        PooledScratch {
            buf,
            pool: Arc::clone(self),
        }
    }

    #[cfg(test)]
    pub fn idle_count(&self) -> usize {
        self.idle.lock().map(|idle| idle.len()).unwrap_or(0)
    }

    fn checkin(&self, mut buf: Vec<f32>) {
        buf.clear();
        // A poisoned lock just means this buffer is not pooled.
        if let Ok(mut idle) = self.idle.lock() {
            if idle.len() < self.max_idle {
                idle.push(buf);
            }
        }
    }
}

/// A scratch buffer checked out of a [`ScratchPool`]. Returned (cleared) on drop.
#[derive(Debug)]
pub struct PooledScratch {
    buf: Vec<f32>,
    pool: Arc<ScratchPool>,
}

impl PooledScratch {
    /// Overwrites the whole buffer with the luminance plane of `pixels`.
    fn reset_luminance(&mut self, pixels: &PixelBuffer) {
        self.buf.clear();
        self.buf.reserve(pixels.pixel_count());
        self.buf.extend(pixels.pixels().map(|p| p.luminance()));
    }

    #[cfg(test)]
    pub fn capacity(&self) -> usize {
        self.buf.capacity()
    }
}

impl Drop for PooledScratch {
    fn drop(&mut self) {
        self.pool.checkin(std::mem::take(&mut self.buf));
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Luminance view
// ────────────────────────────────────────────────────────────────────────────

/// Read-only luminance plane, row-major, same dimensions as the source buffer.
#[derive(Debug, Clone, Copy)]
pub struct LuminanceMap<'a> {
    width: u32,
    height: u32,
    values: &'a [f32],
}

impl<'a> LuminanceMap<'a> {
    /// Wraps a plane. `values.len()` must equal `width * height`.
    pub fn new(width: u32, height: u32, values: &'a [f32]) -> Self {
        debug_assert_eq!(values.len(), width as usize * height as usize);
        Self {
            width,
            height,
            values,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn at(&self, x: u32, y: u32) -> f32 {
        self.values[y as usize * self.width as usize + x as usize]
    }

    pub fn row(&self, y: u32) -> &'a [f32] {
        let start = y as usize * self.width as usize;
        &self.values[start..start + self.width as usize]
    }

    pub fn column(&self, x: u32) -> impl Iterator<Item = f32> + 'a {
        let values = self.values;
        let width = self.width as usize;
        (0..self.height as usize).map(move |y| values[y * width + x as usize])
    }
}

/// Luminance plane of a buffer built outside a session.
#[cfg(test)]
pub fn luminance_plane(pixels: &PixelBuffer) -> Vec<f32> {
    pixels.pixels().map(|p| p.luminance()).collect()
}

// ────────────────────────────────────────────────────────────────────────────
// Session
// ────────────────────────────────────────────────────────────────────────────

pub struct AnalysisSession {
    pixels: PixelBuffer,
    scratch: PooledScratch,
}

impl AnalysisSession {
    /// Claims `scratch` for this run and resets it from `pixels`.
    pub fn new(pixels: PixelBuffer, mut scratch: PooledScratch) -> Self {
        scratch.reset_luminance(&pixels);
        Self { pixels, scratch }
    }

    pub fn luminance(&self) -> LuminanceMap<'_> {
        LuminanceMap::new(self.pixels.width(), self.pixels.height(), &self.scratch.buf)
    }

    /// Runs every pixel stage and assembles the result. `fonts` comes from the PDF text layer
    /// (empty for raster input). Pixels and scratch are released when this returns.
    pub fn run(self, fonts: Vec<String>, thresholds: &AnalyzerThresholds) -> AnalysisResult {
        let started = Instant::now();
        let luma = self.luminance();

        let color_palette = extract_palette(&self.pixels, thresholds);
        debug!(swatches = color_palette.len(), "Palette extracted");

        let text_blocks = detect_text_blocks(&luma, thresholds);
        debug!(blocks = text_blocks.len(), "Text blocks merged");

        let sections = detect_sections(&luma, thresholds);
        let grid = derive_grid(&text_blocks, thresholds);
        let margins = detect_margins(&luma, thresholds);
        debug!(
            sections = sections.len(),
            columns = grid.columns,
            rows = grid.rows,
            "Layout analyzed"
        );

        let design_elements = detect_design_elements(&luma, thresholds);
        debug!(
            horizontal_lines = design_elements.horizontal_lines.len(),
            "Design elements detected"
        );

        debug!(
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Pixel stages complete"
        );

        AnalysisResult {
            dimensions: Dimensions::new(self.pixels.width(), self.pixels.height()),
            color_palette,
            fonts,
            layout: LayoutInfo {
                sections,
                text_blocks,
                grid,
                margins,
            },
            design_elements,
        }
    }
}
