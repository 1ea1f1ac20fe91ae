//! Dominant color extraction.
//!
//! Strided sampling, alpha filtering, per-channel floor quantization, then a frequency ranking
//! of the buckets. Each swatch is the bucket floor itself, so quantize → reconstruct is stable.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::analysis::thresholds::AnalyzerThresholds;
use crate::raster::{PixelBuffer, Rgba};

/// A dominant color and how many samples fell into its bucket.
///
/// Frequencies are only comparable within one analysis run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColorSwatch {
    /// `#rrggbb`, lowercase.
    pub hex: String,
    /// `rgb(r,g,b)`.
    pub rgb: String,
    pub channels: [u8; 3],
    pub frequency: u32,
}

impl ColorSwatch {
    pub fn from_channels(r: u8, g: u8, b: u8, frequency: u32) -> Self {
        Self {
            hex: format!("#{r:02x}{g:02x}{b:02x}"),
            rgb: format!("rgb({r},{g},{b})"),
            channels: [r, g, b],
            frequency,
        }
    }

    pub fn luminance(&self) -> f32 {
        let [r, g, b] = self.channels;
        Rgba::opaque(r, g, b).luminance()
    }
}

fn quantize(channel: u8, bucket: u8) -> u8 {
    (channel / bucket) * bucket
}

fn bucket_key(r: u8, g: u8, b: u8) -> u32 {
    (u32::from(r) << 16) | (u32::from(g) << 8) | u32::from(b)
}

fn decode_key(key: u32) -> (u8, u8, u8) {
    ((key >> 16) as u8, (key >> 8) as u8, key as u8)
}

/// Returns up to `palette_max_swatches` swatches sorted by descending frequency.
///
/// Ties are broken by ascending bucket key so the output is deterministic.
/// An image with no sample of sufficient alpha yields an empty palette.
pub fn extract_palette(pixels: &PixelBuffer, thresholds: &AnalyzerThresholds) -> Vec<ColorSwatch> {
    let stride = thresholds.palette_sample_stride.max(1);
    let bucket = thresholds.palette_bucket_width.max(1);

    let mut counts: HashMap<u32, u32> = HashMap::new();
    for i in (0..pixels.pixel_count()).step_by(stride) {
        let px = pixels.nth(i);
        if px.a < thresholds.palette_min_alpha {
            continue;
        }
        let key = bucket_key(
            quantize(px.r, bucket),
            quantize(px.g, bucket),
            quantize(px.b, bucket),
        );
        *counts.entry(key).or_insert(0) += 1;
    }

    let mut ranked: Vec<(u32, u32)> = counts.into_iter().collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
    ranked.truncate(thresholds.palette_max_swatches);

    ranked
        .into_iter()
        .map(|(key, frequency)| {
            let (r, g, b) = decode_key(key);
            ColorSwatch::from_channels(r, g, b, frequency)
        })
        .collect()
}
