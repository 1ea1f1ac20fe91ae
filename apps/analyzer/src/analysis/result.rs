use serde::{Deserialize, Serialize};

use crate::analysis::design_elements::DesignElements;
use crate::analysis::layout::LayoutInfo;
use crate::analysis::palette::ColorSwatch;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
    /// width / height; 0 for an empty buffer.
    pub aspect_ratio: f32,
}

impl Dimensions {
    pub fn new(width: u32, height: u32) -> Self {
        let aspect_ratio = if height == 0 {
            0.0
        } else {
            width as f32 / height as f32
        };
        Self {
            width,
            height,
            aspect_ratio,
        }
    }
}

/// Everything inferred from one template page. Plain values, no references into the pixels.
///
/// Degenerate content (empty palette, no blocks, 1×1 grid, zero margins) is a valid result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub dimensions: Dimensions,
    pub color_palette: Vec<ColorSwatch>,
    /// Distinct font names from the PDF text layer, sorted. Empty for raster input.
    pub fonts: Vec<String>,
    pub layout: LayoutInfo,
    pub design_elements: DesignElements,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aspect_ratio() {
        let d = Dimensions::new(800, 1000);
        assert!((d.aspect_ratio - 0.8).abs() < 1e-6);
        assert_eq!(Dimensions::new(10, 0).aspect_ratio, 0.0);
    }
}
