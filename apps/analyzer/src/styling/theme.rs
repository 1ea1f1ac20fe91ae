//! Turns an [`AnalysisResult`] into styling parameters for the resume renderer.
//!
//! Degenerate analysis output is normal here: an empty palette selects the default theme colors,
//! zero margins select the default page margins.

use serde::{Deserialize, Serialize};

use crate::analysis::palette::ColorSwatch;
use crate::analysis::AnalysisResult;
use crate::styling::fonts::{match_family, FontFamily};

const DEFAULT_BACKGROUND: &str = "#ffffff";
const DEFAULT_TEXT: &str = "#222222";
const DEFAULT_ACCENT: &str = "#2b6cb0";
const DEFAULT_MARGIN_IN: f32 = 1.0;

/// Swatches at or above this luminance can serve as page background.
const BACKGROUND_MIN_LUMINANCE: f32 = 240.0;
/// Max − min channel spread above which a swatch counts as chromatic.
const CHROMATIC_SPREAD: u8 = 40;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MarginsInches {
    pub top: f32,
    pub bottom: f32,
    pub left: f32,
    pub right: f32,
}

impl Default for MarginsInches {
    fn default() -> Self {
        Self {
            top: DEFAULT_MARGIN_IN,
            bottom: DEFAULT_MARGIN_IN,
            left: DEFAULT_MARGIN_IN,
            right: DEFAULT_MARGIN_IN,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemplateTheme {
    pub background_color: String,
    pub text_color: String,
    pub accent_color: String,
    /// True when the palette was empty and the colors above are defaults.
    pub is_default_palette: bool,
    pub font_family: FontFamily,
    /// Embedded font the family was matched from, if any.
    pub matched_font: Option<String>,
    pub margins_in: MarginsInches,
    pub columns: u32,
    pub uses_dividers: bool,
}

impl Default for TemplateTheme {
    fn default() -> Self {
        Self {
            background_color: DEFAULT_BACKGROUND.to_string(),
            text_color: DEFAULT_TEXT.to_string(),
            accent_color: DEFAULT_ACCENT.to_string(),
            is_default_palette: true,
            font_family: FontFamily::default(),
            matched_font: None,
            margins_in: MarginsInches::default(),
            columns: 1,
            uses_dividers: false,
        }
    }
}

fn is_chromatic(swatch: &ColorSwatch) -> bool {
    let [r, g, b] = swatch.channels;
    r.max(g).max(b) - r.min(g).min(b) > CHROMATIC_SPREAD
}

fn round2(v: f32) -> f32 {
    (v * 100.0).round() / 100.0
}

/// Derives renderer styling from an analysis. `pixels_per_inch` maps pixel margins to inches.
pub fn derive_theme(result: &AnalysisResult, pixels_per_inch: f32) -> TemplateTheme {
    let mut theme = TemplateTheme::default();
    let palette = &result.color_palette;

    // Palette is sorted by frequency, so `find` picks the most frequent match.
    if !palette.is_empty() {
        let text = palette
            .iter()
            .min_by(|a, b| a.luminance().total_cmp(&b.luminance()));
        let background = palette
            .iter()
            .find(|s| s.luminance().round() >= BACKGROUND_MIN_LUMINANCE);
        let accent = palette.iter().find(|s| is_chromatic(s));

        if let Some(text) = text {
            theme.text_color = text.hex.clone();
        }
        if let Some(background) = background {
            theme.background_color = background.hex.clone();
        }
        theme.accent_color = accent
            .map(|s| s.hex.clone())
            .unwrap_or_else(|| theme.text_color.clone());
        theme.is_default_palette = false;
    }

    if let Some((family, name)) = match_family(&result.fonts) {
        theme.font_family = family;
        theme.matched_font = Some(name.to_string());
    }

    let m = result.layout.margins;
    if pixels_per_inch > 0.0 && (m.top, m.bottom, m.left, m.right) != (0, 0, 0, 0) {
        let to_in = |px: u32| round2(px as f32 / pixels_per_inch);
        theme.margins_in = MarginsInches {
            top: to_in(m.top),
            bottom: to_in(m.bottom),
            left: to_in(m.left),
            right: to_in(m.right),
        };
    }

    theme.columns = result.layout.grid.columns.max(1);
    theme.uses_dividers = !result.design_elements.horizontal_lines.is_empty();
    theme
}
