//! Resume font families and the keyword mapping from embedded PDF font names.

use serde::{Deserialize, Serialize};

/// The five resume font families the renderer ships.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum FontFamily {
    /// Clean humanist sans-serif. Also the stand-in for Helvetica/Arial-style faces.
    #[default]
    Inter,
    /// Classic old-style serif.
    EbGaramond,
    /// Geometric humanist sans-serif.
    Lato,
    /// Condensed display sans-serif.
    Oswald,
    /// Traditional TeX font.
    ComputerModern,
}

/// Lowercased substrings checked in order; the first hit wins.
#[rustfmt::skip]
const FAMILY_KEYWORDS: &[(&str, FontFamily)] = &[
    ("garamond",   FontFamily::EbGaramond),
    ("times",      FontFamily::EbGaramond),
    ("georgia",    FontFamily::EbGaramond),
    ("lato",       FontFamily::Lato),
    ("oswald",     FontFamily::Oswald),
    ("condensed",  FontFamily::Oswald),
    ("cmr",        FontFamily::ComputerModern),
    ("lmroman",    FontFamily::ComputerModern),
    ("computer",   FontFamily::ComputerModern),
    ("inter",      FontFamily::Inter),
    ("helvetica",  FontFamily::Inter),
    ("arial",      FontFamily::Inter),
];

/// Maps an embedded font name (e.g. `EBGaramond-Italic`) to a family, if any keyword matches.
pub fn classify_font(name: &str) -> Option<FontFamily> {
    let lower = name.to_ascii_lowercase();
    FAMILY_KEYWORDS
        .iter()
        .find(|(keyword, _)| lower.contains(keyword))
        .map(|&(_, family)| family)
}

/// First detected font that maps to a family, together with the matching name.
pub fn match_family(fonts: &[String]) -> Option<(FontFamily, &str)> {
    fonts
        .iter()
        .find_map(|name| classify_font(name).map(|family| (family, name.as_str())))
}
