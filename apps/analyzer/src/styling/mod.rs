// Styling hints: the consumer side of an analysis. Maps palette, fonts and margins onto the
// parameters the resume renderer takes, falling back to defaults for degenerate results.

pub mod fonts;
pub mod theme;

pub use theme::{derive_theme, TemplateTheme};
