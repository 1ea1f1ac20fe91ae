//! PDF capabilities: page rasterization via pdfium and text-layer font extraction via lopdf.
//!
//! Both are injected into the analyzer behind [`PageRenderer`] / [`TextRunExtractor`], so tests
//! and alternative backends can swap them out. The pdfium library is bound per call inside the
//! blocking analysis task; nothing pdfium-owned outlives a single render.

use std::collections::BTreeMap;
use std::path::PathBuf;

use lopdf::content::Content;
use lopdf::{Dictionary, Document, Object, ObjectId};
use pdfium_render::prelude::*;
use tracing::{debug, warn};

use crate::raster::{AnalysisError, PageRenderer, PixelBuffer, TextRun, TextRunExtractor};

// ────────────────────────────────────────────────────────────────────────────
// Rasterization
// ────────────────────────────────────────────────────────────────────────────

/// Renders PDF pages with the pdfium shared library.
#[derive(Debug, Clone, Default)]
pub struct PdfiumRenderer {
    /// Directory holding the platform pdfium library. `None` binds the system library.
    library_path: Option<PathBuf>,
}

impl PdfiumRenderer {
    pub fn new(library_path: Option<PathBuf>) -> Self {
        Self { library_path }
    }

    fn bind(&self) -> Result<Pdfium, PdfiumError> {
        let bindings = match &self.library_path {
            Some(dir) => {
                Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path(dir))?
            }
            None => Pdfium::bind_to_system_library()?,
        };
        Ok(Pdfium::new(bindings))
    }
}

impl PageRenderer for PdfiumRenderer {
    fn render_page(
        &self,
        bytes: &[u8],
        page_index: u16,
        scale: f32,
    ) -> Result<PixelBuffer, AnalysisError> {
        let pdfium = self.bind().map_err(|e| {
            warn!("Failed to bind pdfium library: {e}");
            AnalysisError::DecodeFailure(format!("PDF renderer unavailable: {e}"))
        })?;

        let document = pdfium
            .load_pdf_from_byte_slice(bytes, None)
            .map_err(|e| AnalysisError::DecodeFailure(format!("unreadable PDF: {e}")))?;

        let page = document.pages().get(page_index).map_err(|e| {
            AnalysisError::DecodeFailure(format!("PDF has no page {}: {e}", page_index + 1))
        })?;

        let config = PdfRenderConfig::new()
            .scale_page_by_factor(scale)
            .render_form_data(true)
            .render_annotations(true);

        let bitmap = page
            .render_with_config(&config)
            .map_err(|e| AnalysisError::DecodeFailure(format!("failed to render PDF page: {e}")))?;

        let buffer = PixelBuffer::from(bitmap.as_image().to_rgba8());
        debug!(
            width = buffer.width(),
            height = buffer.height(),
            scale,
            "Rendered PDF page"
        );
        Ok(buffer)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Text layer
// ────────────────────────────────────────────────────────────────────────────

/// Form XObjects nested deeper than this are not followed.
const MAX_FORM_DEPTH: usize = 8;
/// Page tree levels searched for inherited `/Resources`.
const MAX_TREE_DEPTH: usize = 32;

/// Walks a page content stream, plus the Form XObjects it paints, and reports the font behind
/// every text-showing operator.
#[derive(Debug, Clone, Copy, Default)]
pub struct LopdfTextRuns;

impl TextRunExtractor for LopdfTextRuns {
    fn extract_text_runs(
        &self,
        bytes: &[u8],
        page_index: u16,
    ) -> Result<Vec<TextRun>, AnalysisError> {
        let doc = Document::load_mem(bytes)
            .map_err(|e| AnalysisError::DecodeFailure(format!("unreadable PDF: {e}")))?;

        // lopdf page numbers are 1-based.
        let page_number = u32::from(page_index) + 1;
        let page_id = doc.get_pages().get(&page_number).copied().ok_or_else(|| {
            AnalysisError::DecodeFailure(format!("PDF has no page {page_number}"))
        })?;

        let page_fonts = doc
            .get_page_fonts(page_id)
            .map_err(|e| AnalysisError::DecodeFailure(format!("bad font resources: {e}")))?;
        let raw = doc
            .get_page_content(page_id)
            .map_err(|e| AnalysisError::DecodeFailure(format!("bad page content: {e}")))?;

        let mut walker = TextLayerWalker {
            doc: &doc,
            page_fonts,
            forms: Vec::new(),
            runs: Vec::new(),
        };
        walker.walk(&raw, page_resources(&doc, page_id), None)?;
        let runs = walker.runs;

        debug!(runs = runs.len(), page = page_number, "Extracted PDF text runs");
        Ok(runs)
    }
}

/// Content-stream state for one page. `forms` is the chain of Form XObjects being painted.
struct TextLayerWalker<'a> {
    doc: &'a Document,
    page_fonts: BTreeMap<Vec<u8>, &'a Dictionary>,
    forms: Vec<ObjectId>,
    runs: Vec<TextRun>,
}

impl<'a> TextLayerWalker<'a> {
    /// `current` is the font in effect when the stream starts. A form inherits its caller's.
    fn walk(
        &mut self,
        raw: &[u8],
        resources: Option<&'a Dictionary>,
        mut current: Option<TextRun>,
    ) -> Result<(), AnalysisError> {
        let content = Content::decode(raw)
            .map_err(|e| AnalysisError::DecodeFailure(format!("bad content stream: {e}")))?;
        let mut saved: Vec<Option<TextRun>> = Vec::new();

        for op in &content.operations {
            match op.operator.as_str() {
                "q" => saved.push(current.clone()),
                "Q" => {
                    // Unbalanced Q leaves the state alone.
                    if let Some(restored) = saved.pop() {
                        current = restored;
                    }
                }
                "Tf" => {
                    let Some(key) = op.operands.first().and_then(|o| o.as_name().ok()) else {
                        continue;
                    };
                    let font_size = op
                        .operands
                        .get(1)
                        .and_then(|o| o.as_float().ok())
                        .unwrap_or(0.0);
                    current = Some(TextRun {
                        font_name: resolve_font_name(key, self.font(resources, key)),
                        font_size,
                    });
                }
                "Tj" | "TJ" | "'" | "\"" => {
                    if let Some(run) = &current {
                        self.runs.push(run.clone());
                    }
                }
                "Do" => {
                    let Some(name) = op.operands.first().and_then(|o| o.as_name().ok()) else {
                        continue;
                    };
                    self.paint_form(resources, name, current.clone())?;
                }
                _ => {}
            }
        }
        Ok(())
    }

    /// Font dictionary for a `Tf` key: the stream's own resources first, then the page's.
    fn font(&self, resources: Option<&'a Dictionary>, key: &[u8]) -> Option<&'a Dictionary> {
        let doc = self.doc;
        resources
            .and_then(|res| resolve_dict(doc, res, b"Font"))
            .and_then(|fonts| resolve_dict(doc, fonts, key))
            .or_else(|| self.page_fonts.get(key).copied())
    }

    /// Follows `Do` into a Form XObject. Image XObjects and unknown names are skipped.
    fn paint_form(
        &mut self,
        resources: Option<&'a Dictionary>,
        name: &[u8],
        current: Option<TextRun>,
    ) -> Result<(), AnalysisError> {
        let doc = self.doc;
        let Some(id) = resources
            .and_then(|res| resolve_dict(doc, res, b"XObject"))
            .and_then(|xobjects| xobjects.get(name).ok())
            .and_then(|obj| obj.as_reference().ok())
        else {
            return Ok(());
        };

        if self.forms.contains(&id) || self.forms.len() >= MAX_FORM_DEPTH {
            warn!(?id, depth = self.forms.len(), "Skipping cyclic or deeply nested form XObject");
            return Ok(());
        }

        let Ok(stream) = doc.get_object(id).and_then(Object::as_stream) else {
            return Ok(());
        };
        let is_form = stream
            .dict
            .get(b"Subtype")
            .and_then(Object::as_name)
            .is_ok_and(|subtype| subtype == b"Form");
        if !is_form {
            return Ok(());
        }

        let raw = stream
            .decompressed_content()
            .unwrap_or_else(|_| stream.content.clone());
        let form_resources = resolve_dict(doc, &stream.dict, b"Resources").or(resources);

        self.forms.push(id);
        let walked = self.walk(&raw, form_resources, current);
        self.forms.pop();
        walked
    }
}

/// Looks up `key` in `dict`, following one indirect reference, and expects a dictionary.
fn resolve_dict<'a>(doc: &'a Document, dict: &'a Dictionary, key: &[u8]) -> Option<&'a Dictionary> {
    match dict.get(key).ok()? {
        Object::Reference(id) => doc.get_dictionary(*id).ok(),
        obj => obj.as_dict().ok(),
    }
}

/// The page's `/Resources`, inherited through the page tree when the page has none of its own.
fn page_resources(doc: &Document, page_id: ObjectId) -> Option<&Dictionary> {
    let mut node = doc.get_dictionary(page_id).ok()?;
    for _ in 0..MAX_TREE_DEPTH {
        if let Some(resources) = resolve_dict(doc, node, b"Resources") {
            return Some(resources);
        }
        let parent = node.get(b"Parent").and_then(Object::as_reference).ok()?;
        node = doc.get_dictionary(parent).ok()?;
    }
    None
}

/// `BaseFont` of the resource, falling back to the resource key (Type3 fonts carry no BaseFont).
fn resolve_font_name(key: &[u8], font: Option<&Dictionary>) -> String {
    let base = font
        .and_then(|dict| dict.get(b"BaseFont").ok())
        .and_then(|obj| Object::as_name(obj).ok())
        .unwrap_or(key);
    strip_subset_tag(&String::from_utf8_lossy(base)).to_string()
}

/// Removes the `ABCDEF+` prefix embedded subsets carry.
fn strip_subset_tag(name: &str) -> &str {
    match name.split_once('+') {
        Some((tag, rest))
            if tag.len() == 6 && tag.bytes().all(|b| b.is_ascii_uppercase()) && !rest.is_empty() =>
        {
            rest
        }
        _ => name,
    }
}
