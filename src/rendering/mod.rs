//! Rendering backends
//!
//! The certificate service only needs a handful of capabilities from a
//! document engine: load a single-page template, embed a font, report the
//! page size, measure a string, draw a string, serialize. Those are split
//! into [`RenderBackend`] (opens a document) and [`CertificateCanvas`] (one
//! open document).

use crate::errors::RenderResult;
use crate::layout::Rgb;

pub mod font;
pub mod pdf;

pub use font::EmbeddedFont;
pub use pdf::{PdfCanvas, PdfRenderBackend};

/// Page dimensions in points
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageSize {
    pub width: f32,
    pub height: f32,
}

/// Width measurement against the embedded font
pub trait TextMeasure {
    fn page_size(&self) -> PageSize;

    /// Rendered width of `text` at `font_size` points
    fn text_width(&self, text: &str, font_size: f32) -> f32;
}

/// A loaded template with an embedded font, ready to be drawn on
pub trait CertificateCanvas: TextMeasure + Send {
    /// Draw `text` with its baseline starting at `(x, y)`
    fn draw_text(
        &mut self,
        text: &str,
        x: f32,
        y: f32,
        font_size: f32,
        color: Rgb,
    ) -> RenderResult<()>;

    /// Serialize the finished document
    fn finish(self: Box<Self>) -> RenderResult<Vec<u8>>;
}

/// Factory for canvases
pub trait RenderBackend: Send + Sync {
    fn open(&self, template: &[u8], font: &[u8]) -> RenderResult<Box<dyn CertificateCanvas>>;
}
