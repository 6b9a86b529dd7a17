//! PDF certificate canvas built on `lopdf`
//!
//! The template must contain at least one page; only the first page is
//! drawn on. Drawing appends a new content stream to that page. The
//! template's own content is wrapped in `q`/`Q` so whatever graphics state it
//! leaves behind cannot leak into the overlay.

use lopdf::content::{Content, Operation};
use lopdf::{Dictionary, Document, Object, ObjectId, Stream, StringFormat, dictionary};
use tracing::debug;

use super::font::{FIRST_CHAR, LAST_CHAR, encode_win_ansi};
use super::{CertificateCanvas, EmbeddedFont, PageSize, RenderBackend, TextMeasure};
use crate::errors::{RenderError, RenderResult};
use crate::layout::Rgb;

/// Resource name under which the certificate font is registered on the page
const FONT_RESOURCE: &str = "FCert";

/// US Letter, used when neither the page nor its ancestors declare a MediaBox
const FALLBACK_MEDIA_BOX: [f32; 4] = [0.0, 0.0, 612.0, 792.0];

/// Production backend: PDF template plus embedded TrueType font
#[derive(Debug, Default, Clone, Copy)]
pub struct PdfRenderBackend;

impl RenderBackend for PdfRenderBackend {
    fn open(&self, template: &[u8], font: &[u8]) -> RenderResult<Box<dyn CertificateCanvas>> {
        let mut canvas = PdfCanvas::load_template(template)?;
        canvas.embed_font(font)?;
        Ok(Box::new(canvas))
    }
}

/// An open template document with (optionally) an embedded font
pub struct PdfCanvas {
    document: Document,
    page_id: ObjectId,
    page_size: PageSize,
    font: Option<EmbeddedFont>,
    operations: Vec<Operation>,
}

impl PdfCanvas {
    /// Load a template and locate its first page
    pub fn load_template(bytes: &[u8]) -> RenderResult<Self> {
        let document = Document::load_mem(bytes).map_err(|e| RenderError::InvalidTemplate {
            message: e.to_string(),
        })?;

        let page_id = document
            .get_pages()
            .values()
            .next()
            .copied()
            .ok_or_else(|| RenderError::InvalidTemplate {
                message: "template has no pages".to_string(),
            })?;

        let media_box = media_box(&document, page_id)?;
        let page_size = PageSize {
            width: (media_box[2] - media_box[0]).abs(),
            height: (media_box[3] - media_box[1]).abs(),
        };

        debug!(
            width = page_size.width,
            height = page_size.height,
            "Loaded certificate template"
        );

        Ok(Self {
            document,
            page_id,
            page_size,
            font: None,
            operations: Vec::new(),
        })
    }

    /// Embed a TrueType font and register it in the page resources
    pub fn embed_font(&mut self, bytes: &[u8]) -> RenderResult<()> {
        self.install_font(EmbeddedFont::from_bytes(bytes)?)
    }

    fn install_font(&mut self, font: EmbeddedFont) -> RenderResult<()> {
        let font_id = self.add_font_objects(&font);
        self.register_font_resource(font_id)?;
        debug!(font = font.postscript_name(), "Embedded certificate font");
        self.font = Some(font);
        Ok(())
    }

    fn add_font_objects(&mut self, font: &EmbeddedFont) -> ObjectId {
        let metrics = font.metrics();

        let program = Stream::new(
            dictionary! { "Length1" => Object::Integer(font.program().len() as i64) },
            font.program().to_vec(),
        );
        let program_id = self.document.add_object(program);

        let descriptor_id = self.document.add_object(dictionary! {
            "Type" => "FontDescriptor",
            "FontName" => Object::Name(font.postscript_name().as_bytes().to_vec()),
            // Nonsymbolic
            "Flags" => Object::Integer(32),
            "FontBBox" => metrics.bbox.iter().map(|v| Object::Real(*v)).collect::<Vec<_>>(),
            "ItalicAngle" => Object::Integer(0),
            "Ascent" => Object::Real(metrics.ascent),
            "Descent" => Object::Real(metrics.descent),
            "CapHeight" => Object::Real(metrics.cap_height),
            "StemV" => Object::Integer(80),
            "FontFile2" => program_id,
        });

        let widths: Vec<Object> = font.widths().iter().map(|w| Object::Real(*w)).collect();

        self.document.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "TrueType",
            "BaseFont" => Object::Name(font.postscript_name().as_bytes().to_vec()),
            "FirstChar" => Object::Integer(i64::from(FIRST_CHAR)),
            "LastChar" => Object::Integer(i64::from(LAST_CHAR)),
            "Widths" => widths,
            "FontDescriptor" => descriptor_id,
            "Encoding" => "WinAnsiEncoding",
        })
    }

    fn register_font_resource(&mut self, font_id: ObjectId) -> RenderResult<()> {
        if !page_dictionary(&self.document, self.page_id)?.has(b"Resources") {
            // Materialize inherited resources on the page before adding to them
            let inherited = inherited_resources(&self.document, self.page_id)?;
            self.document
                .get_object_mut(self.page_id)?
                .as_dict_mut()?
                .set("Resources", inherited);
        }

        let font_slot = {
            let resources = self.document.get_or_create_resources(self.page_id)?.as_dict_mut()?;
            match resources.get(b"Font") {
                Ok(Object::Reference(id)) => Some(*id),
                Ok(Object::Dictionary(_)) => None,
                _ => {
                    resources.set("Font", Dictionary::new());
                    None
                }
            }
        };

        let fonts = match font_slot {
            Some(id) => self.document.get_object_mut(id)?.as_dict_mut()?,
            None => self
                .document
                .get_or_create_resources(self.page_id)?
                .as_dict_mut()?
                .get_mut(b"Font")?
                .as_dict_mut()?,
        };
        fonts.set(FONT_RESOURCE, font_id);
        Ok(())
    }

    fn font(&self) -> RenderResult<&EmbeddedFont> {
        self.font
            .as_ref()
            .ok_or_else(|| RenderError::document("no font embedded"))
    }

    fn append_overlay(&mut self) -> RenderResult<()> {
        if self.operations.is_empty() {
            return Ok(());
        }

        // Streams are concatenated without a separator; the template's last
        // operator must not run into the closing `Q`.
        let mut overlay = b"\nQ\n".to_vec();
        overlay.extend(
            Content {
                operations: std::mem::take(&mut self.operations),
            }
            .encode()?,
        );

        let open_id = self
            .document
            .add_object(Stream::new(Dictionary::new(), b"q\n".to_vec()));
        let overlay_id = self.document.add_object(Stream::new(Dictionary::new(), overlay));

        let existing = match page_dictionary(&self.document, self.page_id)?.get(b"Contents") {
            Ok(Object::Array(items)) => items.clone(),
            Ok(Object::Reference(id)) => match self.document.get_object(*id) {
                Ok(Object::Array(items)) => items.clone(),
                _ => vec![Object::Reference(*id)],
            },
            _ => Vec::new(),
        };

        let mut contents = Vec::with_capacity(existing.len() + 2);
        contents.push(Object::Reference(open_id));
        contents.extend(existing);
        contents.push(Object::Reference(overlay_id));

        self.document
            .get_object_mut(self.page_id)?
            .as_dict_mut()?
            .set("Contents", contents);
        Ok(())
    }
}

impl TextMeasure for PdfCanvas {
    fn page_size(&self) -> PageSize {
        self.page_size
    }

    fn text_width(&self, text: &str, font_size: f32) -> f32 {
        self.font
            .as_ref()
            .map(|font| font.text_width(text, font_size))
            .unwrap_or(0.0)
    }
}

impl CertificateCanvas for PdfCanvas {
    fn draw_text(
        &mut self,
        text: &str,
        x: f32,
        y: f32,
        font_size: f32,
        color: Rgb,
    ) -> RenderResult<()> {
        self.font()?;
        let Rgb(r, g, b) = color;
        self.operations.extend([
            Operation::new("q", vec![]),
            Operation::new("BT", vec![]),
            Operation::new(
                "Tf",
                vec![Object::Name(FONT_RESOURCE.as_bytes().to_vec()), Object::Real(font_size)],
            ),
            Operation::new("rg", vec![Object::Real(r), Object::Real(g), Object::Real(b)]),
            Operation::new("Td", vec![Object::Real(x), Object::Real(y)]),
            Operation::new(
                "Tj",
                vec![Object::String(encode_win_ansi(text), StringFormat::Hexadecimal)],
            ),
            Operation::new("ET", vec![]),
            Operation::new("Q", vec![]),
        ]);
        Ok(())
    }

    fn finish(mut self: Box<Self>) -> RenderResult<Vec<u8>> {
        self.append_overlay()?;
        let mut buffer = Vec::new();
        self.document.save_to(&mut buffer).map_err(RenderError::document)?;
        Ok(buffer)
    }
}

fn page_dictionary(document: &Document, page_id: ObjectId) -> RenderResult<&Dictionary> {
    Ok(document.get_object(page_id)?.as_dict()?)
}

/// Follow a possibly-indirect object
fn resolve<'a>(document: &'a Document, object: &'a Object) -> RenderResult<&'a Object> {
    match object {
        Object::Reference(id) => Ok(document.get_object(*id)?),
        other => Ok(other),
    }
}

/// Look up an inheritable page attribute, walking `/Parent` links
fn inherited_attribute<'a>(
    document: &'a Document,
    page_id: ObjectId,
    key: &[u8],
) -> RenderResult<Option<&'a Object>> {
    let mut node = page_dictionary(document, page_id)?;
    // Bounded walk; a malformed tree could contain a parent cycle
    for _ in 0..32 {
        if let Ok(value) = node.get(key) {
            return Ok(Some(resolve(document, value)?));
        }
        match node.get(b"Parent") {
            Ok(Object::Reference(parent)) => node = document.get_object(*parent)?.as_dict()?,
            _ => return Ok(None),
        }
    }
    Ok(None)
}

fn inherited_resources(document: &Document, page_id: ObjectId) -> RenderResult<Dictionary> {
    Ok(inherited_attribute(document, page_id, b"Resources")?
        .and_then(|object| object.as_dict().ok())
        .cloned()
        .unwrap_or_default())
}

fn media_box(document: &Document, page_id: ObjectId) -> RenderResult<[f32; 4]> {
    let Some(object) = inherited_attribute(document, page_id, b"MediaBox")? else {
        return Ok(FALLBACK_MEDIA_BOX);
    };

    let values = object
        .as_array()?
        .iter()
        .map(|value| number(resolve(document, value)?))
        .collect::<RenderResult<Vec<f32>>>()?;

    match values.as_slice() {
        [x0, y0, x1, y1] => Ok([*x0, *y0, *x1, *y1]),
        _ => Err(RenderError::InvalidTemplate {
            message: format!("MediaBox has {} entries, expected 4", values.len()),
        }),
    }
}

fn number(object: &Object) -> RenderResult<f32> {
    match object {
        Object::Integer(value) => Ok(*value as f32),
        Object::Real(value) => Ok(*value),
        other => Err(RenderError::InvalidTemplate {
            message: format!("expected a number, found {other:?}"),
        }),
    }
}
