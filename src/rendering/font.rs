//! Embedded TrueType font support
//!
//! The font is embedded as a simple (single-byte) TrueType font with
//! `WinAnsiEncoding`. Widths are taken from the font's horizontal metrics
//! once, at load time, and the same table is used both for measuring and for
//! the PDF `/Widths` array so measured and rendered widths always agree.

use ttf_parser::Face;

use crate::errors::{RenderError, RenderResult};

pub const FIRST_CHAR: u8 = 32;
pub const LAST_CHAR: u8 = 255;

/// Byte substituted for characters outside the encodable range
const REPLACEMENT: u8 = b'?';

/// Windows-1252 assignments in `0x80..=0x9F`; the remaining codes there are
/// unassigned. Every other code maps to the Latin-1 character of that value.
const WIN_ANSI_HIGH: [(u8, char); 27] = [
    (0x80, '€'),
    (0x82, '‚'),
    (0x83, 'ƒ'),
    (0x84, '„'),
    (0x85, '…'),
    (0x86, '†'),
    (0x87, '‡'),
    (0x88, 'ˆ'),
    (0x89, '‰'),
    (0x8A, 'Š'),
    (0x8B, '‹'),
    (0x8C, 'Œ'),
    (0x8E, 'Ž'),
    (0x91, '‘'),
    (0x92, '’'),
    (0x93, '“'),
    (0x94, '”'),
    (0x95, '•'),
    (0x96, '–'),
    (0x97, '—'),
    (0x98, '˜'),
    (0x99, '™'),
    (0x9A, 'š'),
    (0x9B, '›'),
    (0x9C, 'œ'),
    (0x9E, 'ž'),
    (0x9F, 'Ÿ'),
];

/// Metrics in PDF glyph space (1/1000 of the font size)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FontMetrics {
    pub ascent: f32,
    pub descent: f32,
    pub cap_height: f32,
    pub bbox: [f32; 4],
}

/// A parsed font program plus the per-code widths needed to draw with it
#[derive(Debug, Clone)]
pub struct EmbeddedFont {
    program: Vec<u8>,
    postscript_name: String,
    widths: Vec<f32>,
    metrics: FontMetrics,
}

impl EmbeddedFont {
    /// Parse a TrueType/OpenType font program
    pub fn from_bytes(program: &[u8]) -> RenderResult<Self> {
        let face = Face::parse(program, 0).map_err(|e| RenderError::InvalidFont {
            message: e.to_string(),
        })?;

        let units_per_em = f32::from(face.units_per_em());
        let scale = |value: f32| value * 1000.0 / units_per_em;

        let widths = (FIRST_CHAR..=LAST_CHAR)
            .map(|code| {
                win_ansi_char(code)
                    .and_then(|ch| face.glyph_index(ch))
                    .or_else(|| face.glyph_index(char::from(REPLACEMENT)))
                    .and_then(|glyph| face.glyph_hor_advance(glyph))
                    .map(|advance| scale(f32::from(advance)))
                    .unwrap_or(0.0)
            })
            .collect();

        let bbox = face.global_bounding_box();
        let metrics = FontMetrics {
            ascent: scale(f32::from(face.ascender())),
            descent: scale(f32::from(face.descender())),
            cap_height: scale(f32::from(face.capital_height().unwrap_or(face.ascender()))),
            bbox: [
                scale(f32::from(bbox.x_min)),
                scale(f32::from(bbox.y_min)),
                scale(f32::from(bbox.x_max)),
                scale(f32::from(bbox.y_max)),
            ],
        };

        let postscript_name = face
            .names()
            .into_iter()
            .filter(|name| name.name_id == ttf_parser::name_id::POST_SCRIPT_NAME)
            .find_map(|name| name.to_string())
            .map(|name| sanitize_font_name(&name))
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| "CertificateFont".to_string());

        Ok(Self {
            program: program.to_vec(),
            postscript_name,
            widths,
            metrics,
        })
    }

    pub fn program(&self) -> &[u8] {
        &self.program
    }

    pub fn postscript_name(&self) -> &str {
        &self.postscript_name
    }

    pub fn metrics(&self) -> FontMetrics {
        self.metrics
    }

    /// Advance widths for codes `FIRST_CHAR..=LAST_CHAR` in glyph space
    pub fn widths(&self) -> &[f32] {
        &self.widths
    }

    /// Width of `text` at `font_size` points
    pub fn text_width(&self, text: &str, font_size: f32) -> f32 {
        let units: f32 = encode_win_ansi(text)
            .into_iter()
            .map(|code| self.code_width(code))
            .sum();
        units * font_size / 1000.0
    }

    /// Font whose every code is `width` glyph units wide; the program is empty
    #[cfg(test)]
    pub(crate) fn uniform(width: f32) -> Self {
        Self {
            program: Vec::new(),
            postscript_name: "Uniform".to_string(),
            widths: vec![width; usize::from(LAST_CHAR - FIRST_CHAR) + 1],
            metrics: FontMetrics {
                ascent: 800.0,
                descent: -200.0,
                cap_height: 700.0,
                bbox: [0.0, -200.0, 1000.0, 800.0],
            },
        }
    }

    fn code_width(&self, code: u8) -> f32 {
        code.checked_sub(FIRST_CHAR)
            .and_then(|index| self.widths.get(usize::from(index)))
            .copied()
            .unwrap_or(0.0)
    }
}

/// Encode text for a `WinAnsiEncoding` simple font
///
/// Printable ASCII and Latin-1 map to themselves, the Windows-1252 extras
/// map into `0x80..=0x9F`, anything else becomes `?`.
pub fn encode_win_ansi(text: &str) -> Vec<u8> {
    text.chars()
        .map(|ch| match ch {
            ' '..='~' | '\u{00A0}'..='\u{00FF}' => ch as u8,
            _ => WIN_ANSI_HIGH
                .iter()
                .find(|(_, mapped)| *mapped == ch)
                .map(|(code, _)| *code)
                .unwrap_or(REPLACEMENT),
        })
        .collect()
}

/// Character drawn for a WinAnsi code, `None` for unassigned codes
fn win_ansi_char(code: u8) -> Option<char> {
    match code {
        0x80..=0x9F => WIN_ANSI_HIGH
            .iter()
            .find(|(mapped, _)| *mapped == code)
            .map(|(_, ch)| *ch),
        _ => Some(char::from(code)),
    }
}

/// Keep only characters allowed in a PDF name without escaping
fn sanitize_font_name(name: &str) -> String {
    name.chars()
        .filter(|ch| ch.is_ascii_alphanumeric() || matches!(ch, '-' | '_' | '+'))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const DEJAVU_SANS: &[u8] =
        include_bytes!(concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures/DejaVuSans.ttf"));

    #[test]
    fn test_encode_ascii_and_latin1() {
        assert_eq!(encode_win_ansi("TEAM ALPHA"), b"TEAM ALPHA".to_vec());
        assert_eq!(encode_win_ansi("Café"), vec![b'C', b'a', b'f', 0xE9]);
    }

    #[test]
    fn test_encode_windows_1252_extras() {
        assert_eq!(encode_win_ansi("O’Neill"), vec![b'O', 0x92, b'N', b'e', b'i', b'l', b'l']);
        assert_eq!(encode_win_ansi("€"), vec![0x80]);
    }

    #[test]
    fn test_encode_replaces_unsupported() {
        assert_eq!(encode_win_ansi("Δx"), vec![b'?', b'x']);
        assert_eq!(encode_win_ansi("\n"), vec![b'?']);
    }

    #[test]
    fn test_invalid_font_is_rejected() {
        let err = EmbeddedFont::from_bytes(b"definitely not a font").unwrap_err();
        assert!(matches!(err, RenderError::InvalidFont { .. }));
    }

    #[test]
    fn test_win_ansi_char_inverts_the_high_table() {
        assert_eq!(win_ansi_char(0x92), Some('’'));
        assert_eq!(win_ansi_char(0x80), Some('€'));
        assert_eq!(win_ansi_char(0x81), None);
        assert_eq!(win_ansi_char(b'A'), Some('A'));
        assert_eq!(win_ansi_char(0xE9), Some('é'));
        for (code, ch) in WIN_ANSI_HIGH {
            assert_eq!(encode_win_ansi(&ch.to_string()), vec![code]);
        }
    }

    #[test]
    fn test_real_font_measures_windows_1252_glyphs() {
        let font = EmbeddedFont::from_bytes(DEJAVU_SANS).unwrap();
        assert_eq!(font.postscript_name(), "DejaVuSans");
        assert_eq!(font.widths().len(), usize::from(LAST_CHAR - FIRST_CHAR) + 1);

        let face = Face::parse(DEJAVU_SANS, 0).unwrap();
        let advance = |ch: char| {
            let glyph = face.glyph_index(ch).unwrap();
            f32::from(face.glyph_hor_advance(glyph).unwrap()) * 1000.0
                / f32::from(face.units_per_em())
        };

        let quote = font.text_width("’", 1000.0);
        assert!((quote - advance('’')).abs() < 1e-3);
        assert!((quote - font.text_width("?", 1000.0)).abs() > 1.0);
        assert!((font.widths()[usize::from(0x92 - FIRST_CHAR)] - advance('’')).abs() < 1e-3);
        assert!((font.widths()[usize::from(0x80 - FIRST_CHAR)] - advance('€')).abs() < 1e-3);

        let expected: f32 = "O’Neill".chars().map(advance).sum::<f32>() * 12.0 / 1000.0;
        assert!((font.text_width("O’Neill", 12.0) - expected).abs() < 1e-3);
    }

    #[test]
    fn test_sanitize_font_name() {
        assert_eq!(sanitize_font_name("Liberation Sans/Bold"), "LiberationSansBold");
        assert_eq!(sanitize_font_name("ABCDEF+Inter-Bold"), "ABCDEF+Inter-Bold");
    }
}
