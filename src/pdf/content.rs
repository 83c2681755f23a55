//! PDF content stream generation for text, images and filled boxes.
//!
//! Callers work in millimetres with the origin at the top-left corner of the
//! page; the builder flips the Y axis and converts to points.

use anyhow::Result;
use std::io::Write;

use super::fonts::{StandardFont, TextRun, UNICODE_FONT_RESOURCE, text_runs};

/// Points per millimetre
pub const MM_TO_PT: f64 = 72.0 / 25.4;
/// Millimetres per point
pub const PT_TO_MM: f64 = 25.4 / 72.0;

/// An RGB colour with 0-255 components
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    pub const BLACK: Rgb = Rgb(0, 0, 0);
    pub const WHITE: Rgb = Rgb(255, 255, 255);

    fn components(&self) -> (f64, f64, f64) {
        (
            self.0 as f64 / 255.0,
            self.1 as f64 / 255.0,
            self.2 as f64 / 255.0,
        )
    }
}

/// A box on the page, in millimetres from the top-left corner
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, w: f64, h: f64) -> Self {
        Self { x, y, w, h }
    }
}

/// Font, size (in points) and colour of a piece of text
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextStyle {
    pub font: StandardFont,
    pub size: f64,
    pub color: Rgb,
}

impl TextStyle {
    pub fn new(font: StandardFont, size: f64) -> Self {
        Self {
            font,
            size,
            color: Rgb::BLACK,
        }
    }

    pub fn with_color(mut self, color: Rgb) -> Self {
        self.color = color;
        self
    }
}

/// Builder for one page's content stream
pub struct ContentBuilder {
    pub content_parts: Vec<String>,
    page_height: f64,
    unicode_font: bool,
}

impl ContentBuilder {
    /// Create a builder for a page `page_height` millimetres tall
    pub fn new(page_height: f64, unicode_font: bool) -> Self {
        Self {
            content_parts: Vec::new(),
            page_height,
            unicode_font,
        }
    }

    /// Draw an image XObject, already registered as `name`, stretched over `rect`
    pub fn add_image(&mut self, name: &str, rect: Rect) {
        let x = rect.x * MM_TO_PT;
        let y = (self.page_height - rect.y - rect.h) * MM_TO_PT;
        let w = rect.w * MM_TO_PT;
        let h = rect.h * MM_TO_PT;

        self.content_parts.push(format!(
            "q {} 0 0 {} {} {} cm /{} Do Q ",
            fmt_num(w),
            fmt_num(h),
            fmt_num(x),
            fmt_num(y),
            name
        ));
    }

    /// Fill a rectangle with a solid colour
    pub fn fill_rect(&mut self, rect: Rect, color: Rgb) {
        let (r, g, b) = color.components();
        let x = rect.x * MM_TO_PT;
        let y = (self.page_height - rect.y - rect.h) * MM_TO_PT;
        self.content_parts.push(format!(
            "q {} {} {} rg {} {} {} {} re f Q ",
            fmt_num(r),
            fmt_num(g),
            fmt_num(b),
            fmt_num(x),
            fmt_num(y),
            fmt_num(rect.w * MM_TO_PT),
            fmt_num(rect.h * MM_TO_PT)
        ));
    }

    /// Draw text with its baseline starting at (`x`, `baseline`).
    ///
    /// WinAnsi characters use the style's font; anything else switches to the
    /// CID font when one is embedded. The runs share one text object, so each
    /// continues where the previous one ended.
    pub fn add_text(&mut self, value: &str, x: f64, baseline: f64, style: TextStyle) {
        let runs = text_runs(value, self.unicode_font);
        if runs.is_empty() {
            return;
        }

        let (r, g, b) = style.color.components();
        let mut ops = format!("q BT {} {} {} rg ", fmt_num(r), fmt_num(g), fmt_num(b));
        for (i, run) in runs.iter().enumerate() {
            let (font, text) = match run {
                TextRun::Standard(bytes) => {
                    (style.font.resource_name(), format!("({})", escape_pdf_bytes(bytes)))
                }
                TextRun::Cid(chars) => {
                    (UNICODE_FONT_RESOURCE, format!("<{}>", encode_cid_text(chars)))
                }
            };
            ops.push_str(&format!("/{} {} Tf ", font, fmt_num(style.size)));
            if i == 0 {
                ops.push_str(&format!(
                    "{} {} Td ",
                    fmt_num(x * MM_TO_PT),
                    fmt_num((self.page_height - baseline) * MM_TO_PT)
                ));
            }
            ops.push_str(&format!("{} Tj ", text));
        }
        ops.push_str("ET Q ");
        self.content_parts.push(ops);
    }

    /// Build the final content bytes
    pub fn build_content_bytes(&self) -> Vec<u8> {
        self.content_parts.join("").into_bytes()
    }
}

/// Format a coordinate without trailing zeros
fn fmt_num(value: f64) -> String {
    let s = format!("{:.3}", value);
    let s = s.trim_end_matches('0').trim_end_matches('.');
    if s == "-0" { "0".to_string() } else { s.to_string() }
}

/// Escape WinAnsi bytes for a PDF literal string
///
/// Bytes outside printable ASCII are written as octal escapes.
pub fn escape_pdf_bytes(bytes: &[u8]) -> String {
    let mut result = String::with_capacity(bytes.len());
    for &b in bytes {
        match b {
            b'(' => result.push_str(r"\("),
            b')' => result.push_str(r"\)"),
            b'\\' => result.push_str(r"\\"),
            b'\n' => result.push_str(r"\n"),
            b'\r' => result.push_str(r"\r"),
            b'\t' => result.push_str(r"\t"),
            0x20..=0x7E => result.push(b as char),
            _ => result.push_str(&format!("\\{:03o}", b)),
        }
    }
    result
}

/// Encode text for CID font (Identity-H encoding)
///
/// Converts text to UTF-16BE and returns hex representation
pub fn encode_cid_text(s: &str) -> String {
    let mut units = [0u16; 2];
    s.chars()
        .flat_map(|c| c.encode_utf16(&mut units).to_vec())
        .map(|unit| format!("{:04X}", unit))
        .collect()
}

/// Compress data using zlib/flate2
pub fn compress_data(data: &[u8]) -> Result<Vec<u8>> {
    let mut encoder = flate2::write::ZlibEncoder::new(Vec::new(), flate2::Compression::default());
    encoder.write_all(data)?;
    Ok(encoder.finish()?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_pdf_bytes() {
        assert_eq!(escape_pdf_bytes(b"hello"), "hello");
        assert_eq!(escape_pdf_bytes(b"(hello)"), r"\(hello\)");
        assert_eq!(escape_pdf_bytes(b"hello\\world"), r"hello\\world");
        assert_eq!(escape_pdf_bytes(b"line1\nline2"), r"line1\nline2");
        assert_eq!(escape_pdf_bytes(b"Jos\xE9"), r"Jos\351");
        assert_eq!(escape_pdf_bytes(b"\x80"), r"\200");
    }

    #[test]
    fn test_encode_cid_text() {
        assert_eq!(encode_cid_text("A"), "0041");
        assert_eq!(encode_cid_text("লো"), "09B209CB");
        assert_eq!(encode_cid_text("😀"), "D83DDE00");
    }

    #[test]
    fn test_fmt_num() {
        assert_eq!(fmt_num(12.0), "12");
        assert_eq!(fmt_num(0.5), "0.5");
        assert_eq!(fmt_num(1.23456), "1.235");
        assert_eq!(fmt_num(-0.0001), "0");
    }

    #[test]
    fn test_add_text_flips_y() {
        let mut builder = ContentBuilder::new(297.0, false);
        let style = TextStyle::new(StandardFont::Helvetica, 12.0);
        builder.add_text("Hello", 25.4, 297.0 - 25.4, style);

        assert_eq!(builder.content_parts.len(), 1);
        assert_eq!(
            builder.content_parts[0],
            "q BT 0 0 0 rg /F1 12 Tf 72 72 Td (Hello) Tj ET Q "
        );
    }

    #[test]
    fn test_add_text_unicode() {
        let style = TextStyle::new(StandardFont::HelveticaBold, 10.0);

        let mut with_font = ContentBuilder::new(297.0, true);
        with_font.add_text("লো", 0.0, 0.0, style);
        assert!(with_font.content_parts[0].contains("/F3 10 Tf"));
        assert!(with_font.content_parts[0].contains("<09B209CB> Tj"));
        assert!(!with_font.content_parts[0].contains("/F2"));

        let mut without_font = ContentBuilder::new(297.0, false);
        without_font.add_text("লো", 0.0, 0.0, style);
        assert!(without_font.content_parts[0].contains("/F2 10 Tf"));
        assert!(without_font.content_parts[0].contains("(??) Tj"));
    }

    #[test]
    fn test_add_text_accented_uses_winansi() {
        let mut builder = ContentBuilder::new(297.0, false);
        let style = TextStyle::new(StandardFont::Helvetica, 12.0);
        builder.add_text("CLIENT NAME: José Café", 20.0, 70.0, style);
        assert!(builder.content_parts[0].contains(r"(CLIENT NAME: Jos\351 Caf\351) Tj"));

        let mut with_font = ContentBuilder::new(297.0, true);
        with_font.add_text("José", 20.0, 70.0, style);
        assert!(with_font.content_parts[0].contains(r"(Jos\351) Tj"));
        assert!(!with_font.content_parts[0].contains("/F3"));
    }

    #[test]
    fn test_add_text_mixed_script_keeps_label_in_standard_font() {
        let mut builder = ContentBuilder::new(297.0, true);
        let style = TextStyle::new(StandardFont::Helvetica, 12.0);
        builder.add_text("CLIENT NAME: রহিম", 20.0, 70.0, style);

        let ops = &builder.content_parts[0];
        assert!(ops.starts_with("q BT 0 0 0 rg /F1 12 Tf "));
        assert!(ops.contains("Td (CLIENT NAME: ) Tj /F3 12 Tf <09B009B909BF09AE> Tj ET Q "));
        assert_eq!(ops.matches(" Td ").count(), 1);
    }

    #[test]
    fn test_add_empty_text() {
        let mut builder = ContentBuilder::new(297.0, false);
        builder.add_text("", 0.0, 0.0, TextStyle::new(StandardFont::Helvetica, 12.0));
        assert!(builder.content_parts.is_empty());
    }

    #[test]
    fn test_add_image_and_fill() {
        let mut builder = ContentBuilder::new(297.0, false);
        builder.add_image("Im7", Rect::new(0.0, 277.0, 25.4, 20.0));
        builder.fill_rect(Rect::new(0.0, 297.0 - 25.4, 25.4, 25.4), Rgb(255, 215, 0));

        assert!(builder.content_parts[0].ends_with("0 0 cm /Im7 Do Q "));
        assert_eq!(
            builder.content_parts[1],
            "q 1 0.843 0 rg 0 0 72 72 re f Q "
        );
    }

    #[test]
    fn test_compress_data_roundtrip() {
        use std::io::Read;
        let data = b"payment slip payment slip payment slip";
        let compressed = compress_data(data).unwrap();
        let mut decoder = flate2::read::ZlibDecoder::new(&compressed[..]);
        let mut out = Vec::new();
        decoder.read_to_end(&mut out).unwrap();
        assert_eq!(out, data);
    }
}
