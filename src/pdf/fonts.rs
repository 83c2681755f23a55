use anyhow::{Context, Result};
use fontdb::Database;
use lopdf::{Dictionary, Document, Object, ObjectId, Stream, StringFormat};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use ttf_parser::Face;

use super::content::PT_TO_MM;

/// Standard PDF Type1 fonts used on the slip
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StandardFont {
    Helvetica,
    HelveticaBold,
}

impl StandardFont {
    /// Get the PDF BaseFont name for this font
    pub fn base_font_name(&self) -> &'static str {
        match self {
            StandardFont::Helvetica => "Helvetica",
            StandardFont::HelveticaBold => "Helvetica-Bold",
        }
    }

    /// Resource name the font is registered under on every page
    pub fn resource_name(&self) -> &'static str {
        match self {
            StandardFont::Helvetica => "F1",
            StandardFont::HelveticaBold => "F2",
        }
    }

    /// Advance width of a character in 1/1000 em
    pub fn char_width(&self, c: char) -> u16 {
        let bold = *self == StandardFont::HelveticaBold;
        let (ascii, latin1) = if bold {
            (&HELVETICA_BOLD_WIDTHS, &HELVETICA_BOLD_LATIN1_WIDTHS)
        } else {
            (&HELVETICA_WIDTHS, &HELVETICA_LATIN1_WIDTHS)
        };
        match c {
            ' '..='~' => ascii[c as usize - 0x20],
            '\u{A0}'..='\u{FF}' => latin1[c as usize - 0xA0],
            _ => WINANSI_EXTRAS
                .iter()
                .find(|extra| extra.0 == c)
                .map(|extra| if bold { extra.3 } else { extra.2 })
                .unwrap_or(DEFAULT_WIDTH),
        }
    }
}

/// Resource name of the embedded Unicode font
pub const UNICODE_FONT_RESOURCE: &str = "F3";

/// Width used for glyphs outside the AFM tables
const DEFAULT_WIDTH: u16 = 556;

/// Default width (DW) of glyphs drawn with the CID font
pub const CID_GLYPH_WIDTH: u16 = 1000;

// AFM advance widths for ASCII 32..=126
const HELVETICA_WIDTHS: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278, // ' '..'/'
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 278, 278, 584, 584, 584, 556, // '0'..'?'
    1015, 667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, 722, 778, // '@'..'O'
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 278, 278, 278, 469, 556, // 'P'..'_'
    333, 556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, 556, 556, // '`'..'o'
    556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, 334, 260, 334, 584, // 'p'..'~'
];

const HELVETICA_BOLD_WIDTHS: [u16; 95] = [
    278, 333, 474, 556, 556, 889, 722, 238, 333, 333, 389, 584, 278, 333, 278, 278, // ' '..'/'
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 333, 333, 584, 584, 584, 611, // '0'..'?'
    975, 722, 722, 722, 722, 667, 611, 778, 722, 278, 556, 722, 611, 833, 722, 778, // '@'..'O'
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 333, 278, 333, 584, 556, // 'P'..'_'
    333, 556, 611, 556, 611, 556, 333, 611, 611, 278, 278, 556, 278, 889, 611, 611, // '`'..'o'
    611, 611, 389, 556, 333, 611, 556, 778, 556, 556, 500, 389, 280, 389, 584, // 'p'..'~'
];

// AFM advance widths for U+00A0..=U+00FF
const HELVETICA_LATIN1_WIDTHS: [u16; 96] = [
    278, 333, 556, 556, 556, 556, 260, 556, 333, 737, 370, 556, 584, 333, 737, 333, // A0
    400, 584, 333, 333, 333, 556, 537, 278, 333, 333, 365, 556, 834, 834, 834, 611, // B0
    667, 667, 667, 667, 667, 667, 1000, 722, 667, 667, 667, 667, 278, 278, 278, 278, // C0
    722, 722, 778, 778, 778, 778, 778, 584, 778, 722, 722, 722, 722, 667, 667, 611, // D0
    556, 556, 556, 556, 556, 556, 889, 500, 556, 556, 556, 556, 278, 278, 278, 278, // E0
    556, 556, 556, 556, 556, 556, 556, 584, 611, 556, 556, 556, 556, 500, 556, 500, // F0
];

const HELVETICA_BOLD_LATIN1_WIDTHS: [u16; 96] = [
    278, 333, 556, 556, 556, 556, 280, 556, 333, 737, 370, 556, 584, 333, 737, 333, // A0
    400, 584, 333, 333, 333, 611, 556, 278, 333, 333, 365, 556, 834, 834, 834, 611, // B0
    722, 722, 722, 722, 722, 722, 1000, 722, 667, 667, 667, 667, 278, 278, 278, 278, // C0
    722, 722, 778, 778, 778, 778, 778, 584, 778, 722, 722, 722, 722, 667, 667, 611, // D0
    556, 556, 556, 556, 556, 556, 889, 556, 556, 556, 556, 556, 278, 278, 278, 278, // E0
    611, 611, 611, 611, 611, 611, 611, 584, 611, 611, 611, 611, 611, 556, 611, 556, // F0
];

/// WinAnsi codes 0x80..=0x9F: (char, code, Helvetica width, Helvetica-Bold width)
const WINANSI_EXTRAS: [(char, u8, u16, u16); 27] = [
    ('\u{20AC}', 0x80, 556, 556),
    ('\u{201A}', 0x82, 222, 278),
    ('\u{0192}', 0x83, 556, 556),
    ('\u{201E}', 0x84, 333, 500),
    ('\u{2026}', 0x85, 1000, 1000),
    ('\u{2020}', 0x86, 556, 556),
    ('\u{2021}', 0x87, 556, 556),
    ('\u{02C6}', 0x88, 333, 333),
    ('\u{2030}', 0x89, 1000, 1000),
    ('\u{0160}', 0x8A, 667, 667),
    ('\u{2039}', 0x8B, 333, 333),
    ('\u{0152}', 0x8C, 1000, 1000),
    ('\u{017D}', 0x8E, 611, 611),
    ('\u{2018}', 0x91, 222, 278),
    ('\u{2019}', 0x92, 222, 278),
    ('\u{201C}', 0x93, 333, 500),
    ('\u{201D}', 0x94, 333, 500),
    ('\u{2022}', 0x95, 350, 350),
    ('\u{2013}', 0x96, 556, 556),
    ('\u{2014}', 0x97, 1000, 1000),
    ('\u{02DC}', 0x98, 333, 333),
    ('\u{2122}', 0x99, 1000, 1000),
    ('\u{0161}', 0x9A, 500, 556),
    ('\u{203A}', 0x9B, 333, 333),
    ('\u{0153}', 0x9C, 944, 944),
    ('\u{017E}', 0x9E, 500, 500),
    ('\u{0178}', 0x9F, 667, 667),
];

/// The WinAnsiEncoding byte for `c`, if the standard fonts can draw it
pub fn winansi_code(c: char) -> Option<u8> {
    match c {
        '\t' | '\n' | '\r' | ' '..='~' | '\u{A0}'..='\u{FF}' => Some(c as u8),
        _ => WINANSI_EXTRAS
            .iter()
            .find(|extra| extra.0 == c)
            .map(|extra| extra.1),
    }
}

/// Whether every character of `text` can be drawn with the standard fonts
pub fn is_winansi(text: &str) -> bool {
    text.chars().all(|c| winansi_code(c).is_some())
}

/// A piece of a string drawn with a single font
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TextRun {
    /// WinAnsi bytes for a standard font
    Standard(Vec<u8>),
    /// Characters for the embedded CID font
    Cid(String),
}

/// Split `text` into runs for the standard font and runs for the CID font.
///
/// Without a CID font, characters outside WinAnsi are drawn as `?`.
pub fn text_runs(text: &str, unicode: bool) -> Vec<TextRun> {
    let mut runs: Vec<TextRun> = Vec::new();
    for c in text.chars() {
        let code = match winansi_code(c) {
            Some(code) => Some(code),
            None if unicode => None,
            None => Some(b'?'),
        };
        match code {
            Some(code) => {
                if let Some(TextRun::Standard(bytes)) = runs.last_mut() {
                    bytes.push(code);
                } else {
                    runs.push(TextRun::Standard(vec![code]));
                }
            }
            None => {
                if let Some(TextRun::Cid(chars)) = runs.last_mut() {
                    chars.push(c);
                } else {
                    runs.push(TextRun::Cid(c.to_string()));
                }
            }
        }
    }
    runs
}

/// Advance widths of the embedded Unicode font in 1/1000 em, keyed by CID
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CidWidths {
    widths: BTreeMap<u16, u16>,
}

impl CidWidths {
    /// Read the horizontal advances of every BMP character the font maps
    pub fn from_font_data(font_data: &[u8]) -> Self {
        let Ok(face) = Face::parse(font_data, 0) else {
            return Self::default();
        };
        let units_per_em = face.units_per_em() as f64;
        let mut widths = BTreeMap::new();
        if units_per_em <= 0.0 {
            return Self { widths };
        }

        for cid in 0..=u16::MAX {
            let Some(gid) = char::from_u32(cid as u32).and_then(|ch| face.glyph_index(ch)) else {
                continue;
            };
            if let Some(advance) = face.glyph_hor_advance(gid) {
                let width = (advance as f64 * 1000.0 / units_per_em).round() as u16;
                widths.insert(cid, width);
            }
        }
        Self { widths }
    }

    pub fn is_empty(&self) -> bool {
        self.widths.is_empty()
    }

    /// Width of `c` as drawn, one CID per UTF-16 unit
    pub fn char_width(&self, c: char) -> u32 {
        let mut units = [0u16; 2];
        c.encode_utf16(&mut units)
            .iter()
            .map(|cid| self.widths.get(cid).copied().unwrap_or(CID_GLYPH_WIDTH) as u32)
            .sum()
    }

    /// The /W array, one `start [w ...]` entry per run of consecutive CIDs
    pub fn to_w_array(&self) -> Vec<Object> {
        let mut array = Vec::new();
        let mut start: Option<u16> = None;
        let mut run = Vec::new();
        let mut next = 0u32;

        for (&cid, &width) in &self.widths {
            if start.is_none() || cid as u32 != next {
                if let Some(first) = start {
                    array.push(Object::Integer(first as i64));
                    array.push(Object::Array(std::mem::take(&mut run)));
                }
                start = Some(cid);
            }
            run.push(Object::Integer(width as i64));
            next = cid as u32 + 1;
        }
        if let Some(first) = start {
            array.push(Object::Integer(first as i64));
            array.push(Object::Array(run));
        }
        array
    }
}

/// A TrueType/OpenType font used for text the standard fonts cannot show
#[derive(Debug, Clone)]
pub struct UnicodeFont {
    pub data: Vec<u8>,
    pub name: String,
}

impl UnicodeFont {
    /// Load a font file from disk
    pub fn from_file(path: &Path) -> Result<Self> {
        let data = fs::read(path)
            .with_context(|| format!("Failed to read font file: {:?}", path))?;
        Face::parse(&data, 0)
            .with_context(|| format!("Failed to parse font file: {:?}", path))?;
        let name = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("UnicodeFont")
            .to_string();
        Ok(Self { data, name })
    }
}

/// Fonts registered in one output document
#[derive(Debug, Clone)]
pub struct FontResources {
    pub regular: ObjectId,
    pub bold: ObjectId,
    pub unicode: Option<ObjectId>,
    pub cid_widths: Option<CidWidths>,
}

impl FontResources {
    /// Register the standard fonts and, when given, the Unicode fallback
    pub fn create(doc: &mut Document, unicode_font: Option<&UnicodeFont>) -> Self {
        let regular = create_font(doc, StandardFont::Helvetica);
        let bold = create_font(doc, StandardFont::HelveticaBold);
        let (unicode, cid_widths) = match unicode_font {
            Some(font) => {
                let widths = CidWidths::from_font_data(&font.data);
                let id = embed_cid_font(doc, &font.data, &font.name, &widths);
                (Some(id), Some(widths))
            }
            None => (None, None),
        };
        Self {
            regular,
            bold,
            unicode,
            cid_widths,
        }
    }

    pub fn has_unicode(&self) -> bool {
        self.unicode.is_some()
    }

    /// The /Font resource dictionary shared by every page
    pub fn to_dictionary(&self) -> Dictionary {
        let mut fonts = Dictionary::new();
        fonts.set(StandardFont::Helvetica.resource_name(), Object::Reference(self.regular));
        fonts.set(StandardFont::HelveticaBold.resource_name(), Object::Reference(self.bold));
        if let Some(id) = self.unicode {
            fonts.set(UNICODE_FONT_RESOURCE, Object::Reference(id));
        }
        fonts
    }
}

/// Create a standard Type1 font object in the document
pub fn create_font(doc: &mut Document, font: StandardFont) -> ObjectId {
    let mut font_dict = Dictionary::new();
    font_dict.set("Type", "Font");
    font_dict.set("Subtype", "Type1");
    font_dict.set("BaseFont", font.base_font_name());
    font_dict.set("Encoding", "WinAnsiEncoding");
    doc.add_object(Object::Dictionary(font_dict))
}

/// Width of `text` in millimetres at `font_size` points.
///
/// Characters outside WinAnsi are measured with `cid_widths` when the CID
/// font will draw them, and as `?` otherwise.
pub fn text_width(
    text: &str,
    font: StandardFont,
    font_size: f64,
    cid_widths: Option<&CidWidths>,
) -> f64 {
    let units: u32 = text
        .chars()
        .map(|c| match (winansi_code(c), cid_widths) {
            (Some(_), _) => font.char_width(c) as u32,
            (None, Some(widths)) => widths.char_width(c),
            (None, None) => font.char_width('?') as u32,
        })
        .sum();
    units as f64 / 1000.0 * font_size * PT_TO_MM
}

/// Build a CIDToGIDMap stream from font's cmap table
///
/// CIDs are Unicode code points under Identity-H, so each CID is mapped to
/// the glyph the font's cmap gives for that code point.
fn build_cidtogid_map(font_data: &[u8]) -> Option<Vec<u8>> {
    let face = Face::parse(font_data, 0).ok()?;

    const MAX_CID: u16 = 0xFFFF;
    let mut gid_map: Vec<u8> = Vec::with_capacity((MAX_CID as usize + 1) * 2);

    for cid in 0..=MAX_CID {
        let gid = char::from_u32(cid as u32)
            .and_then(|ch| face.glyph_index(ch))
            .map(|g| g.0)
            .unwrap_or(0);
        gid_map.push((gid >> 8) as u8);
        gid_map.push((gid & 0xFF) as u8);
    }

    Some(gid_map)
}

/// Embed a CID-keyed font for text outside WinAnsi
///
/// This creates a Type0 font with a CIDFontType2 descendant
pub fn embed_cid_font(
    doc: &mut Document,
    font_data: &[u8],
    font_name: &str,
    widths: &CidWidths,
) -> ObjectId {
    let base_font = font_name.replace(' ', "-");

    let mut cid_font = Dictionary::new();
    cid_font.set("Type", "Font");
    cid_font.set("Subtype", "CIDFontType2");
    cid_font.set("BaseFont", base_font.as_str());
    cid_font.set("DW", CID_GLYPH_WIDTH as i64);
    if !widths.is_empty() {
        cid_font.set("W", widths.to_w_array());
    }
    cid_font.set("CIDSystemInfo", {
        let mut cid_system = Dictionary::new();
        cid_system.set("Registry", Object::String("Adobe".into(), StringFormat::Literal));
        cid_system.set("Ordering", Object::String("Identity".into(), StringFormat::Literal));
        cid_system.set("Supplement", 0i64);
        Object::Dictionary(cid_system)
    });

    if let Some(cidtogid_data) = build_cidtogid_map(font_data) {
        let cidtogid_stream = Stream::new(Dictionary::new(), cidtogid_data);
        let cidtogid_id = doc.add_object(cidtogid_stream);
        cid_font.set("CIDToGIDMap", Object::Reference(cidtogid_id));
    } else {
        cid_font.set("CIDToGIDMap", "Identity");
    }

    let mut font_stream_dict = Dictionary::new();
    font_stream_dict.set("Length1", font_data.len() as i64);
    let font_stream_id = doc.add_object(Stream::new(font_stream_dict, font_data.to_vec()));

    let mut font_descriptor = Dictionary::new();
    font_descriptor.set("Type", "FontDescriptor");
    font_descriptor.set("FontName", base_font.as_str());
    font_descriptor.set("Flags", 4i64); // Symbolic
    font_descriptor.set(
        "FontBBox",
        vec![0i64, -200, 1000, 1000]
            .into_iter()
            .map(Object::Integer)
            .collect::<Vec<_>>(),
    );
    font_descriptor.set("ItalicAngle", 0i64);
    font_descriptor.set("Ascent", 1000i64);
    font_descriptor.set("Descent", -200i64);
    font_descriptor.set("CapHeight", 700i64);
    font_descriptor.set("StemV", 80i64);
    font_descriptor.set("FontFile2", Object::Reference(font_stream_id));
    let descriptor_id = doc.add_object(Object::Dictionary(font_descriptor));
    cid_font.set("FontDescriptor", Object::Reference(descriptor_id));

    let cid_font_id = doc.add_object(Object::Dictionary(cid_font));

    let mut type0_font = Dictionary::new();
    type0_font.set("Type", "Font");
    type0_font.set("Subtype", "Type0");
    type0_font.set("BaseFont", base_font.as_str());
    type0_font.set("Encoding", "Identity-H");
    type0_font.set("DescendantFonts", vec![Object::Reference(cid_font_id)]);

    doc.add_object(Object::Dictionary(type0_font))
}

/// Family names tried, in order, when looking for a Unicode-capable font
const UNICODE_FONT_FAMILIES: [&str; 8] = [
    "Noto Sans Bengali",
    "Noto Serif Bengali",
    "Nirmala UI",
    "Vrinda",
    "Kohinoor Bangla",
    "Lohit Bengali",
    "Noto Sans",
    "DejaVu Sans",
];

/// Find a font that can draw text the standard fonts cannot.
///
/// `preferred` may name a font file or a family; otherwise the system font
/// directories are searched for one of a list of known families.
pub fn find_unicode_font(preferred: Option<&str>) -> Option<UnicodeFont> {
    if let Some(preferred) = preferred {
        let path = Path::new(preferred);
        if path.is_file() {
            return UnicodeFont::from_file(path).ok();
        }
    }

    let mut db = Database::new();
    db.load_system_fonts();
    if let Ok(home) = std::env::var("HOME") {
        for subpath in [".fonts", ".local/share/fonts"] {
            db.load_fonts_dir(Path::new(&home).join(subpath));
        }
    }

    let families = preferred
        .into_iter()
        .chain(UNICODE_FONT_FAMILIES.iter().copied());

    for family in families {
        let query = fontdb::Query {
            families: &[fontdb::Family::Name(family)],
            ..Default::default()
        };

        let Some(id) = db.query(&query) else {
            continue;
        };
        let Some((source, index)) = db.face_source(id) else {
            continue;
        };
        // Collections can't be embedded as a single FontFile2, skip them
        if index != 0 {
            continue;
        }
        let data = match source {
            fontdb::Source::File(path) => match fs::read(&path) {
                Ok(data) => data,
                Err(_) => continue,
            },
            fontdb::Source::Binary(data) => data.as_ref().as_ref().to_vec(),
            _ => continue,
        };
        if Face::parse(&data, 0).is_ok() {
            return Some(UnicodeFont {
                data,
                name: family.to_string(),
            });
        }
    }

    None
}
