use anyhow::{Context, Result};
use lopdf::{Dictionary, Document, Object, Stream};
use std::collections::HashMap;
use std::path::Path;

use super::assets::{AssetKind, AssetSet};
use super::content::{ContentBuilder, MM_TO_PT, Rect};
use super::fonts::{FontResources, StandardFont, UnicodeFont, text_width};
use super::resources::page_resources;

/// A4 portrait, in millimetres
pub const A4_WIDTH: f64 = 210.0;
pub const A4_HEIGHT: f64 = 297.0;

/// Pages being drawn plus the objects they share (fonts and images)
pub struct PageCanvas {
    doc: Document,
    fonts: FontResources,
    xobjects: Dictionary,
    images: HashMap<AssetKind, String>,
    pages: Vec<ContentBuilder>,
    current: usize,
    width: f64,
    height: f64,
}

impl PageCanvas {
    /// Start a document with a single empty page of the given size (mm)
    pub fn new(width: f64, height: f64, unicode_font: Option<&UnicodeFont>) -> Self {
        let mut doc = Document::with_version("1.5");
        let fonts = FontResources::create(&mut doc, unicode_font);
        let first = ContentBuilder::new(height, fonts.has_unicode());
        Self {
            doc,
            fonts,
            xobjects: Dictionary::new(),
            images: HashMap::new(),
            pages: vec![first],
            current: 0,
            width,
            height,
        }
    }

    pub fn a4(unicode_font: Option<&UnicodeFont>) -> Self {
        Self::new(A4_WIDTH, A4_HEIGHT, unicode_font)
    }

    pub fn width(&self) -> f64 {
        self.width
    }

    pub fn height(&self) -> f64 {
        self.height
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Index of the page drawing currently goes to
    pub fn current_page_index(&self) -> usize {
        self.current
    }

    /// Append a page and make it current
    pub fn add_page(&mut self) {
        self.pages
            .push(ContentBuilder::new(self.height, self.fonts.has_unicode()));
        self.current = self.pages.len() - 1;
    }

    pub fn page(&mut self) -> &mut ContentBuilder {
        &mut self.pages[self.current]
    }

    /// Width of `text` in millimetres, as it will be drawn
    pub fn text_width(&self, text: &str, font: StandardFont, font_size: f64) -> f64 {
        text_width(text, font, font_size, self.fonts.cid_widths.as_ref())
    }

    /// Embed every asset once so pages can reference them by name
    pub fn register_assets(&mut self, assets: &AssetSet) -> Result<()> {
        for kind in AssetKind::ALL {
            let img_id = assets
                .get(kind)
                .embed(&mut self.doc)
                .with_context(|| format!("Failed to embed {} image", kind.label()))?;
            let img_name = format!("Im{}", img_id.0);
            self.xobjects.set(img_name.clone(), Object::Reference(img_id));
            self.images.insert(kind, img_name);
        }
        Ok(())
    }

    /// Draw a registered asset on the current page
    pub fn place_image(&mut self, kind: AssetKind, rect: Rect) -> Result<()> {
        let name = self
            .images
            .get(&kind)
            .with_context(|| format!("{} image was not registered", kind.label()))?
            .clone();
        self.page().add_image(&name, rect);
        Ok(())
    }

    /// Assemble the page tree and return the finished document
    pub fn finish(self) -> Document {
        let PageCanvas {
            mut doc,
            fonts,
            xobjects,
            pages,
            width,
            height,
            ..
        } = self;

        let pages_id = doc.new_object_id();
        let resources_id = doc.add_object(page_resources(&fonts, &xobjects));
        let media_box: Vec<Object> = vec![
            Object::Integer(0),
            Object::Integer(0),
            Object::Real((width * MM_TO_PT) as f32),
            Object::Real((height * MM_TO_PT) as f32),
        ];

        let mut kids = Vec::with_capacity(pages.len());
        for builder in &pages {
            let content_id = doc.add_object(Stream::new(
                Dictionary::new(),
                builder.build_content_bytes(),
            ));

            let mut page = Dictionary::new();
            page.set("Type", "Page");
            page.set("Parent", Object::Reference(pages_id));
            page.set("MediaBox", media_box.clone());
            page.set("Contents", Object::Reference(content_id));
            page.set("Resources", Object::Reference(resources_id));
            kids.push(Object::Reference(doc.add_object(page)));
        }

        let mut pages_dict = Dictionary::new();
        pages_dict.set("Type", "Pages");
        pages_dict.set("Count", kids.len() as i64);
        pages_dict.set("Kids", kids);
        doc.objects.insert(pages_id, Object::Dictionary(pages_dict));

        let mut catalog = Dictionary::new();
        catalog.set("Type", "Catalog");
        catalog.set("Pages", Object::Reference(pages_id));
        let catalog_id = doc.add_object(catalog);
        doc.trailer.set("Root", Object::Reference(catalog_id));

        doc
    }
}

/// Write the document to `path`
pub fn save_document(doc: &mut Document, path: &Path) -> Result<()> {
    doc.save(path)
        .with_context(|| format!("Failed to save {:?}", path))?;
    Ok(())
}
