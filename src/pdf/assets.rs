//! Letterhead artwork placed on every slip.

use anyhow::Result;
use image::DynamicImage;
use lopdf::{Dictionary, Document, Object, ObjectId, Stream};
use std::path::Path;

use super::content::compress_data;
use crate::error::AssetLoadError;

/// The fixed bitmaps a slip is decorated with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AssetKind {
    Header,
    Footer,
    Badge,
    Paid,
    Seal,
    Social,
    Signature,
}

impl AssetKind {
    pub const ALL: [AssetKind; 7] = [
        AssetKind::Header,
        AssetKind::Footer,
        AssetKind::Badge,
        AssetKind::Paid,
        AssetKind::Seal,
        AssetKind::Social,
        AssetKind::Signature,
    ];

    /// File name inside the asset directory
    pub fn file_name(&self) -> &'static str {
        match self {
            AssetKind::Header => "header.png",
            AssetKind::Footer => "footer.png",
            AssetKind::Badge => "badge.png",
            AssetKind::Paid => "paid.png",
            AssetKind::Seal => "seal.png",
            AssetKind::Social => "social.png",
            AssetKind::Signature => "signature.png",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            AssetKind::Header => "header",
            AssetKind::Footer => "footer",
            AssetKind::Badge => "badge",
            AssetKind::Paid => "paid stamp",
            AssetKind::Seal => "seal",
            AssetKind::Social => "social media",
            AssetKind::Signature => "signature",
        }
    }
}

/// A decoded bitmap, split into 8-bit RGB samples and an optional alpha plane
#[derive(Debug, Clone)]
pub struct ImageAsset {
    pub width: u32,
    pub height: u32,
    pub rgb: Vec<u8>,
    pub alpha: Option<Vec<u8>>,
}

impl ImageAsset {
    pub fn from_image(img: &DynamicImage) -> Self {
        let (width, height) = (img.width(), img.height());
        if img.color().has_alpha() {
            let rgba = img.to_rgba8();
            let mut rgb = Vec::with_capacity((width * height * 3) as usize);
            let mut alpha = Vec::with_capacity((width * height) as usize);
            for pixel in rgba.pixels() {
                rgb.extend_from_slice(&pixel.0[..3]);
                alpha.push(pixel.0[3]);
            }
            Self {
                width,
                height,
                rgb,
                alpha: Some(alpha),
            }
        } else {
            Self {
                width,
                height,
                rgb: img.to_rgb8().into_raw(),
                alpha: None,
            }
        }
    }

    /// Decode an image file
    pub fn load(kind: AssetKind, path: &Path) -> Result<Self, AssetLoadError> {
        let img = image::open(path).map_err(|source| AssetLoadError {
            name: kind.label(),
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self::from_image(&img))
    }

    /// Add the image (and its soft mask) to the document as an XObject
    pub fn embed(&self, doc: &mut Document) -> Result<ObjectId> {
        let mut img_dict = image_dict(self.width, self.height, "DeviceRGB");

        if let Some(alpha) = &self.alpha {
            let mask_dict = image_dict(self.width, self.height, "DeviceGray");
            let mask_id = doc.add_object(Stream::new(mask_dict, compress_data(alpha)?));
            img_dict.set("SMask", Object::Reference(mask_id));
        }

        let img_stream = Stream::new(img_dict, compress_data(&self.rgb)?);
        Ok(doc.add_object(img_stream))
    }
}

fn image_dict(width: u32, height: u32, color_space: &str) -> Dictionary {
    let mut dict = Dictionary::new();
    dict.set("Type", "XObject");
    dict.set("Subtype", "Image");
    dict.set("Width", width as i64);
    dict.set("Height", height as i64);
    dict.set("ColorSpace", color_space);
    dict.set("BitsPerComponent", 8_i64);
    dict.set("Filter", "FlateDecode");
    dict
}

/// Every image a slip needs
#[derive(Debug, Clone)]
pub struct AssetSet {
    pub header: ImageAsset,
    pub footer: ImageAsset,
    pub badge: ImageAsset,
    pub paid: ImageAsset,
    pub seal: ImageAsset,
    pub social: ImageAsset,
    pub signature: ImageAsset,
}

impl AssetSet {
    /// Load all seven images from `dir`, failing on the first one missing
    pub fn load_dir(dir: &Path) -> Result<Self, AssetLoadError> {
        let load = |kind: AssetKind| ImageAsset::load(kind, &dir.join(kind.file_name()));
        Ok(Self {
            header: load(AssetKind::Header)?,
            footer: load(AssetKind::Footer)?,
            badge: load(AssetKind::Badge)?,
            paid: load(AssetKind::Paid)?,
            seal: load(AssetKind::Seal)?,
            social: load(AssetKind::Social)?,
            signature: load(AssetKind::Signature)?,
        })
    }

    pub fn get(&self, kind: AssetKind) -> &ImageAsset {
        match kind {
            AssetKind::Header => &self.header,
            AssetKind::Footer => &self.footer,
            AssetKind::Badge => &self.badge,
            AssetKind::Paid => &self.paid,
            AssetKind::Seal => &self.seal,
            AssetKind::Social => &self.social,
            AssetKind::Signature => &self.signature,
        }
    }
}
