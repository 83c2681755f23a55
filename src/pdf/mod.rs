//! PDF rendering of payment slips on top of `lopdf`.

pub mod assets;
pub mod content;
pub mod document;
pub mod fonts;
pub mod resources;
pub mod slip;
pub mod table;

pub use assets::{AssetKind, AssetSet, ImageAsset};
pub use fonts::{UnicodeFont, find_unicode_font};
pub use slip::{
    RenderedSlip, SLIP_FILE_NAME, SlipLayout, render_payment_slip, save_payment_slip,
};
