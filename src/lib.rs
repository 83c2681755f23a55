//! Payment slip generator.
//!
//! [`form::InvoiceForm`] collects and validates what the user entered and
//! produces an [`model::InvoiceRecord`]; [`pdf::render_payment_slip`] lays
//! that record out as a one-page (or longer) PDF.

pub mod config;
pub mod error;
pub mod form;
pub mod model;
pub mod pdf;

pub use error::{AssetLoadError, FieldError, ValidationErrors};
pub use form::{FormDraft, FormField, InvoiceForm, ItemDraft};
pub use model::{InvoiceRecord, LineItem, PaymentMethod};
