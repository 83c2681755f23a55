use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

use crate::form::FormField;

/// A single field that blocked submission, with the message shown next to it.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{field}: {message}")]
pub struct FieldError {
    pub field: FormField,
    pub message: String,
}

/// Every field error found by one submission attempt.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub struct ValidationErrors {
    pub errors: Vec<FieldError>,
}

impl ValidationErrors {
    /// Message for a given field, if that field failed
    pub fn message_for(&self, field: FormField) -> Option<&str> {
        self.errors
            .iter()
            .find(|e| e.field == field)
            .map(|e| e.message.as_str())
    }

    pub fn fields(&self) -> Vec<FormField> {
        self.errors.iter().map(|e| e.field).collect()
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let messages: Vec<String> = self.errors.iter().map(|e| e.to_string()).collect();
        write!(f, "invoice form is incomplete: {}", messages.join("; "))
    }
}

/// An image asset could not be read or decoded.
#[derive(Error, Debug)]
#[error("Failed to load {name} image at {path:?}")]
pub struct AssetLoadError {
    pub name: &'static str,
    pub path: PathBuf,
    #[source]
    pub source: image::ImageError,
}
