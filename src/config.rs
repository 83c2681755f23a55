//! Configuration and input loading.
//!
//! This module handles:
//! - Loading the optional settings.json (asset directory, Unicode font)
//! - Loading the submitted form values from form.json
//! - Writing a seeded form.json for users to fill in

use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::form::FormDraft;

pub const SETTINGS_FILE_NAME: &str = "settings.json";
pub const FORM_FILE_NAME: &str = "form.json";
pub const DEFAULT_ASSETS_DIR: &str = "assets";

#[derive(Debug, Default, Deserialize, Clone, PartialEq)]
pub struct Settings {
    /// Directory holding the slip images, relative to the target directory
    #[serde(default)]
    pub assets_dir: Option<PathBuf>,
    /// Font file or family used for text outside the standard fonts
    #[serde(default)]
    pub unicode_font: Option<String>,
}

impl Settings {
    /// Resolve the asset directory against `target_dir`
    pub fn assets_dir(&self, target_dir: &Path) -> PathBuf {
        let dir = self
            .assets_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_ASSETS_DIR));
        if dir.is_absolute() {
            dir
        } else {
            target_dir.join(dir)
        }
    }
}

/// Helper function to open a file with consistent error context
fn open_file_with_context(path: &Path, description: &str) -> Result<File> {
    File::open(path)
        .with_context(|| format!("Failed to open {} at {:?}", description, path))
}

pub fn load_settings(path: &Path) -> Result<Settings> {
    let file = open_file_with_context(path, SETTINGS_FILE_NAME)?;
    let reader = BufReader::new(file);
    let settings: Settings = serde_json::from_reader(reader)
        .with_context(|| format!("Failed to parse {}", SETTINGS_FILE_NAME))?;
    Ok(settings)
}

/// Load settings.json from `target_dir`, falling back to defaults when absent
pub fn load_settings_or_default(target_dir: &Path) -> Result<Settings> {
    let path = target_dir.join(SETTINGS_FILE_NAME);
    if path.exists() {
        load_settings(&path)
    } else {
        Ok(Settings::default())
    }
}

pub fn load_form_draft(path: &Path) -> Result<FormDraft> {
    let file = open_file_with_context(path, FORM_FILE_NAME)?;
    let reader = BufReader::new(file);
    let draft: FormDraft = serde_json::from_reader(reader)
        .with_context(|| format!("Failed to parse {}", FORM_FILE_NAME))?;
    Ok(draft)
}

pub fn write_form_draft(path: &Path, draft: &FormDraft) -> Result<()> {
    let file = File::create(path)
        .with_context(|| format!("Failed to create {} at {:?}", FORM_FILE_NAME, path))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, draft)
        .with_context(|| format!("Failed to write {}", FORM_FILE_NAME))?;
    writer.write_all(b"\n")?;
    writer.flush()?;
    Ok(())
}
