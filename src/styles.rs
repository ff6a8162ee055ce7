//! The site style document and its storage
use crate::{error::FontPickerError, font::FontDescriptor};
use serde::{Deserialize, Serialize};
use std::{
    collections::BTreeMap,
    io::Write,
    path::{Path, PathBuf},
};
use tempfile::NamedTempFile;
use tokio::fs;
use tracing::{debug, trace};

/// The site-wide style document.
///
/// Only the font registry is typed; every other member is kept as is.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct StyleDocument {
    /// Font identifier to descriptor.
    #[serde(default)]
    pub fonts: BTreeMap<String, FontDescriptor>,

    /// Everything else (colors, typography, components...).
    #[serde(flatten)]
    pub other: serde_json::Map<String, serde_json::Value>,
}

impl StyleDocument {
    /// Registers a font under its identifier, returning the replaced descriptor if any
    pub fn set_font(&mut self, descriptor: FontDescriptor) -> Option<FontDescriptor> {
        self.fonts
            .insert(descriptor.identifier().to_string(), descriptor)
    }

    pub fn font(&self, identifier: &str) -> Option<&FontDescriptor> {
        self.fonts.get(identifier)
    }
}

/// Reads and writes the style document.
///
/// Writes replace the whole document; there is no merge and no version check.
#[async_trait::async_trait]
pub trait StyleService: Send + Sync {
    /// Returns a fresh copy of the current document
    async fn get_styles(&self) -> Result<StyleDocument, FontPickerError>;

    /// Replaces the stored document
    async fn update_styles(&self, styles: &StyleDocument) -> Result<(), FontPickerError>;
}

/// A [`StyleService`] backed by a JSON file.
///
/// A missing file reads as an empty document. Writes go to a temporary file in the same
/// directory which then replaces the document.
#[derive(Debug, Clone)]
pub struct JsonStyleStore {
    path: PathBuf,
}

impl JsonStyleStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait::async_trait]
impl StyleService for JsonStyleStore {
    async fn get_styles(&self) -> Result<StyleDocument, FontPickerError> {
        let data = match fs::read(&self.path).await {
            Ok(v) => v,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("style document {:?} not found, starting empty", self.path);
                return Ok(StyleDocument::default());
            }
            Err(e) => return Err(e.into()),
        };
        serde_json::from_slice(&data)
            .map_err(|e| FontPickerError::InvalidStyleDocument(format!("{:?}: {e}", self.path)))
    }

    async fn update_styles(&self, styles: &StyleDocument) -> Result<(), FontPickerError> {
        let data = serde_json::to_vec_pretty(styles)?;
        let path = self.path.clone();
        tokio::task::spawn_blocking(move || -> Result<(), FontPickerError> {
            let dir = match path.parent() {
                Some(v) if !v.as_os_str().is_empty() => v.to_path_buf(),
                _ => PathBuf::from("."),
            };
            let mut output_file = NamedTempFile::new_in(dir)?;
            output_file.write_all(&data)?;
            output_file.flush()?;
            output_file.persist(&path)?;
            Ok(())
        })
        .await??;
        trace!("style document {:?} written", self.path);
        Ok(())
    }
}
