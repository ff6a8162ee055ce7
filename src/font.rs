//! Font descriptors as stored in the style document, and the view-facing catalog wrapper
use crate::{catalog::CatalogEntry, utils};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, OnceLock};
use tracing::warn;

/// Prefix of every font key in the style document.
pub const FONTS_KEY_PREFIX: &str = "fonts/";

/// Weight used for `regular`/`italic` catalog variants and for fonts with no usable weight.
pub const DEFAULT_WEIGHT: u16 = 400;

/// Lightest and boldest weights a variant may have.
pub const MIN_WEIGHT: u16 = 100;
pub const MAX_WEIGHT: u16 = 900;

/// Font slant.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FontStyle {
    #[default]
    Normal,
    Italic,
}

/// One weight/style instance of a font family.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FontVariant {
    /// Weight, from 100 (thin) to 900 (black).
    pub weight: u16,

    /// Slant.
    #[serde(default)]
    pub style: FontStyle,

    /// Remote file URL, for fonts coming from the catalog.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,

    /// Media storage key, for uploaded fonts.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_key: Option<String>,
}

impl FontVariant {
    /// Creates a variant which does not reference any asset yet
    pub fn new(weight: u16, style: FontStyle) -> Self {
        Self {
            weight,
            style,
            file: None,
            source_key: None,
        }
    }

    /// Parses a catalog variant name like `regular`, `italic`, `700` or `700italic`
    pub fn from_catalog_name(name: &str) -> Option<Self> {
        let (weight, style) = match name {
            "regular" => (DEFAULT_WEIGHT, FontStyle::Normal),
            "italic" => (DEFAULT_WEIGHT, FontStyle::Italic),
            _ => match name.strip_suffix("italic") {
                Some(w) => (w.parse().ok()?, FontStyle::Italic),
                None => (name.parse().ok()?, FontStyle::Normal),
            },
        };
        if !(MIN_WEIGHT..=MAX_WEIGHT).contains(&weight) {
            return None;
        }
        Some(Self::new(weight, style))
    }

    /// Returns the asset this variant points to, whichever kind it is
    pub fn asset_key(&self) -> Option<&str> {
        self.source_key.as_deref().or(self.file.as_deref())
    }
}

/// The persisted representation of a font, usable by the styling system.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FontDescriptor {
    /// Style document key, `fonts/<identifier>`.
    pub key: String,

    /// CSS font family.
    pub family: String,

    /// Name shown to users.
    pub display_name: String,

    /// Catalog category, like `serif` or `monospace`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,

    /// Available variants, in catalog or file order.
    #[serde(default)]
    pub variants: Vec<FontVariant>,
}

impl FontDescriptor {
    /// Creates a descriptor keyed under the given identifier
    pub fn new(identifier: &str, family: impl Into<String>) -> Self {
        let family = family.into();
        Self {
            key: format!("{FONTS_KEY_PREFIX}{identifier}"),
            display_name: family.clone(),
            family,
            category: None,
            variants: Vec::new(),
        }
    }

    /// Returns the identifier part of the key
    pub fn identifier(&self) -> &str {
        self.key
            .strip_prefix(FONTS_KEY_PREFIX)
            .unwrap_or(self.key.as_str())
    }

    /// Re-keys the descriptor under a new identifier
    pub fn set_identifier(&mut self, identifier: &str) {
        self.key = format!("{FONTS_KEY_PREFIX}{identifier}");
    }
}

/// Preview data for a catalog font, computed on first access.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FontPreview {
    /// CSS family to render the preview with.
    pub css_family: String,

    /// File URL of the `regular` variant, or of the first variant if there is no `regular` one.
    pub file: Option<String>,
}

/// A catalog font as shown in the picker list.
#[derive(Debug, Clone)]
pub struct DisplayFont {
    entry: Arc<CatalogEntry>,
    identifier: String,
    preview: OnceLock<FontPreview>,
}

impl DisplayFont {
    pub fn new(entry: Arc<CatalogEntry>) -> Self {
        Self {
            identifier: utils::kebab_identifier(&entry.family),
            entry,
            preview: OnceLock::new(),
        }
    }

    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    pub fn family(&self) -> &str {
        &self.entry.family
    }

    pub fn entry(&self) -> &CatalogEntry {
        &self.entry
    }

    pub fn preview(&self) -> &FontPreview {
        self.preview.get_or_init(|| FontPreview {
            css_family: format!("'{}', {}", self.entry.family, self.fallback_family()),
            file: self
                .entry
                .files
                .get("regular")
                .or_else(|| {
                    self.entry
                        .variants
                        .first()
                        .and_then(|v| self.entry.files.get(v))
                })
                .cloned(),
        })
    }

    fn fallback_family(&self) -> &'static str {
        match self.entry.category.as_deref() {
            Some("serif") => "serif",
            Some("monospace") => "monospace",
            Some("handwriting") => "cursive",
            Some("display") => "fantasy",
            _ => "sans-serif",
        }
    }

    /// Converts the catalog font into a style document descriptor
    ///
    /// Catalog variants with an unrecognized name are skipped.
    pub fn to_descriptor(&self) -> FontDescriptor {
        let mut descriptor = FontDescriptor::new(&self.identifier, self.entry.family.as_str());
        descriptor.category = self.entry.category.clone();
        for name in self.entry.variants.iter() {
            match FontVariant::from_catalog_name(name) {
                Some(mut variant) => {
                    variant.file = self.entry.files.get(name).cloned();
                    descriptor.variants.push(variant);
                }
                None => warn!(
                    "skipping unrecognized variant {name:?} of font {:?}",
                    self.entry.family
                ),
            }
        }
        descriptor
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::collections::HashMap;

    fn roboto() -> Arc<CatalogEntry> {
        Arc::new(CatalogEntry {
            family: "Roboto Slab".into(),
            variants: vec!["regular".into(), "700italic".into(), "bogus".into()],
            category: Some("serif".into()),
            files: HashMap::from([
                ("regular".into(), "https://fonts/r.ttf".into()),
                ("700italic".into(), "https://fonts/bi.ttf".into()),
            ]),
            ..Default::default()
        })
    }

    #[test]
    fn catalog_variant_names() {
        assert_eq!(
            FontVariant::from_catalog_name("regular"),
            Some(FontVariant::new(400, FontStyle::Normal))
        );
        assert_eq!(
            FontVariant::from_catalog_name("italic"),
            Some(FontVariant::new(400, FontStyle::Italic))
        );
        assert_eq!(
            FontVariant::from_catalog_name("300"),
            Some(FontVariant::new(300, FontStyle::Normal))
        );
        assert_eq!(
            FontVariant::from_catalog_name("900italic"),
            Some(FontVariant::new(900, FontStyle::Italic))
        );
        assert_eq!(FontVariant::from_catalog_name("bold"), None);
        assert_eq!(FontVariant::from_catalog_name("0"), None);
        assert_eq!(FontVariant::from_catalog_name("50"), None);
        assert_eq!(FontVariant::from_catalog_name("950"), None);
        assert_eq!(FontVariant::from_catalog_name("950italic"), None);
    }

    #[test]
    fn display_font() {
        let font = DisplayFont::new(roboto());
        assert_eq!(font.identifier(), "roboto-slab");
        assert_eq!(font.family(), "Roboto Slab");
        let preview = font.preview();
        assert_eq!(preview.css_family, "'Roboto Slab', serif");
        assert_eq!(preview.file.as_deref(), Some("https://fonts/r.ttf"));
    }

    #[test]
    fn descriptor_from_catalog() {
        let descriptor = DisplayFont::new(roboto()).to_descriptor();
        assert_eq!(descriptor.key, "fonts/roboto-slab");
        assert_eq!(descriptor.identifier(), "roboto-slab");
        assert_eq!(descriptor.display_name, "Roboto Slab");
        assert_eq!(descriptor.category.as_deref(), Some("serif"));
        assert_eq!(descriptor.variants.len(), 2);
        assert_eq!(descriptor.variants[1].weight, 700);
        assert_eq!(descriptor.variants[1].style, FontStyle::Italic);
        assert_eq!(
            descriptor.variants[1].asset_key(),
            Some("https://fonts/bi.ttf")
        );
    }

    #[test]
    fn descriptor_json_shape() -> Result<(), serde_json::Error> {
        let mut descriptor = FontDescriptor::new("abc", "Inter");
        let mut variant = FontVariant::new(700, FontStyle::Normal);
        variant.source_key = Some("media-key".into());
        descriptor.variants.push(variant);
        let json = serde_json::to_value(&descriptor)?;
        assert_eq!(
            json,
            serde_json::json!({
                "key": "fonts/abc",
                "family": "Inter",
                "displayName": "Inter",
                "variants": [{ "weight": 700, "style": "normal", "sourceKey": "media-key" }]
            })
        );
        Ok(())
    }
}
