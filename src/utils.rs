//! Shared utility functions
use rand::distributions::{Alphanumeric, DistString};
use std::path::Path;

/// Length of the identifiers assigned to uploaded fonts and media assets
pub const IDENTIFIER_LEN: usize = 24;

/// Generates a random alphanumeric [`String`] of the given length
pub fn random_string(len: usize) -> String {
    Alphanumeric.sample_string(&mut rand::thread_rng(), len)
}

/// Generates a new lowercase identifier for an uploaded asset
pub fn new_identifier() -> String {
    random_string(IDENTIFIER_LEN).to_ascii_lowercase()
}

/// Resolves the content type of a font file from its name extension
pub fn content_type_for(file_name: &str) -> &'static str {
    let ext = Path::new(file_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase);
    match ext.as_deref() {
        Some("ttf") => "font/ttf",
        Some("otf") => "font/otf",
        Some("woff") => "font/woff",
        Some("woff2") => "font/woff2",
        Some("ttc") => "font/collection",
        Some("eot") => "application/vnd.ms-fontobject",
        Some("svg") => "image/svg+xml",
        _ => "application/octet-stream",
    }
}

/// Turns a font family name into a kebab-case identifier
///
/// Runs of non alphanumeric characters collapse into a single `-`.
pub fn kebab_identifier(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    for c in name.chars() {
        if c.is_alphanumeric() {
            out.extend(c.to_lowercase());
        } else if !out.is_empty() && !out.ends_with('-') {
            out.push('-');
        }
    }
    while out.ends_with('-') {
        out.pop();
    }
    out
}
