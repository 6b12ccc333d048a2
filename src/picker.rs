//! File selection
//!
//! Reads a user-chosen file into memory and labels it with a MIME type the
//! way a browser file input would: content sniffing first, then the file
//! extension.

use crate::Result;
use image::ImageFormat;
use std::fmt;
use std::path::Path;

const UNKNOWN_MIME: &str = "application/octet-stream";

/// A file the user picked or captured, not yet validated as an image.
#[derive(Clone, PartialEq, Eq)]
pub struct PickedFile {
    pub name: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

impl PickedFile {
    pub fn new(name: impl Into<String>, mime_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            mime_type: mime_type.into(),
            bytes,
        }
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let bytes = std::fs::read(path)?;
        let mime_type = detect_mime(&bytes, path);
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        tracing::debug!("Read {} ({}, {} bytes)", name, mime_type, bytes.len());
        Ok(Self::new(name, mime_type, bytes))
    }
}

impl fmt::Debug for PickedFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PickedFile")
            .field("name", &self.name)
            .field("mime_type", &self.mime_type)
            .field("len", &self.bytes.len())
            .finish()
    }
}

pub fn detect_mime(bytes: &[u8], path: &Path) -> &'static str {
    if let Ok(format) = image::guess_format(bytes) {
        return format.to_mime_type();
    }

    match ImageFormat::from_path(path) {
        Ok(format) => {
            tracing::warn!(
                "Unrecognized image content in {}, trusting its extension",
                path.display()
            );
            format.to_mime_type()
        }
        Err(_) => UNKNOWN_MIME,
    }
}
