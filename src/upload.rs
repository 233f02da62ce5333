//! Uploaded image handling: format gate, base64 encoding, data URIs

use std::path::Path;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;

use crate::error::{Error, Result};

/// Image formats accepted by the upload surface
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    Jpeg,
    Png,
}

impl ImageFormat {
    /// Detect the format from a file extension
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "jpg" | "jpeg" => Some(ImageFormat::Jpeg),
            "png" => Some(ImageFormat::Png),
            _ => None,
        }
    }

    /// Media type used when embedding the image in a data URI
    pub fn media_type(&self) -> &'static str {
        match self {
            ImageFormat::Jpeg => "image/jpeg",
            ImageFormat::Png => "image/png",
        }
    }
}

/// An uploaded image, held in memory for the duration of one interaction
#[derive(Debug, Clone)]
pub struct ImageUpload {
    name: String,
    format: ImageFormat,
    bytes: Vec<u8>,
}

impl ImageUpload {
    pub fn new(name: impl Into<String>, format: ImageFormat, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            format,
            bytes,
        }
    }

    /// Read an image from disk. The extension gate runs before the file is
    /// touched; the contents are read exactly once.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or_default();
        let format = ImageFormat::from_extension(ext)
            .ok_or_else(|| Error::UnsupportedImage(path.display().to_string()))?;
        let bytes = std::fs::read(path)?;
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("image")
            .to_string();
        Ok(Self {
            name,
            format,
            bytes,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn format(&self) -> ImageFormat {
        self.format
    }

    /// Size of the raw image in bytes
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Base64 text of the entire contents. The whole buffer is encoded in
    /// memory; an empty upload encodes to an empty string.
    pub fn to_base64(&self) -> String {
        STANDARD.encode(&self.bytes)
    }

    /// The image as an inline data URI for embedding in a JSON payload
    pub fn data_uri(&self) -> String {
        format!("data:{};base64,{}", self.format.media_type(), self.to_base64())
    }
}
