#[cfg(test)]
#[path = "image_test.rs"]
mod tests;

use std::fmt;

use anyhow::Result;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;

/// An image as exchanged with the image service: a MIME type plus the raw
/// encoded bytes.
#[derive(Clone, PartialEq, Eq)]
pub struct ImageData {
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

impl fmt::Debug for ImageData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        return f
            .debug_struct("ImageData")
            .field("mime_type", &self.mime_type)
            .field("len", &self.bytes.len())
            .finish();
    }
}

impl ImageData {
    pub fn new(mime_type: &str, bytes: Vec<u8>) -> ImageData {
        return ImageData {
            mime_type: mime_type.to_string(),
            bytes,
        };
    }

    pub fn from_base64(mime_type: &str, data: &str) -> Result<ImageData> {
        let bytes = STANDARD.decode(data.trim())?;
        return Ok(ImageData::new(mime_type, bytes));
    }

    pub fn to_base64(&self) -> String {
        return STANDARD.encode(&self.bytes);
    }

    pub fn to_data_url(&self) -> String {
        return format!(
            "data:{mime};base64,{data}",
            mime = self.mime_type,
            data = self.to_base64()
        );
    }

    /// File extension matching the MIME type, falling back to `png`.
    pub fn extension(&self) -> &'static str {
        match self.mime_type.as_str() {
            "image/jpeg" | "image/jpg" => return "jpg",
            "image/webp" => return "webp",
            "image/gif" => return "gif",
            _ => return "png",
        }
    }
}

#[cfg(test)]
impl ImageData {
    /// Parses a `data:<mime>;base64,<payload>` URL.
    pub fn from_data_url(url: &str) -> Result<ImageData> {
        let Some(rest) = url.strip_prefix("data:") else {
            anyhow::bail!("Image is not a data URL");
        };
        let Some((meta, payload)) = rest.split_once(',') else {
            anyhow::bail!("Data URL is missing its payload");
        };
        let Some(mime_type) = meta.strip_suffix(";base64") else {
            anyhow::bail!("Only base64 encoded data URLs are supported");
        };

        return ImageData::from_base64(mime_type, payload);
    }
}
