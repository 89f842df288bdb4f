use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};

const DATA_URI_PREFIX: &str = "data:";
const BASE64_MARKER: &str = ";base64,";

/// A single generated image as returned by the image service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedImage {
    pub mime_type: String,
    /// Standard base64 encoding of the image bytes.
    pub base64_data: String,
}

impl GeneratedImage {
    pub fn new(mime_type: impl Into<String>, base64_data: impl Into<String>) -> Self {
        Self {
            mime_type: mime_type.into(),
            base64_data: base64_data.into(),
        }
    }

    /// Encode as `data:{mime};base64,{data}`, ready for display or download.
    pub fn to_data_uri(&self) -> String {
        format!(
            "{}{}{}{}",
            DATA_URI_PREFIX, self.mime_type, BASE64_MARKER, self.base64_data
        )
    }

    pub fn from_data_uri(uri: &str) -> Result<Self> {
        let rest = uri
            .strip_prefix(DATA_URI_PREFIX)
            .ok_or_else(|| CoreError::InvalidDataUri("missing `data:` prefix".to_string()))?;

        let (mime_type, data) = rest
            .split_once(BASE64_MARKER)
            .ok_or_else(|| CoreError::InvalidDataUri("not base64 encoded".to_string()))?;

        if mime_type.is_empty() {
            return Err(CoreError::InvalidDataUri("missing MIME type".to_string()));
        }

        Ok(Self::new(mime_type, data))
    }

    pub fn decode(&self) -> Result<Vec<u8>> {
        Ok(STANDARD.decode(self.base64_data.as_bytes())?)
    }

    pub fn file_extension(&self) -> &'static str {
        match self.mime_type.as_str() {
            "image/jpeg" | "image/jpg" => "jpeg",
            "image/png" => "png",
            "image/webp" => "webp",
            _ => "bin",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_data_uri_format() {
        let image = GeneratedImage::new("image/jpeg", "AAAA");
        assert_eq!(image.to_data_uri(), "data:image/jpeg;base64,AAAA");
    }

    #[test]
    fn test_parse_data_uri() {
        let image = GeneratedImage::from_data_uri("data:image/png;base64,aGVsbG8=").unwrap();
        assert_eq!(image.mime_type, "image/png");
        assert_eq!(image.decode().unwrap(), b"hello");
        assert_eq!(image.file_extension(), "png");
    }

    #[test]
    fn test_parse_invalid_data_uri() {
        assert!(matches!(
            GeneratedImage::from_data_uri("http://example.com/a.jpg"),
            Err(CoreError::InvalidDataUri(_))
        ));
        assert!(matches!(
            GeneratedImage::from_data_uri("data:image/png,plain"),
            Err(CoreError::InvalidDataUri(_))
        ));
        assert!(matches!(
            GeneratedImage::from_data_uri("data:;base64,AAAA"),
            Err(CoreError::InvalidDataUri(_))
        ));
    }

    #[test]
    fn test_decode_rejects_garbage() {
        let image = GeneratedImage::new("image/jpeg", "not base64!!");
        assert!(matches!(image.decode(), Err(CoreError::Decode(_))));
    }

    #[test]
    fn test_file_extension() {
        assert_eq!(GeneratedImage::new("image/jpeg", "").file_extension(), "jpeg");
        assert_eq!(GeneratedImage::new("application/octet-stream", "").file_extension(), "bin");
    }
}
