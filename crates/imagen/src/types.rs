use serde::{Deserialize, Serialize};

/// Aspect ratios accepted by the image service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum AspectRatio {
    #[default]
    #[serde(rename = "1:1")]
    Square,
    #[serde(rename = "3:4")]
    Portrait,
    #[serde(rename = "4:3")]
    Landscape,
    #[serde(rename = "9:16")]
    Tall,
    #[serde(rename = "16:9")]
    Wide,
}

impl AspectRatio {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Square => "1:1",
            Self::Portrait => "3:4",
            Self::Landscape => "4:3",
            Self::Tall => "9:16",
            Self::Wide => "16:9",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "1:1" => Some(Self::Square),
            "3:4" => Some(Self::Portrait),
            "4:3" => Some(Self::Landscape),
            "9:16" => Some(Self::Tall),
            "16:9" => Some(Self::Wide),
            _ => None,
        }
    }
}

/// Encoding the service should return images in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum OutputMimeType {
    #[default]
    #[serde(rename = "image/jpeg")]
    Jpeg,
    #[serde(rename = "image/png")]
    Png,
}

impl OutputMimeType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Jpeg => "image/jpeg",
            Self::Png => "image/png",
        }
    }
}

/// What the caller wants generated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageRequest {
    pub prompt: String,
    pub number_of_images: u32,
    pub aspect_ratio: AspectRatio,
    pub mime_type: OutputMimeType,
}

impl ImageRequest {
    /// One square JPEG for `prompt`.
    pub fn single(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            number_of_images: 1,
            aspect_ratio: AspectRatio::Square,
            mime_type: OutputMimeType::Jpeg,
        }
    }

    pub fn with_aspect_ratio(mut self, aspect_ratio: AspectRatio) -> Self {
        self.aspect_ratio = aspect_ratio;
        self
    }

    pub fn with_mime_type(mut self, mime_type: OutputMimeType) -> Self {
        self.mime_type = mime_type;
        self
    }
}

// Wire types for the `models/{model}:predict` endpoint.

#[derive(Debug, Clone, Serialize)]
pub struct PredictRequest {
    pub instances: Vec<PredictInstance>,
    pub parameters: PredictParameters,
}

#[derive(Debug, Clone, Serialize)]
pub struct PredictInstance {
    pub prompt: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PredictParameters {
    pub sample_count: u32,
    pub aspect_ratio: AspectRatio,
    pub output_options: OutputOptions,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OutputOptions {
    pub mime_type: OutputMimeType,
}

impl From<&ImageRequest> for PredictRequest {
    fn from(request: &ImageRequest) -> Self {
        Self {
            instances: vec![PredictInstance {
                prompt: request.prompt.clone(),
            }],
            parameters: PredictParameters {
                sample_count: request.number_of_images,
                aspect_ratio: request.aspect_ratio,
                output_options: OutputOptions {
                    mime_type: request.mime_type,
                },
            },
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PredictResponse {
    #[serde(default)]
    pub predictions: Vec<Prediction>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Prediction {
    #[serde(default)]
    pub bytes_base64_encoded: Option<String>,
    #[serde(default)]
    pub mime_type: Option<String>,
    /// Set instead of image bytes when the output was safety-filtered.
    #[serde(default)]
    pub rai_filtered_reason: Option<String>,
}

/// Error body returned by Google APIs.
#[derive(Debug, Deserialize)]
pub struct ApiErrorResponse {
    pub error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
pub struct ApiErrorDetail {
    pub message: String,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub code: Option<u16>,
}
