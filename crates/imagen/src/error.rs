use thiserror::Error;

#[derive(Debug, Error)]
pub enum ImagenError {
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("JSON serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Image API error: {message}")]
    Api {
        message: String,
        status_code: Option<u16>,
    },

    #[error("Image API rate limited: {0}")]
    RateLimited(String),
}

impl ImagenError {
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::Api { status_code, .. } => *status_code,
            Self::RateLimited(_) => Some(429),
            Self::Request(e) => e.status().map(|s| s.as_u16()),
            Self::Serialization(_) => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, ImagenError>;
