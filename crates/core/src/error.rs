use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid data URI: {0}")]
    InvalidDataUri(String),

    #[error("Base64 decode failed: {0}")]
    Decode(#[from] base64::DecodeError),

    #[error("Failed to parse phase catalog: {0}")]
    CatalogParse(#[from] toml::de::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, CoreError>;
