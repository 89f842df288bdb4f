use async_trait::async_trait;
use buildcast_core::{Credential, GeneratedImage};
use reqwest::Client;
use tracing::{debug, error, warn};

use crate::error::{ImagenError, Result};
use crate::generator::ImageGenerator;
use crate::types::{ApiErrorResponse, ImageRequest, PredictRequest, PredictResponse};

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_MODEL: &str = "imagen-4.0-generate-001";

const API_KEY_HEADER: &str = "x-goog-api-key";

/// HTTP client for the Imagen `:predict` endpoint.
///
/// Holds no credential; the key travels with each request.
#[derive(Clone)]
pub struct ImagenClient {
    client: Client,
    base_url: String,
    model: String,
}

impl ImagenClient {
    pub fn new(base_url: impl Into<String>, model: impl Into<String>) -> Self {
        Self::with_client(base_url, model, Client::new())
    }

    pub fn with_client(base_url: impl Into<String>, model: impl Into<String>, client: Client) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            model: model.into(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn predict_url(&self) -> String {
        format!("{}/models/{}:predict", self.base_url, self.model)
    }

    pub async fn predict(
        &self,
        credential: &Credential,
        request: &ImageRequest,
    ) -> Result<PredictResponse> {
        debug!(
            model = %self.model,
            aspect_ratio = request.aspect_ratio.as_str(),
            sample_count = request.number_of_images,
            "Requesting image generation"
        );

        let body = PredictRequest::from(request);

        let response = self
            .client
            .post(self.predict_url())
            .header(API_KEY_HEADER, credential.expose())
            .json(&body)
            .send()
            .await?;

        self.handle_response(response).await
    }

    async fn handle_response(&self, response: reqwest::Response) -> Result<PredictResponse> {
        let status = response.status();

        if status.is_success() {
            let text = response.text().await?;
            if text.trim().is_empty() {
                return Ok(PredictResponse::default());
            }
            return Ok(serde_json::from_str(&text)?);
        }

        let error_text = response.text().await.unwrap_or_default();

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            warn!("Rate limited by image API");
            return Err(ImagenError::RateLimited(extract_message(&error_text)));
        }

        if let Ok(error_resp) = serde_json::from_str::<ApiErrorResponse>(&error_text) {
            error!(
                status = ?error_resp.error.status,
                "Image API error: {}", error_resp.error.message
            );
            return Err(ImagenError::Api {
                message: error_resp.error.message,
                status_code: Some(status.as_u16()),
            });
        }

        Err(ImagenError::Api {
            message: if error_text.is_empty() {
                format!("Status {}", status)
            } else {
                error_text
            },
            status_code: Some(status.as_u16()),
        })
    }
}

impl Default for ImagenClient {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_URL, DEFAULT_MODEL)
    }
}

impl std::fmt::Debug for ImagenClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImagenClient")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .finish()
    }
}

#[async_trait]
impl ImageGenerator for ImagenClient {
    async fn generate_images(
        &self,
        credential: &Credential,
        request: &ImageRequest,
    ) -> Result<Vec<GeneratedImage>> {
        let response = self.predict(credential, request).await?;

        let images = response
            .predictions
            .into_iter()
            .filter_map(|prediction| match prediction.bytes_base64_encoded {
                Some(data) => {
                    let mime_type = prediction
                        .mime_type
                        .unwrap_or_else(|| request.mime_type.as_str().to_string());
                    Some(GeneratedImage::new(mime_type, data))
                }
                None => {
                    warn!(
                        reason = prediction.rai_filtered_reason.as_deref().unwrap_or("unknown"),
                        "Prediction returned without image bytes"
                    );
                    None
                }
            })
            .collect();

        Ok(images)
    }
}

fn extract_message(body: &str) -> String {
    serde_json::from_str::<ApiErrorResponse>(body)
        .map(|e| e.error.message)
        .unwrap_or_else(|_| body.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_creation() {
        let client = ImagenClient::new("http://localhost:8080/", "imagen-test");
        assert_eq!(client.base_url(), "http://localhost:8080");
        assert_eq!(client.model(), "imagen-test");
        assert_eq!(
            client.predict_url(),
            "http://localhost:8080/models/imagen-test:predict"
        );
    }

    #[test]
    fn test_default_client() {
        let client = ImagenClient::default();
        assert_eq!(client.base_url(), DEFAULT_BASE_URL);
        assert_eq!(client.model(), DEFAULT_MODEL);
    }

    #[test]
    fn test_extract_message() {
        let body = r#"{"error":{"message":"Quota exceeded","status":"RESOURCE_EXHAUSTED","code":429}}"#;
        assert_eq!(extract_message(body), "Quota exceeded");
        assert_eq!(extract_message("slow down"), "slow down");
    }
}
