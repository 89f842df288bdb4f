use async_trait::async_trait;
use buildcast_core::{Credential, GeneratedImage};

use crate::error::Result;
use crate::types::ImageRequest;

/// Anything that can turn a prompt into images.
///
/// The credential is supplied on every call so implementations never have to
/// keep a key between requests.
#[async_trait]
pub trait ImageGenerator: Send + Sync {
    /// Returns zero or more images. An empty vector is a valid response here;
    /// callers decide whether that counts as a failure.
    async fn generate_images(
        &self,
        credential: &Credential,
        request: &ImageRequest,
    ) -> Result<Vec<GeneratedImage>>;
}

#[async_trait]
impl<'a, T: ImageGenerator + ?Sized> ImageGenerator for &'a T {
    async fn generate_images(
        &self,
        credential: &Credential,
        request: &ImageRequest,
    ) -> Result<Vec<GeneratedImage>> {
        (**self).generate_images(credential, request).await
    }
}

#[async_trait]
impl<T: ImageGenerator + ?Sized> ImageGenerator for std::sync::Arc<T> {
    async fn generate_images(
        &self,
        credential: &Credential,
        request: &ImageRequest,
    ) -> Result<Vec<GeneratedImage>> {
        (**self).generate_images(credential, request).await
    }
}
