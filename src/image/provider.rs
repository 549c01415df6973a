//! Image service trait.

use crate::error::Result;
use crate::image::types::GenerationRequest;
use async_trait::async_trait;

/// A remote service that turns a validated request into an image URL.
#[async_trait]
pub trait ImageService: Send + Sync {
    /// Generates one image and returns its URL. Single attempt, no retries.
    async fn generate(&self, request: &GenerationRequest, credential: &str) -> Result<String>;

    /// Fetches the bytes behind an image URL.
    async fn download(&self, url: &str) -> Result<Vec<u8>>;

    /// Returns the name of this service for display.
    fn name(&self) -> &str;
}
