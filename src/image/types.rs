//! Core types for image generation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Edge lengths, in pixels, the service accepts for width and height.
pub const SUPPORTED_DIMENSIONS: [u32; 6] = [256, 512, 768, 1024, 1280, 1440];

/// Inclusive bounds for diffusion steps.
pub const MIN_STEPS: u32 = 1;
/// Inclusive upper bound for diffusion steps.
pub const MAX_STEPS: u32 = 4;

/// Image models served by the Together.AI endpoint.
///
/// Serializes as its API identifier ([`Model::as_str`]).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Model {
    /// FLUX.1 [schnell], free tier.
    #[default]
    FluxSchnellFree,
    /// FLUX.1 [schnell], paid tier.
    FluxSchnell,
    /// FLUX.1 [dev].
    FluxDev,
}

impl Model {
    /// All models, in display order.
    pub const ALL: [Model; 3] = [Self::FluxSchnellFree, Self::FluxSchnell, Self::FluxDev];

    /// Returns the API model identifier string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::FluxSchnellFree => "black-forest-labs/FLUX.1-schnell-Free",
            Self::FluxSchnell => "black-forest-labs/FLUX.1-schnell",
            Self::FluxDev => "black-forest-labs/FLUX.1-dev",
        }
    }

    /// Human-readable name.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::FluxSchnellFree => "FLUX.1 Schnell (Free)",
            Self::FluxSchnell => "FLUX.1 Schnell",
            Self::FluxDev => "FLUX.1 Dev",
        }
    }

    /// Parses an API identifier back into a model.
    pub fn from_id(id: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|m| m.as_str() == id)
    }
}

impl std::fmt::Display for Model {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Model {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Model {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let id = String::deserialize(deserializer)?;
        Self::from_id(&id)
            .ok_or_else(|| serde::de::Error::custom(format!("unknown model: {}", id)))
    }
}

/// Raw form state as entered by the user, before validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationForm {
    /// Text description of the image, untrimmed.
    pub prompt: String,
    /// Requested width in pixels.
    pub width: u32,
    /// Requested height in pixels.
    pub height: u32,
    /// Requested diffusion steps.
    pub steps: u32,
    /// Selected model.
    pub model: Model,
}

impl GenerationForm {
    /// Creates a form with the given prompt and default parameters.
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            width: 1024,
            height: 1024,
            steps: MAX_STEPS,
            model: Model::default(),
        }
    }

    /// Sets the desired dimensions.
    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    /// Sets the number of diffusion steps.
    pub fn with_steps(mut self, steps: u32) -> Self {
        self.steps = steps;
        self
    }

    /// Sets the model.
    pub fn with_model(mut self, model: Model) -> Self {
        self.model = model;
        self
    }
}

/// A validated request to generate an image.
///
/// Only [`crate::image::validate`] constructs these, so every instance has a
/// non-empty prompt and supported dimensions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GenerationRequest {
    prompt: String,
    width: u32,
    height: u32,
    steps: u32,
    model: Model,
}

impl GenerationRequest {
    pub(crate) fn new(prompt: String, width: u32, height: u32, steps: u32, model: Model) -> Self {
        Self {
            prompt,
            width,
            height,
            steps,
            model,
        }
    }

    /// The trimmed, non-empty prompt.
    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    /// Width in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height in pixels.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Diffusion steps.
    pub fn steps(&self) -> u32 {
        self.steps
    }

    /// Model to run.
    pub fn model(&self) -> Model {
        self.model
    }
}

/// A successful generation, as shown to the user and kept in the gallery.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationResult {
    /// URL of the generated image, as returned by the service.
    pub image_url: String,
    /// Prompt that was sent.
    pub prompt: String,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Diffusion steps.
    pub steps: u32,
    /// Model that produced the image.
    pub model: Model,
    /// When the result was received.
    pub timestamp: DateTime<Utc>,
}

impl GenerationResult {
    /// Builds a result from the request that produced it.
    pub fn new(image_url: impl Into<String>, request: &GenerationRequest) -> Self {
        Self::at(image_url, request, Utc::now())
    }

    /// Builds a result with an explicit timestamp.
    pub fn at(
        image_url: impl Into<String>,
        request: &GenerationRequest,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            image_url: image_url.into(),
            prompt: request.prompt.clone(),
            width: request.width,
            height: request.height,
            steps: request.steps,
            model: request.model,
            timestamp,
        }
    }

    /// Formats the dimensions for display (e.g., "512 × 768").
    pub fn dimensions(&self) -> String {
        format!("{} × {}", self.width, self.height)
    }
}

/// Image formats recognised when saving downloaded bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ImageFormat {
    /// PNG, also the fallback when the bytes are unrecognised.
    #[default]
    Png,
    /// JPEG.
    Jpeg,
    /// WebP.
    WebP,
}

impl ImageFormat {
    /// Returns the file extension for this format.
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpeg => "jpg",
            Self::WebP => "webp",
        }
    }

    /// Detects image format from magic bytes.
    pub fn from_magic_bytes(data: &[u8]) -> Option<Self> {
        if data.starts_with(&[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A]) {
            return Some(Self::Png);
        }
        if data.starts_with(&[0xFF, 0xD8, 0xFF]) {
            return Some(Self::Jpeg);
        }
        if data.len() >= 12 && data.starts_with(b"RIFF") && &data[8..12] == b"WEBP" {
            return Some(Self::WebP);
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_model_serializes_as_api_id() {
        let json = serde_json::to_string(&Model::FluxSchnellFree).unwrap();
        assert_eq!(json, "\"black-forest-labs/FLUX.1-schnell-Free\"");

        let model: Model = serde_json::from_str("\"black-forest-labs/FLUX.1-dev\"").unwrap();
        assert_eq!(model, Model::FluxDev);
    }

    #[test]
    fn test_model_from_id() {
        for model in Model::ALL {
            assert_eq!(Model::from_id(model.as_str()), Some(model));
        }
        assert_eq!(Model::from_id("stability/sdxl"), None);
    }

    #[test]
    fn test_unknown_model_id_rejected() {
        let err = serde_json::from_str::<Model>("\"stability/sdxl\"").unwrap_err();
        assert!(err.to_string().contains("unknown model: stability/sdxl"));
    }

    #[test]
    fn test_result_echoes_request() {
        let request =
            GenerationRequest::new("a cat".into(), 512, 768, 4, Model::FluxSchnellFree);
        let result = GenerationResult::new("https://x/img.png", &request);

        assert_eq!(result.image_url, "https://x/img.png");
        assert_eq!(result.prompt, "a cat");
        assert_eq!(result.width, 512);
        assert_eq!(result.height, 768);
        assert_eq!(result.steps, 4);
        assert_eq!(result.dimensions(), "512 × 768");
    }

    #[test]
    fn test_result_uses_camel_case_keys() {
        let request = GenerationRequest::new("a cat".into(), 512, 512, 2, Model::FluxSchnell);
        let result = GenerationResult::new("https://x/img.png", &request);
        let json = serde_json::to_value(&result).unwrap();

        assert_eq!(json["imageUrl"], "https://x/img.png");
        assert_eq!(json["model"], "black-forest-labs/FLUX.1-schnell");
        assert!(json.get("image_url").is_none());
        assert!(json["timestamp"].is_string());
    }

    #[test]
    fn test_format_from_magic_bytes() {
        let png = [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0, 0];
        let jpeg = [0xFF, 0xD8, 0xFF, 0xE0];
        let webp = *b"RIFF\x00\x00\x00\x00WEBP";

        assert_eq!(ImageFormat::from_magic_bytes(&png), Some(ImageFormat::Png));
        assert_eq!(ImageFormat::from_magic_bytes(&jpeg), Some(ImageFormat::Jpeg));
        assert_eq!(ImageFormat::from_magic_bytes(&webp), Some(ImageFormat::WebP));
        assert_eq!(ImageFormat::from_magic_bytes(b"GIF89a"), None);
    }
}
