//! Image generation module.

mod provider;
pub mod providers;
mod types;
pub mod validate;

pub use provider::ImageService;
pub use types::{
    GenerationForm, GenerationRequest, GenerationResult, ImageFormat, Model, MAX_STEPS, MIN_STEPS,
    SUPPORTED_DIMENSIONS,
};
pub use validate::{validate, ValidationRules};
