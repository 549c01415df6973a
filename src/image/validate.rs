//! Form validation.

use crate::error::{Result, StudioError};
use crate::image::types::{
    GenerationForm, GenerationRequest, MAX_STEPS, MIN_STEPS, SUPPORTED_DIMENSIONS,
};

/// Which optional checks the validator applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidationRules {
    /// Reject steps outside `MIN_STEPS..=MAX_STEPS`.
    pub enforce_steps_range: bool,
}

impl Default for ValidationRules {
    fn default() -> Self {
        Self {
            enforce_steps_range: true,
        }
    }
}

/// Turns raw form state into a request, or explains why it cannot.
///
/// Checks run in a fixed order: credential, prompt, steps, dimensions.
pub fn validate(
    credential: &str,
    form: &GenerationForm,
    rules: ValidationRules,
) -> Result<GenerationRequest> {
    if credential.trim().is_empty() {
        return Err(StudioError::MissingCredential);
    }

    let prompt = form.prompt.trim();
    if prompt.is_empty() {
        return Err(StudioError::EmptyPrompt);
    }

    if rules.enforce_steps_range && !(MIN_STEPS..=MAX_STEPS).contains(&form.steps) {
        return Err(StudioError::StepsOutOfRange {
            steps: form.steps,
            min: MIN_STEPS,
            max: MAX_STEPS,
        });
    }

    if !SUPPORTED_DIMENSIONS.contains(&form.width) || !SUPPORTED_DIMENSIONS.contains(&form.height)
    {
        return Err(StudioError::UnsupportedDimension {
            width: form.width,
            height: form.height,
        });
    }

    Ok(GenerationRequest::new(
        prompt.to_string(),
        form.width,
        form.height,
        form.steps,
        form.model,
    ))
}
