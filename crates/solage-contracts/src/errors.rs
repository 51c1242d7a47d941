//! Failure taxonomy shared by the engine and its callers.

use thiserror::Error;

/// Everything the generation pipeline can report. Stored by value inside
/// partial results, hence `Clone`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GenerationError {
    #[error("invalid selection: {0}")]
    InvalidSelection(String),

    #[error("generative service unavailable: {0}")]
    ServiceUnavailable(String),

    #[error("malformed response: {0}")]
    MalformedResponse(String),

    #[error("image generation failed: {0}")]
    ImageGenerationFailed(String),

    #[error("composition unavailable: {0}")]
    CompositionUnavailable(String),
}

impl GenerationError {
    pub fn kind(&self) -> &'static str {
        match self {
            GenerationError::InvalidSelection(_) => "invalid_selection",
            GenerationError::ServiceUnavailable(_) => "service_unavailable",
            GenerationError::MalformedResponse(_) => "malformed_response",
            GenerationError::ImageGenerationFailed(_) => "image_generation_failed",
            GenerationError::CompositionUnavailable(_) => "composition_unavailable",
        }
    }

    /// Visual-only failures degrade a result instead of failing it.
    pub fn is_partial(&self) -> bool {
        matches!(
            self,
            GenerationError::ImageGenerationFailed(_) | GenerationError::CompositionUnavailable(_)
        )
    }

    pub fn user_message(&self) -> &'static str {
        match self {
            GenerationError::InvalidSelection(_) => {
                "Some choices are missing. Go back and complete every step."
            }
            GenerationError::ServiceUnavailable(_) => {
                "The studio could not reach the generation service. Try again."
            }
            GenerationError::MalformedResponse(_) => "The generation went wrong. Try again.",
            GenerationError::ImageGenerationFailed(_) => {
                "The text is ready but the background could not be created."
            }
            GenerationError::CompositionUnavailable(_) => "The visual is unavailable for this post.",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CameraError {
    #[error("camera permission denied: {0}")]
    PermissionDenied(String),

    #[error("camera unavailable: {0}")]
    DeviceUnavailable(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WizardError {
    #[error("'{action}' is not available at step {step}")]
    WrongStep {
        action: &'static str,
        step: &'static str,
    },

    #[error("unknown {kind} '{value}'")]
    UnknownOption { kind: &'static str, value: String },

    #[error("generation blocked: {0}")]
    Blocked(String),

    #[error("a camera stream is already open")]
    CameraBusy,

    #[error("no camera stream is open")]
    CameraNotActive,

    #[error("the result step is final; start a new campaign instead")]
    Locked,

    #[error(transparent)]
    Camera(#[from] CameraError),

    #[error(transparent)]
    Generation(#[from] GenerationError),
}
