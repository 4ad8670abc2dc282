//! Error taxonomy for user-triggered actions

use thiserror::Error;

use crate::transport::TransportError;

/// Fallback message when the analysis backend reports failure without a reason
pub const UNKNOWN_ANALYSIS_ERROR: &str = "Unknown error occurred";

/// Everything an action can fail with
#[derive(Debug, Error)]
pub enum FloodError {
    /// Empty or malformed user input, caught before any request
    #[error("invalid input: {0}")]
    InputValidation(String),

    #[error(transparent)]
    Transport(#[from] TransportError),

    /// Geocoding provider answered with a status other than "OK"
    #[error("Geocoding failed: {0}")]
    GeocodeStatus(String),

    /// Analysis backend answered `success: false`
    #[error("{0}")]
    Analysis(String),

    #[error("malformed response: {0}")]
    MalformedResponse(String),
}

/// Coarse classification used for user-facing notifications
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    Validation,
    Transport,
    Application,
}

impl FloodError {
    pub fn class(&self) -> ErrorClass {
        match self {
            FloodError::InputValidation(_) => ErrorClass::Validation,
            FloodError::Transport(_) => ErrorClass::Transport,
            FloodError::GeocodeStatus(_)
            | FloodError::Analysis(_)
            | FloodError::MalformedResponse(_) => ErrorClass::Application,
        }
    }

    /// Short machine-readable code, used as a metrics label
    pub fn code(&self) -> &'static str {
        match self {
            FloodError::InputValidation(_) => "input_validation",
            FloodError::Transport(_) => "transport",
            FloodError::GeocodeStatus(_) => "geocode_status",
            FloodError::Analysis(_) => "analysis",
            FloodError::MalformedResponse(_) => "malformed_response",
        }
    }

    pub(crate) fn malformed(e: impl std::fmt::Display) -> Self {
        FloodError::MalformedResponse(e.to_string())
    }
}
