//! Request and response shapes for a verification attempt

use serde::{Deserialize, Serialize};

use crate::errors::{CertificateError, CertificateResult};
use crate::utils::is_blank;

pub const MESSAGE_SUCCESS: &str = "Certificate generated successfully.";
pub const MESSAGE_NOT_FOUND: &str =
    "Participant details not found. Please check the participant name and team name.";
pub const MESSAGE_PARTICIPANT_REQUIRED: &str = "Participant name is required.";
pub const MESSAGE_TEAM_REQUIRED: &str = "Team name is required.";
pub const MESSAGE_INTERNAL_FAILURE: &str =
    "Unable to generate certificate at this time. Please try again later.";

/// The two free-text values a caller claims
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationInput {
    pub participant_name: String,
    pub team_name: String,
}

impl VerificationInput {
    pub fn new<P: Into<String>, T: Into<String>>(participant_name: P, team_name: T) -> Self {
        Self {
            participant_name: participant_name.into(),
            team_name: team_name.into(),
        }
    }

    /// Both fields must be non-empty after trimming
    pub fn validate(&self) -> CertificateResult<()> {
        if is_blank(&self.participant_name) {
            return Err(CertificateError::validation(
                "participant_name",
                MESSAGE_PARTICIPANT_REQUIRED,
            ));
        }
        if is_blank(&self.team_name) {
            return Err(CertificateError::validation("team_name", MESSAGE_TEAM_REQUIRED));
        }
        Ok(())
    }
}

/// Uniform outcome returned to callers
///
/// Failures of every kind share this shape and are told apart only by
/// `message`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CertificateResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Base64-encoded certificate document
    #[serde(skip_serializing_if = "Option::is_none")]
    pub artifact: Option<String>,
}

impl CertificateResponse {
    pub fn success(artifact: String) -> Self {
        Self {
            success: true,
            message: Some(MESSAGE_SUCCESS.to_string()),
            artifact: Some(artifact),
        }
    }

    pub fn failure<M: Into<String>>(message: M) -> Self {
        Self {
            success: false,
            message: Some(message.into()),
            artifact: None,
        }
    }
}

impl From<&CertificateError> for CertificateResponse {
    fn from(error: &CertificateError) -> Self {
        match error {
            CertificateError::Validation { message, .. } => Self::failure(message.clone()),
            CertificateError::NotFound => Self::failure(MESSAGE_NOT_FOUND),
            _ => Self::failure(MESSAGE_INTERNAL_FAILURE),
        }
    }
}
