pub mod certificate;
pub mod roster;

pub use certificate::{
    CertificateResponse, MESSAGE_INTERNAL_FAILURE, MESSAGE_NOT_FOUND, MESSAGE_PARTICIPANT_REQUIRED,
    MESSAGE_SUCCESS, MESSAGE_TEAM_REQUIRED, VerificationInput,
};
pub use roster::{RosterRecord, RosterSnapshot};
