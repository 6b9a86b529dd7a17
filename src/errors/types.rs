//! Error type definitions for the certificate verifier
//!
//! Each layer owns its own error enum. `CertificateError` sits on top and is
//! the only type the request boundary has to deal with.

use thiserror::Error;

/// Top-level error for a verification attempt
///
/// Every variant is eventually folded into a `{success: false, message}`
/// response by the certificate service; nothing here reaches the caller raw.
#[derive(Error, Debug, Clone)]
pub enum CertificateError {
    /// A required input was missing or blank
    #[error("Validation error: {field} - {message}")]
    Validation { field: String, message: String },

    /// No roster record matched the normalized input pair
    #[error("Participant not found in roster")]
    NotFound,

    /// Roster source could not be read or parsed
    #[error("Roster source error: {0}")]
    DataSource(#[from] RosterError),

    /// Template or font asset could not be read from disk
    #[error("Template asset error: {asset} - {message}")]
    Template { asset: String, message: String },

    /// The rendering backend failed
    #[error("Render error: {0}")]
    Render(#[from] RenderError),

    /// Text could not be fitted and the overflow policy forbids overflowing
    #[error(
        "Layout error: '{text}' is {width:.1}pt wide at the {font_size}pt floor \
         (limit {max_width:.1}pt)"
    )]
    Layout {
        text: String,
        font_size: u32,
        width: f32,
        max_width: f32,
    },
}

/// Errors raised while loading the roster from its external source
///
/// Cloneable because a single failed reload is shared by every caller
/// waiting on it.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RosterError {
    /// The source file could not be read
    #[error("Failed to read roster source {path}: {message}")]
    Io { path: String, message: String },

    /// The workbook could not be parsed
    #[error("Failed to parse roster source {path}: {message}")]
    Parse { path: String, message: String },

    /// The workbook contains no worksheets
    #[error("Roster source {path} has no worksheets")]
    NoWorksheet { path: String },

    /// A required column is absent from the header row
    #[error("Roster source is missing required column '{column}'")]
    MissingColumn { column: String },

    /// The background reload task died before producing a result
    #[error("Roster reload task failed: {message}")]
    ReloadAborted { message: String },
}

/// Errors raised by a rendering backend
#[derive(Error, Debug, Clone)]
pub enum RenderError {
    /// The template document could not be loaded
    #[error("Invalid template: {message}")]
    InvalidTemplate { message: String },

    /// The font program could not be parsed
    #[error("Invalid font: {message}")]
    InvalidFont { message: String },

    /// The document could not be edited or serialized
    #[error("Document error: {message}")]
    Document { message: String },

    /// The blocking render task panicked or was cancelled
    #[error("Render task failed: {message}")]
    TaskFailed { message: String },
}

/// Convenience methods for creating common error types
impl CertificateError {
    /// Create a validation error for a named input field
    pub fn validation<F: Into<String>, M: Into<String>>(field: F, message: M) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create a template asset error
    pub fn template<A: Into<String>, M: Into<String>>(asset: A, message: M) -> Self {
        Self::Template {
            asset: asset.into(),
            message: message.into(),
        }
    }

    /// Whether this error is an expected rejection rather than an internal failure
    pub fn is_rejection(&self) -> bool {
        matches!(self, Self::Validation { .. } | Self::NotFound)
    }
}

impl RosterError {
    pub fn io<P: Into<String>, M: ToString>(path: P, message: M) -> Self {
        Self::Io {
            path: path.into(),
            message: message.to_string(),
        }
    }

    pub fn parse<P: Into<String>, M: ToString>(path: P, message: M) -> Self {
        Self::Parse {
            path: path.into(),
            message: message.to_string(),
        }
    }
}

impl RenderError {
    pub fn document<M: ToString>(message: M) -> Self {
        Self::Document {
            message: message.to_string(),
        }
    }
}

impl From<lopdf::Error> for RenderError {
    fn from(error: lopdf::Error) -> Self {
        Self::document(error)
    }
}
