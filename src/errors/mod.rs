//! Centralized error handling for the certificate verifier
//!
//! # Error Categories
//!
//! - **Roster Errors**: the external roster source is unreadable, unparsable
//!   or missing required columns
//! - **Render Errors**: template/font loading and document serialization
//! - **Certificate Errors**: the request-level taxonomy (validation, not
//!   found, data source, template, render, layout)

pub mod types;

pub use types::*;

/// Convenience type alias for request-level results
pub type CertificateResult<T> = Result<T, CertificateError>;

/// Convenience type alias for roster source results
pub type RosterResult<T> = Result<T, RosterError>;

/// Convenience type alias for rendering backend results
pub type RenderResult<T> = Result<T, RenderError>;
