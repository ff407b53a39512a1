//! # DomainError
//!
//! Centralized error handling for campusnet.
//! Maps domain-specific failures to actionable error types; the API layer
//! turns each variant into exactly one HTTP status.

use thiserror::Error;

use crate::models::Analysis;

/// The primary error type for all domain and adapter operations.
#[derive(Error, Debug)]
pub enum DomainError {
    /// A path identifier did not parse (e.g., "Invalid postId format")
    #[error("{0}")]
    InvalidId(String),

    /// Validation failure (e.g., blank comment text, short username)
    #[error("{0}")]
    Validation(String),

    /// The content filter reported at least one tag.
    #[error("{message}")]
    Moderation { message: String, analysis: Analysis },

    /// No valid session accompanied the request.
    #[error("Not authenticated")]
    Unauthenticated,

    /// Login failure. Unknown email and wrong password both end up here.
    #[error("Invalid email or password")]
    InvalidCredentials,

    /// Authenticated, but not allowed to touch the resource.
    #[error("{0}")]
    Forbidden(String),

    /// Resource not found (e.g., "post not found")
    #[error("{0}")]
    NotFound(String),

    /// Resource already exists (e.g., duplicate email)
    #[error("{0}")]
    Conflict(String),

    /// A save carried a stale post version.
    #[error("post was modified concurrently")]
    VersionConflict,

    /// Infrastructure failure (e.g., DB down, filter service unreachable)
    #[error("{0}")]
    Internal(String),
}

impl DomainError {
    pub fn internal(err: impl std::fmt::Display) -> Self {
        Self::Internal(err.to_string())
    }
}

/// A specialized Result type for campusnet logic.
pub type Result<T> = std::result::Result<T, DomainError>;
