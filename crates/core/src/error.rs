//! Error types for Reposcribe operations.
//!
//! This module defines the main error type [`ReposcribeError`] which
//! represents all possible errors that can occur while fetching README
//! content, summarizing it, rendering the article, and publishing drafts.
//!
//! # Example
//!
//! ```rust
//! use reposcribe_core::{ReposcribeError, Result};
//!
//! fn require_markdown(text: &str) -> Result<&str> {
//!     if text.is_empty() {
//!         return Err(ReposcribeError::NotReadme("empty input".to_string()));
//!     }
//!     Ok(text)
//! }
//! ```

use thiserror::Error;

/// Main error type for README-to-article operations.
///
/// Parse ambiguities in the Markdown (unbalanced fences, unmatched
/// emphasis markers) are never surfaced here: the pipeline recovers from
/// them locally by treating the ambiguous span as literal text. The
/// variants below cover collaborator failures and invalid configuration.
#[derive(Error, Debug)]
pub enum ReposcribeError {
    /// HTTP request errors from reqwest.
    ///
    /// Wraps network errors, DNS failures, connection issues, and other
    /// HTTP-level problems from any collaborator call.
    #[cfg(feature = "net")]
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    /// Request timeout.
    #[error("Request timed out after {timeout} seconds")]
    Timeout { timeout: u64 },

    /// Invalid URL provided.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// No README file could be located in the repository.
    ///
    /// Returned after all branch and filename combinations have been probed.
    #[error("No README found in repository: {0}")]
    ReadmeNotFound(String),

    /// The fetched content does not look like a README.
    ///
    /// Returned for direct URLs whose body has no Markdown headings and
    /// no installation/usage wording.
    #[error("Fetched content does not look like a README: {0}")]
    NotReadme(String),

    /// The summarization API returned an error or an unusable response.
    #[error("Summarization failed: {0}")]
    Summarize(String),

    /// HTML sanitization failed.
    ///
    /// Returned when the streaming rewriter rejects the input. Individual
    /// image upload failures are not reported here; those are recovered by
    /// removing the image element.
    #[error("Failed to sanitize HTML: {0}")]
    Sanitize(String),

    /// An image could not be uploaded to the hosting platform.
    #[error("Image upload failed: {0}")]
    Upload(String),

    /// The publishing platform rejected a request.
    ///
    /// Carries the platform error message, including the actionable
    /// IP-whitelist guidance for error code 40164.
    #[error("Publishing failed: {0}")]
    Publish(String),

    /// Poster generation failed or timed out.
    #[error("Poster generation failed: {0}")]
    Poster(String),

    /// A required configuration value is missing.
    #[error("Missing configuration: {0}")]
    MissingConfig(String),

    /// File read/write errors.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for ReposcribeError.
pub type Result<T> = std::result::Result<T, ReposcribeError>;
