//! Error types for the podfic importer.
//!
//! Library crates use [`PodficError`] via `thiserror`.
//! The CLI wraps this with `color-eyre` for rich diagnostics, and the import
//! pipeline folds every variant into an [`ImportResult`](crate::ImportResult).

use std::path::PathBuf;

/// Guidance shown when a work is unrevealed, a draft, or otherwise hidden.
pub const ACCESS_ERROR_MESSAGE: &str = "The selected work appears to be unrevealed or a draft, \
     please contact the work author to get permission to view the work then try again.";

/// Shown when the form was filled but some warnings or categories had no match.
pub const PARTIAL_COMPLETION_MESSAGE: &str = "Warning: some data could not be imported, \
     the most likely reason is that you set your AO3 preferences to hide warnings or tags";

/// Prefix for failures nobody anticipated.
pub const UNHANDLED_ERROR_PREFIX: &str =
    "Unhandled error while importing metadata and filling in the form";

/// Top-level error type for all import operations.
#[derive(Debug, thiserror::Error)]
pub enum PodficError {
    /// Configuration loading or validation error.
    #[error("config error: {message}")]
    Config { message: String },

    /// The work URL could not be parsed.
    #[error("invalid URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    /// Transport failure while fetching the work.
    #[error("Failed to fetch the work! {0}")]
    Network(String),

    /// The work page answered with a non-success status.
    #[error("Failed to fetch the work! Error: {status} ({url})")]
    HttpStatus { status: u16, url: String },

    /// The work is unrevealed, a draft, or restricted to other users.
    #[error("{}", ACCESS_ERROR_MESSAGE)]
    AccessDenied,

    /// An accepted work page lacks a region every work page has.
    #[error("extraction error: {message}")]
    Extraction { message: String },

    /// A select field has no option for the imported value.
    #[error("no {field} option matches '{value}'")]
    UnmappedField { field: String, value: String },

    /// The form was filled, but some checkbox values were skipped.
    #[error("{}", PARTIAL_COMPLETION_MESSAGE)]
    PartialCompletion { skipped: Vec<String> },

    /// The destination form is missing a field the mapper writes to.
    #[error("form error: {message}")]
    Form { message: String },

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Anything unexpected, with a diagnostic string.
    #[error("{}: {}", UNHANDLED_ERROR_PREFIX, .0)]
    Unhandled(String),
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, PodficError>;

impl PodficError {
    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Create an extraction error from any displayable message.
    pub fn extraction(msg: impl Into<String>) -> Self {
        Self::Extraction {
            message: msg.into(),
        }
    }

    /// Create a form error from any displayable message.
    pub fn form(msg: impl Into<String>) -> Self {
        Self::Form {
            message: msg.into(),
        }
    }

    /// Create an invalid-URL error.
    pub fn invalid_url(url: impl Into<String>, reason: impl ToString) -> Self {
        Self::InvalidUrl {
            url: url.into(),
            reason: reason.to_string(),
        }
    }

    /// Wrap a `std::io::Error` with a path for context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Whether this is an expected failure of the import pipeline, as opposed
    /// to an environment or programming problem.
    pub fn is_anticipated(&self) -> bool {
        matches!(
            self,
            Self::InvalidUrl { .. }
                | Self::Network(_)
                | Self::HttpStatus { .. }
                | Self::AccessDenied
                | Self::Extraction { .. }
                | Self::UnmappedField { .. }
                | Self::PartialCompletion { .. }
        )
    }
}
