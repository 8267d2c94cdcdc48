//! Error types for the fe2md library.
//!
//! Two distinct error types reflect two distinct failure modes:
//!
//! * [`Fe2MdError`]: **Fatal**: the page cannot be converted at all
//!   (unreachable URL, question container missing, output directory not
//!   writable). Returned as `Err(Fe2MdError)` from the top-level `convert*`
//!   functions, and nothing is written.
//!
//! * [`AssetError`]: **Non-fatal**: a single image could not be named,
//!   fetched or stored. Kept inside [`crate::output::AssetRecord`] so the
//!   Markdown still references the intended path and the caller can report
//!   each failure separately.

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the fe2md library.
///
/// Per-image failures use [`AssetError`] and never abort a conversion.
#[derive(Debug, Error)]
pub enum Fe2MdError {
    // ── Network errors ────────────────────────────────────────────────────
    /// The input string is not an absolute HTTP/HTTPS URL.
    #[error("Invalid URL '{input}': expected an absolute http:// or https:// URL")]
    InvalidUrl { input: String },

    /// The request could not be completed (DNS, connection, body read).
    #[error("Failed to download '{url}': {reason}\nCheck your internet connection.")]
    DownloadFailed { url: String, reason: String },

    /// The request exceeded the configured timeout.
    #[error("Download timed out after {secs}s for '{url}'\nIncrease --timeout.")]
    DownloadTimeout { url: String, secs: u64 },

    /// The server answered with a non-success status.
    #[error("HTTP {status} while fetching '{url}'")]
    HttpStatus { url: String, status: u16 },

    // ── Parse errors ──────────────────────────────────────────────────────
    /// The question container was not found in the fetched page.
    #[error("Could not find the question container ({selector}) in '{url}'")]
    RootNotFound { url: String, selector: String },

    /// The configured CSS selector does not parse.
    #[error("Invalid CSS selector '{selector}': {detail}")]
    InvalidSelector { selector: String, detail: String },

    // ── Write errors ──────────────────────────────────────────────────────
    /// Could not create the output (or assets) directory.
    #[error("Failed to create output directory '{path}': {source}")]
    OutputDirFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Could not create or write the output Markdown file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Fe2MdError {
    /// `true` for failures of the network layer (page fetch).
    pub fn is_network(&self) -> bool {
        matches!(
            self,
            Fe2MdError::DownloadFailed { .. }
                | Fe2MdError::DownloadTimeout { .. }
                | Fe2MdError::HttpStatus { .. }
        )
    }
}

/// A non-fatal error for a single image.
///
/// Stored in [`crate::output::AssetStatus::Failed`] and logged as a warning.
/// The Markdown keeps its link to the intended local path.
#[derive(Debug, Clone, PartialEq, Eq, Error, serde::Serialize, serde::Deserialize)]
pub enum AssetError {
    /// The image URL is empty, so not even a fallback name can be derived.
    #[error("Image source '{source_url}' cannot be turned into a file name")]
    Naming { source_url: String },

    /// Fetching the image failed (network error, timeout or HTTP status).
    #[error("Image '{url}': download failed: {reason}")]
    DownloadFailed { url: String, reason: String },

    /// The image was fetched but could not be stored.
    #[error("Image '{url}': could not write '{path}': {detail}")]
    WriteFailed {
        url: String,
        path: String,
        detail: String,
    },
}
