//! Progress-callback trait for page and asset events.
//!
//! Inject an [`Arc<dyn ConversionProgressCallback>`] via
//! [`crate::config::CrawlConfigBuilder::progress_callback`] to receive events
//! as the orchestrator fetches the page and downloads each image. The library
//! stays free of any terminal concerns; the `fe2md` binary renders these
//! events with a progress bar.
//!
//! # Example
//!
//! ```rust
//! use fe2md::{ConversionProgressCallback, CrawlConfig};
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct FailureCounter {
//!     failed: AtomicUsize,
//! }
//!
//! impl ConversionProgressCallback for FailureCounter {
//!     fn on_asset_error(&self, index: usize, total: usize, url: &str, error: &str) {
//!         self.failed.fetch_add(1, Ordering::SeqCst);
//!         eprintln!("image {}/{} ({}) failed: {}", index, total, url, error);
//!     }
//! }
//!
//! let counter = Arc::new(FailureCounter { failed: AtomicUsize::new(0) });
//!
//! let config = CrawlConfig::builder()
//!     .progress_callback(counter as Arc<dyn ConversionProgressCallback>)
//!     .build()
//!     .unwrap();
//! ```

use std::sync::Arc;

/// Called by the orchestrator as it works through one page.
///
/// Events arrive sequentially from a single task. The trait is still
/// `Send + Sync` so a callback can be shared with other threads (e.g. a
/// progress bar ticker). All methods default to no-ops.
pub trait ConversionProgressCallback: Send + Sync {
    /// Called once the page HTML has been fetched.
    ///
    /// # Arguments
    /// * `url`  : the page URL
    /// * `bytes`: size of the response body
    fn on_page_fetched(&self, url: &str, bytes: usize) {
        let _ = (url, bytes);
    }

    /// Called after conversion, before any image is downloaded.
    ///
    /// # Arguments
    /// * `total_assets`: number of distinct images to download
    fn on_assets_start(&self, total_assets: usize) {
        let _ = total_assets;
    }

    /// Called when an image has been written to disk.
    ///
    /// # Arguments
    /// * `index`: 1-indexed position in traversal order
    /// * `total`: number of distinct images
    /// * `path` : relative path of the stored file
    /// * `bytes`: size of the stored file
    fn on_asset_complete(&self, index: usize, total: usize, path: &str, bytes: u64) {
        let _ = (index, total, path, bytes);
    }

    /// Called when an image could not be fetched or stored.
    ///
    /// # Arguments
    /// * `index`: 1-indexed position in traversal order
    /// * `total`: number of distinct images
    /// * `url`  : source URL of the image
    /// * `error`: human-readable error description
    fn on_asset_error(&self, index: usize, total: usize, url: &str, error: &str) {
        let _ = (index, total, url, error);
    }

    /// Called once the Markdown file has been written.
    ///
    /// # Arguments
    /// * `path`         : path of the Markdown file
    /// * `failed_assets`: images whose download failed
    fn on_conversion_complete(&self, path: &str, failed_assets: usize) {
        let _ = (path, failed_assets);
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl ConversionProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::CrawlConfig`].
pub type ProgressCallback = Arc<dyn ConversionProgressCallback>;
