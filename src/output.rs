//! Result types returned by the conversion entry points.

use crate::error::AssetError;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Download state of one image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum AssetStatus {
    /// Resolved to a local path, not yet fetched.
    Pending,
    /// Stored on disk.
    Downloaded { bytes: u64 },
    /// Fetch or write failed; the Markdown still links the intended path.
    Failed { error: AssetError },
}

/// One image referenced by the page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetRecord {
    /// Absolute URL the image is fetched from.
    pub source_url: String,
    /// File name inside the assets directory.
    pub file_name: String,
    /// Path embedded in the Markdown, relative to the Markdown file.
    pub relative_path: String,
    pub status: AssetStatus,
}

impl AssetRecord {
    pub fn is_failed(&self) -> bool {
        matches!(self.status, AssetStatus::Failed { .. })
    }
}

/// Markdown for one page before anything touches the disk.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageConversion {
    /// Post-processed Markdown document.
    pub markdown: String,
    /// Images in first-seen order, all [`AssetStatus::Pending`].
    pub assets: Vec<AssetRecord>,
}

/// Counters for a finished conversion.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConversionStats {
    pub page_bytes: usize,
    pub total_assets: usize,
    pub downloaded_assets: usize,
    pub failed_assets: usize,
    pub fetch_duration_ms: u64,
    pub assets_duration_ms: u64,
    pub total_duration_ms: u64,
}

/// Everything produced by [`crate::convert`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversionOutput {
    pub source_url: String,
    /// Where the Markdown file was written.
    pub output_path: PathBuf,
    pub markdown: String,
    pub assets: Vec<AssetRecord>,
    pub stats: ConversionStats,
}

impl ConversionOutput {
    /// Iterate over the images whose download failed.
    pub fn failed_assets(&self) -> impl Iterator<Item = &AssetRecord> {
        self.assets.iter().filter(|a| a.is_failed())
    }
}
