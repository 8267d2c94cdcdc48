//! Configuration types for page-to-Markdown conversion.
//!
//! All conversion behaviour is controlled through [`CrawlConfig`], built via
//! its [`CrawlConfigBuilder`]. Every knob lives in one struct so a run can be
//! logged and reproduced from its configuration alone.

use crate::error::Fe2MdError;
use crate::progress::ProgressCallback;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// CSS selector of the question container on exam-question pages.
pub const DEFAULT_ROOT_SELECTOR: &str = "div.main.kako";

/// Class that marks a fill-in-blank span.
pub const DEFAULT_BLANK_CLASS: &str = "bb";

/// Configuration for one page conversion.
///
/// Built via [`CrawlConfig::builder()`] or using [`CrawlConfig::default()`].
///
/// # Example
/// ```rust
/// use fe2md::CrawlConfig;
///
/// let config = CrawlConfig::builder()
///     .output_dir("out")
///     .timeout_secs(20)
///     .build()
///     .unwrap();
/// assert_eq!(config.assets_dir, "assets");
/// ```
#[derive(Clone)]
pub struct CrawlConfig {
    /// Directory receiving the Markdown file and the assets directory. Default: `.`.
    pub output_dir: PathBuf,

    /// Name of the assets subdirectory, also used in relative links. Default: `assets`.
    pub assets_dir: String,

    /// Markdown file stem. If None, derived from the page URL.
    pub file_name: Option<String>,

    /// CSS selector locating the question container. Default: `div.main.kako`.
    pub root_selector: String,

    /// Class marking fill-in-blank spans. Default: `bb`.
    pub blank_class: String,

    /// Per-request timeout in seconds, for the page and every image. Default: 10.
    pub timeout_secs: u64,

    /// Prefix image file names with the page prefix (e.g. `30_haru_fig1.png`). Default: false.
    ///
    /// Useful when several pages share one output directory and their images
    /// carry generic names.
    pub prefix_assets: bool,

    /// How the root container is walked. Default: [`LayoutMode::Question`].
    pub layout: LayoutMode,

    /// User-Agent header sent with every request.
    pub user_agent: String,

    /// Optional observer for fetch/asset events.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for CrawlConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("."),
            assets_dir: "assets".to_string(),
            file_name: None,
            root_selector: DEFAULT_ROOT_SELECTOR.to_string(),
            blank_class: DEFAULT_BLANK_CLASS.to_string(),
            timeout_secs: 10,
            prefix_assets: false,
            layout: LayoutMode::default(),
            user_agent: concat!("fe2md/", env!("CARGO_PKG_VERSION")).to_string(),
            progress_callback: None,
        }
    }
}

impl fmt::Debug for CrawlConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CrawlConfig")
            .field("output_dir", &self.output_dir)
            .field("assets_dir", &self.assets_dir)
            .field("file_name", &self.file_name)
            .field("root_selector", &self.root_selector)
            .field("blank_class", &self.blank_class)
            .field("timeout_secs", &self.timeout_secs)
            .field("prefix_assets", &self.prefix_assets)
            .field("layout", &self.layout)
            .field("user_agent", &self.user_agent)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<dyn ConversionProgressCallback>"),
            )
            .finish()
    }
}

impl CrawlConfig {
    /// Create a new builder for `CrawlConfig`.
    pub fn builder() -> CrawlConfigBuilder {
        CrawlConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`CrawlConfig`].
#[derive(Debug)]
pub struct CrawlConfigBuilder {
    config: CrawlConfig,
}

impl CrawlConfigBuilder {
    pub fn output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.output_dir = dir.into();
        self
    }

    pub fn assets_dir(mut self, name: impl Into<String>) -> Self {
        self.config.assets_dir = name.into();
        self
    }

    pub fn file_name(mut self, stem: impl Into<String>) -> Self {
        self.config.file_name = Some(stem.into());
        self
    }

    pub fn root_selector(mut self, selector: impl Into<String>) -> Self {
        self.config.root_selector = selector.into();
        self
    }

    pub fn blank_class(mut self, class: impl Into<String>) -> Self {
        self.config.blank_class = class.into();
        self
    }

    pub fn timeout_secs(mut self, secs: u64) -> Self {
        self.config.timeout_secs = secs;
        self
    }

    pub fn prefix_assets(mut self, v: bool) -> Self {
        self.config.prefix_assets = v;
        self
    }

    pub fn layout(mut self, layout: LayoutMode) -> Self {
        self.config.layout = layout;
        self
    }

    pub fn user_agent(mut self, ua: impl Into<String>) -> Self {
        self.config.user_agent = ua.into();
        self
    }

    /// Register a progress observer.
    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<CrawlConfig, Fe2MdError> {
        let c = &self.config;
        if c.timeout_secs == 0 {
            return Err(Fe2MdError::InvalidConfig(
                "Timeout must be ≥ 1 second".into(),
            ));
        }
        if !is_plain_component(&c.assets_dir) {
            return Err(Fe2MdError::InvalidConfig(format!(
                "Assets directory must be a single path component, got '{}'",
                c.assets_dir
            )));
        }
        if let Some(ref stem) = c.file_name {
            if !is_plain_component(stem) {
                return Err(Fe2MdError::InvalidConfig(format!(
                    "File name must be a single path component, got '{}'",
                    stem
                )));
            }
        }
        if c.blank_class.trim().is_empty() {
            return Err(Fe2MdError::InvalidConfig(
                "Blank class must not be empty".into(),
            ));
        }
        scraper::Selector::parse(&c.root_selector).map_err(|e| Fe2MdError::InvalidSelector {
            selector: c.root_selector.clone(),
            detail: e.to_string(),
        })?;
        Ok(self.config)
    }
}

fn is_plain_component(s: &str) -> bool {
    !s.is_empty() && s != "." && s != ".." && !s.contains(['/', '\\'])
}

// ── Enums ────────────────────────────────────────────────────────────────

/// How the children of the question container are turned into Markdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum LayoutMode {
    /// Keep only question sections: headings, question text, answer groups
    /// and figures; skip navigation and answer/explanation blocks. (default)
    #[default]
    Question,
    /// Convert the whole container generically.
    Whole,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate() {
        let config = CrawlConfig::builder().build().unwrap();
        assert_eq!(config.root_selector, "div.main.kako");
        assert_eq!(config.timeout_secs, 10);
        assert_eq!(config.layout, LayoutMode::Question);
        assert!(!config.prefix_assets);
    }

    #[test]
    fn zero_timeout_rejected() {
        let err = CrawlConfig::builder().timeout_secs(0).build().unwrap_err();
        assert!(matches!(err, Fe2MdError::InvalidConfig(_)));
    }

    #[test]
    fn nested_assets_dir_rejected() {
        let err = CrawlConfig::builder()
            .assets_dir("img/assets")
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("img/assets"));
    }

    #[test]
    fn bad_selector_rejected() {
        let err = CrawlConfig::builder()
            .root_selector("div[")
            .build()
            .unwrap_err();
        assert!(matches!(err, Fe2MdError::InvalidSelector { .. }));
    }

    #[test]
    fn debug_hides_callback() {
        let s = format!("{:?}", CrawlConfig::default());
        assert!(s.contains("CrawlConfig"));
        assert!(s.contains("progress_callback: None"));
    }
}
