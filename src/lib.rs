//! # fe2md
//!
//! Convert a single exam-question web page into a Markdown file, with every
//! referenced image downloaded next to it.
//!
//! Question pages carry more than the question: breadcrumbs, answer buttons,
//! explanations, navigation. This crate locates the question container, keeps
//! only the question sections, and maps the markup onto Markdown with a few
//! exam-specific conventions: fill-in blanks become padded underlines, kana
//! and circled-number list markers are preserved, and figures are centred on
//! a white background so they stay legible in dark themes.
//!
//! ## Pipeline Overview
//!
//! ```text
//! URL
//!  │
//!  ├─ 1. Fetch     GET with timeout, decode charset
//!  ├─ 2. Parse     locate the question root (CSS selector)
//!  ├─ 3. Layout    keep question sections, drop navigation/answers
//!  ├─ 4. Convert   recursive node → Markdown, images → assets/
//!  ├─ 5. Polish    whitespace post-processing
//!  └─ 6. Output    download images, atomic write of {name}.md
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use fe2md::{convert, CrawlConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = CrawlConfig::builder().output_dir("out").build()?;
//!     let output = convert("https://www.fe-siken.com/kakomon/30_haru/pm04.html", &config).await?;
//!     println!("wrote {}", output.output_path.display());
//!     for asset in output.failed_assets() {
//!         eprintln!("missing image: {}", asset.source_url);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `fe2md` binary (clap + anyhow + tracing-subscriber + indicatif) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! fe2md = { version = "0.1", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod convert;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod progress;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{CrawlConfig, CrawlConfigBuilder, LayoutMode};
pub use convert::{convert, convert_html, convert_sync};
pub use error::{AssetError, Fe2MdError};
pub use output::{AssetRecord, AssetStatus, ConversionOutput, ConversionStats, PageConversion};
pub use progress::{ConversionProgressCallback, NoopProgressCallback, ProgressCallback};
