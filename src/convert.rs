//! Conversion entry points.
//!
//! [`convert`] drives one page end to end: fetch, parse, render, download the
//! images, write the Markdown. [`convert_html`] is the pure middle part and
//! touches neither the network nor the disk.

use crate::config::CrawlConfig;
use crate::error::{AssetError, Fe2MdError};
use crate::output::{AssetRecord, AssetStatus, ConversionOutput, ConversionStats, PageConversion};
use crate::pipeline::assets::AssetResolver;
use crate::pipeline::markdown::NodeConverter;
use crate::pipeline::{fetch, layout, parse, postprocess};
use reqwest::{Client, Url};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info, warn};

/// Stem used when the URL path is too short to name the file.
const FALLBACK_STEM: &str = "question";

/// Convert the question page at `url` and write it under `config.output_dir`.
///
/// # Returns
/// `Ok(ConversionOutput)` once the Markdown file is written, even if some
/// images failed (check [`ConversionOutput::failed_assets`]).
///
/// # Errors
/// Returns `Err(Fe2MdError)` only for fatal errors:
/// - invalid URL, network failure, timeout, non-2xx page status
/// - question root not found
/// - output directory or Markdown file not writable
///
/// Nothing is written to disk when the page cannot be fetched or parsed.
pub async fn convert(url: impl AsRef<str>, config: &CrawlConfig) -> Result<ConversionOutput, Fe2MdError> {
    let total_start = Instant::now();
    let url = fetch::parse_page_url(url.as_ref())?;
    info!("Starting conversion: {}", url);

    // ── Step 1: Fetch the page ───────────────────────────────────────────
    let client = fetch::build_client(config)?;
    let fetch_start = Instant::now();
    let page = fetch::fetch_page(&client, &url, config.timeout_secs).await?;
    let fetch_duration_ms = fetch_start.elapsed().as_millis() as u64;

    if let Some(ref cb) = config.progress_callback {
        cb.on_page_fetched(page.url.as_str(), page.bytes);
    }

    // ── Step 2: Convert to Markdown ──────────────────────────────────────
    let PageConversion { markdown, mut assets } = convert_page(&page.html, Some(&page.url), config)?;

    // ── Step 3: Download images ──────────────────────────────────────────
    // Names come from the requested URL, not a redirect target.
    let (stem, _) = page_names(&url);
    let stem = config.file_name.clone().unwrap_or(stem);
    let output_path = config.output_dir.join(format!("{stem}.md"));

    create_dir(&config.output_dir).await?;

    let assets_start = Instant::now();
    if !assets.is_empty() {
        let assets_path = config.output_dir.join(&config.assets_dir);
        create_dir(&assets_path).await?;
        download_assets(&client, &assets_path, &mut assets, config).await;
    }
    let assets_duration_ms = assets_start.elapsed().as_millis() as u64;

    // ── Step 4: Write the Markdown ───────────────────────────────────────
    write_atomic(&output_path, &markdown).await?;

    let failed = assets.iter().filter(|a| a.is_failed()).count();
    let stats = ConversionStats {
        page_bytes: page.bytes,
        total_assets: assets.len(),
        downloaded_assets: assets.len() - failed,
        failed_assets: failed,
        fetch_duration_ms,
        assets_duration_ms,
        total_duration_ms: total_start.elapsed().as_millis() as u64,
    };

    info!(
        "Wrote {} ({} images, {} failed) in {}ms",
        output_path.display(),
        stats.total_assets,
        failed,
        stats.total_duration_ms
    );

    if let Some(ref cb) = config.progress_callback {
        cb.on_conversion_complete(&output_path.to_string_lossy(), failed);
    }

    Ok(ConversionOutput {
        source_url: url.to_string(),
        output_path,
        markdown,
        assets,
        stats,
    })
}

/// Convert already-fetched HTML to Markdown without any I/O.
///
/// `base_url` resolves relative image sources and, with
/// [`CrawlConfig::prefix_assets`], supplies the file-name prefix. Image
/// references are returned as [`AssetStatus::Pending`] records.
pub fn convert_html(
    html: &str,
    base_url: Option<&str>,
    config: &CrawlConfig,
) -> Result<PageConversion, Fe2MdError> {
    let base = base_url
        .map(|u| {
            Url::parse(u).map_err(|_| Fe2MdError::InvalidUrl {
                input: u.to_string(),
            })
        })
        .transpose()?;
    convert_page(html, base.as_ref(), config)
}

/// Synchronous wrapper around [`convert`].
///
/// Creates a temporary tokio runtime internally.
pub fn convert_sync(url: impl AsRef<str>, config: &CrawlConfig) -> Result<ConversionOutput, Fe2MdError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| Fe2MdError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(convert(url, config))
}

// ── Internal helpers ─────────────────────────────────────────────────────

fn convert_page(html: &str, base: Option<&Url>, config: &CrawlConfig) -> Result<PageConversion, Fe2MdError> {
    let source = base.map(Url::as_str).unwrap_or("<html>");
    let root = parse::locate_root(html, &config.root_selector, source)?;

    let mut resolver = AssetResolver::new(config.assets_dir.clone());
    if config.prefix_assets {
        if let Some(prefix) = base.and_then(|u| page_names(u).1) {
            resolver = resolver.with_prefix(prefix);
        }
    }

    let body = {
        let mut converter = NodeConverter::new(&mut resolver, base).with_blank_class(&config.blank_class);
        layout::render_page(&root, config.layout, &mut converter)
    };
    let markdown = postprocess::clean_markdown(&body);
    let assets = resolver.into_records();
    debug!("Rendered {} chars, {} images", markdown.len(), assets.len());

    Ok(PageConversion { markdown, assets })
}

/// Derive `(file stem, asset prefix)` from the last two path segments,
/// e.g. `/kakomon/30_haru/pm04.html` → `("30_haru_pm04", Some("30_haru"))`.
fn page_names(url: &Url) -> (String, Option<String>) {
    let segments: Vec<&str> = url
        .path_segments()
        .map(|s| s.filter(|seg| !seg.is_empty()).collect())
        .unwrap_or_default();

    match segments.as_slice() {
        [.., dir, page] => {
            let dir = sanitize_segment(dir);
            let page = sanitize_segment(page.strip_suffix(".html").unwrap_or(page));
            (format!("{dir}_{page}"), Some(dir))
        }
        _ => (FALLBACK_STEM.to_string(), None),
    }
}

fn sanitize_segment(segment: &str) -> String {
    let decoded = percent_encoding::percent_decode_str(segment).decode_utf8_lossy();
    decoded
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() || c.is_whitespace() => '_',
            c => c,
        })
        .collect()
}

async fn download_assets(client: &Client, dir: &Path, assets: &mut [AssetRecord], config: &CrawlConfig) {
    let total = assets.len();
    if let Some(ref cb) = config.progress_callback {
        cb.on_assets_start(total);
    }

    for (i, record) in assets.iter_mut().enumerate() {
        let index = i + 1;
        let target = dir.join(&record.file_name);
        debug!("Downloading image {}/{}: {}", index, total, record.source_url);

        let result = match fetch::fetch_asset(client, &record.source_url).await {
            Ok(bytes) => tokio::fs::write(&target, &bytes)
                .await
                .map(|_| bytes.len() as u64)
                .map_err(|e| AssetError::WriteFailed {
                    url: record.source_url.clone(),
                    path: target.display().to_string(),
                    detail: e.to_string(),
                }),
            Err(e) => Err(e),
        };

        match result {
            Ok(bytes) => {
                record.status = AssetStatus::Downloaded { bytes };
                if let Some(ref cb) = config.progress_callback {
                    cb.on_asset_complete(index, total, &record.relative_path, bytes);
                }
            }
            Err(e) => {
                warn!("Image {}/{} failed: {}", index, total, e);
                if let Some(ref cb) = config.progress_callback {
                    cb.on_asset_error(index, total, &record.source_url, &e.to_string());
                }
                record.status = AssetStatus::Failed { error: e };
            }
        }
    }
}

async fn create_dir(path: &Path) -> Result<(), Fe2MdError> {
    tokio::fs::create_dir_all(path)
        .await
        .map_err(|e| Fe2MdError::OutputDirFailed {
            path: path.to_path_buf(),
            source: e,
        })
}

/// Write to a sibling temp file, then rename over `path`.
async fn write_atomic(path: &Path, contents: &str) -> Result<(), Fe2MdError> {
    let tmp_path: PathBuf = path.with_extension("md.tmp");
    tokio::fs::write(&tmp_path, contents)
        .await
        .map_err(|e| Fe2MdError::OutputWriteFailed {
            path: path.to_path_buf(),
            source: e,
        })?;

    tokio::fs::rename(&tmp_path, path)
        .await
        .map_err(|e| Fe2MdError::OutputWriteFailed {
            path: path.to_path_buf(),
            source: e,
        })
}
