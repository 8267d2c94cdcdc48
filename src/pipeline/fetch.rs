//! Network access: fetch the question page and its images.
//!
//! One `reqwest::Client` is built per conversion and carries the timeout and
//! user agent for every request. Page failures are fatal ([`Fe2MdError`]);
//! image failures are returned as [`AssetError`] for the caller to record.

use crate::config::CrawlConfig;
use crate::error::{AssetError, Fe2MdError};
use base64::Engine;
use encoding_rs::{Encoding, UTF_8};
use once_cell::sync::Lazy;
use percent_encoding::percent_decode_str;
use regex::bytes::Regex;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, Url};
use std::time::Duration;
use tracing::{debug, info};

/// How many leading bytes are searched for a `<meta charset>` declaration.
const META_SNIFF_LEN: usize = 1024;

static RE_META_CHARSET: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)<meta[^>]+charset\s*=\s*["']?\s*([A-Za-z0-9_:.\-]+)"#).unwrap()
});

/// A fetched and decoded HTML page.
#[derive(Debug)]
pub struct FetchedPage {
    /// Final URL after redirects; relative image paths resolve against it.
    pub url: Url,
    pub html: String,
    /// Size of the raw body.
    pub bytes: usize,
}

/// Check if the input string looks like a URL.
pub fn is_url(input: &str) -> bool {
    input.starts_with("http://") || input.starts_with("https://")
}

/// Parse and validate the page URL.
pub fn parse_page_url(input: &str) -> Result<Url, Fe2MdError> {
    let input = input.trim();
    if !is_url(input) {
        return Err(Fe2MdError::InvalidUrl {
            input: input.to_string(),
        });
    }
    Url::parse(input).map_err(|_| Fe2MdError::InvalidUrl {
        input: input.to_string(),
    })
}

/// Build the HTTP client shared by the page and image requests.
pub fn build_client(config: &CrawlConfig) -> Result<Client, Fe2MdError> {
    Client::builder()
        .timeout(Duration::from_secs(config.timeout_secs))
        .user_agent(config.user_agent.clone())
        .build()
        .map_err(|e| Fe2MdError::Internal(format!("Failed to build HTTP client: {}", e)))
}

/// Fetch the page at `url` and decode it to text.
pub async fn fetch_page(client: &Client, url: &Url, timeout_secs: u64) -> Result<FetchedPage, Fe2MdError> {
    info!("Fetching page: {}", url);

    let response = client.get(url.clone()).send().await.map_err(|e| {
        if e.is_timeout() {
            Fe2MdError::DownloadTimeout {
                url: url.to_string(),
                secs: timeout_secs,
            }
        } else {
            Fe2MdError::DownloadFailed {
                url: url.to_string(),
                reason: e.to_string(),
            }
        }
    })?;

    if !response.status().is_success() {
        return Err(Fe2MdError::HttpStatus {
            url: url.to_string(),
            status: response.status().as_u16(),
        });
    }

    let final_url = response.url().clone();
    let content_type = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    let body = response.bytes().await.map_err(|e| {
        if e.is_timeout() {
            Fe2MdError::DownloadTimeout {
                url: url.to_string(),
                secs: timeout_secs,
            }
        } else {
            Fe2MdError::DownloadFailed {
                url: url.to_string(),
                reason: e.to_string(),
            }
        }
    })?;

    let html = decode_html(&body, content_type.as_deref());
    debug!("Fetched {} bytes from {}", body.len(), final_url);

    Ok(FetchedPage {
        url: final_url,
        html,
        bytes: body.len(),
    })
}

/// Fetch one image. `data:` URLs are decoded locally.
pub async fn fetch_asset(client: &Client, url: &str) -> Result<Vec<u8>, AssetError> {
    if url.starts_with("data:") {
        return decode_data_url(url).ok_or_else(|| AssetError::DownloadFailed {
            url: truncate(url),
            reason: "malformed data: URL".to_string(),
        });
    }

    let failed = |reason: String| AssetError::DownloadFailed {
        url: url.to_string(),
        reason,
    };

    let response = client.get(url).send().await.map_err(|e| failed(e.to_string()))?;
    if !response.status().is_success() {
        return Err(failed(format!("HTTP {}", response.status())));
    }
    let body = response.bytes().await.map_err(|e| failed(e.to_string()))?;
    Ok(body.to_vec())
}

/// Decode a page body using, in order: a BOM, the `charset` of the
/// Content-Type header, a `<meta charset>` in the first kilobyte, UTF-8.
pub fn decode_html(bytes: &[u8], content_type: Option<&str>) -> String {
    let encoding = content_type
        .and_then(charset_from_content_type)
        .or_else(|| sniff_meta_charset(bytes))
        .unwrap_or(UTF_8);
    debug!("Decoding page as {}", encoding.name());
    // `decode` gives a BOM precedence over the chosen encoding.
    let (text, _, _) = encoding.decode(bytes);
    text.into_owned()
}

fn charset_from_content_type(content_type: &str) -> Option<&'static Encoding> {
    content_type
        .split(';')
        .skip(1)
        .filter_map(|param| param.split_once('='))
        .find(|(k, _)| k.trim().eq_ignore_ascii_case("charset"))
        .and_then(|(_, v)| Encoding::for_label(v.trim().trim_matches('"').as_bytes()))
}

fn sniff_meta_charset(bytes: &[u8]) -> Option<&'static Encoding> {
    let head = &bytes[..bytes.len().min(META_SNIFF_LEN)];
    RE_META_CHARSET
        .captures(head)
        .and_then(|caps| Encoding::for_label(&caps[1]))
}

/// `data:[<mime>][;base64],<payload>`
fn decode_data_url(url: &str) -> Option<Vec<u8>> {
    let rest = url.strip_prefix("data:")?;
    let (meta, payload) = rest.split_once(',')?;
    if meta.split(';').any(|p| p.eq_ignore_ascii_case("base64")) {
        let compact: String = payload.chars().filter(|c| !c.is_ascii_whitespace()).collect();
        base64::engine::general_purpose::STANDARD.decode(compact).ok()
    } else {
        Some(percent_decode_str(payload).collect())
    }
}

fn truncate(url: &str) -> String {
    if url.len() <= 64 {
        return url.to_string();
    }
    let mut end = 64;
    while !url.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}\u{2026}", &url[..end])
}
