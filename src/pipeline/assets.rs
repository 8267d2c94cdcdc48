//! Asset naming: decide where each image lives on disk.
//!
//! The resolver never performs I/O. It maps a source URL to a file name in
//! the assets directory, keeps names unique within one page, and remembers
//! which URLs it has already handed out so the orchestrator downloads each
//! image once. Construct one per page and drop it afterwards.

use crate::error::AssetError;
use crate::output::{AssetRecord, AssetStatus};
use percent_encoding::percent_decode_str;
use sha2::{Digest, Sha256};
use std::collections::{HashMap, HashSet};
use tracing::debug;

/// Outcome of [`AssetResolver::resolve`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    /// Path to embed in the Markdown, e.g. `assets/z.png`.
    pub relative_path: String,
    /// `false` when the URL was already resolved on this page.
    pub is_new: bool,
}

/// Per-page mapping from image URLs to unique local file names.
#[derive(Debug)]
pub struct AssetResolver {
    assets_dir: String,
    prefix: Option<String>,
    records: Vec<AssetRecord>,
    by_url: HashMap<String, usize>,
    taken: HashSet<String>,
}

impl AssetResolver {
    pub fn new(assets_dir: impl Into<String>) -> Self {
        Self {
            assets_dir: assets_dir.into(),
            prefix: None,
            records: Vec::new(),
            by_url: HashMap::new(),
            taken: HashSet::new(),
        }
    }

    /// Prepend `{prefix}_` to every file name.
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        let prefix = prefix.into();
        self.prefix = (!prefix.is_empty()).then_some(prefix);
        self
    }

    /// Resolve `source_url` to a path relative to the Markdown file.
    ///
    /// A URL seen before returns the same path with `is_new = false`.
    /// URLs that yield no usable name fall back to a hash-based name; only an
    /// empty URL is an error.
    pub fn resolve(&mut self, source_url: &str) -> Result<Resolution, AssetError> {
        let source_url = source_url.trim();
        if source_url.is_empty() {
            return Err(AssetError::Naming {
                source_url: source_url.to_string(),
            });
        }

        if let Some(&idx) = self.by_url.get(source_url) {
            return Ok(Resolution {
                relative_path: self.records[idx].relative_path.clone(),
                is_new: false,
            });
        }

        let base = file_name_from_url(source_url).unwrap_or_else(|| fallback_name(source_url));
        let base = match self.prefix {
            Some(ref p) => format!("{p}_{base}"),
            None => base,
        };
        let file_name = self.unique(base);
        let relative_path = format!("{}/{}", self.assets_dir, file_name);
        debug!("Asset {} -> {}", source_url, relative_path);

        self.taken.insert(file_name.clone());
        self.by_url.insert(source_url.to_string(), self.records.len());
        self.records.push(AssetRecord {
            source_url: source_url.to_string(),
            file_name,
            relative_path: relative_path.clone(),
            status: AssetStatus::Pending,
        });

        Ok(Resolution {
            relative_path,
            is_new: true,
        })
    }

    /// Records in first-seen order.
    pub fn records(&self) -> &[AssetRecord] {
        &self.records
    }

    pub fn into_records(self) -> Vec<AssetRecord> {
        self.records
    }

    fn unique(&self, name: String) -> String {
        if !self.taken.contains(&name) {
            return name;
        }
        let (stem, ext) = split_extension(&name);
        (1..)
            .map(|n| match ext {
                Some(ext) => format!("{stem}-{n}.{ext}"),
                None => format!("{stem}-{n}"),
            })
            .find(|candidate| !self.taken.contains(candidate))
            .unwrap_or(name)
    }
}

/// Last non-empty path segment of `url`, decoded and made filesystem-safe.
fn file_name_from_url(url: &str) -> Option<String> {
    let parsed = reqwest::Url::parse(url).ok()?;
    let segment = parsed.path_segments()?.filter(|s| !s.is_empty()).next_back()?;
    let decoded = percent_decode_str(segment).decode_utf8_lossy();
    let name = sanitize(&decoded);
    if name.is_empty() || name.chars().all(|c| c == '.' || c == '_') {
        None
    } else {
        Some(name)
    }
}

/// `image-{sha256 prefix}` with whatever extension can be salvaged.
fn fallback_name(url: &str) -> String {
    let digest = format!("{:x}", Sha256::digest(url.as_bytes()));
    match guess_extension(url) {
        Some(ext) => format!("image-{}.{}", &digest[..16], ext),
        None => format!("image-{}", &digest[..16]),
    }
}

fn guess_extension(url: &str) -> Option<String> {
    // data:image/png;base64,...
    if let Some(rest) = url.strip_prefix("data:image/") {
        let subtype: String = rest
            .chars()
            .take_while(|c| c.is_ascii_alphanumeric())
            .collect();
        return match subtype.as_str() {
            "" => None,
            "jpeg" => Some("jpg".to_string()),
            "svg" => Some("svg".to_string()),
            other => Some(other.to_string()),
        };
    }
    let tail = url.split(['?', '#']).next()?.rsplit('/').next()?;
    let (_, ext) = split_extension(tail);
    ext.filter(|e| e.len() <= 5 && e.chars().all(|c| c.is_ascii_alphanumeric()))
        .map(|e| e.to_ascii_lowercase())
}

fn split_extension(name: &str) -> (&str, Option<&str>) {
    match name.rfind('.') {
        Some(idx) if idx > 0 && idx + 1 < name.len() => (&name[..idx], Some(&name[idx + 1..])),
        _ => (name, None),
    }
}

fn sanitize(name: &str) -> String {
    name.trim()
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() || c.is_whitespace() => '_',
            c => c,
        })
        .collect()
}
