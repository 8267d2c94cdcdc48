//! CLI binary for fe2md.
//!
//! A thin shim over the library crate that maps CLI flags
//! to `CrawlConfig` and prints results.

use anyhow::{Context, Result};
use clap::Parser;
use fe2md::{
    convert, AssetRecord, AssetStatus, ConversionOutput, ConversionProgressCallback, CrawlConfig, LayoutMode,
    ProgressCallback,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn yellow(s: &str) -> String {
    format!("\x1b[33m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}

const TICKS: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"];

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal progress callback: a spinner while the page loads, then a bar
/// over the image downloads with one log line per image.
struct CliProgressCallback {
    bar: ProgressBar,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new(0);
        let spinner_style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(TICKS);

        bar.set_style(spinner_style);
        bar.set_prefix("Fetching");
        bar.set_message("page…");
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self { bar })
    }
}

impl ConversionProgressCallback for CliProgressCallback {
    fn on_page_fetched(&self, url: &str, bytes: usize) {
        self.bar.println(format!(
            "  {} {}  {}",
            green("✓"),
            url,
            dim(&format!("{bytes} bytes"))
        ));
        self.bar.set_prefix("Converting");
        self.bar.set_message("");
    }

    fn on_assets_start(&self, total_assets: usize) {
        let style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  [{bar:42.green/238}] {pos:>3}/{len} images  ⏱ {elapsed_precise}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(TICKS);

        self.bar.set_length(total_assets as u64);
        self.bar.set_style(style);
        self.bar.set_prefix("Downloading");
    }

    fn on_asset_complete(&self, index: usize, total: usize, path: &str, bytes: u64) {
        self.bar.println(format!(
            "  {} Image {:>3}/{:<3}  {}  {}",
            green("✓"),
            index,
            total,
            path,
            dim(&format!("{bytes} bytes")),
        ));
        self.bar.inc(1);
    }

    fn on_asset_error(&self, index: usize, total: usize, url: &str, error: &str) {
        self.bar.println(format!(
            "  {} Image {:>3}/{:<3}  {}  {}",
            yellow("⚠"),
            index,
            total,
            url,
            red(&truncate(error, 80)),
        ));
        self.bar.inc(1);
    }

    fn on_conversion_complete(&self, _path: &str, _failed_assets: usize) {
        self.bar.finish_and_clear();
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let head: String = s.chars().take(max - 1).collect();
    format!("{head}\u{2026}")
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Writes ./30_haru_pm04.md and ./assets/*
  fe2md https://www.fe-siken.com/kakomon/30_haru/pm04.html

  # Into a notes directory, image names prefixed with 30_haru_
  fe2md --prefix-assets -o notes https://www.fe-siken.com/kakomon/30_haru/pm04.html

  # Different site layout: convert the whole container
  fe2md --selector 'article.question' --whole https://example.com/q/1.html

  # Machine-readable result (asset statuses included)
  fe2md --json https://www.fe-siken.com/kakomon/30_haru/pm04.html > result.json

OUTPUT:
  {OUTPUT}/{NAME}.md       NAME defaults to {second-last}_{last} URL segments
  {OUTPUT}/{ASSETS}/*      one file per distinct image

  Images that fail to download are reported as warnings; the Markdown still
  links their intended path and the exit status stays 0.

ENVIRONMENT VARIABLES:
  FE2MD_*                 Every flag has an FE2MD_<FLAG> fallback (see --help)
  RUST_LOG                Overrides --verbose / --quiet log filtering
"#;

/// Convert an exam-question web page to Markdown with local images.
#[derive(Parser, Debug)]
#[command(
    name = "fe2md",
    version,
    about = "Convert an exam-question web page to Markdown with local images",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// HTTP/HTTPS URL of the question page.
    url: String,

    /// Output directory for the Markdown file and the assets directory.
    #[arg(short, long, env = "FE2MD_OUTPUT", default_value = ".")]
    output: PathBuf,

    /// Name of the image subdirectory.
    #[arg(long, env = "FE2MD_ASSETS_DIR", default_value = "assets")]
    assets_dir: String,

    /// Markdown file stem (default: derived from the URL).
    #[arg(long, env = "FE2MD_NAME")]
    name: Option<String>,

    /// CSS selector of the question container.
    #[arg(long, env = "FE2MD_SELECTOR", default_value = fe2md::config::DEFAULT_ROOT_SELECTOR)]
    selector: String,

    /// Class marking fill-in-blank spans.
    #[arg(long, env = "FE2MD_BLANK_CLASS", default_value = fe2md::config::DEFAULT_BLANK_CLASS)]
    blank_class: String,

    /// Per-request timeout in seconds.
    #[arg(long, env = "FE2MD_TIMEOUT", default_value_t = 10,
          value_parser = clap::value_parser!(u64).range(1..))]
    timeout: u64,

    /// Prefix image file names with the page's directory segment.
    #[arg(long, env = "FE2MD_PREFIX_ASSETS")]
    prefix_assets: bool,

    /// Convert the whole container instead of only the question sections.
    #[arg(long, env = "FE2MD_WHOLE")]
    whole: bool,

    /// Print the conversion result as JSON on stdout.
    #[arg(long, env = "FE2MD_JSON", conflicts_with = "stdout")]
    json: bool,

    /// Also print the Markdown on stdout.
    #[arg(long, env = "FE2MD_STDOUT")]
    stdout: bool,

    /// Disable progress bar.
    #[arg(long, env = "FE2MD_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "FE2MD_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "FE2MD_QUIET", conflicts_with = "verbose")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The progress bar replaces INFO-level library logs.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json && !cli.stdout;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .with_writer(io::stderr)
        .init();

    // ── Build config ─────────────────────────────────────────────────────
    let progress_cb: Option<ProgressCallback> = if show_progress {
        Some(CliProgressCallback::new() as Arc<dyn ConversionProgressCallback>)
    } else {
        None
    };

    let config = build_config(&cli, progress_cb)?;

    // ── Run conversion ───────────────────────────────────────────────────
    let output = convert(&cli.url, &config)
        .await
        .with_context(|| format!("Conversion of {} failed", cli.url))?;

    if cli.json {
        let json = serde_json::to_string_pretty(&output).context("Failed to serialise output")?;
        println!("{json}");
    } else if cli.stdout {
        io::stdout()
            .lock()
            .write_all(output.markdown.as_bytes())
            .context("Failed to write to stdout")?;
    }

    if !cli.quiet {
        // The progress callback already printed per-image lines.
        if !show_progress {
            for asset in output.failed_assets() {
                eprintln!("{}", failure_line(asset));
            }
        }
        print_summary(&output);
    }

    Ok(())
}

/// Map CLI args to `CrawlConfig`.
fn build_config(cli: &Cli, progress: Option<ProgressCallback>) -> Result<CrawlConfig> {
    let mut builder = CrawlConfig::builder()
        .output_dir(&cli.output)
        .assets_dir(&cli.assets_dir)
        .root_selector(&cli.selector)
        .blank_class(&cli.blank_class)
        .timeout_secs(cli.timeout)
        .prefix_assets(cli.prefix_assets)
        .layout(if cli.whole { LayoutMode::Whole } else { LayoutMode::Question });

    if let Some(ref name) = cli.name {
        builder = builder.file_name(name);
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}

fn failure_line(asset: &AssetRecord) -> String {
    let reason = match asset.status {
        AssetStatus::Failed { ref error } => error.to_string(),
        _ => String::from("unknown error"),
    };
    format!(
        "{} image {} → {}: {}",
        yellow("warning:"),
        asset.source_url,
        asset.relative_path,
        reason
    )
}

fn print_summary(output: &ConversionOutput) {
    let stats = &output.stats;
    eprintln!(
        "{}  {}/{} images  {}ms  →  {}",
        if stats.failed_assets == 0 { green("✔") } else { yellow("⚠") },
        stats.downloaded_assets,
        stats.total_assets,
        stats.total_duration_ms,
        bold(&output.output_path.display().to_string()),
    );
}
