//! Pipeline stages for page-to-Markdown conversion.
//!
//! Each submodule implements one step. Only [`fetch`] does network I/O;
//! everything between it and the orchestrator's file writes is pure.
//!
//! ## Data Flow
//!
//! ```text
//! fetch ──▶ parse ──▶ layout ──▶ markdown ──▶ postprocess
//! (reqwest)  (scraper)  (sections)  (+ assets)    (cleanup)
//! ```
//!
//! 1. [`fetch`] : download the page, decode its charset, download images
//! 2. [`parse`] : build an owned [`dom::Element`] tree and locate the question root
//! 3. [`layout`]: choose which children of the root make up the question
//! 4. [`markdown`]: recursive node-to-Markdown conversion; image sources go
//!    through [`assets::AssetResolver`] for stable local names
//! 5. [`postprocess`]: deterministic whitespace cleanup

pub mod assets;
pub mod dom;
pub mod fetch;
pub mod layout;
pub mod markdown;
pub mod parse;
pub mod postprocess;
