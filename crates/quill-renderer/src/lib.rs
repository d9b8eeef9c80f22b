//! Markdown to HTML rendering with callouts, math and highlighted code.
//!
//! This crate turns a markdown document into HTML plus a table of contents.
//! On top of CommonMark (parsed by pulldown-cmark) it adds:
//!
//! - Syntax highlighted code blocks via an optional [`Highlighter`]
//! - `$inline$` and `$$display$$` math via an optional [`MathEngine`]
//! - `> [!type]` callout blocks with optional `+`/`-` folding
//! - Heading anchors shared with the TOC through [`slugify`]
//!
//! # Architecture
//!
//! Rendering is split into passes over an owned token tree:
//!
//! 1. [`Lexer`] folds pulldown-cmark events into [`Block`]/[`Inline`] tokens,
//!    running registered [`BlockRule`]s and [`InlineRule`]s (the math grammar)
//! 2. [`extract_toc`] collects headings
//! 3. [`prehighlight`] swaps code text for placeholder keys and highlights it
//!    into a [`CodeTable`]
//! 4. [`HtmlRenderer`] emits HTML, resolving placeholders and callouts
//!
//! [`Pipeline`] sequences the passes. The highlighter and math engine are
//! loaded lazily, at most once, through the [`ModuleLoader`]s in
//! [`Services`]; when either is unavailable, output degrades to plain code
//! and literal math delimiters.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//!
//! use quill_renderer::{Pipeline, Services, render_markdown};
//!
//! # tokio::runtime::Builder::new_current_thread().enable_all().build().unwrap().block_on(async {
//! let pipeline = Pipeline::new(Arc::new(Services::unavailable()));
//! let result = render_markdown("> [!tip] Hint\n> Read the docs", &pipeline).await;
//!
//! assert!(result.html.starts_with("<div class=\"callout\" data-type=\"tip\">"));
//! # });
//! ```

mod callout;
mod code;
mod fence;
mod grammar;
mod highlight;
mod html;
mod lexer;
mod loader;
mod math;
mod overrides;
mod pipeline;
mod toc;
mod token;
mod util;

pub use callout::{CalloutIcon, CalloutMatch, Fold};
pub use code::{CodeEntry, CodeTable, DEFAULT_LANG, prehighlight};
pub use grammar::{BlockMatch, BlockRule, InlineMatch, InlineRule};
#[cfg(feature = "highlight")]
pub use highlight::SyntectHighlighter;
pub use highlight::{HighlightError, HighlightService, Highlighter};
pub use html::HtmlRenderer;
pub use lexer::{Lexer, References};
pub use loader::{Availability, LoadError, ModuleLoader, Services};
#[cfg(feature = "math")]
pub use math::KatexEngine;
pub use math::{MathBlockRule, MathEngine, MathError, MathInlineRule, MathRenderer, MathService};
pub use pipeline::{
    DEFAULT_PLACEHOLDER_PREFIX, DEFAULT_THEME, DEFAULT_TOC_MAX_LEVEL, Pipeline, RenderResult,
    render_markdown,
};
pub use toc::{TocItem, extract_toc};
pub use token::{Block, Inline, plain_text};
pub use util::{escape_attr, escape_html, slugify};
