//! Render pipeline: markdown in, HTML and table of contents out.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//!
//! use quill_renderer::{Pipeline, Services};
//!
//! # tokio::runtime::Builder::new_current_thread().enable_all().build().unwrap().block_on(async {
//! let pipeline = Pipeline::new(Arc::new(Services::unavailable()));
//! let result = pipeline.render("# Title\n\nSome $x$ math").await;
//!
//! assert_eq!(result.toc[0].id, "title");
//! assert!(result.html.contains("$x$"));
//! # });
//! ```

use std::sync::Arc;

use crate::code::prehighlight;
use crate::html::HtmlRenderer;
use crate::lexer::Lexer;
use crate::loader::Services;
use crate::math::MathRenderer;
use crate::toc::{TocItem, extract_toc};

/// Default syntect theme.
pub const DEFAULT_THEME: &str = "InspiredGitHub";

/// Default code placeholder prefix.
pub const DEFAULT_PLACEHOLDER_PREFIX: &str = "__QUILL_CODE_";

/// Default deepest heading level included in the TOC.
pub const DEFAULT_TOC_MAX_LEVEL: u8 = 3;

/// Result of rendering one document.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct RenderResult {
    /// Rendered HTML.
    pub html: String,
    /// Headings in document order.
    pub toc: Vec<TocItem>,
}

/// Configured renderer.
///
/// Per-render state (code table, TOC) is created fresh on every call, so one
/// pipeline can serve concurrent renders. Only the optional modules in
/// [`Services`] are shared.
pub struct Pipeline {
    services: Arc<Services>,
    lexer: Lexer,
    gfm: bool,
    theme: String,
    placeholder_prefix: String,
    toc_max_level: u8,
}

impl Pipeline {
    /// Create a pipeline with default options.
    #[must_use]
    pub fn new(services: Arc<Services>) -> Self {
        Self {
            services,
            lexer: Lexer::new().with_math(),
            gfm: true,
            theme: DEFAULT_THEME.to_owned(),
            placeholder_prefix: DEFAULT_PLACEHOLDER_PREFIX.to_owned(),
            toc_max_level: DEFAULT_TOC_MAX_LEVEL,
        }
    }

    /// Set the highlighting theme.
    #[must_use]
    pub fn with_theme(mut self, theme: impl Into<String>) -> Self {
        self.theme = theme.into();
        self
    }

    /// Set the prefix of code placeholder keys.
    #[must_use]
    pub fn with_placeholder_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.placeholder_prefix = prefix.into();
        self
    }

    /// Set the deepest heading level included in the TOC.
    #[must_use]
    pub fn with_toc_max_level(mut self, level: u8) -> Self {
        self.toc_max_level = level;
        self
    }

    /// Enable or disable GFM tables, strikethrough and task lists.
    #[must_use]
    pub fn with_gfm(mut self, enabled: bool) -> Self {
        self.gfm = enabled;
        self.lexer = Lexer::new().with_gfm(enabled).with_math();
        self
    }

    /// Shared optional modules.
    #[must_use]
    pub fn services(&self) -> &Arc<Services> {
        &self.services
    }

    /// Render a markdown document.
    ///
    /// Never fails: a missing or failing highlighter or math engine only
    /// degrades the affected blocks.
    pub async fn render(&self, markdown: &str) -> RenderResult {
        let math = MathRenderer::new(self.services.math.load().await);

        let references = self.lexer.references(markdown);
        let blocks = self.lexer.lex_with_references(markdown, &references);
        let toc = extract_toc(&blocks, self.toc_max_level);

        let highlighter = self.services.highlight.load().await;
        let (blocks, code) =
            prehighlight(blocks, highlighter, &self.theme, &self.placeholder_prefix).await;
        let code_blocks = code.len();

        let mut renderer = HtmlRenderer::new(&self.lexer, &math, code).with_references(references);
        let html = renderer.parse(&blocks);

        let leftover = renderer.into_code_table();
        if !leftover.is_empty() {
            let keys: Vec<&str> = leftover.keys().collect();
            tracing::debug!(?keys, "Code placeholders left unrendered");
        }
        tracing::debug!(code_blocks, toc_entries = toc.len(), "Rendered markdown");

        RenderResult { html, toc }
    }
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("services", &self.services)
            .field("gfm", &self.gfm)
            .field("theme", &self.theme)
            .field("placeholder_prefix", &self.placeholder_prefix)
            .field("toc_max_level", &self.toc_max_level)
            .finish_non_exhaustive()
    }
}

/// Render a markdown document with `pipeline`.
pub async fn render_markdown(markdown: &str, pipeline: &Pipeline) -> RenderResult {
    pipeline.render(markdown).await
}
