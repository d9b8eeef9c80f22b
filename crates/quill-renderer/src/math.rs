//! Math grammar extensions and rendering.
//!
//! - Block math: `$$ ... $$` (may span lines), followed by newlines or end of input.
//! - Inline math: `$ ... $` on a single line, not `$$` and not an escaped `\$`.
//!
//! Both render through an optional [`MathEngine`]. Without an engine, or
//! when the engine fails, the original delimiters and expression are emitted
//! verbatim.

use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, LazyLock};

use regex::Regex;

use crate::grammar::{BlockMatch, BlockRule, InlineMatch, InlineRule};
use crate::loader::{LoadError, ModuleLoader};
use crate::token::{Block, Inline};

static BLOCK_MATH: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\$\$([\s\S]+?)\$\$(?:\n+|$)").unwrap());

static INLINE_MATH: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\$([^\n$]+?)\$").unwrap());

/// Math rendering error.
#[derive(Debug, thiserror::Error)]
pub enum MathError {
    /// The engine rejected or failed on the expression.
    #[error("math engine error: {0}")]
    Engine(String),
}

/// Math typesetting engine.
pub trait MathEngine: Send + Sync {
    /// Render `expr` to HTML, in display mode for block math.
    fn render_to_string(&self, expr: &str, display_mode: bool) -> Result<String, MathError>;
}

/// Lazily loaded math engine.
pub type MathService = ModuleLoader<dyn MathEngine>;

impl ModuleLoader<dyn MathEngine> {
    /// Math service backed by KaTeX.
    ///
    /// Without the `math` feature the service is permanently unavailable.
    #[must_use]
    pub fn katex() -> Self {
        Self::new("katex", load_katex)
    }
}

#[cfg(feature = "math")]
fn load_katex() -> Result<Arc<dyn MathEngine>, LoadError> {
    Ok(Arc::new(KatexEngine::new()?))
}

#[cfg(not(feature = "math"))]
fn load_katex() -> Result<Arc<dyn MathEngine>, LoadError> {
    Err(LoadError::Disabled("katex"))
}

/// [`MathEngine`] backed by the `katex` crate.
#[cfg(feature = "math")]
pub struct KatexEngine {
    inline: katex::Opts,
    display: katex::Opts,
}

#[cfg(feature = "math")]
impl KatexEngine {
    /// Build render options and run a test render.
    ///
    /// The test render surfaces a broken JavaScript backend at load time instead
    /// of on the first formula.
    pub fn new() -> Result<Self, LoadError> {
        let engine = Self {
            inline: katex_opts(false)?,
            display: katex_opts(true)?,
        };
        katex::render_with_opts("x", &engine.inline).map_err(|e| LoadError::Init {
            module: "katex",
            message: e.to_string(),
        })?;
        Ok(engine)
    }
}

#[cfg(feature = "math")]
fn katex_opts(display_mode: bool) -> Result<katex::Opts, LoadError> {
    katex::Opts::builder()
        .display_mode(display_mode)
        .output_type(katex::OutputType::Html)
        .throw_on_error(false)
        .build()
        .map_err(|e| LoadError::Init {
            module: "katex",
            message: e.to_string(),
        })
}

#[cfg(feature = "math")]
impl MathEngine for KatexEngine {
    fn render_to_string(&self, expr: &str, display_mode: bool) -> Result<String, MathError> {
        let opts = if display_mode {
            &self.display
        } else {
            &self.inline
        };
        katex::render_with_opts(expr, opts).map_err(|e| MathError::Engine(e.to_string()))
    }
}

/// Renders math tokens with fallback to the literal source.
#[derive(Default)]
pub struct MathRenderer {
    engine: Option<Arc<dyn MathEngine>>,
}

impl MathRenderer {
    /// Create a renderer. `None` means the engine is unavailable.
    #[must_use]
    pub fn new(engine: Option<Arc<dyn MathEngine>>) -> Self {
        Self { engine }
    }

    /// Render an expression, or return it wrapped in its delimiters.
    ///
    /// The fallback is not HTML-escaped: it reproduces the markdown source.
    #[must_use]
    pub fn render(&self, expr: &str, display_mode: bool) -> String {
        let Some(engine) = &self.engine else {
            return literal(expr, display_mode);
        };
        let result = panic::catch_unwind(AssertUnwindSafe(|| engine.render_to_string(expr, display_mode)));
        match result {
            Ok(Ok(html)) => html,
            Ok(Err(e)) => {
                tracing::debug!(error = %e, display_mode, "Math render failed, keeping source");
                literal(expr, display_mode)
            }
            Err(_) => {
                tracing::debug!(display_mode, "Math engine panicked, keeping source");
                literal(expr, display_mode)
            }
        }
    }
}

fn literal(expr: &str, display_mode: bool) -> String {
    if display_mode {
        format!("$${expr}$$")
    } else {
        format!("${expr}$")
    }
}

/// Block rule for `$$ ... $$`.
pub struct MathBlockRule;

impl BlockRule for MathBlockRule {
    fn name(&self) -> &'static str {
        "math_block"
    }

    fn start(&self, src: &str) -> Option<usize> {
        src.find("$$")
    }

    fn tokenize(&self, src: &str) -> Option<BlockMatch> {
        let caps = BLOCK_MATH.captures(src)?;
        Some(BlockMatch {
            consumed: caps.get(0)?.end(),
            block: Block::Math(caps[1].trim().to_owned()),
        })
    }
}

/// Inline rule for `$ ... $`.
pub struct MathInlineRule;

impl InlineRule for MathInlineRule {
    fn name(&self) -> &'static str {
        "math_inline"
    }

    fn start(&self, src: &str) -> Option<usize> {
        // Point at the backslash of `\$` so the escape is seen first.
        let idx = src.find('$')?;
        if idx > 0 && src.as_bytes()[idx - 1] == b'\\' {
            Some(idx - 1)
        } else {
            Some(idx)
        }
    }

    fn tokenize(&self, src: &str) -> Option<InlineMatch> {
        if src.starts_with("$$") || src.starts_with("\\$") {
            return None;
        }
        let caps = INLINE_MATH.captures(src)?;
        let inner = caps[1].trim();
        if inner.is_empty() {
            return None;
        }
        Some(InlineMatch {
            consumed: caps.get(0)?.end(),
            inline: Inline::Math(inner.to_owned()),
        })
    }
}
