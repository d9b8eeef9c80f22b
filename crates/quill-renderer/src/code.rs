//! Code block pre-highlighting.
//!
//! Highlighting runs before rendering so the render pass can stay
//! synchronous. [`prehighlight`] walks the token tree, replaces every code
//! block's text with a placeholder key and returns the highlighted output in
//! a [`CodeTable`] keyed by those placeholders.

use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use crate::highlight::Highlighter;
use crate::token::Block;

/// Language passed to the highlighter for fences without an info string.
pub const DEFAULT_LANG: &str = "text";

/// Highlighting result for one code block.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CodeEntry {
    /// Highlighted HTML, empty when highlighting was unavailable or failed.
    pub html: String,
    /// Raw source code, unescaped.
    pub original: String,
}

/// Placeholder key to highlighted code, scoped to one render call.
#[derive(Clone, Debug, Default)]
pub struct CodeTable {
    entries: HashMap<String, CodeEntry>,
}

impl CodeTable {
    /// Look up an entry without consuming it.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&CodeEntry> {
        self.entries.get(key)
    }

    /// Remove and return an entry. Each placeholder resolves once.
    pub fn take(&mut self, key: &str) -> Option<CodeEntry> {
        self.entries.remove(key)
    }

    /// Number of unconsumed entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether every entry has been consumed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Unconsumed placeholder keys.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub(crate) fn insert(&mut self, key: String, entry: CodeEntry) {
        self.entries.insert(key, entry);
    }
}

/// Replace code block text with placeholder keys and highlight the code.
///
/// Keys are `{prefix}{n}__` with `n` counting from 0 in document order,
/// including code nested in block quotes and lists. Blocks are highlighted
/// one at a time on a blocking thread; a failure (error or panic) leaves
/// that entry's `html` empty.
pub async fn prehighlight(
    mut blocks: Vec<Block>,
    highlighter: Option<Arc<dyn Highlighter>>,
    theme: &str,
    prefix: &str,
) -> (Vec<Block>, CodeTable) {
    let mut sources = Vec::new();
    for block in &mut blocks {
        collect_code(block, prefix, &mut sources);
    }

    let mut table = CodeTable::default();
    for (key, lang, original) in sources {
        let html = match &highlighter {
            Some(highlighter) => {
                highlight_one(Arc::clone(highlighter), &original, &lang, theme).await
            }
            None => String::new(),
        };
        table.insert(key, CodeEntry { html, original });
    }

    (blocks, table)
}

/// Swap code text for a key, depth-first in document order.
fn collect_code(block: &mut Block, prefix: &str, out: &mut Vec<(String, String, String)>) {
    if let Block::Code { lang, text } = block {
        let key = format!("{prefix}{}__", out.len());
        let original = std::mem::replace(text, key.clone());
        let lang = lang.clone().unwrap_or_else(|| DEFAULT_LANG.to_owned());
        out.push((key, lang, original));
        return;
    }
    for child in block.children_mut() {
        collect_code(child, prefix, out);
    }
}

async fn highlight_one(
    highlighter: Arc<dyn Highlighter>,
    code: &str,
    lang: &str,
    theme: &str,
) -> String {
    let (code_owned, lang_owned, theme_owned) = (code.to_owned(), lang.to_owned(), theme.to_owned());
    let result = tokio::task::spawn_blocking(move || {
        std::panic::catch_unwind(AssertUnwindSafe(|| {
            highlighter.code_to_html(&code_owned, &lang_owned, &theme_owned)
        }))
    })
    .await;

    match result {
        Ok(Ok(Ok(html))) => html,
        Ok(Ok(Err(e))) => {
            tracing::debug!(lang, error = %e, "Highlighting failed, rendering plain code");
            String::new()
        }
        Ok(Err(_)) | Err(_) => {
            tracing::debug!(lang, "Highlighter panicked, rendering plain code");
            String::new()
        }
    }
}
