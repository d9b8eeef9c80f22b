//! Syntax highlighting for fenced code blocks.

use std::sync::Arc;

use crate::loader::{LoadError, ModuleLoader};

/// Syntax highlighting error for a single code block.
#[derive(Debug, thiserror::Error)]
pub enum HighlightError {
    /// No grammar is registered for the language.
    #[error("unknown language: {0}")]
    UnknownLanguage(String),

    /// No theme with this name.
    #[error("unknown theme: {0}")]
    UnknownTheme(String),

    /// The engine failed while highlighting.
    #[error("highlighter error: {0}")]
    Engine(String),
}

/// Converts source code to highlighted HTML.
pub trait Highlighter: Send + Sync {
    /// Highlight `code` written in `lang` using `theme`.
    fn code_to_html(&self, code: &str, lang: &str, theme: &str) -> Result<String, HighlightError>;
}

/// Lazily loaded syntax highlighter.
pub type HighlightService = ModuleLoader<dyn Highlighter>;

impl ModuleLoader<dyn Highlighter> {
    /// Highlight service backed by syntect.
    ///
    /// Without the `highlight` feature the service is permanently unavailable.
    #[must_use]
    pub fn syntect() -> Self {
        Self::new("syntect", load_syntect)
    }
}

#[cfg(feature = "highlight")]
fn load_syntect() -> Result<Arc<dyn Highlighter>, LoadError> {
    Ok(Arc::new(SyntectHighlighter::new()))
}

#[cfg(not(feature = "highlight"))]
fn load_syntect() -> Result<Arc<dyn Highlighter>, LoadError> {
    Err(LoadError::Disabled("syntect"))
}

#[cfg(feature = "highlight")]
pub use self::syntect_impl::SyntectHighlighter;

#[cfg(feature = "highlight")]
mod syntect_impl {
    use syntect::easy::HighlightLines;
    use syntect::highlighting::ThemeSet;
    use syntect::html::{IncludeBackground, styled_line_to_highlighted_html};
    use syntect::parsing::SyntaxSet;
    use syntect::util::LinesWithEndings;

    use super::{HighlightError, Highlighter};
    use crate::util::escape_html;

    /// Language names rendered without grammar.
    const PLAIN_LANGS: &[&str] = &["text", "plain", "plaintext", "txt"];

    /// [`Highlighter`] using syntect's bundled grammars and themes.
    pub struct SyntectHighlighter {
        syntaxes: SyntaxSet,
        themes: ThemeSet,
    }

    impl SyntectHighlighter {
        /// Load the default syntax and theme sets.
        #[must_use]
        pub fn new() -> Self {
            Self {
                syntaxes: SyntaxSet::load_defaults_newlines(),
                themes: ThemeSet::load_defaults(),
            }
        }
    }

    impl Default for SyntectHighlighter {
        fn default() -> Self {
            Self::new()
        }
    }

    impl Highlighter for SyntectHighlighter {
        fn code_to_html(
            &self,
            code: &str,
            lang: &str,
            theme: &str,
        ) -> Result<String, HighlightError> {
            let theme = self
                .themes
                .themes
                .get(theme)
                .ok_or_else(|| HighlightError::UnknownTheme(theme.to_owned()))?;

            let syntax = if PLAIN_LANGS.contains(&lang) {
                self.syntaxes.find_syntax_plain_text()
            } else {
                self.syntaxes
                    .find_syntax_by_token(lang)
                    .ok_or_else(|| HighlightError::UnknownLanguage(lang.to_owned()))?
            };

            let mut highlighter = HighlightLines::new(syntax, theme);
            let mut html = format!("<code class=\"language-{}\">", escape_html(lang));
            for line in LinesWithEndings::from(code) {
                let ranges = highlighter
                    .highlight_line(line, &self.syntaxes)
                    .map_err(|e| HighlightError::Engine(e.to_string()))?;
                let line_html = styled_line_to_highlighted_html(&ranges, IncludeBackground::No)
                    .map_err(|e| HighlightError::Engine(e.to_string()))?;
                html.push_str(&line_html);
            }
            html.push_str("</code>");
            Ok(html)
        }
    }

}
