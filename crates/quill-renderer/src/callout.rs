//! Callout blocks.
//!
//! A block quote whose first paragraph starts with `[!type]` renders as a
//! callout box:
//!
//! ```markdown
//! > [!warning]+ Be careful
//! > Body text.
//! ```
//!
//! `+` and `-` make the callout collapsible (open and closed by default).
//! Any tag is accepted; the tag only selects one of four icons and is kept
//! verbatim (lowercased) in `data-type`.

use std::fmt::Write;
use std::sync::LazyLock;

use regex::Regex;

use crate::html::HtmlRenderer;
use crate::token::Block;

static CALLOUT_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\[!([A-Za-z]+)\]([+-]?)[ \t]*(.*)").unwrap());

// SVG icons (GitHub Octicons, 16x16)
const SVG_NOTE: &str = r#"<svg viewBox="0 0 16 16"><path d="M0 8a8 8 0 1 1 16 0A8 8 0 0 1 0 8Zm8-6.5a6.5 6.5 0 1 0 0 13 6.5 6.5 0 0 0 0-13ZM6.5 7.75A.75.75 0 0 1 7.25 7h1a.75.75 0 0 1 .75.75v2.75h.25a.75.75 0 0 1 0 1.5h-2a.75.75 0 0 1 0-1.5h.25v-2h-.25a.75.75 0 0 1-.75-.75ZM8 6a1 1 0 1 1 0-2 1 1 0 0 1 0 2Z"></path></svg>"#;
const SVG_TIP: &str = r#"<svg viewBox="0 0 16 16"><path d="M8 1.5c-2.363 0-4 1.69-4 3.75 0 .984.424 1.625.984 2.304l.214.253c.223.264.47.556.673.848.284.411.537.896.621 1.49a.75.75 0 0 1-1.484.211c-.04-.282-.163-.547-.37-.847a8.456 8.456 0 0 0-.542-.68c-.084-.1-.173-.205-.268-.32C3.201 7.75 2.5 6.766 2.5 5.25 2.5 2.31 4.863 0 8 0s5.5 2.31 5.5 5.25c0 1.516-.701 2.5-1.328 3.259-.095.115-.184.22-.268.319-.207.245-.383.453-.541.681-.208.3-.33.565-.37.847a.751.751 0 0 1-1.485-.212c.084-.593.337-1.078.621-1.489.203-.292.45-.584.673-.848.075-.088.147-.173.213-.253.561-.679.985-1.32.985-2.304 0-2.06-1.637-3.75-4-3.75ZM5.75 12h4.5a.75.75 0 0 1 0 1.5h-4.5a.75.75 0 0 1 0-1.5ZM6 15.25a.75.75 0 0 1 .75-.75h2.5a.75.75 0 0 1 0 1.5h-2.5a.75.75 0 0 1-.75-.75Z"></path></svg>"#;
const SVG_WARNING: &str = r#"<svg viewBox="0 0 16 16"><path d="M6.457 1.047c.659-1.234 2.427-1.234 3.086 0l6.082 11.378A1.75 1.75 0 0 1 14.082 15H1.918a1.75 1.75 0 0 1-1.543-2.575Zm1.763.707a.25.25 0 0 0-.44 0L1.698 13.132a.25.25 0 0 0 .22.368h12.164a.25.25 0 0 0 .22-.368Zm.53 3.996v2.5a.75.75 0 0 1-1.5 0v-2.5a.75.75 0 0 1 1.5 0ZM9 11a1 1 0 1 1-2 0 1 1 0 0 1 2 0Z"></path></svg>"#;
const SVG_DANGER: &str = r#"<svg viewBox="0 0 16 16"><path d="M2.343 13.657A8 8 0 1 1 13.657 2.343 8 8 0 0 1 2.343 13.657ZM6.03 4.97a.75.75 0 0 0-1.06 1.06L6.94 8 4.97 9.97a.75.75 0 1 0 1.06 1.06L8 9.06l1.97 1.97a.75.75 0 1 0 1.06-1.06L9.06 8l1.97-1.97a.75.75 0 1 0-1.06-1.06L8 6.94 6.03 4.97Z"></path></svg>"#;
const SVG_FOLD: &str = r#"<svg viewBox="0 0 16 16"><path d="M12.78 5.22a.75.75 0 0 1 0 1.06l-4.25 4.25a.75.75 0 0 1-1.06 0L3.22 6.28a.75.75 0 0 1 1.06-1.06L8 8.94l3.72-3.72a.75.75 0 0 1 1.06 0Z"></path></svg>"#;

/// Icon category of a callout.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CalloutIcon {
    /// `note`, `info`, `todo` and any unrecognised type.
    Note,
    /// `tip`, `hint`, `success`, `check`, `done`.
    Tip,
    /// `warning`, `attention`, `caution`.
    Warning,
    /// `danger`, `error`, `bug`, `fail`, `missing`.
    Danger,
}

impl CalloutIcon {
    /// Icon for a callout type (case-insensitive).
    #[must_use]
    pub fn for_kind(kind: &str) -> Self {
        match kind.to_ascii_lowercase().as_str() {
            "tip" | "hint" | "success" | "check" | "done" => Self::Tip,
            "warning" | "attention" | "caution" => Self::Warning,
            "danger" | "error" | "bug" | "fail" | "missing" => Self::Danger,
            _ => Self::Note,
        }
    }

    /// Inline SVG markup.
    #[must_use]
    pub fn svg(self) -> &'static str {
        match self {
            Self::Note => SVG_NOTE,
            Self::Tip => SVG_TIP,
            Self::Warning => SVG_WARNING,
            Self::Danger => SVG_DANGER,
        }
    }
}

/// Collapsible callout state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Fold {
    /// `+`: expanded by default.
    Open,
    /// `-`: collapsed by default.
    Closed,
}

/// Parsed `[!type]` marker line.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CalloutMatch {
    /// Lowercased type tag.
    pub kind: String,
    /// Fold marker, `None` for a static callout.
    pub fold: Option<Fold>,
    /// Title markdown; the uppercased tag when none was given.
    pub title: String,
    /// Paragraph text after the marker line.
    pub rest: String,
}

impl CalloutMatch {
    /// Parse the raw text of a block quote's first paragraph.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        let caps = CALLOUT_MARKER.captures(raw)?;
        let tag = &caps[1];
        let fold = match &caps[2] {
            "+" => Some(Fold::Open),
            "-" => Some(Fold::Closed),
            _ => None,
        };
        let title = caps[3].trim();
        let title = if title.is_empty() {
            tag.to_uppercase()
        } else {
            title.to_owned()
        };

        let rest = &raw[caps.get(0)?.end()..];
        let rest = rest.strip_prefix('\n').unwrap_or(rest);

        Some(Self {
            kind: tag.to_lowercase(),
            fold,
            title,
            rest: rest.to_owned(),
        })
    }

    /// Icon category for this callout.
    #[must_use]
    pub fn icon(&self) -> CalloutIcon {
        CalloutIcon::for_kind(&self.kind)
    }
}

impl HtmlRenderer<'_> {
    /// Render a block quote, as a callout when it carries a marker.
    pub(crate) fn blockquote(&mut self, blocks: &[Block], out: &mut String) {
        let callout = match blocks.first() {
            Some(Block::Paragraph { raw, .. }) => CalloutMatch::parse(raw),
            _ => None,
        };
        let Some(callout) = callout else {
            let content = self.parse(blocks);
            writeln!(out, "<blockquote>\n{content}</blockquote>").unwrap();
            return;
        };

        // The marker line is cut from the source text, so the rest of the
        // first paragraph is tokenized again.
        let mut body_blocks = self.lexer.lex_with_references(&callout.rest, &self.references);
        body_blocks.extend_from_slice(&blocks[1..]);
        let body = self.parse(&body_blocks);

        let title_inlines = self.lexer.lex_inline_with_references(&callout.title, &self.references);
        let title = self.parse_inline(&title_inlines);
        let fold_icon = if callout.fold.is_some() {
            format!("<span class=\"callout-fold\">{SVG_FOLD}</span>")
        } else {
            String::new()
        };
        let title_block = format!(
            "<div class=\"callout-title\"><span class=\"callout-icon\">{}</span><span>{title}</span>{fold_icon}</div>",
            callout.icon().svg()
        );

        let kind = &callout.kind;
        match callout.fold {
            Some(fold) => {
                let open = if fold == Fold::Open { " open" } else { "" };
                writeln!(
                    out,
                    "<details class=\"callout\" data-type=\"{kind}\"{open}><summary>{title_block}</summary><div class=\"callout-content\">{body}</div></details>"
                )
                .unwrap();
            }
            None => {
                writeln!(
                    out,
                    "<div class=\"callout\" data-type=\"{kind}\">{title_block}<div class=\"callout-content\">{body}</div></div>"
                )
                .unwrap();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::code::CodeTable;
    use crate::lexer::Lexer;
    use crate::math::MathRenderer;

    fn render(markdown: &str) -> String {
        let lexer = Lexer::new().with_math();
        let math = MathRenderer::default();
        let references = lexer.references(markdown);
        let blocks = lexer.lex_with_references(markdown, &references);
        HtmlRenderer::new(&lexer, &math, CodeTable::default())
            .with_references(references)
            .parse(&blocks)
    }

    #[test]
    fn test_parse_marker() {
        let m = CalloutMatch::parse("[!Warning]+ Be careful\nbody").unwrap();
        assert_eq!(
            m,
            CalloutMatch {
                kind: "warning".to_owned(),
                fold: Some(Fold::Open),
                title: "Be careful".to_owned(),
                rest: "body".to_owned(),
            }
        );
    }

    #[test]
    fn test_parse_marker_default_title() {
        let m = CalloutMatch::parse("[!tip] ").unwrap();
        assert_eq!(m.title, "TIP");
        assert_eq!(m.fold, None);
        assert_eq!(m.rest, "");

        let m = CalloutMatch::parse("[!faq]-").unwrap();
        assert_eq!(m.title, "FAQ");
        assert_eq!(m.fold, Some(Fold::Closed));
    }

    #[test]
    fn test_parse_marker_rejects() {
        assert!(CalloutMatch::parse("[!] x").is_none());
        assert!(CalloutMatch::parse("[!note1] x").is_none());
        assert!(CalloutMatch::parse("text [!note]").is_none());
        assert!(CalloutMatch::parse("[note]").is_none());
    }

    #[test]
    fn test_icon_categories() {
        for kind in ["note", "info", "todo", "unknown", "quote"] {
            assert_eq!(CalloutIcon::for_kind(kind), CalloutIcon::Note, "{kind}");
        }
        for kind in ["tip", "hint", "success", "check", "done"] {
            assert_eq!(CalloutIcon::for_kind(kind), CalloutIcon::Tip, "{kind}");
        }
        for kind in ["warning", "attention", "caution"] {
            assert_eq!(CalloutIcon::for_kind(kind), CalloutIcon::Warning, "{kind}");
        }
        for kind in ["danger", "error", "bug", "fail", "missing"] {
            assert_eq!(CalloutIcon::for_kind(kind), CalloutIcon::Danger, "{kind}");
        }
        assert_eq!(CalloutIcon::for_kind("BUG"), CalloutIcon::Danger);
    }

    #[test]
    fn test_plain_blockquote() {
        assert_eq!(
            render("> just a quote"),
            "<blockquote>\n<p>just a quote</p>\n</blockquote>\n"
        );
    }

    #[test]
    fn test_static_callout() {
        let html = render("> [!note] Title\n> body");
        assert_eq!(
            html,
            format!(
                "<div class=\"callout\" data-type=\"note\"><div class=\"callout-title\"><span class=\"callout-icon\">{SVG_NOTE}</span><span>Title</span></div><div class=\"callout-content\"><p>body</p>\n</div></div>\n"
            )
        );
        assert!(!html.contains("<details"));
        assert!(!html.contains("callout-fold"));
    }

    #[test]
    fn test_foldable_callout_open() {
        let html = render("> [!warning]+ Be careful\n> body text");
        assert!(html.starts_with("<details class=\"callout\" data-type=\"warning\" open><summary>"));
        assert!(html.contains("<span>Be careful</span>"));
        assert!(html.contains(SVG_WARNING));
        assert!(html.contains("<span class=\"callout-fold\">"));
        assert!(html.contains("<div class=\"callout-content\"><p>body text</p>\n</div></details>"));
    }

    #[test]
    fn test_foldable_callout_closed() {
        let html = render("> [!bug]- Crash\n> details");
        assert!(html.starts_with("<details class=\"callout\" data-type=\"bug\"><summary>"));
        assert!(html.contains(SVG_DANGER));
    }

    #[test]
    fn test_empty_title_uses_tag() {
        let html = render("> [!tip] \n> only body");
        assert!(html.contains("<span>TIP</span>"));
        assert!(html.contains("<p>only body</p>"));
    }

    #[test]
    fn test_unknown_type_uses_note_icon() {
        let html = render("> [!Custom] Hi");
        assert!(html.contains("data-type=\"custom\""));
        assert!(html.contains(SVG_NOTE));
        assert!(html.contains("<div class=\"callout-content\"></div>"));
    }

    #[test]
    fn test_title_is_inline_markdown() {
        let html = render("> [!note] Read **this** `now`");
        assert!(html.contains("<span>Read <strong>this</strong> <code>now</code></span>"));
    }

    #[test]
    fn test_rest_of_first_paragraph_is_relexed() {
        let html = render("> [!info] Heads up\n> see [docs](/d) *now*\n>\n> second");
        assert!(html.contains(
            "<div class=\"callout-content\"><p>see <a href=\"/d\">docs</a> <em>now</em></p>\n<p>second</p>\n</div>"
        ));
        assert!(!html.contains("[!info]"));
    }

    #[test]
    fn test_reference_links_in_title_and_body() {
        let html = render("> [!note] See [docs]\n> read [docs]\n\n[docs]: https://example.com\n");
        assert!(html.contains("<span>See <a href=\"https://example.com\">docs</a></span>"), "{html}");
        assert!(html.contains("<p>read <a href=\"https://example.com\">docs</a></p>"), "{html}");

        let plain = render("> read [docs]\n\n[docs]: https://example.com\n");
        assert!(plain.contains("<p>read <a href=\"https://example.com\">docs</a></p>"));
    }

    #[test]
    fn test_callout_with_nested_blocks() {
        let html = render("> [!note]\n>\n> - item\n>\n> ```\n> code\n> ```");
        assert!(html.contains("<span>NOTE</span>"));
        assert!(html.contains("<ul>\n<li>item</li>\n</ul>"));
        assert!(html.contains("<code>code"));
    }

    #[test]
    fn test_marker_not_first_paragraph() {
        let html = render("> intro\n>\n> [!note] late");
        assert!(html.starts_with("<blockquote>"));
    }

    #[test]
    fn test_callout_body_math() {
        let html = render("> [!note] Formula\n> $$x^2$$");
        assert!(html.contains("<div class=\"callout-content\">$$x^2$$\n</div>"));
    }
}
