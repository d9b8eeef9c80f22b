//! HTML rendering of the token tree.
//!
//! Headings, code blocks, list items and block quotes are dispatched to the
//! overrides in [`crate::overrides`] and [`crate::callout`]; every other
//! token kind gets plain semantic HTML here.

use std::fmt::Write;

use pulldown_cmark::Alignment;

use crate::code::CodeTable;
use crate::lexer::{Lexer, References};
use crate::math::MathRenderer;
use crate::token::{Block, Inline};
use crate::util::escape_html;

/// Renders blocks and inlines to HTML for one render call.
pub struct HtmlRenderer<'a> {
    pub(crate) lexer: &'a Lexer,
    pub(crate) math: &'a MathRenderer,
    pub(crate) code: CodeTable,
    pub(crate) references: References,
}

impl<'a> HtmlRenderer<'a> {
    /// Create a renderer.
    ///
    /// `lexer` re-tokenizes edited callout text; `code` resolves code block
    /// placeholders and is drained as blocks are rendered.
    #[must_use]
    pub fn new(lexer: &'a Lexer, math: &'a MathRenderer, code: CodeTable) -> Self {
        Self {
            lexer,
            math,
            code,
            references: References::default(),
        }
    }

    /// Link reference definitions of the document, used when callout text
    /// is tokenized again.
    #[must_use]
    pub fn with_references(mut self, references: References) -> Self {
        self.references = references;
        self
    }

    /// Render a block sequence.
    pub fn parse(&mut self, blocks: &[Block]) -> String {
        let mut out = String::new();
        for block in blocks {
            self.block(block, &mut out);
        }
        out
    }

    /// Render an inline sequence.
    #[must_use]
    pub fn parse_inline(&self, inlines: &[Inline]) -> String {
        let mut out = String::new();
        for inline in inlines {
            self.inline(inline, &mut out);
        }
        out
    }

    /// Placeholders that were never rendered.
    #[must_use]
    pub fn into_code_table(self) -> CodeTable {
        self.code
    }

    fn block(&mut self, block: &Block, out: &mut String) {
        match block {
            Block::Heading { depth, text, inlines } => self.heading(*depth, text, inlines, out),
            Block::Code { text, .. } => self.code_block(text, out),
            Block::ListItem { task, checked, blocks } => self.list_item(*task, *checked, blocks, out),
            Block::BlockQuote(blocks) => self.blockquote(blocks, out),
            Block::Paragraph { inlines, .. } => {
                out.push_str("<p>");
                out.push_str(&self.parse_inline(inlines));
                out.push_str("</p>\n");
            }
            Block::Text(inlines) => out.push_str(&self.parse_inline(inlines)),
            Block::List { start, items } => {
                match start {
                    None => out.push_str("<ul>\n"),
                    Some(1) => out.push_str("<ol>\n"),
                    Some(n) => writeln!(out, "<ol start=\"{n}\">").unwrap(),
                }
                for item in items {
                    self.block(item, out);
                }
                out.push_str(if start.is_some() { "</ol>\n" } else { "</ul>\n" });
            }
            Block::Table { alignments, head, rows } => self.table(alignments, head, rows, out),
            Block::Html(html) => out.push_str(html),
            Block::Rule => out.push_str("<hr>\n"),
            Block::Math(expr) => {
                out.push_str(&self.math.render(expr, true));
                out.push('\n');
            }
        }
    }

    fn table(
        &self,
        alignments: &[Alignment],
        head: &[Vec<Inline>],
        rows: &[Vec<Vec<Inline>>],
        out: &mut String,
    ) {
        out.push_str("<table>\n<thead>\n");
        self.table_row("th", alignments, head, out);
        out.push_str("</thead>\n");
        if !rows.is_empty() {
            out.push_str("<tbody>\n");
            for row in rows {
                self.table_row("td", alignments, row, out);
            }
            out.push_str("</tbody>\n");
        }
        out.push_str("</table>\n");
    }

    fn table_row(&self, tag: &str, alignments: &[Alignment], cells: &[Vec<Inline>], out: &mut String) {
        out.push_str("<tr>");
        for (i, cell) in cells.iter().enumerate() {
            let style = match alignments.get(i) {
                Some(Alignment::Left) => " style=\"text-align:left\"",
                Some(Alignment::Center) => " style=\"text-align:center\"",
                Some(Alignment::Right) => " style=\"text-align:right\"",
                Some(Alignment::None) | None => "",
            };
            write!(out, "<{tag}{style}>{}</{tag}>", self.parse_inline(cell)).unwrap();
        }
        out.push_str("</tr>\n");
    }

    fn inline(&self, inline: &Inline, out: &mut String) {
        match inline {
            Inline::Text(text) => out.push_str(&escape_html(text)),
            Inline::Code(code) => write!(out, "<code>{}</code>", escape_html(code)).unwrap(),
            Inline::Emphasis(children) => self.wrap("em", children, out),
            Inline::Strong(children) => self.wrap("strong", children, out),
            Inline::Strikethrough(children) => self.wrap("s", children, out),
            Inline::Link { href, title, children } => {
                write!(out, "<a href=\"{}\"", escape_html(href)).unwrap();
                if !title.is_empty() {
                    write!(out, " title=\"{}\"", escape_html(title)).unwrap();
                }
                out.push('>');
                for child in children {
                    self.inline(child, out);
                }
                out.push_str("</a>");
            }
            Inline::Image { src, title, alt } => {
                let title_attr = if title.is_empty() {
                    String::new()
                } else {
                    format!(" title=\"{}\"", escape_html(title))
                };
                write!(
                    out,
                    "<img src=\"{}\"{title_attr} alt=\"{}\">",
                    escape_html(src),
                    escape_html(alt)
                )
                .unwrap();
            }
            Inline::Html(html) => out.push_str(html),
            Inline::SoftBreak => out.push('\n'),
            Inline::HardBreak => out.push_str("<br>\n"),
            Inline::Math(expr) => out.push_str(&self.math.render(expr, false)),
        }
    }

    fn wrap(&self, tag: &str, children: &[Inline], out: &mut String) {
        write!(out, "<{tag}>").unwrap();
        for child in children {
            self.inline(child, out);
        }
        write!(out, "</{tag}>").unwrap();
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn render(markdown: &str) -> String {
        let lexer = Lexer::new().with_math();
        let math = MathRenderer::default();
        let blocks = lexer.lex(markdown);
        HtmlRenderer::new(&lexer, &math, CodeTable::default()).parse(&blocks)
    }

    #[test]
    fn test_paragraph_and_inline_formatting() {
        assert_eq!(
            render("Hello **bold** *em* ~~gone~~ `x<y`"),
            "<p>Hello <strong>bold</strong> <em>em</em> <s>gone</s> <code>x&lt;y</code></p>\n"
        );
    }

    #[test]
    fn test_text_is_escaped() {
        assert_eq!(render("a < b & c"), "<p>a &lt; b &amp; c</p>\n");
    }

    #[test]
    fn test_links_and_images() {
        assert_eq!(
            render(r#"[site](https://example.com "Home") ![logo](a.png)"#),
            "<p><a href=\"https://example.com\" title=\"Home\">site</a> <img src=\"a.png\" alt=\"logo\"></p>\n"
        );
    }

    #[test]
    fn test_lists() {
        assert_eq!(
            render("1. one\n2. two"),
            "<ol>\n<li>one</li>\n<li>two</li>\n</ol>\n"
        );
        assert_eq!(render("3. three"), "<ol start=\"3\">\n<li>three</li>\n</ol>\n");
        assert_eq!(render("- a"), "<ul>\n<li>a</li>\n</ul>\n");
    }

    #[test]
    fn test_table_alignment() {
        let html = render("| L | C | R |\n|:--|:-:|--:|\n| 1 | 2 | 3 |");
        assert!(html.contains(r#"<th style="text-align:left">L</th>"#));
        assert!(html.contains(r#"<th style="text-align:center">C</th>"#));
        assert!(html.contains(r#"<td style="text-align:right">3</td>"#));
    }

    #[test]
    fn test_rule_and_breaks() {
        assert_eq!(render("---"), "<hr>\n");
        assert_eq!(render("a  \nb"), "<p>a<br>\nb</p>\n");
    }

    #[test]
    fn test_raw_html_passthrough() {
        assert_eq!(render("<div>raw</div>\n"), "<div>raw</div>\n");
    }

    #[test]
    fn test_math_without_engine_is_literal() {
        assert_eq!(render("$$x^2$$"), "$$x^2$$\n");
        assert_eq!(render("area $a<b$"), "<p>area $a<b$</p>\n");
    }
}
