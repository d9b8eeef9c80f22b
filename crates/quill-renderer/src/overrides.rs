//! Renderer overrides for headings, code blocks and list items.

use std::fmt::Write;

use crate::html::HtmlRenderer;
use crate::token::{Block, Inline};
use crate::util::{escape_attr, escape_html, slugify};

impl HtmlRenderer<'_> {
    /// `<h{depth} id="{slug}">`.
    ///
    /// The id is recomputed from the heading text with the same slug
    /// function the TOC uses, so both always agree.
    pub(crate) fn heading(&self, depth: u8, text: &str, inlines: &[Inline], out: &mut String) {
        let id = slugify(text);
        writeln!(
            out,
            "<h{depth} id=\"{id}\">{}</h{depth}>",
            self.parse_inline(inlines)
        )
        .unwrap();
    }

    /// Resolve a code placeholder.
    ///
    /// When highlighting produced nothing, the original code is HTML-escaped
    /// inside `<code>` rather than emitted raw.
    pub(crate) fn code_block(&mut self, key: &str, out: &mut String) {
        let Some(entry) = self.code.take(key) else {
            tracing::debug!(key, "Code block without placeholder entry");
            write!(out, "<code>{}</code>", escape_html(key)).unwrap();
            return;
        };

        let data = escape_attr(&entry.original);
        if entry.html.is_empty() {
            writeln!(
                out,
                "<pre data-code=\"{data}\"><code>{}</code></pre>",
                escape_html(&entry.original)
            )
            .unwrap();
        } else {
            writeln!(out, "<pre data-code=\"{data}\">{}</pre>", entry.html).unwrap();
        }
    }

    /// `<li>`, with a disabled checkbox for task items.
    pub(crate) fn list_item(&mut self, task: bool, checked: bool, blocks: &[Block], out: &mut String) {
        let inner = self.parse(blocks);
        let inner = inner.strip_suffix('\n').unwrap_or(&inner);
        if task {
            let checkbox = if checked {
                "<input type=\"checkbox\" checked disabled />"
            } else {
                "<input type=\"checkbox\" disabled />"
            };
            writeln!(out, "<li class=\"task-list-item\">{checkbox} {inner}</li>").unwrap();
        } else {
            writeln!(out, "<li>{inner}</li>").unwrap();
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use crate::code::{CodeEntry, CodeTable};
    use crate::html::HtmlRenderer;
    use crate::lexer::Lexer;
    use crate::math::MathRenderer;
    use crate::token::Block;

    async fn render_with_code(markdown: &str) -> (String, CodeTable) {
        let lexer = Lexer::new();
        let math = MathRenderer::default();
        let (blocks, table) =
            crate::code::prehighlight(lexer.lex(markdown), None, "theme", "__T_").await;
        let mut renderer = HtmlRenderer::new(&lexer, &math, table);
        let html = renderer.parse(&blocks);
        (html, renderer.into_code_table())
    }

    fn render(markdown: &str) -> String {
        let lexer = Lexer::new();
        let math = MathRenderer::default();
        HtmlRenderer::new(&lexer, &math, CodeTable::default()).parse(&lexer.lex(markdown))
    }

    #[test]
    fn test_heading_ids() {
        assert_eq!(render("## What's New?"), "<h2 id=\"whats-new\">What&#x27;s New?</h2>\n");
        assert_eq!(
            render("# Install `npm`"),
            "<h1 id=\"install-npm\">Install <code>npm</code></h1>\n"
        );
    }

    #[test]
    fn test_duplicate_headings_share_id() {
        let html = render("## Setup\n\n## Setup");
        assert_eq!(html.matches("id=\"setup\"").count(), 2);
    }

    #[tokio::test]
    async fn test_code_without_highlighting_is_escaped() {
        let (html, table) = render_with_code("```html\n<b class=\"x\">&</b>\n```").await;
        assert_eq!(
            html,
            "<pre data-code=\"&lt;b class=&quot;x&quot;&gt;&amp;&lt;/b&gt;\"><code>&lt;b class=&quot;x&quot;&gt;&amp;&lt;/b&gt;</code></pre>\n"
        );
        assert!(table.is_empty());
    }

    #[test]
    fn test_code_with_highlighted_entry() {
        let lexer = Lexer::new();
        let math = MathRenderer::default();
        let table = {
            let mut table = CodeTable::default();
            table.insert(
                "__T_0__".to_owned(),
                CodeEntry {
                    html: "<code>hl</code>".to_owned(),
                    original: "it's".to_owned(),
                },
            );
            table
        };
        let mut renderer = HtmlRenderer::new(&lexer, &math, table);
        let html = renderer.parse(&[Block::Code {
            lang: Some("rust".to_owned()),
            text: "__T_0__".to_owned(),
        }]);
        assert_eq!(html, "<pre data-code=\"it&#39;s\"><code>hl</code></pre>\n");
    }

    #[test]
    fn test_code_without_entry_falls_back_to_inline_code() {
        let html = render("```\nnot a key\n```");
        assert_eq!(html, "<code>not a key</code>");
    }

    #[test]
    fn test_task_list_items() {
        assert_eq!(
            render("- [x] done\n- [ ] todo\n- plain"),
            "<ul>\n\
             <li class=\"task-list-item\"><input type=\"checkbox\" checked disabled /> done</li>\n\
             <li class=\"task-list-item\"><input type=\"checkbox\" disabled /> todo</li>\n\
             <li>plain</li>\n\
             </ul>\n"
        );
    }

    #[test]
    fn test_list_item_inline_markdown() {
        assert_eq!(
            render("- see [docs](/d) and *this*"),
            "<ul>\n<li>see <a href=\"/d\">docs</a> and <em>this</em></li>\n</ul>\n"
        );
    }

    #[test]
    fn test_loose_list_item_keeps_paragraphs() {
        assert_eq!(
            render("- a\n\n- b"),
            "<ul>\n<li><p>a</p></li>\n<li><p>b</p></li>\n</ul>\n"
        );
    }

    #[test]
    fn test_nested_list() {
        assert_eq!(
            render("- a\n  - b"),
            "<ul>\n<li>a<ul>\n<li>b</li>\n</ul></li>\n</ul>\n"
        );
    }

    #[test]
    fn test_heading_inline_math_fallback() {
        let lexer = Lexer::new().with_math();
        let math = MathRenderer::default();
        let html = HtmlRenderer::new(&lexer, &math, CodeTable::default())
            .parse(&lexer.lex("## Area $r^2$"));
        assert_eq!(html, "<h2 id=\"area-r2\">Area $r^2$</h2>\n");
    }
}
