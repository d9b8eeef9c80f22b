//! Token tree produced by the lexer.
//!
//! Block and inline nodes are separate sum types. Container blocks own their
//! children exclusively; [`Block::children`] exposes them uniformly so tree
//! walks (TOC extraction, code pre-highlighting) can recurse without caring
//! which container they are in.

use pulldown_cmark::Alignment;

/// Block-level token.
#[derive(Clone, Debug, PartialEq)]
pub enum Block {
    /// ATX or setext heading.
    Heading {
        /// Heading level (1-6).
        depth: u8,
        /// Plain text with markdown syntax stripped.
        text: String,
        /// Parsed inline content.
        inlines: Vec<Inline>,
    },
    /// Paragraph.
    Paragraph {
        /// Markdown source of the paragraph, container prefixes removed.
        raw: String,
        /// Parsed inline content.
        inlines: Vec<Inline>,
    },
    /// Inline content of a tight list item, rendered without `<p>`.
    Text(Vec<Inline>),
    /// Fenced or indented code block.
    Code {
        /// First word of the fence info string.
        lang: Option<String>,
        /// Code content (or a placeholder key after pre-highlighting).
        text: String,
    },
    /// Block quote (possibly a callout).
    BlockQuote(Vec<Block>),
    /// Ordered or unordered list. Children are always [`Block::ListItem`].
    List {
        /// Start number for ordered lists, `None` for bullet lists.
        start: Option<u64>,
        /// List items.
        items: Vec<Block>,
    },
    /// List item.
    ListItem {
        /// Whether the item starts with a `[ ]`/`[x]` marker.
        task: bool,
        /// Checkbox state for task items.
        checked: bool,
        /// Item content.
        blocks: Vec<Block>,
    },
    /// GFM table.
    Table {
        /// Column alignments.
        alignments: Vec<Alignment>,
        /// Header cells.
        head: Vec<Vec<Inline>>,
        /// Body rows.
        rows: Vec<Vec<Vec<Inline>>>,
    },
    /// Raw HTML block, passed through unchanged.
    Html(String),
    /// Thematic break.
    Rule,
    /// Display math (`$$...$$`), trimmed expression.
    Math(String),
}

impl Block {
    /// Nested block sequence of a container, empty for leaf blocks.
    #[must_use]
    pub fn children(&self) -> &[Block] {
        match self {
            Block::BlockQuote(blocks) | Block::ListItem { blocks, .. } => blocks,
            Block::List { items, .. } => items,
            _ => &[],
        }
    }

    /// Mutable access to the nested block sequence of a container.
    pub fn children_mut(&mut self) -> &mut [Block] {
        match self {
            Block::BlockQuote(blocks) | Block::ListItem { blocks, .. } => blocks,
            Block::List { items, .. } => items,
            _ => &mut [],
        }
    }
}

/// Inline-level token.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Inline {
    /// Literal text (unescaped).
    Text(String),
    /// Code span.
    Code(String),
    /// `*emphasis*`.
    Emphasis(Vec<Inline>),
    /// `**strong**`.
    Strong(Vec<Inline>),
    /// `~~strikethrough~~`.
    Strikethrough(Vec<Inline>),
    /// Link.
    Link {
        /// Destination URL.
        href: String,
        /// Optional title.
        title: String,
        /// Link text.
        children: Vec<Inline>,
    },
    /// Image.
    Image {
        /// Source URL.
        src: String,
        /// Optional title.
        title: String,
        /// Alt text.
        alt: String,
    },
    /// Raw inline HTML.
    Html(String),
    /// Soft line break.
    SoftBreak,
    /// Hard line break.
    HardBreak,
    /// Inline math (`$...$`), trimmed expression.
    Math(String),
}

/// Concatenate the visible text of inline tokens, dropping markup.
#[must_use]
pub fn plain_text(inlines: &[Inline]) -> String {
    let mut out = String::new();
    push_plain_text(inlines, &mut out);
    out
}

fn push_plain_text(inlines: &[Inline], out: &mut String) {
    for inline in inlines {
        match inline {
            Inline::Text(text) | Inline::Code(text) | Inline::Math(text) => out.push_str(text),
            Inline::Emphasis(children)
            | Inline::Strong(children)
            | Inline::Strikethrough(children)
            | Inline::Link { children, .. } => push_plain_text(children, out),
            Inline::Image { alt, .. } => out.push_str(alt),
            Inline::SoftBreak | Inline::HardBreak => out.push(' '),
            Inline::Html(_) => {}
        }
    }
}
