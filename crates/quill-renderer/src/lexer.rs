//! Markdown lexer.
//!
//! Folds the pulldown-cmark event stream into an owned [`Block`] tree and
//! layers registered grammar rules on top:
//!
//! - Block rules are tried at top-level line starts outside fenced code and
//!   HTML blocks. Markdown between recognised blocks is parsed as ordinary
//!   markdown, with link reference definitions shared across the whole
//!   document. Paragraph and tight list item text is also checked at each
//!   line start, which covers blocks nested inside quotes and lists.
//! - Inline rules run over the raw source before pulldown-cmark resolves
//!   emphasis, links and raw HTML, so a match wins over any of those that
//!   starts later. Matches are blanked out of the text pulldown-cmark sees
//!   and spliced back in as tokens. Code spans, code and HTML blocks, link
//!   destinations and autolinks are never offered to inline rules, a match
//!   stays inside its table cell, and a backslash-escaped character can
//!   neither start nor end a match.

use std::collections::HashMap;
use std::ops::Range;

use pulldown_cmark::{BrokenLink, CodeBlockKind, CowStr, Event, LinkType, Options, Parser, Tag, TagEnd};

use crate::grammar::{BlockMatch, BlockRule, InlineMatch, InlineRule};
use crate::math::{MathBlockRule, MathInlineRule};
use crate::token::{Block, Inline, plain_text};
use crate::util::heading_level_to_num;

/// Link reference definitions of a document, keyed by normalized label.
///
/// Passed to the lexer when a fragment is tokenized apart from the document
/// that defines its `[label]` links.
#[derive(Clone, Debug, Default)]
pub struct References(HashMap<String, (String, String)>);

impl References {
    /// Number of definitions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether there are no definitions.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    fn resolve<'a>(&self, label: &str) -> Option<(CowStr<'a>, CowStr<'a>)> {
        self.0
            .get(&normalize_label(label))
            .map(|(dest, title)| (CowStr::from(dest.clone()), CowStr::from(title.clone())))
    }
}

/// Markdown lexer with pluggable grammar rules.
pub struct Lexer {
    gfm: bool,
    block_rules: Vec<Box<dyn BlockRule>>,
    inline_rules: Vec<Box<dyn InlineRule>>,
}

impl Default for Lexer {
    fn default() -> Self {
        Self::new()
    }
}

impl Lexer {
    /// Create a lexer with GFM enabled and no extra rules.
    #[must_use]
    pub fn new() -> Self {
        Self {
            gfm: true,
            block_rules: Vec::new(),
            inline_rules: Vec::new(),
        }
    }

    /// Enable or disable GFM tables, strikethrough and task lists.
    #[must_use]
    pub fn with_gfm(mut self, enabled: bool) -> Self {
        self.gfm = enabled;
        self
    }

    /// Register a block rule. Rules are tried in registration order.
    #[must_use]
    pub fn with_block_rule(mut self, rule: impl BlockRule + 'static) -> Self {
        self.block_rules.push(Box::new(rule));
        self
    }

    /// Register an inline rule. Rules are tried in registration order.
    #[must_use]
    pub fn with_inline_rule(mut self, rule: impl InlineRule + 'static) -> Self {
        self.inline_rules.push(Box::new(rule));
        self
    }

    /// Register `$$...$$` and `$...$` math rules.
    #[must_use]
    pub fn with_math(self) -> Self {
        self.with_block_rule(MathBlockRule)
            .with_inline_rule(MathInlineRule)
    }

    fn options(&self) -> Options {
        if self.gfm {
            Options::ENABLE_TABLES | Options::ENABLE_STRIKETHROUGH | Options::ENABLE_TASKLISTS
        } else {
            Options::empty()
        }
    }

    /// Tokenize a markdown document.
    #[must_use]
    pub fn lex(&self, src: &str) -> Vec<Block> {
        let references = if self.block_rules.is_empty() {
            References::default()
        } else {
            self.references(src)
        };
        self.lex_with_references(src, &references)
    }

    /// Collect the link reference definitions of a document.
    #[must_use]
    pub fn references(&self, src: &str) -> References {
        let parser = Parser::new_ext(src, self.options());
        References(
            parser
                .reference_definitions()
                .iter()
                .map(|(label, def)| {
                    let title = def.title.as_deref().unwrap_or_default().to_owned();
                    (normalize_label(label), (def.dest.to_string(), title))
                })
                .collect(),
        )
    }

    /// Tokenize a markdown fragment.
    ///
    /// `[label]` links the fragment does not define itself resolve against
    /// `references`.
    #[must_use]
    pub fn lex_with_references(&self, src: &str, references: &References) -> Vec<Block> {
        let mut blocks = Vec::new();
        for part in self.split_top_level(src) {
            match part {
                Part::Markdown(range) => {
                    blocks.extend(self.parse_markdown(&src[range], references));
                }
                Part::Block(block) => blocks.push(block),
            }
        }
        blocks
    }

    /// Tokenize markdown as inline content.
    ///
    /// Leaf blocks are flattened into one inline sequence, separated by soft
    /// breaks. Display math becomes inline math.
    #[must_use]
    pub fn lex_inline(&self, src: &str) -> Vec<Inline> {
        let mut inlines = Vec::new();
        flatten_inlines(self.lex(src), &mut inlines);
        inlines
    }

    /// [`Lexer::lex_inline`] with external link reference definitions.
    #[must_use]
    pub fn lex_inline_with_references(&self, src: &str, references: &References) -> Vec<Inline> {
        let mut inlines = Vec::new();
        flatten_inlines(self.lex_with_references(src, references), &mut inlines);
        inlines
    }

    /// Split the document at block-rule matches found at line starts.
    fn split_top_level(&self, src: &str) -> Vec<Part> {
        let mut parts = Vec::new();
        if self.block_rules.is_empty() {
            parts.push(Part::Markdown(0..src.len()));
            return parts;
        }

        let mut fences = crate::fence::FenceTracker::new();
        let mut segment_start = 0;
        let mut line_start = 0;
        let mut candidate = self.next_block_candidate(src, 0);
        let mut html_blocks = if candidate.is_some() {
            self.html_block_ranges(src, 0)
        } else {
            Vec::new()
        };

        while line_start < src.len() {
            let Some(next) = candidate else { break };
            let line_end = src[line_start..]
                .find('\n')
                .map_or(src.len(), |i| line_start + i + 1);

            let was_in_fence = fences.in_fence();
            let toggled = fences.update(src[line_start..line_end].trim_end_matches(['\n', '\r']));
            let in_html = html_blocks
                .iter()
                .any(|r| r.start < line_start && line_start < r.end);

            if !was_in_fence
                && !toggled
                && !in_html
                && next == line_start
                && let Some(m) = self.match_block(&src[line_start..])
            {
                if segment_start < line_start {
                    parts.push(Part::Markdown(segment_start..line_start));
                }
                parts.push(Part::Block(m.block));
                let consumed = line_start..line_start + m.consumed;
                line_start = consumed.end;
                segment_start = line_start;
                candidate = self.next_block_candidate(src, line_start);
                // HTML blocks seen inside the consumed text were never real.
                if html_blocks
                    .iter()
                    .any(|r| r.start < consumed.end && consumed.start < r.end)
                {
                    html_blocks = self.html_block_ranges(src, line_start);
                }
                continue;
            }

            if next < line_end {
                candidate = self.next_block_candidate(src, line_end);
            }
            line_start = line_end;
        }

        if segment_start < src.len() || parts.is_empty() {
            parts.push(Part::Markdown(segment_start..src.len()));
        }
        parts
    }

    /// Source ranges of the HTML blocks in `src[from..]`.
    fn html_block_ranges(&self, src: &str, from: usize) -> Vec<Range<usize>> {
        Parser::new_ext(&src[from..], self.options())
            .into_offset_iter()
            .filter_map(|(event, range)| {
                matches!(event, Event::Start(Tag::HtmlBlock)).then_some(from + range.start..from + range.end)
            })
            .collect()
    }

    fn next_block_candidate(&self, src: &str, from: usize) -> Option<usize> {
        self.block_rules
            .iter()
            .filter_map(|rule| rule.start(&src[from..]))
            .min()
            .map(|offset| from + offset)
    }

    fn match_block(&self, src: &str) -> Option<BlockMatch> {
        self.block_rules.iter().find_map(|rule| {
            let m = rule.tokenize(src)?;
            tracing::trace!(rule = rule.name(), consumed = m.consumed, "Block rule matched");
            (m.consumed > 0 && m.consumed <= src.len()).then_some(m)
        })
    }

    /// Split leaf-block text at line starts where a block rule matches.
    ///
    /// Returns `None` when nothing matched.
    fn split_leaf(&self, raw: &str) -> Option<Vec<Part>> {
        if !self.block_rules.iter().any(|rule| rule.start(raw).is_some()) {
            return None;
        }

        let mut parts = Vec::new();
        let mut text_start = 0;
        let mut pos = 0;
        while pos < raw.len() {
            if let Some(m) = self.match_block(&raw[pos..]) {
                if !raw[text_start..pos].trim().is_empty() {
                    parts.push(Part::Markdown(text_start..pos));
                }
                parts.push(Part::Block(m.block));
                pos += m.consumed;
                text_start = pos;
                continue;
            }
            pos = raw[pos..].find('\n').map_or(raw.len(), |i| pos + i + 1);
        }

        if text_start == 0 {
            return None;
        }
        if !raw[text_start..].trim().is_empty() {
            parts.push(Part::Markdown(text_start..raw.len()));
        }
        Some(parts)
    }

    fn parse_markdown(&self, src: &str, references: &References) -> Vec<Block> {
        let masked = self.mask_inline(src, references);
        let callback = |link: BrokenLink| references.resolve(&link.reference);
        let parser = Parser::new_with_broken_link_callback(&masked.text, self.options(), Some(callback));

        let mut builder = TreeBuilder {
            cx: Context {
                lexer: self,
                source: src,
                masked: &masked,
                references,
            },
            stack: Vec::new(),
            root: Vec::new(),
        };
        for (event, range) in parser.into_offset_iter() {
            builder.event(event, range);
        }
        builder.finish()
    }

    fn next_inline_candidate(&self, src: &str, from: usize) -> Option<usize> {
        self.inline_rules
            .iter()
            .filter_map(|rule| rule.start(&src[from..]))
            .min()
            .map(|offset| from + offset)
    }

    /// Find inline-rule matches in `src` and blank them out.
    ///
    /// Matches are taken left to right. Each is replaced by filler text of
    /// the same byte length, so pulldown-cmark offsets still point into
    /// `src`.
    fn mask_inline(&self, src: &str, references: &References) -> Masked {
        let mut masked = Masked {
            text: src.to_owned(),
            matches: Vec::new(),
        };
        let Some(mut at) = self.next_inline_candidate(src, 0) else {
            return masked;
        };
        let guards = InlineGuards::scan(src, self.options(), references);

        loop {
            if !src.is_char_boundary(at) {
                break;
            }
            let pos = if let Some(end) = guards.opaque_end(at) {
                end
            } else if let Some(m) = self.match_inline(src, at, &guards) {
                let stop = at + m.consumed;
                masked.text.replace_range(at..stop, &MASK_FILLER.repeat(m.consumed));
                masked.matches.push((at..stop, m.inline));
                stop
            } else {
                at + src[at..].chars().next().map_or(1, char::len_utf8)
            };
            if pos >= src.len() {
                break;
            }
            match self.next_inline_candidate(src, pos) {
                Some(next) => at = next,
                None => break,
            }
        }
        masked
    }

    fn match_inline(&self, src: &str, at: usize, guards: &InlineGuards) -> Option<InlineMatch> {
        if is_escaped(src, at) {
            return None;
        }
        self.inline_rules.iter().find_map(|rule| {
            let m = rule.tokenize(&src[at..])?;
            let stop = at + m.consumed;
            let valid = m.consumed > 0
                && src.is_char_boundary(stop)
                && !src[at..stop].contains('\n')
                && !ends_escaped(src, stop)
                && guards.allows(&(at..stop));
            if valid {
                tracing::trace!(rule = rule.name(), consumed = m.consumed, "Inline rule matched");
            }
            valid.then_some(m)
        })
    }
}

/// Filler for masked inline-rule matches.
const MASK_FILLER: &str = "x";

/// Markdown source with inline-rule matches blanked out.
struct Masked {
    /// Text handed to pulldown-cmark; same length as the source.
    text: String,
    /// Source range and token of every match, in source order.
    matches: Vec<(Range<usize>, Inline)>,
}

/// Source ranges inline rules must respect, taken from a first parse.
#[derive(Default)]
struct InlineGuards {
    /// Code, raw HTML, autolinks and reference definition targets.
    /// A match may not start inside one.
    opaque: Vec<Range<usize>>,
    /// Link and image destinations with their titles. A match may not
    /// overlap one.
    barriers: Vec<Range<usize>>,
    /// Table cells. A match must end inside the cell it starts in.
    cells: Vec<Range<usize>>,
}

impl InlineGuards {
    fn scan(src: &str, options: Options, references: &References) -> Self {
        let callback = |link: BrokenLink| references.resolve(&link.reference);
        let mut events = Parser::new_with_broken_link_callback(src, options, Some(callback)).into_offset_iter();
        let mut guards = Self::default();
        // End of the text so far, per open link.
        let mut links: Vec<usize> = Vec::new();

        for (event, range) in events.by_ref() {
            if matches!(event, Event::End(TagEnd::Link | TagEnd::Image))
                && let Some(text_end) = links.pop()
            {
                guards.barriers.push(text_end..range.end);
            }
            if let Some(text_end) = links.last_mut() {
                *text_end = (*text_end).max(range.end);
            }

            match event {
                Event::Start(Tag::Link { link_type, .. }) => {
                    if matches!(link_type, LinkType::Autolink | LinkType::Email) {
                        guards.opaque.push(range.clone());
                    }
                    links.push(range.start + 1);
                }
                Event::Start(Tag::Image { .. }) => links.push(range.start + 2),
                Event::Start(Tag::CodeBlock(_) | Tag::HtmlBlock) | Event::Code(_) | Event::InlineHtml(_) => {
                    guards.opaque.push(range);
                }
                Event::Start(Tag::TableCell) => guards.cells.push(range),
                _ => {}
            }
        }

        for (_, def) in events.reference_definitions().iter() {
            if let Some(target) = src.get(def.span.clone()).and_then(|text| text.find("]:")) {
                guards.opaque.push(def.span.start + target..def.span.end);
            }
        }
        guards
    }

    /// End of the opaque or barrier range containing `pos`.
    fn opaque_end(&self, pos: usize) -> Option<usize> {
        self.opaque
            .iter()
            .chain(&self.barriers)
            .filter(|r| r.start <= pos && pos < r.end)
            .map(|r| r.end)
            .max()
    }

    fn allows(&self, span: &Range<usize>) -> bool {
        let crosses_barrier = self
            .barriers
            .iter()
            .any(|r| r.start < span.end && span.start < r.end);
        let leaves_cell = self
            .cells
            .iter()
            .any(|r| r.start <= span.start && span.start < r.end && span.end > r.end);
        !crosses_barrier && !leaves_cell
    }
}

/// Whether the character at `pos` follows an odd run of backslashes.
fn is_escaped(src: &str, pos: usize) -> bool {
    src[..pos].bytes().rev().take_while(|&b| b == b'\\').count() % 2 == 1
}

/// Whether the last character before `stop` is backslash-escaped.
fn ends_escaped(src: &str, stop: usize) -> bool {
    src[..stop]
        .char_indices()
        .next_back()
        .is_some_and(|(last, _)| is_escaped(src, last))
}

/// Piece of a document or leaf block: markdown source or a rule-produced block.
enum Part {
    Markdown(Range<usize>),
    Block(Block),
}

fn normalize_label(label: &str) -> String {
    label.split_whitespace().collect::<Vec<_>>().join(" ").to_lowercase()
}

fn flatten_inlines(blocks: Vec<Block>, out: &mut Vec<Inline>) {
    for block in blocks {
        let inlines = match block {
            Block::Heading { inlines, .. } | Block::Paragraph { inlines, .. } | Block::Text(inlines) => inlines,
            Block::Code { text, .. } => vec![Inline::Code(text)],
            Block::Math(expr) => vec![Inline::Math(expr)],
            Block::Html(html) => vec![Inline::Html(html)],
            Block::BlockQuote(blocks) | Block::ListItem { blocks, .. } | Block::List { items: blocks, .. } => {
                flatten_inlines(blocks, out);
                continue;
            }
            Block::Table { head, rows, .. } => {
                let mut cells = Vec::new();
                for cell in head.into_iter().chain(rows.into_iter().flatten()) {
                    if !cells.is_empty() {
                        cells.push(Inline::Text(" ".to_owned()));
                    }
                    cells.extend(cell);
                }
                cells
            }
            Block::Rule => continue,
        };
        if inlines.is_empty() {
            continue;
        }
        if !out.is_empty() {
            out.push(Inline::SoftBreak);
        }
        out.extend(inlines);
    }
}

/// Rebuild the markdown source of a leaf block.
///
/// The first line is kept as is. Continuation lines lose up to `quote_depth`
/// `>` markers and their indentation.
fn leaf_raw(source: &str, range: Range<usize>, quote_depth: usize) -> String {
    let mut out = String::with_capacity(range.len());
    for (i, line) in source[range].split('\n').enumerate() {
        let line = line.strip_suffix('\r').unwrap_or(line);
        if i == 0 {
            out.push_str(line.trim_start());
            continue;
        }
        out.push('\n');
        let mut rest = line;
        for _ in 0..quote_depth {
            match rest.trim_start().strip_prefix('>') {
                Some(after) => rest = after.strip_prefix(' ').unwrap_or(after),
                None => break,
            }
        }
        out.push_str(rest.trim_start());
    }
    out.truncate(out.trim_end().len());
    out
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum SegmentKind {
    /// Decoded text equals the source.
    Verbatim,
    /// A backslash escape; `raw` covers the backslash and the character.
    Escape,
    /// Entity or anything else that cannot be split.
    Opaque,
}

#[derive(Debug)]
struct Segment {
    raw: Range<usize>,
    text: String,
    kind: SegmentKind,
}

/// Align a text event with its source span.
fn align_text(source: &str, range: Range<usize>, text: &str, prev_end: Option<usize>, out: &mut Vec<Segment>) {
    let mut start = range.start;
    let mut text = text;

    // pulldown-cmark may leave the escaping backslash outside the event range.
    if prev_end != Some(start)
        && source[..start].ends_with('\\')
        && let Some(c) = text.chars().next().filter(char::is_ascii_punctuation)
        && source[start..].starts_with(c)
    {
        out.push(Segment {
            raw: start - 1..start + 1,
            text: c.to_string(),
            kind: SegmentKind::Escape,
        });
        start += 1;
        text = &text[1..];
    }

    let raw = &source[start..range.end.max(start)];
    let (mut i, mut j) = (0, 0);
    let mut verbatim: Option<(usize, usize)> = None;
    let flush = |verbatim: &mut Option<(usize, usize)>, i: usize, out: &mut Vec<Segment>| {
        if let Some((from_raw, from_text)) = verbatim.take() {
            out.push(Segment {
                raw: start + from_raw..start + i,
                text: text[from_text..from_text + (i - from_raw)].to_owned(),
                kind: SegmentKind::Verbatim,
            });
        }
    };

    while let (Some(rc), Some(tc)) = (raw[i..].chars().next(), text[j..].chars().next()) {
        if rc == '\\' && tc.is_ascii_punctuation() && raw[i + 1..].starts_with(tc) {
            flush(&mut verbatim, i, out);
            out.push(Segment {
                raw: start + i..start + i + 2,
                text: tc.to_string(),
                kind: SegmentKind::Escape,
            });
            i += 2;
            j += 1;
            continue;
        }
        if rc == '&'
            && let Some((raw_len, text_len)) = entity_at(&raw[i..], &text[j..])
        {
            flush(&mut verbatim, i, out);
            out.push(Segment {
                raw: start + i..start + i + raw_len,
                text: text[j..j + text_len].to_owned(),
                kind: SegmentKind::Opaque,
            });
            i += raw_len;
            j += text_len;
            continue;
        }
        if rc == tc {
            verbatim.get_or_insert((i, j));
            i += rc.len_utf8();
            j += tc.len_utf8();
            continue;
        }
        break;
    }
    flush(&mut verbatim, i, out);

    if i < raw.len() || j < text.len() {
        out.push(Segment {
            raw: start + i..start + raw.len(),
            text: text[j..].to_owned(),
            kind: SegmentKind::Opaque,
        });
    }
}

/// Match an entity reference at the start of `raw` against its decoded form.
///
/// Returns the source length and decoded length. The decoded text is one or
/// two characters; the text after it must line up with the source again.
fn entity_at(raw: &str, text: &str) -> Option<(usize, usize)> {
    let semi = raw.get(..32).unwrap_or(raw).find(';')?;
    let name = &raw[1..semi];
    if name.is_empty() || !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '#') {
        return None;
    }
    let raw_len = semi + 1;
    let next_raw = raw[raw_len..].chars().next();
    text.char_indices()
        .skip(1)
        .map(|(idx, _)| idx)
        .chain(std::iter::once(text.len()))
        .take(2)
        .find(|&len| text[len..].chars().next() == next_raw)
        .map(|len| (raw_len, len))
}

fn splits_segment(segments: &[Segment], pos: usize) -> bool {
    segments
        .iter()
        .any(|s| s.kind != SegmentKind::Verbatim && s.raw.start < pos && pos < s.raw.end)
}

/// Decode a run of text segments, splicing masked inline-rule matches
/// back in as tokens.
fn splice_run(cx: Context<'_>, segments: &[Segment], out: &mut Vec<Inline>) {
    let (Some(first), Some(last)) = (segments.first(), segments.last()) else {
        return;
    };
    let (base, end) = (first.raw.start, last.raw.end);
    let matches = &cx.masked.matches;
    let from = matches.partition_point(|(range, _)| range.start < base);

    let mut emitted = base;
    for (range, inline) in &matches[from..] {
        if range.start >= end {
            break;
        }
        let stop = range.end.min(end);
        push_text(out, decode(segments, emitted, range.start));
        if stop < range.end || splits_segment(segments, range.start) || splits_segment(segments, stop) {
            push_text(out, cx.source[range.start..stop].to_owned());
        } else {
            out.push(inline.clone());
        }
        emitted = stop;
    }
    push_text(out, decode(segments, emitted, end));
}

/// Decoded text for the source span `from..to`.
fn decode(segments: &[Segment], from: usize, to: usize) -> String {
    let mut out = String::new();
    for segment in segments {
        let Range { start, end } = segment.raw;
        if end <= from || start >= to {
            continue;
        }
        match segment.kind {
            SegmentKind::Verbatim => {
                out.push_str(&segment.text[from.max(start) - start..to.min(end) - start]);
            }
            SegmentKind::Escape | SegmentKind::Opaque => out.push_str(&segment.text),
        }
    }
    out
}

fn push_text(out: &mut Vec<Inline>, text: String) {
    if text.is_empty() {
        return;
    }
    if let Some(Inline::Text(last)) = out.last_mut() {
        last.push_str(&text);
    } else {
        out.push(Inline::Text(text));
    }
}

enum InlineItem {
    Text { range: Range<usize>, text: String, prev_end: Option<usize> },
    Node(Inline),
}

/// Inline events collected for one container.
#[derive(Default)]
struct InlineBuf {
    items: Vec<InlineItem>,
    span: Option<Range<usize>>,
}

impl InlineBuf {
    fn extend_span(&mut self, range: &Range<usize>) {
        self.span = Some(match self.span.take() {
            Some(span) => span.start.min(range.start)..span.end.max(range.end),
            None => range.clone(),
        });
    }

    fn push_text(&mut self, range: Range<usize>, text: String) {
        let prev_end = self.span.as_ref().map(|s| s.end);
        self.extend_span(&range);
        self.items.push(InlineItem::Text { range, text, prev_end });
    }

    fn push_node(&mut self, range: &Range<usize>, inline: Inline) {
        self.extend_span(range);
        self.items.push(InlineItem::Node(inline));
    }

    fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Merge text runs and restore inline-rule matches.
    fn finish(self, cx: Context<'_>) -> Vec<Inline> {
        let mut out = Vec::new();
        let mut run = Vec::new();
        for item in self.items {
            match item {
                InlineItem::Text { range, text, prev_end } => {
                    align_text(&cx.masked.text, range, &text, prev_end, &mut run);
                }
                InlineItem::Node(inline) => {
                    splice_run(cx, &run, &mut out);
                    run.clear();
                    out.push(inline);
                }
            }
        }
        splice_run(cx, &run, &mut out);
        out
    }
}

#[derive(Clone, Copy)]
enum SpanKind {
    Emphasis,
    Strong,
    Strikethrough,
}

enum Frame {
    Quote(Vec<Block>),
    List {
        start: Option<u64>,
        items: Vec<Block>,
    },
    Item {
        task: Option<bool>,
        blocks: Vec<Block>,
        text: InlineBuf,
    },
    Paragraph {
        start: usize,
        end: usize,
        inlines: InlineBuf,
    },
    Heading {
        depth: u8,
        inlines: InlineBuf,
    },
    Code {
        lang: Option<String>,
        text: String,
    },
    Html(String),
    Table {
        alignments: Vec<pulldown_cmark::Alignment>,
        head: Vec<Vec<Inline>>,
        rows: Vec<Vec<Vec<Inline>>>,
    },
    Row {
        head: bool,
        cells: Vec<Vec<Inline>>,
    },
    Cell(InlineBuf),
    Span(SpanKind, InlineBuf),
    Link {
        href: String,
        title: String,
        inlines: InlineBuf,
    },
    Image {
        src: String,
        title: String,
        inlines: InlineBuf,
    },
    /// Container without a token of its own; content goes to the parent.
    Transparent,
}

impl Frame {
    fn inline_buf(&mut self) -> Option<&mut InlineBuf> {
        match self {
            Frame::Item { text, .. } => Some(text),
            Frame::Paragraph { inlines, .. }
            | Frame::Heading { inlines, .. }
            | Frame::Cell(inlines)
            | Frame::Span(_, inlines)
            | Frame::Link { inlines, .. }
            | Frame::Image { inlines, .. } => Some(inlines),
            _ => None,
        }
    }
}

/// Everything a tree builder needs to finish leaf blocks.
#[derive(Clone, Copy)]
struct Context<'a> {
    lexer: &'a Lexer,
    /// Unmasked markdown, for paragraph raw text.
    source: &'a str,
    masked: &'a Masked,
    references: &'a References,
}

/// Builds the token tree from pulldown-cmark events.
struct TreeBuilder<'a> {
    cx: Context<'a>,
    stack: Vec<Frame>,
    root: Vec<Block>,
}

impl TreeBuilder<'_> {
    fn event(&mut self, event: Event<'_>, range: Range<usize>) {
        match event {
            Event::Start(tag) => self.start(tag, range),
            Event::End(_) => self.end(&range),
            Event::Text(text) => self.text(range, &text),
            Event::Html(html) => {
                if let Some(Frame::Html(block)) = self.stack.last_mut() {
                    block.push_str(&html);
                } else {
                    self.push_block(Block::Html(html.into_string()));
                }
            }
            Event::InlineHtml(html) => self.push_inline(&range, Inline::Html(html.into_string())),
            Event::Code(code) => self.push_inline(&range, Inline::Code(code.into_string())),
            Event::InlineMath(expr) | Event::DisplayMath(expr) => {
                self.push_inline(&range, Inline::Math(expr.into_string()));
            }
            Event::FootnoteReference(label) => {
                self.push_inline(&range, Inline::Text(format!("[^{label}]")));
            }
            Event::SoftBreak => self.push_inline(&range, Inline::SoftBreak),
            Event::HardBreak => self.push_inline(&range, Inline::HardBreak),
            Event::Rule => self.push_block(Block::Rule),
            Event::TaskListMarker(checked) => self.task_marker(checked, &range),
        }
    }

    fn text(&mut self, range: Range<usize>, text: &str) {
        if let Some(Frame::Code { text: code, .. }) = self.stack.last_mut() {
            code.push_str(text);
        } else if let Some(Frame::Html(html)) = self.stack.last_mut() {
            html.push_str(text);
        } else if let Some(buf) = self.inline_buf() {
            buf.push_text(range, text.to_owned());
        }
    }

    fn start(&mut self, tag: Tag<'_>, range: Range<usize>) {
        let frame = match tag {
            Tag::Paragraph => Frame::Paragraph {
                start: range.start,
                end: range.end,
                inlines: InlineBuf::default(),
            },
            Tag::Heading { level, .. } => Frame::Heading {
                depth: heading_level_to_num(level),
                inlines: InlineBuf::default(),
            },
            Tag::BlockQuote(_) => Frame::Quote(Vec::new()),
            Tag::CodeBlock(kind) => Frame::Code {
                lang: match kind {
                    CodeBlockKind::Fenced(info) => info.split_whitespace().next().map(str::to_owned),
                    CodeBlockKind::Indented => None,
                },
                text: String::new(),
            },
            Tag::HtmlBlock => Frame::Html(String::new()),
            Tag::List(start) => Frame::List {
                start,
                items: Vec::new(),
            },
            Tag::Item => Frame::Item {
                task: None,
                blocks: Vec::new(),
                text: InlineBuf::default(),
            },
            Tag::Table(alignments) => Frame::Table {
                alignments,
                head: Vec::new(),
                rows: Vec::new(),
            },
            Tag::TableHead => Frame::Row {
                head: true,
                cells: Vec::new(),
            },
            Tag::TableRow => Frame::Row {
                head: false,
                cells: Vec::new(),
            },
            Tag::TableCell => Frame::Cell(InlineBuf::default()),
            Tag::Emphasis => Frame::Span(SpanKind::Emphasis, InlineBuf::default()),
            Tag::Strong => Frame::Span(SpanKind::Strong, InlineBuf::default()),
            Tag::Strikethrough => Frame::Span(SpanKind::Strikethrough, InlineBuf::default()),
            Tag::Link { dest_url, title, .. } => Frame::Link {
                href: dest_url.into_string(),
                title: title.into_string(),
                inlines: InlineBuf::default(),
            },
            Tag::Image { dest_url, title, .. } => Frame::Image {
                src: dest_url.into_string(),
                title: title.into_string(),
                inlines: InlineBuf::default(),
            },
            Tag::FootnoteDefinition(_)
            | Tag::DefinitionList
            | Tag::DefinitionListTitle
            | Tag::DefinitionListDefinition
            | Tag::Superscript
            | Tag::Subscript
            | Tag::MetadataBlock(_) => Frame::Transparent,
        };
        self.stack.push(frame);
    }

    fn end(&mut self, range: &Range<usize>) {
        let Some(frame) = self.stack.pop() else {
            return;
        };
        let cx = self.cx;
        match frame {
            Frame::Paragraph { start, end, inlines } => {
                let depth = self.quote_depth();
                let blocks = finish_leaf(cx, start..end, inlines, depth, true);
                for block in blocks {
                    self.push_block(block);
                }
            }
            Frame::Heading { depth, inlines } => {
                let inlines = inlines.finish(cx);
                self.push_block(Block::Heading {
                    depth,
                    text: plain_text(&inlines).trim().to_owned(),
                    inlines,
                });
            }
            Frame::Quote(blocks) => self.push_block(Block::BlockQuote(blocks)),
            Frame::Code { lang, mut text } => {
                if text.ends_with('\n') {
                    text.pop();
                }
                self.push_block(Block::Code { lang, text });
            }
            Frame::Html(html) => self.push_block(Block::Html(html)),
            Frame::List { start, items } => self.push_block(Block::List { start, items }),
            Frame::Item { task, mut blocks, text } => {
                if !text.is_empty() {
                    let depth = self.quote_depth();
                    blocks.extend(finish_tight(cx, text, depth));
                }
                self.push_block(Block::ListItem {
                    task: task.is_some(),
                    checked: task.unwrap_or(false),
                    blocks,
                });
            }
            Frame::Table { alignments, head, rows } => {
                self.push_block(Block::Table { alignments, head, rows });
            }
            Frame::Row { head, cells } => {
                if let Some(Frame::Table { head: table_head, rows, .. }) = self.stack.last_mut() {
                    if head {
                        *table_head = cells;
                    } else {
                        rows.push(cells);
                    }
                }
            }
            Frame::Cell(inlines) => {
                let cell = inlines.finish(cx);
                if let Some(Frame::Row { cells, .. }) = self.stack.last_mut() {
                    cells.push(cell);
                }
            }
            Frame::Span(kind, inlines) => {
                let children = inlines.finish(cx);
                let inline = match kind {
                    SpanKind::Emphasis => Inline::Emphasis(children),
                    SpanKind::Strong => Inline::Strong(children),
                    SpanKind::Strikethrough => Inline::Strikethrough(children),
                };
                self.push_inline(range, inline);
            }
            Frame::Link { href, title, inlines } => {
                let children = inlines.finish(cx);
                self.push_inline(range, Inline::Link { href, title, children });
            }
            Frame::Image { src, title, inlines } => {
                let alt = plain_text(&inlines.finish(cx));
                self.push_inline(range, Inline::Image { src, title, alt });
            }
            Frame::Transparent => {}
        }
    }

    fn quote_depth(&self) -> usize {
        self.stack
            .iter()
            .filter(|frame| matches!(frame, Frame::Quote(_)))
            .count()
    }

    fn inline_buf(&mut self) -> Option<&mut InlineBuf> {
        self.stack.iter_mut().rev().find_map(Frame::inline_buf)
    }

    fn push_inline(&mut self, range: &Range<usize>, inline: Inline) {
        match self.inline_buf() {
            Some(buf) => buf.push_node(range, inline),
            None => self.push_block(Block::Text(vec![inline])),
        }
    }

    fn task_marker(&mut self, checked: bool, range: &Range<usize>) {
        for frame in self.stack.iter_mut().rev() {
            match frame {
                // The marker is not paragraph content.
                Frame::Paragraph { start, .. } => *start = (*start).max(range.end),
                Frame::Item { task, .. } => {
                    *task = Some(checked);
                    return;
                }
                _ => {}
            }
        }
    }

    fn push_block(&mut self, block: Block) {
        let depth = self.quote_depth();
        let cx = self.cx;
        for frame in self.stack.iter_mut().rev() {
            match frame {
                Frame::Quote(blocks) => {
                    blocks.push(block);
                    return;
                }
                Frame::List { items, .. } => {
                    items.push(block);
                    return;
                }
                Frame::Item { blocks, text, .. } => {
                    if !text.is_empty() {
                        let pending = std::mem::take(text);
                        blocks.extend(finish_tight(cx, pending, depth));
                    }
                    blocks.push(block);
                    return;
                }
                _ => {}
            }
        }
        self.root.push(block);
    }

    fn finish(mut self) -> Vec<Block> {
        while !self.stack.is_empty() {
            let end = self.cx.source.len();
            self.end(&(end..end));
        }
        self.root
    }
}

fn finish_tight(cx: Context<'_>, text: InlineBuf, quote_depth: usize) -> Vec<Block> {
    let Some(span) = text.span.clone() else {
        return Vec::new();
    };
    finish_leaf(cx, span, text, quote_depth, false)
}

/// Build a paragraph or tight-item text block, splitting it where a block
/// rule matches at a line start.
fn finish_leaf(
    cx: Context<'_>,
    range: Range<usize>,
    inlines: InlineBuf,
    quote_depth: usize,
    paragraph: bool,
) -> Vec<Block> {
    let raw = leaf_raw(cx.source, range, quote_depth);
    let make = |raw: String, inlines: Vec<Inline>| {
        if paragraph {
            Block::Paragraph { raw, inlines }
        } else {
            Block::Text(inlines)
        }
    };

    let Some(parts) = cx.lexer.split_leaf(&raw) else {
        return vec![make(raw, inlines.finish(cx))];
    };
    parts
        .into_iter()
        .map(|part| match part {
            Part::Block(block) => block,
            Part::Markdown(range) => {
                let text = raw[range].trim();
                make(text.to_owned(), cx.lexer.lex_inline_with_references(text, cx.references))
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn text(s: &str) -> Inline {
        Inline::Text(s.to_owned())
    }

    fn math_lexer() -> Lexer {
        Lexer::new().with_math()
    }

    #[test]
    fn test_paragraph_keeps_raw() {
        let blocks = Lexer::new().lex("Hello *world*\nnext line");
        assert_eq!(
            blocks,
            vec![Block::Paragraph {
                raw: "Hello *world*\nnext line".to_owned(),
                inlines: vec![
                    text("Hello "),
                    Inline::Emphasis(vec![text("world")]),
                    Inline::SoftBreak,
                    text("next line"),
                ],
            }]
        );
    }

    #[test]
    fn test_heading_text_is_plain() {
        let blocks = Lexer::new().lex("## Install `npm` *now*");
        let Block::Heading { depth, text, .. } = &blocks[0] else {
            panic!("expected heading, got {blocks:?}");
        };
        assert_eq!(*depth, 2);
        assert_eq!(text, "Install npm now");
    }

    #[test]
    fn test_code_block_lang_and_trailing_newline() {
        let blocks = Lexer::new().lex("```rust title=\"x\"\nfn main() {}\n```\n");
        assert_eq!(
            blocks,
            vec![Block::Code {
                lang: Some("rust".to_owned()),
                text: "fn main() {}".to_owned(),
            }]
        );

        let blocks = Lexer::new().lex("    indented\n");
        assert_eq!(
            blocks,
            vec![Block::Code {
                lang: None,
                text: "indented".to_owned(),
            }]
        );
    }

    #[test]
    fn test_tight_list_items_use_text_blocks() {
        let blocks = Lexer::new().lex("- one\n- two\n  - nested");
        let Block::List { start: None, items } = &blocks[0] else {
            panic!("expected list, got {blocks:?}");
        };
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].children(), &[Block::Text(vec![text("one")])]);
        let second = items[1].children();
        assert_eq!(second[0], Block::Text(vec![text("two")]));
        assert!(matches!(second[1], Block::List { .. }));
    }

    #[test]
    fn test_task_items() {
        let blocks = Lexer::new().lex("- [x] done\n- [ ] todo\n- plain");
        let items = blocks[0].children();
        assert_eq!(
            items[0],
            Block::ListItem {
                task: true,
                checked: true,
                blocks: vec![Block::Text(vec![text("done")])],
            }
        );
        assert!(matches!(items[1], Block::ListItem { task: true, checked: false, .. }));
        assert!(matches!(items[2], Block::ListItem { task: false, .. }));
    }

    #[test]
    fn test_task_items_disabled_without_gfm() {
        let blocks = Lexer::new().with_gfm(false).lex("- [x] done");
        assert!(matches!(blocks[0].children()[0], Block::ListItem { task: false, .. }));
    }

    #[test]
    fn test_blockquote_paragraph_raw_strips_markers() {
        let blocks = Lexer::new().lex("> [!note] Title\n> body *text*");
        let Block::BlockQuote(children) = &blocks[0] else {
            panic!("expected quote, got {blocks:?}");
        };
        let Block::Paragraph { raw, .. } = &children[0] else {
            panic!("expected paragraph");
        };
        assert_eq!(raw, "[!note] Title\nbody *text*");
    }

    #[test]
    fn test_nested_quote_raw() {
        let blocks = Lexer::new().lex("> > a\n> > b");
        let inner = &blocks[0].children()[0];
        let Block::Paragraph { raw, .. } = &inner.children()[0] else {
            panic!("expected paragraph");
        };
        assert_eq!(raw, "a\nb");
    }

    #[test]
    fn test_table() {
        let blocks = Lexer::new().lex("| a | b |\n|:--|--:|\n| 1 | 2 |");
        let Block::Table { alignments, head, rows } = &blocks[0] else {
            panic!("expected table, got {blocks:?}");
        };
        assert_eq!(alignments.len(), 2);
        assert_eq!(head, &vec![vec![text("a")], vec![text("b")]]);
        assert_eq!(rows, &vec![vec![vec![text("1")], vec![text("2")]]]);
    }

    #[test]
    fn test_block_math_at_top_level() {
        let blocks = math_lexer().lex("Intro\n$$\nx^2\n$$\nOutro");
        assert_eq!(blocks.len(), 3);
        assert!(matches!(&blocks[0], Block::Paragraph { raw, .. } if raw == "Intro"));
        assert_eq!(blocks[1], Block::Math("x^2".to_owned()));
        assert!(matches!(&blocks[2], Block::Paragraph { raw, .. } if raw == "Outro"));
    }

    #[test]
    fn test_block_math_spanning_blank_line() {
        let blocks = math_lexer().lex("$$\na\n\nb\n$$\n");
        assert_eq!(blocks, vec![Block::Math("a\n\nb".to_owned())]);
    }

    #[test]
    fn test_block_math_inside_fence_is_code() {
        let blocks = math_lexer().lex("```\n$$x$$\n```\n");
        assert_eq!(
            blocks,
            vec![Block::Code {
                lang: None,
                text: "$$x$$".to_owned(),
            }]
        );
    }

    #[test]
    fn test_block_math_inside_quote_and_list() {
        let blocks = math_lexer().lex("> $$a$$\n\n- $$b$$");
        assert_eq!(blocks[0].children(), &[Block::Math("a".to_owned())]);
        assert_eq!(blocks[1].children()[0].children(), &[Block::Math("b".to_owned())]);
    }

    #[test]
    fn test_block_math_after_paragraph_line_in_quote() {
        let blocks = math_lexer().lex("> text\n> $$a$$\n> more");
        let children = blocks[0].children();
        assert_eq!(children.len(), 3);
        assert_eq!(children[1], Block::Math("a".to_owned()));
        assert!(matches!(&children[2], Block::Paragraph { raw, .. } if raw == "more"));
    }

    #[test]
    fn test_references_shared_across_segments() {
        let blocks = math_lexer().lex("[docs]\n\n$$x$$\n\n[docs]: https://example.com\n");
        let Block::Paragraph { inlines, .. } = &blocks[0] else {
            panic!("expected paragraph, got {blocks:?}");
        };
        assert!(matches!(&inlines[0], Inline::Link { href, .. } if href == "https://example.com"));
    }

    #[test]
    fn test_inline_math() {
        let inlines = math_lexer().lex_inline("Euler: $e^{i\\pi} + 1 = 0$ done");
        assert_eq!(
            inlines,
            vec![
                text("Euler: "),
                Inline::Math("e^{i\\pi} + 1 = 0".to_owned()),
                text(" done"),
            ]
        );
    }

    #[test]
    fn test_inline_math_keeps_latex_escapes() {
        let inlines = math_lexer().lex_inline("set $\\{x\\}$");
        assert_eq!(inlines, vec![text("set "), Inline::Math("\\{x\\}".to_owned())]);
    }

    #[test]
    fn test_escaped_dollar_is_literal() {
        let inlines = math_lexer().lex_inline("costs \\$5 and \\$6");
        assert_eq!(inlines, vec![text("costs $5 and $6")]);
    }

    #[test]
    fn test_escaped_dollar_cannot_close() {
        let inlines = math_lexer().lex_inline("$5 or \\$6");
        assert_eq!(inlines, vec![text("$5 or $6")]);
    }

    #[test]
    fn test_inline_math_not_in_code_span() {
        let inlines = math_lexer().lex_inline("`$x$` and $y$");
        assert_eq!(
            inlines,
            vec![
                Inline::Code("$x$".to_owned()),
                text(" and "),
                Inline::Math("y".to_owned()),
            ]
        );
    }

    #[test]
    fn test_inline_math_in_heading_and_emphasis() {
        let blocks = math_lexer().lex("# Area $r^2$\n\n*see $a$*");
        let Block::Heading { inlines, text: title, .. } = &blocks[0] else {
            panic!("expected heading");
        };
        assert_eq!(inlines[1], Inline::Math("r^2".to_owned()));
        assert_eq!(title, "Area r^2");
        let Block::Paragraph { inlines, .. } = &blocks[1] else {
            panic!("expected paragraph");
        };
        assert_eq!(
            inlines[0],
            Inline::Emphasis(vec![text("see "), Inline::Math("a".to_owned())])
        );
    }

    #[test]
    fn test_double_dollar_mid_line_is_not_display_math() {
        // `$$` never opens inline math; scanning resumes one byte later.
        let inlines = math_lexer().lex_inline("a $$b$$ c");
        assert_eq!(
            inlines,
            vec![text("a $"), Inline::Math("b".to_owned()), text("$ c")]
        );
    }

    #[test]
    fn test_escaped_backslash_before_dollar() {
        let inlines = math_lexer().lex_inline("path \\\\ $x$");
        assert_eq!(inlines, vec![text("path \\ "), Inline::Math("x".to_owned())]);
    }

    #[test]
    fn test_entities_are_decoded_around_math() {
        let inlines = math_lexer().lex_inline("&amp; $x$");
        assert_eq!(inlines, vec![text("& "), Inline::Math("x".to_owned())]);
    }

    #[test]
    fn test_inline_math_wins_over_emphasis() {
        let lexer = math_lexer();
        assert_eq!(lexer.lex_inline("$a*b*c$"), vec![Inline::Math("a*b*c".to_owned())]);
        assert_eq!(
            lexer.lex_inline("$x^*$ and $y^*$"),
            vec![
                Inline::Math("x^*".to_owned()),
                text(" and "),
                Inline::Math("y^*".to_owned()),
            ]
        );
        assert_eq!(
            lexer.lex_inline("$a_1$ or $b_2$"),
            vec![
                Inline::Math("a_1".to_owned()),
                text(" or "),
                Inline::Math("b_2".to_owned()),
            ]
        );
    }

    #[test]
    fn test_inline_math_wins_over_raw_html() {
        let inlines = math_lexer().lex_inline("so $a<b>c$ holds");
        assert_eq!(
            inlines,
            vec![text("so "), Inline::Math("a<b>c".to_owned()), text(" holds")]
        );
    }

    #[test]
    fn test_inline_math_not_in_earlier_raw_html() {
        let inlines = math_lexer().lex_inline("<span title=\"$x$\">y</span>");
        assert!(!inlines.iter().any(|i| matches!(i, Inline::Math(_))), "{inlines:?}");
        assert_eq!(inlines[0], Inline::Html("<span title=\"$x$\">".to_owned()));
    }

    #[test]
    fn test_inline_math_in_link_text_not_destination() {
        let inlines = math_lexer().lex_inline("[see $x$](/q?a=$b$)");
        assert_eq!(
            inlines,
            vec![Inline::Link {
                href: "/q?a=$b$".to_owned(),
                title: String::new(),
                children: vec![text("see "), Inline::Math("x".to_owned())],
            }]
        );
    }

    #[test]
    fn test_inline_math_stays_inside_table_cell() {
        let blocks = math_lexer().lex("| $a | b$ |\n|---|---|\n| $c$ | d |");
        let Block::Table { head, rows, .. } = &blocks[0] else {
            panic!("expected table, got {blocks:?}");
        };
        assert_eq!(head, &vec![vec![text("$a")], vec![text("b$")]]);
        assert_eq!(rows[0][0], vec![Inline::Math("c".to_owned())]);
    }

    #[test]
    fn test_inline_math_with_escaped_backslash_before_open() {
        let inlines = math_lexer().lex_inline("a\\\\$x$");
        assert_eq!(inlines, vec![text("a\\"), Inline::Math("x".to_owned())]);
    }

    #[test]
    fn test_block_math_inside_html_block_is_html() {
        let blocks = math_lexer().lex("<pre>\n$$x$$\n</pre>\n");
        assert_eq!(blocks, vec![Block::Html("<pre>\n$$x$$\n</pre>\n".to_owned())]);
    }

    #[test]
    fn test_block_math_after_html_block() {
        let blocks = math_lexer().lex("<div>\n$$a$$\n</div>\n\n$$b$$\n");
        assert_eq!(blocks.len(), 2, "{blocks:?}");
        assert!(matches!(&blocks[0], Block::Html(html) if html.contains("$$a$$")));
        assert_eq!(blocks[1], Block::Math("b".to_owned()));
    }

    #[test]
    fn test_references_reach_split_paragraph_text() {
        let blocks = math_lexer().lex("> see [docs]\n> $$a$$\n> and [docs]\n\n[docs]: /d\n");
        let children = blocks[0].children();
        for block in [&children[0], &children[2]] {
            let Block::Paragraph { inlines, .. } = block else {
                panic!("expected paragraph, got {block:?}");
            };
            assert!(
                inlines.iter().any(|i| matches!(i, Inline::Link { href, .. } if href == "/d")),
                "{inlines:?}"
            );
        }
    }

    #[test]
    fn test_lex_with_external_references() {
        let lexer = Lexer::new();
        let references = lexer.references("[docs]: https://example.com \"Docs\"\n");
        assert_eq!(references.len(), 1);

        let inlines = lexer.lex_inline_with_references("read [the docs][docs]", &references);
        assert_eq!(
            inlines[1],
            Inline::Link {
                href: "https://example.com".to_owned(),
                title: "Docs".to_owned(),
                children: vec![text("the docs")],
            }
        );
        assert_eq!(lexer.lex_inline("read [docs]"), vec![text("read [docs]")]);
    }

    #[test]
    fn test_lex_inline_flattens_paragraphs() {
        let inlines = Lexer::new().lex_inline("a\n\nb");
        assert_eq!(inlines, vec![text("a"), Inline::SoftBreak, text("b")]);
    }

    #[test]
    fn test_leaf_raw() {
        let src = "first\n  > second  \n>third";
        assert_eq!(leaf_raw(src, 0..src.len(), 1), "first\nsecond  \nthird");
    }
}
