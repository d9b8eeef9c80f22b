//! Grammar extension traits.
//!
//! Extensions add syntax on top of pulldown-cmark. Each rule has a cheap
//! start check, used by the lexer to skip ahead to the next possible match,
//! and a tokenizer that either consumes input from the current position or
//! declines.
//!
//! # Example
//!
//! ```
//! use quill_renderer::{Inline, InlineMatch, InlineRule, Lexer};
//!
//! struct Mention;
//!
//! impl InlineRule for Mention {
//!     fn name(&self) -> &'static str { "mention" }
//!
//!     fn start(&self, src: &str) -> Option<usize> {
//!         src.find('@')
//!     }
//!
//!     fn tokenize(&self, src: &str) -> Option<InlineMatch> {
//!         let name: String = src[1..].chars().take_while(char::is_ascii_alphanumeric).collect();
//!         (!name.is_empty()).then(|| InlineMatch {
//!             consumed: name.len() + 1,
//!             inline: Inline::Code(name),
//!         })
//!     }
//! }
//!
//! let lexer = Lexer::new().with_inline_rule(Mention);
//! let inlines = lexer.lex_inline("ping @ana");
//! assert_eq!(inlines[1], Inline::Code("ana".to_owned()));
//! ```

use crate::token::{Block, Inline};

/// Successful block-rule match.
#[derive(Clone, Debug, PartialEq)]
pub struct BlockMatch {
    /// Bytes consumed from the start of the input.
    pub consumed: usize,
    /// Produced token.
    pub block: Block,
}

/// Successful inline-rule match.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InlineMatch {
    /// Bytes consumed from the start of the input.
    pub consumed: usize,
    /// Produced token.
    pub inline: Inline,
}

/// Block-level grammar rule.
///
/// Tried at line starts outside fenced code and HTML blocks, and against the
/// raw text of every paragraph.
pub trait BlockRule: Send + Sync {
    /// Rule name, used in logs.
    fn name(&self) -> &'static str;

    /// Byte offset of the next position in `src` where this rule may match.
    fn start(&self, src: &str) -> Option<usize>;

    /// Try to consume a token from the start of `src`.
    fn tokenize(&self, src: &str) -> Option<BlockMatch>;
}

/// Inline-level grammar rule.
///
/// Tried over the raw markdown before emphasis, links and raw HTML are
/// resolved; a match takes priority over any of those starting later.
/// Matches never span lines. Code spans, raw HTML, link destinations and
/// autolinks are never offered to inline rules.
pub trait InlineRule: Send + Sync {
    /// Rule name, used in logs.
    fn name(&self) -> &'static str;

    /// Byte offset of the next position in `src` where this rule may match.
    fn start(&self, src: &str) -> Option<usize>;

    /// Try to consume a token from the start of `src`.
    fn tokenize(&self, src: &str) -> Option<InlineMatch>;
}
