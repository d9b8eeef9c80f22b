//! Table of contents extraction from the token tree.

use crate::token::Block;
use crate::util::slugify;

/// Table of contents entry.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TocItem {
    /// Anchor ID, the slug of `text`. Not unique across a document.
    pub id: String,
    /// Heading text.
    pub text: String,
    /// Heading level.
    pub level: u8,
}

/// Collect headings up to `max_level`, in document order.
///
/// Container blocks (block quotes, lists, list items) are searched too.
#[must_use]
pub fn extract_toc(blocks: &[Block], max_level: u8) -> Vec<TocItem> {
    let mut toc = Vec::new();
    walk(blocks, max_level, &mut toc);
    toc
}

fn walk(blocks: &[Block], max_level: u8, toc: &mut Vec<TocItem>) {
    for block in blocks {
        if let Block::Heading { depth, text, .. } = block
            && *depth <= max_level
        {
            toc.push(TocItem {
                id: slugify(text),
                text: text.clone(),
                level: *depth,
            });
        }
        walk(block.children(), max_level, toc);
    }
}
