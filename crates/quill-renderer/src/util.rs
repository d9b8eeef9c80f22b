//! Shared utility functions for markdown rendering.

use pulldown_cmark::HeadingLevel;

/// Convert heading text to a URL-safe anchor ID.
///
/// Lowercases, keeps ASCII letters and digits, CJK ideographs
/// (U+4E00..=U+9FA5), whitespace and hyphens, trims, then turns each run of
/// whitespace into a single `-`. Duplicate headings get duplicate IDs; no
/// suffix is added.
///
/// # Examples
///
/// ```
/// use quill_renderer::slugify;
///
/// assert_eq!(slugify("Hello World"), "hello-world");
/// assert_eq!(slugify("What's New?"), "whats-new");
/// assert_eq!(slugify("快速 开始"), "快速-开始");
/// ```
#[must_use]
pub fn slugify(text: &str) -> String {
    let kept: String = text
        .to_lowercase()
        .chars()
        .filter(|&c| {
            c.is_ascii_lowercase()
                || c.is_ascii_digit()
                || ('\u{4e00}'..='\u{9fa5}').contains(&c)
                || c.is_whitespace()
                || c == '-'
        })
        .collect();

    let mut result = String::with_capacity(kept.len());
    let mut in_space = false;
    for c in kept.trim().chars() {
        if c.is_whitespace() {
            if !in_space {
                result.push('-');
                in_space = true;
            }
        } else {
            result.push(c);
            in_space = false;
        }
    }
    result
}

/// Escape HTML special characters in text content.
#[must_use]
pub fn escape_html(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => result.push_str("&amp;"),
            '<' => result.push_str("&lt;"),
            '>' => result.push_str("&gt;"),
            '"' => result.push_str("&quot;"),
            '\'' => result.push_str("&#x27;"),
            _ => result.push(c),
        }
    }
    result
}

/// Escape a value for the `data-code` attribute.
///
/// Entities are applied in the order `&`, `"`, `'`, `<`, `>` so that
/// ampersands introduced by later replacements are never escaped again.
#[must_use]
pub fn escape_attr(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

/// Convert heading level enum to number (1-6).
#[must_use]
pub(crate) fn heading_level_to_num(level: HeadingLevel) -> u8 {
    match level {
        HeadingLevel::H1 => 1,
        HeadingLevel::H2 => 2,
        HeadingLevel::H3 => 3,
        HeadingLevel::H4 => 4,
        HeadingLevel::H5 => 5,
        HeadingLevel::H6 => 6,
    }
}
