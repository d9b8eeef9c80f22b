//! Code fence tracking for block-rule scanning.
//!
//! Block grammar rules (display math) are only tried at line starts that
//! are outside fenced code, so `$$` inside a code sample stays literal.

/// Tracks code fence state during line-by-line scanning.
///
/// Fences use backticks or tildes (three or more) indented by at most three
/// spaces. A closing fence uses the same character, is at least as long as
/// the opening one and carries no info string.
#[derive(Debug, Default)]
pub(crate) struct FenceTracker {
    open: Option<(char, usize)>,
}

impl FenceTracker {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn in_fence(&self) -> bool {
        self.open.is_some()
    }

    /// Feed one line. Returns `true` if the line opened or closed a fence.
    pub(crate) fn update(&mut self, line: &str) -> bool {
        let Some(marker) = fence_marker(line) else {
            return false;
        };

        match self.open {
            Some((ch, len)) => {
                let (marker_ch, marker_len, rest) = marker;
                if marker_ch == ch && marker_len >= len && rest.trim().is_empty() {
                    self.open = None;
                    return true;
                }
                false
            }
            None => {
                let (ch, len, info) = marker;
                // Backtick fences cannot have backticks in the info string.
                if ch == '`' && info.contains('`') {
                    return false;
                }
                self.open = Some((ch, len));
                true
            }
        }
    }
}

/// Split a fence line into (char, run length, remainder).
fn fence_marker(line: &str) -> Option<(char, usize, &str)> {
    let indent = line.len() - line.trim_start_matches(' ').len();
    if indent > 3 {
        return None;
    }
    let trimmed = &line[indent..];
    let first = trimmed.chars().next()?;
    if first != '`' && first != '~' {
        return None;
    }

    let count = trimmed.chars().take_while(|&c| c == first).count();
    (count >= 3).then(|| (first, count, &trimmed[count..]))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_fence_initially() {
        let tracker = FenceTracker::new();
        assert!(!tracker.in_fence());
    }

    #[test]
    fn test_backtick_fence() {
        let mut tracker = FenceTracker::new();

        assert!(tracker.update("```rust"));
        assert!(tracker.in_fence());

        assert!(!tracker.update("let cost = \"$$5\";"));
        assert!(tracker.in_fence());

        assert!(tracker.update("```"));
        assert!(!tracker.in_fence());
    }

    #[test]
    fn test_tilde_fence() {
        let mut tracker = FenceTracker::new();

        assert!(tracker.update("~~~latex"));
        assert!(tracker.in_fence());
        assert!(tracker.update("~~~"));
        assert!(!tracker.in_fence());
    }

    #[test]
    fn test_shorter_fence_not_closing() {
        let mut tracker = FenceTracker::new();

        assert!(tracker.update("````"));
        assert!(!tracker.update("```"));
        assert!(tracker.in_fence());
        assert!(tracker.update("`````"));
        assert!(!tracker.in_fence());
    }

    #[test]
    fn test_closing_fence_with_info_is_content() {
        let mut tracker = FenceTracker::new();

        assert!(tracker.update("```"));
        assert!(!tracker.update("```rust"));
        assert!(tracker.in_fence());
    }

    #[test]
    fn test_mixed_fence_chars() {
        let mut tracker = FenceTracker::new();

        assert!(tracker.update("```"));
        assert!(!tracker.update("~~~"));
        assert!(tracker.in_fence());
    }

    #[test]
    fn test_indentation_limit() {
        let mut tracker = FenceTracker::new();

        assert!(!tracker.update("    ```"));
        assert!(!tracker.in_fence());

        assert!(tracker.update("   ```"));
        assert!(tracker.in_fence());
    }

    #[test]
    fn test_inline_code_not_fence() {
        let mut tracker = FenceTracker::new();

        assert!(!tracker.update("``inline code``"));
        assert!(!tracker.update("```a` b```"));
        assert!(!tracker.in_fence());
    }
}
