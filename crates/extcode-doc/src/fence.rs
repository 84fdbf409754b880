//! Code fence tracking.
//!
//! pulldown-cmark silently closes a fence left open at end of input. Strict
//! parsing needs to know about it, so sources are scanned line by line first.

/// Tracks code fence state during line-by-line scanning.
///
/// Fences use backticks or tildes (three or more). The closing fence must use
/// the same character and be at least as long as the opening one.
#[derive(Debug, Default)]
pub(crate) struct FenceTracker {
    /// Character and length of the open fence.
    open: Option<(char, usize)>,
    /// Zero-based index of the line that opened the current fence.
    opened_at: usize,
}

impl FenceTracker {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Zero-based line index of the fence that is still open, if any.
    pub(crate) fn open_fence(&self) -> Option<usize> {
        self.open.map(|_| self.opened_at)
    }

    /// Update fence state with the line at `index`.
    pub(crate) fn update(&mut self, index: usize, line: &str) {
        let trimmed = line.trim_start();

        if let Some((fence_char, fence_len)) = self.open {
            if is_closing_fence(trimmed, fence_char, fence_len) {
                self.open = None;
            }
        } else if let Some(fence) = detect_fence(trimmed) {
            self.open = Some(fence);
            self.opened_at = index;
        }
    }
}

/// Find the line index of a fence left open at the end of `source`.
pub(crate) fn unterminated_fence(source: &str) -> Option<usize> {
    let mut tracker = FenceTracker::new();
    for (index, line) in source.lines().enumerate() {
        tracker.update(index, line);
    }
    tracker.open_fence()
}

fn detect_fence(trimmed: &str) -> Option<(char, usize)> {
    let first = trimmed.chars().next()?;
    if first != '`' && first != '~' {
        return None;
    }

    let count = trimmed.chars().take_while(|&c| c == first).count();
    // Backtick fences may not carry backticks in their info string.
    if count < 3 || (first == '`' && trimmed[count..].contains('`')) {
        return None;
    }
    Some((first, count))
}

fn is_closing_fence(trimmed: &str, expected: char, min_len: usize) -> bool {
    let count = trimmed.chars().take_while(|&c| c == expected).count();
    count >= min_len && trimmed[count..].chars().all(char::is_whitespace)
}
