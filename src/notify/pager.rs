//! Size-capped pagination of notification lines.
//!
//! A page is the caption followed by a contiguous run of body lines,
//! rendered joined by `'\n'`. Its size is measured two ways at once:
//!
//! - characters: `caption + Σ (1 + line)` (each body line brings its
//!   separating newline), counted in `char`s
//! - lines: `1 + body lines` (the caption takes a line slot)
//!
//! Lines are packed greedily: a page is closed only when the next line
//! would push it over either cap, and the next page starts with the
//! caption again. Greedy packing of an ordered sequence into runs is
//! optimal, so the page count is the minimum allowed by the caps.
//!
//! A line too large to fit even on an otherwise empty page is placed on a
//! page of its own, which then exceeds the cap. Lines are never split.
//! The same holds for a caption longer than `max_chars`: every page
//! carries it, so every page exceeds the char cap.
//!
//! The line cap is at least [`MIN_PAGE_LINES`]: the caption plus one
//! body line.

use serde::{Deserialize, Serialize};

/// Smallest usable line cap.
pub const MIN_PAGE_LINES: usize = 2;

/// Caps applied to every page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageLimits {
    /// Maximum rendered characters per page.
    pub max_chars: usize,
    /// Maximum lines per page, caption included.
    pub max_lines: usize,
}

impl PageLimits {
    /// Create limits. `max_chars` is raised to 1 and `max_lines` to
    /// [`MIN_PAGE_LINES`].
    pub fn new(max_chars: usize, max_lines: usize) -> Self {
        Self {
            max_chars: max_chars.max(1),
            max_lines: max_lines.max(MIN_PAGE_LINES),
        }
    }
}

impl Default for PageLimits {
    /// Chat-embed sized pages.
    fn default() -> Self {
        Self {
            max_chars: 4096,
            max_lines: 15,
        }
    }
}

/// One page of a notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
    caption: String,
    lines: Vec<String>,
    chars: usize,
}

impl Page {
    fn new(caption: &str) -> Self {
        Self {
            caption: caption.to_string(),
            lines: Vec::new(),
            chars: caption.chars().count(),
        }
    }

    fn cost(line: &str) -> usize {
        1 + line.chars().count()
    }

    fn fits(&self, line: &str, limits: &PageLimits) -> bool {
        self.chars + Self::cost(line) <= limits.max_chars
            && self.line_count() + 1 <= limits.max_lines
    }

    fn push(&mut self, line: &str) {
        self.chars += Self::cost(line);
        self.lines.push(line.to_string());
    }

    /// Caption repeated at the top of the page.
    pub fn caption(&self) -> &str {
        &self.caption
    }

    /// Body lines, in order.
    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// Rendered character count.
    pub fn char_count(&self) -> usize {
        self.chars
    }

    /// Line count including the caption.
    pub fn line_count(&self) -> usize {
        1 + self.lines.len()
    }

    /// Caption and lines joined by newlines.
    pub fn render(&self) -> String {
        let mut text = String::with_capacity(self.chars);
        text.push_str(&self.caption);
        for line in &self.lines {
            text.push('\n');
            text.push_str(line);
        }
        text
    }
}

/// Pack `lines` into pages under `limits`, repeating `caption` on each.
///
/// Returns no pages when there are no lines.
pub fn paginate<S: AsRef<str>>(caption: &str, lines: &[S], limits: PageLimits) -> Vec<Page> {
    let mut pages = Vec::new();
    let mut current = Page::new(caption);

    for line in lines {
        let line = line.as_ref();
        if !current.lines.is_empty() && !current.fits(line, &limits) {
            pages.push(std::mem::replace(&mut current, Page::new(caption)));
        }
        current.push(line);
    }

    if !current.lines.is_empty() {
        pages.push(current);
    }
    pages
}
