//! Shared primitives used across Brioche crates.

use core::fmt;

/// Result alias used across the workspace.
pub type PageResult<T> = Result<T, PageError>;

/// Top-level error type carried between page-runtime crates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageError {
    pub code: &'static str,
    pub message: String,
}

impl PageError {
    pub fn new(code: &'static str, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl fmt::Display for PageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

impl std::error::Error for PageError {}

/// Vertical extent of an element in page coordinates.
///
/// Layout is host input in this runtime; only the vertical axis matters for
/// reveal/scroll decisions, so a rect is a top offset plus a height.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rect {
    pub top: u32,
    pub height: u32,
}

impl Rect {
    pub fn new(top: u32, height: u32) -> Self {
        Self { top, height }
    }

    pub fn bottom(self) -> u32 {
        self.top.saturating_add(self.height)
    }

    /// Fraction of this rect inside the viewport `[scroll_y, scroll_y + viewport_height)`.
    ///
    /// Returns 0.0 for zero-height rects and values in `0.0..=1.0` otherwise.
    pub fn visible_ratio(self, scroll_y: u32, viewport_height: u32) -> f32 {
        if self.height == 0 {
            return 0.0;
        }

        let view_top = scroll_y;
        let view_bottom = scroll_y.saturating_add(viewport_height);
        let overlap_top = self.top.max(view_top);
        let overlap_bottom = self.bottom().min(view_bottom);
        if overlap_bottom <= overlap_top {
            return 0.0;
        }

        let overlap = overlap_bottom - overlap_top;
        overlap as f32 / self.height as f32
    }
}
