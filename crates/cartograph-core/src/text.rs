//! Text measurement contract.
//!
//! Layout needs label extents to size nodes but does not shape glyphs itself.
//! Callers with a real font stack implement [`TextMeasure`]; everyone else can
//! use [`ApproximateTextMeasure`], which estimates extents from character counts.

use crate::geometry::Size;

/// Font size used when a node does not specify one.
pub const DEFAULT_FONT_SIZE: f32 = 14.0;

pub trait TextMeasure {
    /// Returns the extents of `text` rendered at `font_size`.
    ///
    /// Multi-line text (separated by `\n`) is stacked vertically.
    fn measure(&self, text: &str, font_size: f32) -> Size;
}

/// Character-count based estimate.
#[derive(Debug, Clone, Copy)]
pub struct ApproximateTextMeasure {
    char_width_ratio: f32,
    line_height_ratio: f32,
}

impl ApproximateTextMeasure {
    pub fn new(char_width_ratio: f32, line_height_ratio: f32) -> Self {
        Self {
            char_width_ratio,
            line_height_ratio,
        }
    }
}

impl Default for ApproximateTextMeasure {
    fn default() -> Self {
        Self::new(0.6, 1.2)
    }
}

impl TextMeasure for ApproximateTextMeasure {
    fn measure(&self, text: &str, font_size: f32) -> Size {
        if text.is_empty() {
            return Size::default();
        }
        let (lines, widest) = text
            .lines()
            .fold((0usize, 0usize), |(count, widest), line| {
                (count + 1, widest.max(line.chars().count()))
            });
        Size::new(
            widest as f32 * font_size * self.char_width_ratio,
            lines.max(1) as f32 * font_size * self.line_height_ratio,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_text_has_zero_size() {
        let measure = ApproximateTextMeasure::default();
        assert_eq!(measure.measure("", DEFAULT_FONT_SIZE), Size::default());
    }

    #[test]
    fn test_multiline_uses_widest_line() {
        let measure = ApproximateTextMeasure::new(0.5, 1.0);
        let size = measure.measure("ab\nabcd", 10.0);
        assert_eq!(size, Size::new(20.0, 20.0));
    }
}
