// Copyright 2025 the Textmesh Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Text layout: line splitting, extents, quad counts, hit testing.

mod line_break;

pub use hit_test::TextHit;
pub use line_break::LineBreaker;

use crate::font::Font;

/// Word wrap mode.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum Wrap {
    /// No line breaks at all; the whole text is one line. Separator
    /// characters are not stripped.
    SingleLine,
    /// Break only on explicit `'\n'`, `'\r'` or `"\r\n"`; the maximum width
    /// is ignored.
    #[default]
    Normal,
    /// Additionally wrap on character boundaries once the maximum width
    /// would be exceeded.
    Char,
    /// Additionally wrap on word boundaries where possible, falling back to
    /// character boundaries for words wider than a whole line.
    Word,
}

/// Horizontal alignment relative to the anchor position.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum HAlign {
    #[default]
    Left,
    Center,
    Right,
}

/// Vertical alignment relative to the anchor position.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum VAlign {
    #[default]
    Top,
    Middle,
    Bottom,
}

/// Per-line decoration rectangles, drawn with the atlas fill point.
///
/// Any combination may be set; `double_underline` takes precedence over
/// `underline` when both are.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct Decorations {
    pub underline: bool,
    pub double_underline: bool,
    pub overline: bool,
    pub strikeout: bool,
}

impl Decorations {
    /// Decoration quads emitted per laid-out line.
    pub(crate) fn quads_per_line(self) -> usize {
        let mut count = 0;
        if self.double_underline {
            count += 2;
        } else if self.underline {
            count += 1;
        }
        if self.overline {
            count += 1;
        }
        if self.strikeout {
            count += 1;
        }
        count
    }
}

/// Wrap mode, alignment and decorations for one layout call.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct TextOptions {
    pub wrap: Wrap,
    pub h_align: HAlign,
    pub v_align: VAlign,
    pub decorations: Decorations,
}

/// One split line: a byte span of the source text plus its advance width in
/// pixels. Consumed separators lie between spans.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Line {
    pub begin: usize,
    pub end: usize,
    pub width: f32,
}

/// Width and height of a laid-out text block, in pixels.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct TextExtent {
    pub width: f32,
    pub height: f32,
}

impl Font {
    /// Width and height of `text` drawn with the given parameters.
    pub fn text_extent(
        &self,
        text: &str,
        font_size: f32,
        options: TextOptions,
        max_width: f32,
    ) -> TextExtent {
        if text.is_empty() || font_size == 0.0 {
            return TextExtent::default();
        }
        let mut line_count = 0_usize;
        let mut width = 0.0_f32;
        for line in self.lines(text, font_size, options.wrap, max_width) {
            line_count += 1;
            width = width.max(line.width);
        }
        if line_count == 0 {
            return TextExtent::default();
        }
        let lines = line_count as f32;
        TextExtent {
            width,
            height: (lines + (lines - 1.0) * self.line_gap) * font_size,
        }
    }

    /// Number of quads needed to draw `text` as one pre-split line.
    pub fn single_line_quad_count(&self, text: &str, decorations: Decorations) -> usize {
        text.chars().filter(|&ch| ch != ' ').count() + decorations.quads_per_line()
    }

    /// Number of quads [`Font::write_text_vertices`] will emit for the same
    /// parameters.
    pub fn quad_count(
        &self,
        text: &str,
        font_size: f32,
        options: TextOptions,
        max_width: f32,
    ) -> usize {
        let mut quads = 0;
        let mut line_count = 0;
        for line in self.lines(text, font_size, options.wrap, max_width) {
            quads += text[line.begin..line.end]
                .chars()
                .filter(|&ch| ch != ' ')
                .count();
            line_count += 1;
        }
        quads + line_count * options.decorations.quads_per_line()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::mock_font;

    #[test]
    fn extent_spans_widest_line_and_gapped_height() {
        let font = mock_font();
        let extent = font.text_extent("AB\nABC", 10.0, TextOptions::default(), f32::MAX);
        // Second line is widest: 3 ems plus 0.1 em of A-B kerning.
        assert!((extent.width - 31.0).abs() < 1e-4);
        assert!((extent.height - 22.0).abs() < 1e-4);
    }

    #[test]
    fn extent_of_empty_text_is_zero() {
        let font = mock_font();
        assert_eq!(
            font.text_extent("", 10.0, TextOptions::default(), f32::MAX),
            TextExtent::default()
        );
        assert_eq!(
            font.text_extent("AB", 0.0, TextOptions::default(), f32::MAX),
            TextExtent::default()
        );
    }

    #[test]
    fn extent_single_line_has_no_gap_term() {
        let font = mock_font();
        let extent = font.text_extent("ABC", 10.0, TextOptions::default(), f32::MAX);
        assert!((extent.height - 10.0).abs() < 1e-4);
    }

    #[test]
    fn decoration_quads_per_line() {
        assert_eq!(Decorations::default().quads_per_line(), 0);
        let underline = Decorations {
            underline: true,
            ..Decorations::default()
        };
        assert_eq!(underline.quads_per_line(), 1);
        let double = Decorations {
            underline: true,
            double_underline: true,
            ..Decorations::default()
        };
        // Double underline wins over plain underline.
        assert_eq!(double.quads_per_line(), 2);
        let all = Decorations {
            underline: true,
            double_underline: true,
            overline: true,
            strikeout: true,
        };
        assert_eq!(all.quads_per_line(), 4);
    }

    #[test]
    fn quad_count_skips_spaces_and_counts_decorations() {
        let font = mock_font();
        let options = TextOptions {
            decorations: Decorations {
                underline: true,
                strikeout: true,
                ..Decorations::default()
            },
            ..TextOptions::default()
        };
        // Two lines: "A B" (2 glyph quads) and "CD" (2 glyph quads), plus
        // 2 decoration quads per line.
        assert_eq!(font.quad_count("A B\nCD", 10.0, options, f32::MAX), 8);
    }

    #[test]
    fn single_line_quad_count_counts_non_spaces() {
        let font = mock_font();
        assert_eq!(font.single_line_quad_count("A B C", Decorations::default()), 3);
        let underline = Decorations {
            underline: true,
            ..Decorations::default()
        };
        assert_eq!(font.single_line_quad_count("   ", underline), 1);
    }
}
