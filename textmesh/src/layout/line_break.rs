// Copyright 2025 the Textmesh Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Greedy line splitting.

use crate::font::Font;
use crate::layout::{Line, Wrap};

/// Iterator over the lines of a text under one wrap mode.
///
/// Widths accumulate per-character advances plus the kerning between
/// adjacent characters, all scaled to `font_size`. Spans are byte ranges of
/// the source text; the separator characters consumed at breaks (`'\n'`,
/// `'\r'`, a wrapped-over space) belong to no span.
pub struct LineBreaker<'f, 't> {
    font: &'f Font,
    text: &'t str,
    font_size: f32,
    wrap: Wrap,
    max_width: f32,
    cursor: usize,
}

impl Font {
    /// Splits `text` into lines. `max_width` is ignored by
    /// [`Wrap::SingleLine`] and [`Wrap::Normal`].
    pub fn lines<'f, 't>(
        &'f self,
        text: &'t str,
        font_size: f32,
        wrap: Wrap,
        max_width: f32,
    ) -> LineBreaker<'f, 't> {
        LineBreaker {
            font: self,
            text,
            font_size,
            wrap,
            max_width,
            cursor: 0,
        }
    }
}

impl Iterator for LineBreaker<'_, '_> {
    type Item = Line;

    fn next(&mut self) -> Option<Line> {
        if self.cursor >= self.text.len() {
            return None;
        }
        match self.wrap {
            Wrap::SingleLine => Some(self.consume_all()),
            _ => Some(self.next_wrapped()),
        }
    }
}

impl LineBreaker<'_, '_> {
    /// Fast path: the remainder of the text is one line.
    fn consume_all(&mut self) -> Line {
        let begin = self.cursor;
        let mut width = 0.0;
        let mut prev: Option<char> = None;
        for ch in self.text[begin..].chars() {
            width += self.font.advance(ch);
            if let Some(prev) = prev {
                width += self.font.kerning(prev, ch);
            }
            prev = Some(ch);
        }
        self.cursor = self.text.len();
        Line {
            begin,
            end: self.text.len(),
            width: width * self.font_size,
        }
    }

    fn next_wrapped(&mut self) -> Line {
        let text = self.text;
        let begin = self.cursor;
        let mut width = 0.0_f32;
        let mut prev: Option<char> = None;
        // State at the last space accepted onto this line, for retroactive
        // word breaks.
        let mut last_space: Option<usize> = None;
        let mut width_at_space = 0.0_f32;

        let end = loop {
            let Some(ch) = text[self.cursor..].chars().next() else {
                break text.len();
            };
            if ch == '\n' {
                let end = self.cursor;
                self.cursor += 1;
                break end;
            }
            if ch == '\r' {
                let end = self.cursor;
                self.cursor += 1;
                if text[self.cursor..].starts_with('\n') {
                    self.cursor += 1;
                }
                break end;
            }

            let char_width = self.font.advance(ch) * self.font_size;
            let kerning = prev.map_or(0.0, |prev| {
                self.font.kerning(prev, ch) * self.font_size
            });

            // Accept the character when no automatic wrapping is requested,
            // when it fits, or when it is the first of the line (otherwise a
            // character wider than `max_width` would never make progress).
            let accept = self.wrap == Wrap::Normal
                || width + char_width + kerning <= self.max_width
                || self.cursor == begin;
            if accept {
                if ch == ' ' {
                    last_space = Some(self.cursor);
                    width_at_space = width;
                }
                width += char_width + kerning;
                self.cursor += ch.len_utf8();
            } else {
                // A space that itself overflows is swallowed into the break.
                if ch == ' ' {
                    let end = self.cursor;
                    self.cursor += 1;
                    break end;
                }
                // The character right before the overflow is a space: split
                // there retroactively.
                if self.cursor > begin && text.as_bytes()[self.cursor - 1] == b' ' {
                    width = width_at_space;
                    break self.cursor - 1;
                }
                if self.wrap == Wrap::Word {
                    if let Some(space) = last_space {
                        // Rewind to the last space and resume after it.
                        self.cursor = space + 1;
                        width = width_at_space;
                        break space;
                    }
                    // No space on this line; break on the character instead.
                }
                break self.cursor;
            }
            prev = Some(ch);
        };

        Line { begin, end, width }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::TextOptions;
    use crate::testing::mock_font;

    const SIZE: f32 = 10.0;

    fn spans(font: &Font, text: &str, wrap: Wrap, max_width: f32) -> Vec<(usize, usize)> {
        font.lines(text, SIZE, wrap, max_width)
            .map(|line| (line.begin, line.end))
            .collect()
    }

    #[test]
    fn normal_breaks_on_newline_only() {
        let font = mock_font();
        let lines: Vec<Line> = font.lines("AB\nCD", SIZE, Wrap::Normal, f32::MAX).collect();
        assert_eq!(lines.len(), 2);
        assert_eq!((lines[0].begin, lines[0].end), (0, 2));
        assert_eq!((lines[1].begin, lines[1].end), (3, 5));
        // advance(A) + advance(B) + kerning(A, B), times the font size.
        assert!((lines[0].width - 21.0).abs() < 1e-4);
        assert!((lines[1].width - 20.0).abs() < 1e-4);
    }

    #[test]
    fn normal_ignores_max_width() {
        let font = mock_font();
        assert_eq!(spans(&font, "ABCDEF", Wrap::Normal, 5.0), vec![(0, 6)]);
    }

    #[test]
    fn carriage_return_and_crlf_both_end_a_line() {
        let font = mock_font();
        assert_eq!(
            spans(&font, "AB\r\nCD", Wrap::Normal, f32::MAX),
            vec![(0, 2), (4, 6)]
        );
        assert_eq!(
            spans(&font, "AB\rCD", Wrap::Normal, f32::MAX),
            vec![(0, 2), (3, 5)]
        );
        // A trailing separator produces no empty final line.
        assert_eq!(spans(&font, "AB\n", Wrap::Normal, f32::MAX), vec![(0, 2)]);
    }

    #[test]
    fn empty_text_yields_no_lines() {
        let font = mock_font();
        assert!(font
            .lines("", SIZE, Wrap::Normal, f32::MAX)
            .next()
            .is_none());
    }

    #[test]
    fn single_line_consumes_everything() {
        let font = mock_font();
        let lines: Vec<Line> = font.lines("A\nB", SIZE, Wrap::SingleLine, f32::MAX).collect();
        assert_eq!(lines.len(), 1);
        assert_eq!((lines[0].begin, lines[0].end), (0, 3));
        // The '\n' is not stripped; it measures as the aliased '?' glyph.
        assert!((lines[0].width - 30.0).abs() < 1e-4);
    }

    #[test]
    fn char_wrap_breaks_before_the_offending_character() {
        let font = mock_font();
        assert_eq!(
            spans(&font, "abcdef", Wrap::Char, 35.0),
            vec![(0, 3), (3, 6)]
        );
        let widths: Vec<f32> = font
            .lines("abcdef", SIZE, Wrap::Char, 35.0)
            .map(|line| line.width)
            .collect();
        assert!(widths.iter().all(|w| (w - 30.0).abs() < 1e-4));
    }

    #[test]
    fn char_wrap_swallows_an_offending_space() {
        let font = mock_font();
        assert_eq!(
            spans(&font, "abc def", Wrap::Char, 30.0),
            vec![(0, 3), (4, 7)]
        );
    }

    #[test]
    fn char_wrap_splits_retroactively_after_a_space() {
        let font = mock_font();
        // 'c' overflows and the character before it is a space; the break
        // lands on the space, which is consumed.
        let lines: Vec<Line> = font.lines("ab cd", SIZE, Wrap::Char, 35.0).collect();
        assert_eq!((lines[0].begin, lines[0].end), (0, 2));
        assert!((lines[0].width - 20.0).abs() < 1e-4);
        assert_eq!((lines[1].begin, lines[1].end), (3, 5));
    }

    #[test]
    fn word_wrap_rewinds_to_the_last_space() {
        let font = mock_font();
        assert_eq!(
            spans(&font, "ab cde", Wrap::Word, 45.0),
            vec![(0, 2), (3, 6)]
        );
        // Char mode keeps filling instead.
        assert_eq!(
            spans(&font, "ab cde", Wrap::Char, 45.0),
            vec![(0, 4), (4, 6)]
        );
    }

    #[test]
    fn word_wrap_scenario_wide_and_narrow() {
        let font = mock_font();
        // Width admits "one two" but not the following space + "three".
        assert_eq!(
            spans(&font, "one two three", Wrap::Word, 70.0),
            vec![(0, 7), (8, 13)]
        );
        // Width admits only "one" per line.
        assert_eq!(
            spans(&font, "one two three", Wrap::Word, 55.0),
            vec![(0, 3), (4, 7), (8, 13)]
        );
    }

    #[test]
    fn word_wrap_falls_back_to_char_for_unbroken_words() {
        let font = mock_font();
        assert_eq!(
            spans(&font, "abcdef", Wrap::Word, 35.0),
            vec![(0, 3), (3, 6)]
        );
    }

    #[test]
    fn first_character_is_always_accepted() {
        let font = mock_font();
        assert_eq!(
            spans(&font, "ab", Wrap::Char, 5.0),
            vec![(0, 1), (1, 2)]
        );
    }

    #[test]
    fn wrap_width_accounts_for_kerning() {
        let font = mock_font();
        // "AV" is 18 px wide thanks to kerning(A, V) = -2 px; it fits 18
        // but not 17.
        assert_eq!(spans(&font, "AV", Wrap::Char, 18.0), vec![(0, 2)]);
        assert_eq!(spans(&font, "AV", Wrap::Char, 17.0), vec![(0, 1), (1, 2)]);
    }

    #[test]
    fn spans_cover_everything_except_separators() {
        let font = mock_font();
        let texts = [
            "one two three",
            "a\nbb\r\nccc\rd",
            "  leading and trailing  ",
            "tight",
            "multi  spaces   here",
        ];
        for text in texts {
            for wrap in [Wrap::Normal, Wrap::Char, Wrap::Word] {
                for max_width in [12.0, 25.0, 40.0, f32::MAX] {
                    let mut covered = vec![false; text.len()];
                    let mut steps = 0;
                    let mut prev_end = 0;
                    for line in font.lines(text, SIZE, wrap, max_width) {
                        steps += 1;
                        assert!(steps <= text.len(), "runaway splitter");
                        assert!(line.begin >= prev_end, "overlapping lines");
                        assert!(line.end <= text.len());
                        for flag in &mut covered[line.begin..line.end] {
                            *flag = true;
                        }
                        prev_end = line.end;
                    }
                    for (index, covered) in covered.iter().enumerate() {
                        let byte = text.as_bytes()[index];
                        if !covered {
                            assert!(
                                byte == b' ' || byte == b'\n' || byte == b'\r',
                                "byte {index} of {text:?} lost under {wrap:?}/{max_width}"
                            );
                        }
                    }
                }
            }
        }
    }

    #[test]
    fn single_line_matches_unbounded_wrapping_without_separators() {
        let font = mock_font();
        for text in ["plain text with spaces", "AVAVA", "x"] {
            let single: Vec<Line> = font.lines(text, SIZE, Wrap::SingleLine, 0.0).collect();
            let general: Vec<Line> = font.lines(text, SIZE, Wrap::Word, f32::MAX).collect();
            assert_eq!(single.len(), 1);
            assert_eq!(general.len(), 1);
            assert_eq!((single[0].begin, single[0].end), (general[0].begin, general[0].end));
            assert!((single[0].width - general[0].width).abs() < 1e-3);
        }
    }

    #[test]
    fn quad_count_matches_line_splitting() {
        let font = mock_font();
        let options = TextOptions {
            wrap: Wrap::Word,
            ..TextOptions::default()
        };
        let text = "one two three";
        let quads = font.quad_count(text, SIZE, options, 55.0);
        // Three lines of "one" / "two" / "three": 11 non-space characters.
        assert_eq!(quads, 11);
    }
}
