// Copyright 2025 the Textmesh Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Deterministic glyph source for the test suite.
//!
//! Every code point in `[32, 127]` exists with a pen advance of exactly one
//! em, so widths in tests are simple multiples of the font size. Boxes are
//! 6x7 (2 tall for `'-'`, empty for the space), coverage is fully opaque
//! except for the first ink pixel, and the kerning table is small, known,
//! and deliberately unsorted.

use glyphbox::{
    FaceMetrics, FaceRequest, GlyphSource, KerningPair, RasterGlyph, SourceError, COVERAGE_MAX,
};

use crate::font::{Font, FontDesc};

#[derive(Default)]
pub(crate) struct MockGlyphSource {
    /// Code points the rasterizer rejects outright.
    pub(crate) drop_glyphs: Vec<u32>,
    /// Code points that exist but produce no ink (besides the space).
    pub(crate) inkless: Vec<u32>,
    /// A code point given a box far wider than any atlas row.
    pub(crate) giant: Option<u32>,
}

pub(crate) struct MockFace {
    pixel_height: u32,
}

impl GlyphSource for MockGlyphSource {
    type Face = MockFace;

    fn select(&mut self, request: &FaceRequest) -> Result<MockFace, SourceError> {
        if request.family.is_empty() {
            return Err(SourceError::FontNotAvailable {
                family: request.family.clone(),
            });
        }
        Ok(MockFace {
            pixel_height: request.pixel_height,
        })
    }

    fn metrics(&mut self, face: &MockFace) -> FaceMetrics {
        let h = face.pixel_height as i32;
        FaceMetrics {
            ascent: h * 4 / 5,
            descent: h / 5,
            line_gap: h / 5,
        }
    }

    fn glyph(&mut self, face: &MockFace, codepoint: u32) -> Option<RasterGlyph> {
        if !(32..=127).contains(&codepoint) || self.drop_glyphs.contains(&codepoint) {
            return None;
        }
        let advance = face.pixel_height as i32;
        if codepoint == 32 || self.inkless.contains(&codepoint) {
            return Some(RasterGlyph {
                advance,
                ..RasterGlyph::default()
            });
        }
        let (width, height) = if self.giant == Some(codepoint) {
            (face.pixel_height * 10, 2)
        } else if codepoint == '-' as u32 {
            (6, 2)
        } else {
            (6, 7)
        };
        let pitch = (width + 3) / 4 * 4;
        let mut coverage = vec![0_u8; (pitch * height) as usize];
        for row in 0..height {
            for col in 0..width {
                coverage[(row * pitch + col) as usize] = COVERAGE_MAX;
            }
        }
        coverage[0] = 32;
        Some(RasterGlyph {
            advance,
            origin_x: 1,
            origin_y: if codepoint == '-' as u32 { 4 } else { 7 },
            width,
            height,
            coverage,
        })
    }

    fn kerning_pairs(&mut self, _face: &MockFace, _requested: &[(u32, u32)]) -> Vec<KerningPair> {
        vec![
            KerningPair {
                first: 'V' as u32,
                second: 'A' as u32,
                amount: -1,
            },
            KerningPair {
                first: 'A' as u32,
                second: 'V' as u32,
                amount: -2,
            },
            KerningPair {
                first: 'A' as u32,
                second: 'B' as u32,
                amount: 1,
            },
            // Zero amounts and pairs whose second glyph the face rejects
            // must both be dropped by the builder.
            KerningPair {
                first: 'B' as u32,
                second: 'B' as u32,
                amount: 0,
            },
            KerningPair {
                first: 'T' as u32,
                second: 0x2026,
                amount: 3,
            },
        ]
    }
}

/// A mock-backed font at pixel height 10: advances are 1.0 em, the line gap
/// is 0.2 em, and kerning is `A-V = -0.2`, `A-B = 0.1`, `V-A = -0.1`.
pub(crate) fn mock_font() -> Font {
    mock_font_with(|_| {})
}

pub(crate) fn mock_font_with(configure: impl FnOnce(&mut FontDesc)) -> Font {
    let mut desc = FontDesc::new("Mock", 10);
    configure(&mut desc);
    Font::new(&mut MockGlyphSource::default(), &desc).expect("mock font builds")
}
