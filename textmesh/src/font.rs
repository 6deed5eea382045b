// Copyright 2025 the Textmesh Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The immutable font object: glyph records, kerning table, atlas.

use glyphbox::GlyphSource;

use crate::atlas::{self, BuildError};

/// Number of entries in the dense glyph table, one per BMP code point.
pub(crate) const GLYPH_TABLE_LEN: usize = 0x10000;

/// Sentinel for [`GlyphRecord::kerning_first`]: the code point starts no
/// kerning pair.
pub const NO_KERNING: u32 = u32::MAX;

/// Fallback glyph for code points the face does not cover.
pub(crate) const FALLBACK_CHAR: char = '?';

/// Glyph whose sprite center provides the guaranteed-opaque fill UV.
pub(crate) const FILL_CHAR: char = '-';

/// Normalized texture rectangle of a glyph sprite.
///
/// `(u0, v0)` is the top-left edge and `(u1, v1)` the bottom-right, unless
/// the atlas was built with [`FontDesc::texture_from_left_bottom`], in which
/// case both V coordinates are pre-reflected.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct UvRect {
    pub u0: f32,
    pub v0: f32,
    pub u1: f32,
    pub v1: f32,
}

/// Per-code-point metrics and atlas placement.
///
/// All linear metrics are scaled to a font size of 1.0, so drawing at some
/// pixel size is a single multiply. `uv` is meaningless for glyphs without a
/// sprite (e.g. the space).
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct GlyphRecord {
    pub uv: UvRect,
    /// Pen advance to the next character.
    pub advance: f32,
    /// Pen origin to the quad's left edge.
    pub offset_x: f32,
    /// Pen origin (top of the em box) to the quad's top edge.
    pub offset_y: f32,
    /// Quad width.
    pub width: f32,
    /// Quad height.
    pub height: f32,
    /// Index of the first kerning entry whose `first` equals this code
    /// point, or [`NO_KERNING`].
    pub kerning_first: u32,
}

impl Default for GlyphRecord {
    fn default() -> Self {
        Self {
            uv: UvRect::default(),
            advance: 0.0,
            offset_x: 0.0,
            offset_y: 0.0,
            width: 0.0,
            height: 0.0,
            kerning_first: NO_KERNING,
        }
    }
}

/// One kerning adjustment, scaled to font size 1.0.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct KerningEntry {
    pub first: u32,
    pub second: u32,
    pub amount: f32,
}

/// Parameters for building a [`Font`].
#[derive(Clone, Debug, Default)]
pub struct FontDesc {
    /// Family name as installed on the host system, e.g. `"Arial"`.
    pub face_name: String,
    /// Em-box height in pixels used for rasterization; all stored metrics
    /// are divided by it.
    pub pixel_height: u32,
    pub bold: bool,
    pub italic: bool,
    /// Reflect the V axis of all texture coordinates so `(0, 0)` is the
    /// atlas's bottom-left corner, as OpenGL expects.
    pub texture_from_left_bottom: bool,
    /// Round both atlas extents up to the next power of two.
    pub texture_pow2: bool,
    /// Opaque host-rasterizer hint.
    pub char_set: u32,
    /// Opaque host-rasterizer hint.
    pub pitch_and_family: u32,
    /// Inclusive code-point ranges to rasterize. Empty means `[32, 127]`.
    /// The ranges must cover `' '`, `'-'` and `'?'`.
    pub char_ranges: Vec<(u32, u32)>,
}

impl FontDesc {
    pub fn new(face_name: impl Into<String>, pixel_height: u32) -> Self {
        Self {
            face_name: face_name.into(),
            pixel_height,
            ..Self::default()
        }
    }
}

#[derive(Debug)]
pub(crate) struct AtlasData {
    pub(crate) width: u32,
    pub(crate) height: u32,
    pub(crate) row_pitch: usize,
    pub(crate) pixels: Option<Vec<u8>>,
}

/// An immutable packed font: one grayscale coverage atlas plus the glyph and
/// kerning tables needed to lay out and mesh text with it.
///
/// Construction is a one-shot, synchronous build; afterwards every query
/// takes `&self`, so a `Font` can be shared freely across threads.
#[derive(Debug)]
pub struct Font {
    pub(crate) glyphs: Box<[GlyphRecord]>,
    pub(crate) kerning: Vec<KerningEntry>,
    pub(crate) fill_uv: [f32; 2],
    pub(crate) line_gap: f32,
    pub(crate) atlas: AtlasData,
}

impl Font {
    /// Builds a font from the given glyph source.
    ///
    /// Fails with no partial state when the face is unavailable, the
    /// rasterizer misbehaves, `'?'` or `'-'` produce no sprite, or a sprite
    /// is too wide for the atlas.
    pub fn new<S: GlyphSource>(source: &mut S, desc: &FontDesc) -> Result<Self, BuildError> {
        atlas::build(source, desc)
    }

    /// Record for a character; characters the face does not cover resolve to
    /// the `'?'` record.
    #[inline]
    pub fn glyph(&self, ch: char) -> &GlyphRecord {
        self.glyph_for(ch as u32)
    }

    #[inline]
    pub(crate) fn glyph_for(&self, codepoint: u32) -> &GlyphRecord {
        let index = if (codepoint as usize) < GLYPH_TABLE_LEN {
            codepoint as usize
        } else {
            FALLBACK_CHAR as usize
        };
        &self.glyphs[index]
    }

    /// Pen advance of a character at font size 1.0.
    #[inline]
    pub fn advance(&self, ch: char) -> f32 {
        self.glyph(ch).advance
    }

    /// Pen advance of a character at the given font size.
    #[inline]
    pub fn advance_scaled(&self, ch: char, font_size: f32) -> f32 {
        self.advance(ch) * font_size
    }

    /// Kerning between an ordered character pair at font size 1.0, or zero.
    pub fn kerning(&self, first: char, second: char) -> f32 {
        let mut index = self.glyph(first).kerning_first;
        if index == NO_KERNING {
            return 0.0;
        }
        let first = first as u32;
        let second = second as u32;
        while let Some(entry) = self.kerning.get(index as usize) {
            if entry.first != first {
                break;
            }
            if entry.second == second {
                return entry.amount;
            }
            if entry.second > second {
                break;
            }
            index += 1;
        }
        0.0
    }

    /// Kerning between an ordered character pair at the given font size.
    #[inline]
    pub fn kerning_scaled(&self, first: char, second: char, font_size: f32) -> f32 {
        self.kerning(first, second) * font_size
    }

    /// Extra vertical space between lines at font size 1.0.
    #[inline]
    pub fn line_gap(&self) -> f32 {
        self.line_gap
    }

    /// Extra vertical space between lines at the given font size.
    #[inline]
    pub fn line_gap_scaled(&self, font_size: f32) -> f32 {
        self.line_gap * font_size
    }

    /// A texture coordinate that is guaranteed to sample fully opaque
    /// coverage; used to draw solid rectangles with the atlas bound.
    #[inline]
    pub fn fill_uv(&self) -> [f32; 2] {
        self.fill_uv
    }

    /// The kerning table, sorted by `(first, second)`.
    #[inline]
    pub fn kerning_entries(&self) -> &[KerningEntry] {
        &self.kerning
    }

    /// Atlas extents in pixels.
    #[inline]
    pub fn atlas_size(&self) -> (u32, u32) {
        (self.atlas.width, self.atlas.height)
    }

    /// Byte step between atlas rows; the width rounded up to a multiple
    /// of 4.
    #[inline]
    pub fn atlas_row_pitch(&self) -> usize {
        self.atlas.row_pitch
    }

    /// The atlas coverage pixels, row-major top-down, one byte per pixel, or
    /// `None` after [`Self::release_pixels`].
    #[inline]
    pub fn atlas_pixels(&self) -> Option<&[u8]> {
        self.atlas.pixels.as_deref()
    }

    /// Frees the atlas pixel buffer, typically right after uploading it to
    /// GPU memory. Idempotent; every metric query keeps working.
    pub fn release_pixels(&mut self) {
        self.atlas.pixels = None;
    }

    /// Full advance-plus-kerning width of `text` as a single line at the
    /// given font size.
    pub fn single_line_width(&self, text: &str, font_size: f32) -> f32 {
        let mut width = 0.0;
        let mut prev: Option<char> = None;
        for ch in text.chars() {
            width += self.advance(ch);
            if let Some(prev) = prev {
                width += self.kerning(prev, ch);
            }
            prev = Some(ch);
        }
        width * font_size
    }
}
