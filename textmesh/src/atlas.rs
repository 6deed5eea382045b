// Copyright 2025 the Textmesh Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Atlas construction: glyph collection, kerning, packing, blitting.

use glyphbox::{remap_coverage, FaceRequest, GlyphSource, SourceError};
use tracing::debug;

use crate::font::{
    AtlasData, Font, FontDesc, GlyphRecord, KerningEntry, UvRect, FALLBACK_CHAR, FILL_CHAR,
    GLYPH_TABLE_LEN, NO_KERNING,
};

/// Code points rasterized when [`FontDesc::char_ranges`] is empty.
const DEFAULT_RANGE: (u32, u32) = (32, 127);

/// Gap kept between packed sprites and around the atlas border, in pixels.
const MARGIN: u32 = 1;

/// Fatal errors of [`Font::new`]. No partial font is ever returned.
#[derive(Debug, Clone, thiserror::Error)]
pub enum BuildError {
    #[error("font family {family:?} is not available")]
    FontNotAvailable { family: String },
    #[error("rasterizer failure: {0}")]
    Rasterizer(String),
    #[error("required glyph {0:?} has no sprite")]
    MissingRequiredGlyph(char),
    #[error("a sprite {width} pixels wide cannot fit an atlas {atlas_width} pixels wide")]
    PackingOverflow { width: u32, atlas_width: u32 },
}

impl From<SourceError> for BuildError {
    fn from(err: SourceError) -> Self {
        match err {
            SourceError::FontNotAvailable { family } => Self::FontNotAvailable { family },
            SourceError::Raster(message) => Self::Rasterizer(message),
        }
    }
}

/// Per-code-point bookkeeping used only during the build.
#[derive(Copy, Clone, Default)]
struct Scratch {
    exists: bool,
    data_offset: usize,
    box_w: u32,
    box_h: u32,
    pos_x: u32,
    pos_y: u32,
}

impl Scratch {
    fn has_sprite(&self) -> bool {
        self.exists && self.box_w != 0 && self.box_h != 0
    }
}

/// Online shelf packer. Sprites are placed left to right along the current
/// shelf; when one does not fit horizontally, a new shelf starts below the
/// tallest point reached so far.
struct ShelfPacker {
    width: u32,
    pen_x: u32,
    pen_y: u32,
    max_y: u32,
}

impl ShelfPacker {
    fn new(width: u32) -> Self {
        Self {
            width,
            pen_x: MARGIN,
            pen_y: MARGIN,
            max_y: MARGIN,
        }
    }

    /// Places one sprite, returning its top-left corner, or `None` when the
    /// sprite cannot fit the atlas width at all.
    fn place(&mut self, w: u32, h: u32) -> Option<(u32, u32)> {
        if w + 2 * MARGIN > self.width {
            return None;
        }
        self.pen_x += MARGIN;
        if self.pen_x + w + MARGIN > self.width {
            self.pen_x = MARGIN;
            self.pen_y = self.max_y + MARGIN;
        }
        let pos = (self.pen_x, self.pen_y);
        self.max_y = self.max_y.max(self.pen_y + h);
        self.pen_x += w;
        Some(pos)
    }

    fn packed_height(&self) -> u32 {
        self.max_y + MARGIN
    }
}

pub(crate) fn build<S: GlyphSource>(source: &mut S, desc: &FontDesc) -> Result<Font, BuildError> {
    assert!(desc.pixel_height > 0, "pixel_height must be positive");
    let inv_height = 1.0 / desc.pixel_height as f32;

    let face = source.select(&FaceRequest {
        family: desc.face_name.clone(),
        pixel_height: desc.pixel_height,
        bold: desc.bold,
        italic: desc.italic,
        char_set: desc.char_set,
        pitch_and_family: desc.pitch_and_family,
    })?;
    let metrics = source.metrics(&face);
    let line_gap = metrics.line_gap as f32 * inv_height;

    let ranges = normalized_ranges(desc);
    let mut requested = vec![false; GLYPH_TABLE_LEN];
    for &(lo, hi) in &ranges {
        for cp in lo..=hi {
            requested[cp as usize] = true;
        }
    }

    // Phase 1: collect metrics and raw coverage into a scratch arena.
    let mut glyphs = vec![GlyphRecord::default(); GLYPH_TABLE_LEN].into_boxed_slice();
    let mut scratch = vec![Scratch::default(); GLYPH_TABLE_LEN];
    let mut arena = Vec::new();
    let mut accepted = 0_usize;
    for cp in 1..GLYPH_TABLE_LEN as u32 {
        if !requested[cp as usize] {
            continue;
        }
        let Some(glyph) = source.glyph(&face, cp) else {
            continue;
        };
        accepted += 1;
        let state = &mut scratch[cp as usize];
        state.exists = true;

        let record = &mut glyphs[cp as usize];
        record.advance = glyph.advance as f32 * inv_height;
        record.offset_x = glyph.origin_x as f32 * inv_height;
        record.offset_y = (metrics.ascent - glyph.origin_y) as f32 * inv_height;
        record.width = glyph.width as f32 * inv_height;
        record.height = glyph.height as f32 * inv_height;

        if glyph.has_ink() {
            let needed = glyph.row_pitch() * glyph.height as usize;
            if glyph.coverage.len() < needed {
                return Err(BuildError::Rasterizer(format!(
                    "truncated coverage bitmap for U+{cp:04X}"
                )));
            }
            state.data_offset = arena.len();
            state.box_w = glyph.width;
            state.box_h = glyph.height;
            arena.extend_from_slice(&glyph.coverage[..needed]);
        }
    }

    // Phase 2: kerning, restricted to accepted glyphs on both sides.
    let mut kerning = Vec::new();
    for pair in source.kerning_pairs(&face, &ranges) {
        if pair.amount == 0 {
            continue;
        }
        let both_exist = scratch.get(pair.first as usize).is_some_and(|s| s.exists)
            && scratch.get(pair.second as usize).is_some_and(|s| s.exists);
        if !both_exist {
            continue;
        }
        kerning.push(KerningEntry {
            first: pair.first,
            second: pair.second,
            amount: pair.amount as f32 * inv_height,
        });
    }
    kerning.sort_by(|a, b| (a.first, a.second).cmp(&(b.first, b.second)));
    for (index, entry) in kerning.iter().enumerate() {
        let record = &mut glyphs[entry.first as usize];
        if record.kerning_first == NO_KERNING {
            record.kerning_first = index as u32;
        }
    }

    for required in [FALLBACK_CHAR, FILL_CHAR] {
        if !scratch[required as usize].has_sprite() {
            return Err(BuildError::MissingRequiredGlyph(required));
        }
    }

    // Phase 3: pack sprites tallest-first.
    let mut atlas_width = desc.pixel_height * 8;
    if desc.texture_pow2 {
        atlas_width = atlas_width.next_power_of_two();
    }
    let mut order: Vec<u32> = (1..GLYPH_TABLE_LEN as u32)
        .filter(|&cp| scratch[cp as usize].has_sprite())
        .collect();
    order.sort_by(|&a, &b| scratch[b as usize].box_h.cmp(&scratch[a as usize].box_h));

    let mut packer = ShelfPacker::new(atlas_width);
    for &cp in &order {
        let state = &mut scratch[cp as usize];
        let (x, y) =
            packer
                .place(state.box_w, state.box_h)
                .ok_or(BuildError::PackingOverflow {
                    width: state.box_w,
                    atlas_width,
                })?;
        state.pos_x = x;
        state.pos_y = y;
    }
    let mut atlas_height = packer.packed_height();
    if desc.texture_pow2 {
        atlas_height = atlas_height.next_power_of_two();
    }

    // Phase 4: blit with the coverage remap and assign texture coordinates.
    let row_pitch = align4(atlas_width) as usize;
    let mut pixels = vec![0_u8; row_pitch * atlas_height as usize];
    let width_inv = 1.0 / atlas_width as f32;
    let height_inv = 1.0 / atlas_height as f32;
    for &cp in &order {
        let state = &scratch[cp as usize];
        blit(
            &mut pixels,
            row_pitch,
            (state.pos_x, state.pos_y),
            &arena[state.data_offset..],
            align4(state.box_w) as usize,
            (state.box_w, state.box_h),
        );
        let record = &mut glyphs[cp as usize];
        record.uv = UvRect {
            u0: state.pos_x as f32 * width_inv,
            v0: state.pos_y as f32 * height_inv,
            u1: (state.pos_x + state.box_w) as f32 * width_inv,
            v1: (state.pos_y + state.box_h) as f32 * height_inv,
        };
        if desc.texture_from_left_bottom {
            record.uv.v0 = 1.0 - record.uv.v0;
            record.uv.v1 = 1.0 - record.uv.v1;
        }
    }

    // Phase 5: fill point, then alias everything the face rejected to '?'.
    let fill = glyphs[FILL_CHAR as usize].uv;
    let fill_uv = [(fill.u0 + fill.u1) * 0.5, (fill.v0 + fill.v1) * 0.5];
    let fallback = glyphs[FALLBACK_CHAR as usize];
    for cp in 0..GLYPH_TABLE_LEN {
        if !scratch[cp].exists {
            glyphs[cp] = fallback;
        }
    }

    debug!(
        accepted,
        packed = order.len(),
        kerning = kerning.len(),
        atlas_width,
        atlas_height,
        "built font atlas"
    );

    Ok(Font {
        glyphs,
        kerning,
        fill_uv,
        line_gap,
        atlas: AtlasData {
            width: atlas_width,
            height: atlas_height,
            row_pitch,
            pixels: Some(pixels),
        },
    })
}

fn normalized_ranges(desc: &FontDesc) -> Vec<(u32, u32)> {
    if desc.char_ranges.is_empty() {
        return vec![DEFAULT_RANGE];
    }
    desc.char_ranges
        .iter()
        .filter_map(|&(lo, hi)| {
            let hi = hi.min(GLYPH_TABLE_LEN as u32 - 1);
            (lo <= hi).then_some((lo, hi))
        })
        .collect()
}

fn blit(
    dst: &mut [u8],
    dst_pitch: usize,
    dst_pos: (u32, u32),
    src: &[u8],
    src_pitch: usize,
    size: (u32, u32),
) {
    for row in 0..size.1 as usize {
        let dst_row = (dst_pos.1 as usize + row) * dst_pitch + dst_pos.0 as usize;
        let src_row = row * src_pitch;
        for col in 0..size.0 as usize {
            dst[dst_row + col] = remap_coverage(src[src_row + col]);
        }
    }
}

#[inline]
const fn align4(v: u32) -> u32 {
    (v + 3) / 4 * 4
}
