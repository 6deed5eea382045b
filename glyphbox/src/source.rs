// Copyright 2025 the Textmesh Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The glyph source capability and its data types.

/// Maximum coverage value a source may report for a single pixel.
///
/// Sources quantize antialiased coverage to `0..=64`; consumers expand it to
/// the full byte range with [`remap_coverage`].
pub const COVERAGE_MAX: u8 = 64;

/// Expands quantized coverage (`0..=64`) to the `0..=255` range stored in an
/// atlas.
#[inline]
pub fn remap_coverage(v: u8) -> u8 {
    if v >= COVERAGE_MAX {
        255
    } else {
        v * 4
    }
}

/// Parameters for selecting a rasterization face.
#[derive(Clone, Debug, Default)]
pub struct FaceRequest {
    /// Font family name as known to the host, e.g. `"Arial"`.
    pub family: String,
    /// Target em-box height in pixels. All reported metrics are in pixels at
    /// this size.
    pub pixel_height: u32,
    pub bold: bool,
    pub italic: bool,
    /// Opaque host-rasterizer hint. Backends may ignore it.
    pub char_set: u32,
    /// Opaque host-rasterizer hint. Backends may ignore it.
    pub pitch_and_family: u32,
}

impl FaceRequest {
    pub fn new(family: impl Into<String>, pixel_height: u32) -> Self {
        Self {
            family: family.into(),
            pixel_height,
            ..Self::default()
        }
    }
}

/// Vertical metrics of a selected face, in integer pixels relative to the
/// baseline. `ascent` and `descent` are non-negative.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct FaceMetrics {
    pub ascent: i32,
    pub descent: i32,
    pub line_gap: i32,
}

/// One rasterized glyph: placement metrics plus a coverage bitmap.
///
/// The bitmap is row-major top-down with a row pitch of `width` rounded up
/// to a multiple of 4, and per-pixel values quantized to
/// `0..=`[`COVERAGE_MAX`]. A glyph without ink (e.g. a space) has a zero
/// black box and an empty bitmap.
#[derive(Clone, Debug, Default)]
pub struct RasterGlyph {
    /// Horizontal cell advance in pixels.
    pub advance: i32,
    /// X of the black box's left edge relative to the pen origin.
    pub origin_x: i32,
    /// Y of the black box's top edge above the baseline (y up).
    pub origin_y: i32,
    /// Black box width in pixels.
    pub width: u32,
    /// Black box height in pixels.
    pub height: u32,
    pub coverage: Vec<u8>,
}

impl RasterGlyph {
    /// Row pitch of [`Self::coverage`] in bytes.
    #[inline]
    pub fn row_pitch(&self) -> usize {
        align4(self.width) as usize
    }

    /// Whether the glyph has a non-empty black box.
    #[inline]
    pub fn has_ink(&self) -> bool {
        self.width != 0 && self.height != 0
    }
}

/// A kerning adjustment between an ordered pair of code points, in signed
/// pixels.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct KerningPair {
    pub first: u32,
    pub second: u32,
    pub amount: i32,
}

/// Errors reported by a glyph source.
#[derive(Debug, Clone, thiserror::Error)]
pub enum SourceError {
    /// The requested family could not be resolved to a usable face.
    #[error("font family {family:?} is not available")]
    FontNotAvailable { family: String },
    /// The backend rasterizer failed in a way that prevents face setup.
    #[error("rasterizer failure: {0}")]
    Raster(String),
}

/// Capability for extracting glyph data from a host font rasterizer.
///
/// One face is selected per atlas build; the remaining queries are keyed by
/// the returned face value. Implementations may cache internally, hence
/// `&mut self` throughout.
pub trait GlyphSource {
    /// Backend-specific face handle.
    type Face;

    /// Configures a rasterization context for the requested family, size and
    /// style, with antialiased quality.
    fn select(&mut self, request: &FaceRequest) -> Result<Self::Face, SourceError>;

    /// Vertical metrics of the face.
    fn metrics(&mut self, face: &Self::Face) -> FaceMetrics;

    /// Rasterizes a single code point, or `None` when the face has no glyph
    /// for it.
    fn glyph(&mut self, face: &Self::Face, codepoint: u32) -> Option<RasterGlyph>;

    /// Kerning pairs of the face. `requested` lists the inclusive code-point
    /// ranges the caller is building; backends without a native pair
    /// enumeration may probe pairs over that set. Pairs with a zero amount
    /// need not be reported.
    fn kerning_pairs(&mut self, face: &Self::Face, requested: &[(u32, u32)]) -> Vec<KerningPair>;
}

#[inline]
pub(crate) const fn align4(v: u32) -> u32 {
    (v + 3) / 4 * 4
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn coverage_remap_endpoints() {
        assert_eq!(remap_coverage(0), 0);
        assert_eq!(remap_coverage(1), 4);
        assert_eq!(remap_coverage(63), 252);
        assert_eq!(remap_coverage(64), 255);
        // Out-of-contract values still saturate.
        assert_eq!(remap_coverage(200), 255);
    }

    #[test]
    fn raster_glyph_row_pitch_is_dword_aligned() {
        let mut glyph = RasterGlyph {
            width: 6,
            height: 2,
            ..RasterGlyph::default()
        };
        assert_eq!(glyph.row_pitch(), 8);
        glyph.width = 8;
        assert_eq!(glyph.row_pitch(), 8);
        glyph.width = 0;
        assert_eq!(glyph.row_pitch(), 0);
    }

    #[test]
    fn ink_requires_both_extents() {
        let glyph = RasterGlyph {
            width: 5,
            height: 0,
            ..RasterGlyph::default()
        };
        assert!(!glyph.has_ink());
    }
}
