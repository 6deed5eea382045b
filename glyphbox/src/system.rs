// Copyright 2025 the Textmesh Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! System font backend.
//!
//! Family resolution goes through fontique's system collection, glyph
//! rasterization through swash, and kerning through the face's `kern`
//! table. Only the crate's rasterizer-agnostic types cross the API
//! boundary.

use fontique::{
    Attributes, Blob, Collection, CollectionOptions, FontStyle, FontWeight, FontWidth,
    QueryStatus, SourceCache,
};
use swash::scale::{Render, ScaleContext, Source};
use swash::zeno::Format;
use swash::FontRef;
use tracing::debug;

use crate::source::{
    align4, FaceMetrics, FaceRequest, GlyphSource, KerningPair, RasterGlyph, SourceError,
    COVERAGE_MAX,
};

/// Glyph source backed by the fonts installed on the host system.
pub struct SystemGlyphSource {
    collection: Collection,
    source_cache: SourceCache,
    scale: ScaleContext,
}

/// A face selected from the system collection.
#[derive(Clone)]
pub struct SystemFace {
    data: Blob<u8>,
    index: u32,
    pixel_height: u32,
}

impl SystemGlyphSource {
    pub fn new() -> Self {
        Self {
            collection: Collection::new(CollectionOptions::default()),
            source_cache: SourceCache::default(),
            scale: ScaleContext::new(),
        }
    }
}

impl Default for SystemGlyphSource {
    fn default() -> Self {
        Self::new()
    }
}

impl SystemFace {
    fn font_ref(&self) -> Option<FontRef<'_>> {
        FontRef::from_index(self.data.as_ref(), self.index as usize)
    }
}

impl GlyphSource for SystemGlyphSource {
    type Face = SystemFace;

    fn select(&mut self, request: &FaceRequest) -> Result<SystemFace, SourceError> {
        if request.pixel_height == 0 {
            return Err(SourceError::Raster("pixel height must be positive".into()));
        }
        let not_available = || SourceError::FontNotAvailable {
            family: request.family.clone(),
        };
        if request.family.is_empty() {
            return Err(not_available());
        }

        let mut selected: Option<(Blob<u8>, u32)> = None;
        {
            let mut query = self.collection.query(&mut self.source_cache);
            query.set_families([request.family.as_str()]);
            let weight = if request.bold {
                FontWeight::BOLD
            } else {
                FontWeight::NORMAL
            };
            let style = if request.italic {
                FontStyle::Italic
            } else {
                FontStyle::Normal
            };
            query.set_attributes(Attributes::new(FontWidth::NORMAL, style, weight));
            query.matches_with(|font| {
                selected = Some((font.blob.clone(), font.index));
                QueryStatus::Stop
            });
        }
        let (data, index) = selected.ok_or_else(not_available)?;

        let face = SystemFace {
            data,
            index,
            pixel_height: request.pixel_height,
        };
        // Reject faces swash cannot parse up front so the per-glyph queries
        // never have to.
        if face.font_ref().is_none() {
            return Err(not_available());
        }
        debug!(
            family = request.family.as_str(),
            index, request.pixel_height, "selected system face"
        );
        Ok(face)
    }

    fn metrics(&mut self, face: &SystemFace) -> FaceMetrics {
        let Some(font_ref) = face.font_ref() else {
            return FaceMetrics::default();
        };
        let m = font_ref.metrics(&[]).scale(face.pixel_height as f32);
        FaceMetrics {
            ascent: m.ascent.round() as i32,
            descent: m.descent.abs().round() as i32,
            line_gap: m.leading.round() as i32,
        }
    }

    fn glyph(&mut self, face: &SystemFace, codepoint: u32) -> Option<RasterGlyph> {
        let ch = char::from_u32(codepoint)?;
        let font_ref = face.font_ref()?;
        let glyph_id = font_ref.charmap().map(ch);
        if glyph_id == 0 {
            return None;
        }
        let size = face.pixel_height as f32;
        let advance = font_ref
            .glyph_metrics(&[])
            .scale(size)
            .advance_width(glyph_id)
            .round() as i32;

        let mut scaler = self.scale.builder(font_ref).size(size).hint(true).build();
        let Some(image) = Render::new(&[Source::Outline])
            .format(Format::Alpha)
            .render(&mut scaler, glyph_id)
        else {
            // The glyph exists but has no renderable outline; treat it as
            // ink-free, like a space.
            return Some(RasterGlyph {
                advance,
                ..RasterGlyph::default()
            });
        };

        let width = image.placement.width;
        let height = image.placement.height;
        let pitch = align4(width) as usize;
        let mut coverage = vec![0_u8; pitch * height as usize];
        for y in 0..height as usize {
            let src = &image.data[y * width as usize..(y + 1) * width as usize];
            let dst = &mut coverage[y * pitch..y * pitch + width as usize];
            for (d, &alpha) in dst.iter_mut().zip(src) {
                *d = quantize_alpha(alpha);
            }
        }

        Some(RasterGlyph {
            advance,
            origin_x: image.placement.left,
            origin_y: image.placement.top,
            width,
            height,
            coverage,
        })
    }

    fn kerning_pairs(&mut self, face: &SystemFace, requested: &[(u32, u32)]) -> Vec<KerningPair> {
        let Ok(ttf) = ttf_parser::Face::parse(face.data.as_ref(), face.index) else {
            return Vec::new();
        };
        let Some(kern) = ttf.tables().kern else {
            return Vec::new();
        };
        let subtables: Vec<_> = kern
            .subtables
            .into_iter()
            .filter(|st| st.horizontal && !st.variable)
            .collect();
        if subtables.is_empty() {
            return Vec::new();
        }
        let scale = face.pixel_height as f32 / ttf.units_per_em() as f32;

        let mut mapped = Vec::new();
        for &(lo, hi) in requested {
            for cp in lo..=hi {
                let Some(ch) = char::from_u32(cp) else {
                    continue;
                };
                if let Some(glyph_id) = ttf.glyph_index(ch) {
                    mapped.push((cp, glyph_id));
                }
            }
        }

        // There is no portable pair-enumeration call, so probe every ordered
        // pair of requested glyphs. Quadratic, but a one-shot build cost and
        // small for typical Latin ranges.
        let mut pairs = Vec::new();
        for &(first, left) in &mapped {
            for &(second, right) in &mapped {
                let mut units = 0_i32;
                for st in &subtables {
                    if let Some(v) = st.glyphs_kerning(left, right) {
                        units += i32::from(v);
                    }
                }
                let amount = (units as f32 * scale).round() as i32;
                if amount != 0 {
                    pairs.push(KerningPair {
                        first,
                        second,
                        amount,
                    });
                }
            }
        }
        debug!(pair_count = pairs.len(), "collected kerning pairs");
        pairs
    }
}

/// Quantizes an 8-bit alpha value down to the `0..=`[`COVERAGE_MAX`] range
/// the [`GlyphSource`] contract specifies.
#[inline]
fn quantize_alpha(alpha: u8) -> u8 {
    ((u32::from(alpha) * u32::from(COVERAGE_MAX) + 127) / 255) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_family_is_not_available() {
        let mut source = SystemGlyphSource::new();
        let request = FaceRequest::new("surely-not-an-installed-family-9b1c", 16);
        let err = source.select(&request).err().expect("selection must fail");
        match err {
            SourceError::FontNotAvailable { family } => assert!(family.contains("9b1c")),
            other => panic!("expected FontNotAvailable, got {other:?}"),
        }
    }

    #[test]
    fn zero_height_is_rejected() {
        let mut source = SystemGlyphSource::new();
        assert!(source.select(&FaceRequest::new("Arial", 0)).is_err());
    }

    #[test]
    fn alpha_quantization_round_trips_through_remap() {
        assert_eq!(quantize_alpha(0), 0);
        assert_eq!(quantize_alpha(255), COVERAGE_MAX);
        assert_eq!(crate::remap_coverage(quantize_alpha(255)), 255);
        for alpha in 0..=255_u16 {
            let q = quantize_alpha(alpha as u8);
            assert!(q <= COVERAGE_MAX);
        }
    }
}
