// Copyright 2025 the Textmesh Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Abstract glyph source for font atlas construction.
//!
//! A [`GlyphSource`] hands out everything an atlas builder needs from a host
//! font rasterizer: per-face vertical metrics, per-glyph placement metrics
//! with an 8-bit coverage bitmap, and the face's kerning pairs. The trait is
//! deliberately free of any rasterizer-specific type so that consumers stay
//! portable across backends.
//!
//! The default [`SystemGlyphSource`] backend (behind the `system` feature)
//! resolves a named system font family with `fontique`, rasterizes outlines
//! with `swash`, and reads pair kerning from the font's `kern` table.

#![warn(clippy::print_stdout, clippy::print_stderr)]

mod source;

#[cfg(feature = "system")]
mod system;

pub use source::{
    remap_coverage, FaceMetrics, FaceRequest, GlyphSource, KerningPair, RasterGlyph, SourceError,
    COVERAGE_MAX,
};

#[cfg(feature = "system")]
pub use system::{SystemFace, SystemGlyphSource};
