// Copyright 2025 the Textmesh Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Text rendering support built around a packed glyph atlas.
//!
//! Given a font face and a pixel size, [`Font::new`] rasterizes the requested
//! code points through a [`glyphbox::GlyphSource`], bin-packs the coverage
//! bitmaps into a single grayscale texture, and records per-code-point
//! metrics plus the face's kerning pairs. The resulting [`Font`] is immutable
//! and answers layout queries — line splitting with four wrap modes, extents,
//! quad counts, hit testing — and writes textured quads for arbitrary text
//! into caller-provided vertex/index memory under several topology and index
//! format combinations.
//!
//! The caller owns the GPU side entirely: upload [`Font::atlas_pixels`] to a
//! single-channel texture (then optionally [`Font::release_pixels`]), size
//! buffers with [`quad_count_to_vertex_count`], and draw with whatever 3D API
//! is at hand.

#![warn(clippy::print_stdout, clippy::print_stderr)]

pub use glyphbox;

mod atlas;
mod font;
pub mod layout;
mod vertex;

#[cfg(test)]
mod testing;

pub use atlas::BuildError;
pub use font::{Font, FontDesc, GlyphRecord, KerningEntry, UvRect, NO_KERNING};
pub use layout::{
    Decorations, HAlign, Line, LineBreaker, TextExtent, TextHit, TextOptions, VAlign, Wrap,
};
pub use vertex::{
    quad_count_to_vertex_count, IndexFormat, Topology, VertexBufferDesc, VertexLayout,
};
