// Copyright 2025 the Textmesh Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Quad emission into caller-provided vertex/index memory.
//!
//! One writer type exists per valid topology and index-format combination;
//! the layout walker is generic over the writer, so each combination
//! monomorphizes into a per-quad path with no topology branching.

use crate::font::Font;
use crate::layout::{HAlign, Line, TextOptions, VAlign, Wrap};

use core::marker::PhantomData;

// Decoration geometry, as fractions of the font size. Empirical values; the
// underline pair of a double underline sits 2x its thickness apart.
const LINE_HEIGHT: f32 = 0.075;
const UNDERLINE_POS: f32 = 0.95;
const STRIKEOUT_POS: f32 = 0.6;
const OVERLINE_POS: f32 = 0.05;
const DOUBLE_LINE_HEIGHT: f32 = 0.066_666_67;
const DOUBLE_UNDERLINE_POS: f32 = 0.98;

/// Primitive topology of the emitted quads.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Topology {
    /// Two triangles per quad.
    TriangleList,
    /// One strip per quad, separated by the restart sentinel. Requires an
    /// index buffer.
    StripRestart,
    /// One strip per quad, bridged by degenerate triangles.
    StripDegenerate,
}

/// Width of the optional index buffer. Indices are written little-endian;
/// the restart sentinel is the all-ones value of the chosen width.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum IndexFormat {
    U16,
    U32,
}

impl IndexFormat {
    /// Size of one index in bytes.
    pub fn byte_size(self) -> usize {
        match self {
            Self::U16 => 2,
            Self::U32 => 4,
        }
    }
}

/// Topology and index format for one emission call.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct VertexLayout {
    pub topology: Topology,
    pub index_format: Option<IndexFormat>,
}

impl VertexLayout {
    /// Panics on the one invalid combination: [`Topology::StripRestart`]
    /// without an index buffer.
    pub fn new(topology: Topology, index_format: Option<IndexFormat>) -> Self {
        let layout = Self {
            topology,
            index_format,
        };
        assert!(
            layout.is_valid(),
            "a restart-index strip requires an index buffer"
        );
        layout
    }

    pub fn is_valid(self) -> bool {
        !(self.topology == Topology::StripRestart && self.index_format.is_none())
    }
}

/// Converts a quad count to the exact vertex and index counts an emission
/// call will write under the given layout.
pub fn quad_count_to_vertex_count(layout: VertexLayout, quad_count: usize) -> (usize, usize) {
    if quad_count == 0 {
        return (0, 0);
    }
    match (layout.topology, layout.index_format.is_some()) {
        (Topology::TriangleList, false) => (quad_count * 6, 0),
        (Topology::TriangleList, true) => (quad_count * 4, quad_count * 6),
        (Topology::StripRestart, true) => (quad_count * 4, quad_count * 5 - 1),
        (Topology::StripDegenerate, false) => (quad_count * 6 - 2, 0),
        (Topology::StripDegenerate, true) => (quad_count * 4, quad_count * 6 - 2),
        (Topology::StripRestart, false) => {
            panic!("a restart-index strip requires an index buffer")
        }
    }
}

/// Caller-provided interleaved output memory.
///
/// The position and texture-coordinate channels of vertex `i` live at
/// `*_offset + i * *_stride` within `vertex_data`, each as two `f32` values
/// in native byte order; the two channels commonly interleave within the
/// same vertex struct. No other bytes of a vertex are touched. `index_data`
/// must be present exactly when the layout uses an index format.
///
/// The emitter never allocates; buffers must be sized per
/// [`quad_count_to_vertex_count`], and writing past either slice panics.
#[derive(Debug)]
pub struct VertexBufferDesc<'a> {
    pub vertex_data: &'a mut [u8],
    pub position_offset: usize,
    pub position_stride: usize,
    pub tex_coord_offset: usize,
    pub tex_coord_stride: usize,
    pub index_data: Option<&'a mut [u8]>,
}

impl VertexBufferDesc<'_> {
    fn set_vertex(&mut self, vertex: usize, pos: [f32; 2], uv: [f32; 2]) {
        self.set_position(vertex, pos);
        let at = self.tex_coord_offset + vertex * self.tex_coord_stride;
        self.vertex_data[at..at + 8].copy_from_slice(bytemuck::bytes_of(&uv));
    }

    fn set_position(&mut self, vertex: usize, pos: [f32; 2]) {
        let at = self.position_offset + vertex * self.position_stride;
        self.vertex_data[at..at + 8].copy_from_slice(bytemuck::bytes_of(&pos));
    }

    fn position(&self, vertex: usize) -> [f32; 2] {
        let at = self.position_offset + vertex * self.position_stride;
        bytemuck::pod_read_unaligned(&self.vertex_data[at..at + 8])
    }

    fn write_index<I: IndexValue>(&mut self, at: usize, value: u32) {
        let data = self
            .index_data
            .as_deref_mut()
            .expect("vertex layout requires an index buffer");
        I::write(data, at, value);
    }

    fn write_restart<I: IndexValue>(&mut self, at: usize) {
        let data = self
            .index_data
            .as_deref_mut()
            .expect("vertex layout requires an index buffer");
        I::write_restart(data, at);
    }
}

trait IndexValue: Copy {
    fn write(data: &mut [u8], at: usize, value: u32);
    fn write_restart(data: &mut [u8], at: usize);
}

impl IndexValue for u16 {
    fn write(data: &mut [u8], at: usize, value: u32) {
        let byte = at * 2;
        data[byte..byte + 2].copy_from_slice(&(value as u16).to_le_bytes());
    }

    fn write_restart(data: &mut [u8], at: usize) {
        Self::write(data, at, u32::from(u16::MAX));
    }
}

impl IndexValue for u32 {
    fn write(data: &mut [u8], at: usize, value: u32) {
        let byte = at * 4;
        data[byte..byte + 4].copy_from_slice(&value.to_le_bytes());
    }

    fn write_restart(data: &mut [u8], at: usize) {
        Self::write(data, at, u32::MAX);
    }
}

/// Receives quads as `(left, top, right, bottom)` position and texture
/// rectangles.
trait QuadSink {
    fn post_quad(&mut self, positions: [f32; 4], tex_coords: [f32; 4]);
}

/// Quad corners in LT, RT, LB, RB order.
fn corners(positions: [f32; 4], tex: [f32; 4]) -> [([f32; 2], [f32; 2]); 4] {
    [
        ([positions[0], positions[1]], [tex[0], tex[1]]),
        ([positions[2], positions[1]], [tex[2], tex[1]]),
        ([positions[0], positions[3]], [tex[0], tex[3]]),
        ([positions[2], positions[3]], [tex[2], tex[3]]),
    ]
}

struct ListWriter<'b, 'a> {
    desc: &'b mut VertexBufferDesc<'a>,
    quad: usize,
}

impl QuadSink for ListWriter<'_, '_> {
    fn post_quad(&mut self, positions: [f32; 4], tex_coords: [f32; 4]) {
        let base = self.quad * 6;
        let c = corners(positions, tex_coords);
        self.desc.set_vertex(base, c[0].0, c[0].1);
        self.desc.set_vertex(base + 1, c[1].0, c[1].1);
        self.desc.set_vertex(base + 2, c[2].0, c[2].1);
        self.desc.set_vertex(base + 3, c[2].0, c[2].1);
        self.desc.set_vertex(base + 4, c[1].0, c[1].1);
        self.desc.set_vertex(base + 5, c[3].0, c[3].1);
        self.quad += 1;
    }
}

struct IndexedListWriter<'b, 'a, I> {
    desc: &'b mut VertexBufferDesc<'a>,
    quad: usize,
    _format: PhantomData<I>,
}

impl<I: IndexValue> QuadSink for IndexedListWriter<'_, '_, I> {
    fn post_quad(&mut self, positions: [f32; 4], tex_coords: [f32; 4]) {
        let base = self.quad * 4;
        for (corner, (pos, uv)) in corners(positions, tex_coords).into_iter().enumerate() {
            self.desc.set_vertex(base + corner, pos, uv);
        }
        for (slot, offset) in [0, 1, 2, 2, 1, 3].into_iter().enumerate() {
            self.desc
                .write_index::<I>(self.quad * 6 + slot, (base + offset) as u32);
        }
        self.quad += 1;
    }
}

struct RestartStripWriter<'b, 'a, I> {
    desc: &'b mut VertexBufferDesc<'a>,
    quad: usize,
    _format: PhantomData<I>,
}

impl<I: IndexValue> QuadSink for RestartStripWriter<'_, '_, I> {
    fn post_quad(&mut self, positions: [f32; 4], tex_coords: [f32; 4]) {
        let base = self.quad * 4;
        for (corner, (pos, uv)) in corners(positions, tex_coords).into_iter().enumerate() {
            self.desc.set_vertex(base + corner, pos, uv);
        }
        if self.quad > 0 {
            self.desc.write_restart::<I>(self.quad * 5 - 1);
        }
        for slot in 0..4 {
            self.desc
                .write_index::<I>(self.quad * 5 + slot, (base + slot) as u32);
        }
        self.quad += 1;
    }
}

struct DegenerateStripWriter<'b, 'a> {
    desc: &'b mut VertexBufferDesc<'a>,
    quad: usize,
}

impl QuadSink for DegenerateStripWriter<'_, '_> {
    fn post_quad(&mut self, positions: [f32; 4], tex_coords: [f32; 4]) {
        let base = self.quad * 6;
        if self.quad > 0 {
            // Bridge with the previous quad's RB and this quad's LT,
            // positions only.
            let previous = self.desc.position(base - 3);
            self.desc.set_position(base - 2, previous);
            self.desc.set_position(base - 1, [positions[0], positions[1]]);
        }
        for (corner, (pos, uv)) in corners(positions, tex_coords).into_iter().enumerate() {
            self.desc.set_vertex(base + corner, pos, uv);
        }
        self.quad += 1;
    }
}

struct IndexedDegenerateStripWriter<'b, 'a, I> {
    desc: &'b mut VertexBufferDesc<'a>,
    quad: usize,
    _format: PhantomData<I>,
}

impl<I: IndexValue> QuadSink for IndexedDegenerateStripWriter<'_, '_, I> {
    fn post_quad(&mut self, positions: [f32; 4], tex_coords: [f32; 4]) {
        let base = self.quad * 4;
        for (corner, (pos, uv)) in corners(positions, tex_coords).into_iter().enumerate() {
            self.desc.set_vertex(base + corner, pos, uv);
        }
        if self.quad > 0 {
            self.desc
                .write_index::<I>(self.quad * 6 - 2, (base - 1) as u32);
            self.desc.write_index::<I>(self.quad * 6 - 1, base as u32);
        }
        for slot in 0..4 {
            self.desc
                .write_index::<I>(self.quad * 6 + slot, (base + slot) as u32);
        }
        self.quad += 1;
    }
}

/// An emission pass, runnable against any writer.
trait EmitJob {
    fn run<S: QuadSink>(self, sink: &mut S);
}

/// Selects the writer for `layout` once, then runs the job through it.
fn dispatch<J: EmitJob>(layout: VertexLayout, desc: &mut VertexBufferDesc<'_>, job: J) {
    assert!(
        layout.index_format.is_none() || desc.index_data.is_some(),
        "vertex layout requires an index buffer"
    );
    match (layout.topology, layout.index_format) {
        (Topology::TriangleList, None) => job.run(&mut ListWriter { desc, quad: 0 }),
        (Topology::TriangleList, Some(IndexFormat::U16)) => job.run(&mut IndexedListWriter {
            desc,
            quad: 0,
            _format: PhantomData::<u16>,
        }),
        (Topology::TriangleList, Some(IndexFormat::U32)) => job.run(&mut IndexedListWriter {
            desc,
            quad: 0,
            _format: PhantomData::<u32>,
        }),
        (Topology::StripRestart, Some(IndexFormat::U16)) => job.run(&mut RestartStripWriter {
            desc,
            quad: 0,
            _format: PhantomData::<u16>,
        }),
        (Topology::StripRestart, Some(IndexFormat::U32)) => job.run(&mut RestartStripWriter {
            desc,
            quad: 0,
            _format: PhantomData::<u32>,
        }),
        (Topology::StripRestart, None) => {
            panic!("a restart-index strip requires an index buffer")
        }
        (Topology::StripDegenerate, None) => {
            job.run(&mut DegenerateStripWriter { desc, quad: 0 })
        }
        (Topology::StripDegenerate, Some(IndexFormat::U16)) => {
            job.run(&mut IndexedDegenerateStripWriter {
                desc,
                quad: 0,
                _format: PhantomData::<u16>,
            })
        }
        (Topology::StripDegenerate, Some(IndexFormat::U32)) => {
            job.run(&mut IndexedDegenerateStripWriter {
                desc,
                quad: 0,
                _format: PhantomData::<u32>,
            })
        }
    }
}

struct FillJob<'f> {
    font: &'f Font,
    rect: [f32; 4],
}

impl EmitJob for FillJob<'_> {
    fn run<S: QuadSink>(self, sink: &mut S) {
        let [u, v] = self.font.fill_uv();
        sink.post_quad(self.rect, [u, v, u, v]);
    }
}

struct TextJob<'f, 't> {
    font: &'f Font,
    pos: (f32, f32),
    text: &'t str,
    font_size: f32,
    options: TextOptions,
    max_width: f32,
}

impl EmitJob for TextJob<'_, '_> {
    fn run<S: QuadSink>(self, sink: &mut S) {
        let step = (1.0 + self.font.line_gap()) * self.font_size;
        match self.options.v_align {
            VAlign::Top => {
                let mut y = self.pos.1;
                for line in
                    self.font
                        .lines(self.text, self.font_size, self.options.wrap, self.max_width)
                {
                    self.emit_line(sink, line, y);
                    y += step;
                }
            }
            // Bottom and middle alignment need the line count up front.
            _ => {
                let lines: Vec<Line> = self
                    .font
                    .lines(self.text, self.font_size, self.options.wrap, self.max_width)
                    .collect();
                let block_height = lines.len() as f32 * self.font_size;
                let mut y = match self.options.v_align {
                    VAlign::Bottom => self.pos.1 - block_height,
                    _ => self.pos.1 - block_height * 0.5,
                };
                for line in lines {
                    self.emit_line(sink, line, y);
                    y += step;
                }
            }
        }
    }
}

impl TextJob<'_, '_> {
    fn emit_line<S: QuadSink>(&self, sink: &mut S, line: Line, y: f32) {
        let font = self.font;
        let size = self.font_size;
        let start_x = match self.options.h_align {
            HAlign::Left => self.pos.0,
            HAlign::Right => self.pos.0 - line.width,
            HAlign::Center => self.pos.0 - line.width * 0.5,
        };

        let mut x = start_x;
        let mut prev: Option<char> = None;
        for ch in self.text[line.begin..line.end].chars() {
            let record = font.glyph(ch);
            if ch != ' ' {
                sink.post_quad(
                    [
                        x + record.offset_x * size,
                        y + record.offset_y * size,
                        x + (record.offset_x + record.width) * size,
                        y + (record.offset_y + record.height) * size,
                    ],
                    [record.uv.u0, record.uv.v0, record.uv.u1, record.uv.v1],
                );
            }
            x += record.advance * size;
            if let Some(prev) = prev {
                x += font.kerning(prev, ch) * size;
            }
            prev = Some(ch);
        }

        let decorations = self.options.decorations;
        if decorations.quads_per_line() == 0 {
            return;
        }
        let [fill_u, fill_v] = font.fill_uv();
        let fill = [fill_u, fill_v, fill_u, fill_v];
        let end_x = start_x + line.width;
        if decorations.double_underline {
            let y2 = y + size * DOUBLE_UNDERLINE_POS;
            let y1 = y2 - size * DOUBLE_LINE_HEIGHT;
            sink.post_quad([start_x, y1, end_x, y2], fill);
            let lift = size * DOUBLE_LINE_HEIGHT * 2.0;
            sink.post_quad([start_x, y1 - lift, end_x, y2 - lift], fill);
        } else if decorations.underline {
            let y2 = y + size * UNDERLINE_POS;
            sink.post_quad([start_x, y2 - size * LINE_HEIGHT, end_x, y2], fill);
        }
        if decorations.overline {
            let y1 = y + size * OVERLINE_POS;
            sink.post_quad([start_x, y1, end_x, y1 + size * LINE_HEIGHT], fill);
        }
        if decorations.strikeout {
            let y1 = y + size * STRIKEOUT_POS;
            sink.post_quad([start_x, y1, end_x, y1 + size * LINE_HEIGHT], fill);
        }
    }
}

impl Font {
    /// Writes one solid quad covering `rect` (`left, top, right, bottom`),
    /// textured with the opaque fill point of the atlas.
    pub fn write_fill_vertices(
        &self,
        layout: VertexLayout,
        desc: &mut VertexBufferDesc<'_>,
        rect: [f32; 4],
    ) {
        dispatch(layout, desc, FillJob { font: self, rect });
    }

    /// Writes quads for `text` as one left/top-anchored line.
    pub fn write_single_line_vertices(
        &self,
        layout: VertexLayout,
        desc: &mut VertexBufferDesc<'_>,
        pos: (f32, f32),
        text: &str,
        font_size: f32,
    ) {
        self.write_text_vertices(
            layout,
            desc,
            pos,
            text,
            font_size,
            TextOptions {
                wrap: Wrap::SingleLine,
                ..TextOptions::default()
            },
            f32::MAX,
        );
    }

    /// Lays `text` out and writes one quad per non-space character plus the
    /// requested decoration quads, exactly [`Font::quad_count`] quads in
    /// total.
    #[allow(clippy::too_many_arguments)]
    pub fn write_text_vertices(
        &self,
        layout: VertexLayout,
        desc: &mut VertexBufferDesc<'_>,
        pos: (f32, f32),
        text: &str,
        font_size: f32,
        options: TextOptions,
        max_width: f32,
    ) {
        dispatch(
            layout,
            desc,
            TextJob {
                font: self,
                pos,
                text,
                font_size,
                options,
                max_width,
            },
        );
    }
}
