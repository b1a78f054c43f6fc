//! CPU-side sprite mesh assembly.
//!
//! Every frame the compositor pushes quads into a `SpriteBatch` in paint
//! order; the batch is then streamed into GPU buffers. Consecutive quads that
//! share a texture collapse into a single `draw_indexed` call.

use std::sync::Arc;

use crate::vertex::SpriteVertex;

/// A contiguous run of indices that share the same texture binding.
#[derive(Debug, Clone, PartialEq)]
pub struct DrawCall {
    pub texture_key: Arc<str>,
    pub index_start: u32,
    pub index_count: u32,
}

/// One axis-aligned quad in base-pixel screen space (y down).
#[derive(Debug, Clone, Copy)]
pub struct QuadSpec<'a> {
    pub texture_key: &'a str,
    pub left: f32,
    pub top: f32,
    pub width: f32,
    pub height: f32,
    /// `[u0, v0, u1, v1]`, with `v0` at the top edge.
    pub uv: [f32; 4],
    pub color: [f32; 4],
}

impl<'a> QuadSpec<'a> {
    /// Untextured rectangle tinted with `color`; expects `texture_key` to be a
    /// 1x1 white texture.
    pub fn solid(texture_key: &'a str, rect: [f32; 4], color: [f32; 4]) -> Self {
        let [left, top, width, height] = rect;
        Self {
            texture_key,
            left,
            top,
            width,
            height,
            uv: [0.0, 0.0, 1.0, 1.0],
            color,
        }
    }
}

#[derive(Debug, Default)]
pub struct SpriteBatch {
    pub vertices: Vec<SpriteVertex>,
    pub indices: Vec<u32>,
    pub draw_calls: Vec<DrawCall>,
}

impl SpriteBatch {
    pub fn with_capacity(quads: usize) -> Self {
        Self {
            vertices: Vec::with_capacity(quads * 4),
            indices: Vec::with_capacity(quads * 6),
            draw_calls: Vec::with_capacity(8),
        }
    }

    pub fn quad_count(&self) -> usize {
        self.vertices.len() / 4
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    pub fn push_quad(&mut self, spec: QuadSpec<'_>) {
        let right = spec.left + spec.width;
        let bottom = spec.top + spec.height;
        let [u0, v0, u1, v1] = spec.uv;
        let base_index = self.vertices.len() as u32;

        self.vertices.extend_from_slice(&[
            SpriteVertex {
                position: [spec.left, spec.top],
                tex_coords: [u0, v0],
                color: spec.color,
            },
            SpriteVertex {
                position: [right, spec.top],
                tex_coords: [u1, v0],
                color: spec.color,
            },
            SpriteVertex {
                position: [right, bottom],
                tex_coords: [u1, v1],
                color: spec.color,
            },
            SpriteVertex {
                position: [spec.left, bottom],
                tex_coords: [u0, v1],
                color: spec.color,
            },
        ]);

        let draw_start = self.indices.len() as u32;
        self.indices.extend_from_slice(&[
            base_index,
            base_index + 1,
            base_index + 2,
            base_index,
            base_index + 2,
            base_index + 3,
        ]);

        self.push_draw_call(spec.texture_key, draw_start, 6);
    }

    /// Append a draw call, merging with the previous one when the texture
    /// matches and indices are contiguous.
    fn push_draw_call(&mut self, texture_key: &str, index_start: u32, index_count: u32) {
        if let Some(last) = self.draw_calls.last_mut() {
            let contiguous = last.index_start + last.index_count == index_start;
            if &*last.texture_key == texture_key && contiguous {
                last.index_count += index_count;
                return;
            }
        }
        self.draw_calls.push(DrawCall {
            texture_key: Arc::from(texture_key),
            index_start,
            index_count,
        });
    }

    /// Number of bind-group switches the draw list needs.
    pub fn texture_binds(&self) -> usize {
        let mut binds = 0usize;
        let mut current: Option<&str> = None;
        for draw in &self.draw_calls {
            let key: &str = &draw.texture_key;
            if current != Some(key) {
                current = Some(key);
                binds += 1;
            }
        }
        binds
    }
}

/// Convert an sRGB byte colour to the linear float tint the shader expects
/// when rendering into an sRGB surface.
pub fn srgb_color(rgb: [u8; 3], alpha: f32) -> [f32; 4] {
    let channel = |c: u8| {
        let c = f32::from(c) / 255.0;
        if c <= 0.04045 {
            c / 12.92
        } else {
            ((c + 0.055) / 1.055).powf(2.4)
        }
    };
    [channel(rgb[0]), channel(rgb[1]), channel(rgb[2]), alpha]
}

#[cfg(test)]
mod tests {
    use super::*;

    const WHITE: [f32; 4] = [1.0, 1.0, 1.0, 1.0];

    #[test]
    fn push_quad_emits_four_vertices_and_two_triangles() {
        let mut batch = SpriteBatch::default();
        batch.push_quad(QuadSpec::solid("white", [10.0, 20.0, 30.0, 40.0], WHITE));

        assert_eq!(batch.quad_count(), 1);
        assert_eq!(batch.indices, vec![0, 1, 2, 0, 2, 3]);
        assert_eq!(batch.vertices[0].position, [10.0, 20.0]);
        assert_eq!(batch.vertices[2].position, [40.0, 60.0]);
    }

    #[test]
    fn top_edge_samples_v0() {
        let mut batch = SpriteBatch::default();
        batch.push_quad(QuadSpec {
            texture_key: "sheet",
            left: 0.0,
            top: 0.0,
            width: 24.0,
            height: 24.0,
            uv: [0.1, 0.2, 0.3, 0.4],
            color: WHITE,
        });
        assert_eq!(batch.vertices[0].tex_coords, [0.1, 0.2]);
        assert_eq!(batch.vertices[1].tex_coords, [0.3, 0.2]);
        assert_eq!(batch.vertices[2].tex_coords, [0.3, 0.4]);
        assert_eq!(batch.vertices[3].tex_coords, [0.1, 0.4]);
    }

    #[test]
    fn consecutive_same_texture_quads_merge() {
        let mut batch = SpriteBatch::default();
        for i in 0..3 {
            batch.push_quad(QuadSpec::solid("white", [i as f32, 0.0, 1.0, 1.0], WHITE));
        }
        assert_eq!(batch.draw_calls.len(), 1);
        assert_eq!(batch.draw_calls[0].index_count, 18);
        assert_eq!(batch.texture_binds(), 1);
    }

    #[test]
    fn texture_switch_starts_new_draw_call() {
        let mut batch = SpriteBatch::default();
        batch.push_quad(QuadSpec::solid("white", [0.0, 0.0, 1.0, 1.0], WHITE));
        batch.push_quad(QuadSpec::solid("sheet", [0.0, 0.0, 1.0, 1.0], WHITE));
        batch.push_quad(QuadSpec::solid("white", [0.0, 0.0, 1.0, 1.0], WHITE));

        assert_eq!(batch.draw_calls.len(), 3);
        assert_eq!(batch.draw_calls[1].index_start, 6);
        assert_eq!(batch.texture_binds(), 3);
    }

    #[test]
    fn srgb_color_converts_to_linear() {
        assert_eq!(srgb_color([0, 0, 0], 1.0), [0.0, 0.0, 0.0, 1.0]);
        let white = srgb_color([255, 255, 255], 0.5);
        assert!(white[..3].iter().all(|c| (c - 1.0).abs() < 1e-6));
        assert_eq!(white[3], 0.5);
        let [_, _, b, _] = srgb_color([0, 0, 139], 1.0);
        assert!(b > 0.2 && b < 0.3);
    }
}
