//! Quad slicer: perspective-correct textured quads from affine triangles
//!
//! A projected quad is cut into thin slices along one screen axis. Slice
//! boundaries are snapped to whole pixels and shared by the two slices that
//! meet there, so neighbouring slices can never leave a gap. Each slice is
//! close enough to affine that two affine triangle blits fill it.
//!
//! Floors, ceilings, side walls and front walls all go through the same
//! code; they differ only in `SliceAxis` and the flip flags of `TexMapping`.

use crate::rasterizer::{
    expand_triangle, lerp, polygon_area2, triangle_area2, Affine2, Canvas, Texture, Vec2,
    DEGENERATE_EPSILON,
};
use super::projection::perspective_w;

/// Upper bound on slices per quad
pub const MAX_SLICES: usize = 32;
/// Screen pixels per slice before the cap kicks in
const PIXELS_PER_SLICE: f32 = 2.0;
/// Outward growth of each destination triangle to close AA hairlines
pub const TRIANGLE_EXPAND: f32 = 0.75;

/// Screen axis along which depth changes across a quad
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SliceAxis {
    /// Depth changes with screen y (floors, ceilings)
    Vertical,
    /// Depth changes with screen x (side walls, front walls)
    Horizontal,
}

impl SliceAxis {
    #[inline]
    fn coord(self, p: Vec2) -> f32 {
        match self {
            SliceAxis::Vertical => p.y,
            SliceAxis::Horizontal => p.x,
        }
    }
}

/// Four projected corners.
///
/// `near_a -> near_b` is the edge closest to the viewer, `far_a -> far_b`
/// the one furthest away. Floors and ceilings use a = left, b = right;
/// walls use a = top, b = bottom.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScreenQuad {
    pub near_a: Vec2,
    pub near_b: Vec2,
    pub far_a: Vec2,
    pub far_b: Vec2,
}

impl ScreenQuad {
    /// Floor/ceiling corners: near-left, near-right, far-left, far-right
    pub fn floor(near_left: Vec2, near_right: Vec2, far_left: Vec2, far_right: Vec2) -> Self {
        Self { near_a: near_left, near_b: near_right, far_a: far_left, far_b: far_right }
    }

    /// Wall corners: near-top, far-top, far-bottom, near-bottom
    pub fn wall(near_top: Vec2, far_top: Vec2, far_bottom: Vec2, near_bottom: Vec2) -> Self {
        Self { near_a: near_top, near_b: near_bottom, far_a: far_top, far_b: far_bottom }
    }

    /// Corners in drawing order
    pub fn outline(&self) -> [Vec2; 4] {
        [self.near_a, self.far_a, self.far_b, self.near_b]
    }

    /// Point at screen fraction `along` (near -> far) and `across` (a -> b)
    pub fn point_at(&self, along: f32, across: f32) -> Vec2 {
        let a = self.near_a.lerp(self.far_a, along);
        let b = self.near_b.lerp(self.far_b, along);
        a.lerp(b, across)
    }

    pub fn area(&self) -> f32 {
        polygon_area2(&self.outline()).abs() * 0.5
    }

    pub fn is_degenerate(&self) -> bool {
        self.area() < DEGENERATE_EPSILON
    }
}

/// World depths of the near and far edges
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DepthRange {
    pub near: f32,
    pub far: f32,
}

impl DepthRange {
    pub fn new(near: f32, far: f32) -> Self {
        Self { near, far }
    }

    /// Constant depth (front walls, billboards)
    pub fn flat(depth: f32) -> Self {
        Self { near: depth, far: depth }
    }

    pub fn is_flat(&self) -> bool {
        (perspective_w(self.near) - perspective_w(self.far)).abs() < 1e-6
    }

    pub fn mid(&self) -> f32 {
        (self.near + self.far) * 0.5
    }

    /// Screen fraction (linear, near -> far) to texture fraction, through
    /// the reciprocal of the projector's perspective denominator
    pub fn texture_fraction(&self, screen: f32) -> f32 {
        if self.is_flat() {
            return screen;
        }
        let wn = perspective_w(self.near);
        let wf = perspective_w(self.far);
        let inv = lerp(1.0 / wn, 1.0 / wf, screen);
        if inv <= 0.0 {
            return 1.0;
        }
        (1.0 / inv - wn) / (wf - wn)
    }

    /// Inverse of `texture_fraction`
    pub fn screen_fraction(&self, texture: f32) -> f32 {
        if self.is_flat() {
            return texture;
        }
        let wn = perspective_w(self.near);
        let wf = perspective_w(self.far);
        let w = lerp(wn, wf, texture);
        (1.0 / w - 1.0 / wn) / (1.0 / wf - 1.0 / wn)
    }

    pub fn depth_at(&self, texture: f32) -> f32 {
        lerp(self.near, self.far, texture)
    }
}

/// How image pixels are laid over a quad
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TexMapping {
    pub axis: SliceAxis,
    /// Image runs far -> near instead of near -> far
    pub flip_along: bool,
    /// Image runs b -> a instead of a -> b
    pub flip_across: bool,
    /// Image repeats along the depth direction (merged walls span several tiles)
    pub repeat_along: f32,
    pub repeat_across: f32,
}

impl TexMapping {
    pub fn new(axis: SliceAxis) -> Self {
        Self {
            axis,
            flip_along: false,
            flip_across: false,
            repeat_along: 1.0,
            repeat_across: 1.0,
        }
    }

    pub fn flipped(mut self, along: bool, across: bool) -> Self {
        self.flip_along = along;
        self.flip_across = across;
        self
    }

    pub fn repeated(mut self, along: f32, across: f32) -> Self {
        self.repeat_along = along.max(f32::EPSILON);
        self.repeat_across = across.max(f32::EPSILON);
        self
    }

    /// Image pixel for a (texture-along, across) pair, both 0..1
    fn source_point(&self, along: f32, across: f32, image: &Texture) -> Vec2 {
        let along = if self.flip_along { 1.0 - along } else { along } * self.repeat_along;
        let across = if self.flip_across { 1.0 - across } else { across } * self.repeat_across;
        let (w, h) = (image.width as f32, image.height as f32);
        match self.axis {
            SliceAxis::Vertical => Vec2::new(across * w, along * h),
            SliceAxis::Horizontal => Vec2::new(along * w, across * h),
        }
    }
}

/// One quantized cut across a quad
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SliceBoundary {
    /// Point on the a edge
    pub left_point: Vec2,
    /// Point on the b edge
    pub right_point: Vec2,
    /// Perspective-correct 0..1 position along the depth direction
    pub texture_coordinate: f32,
    /// World depth at this boundary
    pub depth: f32,
}

/// Slice count for a quad spanning `extent` pixels along its axis
pub fn slice_count(extent: f32, depths: DepthRange) -> usize {
    if depths.is_flat() || !extent.is_finite() {
        return 1;
    }
    ((extent / PIXELS_PER_SLICE).ceil() as usize).clamp(1, MAX_SLICES)
}

/// Quantized slice boundaries, near to far. `slices + 1` entries; slice `i`
/// is bounded by entries `i` and `i + 1`.
pub fn slice_boundaries(
    quad: &ScreenQuad,
    depths: DepthRange,
    axis: SliceAxis,
    slices: usize,
) -> Vec<SliceBoundary> {
    let slices = slices.max(1);
    let near_a = axis.coord(quad.near_a);
    let far_a = axis.coord(quad.far_a);
    let near_b = axis.coord(quad.near_b);
    let far_b = axis.coord(quad.far_b);

    // Where the quantized coordinate sits along one edge (0 = near, 1 = far)
    let edge_param = |near: f32, far: f32, snapped: f32, linear: f32| -> f32 {
        if (far - near).abs() < DEGENERATE_EPSILON {
            linear
        } else {
            (snapped - near) / (far - near)
        }
    };

    (0..=slices)
        .map(|i| {
            let t = i as f32 / slices as f32;
            let snapped_a = lerp(near_a, far_a, t).round();
            let snapped_b = lerp(near_b, far_b, t).round();
            let sa = edge_param(near_a, far_a, snapped_a, t);
            let sb = edge_param(near_b, far_b, snapped_b, t);

            let left_point = quad.near_a.lerp(quad.far_a, sa);
            let right_point = quad.near_b.lerp(quad.far_b, sb);
            let screen = ((sa + sb) * 0.5).clamp(0.0, 1.0);
            let texture_coordinate = depths.texture_fraction(screen).clamp(0.0, 1.0);

            SliceBoundary {
                left_point,
                right_point,
                texture_coordinate,
                depth: depths.depth_at(texture_coordinate),
            }
        })
        .collect()
}

/// Extent of a quad along `axis`, in pixels
pub fn axis_extent(quad: &ScreenQuad, axis: SliceAxis) -> f32 {
    let a = (axis.coord(quad.far_a) - axis.coord(quad.near_a)).abs();
    let b = (axis.coord(quad.far_b) - axis.coord(quad.near_b)).abs();
    a.max(b)
}

/// Blit `image` over `quad`. `shade` maps a slice's world depth to a color
/// multiplier. Returns the number of triangles drawn; degenerate slices and
/// triangles are skipped without drawing.
pub fn draw_textured_quad<C, F>(
    canvas: &mut C,
    quad: &ScreenQuad,
    depths: DepthRange,
    mapping: &TexMapping,
    image: &Texture,
    shade: F,
) -> usize
where
    C: Canvas + ?Sized,
    F: Fn(f32) -> f32,
{
    if image.is_empty() || quad.is_degenerate() {
        return 0;
    }

    let slices = slice_count(axis_extent(quad, mapping.axis), depths);
    let boundaries = slice_boundaries(quad, depths, mapping.axis, slices);
    let mut drawn = 0;

    for pair in boundaries.windows(2) {
        let (b0, b1) = (&pair[0], &pair[1]);
        let clip = [b0.left_point, b0.right_point, b1.right_point, b1.left_point];
        if polygon_area2(&clip).abs() < DEGENERATE_EPSILON {
            continue;
        }

        let src_a0 = mapping.source_point(b0.texture_coordinate, 0.0, image);
        let src_b0 = mapping.source_point(b0.texture_coordinate, 1.0, image);
        let src_a1 = mapping.source_point(b1.texture_coordinate, 0.0, image);
        let src_b1 = mapping.source_point(b1.texture_coordinate, 1.0, image);

        let triangles = [
            ([src_a0, src_b0, src_a1], [b0.left_point, b0.right_point, b1.left_point]),
            ([src_a1, src_b0, src_b1], [b1.left_point, b0.right_point, b1.right_point]),
        ];
        let slice_shade = shade((b0.depth + b1.depth) * 0.5);

        for (src, dst) in &triangles {
            if triangle_area2(dst[0], dst[1], dst[2]).abs() < DEGENERATE_EPSILON {
                continue;
            }
            let Some(transform) = Affine2::from_triangles(src, dst) else {
                continue;
            };
            let expanded = expand_triangle(dst, TRIANGLE_EXPAND);
            canvas.blit_triangle(image, &transform, &expanded, &clip, slice_shade);
            drawn += 1;
        }
    }

    drawn
}
