//! Projector and depth model
//!
//! Every screen position in the corridor view comes out of `project`; every
//! brightness and fog value comes out of `depth_fade` / `fog_amount`.

use crate::rasterizer::Vec2;

/// Depths below this are clamped before any division
pub const MIN_DEPTH: f32 = 0.3;
/// Perspective strength: how fast things shrink with depth
pub const FOV: f32 = 0.6;
/// Wall height as a fraction of viewport height at scale 1
pub const WALL_HEIGHT: f32 = 0.7;

/// Brightness never fades below this from distance alone
pub const FADE_FLOOR: f32 = 0.28;
const FADE_PER_TILE: f32 = 0.11;

/// Fog overlay never goes fully opaque
pub const FOG_CAP: f32 = 0.97;
/// Past this the composer stops texturing
pub const FOG_SKIP_THRESHOLD: f32 = 0.95;
const FOG_RATE: f32 = 0.35;

/// Pixel size of the drawing area
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
}

impl Viewport {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    pub fn horizon(&self) -> f32 {
        self.height / 2.0
    }
}

/// Screen placement of a (depth, lateral) position
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Projection {
    pub anchor_x: f32,
    pub wall_top: f32,
    pub wall_bottom: f32,
    pub scale: f32,
}

impl Projection {
    pub fn wall_span(&self) -> f32 {
        self.wall_bottom - self.wall_top
    }

    pub fn top(&self) -> Vec2 {
        Vec2::new(self.anchor_x, self.wall_top)
    }

    pub fn bottom(&self) -> Vec2 {
        Vec2::new(self.anchor_x, self.wall_bottom)
    }
}

/// Depth actually used for projection
#[inline]
pub fn effective_depth(depth: f32) -> f32 {
    if depth.is_nan() {
        return MIN_DEPTH;
    }
    depth.max(MIN_DEPTH)
}

/// Perspective denominator; screen positions are linear in its reciprocal
#[inline]
pub fn perspective_w(depth: f32) -> f32 {
    effective_depth(depth) * FOV + 0.5
}

/// Project a view-space position. Never fails: bad depths are clamped.
pub fn project(viewport_width: f32, viewport_height: f32, depth: f32, lateral_offset: f32) -> Projection {
    let scale = 1.0 / perspective_w(depth);
    let wall_span = viewport_height * WALL_HEIGHT * scale;
    let horizon = viewport_height / 2.0;
    let spread = viewport_width * 0.5 * scale;

    Projection {
        anchor_x: viewport_width / 2.0 + lateral_offset * spread,
        wall_top: horizon - wall_span / 2.0,
        wall_bottom: horizon + wall_span / 2.0,
        scale,
    }
}

/// `project` against a `Viewport`
#[inline]
pub fn project_in(viewport: Viewport, depth: f32, lateral_offset: f32) -> Projection {
    project(viewport.width, viewport.height, depth, lateral_offset)
}

/// Brightness multiplier for a surface at `depth`
pub fn depth_fade(depth: f32) -> f32 {
    (1.0 - effective_depth(depth) * FADE_PER_TILE).max(FADE_FLOOR)
}

/// Fog overlay opacity at `depth`
pub fn fog_amount(depth: f32, density: f32) -> f32 {
    if density <= 0.0 || depth.is_nan() {
        return 0.0;
    }
    let d = depth.max(0.0);
    (1.0 - (-d * density * FOG_RATE).exp()).min(FOG_CAP)
}

/// Depth beyond which fog exceeds the texturing threshold
pub fn fog_horizon(density: f32) -> f32 {
    if density <= 0.0 {
        return f32::INFINITY;
    }
    -(1.0 - FOG_SKIP_THRESHOLD).ln() / (density * FOG_RATE)
}
