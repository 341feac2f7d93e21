//! 2D software rasterizer
//!
//! Features:
//! - Convex polygon fills with alpha blending
//! - Affine triangle blits clipped to a convex polygon
//! - Bresenham lines for outlines and decor

mod math;
mod types;
mod render;

pub use math::*;
pub use types::*;
pub use render::*;

/// Default demo framebuffer size
pub const WIDTH: usize = 500;
pub const HEIGHT: usize = 400;
