//! Corridor Engine: first-person dungeon corridors from 2D primitives
//!
//! Renders a tile-based dungeon view using nothing but convex polygon
//! fills and affine triangle blits:
//! - Perspective-correct texturing by slicing quads into near-affine strips
//! - Pixel-snapped shared slice edges, so tiles never show seams
//! - Side walls merged into one quad per continuous run
//! - Depth fade, banded fog and seeded wall decor

/// Version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod rasterizer;
pub mod view;
pub mod config;
pub mod corridor;
pub mod assets;

pub use corridor::draw_view;
