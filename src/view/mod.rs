//! View module - what the corridor renderer consumes
//!
//! - Tiles grouped into depth rows, near to far
//! - Point entities in view space
//! - Grid maps that a view is captured from

mod tile;
mod map;

pub use tile::*;
pub use map::*;
