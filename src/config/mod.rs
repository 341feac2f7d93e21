//! Configuration - palettes, render settings and load errors
//!
//! Uses RON (Rusty Object Notation) for human-readable config files.

mod error;
mod settings;
mod theme;

pub use error::*;
pub use settings::*;
pub use theme::*;
