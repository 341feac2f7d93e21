//! First-person corridor renderer
//!
//! View -> analyzer -> frame plan -> composer -> slicer -> canvas.

mod projection;
mod decor;
mod slicer;
mod analyzer;
mod entities;
mod composer;
mod plan;

pub use projection::*;
pub use decor::*;
pub use slicer::*;
pub use analyzer::*;
pub use entities::*;
pub use composer::*;
pub use plan::*;
