//! Leaf rendering primitives: integer geometry, damage bookkeeping and owned
//! RGBA pixel surfaces with a per-surface clip stack.

pub mod damage;
pub mod geometry;
pub mod surface;

pub use damage::DamageTracker;
pub use geometry::{Point, Rect, Size};
pub use surface::{
    Blend, ClipScope, Color, DEFAULT_MAX_PIXELS, PixelSurface, TRANSPARENT, rgba,
};
