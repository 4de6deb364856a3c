//! Off-screen pixel surfaces for a palette-based 2D engine
//!
//! The core is [`surface`]: 8-bit indexed and 16-bit truecolor buffers that
//! share one clip rectangle implementation and one drawing contract. Glass,
//! fog and shadow effects are expressed as [`xform::XformPalette`] lookup
//! tables. [`files`] is a small directory-listing helper for asset loaders.

pub mod config;
pub mod files;
pub mod logging;
pub mod surface;
pub mod util;
pub mod xform;

pub use surface::{
    new_surface, Blit, ClipRect, Depth, IndexedSurface, PixelSurface, Span, SurfaceCore,
    TrueColorSurface, TRANSPARENT_PIXEL,
};
pub use xform::XformPalette;
