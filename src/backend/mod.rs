//! Optional compression backends for auxiliary buffers.
//!
//! Neither codec in this crate calls these. They sit behind cargo features
//! (`zlib`, `zfp`) so a build without them still has the full segmentation
//! and persistence-index path.

#[cfg(feature = "zlib")]
pub mod deflate;
mod grid;
#[cfg(feature = "zfp")]
pub mod zfp;

pub use grid::GridShape;
