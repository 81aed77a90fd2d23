//! Feature modules - collaborators used by the converter
//!
//! - CSS length parsing and conversion to points
//! - Image source resolution and `\includegraphics` options

pub mod images;
pub mod units;

// Re-export commonly used types
#[cfg(not(target_arch = "wasm32"))]
pub use images::StdImageResolver;
pub use images::{
    ImageOptions, ImageResolver, ImageSource, MemoryImageResolver, PassthroughImageResolver,
};
pub use units::{length_to_points, Dimension};
