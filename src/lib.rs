//! # htlatex
//!
//! CSS-aware HTML to LaTeX converter written in Rust.
//!
//! ## Features
//!
//! - **Inline CSS**: `style` attributes cascade down the tree with CSS inheritance rules;
//!   color, background, weight, style, decoration, size, family and alignment reach the output
//! - **Bounded traversal**: explicit-stack walks, no recursion on document depth
//! - **Tables**: colspan-aware column counting, nested tables, image grids as figures
//! - **Images**: pluggable path resolution, CSS or attribute sizes, figures with captions
//! - **Diagnostics**: structured warnings instead of silent loss
//! - **WASM Support**: Compiles to WebAssembly for browser usage
//!
//! ## Usage Examples
//!
//! ```rust
//! use htlatex::html_to_latex;
//!
//! let latex = html_to_latex(r#"<p style="color:red">Hi <b>there</b></p>"#).unwrap();
//! assert_eq!(latex, r"\textcolor[HTML]{FF0000}{Hi \textbf{there}}");
//! ```
//!
//! ### Full Document Conversion
//!
//! ```rust
//! use htlatex::{html_to_latex_with_options, H2LOptions, MemoryImageResolver};
//!
//! let mut images = MemoryImageResolver::new();
//! images.add_image("https://example.org/cat.png", "img/cat.png");
//!
//! let out = html_to_latex_with_options(
//!     r#"<title>Cats</title><h1>Intro</h1><img src="https://example.org/cat.png" alt="A cat">"#,
//!     &H2LOptions::full_document(),
//!     &images,
//! )
//! .unwrap();
//! assert!(out.content.contains(r"\includegraphics{img/cat.png}"));
//! assert!(out.warnings.is_empty());
//! ```

/// Core conversion modules
pub mod core;

/// Data layer - static mappings and constants
pub mod data;

/// Feature modules - collaborators of the converter
pub mod features;

/// Utility modules
pub mod utils;

/// WASM bindings (feature-gated)
#[cfg(feature = "wasm")]
pub mod wasm;

// Re-export core conversion functions
pub use core::html2latex;
pub use core::html2latex::{
    convert_document, html_document_to_latex, html_to_latex, html_to_latex_with_options,
    H2LOptions,
};
pub use core::html2latex::table::{count_columns, is_image_only};

// Re-export the document model and the style engine
pub use core::dom::{Document, NodeId, Tag};
pub use core::html::parse_html;
pub use core::style::{is_inheritable, ComputedStyle, ImportantPolicy, StyleArena, StyleHandle};
pub use core::walker::{find_first, find_title, walk_styled, Flow, StyledVisitor};

// Re-export data modules
pub use data::colors;
pub use data::constants;

// Re-export feature modules
pub use features::images;
pub use features::units;
#[cfg(not(target_arch = "wasm32"))]
pub use features::StdImageResolver;
pub use features::{ImageResolver, MemoryImageResolver, PassthroughImageResolver};

// Re-export utilities
pub use utils::diagnostics;
pub use utils::error::{
    ConversionError, ConversionOutput, ConversionResult, ConversionWarning, FaultKind,
};

/// Convert an HTML fragment, resolving images against a directory on disk
#[cfg(not(target_arch = "wasm32"))]
pub fn html_to_latex_in_dir(
    html: &str,
    image_dir: impl AsRef<std::path::Path>,
    options: &H2LOptions,
) -> ConversionResult<ConversionOutput> {
    let resolver = StdImageResolver::with_base_dir(image_dir);
    html_to_latex_with_options(html, options, &resolver)
}

/// Convert and fail on the first skipped construct
pub fn html_to_latex_strict(html: &str, options: &H2LOptions) -> ConversionResult<String> {
    let out = html_to_latex_with_options(html, options, &PassthroughImageResolver)?;
    match out.warnings.into_iter().next() {
        Some(w) => Err(ConversionError::new(w.kind, w.to_string())),
        None => Ok(out.content),
    }
}
