//! Data layer - Static mappings and constants
//!
//! This module contains all static data used for HTML → LaTeX conversion:
//! - CSS color names
//! - Tag name table
//! - Sectioning and font size tables

pub mod colors;
pub mod constants;

// Re-export commonly used items
pub use colors::{color_to_hex, is_color_name, NAMED_COLORS};
pub use constants::{
    font_family_command, heading_command, TagName, CSS_FONT_SIZE_KEYWORDS, FONT_SIZE_SWITCHES,
    HTML_TAGS, SECTION_COMMANDS,
};
