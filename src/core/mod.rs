//! Core conversion modules
//!
//! - `dom`: arena document tree with tags resolved at build time
//! - `html`: `html5ever` input
//! - `style`: inline CSS store, cascade and style arena
//! - `walker`: explicit-stack traversals
//! - `html2latex`: the HTML to LaTeX converter

pub mod dom;
pub mod html;
pub mod html2latex;
pub mod style;
pub mod walker;

pub use dom::{Attribute, Document, Element, Node, NodeId, NodeKind, Tag, MAX_COLSPAN};
pub use html::parse_html;
pub use html2latex::{
    convert_document, html_document_to_latex, html_to_latex, html_to_latex_with_options,
    H2LOptions,
};
pub use style::{ComputedStyle, ImportantPolicy, PropertyKinds, StyleArena, StyleHandle};
pub use walker::{walk_styled, BreadthFirst, Flow, StyledVisitor};
