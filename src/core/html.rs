//! HTML input
//!
//! Parses markup with `html5ever` into an `RcDom` and copies it into a [`Document`].
//! Comments, doctypes and processing instructions are dropped; adjacent text stays as
//! html5ever delivers it.

use html5ever::parse_document;
use html5ever::tendril::TendrilSink;
use markup5ever_rcdom::{Handle, NodeData, RcDom};

use super::dom::{Attribute, Document, NodeId};
use crate::utils::error::{ConversionError, ConversionResult};

/// Parse an HTML string (full document or fragment) into a [`Document`].
///
/// The root element is the synthetic `#document` node; html5ever always supplies
/// `html`, `head` and `body` below it.
pub fn parse_html(html: &str) -> ConversionResult<Document> {
    let dom = parse_document(RcDom::default(), Default::default())
        .from_utf8()
        .read_from(&mut html.as_bytes())
        .map_err(|e| ConversionError::parse(format!("HTML parsing failed: {}", e)))?;

    let mut doc = Document::with_root("#document");
    let root = doc
        .root()
        .ok_or_else(|| ConversionError::internal("document without root"))?;

    // (rcdom node, arena parent); children pushed reversed to keep document order
    let mut stack: Vec<(Handle, NodeId)> = dom
        .document
        .children
        .borrow()
        .iter()
        .rev()
        .map(|child| (child.clone(), root))
        .collect();

    while let Some((handle, parent)) = stack.pop() {
        match &handle.data {
            NodeData::Element { name, attrs, .. } => {
                let attrs = attrs
                    .borrow()
                    .iter()
                    .map(|a| Attribute::new(a.name.local.as_ref(), a.value.as_ref()))
                    .collect();
                let id = doc.append_element_with_attrs(parent, name.local.as_ref(), attrs)?;
                for child in handle.children.borrow().iter().rev() {
                    stack.push((child.clone(), id));
                }
            }
            NodeData::Text { contents } => {
                doc.append_text(parent, &contents.borrow())?;
            }
            _ => {}
        }
    }

    Ok(doc)
}
