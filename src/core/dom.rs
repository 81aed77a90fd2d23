//! Document tree
//!
//! An arena of nodes addressed by [`NodeId`]. Every node is an element or a text leaf;
//! the parent link is an index used for navigation only. Tag names are resolved into
//! [`Tag`] once, when the element is added, so the converter dispatches on an enum
//! instead of comparing strings.

use crate::data::constants::{TagName, HTML_TAGS};
use crate::utils::error::{ConversionError, ConversionResult};

/// Upper bound for a cell's `colspan` (the HTML limit)
pub const MAX_COLSPAN: u32 = 1000;

/// Index of a node inside its [`Document`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// One attribute; names are stored as written
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    pub name: String,
    pub value: String,
}

impl Attribute {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// Element kind resolved at build time
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Tag {
    /// Synthetic document root
    Document,
    Html,
    Head,
    Title,
    Body,
    /// script, noscript, template, meta, link
    Script,
    Style,
    Paragraph,
    Division,
    Heading(u8),
    Bold,
    Italic,
    Underline,
    Strike,
    Anchor,
    UnorderedList,
    OrderedList,
    ListItem,
    DescriptionList,
    DescriptionTerm,
    DescriptionDetails,
    Span,
    Font,
    Table,
    /// thead, tbody, tfoot
    TableSection,
    TableRow,
    TableCell {
        header: bool,
        colspan: u32,
    },
    Caption,
    Image,
    HorizontalRule,
    LineBreak,
    Code,
    Preformatted,
    Blockquote,
    Center,
    Subscript,
    Superscript,
    /// Anything else, by lowercase name
    Other(String),
}

impl Tag {
    /// Resolve an element name and its attributes
    pub fn resolve(name: &str, attrs: &[Attribute]) -> Tag {
        let lower = name.to_ascii_lowercase();
        let Some(kind) = HTML_TAGS.get(lower.as_str()) else {
            return Tag::Other(lower);
        };
        match kind {
            TagName::Document => Tag::Document,
            TagName::Html => Tag::Html,
            TagName::Head => Tag::Head,
            TagName::Title => Tag::Title,
            TagName::Body => Tag::Body,
            TagName::Script => Tag::Script,
            TagName::Style => Tag::Style,
            TagName::Paragraph => Tag::Paragraph,
            TagName::Division => Tag::Division,
            TagName::Heading => {
                // "h1".."h6"
                let level = lower[1..].parse::<u8>().unwrap_or(0);
                Tag::Heading(level)
            }
            TagName::Bold => Tag::Bold,
            TagName::Italic => Tag::Italic,
            TagName::Underline => Tag::Underline,
            TagName::Strike => Tag::Strike,
            TagName::Anchor => Tag::Anchor,
            TagName::UnorderedList => Tag::UnorderedList,
            TagName::OrderedList => Tag::OrderedList,
            TagName::ListItem => Tag::ListItem,
            TagName::DescriptionList => Tag::DescriptionList,
            TagName::DescriptionTerm => Tag::DescriptionTerm,
            TagName::DescriptionDetails => Tag::DescriptionDetails,
            TagName::Span => Tag::Span,
            TagName::Font => Tag::Font,
            TagName::Table => Tag::Table,
            TagName::TableSection => Tag::TableSection,
            TagName::TableRow => Tag::TableRow,
            TagName::TableHeaderCell | TagName::TableDataCell => Tag::TableCell {
                header: *kind == TagName::TableHeaderCell,
                colspan: parse_colspan(find_attr(attrs, "colspan")),
            },
            TagName::Caption => Tag::Caption,
            TagName::Image => Tag::Image,
            TagName::HorizontalRule => Tag::HorizontalRule,
            TagName::LineBreak => Tag::LineBreak,
            TagName::Code => Tag::Code,
            TagName::Preformatted => Tag::Preformatted,
            TagName::Blockquote => Tag::Blockquote,
            TagName::Center => Tag::Center,
            TagName::Subscript => Tag::Subscript,
            TagName::Superscript => Tag::Superscript,
        }
    }

    /// Elements that make up a table's skeleton
    pub fn is_table_structure(&self) -> bool {
        matches!(
            self,
            Tag::Table | Tag::TableSection | Tag::TableRow | Tag::TableCell { .. } | Tag::Caption
        )
    }

    /// Containers in which an image stands on its own line
    pub fn is_block_container(&self) -> bool {
        matches!(
            self,
            Tag::Document
                | Tag::Html
                | Tag::Body
                | Tag::Division
                | Tag::Center
                | Tag::Blockquote
                | Tag::Other(_)
        )
    }

    /// Elements rendered as paragraphs, sections, environments or floats
    pub fn is_block_level(&self) -> bool {
        matches!(
            self,
            Tag::Paragraph
                | Tag::Division
                | Tag::Center
                | Tag::Blockquote
                | Tag::Heading(_)
                | Tag::Preformatted
                | Tag::UnorderedList
                | Tag::OrderedList
                | Tag::DescriptionList
                | Tag::ListItem
                | Tag::DescriptionTerm
                | Tag::DescriptionDetails
                | Tag::Table
                | Tag::Caption
                | Tag::HorizontalRule
        )
    }

    /// Elements whose content never reaches the output
    pub fn is_suppressed(&self) -> bool {
        matches!(self, Tag::Head | Tag::Title | Tag::Script | Tag::Style)
    }
}

/// Parse a `colspan` value: non-positive or unparseable becomes 1, large values are capped
pub fn parse_colspan(value: Option<&str>) -> u32 {
    match value.map(str::trim).and_then(|v| v.parse::<i64>().ok()) {
        Some(n) if n >= 1 => n.min(MAX_COLSPAN as i64) as u32,
        _ => 1,
    }
}

fn find_attr<'a>(attrs: &'a [Attribute], name: &str) -> Option<&'a str> {
    attrs
        .iter()
        .find(|a| a.name.eq_ignore_ascii_case(name))
        .map(|a| a.value.as_str())
}

/// An element node
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    /// Lowercase tag name
    pub name: String,
    pub tag: Tag,
    pub attrs: Vec<Attribute>,
}

impl Element {
    /// First attribute matching `name` case-insensitively
    pub fn attr(&self, name: &str) -> Option<&str> {
        find_attr(&self.attrs, name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    Element(Element),
    Text(String),
}

#[derive(Debug, Clone)]
pub struct Node {
    pub kind: NodeKind,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
}

impl Node {
    pub fn as_element(&self) -> Option<&Element> {
        match &self.kind {
            NodeKind::Element(el) => Some(el),
            NodeKind::Text(_) => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match &self.kind {
            NodeKind::Text(t) => Some(t),
            NodeKind::Element(_) => None,
        }
    }
}

/// Node arena; the first node added is the root
#[derive(Debug, Clone, Default)]
pub struct Document {
    nodes: Vec<Node>,
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a document with a root element
    pub fn with_root(name: &str) -> Self {
        let mut doc = Self::new();
        doc.nodes.push(Node {
            kind: NodeKind::Element(Self::make_element(name, Vec::new())),
            parent: None,
            children: Vec::new(),
        });
        doc
    }

    pub fn root(&self) -> Option<NodeId> {
        (!self.nodes.is_empty()).then_some(NodeId(0))
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    fn make_element(name: &str, attrs: Vec<Attribute>) -> Element {
        Element {
            name: name.to_ascii_lowercase(),
            tag: Tag::resolve(name, &attrs),
            attrs,
        }
    }

    fn push(&mut self, parent: NodeId, kind: NodeKind) -> ConversionResult<NodeId> {
        match self.nodes.get(parent.0) {
            Some(node) if node.as_element().is_some() => {}
            Some(_) => {
                return Err(ConversionError::malformed(
                    "text nodes cannot have children",
                ))
            }
            None => {
                return Err(ConversionError::invalid(format!(
                    "no node {} in document",
                    parent.0
                )))
            }
        }
        self.nodes.try_reserve(1)?;
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            kind,
            parent: Some(parent),
            children: Vec::new(),
        });
        self.nodes[parent.0].children.push(id);
        Ok(id)
    }

    /// Append an element under `parent`
    pub fn append_element(
        &mut self,
        parent: NodeId,
        name: &str,
        attrs: &[(&str, &str)],
    ) -> ConversionResult<NodeId> {
        let attrs = attrs.iter().map(|(n, v)| Attribute::new(*n, *v)).collect();
        self.append_element_with_attrs(parent, name, attrs)
    }

    pub fn append_element_with_attrs(
        &mut self,
        parent: NodeId,
        name: &str,
        attrs: Vec<Attribute>,
    ) -> ConversionResult<NodeId> {
        let el = Self::make_element(name, attrs);
        self.push(parent, NodeKind::Element(el))
    }

    /// Append a text leaf under `parent`
    pub fn append_text(&mut self, parent: NodeId, text: &str) -> ConversionResult<NodeId> {
        self.push(parent, NodeKind::Text(text.to_string()))
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0)
    }

    /// Like [`Document::node`], failing with `MalformedDocument`
    pub fn get(&self, id: NodeId) -> ConversionResult<&Node> {
        self.node(id)
            .ok_or_else(|| ConversionError::malformed(format!("no node {} in document", id.0)))
    }

    pub fn element(&self, id: NodeId) -> Option<&Element> {
        self.node(id).and_then(Node::as_element)
    }

    pub fn tag(&self, id: NodeId) -> Option<&Tag> {
        self.element(id).map(|el| &el.tag)
    }

    pub fn text(&self, id: NodeId) -> Option<&str> {
        self.node(id).and_then(Node::as_text)
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.node(id).map(|n| n.children.as_slice()).unwrap_or(&[])
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).and_then(|n| n.parent)
    }

    /// First attribute named `name` (case-insensitive); `None` for text nodes
    pub fn attr(&self, id: NodeId, name: &str) -> Option<&str> {
        self.element(id).and_then(|el| el.attr(name))
    }

    pub fn is_whitespace_text(&self, id: NodeId) -> bool {
        self.text(id)
            .map(|t| t.chars().all(char::is_whitespace))
            .unwrap_or(false)
    }
}
