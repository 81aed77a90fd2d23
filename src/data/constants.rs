//! Constants and mapping tables for HTML to LaTeX conversion
//!
//! - HTML tag names to element kinds
//! - Heading level to sectioning command
//! - Font size keywords to LaTeX size switches

use phf::phf_map;

/// Element kind keyed by lowercase tag name.
///
/// Headings and table cells carry data that is resolved when the tree is built,
/// see [`crate::core::dom::Tag`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagName {
    Document,
    Html,
    Head,
    Title,
    Body,
    Script,
    Style,
    Paragraph,
    Division,
    Heading,
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
    TableSection,
    TableRow,
    TableHeaderCell,
    TableDataCell,
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
}

/// HTML tag name to element kind
pub static HTML_TAGS: phf::Map<&'static str, TagName> = phf_map! {
    "#document" => TagName::Document,
    "html" => TagName::Html,
    "head" => TagName::Head,
    "title" => TagName::Title,
    "body" => TagName::Body,
    "script" => TagName::Script,
    "style" => TagName::Style,
    "noscript" => TagName::Script,
    "template" => TagName::Script,
    "meta" => TagName::Script,
    "link" => TagName::Script,
    "p" => TagName::Paragraph,
    "div" => TagName::Division,
    "section" => TagName::Division,
    "article" => TagName::Division,
    "main" => TagName::Division,
    "header" => TagName::Division,
    "footer" => TagName::Division,
    "nav" => TagName::Division,
    "aside" => TagName::Division,
    "h1" => TagName::Heading,
    "h2" => TagName::Heading,
    "h3" => TagName::Heading,
    "h4" => TagName::Heading,
    "h5" => TagName::Heading,
    "h6" => TagName::Heading,
    "b" => TagName::Bold,
    "strong" => TagName::Bold,
    "i" => TagName::Italic,
    "em" => TagName::Italic,
    "cite" => TagName::Italic,
    "var" => TagName::Italic,
    "u" => TagName::Underline,
    "ins" => TagName::Underline,
    "s" => TagName::Strike,
    "del" => TagName::Strike,
    "strike" => TagName::Strike,
    "a" => TagName::Anchor,
    "ul" => TagName::UnorderedList,
    "ol" => TagName::OrderedList,
    "li" => TagName::ListItem,
    "dl" => TagName::DescriptionList,
    "dt" => TagName::DescriptionTerm,
    "dd" => TagName::DescriptionDetails,
    "span" => TagName::Span,
    "font" => TagName::Font,
    "table" => TagName::Table,
    "thead" => TagName::TableSection,
    "tbody" => TagName::TableSection,
    "tfoot" => TagName::TableSection,
    "tr" => TagName::TableRow,
    "th" => TagName::TableHeaderCell,
    "td" => TagName::TableDataCell,
    "caption" => TagName::Caption,
    "img" => TagName::Image,
    "hr" => TagName::HorizontalRule,
    "br" => TagName::LineBreak,
    "code" => TagName::Code,
    "kbd" => TagName::Code,
    "samp" => TagName::Code,
    "tt" => TagName::Code,
    "pre" => TagName::Preformatted,
    "blockquote" => TagName::Blockquote,
    "center" => TagName::Center,
    "sub" => TagName::Subscript,
    "sup" => TagName::Superscript,
};

/// Sectioning commands for heading levels 1-5 (index 0 = h1)
pub const SECTION_COMMANDS: [&str; 5] = [
    "section",
    "subsection",
    "subsubsection",
    "paragraph",
    "subparagraph",
];

/// Get the sectioning command for a heading level
pub fn heading_command(level: u8) -> Option<&'static str> {
    match level {
        1..=5 => Some(SECTION_COMMANDS[(level - 1) as usize]),
        _ => None,
    }
}

/// LaTeX size switches for `<font size="1".."7">`
pub const FONT_SIZE_SWITCHES: [&str; 7] = [
    "\\tiny",
    "\\small",
    "\\normalsize",
    "\\large",
    "\\Large",
    "\\LARGE",
    "\\Huge",
];

/// CSS absolute-size keywords to LaTeX size switches
pub static CSS_FONT_SIZE_KEYWORDS: phf::Map<&'static str, &'static str> = phf_map! {
    "xx-small" => "\\tiny",
    "x-small" => "\\scriptsize",
    "small" => "\\small",
    "medium" => "\\normalsize",
    "large" => "\\large",
    "x-large" => "\\Large",
    "xx-large" => "\\LARGE",
    "xxx-large" => "\\Huge",
    "smaller" => "\\small",
    "larger" => "\\large",
};

/// Text commands for CSS generic font families
pub fn font_family_command(family: &str) -> Option<&'static str> {
    // first family in the list that we recognize wins
    for name in family.split(',') {
        let name = name.trim().trim_matches(|c| c == '"' || c == '\'').to_ascii_lowercase();
        match name.as_str() {
            "monospace" | "courier" | "courier new" | "consolas" | "menlo" | "monaco" => {
                return Some("texttt")
            }
            "sans-serif" | "arial" | "helvetica" | "verdana" | "tahoma" => return Some("textsf"),
            "serif" | "times" | "times new roman" | "georgia" => return Some("textrm"),
            _ => continue,
        }
    }
    None
}
