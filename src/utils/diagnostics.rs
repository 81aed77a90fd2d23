//! HTML diagnostics
//!
//! Reports what the converter will drop or degrade before anything is converted:
//!
//! - Unknown elements (content kept, markup dropped)
//! - Heading levels without a sectioning command
//! - CSS colors and lengths that do not parse
//! - Images without `src`, or with sources that need downloading
//! - Text between table cells and other table structure problems
//!
//! ## Example
//!
//! ```rust
//! use htlatex::diagnostics::check_html_str;
//!
//! let result = check_html_str("<h6>x</h6><p style='color: nope'>y</p>").unwrap();
//! assert_eq!(result.warnings, 2);
//! ```

use std::fmt;

use fxhash::FxHashSet;

use crate::core::dom::{Document, Element, NodeId, NodeKind, Tag};
use crate::core::html::parse_html;
use crate::core::style::parse_declarations;
use crate::data::colors::color_to_hex;
use crate::data::constants::{heading_command, CSS_FONT_SIZE_KEYWORDS};
use crate::features::images::ImageSource;
use crate::features::units::Dimension;
use crate::utils::error::ConversionResult;

/// Properties whose values must be colors
const COLOR_PROPERTIES: [&str; 2] = ["color", "background-color"];

/// Properties whose values must be lengths
const LENGTH_PROPERTIES: [&str; 2] = ["width", "height"];

/// Diagnostic severity level
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum DiagnosticLevel {
    /// Informational note
    Info,
    /// Warning - conversion might not be perfect
    Warning,
    /// Error - conversion will likely fail or produce incorrect output
    Error,
}

impl fmt::Display for DiagnosticLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiagnosticLevel::Info => write!(f, "info"),
            DiagnosticLevel::Warning => write!(f, "warning"),
            DiagnosticLevel::Error => write!(f, "error"),
        }
    }
}

/// A single diagnostic message
#[derive(Debug, Clone)]
pub struct Diagnostic {
    /// Severity level
    pub level: DiagnosticLevel,
    /// Human-readable message
    pub message: String,
    /// Node the diagnostic is about
    pub node: Option<NodeId>,
    /// Relevant source text (an opening tag or a declaration)
    pub source_text: Option<String>,
    /// Suggested fix
    pub suggestion: Option<String>,
}

impl Diagnostic {
    /// Create a new diagnostic
    pub fn new(level: DiagnosticLevel, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
            node: None,
            source_text: None,
            suggestion: None,
        }
    }

    pub fn with_node(mut self, node: NodeId) -> Self {
        self.node = Some(node);
        self
    }

    /// Add source text
    pub fn with_source(mut self, text: impl Into<String>) -> Self {
        self.source_text = Some(text.into());
        self
    }

    /// Add suggestion
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.level, self.message)?;

        if let Some(node) = self.node {
            write!(f, "\n  --> node {}", node.index())?;
        }
        if let Some(ref source) = self.source_text {
            write!(f, "\n  |\n  | {}", source)?;
        }
        if let Some(ref suggestion) = self.suggestion {
            write!(f, "\n  = help: {}", suggestion)?;
        }

        Ok(())
    }
}

/// Check result with summary
#[derive(Debug, Default)]
pub struct CheckResult {
    /// All diagnostics
    pub diagnostics: Vec<Diagnostic>,
    /// Number of errors
    pub errors: usize,
    /// Number of warnings
    pub warnings: usize,
    /// Number of info messages
    pub infos: usize,
}

impl CheckResult {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a diagnostic
    pub fn add(&mut self, diag: Diagnostic) {
        match diag.level {
            DiagnosticLevel::Error => self.errors += 1,
            DiagnosticLevel::Warning => self.warnings += 1,
            DiagnosticLevel::Info => self.infos += 1,
        }
        self.diagnostics.push(diag);
    }

    /// Check if there are any errors
    pub fn has_errors(&self) -> bool {
        self.errors > 0
    }

    /// Check if there are any issues at all
    pub fn is_empty(&self) -> bool {
        self.diagnostics.is_empty()
    }

    /// Get summary string
    pub fn summary(&self) -> String {
        let mut parts = Vec::new();
        for (count, noun) in [
            (self.errors, "error"),
            (self.warnings, "warning"),
            (self.infos, "note"),
        ] {
            if count > 0 {
                parts.push(format!("{} {}{}", count, noun, if count == 1 { "" } else { "s" }));
            }
        }
        if parts.is_empty() {
            "no issues found".to_string()
        } else {
            parts.join(", ")
        }
    }
}

/// Parse `html` and check it
pub fn check_html_str(html: &str) -> ConversionResult<CheckResult> {
    let doc = parse_html(html)?;
    Ok(check_html(&doc))
}

/// Check a document for constructs the converter drops or degrades
pub fn check_html(doc: &Document) -> CheckResult {
    let mut result = CheckResult::new();
    let Some(root) = doc.root() else {
        result.add(Diagnostic::new(DiagnosticLevel::Error, "document has no root element"));
        return result;
    };

    let mut unknown = FxHashSet::default();
    // (node, inside a table but outside its cells)
    let mut stack = vec![(root, false)];
    while let Some((id, in_skeleton)) = stack.pop() {
        let Some(node) = doc.node(id) else { continue };
        let el = match &node.kind {
            NodeKind::Text(text) => {
                if in_skeleton && !text.trim().is_empty() {
                    result.add(
                        Diagnostic::new(DiagnosticLevel::Warning, "text between table cells is dropped")
                            .with_node(id)
                            .with_source(text.trim()),
                    );
                }
                continue;
            }
            NodeKind::Element(el) => el,
        };

        check_element(doc, id, el, &mut unknown, &mut result);

        if el.tag.is_suppressed() {
            continue;
        }
        let child_skeleton = match el.tag {
            Tag::Table | Tag::TableSection | Tag::TableRow => true,
            Tag::TableCell { .. } | Tag::Caption => false,
            _ => in_skeleton,
        };
        for &child in doc.children(id).iter().rev() {
            stack.push((child, child_skeleton));
        }
    }

    result
}

/// Opening tag as written, for source excerpts
fn opening_tag(el: &Element) -> String {
    let mut out = format!("<{}", el.name);
    for a in &el.attrs {
        out.push_str(&format!(" {}=\"{}\"", a.name, a.value));
    }
    out.push('>');
    out
}

fn check_element(
    doc: &Document,
    id: NodeId,
    el: &Element,
    unknown: &mut FxHashSet<String>,
    result: &mut CheckResult,
) {
    match &el.tag {
        Tag::Other(name) => {
            if unknown.insert(name.clone()) {
                result.add(
                    Diagnostic::new(DiagnosticLevel::Warning, format!("unknown element <{}>", name))
                        .with_node(id)
                        .with_suggestion("its content is kept, its markup is dropped"),
                );
            }
        }
        Tag::Heading(level) if heading_command(*level).is_none() => {
            result.add(
                Diagnostic::new(
                    DiagnosticLevel::Warning,
                    format!("heading level {} has no sectioning command", level),
                )
                .with_node(id)
                .with_source(opening_tag(el))
                .with_suggestion("use <h1> to <h5>"),
            );
        }
        Tag::Strike => {
            result.add(
                Diagnostic::new(DiagnosticLevel::Info, "strike-through is rendered as plain text")
                    .with_node(id),
            );
        }
        Tag::Image => check_image(id, el, result),
        Tag::TableCell { .. } => {
            if let Some(span) = el.attr("colspan") {
                if !matches!(span.trim().parse::<i64>(), Ok(n) if n >= 1) {
                    result.add(
                        Diagnostic::new(
                            DiagnosticLevel::Info,
                            format!("colspan '{}' is treated as 1", span),
                        )
                        .with_node(id)
                        .with_source(opening_tag(el)),
                    );
                }
            }
            let in_row = doc
                .parent(id)
                .map(|p| matches!(doc.tag(p), Some(Tag::TableRow)))
                .unwrap_or(false);
            if !in_row {
                result.add(
                    Diagnostic::new(DiagnosticLevel::Warning, "table cell outside a row")
                        .with_node(id),
                );
            }
        }
        Tag::Font => {
            if let Some(color) = el.attr("color") {
                if let Err(e) = color_to_hex(color) {
                    result.add(
                        Diagnostic::new(DiagnosticLevel::Warning, e.message)
                            .with_node(id)
                            .with_source(opening_tag(el)),
                    );
                }
            }
        }
        _ => {}
    }

    if let Some(style) = el.attr("style") {
        check_style(id, style, result);
    }
}

fn check_image(id: NodeId, el: &Element, result: &mut CheckResult) {
    let Some(src) = el.attr("src").map(str::trim).filter(|s| !s.is_empty()) else {
        result.add(
            Diagnostic::new(DiagnosticLevel::Warning, "image without src is skipped")
                .with_node(id)
                .with_source(opening_tag(el)),
        );
        return;
    };
    match ImageSource::classify(src) {
        ImageSource::Remote(url) => result.add(
            Diagnostic::new(DiagnosticLevel::Info, format!("remote image '{}'", url))
                .with_node(id)
                .with_suggestion("download it and resolve the path with --image-dir"),
        ),
        ImageSource::Embedded => result.add(
            Diagnostic::new(DiagnosticLevel::Warning, "embedded data: image is skipped")
                .with_node(id),
        ),
        ImageSource::Path(_) | ImageSource::FileUrl(_) => {}
    }
}

fn check_style(id: NodeId, text: &str, result: &mut CheckResult) {
    let style = match parse_declarations(text) {
        Ok(style) => style,
        Err(e) => {
            result.add(Diagnostic::new(DiagnosticLevel::Error, e.message).with_node(id));
            return;
        }
    };
    for prop in style.iter() {
        let problem = if COLOR_PROPERTIES.contains(&prop.name.as_str()) {
            color_to_hex(&prop.value).err()
        } else if LENGTH_PROPERTIES.contains(&prop.name.as_str()) {
            Dimension::parse(&prop.value).err()
        } else if prop.name == "font-size" {
            let keyword = prop.value.to_ascii_lowercase();
            if CSS_FONT_SIZE_KEYWORDS.contains_key(keyword.as_str()) {
                None
            } else {
                Dimension::parse(&prop.value).and_then(|d| d.to_points()).err()
            }
        } else {
            None
        };
        if let Some(e) = problem {
            result.add(
                Diagnostic::new(DiagnosticLevel::Warning, e.message)
                    .with_node(id)
                    .with_source(format!("{}: {}", prop.name, prop.value))
                    .with_suggestion("the property is ignored"),
            );
        }
    }
}

/// Format check results for terminal output
pub fn format_diagnostics(result: &CheckResult, use_color: bool) -> String {
    let mut output = String::new();

    for diag in &result.diagnostics {
        if use_color {
            let color = match diag.level {
                DiagnosticLevel::Error => "\x1b[31m",   // Red
                DiagnosticLevel::Warning => "\x1b[33m", // Yellow
                DiagnosticLevel::Info => "\x1b[34m",    // Blue
            };
            output.push_str(color);
            output.push_str(&format!("{}", diag));
            output.push_str("\x1b[0m\n\n");
        } else {
            output.push_str(&format!("{}\n\n", diag));
        }
    }

    if use_color {
        if result.has_errors() {
            output.push_str("\x1b[31m");
        } else if result.warnings > 0 {
            output.push_str("\x1b[33m");
        } else {
            output.push_str("\x1b[32m");
        }
    }

    output.push_str(&format!("Summary: {}", result.summary()));

    if use_color {
        output.push_str("\x1b[0m");
    }

    output
}
