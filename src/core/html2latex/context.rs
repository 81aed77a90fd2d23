//! Conversion context and options for HTML to LaTeX conversion
//!
//! This module handles state management, output buffering, and conversion options.

use std::borrow::Cow;

use fxhash::FxHashSet;

use super::buffer::OutputBuffer;
use crate::core::dom::NodeId;
use crate::core::style::{ImportantPolicy, PropertyKinds};
use crate::features::images::ImageResolver;
use crate::utils::error::{ConversionError, ConversionResult, ConversionWarning, FaultChannel};

/// Options for HTML to LaTeX conversion
#[derive(Debug, Clone)]
#[cfg_attr(feature = "wasm", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "wasm", serde(default))]
pub struct H2LOptions {
    /// Whether to wrap output in a complete LaTeX document
    pub full_document: bool,
    /// Document class to use (default: "article")
    pub document_class: String,
    /// Document title; falls back to the HTML `<title>`
    pub title: Option<String>,
    /// Document author (optional)
    pub author: Option<String>,
    /// Inherited `!important` against a normal local declaration
    pub important_policy: ImportantPolicy,
    /// Float placement for figures (default: "htbp")
    pub figure_placement: String,
    /// Draw `|` column rules and `\hline`s in generic tables
    pub table_borders: bool,
    /// Collapse whitespace runs in text outside `<pre>`
    pub collapse_whitespace: bool,
}

impl Default for H2LOptions {
    fn default() -> Self {
        Self {
            full_document: false,
            document_class: "article".to_string(),
            title: None,
            author: None,
            important_policy: ImportantPolicy::LocalWins,
            figure_placement: "htbp".to_string(),
            table_borders: true,
            collapse_whitespace: true,
        }
    }
}

impl H2LOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn full_document() -> Self {
        Self {
            full_document: true,
            ..Default::default()
        }
    }

    /// Body only; the caller supplies the preamble
    pub fn fragment() -> Self {
        Self {
            full_document: false,
            ..Default::default()
        }
    }
}

/// Output owed when an element is left
#[derive(Debug, Clone)]
pub enum Closer {
    /// Literal text
    Text(Cow<'static, str>),
    /// Closes a brace counted in `open_braces`
    Brace(&'static str),
    /// Blank line unless already at one
    ParagraphBreak,
    /// Line break unless already at one
    Newline,
    /// `\label{..}` with the name path-escaped
    Label(String),
    /// Ends a command argument opened with [`ConverterState::open_argument`]
    EndArgument,
}

/// Inline formatting currently in effect
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Formatting {
    /// Applied-formatting bitmask
    pub active: PropertyKinds,
    pub color: Option<String>,
    pub background: Option<String>,
    /// `texttt`, `textsf` or `textrm`
    pub family: Option<&'static str>,
    /// LaTeX size switch
    pub size: Option<String>,
    /// `center`, `flushright` or `flushleft`
    pub align: Option<&'static str>,
    /// Underline requested by a block element; applied to each text run
    pub pending_underline: bool,
    /// Background requested by a block element; applied to each text run
    pub pending_background: Option<String>,
}

/// State of the table currently being emitted
#[derive(Debug, Clone, Default)]
pub struct TableState {
    /// Table element
    pub node: Option<NodeId>,
    /// 1-based table number (0 for nested tables)
    pub number: usize,
    pub columns: usize,
    /// Rendered as a bare `tabular` (inside an outer cell or a command argument)
    pub nested: bool,
    pub in_row: bool,
    pub in_cell: bool,
    /// Columns consumed so far in the current row
    pub col_index: usize,
    /// `<caption>` text waiting for the end of the table
    pub caption: Option<String>,
    pub label: Option<String>,
}

/// Per-element bookkeeping, pushed on enter and popped on leave
#[derive(Debug, Default)]
pub struct Frame {
    /// Emitted on leave in reverse order
    pub closers: Vec<Closer>,
    /// Formatting to restore on leave
    pub saved: Option<Formatting>,
    /// Table state of the enclosing table, restored when a table ends
    pub outer_table: Option<Option<TableState>>,
    /// `open_braces` when a cell was entered
    pub cell_braces: Option<usize>,
    /// Padding separators owed by a cell with colspan > 1
    pub padding: usize,
    /// Entered a `verbatim` block
    pub pre: bool,
    /// Entered a list environment
    pub list: bool,
}

/// Conversion context for tracking state during conversion
pub struct ConverterState<'r> {
    /// Output buffer
    pub buffer: OutputBuffer,
    /// Conversion options
    pub options: H2LOptions,
    /// Image path resolver
    pub resolver: &'r dyn ImageResolver,
    pub formatting: Formatting,
    pub table: Option<TableState>,
    /// Monotonic counters used for synthesized captions and labels
    pub tables: usize,
    pub figures: usize,
    pub images: usize,
    /// Closing braces owed at this point of the output
    pub open_braces: usize,
    /// Command arguments (`\textbf{`, `\href{..}{`, `\section{`) currently open
    pub arg_depth: usize,
    /// The element being entered has block-level descendants
    pub block_content: bool,
    pub frames: Vec<Frame>,
    /// List nesting level (for itemize/enumerate)
    pub list_depth: usize,
    /// Inside `<pre>`
    pub pre_depth: usize,
    /// Collected warnings during conversion
    pub warnings: Vec<ConversionWarning>,
    /// Last skipped-construct fault
    pub faults: FaultChannel,
    /// Unknown tag names already reported
    reported_tags: FxHashSet<String>,
}

impl<'r> ConverterState<'r> {
    pub fn new(options: H2LOptions, resolver: &'r dyn ImageResolver) -> ConversionResult<Self> {
        Ok(Self {
            buffer: OutputBuffer::with_capacity(1024)?,
            options,
            resolver,
            formatting: Formatting::default(),
            table: None,
            tables: 0,
            figures: 0,
            images: 0,
            open_braces: 0,
            arg_depth: 0,
            block_content: false,
            frames: Vec::new(),
            list_depth: 0,
            pre_depth: 0,
            warnings: Vec::new(),
            faults: FaultChannel::new(),
            reported_tags: FxHashSet::default(),
        })
    }

    // =========================================================================
    // Output
    // =========================================================================

    pub fn push(&mut self, s: &str) -> ConversionResult<()> {
        self.buffer.append(s)
    }

    /// Open a brace group; `closing` is emitted when the current element is left
    pub fn open_group(&mut self, opening: &str, closing: &'static str) -> ConversionResult<()> {
        self.buffer.append(opening)?;
        self.brace_owed(closing);
        Ok(())
    }

    /// Count a brace the caller just opened and close it with `closing` on leave
    pub fn brace_owed(&mut self, closing: &'static str) {
        self.open_braces += 1;
        self.on_leave(Closer::Brace(closing));
    }

    /// Open a command argument; paragraphs, sections and floats cannot go inside it
    pub fn open_argument(&mut self, opening: &str, closing: &'static str) -> ConversionResult<()> {
        self.buffer.append(opening)?;
        self.argument_owed(closing);
        Ok(())
    }

    /// Count an argument brace the caller just opened
    pub fn argument_owed(&mut self, closing: &'static str) {
        self.brace_owed(closing);
        self.arg_depth += 1;
        self.on_leave(Closer::EndArgument);
    }

    /// Register output for when the current element is left
    pub fn on_leave(&mut self, closer: Closer) {
        if let Some(frame) = self.frames.last_mut() {
            frame.closers.push(closer);
        }
    }

    /// Register literal text for when the current element is left
    pub fn on_leave_text(&mut self, text: impl Into<Cow<'static, str>>) {
        self.on_leave(Closer::Text(text.into()));
    }

    pub fn frame(&mut self) -> ConversionResult<&mut Frame> {
        self.frames
            .last_mut()
            .ok_or_else(|| ConversionError::internal("no open element frame"))
    }

    /// Emit a frame's closers in reverse order of opening
    pub fn close_frame(&mut self, frame: &mut Frame) -> ConversionResult<()> {
        while let Some(closer) = frame.closers.pop() {
            match closer {
                Closer::Text(text) => self.buffer.append(&text)?,
                Closer::Brace(text) => {
                    self.buffer.append(text)?;
                    self.open_braces = self.open_braces.saturating_sub(1);
                }
                Closer::ParagraphBreak => self.buffer.ensure_paragraph_break()?,
                Closer::Newline => self.buffer.newline()?,
                Closer::Label(name) => {
                    self.buffer.append("\\label{")?;
                    self.buffer.append_path_escaped(&name)?;
                    self.buffer.append("}")?;
                }
                Closer::EndArgument => self.arg_depth = self.arg_depth.saturating_sub(1),
            }
        }
        Ok(())
    }

    // =========================================================================
    // Context queries
    // =========================================================================

    pub fn in_cell(&self) -> bool {
        self.table.as_ref().map(|t| t.in_cell).unwrap_or(false)
    }

    /// Only inline material may be emitted: inside a cell or a command argument
    pub fn inline_only(&self) -> bool {
        self.in_cell() || self.arg_depth > 0
    }

    /// Inside a table but between cells
    pub fn in_table_skeleton(&self) -> bool {
        self.table.as_ref().map(|t| !t.in_cell).unwrap_or(false)
    }

    // =========================================================================
    // Faults and warnings
    // =========================================================================

    /// Record a skipped construct
    pub fn warn(&mut self, err: ConversionError, element: Option<&str>) {
        log::warn!(
            "skipping {}: {}",
            element.map(|e| format!("<{}>", e)).unwrap_or_else(|| "text".to_string()),
            err
        );
        self.warnings.push(ConversionWarning::from_error(&err, element));
        self.faults.record(err);
    }

    /// Report an unrecognized tag once per name
    pub fn report_unknown_tag(&mut self, name: &str) {
        if self.reported_tags.insert(name.to_string()) {
            self.warn(
                ConversionError::unsupported(format!("unknown element <{}> rendered as plain content", name)),
                Some(name),
            );
        }
    }

    // =========================================================================
    // Finish
    // =========================================================================

    /// Finalize and clean up the output
    pub fn finish(mut self) -> ConversionResult<(String, Vec<ConversionWarning>)> {
        if self.open_braces > 0 {
            return Err(ConversionError::internal(format!(
                "{} braces left open at end of document",
                self.open_braces
            )));
        }
        self.buffer.trim_trailing_spaces();
        let text = self.buffer.into_string();
        let content = text.trim().to_string();
        Ok((content, self.warnings))
    }
}
