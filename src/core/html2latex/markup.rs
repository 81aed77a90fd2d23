//! Element and text handlers
//!
//! [`ConverterState`] is the walker's visitor. `enter` pushes a [`Frame`] and dispatches
//! on the element's [`Tag`]; handlers emit opening markup and register whatever must be
//! written on `leave`. CSS formatting (color, background, bold, italic, underline) is
//! opened only when the matching bit is not already active, so formatting produced by
//! an ancestor is never reopened.
//!
//! Formatting that encloses block content uses group declarations (`{\color..}`,
//! `{\bfseries ..}`) because a paragraph break cannot sit inside a command argument.
//! Inside an argument (`\textbf{`, `\href{..}{`, `\section{`) block elements degrade
//! to inline text the same way they do in a table cell.

use super::context::{Closer, ConverterState, Frame};
use super::table::tabular;
use crate::core::dom::{Document, Element, NodeId, Tag};
use crate::core::style::{ComputedStyle, PropertyKinds};
use crate::core::walker::{BreadthFirst, Flow, StyledVisitor};
use crate::data::colors::color_to_hex;
use crate::data::constants::{
    font_family_command, heading_command, CSS_FONT_SIZE_KEYWORDS, FONT_SIZE_SWITCHES,
};
use crate::features::images::ImageOptions;
use crate::features::units::{format_num, Dimension};
use crate::utils::error::{ConversionError, ConversionResult, FaultKind};

/// `enumerate` counters by nesting depth
const ENUM_COUNTERS: [&str; 4] = ["enumi", "enumii", "enumiii", "enumiv"];

impl StyledVisitor for ConverterState<'_> {
    fn enter(
        &mut self,
        doc: &Document,
        node: NodeId,
        element: &Element,
        style: &ComputedStyle,
    ) -> ConversionResult<Flow> {
        self.faults.clear();
        self.frames.try_reserve(1)?;
        self.frames.push(Frame {
            saved: Some(self.formatting.clone()),
            ..Default::default()
        });
        self.block_content =
            self.pre_depth == 0 && may_format(element, style) && has_block_content(doc, node);
        open_element(self, doc, node, element, style)
    }

    fn text(
        &mut self,
        _doc: &Document,
        _node: NodeId,
        text: &str,
        _style: &ComputedStyle,
    ) -> ConversionResult<Flow> {
        self.faults.clear();
        emit_text(self, text)?;
        Ok(Flow::Continue)
    }

    fn leave(
        &mut self,
        _doc: &Document,
        _node: NodeId,
        element: &Element,
        _style: &ComputedStyle,
    ) -> ConversionResult<()> {
        self.faults.clear();
        let mut frame = self
            .frames
            .pop()
            .ok_or_else(|| ConversionError::internal("leave without a matching enter"))?;
        close_element(self, element, &mut frame)
    }
}

fn open_element(
    state: &mut ConverterState,
    doc: &Document,
    node: NodeId,
    el: &Element,
    style: &ComputedStyle,
) -> ConversionResult<Flow> {
    if state.pre_depth > 0 {
        // inside verbatim only the raw text counts
        if el.tag == Tag::LineBreak {
            state.push("\n")?;
        }
        return Ok(Flow::Continue);
    }

    log::debug!("open <{}> as {:?}", el.name, el.tag);

    match &el.tag {
        Tag::Document | Tag::Html | Tag::Body | Tag::TableSection => Ok(Flow::Continue),
        Tag::Head | Tag::Title | Tag::Script | Tag::Style => Ok(Flow::SkipChildren),

        Tag::Paragraph => open_paragraph(state, el, style),
        Tag::Division => open_division(state, el, style),
        Tag::Center => open_environment(state, el, style, "center"),
        Tag::Blockquote => open_environment(state, el, style, "quote"),
        Tag::Heading(level) => open_heading(state, el, style, *level),
        Tag::Preformatted => open_preformatted(state, el, style),

        Tag::Bold => open_inline(state, el, style, PropertyKinds::BOLD),
        Tag::Italic => open_inline(state, el, style, PropertyKinds::ITALIC),
        Tag::Underline => open_inline(state, el, style, PropertyKinds::UNDERLINE),
        Tag::Strike => {
            apply_css(state, el, style)?;
            state.warn(
                ConversionError::unsupported("strike-through rendered as plain text"),
                Some(&el.name),
            );
            Ok(Flow::Continue)
        }
        Tag::Code => {
            apply_css(state, el, style)?;
            apply_family(state, "texttt")?;
            Ok(Flow::Continue)
        }
        Tag::Subscript => {
            apply_css(state, el, style)?;
            state.open_argument("\\textsubscript{", "}")?;
            Ok(Flow::Continue)
        }
        Tag::Superscript => {
            apply_css(state, el, style)?;
            state.open_argument("\\textsuperscript{", "}")?;
            Ok(Flow::Continue)
        }
        Tag::Anchor => open_anchor(state, el, style),
        Tag::Span | Tag::Font => open_span(state, el, style),

        Tag::UnorderedList => open_list(state, el, style, "itemize"),
        Tag::OrderedList => open_list(state, el, style, "enumerate"),
        Tag::DescriptionList => open_list(state, el, style, "description"),
        Tag::ListItem | Tag::DescriptionTerm | Tag::DescriptionDetails => {
            open_list_item(state, el, style)
        }

        Tag::Table => tabular::open_table(state, doc, node, el),
        Tag::TableRow => tabular::open_row(state),
        Tag::TableCell { header, colspan } => {
            tabular::open_cell(state, el, style, *header, *colspan)
        }
        Tag::Caption => {
            if tabular::stage_caption(state, doc, node) {
                return Ok(Flow::SkipChildren);
            }
            open_paragraph(state, el, style)
        }

        Tag::Image => {
            open_image(state, doc, node, el, style)?;
            Ok(Flow::SkipChildren)
        }
        Tag::HorizontalRule => {
            if !state.inline_only() {
                state.buffer.newline()?;
                state.push("\\par\\noindent\\rule{\\textwidth}{0.4pt}\\par\n")?;
            }
            Ok(Flow::SkipChildren)
        }
        Tag::LineBreak => {
            if state.inline_only() {
                state.push("\\newline ")?;
            } else if !state.buffer.is_empty() && !state.buffer.ends_with("\n") {
                state.buffer.trim_trailing_spaces();
                state.push("\\\\\n")?;
            }
            Ok(Flow::SkipChildren)
        }

        Tag::Other(name) => {
            state.report_unknown_tag(name);
            apply_css(state, el, style)?;
            Ok(Flow::Continue)
        }
    }
}

fn close_element(
    state: &mut ConverterState,
    el: &Element,
    frame: &mut Frame,
) -> ConversionResult<()> {
    match &el.tag {
        Tag::TableCell { .. } if frame.cell_braces.is_some() => tabular::close_cell(state, frame)?,
        Tag::Table => tabular::close_table(state, frame)?,
        Tag::TableRow => {
            state.close_frame(frame)?;
            if let Some(t) = state.table.as_mut() {
                t.in_row = false;
            }
        }
        _ => state.close_frame(frame)?,
    }

    if frame.pre {
        state.pre_depth = state.pre_depth.saturating_sub(1);
    }
    if frame.list {
        state.list_depth = state.list_depth.saturating_sub(1);
    }
    if let Some(saved) = frame.saved.take() {
        state.formatting = saved;
    }
    Ok(())
}

// =============================================================================
// CSS formatting
// =============================================================================

/// Open the CSS-driven inline formatting of `style` that is not already active
pub(super) fn apply_css(
    state: &mut ConverterState,
    el: &Element,
    style: &ComputedStyle,
) -> ConversionResult<()> {
    if style.has(PropertyKinds::COLOR) {
        if let Some(value) = style.get("color") {
            match color_to_hex(value) {
                Ok(hex) => apply_color(state, hex)?,
                Err(e) => state.warn(e, Some(&el.name)),
            }
        }
    }
    if style.has(PropertyKinds::BACKGROUND) {
        if let Some(value) = style.background_color() {
            match color_to_hex(value) {
                Ok(hex) => apply_background(state, hex)?,
                Err(e) => state.warn(e, Some(&el.name)),
            }
        }
    }
    if style.is_bold() {
        apply_bit(state, PropertyKinds::BOLD)?;
    }
    if style.is_italic() {
        apply_bit(state, PropertyKinds::ITALIC)?;
    }
    if style.is_underline() {
        apply_bit(state, PropertyKinds::UNDERLINE)?;
    }
    Ok(())
}

/// Elements that can open formatting of their own
fn may_format(el: &Element, style: &ComputedStyle) -> bool {
    style.has(PropertyKinds::FORMATTING | PropertyKinds::FONT_FAMILY)
        || matches!(
            el.tag,
            Tag::Bold | Tag::Italic | Tag::Underline | Tag::Code | Tag::Font
        )
}

/// Something below `node` renders as a paragraph, section, list or float
fn has_block_content(doc: &Document, node: NodeId) -> bool {
    BreadthFirst::new(doc, node)
        .skip(1)
        .any(|n| match doc.tag(n) {
            Some(Tag::Image) => is_block_image(doc, n),
            Some(tag) => tag.is_block_level(),
            None => false,
        })
}

/// Open bold, italic or underline unless `kind` is already active
///
/// Underline has no declaration form; around block content it is applied to each
/// text run instead.
pub(super) fn apply_bit(state: &mut ConverterState, kind: PropertyKinds) -> ConversionResult<()> {
    if state.formatting.active.contains(kind) {
        return Ok(());
    }
    let (command, declaration) = match kind {
        PropertyKinds::BOLD => ("\\textbf{", Some("{\\bfseries ")),
        PropertyKinds::ITALIC => ("\\textit{", Some("{\\itshape ")),
        _ => ("\\underline{", None),
    };
    if !state.block_content {
        state.open_argument(command, "}")?;
    } else if let Some(declaration) = declaration {
        state.open_group(declaration, "}")?;
    } else {
        state.formatting.pending_underline = true;
        return Ok(());
    }
    state.formatting.active.insert(kind);
    Ok(())
}

fn apply_color(state: &mut ConverterState, hex: String) -> ConversionResult<()> {
    let f = &state.formatting;
    if f.active.contains(PropertyKinds::COLOR) && f.color.as_deref() == Some(hex.as_str()) {
        return Ok(());
    }
    if state.block_content {
        state.open_group(&format!("{{\\color[HTML]{{{}}}", hex), "}")?;
    } else {
        state.open_argument(&format!("\\textcolor[HTML]{{{}}}{{", hex), "}")?;
    }
    state.formatting.active.insert(PropertyKinds::COLOR);
    state.formatting.color = Some(hex);
    Ok(())
}

fn apply_background(state: &mut ConverterState, hex: String) -> ConversionResult<()> {
    let f = &state.formatting;
    if f.active.contains(PropertyKinds::BACKGROUND) && f.background.as_deref() == Some(hex.as_str())
    {
        return Ok(());
    }
    if state.block_content {
        state.formatting.pending_background = Some(hex);
        return Ok(());
    }
    state.open_argument(&format!("\\colorbox[HTML]{{{}}}{{", hex), "}")?;
    state.formatting.active.insert(PropertyKinds::BACKGROUND);
    state.formatting.background = Some(hex);
    Ok(())
}

fn apply_family(state: &mut ConverterState, command: &'static str) -> ConversionResult<()> {
    if state.formatting.family == Some(command) {
        return Ok(());
    }
    match command.strip_prefix("text") {
        Some(short) if state.block_content => {
            state.open_group(&format!("{{\\{}family ", short), "}")?
        }
        _ => state.open_argument(&format!("\\{}{{", command), "}")?,
    }
    state.formatting.active.insert(PropertyKinds::FONT_FAMILY);
    state.formatting.family = Some(command);
    Ok(())
}

fn apply_size(state: &mut ConverterState, switch: String) -> ConversionResult<()> {
    if state.formatting.size.as_deref() == Some(switch.as_str()) {
        return Ok(());
    }
    state.open_group(&format!("{{{} ", switch), "}")?;
    state.formatting.active.insert(PropertyKinds::FONT_SIZE);
    state.formatting.size = Some(switch);
    Ok(())
}

/// LaTeX size switch for a CSS `font-size`
fn css_size_switch(value: &str) -> ConversionResult<String> {
    let lower = value.trim().to_ascii_lowercase();
    if let Some(switch) = CSS_FONT_SIZE_KEYWORDS.get(lower.as_str()) {
        return Ok((*switch).to_string());
    }
    let pt = Dimension::parse(&lower)?.to_points()?;
    if pt <= 0.0 {
        return Err(ConversionError::css_value(format!("font-size '{}'", value)));
    }
    Ok(format!(
        "\\fontsize{{{}pt}}{{{}pt}}\\selectfont",
        format_num(pt),
        format_num(pt * 1.2)
    ))
}

/// LaTeX size switch for `<font size>`: 1-7, or relative to the default 3
fn font_attr_size_switch(value: &str) -> ConversionResult<&'static str> {
    let value = value.trim();
    let parsed = value
        .parse::<i32>()
        .map_err(|_| ConversionError::css_value(format!("font size '{}'", value)))?;
    let size = if value.starts_with('+') || value.starts_with('-') {
        3i32.saturating_add(parsed)
    } else {
        parsed
    };
    let index = size.clamp(1, 7) as usize - 1;
    Ok(FONT_SIZE_SWITCHES[index])
}

/// `center` / `flushright` / `flushleft` for a `text-align` (or `align`) value
fn alignment_environment(value: &str) -> Option<&'static str> {
    match value.trim().to_ascii_lowercase().as_str() {
        "center" => Some("center"),
        "right" | "end" => Some("flushright"),
        "left" | "start" => Some("flushleft"),
        _ => None,
    }
}

fn open_alignment(
    state: &mut ConverterState,
    el: &Element,
    style: &ComputedStyle,
) -> ConversionResult<()> {
    let value = style.get("text-align").or_else(|| el.attr("align"));
    let Some(env) = value.and_then(alignment_environment) else {
        return Ok(());
    };
    if state.formatting.align == Some(env) {
        return Ok(());
    }
    state.push(&format!("\\begin{{{}}}\n", env))?;
    state.on_leave(Closer::Newline);
    state.on_leave_text(format!("\\end{{{}}}\n", env));
    state.on_leave(Closer::Newline);
    state.formatting.active.insert(PropertyKinds::TEXT_ALIGN);
    state.formatting.align = Some(env);
    Ok(())
}

// =============================================================================
// Block elements
// =============================================================================

fn open_paragraph(
    state: &mut ConverterState,
    el: &Element,
    style: &ComputedStyle,
) -> ConversionResult<Flow> {
    if state.inline_only() {
        // paragraph breaks are not allowed inside a cell or an argument
        if !state.buffer.at_space() {
            state.push(" ")?;
        }
        state.on_leave_text(" ");
        apply_css(state, el, style)?;
        return Ok(Flow::Continue);
    }
    state.buffer.ensure_paragraph_break()?;
    state.on_leave(Closer::ParagraphBreak);
    open_alignment(state, el, style)?;
    apply_css(state, el, style)?;
    Ok(Flow::Continue)
}

fn open_division(
    state: &mut ConverterState,
    el: &Element,
    style: &ComputedStyle,
) -> ConversionResult<Flow> {
    if state.inline_only() {
        apply_css(state, el, style)?;
        return Ok(Flow::Continue);
    }
    state.buffer.ensure_paragraph_break()?;
    state.on_leave(Closer::ParagraphBreak);
    open_alignment(state, el, style)?;
    apply_css(state, el, style)?;
    Ok(Flow::Continue)
}

fn open_environment(
    state: &mut ConverterState,
    el: &Element,
    style: &ComputedStyle,
    env: &'static str,
) -> ConversionResult<Flow> {
    if !state.inline_only() {
        state.buffer.ensure_paragraph_break()?;
        state.push(&format!("\\begin{{{}}}\n", env))?;
        state.on_leave(Closer::ParagraphBreak);
        state.on_leave_text(format!("\\end{{{}}}", env));
        state.on_leave(Closer::Newline);
        if env == "center" {
            state.formatting.align = Some("center");
        }
    }
    apply_css(state, el, style)?;
    Ok(Flow::Continue)
}

fn open_heading(
    state: &mut ConverterState,
    el: &Element,
    style: &ComputedStyle,
    level: u8,
) -> ConversionResult<Flow> {
    if state.inline_only() {
        apply_css(state, el, style)?;
        apply_bit(state, PropertyKinds::BOLD)?;
        return Ok(Flow::Continue);
    }

    state.buffer.ensure_paragraph_break()?;
    state.on_leave(Closer::ParagraphBreak);

    let Some(command) = heading_command(level) else {
        state.warn(
            ConversionError::unsupported(format!("heading level {}", level)),
            Some(&el.name),
        );
        return Ok(Flow::Continue);
    };

    if let Some(id) = el.attr("id").map(str::trim).filter(|id| !id.is_empty()) {
        state.on_leave(Closer::Label(id.to_string()));
    }
    state.open_argument(&format!("\\{}{{", command), "}")?;
    apply_css(state, el, style)?;
    Ok(Flow::Continue)
}

fn open_preformatted(
    state: &mut ConverterState,
    el: &Element,
    style: &ComputedStyle,
) -> ConversionResult<Flow> {
    if state.inline_only() {
        apply_css(state, el, style)?;
        apply_family(state, "texttt")?;
        return Ok(Flow::Continue);
    }
    state.buffer.ensure_paragraph_break()?;
    state.push("\\begin{verbatim}\n")?;
    state.on_leave(Closer::ParagraphBreak);
    state.on_leave_text("\\end{verbatim}");
    state.on_leave(Closer::Newline);
    state.pre_depth += 1;
    state.frame()?.pre = true;
    Ok(Flow::Continue)
}

// =============================================================================
// Lists
// =============================================================================

fn open_list(
    state: &mut ConverterState,
    el: &Element,
    style: &ComputedStyle,
    env: &'static str,
) -> ConversionResult<Flow> {
    if state.inline_only() {
        apply_css(state, el, style)?;
        return Ok(Flow::Continue);
    }

    state.buffer.newline()?;
    state.push(&format!("\\begin{{{}}}\n", env))?;
    state.on_leave(Closer::Newline);
    state.on_leave_text(format!("\\end{{{}}}", env));
    state.on_leave(Closer::Newline);
    state.list_depth += 1;
    state.frame()?.list = true;

    if env == "enumerate" {
        let start = el.attr("start").and_then(|s| s.trim().parse::<i64>().ok());
        match (start, ENUM_COUNTERS.get(state.list_depth - 1)) {
            (Some(n), Some(counter)) if n != 1 => {
                state.push(&format!("\\setcounter{{{}}}{{{}}}\n", counter, n - 1))?;
            }
            _ => {}
        }
    }
    Ok(Flow::Continue)
}

fn open_list_item(
    state: &mut ConverterState,
    el: &Element,
    style: &ComputedStyle,
) -> ConversionResult<Flow> {
    if state.inline_only() {
        if el.tag == Tag::ListItem {
            if !state.buffer.at_space() {
                state.push(" ")?;
            }
            state.push("\\textbullet{} ")?;
        }
        apply_css(state, el, style)?;
        return Ok(Flow::Continue);
    }
    if state.list_depth == 0 {
        return open_paragraph(state, el, style);
    }

    match el.tag {
        Tag::DescriptionTerm => {
            state.buffer.newline()?;
            state.push("\\item[")?;
            state.on_leave_text("] ");
            state.arg_depth += 1;
            state.on_leave(Closer::EndArgument);
        }
        Tag::DescriptionDetails => {}
        _ => {
            state.buffer.newline()?;
            state.push("\\item ")?;
        }
    }
    apply_css(state, el, style)?;
    Ok(Flow::Continue)
}

// =============================================================================
// Inline elements
// =============================================================================

fn open_inline(
    state: &mut ConverterState,
    el: &Element,
    style: &ComputedStyle,
    kind: PropertyKinds,
) -> ConversionResult<Flow> {
    apply_css(state, el, style)?;
    apply_bit(state, kind)?;
    Ok(Flow::Continue)
}

fn open_anchor(
    state: &mut ConverterState,
    el: &Element,
    style: &ComputedStyle,
) -> ConversionResult<Flow> {
    if let Some(id) = el
        .attr("id")
        .or_else(|| el.attr("name"))
        .map(str::trim)
        .filter(|id| !id.is_empty())
    {
        state.push("\\label{")?;
        state.buffer.append_path_escaped(id)?;
        state.push("}")?;
    }

    apply_css(state, el, style)?;

    let Some(href) = el.attr("href").map(str::trim).filter(|h| !h.is_empty()) else {
        return Ok(Flow::Continue);
    };

    if let Some(fragment) = href.strip_prefix('#') {
        if !fragment.is_empty() {
            state.push("\\hyperref[")?;
            state.buffer.append_path_escaped(fragment)?;
            state.push("]{")?;
            state.argument_owed("}");
        }
    } else if href.to_ascii_lowercase().starts_with("javascript:") {
        state.warn(
            ConversionError::unsupported("script link rendered as plain text"),
            Some(&el.name),
        );
    } else {
        state.push("\\href{")?;
        state.buffer.append_url_escaped(href)?;
        state.push("}{")?;
        state.argument_owed("}");
    }
    Ok(Flow::Continue)
}

/// `<span>` and `<font>`: CSS wins over the presentational attributes
fn open_span(
    state: &mut ConverterState,
    el: &Element,
    style: &ComputedStyle,
) -> ConversionResult<Flow> {
    apply_css(state, el, style)?;

    if !style.has(PropertyKinds::COLOR) {
        if let Some(color) = el.attr("color") {
            match color_to_hex(color) {
                Ok(hex) => apply_color(state, hex)?,
                Err(e) => state.warn(e, Some(&el.name)),
            }
        }
    }

    let size = match style.get("font-size") {
        Some(value) => Some(css_size_switch(value)),
        None => el
            .attr("size")
            .map(|v| font_attr_size_switch(v).map(str::to_string)),
    };
    match size {
        Some(Ok(switch)) => apply_size(state, switch)?,
        Some(Err(e)) => state.warn(e, Some(&el.name)),
        None => {}
    }

    let family = style.get("font-family").or_else(|| el.attr("face"));
    if let Some(command) = family.and_then(font_family_command) {
        apply_family(state, command)?;
    }

    Ok(Flow::Continue)
}

// =============================================================================
// Images
// =============================================================================

/// Size options: CSS `width`/`height` first, then the attributes
fn image_options(
    state: &mut ConverterState,
    el: &Element,
    style: &ComputedStyle,
) -> ImageOptions {
    let mut opts = ImageOptions::default();
    for (name, slot) in [("width", &mut opts.width), ("height", &mut opts.height)] {
        let Some(value) = style.get(name).or_else(|| el.attr(name)) else {
            continue;
        };
        match Dimension::parse(value) {
            Ok(dim) => *slot = Some(dim),
            Err(e) => state.warn(e, Some(&el.name)),
        }
    }
    opts
}

/// `\includegraphics[opts]{path}`
pub(super) fn include_graphics(
    state: &mut ConverterState,
    path: &str,
    options: &str,
) -> ConversionResult<()> {
    state.push("\\includegraphics")?;
    if !options.is_empty() {
        state.push("[")?;
        state.push(options)?;
        state.push("]")?;
    }
    state.push("{")?;
    state.buffer.append_path_escaped(path)?;
    state.push("}")
}

/// An image alone on its line: in a block container, or the only content of a paragraph
fn is_block_image(doc: &Document, node: NodeId) -> bool {
    let Some(parent) = doc.parent(node) else {
        return true;
    };
    match doc.tag(parent) {
        Some(tag) if tag.is_block_container() => true,
        Some(Tag::Paragraph) => doc
            .children(parent)
            .iter()
            .all(|&c| c == node || doc.is_whitespace_text(c)),
        _ => false,
    }
}

fn open_image(
    state: &mut ConverterState,
    doc: &Document,
    node: NodeId,
    el: &Element,
    style: &ComputedStyle,
) -> ConversionResult<()> {
    let Some(src) = el.attr("src").map(str::trim).filter(|s| !s.is_empty()) else {
        state.warn(ConversionError::image("<img> without src"), Some(&el.name));
        return Ok(());
    };

    state.images += 1;
    let path = match state.resolver.resolve(src) {
        Ok(path) => path,
        Err(e) => {
            state.warn(e, Some(&el.name));
            if let Some(alt) = el.attr("alt").map(str::trim).filter(|a| !a.is_empty()) {
                state.buffer.append_escaped(alt)?;
            }
            return Ok(());
        }
    };
    let options = image_options(state, el, style).to_latex_options();

    let caption = el
        .attr("title")
        .or_else(|| el.attr("alt"))
        .map(str::trim)
        .filter(|c| !c.is_empty());
    let as_figure = state.table.is_none()
        && state.arg_depth == 0
        && state.list_depth == 0
        && is_block_image(doc, node);

    match caption {
        Some(caption) if as_figure => {
            state.figures += 1;
            let number = state.figures;
            state.buffer.ensure_paragraph_break()?;
            let placement = state.options.figure_placement.clone();
            state.push(&format!("\\begin{{figure}}[{}]\n\\centering\n", placement))?;
            include_graphics(state, &path, &options)?;
            state.push("\n\\caption{")?;
            state.buffer.append_escaped(caption)?;
            state.push("}\n\\label{")?;
            match el.attr("id").map(str::trim).filter(|id| !id.is_empty()) {
                Some(id) => state.buffer.append_path_escaped(id)?,
                None => state.push(&format!("figure_{}", number))?,
            }
            state.push("}\n\\end{figure}")?;
            state.buffer.ensure_paragraph_break()
        }
        _ => include_graphics(state, &path, &options),
    }
}

// =============================================================================
// Text
// =============================================================================

/// Replace whitespace runs with one space
pub(super) fn collapse_whitespace(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_space = false;
    for c in text.chars() {
        if c.is_whitespace() {
            if !in_space {
                out.push(' ');
            }
            in_space = true;
        } else {
            out.push(c);
            in_space = false;
        }
    }
    out
}

fn emit_text(state: &mut ConverterState, text: &str) -> ConversionResult<()> {
    if state.pre_depth > 0 {
        // a literal end marker would terminate the verbatim block early
        return state.push(&text.replace("\\end{verbatim}", "\\end {verbatim}"));
    }

    if state.in_table_skeleton() {
        if !text.trim().is_empty() {
            state.warn(
                ConversionError::new(FaultKind::TableStructure, "text outside a table cell"),
                None,
            );
        }
        return Ok(());
    }

    if !state.options.collapse_whitespace {
        return append_text_run(state, text);
    }

    let collapsed = collapse_whitespace(text);
    let text = if state.buffer.at_space() {
        collapsed.trim_start()
    } else {
        collapsed.as_str()
    };
    if text.is_empty() {
        return Ok(());
    }
    append_text_run(state, text)
}

/// Escape `text`, wrapping its non-blank part in an underline or background owed by a
/// block ancestor
fn append_text_run(state: &mut ConverterState, text: &str) -> ConversionResult<()> {
    let f = &state.formatting;
    let background = f
        .pending_background
        .clone()
        .filter(|_| !f.active.contains(PropertyKinds::BACKGROUND));
    let underline = f.pending_underline && !f.active.contains(PropertyKinds::UNDERLINE);
    let core = text.trim();
    if core.is_empty() || (background.is_none() && !underline) {
        return state.buffer.append_escaped(text);
    }

    let start = text.len() - text.trim_start().len();
    let end = start + core.len();
    state.buffer.append_escaped(&text[..start])?;
    if let Some(hex) = &background {
        state.push(&format!("\\colorbox[HTML]{{{}}}{{", hex))?;
    }
    if underline {
        state.push("\\underline{")?;
    }
    state.buffer.append_escaped(core)?;
    if underline {
        state.push("}")?;
    }
    if background.is_some() {
        state.push("}")?;
    }
    state.buffer.append_escaped(&text[end..])
}
