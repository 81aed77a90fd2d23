//! Generic tables: `table` float around a `tabular`
//!
//! Table, row and cell handlers drive [`TableState`]. A table entered inside a cell is a
//! bare `tabular`; the enclosing table's state is parked in the table element's frame
//! and restored when the nested table ends.

use super::columns::count_columns;
use super::images::{is_image_only, render_image_table};
use crate::core::dom::{Document, Element, NodeId};
use crate::core::html2latex::context::{ConverterState, Formatting, Frame, TableState};
use crate::core::html2latex::markup::{apply_bit, apply_css, collapse_whitespace};
use crate::core::style::{ComputedStyle, PropertyKinds};
use crate::core::walker::{text_content, Flow};
use crate::utils::error::{ConversionError, ConversionResult, FaultKind};

fn structure_fault(message: &str) -> ConversionError {
    ConversionError::new(FaultKind::TableStructure, message)
}

fn column_spec(columns: usize, borders: bool) -> String {
    if borders {
        format!("|{}", "l|".repeat(columns))
    } else {
        "l".repeat(columns)
    }
}

pub(crate) fn open_table(
    state: &mut ConverterState,
    doc: &Document,
    node: NodeId,
    el: &Element,
) -> ConversionResult<Flow> {
    let nested = state.table.is_some();
    if nested && !state.in_cell() {
        state.warn(structure_fault("table outside a cell of its parent table"), Some(&el.name));
        return Ok(Flow::SkipChildren);
    }

    // a float cannot go inside a cell or a command argument
    let bare = nested || state.arg_depth > 0;
    if !bare && is_image_only(doc, node) {
        render_image_table(state, doc, node, el)?;
        return Ok(Flow::SkipChildren);
    }

    let columns = count_columns(doc, node);
    let number = if bare {
        0
    } else {
        state.tables += 1;
        state.tables
    };
    let borders = state.options.table_borders;
    log::debug!(
        "table {} with {} columns{}",
        number,
        columns,
        if bare { " (bare)" } else { "" }
    );

    if bare {
        if !state.buffer.at_space() {
            state.push(" ")?;
        }
    } else {
        state.buffer.ensure_paragraph_break()?;
        state.push("\\begin{table}[h]\n\\centering\n")?;
    }
    state.push(&format!("\\begin{{tabular}}{{{}}}\n", column_spec(columns, borders)))?;
    if borders {
        state.push("\\hline\n")?;
    }

    let outer = state.table.take();
    state.frame()?.outer_table = Some(outer);
    state.formatting = Formatting::default();
    state.table = Some(TableState {
        node: Some(node),
        number,
        columns,
        nested: bare,
        label: el
            .attr("id")
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .map(str::to_string),
        ..Default::default()
    });
    Ok(Flow::Continue)
}

pub(crate) fn close_table(state: &mut ConverterState, frame: &mut Frame) -> ConversionResult<()> {
    state.close_frame(frame)?;
    // image grids and skipped tables never installed a table state
    let Some(outer) = frame.outer_table.take() else {
        return Ok(());
    };
    let table = state
        .table
        .take()
        .ok_or_else(|| ConversionError::internal("table closed without table state"))?;

    state.buffer.trim_trailing_spaces();
    state.buffer.newline()?;
    state.push("\\end{tabular}")?;

    if !table.nested {
        state.push("\n\\caption{")?;
        match table.caption.as_deref() {
            Some(caption) if !caption.is_empty() => state.buffer.append_escaped(caption)?,
            _ => state.push(&format!("Table {}", table.number))?,
        }
        state.push("}\n\\label{")?;
        match table.label.as_deref() {
            Some(label) => state.buffer.append_path_escaped(label)?,
            None => state.push(&format!("table_{}", table.number))?,
        }
        state.push("}\n\\end{table}")?;
        state.buffer.ensure_paragraph_break()?;
    }

    state.table = outer;
    Ok(())
}

pub(crate) fn open_row(state: &mut ConverterState) -> ConversionResult<Flow> {
    let borders = state.options.table_borders;
    let Some(table) = state.table.as_mut() else {
        state.warn(structure_fault("row outside a table"), Some("tr"));
        return Ok(Flow::Continue);
    };
    if table.in_cell {
        // a row inside a cell without its own table
        state.warn(structure_fault("row inside a cell"), Some("tr"));
        return Ok(Flow::Continue);
    }
    table.in_row = true;
    table.col_index = 0;
    state.on_leave_text(if borders { " \\\\ \\hline\n" } else { " \\\\\n" });
    Ok(Flow::Continue)
}

pub(crate) fn open_cell(
    state: &mut ConverterState,
    el: &Element,
    style: &ComputedStyle,
    header: bool,
    colspan: u32,
) -> ConversionResult<Flow> {
    let Some(table) = state.table.as_mut() else {
        state.warn(structure_fault("cell outside a table"), Some(&el.name));
        apply_css(state, el, style)?;
        return Ok(Flow::Continue);
    };
    if table.in_cell {
        state.warn(structure_fault("cell inside a cell"), Some(&el.name));
        apply_css(state, el, style)?;
        return Ok(Flow::Continue);
    }

    let separator = table.col_index > 0;
    table.col_index = table.col_index.saturating_add(colspan as usize);
    table.in_cell = true;

    if separator {
        state.buffer.trim_trailing_spaces();
        state.push(" & ")?;
    }
    let braces = state.open_braces;
    let frame = state.frame()?;
    frame.cell_braces = Some(braces);
    frame.padding = colspan.saturating_sub(1) as usize;

    if header {
        apply_bit(state, PropertyKinds::BOLD)?;
    }
    apply_css(state, el, style)?;
    Ok(Flow::Continue)
}

pub(crate) fn close_cell(state: &mut ConverterState, frame: &mut Frame) -> ConversionResult<()> {
    state.buffer.trim_trailing_spaces();
    state.close_frame(frame)?;

    let saved = frame.cell_braces.unwrap_or(state.open_braces);
    while state.open_braces > saved {
        state.push("}")?;
        state.open_braces -= 1;
    }
    for _ in 0..frame.padding {
        state.push(" &")?;
    }
    if let Some(table) = state.table.as_mut() {
        table.in_cell = false;
    }
    Ok(())
}

/// Hold a `<caption>`'s text for the end of the current table
pub(crate) fn stage_caption(state: &mut ConverterState, doc: &Document, node: NodeId) -> bool {
    let Some(table) = state.table.as_mut() else {
        return false;
    };
    let text = collapse_whitespace(&text_content(doc, node));
    table.caption = Some(text.trim().to_string());
    true
}
