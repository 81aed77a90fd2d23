//! Tables used as image grids
//!
//! A table whose content is nothing but images (plus whitespace and the table skeleton)
//! is a layout device, so it becomes a `figure` holding a borderless `tabular` with one
//! image per cell instead of a data table.

use super::columns::{count_columns, row_cells, table_rows};
use crate::core::dom::{Document, Element, NodeId, Tag};
use crate::core::html2latex::context::ConverterState;
use crate::core::html2latex::markup::{collapse_whitespace, include_graphics};
use crate::core::walker::{text_content, BreadthFirst};
use crate::features::images::ImageOptions;
use crate::utils::error::{ConversionError, ConversionResult};

/// Share of `\linewidth` split between the columns of an image grid
const GRID_WIDTH: f64 = 0.9;

/// True when `table` holds at least one image and nothing but images, table structure
/// and whitespace. Captions are not content.
pub fn is_image_only(doc: &Document, table: NodeId) -> bool {
    let mut images = 0usize;
    let mut bfs = BreadthFirst::new(doc, table);
    while let Some(id) = bfs.next() {
        if let Some(text) = doc.text(id) {
            if !text.trim().is_empty() {
                return false;
            }
            continue;
        }
        match doc.tag(id) {
            Some(Tag::Caption) => bfs.skip_children(),
            Some(Tag::Image) => images += 1,
            Some(tag) if tag.is_table_structure() => {}
            _ => return false,
        }
    }
    images > 0
}

/// Text of the table's own `<caption>`, whitespace collapsed
fn caption_text(doc: &Document, table: NodeId) -> Option<String> {
    let caption = doc
        .children(table)
        .iter()
        .copied()
        .find(|&id| matches!(doc.tag(id), Some(Tag::Caption)))?;
    let text = collapse_whitespace(&text_content(doc, caption));
    let text = text.trim();
    (!text.is_empty()).then(|| text.to_string())
}

/// Emit an image-only table as a figure
pub fn render_image_table(
    state: &mut ConverterState,
    doc: &Document,
    table: NodeId,
    el: &Element,
) -> ConversionResult<()> {
    state.figures += 1;
    let number = state.figures;
    let columns = count_columns(doc, table);
    let options = ImageOptions {
        line_fraction: Some(GRID_WIDTH / columns as f64),
        ..Default::default()
    }
    .to_latex_options();

    log::debug!("image-only table rendered as figure {} ({} columns)", number, columns);

    state.buffer.ensure_paragraph_break()?;
    let placement = state.options.figure_placement.clone();
    state.push(&format!(
        "\\begin{{figure}}[{}]\n\\centering\n\\begin{{tabular}}{{{}}}\n",
        placement,
        "c".repeat(columns)
    ))?;

    for row in table_rows(doc, table) {
        let mut col = 0usize;
        for (cell, span) in row_cells(doc, row) {
            if col > 0 {
                state.push(" & ")?;
            }
            let mut first = true;
            let cell_images: Vec<NodeId> = BreadthFirst::new(doc, cell)
                .filter(|&id| matches!(doc.tag(id), Some(Tag::Image)))
                .collect();
            for image in cell_images {
                let Some(img) = doc.element(image) else { continue };
                let Some(src) = img.attr("src").map(str::trim).filter(|s| !s.is_empty()) else {
                    state.warn(ConversionError::image("<img> without src"), Some(&img.name));
                    continue;
                };
                state.images += 1;
                match state.resolver.resolve(src) {
                    Ok(path) => {
                        if !first {
                            state.push(" ")?;
                        }
                        include_graphics(state, &path, &options)?;
                        first = false;
                    }
                    Err(e) => state.warn(e, Some(&img.name)),
                }
            }
            for _ in 1..span {
                state.push(" &")?;
            }
            col += span as usize;
        }
        state.push(" \\\\\n")?;
    }

    state.push("\\end{tabular}\n\\caption{")?;
    match caption_text(doc, table) {
        Some(caption) => state.buffer.append_escaped(&caption)?,
        None => state.push(&format!("Figure {}", number))?,
    }
    state.push("}\n\\label{")?;
    match el.attr("id").map(str::trim).filter(|id| !id.is_empty()) {
        Some(id) => state.buffer.append_path_escaped(id)?,
        None => state.push(&format!("figure_{}", number))?,
    }
    state.push("}\n\\end{figure}")?;
    state.buffer.ensure_paragraph_break()
}
