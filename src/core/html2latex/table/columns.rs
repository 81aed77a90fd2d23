//! Table geometry

use crate::core::dom::{Document, NodeId, Tag};
use crate::core::walker::BreadthFirst;

/// Rows of `table` in document order, entering `thead`/`tbody`/`tfoot` but not nested tables
pub fn table_rows(doc: &Document, table: NodeId) -> Vec<NodeId> {
    let mut rows = Vec::new();
    let mut bfs = BreadthFirst::new(doc, table);
    while let Some(id) = bfs.next() {
        if id == table {
            continue;
        }
        match doc.tag(id) {
            Some(Tag::TableSection) => {}
            Some(Tag::TableRow) => {
                rows.push(id);
                bfs.skip_children();
            }
            _ => bfs.skip_children(),
        }
    }
    // sections are visited before their rows, so level order is not document order
    rows.sort_unstable();
    rows
}

/// Cells of a row, each with its colspan
pub fn row_cells(doc: &Document, row: NodeId) -> impl Iterator<Item = (NodeId, u32)> + '_ {
    doc.children(row).iter().filter_map(move |&id| match doc.tag(id) {
        Some(Tag::TableCell { colspan, .. }) => Some((id, *colspan)),
        _ => None,
    })
}

/// Widest row of `table`, counting colspans; 1 for a table without rows
pub fn count_columns(doc: &Document, table: NodeId) -> usize {
    table_rows(doc, table)
        .into_iter()
        .map(|row| {
            row_cells(doc, row).fold(0usize, |sum, (_, span)| sum.saturating_add(span as usize))
        })
        .max()
        .filter(|&n| n > 0)
        .unwrap_or(1)
}
