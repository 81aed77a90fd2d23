//! HTML table conversion
//!
//! ```text
//! <table> -> image-only? -> figure with an image grid
//!                        -> table float: tabular, rows, cells (colspan padded)
//! ```
//!
//! Column counts come from the widest row, counting colspans. Nested tables are
//! rendered as bare `tabular`s inside the enclosing cell.

mod columns;
mod images;
pub(super) mod tabular;

#[cfg(test)]
mod tests;

pub use columns::{count_columns, row_cells, table_rows};
pub use images::is_image_only;
