//! Tests for HTML table conversion

use pretty_assertions::assert_eq;

use super::columns::{count_columns, table_rows};
use super::images::is_image_only;
use crate::core::dom::{Document, NodeId, Tag, MAX_COLSPAN};
use crate::core::html::parse_html;
use crate::core::html2latex::{convert_document, html_to_latex, html_to_latex_with_options, H2LOptions};
use crate::core::walker::BreadthFirst;
use crate::features::images::PassthroughImageResolver;
use crate::utils::error::FaultKind;

fn first_table(doc: &Document) -> NodeId {
    BreadthFirst::new(doc, doc.root().unwrap())
        .find(|&id| matches!(doc.tag(id), Some(Tag::Table)))
        .unwrap()
}

fn table_with_rows(rows: &[&[Option<&str>]]) -> Document {
    let mut doc = Document::with_root("table");
    let table = doc.root().unwrap();
    for row in rows {
        let tr = doc.append_element(table, "tr", &[]).unwrap();
        for span in row.iter() {
            match span {
                Some(v) => doc.append_element(tr, "td", &[("colspan", v)]).unwrap(),
                None => doc.append_element(tr, "td", &[]).unwrap(),
            };
        }
    }
    doc
}

// ============================================================================
// Column counting
// ============================================================================

#[test]
fn test_columns_widest_row_with_colspan() {
    let doc = table_with_rows(&[&[Some("2"), None], &[None, None], &[None]]);
    assert_eq!(count_columns(&doc, doc.root().unwrap()), 3);
}

#[test]
fn test_columns_bad_colspans_count_as_one() {
    let doc = table_with_rows(&[&[Some("0"), Some("-3"), Some("abc"), Some("")]]);
    assert_eq!(count_columns(&doc, doc.root().unwrap()), 4);
}

#[test]
fn test_columns_colspan_capped() {
    let doc = table_with_rows(&[&[Some("5000"), None]]);
    assert_eq!(
        count_columns(&doc, doc.root().unwrap()),
        MAX_COLSPAN as usize + 1
    );
}

#[test]
fn test_columns_without_rows() {
    let doc = Document::with_root("table");
    assert_eq!(count_columns(&doc, doc.root().unwrap()), 1);
}

#[test]
fn test_columns_enter_sections() {
    let doc = parse_html(
        "<table><thead><tr><th>a</th><th>b</th></tr></thead>\
         <tbody><tr><td>1</td><td>2</td><td>3</td></tr></tbody>\
         <tfoot><tr><td>f</td></tr></tfoot></table>",
    )
    .unwrap();
    let table = first_table(&doc);
    assert_eq!(count_columns(&doc, table), 3);
    assert_eq!(table_rows(&doc, table).len(), 3);
}

#[test]
fn test_columns_ignore_nested_table() {
    let doc = parse_html(
        "<table><tr><td>a<table><tr><td>1</td><td>2</td><td>3</td></tr></table></td></tr></table>",
    )
    .unwrap();
    let outer = first_table(&doc);
    assert_eq!(count_columns(&doc, outer), 1);
    assert_eq!(table_rows(&doc, outer).len(), 1);
}

// ============================================================================
// Image-only detection
// ============================================================================

#[test]
fn test_image_only_tables() {
    let yes = parse_html(
        "<table><tr><td><img src=a.png></td><td> <img src=b.png> </td></tr></table>",
    )
    .unwrap();
    assert!(is_image_only(&yes, first_table(&yes)));

    let captioned = parse_html(
        "<table><caption>Pictures</caption><tr><td><img src=a.png></td></tr></table>",
    )
    .unwrap();
    assert!(is_image_only(&captioned, first_table(&captioned)));
}

#[test]
fn test_not_image_only() {
    for html in [
        "<table><tr><td><img src=a.png></td><td>text</td></tr></table>",
        "<table><tr><td><span><img src=a.png></span></td></tr></table>",
        "<table><tr><td> </td></tr></table>",
        "<table></table>",
    ] {
        let doc = parse_html(html).unwrap();
        assert!(!is_image_only(&doc, first_table(&doc)), "{}", html);
    }
}

// ============================================================================
// Rendering
// ============================================================================

#[test]
fn test_generic_table() {
    let latex =
        html_to_latex("<table><tr><th>A</th><th>B</th></tr><tr><td>1</td><td>2</td></tr></table>")
            .unwrap();
    assert_eq!(
        latex,
        "\\begin{table}[h]\n\\centering\n\\begin{tabular}{|l|l|}\n\\hline\n\
         \\textbf{A} & \\textbf{B} \\\\ \\hline\n\
         1 & 2 \\\\ \\hline\n\
         \\end{tabular}\n\\caption{Table 1}\n\\label{table_1}\n\\end{table}"
    );
}

#[test]
fn test_colspan_padding() {
    let latex = html_to_latex(
        "<table><tr><td colspan=\"3\">wide</td></tr><tr><td>a</td><td>b</td><td>c</td></tr></table>",
    )
    .unwrap();
    assert!(latex.contains("\\begin{tabular}{|l|l|l|}"));
    assert!(latex.contains("wide & & \\\\ \\hline\n"));
    assert!(latex.contains("a & b & c \\\\ \\hline\n"));
}

#[test]
fn test_colspan_then_cell() {
    let latex =
        html_to_latex("<table><tr><td colspan=2>x</td><td>y</td></tr></table>").unwrap();
    assert!(latex.contains("x & & y \\\\ \\hline"));
}

#[test]
fn test_caption_and_id() {
    let latex = html_to_latex(
        "<table id=\"t:1\"><caption>Results   50%</caption><tr><td>x</td></tr></table>",
    )
    .unwrap();
    assert!(latex.contains("\\caption{Results 50\\%}\n\\label{t:1}"));
    assert!(!latex.contains("Table 1"));
}

#[test]
fn test_tables_numbered() {
    let latex = html_to_latex(
        "<table><tr><td>a</td></tr></table><table><tr><td>b</td></tr></table>",
    )
    .unwrap();
    assert!(latex.contains("\\caption{Table 1}\n\\label{table_1}"));
    assert!(latex.contains("\\caption{Table 2}\n\\label{table_2}"));
}

#[test]
fn test_nested_table() {
    let latex = html_to_latex(
        "<table><tr><td>out<table><tr><td>in</td></tr></table></td><td>z</td></tr></table>",
    )
    .unwrap();
    assert!(latex.contains("\\begin{tabular}{|l|l|}"));
    assert!(latex.contains(
        "out \\begin{tabular}{|l|}\n\\hline\nin \\\\ \\hline\n\\end{tabular} & z \\\\ \\hline\n"
    ));
    assert_eq!(latex.matches("\\begin{table}").count(), 1);
    assert_eq!(latex.matches("\\caption{").count(), 1);
    assert!(latex.contains("\\caption{Table 1}"));
}

#[test]
fn test_image_only_table_becomes_figure() {
    let latex = html_to_latex(
        "<table><tr><td><img src=\"a.png\"></td><td><img src=\"b.png\"></td></tr></table>",
    )
    .unwrap();
    assert_eq!(
        latex,
        "\\begin{figure}[htbp]\n\\centering\n\\begin{tabular}{cc}\n\
         \\includegraphics[width=0.45\\linewidth]{a.png} & \
         \\includegraphics[width=0.45\\linewidth]{b.png} \\\\\n\
         \\end{tabular}\n\\caption{Figure 1}\n\\label{figure_1}\n\\end{figure}"
    );
}

#[test]
fn test_image_table_caption_and_counters() {
    let latex = html_to_latex(
        "<table id=\"grid\"><caption>Two &amp; three</caption>\
         <tr><td><img src=\"a.png\"></td><td><img src=\"b.png\"></td><td><img src=\"c.png\"></td></tr></table>\
         <table><tr><td>data</td></tr></table>",
    )
    .unwrap();
    assert!(latex.contains("width=0.3\\linewidth"));
    assert!(latex.contains("\\caption{Two \\& three}\n\\label{grid}"));
    // figure and table counters are independent
    assert!(latex.contains("\\caption{Table 1}"));
}

#[test]
fn test_borderless_tables() {
    let options = H2LOptions {
        table_borders: false,
        ..Default::default()
    };
    let out = html_to_latex_with_options(
        "<table><tr><td>a</td><td>b</td></tr></table>",
        &options,
        &PassthroughImageResolver,
    )
    .unwrap();
    assert!(out.content.contains("\\begin{tabular}{ll}\na & b \\\\\n\\end{tabular}"));
    assert!(!out.content.contains("\\hline"));
}

#[test]
fn test_header_bold_not_doubled() {
    let latex =
        html_to_latex("<table><tr><th style=\"font-weight:bold\">H</th></tr></table>").unwrap();
    assert!(latex.contains("\\hline\n\\textbf{H} \\\\"));
    assert!(!latex.contains("\\textbf{\\textbf"));
}

#[test]
fn test_table_resets_formatting() {
    let latex =
        html_to_latex("<div style=\"font-weight:bold\"><table><tr><td>x</td></tr></table></div>")
            .unwrap();
    // bold is inherited by the cell and reopened inside the tabular
    assert!(latex.contains("\\hline\n\\textbf{x} \\\\ \\hline\n"));
}

#[test]
fn test_cell_braces_balanced() {
    let latex = html_to_latex(
        "<table><tr><td><span style=\"color:red\"><i>x</i></span></td><td>y</td></tr></table>",
    )
    .unwrap();
    assert!(latex.contains("\\textcolor[HTML]{FF0000}{\\textit{x}} & y \\\\ \\hline"));
}

#[test]
fn test_stray_text_in_table_skeleton() {
    let mut doc = Document::with_root("body");
    let body = doc.root().unwrap();
    let table = doc.append_element(body, "table", &[]).unwrap();
    doc.append_text(table, "stray").unwrap();
    let tr = doc.append_element(table, "tr", &[]).unwrap();
    let td = doc.append_element(tr, "td", &[]).unwrap();
    doc.append_text(td, "cell").unwrap();

    let out = convert_document(&doc, &H2LOptions::default(), &PassthroughImageResolver).unwrap();
    assert!(!out.content.contains("stray"));
    assert!(out.content.contains("cell \\\\ \\hline"));
    assert!(out
        .warnings
        .iter()
        .any(|w| w.kind == FaultKind::TableStructure));
}
