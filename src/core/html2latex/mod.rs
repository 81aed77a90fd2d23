//! HTML to LaTeX converter
//!
//! Parses HTML with `html5ever`, walks the tree depth-first with inline styles cascaded
//! through a [`StyleArena`], and emits LaTeX through a [`ConverterState`].

pub mod buffer;
pub mod context;
mod markup;
pub mod table;

pub use buffer::OutputBuffer;
pub use context::{ConverterState, H2LOptions};

use crate::core::dom::Document;
use crate::core::html::parse_html;
use crate::core::style::StyleArena;
use crate::core::walker::{find_title, walk_styled};
use crate::features::images::{ImageResolver, PassthroughImageResolver};
use crate::utils::error::{ConversionError, ConversionOutput, ConversionResult};

/// Convert a parsed document.
///
/// Skipped constructs come back as warnings; structural and allocation failures are
/// errors.
pub fn convert_document(
    doc: &Document,
    options: &H2LOptions,
    resolver: &dyn ImageResolver,
) -> ConversionResult<ConversionOutput> {
    let root = doc
        .root()
        .ok_or_else(|| ConversionError::malformed("document has no root element"))?;

    let mut arena = StyleArena::new();
    let base = arena.root();
    let mut state = ConverterState::new(options.clone(), resolver)?;
    walk_styled(doc, root, &mut arena, &base, options.important_policy, &mut state)?;

    log::debug!(
        "converted {} tables, {} figures, {} images; {} style allocations",
        state.tables,
        state.figures,
        state.images,
        arena.allocations()
    );

    let (mut content, warnings) = state.finish()?;
    if options.full_document {
        let title = options.title.clone().or_else(|| find_title(doc));
        content = wrap_in_document(&content, options, title.as_deref())?;
    }
    Ok(ConversionOutput::with_warnings(content, warnings))
}

/// Convert HTML to a LaTeX fragment
pub fn html_to_latex(html: &str) -> ConversionResult<String> {
    html_to_latex_with_options(html, &H2LOptions::default(), &PassthroughImageResolver)
        .map(|out| out.content)
}

/// Convert HTML with options and an image resolver, keeping the warnings
pub fn html_to_latex_with_options(
    html: &str,
    options: &H2LOptions,
    resolver: &dyn ImageResolver,
) -> ConversionResult<ConversionOutput> {
    let doc = parse_html(html)?;
    convert_document(&doc, options, resolver)
}

/// Convert an HTML document to a standalone LaTeX document
pub fn html_document_to_latex(html: &str) -> ConversionResult<String> {
    html_to_latex_with_options(html, &H2LOptions::full_document(), &PassthroughImageResolver)
        .map(|out| out.content)
}

fn escaped(text: &str) -> ConversionResult<String> {
    let mut buf = OutputBuffer::new();
    buf.append_escaped(text)?;
    Ok(buf.into_string())
}

fn wrap_in_document(
    content: &str,
    options: &H2LOptions,
    title: Option<&str>,
) -> ConversionResult<String> {
    let mut doc = OutputBuffer::with_capacity(content.len() + 512)?;

    let doc_class = if options.document_class.is_empty() {
        "article"
    } else {
        &options.document_class
    };
    doc.append(&format!("\\documentclass{{{}}}\n", doc_class))?;

    doc.append("\\usepackage[utf8]{inputenc}\n")?;
    doc.append("\\usepackage[T1]{fontenc}\n")?;
    doc.append("\\usepackage{graphicx}\n")?;
    doc.append("\\usepackage{hyperref}\n")?;
    doc.append("\\usepackage{xcolor}\n")?;
    doc.append("\\usepackage{textcomp}\n")?;

    if let Some(title) = title {
        doc.append(&format!("\\title{{{}}}\n", escaped(title)?))?;
    }
    if let Some(ref author) = options.author {
        doc.append(&format!("\\author{{{}}}\n", escaped(author)?))?;
    }

    doc.append("\n\\begin{document}\n\n")?;
    if title.is_some() {
        doc.append("\\maketitle\n\n")?;
    }
    doc.append(content)?;
    doc.append("\n\n\\end{document}\n")?;

    Ok(doc.into_string())
}
