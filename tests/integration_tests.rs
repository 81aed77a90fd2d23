//! Integration tests for htlatex HTML to LaTeX conversion

use pretty_assertions::assert_eq;

use htlatex::{
    diagnostics::{check_html_str, DiagnosticLevel},
    html_document_to_latex, html_to_latex, html_to_latex_with_options, FaultKind, H2LOptions,
    ImportantPolicy, MemoryImageResolver, PassthroughImageResolver,
};

fn convert_with(html: &str, options: &H2LOptions) -> htlatex::ConversionOutput {
    html_to_latex_with_options(html, options, &PassthroughImageResolver).unwrap()
}

// ============================================================================
// CSS cascade
// ============================================================================

mod cascade {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_inherited_color_not_reopened() {
        let latex = html_to_latex(
            r#"<p style="color:red">a <span>b</span> <span style="color:#f00">c</span></p>"#,
        )
        .unwrap();
        assert_eq!(latex, r"\textcolor[HTML]{FF0000}{a b c}");
    }

    #[test]
    fn test_background_does_not_inherit() {
        let latex =
            html_to_latex(r#"<p style="background-color:yellow">a <b>b</b></p>"#).unwrap();
        assert_eq!(latex, r"\colorbox[HTML]{FFFF00}{a \textbf{b}}");
    }

    #[test]
    fn test_local_color_overrides_inherited() {
        let latex =
            html_to_latex(r#"<p style="color:red">a <span style="color:blue">b</span></p>"#)
                .unwrap();
        assert_eq!(
            latex,
            r"\textcolor[HTML]{FF0000}{a \textcolor[HTML]{0000FF}{b}}"
        );
    }

    #[test]
    fn test_important_policy() {
        let html = r#"<p style="color:red !important"><span style="color:blue">x</span></p>"#;

        let local = convert_with(html, &H2LOptions::default());
        assert_eq!(
            local.content,
            r"\textcolor[HTML]{FF0000}{\textcolor[HTML]{0000FF}{x}}"
        );

        let options = H2LOptions {
            important_policy: ImportantPolicy::InheritedImportantWins,
            ..Default::default()
        };
        let inherited = convert_with(html, &options);
        assert_eq!(inherited.content, r"\textcolor[HTML]{FF0000}{x}");
    }

    #[test]
    fn test_formatting_order() {
        let latex = html_to_latex(
            r#"<span style="font-weight:bold; color:green; font-style:italic; text-decoration:underline">x</span>"#,
        )
        .unwrap();
        assert_eq!(
            latex,
            r"\textcolor[HTML]{008000}{\textbf{\textit{\underline{x}}}}"
        );
    }

    #[test]
    fn test_font_weight_numbers() {
        assert_eq!(
            html_to_latex(r#"<span style="font-weight:700">x</span>"#).unwrap(),
            r"\textbf{x}"
        );
        assert_eq!(
            html_to_latex(r#"<span style="font-weight:400">x</span>"#).unwrap(),
            "x"
        );
    }
}

// ============================================================================
// Traversal
// ============================================================================

mod traversal {
    use super::*;
    use pretty_assertions::assert_eq;
    use htlatex::core::dom::Element;
    use htlatex::core::walker::BreadthFirst;
    use htlatex::{
        parse_html, walk_styled, ComputedStyle, ConversionResult, Document, Flow, NodeId,
        StyleArena, StyledVisitor, Tag,
    };

    #[derive(Default)]
    struct Trace {
        events: Vec<String>,
    }

    impl StyledVisitor for Trace {
        fn enter(
            &mut self,
            _doc: &Document,
            _node: NodeId,
            element: &Element,
            _style: &ComputedStyle,
        ) -> ConversionResult<Flow> {
            self.events.push(format!("<{}>", element.name));
            Ok(Flow::Continue)
        }

        fn text(
            &mut self,
            _doc: &Document,
            _node: NodeId,
            text: &str,
            style: &ComputedStyle,
        ) -> ConversionResult<Flow> {
            let color = style.get("color").unwrap_or("-");
            self.events.push(format!("{}:{}", text, color));
            Ok(Flow::Continue)
        }

        fn leave(
            &mut self,
            _doc: &Document,
            _node: NodeId,
            element: &Element,
            _style: &ComputedStyle,
        ) -> ConversionResult<()> {
            self.events.push(format!("</{}>", element.name));
            Ok(())
        }
    }

    #[test]
    fn test_document_order_and_cleanup() {
        let doc = parse_html(r#"<div style="color:red">a<span>b</span></div><p>c</p>"#).unwrap();
        let body = BreadthFirst::new(&doc, doc.root().unwrap())
            .find(|&n| matches!(doc.tag(n), Some(Tag::Body)))
            .unwrap();

        let mut arena = StyleArena::new();
        let base = arena.root();
        let mut trace = Trace::default();
        walk_styled(&doc, body, &mut arena, &base, ImportantPolicy::default(), &mut trace)
            .unwrap();

        assert_eq!(
            trace.events,
            vec![
                "<body>", "<div>", "a:red", "<span>", "b:red", "</span>", "</div>", "<p>",
                "c:-", "</p>", "</body>",
            ]
        );
        assert_eq!(arena.live(), 0);
        assert_eq!(arena.allocations(), arena.releases());
    }

    #[test]
    fn test_deep_nesting_does_not_recurse() {
        let depth = 3_000;
        let html = format!("{}x{}", "<span>".repeat(depth), "</span>".repeat(depth));
        let latex = html_to_latex(&html).unwrap();
        assert_eq!(latex, "x");
    }
}

// ============================================================================
// Text and escaping
// ============================================================================

mod text {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_metacharacters_escaped() {
        let latex = html_to_latex("<p>50% &amp; $5 #1 a_b {x} ~ ^ \\</p>").unwrap();
        assert_eq!(
            latex,
            r"50\% \& \$5 \#1 a\_b \{x\} \textasciitilde{} \textasciicircum{} \textbackslash{}"
        );
    }

    #[test]
    fn test_whitespace_collapsed() {
        let latex = html_to_latex("<p>  one\n\n   two\tthree  </p>").unwrap();
        assert_eq!(latex, "one two three");
    }

    #[test]
    fn test_whitespace_preserved_when_disabled() {
        let options = H2LOptions {
            collapse_whitespace: false,
            ..Default::default()
        };
        let out = convert_with("<span>a  b</span>", &options);
        assert_eq!(out.content, "a  b");
    }

    #[test]
    fn test_paragraphs_and_breaks() {
        let latex = html_to_latex("<p>one<br>two</p><p>three</p>").unwrap();
        assert_eq!(latex, "one\\\\\ntwo\n\nthree");
    }

    #[test]
    fn test_preformatted_is_verbatim() {
        let latex = html_to_latex("<pre>  a &amp; b\n  <b>c</b></pre>").unwrap();
        assert_eq!(latex, "\\begin{verbatim}\n  a & b\n  c\n\\end{verbatim}");
    }

    #[test]
    fn test_horizontal_rule() {
        let latex = html_to_latex("<p>a</p><hr><p>b</p>").unwrap();
        assert!(latex.contains("\\par\\noindent\\rule{\\textwidth}{0.4pt}\\par\n"));
    }

    #[test]
    fn test_script_and_style_skipped() {
        let latex =
            html_to_latex("<style>p{color:red}</style><p>x</p><script>var a = 1;</script>")
                .unwrap();
        assert_eq!(latex, "x");
    }
}

// ============================================================================
// Block structure
// ============================================================================

mod blocks {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_headings_and_labels() {
        let latex = html_to_latex(r#"<h1 id="intro">Intro</h1><p>Body</p><h3>Deep</h3>"#)
            .unwrap();
        assert_eq!(
            latex,
            "\\section{Intro}\\label{intro}\n\nBody\n\n\\subsubsection{Deep}"
        );
    }

    #[test]
    fn test_unsupported_heading_level() {
        let out = convert_with("<h6>tiny</h6>", &H2LOptions::default());
        assert_eq!(out.content, "tiny");
        assert_eq!(out.warnings.len(), 1);
        assert_eq!(out.warnings[0].kind, FaultKind::Unsupported);
    }

    #[test]
    fn test_unordered_list() {
        let latex = html_to_latex("<ul><li>a</li><li>b</li></ul>").unwrap();
        assert_eq!(latex, "\\begin{itemize}\n\\item a\n\\item b\n\\end{itemize}");
    }

    #[test]
    fn test_ordered_list_start() {
        let latex = html_to_latex(r#"<ol start="3"><li>x</li></ol>"#).unwrap();
        assert_eq!(
            latex,
            "\\begin{enumerate}\n\\setcounter{enumi}{2}\n\\item x\n\\end{enumerate}"
        );
    }

    #[test]
    fn test_paragraph_in_list_item() {
        let latex = html_to_latex("<ul><li><p>x</p></li></ul>").unwrap();
        assert_eq!(latex, "\\begin{itemize}\n\\item x\n\n\\end{itemize}");
    }

    #[test]
    fn test_description_list() {
        let latex = html_to_latex("<dl><dt>term</dt><dd>meaning</dd></dl>").unwrap();
        assert_eq!(
            latex,
            "\\begin{description}\n\\item[term] meaning\n\\end{description}"
        );
    }

    #[test]
    fn test_center_and_alignment() {
        let latex = html_to_latex(r#"<center>mid</center>"#).unwrap();
        assert_eq!(latex, "\\begin{center}\nmid\n\\end{center}");

        let latex = html_to_latex(r#"<p style="text-align:right">r</p>"#).unwrap();
        assert_eq!(latex, "\\begin{flushright}\nr\n\\end{flushright}");
    }
}

// ============================================================================
// Inline elements
// ============================================================================

mod inline {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_links() {
        assert_eq!(
            html_to_latex(r#"<a href="https://example.org/a%20b#top">site</a>"#).unwrap(),
            r"\href{https://example.org/a\%20b\#top}{site}"
        );
        assert_eq!(
            html_to_latex(r##"<a href="#sec">see</a>"##).unwrap(),
            r"\hyperref[sec]{see}"
        );
        assert_eq!(
            html_to_latex(r#"<a name="here">anchor</a>"#).unwrap(),
            r"\label{here}anchor"
        );
    }

    #[test]
    fn test_script_link_warns() {
        let out = convert_with(r#"<a href="javascript:go()">go</a>"#, &H2LOptions::default());
        assert_eq!(out.content, "go");
        assert_eq!(out.warnings[0].kind, FaultKind::Unsupported);
    }

    #[test]
    fn test_font_attributes() {
        let latex = html_to_latex(r#"<font color="blue" size="+2">x</font>"#).unwrap();
        assert_eq!(latex, r"\textcolor[HTML]{0000FF}{{\Large x}}");
    }

    #[test]
    fn test_font_size_attribute_saturates() {
        let latex = html_to_latex(r#"<font size="+2147483647">x</font>"#).unwrap();
        assert_eq!(latex, r"{\Huge x}");
    }

    #[test]
    fn test_huge_font_size_is_dropped() {
        let out = convert_with(
            r#"<span style="font-size:1e308in">x</span>"#,
            &H2LOptions::default(),
        );
        assert_eq!(out.content, "x");
        assert_eq!(out.warnings.len(), 1);
        assert_eq!(out.warnings[0].kind, FaultKind::CssValue);
    }

    #[test]
    fn test_css_color_beats_font_attribute() {
        let latex = html_to_latex(r#"<font color="blue" style="color:red">x</font>"#).unwrap();
        assert_eq!(latex, r"\textcolor[HTML]{FF0000}{x}");
    }

    #[test]
    fn test_code_sub_sup() {
        let latex = html_to_latex("<code>f</code> H<sub>2</sub>O x<sup>2</sup>").unwrap();
        assert_eq!(
            latex,
            r"\texttt{f} H\textsubscript{2}O x\textsuperscript{2}"
        );
    }

    #[test]
    fn test_nested_bold_once() {
        let latex = html_to_latex("<b>a <strong>b</strong></b>").unwrap();
        assert_eq!(latex, r"\textbf{a b}");
    }
}

// ============================================================================
// Formatting around block content
// ============================================================================

mod block_formatting {
    use super::*;
    use pretty_assertions::assert_eq;

    /// Contents of a balanced `{..}` group at the start of `s`, and what follows it
    fn brace_group(s: &str) -> Option<(&str, &str)> {
        let s = s.strip_prefix('{')?;
        let mut depth = 1;
        for (i, c) in s.char_indices() {
            match c {
                '{' => depth += 1,
                '}' => {
                    depth -= 1;
                    if depth == 0 {
                        return Some((&s[..i], &s[i + 1..]));
                    }
                }
                _ => {}
            }
        }
        None
    }

    /// Last brace argument of every `command` occurrence
    fn argument_bodies<'a>(latex: &'a str, command: &str) -> Vec<&'a str> {
        latex
            .match_indices(command)
            .filter_map(|(at, _)| {
                let mut rest = &latex[at + command.len()..];
                if rest.starts_with('[') {
                    rest = &rest[rest.find(']')? + 1..];
                }
                let mut body = None;
                while let Some((group, after)) = brace_group(rest) {
                    body = Some(group);
                    rest = after;
                }
                body
            })
            .collect()
    }

    fn assert_arguments_inline(latex: &str) {
        let commands = [
            "\\textcolor",
            "\\colorbox",
            "\\textbf",
            "\\textit",
            "\\underline",
            "\\texttt",
            "\\href",
            "\\hyperref",
            "\\section",
            "\\subsection",
        ];
        let blocks = [
            "\n\n",
            "\\begin{table}",
            "\\begin{figure}",
            "\\subsection",
            "\\begin{itemize}",
        ];
        for command in commands {
            for body in argument_bodies(latex, command) {
                for block in blocks {
                    assert!(
                        !body.contains(block),
                        "{:?} inside {} argument in {:?}",
                        block,
                        command,
                        latex
                    );
                }
            }
        }
    }

    #[test]
    fn test_color_around_paragraphs_is_a_group() {
        let latex = html_to_latex(r#"<div style="color:red"><p>a</p><p>b</p></div>"#).unwrap();
        assert_eq!(latex, "{\\color[HTML]{FF0000}\n\na\n\nb\n\n}");
        assert_arguments_inline(&latex);
    }

    #[test]
    fn test_inline_color_keeps_argument_form() {
        let latex = html_to_latex(r#"<div style="color:red">a <b>b</b></div>"#).unwrap();
        assert_eq!(latex, "\\textcolor[HTML]{FF0000}{a \\textbf{b}}");
    }

    #[test]
    fn test_bold_around_table() {
        let latex = html_to_latex(
            r#"<div style="font-weight:bold"><table><tr><td>x</td></tr></table></div>"#,
        )
        .unwrap();
        assert!(latex.starts_with("{\\bfseries\n\n\\begin{table}[h]"));
        assert!(latex.ends_with("\\end{table}\n\n}"));
        assert_arguments_inline(&latex);
    }

    #[test]
    fn test_italic_and_code_around_list() {
        let latex =
            html_to_latex("<i><ul><li>a</li><li><code><p>b</p></code></li></ul></i>").unwrap();
        assert!(latex.starts_with("{\\itshape \n\\begin{itemize}"));
        assert!(latex.contains("\\item {\\ttfamily\n\nb"));
        assert_arguments_inline(&latex);
    }

    #[test]
    fn test_link_around_heading() {
        let latex = html_to_latex(r#"<a href="http://x"><h2>T</h2></a>"#).unwrap();
        assert_eq!(latex, "\\href{http://x}{\\textbf{T}}");
        assert_arguments_inline(&latex);
    }

    #[test]
    fn test_paragraph_inside_heading() {
        let latex = html_to_latex("<h2>T<p>x</p></h2><p>after</p>").unwrap();
        assert!(latex.starts_with("\\subsection{T x"));
        assert!(latex.ends_with("}\n\nafter"));
        assert_arguments_inline(&latex);
    }

    #[test]
    fn test_underline_applied_per_paragraph() {
        let latex =
            html_to_latex(r#"<div style="text-decoration:underline"><p>a b</p><p>c</p></div>"#)
                .unwrap();
        assert_eq!(latex, "\\underline{a b}\n\n\\underline{c}");
    }

    #[test]
    fn test_background_applied_per_text_run() {
        let latex =
            html_to_latex(r#"<div style="background-color:yellow">x <p>y</p></div>"#).unwrap();
        assert_eq!(
            latex,
            "\\colorbox[HTML]{FFFF00}{x}\n\n\\colorbox[HTML]{FFFF00}{y}"
        );
    }

    #[test]
    fn test_table_inside_link_stays_bare() {
        let out = convert_with(
            r#"<a href="http://x"><table><tr><td><p>x</p></td></tr></table></a>"#,
            &H2LOptions::default(),
        );
        assert!(out.content.starts_with("\\href{http://x}{ \\begin{tabular}"));
        assert!(!out.content.contains("\\begin{table}"));
        assert!(out.warnings.is_empty());
        assert_arguments_inline(&out.content);
    }

    #[test]
    fn test_term_with_paragraph() {
        let latex = html_to_latex("<dl><dt><p>term</p></dt><dd>meaning</dd></dl>").unwrap();
        assert!(latex.contains("\\item[ term ] meaning"));
    }
}

// ============================================================================
// Images
// ============================================================================

mod images {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_block_image_becomes_figure() {
        let latex = html_to_latex(r#"<p><img src="cat.png" alt="A cat"></p>"#).unwrap();
        assert_eq!(
            latex,
            "\\begin{figure}[htbp]\n\\centering\n\\includegraphics{cat.png}\n\
             \\caption{A cat}\n\\label{figure_1}\n\\end{figure}"
        );
    }

    #[test]
    fn test_inline_image() {
        let latex =
            html_to_latex(r#"<p>a <img src="x.png" style="width:50%"> b</p>"#).unwrap();
        assert_eq!(latex, r"a \includegraphics[width=0.5\linewidth]{x.png} b");
    }

    #[test]
    fn test_missing_src_warns() {
        let out = convert_with(r#"<p>a <img alt="nothing"> b</p>"#, &H2LOptions::default());
        assert_eq!(out.content, "a b");
        assert_eq!(out.warnings.len(), 1);
        assert_eq!(out.warnings[0].kind, FaultKind::Image);
    }

    #[test]
    fn test_resolver_maps_sources() {
        let mut resolver = MemoryImageResolver::new();
        resolver.add_image("https://example.org/c.png", "img/c.png");
        let out = html_to_latex_with_options(
            r#"<p>x <img src="https://example.org/c.png"> <img src="other.png" alt="alt text"></p>"#,
            &H2LOptions::default(),
            &resolver,
        )
        .unwrap();
        assert!(out.content.contains(r"\includegraphics{img/c.png}"));
        assert!(out.content.ends_with("alt text"));
        assert_eq!(out.warnings.len(), 1);
    }
}

// ============================================================================
// Tables
// ============================================================================

mod tables {
    use super::*;
    use pretty_assertions::assert_eq;
    use htlatex::core::walker::BreadthFirst;

    #[test]
    fn test_table_with_sections() {
        let latex = html_to_latex(
            "<table><thead><tr><th>k</th><th>v</th></tr></thead>\
             <tbody><tr><td>a</td><td>1</td></tr></tbody></table>",
        )
        .unwrap();
        assert!(latex.starts_with("\\begin{table}[h]\n\\centering\n\\begin{tabular}{|l|l|}\n"));
        assert!(latex.contains("\\textbf{k} & \\textbf{v} \\\\ \\hline\na & 1 \\\\ \\hline\n"));
        assert!(latex.ends_with("\\end{table}"));
    }

    #[test]
    fn test_table_between_paragraphs() {
        let latex =
            html_to_latex("<p>before</p><table><tr><td>x</td></tr></table><p>after</p>").unwrap();
        assert!(latex.starts_with("before\n\n\\begin{table}[h]"));
        assert!(latex.ends_with("\\end{table}\n\nafter"));
    }

    #[test]
    fn test_public_column_count() {
        let doc = htlatex::parse_html(
            "<table><tr><td colspan=2>a</td><td>b</td></tr><tr><td>c</td></tr></table>",
        )
        .unwrap();
        let table = BreadthFirst::new(&doc, doc.root().unwrap())
            .find(|&n| matches!(doc.tag(n), Some(htlatex::Tag::Table)))
            .unwrap();
        assert_eq!(htlatex::count_columns(&doc, table), 3);
        assert!(!htlatex::is_image_only(&doc, table));
    }

    #[test]
    fn test_paragraph_in_cell_stays_inline() {
        let latex =
            html_to_latex("<table><tr><td><p>one</p><p>two</p></td></tr></table>").unwrap();
        assert!(latex.contains("\\hline\none two \\\\ \\hline\n"));
    }
}

// ============================================================================
// Warnings and diagnostics
// ============================================================================

mod warnings {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_unknown_tag_reported_once() {
        let out = convert_with("<foo>a</foo><foo>b</foo><bar>c</bar>", &H2LOptions::default());
        assert_eq!(out.content, "abc");
        assert_eq!(out.warnings.len(), 2);
        assert!(out.warnings.iter().all(|w| w.kind == FaultKind::Unsupported));
        assert_eq!(out.warnings[0].element.as_deref(), Some("foo"));
    }

    #[test]
    fn test_invalid_css_keeps_text() {
        let out = convert_with(
            r#"<span style="color:notacolor">x</span>"#,
            &H2LOptions::default(),
        );
        assert_eq!(out.content, "x");
        assert_eq!(out.warnings.len(), 1);
    }

    #[test]
    fn test_check_reports_degraded_constructs() {
        let result = check_html_str("<h6>x</h6><img><blink>y</blink>").unwrap();
        assert!(!result.is_empty());
        assert!(result
            .diagnostics
            .iter()
            .any(|d| d.level == DiagnosticLevel::Warning));
        assert!(result.diagnostics.iter().any(|d| d.message.contains("blink")));
    }

    #[test]
    fn test_check_clean_document() {
        let result = check_html_str("<p>plain <b>text</b></p>").unwrap();
        assert!(result.is_empty());
        assert!(!result.has_errors());
    }
}

// ============================================================================
// Full documents
// ============================================================================

mod document {
    use super::*;

    #[test]
    fn test_full_document_with_title() {
        let latex = html_document_to_latex(
            "<html><head><title>A &amp; B</title></head><body><p>x</p></body></html>",
        )
        .unwrap();
        assert!(latex.starts_with("\\documentclass{article}\n"));
        assert!(latex.contains("\\usepackage{graphicx}"));
        assert!(latex.contains("\\usepackage{xcolor}"));
        assert!(latex.contains("\\title{A \\& B}"));
        assert!(latex.contains("\\begin{document}\n\n\\maketitle\n\nx\n\n\\end{document}\n"));
        assert!(!latex.contains("A & B"));
    }

    #[test]
    fn test_full_document_options() {
        let options = H2LOptions {
            full_document: true,
            document_class: "report".to_string(),
            title: Some("Given".to_string()),
            author: Some("Ann".to_string()),
            ..Default::default()
        };
        let out = convert_with("<title>Ignored</title><p>x</p>", &options);
        assert!(out.content.starts_with("\\documentclass{report}\n"));
        assert!(out.content.contains("\\title{Given}\n\\author{Ann}\n"));
        assert!(!out.content.contains("Ignored"));
    }
}
