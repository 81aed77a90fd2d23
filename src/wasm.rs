//! WASM bindings for htlatex
//!
//! This module provides JavaScript-accessible functions for HTML to LaTeX conversion.

#[cfg(feature = "wasm")]
use std::collections::HashMap;

#[cfg(feature = "wasm")]
use wasm_bindgen::prelude::*;

#[cfg(feature = "wasm")]
use serde::{Deserialize, Serialize};

#[cfg(feature = "wasm")]
use crate::{H2LOptions, MemoryImageResolver};

/// Conversion options exposed to WASM
#[cfg(feature = "wasm")]
#[derive(Serialize, Deserialize, Default)]
pub struct HtmlConvertOptions {
    #[serde(flatten)]
    pub options: H2LOptions,
    /// Downloaded images: `src` value to the path used in `\includegraphics`
    #[serde(default)]
    pub images: HashMap<String, String>,
}

/// Conversion result with additional metadata
#[cfg(feature = "wasm")]
#[derive(Serialize, Deserialize)]
pub struct ConvertResult {
    /// The converted output
    pub output: String,
    /// Whether the conversion was successful
    pub success: bool,
    /// Error message if conversion failed
    pub error: Option<String>,
    /// Warnings during conversion
    pub warnings: Vec<String>,
}

/// Initialize panic hook for better error messages in browser console
#[cfg(feature = "wasm")]
#[wasm_bindgen(start)]
pub fn init() {
    console_error_panic_hook::set_once();
}

/// Convert an HTML fragment to LaTeX; errors become an empty string
#[cfg(feature = "wasm")]
#[wasm_bindgen(js_name = "htmlToLatex")]
pub fn html_to_latex_wasm(input: &str) -> String {
    crate::html_to_latex(input).unwrap_or_default()
}

/// Convert an HTML page to a standalone LaTeX document
#[cfg(feature = "wasm")]
#[wasm_bindgen(js_name = "htmlDocumentToLatex")]
pub fn html_document_to_latex_wasm(input: &str) -> String {
    crate::html_document_to_latex(input).unwrap_or_default()
}

/// Convert HTML to LaTeX with options
#[cfg(feature = "wasm")]
#[wasm_bindgen(js_name = "htmlToLatexWithOptions")]
pub fn html_to_latex_with_options_wasm(input: &str, options: JsValue) -> JsValue {
    let opts: HtmlConvertOptions = serde_wasm_bindgen::from_value(options).unwrap_or_default();

    let mut resolver = MemoryImageResolver::with_path_fallback();
    for (src, path) in &opts.images {
        resolver.add_image(src, path);
    }

    let result = match crate::html_to_latex_with_options(input, &opts.options, &resolver) {
        Ok(out) => ConvertResult {
            warnings: out.format_warnings(),
            output: out.content,
            success: true,
            error: None,
        },
        Err(e) => ConvertResult {
            output: String::new(),
            success: false,
            error: Some(format!("Conversion failed: {}", e)),
            warnings: vec![],
        },
    };

    serde_wasm_bindgen::to_value(&result).unwrap_or(JsValue::NULL)
}

/// Get version information
#[cfg(feature = "wasm")]
#[wasm_bindgen(js_name = "getVersion")]
pub fn get_version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

/// Check HTML for constructs the converter drops or degrades
#[cfg(feature = "wasm")]
#[wasm_bindgen(js_name = "checkHtml")]
pub fn check_html_wasm(input: &str) -> JsValue {
    use crate::diagnostics::DiagnosticLevel;

    let summary = match crate::diagnostics::check_html_str(input) {
        Ok(result) => {
            let mut summary = CheckSummary {
                has_errors: result.has_errors(),
                ..Default::default()
            };
            for d in &result.diagnostics {
                match d.level {
                    DiagnosticLevel::Error => summary.errors.push(d.message.clone()),
                    DiagnosticLevel::Warning => summary.warnings.push(d.message.clone()),
                    DiagnosticLevel::Info => summary.infos.push(d.message.clone()),
                }
            }
            summary
        }
        Err(e) => CheckSummary {
            errors: vec![e.to_string()],
            has_errors: true,
            ..Default::default()
        },
    };
    serde_wasm_bindgen::to_value(&summary).unwrap_or(JsValue::NULL)
}

/// Summary of HTML check results
#[cfg(feature = "wasm")]
#[derive(Serialize, Deserialize, Default)]
pub struct CheckSummary {
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
    pub infos: Vec<String>,
    pub has_errors: bool,
}
