//! Utility modules
//!
//! This module contains utilities and helpers:
//! - Diagnostics for HTML input
//! - Error types and result types

pub mod diagnostics;
pub mod error;

// Re-export commonly used items
pub use diagnostics::{check_html, check_html_str, format_diagnostics, CheckResult, Diagnostic, DiagnosticLevel};
pub use error::{
    ConversionError, ConversionOutput, ConversionResult, ConversionWarning, FaultChannel, FaultKind,
};
