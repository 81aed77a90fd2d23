//! Error handling for htlatex conversions
//!
//! Every fallible operation returns a [`ConversionResult`]. Faults carry a kind from a
//! closed taxonomy, a message and the source location where they were raised.
//! Non-fatal faults (skipped constructs) are collected as [`ConversionWarning`]s.

use std::fmt;
use std::panic::Location;

use thiserror::Error;

/// Closed taxonomy of fault kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error)]
pub enum FaultKind {
    #[error("out of memory")]
    OutOfMemory,
    #[error("buffer overflow")]
    BufferOverflow,
    #[error("invalid argument")]
    InvalidArgument,
    #[error("null argument")]
    NullArgument,
    #[error("I/O error")]
    Io,
    #[error("parse error")]
    Parse,
    #[error("malformed document")]
    MalformedDocument,
    #[error("unsupported feature")]
    Unsupported,
    #[error("invalid CSS value")]
    CssValue,
    #[error("table structure error")]
    TableStructure,
    #[error("image error")]
    Image,
    #[error("internal invariant violated")]
    InternalInvariant,
}

impl FaultKind {
    /// Faults that abort the whole conversion instead of skipping one construct
    pub fn is_fatal(self) -> bool {
        matches!(
            self,
            FaultKind::OutOfMemory
                | FaultKind::BufferOverflow
                | FaultKind::NullArgument
                | FaultKind::MalformedDocument
                | FaultKind::InternalInvariant
        )
    }
}

/// Conversion error type
#[derive(Debug, Clone, Error)]
#[error("{kind}: {message}")]
pub struct ConversionError {
    pub kind: FaultKind,
    pub message: String,
    /// Where in this crate the fault was raised
    pub location: Option<&'static Location<'static>>,
}

/// Result type for conversion operations
pub type ConversionResult<T> = Result<T, ConversionError>;

// Convenience constructors for errors
impl ConversionError {
    #[track_caller]
    pub fn new(kind: FaultKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            location: Some(Location::caller()),
        }
    }

    #[track_caller]
    pub fn out_of_memory(what: impl Into<String>) -> Self {
        Self::new(FaultKind::OutOfMemory, what)
    }

    #[track_caller]
    pub fn overflow(what: impl Into<String>) -> Self {
        Self::new(FaultKind::BufferOverflow, what)
    }

    #[track_caller]
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::new(FaultKind::InvalidArgument, message)
    }

    #[track_caller]
    pub fn null(message: impl Into<String>) -> Self {
        Self::new(FaultKind::NullArgument, message)
    }

    #[track_caller]
    pub fn parse(message: impl Into<String>) -> Self {
        Self::new(FaultKind::Parse, message)
    }

    #[track_caller]
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::new(FaultKind::MalformedDocument, message)
    }

    #[track_caller]
    pub fn unsupported(feature: impl Into<String>) -> Self {
        Self::new(FaultKind::Unsupported, feature)
    }

    #[track_caller]
    pub fn css_value(message: impl Into<String>) -> Self {
        Self::new(FaultKind::CssValue, message)
    }

    #[track_caller]
    pub fn image(message: impl Into<String>) -> Self {
        Self::new(FaultKind::Image, message)
    }

    #[track_caller]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(FaultKind::InternalInvariant, message)
    }

    pub fn is_fatal(&self) -> bool {
        self.kind.is_fatal()
    }

    /// `file:line` of the raise site, if recorded
    pub fn location_string(&self) -> Option<String> {
        self.location
            .map(|loc| format!("{}:{}", loc.file(), loc.line()))
    }
}

impl From<std::io::Error> for ConversionError {
    #[track_caller]
    fn from(err: std::io::Error) -> Self {
        ConversionError::new(FaultKind::Io, err.to_string())
    }
}

impl From<std::collections::TryReserveError> for ConversionError {
    #[track_caller]
    fn from(err: std::collections::TryReserveError) -> Self {
        ConversionError::out_of_memory(err.to_string())
    }
}

impl From<indexmap::TryReserveError> for ConversionError {
    #[track_caller]
    fn from(err: indexmap::TryReserveError) -> Self {
        ConversionError::out_of_memory(err.to_string())
    }
}

/// Call-scope fault slot holding at most one fault.
///
/// Callers clear it before an operation that may record a new fault and may take a
/// snapshot first so that probing does not disturb a fault an outer caller reported.
#[derive(Debug, Default)]
pub struct FaultChannel {
    current: Option<ConversionError>,
}

/// Saved state of a [`FaultChannel`]
#[derive(Debug, Clone)]
pub struct FaultSnapshot(Option<ConversionError>);

impl FaultChannel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a fault, replacing any previous one
    pub fn record(&mut self, err: ConversionError) {
        self.current = Some(err);
    }

    pub fn clear(&mut self) {
        self.current = None;
    }

    pub fn is_set(&self) -> bool {
        self.current.is_some()
    }

    pub fn current(&self) -> Option<&ConversionError> {
        self.current.as_ref()
    }

    pub fn take(&mut self) -> Option<ConversionError> {
        self.current.take()
    }

    pub fn snapshot(&self) -> FaultSnapshot {
        FaultSnapshot(self.current.clone())
    }

    pub fn restore(&mut self, snapshot: FaultSnapshot) {
        self.current = snapshot.0;
    }
}

/// Conversion warnings (non-fatal issues)
#[derive(Debug, Clone)]
pub struct ConversionWarning {
    pub kind: FaultKind,
    pub message: String,
    /// Tag of the element being converted when the warning was raised
    pub element: Option<String>,
}

impl ConversionWarning {
    pub fn new(kind: FaultKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            element: None,
        }
    }

    pub fn from_error(err: &ConversionError, element: Option<&str>) -> Self {
        Self {
            kind: err.kind,
            message: err.message.clone(),
            element: element.map(str::to_string),
        }
    }
}

impl fmt::Display for ConversionWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(ref el) = self.element {
            write!(f, "[{}] <{}>: {}", self.kind, el, self.message)
        } else {
            write!(f, "[{}] {}", self.kind, self.message)
        }
    }
}

/// Conversion output with optional warnings
#[derive(Debug, Clone)]
pub struct ConversionOutput {
    /// The converted content
    pub content: String,
    /// Any warnings generated during conversion
    pub warnings: Vec<ConversionWarning>,
}

impl ConversionOutput {
    pub fn new(content: String) -> Self {
        Self {
            content,
            warnings: Vec::new(),
        }
    }

    pub fn with_warnings(content: String, warnings: Vec<ConversionWarning>) -> Self {
        Self { content, warnings }
    }

    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }

    /// Get warnings as formatted strings.
    pub fn format_warnings(&self) -> Vec<String> {
        self.warnings.iter().map(|w| w.to_string()).collect()
    }
}
