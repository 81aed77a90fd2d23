//! Output buffer and LaTeX escaping
//!
//! Growth is amortized doubling with overflow checks; when doubling would pass the
//! allocation limit the buffer grows to the exact size needed instead. Allocation
//! failure surfaces as `OutOfMemory` and leaves the existing content untouched.
//!
//! Each escaping transform scans for the next special byte, copies the plain run before
//! it in one piece and emits the substitution. All special bytes are ASCII, so runs are
//! always split on UTF-8 boundaries.

use crate::utils::error::{ConversionError, ConversionResult};

/// Initial capacity for output buffer (reduces reallocations)
const INITIAL_BUFFER_CAPACITY: usize = 1024;

/// Largest allocation Rust permits
const MAX_CAPACITY: usize = isize::MAX as usize;

/// General text: every LaTeX metacharacter becomes a safe sequence
fn text_substitution(b: u8) -> Option<&'static str> {
    Some(match b {
        b'\\' => "\\textbackslash{}",
        b'{' => "\\{",
        b'}' => "\\}",
        b'&' => "\\&",
        b'%' => "\\%",
        b'$' => "\\$",
        b'#' => "\\#",
        b'_' => "\\_",
        b'^' => "\\textasciicircum{}",
        b'~' => "\\textasciitilde{}",
        b'<' => "\\textless{}",
        b'>' => "\\textgreater{}",
        b'\n' | b'\r' => " ",
        _ => return None,
    })
}

/// File paths and labels: never produces a brace or a backslash
fn path_substitution(b: u8) -> Option<&'static str> {
    match b {
        b'\\' => Some("/"),
        b'{' | b'}' | b'%' | b'$' | b'^' | b'~' | b'#' | b'&' => Some("_"),
        b if b < 0x20 || b == 0x7f => Some("_"),
        _ => None,
    }
}

/// `\href` targets
fn url_substitution(b: u8) -> Option<&'static str> {
    match b {
        b'%' => Some("\\%"),
        b'#' => Some("\\#"),
        b'\\' => Some("/"),
        b'{' => Some("%7B"),
        b'}' => Some("%7D"),
        b if b < 0x20 || b == 0x7f => Some(""),
        _ => None,
    }
}

/// Growable LaTeX output
#[derive(Debug, Default, Clone)]
pub struct OutputBuffer {
    text: String,
}

impl OutputBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> ConversionResult<Self> {
        let mut buf = Self::new();
        buf.text.try_reserve_exact(capacity)?;
        Ok(buf)
    }

    /// Make room for `additional` more bytes
    pub fn reserve(&mut self, additional: usize) -> ConversionResult<()> {
        let len = self.text.len();
        let required = len
            .checked_add(additional)
            .filter(|&r| r <= MAX_CAPACITY)
            .ok_or_else(|| {
                ConversionError::overflow(format!(
                    "output of {} bytes cannot grow by {}",
                    len, additional
                ))
            })?;
        let capacity = self.text.capacity();
        if required <= capacity {
            return Ok(());
        }

        let target = match capacity.checked_mul(2) {
            Some(doubled) if doubled <= MAX_CAPACITY => doubled.max(required),
            _ => required,
        }
        .max(INITIAL_BUFFER_CAPACITY.min(MAX_CAPACITY));

        self.text.try_reserve_exact(target - len).map_err(|e| {
            ConversionError::out_of_memory(format!("growing output to {} bytes: {}", target, e))
        })
    }

    pub fn append(&mut self, s: &str) -> ConversionResult<()> {
        self.reserve(s.len())?;
        self.text.push_str(s);
        Ok(())
    }

    /// Append one ASCII byte
    pub fn append_byte(&mut self, b: u8) -> ConversionResult<()> {
        if !b.is_ascii() {
            return Err(ConversionError::invalid(format!(
                "byte 0x{:02x} is not ASCII",
                b
            )));
        }
        self.reserve(1)?;
        self.text.push(b as char);
        Ok(())
    }

    fn append_mapped(
        &mut self,
        s: &str,
        substitute: fn(u8) -> Option<&'static str>,
    ) -> ConversionResult<()> {
        let bytes = s.as_bytes();
        // at least the plain text goes in; substitutions grow on demand
        self.reserve(s.len())?;

        let mut run_start = 0;
        let mut pos = 0;
        while let Some(offset) = bytes[pos..].iter().position(|&b| substitute(b).is_some()) {
            let at = pos + offset;
            self.append(&s[run_start..at])?;
            if let Some(replacement) = substitute(bytes[at]) {
                self.append(replacement)?;
            }
            pos = at + 1;
            run_start = pos;
        }
        self.append(&s[run_start..])
    }

    /// Append text with every LaTeX metacharacter escaped
    pub fn append_escaped(&mut self, s: &str) -> ConversionResult<()> {
        self.append_mapped(s, text_substitution)
    }

    /// Append a file path or label
    pub fn append_path_escaped(&mut self, s: &str) -> ConversionResult<()> {
        self.append_mapped(s, path_substitution)
    }

    /// Append a URL for `\href`
    pub fn append_url_escaped(&mut self, s: &str) -> ConversionResult<()> {
        self.append_mapped(s, url_substitution)
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn len(&self) -> usize {
        self.text.len()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.text.capacity()
    }

    pub fn ends_with(&self, s: &str) -> bool {
        self.text.ends_with(s)
    }

    /// True at the start of output or right after whitespace
    pub fn at_space(&self) -> bool {
        self.text
            .chars()
            .last()
            .map(char::is_whitespace)
            .unwrap_or(true)
    }

    /// Add a newline if not already at one
    pub fn newline(&mut self) -> ConversionResult<()> {
        if !self.text.is_empty() && !self.text.ends_with('\n') {
            self.append("\n")?;
        }
        Ok(())
    }

    /// Ensure there's a paragraph break (blank line).
    ///
    /// A fresh `\item ` already starts a paragraph and is left as is.
    pub fn ensure_paragraph_break(&mut self) -> ConversionResult<()> {
        if self.text.ends_with("\\item ") {
            return Ok(());
        }
        let trimmed = self.text.trim_end_matches(' ').len();
        self.text.truncate(trimmed);
        if self.text.is_empty() || self.text.ends_with("\n\n") {
            return Ok(());
        }
        if self.text.ends_with('\n') {
            self.append("\n")
        } else {
            self.append("\n\n")
        }
    }

    /// Remove trailing spaces (not newlines)
    pub fn trim_trailing_spaces(&mut self) {
        let trimmed = self.text.trim_end_matches(' ').len();
        self.text.truncate(trimmed);
    }

    pub fn into_string(self) -> String {
        self.text
    }
}
