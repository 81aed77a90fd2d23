//! Style store
//!
//! A [`ComputedStyle`] is an insertion-ordered set of CSS declarations plus a bitmask
//! over the property kinds the converter acts on, so "is there a color here?" is a
//! single bit test. The mask is maintained on every mutation and always matches the
//! property set.

pub mod arena;
pub mod cascade;

use std::fmt;
use std::ops::{BitOr, BitOrAssign};

use indexmap::IndexMap;
use lazy_static::lazy_static;
use regex::Regex;

use crate::data::colors::color_to_hex;
use crate::utils::error::ConversionResult;

pub use arena::{StyleArena, StyleHandle};
pub use cascade::{is_inheritable, merge, ImportantPolicy};

/// Bitmask over tracked property kinds
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct PropertyKinds(u16);

impl PropertyKinds {
    pub const NONE: PropertyKinds = PropertyKinds(0);
    pub const BOLD: PropertyKinds = PropertyKinds(1 << 0);
    pub const ITALIC: PropertyKinds = PropertyKinds(1 << 1);
    pub const UNDERLINE: PropertyKinds = PropertyKinds(1 << 2);
    pub const COLOR: PropertyKinds = PropertyKinds(1 << 3);
    pub const BACKGROUND: PropertyKinds = PropertyKinds(1 << 4);
    pub const FONT_FAMILY: PropertyKinds = PropertyKinds(1 << 5);
    pub const FONT_SIZE: PropertyKinds = PropertyKinds(1 << 6);
    pub const TEXT_ALIGN: PropertyKinds = PropertyKinds(1 << 7);
    pub const BORDER: PropertyKinds = PropertyKinds(1 << 8);
    pub const MARGIN_TOP: PropertyKinds = PropertyKinds(1 << 9);
    pub const MARGIN_RIGHT: PropertyKinds = PropertyKinds(1 << 10);
    pub const MARGIN_BOTTOM: PropertyKinds = PropertyKinds(1 << 11);
    pub const MARGIN_LEFT: PropertyKinds = PropertyKinds(1 << 12);

    pub const MARGIN: PropertyKinds = PropertyKinds(
        Self::MARGIN_TOP.0 | Self::MARGIN_RIGHT.0 | Self::MARGIN_BOTTOM.0 | Self::MARGIN_LEFT.0,
    );

    /// Inline formatting kinds the converter wraps text in
    pub const FORMATTING: PropertyKinds = PropertyKinds(
        Self::BOLD.0 | Self::ITALIC.0 | Self::UNDERLINE.0 | Self::COLOR.0 | Self::BACKGROUND.0,
    );

    pub const fn bits(self) -> u16 {
        self.0
    }

    pub const fn contains(self, other: PropertyKinds) -> bool {
        self.0 & other.0 == other.0 && other.0 != 0
    }

    pub const fn intersects(self, other: PropertyKinds) -> bool {
        self.0 & other.0 != 0
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub fn insert(&mut self, other: PropertyKinds) {
        self.0 |= other.0;
    }

    pub fn remove(&mut self, other: PropertyKinds) {
        self.0 &= !other.0;
    }

    /// Kinds a property name contributes to
    pub fn of_property(name: &str) -> PropertyKinds {
        match name {
            "font-weight" => Self::BOLD,
            "font-style" => Self::ITALIC,
            "text-decoration" | "text-decoration-line" => Self::UNDERLINE,
            "color" => Self::COLOR,
            "background" | "background-color" => Self::BACKGROUND,
            "font-family" => Self::FONT_FAMILY,
            "font-size" => Self::FONT_SIZE,
            "text-align" => Self::TEXT_ALIGN,
            "margin" => Self::MARGIN,
            "margin-top" => Self::MARGIN_TOP,
            "margin-right" => Self::MARGIN_RIGHT,
            "margin-bottom" => Self::MARGIN_BOTTOM,
            "margin-left" => Self::MARGIN_LEFT,
            n if n == "border" || n.starts_with("border-") => Self::BORDER,
            _ => Self::NONE,
        }
    }
}

impl BitOr for PropertyKinds {
    type Output = PropertyKinds;

    fn bitor(self, rhs: PropertyKinds) -> PropertyKinds {
        PropertyKinds(self.0 | rhs.0)
    }
}

impl BitOrAssign for PropertyKinds {
    fn bitor_assign(&mut self, rhs: PropertyKinds) {
        self.0 |= rhs.0;
    }
}

impl fmt::Debug for PropertyKinds {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        const NAMES: [(PropertyKinds, &str); 13] = [
            (PropertyKinds::BOLD, "BOLD"),
            (PropertyKinds::ITALIC, "ITALIC"),
            (PropertyKinds::UNDERLINE, "UNDERLINE"),
            (PropertyKinds::COLOR, "COLOR"),
            (PropertyKinds::BACKGROUND, "BACKGROUND"),
            (PropertyKinds::FONT_FAMILY, "FONT_FAMILY"),
            (PropertyKinds::FONT_SIZE, "FONT_SIZE"),
            (PropertyKinds::TEXT_ALIGN, "TEXT_ALIGN"),
            (PropertyKinds::BORDER, "BORDER"),
            (PropertyKinds::MARGIN_TOP, "MARGIN_TOP"),
            (PropertyKinds::MARGIN_RIGHT, "MARGIN_RIGHT"),
            (PropertyKinds::MARGIN_BOTTOM, "MARGIN_BOTTOM"),
            (PropertyKinds::MARGIN_LEFT, "MARGIN_LEFT"),
        ];
        let names: Vec<&str> = NAMES
            .iter()
            .filter(|(k, _)| self.contains(*k))
            .map(|(_, n)| *n)
            .collect();
        write!(f, "PropertyKinds({})", names.join(" | "))
    }
}

/// A single CSS declaration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StyleProperty {
    /// Lowercased property name
    pub name: String,
    pub value: String,
    pub important: bool,
}

impl StyleProperty {
    pub fn new(name: &str, value: &str, important: bool) -> Self {
        Self {
            name: name.trim().to_ascii_lowercase(),
            value: value.trim().to_string(),
            important,
        }
    }
}

/// Resolved property set for one node
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ComputedStyle {
    properties: IndexMap<String, StyleProperty>,
    kinds: PropertyKinds,
}

impl ComputedStyle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a property. Keys are case-insensitive.
    ///
    /// An existing property keeps its position. Within one declaration block a normal
    /// declaration does not replace an `!important` one.
    pub fn set(&mut self, key: &str, value: &str, important: bool) -> ConversionResult<()> {
        let prop = StyleProperty::new(key, value, important);
        if prop.name.is_empty() {
            return Ok(());
        }
        if let Some(existing) = self.properties.get_mut(&prop.name) {
            if existing.important && !important {
                return Ok(());
            }
            *existing = prop;
            return Ok(());
        }
        self.insert_new(prop)
    }

    /// Insert a property known to be absent (or replace it unconditionally)
    pub(crate) fn put(&mut self, prop: StyleProperty) -> ConversionResult<()> {
        if let Some(existing) = self.properties.get_mut(&prop.name) {
            *existing = prop;
            return Ok(());
        }
        self.insert_new(prop)
    }

    fn insert_new(&mut self, prop: StyleProperty) -> ConversionResult<()> {
        self.properties.try_reserve(1)?;
        self.kinds |= PropertyKinds::of_property(&prop.name);
        self.properties.insert(prop.name.clone(), prop);
        Ok(())
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.get_property(key).map(|p| p.value.as_str())
    }

    pub fn get_property(&self, key: &str) -> Option<&StyleProperty> {
        if key.bytes().any(|b| b.is_ascii_uppercase()) {
            self.properties.get(&key.to_ascii_lowercase())
        } else {
            self.properties.get(key)
        }
    }

    /// O(1) check for a tracked property kind
    pub fn has(&self, kind: PropertyKinds) -> bool {
        self.kinds.intersects(kind)
    }

    pub fn kinds(&self) -> PropertyKinds {
        self.kinds
    }

    pub fn len(&self) -> usize {
        self.properties.len()
    }

    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }

    /// Properties in insertion order
    pub fn iter(&self) -> impl Iterator<Item = &StyleProperty> {
        self.properties.values()
    }

    pub(crate) fn with_capacity(n: usize) -> ConversionResult<Self> {
        let mut style = Self::default();
        style.properties.try_reserve(n)?;
        Ok(style)
    }

    /// First non-empty value among `keys`
    pub fn first_of(&self, keys: &[&str]) -> Option<&str> {
        keys.iter().find_map(|k| self.get(k).filter(|v| !v.is_empty()))
    }

    // -------------------------------------------------------------------------
    // Typed readers used by the converter
    // -------------------------------------------------------------------------

    /// `font-weight: bold|bolder|600..900`
    pub fn is_bold(&self) -> bool {
        match self.get("font-weight") {
            Some(v) => {
                let v = v.to_ascii_lowercase();
                v == "bold" || v == "bolder" || v.parse::<u32>().map(|w| w >= 600).unwrap_or(false)
            }
            None => false,
        }
    }

    /// `font-style: italic|oblique`
    pub fn is_italic(&self) -> bool {
        self.get("font-style")
            .map(|v| {
                let v = v.to_ascii_lowercase();
                v.starts_with("italic") || v.starts_with("oblique")
            })
            .unwrap_or(false)
    }

    /// `text-decoration` containing `underline`
    pub fn is_underline(&self) -> bool {
        self.first_of(&["text-decoration-line", "text-decoration"])
            .map(|v| v.to_ascii_lowercase().contains("underline"))
            .unwrap_or(false)
    }

    /// Raw `background-color`, or the color part of a `background` shorthand
    pub fn background_color(&self) -> Option<&str> {
        if let Some(v) = self.get("background-color") {
            return Some(v);
        }
        let shorthand = self.get("background")?;
        if let Some(start) = shorthand.find("rgb") {
            let end = start + shorthand[start..].find(')')? + 1;
            return Some(&shorthand[start..end]);
        }
        // "url(x.png) no-repeat #fff" -> last token that parses as a color
        shorthand
            .split_whitespace()
            .rev()
            .find(|t| color_to_hex(t).is_ok())
    }
}

lazy_static! {
    static ref IMPORTANT_SUFFIX: Regex = Regex::new(r"(?i)\s*!\s*important\s*$").unwrap();
}

/// Split a `style` attribute into declarations, respecting parentheses and quotes
fn split_declarations(text: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    let mut start = 0;

    for (i, c) in text.char_indices() {
        match (quote, c) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '"') | (None, '\'') => quote = Some(c),
            (None, '(') => depth += 1,
            (None, ')') => depth = depth.saturating_sub(1),
            (None, ';') if depth == 0 => {
                parts.push(&text[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    parts.push(&text[start..]);
    parts
}

/// Parse an inline `style` attribute (`color: red; font-weight: bold !important`).
///
/// Nameless or valueless declarations are skipped.
pub fn parse_declarations(text: &str) -> ConversionResult<ComputedStyle> {
    let mut style = ComputedStyle::new();
    for decl in split_declarations(text) {
        let Some((name, value)) = decl.split_once(':') else {
            continue;
        };
        let name = name.trim();
        if name.is_empty() {
            continue;
        }
        let (value, important) = match IMPORTANT_SUFFIX.find(value) {
            Some(m) => (&value[..m.start()], true),
            None => (value, false),
        };
        let value = value.trim();
        if value.is_empty() {
            continue;
        }
        style.set(name, value, important)?;
    }
    Ok(style)
}
