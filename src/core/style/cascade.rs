//! Cascade resolution for inline styles
//!
//! Combines an ancestor's computed style with a node's own declarations:
//! inheritable ancestor properties flow down unless overridden, non-inheritable ones
//! stay on the node that declared them, and every local declaration is kept.
//! When the node declares nothing the ancestor's style is reused as-is.

use std::borrow::Cow;

use super::ComputedStyle;
use crate::utils::error::ConversionResult;

/// How an inherited `!important` declaration competes with a normal local one
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "wasm", derive(serde::Serialize, serde::Deserialize))]
pub enum ImportantPolicy {
    /// The node's own declaration always wins (CSS: inheritance never beats a
    /// declaration on the element itself)
    #[default]
    LocalWins,
    /// An inherited `!important` beats a normal local declaration
    InheritedImportantWins,
}

/// CSS properties that inherit by default
const INHERITED_PROPERTIES: &[&str] = &[
    "color",
    "font",
    "font-family",
    "font-size",
    "font-style",
    "font-variant",
    "font-weight",
    "letter-spacing",
    "line-height",
    "list-style",
    "list-style-position",
    "list-style-type",
    "text-align",
    "text-decoration",
    "text-decoration-line",
    "text-indent",
    "text-transform",
    "visibility",
    "white-space",
    "word-spacing",
    "direction",
    "quotes",
];

/// Classify a property name as inheritable.
///
/// Decoration is treated as inherited so that underlined ancestors underline their
/// descendants' text. Unknown properties do not inherit.
pub fn is_inheritable(name: &str) -> bool {
    if name.starts_with("--") {
        // custom properties always inherit
        return true;
    }
    if name.bytes().any(|b| b.is_ascii_uppercase()) {
        let lower = name.to_ascii_lowercase();
        return INHERITED_PROPERTIES.contains(&lower.as_str());
    }
    INHERITED_PROPERTIES.contains(&name)
}

/// Merge `overlay` (a node's own declarations) onto `base` (the inherited style).
///
/// Returns `Cow::Borrowed(base)` when the overlay is empty.
pub fn merge<'a>(
    base: &'a ComputedStyle,
    overlay: &ComputedStyle,
) -> ConversionResult<Cow<'a, ComputedStyle>> {
    merge_with_policy(base, overlay, ImportantPolicy::LocalWins)
}

/// [`merge`] with an explicit `!important` policy
pub fn merge_with_policy<'a>(
    base: &'a ComputedStyle,
    overlay: &ComputedStyle,
    policy: ImportantPolicy,
) -> ConversionResult<Cow<'a, ComputedStyle>> {
    if overlay.is_empty() {
        return Ok(Cow::Borrowed(base));
    }

    let mut out = ComputedStyle::with_capacity(base.len() + overlay.len())?;

    for prop in base.iter() {
        if !is_inheritable(&prop.name) {
            continue;
        }
        match overlay.get_property(&prop.name) {
            None => out.put(prop.clone())?,
            Some(local) => {
                if policy == ImportantPolicy::InheritedImportantWins
                    && prop.important
                    && !local.important
                {
                    out.put(prop.clone())?;
                }
            }
        }
    }

    for prop in overlay.iter() {
        if out.get_property(&prop.name).is_some() {
            // an inherited !important kept above
            continue;
        }
        out.put(prop.clone())?;
    }

    Ok(Cow::Owned(out))
}

/// The part of `style` that children inherit.
///
/// Borrowed when every property is inheritable.
pub fn inherited_part(style: &ComputedStyle) -> ConversionResult<Cow<'_, ComputedStyle>> {
    if style.iter().all(|p| is_inheritable(&p.name)) {
        return Ok(Cow::Borrowed(style));
    }
    let mut out = ComputedStyle::with_capacity(style.len())?;
    for prop in style.iter().filter(|p| is_inheritable(&p.name)) {
        out.put(prop.clone())?;
    }
    Ok(Cow::Owned(out))
}
