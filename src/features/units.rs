//! CSS length handling
//!
//! Parses CSS/HTML lengths (`12px`, `1.5em`, `50%`, `2cm`, bare numbers) and converts
//! them to TeX points. Relative lengths that need layout context fail with
//! `Unsupported`; unparseable input fails with `CssValue`.

use crate::utils::error::{ConversionError, ConversionResult};

/// Font size that `em`/`rem` are resolved against (LaTeX article default)
pub const BASE_FONT_PT: f64 = 10.0;

/// Largest dimension TeX accepts
const MAX_TEX_POINTS: f64 = 16383.99;

/// Represents a dimension value with unit
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Dimension {
    Pixel(f64),
    Point(f64),
    Pica(f64),
    Centimeter(f64),
    Millimeter(f64),
    Inch(f64),
    Em(f64),
    Rem(f64),
    Percent(f64),
}

impl Dimension {
    /// Parse a CSS dimension string like "10cm", "100px", "50%", "120".
    ///
    /// A bare number is a pixel count, as in HTML `width`/`height` attributes.
    pub fn parse(s: &str) -> ConversionResult<Dimension> {
        let s = s.trim().to_ascii_lowercase();

        if s.is_empty() {
            return Err(ConversionError::css_value("empty length"));
        }
        if matches!(s.as_str(), "auto" | "inherit" | "initial" | "unset") {
            return Err(ConversionError::unsupported(format!("length keyword '{}'", s)));
        }

        // two-letter units before the bare-number fallback; "rem" before "em"
        let units: [(&str, fn(f64) -> Dimension); 9] = [
            ("rem", Dimension::Rem),
            ("px", Dimension::Pixel),
            ("pt", Dimension::Point),
            ("pc", Dimension::Pica),
            ("cm", Dimension::Centimeter),
            ("mm", Dimension::Millimeter),
            ("in", Dimension::Inch),
            ("em", Dimension::Em),
            ("%", Dimension::Percent),
        ];

        for (suffix, make) in units {
            if let Some(rest) = s.strip_suffix(suffix) {
                return parse_number(rest, &s).map(make);
            }
        }

        if s.ends_with(|c: char| c.is_ascii_alphabetic()) {
            return Err(ConversionError::unsupported(format!("length unit in '{}'", s)));
        }

        parse_number(&s, &s).map(Dimension::Pixel)
    }

    /// Convert to TeX points
    pub fn to_points(&self) -> ConversionResult<f64> {
        let pt = match *self {
            Dimension::Pixel(v) => v * 0.75, // 1px = 0.75pt at 96dpi
            Dimension::Point(v) => v,
            Dimension::Pica(v) => v * 12.0,
            Dimension::Centimeter(v) => v * 72.0 / 2.54,
            Dimension::Millimeter(v) => v * 72.0 / 25.4,
            Dimension::Inch(v) => v * 72.0,
            Dimension::Em(v) | Dimension::Rem(v) => v * BASE_FONT_PT,
            Dimension::Percent(_) => {
                return Err(ConversionError::unsupported(
                    "percentage length has no absolute size",
                ))
            }
        };
        if !pt.is_finite() || pt > MAX_TEX_POINTS {
            return Err(ConversionError::css_value(format!(
                "length {:?} is out of range",
                self
            )));
        }
        Ok(pt)
    }

    /// Convert to LaTeX dimension string (percentages become `\linewidth` fractions)
    pub fn to_latex(&self) -> ConversionResult<String> {
        match *self {
            Dimension::Percent(v) => Ok(format!("{}\\linewidth", format_num(v / 100.0))),
            _ => Ok(format!("{}pt", format_num(self.to_points()?))),
        }
    }
}

fn parse_number(num: &str, whole: &str) -> ConversionResult<f64> {
    let v = num
        .trim()
        .parse::<f64>()
        .map_err(|_| ConversionError::css_value(format!("invalid length '{}'", whole)))?;
    if !v.is_finite() || v < 0.0 {
        return Err(ConversionError::css_value(format!("invalid length '{}'", whole)));
    }
    Ok(v)
}

/// Convert a CSS length to TeX points
pub fn length_to_points(value: &str) -> ConversionResult<f64> {
    Dimension::parse(value)?.to_points()
}

/// Format number, removing trailing zeros
pub fn format_num(v: f64) -> String {
    let s = format!("{:.2}", v);
    let s = s.trim_end_matches('0');
    let s = s.trim_end_matches('.');
    s.to_string()
}
