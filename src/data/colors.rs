//! CSS color support
//! Converts CSS color values into the hex form used by `xcolor`'s `[HTML]` model

use lazy_static::lazy_static;
use regex::Regex;
use std::collections::HashMap;

use crate::utils::error::{ConversionError, ConversionResult};

lazy_static! {
    /// CSS named colors (CSS Color Module Level 4 basic + extended keywords in common use)
    pub static ref NAMED_COLORS: HashMap<&'static str, &'static str> = {
        let mut m = HashMap::new();

        // Basic colors
        m.insert("black", "000000");
        m.insert("silver", "C0C0C0");
        m.insert("gray", "808080");
        m.insert("grey", "808080");
        m.insert("white", "FFFFFF");
        m.insert("maroon", "800000");
        m.insert("red", "FF0000");
        m.insert("purple", "800080");
        m.insert("fuchsia", "FF00FF");
        m.insert("magenta", "FF00FF");
        m.insert("green", "008000");
        m.insert("lime", "00FF00");
        m.insert("olive", "808000");
        m.insert("yellow", "FFFF00");
        m.insert("navy", "000080");
        m.insert("blue", "0000FF");
        m.insert("teal", "008080");
        m.insert("aqua", "00FFFF");
        m.insert("cyan", "00FFFF");
        m.insert("orange", "FFA500");

        // Extended colors
        m.insert("aliceblue", "F0F8FF");
        m.insert("antiquewhite", "FAEBD7");
        m.insert("aquamarine", "7FFFD4");
        m.insert("azure", "F0FFFF");
        m.insert("beige", "F5F5DC");
        m.insert("bisque", "FFE4C4");
        m.insert("blanchedalmond", "FFEBCD");
        m.insert("blueviolet", "8A2BE2");
        m.insert("brown", "A52A2A");
        m.insert("burlywood", "DEB887");
        m.insert("cadetblue", "5F9EA0");
        m.insert("chartreuse", "7FFF00");
        m.insert("chocolate", "D2691E");
        m.insert("coral", "FF7F50");
        m.insert("cornflowerblue", "6495ED");
        m.insert("cornsilk", "FFF8DC");
        m.insert("crimson", "DC143C");
        m.insert("darkblue", "00008B");
        m.insert("darkcyan", "008B8B");
        m.insert("darkgoldenrod", "B8860B");
        m.insert("darkgray", "A9A9A9");
        m.insert("darkgrey", "A9A9A9");
        m.insert("darkgreen", "006400");
        m.insert("darkkhaki", "BDB76B");
        m.insert("darkmagenta", "8B008B");
        m.insert("darkolivegreen", "556B2F");
        m.insert("darkorange", "FF8C00");
        m.insert("darkorchid", "9932CC");
        m.insert("darkred", "8B0000");
        m.insert("darksalmon", "E9967A");
        m.insert("darkseagreen", "8FBC8F");
        m.insert("darkslateblue", "483D8B");
        m.insert("darkslategray", "2F4F4F");
        m.insert("darkslategrey", "2F4F4F");
        m.insert("darkturquoise", "00CED1");
        m.insert("darkviolet", "9400D3");
        m.insert("deeppink", "FF1493");
        m.insert("deepskyblue", "00BFFF");
        m.insert("dimgray", "696969");
        m.insert("dimgrey", "696969");
        m.insert("dodgerblue", "1E90FF");
        m.insert("firebrick", "B22222");
        m.insert("floralwhite", "FFFAF0");
        m.insert("forestgreen", "228B22");
        m.insert("gainsboro", "DCDCDC");
        m.insert("ghostwhite", "F8F8FF");
        m.insert("gold", "FFD700");
        m.insert("goldenrod", "DAA520");
        m.insert("greenyellow", "ADFF2F");
        m.insert("honeydew", "F0FFF0");
        m.insert("hotpink", "FF69B4");
        m.insert("indianred", "CD5C5C");
        m.insert("indigo", "4B0082");
        m.insert("ivory", "FFFFF0");
        m.insert("khaki", "F0E68C");
        m.insert("lavender", "E6E6FA");
        m.insert("lavenderblush", "FFF0F5");
        m.insert("lawngreen", "7CFC00");
        m.insert("lemonchiffon", "FFFACD");
        m.insert("lightblue", "ADD8E6");
        m.insert("lightcoral", "F08080");
        m.insert("lightcyan", "E0FFFF");
        m.insert("lightgoldenrodyellow", "FAFAD2");
        m.insert("lightgray", "D3D3D3");
        m.insert("lightgrey", "D3D3D3");
        m.insert("lightgreen", "90EE90");
        m.insert("lightpink", "FFB6C1");
        m.insert("lightsalmon", "FFA07A");
        m.insert("lightseagreen", "20B2AA");
        m.insert("lightskyblue", "87CEFA");
        m.insert("lightslategray", "778899");
        m.insert("lightslategrey", "778899");
        m.insert("lightsteelblue", "B0C4DE");
        m.insert("lightyellow", "FFFFE0");
        m.insert("limegreen", "32CD32");
        m.insert("linen", "FAF0E6");
        m.insert("mediumaquamarine", "66CDAA");
        m.insert("mediumblue", "0000CD");
        m.insert("mediumorchid", "BA55D3");
        m.insert("mediumpurple", "9370DB");
        m.insert("mediumseagreen", "3CB371");
        m.insert("mediumslateblue", "7B68EE");
        m.insert("mediumspringgreen", "00FA9A");
        m.insert("mediumturquoise", "48D1CC");
        m.insert("mediumvioletred", "C71585");
        m.insert("midnightblue", "191970");
        m.insert("mintcream", "F5FFFA");
        m.insert("mistyrose", "FFE4E1");
        m.insert("moccasin", "FFE4B5");
        m.insert("navajowhite", "FFDEAD");
        m.insert("oldlace", "FDF5E6");
        m.insert("olivedrab", "6B8E23");
        m.insert("orangered", "FF4500");
        m.insert("orchid", "DA70D6");
        m.insert("palegoldenrod", "EEE8AA");
        m.insert("palegreen", "98FB98");
        m.insert("paleturquoise", "AFEEEE");
        m.insert("palevioletred", "DB7093");
        m.insert("papayawhip", "FFEFD5");
        m.insert("peachpuff", "FFDAB9");
        m.insert("peru", "CD853F");
        m.insert("pink", "FFC0CB");
        m.insert("plum", "DDA0DD");
        m.insert("powderblue", "B0E0E6");
        m.insert("rebeccapurple", "663399");
        m.insert("rosybrown", "BC8F8F");
        m.insert("royalblue", "4169E1");
        m.insert("saddlebrown", "8B4513");
        m.insert("salmon", "FA8072");
        m.insert("sandybrown", "F4A460");
        m.insert("seagreen", "2E8B57");
        m.insert("seashell", "FFF5EE");
        m.insert("sienna", "A0522D");
        m.insert("skyblue", "87CEEB");
        m.insert("slateblue", "6A5ACD");
        m.insert("slategray", "708090");
        m.insert("slategrey", "708090");
        m.insert("snow", "FFFAFA");
        m.insert("springgreen", "00FF7F");
        m.insert("steelblue", "4682B4");
        m.insert("tan", "D2B48C");
        m.insert("thistle", "D8BFD8");
        m.insert("tomato", "FF6347");
        m.insert("turquoise", "40E0D0");
        m.insert("violet", "EE82EE");
        m.insert("wheat", "F5DEB3");
        m.insert("whitesmoke", "F5F5F5");
        m.insert("yellowgreen", "9ACD32");

        m
    };

    /// Functional notation: rgb(1, 2, 3), rgba(1, 2, 3, 0.5), rgb(10% 20% 30%)
    static ref RGB_FUNCTION: Regex = Regex::new(
        r"(?i)^rgba?\(\s*([0-9.]+%?)\s*[,\s]\s*([0-9.]+%?)\s*[,\s]\s*([0-9.]+%?)\s*(?:[,/]\s*[0-9.]+%?\s*)?\)$"
    ).unwrap();
}

/// Keywords that are valid CSS but have no fixed color
const CONTEXTUAL_KEYWORDS: &[&str] = &["transparent", "currentcolor", "inherit", "initial", "unset"];

/// Convert a CSS color value to a six-digit uppercase hex string (no `#`).
///
/// Fails with `Unsupported` for valid colors that have no fixed value (e.g.
/// `transparent`) or use an unsupported notation (`hsl()`), and with `CssValue`
/// for anything unparseable. Callers treat a failure as "no color".
pub fn color_to_hex(value: &str) -> ConversionResult<String> {
    let value = value.trim();
    let lower = value.to_ascii_lowercase();

    if let Some(hex) = NAMED_COLORS.get(lower.as_str()) {
        return Ok((*hex).to_string());
    }

    if CONTEXTUAL_KEYWORDS.contains(&lower.as_str()) {
        return Err(ConversionError::unsupported(format!(
            "color keyword '{}' has no fixed value",
            value
        )));
    }

    if let Some(hex) = lower.strip_prefix('#') {
        return parse_hex_color(hex)
            .ok_or_else(|| ConversionError::css_value(format!("invalid hex color '{}'", value)));
    }

    if let Some(caps) = RGB_FUNCTION.captures(&lower) {
        let mut out = String::with_capacity(6);
        for i in 1..=3 {
            let channel = parse_channel(&caps[i])
                .ok_or_else(|| ConversionError::css_value(format!("invalid color '{}'", value)))?;
            out.push_str(&format!("{:02X}", channel));
        }
        return Ok(out);
    }

    if lower.starts_with("hsl") || lower.starts_with("hwb") || lower.starts_with("lab") {
        return Err(ConversionError::unsupported(format!(
            "color notation '{}'",
            value
        )));
    }

    Err(ConversionError::css_value(format!(
        "unrecognized color '{}'",
        value
    )))
}

/// Parse `rgb`, `rgba`, `rrggbb` or `rrggbbaa` hex digits (alpha is dropped)
fn parse_hex_color(hex: &str) -> Option<String> {
    if !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }
    match hex.len() {
        3 | 4 => {
            let mut out = String::with_capacity(6);
            for ch in hex.chars().take(3) {
                let up = ch.to_ascii_uppercase();
                out.push(up);
                out.push(up);
            }
            Some(out)
        }
        6 | 8 => Some(hex[..6].to_ascii_uppercase()),
        _ => None,
    }
}

/// Parse one rgb() channel: integer 0-255 or percentage, clamped
fn parse_channel(s: &str) -> Option<u8> {
    if let Some(pct) = s.strip_suffix('%') {
        let v = pct.parse::<f64>().ok()?;
        return Some((v.clamp(0.0, 100.0) * 255.0 / 100.0).round() as u8);
    }
    let v = s.parse::<f64>().ok()?;
    Some(v.clamp(0.0, 255.0).round() as u8)
}

/// Check if a string is a known color name
pub fn is_color_name(s: &str) -> bool {
    NAMED_COLORS.contains_key(s.trim().to_ascii_lowercase().as_str())
}
