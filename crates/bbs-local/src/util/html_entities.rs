//! Single-pass HTML entity decoder.
//!
//! A single regex pass is essential: decoding `&amp;lt;` naively in two
//! passes would collapse it to `<`, which is wrong.

use regex::Regex;
use std::sync::OnceLock;

fn entity_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"&(?:#x([0-9a-fA-F]+)|#([0-9]+)|([a-zA-Z]+));").unwrap())
}

fn named_entity(name: &str) -> Option<char> {
    Some(match name {
        "amp" => '&',
        "lt" => '<',
        "gt" => '>',
        "quot" => '"',
        "apos" => '\'',
        "nbsp" => '\u{00A0}',
        _ => return None,
    })
}

/// Decode `&amp;`, `&#dec;`, `&#xHEX;` in a single pass. Numeric values
/// outside `[0, 0x10FFFF]` or unparsable leave the original text unchanged
/// for that match.
pub fn decode_entities(input: &str) -> String {
    entity_pattern()
        .replace_all(input, |caps: &regex::Captures| {
            let whole = caps.get(0).unwrap().as_str();
            if let Some(hex) = caps.get(1) {
                if let Ok(cp) = u32::from_str_radix(hex.as_str(), 16) {
                    if let Some(c) = char::from_u32(cp) {
                        return c.to_string();
                    }
                }
                return whole.to_string();
            }
            if let Some(dec) = caps.get(2) {
                if let Ok(cp) = dec.as_str().parse::<u32>() {
                    if let Some(c) = char::from_u32(cp) {
                        return c.to_string();
                    }
                }
                return whole.to_string();
            }
            if let Some(name) = caps.get(3) {
                if let Some(c) = named_entity(name.as_str()) {
                    return c.to_string();
                }
                return whole.to_string();
            }
            whole.to_string()
        })
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn does_not_double_decode() {
        // Scenario 2: &amp;#127825; must decode to the literal text
        // "&#127825;", NOT the emoji.
        assert_eq!(decode_entities("&amp;#127825;"), "&#127825;");
    }

    #[test]
    fn decodes_named_and_numeric() {
        assert_eq!(decode_entities("a &amp; b"), "a & b");
        assert_eq!(decode_entities("&lt;tag&gt;"), "<tag>");
        assert_eq!(decode_entities("&#65;"), "A");
        assert_eq!(decode_entities("&#x41;"), "A");
    }

    #[test]
    fn out_of_range_codepoint_left_unchanged() {
        assert_eq!(decode_entities("&#x110000;"), "&#x110000;");
        assert_eq!(decode_entities("&#99999999;"), "&#99999999;");
    }

    #[test]
    fn unknown_named_entity_left_unchanged() {
        assert_eq!(decode_entities("&unknownxyz;"), "&unknownxyz;");
    }
}
