//! Byte↔string conversion, NCR escaping, and form-urlencoding for the
//! charsets used by the 2channel-lineage networks.

use bbs_core::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Encoding {
    ShiftJis,
    EucJp,
    Utf8,
}

impl Encoding {
    fn encoding_rs(self) -> &'static encoding_rs::Encoding {
        match self {
            // Decode permissively as the Windows-31J superset; `encode`
            // below re-validates against strict Shift_JIS.
            Encoding::ShiftJis => encoding_rs::SHIFT_JIS,
            Encoding::EucJp => encoding_rs::EUC_JP,
            Encoding::Utf8 => encoding_rs::UTF_8,
        }
    }
}

/// Decode `bytes` as `encoding`. Always succeeds (encoding_rs is total on
/// decode); malformed sequences are replaced per the Encoding Standard.
pub fn decode(bytes: &[u8], encoding: Encoding) -> String {
    let (text, _enc, _had_errors) = encoding.encoding_rs().decode(bytes);
    text.into_owned()
}

/// Decode strictly: fail with `EncodingFailure` if any byte sequence was
/// invalid for `encoding`.
pub fn decode_strict(bytes: &[u8], encoding: Encoding) -> Result<String> {
    let (text, _enc, had_errors) = encoding.encoding_rs().decode(bytes);
    if had_errors {
        return Err(Error::Parse(format!("invalid {:?} byte sequence", encoding)));
    }
    Ok(text.into_owned())
}

/// Encode `s` into `encoding`. Fails with `EncodingFailure` if any
/// codepoint is not representable (no permissive mode requested).
pub fn encode(s: &str, encoding: Encoding) -> Result<Vec<u8>> {
    let (bytes, _enc, had_unmappable) = encoding.encoding_rs().encode(s);
    if had_unmappable {
        return Err(Error::Parse(format!("string not representable in {:?}", encoding)));
    }
    Ok(bytes.into_owned())
}

/// Encode `s` into `encoding`, permissively: unmappable codepoints are
/// replaced with the encoding's numeric character reference (see
/// [`ncr_escape`]) rather than failing.
pub fn encode_permissive(s: &str, encoding: Encoding) -> Vec<u8> {
    encode(&ncr_escape(s, encoding), encoding).unwrap_or_default()
}

/// For each codepoint not representable in `target`, emit `&#<decimal>;`.
/// Surrogate pairs are decomposed into full codepoints first (Rust `char`
/// iteration over `&str` already yields full codepoints, never UTF-16 units).
pub fn ncr_escape(s: &str, target: Encoding) -> String {
    let enc = target.encoding_rs();
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        let mut buf = [0u8; 4];
        let piece = ch.encode_utf8(&mut buf);
        let (_, _, had_unmappable) = enc.encode(piece);
        if had_unmappable {
            out.push_str(&format!("&#{};", ch as u32));
        } else {
            out.push(ch);
        }
    }
    out
}

fn is_form_literal_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || matches!(b, b'*' | b'-' | b'.' | b'@' | b'_')
}

/// `x-www-form-urlencoded` in `encoding`: `A-Za-z0-9 * - . @ _` literal,
/// space as `+`, everything else percent-encoded uppercase, over the bytes
/// of the charset-encoded representation.
pub fn form_url_encode(s: &str, encoding: Encoding) -> String {
    let bytes = encode_permissive(s, encoding);
    let mut out = String::with_capacity(bytes.len() * 3);
    for b in bytes {
        if b == b' ' {
            out.push('+');
        } else if is_form_literal_byte(b) {
            out.push(b as char);
        } else {
            out.push_str(&format!("%{:02X}", b));
        }
    }
    out
}
