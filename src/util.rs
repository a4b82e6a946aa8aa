//! Byte decoding helpers for HTML input.

use std::borrow::Cow;

/// How far into the document to look for a `<meta charset>` declaration.
const CHARSET_SNIFF_LEN: usize = 1024;

/// Decode bytes to a string, handling various encodings.
///
/// This function:
/// 1. First tries UTF-8 (handles BOM automatically via encoding_rs)
/// 2. If malformed, tries the hint encoding (from `<meta charset>`)
/// 3. Falls back to Windows-1252, the web's default legacy encoding
///
/// Uses `Cow<str>` to avoid allocation when the input is valid UTF-8.
pub fn decode_text<'a>(bytes: &'a [u8], hint_encoding: Option<&str>) -> Cow<'a, str> {
    let (result, _encoding, malformed) = encoding_rs::UTF_8.decode(bytes);

    if !malformed {
        return result;
    }

    if let Some(name) = hint_encoding
        && let Some(encoding) = encoding_rs::Encoding::for_label(name.as_bytes())
    {
        tracing::debug!(encoding = encoding.name(), "decoding with declared charset");
        let (result, _, _) = encoding.decode(bytes);
        return result;
    }

    tracing::debug!("input is not UTF-8, falling back to windows-1252");
    let (result, _, _) = encoding_rs::WINDOWS_1252.decode(bytes);
    result
}

/// Extract the charset label from a `<meta charset=...>` or
/// `<meta http-equiv content="...; charset=...">` near the start of the input.
///
/// Only the first kilobyte is scanned. Quotes around the label are optional.
pub fn sniff_meta_charset(bytes: &[u8]) -> Option<&str> {
    let prefix = &bytes[..bytes.len().min(CHARSET_SNIFF_LEN)];

    let pos = prefix
        .windows(8)
        .position(|w| w.eq_ignore_ascii_case(b"charset="))?;
    let mut value = &prefix[pos + 8..];

    if let Some(&quote) = value.first()
        && (quote == b'"' || quote == b'\'')
    {
        value = &value[1..];
    }

    let end = value
        .iter()
        .position(|&b| matches!(b, b'"' | b'\'' | b';' | b'>' | b'/') || b.is_ascii_whitespace())
        .unwrap_or(value.len());

    let label = std::str::from_utf8(&value[..end]).ok()?;
    (!label.is_empty()).then_some(label)
}
