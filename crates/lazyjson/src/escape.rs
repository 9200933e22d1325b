//! Escaping and unescaping of string literals.
//!
//! [`unescape`] decodes the body of a quoted string (the bytes between the
//! quotes). Bodies without a backslash are returned borrowed. Escapes follow
//! JSON, plus `\'` so single-quoted JSONPath strings can contain their quote.
//!
//! [`write_escaped`] is the inverse used by the encoder.

use alloc::{borrow::Cow, string::String};
use core::fmt::{self, Write as _};

use bstr::ByteSlice;

use crate::Error;

/// Accumulates the four hex digits of a `\uXXXX` escape.
#[derive(Debug, Default)]
struct HexQuad {
    value: u16,
    len: u8,
}

impl HexQuad {
    /// Feeds one byte; returns the code unit once four digits were seen.
    fn feed(&mut self, b: u8) -> Option<Result<u16, ()>> {
        let digit = match (b as char).to_digit(16) {
            Some(d) => d as u16,
            None => return Some(Err(())),
        };
        self.value = (self.value << 4) | digit;
        self.len += 1;
        if self.len == 4 {
            let value = self.value;
            *self = Self::default();
            Some(Ok(value))
        } else {
            None
        }
    }
}

/// Decodes a string body that starts at byte `base` of the input.
pub(crate) fn unescape(raw: &[u8], base: usize) -> Result<Cow<'_, str>, Error> {
    if !raw.contains(&b'\\') {
        return raw
            .to_str()
            .map(Cow::Borrowed)
            .map_err(|e| invalid_utf8(raw, base, e.valid_up_to()));
    }

    let mut out = String::with_capacity(raw.len());
    let mut pending_high: Option<u16> = None;
    let mut i = 0;
    while i < raw.len() {
        let b = raw[i];
        if b != b'\\' {
            flush_high(&mut out, &mut pending_high);
            let end = raw[i..].find_byte(b'\\').map_or(raw.len(), |n| i + n);
            let chunk = raw[i..end]
                .to_str()
                .map_err(|e| invalid_utf8(raw, base, i + e.valid_up_to()))?;
            out.push_str(chunk);
            i = end;
            continue;
        }

        let Some(&kind) = raw.get(i + 1) else {
            return Err(Error::unexpected_end(base + raw.len()));
        };
        let simple = match kind {
            b'"' => Some('"'),
            b'\'' => Some('\''),
            b'\\' => Some('\\'),
            b'/' => Some('/'),
            b'b' => Some('\u{8}'),
            b'f' => Some('\u{c}'),
            b'n' => Some('\n'),
            b'r' => Some('\r'),
            b't' => Some('\t'),
            b'u' => None,
            _ => return Err(Error::wrong_symbol(base + i + 1, kind)),
        };
        if let Some(c) = simple {
            flush_high(&mut out, &mut pending_high);
            out.push(c);
            i += 2;
            continue;
        }

        let mut quad = HexQuad::default();
        let mut unit = None;
        for j in i + 2..i + 6 {
            let Some(&h) = raw.get(j) else {
                return Err(Error::unexpected_end(base + raw.len()));
            };
            match quad.feed(h) {
                Some(Ok(u)) => unit = Some(u),
                Some(Err(())) => return Err(Error::wrong_symbol(base + j, h)),
                None => {}
            }
        }
        i += 6;
        let Some(unit) = unit else { continue };

        match (pending_high.take(), unit) {
            (Some(high), 0xDC00..=0xDFFF) => {
                let code = 0x10000 + ((u32::from(high) - 0xD800) << 10) + (u32::from(unit) - 0xDC00);
                out.push(char::from_u32(code).unwrap_or(char::REPLACEMENT_CHARACTER));
            }
            (high, 0xD800..=0xDBFF) => {
                if high.is_some() {
                    out.push(char::REPLACEMENT_CHARACTER);
                }
                pending_high = Some(unit);
            }
            (high, _) => {
                if high.is_some() {
                    out.push(char::REPLACEMENT_CHARACTER);
                }
                out.push(char::from_u32(u32::from(unit)).unwrap_or(char::REPLACEMENT_CHARACTER));
            }
        }
    }
    flush_high(&mut out, &mut pending_high);
    Ok(Cow::Owned(out))
}

/// A high surrogate not followed by a low one decodes to U+FFFD.
fn flush_high(out: &mut String, pending_high: &mut Option<u16>) {
    if pending_high.take().is_some() {
        out.push(char::REPLACEMENT_CHARACTER);
    }
}

fn invalid_utf8(raw: &[u8], base: usize, at: usize) -> Error {
    Error::wrong_symbol(base + at, raw[at])
}

/// Escapes `src` for inclusion in a JSON string literal.
///
/// Quotes, backslashes, control characters and the Unicode line separators
/// are escaped; everything else is written as is.
pub(crate) fn write_escaped<W: fmt::Write>(src: &str, f: &mut W) -> fmt::Result {
    let mut start = 0;
    for (i, c) in src.char_indices() {
        let short = match c {
            '"' => "\\\"",
            '\\' => "\\\\",
            '\n' => "\\n",
            '\r' => "\\r",
            '\t' => "\\t",
            '\u{8}' => "\\b",
            '\u{c}' => "\\f",
            // Pre-2019 JSON parsers choke on raw line separators.
            c if c.is_control() || c == '\u{2028}' || c == '\u{2029}' => "",
            _ => continue,
        };
        f.write_str(&src[start..i])?;
        if short.is_empty() {
            write!(f, "\\u{:04X}", c as u32)?;
        } else {
            f.write_str(short)?;
        }
        start = i + c.len_utf8();
    }
    f.write_str(&src[start..])
}

/// Returns `src` as a quoted JSON string literal.
pub(crate) fn quote(src: &str) -> String {
    let mut out = String::with_capacity(src.len() + 2);
    out.push('"');
    // Writing into a `String` cannot fail.
    let _ = write_escaped(src, &mut out);
    out.push('"');
    out
}
