/*============================================================
  PkgSpec Project: pkgspec
  Module: pkgspec_core::value
  ------------------------------------------------------------
  Purpose:
    Decode raw dump values into scalars or ordered lists,
    handling bash's indexed-array literal and its escaping.

  Security / Safety Notes:
    Pure text processing; no I/O performed in this module.

  Dependencies:
    regex for array element extraction.

  Operational Scope:
    Applied to every descriptor variable PackageMetadata reads.

  Revision History:
    2025-02-11 RKM  Authored array literal decoder.
    2025-02-27 RKM  Unquote scalars printed by `set`.
    2025-03-09 RKM  Decode `$'...'` elements and octal/hex escapes.
  ------------------------------------------------------------
  Principles Observed:
    - Total decoding: malformed input degrades, never panics
    - Element order follows the text, not the index value
============================================================*/

use std::iter::Peekable;
use std::str::Chars;
use std::sync::OnceLock;

use regex::Regex;

/// Stands in for `\\` while searching for unescaped quotes.
const ESCAPED_BACKSLASH: &str = "\u{0}";

/// A decoded descriptor value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShellValue {
    Scalar(String),
    List(Vec<String>),
    FunctionBody(String),
}

impl ShellValue {
    /// List view; a scalar becomes a one-element list.
    pub fn into_list(self) -> Vec<String> {
        match self {
            ShellValue::Scalar(value) | ShellValue::FunctionBody(value) => vec![value],
            ShellValue::List(values) => values,
        }
    }

    /// Scalar view; a list yields its first element.
    pub fn into_scalar(self) -> Option<String> {
        match self {
            ShellValue::Scalar(value) | ShellValue::FunctionBody(value) => Some(value),
            ShellValue::List(values) => values.into_iter().next(),
        }
    }

    pub fn is_list(&self) -> bool {
        matches!(self, ShellValue::List(_))
    }
}

fn element_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    // Group 1 is a `"..."` element, group 2 a `$'...'` element. The empty
    // alternative comes first so `[0]=""` is not merged with the following
    // element.
    PATTERN.get_or_init(|| {
        Regex::new(r#"\[\d+\]=(?:"(|.*?[^\\])"|\$'((?:[^'\\]|\\.)*)')"#)
            .expect("array element pattern is valid")
    })
}

/// Decode a raw variable value as printed by `set`.
pub fn decode_value(raw: &str) -> ShellValue {
    if raw.len() >= 2 && raw.starts_with('(') && raw.ends_with(')') {
        ShellValue::List(decode_array(raw))
    } else {
        ShellValue::Scalar(unquote_scalar(raw))
    }
}

/// Extract the elements of an indexed-array literal.
///
/// Malformed quoting yields a shorter list rather than an error.
pub fn decode_array(raw: &str) -> Vec<String> {
    let masked = raw.replace(r"\\", ESCAPED_BACKSLASH);
    element_pattern()
        .captures_iter(&masked)
        .filter_map(|caps| {
            if let Some(quoted) = caps.get(1) {
                Some(unescape_double_quoted(&restore(quoted.as_str())))
            } else {
                caps.get(2).map(|ansi| unescape_ansi_c(&restore(ansi.as_str())))
            }
        })
        .collect()
}

fn restore(masked: &str) -> String {
    masked.replace(ESCAPED_BACKSLASH, r"\\")
}

/// Undo the backslash escapes bash applies inside `"..."`.
fn unescape_double_quoted(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars();
    while let Some(ch) = chars.next() {
        if ch != '\\' {
            out.push(ch);
            continue;
        }
        match chars.next() {
            Some(next @ ('\\' | '"' | '$' | '`')) => out.push(next),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    out
}

/// Strip the quoting `set` adds to scalars that need it.
fn unquote_scalar(raw: &str) -> String {
    if let Some(inner) = raw
        .strip_prefix("$'")
        .and_then(|rest| rest.strip_suffix('\''))
    {
        return unescape_ansi_c(inner);
    }
    if raw.len() >= 2 && raw.starts_with('\'') && raw.ends_with('\'') {
        return raw[1..raw.len() - 1].replace(r"'\''", "'");
    }
    raw.to_string()
}

/// Decode the body of a `$'...'` word.
///
/// Escapes produce raw bytes, so octal runs such as `\303\251` rebuild
/// the UTF-8 text bash printed under the C locale.
fn unescape_ansi_c(text: &str) -> String {
    let mut bytes = Vec::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    while let Some(ch) = chars.next() {
        if ch != '\\' {
            push_char(&mut bytes, ch);
            continue;
        }
        let Some(escape) = chars.next() else {
            bytes.push(b'\\');
            break;
        };
        match escape {
            'n' => bytes.push(b'\n'),
            't' => bytes.push(b'\t'),
            'r' => bytes.push(b'\r'),
            'e' | 'E' => bytes.push(0x1b),
            'a' => bytes.push(0x07),
            'b' => bytes.push(0x08),
            'f' => bytes.push(0x0c),
            'v' => bytes.push(0x0b),
            '\\' | '\'' | '"' | '?' => bytes.push(escape as u8),
            '0'..='7' => {
                let mut value = escape.to_digit(8).unwrap_or_default();
                for _ in 0..2 {
                    let Some(digit) = chars.peek().and_then(|ch| ch.to_digit(8)) else {
                        break;
                    };
                    chars.next();
                    value = value * 8 + digit;
                }
                bytes.push((value & 0xff) as u8);
            }
            'x' => match take_digits(&mut chars, 16, 2) {
                Some(value) => bytes.push(value as u8),
                None => bytes.extend_from_slice(b"\\x"),
            },
            'u' | 'U' => {
                let width = if escape == 'u' { 4 } else { 8 };
                match take_digits(&mut chars, 16, width) {
                    Some(value) => {
                        push_char(&mut bytes, char::from_u32(value).unwrap_or('\u{fffd}'))
                    }
                    None => {
                        bytes.push(b'\\');
                        push_char(&mut bytes, escape);
                    }
                }
            }
            'c' => match chars.next() {
                Some('?') => bytes.push(0x7f),
                Some(control) if control.is_ascii() => {
                    bytes.push(control.to_ascii_uppercase() as u8 & 0x1f)
                }
                Some(other) => {
                    bytes.extend_from_slice(b"\\c");
                    push_char(&mut bytes, other);
                }
                None => bytes.extend_from_slice(b"\\c"),
            },
            other => {
                bytes.push(b'\\');
                push_char(&mut bytes, other);
            }
        }
    }
    String::from_utf8_lossy(&bytes).into_owned()
}

fn push_char(bytes: &mut Vec<u8>, ch: char) {
    let mut buffer = [0; 4];
    bytes.extend_from_slice(ch.encode_utf8(&mut buffer).as_bytes());
}

/// Consume up to `max` digits in `radix`; `None` when there are none.
fn take_digits(chars: &mut Peekable<Chars<'_>>, radix: u32, max: usize) -> Option<u32> {
    let mut value = None;
    for _ in 0..max {
        let Some(digit) = chars.peek().and_then(|ch| ch.to_digit(radix)) else {
            break;
        };
        chars.next();
        value = Some(value.unwrap_or(0) * radix + digit);
    }
    value
}
