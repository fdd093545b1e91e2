//! Escaping for quoted AT command arguments
//!
//! Inside a quoted argument the modem treats `"`, `\` and `,` as syntax.
//! Each occurrence is prefixed with a backslash. Untrusted text such as WiFi
//! credentials must pass through [`escape`] before it is embedded in a
//! command line.

use heapless::String;

/// Capacity used for escaped credentials
pub const MAX_ESCAPED_LEN: usize = 128;

/// Characters that need a backslash prefix
fn needs_escape(c: char) -> bool {
    matches!(c, '"' | '\\' | ',')
}

/// Escape `text` into a bounded string
///
/// Output that would not fit is dropped at a character boundary; an escape
/// pair is either written whole or not at all.
pub fn escape<const N: usize>(text: &str) -> String<N> {
    let mut out = String::new();
    for c in text.chars() {
        if needs_escape(c) {
            if out.len() + 2 > N {
                break;
            }
            // Room was checked above
            let _ = out.push('\\');
            let _ = out.push(c);
        } else if out.push(c).is_err() {
            break;
        }
    }
    out
}

/// Undo [`escape`]
///
/// A trailing lone backslash is kept as-is. Output that does not fit is
/// truncated.
pub fn unescape<const N: usize>(text: &str) -> String<N> {
    let mut out = String::new();
    let mut chars = text.chars();
    while let Some(c) = chars.next() {
        let c = if c == '\\' { chars.next().unwrap_or('\\') } else { c };
        if out.push(c).is_err() {
            break;
        }
    }
    out
}
