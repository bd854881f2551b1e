//! Pre-parse scan for code points YAML forbids outright.
//!
//! The base parser cannot make progress over control characters, so these
//! are detected (and stripped from the parse buffer) before any parser
//! event fires. The YAML 1.2 non-printable set also names unpaired
//! surrogates; those cannot occur in a Rust `&str`, so only the scalar
//! ranges below are checked.

/// One forbidden occurrence: byte offset and the offending code point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NonPrintable {
    pub position: usize,
    pub ch: char,
}

/// True for code points outside the YAML 1.2 printable set.
///
/// Tab, line feed, carriage return, and U+0085 are allowed.
pub fn is_non_printable(ch: char) -> bool {
    let cp = ch as u32;
    matches!(cp,
        0x00..=0x08
        | 0x0B
        | 0x0C
        | 0x0E..=0x1F
        | 0x7F..=0x84
        | 0x86..=0x9F
        | 0xFFFE
        | 0xFFFF)
}

/// Collect every forbidden code point in source order.
pub fn find_non_printables(text: &str) -> Vec<NonPrintable> {
    text.char_indices()
        .filter(|&(_, ch)| is_non_printable(ch))
        .map(|(position, ch)| NonPrintable { position, ch })
        .collect()
}

/// The issue reason for a forbidden code point.
pub fn reason(ch: char) -> String {
    let cp = ch as u32;
    if cp <= 0xFF {
        format!("The non-printable character #x{:02X} is not allowed in YAML", cp)
    } else {
        format!("The non-printable character #x{:04X} is not allowed in YAML", cp)
    }
}
