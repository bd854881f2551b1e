//! Scalar boundary oracle.
//!
//! Given a scalar that may be malformed, guess where its author meant it to
//! end. Plain scalars end at hard token boundaries; quoted scalars end at
//! the matching quote, or — when the closing quote is missing and guessing
//! is allowed — at the newline before a line that looks like the start of a
//! new mapping entry or sequence item.

use std::sync::OnceLock;

use regex::Regex;

/// Where a scalar (probably) ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalarEnd {
    /// A definite boundary: the position of the closing quote, or `None`
    /// when the input ran out without one.
    Exact(Option<usize>),
    /// A guessed boundary (the newline or end of input where the string
    /// most likely stopped).
    Guess(usize),
}

/// Lines that look like the start of a new entry, ending a runaway string:
/// a sequence dash, a `- key:` compact entry, a `key:` entry, or a blank
/// line. The capture holds the line's indent.
fn next_entry_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^([ \t]*)(-\s|-\s\w+\s*:\s|\w+\s*:\s|$)").unwrap())
}

/// Exact end of a plain (unquoted) scalar starting at `start`.
///
/// The scalar ends at the first `: `, ` #`, or line break; a line break
/// only ends it tentatively, since a following line indented past `indent`
/// continues the scalar.
pub fn plain_scalar_end(input: &str, start: usize, indent: usize) -> usize {
    let b = input.as_bytes();
    let mut i = start;
    loop {
        if i >= b.len() {
            return i;
        }
        match b[i] {
            b':' if i + 1 < b.len() && b[i + 1].is_ascii_whitespace() => {
                return i;
            }
            b'#' if i > start && (b[i - 1] == b' ' || b[i - 1] == b'\t') => {
                return i - 1;
            }
            b'\n' => {
                // Tentative end; look at the next line's indent.
                let mut j = i + 1;
                let mut line_indent = 0;
                while j < b.len() && b[j] == b' ' {
                    j += 1;
                    line_indent += 1;
                }
                if j >= b.len() || b[j] == b'\n' || line_indent < indent + 1 {
                    return i;
                }
                i = j;
            }
            _ => i += 1,
        }
    }
}

/// End of a quoted scalar whose opening quote has already been consumed.
///
/// `start` points just past the opening quote. With `allow_guess`, a line
/// break reached before any closing quote is checked against the next
/// line: if that line plausibly starts a new entry at or left of `indent`,
/// the newline is reported as a guessed end.
pub fn quoted_scalar_end(
    input: &str,
    quote: u8,
    start: usize,
    allow_guess: bool,
    indent: usize,
) -> ScalarEnd {
    let b = input.as_bytes();
    let mut i = start;
    loop {
        while i < b.len() && b[i] != quote && b[i] != b'\n' {
            i += 1;
        }
        if i >= b.len() {
            return if allow_guess {
                ScalarEnd::Guess(b.len())
            } else {
                ScalarEnd::Exact(None)
            };
        }
        if b[i] == b'\n' {
            if allow_guess && next_line_ends_string(input, i, indent) {
                return ScalarEnd::Guess(i);
            }
            i += 1;
            continue;
        }
        if quote == b'\'' {
            // A doubled quote is an escape.
            if i + 1 < b.len() && b[i + 1] == b'\'' {
                i += 2;
                continue;
            }
            return ScalarEnd::Exact(Some(i));
        }
        // Double quote: escaped when preceded by an odd backslash run.
        let mut k = i;
        while k > start && b[k - 1] == b'\\' {
            k -= 1;
        }
        if (i - k) % 2 == 0 {
            return ScalarEnd::Exact(Some(i));
        }
        i += 1;
    }
}

/// Whether the line after the break at `newline` looks like the start of a
/// new entry no deeper than `indent`.
fn next_line_ends_string(input: &str, newline: usize, indent: usize) -> bool {
    let line_start = newline + 1;
    let line_end = input[line_start..]
        .find('\n')
        .map(|o| line_start + o)
        .unwrap_or(input.len());
    match next_entry_re().captures(&input[line_start..line_end]) {
        Some(caps) => caps.get(1).map_or(0, |m| m.len()) <= indent,
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_ends_at_colon_space() {
        let input = "value more: 1";
        assert_eq!(plain_scalar_end(input, 0, 0), 10);
    }

    #[test]
    fn test_plain_colon_without_space_is_content() {
        let input = "http://example.com\nnext: 1";
        assert_eq!(plain_scalar_end(input, 0, 0), 18);
    }

    #[test]
    fn test_plain_ends_at_comment() {
        let input = "value # trailing";
        assert_eq!(plain_scalar_end(input, 0, 0), 5);
    }

    #[test]
    fn test_plain_continuation_lines() {
        let input = "first line\n  continued\nnext: 1";
        // The continuation is indented past 0, so the scalar runs to the
        // newline before `next`.
        assert_eq!(plain_scalar_end(input, 0, 0), 22);
    }

    #[test]
    fn test_plain_ends_at_unindented_line() {
        let input = "first line\nsecond: 1";
        assert_eq!(plain_scalar_end(input, 0, 0), 10);
    }

    #[test]
    fn test_single_quote_end() {
        let input = "some_key: 'text' rest";
        assert_eq!(
            quoted_scalar_end(input, b'\'', 11, false, 0),
            ScalarEnd::Exact(Some(15))
        );
    }

    #[test]
    fn test_single_quote_doubled_escape() {
        let input = "'it''s'";
        assert_eq!(
            quoted_scalar_end(input, b'\'', 1, false, 0),
            ScalarEnd::Exact(Some(6))
        );
    }

    #[test]
    fn test_single_quote_missing_end() {
        let input = "'never closed";
        assert_eq!(
            quoted_scalar_end(input, b'\'', 1, false, 0),
            ScalarEnd::Exact(None)
        );
    }

    #[test]
    fn test_double_quote_backslash_escapes() {
        let input = r#""say \"hi\"" rest"#;
        assert_eq!(
            quoted_scalar_end(input, b'"', 1, true, 0),
            ScalarEnd::Exact(Some(11))
        );
    }

    #[test]
    fn test_double_quote_guess_at_next_entry() {
        let input = "\"no end here\nnext_key: \"ok\"";
        assert_eq!(
            quoted_scalar_end(input, b'"', 1, true, 0),
            ScalarEnd::Guess(12)
        );
    }

    #[test]
    fn test_double_quote_continuation_is_not_a_guess() {
        let input = "\"wraps to\n  the next line\"";
        assert_eq!(
            quoted_scalar_end(input, b'"', 1, true, 0),
            ScalarEnd::Exact(Some(25))
        );
    }

    #[test]
    fn test_double_quote_guess_at_exhaustion() {
        let input = "\"runs off the end";
        assert_eq!(
            quoted_scalar_end(input, b'"', 1, true, 0),
            ScalarEnd::Guess(17)
        );
    }

    #[test]
    fn test_guess_at_sequence_item() {
        let input = "\"no end\n- item";
        assert_eq!(
            quoted_scalar_end(input, b'"', 1, true, 0),
            ScalarEnd::Guess(7)
        );
    }
}
