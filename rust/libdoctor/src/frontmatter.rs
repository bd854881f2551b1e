//! Markdown front-matter handling.
//!
//! A Markdown page may open with a YAML block between `---` divider lines.
//! `split` separates that block from the body so only the YAML is checked;
//! `join` reassembles the page after fixing. The opening divider is
//! optional: text before the first divider is treated as front-matter only
//! when it plausibly looks like YAML.

use std::sync::OnceLock;

use regex::Regex;

/// A `---` divider on a line of its own.
fn divider_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?m)^---[ \t\r]*$").unwrap())
}

/// Loose test for "this region is probably YAML": optional divider, then
/// blank/comment lines, then something shaped like a mapping key.
fn yaml_ish_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(---\n)?(\s*(#.*)?\n)*\s*[^#\s:]+:").unwrap())
}

/// A divider line at the very start of a region.
fn opener_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^---[ \t\r]*(\n|$)").unwrap())
}

/// Separate front-matter from the Markdown body.
///
/// Returns `(meta, body)` as slices of the input. `meta` is empty when the
/// page has no front-matter; when present it keeps its opening `---` line
/// (if any) but never the closing one.
pub fn split(text: &str) -> (&str, &str) {
    let first = match divider_re().find(text) {
        Some(m) => m,
        None => return ("", text),
    };

    if first.start() == 0 {
        // Opening divider; front-matter runs to the closing divider.
        let body_search = line_end(text, first.end());
        match divider_re().find_at(text, body_search) {
            Some(closer) => (&text[..closer.start()], &text[line_end(text, closer.end())..]),
            None => (text, ""),
        }
    } else {
        // The divider may close front-matter whose opener was omitted.
        let before = &text[..first.start()];
        if yaml_ish_re().is_match(before) {
            (before, &text[line_end(text, first.end())..])
        } else {
            ("", text)
        }
    }
}

/// Reassemble a page from front-matter and body.
///
/// An empty `meta` returns the body untouched; otherwise the result is the
/// front-matter bracketed by divider lines (the opener is introduced when
/// missing).
pub fn join(meta: &str, body: &str) -> String {
    if meta.is_empty() {
        return body.to_string();
    }
    let mut out = String::with_capacity(meta.len() + body.len() + 8);
    if !opener_re().is_match(meta) {
        out.push_str("---\n");
    }
    out.push_str(meta);
    if !meta.ends_with('\n') {
        out.push('\n');
    }
    out.push_str("---\n");
    out.push_str(body);
    out
}

/// Position just past the newline that ends the line containing `from`.
fn line_end(text: &str, from: usize) -> usize {
    match text[from..].find('\n') {
        Some(offset) => from + offset + 1,
        None => text.len(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_front_matter() {
        let text = "# Title\n\nBody text.\n";
        let (meta, body) = split(text);
        assert_eq!(meta, "");
        assert_eq!(body, text);
        assert_eq!(join(meta, body), text);
    }

    #[test]
    fn test_delimited_block() {
        let text = "---\ntitle: Hello\n---\n# Body\n";
        let (meta, body) = split(text);
        assert_eq!(meta, "---\ntitle: Hello\n");
        assert_eq!(body, "# Body\n");
        assert_eq!(join(meta, body), text);
    }

    #[test]
    fn test_unclosed_block_is_all_meta() {
        let text = "---\ntitle: Hello\n";
        let (meta, body) = split(text);
        assert_eq!(meta, text);
        assert_eq!(body, "");
    }

    #[test]
    fn test_optional_opener_yaml_ish() {
        let text = "title: Hello\nauthor: me\n---\nBody\n";
        let (meta, body) = split(text);
        assert_eq!(meta, "title: Hello\nauthor: me\n");
        assert_eq!(body, "Body\n");
        // Joining introduces the canonical opener.
        assert_eq!(join(meta, body), "---\ntitle: Hello\nauthor: me\n---\nBody\n");
    }

    #[test]
    fn test_thematic_break_is_not_a_closer() {
        let text = "Some prose here.\n---\nMore prose.\n";
        let (meta, body) = split(text);
        assert_eq!(meta, "");
        assert_eq!(body, text);
    }

    #[test]
    fn test_comment_lines_pass_the_fuzzy_test() {
        let text = "# generated\ntitle: x\n---\nBody\n";
        let (meta, _) = split(text);
        assert_eq!(meta, "# generated\ntitle: x\n");
    }

    #[test]
    fn test_round_trip_canonical_forms() {
        for text in [
            "plain body, no dividers\n",
            "---\na: 1\nb: 2\n---\nbody\n",
            "---\na: 1\n---\n",
            "---\r\na: 1\r\n---\r\nbody\r\n",
        ] {
            let (meta, body) = split(text);
            if meta.is_empty() || meta.starts_with("---") {
                let rejoined = join(meta, body);
                // CRLF dividers are rewritten canonically; compare modulo
                // carriage returns.
                assert_eq!(
                    rejoined.replace('\r', ""),
                    text.replace('\r', ""),
                    "round trip failed for {:?}",
                    text
                );
            }
        }
    }
}
