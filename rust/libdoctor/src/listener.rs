//! The checking session.
//!
//! A `ParseSession` rides along with the base parser. At every `open` event
//! it peeks at the upcoming token and runs the intent detectors; each
//! detected fault is recorded as an issue and repaired in place so parsing
//! can continue past it. Repairs always land in the state buffer (the
//! parser must make progress) and additionally in the fixed buffer when the
//! caller asked for repairs — only then is the issue promoted to `fixed`.
//!
//! Positions cross buffers through the two string editors: a state-buffer
//! position maps back to the original text for the issue mark, and from the
//! original text forward into the fixed buffer for the repair site.

use std::sync::OnceLock;

use log::debug;
use regex::Regex;

use crate::boundary::{quoted_scalar_end, ScalarEnd};
use crate::editor::{line_col, StringEditor};
use crate::error::CheckError;
use crate::invariant;
use crate::issue::{Issue, Level, Mark};
use crate::parser::{
    parse, NodeKind, ParseEvents, ParseFault, ParseWarning, ParserState, WarningKind,
};
use crate::CheckOptions;

/// Text that may legitimately follow a closing quote: end of input, or
/// whitespace and then a token separator.
fn tokens_after_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\s*($|[:,\]}\n#])").unwrap())
}

/// An unquoted `{{ variable }}` substitution.
fn variable_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\{\{\s*\w+\s*\}\}").unwrap())
}

/// Anchor names that are probably HTML entities: `&amp;`, `&#38;`, `&#x26;`.
fn entity_anchor_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^((#\d+)|(#x[0-9a-fA-F]+)|(\w+));$").unwrap())
}

/// A bracketed run with no quotes that could be mistaken for a flow
/// sequence.
fn bracket_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#"^\[[^"'\[\]\n]*\]"#).unwrap())
}

/// Highest position each per-site detector has already examined; `open`
/// fires repeatedly at one location when nested contexts begin there, and
/// the thresholds keep every detector to a single shot per site.
#[derive(Debug, Default)]
struct Thresholds {
    quoted: Option<usize>,
    variable: Option<usize>,
    at_sign: Option<usize>,
    bracket: Option<usize>,
}

fn passes(threshold: &Option<usize>, next: usize) -> bool {
    threshold.map_or(true, |t| next > t)
}

/// Where a node began, for matching close-time repairs to open-time state.
#[derive(Debug, Clone, Copy)]
struct OpenFrame {
    next: usize,
    line: usize,
    indent: usize,
}

/// A deficient-indentation warning waiting for its scalar to close.
#[derive(Debug, Clone, Copy)]
struct PendingWarning {
    issue: usize,
    position: usize,
}

/// One checking session over one document.
pub struct ParseSession {
    debug: bool,
    filename: Option<String>,
    state_map: StringEditor,
    fixed: Option<StringEditor>,
    issues: Vec<Issue>,
    thresholds: Thresholds,
    frames: Vec<OpenFrame>,
    pending: Vec<PendingWarning>,
    internal_fault: Option<String>,
}

impl ParseSession {
    pub fn new(text: &str, options: &CheckOptions) -> Self {
        let mut session = Self {
            debug: options.debug,
            filename: options.filename.clone(),
            state_map: StringEditor::new(text),
            fixed: options.fix.then(|| StringEditor::new(text)),
            issues: Vec::new(),
            thresholds: Thresholds::default(),
            frames: Vec::new(),
            pending: Vec::new(),
            internal_fault: None,
        };
        session.scan_invalid_characters(text, options.remove_invalid_characters);
        session
    }

    /// Parse the (pre-scanned) state buffer, translating the terminating
    /// fault, if any, into an issue.
    pub fn run(&mut self) -> Result<(), CheckError> {
        let content = self.state_map.value().to_string();
        let mut state = ParserState::new(&content, self.filename.as_deref());
        if let Err(fault) = parse(&mut state, self) {
            self.record_fault(&state, fault);
        }
        if let Some(reason) = self.internal_fault.take() {
            return Err(CheckError::Internal(reason));
        }
        Ok(())
    }

    /// Hand the results to the caller, consuming the session.
    pub fn finish(self) -> (Vec<Issue>, Option<String>) {
        (self.issues, self.fixed.map(StringEditor::into_value))
    }

    fn fixing(&self) -> bool {
        self.fixed.is_some()
    }

    /// Strip forbidden code points before the parser ever sees them.
    fn scan_invalid_characters(&mut self, text: &str, remove_from_fixed: bool) {
        for found in invariant::find_non_printables(text) {
            let len = found.ch.len_utf8();
            let fixable = remove_from_fixed && self.fixing();
            let (line, column) = line_col(text, found.position);
            let level = if fixable { Level::Fixed } else { Level::Error };
            self.issues.push(Issue::new(
                level,
                invariant::reason(found.ch),
                Mark {
                    position: found.position,
                    line,
                    column,
                    name: self.filename.clone(),
                },
            ));
            let state_pos = self.state_map.current_position(found.position);
            self.state_map.splice(state_pos, len, "");
            if remove_from_fixed {
                if let Some(fixed) = &mut self.fixed {
                    let fixed_pos = fixed.current_position(found.position);
                    fixed.splice(fixed_pos, len, "");
                }
            }
        }
    }

    /// Record an issue whose mark points at the original source.
    fn push_issue(
        &mut self,
        level: Level,
        reason: impl Into<String>,
        state_position: usize,
        fixable: bool,
    ) -> usize {
        let level = if fixable && self.fixing() {
            Level::Fixed
        } else {
            level
        };
        let reason = reason.into();
        let mark = self
            .state_map
            .mark_original_position(state_position, self.filename.as_deref());
        if self.debug {
            debug!("issue {} at {}:{}: {}", level, mark.line, mark.column, reason);
        }
        self.issues.push(Issue::new(level, reason, mark));
        self.issues.len() - 1
    }

    /// Splice the state buffer (always) and the fixed buffer (when fixing)
    /// at corresponding positions.
    fn splice_both(
        &mut self,
        state: &mut ParserState,
        position: usize,
        remove: usize,
        insert: &str,
    ) {
        let original = self.state_map.original_position(position);
        state.splice(position, remove, insert);
        self.state_map.splice(position, remove, insert);
        if let Some(fixed) = &mut self.fixed {
            let fixed_position = fixed.current_position(original);
            fixed.splice(fixed_position, remove, insert);
        }
        if self.debug {
            debug!("splice at {}: -{} +{:?}", position, remove, insert);
        }
    }

    // ========================================================================
    // Detectors
    // ========================================================================

    /// Detector 1: unescaped inner quotes, runaway strings, bad escapes.
    fn detect_quoted(&mut self, state: &mut ParserState, next: usize) {
        if !passes(&self.thresholds.quoted, next) {
            return;
        }
        self.thresholds.quoted = Some(next);
        let quote = state.byte(next);
        let guessable = quote == b'"';
        let indent = state.line_indent;
        let token_start = next;
        let mut scan = next + 1;
        let mut unescaped = 0usize;
        let mut end_quote: Option<usize> = None;

        loop {
            match quoted_scalar_end(state.content(), quote, scan, guessable, indent) {
                ScalarEnd::Exact(None) => break,
                ScalarEnd::Exact(Some(position)) => {
                    if tokens_after(state.content(), position + 1) {
                        end_quote = Some(position);
                        break;
                    }
                    self.push_issue(
                        Level::Error,
                        "unescaped quote in quoted string",
                        position,
                        true,
                    );
                    let escape = if quote == b'\'' { "'" } else { "\\" };
                    self.splice_both(state, position, 0, escape);
                    unescaped += 1;
                    scan = position + 2;
                }
                ScalarEnd::Guess(position) => {
                    self.push_issue(
                        Level::Error,
                        "quoted string has no end quote",
                        position,
                        true,
                    );
                    // An odd count means the opening quote was probably one
                    // of a paired set of inner quotes: open a fresh string
                    // and escape the original opener.
                    let prefix = if unescaped % 2 == 1 { "\"\\" } else { "" };
                    if !prefix.is_empty() {
                        self.splice_both(state, token_start, 0, prefix);
                    }
                    let close_at = position + prefix.len();
                    self.splice_both(state, close_at, 0, "\"");
                    end_quote = Some(close_at);
                    break;
                }
            }
        }

        if quote == b'"' {
            self.validate_escapes(state, token_start + 1, end_quote);
        }
    }

    /// Scan a double-quoted span for escape sequences YAML does not define,
    /// deleting the stray backslashes.
    fn validate_escapes(&mut self, state: &mut ParserState, start: usize, end_quote: Option<usize>) {
        let mut i = start;
        let mut end = end_quote.unwrap_or(state.length);
        while i < end {
            if state.byte(i) != b'\\' {
                i += 1;
                continue;
            }
            let skip = match state.byte(i + 1) {
                b'0' | b'a' | b'b' | b't' | b'\t' | b'n' | b'v' | b'f' | b'r' | b'e' | b' '
                | b'"' | b'/' | b'\\' | b'N' | b'_' | b'L' | b'P' => Some(2),
                b'x' => hex_run(state, i + 2, 2),
                b'u' => hex_run(state, i + 2, 4),
                b'U' => hex_run(state, i + 2, 8),
                _ => None,
            };
            match skip {
                Some(n) => i += n,
                None => {
                    let shown = state.input[i + 1..]
                        .chars()
                        .next()
                        .unwrap_or(char::REPLACEMENT_CHARACTER);
                    self.push_issue(
                        Level::Error,
                        format!("Invalid escape sequence: \"\\{}\"", shown),
                        i,
                        true,
                    );
                    self.splice_both(state, i, 1, "");
                    end -= 1;
                }
            }
        }
    }

    /// Detector 2: `{{ variable }}` that was meant to be a string.
    fn detect_variable(&mut self, state: &mut ParserState, next: usize) {
        if !passes(&self.thresholds.variable, next) {
            return;
        }
        let matched = match variable_re().find(&state.content()[next..]) {
            Some(m) => m.as_str().to_string(),
            None => return,
        };
        self.thresholds.variable = Some(next);
        self.push_issue(
            Level::Warning,
            format!(
                "Did you mean to substitute a variable? It must be quoted: '{}'",
                matched
            ),
            next,
            true,
        );
        self.splice_both(state, next, 0, "'");
        self.splice_both(state, next + 1 + matched.len(), 0, "'");
    }

    /// Detector 3: a scalar starting with `@`, which YAML reserves.
    fn detect_at_sign(&mut self, state: &mut ParserState, next: usize) {
        if !passes(&self.thresholds.at_sign, next) {
            return;
        }
        self.thresholds.at_sign = Some(next);
        self.push_issue(Level::Warning, "'@' cannot start any token", next, true);
        let indent = state.line_indent;
        self.wrap_in_double_quotes(state, next, indent);
    }

    /// Detector 4: a leading `[` that reads as a flow sequence but was
    /// probably text, e.g. `[citation needed] more prose`.
    fn detect_bracket(&mut self, state: &mut ParserState, next: usize) {
        if !passes(&self.thresholds.bracket, next) {
            return;
        }
        let matched = match bracket_re().find(&state.content()[next..]) {
            Some(m) => m,
            None => return,
        };
        if tokens_after(state.content(), next + matched.end()) {
            return;
        }
        self.thresholds.bracket = Some(next);
        self.push_issue(
            Level::Error,
            "'[' cannot start a string; wrap the value in quotes",
            next,
            true,
        );
        let indent = state.line_indent;
        self.wrap_in_double_quotes(state, next, indent);
    }

    /// Shared repair for detectors 3 and 4: escape interior double quotes,
    /// then wrap the span. An interior quote already followed by a token
    /// separator becomes the closing quote itself.
    fn wrap_in_double_quotes(&mut self, state: &mut ParserState, start: usize, indent: usize) {
        let mut scan = start;
        loop {
            match quoted_scalar_end(state.content(), b'"', scan, true, indent) {
                ScalarEnd::Exact(Some(position)) => {
                    if tokens_after(state.content(), position + 1) {
                        self.splice_both(state, start, 0, "\"");
                        return;
                    }
                    self.splice_both(state, position, 0, "\\");
                    scan = position + 2;
                }
                ScalarEnd::Guess(position) => {
                    self.splice_both(state, start, 0, "\"");
                    self.splice_both(state, position + 1, 0, "\"");
                    return;
                }
                ScalarEnd::Exact(None) => {
                    // Unreachable while guessing is on; close at the end of
                    // the buffer for safety.
                    let end = state.length;
                    self.splice_both(state, start, 0, "\"");
                    self.splice_both(state, end + 1, 0, "\"");
                    return;
                }
            }
        }
    }

    /// Detector 5: an anchor that spells an HTML entity.
    fn detect_entity_anchor(&mut self, state: &ParserState) {
        if let Some(anchor) = &state.anchor {
            if entity_anchor_re().is_match(anchor) {
                let position = state.anchor_position;
                self.push_issue(
                    Level::Warning,
                    format!(
                        "Anchor '&{}' looks like an HTML entity; quote the value if it is meant to be text",
                        anchor
                    ),
                    position,
                    false,
                );
            }
        }
    }

    /// Detector 6: pad under-indented continuation lines of a closed
    /// scalar out to its indent + 2.
    fn fix_deficient_lines(&mut self, state: &ParserState, frame: OpenFrame) {
        let close_position = state.position;
        let mut kept = Vec::new();
        for pending in std::mem::take(&mut self.pending) {
            if pending.position < frame.next || pending.position > close_position {
                kept.push(pending);
                continue;
            }
            let issue_line = self.issues[pending.issue].mark.line;
            if issue_line <= frame.line {
                continue;
            }
            if let Some(fixed) = &mut self.fixed {
                let original = self.issues[pending.issue].mark.position;
                let fixed_position = fixed.current_position(original);
                let line_start = fixed.value()[..fixed_position]
                    .rfind('\n')
                    .map(|i| i + 1)
                    .unwrap_or(0);
                let existing = fixed.value()[line_start..]
                    .bytes()
                    .take_while(|&b| b == b' ')
                    .count();
                let target = frame.indent + 2;
                if existing < target {
                    let padding = " ".repeat(target - existing);
                    fixed.splice(line_start, 0, &padding);
                }
                self.issues[pending.issue].level = Level::Fixed;
            }
        }
        self.pending = kept;
    }

    /// Translate the parser's terminating fault into an issue.
    fn record_fault(&mut self, state: &ParserState, fault: ParseFault) {
        let position = fault.position.min(state.length);
        if state.byte(position) == b'@' {
            // Already reported by the '@' detector.
            return;
        }
        let mut reason = fault.reason;
        if reason.contains("bad indentation") && line_mixes_tabs(state, position) {
            reason = "line is indented with mixed spaces and tabs".to_string();
        }
        self.push_issue(Level::Error, reason, position, false);
    }
}

impl ParseEvents for ParseSession {
    fn open(&mut self, state: &mut ParserState) {
        let next = find_next_non_space(state);
        let line = state.line
            + state.content()[state.position..next.min(state.length)]
                .bytes()
                .filter(|&b| b == b'\n')
                .count();
        self.frames.push(OpenFrame {
            next,
            line,
            indent: state.line_indent,
        });
        if next >= state.length {
            return;
        }
        match state.byte(next) {
            b'\'' | b'"' => self.detect_quoted(state, next),
            b'{' => self.detect_variable(state, next),
            b'@' => self.detect_at_sign(state, next),
            b'[' => self.detect_bracket(state, next),
            _ => {}
        }
    }

    fn close(&mut self, state: &mut ParserState) {
        let frame = match self.frames.pop() {
            Some(frame) => frame,
            None => {
                self.internal_fault = Some("unbalanced parser events".to_string());
                return;
            }
        };
        self.detect_entity_anchor(state);
        if state.kind == Some(NodeKind::Scalar) && !self.pending.is_empty() {
            self.fix_deficient_lines(state, frame);
        }
    }

    fn warning(&mut self, _state: &ParserState, warning: ParseWarning) {
        let index = self.push_issue(Level::Warning, warning.reason.clone(), warning.position, false);
        if warning.kind == WarningKind::DeficientIndentation {
            self.pending.push(PendingWarning {
                issue: index,
                position: warning.position,
            });
        }
    }
}

/// Whether legitimate end-of-scalar text follows `position`.
fn tokens_after(content: &str, position: usize) -> bool {
    position >= content.len() || tokens_after_re().is_match(&content[position..])
}

/// `count` hex digits starting at `start` make a valid numeric escape;
/// returns the full length of the escape from its backslash.
fn hex_run(state: &ParserState, start: usize, count: usize) -> Option<usize> {
    for offset in 0..count {
        if !state.byte(start + offset).is_ascii_hexdigit() {
            return None;
        }
    }
    Some(2 + count)
}

/// Position of the next token: skips whitespace, line breaks, and comments.
fn find_next_non_space(state: &ParserState) -> usize {
    let bytes = state.content().as_bytes();
    let mut i = state.position;
    loop {
        while i < bytes.len() && matches!(bytes[i], b' ' | b'\t' | b'\n' | b'\r') {
            i += 1;
        }
        if i < bytes.len()
            && bytes[i] == b'#'
            && (i == 0 || bytes[i - 1].is_ascii_whitespace())
        {
            while i < bytes.len() && bytes[i] != b'\n' {
                i += 1;
            }
        } else {
            break;
        }
    }
    i
}

/// Whether the line containing `position` is indented with both spaces and
/// tabs.
fn line_mixes_tabs(state: &ParserState, position: usize) -> bool {
    let content = state.content();
    let position = position.min(content.len());
    let line_start = content[..position]
        .rfind('\n')
        .map(|i| i + 1)
        .unwrap_or(0);
    let lead: String = content[line_start..]
        .chars()
        .take_while(|&c| c == ' ' || c == '\t')
        .collect();
    lead.contains(' ') && lead.contains('\t')
}
