//! SAX-style YAML walker.
//!
//! The walker drives over a mutable buffer and reports structure through
//! events rather than building values:
//!
//! - `open` fires when the walker is about to read a node. The listener may
//!   splice `state.input` in place (at or beyond the upcoming token) and the
//!   walker continues from the updated buffer; it never rewinds.
//! - `close` fires when the node has been read, with `state.kind`,
//!   `state.anchor`, and `state.tag` describing it.
//! - `warning` delivers recoverable faults, currently the deficient
//!   indentation of an under-indented flow-scalar continuation line.
//!
//! Hard faults are returned as [`ParseFault`]s, always tagged with a byte
//! position. The covered surface is the YAML found in real configuration
//! files: block and flow collections, the three flow scalar styles, block
//! scalars, anchors, aliases, tags, directives, and document markers.

use log::trace;

/// Recursion guard for pathologically nested documents.
const MAX_DEPTH: usize = 256;

/// What kind of node a `close` event is reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Scalar,
    Sequence,
    Mapping,
}

/// A position-tagged parse failure.
#[derive(Debug, Clone)]
pub struct ParseFault {
    pub reason: String,
    pub position: usize,
}

impl ParseFault {
    fn new(reason: impl Into<String>, position: usize) -> Self {
        Self {
            reason: reason.into(),
            position,
        }
    }
}

/// Classification of recoverable warnings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WarningKind {
    DeficientIndentation,
}

/// A recoverable fault the walker parsed through.
#[derive(Debug, Clone)]
pub struct ParseWarning {
    pub kind: WarningKind,
    pub reason: String,
    pub position: usize,
}

/// Callbacks delivered while walking a document.
pub trait ParseEvents {
    fn open(&mut self, state: &mut ParserState);
    fn close(&mut self, state: &mut ParserState);
    fn warning(&mut self, state: &ParserState, warning: ParseWarning);
}

/// Reading context of the node being composed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Context {
    /// Block context: block sequences and mappings may start here.
    Block,
    /// The same-line value of a mapping entry.
    Value,
    /// An implicit mapping key: restricted to a single line.
    Key,
    /// Inside a flow collection.
    Flow,
}

/// The walker's mutable cursor over the buffer.
///
/// `input` always carries a trailing `\u{0000}` sentinel past `length`;
/// reads beyond the end return 0 rather than panicking, and listeners that
/// splice the buffer keep the sentinel in place.
#[derive(Debug)]
pub struct ParserState {
    pub input: String,
    pub length: usize,
    pub filename: Option<String>,
    pub position: usize,
    pub line: usize,
    pub line_start: usize,
    pub line_indent: usize,
    /// Node description exposed to `close`.
    pub kind: Option<NodeKind>,
    pub anchor: Option<String>,
    pub tag: Option<String>,
    pub anchor_position: usize,
    depth: usize,
}

impl ParserState {
    pub fn new(content: &str, filename: Option<&str>) -> Self {
        let mut input = String::with_capacity(content.len() + 1);
        input.push_str(content);
        input.push('\u{0}');
        let line_indent = content.bytes().take_while(|&b| b == b' ').count();
        Self {
            input,
            length: content.len(),
            filename: filename.map(String::from),
            position: 0,
            line: 0,
            line_start: 0,
            line_indent,
            kind: None,
            anchor: None,
            tag: None,
            anchor_position: 0,
            depth: 0,
        }
    }

    /// Byte at `i`, 0 past the end of the content.
    pub fn byte(&self, i: usize) -> u8 {
        if i < self.length {
            self.input.as_bytes()[i]
        } else {
            0
        }
    }

    /// The content without the sentinel.
    pub fn content(&self) -> &str {
        &self.input[..self.length]
    }

    /// Splice the buffer in place, keeping `length` and the sentinel
    /// consistent. Callers must not touch bytes before `position`.
    pub fn splice(&mut self, position: usize, remove: usize, insert: &str) {
        debug_assert!(position >= self.position);
        debug_assert!(position + remove <= self.length);
        self.input.replace_range(position..position + remove, insert);
        self.length = self.length + insert.len() - remove;
    }

    fn column(&self) -> usize {
        self.position - self.line_start
    }

    /// Move forward to `target`, updating line bookkeeping across any line
    /// breaks passed over.
    fn advance_to(&mut self, target: usize) {
        let bytes = self.input.as_bytes();
        let mut crossed = false;
        while self.position < target {
            if bytes[self.position] == b'\n' {
                self.line += 1;
                self.line_start = self.position + 1;
                crossed = true;
            }
            self.position += 1;
        }
        if crossed {
            let mut i = self.line_start;
            let mut indent = 0;
            while self.byte(i) == b' ' {
                i += 1;
                indent += 1;
            }
            self.line_indent = indent;
        }
    }
}

fn is_white(b: u8) -> bool {
    b == b' ' || b == b'\t' || b == b'\r'
}

fn is_ws_or_eof(b: u8) -> bool {
    is_white(b) || b == b'\n' || b == 0
}

fn is_flow_indicator(b: u8) -> bool {
    matches!(b, b',' | b'[' | b']' | b'{' | b'}')
}

/// Walk a document stream, delivering events to `events`.
pub fn parse<E: ParseEvents>(state: &mut ParserState, events: &mut E) -> Result<(), ParseFault> {
    skip_separation(state, events, true, -1);
    while state.position < state.length {
        while state.byte(state.position) == b'%' && state.position == state.line_start {
            skip_comment_line(state);
            skip_separation(state, events, true, -1);
        }
        if at_marker(state, b"---") || at_marker(state, b"...") {
            state.advance_to(state.position + 3);
            skip_separation(state, events, true, -1);
            continue;
        }
        if state.position >= state.length {
            break;
        }

        let before = state.position;
        compose_node(state, events, -1, Context::Block)?;
        if state.kind.is_none() && state.position == before {
            return Err(ParseFault::new(
                "end of the stream or a document separator is expected",
                state.position,
            ));
        }
        skip_separation(state, events, true, -1);
        if at_marker(state, b"---") || at_marker(state, b"...") {
            continue;
        }
        if state.position < state.length {
            return Err(ParseFault::new(
                "end of the stream or a document separator is expected",
                state.position,
            ));
        }
    }
    Ok(())
}

/// Whether the cursor sits on a `---`/`...` marker at column 0.
fn at_marker(state: &ParserState, marker: &[u8]) -> bool {
    state.position == state.line_start
        && state.line_indent == 0
        && state.position + 3 <= state.length
        && &state.input.as_bytes()[state.position..state.position + 3] == marker
        && is_ws_or_eof(state.byte(state.position + 3))
}

/// Skip spaces, tabs, comments (when allowed), and line breaks.
///
/// `check_indent >= 0` arms the deficient-indentation warning: landing on a
/// content line indented left of it reports the line, once per call.
fn skip_separation<E: ParseEvents>(
    state: &mut ParserState,
    events: &mut E,
    allow_comments: bool,
    check_indent: isize,
) -> usize {
    let mut breaks = 0;
    loop {
        while is_white(state.byte(state.position)) {
            state.position += 1;
        }
        if allow_comments && state.byte(state.position) == b'#' {
            skip_comment_line(state);
        }
        if state.byte(state.position) == b'\n' && state.position < state.length {
            breaks += 1;
            state.position += 1;
            state.line += 1;
            state.line_start = state.position;
            let mut indent = 0;
            while state.byte(state.position) == b' ' {
                state.position += 1;
                indent += 1;
            }
            state.line_indent = indent;
        } else {
            break;
        }
    }
    if breaks > 0
        && check_indent >= 0
        && (state.line_indent as isize) < check_indent
        && state.position < state.length
        && state.byte(state.position) != b'\n'
    {
        events.warning(
            state,
            ParseWarning {
                kind: WarningKind::DeficientIndentation,
                reason: "deficient indentation".to_string(),
                position: state.position,
            },
        );
    }
    breaks
}

fn skip_comment_line(state: &mut ParserState) {
    while state.position < state.length && state.byte(state.position) != b'\n' {
        state.position += 1;
    }
}

fn skip_spaces(state: &mut ParserState) {
    while is_white(state.byte(state.position)) {
        state.position += 1;
    }
}

/// Compose one node: fire `open`, read properties and body, fire `close`.
fn compose_node<E: ParseEvents>(
    state: &mut ParserState,
    events: &mut E,
    parent_indent: isize,
    ctx: Context,
) -> Result<(), ParseFault> {
    if state.depth >= MAX_DEPTH {
        return Err(ParseFault::new(
            "the document is nested too deeply to parse",
            state.position,
        ));
    }
    state.depth += 1;
    events.open(state);
    state.kind = None;
    state.anchor = None;
    state.tag = None;

    let line_before = state.line;
    read_node_properties(state, events)?;
    let anchor = state.anchor.take();
    let tag = state.tag.take();
    let anchor_position = state.anchor_position;

    // Properties may push the node body onto its own line, where block
    // collections become possible again.
    let ctx = if ctx == Context::Value && state.line != line_before {
        Context::Block
    } else {
        ctx
    };
    let kind = read_node_body(state, events, parent_indent, ctx)?;

    state.kind = kind;
    state.anchor = anchor;
    state.tag = tag;
    state.anchor_position = anchor_position;
    state.depth -= 1;
    events.close(state);
    Ok(())
}

/// Read `&anchor` and `!tag` properties, in either order.
fn read_node_properties<E: ParseEvents>(
    state: &mut ParserState,
    events: &mut E,
) -> Result<(), ParseFault> {
    loop {
        match state.byte(state.position) {
            b'&' => {
                state.anchor_position = state.position;
                state.position += 1;
                let start = state.position;
                while !is_ws_or_eof(state.byte(state.position))
                    && !is_flow_indicator(state.byte(state.position))
                {
                    state.position += 1;
                }
                if state.position == start {
                    return Err(ParseFault::new(
                        "name of an anchor node must contain at least one character",
                        state.position,
                    ));
                }
                state.anchor = Some(state.input[start..state.position].to_string());
                skip_separation(state, events, true, -1);
            }
            b'!' => {
                let start = state.position;
                state.position += 1;
                if state.byte(state.position) == b'<' {
                    while state.position < state.length && state.byte(state.position) != b'>' {
                        state.position += 1;
                    }
                    if state.byte(state.position) == b'>' {
                        state.position += 1;
                    } else {
                        return Err(ParseFault::new(
                            "unexpected end of the stream within a verbatim tag",
                            state.position,
                        ));
                    }
                } else {
                    while !is_ws_or_eof(state.byte(state.position))
                        && !is_flow_indicator(state.byte(state.position))
                    {
                        state.position += 1;
                    }
                }
                state.tag = Some(state.input[start..state.position].to_string());
                skip_separation(state, events, true, -1);
            }
            _ => return Ok(()),
        }
    }
}

/// Dispatch to the reader matching the upcoming token.
fn read_node_body<E: ParseEvents>(
    state: &mut ParserState,
    events: &mut E,
    parent_indent: isize,
    ctx: Context,
) -> Result<Option<NodeKind>, ParseFault> {
    if state.position >= state.length {
        return Ok(None);
    }
    let b = state.byte(state.position);
    let block = ctx == Context::Block;

    if b == b'*' {
        return read_alias(state);
    }
    if block && b == b'-' && is_ws_or_eof(state.byte(state.position + 1)) {
        let column = state.column();
        return read_block_sequence(state, events, column);
    }
    if block && looks_like_mapping_entry(state) {
        let column = state.column();
        return read_block_mapping(state, events, column);
    }
    match b {
        b'[' => read_flow_sequence(state, events),
        b'{' => read_flow_mapping(state, events),
        b'|' | b'>' if ctx != Context::Flow && ctx != Context::Key => {
            read_block_scalar(state, parent_indent)
        }
        b'\'' => read_single_quoted(state, events, parent_indent + 1),
        b'"' => read_double_quoted(state, events, parent_indent + 1),
        _ => read_plain(state, parent_indent, ctx),
    }
}

fn read_alias(state: &mut ParserState) -> Result<Option<NodeKind>, ParseFault> {
    state.position += 1;
    let start = state.position;
    while !is_ws_or_eof(state.byte(state.position))
        && !is_flow_indicator(state.byte(state.position))
    {
        state.position += 1;
    }
    if state.position == start {
        return Err(ParseFault::new(
            "name of an alias node must contain at least one character",
            state.position,
        ));
    }
    Ok(Some(NodeKind::Scalar))
}

/// Decide whether the current line starts `key: …`, including quoted and
/// flow-collection keys. A pure lookahead: no events, no cursor movement.
fn looks_like_mapping_entry(state: &ParserState) -> bool {
    let bytes = state.input.as_bytes();
    let mut i = state.position;
    if bytes[i] == b'?' && is_ws_or_eof(state.byte(i + 1)) {
        return true;
    }
    match bytes[i] {
        q @ (b'"' | b'\'') => {
            i += 1;
            while i < state.length && bytes[i] != b'\n' {
                if bytes[i] == q {
                    if q == b'\'' && state.byte(i + 1) == b'\'' {
                        i += 2;
                        continue;
                    }
                    return colon_follows(state, i + 1);
                }
                if q == b'"' && bytes[i] == b'\\' {
                    i += 1;
                }
                i += 1;
            }
            false
        }
        b'[' | b'{' => {
            let mut depth = 0usize;
            while i < state.length && bytes[i] != b'\n' {
                match bytes[i] {
                    b'[' | b'{' => depth += 1,
                    b']' | b'}' => {
                        depth -= 1;
                        if depth == 0 {
                            return colon_follows(state, i + 1);
                        }
                    }
                    _ => {}
                }
                i += 1;
            }
            false
        }
        _ => {
            while i < state.length && bytes[i] != b'\n' {
                if bytes[i] == b':' && is_ws_or_eof(state.byte(i + 1)) {
                    return true;
                }
                if bytes[i] == b'#' && i > state.position && is_white(bytes[i - 1]) {
                    return false;
                }
                i += 1;
            }
            false
        }
    }
}

/// Spaces, then a value-introducing colon.
fn colon_follows(state: &ParserState, mut i: usize) -> bool {
    while is_white(state.byte(i)) {
        i += 1;
    }
    state.byte(i) == b':' && is_ws_or_eof(state.byte(i + 1))
}

fn read_block_sequence<E: ParseEvents>(
    state: &mut ParserState,
    events: &mut E,
    seq_indent: usize,
) -> Result<Option<NodeKind>, ParseFault> {
    trace!("block sequence at {}:{}", state.line, seq_indent);
    loop {
        // Cursor is on the dash.
        state.position += 1;
        if is_white(state.byte(state.position)) {
            skip_spaces(state);
            compose_node(state, events, seq_indent as isize, Context::Block)?;
        } else {
            // Dash alone on its line: the item is on following lines or null.
            skip_separation(state, events, true, -1);
            if state.position < state.length && state.line_indent > seq_indent {
                compose_node(state, events, seq_indent as isize, Context::Block)?;
            }
        }
        skip_separation(state, events, true, -1);
        if state.position >= state.length || at_marker(state, b"---") || at_marker(state, b"...") {
            break;
        }
        if state.line_indent == seq_indent
            && state.byte(state.position) == b'-'
            && is_ws_or_eof(state.byte(state.position + 1))
        {
            continue;
        }
        if state.line_indent > seq_indent {
            return Err(ParseFault::new(
                "bad indentation of a sequence entry",
                state.position,
            ));
        }
        break;
    }
    Ok(Some(NodeKind::Sequence))
}

fn read_block_mapping<E: ParseEvents>(
    state: &mut ParserState,
    events: &mut E,
    map_indent: usize,
) -> Result<Option<NodeKind>, ParseFault> {
    trace!("block mapping at {}:{}", state.line, map_indent);
    loop {
        if state.byte(state.position) == b'?' && is_ws_or_eof(state.byte(state.position + 1)) {
            // Explicit key on its own line(s).
            state.position += 1;
            skip_separation(state, events, true, -1);
            compose_node(state, events, map_indent as isize, Context::Block)?;
            skip_separation(state, events, true, -1);
            if state.line_indent == map_indent
                && state.byte(state.position) == b':'
                && is_ws_or_eof(state.byte(state.position + 1))
            {
                state.position += 1;
                read_mapping_value(state, events, map_indent)?;
            }
        } else {
            compose_node(state, events, map_indent as isize, Context::Key)?;
            skip_spaces(state);
            if state.byte(state.position) == b':' && is_ws_or_eof(state.byte(state.position + 1)) {
                state.position += 1;
                read_mapping_value(state, events, map_indent)?;
            } else {
                return Err(ParseFault::new(
                    "can not read an implicit mapping pair; a colon is missed",
                    state.position,
                ));
            }
        }

        skip_separation(state, events, true, -1);
        if state.position >= state.length || at_marker(state, b"---") || at_marker(state, b"...") {
            break;
        }
        if state.line_indent < map_indent {
            break;
        }
        if state.line_indent > map_indent {
            return Err(ParseFault::new(
                "bad indentation of a mapping entry",
                state.position,
            ));
        }
    }
    Ok(Some(NodeKind::Mapping))
}

/// Read the value part of a mapping entry; the cursor is just past the
/// colon. Null values compose no node.
fn read_mapping_value<E: ParseEvents>(
    state: &mut ParserState,
    events: &mut E,
    map_indent: usize,
) -> Result<(), ParseFault> {
    let breaks = skip_separation(state, events, true, -1);
    if state.position >= state.length {
        return Ok(());
    }
    if breaks == 0 {
        compose_node(state, events, map_indent as isize, Context::Value)?;
        skip_spaces(state);
        if state.byte(state.position) == b'#' {
            skip_comment_line(state);
        }
        let b = state.byte(state.position);
        if b == b':' && is_ws_or_eof(state.byte(state.position + 1)) {
            return Err(ParseFault::new(
                "mapping values are not allowed here",
                state.position,
            ));
        }
        if b != b'\n' && state.position < state.length {
            return Err(ParseFault::new(
                "unexpected content after a mapping value",
                state.position,
            ));
        }
        return Ok(());
    }
    if at_marker(state, b"---") || at_marker(state, b"...") {
        return Ok(());
    }
    if state.line_indent > map_indent {
        compose_node(state, events, map_indent as isize, Context::Block)?;
    } else if state.line_indent == map_indent
        && state.byte(state.position) == b'-'
        && is_ws_or_eof(state.byte(state.position + 1))
    {
        // A block sequence may sit at the same indent as its key.
        compose_node(state, events, map_indent as isize - 1, Context::Block)?;
    }
    Ok(())
}

fn read_flow_sequence<E: ParseEvents>(
    state: &mut ParserState,
    events: &mut E,
) -> Result<Option<NodeKind>, ParseFault> {
    state.position += 1;
    skip_separation(state, events, true, -1);
    loop {
        if state.byte(state.position) == b']' {
            state.position += 1;
            return Ok(Some(NodeKind::Sequence));
        }
        if state.position >= state.length {
            return Err(ParseFault::new(
                "unexpected end of the stream within a flow sequence",
                state.position,
            ));
        }
        compose_node(state, events, state.line_indent as isize, Context::Flow)?;
        skip_separation(state, events, true, -1);
        if state.byte(state.position) == b':' && is_ws_or_eof(state.byte(state.position + 1)) {
            // A single-pair mapping entry, `[key: value]`.
            state.position += 1;
            skip_separation(state, events, true, -1);
            compose_node(state, events, state.line_indent as isize, Context::Flow)?;
            skip_separation(state, events, true, -1);
        }
        match state.byte(state.position) {
            b',' => {
                state.position += 1;
                skip_separation(state, events, true, -1);
            }
            b']' => {}
            _ if state.position >= state.length => {}
            _ => {
                return Err(ParseFault::new(
                    "missed comma between flow collection entries",
                    state.position,
                ));
            }
        }
    }
}

fn read_flow_mapping<E: ParseEvents>(
    state: &mut ParserState,
    events: &mut E,
) -> Result<Option<NodeKind>, ParseFault> {
    state.position += 1;
    skip_separation(state, events, true, -1);
    loop {
        if state.byte(state.position) == b'}' {
            state.position += 1;
            return Ok(Some(NodeKind::Mapping));
        }
        if state.position >= state.length {
            return Err(ParseFault::new(
                "unexpected end of the stream within a flow mapping",
                state.position,
            ));
        }
        if state.byte(state.position) == b'?' && is_ws_or_eof(state.byte(state.position + 1)) {
            state.position += 1;
            skip_separation(state, events, true, -1);
        }
        compose_node(state, events, state.line_indent as isize, Context::Flow)?;
        skip_separation(state, events, true, -1);
        if state.byte(state.position) == b':'
            && (is_ws_or_eof(state.byte(state.position + 1))
                || is_flow_indicator(state.byte(state.position + 1)))
        {
            state.position += 1;
            skip_separation(state, events, true, -1);
            if state.byte(state.position) != b',' && state.byte(state.position) != b'}' {
                compose_node(state, events, state.line_indent as isize, Context::Flow)?;
                skip_separation(state, events, true, -1);
            }
        }
        match state.byte(state.position) {
            b',' => {
                state.position += 1;
                skip_separation(state, events, true, -1);
            }
            b'}' => {}
            _ if state.position >= state.length => {}
            _ => {
                return Err(ParseFault::new(
                    "missed comma between flow collection entries",
                    state.position,
                ));
            }
        }
    }
}

fn read_single_quoted<E: ParseEvents>(
    state: &mut ParserState,
    events: &mut E,
    check_indent: isize,
) -> Result<Option<NodeKind>, ParseFault> {
    state.position += 1;
    loop {
        let b = state.byte(state.position);
        if state.position >= state.length {
            return Err(ParseFault::new(
                "unexpected end of the stream within a single quoted scalar",
                state.position,
            ));
        }
        match b {
            b'\'' => {
                if state.byte(state.position + 1) == b'\'' {
                    state.position += 2;
                } else {
                    state.position += 1;
                    return Ok(Some(NodeKind::Scalar));
                }
            }
            b'\n' => {
                skip_separation(state, events, false, check_indent);
            }
            _ => state.position += 1,
        }
    }
}

fn read_double_quoted<E: ParseEvents>(
    state: &mut ParserState,
    events: &mut E,
    check_indent: isize,
) -> Result<Option<NodeKind>, ParseFault> {
    state.position += 1;
    loop {
        let b = state.byte(state.position);
        if state.position >= state.length {
            return Err(ParseFault::new(
                "unexpected end of the stream within a double quoted scalar",
                state.position,
            ));
        }
        match b {
            b'"' => {
                state.position += 1;
                return Ok(Some(NodeKind::Scalar));
            }
            b'\\' => {
                state.position += 1;
                if state.byte(state.position) == b'\n' {
                    skip_separation(state, events, false, check_indent);
                } else if state.position < state.length {
                    state.position += 1;
                }
            }
            b'\n' => {
                skip_separation(state, events, false, check_indent);
            }
            _ => state.position += 1,
        }
    }
}

fn read_block_scalar(
    state: &mut ParserState,
    parent_indent: isize,
) -> Result<Option<NodeKind>, ParseFault> {
    // Header: '|' or '>', then chomping/indentation modifiers, then EOL.
    state.position += 1;
    let mut explicit: Option<usize> = None;
    loop {
        match state.byte(state.position) {
            b'+' | b'-' => state.position += 1,
            d @ b'1'..=b'9' => {
                explicit = Some((d - b'0') as usize);
                state.position += 1;
            }
            _ => break,
        }
    }
    skip_spaces(state);
    if state.byte(state.position) == b'#' {
        skip_comment_line(state);
    }
    if state.position < state.length && state.byte(state.position) != b'\n' {
        return Err(ParseFault::new(
            "unexpected content after a block scalar header",
            state.position,
        ));
    }

    // Content: lines indented past the parent (or the explicit indent).
    let bytes = state.input.as_bytes();
    let mut text_indent =
        explicit.map(|d| (parent_indent.max(0) as usize) + d);
    let mut scan = state.position;
    let mut end = state.position;
    while scan < state.length && bytes[scan] == b'\n' {
        let line_start = scan + 1;
        let mut i = line_start;
        let mut indent = 0;
        while i < state.length && bytes[i] == b' ' {
            i += 1;
            indent += 1;
        }
        if i >= state.length || bytes[i] == b'\n' {
            // Blank line: belongs to the scalar, keep scanning.
            scan = i;
            if i >= state.length {
                end = i;
            }
            continue;
        }
        let qualifies = match text_indent {
            Some(ti) => indent >= ti,
            None => {
                if (indent as isize) > parent_indent {
                    text_indent = Some(indent);
                    true
                } else {
                    false
                }
            }
        };
        if !qualifies {
            break;
        }
        // Consume the whole content line.
        while i < state.length && bytes[i] != b'\n' {
            i += 1;
        }
        scan = i;
        end = i;
    }
    state.advance_to(end);
    Ok(Some(NodeKind::Scalar))
}

/// Plain (unquoted) scalar. Returns `None` when the cursor cannot start
/// one, leaving the cursor in place for the caller to report.
fn read_plain(
    state: &mut ParserState,
    parent_indent: isize,
    ctx: Context,
) -> Result<Option<NodeKind>, ParseFault> {
    let b = state.byte(state.position);
    let start = state.position;
    let indicator = matches!(
        b,
        b',' | b'[' | b']' | b'{' | b'}' | b'#' | b'&' | b'*' | b'!' | b'|' | b'>' | b'\'' | b'"'
            | b'%' | b'@' | b'`'
    );
    let dashlike = matches!(b, b'-' | b'?' | b':') && is_ws_or_eof(state.byte(state.position + 1));
    if indicator || dashlike || b == 0 {
        return Ok(None);
    }

    match ctx {
        Context::Key => {
            // Simple keys stay on one line.
            while state.position < state.length {
                let c = state.byte(state.position);
                if c == b'\n' {
                    break;
                }
                if c == b':' && is_ws_or_eof(state.byte(state.position + 1)) {
                    break;
                }
                if c == b'#' && state.position > start && is_white(state.byte(state.position - 1))
                {
                    break;
                }
                state.position += 1;
            }
            trim_trailing_spaces(state, start);
        }
        Context::Flow => {
            while state.position < state.length {
                let c = state.byte(state.position);
                if c == b'\n' {
                    break;
                }
                if is_flow_indicator(c) {
                    break;
                }
                if c == b':'
                    && (is_ws_or_eof(state.byte(state.position + 1))
                        || is_flow_indicator(state.byte(state.position + 1)))
                {
                    break;
                }
                if c == b'#' && state.position > start && is_white(state.byte(state.position - 1))
                {
                    break;
                }
                state.position += 1;
            }
            trim_trailing_spaces(state, start);
        }
        Context::Block | Context::Value => {
            let indent = parent_indent.max(0) as usize;
            let end = crate::boundary::plain_scalar_end(state.content(), start, indent);
            state.advance_to(end);
            trim_trailing_spaces(state, start);
        }
    }
    if state.position == start {
        return Ok(None);
    }
    Ok(Some(NodeKind::Scalar))
}

fn trim_trailing_spaces(state: &mut ParserState, start: usize) {
    while state.position > start && is_white(state.byte(state.position - 1)) {
        state.position -= 1;
    }
}
