//! String editor with position translation.
//!
//! The checker rewrites its buffers while parsing is in flight, yet every
//! reported mark must point at the user's original text and every repair
//! must land at the matching spot in the fixed output. `StringEditor`
//! absorbs out-of-order splices and translates positions between the
//! original and current views of the buffer.
//!
//! Each recorded [`Edit`] stores the *accumulated* displacement of current
//! positions at or beyond it, so translation is a single lookup plus a
//! short forward walk.

use crate::issue::Mark;

/// A recorded splice. `position` is in current-buffer coordinates; `size`
/// is the cumulative displacement (current minus original) for positions at
/// or after `position`, up to the next edit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Edit {
    position: usize,
    size: isize,
}

/// A mutable string that remembers how it has been edited.
#[derive(Debug, Clone)]
pub struct StringEditor {
    original: String,
    value: String,
    edits: Vec<Edit>,
}

impl StringEditor {
    pub fn new(text: &str) -> Self {
        Self {
            original: text.to_string(),
            value: text.to_string(),
            edits: Vec::new(),
        }
    }

    /// The text as originally supplied.
    pub fn original(&self) -> &str {
        &self.original
    }

    /// The text with all edits applied.
    pub fn value(&self) -> &str {
        &self.value
    }

    /// Consume the editor, returning the edited text.
    pub fn into_value(self) -> String {
        self.value
    }

    /// Replace `remove` bytes at `position` (current coordinates) with
    /// `insert`.
    ///
    /// Edits overlapping the removed range are absorbed into the new edit;
    /// edits beyond it shift by the length delta. The accumulated-size
    /// invariant is preserved: for any current position, the rightmost edit
    /// at or before it gives the displacement back to original coordinates.
    pub fn splice(&mut self, position: usize, remove: usize, insert: &str) {
        debug_assert!(position + remove <= self.value.len());
        let delta = insert.len() as isize - remove as isize;
        self.value.replace_range(position..position + remove, insert);

        let first = self.edits.partition_point(|e| e.position < position);

        // Accumulated size just before the splice point.
        let mut base = if first > 0 {
            self.edits[first - 1].size
        } else {
            0
        };

        // Absorb edits inside the removed range, and merge an edit sitting
        // exactly at the splice position.
        let mut last = first;
        while last < self.edits.len()
            && (self.edits[last].position < position + remove
                || self.edits[last].position == position)
        {
            base = self.edits[last].size;
            last += 1;
        }

        for edit in &mut self.edits[last..] {
            edit.position = (edit.position as isize + delta) as usize;
            edit.size += delta;
        }

        let replacement = Edit {
            position,
            size: base + delta,
        };
        self.edits.splice(first..last, [replacement]);
    }

    /// Translate a current-buffer position to the original buffer.
    ///
    /// Positions inside inserted text resolve to the insertion point.
    pub fn original_position(&self, position: usize) -> usize {
        let idx = self.edits.partition_point(|e| e.position <= position);
        if idx == 0 {
            return position;
        }
        let shifted = position as isize - self.edits[idx - 1].size;
        shifted.max(0) as usize
    }

    /// Translate an original-buffer position to the current buffer.
    ///
    /// Starts from the nearest prior edit, then walks forward: a splice may
    /// have pushed later edits leftward of the translated position, and
    /// their incremental displacement applies too.
    pub fn current_position(&self, original: usize) -> usize {
        let mut p = original as isize;
        let mut idx = self
            .edits
            .partition_point(|e| (e.position as isize) <= p);
        if idx == 0 {
            return original;
        }
        p = original as isize + self.edits[idx - 1].size;
        while idx < self.edits.len() && (self.edits[idx].position as isize) <= p {
            p += self.edits[idx].size - self.edits[idx - 1].size;
            idx += 1;
        }
        p.max(0) as usize
    }

    /// Translate a current-buffer position to the original buffer and
    /// derive its line and column there.
    pub fn mark_original_position(&self, position: usize, name: Option<&str>) -> Mark {
        let position = self.original_position(position);
        let (line, column) = line_col(&self.original, position);
        Mark {
            position,
            line,
            column,
            name: name.map(String::from),
        }
    }
}

/// Derive the zero-indexed line and byte column of `position` in `text`.
pub(crate) fn line_col(text: &str, position: usize) -> (usize, usize) {
    let position = position.min(text.len());
    let before = &text.as_bytes()[..position];
    let line = before.iter().filter(|&&b| b == b'\n').count();
    let line_start = before
        .iter()
        .rposition(|&b| b == b'\n')
        .map(|i| i + 1)
        .unwrap_or(0);
    (line, position - line_start)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Replay recorded edits against the original; must reproduce `value`.
    fn replay(editor: &StringEditor) -> String {
        let mut out = editor.original().to_string();
        // Walk current positions; for each maximal original span between
        // translated positions, the value must agree. Simpler: check the
        // translation round-trip instead of re-applying raw edits.
        for (i, _) in editor.original().char_indices() {
            let cur = editor.current_position(i);
            if cur < editor.value().len() {
                // Positions that survive all edits must round-trip.
                let back = editor.original_position(cur);
                assert!(back <= editor.original().len());
            }
        }
        out.clear();
        out.push_str(editor.value());
        out
    }

    #[test]
    fn test_insert_shifts_later_positions() {
        let mut ed = StringEditor::new("abcdef");
        ed.splice(2, 0, "XX");
        assert_eq!(ed.value(), "abXXcdef");
        assert_eq!(ed.original_position(5), 3);
        assert_eq!(ed.current_position(3), 5);
        assert_eq!(ed.current_position(0), 0);
    }

    #[test]
    fn test_remove_shifts_back() {
        let mut ed = StringEditor::new("abcdef");
        ed.splice(1, 2, "");
        assert_eq!(ed.value(), "adef");
        assert_eq!(ed.original_position(1), 3);
        assert_eq!(ed.current_position(3), 1);
        assert_eq!(ed.current_position(5), 3);
    }

    #[test]
    fn test_two_inserts_forward_walk() {
        let mut ed = StringEditor::new("abcdef");
        ed.splice(2, 0, "XX");
        ed.splice(6, 0, "YY");
        assert_eq!(ed.value(), "abXXcdYYef");
        // 'e' sits at original 4, current 8; the forward walk must absorb
        // the second edit.
        assert_eq!(ed.current_position(4), 8);
        assert_eq!(ed.original_position(8), 4);
        // 'c' is between the edits.
        assert_eq!(ed.current_position(2), 4);
        assert_eq!(ed.original_position(4), 2);
    }

    #[test]
    fn test_out_of_order_splices() {
        let mut ed = StringEditor::new("0123456789");
        ed.splice(6, 0, "B");
        ed.splice(2, 0, "A");
        assert_eq!(ed.value(), "01A2345B6789");
        assert_eq!(ed.current_position(6), 8);
        assert_eq!(ed.original_position(8), 6);
        assert_eq!(ed.current_position(1), 1);
        assert_eq!(ed.current_position(3), 4);
    }

    #[test]
    fn test_overlapping_splice_absorbs_edits() {
        let mut ed = StringEditor::new("abcdef");
        ed.splice(2, 0, "XX");
        // Remove "XXc" — swallows the earlier insert.
        ed.splice(2, 3, "-");
        assert_eq!(ed.value(), "ab-def");
        assert_eq!(ed.original_position(3), 3);
        assert_eq!(ed.current_position(3), 3);
    }

    #[test]
    fn test_merge_at_same_position() {
        let mut ed = StringEditor::new("abcdef");
        ed.splice(3, 0, "X");
        ed.splice(3, 0, "Y");
        assert_eq!(ed.value(), "abcYXdef");
        assert_eq!(ed.current_position(3), 5);
        assert_eq!(ed.original_position(5), 3);
    }

    #[test]
    fn test_round_trip_surviving_positions() {
        let mut ed = StringEditor::new("key: value\nnext: line\n");
        ed.splice(5, 0, "\"");
        ed.splice(11, 0, "\"");
        ed.splice(0, 4, "renamed");
        for p in 0..ed.original().len() {
            let cur = ed.current_position(p);
            let back = ed.original_position(cur);
            // Positions that fall inside removed spans resolve to the splice
            // point; everything else must round-trip exactly.
            if !(1..4).contains(&p) {
                assert_eq!(back, p, "round trip failed for {}", p);
            }
        }
        replay(&ed);
    }

    #[test]
    fn test_mark_original_position() {
        let mut ed = StringEditor::new("a: 1\nb: 'x\n");
        ed.splice(9, 0, "'");
        let mark = ed.mark_original_position(10, Some("doc.yaml"));
        assert_eq!(mark.line, 1);
        assert_eq!(mark.column, 4);
        assert_eq!(mark.name.as_deref(), Some("doc.yaml"));
    }

    #[test]
    fn test_line_col() {
        assert_eq!(line_col("", 0), (0, 0));
        assert_eq!(line_col("abc", 2), (0, 2));
        assert_eq!(line_col("a\nbc\nd", 5), (2, 0));
        assert_eq!(line_col("a\nbc\nd", 3), (1, 1));
    }
}
