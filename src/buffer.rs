//! Editable text buffer with cursor and transactional undo/redo.
//!
//! The buffer stores the document as one `String` and a byte cursor that
//! always sits on a character boundary and never between the `\r` and `\n`
//! of a CRLF pair.
//!
//! Every mutation is recorded in a [`History`] as a [`Transaction`] of
//! primitive insert/delete actions. Contiguous typing and contiguous
//! deletion are batched into a single transaction so that one undo removes
//! a whole word rather than a single character. Each transaction carries an
//! [`EditOrigin`]: user edits are `User`, while whole-text rewrites made on
//! behalf of the filter overlay are `Overlay`, which lets the session roll
//! overlay writes back without touching user history.

use crate::engine::{line_spans, LineSpan};

// ---------------------------------------------------------------------------
// History
// ---------------------------------------------------------------------------

/// Who produced a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditOrigin {
    /// Typed or otherwise requested by the user.
    User,
    /// Synthetic rewrite produced by the filter overlay.
    Overlay,
}

/// A primitive text mutation at a byte offset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditAction {
    Insert { pos: usize, text: String },
    Delete { pos: usize, text: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transaction {
    pub actions: Vec<EditAction>,
    pub origin: EditOrigin,
    pub cursor_before: usize,
    pub cursor_after: usize,
}

#[derive(Debug, Clone, Default)]
pub struct History {
    pub undo_stack: Vec<Transaction>,
    pub redo_stack: Vec<Transaction>,
}

impl History {
    /// Records a user insertion, batching it with the previous one when it
    /// continues exactly where that one ended on the same line.
    fn record_insert(&mut self, pos: usize, text: &str, cursor_before: usize, cursor_after: usize) {
        self.redo_stack.clear();

        if let Some(last_tx) = self.undo_stack.last_mut() {
            if last_tx.origin == EditOrigin::User && last_tx.actions.len() == 1 {
                if let Some(EditAction::Insert {
                    pos: last_pos,
                    text: last_text,
                }) = last_tx.actions.last_mut()
                {
                    if !is_line_break(text)
                        && !last_text.contains(['\n', '\r'])
                        && *last_pos + last_text.len() == pos
                    {
                        last_text.push_str(text);
                        last_tx.cursor_after = cursor_after;
                        return;
                    }
                }
            }
        }

        self.undo_stack.push(Transaction {
            actions: vec![EditAction::Insert {
                pos,
                text: text.to_string(),
            }],
            origin: EditOrigin::User,
            cursor_before,
            cursor_after,
        });
    }

    /// Records a user deletion, batching consecutive backspaces or forward
    /// deletes on the same line.
    fn record_delete(&mut self, pos: usize, text: &str, cursor_before: usize, cursor_after: usize) {
        self.redo_stack.clear();

        if let Some(last_tx) = self.undo_stack.last_mut() {
            if last_tx.origin == EditOrigin::User && last_tx.actions.len() == 1 {
                if let Some(EditAction::Delete {
                    pos: last_pos,
                    text: last_text,
                }) = last_tx.actions.last_mut()
                {
                    if !is_line_break(text) && !last_text.contains(['\n', '\r']) {
                        // Backspace: the new range ends where the previous began.
                        if pos + text.len() == *last_pos {
                            last_text.insert_str(0, text);
                            *last_pos = pos;
                            last_tx.cursor_after = cursor_after;
                            return;
                        }
                        // Forward delete: same start position.
                        if pos == *last_pos {
                            last_text.push_str(text);
                            last_tx.cursor_after = cursor_after;
                            return;
                        }
                    }
                }
            }
        }

        self.undo_stack.push(Transaction {
            actions: vec![EditAction::Delete {
                pos,
                text: text.to_string(),
            }],
            origin: EditOrigin::User,
            cursor_before,
            cursor_after,
        });
    }

    /// Records a whole-text replacement as one transaction.
    fn record_replace(
        &mut self,
        deleted: &str,
        inserted: &str,
        origin: EditOrigin,
        cursor_before: usize,
        cursor_after: usize,
    ) {
        self.redo_stack.clear();
        self.undo_stack.push(Transaction {
            actions: vec![
                EditAction::Delete {
                    pos: 0,
                    text: deleted.to_string(),
                },
                EditAction::Insert {
                    pos: 0,
                    text: inserted.to_string(),
                },
            ],
            origin,
            cursor_before,
            cursor_after,
        });
    }
}

fn is_line_break(text: &str) -> bool {
    text.contains(['\n', '\r'])
}

// ---------------------------------------------------------------------------
// TextBuffer
// ---------------------------------------------------------------------------

/// The editable surface: document text, cursor, and undo history.
#[derive(Debug, Clone, Default)]
pub struct TextBuffer {
    text: String,
    cursor: usize,
    history: History,
    /// Column (in chars) that vertical movement tries to keep.
    preferred_col: Option<usize>,
    /// Bumped on every text mutation; cursor moves leave it alone.
    revision: u64,
}

impl TextBuffer {
    /// Create a buffer holding `text` with an empty history.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Byte offset of the cursor.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn line_count(&self) -> usize {
        line_spans(&self.text).len()
    }

    /// Cursor position as `(row, column)`, column counted in characters.
    pub fn cursor_position(&self) -> (usize, usize) {
        let spans = line_spans(&self.text);
        let row = row_at(&spans, self.cursor);
        let start = spans[row].content.start;
        (row, self.text[start..self.cursor].chars().count())
    }

    /// Line terminator used for new lines: the document's first one, or `\n`.
    pub fn eol(&self) -> &'static str {
        match line_spans(&self.text).first() {
            Some(span) => match &self.text[span.terminator.clone()] {
                "\r\n" => "\r\n",
                "\r" => "\r",
                _ => "\n",
            },
            None => "\n",
        }
    }

    // -- Editing ----------------------------------------------------------

    pub fn insert_char(&mut self, c: char) {
        let mut buf = [0u8; 4];
        self.insert_str(c.encode_utf8(&mut buf));
    }

    pub fn insert_str(&mut self, s: &str) {
        if s.is_empty() {
            return;
        }
        let before = self.cursor;
        self.text.insert_str(before, s);
        self.revision += 1;
        self.cursor = before + s.len();
        self.preferred_col = None;
        self.history.record_insert(before, s, before, self.cursor);
    }

    pub fn insert_newline(&mut self) {
        let eol = self.eol();
        self.insert_str(eol);
    }

    /// Delete the character (or CRLF pair) before the cursor.
    pub fn backspace(&mut self) -> bool {
        if self.cursor == 0 {
            return false;
        }
        let before = self.cursor;
        let start = prev_boundary(&self.text, before);
        let removed: String = self.text.drain(start..before).collect();
        self.revision += 1;
        self.cursor = start;
        self.preferred_col = None;
        self.history.record_delete(start, &removed, before, start);
        true
    }

    /// Delete the character (or CRLF pair) under the cursor.
    pub fn delete_forward(&mut self) -> bool {
        if self.cursor >= self.text.len() {
            return false;
        }
        let at = self.cursor;
        let end = next_boundary(&self.text, at);
        let removed: String = self.text.drain(at..end).collect();
        self.revision += 1;
        self.preferred_col = None;
        self.history.record_delete(at, &removed, at, at);
        true
    }

    /// Replace the whole text as a single transaction.
    ///
    /// Returns false (and records nothing) when `text` equals the current
    /// contents.
    pub fn replace_all(&mut self, text: &str, origin: EditOrigin) -> bool {
        if self.text == text {
            return false;
        }
        let before = self.cursor;
        let old = std::mem::replace(&mut self.text, text.to_string());
        self.revision += 1;
        self.cursor = clamp_cursor(&self.text, before);
        self.preferred_col = None;
        self.history
            .record_replace(&old, text, origin, before, self.cursor);
        true
    }

    // -- History ----------------------------------------------------------

    pub fn can_undo(&self) -> bool {
        !self.history.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.history.redo_stack.is_empty()
    }

    /// Number of transactions on the undo stack.
    pub fn undo_depth(&self) -> usize {
        self.history.undo_stack.len()
    }

    /// Origin of the transaction that `undo` would revert.
    pub fn top_origin(&self) -> Option<EditOrigin> {
        self.history.undo_stack.last().map(|tx| tx.origin)
    }

    /// Origin of the transaction that `redo` would reapply.
    pub fn redo_origin(&self) -> Option<EditOrigin> {
        self.history.redo_stack.last().map(|tx| tx.origin)
    }

    /// Revert the most recent transaction.
    pub fn undo(&mut self) -> bool {
        match self.history.undo_stack.pop() {
            Some(tx) => {
                self.revert(&tx);
                self.history.redo_stack.push(tx);
                true
            }
            None => false,
        }
    }

    /// Reapply the most recently undone transaction.
    pub fn redo(&mut self) -> bool {
        match self.history.redo_stack.pop() {
            Some(tx) => {
                for action in &tx.actions {
                    match action {
                        EditAction::Insert { pos, text } => self.text.insert_str(*pos, text),
                        EditAction::Delete { pos, text } => {
                            self.text.replace_range(*pos..*pos + text.len(), "")
                        }
                    }
                }
                self.revision += 1;
                self.cursor = clamp_cursor(&self.text, tx.cursor_after);
                self.preferred_col = None;
                self.history.undo_stack.push(tx);
                true
            }
            None => false,
        }
    }

    /// Revert every transaction above `depth` and forget them.
    ///
    /// Reverted transactions are not pushed to the redo stack, and the redo
    /// stack is cleared. Returns true if anything was reverted.
    pub fn rollback_to(&mut self, depth: usize) -> bool {
        let mut changed = false;
        while self.history.undo_stack.len() > depth {
            if let Some(tx) = self.history.undo_stack.pop() {
                self.revert(&tx);
                changed = true;
            }
        }
        self.history.redo_stack.clear();
        changed
    }

    fn revert(&mut self, tx: &Transaction) {
        for action in tx.actions.iter().rev() {
            match action {
                EditAction::Insert { pos, text } => {
                    self.text.replace_range(*pos..*pos + text.len(), "")
                }
                EditAction::Delete { pos, text } => self.text.insert_str(*pos, text),
            }
        }
        self.revision += 1;
        self.cursor = clamp_cursor(&self.text, tx.cursor_before);
        self.preferred_col = None;
    }

    // -- Cursor movement --------------------------------------------------

    pub fn move_left(&mut self) {
        self.cursor = prev_boundary(&self.text, self.cursor);
        self.preferred_col = None;
    }

    pub fn move_right(&mut self) {
        self.cursor = next_boundary(&self.text, self.cursor);
        self.preferred_col = None;
    }

    pub fn move_up(&mut self) {
        self.move_rows(-1);
    }

    pub fn move_down(&mut self) {
        self.move_rows(1);
    }

    pub fn page_up(&mut self, rows: usize) {
        self.move_rows(-(rows.max(1) as isize));
    }

    pub fn page_down(&mut self, rows: usize) {
        self.move_rows(rows.max(1) as isize);
    }

    pub fn move_home(&mut self) {
        let spans = line_spans(&self.text);
        let row = row_at(&spans, self.cursor);
        self.cursor = spans[row].content.start;
        self.preferred_col = None;
    }

    pub fn move_end(&mut self) {
        let spans = line_spans(&self.text);
        let row = row_at(&spans, self.cursor);
        self.cursor = spans[row].content.end;
        self.preferred_col = None;
    }

    /// Place the cursor at the start of `row`, clamped to the last line.
    pub fn set_cursor_row(&mut self, row: usize) {
        let spans = line_spans(&self.text);
        let row = row.min(spans.len() - 1);
        self.cursor = spans[row].content.start;
        self.preferred_col = None;
    }

    /// Place the cursor at `(row, col)`, clamping both.
    pub fn set_cursor_position(&mut self, row: usize, col: usize) {
        let spans = line_spans(&self.text);
        let row = row.min(spans.len() - 1);
        self.cursor = offset_in_line(&self.text, &spans[row], col);
        self.preferred_col = None;
    }

    fn move_rows(&mut self, delta: isize) {
        let spans = line_spans(&self.text);
        let row = row_at(&spans, self.cursor);
        let col = self.preferred_col.unwrap_or_else(|| {
            self.text[spans[row].content.start..self.cursor]
                .chars()
                .count()
        });
        let target = (row as isize + delta).clamp(0, spans.len() as isize - 1) as usize;
        self.cursor = offset_in_line(&self.text, &spans[target], col);
        self.preferred_col = Some(col);
    }
}

// ---------------------------------------------------------------------------
// Offset helpers
// ---------------------------------------------------------------------------

/// Row containing byte offset `pos`.
fn row_at(spans: &[LineSpan], pos: usize) -> usize {
    spans
        .iter()
        .position(|s| pos <= s.content.end)
        .unwrap_or(spans.len() - 1)
}

/// Byte offset of column `col` (chars) within a line, clamped to its end.
fn offset_in_line(text: &str, span: &LineSpan, col: usize) -> usize {
    let line = &text[span.content.clone()];
    span.content.start
        + line
            .char_indices()
            .nth(col)
            .map(|(b, _)| b)
            .unwrap_or(line.len())
}

fn prev_boundary(text: &str, pos: usize) -> usize {
    if pos == 0 {
        return 0;
    }
    if pos >= 2 && &text.as_bytes()[pos - 2..pos] == b"\r\n" {
        return pos - 2;
    }
    text[..pos]
        .char_indices()
        .next_back()
        .map(|(b, _)| b)
        .unwrap_or(0)
}

fn next_boundary(text: &str, pos: usize) -> usize {
    let rest = &text[pos..];
    if rest.starts_with("\r\n") {
        return pos + 2;
    }
    rest.chars().next().map_or(pos, |c| pos + c.len_utf8())
}

/// Clamp `pos` into `text` on a character boundary outside any CRLF pair.
fn clamp_cursor(text: &str, pos: usize) -> usize {
    let mut pos = pos.min(text.len());
    while !text.is_char_boundary(pos) {
        pos -= 1;
    }
    if pos > 0 && pos < text.len() && &text.as_bytes()[pos - 1..=pos] == b"\r\n" {
        pos -= 1;
    }
    pos
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn typed(s: &str) -> TextBuffer {
        let mut buf = TextBuffer::new("");
        for c in s.chars() {
            buf.insert_char(c);
        }
        buf
    }

    // -- Editing --------------------------------------------------------------

    #[test]
    fn test_insert_and_cursor() {
        let buf = typed("héllo");
        assert_eq!(buf.text(), "héllo");
        assert_eq!(buf.cursor(), "héllo".len());
        assert_eq!(buf.cursor_position(), (0, 5));
    }

    #[test]
    fn test_backspace_removes_char() {
        let mut buf = typed("ab日");
        assert!(buf.backspace());
        assert_eq!(buf.text(), "ab");
        buf.set_cursor_position(0, 0);
        assert!(!buf.backspace());
    }

    #[test]
    fn test_backspace_removes_crlf_as_one() {
        let mut buf = TextBuffer::new("a\r\nb");
        buf.set_cursor_position(1, 0);
        assert!(buf.backspace());
        assert_eq!(buf.text(), "ab");
        assert_eq!(buf.cursor(), 1);
    }

    #[test]
    fn test_delete_forward() {
        let mut buf = TextBuffer::new("a\r\nb");
        buf.move_end();
        assert!(buf.delete_forward());
        assert_eq!(buf.text(), "ab");
        buf.move_end();
        assert!(!buf.delete_forward());
    }

    #[test]
    fn test_newline_uses_document_eol() {
        let mut buf = TextBuffer::new("x\r\ny");
        buf.move_end();
        buf.insert_newline();
        assert_eq!(buf.text(), "x\r\n\r\ny");

        let mut plain = TextBuffer::new("");
        plain.insert_newline();
        assert_eq!(plain.text(), "\n");
    }

    // -- Batching -------------------------------------------------------------

    #[test]
    fn test_insert_batching() {
        let buf = typed("Hi");
        assert_eq!(buf.undo_depth(), 1, "Should batch into a single transaction");
    }

    #[test]
    fn test_newline_breaks_batch() {
        let mut buf = typed("ab");
        buf.insert_newline();
        buf.insert_char('c');
        assert_eq!(buf.undo_depth(), 3);
    }

    #[test]
    fn test_backspace_batching() {
        let mut buf = typed("abc");
        buf.backspace();
        buf.backspace();
        assert_eq!(buf.undo_depth(), 2);
        buf.undo();
        assert_eq!(buf.text(), "abc");
    }

    #[test]
    fn test_forward_delete_batching() {
        let mut buf = TextBuffer::new("abcd");
        buf.delete_forward();
        buf.delete_forward();
        assert_eq!(buf.text(), "cd");
        assert_eq!(buf.undo_depth(), 1);
        buf.undo();
        assert_eq!(buf.text(), "abcd");
        assert_eq!(buf.cursor(), 0);
    }

    #[test]
    fn test_no_batching_into_overlay() {
        let mut buf = TextBuffer::new("abc");
        buf.move_end();
        buf.replace_all("xyz", EditOrigin::Overlay);
        buf.move_end();
        buf.insert_char('!');
        assert_eq!(buf.undo_depth(), 2);
        assert_eq!(buf.top_origin(), Some(EditOrigin::User));
    }

    // -- Undo / redo ----------------------------------------------------------

    #[test]
    fn test_undo_redo_roundtrip() {
        let mut buf = typed("hello");
        buf.insert_newline();
        buf.insert_str("world");
        let full = buf.text().to_string();

        while buf.undo() {}
        assert_eq!(buf.text(), "");
        assert!(buf.can_redo());

        while buf.redo() {}
        assert_eq!(buf.text(), full);
        assert_eq!(buf.cursor(), full.len());
    }

    #[test]
    fn test_new_edit_clears_redo() {
        let mut buf = typed("ab");
        buf.undo();
        assert!(buf.can_redo());
        buf.insert_char('x');
        assert!(!buf.can_redo());
    }

    #[test]
    fn test_replace_all_identical_is_noop() {
        let mut buf = TextBuffer::new("same");
        assert!(!buf.replace_all("same", EditOrigin::User));
        assert_eq!(buf.undo_depth(), 0);
    }

    #[test]
    fn test_replace_all_undo() {
        let mut buf = TextBuffer::new("one\ntwo");
        assert!(buf.replace_all("three", EditOrigin::Overlay));
        assert_eq!(buf.top_origin(), Some(EditOrigin::Overlay));
        buf.undo();
        assert_eq!(buf.text(), "one\ntwo");
        assert_eq!(buf.redo_origin(), Some(EditOrigin::Overlay));
    }

    #[test]
    fn test_rollback_to_discards_without_redo() {
        let mut buf = typed("base");
        let point = buf.undo_depth();
        buf.replace_all("overlay", EditOrigin::Overlay);
        buf.move_end();
        buf.insert_str(" edit");
        assert!(buf.rollback_to(point));
        assert_eq!(buf.text(), "base");
        assert_eq!(buf.undo_depth(), point);
        assert!(!buf.can_redo());
        assert!(!buf.rollback_to(point));
    }

    // -- Cursor movement ------------------------------------------------------

    #[test]
    fn test_move_left_right_skip_crlf() {
        let mut buf = TextBuffer::new("a\r\nb");
        buf.move_right();
        assert_eq!(buf.cursor(), 1);
        buf.move_right();
        assert_eq!(buf.cursor(), 3);
        buf.move_left();
        assert_eq!(buf.cursor(), 1);
    }

    #[test]
    fn test_vertical_movement_keeps_column() {
        let mut buf = TextBuffer::new("abcdef\nab\nabcdef");
        buf.set_cursor_position(0, 5);
        buf.move_down();
        assert_eq!(buf.cursor_position(), (1, 2));
        buf.move_down();
        assert_eq!(buf.cursor_position(), (2, 5));
        buf.move_up();
        buf.move_up();
        assert_eq!(buf.cursor_position(), (0, 5));
        buf.move_up();
        assert_eq!(buf.cursor_position(), (0, 5));
    }

    #[test]
    fn test_page_movement_clamps() {
        let mut buf = TextBuffer::new("1\n2\n3\n4\n5");
        buf.page_down(10);
        assert_eq!(buf.cursor_position().0, 4);
        buf.page_up(2);
        assert_eq!(buf.cursor_position().0, 2);
    }

    #[test]
    fn test_home_end() {
        let mut buf = TextBuffer::new("first\nsecond");
        buf.set_cursor_position(1, 3);
        buf.move_home();
        assert_eq!(buf.cursor_position(), (1, 0));
        buf.move_end();
        assert_eq!(buf.cursor_position(), (1, 6));
    }

    #[test]
    fn test_set_cursor_row_clamps() {
        let mut buf = TextBuffer::new("a\nb\nc");
        buf.set_cursor_row(1);
        assert_eq!(buf.cursor_position(), (1, 0));
        buf.set_cursor_row(99);
        assert_eq!(buf.cursor_position(), (2, 0));
    }

    #[test]
    fn test_revision_tracks_text_changes_only() {
        let mut buf = TextBuffer::new("ab");
        let r0 = buf.revision();
        buf.move_right();
        buf.move_end();
        assert_eq!(buf.revision(), r0);
        buf.insert_char('c');
        assert!(buf.revision() > r0);
        let r1 = buf.revision();
        buf.undo();
        assert!(buf.revision() > r1);
    }

    #[test]
    fn test_line_count() {
        assert_eq!(TextBuffer::new("").line_count(), 1);
        assert_eq!(TextBuffer::new("a\n").line_count(), 2);
        assert_eq!(TextBuffer::new("a\r\nb\rc").line_count(), 3);
    }

    #[test]
    fn test_clamp_cursor_never_splits_crlf_or_char() {
        assert_eq!(clamp_cursor("a\r\nb", 2), 1);
        assert_eq!(clamp_cursor("日本", 1), 0);
        assert_eq!(clamp_cursor("ab", 9), 2);
    }
}
