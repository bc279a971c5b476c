//! Document session: the filter state machine over an editable buffer.
//!
//! A [`DocumentSession`] owns the [`TextBuffer`] the user edits and moves
//! between three states:
//!
//! - **Idle**: no filter; the buffer holds the document.
//! - **Filtering**: a snapshot of the document was taken when the filter
//!   became active. The buffer shows a projection of that snapshot (the
//!   filtered lines, or the full document with the current match
//!   emphasised), written as `Overlay` transactions.
//! - **Stale**: Filtering, but the user has edited the displayed text since
//!   the last projection. The edits are folded back into the snapshot the
//!   next time the filter changes, navigation happens or the filter is
//!   cleared.
//!
//! Clearing the filter rolls the buffer back to the undo depth recorded on
//! entry, discarding every overlay write, then re-applies the user's edits
//! (if any) as one `User` transaction. User text is never dropped.

use std::borrow::Cow;
use std::collections::{BTreeMap, BTreeSet};

use crate::buffer::{EditOrigin, TextBuffer};
use crate::engine::{line_spans, split_lines, FilterEngine};
use crate::projector::{filtered_view, full_view, RenderedDocument, ViewMode};

// ---------------------------------------------------------------------------
// Configuration and public state
// ---------------------------------------------------------------------------

/// Settings that affect the session's behaviour.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    /// Filter strings shorter than this (in characters) count as no filter.
    pub min_filter_len: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self { min_filter_len: 1 }
    }
}

/// Externally visible filter state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Filtering,
    /// Filtering with displayed edits not yet folded into the snapshot.
    Stale,
}

// ---------------------------------------------------------------------------
// Internal state
// ---------------------------------------------------------------------------

#[derive(Debug)]
struct FilterSession {
    engine: FilterEngine,
    /// Undo depth of the buffer when filtering began.
    undo_point: usize,
    /// Projection currently written into the buffer.
    rendered: RenderedDocument,
    stale: bool,
}

impl FilterSession {
    /// The document as it would be if filtering stopped now.
    fn reconciled_text(&self, surface: &str) -> String {
        match self.rendered.mode {
            ViewMode::Full => surface.to_string(),
            ViewMode::Filtered => merge_filtered_edits(
                self.engine.snapshot(),
                &self.rendered.source_indices(),
                surface,
            ),
        }
    }

    /// Fold displayed edits into a fresh snapshot and re-run the filter.
    ///
    /// Returns the line that was current before, for re-anchoring.
    fn reconcile(&mut self, surface: &str) -> Option<usize> {
        let anchor = self.engine.current();
        let text = self.reconciled_text(surface);
        let filter = self.engine.filter().to_string();
        self.engine = FilterEngine::new(text);
        self.engine.apply(&filter);
        self.stale = false;
        anchor
    }
}

#[derive(Debug, Default)]
enum FilterState {
    #[default]
    Idle,
    Filtering(Box<FilterSession>),
}

// ---------------------------------------------------------------------------
// DocumentSession
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
pub struct DocumentSession {
    buffer: TextBuffer,
    config: SessionConfig,
    state: FilterState,
    scroll_request: Option<usize>,
    /// Document text at the last load or save.
    saved_text: String,
}

impl DocumentSession {
    pub fn new(text: impl Into<String>, config: SessionConfig) -> Self {
        let text = text.into();
        Self {
            buffer: TextBuffer::new(text.clone()),
            config,
            state: FilterState::Idle,
            scroll_request: None,
            saved_text: text,
        }
    }

    // -- Filter lifecycle -------------------------------------------------

    /// React to a change of the filter string.
    ///
    /// Returns whether next/previous navigation should be enabled, which is
    /// the case when a filter is active and has at least one match.
    pub fn on_filter_text_changed(&mut self, filter: &str) -> bool {
        if filter.is_empty() || filter.chars().count() < self.config.min_filter_len {
            self.clear_filter();
            return false;
        }

        match &mut self.state {
            FilterState::Idle => {
                let mut engine = FilterEngine::new(self.buffer.text());
                engine.apply(filter);
                let rendered = filtered_view(&engine);
                self.state = FilterState::Filtering(Box::new(FilterSession {
                    engine,
                    undo_point: self.buffer.undo_depth(),
                    rendered: rendered.clone(),
                    stale: false,
                }));
                self.show(rendered);
            }
            FilterState::Filtering(fs) => {
                if fs.stale {
                    fs.reconcile(self.buffer.text());
                }
                fs.engine.apply(filter);
                let rendered = filtered_view(&fs.engine);
                self.show(rendered);
            }
        }

        self.buffer.set_cursor_row(0);
        self.scroll_request = Some(0);
        self.navigation_enabled()
    }

    /// Leave filtering and restore the document, keeping user edits.
    pub fn clear_filter(&mut self) {
        let mut fs = match std::mem::take(&mut self.state) {
            FilterState::Filtering(fs) => fs,
            FilterState::Idle => return,
        };

        let focus = if fs.stale {
            fs.reconcile(self.buffer.text())
        } else {
            fs.engine.current()
        };
        let document = fs.engine.snapshot().to_string();

        self.buffer.rollback_to(fs.undo_point);
        self.buffer.replace_all(&document, EditOrigin::User);

        if let Some(line) = focus {
            self.buffer.set_cursor_row(line);
            self.scroll_request = Some(line);
        }
    }

    /// Note that the user changed the displayed text.
    pub fn on_raw_text_edited(&mut self) {
        if let FilterState::Filtering(fs) = &mut self.state {
            fs.stale = true;
        }
    }

    // -- Navigation -------------------------------------------------------

    /// Move to the next match and show it emphasised in the full document.
    ///
    /// Returns the line now current, or `None` when idle or nothing matches.
    pub fn goto_next(&mut self) -> Option<usize> {
        self.navigate(true)
    }

    /// Move to the previous match. See [`goto_next`](Self::goto_next).
    pub fn goto_previous(&mut self) -> Option<usize> {
        self.navigate(false)
    }

    fn navigate(&mut self, forward: bool) -> Option<usize> {
        let fs = match &mut self.state {
            FilterState::Filtering(fs) => fs,
            FilterState::Idle => return None,
        };

        let was_stale = fs.stale;
        let anchor = if was_stale {
            fs.reconcile(self.buffer.text())
        } else {
            fs.engine.current()
        };

        let line = if forward {
            fs.engine.resume_after(anchor)
        } else {
            fs.engine.resume_before(anchor)
        };

        match line {
            Some(line) => {
                let rendered = full_view(&fs.engine);
                self.show(rendered);
                self.buffer.set_cursor_row(line);
                self.scroll_request = Some(line);
                Some(line)
            }
            None => {
                // Nothing to move to, but a reconciled snapshot still has to
                // replace the out-of-date projection.
                if was_stale {
                    let rendered = full_view(&fs.engine);
                    self.show(rendered);
                }
                None
            }
        }
    }

    fn show(&mut self, rendered: RenderedDocument) {
        self.buffer.replace_all(&rendered.text, EditOrigin::Overlay);
        if let FilterState::Filtering(fs) = &mut self.state {
            fs.rendered = rendered;
        }
    }

    // -- Editing ----------------------------------------------------------

    /// Run `f` against the buffer, marking the session stale if the text
    /// changed.
    pub fn edit<R>(&mut self, f: impl FnOnce(&mut TextBuffer) -> R) -> R {
        let before = self.buffer.revision();
        let result = f(&mut self.buffer);
        if self.buffer.revision() != before {
            self.on_raw_text_edited();
        }
        result
    }

    /// Undo the last user edit.
    ///
    /// While filtering, overlay writes are a barrier: undo stops at the
    /// projection instead of reverting it.
    pub fn undo(&mut self) -> bool {
        if self.buffer.top_origin() != Some(EditOrigin::User) {
            return false;
        }
        self.edit(TextBuffer::undo)
    }

    pub fn redo(&mut self) -> bool {
        if self.buffer.redo_origin() != Some(EditOrigin::User) {
            return false;
        }
        self.edit(TextBuffer::redo)
    }

    /// Replace the document, dropping any filter and all history.
    pub fn load_text(&mut self, text: impl Into<String>) {
        let text = text.into();
        self.buffer = TextBuffer::new(text.clone());
        self.state = FilterState::Idle;
        self.saved_text = text;
        self.scroll_request = Some(0);
    }

    /// Record the current document as saved.
    pub fn mark_saved(&mut self) {
        self.saved_text = self.document_text().into_owned();
    }

    // -- Accessors --------------------------------------------------------

    pub fn buffer(&self) -> &TextBuffer {
        &self.buffer
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn set_config(&mut self, config: SessionConfig) {
        self.config = config;
    }

    pub fn state(&self) -> SessionState {
        match &self.state {
            FilterState::Idle => SessionState::Idle,
            FilterState::Filtering(fs) if fs.stale => SessionState::Stale,
            FilterState::Filtering(_) => SessionState::Filtering,
        }
    }

    pub fn is_filtering(&self) -> bool {
        matches!(self.state, FilterState::Filtering(_))
    }

    /// True when a filter is active and has at least one match.
    pub fn navigation_enabled(&self) -> bool {
        match &self.state {
            FilterState::Filtering(fs) => !fs.engine.is_empty(),
            FilterState::Idle => false,
        }
    }

    /// Projection currently displayed, for styling the buffer rows.
    pub fn overlay(&self) -> Option<&RenderedDocument> {
        match &self.state {
            FilterState::Filtering(fs) => Some(&fs.rendered),
            FilterState::Idle => None,
        }
    }

    pub fn engine(&self) -> Option<&FilterEngine> {
        match &self.state {
            FilterState::Filtering(fs) => Some(&fs.engine),
            FilterState::Idle => None,
        }
    }

    /// Active filter string, empty when idle.
    pub fn filter(&self) -> &str {
        self.engine().map_or("", FilterEngine::filter)
    }

    /// Line number of the current match.
    pub fn current_line(&self) -> Option<usize> {
        self.engine().and_then(FilterEngine::current)
    }

    pub fn match_counter_display(&self) -> Option<String> {
        self.engine().map(FilterEngine::match_counter_display)
    }

    /// Take the pending request to centre a row, if any.
    pub fn take_scroll_request(&mut self) -> Option<usize> {
        self.scroll_request.take()
    }

    /// The real document, independent of any active projection.
    pub fn document_text(&self) -> Cow<'_, str> {
        match &self.state {
            FilterState::Idle => Cow::Borrowed(self.buffer.text()),
            FilterState::Filtering(fs) if fs.stale => {
                Cow::Owned(fs.reconciled_text(self.buffer.text()))
            }
            FilterState::Filtering(fs) => Cow::Borrowed(fs.engine.snapshot()),
        }
    }

    pub fn is_modified(&self) -> bool {
        self.document_text() != self.saved_text.as_str()
    }
}

// ---------------------------------------------------------------------------
// Reconciliation
// ---------------------------------------------------------------------------

/// One step of the alignment between shown rows and edited rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RowOp {
    /// The row is unchanged.
    Keep,
    /// A shown row is gone.
    Delete,
    /// An edited row has no shown counterpart.
    Insert,
}

/// Align `shown` with `edited` along a longest common subsequence.
///
/// Common leading and trailing rows are matched first, so the quadratic
/// table only spans the region the user actually touched.
fn align_rows(shown: &[String], edited: &[String]) -> Vec<RowOp> {
    let prefix = shown
        .iter()
        .zip(edited)
        .take_while(|(a, b)| a == b)
        .count();
    let suffix = shown[prefix..]
        .iter()
        .rev()
        .zip(edited[prefix..].iter().rev())
        .take_while(|(a, b)| a == b)
        .count();
    let old = &shown[prefix..shown.len() - suffix];
    let new = &edited[prefix..edited.len() - suffix];

    // lcs[i][j] is the common subsequence length of old[i..] and new[j..].
    let mut lcs = vec![vec![0usize; new.len() + 1]; old.len() + 1];
    for i in (0..old.len()).rev() {
        for j in (0..new.len()).rev() {
            lcs[i][j] = if old[i] == new[j] {
                lcs[i + 1][j + 1] + 1
            } else {
                lcs[i + 1][j].max(lcs[i][j + 1])
            };
        }
    }

    let mut ops = vec![RowOp::Keep; prefix];
    let (mut i, mut j) = (0, 0);
    while i < old.len() || j < new.len() {
        if i < old.len() && j < new.len() && old[i] == new[j] {
            ops.push(RowOp::Keep);
            i += 1;
            j += 1;
        } else if j < new.len() && (i == old.len() || lcs[i][j + 1] >= lcs[i + 1][j]) {
            ops.push(RowOp::Insert);
            j += 1;
        } else {
            ops.push(RowOp::Delete);
            i += 1;
        }
    }
    ops.extend(std::iter::repeat(RowOp::Keep).take(suffix));
    ops
}

/// Write edited filtered-view rows back onto the snapshot.
///
/// `sources[i]` is the snapshot line shown on row `i` before editing. The
/// edited rows are aligned with the shown ones: unchanged rows stay on
/// their source line, a removed row deletes only its own source line and
/// a changed row replaces it. New rows go right after the source line of
/// the row above them, or before the first shown line when typed at the
/// top (appended when nothing was shown). Lines that were not shown are
/// kept untouched, including their terminators.
pub(crate) fn merge_filtered_edits(snapshot: &str, sources: &[usize], edited: &str) -> String {
    let spans = line_spans(snapshot);
    let default_eol = spans
        .iter()
        .map(|s| &snapshot[s.terminator.clone()])
        .find(|t| !t.is_empty())
        .unwrap_or("\n")
        .to_string();

    let segments: Vec<(String, String)> = spans
        .iter()
        .map(|s| {
            (
                snapshot[s.content.clone()].to_string(),
                snapshot[s.terminator.clone()].to_string(),
            )
        })
        .collect();

    let shown: Vec<String> = sources
        .iter()
        .map(|&source| {
            segments
                .get(source)
                .map(|(content, _)| content.clone())
                .unwrap_or_default()
        })
        .collect();
    let rows: Vec<String> = if sources.is_empty() && edited.is_empty() {
        Vec::new()
    } else {
        split_lines(edited).into_iter().map(|l| l.text).collect()
    };

    let mut replaced: BTreeMap<usize, String> = BTreeMap::new();
    let mut deleted: BTreeSet<usize> = BTreeSet::new();
    let mut inserted_after: BTreeMap<usize, Vec<String>> = BTreeMap::new();
    let mut leading: Vec<String> = Vec::new();

    let ops = align_rows(&shown, &rows);
    let (mut old, mut new, mut k) = (0, 0, 0);
    let mut anchor: Option<usize> = None;
    while k < ops.len() {
        if ops[k] == RowOp::Keep {
            anchor = Some(sources[old]);
            old += 1;
            new += 1;
            k += 1;
            continue;
        }

        // A run of deletions and insertions between two unchanged rows.
        // Pairs in the run are edits of a row in place.
        let start = k;
        while k < ops.len() && ops[k] != RowOp::Keep {
            k += 1;
        }
        let removed = ops[start..k].iter().filter(|&&op| op == RowOp::Delete).count();
        let added = (k - start) - removed;
        let gone = &sources[old..old + removed];
        let typed = &rows[new..new + added];
        old += removed;
        new += added;

        let paired = removed.min(added);
        for (&source, row) in gone.iter().zip(typed) {
            replaced.insert(source, row.clone());
            anchor = Some(source);
        }
        deleted.extend(&gone[paired..]);
        let extra = typed[paired..].iter().cloned();
        match anchor {
            Some(line) => inserted_after.entry(line).or_default().extend(extra),
            None => leading.extend(extra),
        }
    }

    let first_shown = sources.first().copied();
    let mut merged: Vec<(String, String)> = Vec::with_capacity(segments.len() + rows.len());
    for (index, (content, terminator)) in segments.into_iter().enumerate() {
        if first_shown == Some(index) {
            merged.extend(leading.drain(..).map(|row| (row, default_eol.clone())));
        }
        if !deleted.contains(&index) {
            let content = replaced.remove(&index).unwrap_or(content);
            merged.push((content, terminator));
        }
        if let Some(extra) = inserted_after.remove(&index) {
            merged.extend(extra.into_iter().map(|row| (row, default_eol.clone())));
        }
    }
    merged.extend(leading.into_iter().map(|row| (row, default_eol.clone())));

    let last = merged.len().saturating_sub(1);
    let mut out = String::new();
    for (i, (content, terminator)) in merged.iter().enumerate() {
        out.push_str(content);
        if i < last {
            out.push_str(if terminator.is_empty() {
                &default_eol
            } else {
                terminator
            });
        }
    }
    out
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    const LOREM: &str = "Lorem ipsum\ndolor sit\namet lorem";

    fn session(text: &str) -> DocumentSession {
        DocumentSession::new(text, SessionConfig::default())
    }

    fn type_at_end_of_row(s: &mut DocumentSession, row: usize, text: &str) {
        s.edit(|b| {
            b.set_cursor_row(row);
            b.move_end();
            b.insert_str(text);
        });
    }

    // -- Entering and leaving ------------------------------------------------

    #[test]
    fn test_filter_shows_matching_lines() {
        let mut s = session(LOREM);
        assert!(s.on_filter_text_changed("ore"));
        assert_eq!(s.state(), SessionState::Filtering);
        assert_eq!(s.buffer().text(), "Lorem ipsum\namet lorem");
        let overlay = s.overlay().expect("overlay");
        assert_eq!(overlay.mode, ViewMode::Filtered);
        assert_eq!(overlay.source_indices(), vec![0, 2]);
    }

    #[test]
    fn test_no_matches_disables_navigation() {
        let mut s = session(LOREM);
        assert!(!s.on_filter_text_changed("zzz"));
        assert_eq!(s.state(), SessionState::Filtering);
        assert_eq!(s.buffer().text(), "");
        assert_eq!(s.goto_next(), None);
    }

    #[test]
    fn test_clear_restores_exact_text() {
        let text = "Lorem ipsum\r\ndolor sit\r\namet lorem\r\n";
        let mut s = session(text);
        s.on_filter_text_changed("ore");
        s.goto_next();
        assert!(!s.on_filter_text_changed(""));
        assert_eq!(s.state(), SessionState::Idle);
        assert_eq!(s.buffer().text(), text);
        assert!(s.overlay().is_none());
        assert!(s.engine().is_none());
        assert!(!s.is_modified());
    }

    #[test]
    fn test_clear_without_edits_leaves_history_untouched() {
        let mut s = session("a\nb");
        s.edit(|b| b.insert_char('x'));
        let depth = s.buffer().undo_depth();
        s.on_filter_text_changed("a");
        s.goto_next();
        s.clear_filter();
        assert_eq!(s.buffer().undo_depth(), depth);
        assert!(!s.buffer().can_redo());
    }

    #[test]
    fn test_threshold_treated_as_no_filter() {
        let mut s = DocumentSession::new(LOREM, SessionConfig { min_filter_len: 3 });
        assert!(!s.on_filter_text_changed("or"));
        assert_eq!(s.state(), SessionState::Idle);
        assert_eq!(s.buffer().text(), LOREM);

        assert!(s.on_filter_text_changed("ore"));
        assert!(!s.on_filter_text_changed("or"));
        assert_eq!(s.state(), SessionState::Idle);
        assert_eq!(s.buffer().text(), LOREM);
    }

    #[test]
    fn test_refilter_resets_pointer() {
        let mut s = session(LOREM);
        s.on_filter_text_changed("o");
        s.goto_next();
        s.goto_next();
        assert_eq!(s.current_line(), Some(1));
        s.on_filter_text_changed("or");
        assert_eq!(s.current_line(), None);
        assert_eq!(s.overlay().map(|o| o.mode), Some(ViewMode::Filtered));
    }

    #[test]
    fn test_empty_document() {
        let mut s = session("");
        assert!(!s.on_filter_text_changed("a"));
        s.clear_filter();
        assert_eq!(s.buffer().text(), "");
    }

    // -- Navigation ----------------------------------------------------------

    #[test]
    fn test_next_renders_full_view_with_emphasis() {
        let mut s = session(LOREM);
        s.on_filter_text_changed("ore");
        assert_eq!(s.goto_next(), Some(0));
        assert_eq!(s.buffer().text(), LOREM);
        let overlay = s.overlay().expect("overlay");
        assert_eq!(overlay.mode, ViewMode::Full);
        assert!(overlay.lines[0].emphasis);
        assert_eq!(s.take_scroll_request(), Some(0));
        assert_eq!(s.take_scroll_request(), None);

        assert_eq!(s.goto_next(), Some(2));
        assert_eq!(s.buffer().cursor_position(), (2, 0));
        assert_eq!(s.goto_next(), Some(0));
    }

    #[test]
    fn test_previous_wraps_to_last() {
        let mut s = session(LOREM);
        s.on_filter_text_changed("ore");
        assert_eq!(s.goto_previous(), Some(2));
        assert_eq!(s.goto_previous(), Some(0));
        assert_eq!(s.match_counter_display().as_deref(), Some("[1/2]"));
    }

    #[test]
    fn test_navigation_when_idle_is_noop() {
        let mut s = session(LOREM);
        assert_eq!(s.goto_next(), None);
        assert_eq!(s.goto_previous(), None);
        assert_eq!(s.buffer().text(), LOREM);
    }

    // -- Edits while filtering -----------------------------------------------

    #[test]
    fn test_edit_marks_stale() {
        let mut s = session(LOREM);
        s.on_filter_text_changed("ore");
        type_at_end_of_row(&mut s, 0, "!");
        assert_eq!(s.state(), SessionState::Stale);
    }

    #[test]
    fn test_cursor_move_does_not_mark_stale() {
        let mut s = session(LOREM);
        s.on_filter_text_changed("ore");
        s.edit(|b| b.move_down());
        assert_eq!(s.state(), SessionState::Filtering);
    }

    #[test]
    fn test_edit_in_full_view_then_next_refilters() {
        let mut s = session(LOREM);
        s.on_filter_text_changed("ore");
        s.goto_next();
        // Make line 1 match too.
        type_at_end_of_row(&mut s, 1, " more");
        assert_eq!(s.goto_next(), Some(1));
        assert_eq!(s.state(), SessionState::Filtering);
        let current = s.engine().and_then(|e| e.current_line()).expect("current");
        assert_eq!(current.text, "dolor sit more");
    }

    #[test]
    fn test_edit_in_filtered_view_is_written_back() {
        let mut s = session(LOREM);
        s.on_filter_text_changed("ore");
        // Row 1 of the filtered view is source line 2.
        type_at_end_of_row(&mut s, 1, " X");
        s.clear_filter();
        assert_eq!(s.buffer().text(), "Lorem ipsum\ndolor sit\namet lorem X");
        assert!(s.is_modified());
    }

    #[test]
    fn test_deleting_middle_filtered_row_keeps_document_order() {
        let mut s = session("a1\nb\na2\nc\na3");
        s.on_filter_text_changed("a");
        assert_eq!(s.buffer().text(), "a1\na2\na3");
        s.edit(|b| {
            b.set_cursor_position(1, 0);
            for _ in 0.."a2\n".len() {
                b.delete_forward();
            }
        });
        assert_eq!(s.buffer().text(), "a1\na3");
        s.clear_filter();
        assert_eq!(s.buffer().text(), "a1\nb\nc\na3");
    }

    #[test]
    fn test_inserting_middle_filtered_row_keeps_document_order() {
        let mut s = session("a1\nb\na2\nc\na3");
        s.on_filter_text_changed("a");
        s.edit(|b| {
            b.set_cursor_position(0, 2);
            b.insert_newline();
            b.insert_str("new");
        });
        assert_eq!(s.buffer().text(), "a1\nnew\na2\na3");
        s.clear_filter();
        assert_eq!(s.buffer().text(), "a1\nnew\nb\na2\nc\na3");
    }

    #[test]
    fn test_edit_in_filtered_view_then_refilter() {
        let mut s = session(LOREM);
        s.on_filter_text_changed("ore");
        type_at_end_of_row(&mut s, 0, " extra");
        assert!(s.on_filter_text_changed("extra"));
        assert_eq!(s.buffer().text(), "Lorem ipsum extra");
        assert_eq!(s.overlay().map(|o| o.source_indices()), Some(vec![0]));
    }

    #[test]
    fn test_clear_preserves_full_view_edits() {
        let mut s = session(LOREM);
        s.on_filter_text_changed("ore");
        s.goto_next();
        type_at_end_of_row(&mut s, 1, "!");
        s.clear_filter();
        assert_eq!(s.buffer().text(), "Lorem ipsum\ndolor sit!\namet lorem");
        // The edit comes back as one user transaction.
        assert!(s.undo());
        assert_eq!(s.buffer().text(), LOREM);
    }

    #[test]
    fn test_document_text_while_filtering() {
        let mut s = session(LOREM);
        s.on_filter_text_changed("ore");
        assert_eq!(s.document_text(), LOREM);
        assert!(!s.is_modified());
        type_at_end_of_row(&mut s, 0, "?");
        assert_eq!(s.document_text(), "Lorem ipsum?\ndolor sit\namet lorem");
        assert!(s.is_modified());
    }

    // -- Undo ----------------------------------------------------------------

    #[test]
    fn test_undo_stops_at_overlay() {
        let mut s = session(LOREM);
        s.edit(|b| b.insert_char('>'));
        s.on_filter_text_changed("ore");
        assert!(!s.undo());
        assert_eq!(s.buffer().text(), ">Lorem ipsum\namet lorem");
    }

    #[test]
    fn test_undo_of_edit_while_filtering() {
        let mut s = session(LOREM);
        s.on_filter_text_changed("ore");
        type_at_end_of_row(&mut s, 0, "!");
        assert!(s.undo());
        assert_eq!(s.buffer().text(), "Lorem ipsum\namet lorem");
        assert!(!s.undo());
        assert!(s.redo());
        assert_eq!(s.buffer().text(), "Lorem ipsum!\namet lorem");
    }

    #[test]
    fn test_undo_redo_when_idle() {
        let mut s = session("");
        s.edit(|b| b.insert_str("abc"));
        assert!(s.undo());
        assert_eq!(s.buffer().text(), "");
        assert!(s.redo());
        assert_eq!(s.buffer().text(), "abc");
    }

    // -- Load / save state ---------------------------------------------------

    #[test]
    fn test_load_text_resets_everything() {
        let mut s = session(LOREM);
        s.on_filter_text_changed("ore");
        s.load_text("new");
        assert_eq!(s.state(), SessionState::Idle);
        assert_eq!(s.buffer().text(), "new");
        assert!(!s.buffer().can_undo());
        assert!(!s.is_modified());
    }

    #[test]
    fn test_mark_saved() {
        let mut s = session("a");
        s.edit(|b| b.insert_char('b'));
        assert!(s.is_modified());
        s.mark_saved();
        assert!(!s.is_modified());
    }

    // -- merge_filtered_edits ------------------------------------------------

    #[test]
    fn test_merge_unchanged_is_identity() {
        let snapshot = "a1\nb\na2\r\nc\n";
        let merged = merge_filtered_edits(snapshot, &[0, 2], "a1\na2");
        assert_eq!(merged, snapshot);
    }

    #[test]
    fn test_merge_replaces_edited_rows_in_place() {
        let merged = merge_filtered_edits("a1\nb\na2", &[0, 2], "A1\nA2");
        assert_eq!(merged, "A1\nb\nA2");
    }

    #[test]
    fn test_merge_extra_rows_follow_last_shown_line() {
        let merged = merge_filtered_edits("a1\nb\na2\nc", &[0, 2], "a1\na2\nnew");
        assert_eq!(merged, "a1\nb\na2\nnew\nc");
    }

    #[test]
    fn test_merge_extra_rows_after_last_line() {
        let merged = merge_filtered_edits("b\na", &[1], "a\nnew");
        assert_eq!(merged, "b\na\nnew");
    }

    #[test]
    fn test_merge_missing_rows_delete_lines() {
        let merged = merge_filtered_edits("a1\nb\na2\nc", &[0, 2], "a1");
        assert_eq!(merged, "a1\nb\nc");
    }

    #[test]
    fn test_merge_deleting_last_line_leaves_no_trailing_eol() {
        let merged = merge_filtered_edits("b\na", &[1], "");
        assert_eq!(merged, "b\n");
        let merged = merge_filtered_edits("a\nb\nc", &[1, 2], "b");
        assert_eq!(merged, "a\nb");
    }

    #[test]
    fn test_merge_with_nothing_shown() {
        assert_eq!(merge_filtered_edits("a\nb", &[], ""), "a\nb");
        assert_eq!(merge_filtered_edits("a\nb", &[], "typed"), "a\nb\ntyped");
    }

    #[test]
    fn test_merge_deleting_middle_row_keeps_hidden_lines_in_place() {
        let merged = merge_filtered_edits("a1\nb\na2\nc\na3", &[0, 2, 4], "a1\na3");
        assert_eq!(merged, "a1\nb\nc\na3");
    }

    #[test]
    fn test_merge_inserted_middle_row_follows_row_above() {
        let merged = merge_filtered_edits("a1\nb\na2\nc\na3", &[0, 2, 4], "a1\nnew\na2\na3");
        assert_eq!(merged, "a1\nnew\nb\na2\nc\na3");
    }

    #[test]
    fn test_merge_row_typed_at_top_goes_before_first_shown_line() {
        let merged = merge_filtered_edits("b\na1\nc\na2", &[1, 3], "top\na1\na2");
        assert_eq!(merged, "b\ntop\na1\nc\na2");
    }

    #[test]
    fn test_merge_edit_and_delete_in_one_run() {
        let merged = merge_filtered_edits("a1\nb\na2\nc\na3\nd\na4", &[0, 2, 4, 6], "a1\nA2\na4");
        assert_eq!(merged, "a1\nb\nA2\nc\nd\na4");
    }

    #[test]
    fn test_merge_duplicate_rows_delete_only_the_removed_one() {
        let merged = merge_filtered_edits("x\nb\nx\nc\ny", &[0, 2, 4], "x\ny");
        assert_eq!(merged, "x\nb\nc\ny");
    }

    #[test]
    fn test_align_rows_marks_only_the_touched_region() {
        let rows = |v: &[&str]| v.iter().map(|s| s.to_string()).collect::<Vec<_>>();
        let ops = align_rows(&rows(&["a", "b", "c"]), &rows(&["a", "x", "b", "c"]));
        assert_eq!(
            ops,
            vec![RowOp::Keep, RowOp::Insert, RowOp::Keep, RowOp::Keep]
        );
        let ops = align_rows(&rows(&["a", "b", "c"]), &rows(&["a", "c"]));
        assert_eq!(ops, vec![RowOp::Keep, RowOp::Delete, RowOp::Keep]);
    }

    #[test]
    fn test_merge_keeps_crlf_terminators() {
        let merged = merge_filtered_edits("a\r\nb\r\na", &[0, 2], "a\na\nz");
        assert_eq!(merged, "a\r\nb\r\na\r\nz");
    }
}
