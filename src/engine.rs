//! Filter engine: line splitting, filtering, and match navigation.
//!
//! A [`FilterEngine`] is built from a snapshot of the document text. It
//! splits the snapshot into lines once, runs the matcher over every line
//! when a filter is applied, and keeps the matching lines in an ordered map
//! keyed by their original line number. Next/previous navigation walks
//! that map with wraparound.

use std::collections::BTreeMap;
use std::ops::{Bound, Range};

use crate::matcher::{HighlightSpan, Terms};

// ---------------------------------------------------------------------------
// Line splitting
// ---------------------------------------------------------------------------

/// A line of the snapshot with its 0-based position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Line {
    pub index: usize,
    pub text: String,
}

/// Byte ranges of one line's content and of the terminator that ends it.
///
/// The terminator range is empty for the last line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineSpan {
    pub content: Range<usize>,
    pub terminator: Range<usize>,
}

/// Locate every line of `text`.
///
/// `\r\n`, `\r` and `\n` all end a line; `\r\n` counts as one boundary.
/// Empty lines are kept, including the empty line after a final
/// terminator, so an empty string yields a single empty line.
pub fn line_spans(text: &str) -> Vec<LineSpan> {
    let bytes = text.as_bytes();
    let mut spans = Vec::new();
    let mut start = 0;
    let mut i = 0;

    while i < bytes.len() {
        let term_len = match bytes[i] {
            b'\n' => 1,
            b'\r' if bytes.get(i + 1) == Some(&b'\n') => 2,
            b'\r' => 1,
            _ => {
                i += 1;
                continue;
            }
        };
        spans.push(LineSpan {
            content: start..i,
            terminator: i..i + term_len,
        });
        i += term_len;
        start = i;
    }

    spans.push(LineSpan {
        content: start..bytes.len(),
        terminator: bytes.len()..bytes.len(),
    });
    spans
}

/// Split `text` into indexed lines with terminators removed.
pub fn split_lines(text: &str) -> Vec<Line> {
    line_spans(text)
        .into_iter()
        .enumerate()
        .map(|(index, span)| Line {
            index,
            text: text[span.content].to_string(),
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Filtering
// ---------------------------------------------------------------------------

/// A snapshot line that satisfied the filter, with its highlight spans.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilteredLine {
    pub index: usize,
    pub text: String,
    pub spans: Vec<HighlightSpan>,
}

fn filter_lines(lines: &[Line], terms: &Terms) -> Vec<FilteredLine> {
    lines
        .iter()
        .filter_map(|line| {
            let result = terms.match_line(&line.text);
            result.matched.then(|| FilteredLine {
                index: line.index,
                text: line.text.clone(),
                spans: result.spans,
            })
        })
        .collect()
}

/// Filter `snapshot` and return the matching lines in ascending order.
///
/// An empty filter string is a single empty term, which every line
/// satisfies.
pub fn filter(snapshot: &str, filter_string: &str) -> Vec<FilteredLine> {
    filter_lines(&split_lines(snapshot), &Terms::parse(filter_string))
}

// ---------------------------------------------------------------------------
// FilterEngine
// ---------------------------------------------------------------------------

/// Filtering state for one snapshot of a document.
#[derive(Debug, Clone)]
pub struct FilterEngine {
    snapshot: String,
    lines: Vec<Line>,
    filter: String,
    results: BTreeMap<usize, FilteredLine>,
    current: Option<usize>,
}

impl FilterEngine {
    /// Create an engine over `snapshot` with no filter applied.
    pub fn new(snapshot: impl Into<String>) -> Self {
        let snapshot = snapshot.into();
        let lines = split_lines(&snapshot);
        Self {
            snapshot,
            lines,
            filter: String::new(),
            results: BTreeMap::new(),
            current: None,
        }
    }

    /// Recompute the result set for `filter` and reset navigation.
    pub fn apply(&mut self, filter: &str) {
        let terms = Terms::parse(filter);
        self.results = filter_lines(&self.lines, &terms)
            .into_iter()
            .map(|fl| (fl.index, fl))
            .collect();
        self.filter = filter.to_string();
        self.current = None;
    }

    /// Move to the next matching line, wrapping to the first.
    ///
    /// Returns the new current line, or `None` if nothing matches.
    pub fn next_match(&mut self) -> Option<usize> {
        self.resume_after(self.current)
    }

    /// Move to the previous matching line, wrapping to the last.
    pub fn prev_match(&mut self) -> Option<usize> {
        self.resume_before(self.current)
    }

    /// Move to the first match strictly after `anchor`, wrapping around.
    ///
    /// `anchor` need not be a key of the result set. `None` selects the
    /// first match.
    pub fn resume_after(&mut self, anchor: Option<usize>) -> Option<usize> {
        let found = match anchor {
            Some(k) => self
                .results
                .range((Bound::Excluded(k), Bound::Unbounded))
                .next()
                .or_else(|| self.results.iter().next()),
            None => self.results.iter().next(),
        };
        if let Some((&k, _)) = found {
            self.current = Some(k);
        }
        self.current.filter(|k| self.results.contains_key(k))
    }

    /// Move to the last match strictly before `anchor`, wrapping around.
    pub fn resume_before(&mut self, anchor: Option<usize>) -> Option<usize> {
        let found = match anchor {
            Some(k) => self
                .results
                .range(..k)
                .next_back()
                .or_else(|| self.results.iter().next_back()),
            None => self.results.iter().next_back(),
        };
        if let Some((&k, _)) = found {
            self.current = Some(k);
        }
        self.current.filter(|k| self.results.contains_key(k))
    }

    /// Line number of the current match, if navigation has started.
    pub fn current(&self) -> Option<usize> {
        self.current
    }

    pub fn current_line(&self) -> Option<&FilteredLine> {
        self.current.and_then(|k| self.results.get(&k))
    }

    pub fn get(&self, index: usize) -> Option<&FilteredLine> {
        self.results.get(&index)
    }

    /// Matching lines in ascending line order.
    pub fn results(&self) -> impl Iterator<Item = &FilteredLine> {
        self.results.values()
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    pub fn snapshot(&self) -> &str {
        &self.snapshot
    }

    pub fn lines(&self) -> &[Line] {
        &self.lines
    }

    pub fn filter(&self) -> &str {
        &self.filter
    }

    /// Format the match counter for display (e.g. `"[3/17]"`).
    ///
    /// Before navigation starts the position is shown as 0.
    pub fn match_counter_display(&self) -> String {
        let position = match self.current {
            Some(k) if self.results.contains_key(&k) => self.results.range(..k).count() + 1,
            _ => 0,
        };
        format!("[{}/{}]", position, self.results.len())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
