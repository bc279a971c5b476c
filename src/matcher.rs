//! Ordered multi-term line matcher.
//!
//! A filter string such as `"ore psu"` is split on single spaces into
//! terms. A line matches when every term occurs in it, case-insensitively,
//! in order and without overlap: each term is searched for starting where
//! the previous one ended, taking the earliest occurrence (no backtracking).
//!
//! This is literal ordered-substring matching, not subsequence or
//! edit-distance matching. Empty terms (from consecutive spaces) are kept
//! and match a zero-width span at the current search position.
//!
//! All offsets are in characters relative to the start of the line.

use std::ops::Range;

// ---------------------------------------------------------------------------
// HighlightSpan
// ---------------------------------------------------------------------------

/// A half-open `[begin, end)` range of characters within one line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HighlightSpan {
    pub begin: usize,
    pub end: usize,
}

impl HighlightSpan {
    pub fn new(begin: usize, end: usize) -> Self {
        debug_assert!(begin <= end, "span begin {} > end {}", begin, end);
        Self { begin, end }
    }

    /// Number of characters covered by the span. A reversed span is empty.
    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.begin)
    }

    pub fn is_empty(&self) -> bool {
        self.begin >= self.end
    }

    /// Convert the character range to a byte range of `text`.
    ///
    /// Offsets past the end of `text` are clamped to `text.len()`, so the
    /// result is always safe to slice with even if the line was edited
    /// after the span was computed.
    pub fn byte_range(&self, text: &str) -> Range<usize> {
        let start = char_to_byte(text, self.begin);
        let end = char_to_byte(text, self.end.max(self.begin));
        start..end
    }
}

/// Byte offset of the `char_idx`-th character, clamped to the end.
fn char_to_byte(text: &str, char_idx: usize) -> usize {
    text.char_indices()
        .nth(char_idx)
        .map(|(b, _)| b)
        .unwrap_or(text.len())
}

// ---------------------------------------------------------------------------
// MatchResult
// ---------------------------------------------------------------------------

/// Outcome of matching one line against a term list.
///
/// When `matched` is false `spans` is always empty: spans collected before
/// the failing term are discarded.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MatchResult {
    pub matched: bool,
    pub spans: Vec<HighlightSpan>,
}

impl MatchResult {
    fn failed() -> Self {
        Self::default()
    }
}

// ---------------------------------------------------------------------------
// Terms
// ---------------------------------------------------------------------------

/// Split a filter string into terms on the single space character.
///
/// Empty terms are preserved: `"a  b"` yields `["a", "", "b"]`.
pub fn split_terms(filter: &str) -> Vec<String> {
    filter.split(' ').map(str::to_string).collect()
}

/// A parsed term list with each term case-folded once up front.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Terms {
    raw: Vec<String>,
    folded: Vec<Vec<char>>,
}

impl Terms {
    /// Build from an explicit term sequence.
    pub fn new<S: AsRef<str>>(terms: &[S]) -> Self {
        let raw: Vec<String> = terms.iter().map(|t| t.as_ref().to_string()).collect();
        let folded = raw.iter().map(|t| fold_str(t)).collect();
        Self { raw, folded }
    }

    /// Parse a space-separated filter string.
    pub fn parse(filter: &str) -> Self {
        Self::new(&split_terms(filter))
    }

    pub fn as_slice(&self) -> &[String] {
        &self.raw
    }

    pub fn len(&self) -> usize {
        self.raw.len()
    }

    pub fn is_empty(&self) -> bool {
        self.raw.is_empty()
    }

    /// Match `line` against these terms.
    pub fn match_line(&self, line: &str) -> MatchResult {
        let haystack = fold_str(line);
        let mut spans = Vec::with_capacity(self.folded.len());
        let mut cursor = 0;

        for needle in &self.folded {
            match find_from(&haystack, needle, cursor) {
                Some(start) => {
                    let end = start + needle.len();
                    spans.push(HighlightSpan::new(start, end));
                    cursor = end;
                }
                None => return MatchResult::failed(),
            }
        }

        MatchResult {
            matched: true,
            spans,
        }
    }
}

/// Match `line` against an ordered term sequence.
pub fn match_line<S: AsRef<str>>(line: &str, terms: &[S]) -> MatchResult {
    Terms::new(terms).match_line(line)
}

// ---------------------------------------------------------------------------
// Case folding and search
// ---------------------------------------------------------------------------

/// Fold a single character to lowercase.
///
/// Characters whose lowercase form expands to several characters (e.g.
/// U+0130) are left unchanged so that one input character always maps to
/// exactly one folded character and offsets stay aligned.
fn fold_char(c: char) -> char {
    let mut lower = c.to_lowercase();
    match (lower.next(), lower.next()) {
        (Some(l), None) => l,
        _ => c,
    }
}

fn fold_str(s: &str) -> Vec<char> {
    s.chars().map(fold_char).collect()
}

/// Earliest position `>= from` where `needle` occurs in `haystack`.
///
/// An empty needle is found at `from` itself (if `from` is in range).
fn find_from(haystack: &[char], needle: &[char], from: usize) -> Option<usize> {
    if from > haystack.len() {
        return None;
    }
    if needle.is_empty() {
        return Some(from);
    }
    if needle.len() > haystack.len() {
        return None;
    }
    (from..=haystack.len() - needle.len()).find(|&i| haystack[i..i + needle.len()] == *needle)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
