//! Turns filter results into displayable documents.
//!
//! Two views are produced from a [`FilterEngine`]:
//!
//! - the **filtered view** contains only the matching lines, in original
//!   order, each carrying its term highlights;
//! - the **full view** contains every snapshot line, with highlights on the
//!   matching lines and emphasis on the current match.
//!
//! [`styled_line`] converts one rendered line into a ratatui [`Line`] using
//! the active theme. Projection never modifies the engine or its snapshot.

use ratatui::style::Style;
use ratatui::text::{Line, Span};

use crate::engine::FilterEngine;
use crate::matcher::HighlightSpan;
use crate::theme::ThemeColors;

// ---------------------------------------------------------------------------
// Rendered document
// ---------------------------------------------------------------------------

/// Which projection produced a [`RenderedDocument`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewMode {
    /// Only the matching lines.
    Filtered,
    /// Every line, with the current match emphasised.
    Full,
}

/// One displayed row together with the snapshot line it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedLine {
    pub source_index: usize,
    pub text: String,
    pub spans: Vec<HighlightSpan>,
    pub emphasis: bool,
}

/// The text to place in the editable surface plus per-row styling.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedDocument {
    pub mode: ViewMode,
    /// Exact text written into the buffer for this view.
    pub text: String,
    pub lines: Vec<RenderedLine>,
}

impl RenderedDocument {
    /// Display row that shows snapshot line `source_index`.
    pub fn row_of(&self, source_index: usize) -> Option<usize> {
        self.lines
            .iter()
            .position(|l| l.source_index == source_index)
    }

    /// Styling information for display row `row`.
    pub fn row(&self, row: usize) -> Option<&RenderedLine> {
        self.lines.get(row)
    }

    /// Snapshot line numbers in display order.
    pub fn source_indices(&self) -> Vec<usize> {
        self.lines.iter().map(|l| l.source_index).collect()
    }
}

// ---------------------------------------------------------------------------
// Projections
// ---------------------------------------------------------------------------

/// Build the filtered view: matching lines only, joined with `\n`.
///
/// No terminator follows the last row, so removing the first or last line
/// of the document never leaves a stray empty row behind.
pub fn filtered_view(engine: &FilterEngine) -> RenderedDocument {
    let lines: Vec<RenderedLine> = engine
        .results()
        .map(|fl| RenderedLine {
            source_index: fl.index,
            text: fl.text.clone(),
            spans: fl.spans.clone(),
            emphasis: false,
        })
        .collect();

    let text = lines
        .iter()
        .map(|l| l.text.as_str())
        .collect::<Vec<_>>()
        .join("\n");

    RenderedDocument {
        mode: ViewMode::Filtered,
        text,
        lines,
    }
}

/// Build the full view: every snapshot line, current match emphasised.
///
/// The text is the snapshot itself, so original line terminators survive.
pub fn full_view(engine: &FilterEngine) -> RenderedDocument {
    let current = engine.current();
    let lines = engine
        .lines()
        .iter()
        .map(|line| RenderedLine {
            source_index: line.index,
            text: line.text.clone(),
            spans: engine
                .get(line.index)
                .map(|fl| fl.spans.clone())
                .unwrap_or_default(),
            emphasis: current == Some(line.index),
        })
        .collect();

    RenderedDocument {
        mode: ViewMode::Full,
        text: engine.snapshot().to_string(),
        lines,
    }
}

// ---------------------------------------------------------------------------
// Styling
// ---------------------------------------------------------------------------

/// Cut `text` into consecutive pieces, flagging the highlighted ones.
///
/// Spans that run past the end of `text` are clamped, overlapping parts
/// are skipped and zero-width spans produce no piece.
pub fn split_highlights<'a>(text: &'a str, spans: &[HighlightSpan]) -> Vec<(&'a str, bool)> {
    let mut pieces = Vec::new();
    let mut pos = 0;

    for span in spans {
        let range = span.byte_range(text);
        let start = range.start.max(pos);
        if start >= range.end {
            continue;
        }
        if start > pos {
            pieces.push((&text[pos..start], false));
        }
        pieces.push((&text[start..range.end], true));
        pos = range.end;
    }

    if pos < text.len() {
        pieces.push((&text[pos..], false));
    }
    pieces
}

/// Style one row of text.
///
/// Highlighted ranges get the match colours. When `emphasis` is set the
/// whole row gets the current-line background and its matches use the
/// current-match colours instead.
pub fn styled_line(
    text: &str,
    spans: &[HighlightSpan],
    emphasis: bool,
    theme: &ThemeColors,
) -> Line<'static> {
    let base = if emphasis {
        Style::default().bg(theme.current_line_bg)
    } else {
        Style::default()
    };
    let highlight = if emphasis {
        Style::default()
            .fg(theme.current_match_fg)
            .bg(theme.current_match_bg)
    } else {
        Style::default().fg(theme.match_fg).bg(theme.match_bg)
    };

    let pieces: Vec<Span<'static>> = split_highlights(text, spans)
        .into_iter()
        .map(|(piece, hit)| Span::styled(piece.to_string(), if hit { highlight } else { base }))
        .collect();

    Line::from(pieces).style(base)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn engine(doc: &str, filter: &str) -> FilterEngine {
        let mut engine = FilterEngine::new(doc);
        engine.apply(filter);
        engine
    }

    fn line_text(line: &Line) -> String {
        line.spans.iter().map(|s| s.content.as_ref()).collect()
    }

    // -- filtered_view -------------------------------------------------------

    #[test]
    fn test_filtered_view_only_matches() {
        let e = engine("Lorem ipsum\ndolor sit\namet lorem", "lo em");
        let doc = filtered_view(&e);
        assert_eq!(doc.mode, ViewMode::Filtered);
        assert_eq!(doc.text, "Lorem ipsum\namet lorem");
        assert_eq!(doc.source_indices(), vec![0, 2]);
        assert!(doc.lines.iter().all(|l| !l.emphasis));
    }

    #[test]
    fn test_filtered_view_drops_first_line_cleanly() {
        let e = engine("skip\nkeep a\nkeep b", "keep");
        let doc = filtered_view(&e);
        assert_eq!(doc.text, "keep a\nkeep b");
    }

    #[test]
    fn test_filtered_view_drops_last_line_cleanly() {
        let e = engine("keep a\nkeep b\nskip", "keep");
        let doc = filtered_view(&e);
        assert_eq!(doc.text, "keep a\nkeep b");
    }

    #[test]
    fn test_filtered_view_trailing_empty_line_dropped() {
        let e = engine("keep\nother\n", "keep");
        let doc = filtered_view(&e);
        assert_eq!(doc.text, "keep");
    }

    #[test]
    fn test_filtered_view_no_matches_is_empty() {
        let e = engine("a\nb", "zzz");
        let doc = filtered_view(&e);
        assert_eq!(doc.text, "");
        assert!(doc.lines.is_empty());
    }

    #[test]
    fn test_filtered_view_row_of() {
        let e = engine("a\nb\na", "a");
        let doc = filtered_view(&e);
        assert_eq!(doc.row_of(2), Some(1));
        assert_eq!(doc.row_of(1), None);
        assert_eq!(doc.row(0).map(|l| l.source_index), Some(0));
    }

    // -- full_view -----------------------------------------------------------

    #[test]
    fn test_full_view_text_is_snapshot() {
        let snapshot = "Lorem ipsum\r\ndolor sit\r\namet lorem\r\n";
        let mut e = engine(snapshot, "lo em");
        e.next_match();
        let doc = full_view(&e);
        assert_eq!(doc.mode, ViewMode::Full);
        assert_eq!(doc.text, snapshot);
        assert_eq!(doc.lines.len(), 4);
    }

    #[test]
    fn test_full_view_emphasis_on_current_only() {
        let mut e = engine("Lorem ipsum\ndolor sit\namet lorem", "lo em");
        e.next_match();
        e.next_match();
        let doc = full_view(&e);
        let emphasised: Vec<usize> = doc
            .lines
            .iter()
            .filter(|l| l.emphasis)
            .map(|l| l.source_index)
            .collect();
        assert_eq!(emphasised, vec![2]);
    }

    #[test]
    fn test_full_view_spans_only_on_matches() {
        let e = engine("Lorem ipsum\ndolor sit\namet lorem", "lo em");
        let doc = full_view(&e);
        assert!(!doc.lines[0].spans.is_empty());
        assert!(doc.lines[1].spans.is_empty());
        assert!(!doc.lines[2].spans.is_empty());
        assert!(doc.lines.iter().all(|l| !l.emphasis));
    }

    #[test]
    fn test_full_view_first_and_last_lines() {
        let mut e = engine("first x\nmid\nlast x", "x");
        e.prev_match();
        let doc = full_view(&e);
        assert!(doc.lines[2].emphasis);
        assert_eq!(doc.lines[0].text, "first x");
        assert_eq!(doc.lines[2].text, "last x");
    }

    #[test]
    fn test_projection_does_not_touch_snapshot() {
        let e = engine("a\nb\n", "a");
        let _ = filtered_view(&e);
        let _ = full_view(&e);
        assert_eq!(e.snapshot(), "a\nb\n");
    }

    // -- split_highlights ----------------------------------------------------

    #[test]
    fn test_split_highlights_basic() {
        let spans = [HighlightSpan::new(1, 4), HighlightSpan::new(7, 10)];
        let pieces = split_highlights("Lorem Ipsum", &spans);
        assert_eq!(
            pieces,
            vec![
                ("L", false),
                ("ore", true),
                ("m I", false),
                ("psu", true),
                ("m", false),
            ]
        );
    }

    #[test]
    fn test_split_highlights_no_spans() {
        assert_eq!(split_highlights("abc", &[]), vec![("abc", false)]);
        assert!(split_highlights("", &[]).is_empty());
    }

    #[test]
    fn test_split_highlights_clamps_out_of_range() {
        let spans = [HighlightSpan::new(2, 20), HighlightSpan::new(30, 40)];
        assert_eq!(
            split_highlights("abcd", &spans),
            vec![("ab", false), ("cd", true)]
        );
    }

    #[test]
    fn test_split_highlights_skips_zero_width() {
        let spans = [HighlightSpan::new(1, 1), HighlightSpan::new(2, 3)];
        assert_eq!(
            split_highlights("abcd", &spans),
            vec![("ab", false), ("c", true), ("d", false)]
        );
    }

    #[test]
    fn test_split_highlights_multibyte() {
        let spans = [HighlightSpan::new(1, 2)];
        assert_eq!(
            split_highlights("日本語", &spans),
            vec![("日", false), ("本", true), ("語", false)]
        );
    }

    // -- styled_line ---------------------------------------------------------

    #[test]
    fn test_styled_line_plain_match_colours() {
        let theme = ThemeColors::dark();
        let line = styled_line("Lorem", &[HighlightSpan::new(1, 4)], false, &theme);
        assert_eq!(line_text(&line), "Lorem");
        assert_eq!(line.spans.len(), 3);
        assert_eq!(line.spans[1].style.bg, Some(theme.match_bg));
        assert_eq!(line.spans[0].style.bg, None);
        assert_eq!(line.style.bg, None);
    }

    #[test]
    fn test_styled_line_emphasis_colours() {
        let theme = ThemeColors::dark();
        let line = styled_line("Lorem", &[HighlightSpan::new(1, 4)], true, &theme);
        assert_eq!(line.style.bg, Some(theme.current_line_bg));
        assert_eq!(line.spans[0].style.bg, Some(theme.current_line_bg));
        assert_eq!(line.spans[1].style.bg, Some(theme.current_match_bg));
        assert_eq!(line.spans[1].style.fg, Some(theme.current_match_fg));
    }

    #[test]
    fn test_styled_line_stale_spans_do_not_panic() {
        let theme = ThemeColors::light();
        let line = styled_line("ab", &[HighlightSpan::new(5, 9)], false, &theme);
        assert_eq!(line_text(&line), "ab");
    }
}
