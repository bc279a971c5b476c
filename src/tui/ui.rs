//! Layout and rendering for the TUI.
//!
//! Implements the three-part layout:
//! - **Filter bar** (top, height 3): the filter input
//! - **Editor** (fills the middle): line-number gutter plus document rows,
//!   styled with the filter highlights
//! - **Status bar** (bottom, height 1): messages, badges and key hints

use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Wrap};
use ratatui::Frame;

use crate::engine::line_spans;
use crate::projector::styled_line;
use crate::session::SessionState;
use crate::theme::ThemeColors;
use crate::tui::app::{App, Focus, PendingAction};

// ---------------------------------------------------------------------------
// Main draw function
// ---------------------------------------------------------------------------

/// Draw the entire TUI frame.
///
/// Splits the terminal vertically into the filter bar, the editor and the
/// status bar, then draws any open overlay on top.
pub fn draw(frame: &mut Frame, app: &mut App) {
    let size = frame.area();

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(0),
            Constraint::Length(1),
        ])
        .split(size);

    draw_filter_bar(frame, app, chunks[0]);
    draw_editor(frame, app, chunks[1]);
    draw_status_bar(frame, app, chunks[2]);

    if app.recent_menu.visible {
        draw_recent_menu(frame, app, size);
    }

    if app.help_overlay_visible {
        draw_help_overlay(frame, app, size);
    }

    if app.save_as.is_some() {
        draw_save_as_prompt(frame, app, size);
    }

    if let Some(ref action) = app.pending_action {
        draw_save_confirmation(frame, app, action, size);
    }
}

/// True when an overlay owns the keyboard.
fn modal_open(app: &App) -> bool {
    app.help_overlay_visible
        || app.recent_menu.visible
        || app.save_as.is_some()
        || app.pending_action.is_some()
}

fn border_style(theme: &ThemeColors, focused: bool) -> Style {
    if focused {
        Style::default().fg(theme.border_focused)
    } else {
        Style::default().fg(theme.border_unfocused)
    }
}

// ---------------------------------------------------------------------------
// Filter bar
// ---------------------------------------------------------------------------

const FILTER_PROMPT: &str = "/ ";

const FILTER_PLACEHOLDER: &str = "Ctrl+F, then type terms separated by spaces";

/// Build the filter bar contents.
///
/// The input is dimmed while it is shorter than the filter threshold.
fn filter_bar_line(app: &App) -> Line<'static> {
    let theme = &app.theme_colors;
    let prompt = Span::styled(
        FILTER_PROMPT.to_string(),
        Style::default()
            .fg(theme.filter_prompt)
            .add_modifier(Modifier::BOLD),
    );

    if app.filter_input.is_empty() && app.focus != Focus::Filter {
        return Line::from(vec![
            prompt,
            Span::styled(
                FILTER_PLACEHOLDER.to_string(),
                Style::default()
                    .fg(theme.editor_placeholder)
                    .add_modifier(Modifier::ITALIC),
            ),
        ]);
    }

    let input_color = if app.session.is_filtering() {
        theme.filter_input_fg
    } else {
        theme.filter_inactive
    };
    Line::from(vec![
        prompt,
        Span::styled(app.filter_input.clone(), Style::default().fg(input_color)),
    ])
}

fn draw_filter_bar(frame: &mut Frame, app: &App, area: Rect) {
    let focused = app.focus == Focus::Filter;
    let block = Block::default()
        .title(" Filter ")
        .borders(Borders::ALL)
        .border_style(border_style(&app.theme_colors, focused));

    let inner = block.inner(area);
    frame.render_widget(block, area);
    if inner.width == 0 || inner.height == 0 {
        return;
    }

    frame.render_widget(Paragraph::new(filter_bar_line(app)), inner);

    if focused && !modal_open(app) {
        let offset = (FILTER_PROMPT.len() + app.filter_input.chars().count()) as u16;
        let x = inner.x + offset.min(inner.width - 1);
        frame.set_cursor_position((x, inner.y));
    }
}

// ---------------------------------------------------------------------------
// Editor
// ---------------------------------------------------------------------------

/// Everything needed to paint the editor area.
#[derive(Debug, Default)]
struct EditorView {
    gutter: Vec<Line<'static>>,
    rows: Vec<Line<'static>>,
    /// Cursor position relative to the text area.
    cursor: Option<(u16, u16)>,
}

/// Width of the line-number gutter: enough digits for the largest line
/// number plus one space.
fn gutter_width(app: &App) -> u16 {
    let lines = app
        .session
        .engine()
        .map_or(0, |e| e.lines().len())
        .max(app.session.buffer().line_count());
    (lines.to_string().len() + 1) as u16
}

/// Line number shown in the gutter for buffer row `row`.
///
/// While filtering this is the original line the row came from, so the
/// filtered view shows where each match lives in the document.
fn gutter_label(app: &App, row: usize) -> Option<usize> {
    match app.session.overlay() {
        Some(rendered) => rendered.row(row).map(|l| l.source_index + 1),
        None => Some(row + 1),
    }
}

/// Take the characters `start..end` of a styled line, keeping styles.
fn slice_line(line: &Line<'_>, start: usize, end: usize) -> Line<'static> {
    let mut pieces: Vec<Span<'static>> = Vec::new();
    let mut pos = 0;
    for span in &line.spans {
        if pos >= end {
            break;
        }
        let len = span.content.chars().count();
        let from = start.max(pos);
        let to = end.min(pos + len);
        if from < to {
            let piece: String = span
                .content
                .chars()
                .skip(from - pos)
                .take(to - from)
                .collect();
            pieces.push(Span::styled(piece, span.style));
        }
        pos += len;
    }
    Line::from(pieces).style(line.style)
}

/// Lay out the visible buffer rows for a text area of `width` x `height`.
fn build_editor_view(app: &App, width: usize, height: usize) -> EditorView {
    let theme = &app.theme_colors;
    let buffer = app.session.buffer();
    let text = buffer.text();
    let spans = line_spans(text);
    let overlay = app.session.overlay();
    let (cursor_row, cursor_col) = buffer.cursor_position();
    let digits = gutter_width(app).saturating_sub(1) as usize;
    let width = width.max(1);

    let mut view = EditorView::default();

    for (row, span) in spans.iter().enumerate().skip(app.scroll_offset) {
        if view.rows.len() >= height {
            break;
        }

        let raw = &text[span.content.clone()];
        // Tabs take one cell so that columns stay aligned with the cursor.
        let shown = raw.replace('\t', " ");
        let line = match overlay.and_then(|o| o.row(row)) {
            // Rows the user has edited since the projection lose their
            // highlights until the next reconcile.
            Some(rendered) if rendered.text == raw => {
                styled_line(&shown, &rendered.spans, rendered.emphasis, theme)
            }
            _ => Line::from(shown.clone()),
        };

        let gutter_style = if row == cursor_row {
            Style::default().fg(theme.gutter_current_fg)
        } else {
            Style::default().fg(theme.gutter_fg)
        };
        let label = match gutter_label(app, row) {
            Some(n) => format!("{:>width$} ", n, width = digits),
            None => " ".repeat(digits + 1),
        };

        if app.word_wrap {
            let chars = shown.chars().count();
            let chunks = chars.max(1).div_ceil(width);
            let cursor_chunk = (cursor_col / width).min(chunks - 1);
            for chunk in 0..chunks {
                if view.rows.len() >= height {
                    break;
                }
                if row == cursor_row && chunk == cursor_chunk {
                    let x = (cursor_col - chunk * width).min(width - 1);
                    view.cursor = Some((x as u16, view.rows.len() as u16));
                }
                view.rows
                    .push(slice_line(&line, chunk * width, (chunk + 1) * width));
                let gutter_text = if chunk == 0 {
                    label.clone()
                } else {
                    " ".repeat(digits + 1)
                };
                view.gutter
                    .push(Line::from(Span::styled(gutter_text, gutter_style)));
            }
        } else {
            if row == cursor_row && cursor_col >= app.h_scroll && cursor_col - app.h_scroll < width
            {
                view.cursor = Some(((cursor_col - app.h_scroll) as u16, view.rows.len() as u16));
            }
            view.rows
                .push(slice_line(&line, app.h_scroll, app.h_scroll + width));
            view.gutter.push(Line::from(Span::styled(label, gutter_style)));
        }
    }

    view
}

fn draw_editor(frame: &mut Frame, app: &mut App, area: Rect) {
    let focused = app.focus == Focus::Editor;
    let title = if app.session.is_modified() {
        format!(" {} [+] ", app.document_title())
    } else {
        format!(" {} ", app.document_title())
    };
    let block = Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_style(border_style(&app.theme_colors, focused));

    let inner = block.inner(area);
    frame.render_widget(block, area);
    if inner.width == 0 || inner.height == 0 {
        return;
    }

    let gutter = if app.line_numbers {
        gutter_width(app).min(inner.width - 1)
    } else {
        0
    };
    let text_area = Rect::new(inner.x + gutter, inner.y, inner.width - gutter, inner.height);

    // Scrolling depends on the area size, so settle it before laying out.
    app.editor_height = text_area.height as usize;
    app.editor_width = text_area.width as usize;
    app.ensure_cursor_visible();

    let view = build_editor_view(app, text_area.width as usize, text_area.height as usize);

    if gutter > 0 {
        let gutter_area = Rect::new(inner.x, inner.y, gutter, inner.height);
        frame.render_widget(Paragraph::new(view.gutter), gutter_area);
    }
    frame.render_widget(
        Paragraph::new(view.rows).style(Style::default().fg(app.theme_colors.editor_text)),
        text_area,
    );

    if focused && !modal_open(app) {
        if let Some((x, y)) = view.cursor {
            frame.set_cursor_position((text_area.x + x, text_area.y + y));
        }
    }
}

// ---------------------------------------------------------------------------
// Overlay helpers
// ---------------------------------------------------------------------------

/// Rect of `width` x `height` centred in `area`, clamped to it.
fn centered_rect(area: Rect, width: u16, height: u16) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    let x = area.x + (area.width.saturating_sub(width)) / 2;
    let y = area.y + (area.height.saturating_sub(height)) / 2;
    Rect::new(x, y, width, height)
}

// ---------------------------------------------------------------------------
// Recent-files menu
// ---------------------------------------------------------------------------

fn draw_recent_menu(frame: &mut Frame, app: &App, area: Rect) {
    let theme = &app.theme_colors;
    let menu = &app.recent_menu;

    if area.width < 5 || area.height < 5 {
        return;
    }

    let overlay_area = centered_rect(area, 70, menu.items.len() as u16 + 4);
    frame.render_widget(Clear, overlay_area);

    let block = Block::default()
        .title(" Recent Files ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme.border_focused));

    let inner = block.inner(overlay_area);
    frame.render_widget(block, overlay_area);

    if inner.width == 0 || inner.height == 0 {
        return;
    }

    let mut lines: Vec<Line> = Vec::new();
    for index in 0..menu.items.len() {
        let label = format!(" {}", menu.item_label(index));
        let style = if index == menu.selected {
            Style::default()
                .fg(theme.overlay_selected_fg)
                .bg(theme.overlay_selected_bg)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(theme.overlay_unselected)
        };
        lines.push(Line::from(Span::styled(label, style)));
    }

    lines.push(Line::from(""));
    lines.push(Line::from(vec![
        Span::styled(
            " Enter/1-9",
            Style::default()
                .fg(theme.overlay_shortcut_key)
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw(":open  "),
        Span::styled(
            "Esc",
            Style::default()
                .fg(theme.overlay_shortcut_key)
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw(":close"),
    ]));

    let paragraph = Paragraph::new(lines)
        .style(Style::default().bg(theme.overlay_bg).fg(theme.overlay_fg));
    frame.render_widget(paragraph, inner);
}

// ---------------------------------------------------------------------------
// Help overlay
// ---------------------------------------------------------------------------

/// Shortcut entries: (key_text, description)
const HELP_SHORTCUTS: &[(&str, &str)] = &[
    ("Ctrl+F", "Focus the filter bar"),
    ("Tab", "Switch between filter and editor"),
    ("Enter", "Next match (in the filter bar)"),
    ("F3 / Ctrl+N", "Next match"),
    ("Shift+F3 / Ctrl+P", "Previous match"),
    ("Esc", "Clear the filter"),
    ("Ctrl+S", "Save"),
    ("Ctrl+O", "Recent files"),
    ("Ctrl+E", "New document"),
    ("Ctrl+Z / Ctrl+Y", "Undo / redo"),
    ("Ctrl+W", "Toggle word wrap"),
    ("F1", "Show this help"),
    ("Ctrl+Q / Ctrl+C", "Quit"),
];

/// Draw the help overlay modal showing all keyboard shortcuts.
///
/// Any key press dismisses the overlay (handled in `App::on_key()`).
fn draw_help_overlay(frame: &mut Frame, app: &App, area: Rect) {
    let theme = &app.theme_colors;

    // Bail out if the terminal is too small to render anything.
    if area.width < 5 || area.height < 5 {
        return;
    }

    // title + blank + shortcuts + blank + footer, plus borders
    let height = HELP_SHORTCUTS.len() as u16 + 6;
    let overlay_area = centered_rect(area, 56, height);

    frame.render_widget(Clear, overlay_area);

    let block = Block::default()
        .title(" Help ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme.border_focused));

    let inner = block.inner(overlay_area);
    frame.render_widget(block, overlay_area);

    if inner.width == 0 || inner.height == 0 {
        return;
    }

    let mut lines: Vec<Line> = Vec::new();

    lines.push(Line::from(Span::styled(
        " Keyboard Shortcuts",
        Style::default()
            .fg(theme.overlay_fg)
            .add_modifier(Modifier::BOLD),
    )));
    lines.push(Line::from(""));

    for (key, desc) in HELP_SHORTCUTS {
        lines.push(Line::from(vec![
            Span::styled(
                format!("  {:20}", key),
                Style::default()
                    .fg(theme.overlay_shortcut_key)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::styled(desc.to_string(), Style::default().fg(theme.overlay_fg)),
        ]));
    }

    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        " Press any key to close",
        Style::default()
            .fg(theme.overlay_fg)
            .add_modifier(Modifier::DIM),
    )));

    let paragraph = Paragraph::new(lines)
        .style(Style::default().bg(theme.overlay_bg).fg(theme.overlay_fg))
        .wrap(Wrap { trim: false });

    frame.render_widget(paragraph, inner);
}

// ---------------------------------------------------------------------------
// Save prompts
// ---------------------------------------------------------------------------

/// Ask whether to save before `action` discards the document.
fn draw_save_confirmation(frame: &mut Frame, app: &App, action: &PendingAction, area: Rect) {
    let theme = &app.theme_colors;
    let overlay_area = centered_rect(area, 50, 7);

    frame.render_widget(Clear, overlay_area);

    let title = match action {
        PendingAction::Quit => " Quit? ",
        PendingAction::Open(_) => " Open File? ",
        PendingAction::NewFile => " New Document? ",
    };
    let block = Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme.status_modified));

    let inner = block.inner(overlay_area);
    frame.render_widget(block, overlay_area);

    if inner.width == 0 || inner.height == 0 {
        return;
    }

    let key_style = Style::default()
        .fg(theme.overlay_shortcut_key)
        .add_modifier(Modifier::BOLD);
    let lines = vec![
        Line::from(format!("Save changes to {}?", app.document_title())),
        Line::from(""),
        Line::from(vec![
            Span::styled("y", key_style),
            Span::raw(":save  "),
            Span::styled("n", key_style),
            Span::raw(":discard  "),
            Span::styled("Esc", key_style),
            Span::raw(":cancel"),
        ]),
    ];

    let paragraph = Paragraph::new(lines)
        .style(Style::default().bg(theme.overlay_bg).fg(theme.overlay_fg))
        .wrap(Wrap { trim: false });

    frame.render_widget(paragraph, inner);
}

/// File-name input for saving an unnamed document.
fn draw_save_as_prompt(frame: &mut Frame, app: &App, area: Rect) {
    let Some(ref prompt) = app.save_as else {
        return;
    };
    let theme = &app.theme_colors;
    let overlay_area = centered_rect(area, 60, 5);

    frame.render_widget(Clear, overlay_area);

    let block = Block::default()
        .title(" Save As ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme.border_focused));

    let inner = block.inner(overlay_area);
    frame.render_widget(block, overlay_area);

    if inner.width == 0 || inner.height == 0 {
        return;
    }

    const LABEL: &str = "File name: ";
    let lines = vec![
        Line::from(vec![
            Span::styled(
                LABEL,
                Style::default()
                    .fg(theme.filter_prompt)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::styled(
                prompt.input.clone(),
                Style::default().fg(theme.filter_input_fg),
            ),
        ]),
        Line::from(Span::styled(
            "Enter:save  Esc:cancel",
            Style::default()
                .fg(theme.overlay_fg)
                .add_modifier(Modifier::DIM),
        )),
    ];

    let paragraph =
        Paragraph::new(lines).style(Style::default().bg(theme.overlay_bg).fg(theme.overlay_fg));
    frame.render_widget(paragraph, inner);

    let offset = (LABEL.len() + prompt.input.chars().count()) as u16;
    frame.set_cursor_position((inner.x + offset.min(inner.width - 1), inner.y));
}

// ---------------------------------------------------------------------------
// Status bar
// ---------------------------------------------------------------------------

/// Separator string used between status bar segments.
const SEPARATOR: &str = " | ";
/// Width of the separator in characters.
const SEPARATOR_WIDTH: usize = 3;

/// Shortcut hints as (key, label) pairs.
const STATUS_SHORTCUTS: &[(&str, &str)] = &[
    ("^F", "filter"),
    ("F3", "next"),
    ("^S", "save"),
    ("^O", "recent"),
    ("^Q", "quit"),
    ("F1", "help"),
];

/// Text of the shortcuts segment, e.g. `" ^F:filter F3:next ... F1:help"`.
fn shortcuts_text() -> String {
    STATUS_SHORTCUTS
        .iter()
        .map(|(k, l)| format!(" {}:{}", k, l))
        .collect()
}

/// Cursor position segment: `"Ln 3, Col 7"`.
fn position_text(app: &App) -> String {
    let (row, col) = app.session.buffer().cursor_position();
    let line = gutter_label(app, row).unwrap_or(row + 1);
    format!("Ln {}, Col {}", line, col + 1)
}

/// Append a segment with its separator if it fits in the remaining width.
fn push_segment(
    spans: &mut Vec<Span<'static>>,
    used: &mut usize,
    width: usize,
    segment: Span<'static>,
    separator_style: Style,
) -> bool {
    let w = segment.content.chars().count();
    let sep_cost = if *used > 0 { SEPARATOR_WIDTH } else { 1 };
    if *used + sep_cost + w > width {
        return false;
    }
    if *used > 0 {
        spans.push(Span::styled(SEPARATOR.to_string(), separator_style));
    } else {
        spans.push(Span::raw(" ".to_string()));
    }
    spans.push(segment);
    *used += sep_cost + w;
    true
}

/// Compute the status bar layout and return the composed `Line`.
///
/// Segments in priority order; lower-priority segments are dropped first
/// when the terminal is narrow:
/// 1. Transient status message
/// 2. Stale badge (edits not yet folded into the filtered document)
/// 3. Modified marker
/// 4. Match counter
/// 5. Cursor position
/// 6. Keyboard shortcuts
fn build_status_bar_line(app: &App, width: usize) -> Line<'static> {
    if width == 0 {
        return Line::from(vec![]);
    }

    let theme = &app.theme_colors;
    let sep = Style::default().fg(theme.status_separator);
    let mut spans: Vec<Span<'static>> = Vec::new();
    let mut used: usize = 0;

    if let Some(ref msg) = app.status_message {
        push_segment(
            &mut spans,
            &mut used,
            width,
            Span::styled(
                msg.clone(),
                Style::default()
                    .fg(theme.status_message)
                    .add_modifier(Modifier::BOLD),
            ),
            sep,
        );
    }

    if app.session.state() == SessionState::Stale {
        push_segment(
            &mut spans,
            &mut used,
            width,
            Span::styled(
                " EDITED ".to_string(),
                Style::default()
                    .fg(theme.status_stale_fg)
                    .bg(theme.status_stale_bg)
                    .add_modifier(Modifier::BOLD),
            ),
            sep,
        );
    }

    if app.session.is_modified() {
        push_segment(
            &mut spans,
            &mut used,
            width,
            Span::styled(
                "modified".to_string(),
                Style::default()
                    .fg(theme.status_modified)
                    .add_modifier(Modifier::BOLD),
            ),
            sep,
        );
    }

    if let Some(counter) = app.session.match_counter_display() {
        push_segment(
            &mut spans,
            &mut used,
            width,
            Span::styled(
                counter,
                Style::default()
                    .fg(theme.status_counter)
                    .add_modifier(Modifier::BOLD),
            ),
            sep,
        );
    }

    push_segment(
        &mut spans,
        &mut used,
        width,
        Span::styled(position_text(app), Style::default().fg(theme.status_bar_fg)),
        sep,
    );

    // Shortcuts are all-or-nothing, rendered with styled keys.
    let sc_width = shortcuts_text().len();
    let sep_cost = if used > 0 { SEPARATOR_WIDTH } else { 0 };
    if used + sep_cost + sc_width <= width {
        if used > 0 {
            spans.push(Span::styled(SEPARATOR.to_string(), sep));
        }
        for (key, label) in STATUS_SHORTCUTS {
            spans.push(Span::styled(
                format!(" {}", key),
                Style::default()
                    .fg(theme.status_shortcut_key)
                    .add_modifier(Modifier::BOLD),
            ));
            spans.push(Span::raw(format!(":{}", label)));
        }
    }

    Line::from(spans)
}

/// Draw the status bar at the bottom of the screen.
fn draw_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    let theme = &app.theme_colors;
    let width = area.width as usize;
    let bar = build_status_bar_line(app, width);

    let paragraph = Paragraph::new(bar)
        .style(Style::default().bg(theme.status_bar_bg).fg(theme.status_bar_fg));

    frame.render_widget(paragraph, area);
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
