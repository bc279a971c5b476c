//! Application state for the TUI.
//!
//! The [`App`] struct owns all mutable state that drives the TUI: the
//! document session, the filter input, focus tracking, overlays, the file
//! being edited and the quit flag.

use std::path::{Path, PathBuf};

use chrono::Local;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseEvent, MouseEventKind};

use crate::buffer::TextBuffer;
use crate::config::AppConfig;
use crate::engine::line_spans;
use crate::recent::RecentFiles;
use crate::session::DocumentSession;
use crate::storage::{FileStorage, Storage};
use crate::theme::ThemeColors;
use crate::tui::recent_overlay::{MenuAction, RecentMenuState};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Ticks a status message stays visible (about 2s at the 100ms tick rate).
pub const STATUS_MESSAGE_TICKS: u16 = 20;

/// Rows moved per mouse wheel step.
const MOUSE_SCROLL_ROWS: usize = 3;

// ---------------------------------------------------------------------------
// Focus / pending actions
// ---------------------------------------------------------------------------

/// Which widget currently has keyboard focus.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    Editor,
    Filter,
}

/// An action that discards the current document and therefore waits for
/// the save prompt when there are unsaved changes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PendingAction {
    Quit,
    Open(PathBuf),
    NewFile,
}

/// File-name prompt shown when saving a document that has no path yet.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SaveAsPrompt {
    pub input: String,
    /// Action to run once the save succeeds.
    pub then: Option<PendingAction>,
}

// ---------------------------------------------------------------------------
// App struct
// ---------------------------------------------------------------------------

/// Root application state.
///
/// Single-owner, never shared across threads. The event loop owns the
/// `App` and passes a `&mut` reference to key handlers and the draw
/// function.
pub struct App {
    /// Which widget has keyboard focus.
    pub focus: Focus,
    /// Set to `true` to exit the event loop.
    pub should_quit: bool,
    /// Set whenever state changed and the next loop iteration must draw.
    pub needs_redraw: bool,
    /// Effective application configuration.
    pub config: AppConfig,
    /// Resolved theme colors derived from `config.theme`.
    pub theme_colors: ThemeColors,
    /// The document, its buffer and the filter state.
    pub session: DocumentSession,
    /// Contents of the filter bar.
    pub filter_input: String,
    /// File the document is saved to; `None` for an unnamed document.
    pub file_path: Option<PathBuf>,
    storage: Box<dyn Storage>,
    /// Most recently opened files.
    pub recent: RecentFiles,
    /// State for the recent-files menu (opened with `Ctrl+O`).
    pub recent_menu: RecentMenuState,
    /// Transient status message shown in the status bar.
    /// Cleared after [`STATUS_MESSAGE_TICKS`] ticks or on the next key press.
    pub status_message: Option<String>,
    status_ticks: u16,
    /// Action waiting for the "save changes?" answer.
    pub pending_action: Option<PendingAction>,
    /// Active file-name prompt, if any.
    pub save_as: Option<SaveAsPrompt>,
    /// Whether the help overlay is currently visible.
    pub help_overlay_visible: bool,
    /// First buffer row shown in the editor.
    pub scroll_offset: usize,
    /// First column shown when word wrap is off.
    pub h_scroll: usize,
    /// Editor text area size, updated on every draw.
    pub editor_height: usize,
    pub editor_width: usize,
    /// Scroll to the cursor on the next draw.
    follow_cursor: bool,
    pub word_wrap: bool,
    pub line_numbers: bool,
}

impl App {
    /// Create a new `App` with the given config, backed by the filesystem.
    ///
    /// Starts with an empty, unnamed document and focus on the editor.
    pub fn new(config: AppConfig) -> Self {
        let storage = FileStorage::new(config.verbose);
        Self::with_storage(config, Box::new(storage))
    }

    pub fn with_storage(config: AppConfig, storage: Box<dyn Storage>) -> Self {
        let theme_colors = ThemeColors::from_theme(&config.theme);
        let recent = config
            .recent_path
            .as_deref()
            .map(RecentFiles::load)
            .unwrap_or_default();
        Self {
            focus: Focus::Editor,
            should_quit: false,
            needs_redraw: true,
            session: DocumentSession::new("", config.session_config()),
            filter_input: String::new(),
            file_path: None,
            storage,
            recent,
            recent_menu: RecentMenuState::default(),
            status_message: None,
            status_ticks: 0,
            pending_action: None,
            save_as: None,
            help_overlay_visible: false,
            scroll_offset: 0,
            h_scroll: 0,
            editor_height: 0,
            editor_width: 0,
            follow_cursor: true,
            word_wrap: config.display.word_wrap,
            line_numbers: config.display.line_numbers,
            theme_colors,
            config,
        }
    }

    // -- Key handling --------------------------------------------------------

    /// Handle a key event, dispatching to the appropriate action.
    pub fn on_key(&mut self, key: KeyEvent) {
        self.needs_redraw = true;
        self.follow_cursor = true;
        // Clear transient status messages on any key press.
        self.status_message = None;

        // When the help overlay is visible, ANY key dismisses it.
        if self.help_overlay_visible {
            self.help_overlay_visible = false;
            return;
        }

        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);

        // Ctrl+C cancels whatever modal is open, otherwise quits.
        if ctrl && key.code == KeyCode::Char('c') {
            if self.recent_menu.visible {
                self.recent_menu.close();
            } else if self.save_as.is_some() {
                self.save_as = None;
            } else if self.pending_action.is_some() {
                self.pending_action = None;
            } else {
                self.initiate_quit();
            }
            return;
        }

        if let Some(action) = self.pending_action.take() {
            self.on_confirm_key(key, action);
            return;
        }

        if self.save_as.is_some() {
            self.on_save_as_key(key);
            return;
        }

        // When the recent-files menu is visible, delegate ALL key events to it.
        if self.recent_menu.visible {
            match self.recent_menu.on_key(key) {
                MenuAction::Consumed => {}
                MenuAction::Close => self.recent_menu.close(),
                MenuAction::Open(path) => {
                    self.recent_menu.close();
                    self.request(PendingAction::Open(path));
                }
            }
            return;
        }

        if ctrl {
            match key.code {
                KeyCode::Char('q') => self.initiate_quit(),
                KeyCode::Char('s') => self.save(),
                KeyCode::Char('o') => self.open_recent_menu(),
                KeyCode::Char('f') => self.focus = Focus::Filter,
                KeyCode::Char('n') => self.goto_next(),
                KeyCode::Char('p') => self.goto_previous(),
                KeyCode::Char('z') => self.undo(),
                KeyCode::Char('y') => self.redo(),
                KeyCode::Char('w') => self.toggle_word_wrap(),
                KeyCode::Char('e') => self.request(PendingAction::NewFile),
                _ => {}
            }
            return;
        }

        match key.code {
            KeyCode::F(1) => self.help_overlay_visible = true,
            KeyCode::F(3) if key.modifiers.contains(KeyModifiers::SHIFT) => self.goto_previous(),
            KeyCode::F(3) => self.goto_next(),
            KeyCode::Esc => self.clear_filter(),
            KeyCode::Tab | KeyCode::BackTab => self.toggle_focus(),
            _ => match self.focus {
                Focus::Editor => self.on_editor_key(key),
                Focus::Filter => self.on_filter_key(key),
            },
        }
    }

    fn on_editor_key(&mut self, key: KeyEvent) {
        let page = self.editor_height.max(1);
        match key.code {
            KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::ALT) => {
                self.session.edit(|b| b.insert_char(c));
            }
            KeyCode::Enter => self.session.edit(TextBuffer::insert_newline),
            KeyCode::Backspace => {
                self.session.edit(TextBuffer::backspace);
            }
            KeyCode::Delete => {
                self.session.edit(TextBuffer::delete_forward);
            }
            KeyCode::Left => self.session.edit(TextBuffer::move_left),
            KeyCode::Right => self.session.edit(TextBuffer::move_right),
            KeyCode::Up => self.session.edit(TextBuffer::move_up),
            KeyCode::Down => self.session.edit(TextBuffer::move_down),
            KeyCode::Home => self.session.edit(TextBuffer::move_home),
            KeyCode::End => self.session.edit(TextBuffer::move_end),
            KeyCode::PageUp => self.session.edit(|b| b.page_up(page)),
            KeyCode::PageDown => self.session.edit(|b| b.page_down(page)),
            _ => {}
        }
    }

    fn on_filter_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Enter => self.goto_next(),
            KeyCode::Backspace => {
                if self.filter_input.pop().is_some() {
                    self.filter_changed();
                }
            }
            KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::ALT) => {
                self.filter_input.push(c);
                self.filter_changed();
            }
            KeyCode::Down => self.focus = Focus::Editor,
            _ => {}
        }
    }

    /// Handle the answer to "save changes?".
    fn on_confirm_key(&mut self, key: KeyEvent, action: PendingAction) {
        match key.code {
            KeyCode::Char('y') | KeyCode::Char('Y') => self.save_then(Some(action)),
            KeyCode::Char('n') | KeyCode::Char('N') => self.perform(action),
            KeyCode::Esc => {}
            // Ignore other keys while confirmation is pending.
            _ => self.pending_action = Some(action),
        }
    }

    fn on_save_as_key(&mut self, key: KeyEvent) {
        let Some(prompt) = self.save_as.as_mut() else {
            return;
        };
        match key.code {
            KeyCode::Esc => self.save_as = None,
            KeyCode::Backspace => {
                prompt.input.pop();
            }
            KeyCode::Char(c) => prompt.input.push(c),
            KeyCode::Enter => {
                if prompt.input.trim().is_empty() {
                    return;
                }
                if let Some(prompt) = self.save_as.take() {
                    let path = PathBuf::from(prompt.input.trim());
                    if self.save_to(path) {
                        if let Some(action) = prompt.then {
                            self.perform(action);
                        }
                    }
                }
            }
            _ => {}
        }
    }

    // -- Mouse / paste / tick ------------------------------------------------

    /// Scroll the editor with the mouse wheel without moving the cursor.
    pub fn on_mouse(&mut self, mouse: MouseEvent) {
        match mouse.kind {
            MouseEventKind::ScrollUp => {
                self.scroll_offset = self.scroll_offset.saturating_sub(MOUSE_SCROLL_ROWS);
            }
            MouseEventKind::ScrollDown => {
                let last = self.session.buffer().line_count().saturating_sub(1);
                self.scroll_offset = (self.scroll_offset + MOUSE_SCROLL_ROWS).min(last);
            }
            _ => return,
        }
        self.follow_cursor = false;
        self.needs_redraw = true;
    }

    /// Insert pasted text into the focused widget.
    pub fn on_paste(&mut self, text: String) {
        if self.help_overlay_visible || self.recent_menu.visible || self.pending_action.is_some() {
            return;
        }
        self.needs_redraw = true;
        self.follow_cursor = true;

        if let Some(prompt) = self.save_as.as_mut() {
            prompt.input.push_str(text.trim_end_matches(['\r', '\n']));
            return;
        }

        match self.focus {
            Focus::Filter => {
                // The filter is a single line.
                let flat: String = text
                    .chars()
                    .map(|c| if c == '\r' || c == '\n' { ' ' } else { c })
                    .collect();
                self.filter_input.push_str(&flat);
                self.filter_changed();
            }
            Focus::Editor => self.session.edit(|b| b.insert_str(&text)),
        }
    }

    /// Count down the status message lifetime.
    pub fn on_tick(&mut self) {
        if self.status_ticks > 0 {
            self.status_ticks -= 1;
            if self.status_ticks == 0 && self.status_message.take().is_some() {
                self.needs_redraw = true;
            }
        }
    }

    pub fn set_status(&mut self, message: impl Into<String>) {
        self.status_message = Some(message.into());
        self.status_ticks = STATUS_MESSAGE_TICKS;
        self.needs_redraw = true;
    }

    // -- Focus / display toggles ---------------------------------------------

    /// Toggle focus between the editor and the filter bar.
    pub fn toggle_focus(&mut self) {
        self.focus = match self.focus {
            Focus::Editor => Focus::Filter,
            Focus::Filter => Focus::Editor,
        };
    }

    pub fn toggle_word_wrap(&mut self) {
        self.word_wrap = !self.word_wrap;
        self.h_scroll = 0;
        self.set_status(if self.word_wrap {
            "Word wrap on"
        } else {
            "Word wrap off"
        });
    }

    fn open_recent_menu(&mut self) {
        if self.recent.is_empty() {
            self.set_status("No recent files");
            return;
        }
        self.recent_menu.open(self.recent.files());
    }

    // -- Filtering -----------------------------------------------------------

    fn filter_changed(&mut self) {
        let navigable = self.session.on_filter_text_changed(&self.filter_input);
        if self.session.is_filtering() && !navigable {
            self.set_status("No matching lines");
        }
        self.apply_scroll_request();
    }

    /// Empty the filter bar and restore the document.
    pub fn clear_filter(&mut self) {
        self.filter_input.clear();
        self.session.clear_filter();
        self.apply_scroll_request();
    }

    pub fn goto_next(&mut self) {
        self.navigate(true);
    }

    pub fn goto_previous(&mut self) {
        self.navigate(false);
    }

    fn navigate(&mut self, forward: bool) {
        if !self.session.is_filtering() {
            self.set_status("Type a filter first (Ctrl+F)");
            return;
        }
        let line = if forward {
            self.session.goto_next()
        } else {
            self.session.goto_previous()
        };
        if line.is_none() {
            self.set_status("No matching lines");
        }
        self.apply_scroll_request();
    }

    // -- Undo / redo ---------------------------------------------------------

    fn undo(&mut self) {
        if !self.session.undo() {
            self.set_status("Nothing to undo");
        }
    }

    fn redo(&mut self) {
        if !self.session.redo() {
            self.set_status("Nothing to redo");
        }
    }

    // -- Files ---------------------------------------------------------------

    /// Run `action` now, or ask to save first when the document is modified.
    pub fn request(&mut self, action: PendingAction) {
        if self.session.is_modified() {
            self.pending_action = Some(action);
        } else {
            self.perform(action);
        }
    }

    /// Initiate the quit process.
    ///
    /// With unsaved changes this shows the save prompt instead of quitting
    /// immediately.
    fn initiate_quit(&mut self) {
        self.request(PendingAction::Quit);
    }

    fn perform(&mut self, action: PendingAction) {
        match action {
            PendingAction::Quit => self.should_quit = true,
            PendingAction::Open(path) => {
                self.open_file(path);
            }
            PendingAction::NewFile => self.new_file(),
        }
    }

    /// Save to the current path, asking for a file name if there is none.
    pub fn save(&mut self) {
        self.save_then(None);
    }

    fn save_then(&mut self, then: Option<PendingAction>) {
        match self.file_path.clone() {
            Some(path) => {
                if self.save_to(path) {
                    if let Some(action) = then {
                        self.perform(action);
                    }
                }
            }
            None => {
                self.save_as = Some(SaveAsPrompt {
                    input: String::new(),
                    then,
                });
            }
        }
    }

    /// Write the document to `path`.
    ///
    /// The filter is cleared first so that the real document is written,
    /// never the projection shown while filtering.
    fn save_to(&mut self, path: PathBuf) -> bool {
        self.clear_filter();
        let text = self.session.document_text().into_owned();
        match self.storage.save(&path, &text) {
            Ok(()) => {
                self.session.mark_saved();
                self.set_status(format!(
                    "Saved {} at {}",
                    display_name(&path),
                    Local::now().format("%H:%M:%S")
                ));
                self.remember(&path);
                self.file_path = Some(path);
                true
            }
            Err(e) => {
                self.set_status(format!("Save failed: {}", e));
                false
            }
        }
    }

    /// Load `path` into the editor. Returns `false` (with a status message)
    /// when the file cannot be read.
    pub fn open_file(&mut self, path: PathBuf) -> bool {
        match self.storage.try_load(&path) {
            Ok(text) => {
                self.load_document(text, Some(path.clone()));
                self.remember(&path);
                self.set_status(format!("Opened {}", display_name(&path)));
                true
            }
            Err(e) => {
                if !path.exists() {
                    self.recent.remove(&path);
                    self.persist_recent();
                }
                self.set_status(format!("Cannot open {}: {}", path.display(), e));
                false
            }
        }
    }

    /// Open the file named on the command line. A path that does not exist
    /// yet starts an empty document that will be saved there.
    pub fn open_startup_file(&mut self, path: PathBuf) {
        if path.exists() {
            self.open_file(path);
        } else {
            self.set_status(format!("New file {}", path.display()));
            self.load_document(String::new(), Some(path));
        }
    }

    fn new_file(&mut self) {
        self.load_document(String::new(), None);
        self.set_status("New document");
    }

    /// Replace the document and reset filter, scroll and focus.
    pub fn load_document(&mut self, text: String, path: Option<PathBuf>) {
        self.filter_input.clear();
        self.session.load_text(text);
        self.file_path = path;
        self.focus = Focus::Editor;
        self.scroll_offset = 0;
        self.h_scroll = 0;
        self.apply_scroll_request();
    }

    fn remember(&mut self, path: &Path) {
        let path = std::fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf());
        self.recent.add(path);
        self.persist_recent();
    }

    fn persist_recent(&self) {
        if let Some(ref recent_path) = self.config.recent_path {
            if let Err(e) = self.recent.save(recent_path) {
                if self.config.verbose {
                    eprintln!(
                        "text-filter: failed to save recent files to {}: {}",
                        recent_path.display(),
                        e
                    );
                }
            }
        }
    }

    /// Title shown on the editor border.
    pub fn document_title(&self) -> String {
        self.file_path
            .as_deref()
            .map(display_name)
            .unwrap_or_else(|| "[untitled]".to_string())
    }

    // -- Scrolling -----------------------------------------------------------

    fn apply_scroll_request(&mut self) {
        if let Some(row) = self.session.take_scroll_request() {
            self.center_on(row);
        }
    }

    /// Scroll so that `row` sits in the middle of the editor.
    ///
    /// With word wrap on, the rows above are measured in screen lines.
    pub fn center_on(&mut self, row: usize) {
        let half = self.editor_height / 2;
        if !self.word_wrap {
            self.scroll_offset = row.saturating_sub(half);
            return;
        }

        let text = self.session.buffer().text();
        let spans = line_spans(text);
        let mut top = row.min(spans.len() - 1);
        let mut used = 0;
        while top > 0 {
            let above = wrapped_height(&text[spans[top - 1].content.clone()], self.editor_width);
            if used + above > half {
                break;
            }
            used += above;
            top -= 1;
        }
        self.scroll_offset = top;
    }

    /// Adjust scrolling so the cursor is on screen, if it moved since the
    /// last draw. Called by the renderer after updating the editor size.
    pub fn ensure_cursor_visible(&mut self) {
        let text = self.session.buffer().text();
        let spans = line_spans(text);
        self.scroll_offset = self.scroll_offset.min(spans.len() - 1);

        if !self.follow_cursor {
            return;
        }
        self.follow_cursor = false;

        let (row, col) = self.session.buffer().cursor_position();
        let height = self.editor_height.max(1);
        let width = self.editor_width.max(1);

        if row < self.scroll_offset {
            self.scroll_offset = row;
        } else if row >= self.scroll_offset + height {
            self.scroll_offset = row + 1 - height;
        }

        if self.word_wrap {
            self.h_scroll = 0;
            // Wrapped rows can take several screen lines each.
            let rows_for = |r: usize| wrapped_height(&text[spans[r].content.clone()], width);
            while self.scroll_offset < row {
                let used: usize = (self.scroll_offset..=row).map(rows_for).sum();
                if used <= height {
                    break;
                }
                self.scroll_offset += 1;
            }
        } else if col < self.h_scroll {
            self.h_scroll = col;
        } else if col >= self.h_scroll + width {
            self.h_scroll = col + 1 - width;
        }
    }
}

/// Screen lines `line` takes when wrapped at `width` columns.
fn wrapped_height(line: &str, width: usize) -> usize {
    line.chars().count().max(1).div_ceil(width.max(1))
}

/// File name of `path`, or the whole path when it has none.
fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
