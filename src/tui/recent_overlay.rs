//! Recent-files menu overlay for the TUI.
//!
//! Activated by `Ctrl+O`. Lists the most recently opened files, newest
//! first. Each item carries its own path, so choosing an entry hands the
//! path straight back to the caller.

use std::path::{Path, PathBuf};

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

// ---------------------------------------------------------------------------
// MenuAction
// ---------------------------------------------------------------------------

/// Result of handling a key event in the recent-files menu.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MenuAction {
    /// The menu consumed the event; no further handling needed.
    Consumed,
    /// Close the menu without opening anything.
    Close,
    /// Open the chosen file.
    Open(PathBuf),
}

// ---------------------------------------------------------------------------
// RecentMenuState
// ---------------------------------------------------------------------------

/// State for the recent-files overlay.
#[derive(Debug, Clone, Default)]
pub struct RecentMenuState {
    /// Whether the menu is currently visible.
    pub visible: bool,
    /// Files shown, newest first.
    pub items: Vec<PathBuf>,
    /// Currently highlighted item index.
    pub selected: usize,
}

impl RecentMenuState {
    /// Open the menu listing `files`, with the first entry highlighted.
    pub fn open(&mut self, files: &[PathBuf]) {
        self.visible = true;
        self.items = files.to_vec();
        self.selected = 0;
    }

    pub fn close(&mut self) {
        self.visible = false;
    }

    /// Handle a key event while the menu is visible.
    ///
    /// Digits `1`-`9` pick the matching entry directly and `0` picks the
    /// tenth.
    pub fn on_key(&mut self, key: KeyEvent) -> MenuAction {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            return MenuAction::Close;
        }

        match key.code {
            KeyCode::Esc => MenuAction::Close,
            KeyCode::Up | KeyCode::Char('k') => {
                self.move_up();
                MenuAction::Consumed
            }
            KeyCode::Down | KeyCode::Char('j') => {
                self.move_down();
                MenuAction::Consumed
            }
            KeyCode::Enter => self.choose(self.selected),
            KeyCode::Char(c) if c.is_ascii_digit() => {
                let index = match c {
                    '0' => 9,
                    d => (d as usize) - ('1' as usize),
                };
                self.choose(index)
            }
            _ => MenuAction::Consumed,
        }
    }

    fn move_up(&mut self) {
        if self.selected > 0 {
            self.selected -= 1;
        }
    }

    fn move_down(&mut self) {
        if !self.items.is_empty() && self.selected < self.items.len() - 1 {
            self.selected += 1;
        }
    }

    fn choose(&mut self, index: usize) -> MenuAction {
        match self.items.get(index) {
            Some(path) => MenuAction::Open(path.clone()),
            None => MenuAction::Consumed,
        }
    }

    /// Display label for the item at `index`: `"1  name.txt  (dir)"`.
    pub fn item_label(&self, index: usize) -> String {
        let path = &self.items[index];
        let shortcut = if index < 9 {
            (index + 1).to_string()
        } else if index == 9 {
            "0".to_string()
        } else {
            " ".to_string()
        };
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        match path.parent().filter(|p| !p.as_os_str().is_empty()) {
            Some(dir) => format!("{}  {}  ({})", shortcut, name, display_dir(dir)),
            None => format!("{}  {}", shortcut, name),
        }
    }
}

/// Shorten the home directory prefix to `~`.
fn display_dir(dir: &Path) -> String {
    if let Some(home) = dirs::home_dir() {
        if let Ok(rest) = dir.strip_prefix(&home) {
            return Path::new("~").join(rest).display().to_string();
        }
    }
    dir.display().to_string()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    // -- Helpers ----------------------------------------------------------

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn char_key(c: char) -> KeyEvent {
        KeyEvent::new(KeyCode::Char(c), KeyModifiers::NONE)
    }

    fn opened(names: &[&str]) -> RecentMenuState {
        let files: Vec<PathBuf> = names.iter().map(PathBuf::from).collect();
        let mut menu = RecentMenuState::default();
        menu.open(&files);
        menu
    }

    // -- Open / navigate --------------------------------------------------

    #[test]
    fn test_default_state_not_visible() {
        let menu = RecentMenuState::default();
        assert!(!menu.visible);
        assert!(menu.items.is_empty());
        assert_eq!(menu.selected, 0);
    }

    #[test]
    fn test_open_sets_items_and_resets_selection() {
        let mut menu = opened(&["/a/one.txt", "/b/two.txt"]);
        menu.selected = 1;
        menu.open(&[PathBuf::from("/c/three.txt")]);
        assert!(menu.visible);
        assert_eq!(menu.items.len(), 1);
        assert_eq!(menu.selected, 0);
    }

    #[test]
    fn test_move_down_and_up_clamp() {
        let mut menu = opened(&["/a", "/b", "/c"]);
        for _ in 0..5 {
            menu.on_key(key(KeyCode::Down));
        }
        assert_eq!(menu.selected, 2);
        menu.on_key(char_key('k'));
        assert_eq!(menu.selected, 1);
        for _ in 0..5 {
            menu.on_key(key(KeyCode::Up));
        }
        assert_eq!(menu.selected, 0);
    }

    #[test]
    fn test_move_down_empty_items_noop() {
        let mut menu = opened(&[]);
        menu.on_key(char_key('j'));
        assert_eq!(menu.selected, 0);
    }

    // -- Actions ----------------------------------------------------------

    #[test]
    fn test_enter_opens_selected_path() {
        let mut menu = opened(&["/a/one.txt", "/b/two.txt"]);
        menu.on_key(key(KeyCode::Down));
        assert_eq!(
            menu.on_key(key(KeyCode::Enter)),
            MenuAction::Open(PathBuf::from("/b/two.txt"))
        );
    }

    #[test]
    fn test_digit_opens_directly() {
        let mut menu = opened(&["/a/one.txt", "/b/two.txt"]);
        assert_eq!(
            menu.on_key(char_key('2')),
            MenuAction::Open(PathBuf::from("/b/two.txt"))
        );
        assert_eq!(menu.on_key(char_key('5')), MenuAction::Consumed);
    }

    #[test]
    fn test_enter_on_empty_list_is_consumed() {
        let mut menu = opened(&[]);
        assert_eq!(menu.on_key(key(KeyCode::Enter)), MenuAction::Consumed);
    }

    #[test]
    fn test_esc_and_ctrl_c_close() {
        let mut menu = opened(&["/a"]);
        assert_eq!(menu.on_key(key(KeyCode::Esc)), MenuAction::Close);
        assert_eq!(
            menu.on_key(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL)),
            MenuAction::Close
        );
    }

    #[test]
    fn test_unknown_key_consumed() {
        let mut menu = opened(&["/a"]);
        assert_eq!(menu.on_key(char_key('x')), MenuAction::Consumed);
    }

    // -- Labels -----------------------------------------------------------

    #[test]
    fn test_item_label_includes_shortcut_name_and_dir() {
        let menu = opened(&["/srv/notes/todo.txt"]);
        assert_eq!(menu.item_label(0), "1  todo.txt  (/srv/notes)");
    }

    #[test]
    fn test_item_label_tenth_uses_zero() {
        let names: Vec<String> = (0..10).map(|i| format!("f{}.txt", i)).collect();
        let refs: Vec<&str> = names.iter().map(String::as_str).collect();
        let menu = opened(&refs);
        assert!(menu.item_label(9).starts_with("0  f9.txt"));
        assert_eq!(menu.item_label(0), "1  f0.txt");
    }
}
