//! Theme support for the TUI.
//!
//! Provides a [`ThemeColors`] struct containing all color definitions used
//! throughout the TUI. Two constructors are provided: [`ThemeColors::dark()`]
//! and [`ThemeColors::light()`] (adjusted for readability on light
//! backgrounds).
//!
//! All colors use the 16 basic ANSI palette for maximum terminal compatibility.

use ratatui::style::Color;

use crate::cli::Theme;

// ---------------------------------------------------------------------------
// ThemeColors
// ---------------------------------------------------------------------------

/// All color definitions for the TUI, grouped by component.
#[derive(Debug, Clone, PartialEq)]
pub struct ThemeColors {
    // -- Borders -----------------------------------------------------------
    /// Border color when the panel has keyboard focus.
    pub border_focused: Color,
    /// Border color when the panel does not have focus.
    pub border_unfocused: Color,

    // -- Editor ------------------------------------------------------------
    /// Document text foreground.
    pub editor_text: Color,
    /// Placeholder shown for an empty, unnamed document.
    pub editor_placeholder: Color,
    /// Line-number gutter foreground.
    pub gutter_fg: Color,
    /// Gutter foreground for the row holding the cursor.
    pub gutter_current_fg: Color,

    // -- Filter highlights -------------------------------------------------
    /// Term match highlight background.
    pub match_bg: Color,
    /// Term match highlight foreground.
    pub match_fg: Color,
    /// Background of the whole current (emphasised) line.
    pub current_line_bg: Color,
    /// Term match background on the current line.
    pub current_match_bg: Color,
    /// Term match foreground on the current line.
    pub current_match_fg: Color,

    // -- Filter bar --------------------------------------------------------
    /// Filter input text foreground.
    pub filter_input_fg: Color,
    /// Filter prompt foreground.
    pub filter_prompt: Color,
    /// Filter text that is still below the length threshold.
    pub filter_inactive: Color,

    // -- Status bar --------------------------------------------------------
    /// Status bar background.
    pub status_bar_bg: Color,
    /// Status bar default foreground.
    pub status_bar_fg: Color,
    /// Unsaved-changes badge foreground.
    pub status_modified: Color,
    /// Badge shown while displayed edits are not yet reconciled.
    pub status_stale_fg: Color,
    /// Background of the stale badge.
    pub status_stale_bg: Color,
    /// Match counter foreground.
    pub status_counter: Color,
    /// Separator foreground.
    pub status_separator: Color,
    /// Shortcut key foreground.
    pub status_shortcut_key: Color,
    /// Transient message foreground (save result, errors).
    pub status_message: Color,

    // -- Overlays ----------------------------------------------------------
    /// Selected item foreground.
    pub overlay_selected_fg: Color,
    /// Selected item background.
    pub overlay_selected_bg: Color,
    /// Unselected item foreground.
    pub overlay_unselected: Color,
    /// Overlay background.
    pub overlay_bg: Color,
    /// Overlay default foreground.
    pub overlay_fg: Color,
    /// Footer shortcut key foreground.
    pub overlay_shortcut_key: Color,
}

impl ThemeColors {
    /// Construct the theme colors from the CLI/config theme enum.
    pub fn from_theme(theme: &Theme) -> Self {
        match theme {
            Theme::Dark => Self::dark(),
            Theme::Light => Self::light(),
        }
    }

    /// Dark theme. This is the default.
    pub fn dark() -> Self {
        Self {
            // Borders
            border_focused: Color::Cyan,
            border_unfocused: Color::DarkGray,

            // Editor
            editor_text: Color::White,
            editor_placeholder: Color::DarkGray,
            gutter_fg: Color::DarkGray,
            gutter_current_fg: Color::Yellow,

            // Filter highlights
            match_bg: Color::Yellow,
            match_fg: Color::Black,
            current_line_bg: Color::DarkGray,
            current_match_bg: Color::Green,
            current_match_fg: Color::Black,

            // Filter bar
            filter_input_fg: Color::White,
            filter_prompt: Color::Yellow,
            filter_inactive: Color::DarkGray,

            // Status bar
            status_bar_bg: Color::DarkGray,
            status_bar_fg: Color::White,
            status_modified: Color::LightRed,
            status_stale_fg: Color::White,
            status_stale_bg: Color::Red,
            status_counter: Color::Magenta,
            status_separator: Color::DarkGray,
            status_shortcut_key: Color::Yellow,
            status_message: Color::LightGreen,

            // Overlays
            overlay_selected_fg: Color::White,
            overlay_selected_bg: Color::DarkGray,
            overlay_unselected: Color::Gray,
            overlay_bg: Color::Black,
            overlay_fg: Color::White,
            overlay_shortcut_key: Color::Yellow,
        }
    }

    /// Light theme -- adjusted colors for readability on light terminal
    /// backgrounds. Uses the 16 basic ANSI colors.
    pub fn light() -> Self {
        Self {
            // Borders
            border_focused: Color::Blue,
            border_unfocused: Color::Gray,

            // Editor
            editor_text: Color::Black,
            editor_placeholder: Color::Gray,
            gutter_fg: Color::Gray,
            gutter_current_fg: Color::Blue,

            // Filter highlights
            match_bg: Color::Yellow,
            match_fg: Color::Black,
            current_line_bg: Color::Gray,
            current_match_bg: Color::Green,
            current_match_fg: Color::Black,

            // Filter bar
            filter_input_fg: Color::Black,
            filter_prompt: Color::Blue,
            filter_inactive: Color::Gray,

            // Status bar
            status_bar_bg: Color::Gray,
            status_bar_fg: Color::Black,
            status_modified: Color::Red,
            status_stale_fg: Color::White,
            status_stale_bg: Color::Red,
            status_counter: Color::Magenta,
            status_separator: Color::DarkGray,
            status_shortcut_key: Color::Blue,
            status_message: Color::Green,

            // Overlays
            overlay_selected_fg: Color::White,
            overlay_selected_bg: Color::Blue,
            overlay_unselected: Color::DarkGray,
            overlay_bg: Color::White,
            overlay_fg: Color::Black,
            overlay_shortcut_key: Color::Blue,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
