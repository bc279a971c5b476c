use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::cli::{Cli, Theme};
use crate::session::SessionConfig;

// ---------------------------------------------------------------------------
// TOML-deserializable config (intermediate representation)
// ---------------------------------------------------------------------------

/// Raw config as parsed from the TOML file.
/// All fields are optional so that missing keys fall through to defaults.
/// Unknown keys are silently ignored by serde.
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct FileConfig {
    verbose: Option<bool>,
    theme: Option<String>,
    filter: FileFilterConfig,
    display: FileDisplayConfig,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct FileFilterConfig {
    threshold: Option<usize>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct FileDisplayConfig {
    word_wrap: Option<bool>,
    line_numbers: Option<bool>,
}

// ---------------------------------------------------------------------------
// Effective (merged) config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    /// Document to open at startup.
    pub file: Option<PathBuf>,
    pub verbose: bool,
    pub theme: Theme,
    pub filter: FilterConfig,
    pub display: DisplayConfig,
    /// Where the recent-files list is kept; `None` disables persistence.
    pub recent_path: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FilterConfig {
    /// Minimum filter length (in characters) before filtering starts.
    pub threshold: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DisplayConfig {
    pub word_wrap: bool,
    pub line_numbers: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            file: None,
            verbose: false,
            theme: Theme::Dark,
            filter: FilterConfig::default(),
            display: DisplayConfig::default(),
            recent_path: None,
        }
    }
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self { threshold: 1 }
    }
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            word_wrap: false,
            line_numbers: true,
        }
    }
}

impl AppConfig {
    /// Settings handed to the document session.
    pub fn session_config(&self) -> SessionConfig {
        SessionConfig {
            min_filter_len: self.filter.threshold,
        }
    }
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Returns the default config file path: `~/.config/text-filter/config.toml`
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("text-filter").join("config.toml"))
}

/// Path of the recent-files list kept next to `config_path`.
fn recent_path_for(config_path: &Path) -> Option<PathBuf> {
    config_path.parent().map(|dir| dir.join("recent.toml"))
}

/// Load the config file from the given path (or the default path).
/// Returns the parsed `FileConfig`, or `None` if the file does not exist
/// or cannot be parsed.
fn load_file_config(path: &Path) -> Option<FileConfig> {
    if !path.exists() {
        return None;
    }

    match std::fs::read_to_string(path) {
        Ok(contents) => match toml::from_str::<FileConfig>(&contents) {
            Ok(cfg) => Some(cfg),
            Err(e) => {
                eprintln!(
                    "text-filter: warning: failed to parse config file {}: {}",
                    path.display(),
                    e
                );
                None
            }
        },
        Err(e) => {
            eprintln!(
                "text-filter: warning: failed to read config file {}: {}",
                path.display(),
                e
            );
            None
        }
    }
}

/// Parse a theme string from the config file into a `Theme` enum.
/// Returns `None` if the string is not recognized (caller uses default).
fn parse_theme(s: &str) -> Option<Theme> {
    match s.to_lowercase().as_str() {
        "dark" => Some(Theme::Dark),
        "light" => Some(Theme::Light),
        other => {
            eprintln!(
                "text-filter: warning: unknown theme \"{}\", using default",
                other
            );
            None
        }
    }
}

/// Build the effective `AppConfig` by merging defaults, config file, and CLI args.
///
/// Precedence (highest wins):
/// 1. CLI flags (if explicitly provided)
/// 2. Config file values
/// 3. Hardcoded defaults
pub fn build_config(cli: &Cli) -> AppConfig {
    let mut config = AppConfig::default();

    let config_path = cli.config.clone().or_else(default_config_path);

    if let Some(ref path) = config_path {
        config.recent_path = recent_path_for(path);

        if let Some(file_cfg) = load_file_config(path) {
            if let Some(v) = file_cfg.verbose {
                config.verbose = v;
            }
            if let Some(ref t) = file_cfg.theme {
                if let Some(theme) = parse_theme(t) {
                    config.theme = theme;
                }
            }
            if let Some(threshold) = file_cfg.filter.threshold {
                config.filter.threshold = threshold;
            }
            if let Some(wrap) = file_cfg.display.word_wrap {
                config.display.word_wrap = wrap;
            }
            if let Some(numbers) = file_cfg.display.line_numbers {
                config.display.line_numbers = numbers;
            }
        } else if cli.config.is_some() && !path.exists() {
            // Malformed files were already reported by load_file_config.
            eprintln!(
                "text-filter: warning: config file not found: {}",
                path.display()
            );
        }
    }

    // CLI overrides
    if cli.file.is_some() {
        config.file = cli.file.clone();
    }
    if cli.verbose {
        config.verbose = true;
    }
    if let Some(ref theme) = cli.theme {
        config.theme = theme.clone();
    }
    if let Some(threshold) = cli.threshold {
        config.filter.threshold = threshold;
    }
    if cli.wrap {
        config.display.word_wrap = true;
    }

    config
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
