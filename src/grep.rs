//! Headless filter mode: print the matching lines of a file and exit.
//!
//! `text-filter grep --file notes.txt --filter "ore psu"` runs the same
//! ordered multi-term filter as the editor and prints each matching line
//! with its 1-based line number. TTY detection controls formatting: ANSI
//! highlights for interactive terminals, plain text for piped output.
//!
//! This module is independent of the TUI (no ratatui imports).

use std::io::{self, IsTerminal, Write};

use crate::cli::{GrepArgs, Theme};
use crate::engine::{FilterEngine, FilteredLine};
use crate::projector::split_highlights;
use crate::storage::{FileStorage, Storage};

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Runtime configuration for grep mode.
struct GrepConfig {
    /// Prefix each line with its line number.
    line_numbers: bool,
    /// Width the line-number column is padded to.
    number_width: usize,
    /// ANSI color codes (empty strings when piping).
    colors: AnsiColors,
}

// ---------------------------------------------------------------------------
// ANSI color helpers
// ---------------------------------------------------------------------------

/// ANSI escape codes for terminal coloring.
///
/// When stdout is not a TTY (piped), all fields are empty strings so that
/// no escape sequences leak into downstream consumers.
struct AnsiColors {
    /// Line-number color.
    line_number: &'static str,
    /// Highlight for matched term spans.
    matched: &'static str,
    /// Reset all attributes.
    reset: &'static str,
}

impl AnsiColors {
    /// Build color codes for an interactive TTY.
    fn for_tty(theme: &Theme) -> Self {
        match theme {
            Theme::Dark => Self {
                line_number: "\x1b[90m",   // bright black (gray)
                matched: "\x1b[30;43m",    // black on yellow
                reset: "\x1b[0m",
            },
            Theme::Light => Self {
                line_number: "\x1b[34m",   // blue
                matched: "\x1b[30;103m",   // black on bright yellow
                reset: "\x1b[0m",
            },
        }
    }

    /// No-op color codes for piped (non-TTY) output.
    fn for_pipe() -> Self {
        Self {
            line_number: "",
            matched: "",
            reset: "",
        }
    }
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

/// Run grep mode against stdout.
///
/// Returns `Ok(true)` if at least one line matched.
pub fn run_grep(args: &GrepArgs, verbose: bool) -> Result<bool, Box<dyn std::error::Error>> {
    let is_tty = io::stdout().is_terminal();
    let theme = args.theme.clone().unwrap_or(Theme::Dark);
    let colors = if is_tty {
        AnsiColors::for_tty(&theme)
    } else {
        AnsiColors::for_pipe()
    };

    let text = FileStorage::new(verbose).try_load(&args.file)?;
    let mut engine = FilterEngine::new(text);
    engine.apply(&args.filter);

    if verbose {
        eprintln!(
            "text-filter: grep: {} of {} lines match {:?}",
            engine.len(),
            engine.lines().len(),
            args.filter
        );
    }

    let config = GrepConfig {
        line_numbers: !args.no_line_numbers,
        number_width: engine.lines().len().to_string().len(),
        colors,
    };

    let stdout = io::stdout();
    let mut out = stdout.lock();
    match print_results(&mut out, &engine, &config) {
        Ok(()) => {}
        // Downstream closed the pipe (e.g. `| head`); not an error.
        Err(e) if e.kind() == io::ErrorKind::BrokenPipe => {}
        Err(e) => return Err(e.into()),
    }

    Ok(!engine.is_empty())
}

// ---------------------------------------------------------------------------
// Formatting
// ---------------------------------------------------------------------------

fn print_results<W: Write>(out: &mut W, engine: &FilterEngine, config: &GrepConfig) -> io::Result<()> {
    for line in engine.results() {
        print_line(out, line, config)?;
    }
    out.flush()
}

/// Print a single matching line to the given writer.
fn print_line<W: Write>(out: &mut W, line: &FilteredLine, config: &GrepConfig) -> io::Result<()> {
    let colors = &config.colors;
    if config.line_numbers {
        write!(
            out,
            "{}{:>width$}:{} ",
            colors.line_number,
            line.index + 1,
            colors.reset,
            width = config.number_width,
        )?;
    }
    for (piece, hit) in split_highlights(&line.text, &line.spans) {
        if hit {
            write!(out, "{}{}{}", colors.matched, piece, colors.reset)?;
        } else {
            write!(out, "{}", piece)?;
        }
    }
    writeln!(out)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn make_config_pipe(line_numbers: bool) -> GrepConfig {
        GrepConfig {
            line_numbers,
            number_width: 2,
            colors: AnsiColors::for_pipe(),
        }
    }

    fn render(doc: &str, filter: &str, config: &GrepConfig) -> String {
        let mut engine = FilterEngine::new(doc);
        engine.apply(filter);
        let mut buf = Vec::new();
        print_results(&mut buf, &engine, config).unwrap();
        String::from_utf8(buf).unwrap()
    }

    // -- print_results tests --------------------------------------------------

    #[test]
    fn test_print_pipe_with_line_numbers() {
        let output = render(
            "Lorem ipsum\ndolor sit\namet lorem",
            "ore",
            &make_config_pipe(true),
        );
        assert_eq!(output, " 1: Lorem ipsum\n 3: amet lorem\n");
    }

    #[test]
    fn test_print_pipe_without_line_numbers() {
        let output = render("Lorem Ipsum\nother", "ore psu", &make_config_pipe(false));
        assert_eq!(output, "Lorem Ipsum\n");
    }

    #[test]
    fn test_print_no_matches_is_empty() {
        let output = render("a\nb", "zzz", &make_config_pipe(true));
        assert!(output.is_empty());
    }

    #[test]
    fn test_print_tty_highlights_spans() {
        let config = GrepConfig {
            line_numbers: false,
            number_width: 1,
            colors: AnsiColors::for_tty(&Theme::Dark),
        };
        let output = render("Lorem Ipsum", "ore psu", &config);
        assert_eq!(
            output,
            "L\x1b[30;43more\x1b[0mm I\x1b[30;43mpsu\x1b[0mm\n"
        );
    }

    // -- AnsiColors tests -----------------------------------------------------

    #[test]
    fn test_ansi_colors_pipe_all_empty() {
        let colors = AnsiColors::for_pipe();
        assert!(colors.line_number.is_empty());
        assert!(colors.matched.is_empty());
        assert!(colors.reset.is_empty());
    }

    #[test]
    fn test_ansi_colors_tty_have_escapes() {
        for theme in [Theme::Dark, Theme::Light] {
            let colors = AnsiColors::for_tty(&theme);
            assert!(colors.line_number.contains("\x1b["));
            assert!(colors.matched.contains("\x1b["));
            assert!(colors.reset.contains("\x1b["));
        }
    }

    // -- run_grep -------------------------------------------------------------

    #[test]
    fn test_run_grep_reports_match_status() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("doc.txt");
        std::fs::write(&path, "alpha\nbeta\n").unwrap();

        let args = |filter: &str| GrepArgs {
            file: path.clone(),
            filter: filter.to_string(),
            theme: None,
            no_line_numbers: false,
        };
        assert!(run_grep(&args("alp"), false).unwrap());
        assert!(!run_grep(&args("gamma"), false).unwrap());
    }

    #[test]
    fn test_run_grep_missing_file_is_error() {
        let tmp = tempfile::TempDir::new().unwrap();
        let args = GrepArgs {
            file: tmp.path().join("missing.txt"),
            filter: "x".to_string(),
            theme: None,
            no_line_numbers: false,
        };
        assert!(run_grep(&args, false).is_err());
    }
}
