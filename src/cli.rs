use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Plain-text editor with an incremental ordered multi-term line filter
#[derive(Parser, Debug)]
#[command(
    name = "text-filter",
    about = "Plain-text editor with an incremental ordered multi-term line filter"
)]
pub struct Cli {
    /// File to open. Starts with an empty, unnamed document when omitted.
    pub file: Option<PathBuf>,

    /// Write diagnostics to stderr.
    #[arg(long, default_value_t = false)]
    pub verbose: bool,

    /// Color theme: dark or light
    #[arg(long, value_enum)]
    pub theme: Option<Theme>,

    /// Path to config file
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Minimum filter length (in characters) before filtering starts
    #[arg(long)]
    pub threshold: Option<usize>,

    /// Start with word wrap enabled
    #[arg(long, default_value_t = false)]
    pub wrap: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print the lines of a file that match a filter, then exit
    Grep(GrepArgs),
}

#[derive(Args, Debug)]
pub struct GrepArgs {
    /// File to filter
    #[arg(long)]
    pub file: PathBuf,

    /// Space-separated terms that must appear in order, e.g. "ore psu"
    #[arg(long)]
    pub filter: String,

    /// Color theme for ANSI output
    #[arg(long, value_enum)]
    pub theme: Option<Theme>,

    /// Omit the line-number prefix
    #[arg(long, default_value_t = false)]
    pub no_line_numbers: bool,
}

#[derive(Clone, Debug, PartialEq, ValueEnum)]
pub enum Theme {
    Dark,
    Light,
}

impl std::fmt::Display for Theme {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Theme::Dark => write!(f, "dark"),
            Theme::Light => write!(f, "light"),
        }
    }
}
