use clap::Parser;
use textfilter::cli::{Cli, Commands};
use textfilter::config::build_config;
use textfilter::grep;
use textfilter::tui;

fn main() {
    let cli = Cli::parse();
    let app_config = build_config(&cli);

    if app_config.verbose {
        eprintln!("text-filter: effective config: {:?}", app_config);
    }

    match cli.command {
        Some(Commands::Grep(ref grep_args)) => {
            if app_config.verbose {
                eprintln!(
                    "text-filter: grep mode: file={}, filter={:?}, theme={:?}",
                    grep_args.file.display(),
                    grep_args.filter,
                    grep_args.theme
                );
            }
            match grep::run_grep(grep_args, app_config.verbose) {
                Ok(true) => {}
                Ok(false) => std::process::exit(1),
                Err(e) => {
                    eprintln!("text-filter: grep error: {}", e);
                    std::process::exit(2);
                }
            }
        }
        None => {
            if app_config.verbose {
                eprintln!("text-filter: TUI mode");
            }
            if let Err(e) = tui::run_tui(app_config) {
                eprintln!("text-filter: TUI error: {}", e);
                std::process::exit(1);
            }
        }
    }
}
