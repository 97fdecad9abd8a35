use anyhow::{Context, Result};
use clap::Parser;
use cli::{app, output};
use pruner_core::config::{self, Overrides};
use pruner_core::FsRemover;
use std::process::ExitCode;

fn main() -> ExitCode {
    let cli = Cli::parse();
    let level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::WARN
    };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_max_level(level)
        .init();

    let json = cli.json;
    match run(cli) {
        Ok(code) => ExitCode::from(code),
        Err(err) => {
            let message = format!("{err:#}");
            tracing::error!(error = %message, "pruning did not start");
            if json {
                match output::render_json_error(&message) {
                    Ok(out) => println!("{out}"),
                    Err(_) => println!("Error: {message}"),
                }
            } else {
                println!("Error: {message}");
            }
            ExitCode::from(output::EXIT_FAILED)
        }
    }
}

#[derive(Parser)]
#[command(name = "prune-root")]
#[command(
    about = "Delete everything at the top of a project folder except the listed files and directories",
    long_about = None
)]
struct Cli {
    /// Path to config TOML (defaults to config/default if present)
    #[arg(short, long)]
    config: Option<String>,

    /// Directory whose immediate children are pruned
    #[arg(long)]
    root: Option<String>,

    /// File names to keep (comma-separated or repeated); replaces the configured list
    #[arg(long = "keep-file", value_delimiter = ',', num_args = 1..)]
    keep_files: Vec<String>,

    /// Directory names to keep (comma-separated or repeated); replaces the configured list
    #[arg(long = "keep-dir", value_delimiter = ',', num_args = 1..)]
    keep_dirs: Vec<String>,

    /// What to do when an entry cannot be removed
    #[arg(long, value_parser = ["abort", "continue"])]
    on_error: Option<String>,

    /// What to do with entries that are neither files nor directories
    #[arg(long, value_parser = ["skip", "remove"])]
    special_entries: Option<String>,

    /// Output a JSON report instead of progress lines
    #[arg(long)]
    json: bool,

    /// Log every classified entry to stderr
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    fn overrides(&self) -> Overrides {
        Overrides {
            root: self.root.clone(),
            keep_files: (!self.keep_files.is_empty()).then(|| self.keep_files.clone()),
            keep_dirs: (!self.keep_dirs.is_empty()).then(|| self.keep_dirs.clone()),
            on_error: self.on_error.clone(),
            special_entries: self.special_entries.clone(),
        }
    }
}

fn run(cli: Cli) -> Result<u8> {
    let cfg = config::load(cli.config.as_deref(), &cli.overrides())
        .context("failed to load configuration")?;
    let stdout = std::io::stdout();
    app::execute(&cfg, &FsRemover, cli.json, &mut stdout.lock())
}
