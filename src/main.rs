mod address;
mod command;
mod config;
mod controller;
mod document_model;
mod error;

use clap::Parser;
use config::RcLoader;
use controller::{EditorController, Session};
use crossterm::terminal;
use std::io;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "red", version, about = "A line-oriented text editor")]
struct Args {
    /// Show PROMPT before each command
    #[arg(short, long, value_name = "STRING")]
    prompt: Option<String>,

    /// Suppress byte counts and diagnostics
    #[arg(short, long)]
    silent: bool,

    /// Log debug output to stderr
    #[arg(short, long)]
    debug: bool,

    /// File to edit
    file: Option<PathBuf>,
}

fn init_logging(debug: bool) {
    let default = if debug { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_env("RED_LOG").unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    init_logging(args.debug);

    let config = RcLoader::load_config();
    let mut session = Session::new();

    if let Ok((columns, rows)) = terminal::size() {
        session.terminal_width = usize::from(columns).max(1);
        session.window_size = usize::from(rows).saturating_sub(2).max(1);
    }
    RcLoader::apply_config(&mut session, &config);

    if let Some(prompt) = args.prompt {
        session.prompt = prompt;
        session.show_prompt = true;
    }
    session.silent = args.silent;

    let stdin = io::stdin();
    let mut editor = EditorController::new(session, stdin.lock(), io::stdout());

    if let Some(path) = args.file {
        // a file that cannot be read still names the buffer, so `w` creates it
        if let Err(err) = editor.load_file(path.clone()) {
            editor.session_mut().filename = Some(path);
            editor.report(&err)?;
        }
    }

    editor.run()?;
    Ok(())
}
