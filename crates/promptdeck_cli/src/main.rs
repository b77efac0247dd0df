//! Launcher glue binary.
//!
//! One invocation runs one mode against the persisted state under the
//! configured data directory. The response goes to stdout so the launcher
//! can display it verbatim; logs go to stderr.
//!
//! ```text
//! promptdeck <mode> [words...]
//!   chat           one chat turn against the windowed history
//!   complete       one legacy single-prompt completion
//!   image          generate an image and print the saved file path
//!   store-query    stash the resolved query for a later combine-query
//!   combine-query  prepend the stashed query to the new input
//!   history        list the genuine turns of the conversation
//!   clear          wipe the conversation history
//! ```

mod providers;

use std::env;
use std::io::{self, Write};
use std::process::ExitCode;

use conversation_store::{
    cache_path, diagnostic_log_path, turn_log_path, DiagnosticLog, FileRequestStateCache,
    FileTurnStore,
};
use promptdeck::{Config, Engine};
use tracing_subscriber::EnvFilter;

const HISTORY_DISPLAY_LIMIT: usize = 50;

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(io::stderr)
        .with_ansi(false)
        .init();

    let mut args = env::args().skip(1);
    let Some(mode) = args.next() else {
        print_usage();
        return ExitCode::from(2);
    };
    let query = args.collect::<Vec<_>>().join(" ");

    let config = Config::from_env();
    let provider = match providers::provider_from_config(&config) {
        Ok(provider) => provider,
        Err(error) => {
            eprintln!("promptdeck: {error}");
            return ExitCode::FAILURE;
        }
    };

    let mut turns = FileTurnStore::new(turn_log_path(&config.data_dir));
    let mut cache = FileRequestStateCache::new(cache_path(&config.data_dir));
    let diagnostics = DiagnosticLog::new(diagnostic_log_path(&config.data_dir), config.debug);

    let mut engine = Engine::new(&config, &mut turns, &mut cache, &diagnostics, provider.as_ref());

    let result = match mode.as_str() {
        "chat" => engine.run_chat(&query),
        "complete" => engine.run_completion(&query),
        "image" => engine.run_image(&query),
        "store-query" => engine.store_query(&query),
        "combine-query" => engine.combine_query(&query),
        "clear" => engine.clear_history(),
        "history" => engine.history(HISTORY_DISPLAY_LIMIT).map(render_history),
        unknown => {
            eprintln!("promptdeck: unknown mode '{unknown}'");
            print_usage();
            return ExitCode::from(2);
        }
    };

    match result {
        Ok(output) => {
            let mut stdout = io::stdout();
            let _ = writeln!(stdout, "{output}");
            ExitCode::SUCCESS
        }
        Err(error) => {
            eprintln!("promptdeck: {error}");
            ExitCode::FAILURE
        }
    }
}

fn render_history(turns: Vec<conversation_store::Turn>) -> String {
    let mut lines = Vec::with_capacity(turns.len() * 2);
    for turn in turns {
        lines.push(format!("user: {}", turn.user_text));
        lines.push(format!("assistant: {}", turn.assistant_text));
    }
    lines.join("\n")
}

fn print_usage() {
    eprintln!(
        "usage: promptdeck <chat|complete|image|store-query|combine-query|history|clear> [words...]"
    );
}
