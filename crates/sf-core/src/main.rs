//! sf-core: line-oriented front end for the Symbol Forecast assistant.
//!
//! Each stdin line is one inbound event:
//!   /command        a slash command (/start, /help, /stats, /predict, /reset)
//!   >payload        a button press (pred_3, wrong, correct_5, reset_confirm, ...)
//!   anything else   free text, e.g. a pasted batch of outcome digits
//!
//! Replies are written to stdout; buttons appear as `[payload] label` lines.

use clap::Parser;
use sf_common::Error;
use sf_config::{resolve_config, ConfigOverrides, PredictionModel};
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use tracing::{error, info, warn};

use sf_core::logging::{init_logging, LogFormat};
use sf_core::{
    Action, EngineSettings, ExitCode, Inbound, JsonFileStore, MemoryStore, SessionCoordinator,
    SharedEngine, SnapshotStore, StatisticsEngine,
};

/// CLI arguments for sf-core.
#[derive(Parser, Debug)]
#[command(name = "sf-core")]
#[command(about = "Symbol Forecast: round outcome statistics and top-K predictions")]
#[command(version)]
struct Args {
    /// Config file path (overrides SF_CONFIG and the XDG default)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Statistics snapshot path (overrides config file and SF_DATA_FILE)
    #[arg(long)]
    data_file: Option<PathBuf>,

    /// Prediction model: window_frequency or markov_chain
    #[arg(long)]
    model: Option<PredictionModel>,

    /// Number of symbols offered per prediction
    #[arg(long)]
    top_k: Option<usize>,

    /// Size of the recent-outcome window
    #[arg(long)]
    window_size: Option<usize>,

    /// Keep statistics in memory only
    #[arg(long)]
    ephemeral: bool,

    /// Default log level when RUST_LOG is unset
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Log format: text or json
    #[arg(long, default_value_t = LogFormat::Text)]
    log_format: LogFormat,
}

fn main() {
    let args = Args::parse();
    if let Err(e) = init_logging(&args.log_level, args.log_format) {
        eprintln!("{e}");
    }
    let code = run(args);
    std::process::exit(code.as_i32());
}

fn run(args: Args) -> ExitCode {
    let overrides = ConfigOverrides {
        config_path: args.config,
        data_file: args.data_file,
        model: args.model,
        top_k: args.top_k,
        window_size: args.window_size,
    };
    let (config, paths) = match resolve_config(&overrides) {
        Ok(resolved) => resolved,
        Err(e) => {
            error!(error = %e, "configuration rejected");
            eprintln!("configuration error: {e}");
            return ExitCode::ConfigError;
        }
    };

    let store: Box<dyn SnapshotStore> = if args.ephemeral {
        Box::new(MemoryStore::new())
    } else {
        Box::new(JsonFileStore::new(paths.data_file.clone()))
    };
    let engine = StatisticsEngine::open(store, EngineSettings::from(&config));
    let coordinator = SessionCoordinator::new(SharedEngine::new(engine), &config);
    info!(
        config_file = ?paths.config_file,
        model = %config.model,
        top_k = config.top_k(),
        "session started"
    );

    let stdin = io::stdin();
    let stdout = io::stdout();
    let mut out = stdout.lock();
    for line in stdin.lock().lines() {
        let line = match line {
            Ok(line) => line,
            Err(e) => {
                error!(error = %e, "failed to read input");
                return ExitCode::IoError;
            }
        };
        let Some(inbound) = classify(&line) else {
            continue;
        };
        let text = match inbound {
            Ok(inbound) => respond(&coordinator, &inbound),
            Err(payload) => format!("⚠️ Unknown button '{payload}'."),
        };
        if let Err(e) = writeln!(out, "{text}\n").and_then(|_| out.flush()) {
            error!(error = %e, "failed to write reply");
            return ExitCode::IoError;
        }
    }
    ExitCode::Clean
}

/// Turn one input line into an inbound event. Blank lines are ignored;
/// unknown button payloads come back as `Err`.
fn classify(line: &str) -> Option<Result<Inbound, String>> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }
    if let Some(payload) = line.strip_prefix('>') {
        let payload = payload.trim();
        return Some(
            Action::parse(payload)
                .map(Inbound::Action)
                .ok_or_else(|| payload.to_string()),
        );
    }
    Some(Ok(Inbound::from_message(line)))
}

fn respond(coordinator: &SessionCoordinator, inbound: &Inbound) -> String {
    match coordinator.handle(inbound) {
        Ok(replies) => replies
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("\n\n"),
        Err(e @ Error::PersistenceWrite(_)) => {
            warn!(error = %e, code = e.code(), "update not persisted");
            "⚠️ Could not save statistics; nothing was recorded. Please try again.".to_string()
        }
        Err(e @ Error::CounterOverflow { .. }) => {
            warn!(error = %e, code = e.code(), "update rejected");
            "⚠️ Statistics are full; nothing was recorded. Reset them to continue.".to_string()
        }
        Err(e) => {
            error!(error = %e, code = e.code(), "request failed");
            "⚠️ Something went wrong. Please try again.".to_string()
        }
    }
}
