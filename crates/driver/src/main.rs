mod cli;
mod stdin_reader;

use analyzer_core::{pipeline, IsolationMode, PipelineError, Pipeline, TERMINATOR};
use cli::{Cli, UsageError};
use std::io;
use std::process;
use stdin_reader::LineReader;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn main() {
    init_tracing();

    let parsed = match Cli::parse() {
        Ok(cli) => cli,
        Err(UsageError(message)) => {
            eprintln!("error: {message}");
            cli::print_usage();
            process::exit(1);
        }
    };

    let isolation_mode = resolve_isolation_mode(parsed.namespace_isolation_override.as_deref());
    let stage_dir = pipeline::default_stage_dir();

    tracing::info!(
        queue_size = parsed.queue_size,
        stages = ?parsed.stages,
        isolated = matches!(isolation_mode, IsolationMode::Isolated),
        "building pipeline"
    );

    let pipeline = match Pipeline::build(parsed.queue_size, &parsed.stages, &stage_dir, isolation_mode) {
        Ok(pipeline) => pipeline,
        Err(e) => {
            eprintln!("error: {e}");
            process::exit(e.exit_code());
        }
    };

    let mut error: Option<PipelineError> = None;
    let terminated = feed(&pipeline, &mut error);

    if !terminated {
        // EOF or a read/feed error arrived before the terminator: still try
        // to unblock downstream stages per §7's FeedError policy ("attempt
        // shutdown").
        if let Err(e) = pipeline.feed_terminator() {
            error.get_or_insert(e);
        }
    }

    if let Err(e) = pipeline.shutdown() {
        eprintln!("error: {e}");
        error.get_or_insert(e);
    }

    println!("Pipeline shutdown complete");

    if let Some(e) = error {
        process::exit(e.exit_code());
    }
}

/// Runs the Feed phase (§4.4 phase 5). Returns `true` if the terminator was
/// read and forwarded; `false` on EOF or an error, leaving `error` set in
/// the latter case.
fn feed(pipeline: &Pipeline, error: &mut Option<PipelineError>) -> bool {
    let mut reader = LineReader::new(io::stdin().lock());
    loop {
        let line = match reader.next_line() {
            Ok(Some(line)) => line,
            Ok(None) => return false,
            Err(e) => {
                tracing::error!(%e, "stdin read error");
                *error = Some(PipelineError::Io(e));
                return false;
            }
        };

        let is_terminator = line == TERMINATOR;
        if let Err(e) = pipeline.feed_line(&line) {
            tracing::error!(%e, "failed to feed line to head stage");
            *error = Some(e);
            return false;
        }
        if is_terminator {
            return true;
        }
    }
}

fn resolve_isolation_mode(cli_override: Option<&str>) -> IsolationMode {
    match cli_override {
        Some(value) => IsolationMode::from_env_var(Some(value)),
        None => IsolationMode::from_env_var(std::env::var("ANALYZER_NAMESPACE_ISOLATION").ok().as_deref()),
    }
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "analyzer=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();
}
