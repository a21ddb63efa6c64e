//! logstat - access-log metrics reporter.
//!
//! Reads access-log lines from stdin (or a file), prints cumulative metrics
//! every 10 lines and once more at end of input or on Ctrl-C.

use std::io;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use clap::Parser;
use tracing::{Level, debug, error, info, warn};
use tracing_subscriber::EnvFilter;

use logstat::driver::{open_input, run};
use logstat::{InterruptGate, PeriodicReporter, ReportFormat};

/// Access-log metrics reporter.
#[derive(Parser)]
#[command(name = "logstat", about = "Access-log metrics reporter", version)]
struct Args {
    /// Read log lines from this file instead of stdin.
    #[arg(short, long, value_name = "PATH")]
    input: Option<PathBuf>,

    /// Report format.
    #[arg(short, long, value_enum, default_value_t = ReportFormat::Text)]
    format: ReportFormat,

    /// Increase logging verbosity (-v for debug, -vv for trace). Default is warn level.
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Quiet mode - only show errors.
    #[arg(short, long)]
    quiet: bool,
}

/// Initializes the tracing subscriber on stderr, keeping stdout for reports.
fn init_logging(verbose: u8, quiet: bool) {
    let level = if quiet {
        Level::ERROR
    } else {
        match verbose {
            0 => Level::WARN,
            1 => Level::DEBUG,
            _ => Level::TRACE,
        }
    };

    let mut filter = EnvFilter::from_default_env();
    if let Ok(directive) = format!("logstat={}", level).parse() {
        filter = filter.add_directive(directive);
    }

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

fn main() {
    let args = Args::parse();

    init_logging(args.verbose, args.quiet);
    info!("logstat {} starting", env!("CARGO_PKG_VERSION"));

    let reporter = Arc::new(Mutex::new(PeriodicReporter::with_format(
        io::stdout(),
        args.format,
    )));

    // Ctrl-C prints whatever has been folded so far, then exits 0.
    let gate = InterruptGate::new();
    let on_interrupt = Arc::clone(&reporter);
    gate.set_callback(move || {
        let mut reporter = on_interrupt
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if let Err(e) = reporter.final_report() {
            error!("Failed to write final report: {}", e);
        }
    });
    let _gate = match gate.install() {
        Ok(gate) => Some(gate),
        Err(e) => {
            warn!("Failed to set Ctrl-C handler: {}", e);
            None
        }
    };

    let input = match open_input(args.input.as_deref()) {
        Ok(input) => input,
        Err(e) => {
            let source = args
                .input
                .as_deref()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| "stdin".to_string());
            error!("Failed to open {}: {}", source, e);
            std::process::exit(1);
        }
    };

    match run(input, &reporter) {
        Ok(summary) => debug!("Done: {} lines, {} matched", summary.lines, summary.matched),
        Err(e) => {
            error!("{}", e);
            std::process::exit(1);
        }
    }
}
