//! Line reading loop.

use std::fs::File;
use std::io::{self, BufRead, BufReader, Write};
use std::path::Path;
use std::sync::Mutex;

use tracing::{debug, info};

use crate::reporter::PeriodicReporter;

/// Counts for one completed run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RunSummary {
    /// Lines read, matched or not.
    pub lines: u64,
    /// Lines folded into the metrics.
    pub matched: u64,
}

#[derive(Debug)]
pub enum DriverError {
    /// Reading the input failed.
    Read(io::Error),
    /// Writing a report failed.
    Write(io::Error),
    /// The reporter lock was poisoned by a panicking holder.
    Poisoned,
}

impl std::fmt::Display for DriverError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DriverError::Read(e) => write!(f, "failed to read input: {}", e),
            DriverError::Write(e) => write!(f, "failed to write report: {}", e),
            DriverError::Poisoned => write!(f, "reporter lock poisoned"),
        }
    }
}

impl std::error::Error for DriverError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            DriverError::Read(e) | DriverError::Write(e) => Some(e),
            DriverError::Poisoned => None,
        }
    }
}

/// Opens `path`, or stdin when `None`.
pub fn open_input(path: Option<&Path>) -> io::Result<Box<dyn BufRead>> {
    match path {
        Some(path) => {
            let file = File::open(path)?;
            Ok(Box::new(BufReader::new(file)))
        }
        None => Ok(Box::new(BufReader::new(io::stdin()))),
    }
}

/// Feeds every line of `input` to the reporter, then writes the final report.
///
/// The lock is held per line, never across a read, so an interrupt handler
/// can report while the loop is blocked on input.
pub fn run<R, W>(
    input: R,
    reporter: &Mutex<PeriodicReporter<W>>,
) -> Result<RunSummary, DriverError>
where
    R: BufRead,
    W: Write,
{
    for chunk in input.split(b'\n') {
        let chunk = chunk.map_err(DriverError::Read)?;
        // Invalid UTF-8 cannot match the grammar; decode lossily and let
        // the classifier reject it.
        let text = String::from_utf8_lossy(&chunk);
        let line = text.trim();

        let mut guard = reporter.lock().map_err(|_| DriverError::Poisoned)?;
        guard.process_line(line).map_err(DriverError::Write)?;
    }

    let mut guard = reporter.lock().map_err(|_| DriverError::Poisoned)?;
    debug!("End of input");
    guard.final_report().map_err(DriverError::Write)?;

    let summary = RunSummary {
        lines: guard.lines_processed(),
        matched: guard.records_matched(),
    };
    info!(
        "Processed {} lines, {} matched, {} reports written",
        summary.lines,
        summary.matched,
        guard.reports_written()
    );
    Ok(summary)
}
