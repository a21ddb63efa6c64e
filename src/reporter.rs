//! Batch-triggered rendering of accumulated metrics.
//!
//! The reporter owns the accumulator and the output sink. Every processed
//! line advances a counter; each `BATCH_SIZE`-th line flushes a report. A
//! final report is written once at end of input or on interrupt.

use std::io::{self, Write};

use clap::ValueEnum;
use tracing::{debug, trace};

use crate::metrics::{MetricsAccumulator, MetricsSnapshot};
use crate::parser;

/// Lines between intermediate reports.
pub const BATCH_SIZE: u64 = 10;

/// How a snapshot is written to the sink.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum ReportFormat {
    /// `File size: N` followed by `<code>: <count>` lines.
    #[default]
    Text,
    /// One JSON object per report.
    Json,
}

/// Renders one snapshot.
pub fn render<W: Write>(
    out: &mut W,
    snapshot: &MetricsSnapshot,
    format: ReportFormat,
) -> io::Result<()> {
    match format {
        ReportFormat::Text => {
            writeln!(out, "File size: {}", snapshot.total_bytes)?;
            for (code, count) in &snapshot.status_counts {
                writeln!(out, "{}: {}", code, count)?;
            }
        }
        ReportFormat::Json => {
            serde_json::to_writer(&mut *out, snapshot).map_err(io::Error::other)?;
            writeln!(out)?;
        }
    }
    Ok(())
}

pub struct PeriodicReporter<W: Write> {
    metrics: MetricsAccumulator,
    out: W,
    format: ReportFormat,
    lines: u64,
    reports: u64,
    finished: bool,
}

impl<W: Write> PeriodicReporter<W> {
    pub fn new(out: W) -> Self {
        Self::with_format(out, ReportFormat::default())
    }

    pub fn with_format(out: W, format: ReportFormat) -> Self {
        Self {
            metrics: MetricsAccumulator::new(),
            out,
            format,
            lines: 0,
            reports: 0,
            finished: false,
        }
    }

    /// Classifies one line, folds it on match and advances the batch counter.
    ///
    /// Non-matching lines are skipped but still counted. Once the final
    /// report has been written, lines are ignored.
    pub fn process_line(&mut self, line: &str) -> io::Result<()> {
        if self.finished {
            return Ok(());
        }
        let matched = match parser::parse_line(line) {
            Ok(parsed) => {
                trace!(
                    "Line {}: {} {} from {}",
                    self.lines + 1,
                    parsed.record.status,
                    parsed.record.bytes,
                    parsed.address
                );
                self.metrics.fold(parsed.record);
                true
            }
            Err(e) => {
                debug!("Skipping line {}: {}", self.lines + 1, e);
                false
            }
        };
        self.on_line_processed(matched)
    }

    /// Counts a processed line and reports on every batch boundary.
    pub fn on_line_processed(&mut self, matched: bool) -> io::Result<()> {
        if self.finished {
            return Ok(());
        }
        self.lines += 1;
        trace!("Line {} processed (matched={})", self.lines, matched);
        if self.lines.is_multiple_of(BATCH_SIZE) {
            self.report()?;
        }
        Ok(())
    }

    /// Writes the current totals and flushes the sink.
    pub fn report(&mut self) -> io::Result<()> {
        let snapshot = self.metrics.snapshot();
        render(&mut self.out, &snapshot, self.format)?;
        self.out.flush()?;
        self.reports += 1;
        Ok(())
    }

    /// Writes the closing report. Only the first call has an effect.
    pub fn final_report(&mut self) -> io::Result<()> {
        if self.finished {
            return Ok(());
        }
        self.finished = true;
        debug!(
            "Final report after {} lines, {} matched",
            self.lines,
            self.metrics.records()
        );
        self.report()
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    pub fn lines_processed(&self) -> u64 {
        self.lines
    }

    pub fn records_matched(&self) -> u64 {
        self.metrics.records()
    }

    pub fn reports_written(&self) -> u64 {
        self.reports
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Consumes the reporter, returning the sink.
    pub fn into_inner(self) -> W {
        self.out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(status: u16, size: u64) -> String {
        format!(
            "10.0.0.1 - [2024-01-15 14:30:00.5] \"GET /projects/260 HTTP/1.1\" {} {}",
            status, size
        )
    }

    fn output(reporter: PeriodicReporter<Vec<u8>>) -> String {
        String::from_utf8(reporter.into_inner()).unwrap()
    }

    #[test]
    fn test_no_report_before_boundary() {
        let mut reporter = PeriodicReporter::new(Vec::new());
        for _ in 0..9 {
            reporter.process_line(&line(200, 1)).unwrap();
        }
        assert_eq!(reporter.reports_written(), 0);
        assert!(output(reporter).is_empty());
    }

    #[test]
    fn test_report_on_tenth_line() {
        let mut reporter = PeriodicReporter::new(Vec::new());
        for _ in 0..10 {
            reporter.process_line(&line(200, 1)).unwrap();
        }
        assert_eq!(reporter.reports_written(), 1);
        assert_eq!(output(reporter), "File size: 10\n200: 10\n");
    }

    #[test]
    fn test_unmatched_lines_count_toward_batch() {
        let mut reporter = PeriodicReporter::new(Vec::new());
        for _ in 0..5 {
            reporter.process_line(&line(404, 3)).unwrap();
            reporter.process_line("garbage").unwrap();
        }
        assert_eq!(reporter.lines_processed(), 10);
        assert_eq!(reporter.records_matched(), 5);
        assert_eq!(output(reporter), "File size: 15\n404: 5\n");
    }

    #[test]
    fn test_reports_are_cumulative() {
        let mut reporter = PeriodicReporter::new(Vec::new());
        for i in 0..20 {
            let status = if i < 10 { 200 } else { 500 };
            reporter.process_line(&line(status, 2)).unwrap();
        }
        assert_eq!(
            output(reporter),
            "File size: 20\n200: 10\nFile size: 40\n200: 10\n500: 10\n"
        );
    }

    #[test]
    fn test_final_report_runs_once() {
        let mut reporter = PeriodicReporter::new(Vec::new());
        reporter.final_report().unwrap();
        reporter.final_report().unwrap();
        assert!(reporter.is_finished());
        assert_eq!(reporter.reports_written(), 1);
        assert_eq!(output(reporter), "File size: 0\n");
    }

    #[test]
    fn test_lines_after_final_report_are_ignored() {
        let mut reporter = PeriodicReporter::new(Vec::new());
        reporter.final_report().unwrap();
        for _ in 0..10 {
            reporter.process_line(&line(200, 5)).unwrap();
        }
        reporter.on_line_processed(true).unwrap();

        assert_eq!(reporter.lines_processed(), 0);
        assert_eq!(reporter.records_matched(), 0);
        assert_eq!(reporter.reports_written(), 1);
        assert_eq!(output(reporter), "File size: 0\n");
    }

    #[test]
    fn test_json_format() {
        let mut reporter = PeriodicReporter::with_format(Vec::new(), ReportFormat::Json);
        reporter.process_line(&line(301, 8)).unwrap();
        reporter.process_line(&line(200, 2)).unwrap();
        reporter.final_report().unwrap();
        assert_eq!(
            output(reporter),
            "{\"total_bytes\":10,\"status_counts\":{\"200\":1,\"301\":1}}\n"
        );
    }

    struct FailingSink;

    impl Write for FailingSink {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "closed"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_sink_error_propagates() {
        let mut reporter = PeriodicReporter::new(FailingSink);
        for _ in 0..9 {
            reporter.on_line_processed(true).unwrap();
        }
        let err = reporter.on_line_processed(true).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::BrokenPipe);
    }
}
