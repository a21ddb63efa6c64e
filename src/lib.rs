//! logstat - access-log metrics with periodic reporting.
//!
//! Reads access-log lines, folds the well-formed ones into running totals
//! and prints a cumulative report every `BATCH_SIZE` lines, at end of input
//! and on Ctrl-C.

pub mod driver;
pub mod interrupt;
pub mod metrics;
pub mod model;
pub mod parser;
pub mod reporter;

pub use driver::{DriverError, RunSummary, run};
pub use interrupt::{FireOutcome, GateError, GateState, InterruptGate};
pub use metrics::{MetricsAccumulator, MetricsSnapshot};
pub use model::{LogRecord, StatusCode};
pub use parser::{NoMatch, ParsedLine, classify};
pub use reporter::{BATCH_SIZE, PeriodicReporter, ReportFormat};
