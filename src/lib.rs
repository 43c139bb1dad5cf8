// src/lib.rs
//
// Reporting core over two HR tables: attendance occurrences and an
// hour-bank ledger. The pipeline is load -> classify/normalize per row ->
// aggregate per grouping key; everything is a pure batch transform except
// the loader, which owns the only I/O and the snapshot cache.

pub mod aggregate;
pub mod cache;
pub mod duration;
pub mod ledger;
pub mod loader;
pub mod occurrence;
pub mod report;

#[cfg(test)]
mod pipeline_tests;

pub use aggregate::{GroupKey, RecordFilter};
pub use ledger::LedgerRecord;
pub use loader::{DataSource, LoaderConfig, ReportLoader};
pub use occurrence::AttendanceRecord;
pub use report::DashboardReport;

use thiserror::Error;

/// Fatal load-time failures. Per-cell problems (malformed durations,
/// unparseable dates) never reach this enum; they degrade to zero/missing
/// values inside the parsers.
#[derive(Error, Debug)]
pub enum ReportError {
    #[error("failed to read {source_id}: {source}")]
    Io {
        source_id: String,
        #[source]
        source: std::io::Error,
    },
    #[error("HTTP request for {source_id} failed: {source}")]
    Http {
        source_id: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("{source_id}: server returned status {status}")]
    HttpStatus {
        source_id: String,
        status: reqwest::StatusCode,
    },
    #[error("{source_id}: malformed table: {source}")]
    Csv {
        source_id: String,
        #[source]
        source: csv::Error,
    },
    #[error("{source_id}: missing required column '{column}'")]
    MissingColumn { source_id: String, column: String },
    #[error("invalid source URL: {0}")]
    UrlParse(#[from] url::ParseError),
    #[error("failed to build HTTP client: {0}")]
    HttpClient(#[from] reqwest::Error),
}
