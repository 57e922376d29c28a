pub mod aggregator;
pub mod config;
#[cfg(feature = "http_api")]
pub mod http_api;
pub mod persistence;
pub mod source;
pub mod table;

pub use aggregator::{
    LogEntry, ProgressAggregator, ProgressLog, ProgressSnapshot, compute_percentage,
    fetch_completion,
};
pub use config::{ConfigError, ServerConfig, SheetConfig};
pub use persistence::{MemoryProgressStore, ProgressStore};
pub use source::{
    GoogleSheetsSource, RetryPolicy, RetryingSource, ServiceAccountCredentials, SourceError,
    SourceResult, StaticTableSource, TableSource,
};
pub use table::{Completion, CompletionMarker, Row, Table};
