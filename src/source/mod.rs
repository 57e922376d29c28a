use crate::Table;
use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;
use tracing::warn;

pub mod sheets;

pub use sheets::{GoogleSheetsSource, ServiceAccountCredentials};

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SourceError {
    #[error("configuration error: {0}")]
    Configuration(String),
    #[error("upstream error: {0}")]
    Upstream(String),
}

impl SourceError {
    pub fn configuration(message: impl Into<String>) -> Self {
        SourceError::Configuration(message.into())
    }

    pub fn upstream(message: impl Into<String>) -> Self {
        SourceError::Upstream(message.into())
    }

    pub fn is_configuration(&self) -> bool {
        matches!(self, SourceError::Configuration(_))
    }
}

impl From<reqwest::Error> for SourceError {
    fn from(value: reqwest::Error) -> Self {
        SourceError::Upstream(value.to_string())
    }
}

pub type SourceResult<T> = Result<T, SourceError>;

/// Read-only provider of a table of cells.
#[async_trait]
pub trait TableSource: Send + Sync {
    async fn fetch_table(&self) -> SourceResult<Table>;
}

/// Serves a fixed table. Useful for local runs without credentials.
#[derive(Debug, Clone, Default)]
pub struct StaticTableSource {
    table: Table,
}

impl StaticTableSource {
    pub fn new(table: Table) -> Self {
        Self { table }
    }
}

#[async_trait]
impl TableSource for StaticTableSource {
    async fn fetch_table(&self) -> SourceResult<Table> {
        Ok(self.table.clone())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 1,
            initial_backoff: Duration::from_millis(200),
            max_backoff: Duration::from_secs(5),
        }
    }
}

impl RetryPolicy {
    pub fn with_attempts(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            ..Self::default()
        }
    }

    fn backoff_for(&self, failed_attempts: u32) -> Duration {
        let factor = 2u32.saturating_pow(failed_attempts.saturating_sub(1));
        self.initial_backoff
            .saturating_mul(factor)
            .min(self.max_backoff)
    }
}

/// Retries upstream failures of the wrapped source with exponential backoff.
/// Configuration errors are returned on the first attempt.
pub struct RetryingSource<S> {
    inner: S,
    policy: RetryPolicy,
}

impl<S> RetryingSource<S> {
    pub fn new(inner: S, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }
}

#[async_trait]
impl<S: TableSource> TableSource for RetryingSource<S> {
    async fn fetch_table(&self) -> SourceResult<Table> {
        let attempts = self.policy.max_attempts.max(1);
        let mut attempt = 1;
        loop {
            match self.inner.fetch_table().await {
                Ok(table) => return Ok(table),
                Err(err) if err.is_configuration() || attempt >= attempts => return Err(err),
                Err(err) => {
                    let delay = self.policy.backoff_for(attempt);
                    warn!(attempt, ?delay, error = %err, "table fetch failed, retrying");
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backoff_doubles_and_caps() {
        let policy = RetryPolicy {
            max_attempts: 10,
            initial_backoff: Duration::from_millis(100),
            max_backoff: Duration::from_millis(350),
        };
        assert_eq!(policy.backoff_for(1), Duration::from_millis(100));
        assert_eq!(policy.backoff_for(2), Duration::from_millis(200));
        assert_eq!(policy.backoff_for(3), Duration::from_millis(350));
    }
}
