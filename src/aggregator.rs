use crate::persistence::{MemoryProgressStore, ProgressStore};
use crate::source::{SourceResult, TableSource};
use crate::table::Completion;
use chrono::{Local, NaiveDate};
use parking_lot::RwLock;
use serde::Serialize;
use std::sync::Arc;
use tracing::debug;

/// Integer percentage, truncated. Zero when there is nothing to count.
pub fn compute_percentage(completed: u64, total: u64) -> u64 {
    if total == 0 {
        return 0;
    }
    completed.saturating_mul(100) / total
}

pub async fn fetch_completion(
    source: &dyn TableSource,
    completion_column: usize,
) -> SourceResult<Completion> {
    let table = source.fetch_table().await?;
    let completion = Completion::from_table(&table, completion_column);
    debug!(
        completed = completion.completed,
        total = completion.total,
        "counted completion markers"
    );
    Ok(completion)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LogEntry {
    pub date: NaiveDate,
    pub value: i64,
}

/// Day-keyed completion log.
///
/// The stored value mixes two meanings. The first write of a day stores the
/// count minus the latest earlier day's stored value. Later writes on the
/// same day overwrite it with the absolute count.
pub struct ProgressLog {
    store: Box<dyn ProgressStore>,
}

impl Default for ProgressLog {
    fn default() -> Self {
        Self::new(MemoryProgressStore::new())
    }
}

impl ProgressLog {
    pub fn new<S: ProgressStore + 'static>(store: S) -> Self {
        Self {
            store: Box::new(store),
        }
    }

    /// Records against today's date on the local clock.
    pub fn update(&mut self, completed_today: u64) -> i64 {
        self.update_on(Local::now().date_naive(), completed_today)
    }

    /// Returns the value stored for `date`.
    pub fn update_on(&mut self, date: NaiveDate, completed: u64) -> i64 {
        let completed = i64::try_from(completed).unwrap_or(i64::MAX);
        let value = if self.store.get(date).is_some() {
            completed
        } else {
            let previous = self
                .store
                .latest_before(date)
                .map(|(_, value)| value)
                .unwrap_or(0);
            completed.saturating_sub(previous)
        };
        self.store.put(date, value);
        debug!(%date, value, "progress log updated");
        value
    }

    pub fn get(&self, date: NaiveDate) -> Option<i64> {
        self.store.get(date)
    }

    pub fn entries(&self) -> Vec<LogEntry> {
        self.store
            .entries()
            .into_iter()
            .map(|(date, value)| LogEntry { date, value })
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProgressSnapshot {
    pub completion: Completion,
    pub percentage: u64,
    pub log: Vec<LogEntry>,
}

/// Fetches completion from a table source and keeps the shared log.
#[derive(Clone)]
pub struct ProgressAggregator {
    source: Arc<dyn TableSource>,
    completion_column: usize,
    log: Arc<RwLock<ProgressLog>>,
}

impl ProgressAggregator {
    pub fn new(source: Arc<dyn TableSource>, completion_column: usize) -> Self {
        Self::with_log(source, completion_column, ProgressLog::default())
    }

    pub fn with_log(
        source: Arc<dyn TableSource>,
        completion_column: usize,
        log: ProgressLog,
    ) -> Self {
        Self {
            source,
            completion_column,
            log: Arc::new(RwLock::new(log)),
        }
    }

    pub fn log(&self) -> Arc<RwLock<ProgressLog>> {
        self.log.clone()
    }

    pub async fn fetch_completion(&self) -> SourceResult<Completion> {
        fetch_completion(self.source.as_ref(), self.completion_column).await
    }

    /// Read-modify-write runs under one write guard.
    pub fn update_log(&self, completed_today: u64) -> i64 {
        self.log.write().update(completed_today)
    }

    pub fn update_log_on(&self, date: NaiveDate, completed: u64) -> i64 {
        self.log.write().update_on(date, completed)
    }

    /// Fetch, record and summarize. The log is untouched when the fetch fails.
    pub async fn refresh(&self) -> SourceResult<ProgressSnapshot> {
        let completion = self.fetch_completion().await?;
        let log = {
            let mut guard = self.log.write();
            guard.update(completion.completed);
            guard.entries()
        };
        Ok(ProgressSnapshot {
            completion,
            percentage: compute_percentage(completion.completed, completion.total),
            log,
        })
    }
}
