use chrono::NaiveDate;

pub mod memory;

pub use memory::MemoryProgressStore;

/// Day-keyed storage behind the progress log.
pub trait ProgressStore: Send + Sync {
    fn get(&self, date: NaiveDate) -> Option<i64>;
    fn put(&mut self, date: NaiveDate, value: i64);
    /// Latest entry strictly before `date`.
    fn latest_before(&self, date: NaiveDate) -> Option<(NaiveDate, i64)>;
    /// All entries in ascending date order.
    fn entries(&self) -> Vec<(NaiveDate, i64)>;
}
