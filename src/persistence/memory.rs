use super::ProgressStore;
use chrono::NaiveDate;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default)]
pub struct MemoryProgressStore {
    entries: BTreeMap<NaiveDate, i64>,
}

impl MemoryProgressStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<(NaiveDate, i64)> for MemoryProgressStore {
    fn from_iter<T: IntoIterator<Item = (NaiveDate, i64)>>(iter: T) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

impl ProgressStore for MemoryProgressStore {
    fn get(&self, date: NaiveDate) -> Option<i64> {
        self.entries.get(&date).copied()
    }

    fn put(&mut self, date: NaiveDate, value: i64) {
        self.entries.insert(date, value);
    }

    fn latest_before(&self, date: NaiveDate) -> Option<(NaiveDate, i64)> {
        self.entries
            .range(..date)
            .next_back()
            .map(|(day, value)| (*day, *value))
    }

    fn entries(&self) -> Vec<(NaiveDate, i64)> {
        self.entries.iter().map(|(day, value)| (*day, *value)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, d).unwrap()
    }

    #[test]
    fn latest_before_skips_same_and_later_days() {
        let store: MemoryProgressStore = [(day(1), 2), (day(4), 5), (day(9), 1)]
            .into_iter()
            .collect();
        assert_eq!(store.latest_before(day(4)), Some((day(1), 2)));
        assert_eq!(store.latest_before(day(5)), Some((day(4), 5)));
        assert_eq!(store.latest_before(day(1)), None);
    }

    #[test]
    fn entries_are_sorted_by_date() {
        let mut store = MemoryProgressStore::new();
        store.put(day(7), 3);
        store.put(day(2), 1);
        let dates: Vec<_> = store.entries().into_iter().map(|(d, _)| d).collect();
        assert_eq!(dates, vec![day(2), day(7)]);
    }
}
