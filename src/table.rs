use serde::{Deserialize, Serialize};

/// One spreadsheet row. Trailing empty cells are usually omitted by the
/// provider, so rows can be shorter than the header.
pub type Row = Vec<String>;

/// Rows as returned by a table source. Row 0 is the header.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Table {
    rows: Vec<Row>,
}

impl Table {
    pub fn new(rows: Vec<Row>) -> Self {
        Self { rows }
    }

    pub fn from_cells<R, C>(rows: R) -> Self
    where
        R: IntoIterator<Item = C>,
        C: IntoIterator,
        C::Item: Into<String>,
    {
        Self {
            rows: rows
                .into_iter()
                .map(|row| row.into_iter().map(Into::into).collect())
                .collect(),
        }
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Rows after the header.
    pub fn data_rows(&self) -> &[Row] {
        self.rows.get(1..).unwrap_or(&[])
    }
}

/// Cell values that mark a row as done. Compared after trimming and
/// lowercasing.
pub struct CompletionMarker;

impl CompletionMarker {
    pub const VALUES: [&'static str; 4] = ["yes", "✔", "✅", "tick"];

    pub fn matches(cell: &str) -> bool {
        let normalized = cell.trim().to_lowercase();
        Self::VALUES.contains(&normalized.as_str())
    }
}

pub fn row_is_complete(row: &[String], completion_column: usize) -> bool {
    row.get(completion_column)
        .is_some_and(|cell| CompletionMarker::matches(cell))
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Completion {
    pub completed: u64,
    pub total: u64,
}

impl Completion {
    pub fn from_table(table: &Table, completion_column: usize) -> Self {
        if table.is_empty() {
            return Self::default();
        }
        let completed = table
            .data_rows()
            .iter()
            .filter(|row| row_is_complete(row, completion_column))
            .count();
        Self {
            completed: completed as u64,
            total: (table.len() - 1) as u64,
        }
    }
}
