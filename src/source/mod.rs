//! Row source interfaces.
//!
//! Ownership model:
//! - `RowSource` exposes stable, index-based access into one table.
//! - The pipeline reads each source exactly once at load time through
//!   [`read_rows`]; nothing holds a source open afterwards.

use std::sync::Arc;

use crate::data::RawRow;
use crate::errors::PipelineError;
use crate::types::{ColumnName, RowSourceId};

mod csv_source;

pub use csv_source::CsvRowSource;

/// Index-addressable table interface.
///
/// `len_hint` must be exact for the table, and `row_at` must return the same
/// row for the same index across calls.
pub trait RowSource: Send + Sync {
    /// Stable source identifier used in logs and errors.
    fn id(&self) -> &str;
    /// Column names in table order.
    fn headers(&self) -> &[ColumnName];
    /// Number of data rows, or `None` when the source cannot tell.
    fn len_hint(&self) -> Option<usize>;
    /// Return the row at index `idx`, or `None` for a missing position.
    fn row_at(&self, idx: usize) -> Result<Option<RawRow>, PipelineError>;
}

/// Read every row of `source` in index order.
pub fn read_rows(source: &dyn RowSource) -> Result<Vec<RawRow>, PipelineError> {
    let total = source
        .len_hint()
        .ok_or_else(|| PipelineError::SourceInconsistent {
            source_id: source.id().to_string(),
            details: "row source did not provide len_hint".into(),
        })?;
    let mut rows = Vec::with_capacity(total);
    for idx in 0..total {
        if let Some(row) = source.row_at(idx)? {
            rows.push(row);
        }
    }
    Ok(rows)
}

/// In-memory row source for tests and small tables.
pub struct InMemoryRowSource {
    id: RowSourceId,
    headers: Vec<ColumnName>,
    rows: Arc<Vec<Vec<String>>>,
}

impl InMemoryRowSource {
    /// Create an empty source with the given header row.
    pub fn new<I, S>(id: impl Into<RowSourceId>, headers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<ColumnName>,
    {
        Self {
            id: id.into(),
            headers: headers.into_iter().map(Into::into).collect(),
            rows: Arc::new(Vec::new()),
        }
    }

    /// Append a row; cells pair with headers by position.
    pub fn with_row<I, S>(mut self, cells: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Arc::make_mut(&mut self.rows).push(cells.into_iter().map(Into::into).collect());
        self
    }
}

impl RowSource for InMemoryRowSource {
    fn id(&self) -> &str {
        &self.id
    }

    fn headers(&self) -> &[ColumnName] {
        &self.headers
    }

    fn len_hint(&self) -> Option<usize> {
        Some(self.rows.len())
    }

    fn row_at(&self, idx: usize) -> Result<Option<RawRow>, PipelineError> {
        Ok(self
            .rows
            .get(idx)
            .map(|cells| zip_row(idx, &self.headers, cells.iter().map(String::as_str))))
    }
}

/// Pair header names with cell values. Extra cells are dropped; missing
/// cells are left out of the row.
pub(crate) fn zip_row<'a>(
    idx: usize,
    headers: &[ColumnName],
    cells: impl Iterator<Item = &'a str>,
) -> RawRow {
    let mut row = RawRow::new(idx);
    for (header, cell) in headers.iter().zip(cells) {
        row.fields.insert(header.clone(), cell.to_string());
    }
    row
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Source that cannot report its size.
    struct UnsizedStub;

    impl RowSource for UnsizedStub {
        fn id(&self) -> &str {
            "unsized"
        }

        fn headers(&self) -> &[ColumnName] {
            &[]
        }

        fn len_hint(&self) -> Option<usize> {
            None
        }

        fn row_at(&self, _idx: usize) -> Result<Option<RawRow>, PipelineError> {
            Ok(None)
        }
    }

    #[test]
    fn in_memory_rows_pair_cells_with_headers() {
        let source = InMemoryRowSource::new("inline", ["origin_name", "target_name", "year"])
            .with_row(["Nigeria", "Ghana", "1983"])
            .with_row(["Chad", "Niger"]);
        let rows = read_rows(&source).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].get("target_name"), Some("Ghana"));
        assert_eq!(rows[1].index, 1);
        assert_eq!(rows[1].get("year"), None);
    }

    #[test]
    fn missing_len_hint_is_inconsistent() {
        let err = read_rows(&UnsizedStub).unwrap_err();
        assert!(matches!(err, PipelineError::SourceInconsistent { .. }));
    }
}
