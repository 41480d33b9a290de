use std::path::{Path, PathBuf};

use csv::{ReaderBuilder, StringRecord, Trim};
use tracing::{debug, info};

use crate::data::RawRow;
use crate::errors::PipelineError;
use crate::source::{RowSource, zip_row};
use crate::types::{ColumnName, RowSourceId};

/// CSV-backed row source. The file is read once on open and held in memory.
pub struct CsvRowSource {
    id: RowSourceId,
    path: PathBuf,
    headers: Vec<ColumnName>,
    records: Vec<StringRecord>,
}

impl CsvRowSource {
    /// Open `path` with the given field delimiter.
    ///
    /// Short rows are accepted; headers are trimmed and a UTF-8 byte order
    /// mark on the first header is removed.
    pub fn open(path: impl AsRef<Path>, delimiter: u8) -> Result<Self, PipelineError> {
        let path = path.as_ref();
        let id = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        if !path.is_file() {
            return Err(PipelineError::SourceUnavailable {
                source_id: id,
                reason: format!("no such file: {}", path.display()),
            });
        }

        let mut reader = ReaderBuilder::new()
            .delimiter(delimiter)
            .flexible(true)
            .trim(Trim::Headers)
            .from_path(path)
            .map_err(|err| PipelineError::SourceUnavailable {
                source_id: id.clone(),
                reason: err.to_string(),
            })?;
        let headers: Vec<ColumnName> = reader
            .headers()?
            .iter()
            .enumerate()
            .map(|(idx, header)| {
                if idx == 0 {
                    header.trim_start_matches('\u{feff}').to_string()
                } else {
                    header.to_string()
                }
            })
            .collect();
        let records = reader
            .records()
            .collect::<Result<Vec<StringRecord>, csv::Error>>()?;

        debug!(source = %id, columns = ?headers, "read csv header");
        info!(
            source = %id,
            path = %path.display(),
            rows = records.len(),
            "opened csv source"
        );
        Ok(Self {
            id,
            path: path.to_path_buf(),
            headers,
            records,
        })
    }

    /// Path the source was read from.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl RowSource for CsvRowSource {
    fn id(&self) -> &str {
        &self.id
    }

    fn headers(&self) -> &[ColumnName] {
        &self.headers
    }

    fn len_hint(&self) -> Option<usize> {
        Some(self.records.len())
    }

    fn row_at(&self, idx: usize) -> Result<Option<RawRow>, PipelineError> {
        Ok(self
            .records
            .get(idx)
            .map(|record| zip_row(idx, &self.headers, record.iter())))
    }
}
