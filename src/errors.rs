use std::io;

use thiserror::Error;

use crate::types::{SourceId, Year};

/// Error type for loading, configuration, and export failures.
///
/// Malformed rows and empty query results are not errors: rows are counted as
/// [`crate::normalize::RowRejection`] values and empty views come back as
/// [`crate::data::Aggregation::Empty`].
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Load finished with an empty canonical set.
    #[error("dataset '{source_id}' has no usable rows ({rows_read} read, {rejected} rejected)")]
    EmptyDataset {
        /// Event table identifier.
        source_id: SourceId,
        /// Data rows read.
        rows_read: usize,
        /// Rows dropped by the normalizer.
        rejected: usize,
    },
    /// A table could not be opened.
    #[error("row source '{source_id}' is unavailable: {reason}")]
    SourceUnavailable {
        /// Table identifier, usually its path.
        source_id: SourceId,
        /// Underlying cause.
        reason: String,
    },
    /// A source reported rows it could not return.
    #[error("row source '{source_id}' returned inconsistent state: {details}")]
    SourceInconsistent {
        /// Table identifier.
        source_id: SourceId,
        /// What disagreed.
        details: String,
    },
    /// Columns or schema do not match the table.
    #[error("configuration error: {0}")]
    Configuration(String),
    /// Rejected query window.
    #[error("invalid year window {start}..={end}: {reason}")]
    InvalidWindow {
        /// Requested first year.
        start: Year,
        /// Requested last year.
        end: Year,
        /// Why the window was rejected.
        reason: String,
    },
    /// Filesystem failure.
    #[error(transparent)]
    Io(#[from] io::Error),
    /// Malformed CSV.
    #[error(transparent)]
    Csv(#[from] csv::Error),
    /// JSON encoding failure.
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_dataset_message_names_counts() {
        let err = PipelineError::EmptyDataset {
            source_id: "events.csv".into(),
            rows_read: 3,
            rejected: 3,
        };
        assert_eq!(
            err.to_string(),
            "dataset 'events.csv' has no usable rows (3 read, 3 rejected)"
        );
    }

    #[test]
    fn io_errors_convert_transparently() {
        fn open() -> Result<(), PipelineError> {
            let read: Result<(), io::Error> = Err(io::Error::new(io::ErrorKind::NotFound, "gone"));
            read?;
            Ok(())
        }
        let err = open().unwrap_err();
        assert!(matches!(err, PipelineError::Io(_)));
        assert_eq!(err.to_string(), "gone");
    }
}
