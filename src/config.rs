use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::alias::AliasTable;
use crate::constants::columns;
use crate::data::YearWindow;
use crate::errors::PipelineError;
use crate::types::ColumnName;

/// Maps each column role to the column name used by a source table.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ColumnMapping {
    /// Origin country column.
    pub origin: ColumnName,
    /// Target country column.
    pub target: ColumnName,
    /// Magnitude estimate column.
    pub magnitude: ColumnName,
    /// Event type code column.
    pub event_type: ColumnName,
    /// Point-year column (also the fallback start year for range tables).
    pub year: ColumnName,
    /// Range start column.
    pub start_year: ColumnName,
    /// Range end column.
    pub end_year: ColumnName,
    /// `;`-delimited citation id column.
    pub source_ids: ColumnName,
    /// Expelled group column.
    pub expelled_group: ColumnName,
    /// Free-text description column consulted by alias rules.
    pub event_text: ColumnName,
}

impl Default for ColumnMapping {
    fn default() -> Self {
        Self {
            origin: columns::ORIGIN.to_string(),
            target: columns::TARGET.to_string(),
            magnitude: columns::MAGNITUDE.to_string(),
            event_type: columns::EVENT_TYPE.to_string(),
            year: columns::YEAR.to_string(),
            start_year: columns::START_YEAR.to_string(),
            end_year: columns::END_YEAR.to_string(),
            source_ids: columns::SOURCE_IDS.to_string(),
            expelled_group: columns::EXPELLED_GROUP.to_string(),
            event_text: columns::EVENT_TEXT.to_string(),
        }
    }
}

impl ColumnMapping {
    /// Override the magnitude column (e.g. `estimate` instead of `mean_estimate`).
    pub fn with_magnitude(mut self, column: impl Into<ColumnName>) -> Self {
        self.magnitude = column.into();
        self
    }

    /// Override the origin and target columns.
    pub fn with_dyad(
        mut self,
        origin: impl Into<ColumnName>,
        target: impl Into<ColumnName>,
    ) -> Self {
        self.origin = origin.into();
        self.target = target.into();
        self
    }

    /// Override the range columns.
    pub fn with_range(
        mut self,
        start_year: impl Into<ColumnName>,
        end_year: impl Into<ColumnName>,
    ) -> Self {
        self.start_year = start_year.into();
        self.end_year = end_year.into();
        self
    }

    fn required(&self) -> [&ColumnName; 4] {
        [&self.origin, &self.target, &self.magnitude, &self.event_type]
    }
}

/// Which year layout to read from the event table.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SchemaSelection {
    /// Detect from the header row.
    #[default]
    Auto,
    /// One `year` column; the magnitude is that year's value.
    PointYear,
    /// `start_year`/`end_year` columns; the magnitude is the total over the span.
    YearRange,
}

/// Year layout resolved against an actual header row.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Schema {
    /// Single year per row.
    PointYear,
    /// Inclusive year range per row.
    YearRange,
}

impl SchemaSelection {
    /// Resolve against `headers`, validating that required columns are present.
    pub fn resolve(
        self,
        headers: &[ColumnName],
        columns: &ColumnMapping,
    ) -> Result<Schema, PipelineError> {
        let has = |column: &ColumnName| headers.iter().any(|header| header == column);
        let missing: Vec<&str> = columns
            .required()
            .into_iter()
            .filter(|column| !has(*column))
            .map(String::as_str)
            .collect();
        if !missing.is_empty() {
            return Err(PipelineError::Configuration(format!(
                "event table is missing required columns: {}",
                missing.join(", ")
            )));
        }
        let has_range = has(&columns.start_year) && has(&columns.end_year);
        let has_year = has(&columns.year);
        match self {
            SchemaSelection::Auto if has_range => Ok(Schema::YearRange),
            SchemaSelection::Auto if has_year => Ok(Schema::PointYear),
            SchemaSelection::Auto => Err(PipelineError::Configuration(format!(
                "event table has neither '{}' nor '{}'/'{}' columns",
                columns.year, columns.start_year, columns.end_year
            ))),
            SchemaSelection::PointYear if has_year => Ok(Schema::PointYear),
            SchemaSelection::PointYear => Err(PipelineError::Configuration(format!(
                "point-year schema requires column '{}'",
                columns.year
            ))),
            SchemaSelection::YearRange if has(&columns.start_year) => Ok(Schema::YearRange),
            SchemaSelection::YearRange => Err(PipelineError::Configuration(format!(
                "year-range schema requires column '{}'",
                columns.start_year
            ))),
        }
    }
}

/// Top-level pipeline configuration.
#[derive(Clone, Debug)]
pub struct PipelineConfig {
    /// Event table path.
    pub events_path: PathBuf,
    /// Optional companion citation table.
    pub citations_path: Option<PathBuf>,
    /// Optional `name, alpha-2` country code table.
    pub country_codes_path: Option<PathBuf>,
    /// Column role mapping for the event table.
    pub columns: ColumnMapping,
    /// Year layout of the event table.
    pub schema: SchemaSelection,
    /// Alias rules applied during normalization.
    pub aliases: AliasTable,
    /// Field delimiter shared by all tables.
    pub delimiter: u8,
    /// Window used when a caller does not choose one.
    pub default_window: YearWindow,
}

impl PipelineConfig {
    /// Configuration reading `events_path` with default columns and schema detection.
    pub fn new(events_path: impl AsRef<Path>) -> Self {
        Self {
            events_path: events_path.as_ref().to_path_buf(),
            citations_path: None,
            country_codes_path: None,
            columns: ColumnMapping::default(),
            schema: SchemaSelection::default(),
            aliases: AliasTable::default(),
            delimiter: b',',
            default_window: YearWindow::default(),
        }
    }

    /// Attach a citation table.
    pub fn with_citations(mut self, path: impl AsRef<Path>) -> Self {
        self.citations_path = Some(path.as_ref().to_path_buf());
        self
    }

    /// Attach a country code table.
    pub fn with_country_codes(mut self, path: impl AsRef<Path>) -> Self {
        self.country_codes_path = Some(path.as_ref().to_path_buf());
        self
    }

    /// Replace the column mapping.
    pub fn with_columns(mut self, columns: ColumnMapping) -> Self {
        self.columns = columns;
        self
    }

    /// Force a schema instead of detecting it.
    pub fn with_schema(mut self, schema: SchemaSelection) -> Self {
        self.schema = schema;
        self
    }

    /// Replace the alias table.
    pub fn with_aliases(mut self, aliases: AliasTable) -> Self {
        self.aliases = aliases;
        self
    }

    /// Use a different field delimiter (e.g. `b';'` or `b'\t'`).
    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    /// Replace the default window.
    pub fn with_default_window(mut self, window: YearWindow) -> Self {
        self.default_window = window;
        self
    }
}
