#![doc = include_str!("../README.md")]
#![warn(missing_docs)]

/// Entity-alias resolution used during normalization.
pub mod alias;
/// Citation table and bibliography ordering.
pub mod citations;
/// Node color assignment.
pub mod color;
/// Pipeline configuration types.
pub mod config;
/// Centralized constants: column names, sentinels, defaults.
pub mod constants;
/// Country directory and ISO code lookup.
pub mod countries;
/// Events, windows, filters and aggregation results.
pub mod data;
/// Pipeline root and view queries.
pub mod dataset;
/// Median and duplicate collapsing.
pub mod dedup;
/// JSON export of view payloads.
pub mod export;
/// Directed flows and chord matrix.
pub mod flows;
mod hash;
/// Dataset diagnostics.
pub mod metrics;
/// Row normalization.
pub mod normalize;
/// Single-country inbound/outbound split.
pub mod sankey;
/// Row source traits and built-in sources.
pub mod source;
/// Proportional year allocation.
pub mod temporal;
/// Per-country trend series and dyad-year bands.
pub mod trend;
/// Shared type aliases.
pub mod types;
/// Cell parsing helpers.
pub mod utils;

mod errors;

pub use alias::{AliasField, AliasRule, AliasTable};
pub use citations::{Bibliography, Citation, CitationTable};
pub use color::{ColorAssignment, SessionColorAssignment};
pub use config::{ColumnMapping, PipelineConfig, Schema, SchemaSelection};
pub use countries::{CountryCodes, CountryDirectory};
pub use data::{
    ActiveTypes, Aggregation, EmptyReason, Event, EventType, GroupKey, RawRow, ViewFilter,
    YearSpan, YearWindow,
};
pub use dataset::{Dataset, IngestionReport};
pub use dedup::{CollapseOutcome, DuplicateAudit, collapse_duplicates, median};
pub use errors::PipelineError;
pub use flows::{ChordMatrix, DirectedFlow, FlowSummary, compute_flows};
pub use normalize::{NormalizeOutcome, Normalizer, RejectReason, RowRejection};
pub use sankey::{CounterpartFlow, CountryFlows, Direction, compute_country_flows};
pub use source::{CsvRowSource, InMemoryRowSource, RowSource};
pub use trend::{CitationMarker, DyadYearBand, TrendSummary, YearPoint, compute_trend};
pub use types::{ColorValue, ColumnName, CountryName, GroupName, RowSourceId, SourceId, Year};
