//! Pipeline root: one-shot load of the canonical event set and view queries.
//!
//! Load order is fixed: read rows, normalize, drop multi-entity sentinels,
//! collapse duplicates. The resulting events are frozen behind an `Arc<[Event]>`
//! and every query is a pure function over them.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::citations::{Bibliography, CitationTable};
use crate::config::{PipelineConfig, Schema};
use crate::constants::lookup::DEFAULT_COUNTERPART_LIMIT;
use crate::countries::{CountryCodes, CountryDirectory};
use crate::data::{Aggregation, CountryName, Event, SourceId, ViewFilter, YearWindow};
use crate::dedup::{DuplicateAudit, collapse_duplicates};
use crate::errors::PipelineError;
use crate::flows::{FlowSummary, compute_flows};
use crate::metrics::{TypeBreakdown, type_breakdown};
use crate::normalize::{Normalizer, RejectReason, RowRejection, exclude_multi_entity};
use crate::sankey::{CounterpartFlow, CountryFlows, Direction, compute_country_flows, counterpart_breakdown};
use crate::source::{CsvRowSource, RowSource, read_rows};
use crate::trend::{TrendSummary, compute_trend};
use crate::types::RowSourceId;

/// Diagnostics recorded while building the canonical set.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct IngestionReport {
    /// Event table identifier.
    pub source_id: RowSourceId,
    /// Year layout the table was read with.
    pub schema: Schema,
    /// Data rows read.
    pub rows_read: usize,
    /// Rows dropped by the normalizer.
    pub rejected: usize,
    /// Dropped rows per reason.
    pub rejections_by_reason: BTreeMap<RejectReason, usize>,
    /// Accepted rows removed because origin or target listed several countries.
    pub multi_entity_excluded: usize,
    /// Duplicate groups with more than one member.
    pub duplicate_groups_collapsed: usize,
    /// Events in the canonical set.
    pub canonical_events: usize,
    /// Event-type balance of the canonical set.
    pub type_breakdown: Option<TypeBreakdown>,
    /// Load completion time.
    pub loaded_at: DateTime<Utc>,
}

/// Canonical event set plus its lookup tables.
#[derive(Clone, Debug)]
pub struct Dataset {
    events: Arc<[Event]>,
    audits: Vec<DuplicateAudit>,
    rejections: Vec<RowRejection>,
    report: IngestionReport,
    citations: CitationTable,
    country_codes: CountryCodes,
    countries: CountryDirectory,
    default_window: YearWindow,
}

impl Dataset {
    /// Open the tables named in `config` and build the canonical set.
    pub fn load(config: &PipelineConfig) -> Result<Self, PipelineError> {
        let events = CsvRowSource::open(&config.events_path, config.delimiter)?;
        let citations = config
            .citations_path
            .as_ref()
            .map(|path| CsvRowSource::open(path, config.delimiter))
            .transpose()?;
        let codes = config
            .country_codes_path
            .as_ref()
            .map(|path| CsvRowSource::open(path, config.delimiter))
            .transpose()?;
        Self::from_sources(
            &events,
            citations.as_ref().map(|source| source as &dyn RowSource),
            codes.as_ref().map(|source| source as &dyn RowSource),
            config,
        )
    }

    /// Build the canonical set from already-open sources.
    pub fn from_sources(
        events: &dyn RowSource,
        citations: Option<&dyn RowSource>,
        country_codes: Option<&dyn RowSource>,
        config: &PipelineConfig,
    ) -> Result<Self, PipelineError> {
        let source_id = events.id().to_string();
        let schema = config.schema.resolve(events.headers(), &config.columns)?;
        let rows = read_rows(events)?;

        let normalizer = Normalizer::new(&config.columns, schema, &config.aliases);
        let outcome = normalizer.normalize(&source_id, rows)?;
        let rejections_by_reason = outcome.rejection_counts();
        for (reason, count) in &rejections_by_reason {
            debug!(source = %source_id, %reason, count, "rejections by reason");
        }
        let rows_read = outcome.rows_read;
        let rejections = outcome.rejections;

        let (single_entity, multi_entity_excluded) = exclude_multi_entity(outcome.events);
        let collapsed = collapse_duplicates(single_entity);
        if collapsed.events.is_empty() {
            warn!(source = %source_id, rows_read, rejected = rejections.len(), "no usable rows");
            return Err(PipelineError::EmptyDataset {
                source_id,
                rows_read,
                rejected: rejections.len(),
            });
        }

        let citations = match citations {
            Some(source) => CitationTable::from_source(source)?,
            None => CitationTable::default(),
        };
        let country_codes = match country_codes {
            Some(source) => CountryCodes::from_source(source)?,
            None => CountryCodes::default(),
        };

        let countries = CountryDirectory::from_events(&collapsed.events);
        let report = IngestionReport {
            source_id,
            schema,
            rows_read,
            rejected: rejections.len(),
            rejections_by_reason,
            multi_entity_excluded,
            duplicate_groups_collapsed: collapsed.audits.len(),
            canonical_events: collapsed.events.len(),
            type_breakdown: type_breakdown(&collapsed.events),
            loaded_at: Utc::now(),
        };
        info!(
            source = %report.source_id,
            schema = ?report.schema,
            rows_read = report.rows_read,
            rejected = report.rejected,
            multi_entity_excluded = report.multi_entity_excluded,
            duplicate_groups = report.duplicate_groups_collapsed,
            canonical_events = report.canonical_events,
            countries = countries.names().len(),
            "dataset loaded"
        );

        Ok(Self {
            events: collapsed.events.into(),
            audits: collapsed.audits,
            rejections,
            report,
            citations,
            country_codes,
            countries,
            default_window: config.default_window,
        })
    }

    /// Canonical events, read-only.
    pub fn events(&self) -> &[Event] {
        &self.events
    }

    /// Load diagnostics.
    pub fn report(&self) -> &IngestionReport {
        &self.report
    }

    /// Audit entries for collapsed duplicate groups.
    pub fn duplicate_audits(&self) -> &[DuplicateAudit] {
        &self.audits
    }

    /// Rows dropped during normalization.
    pub fn rejections(&self) -> &[RowRejection] {
        &self.rejections
    }

    /// Citation table (empty when none was configured).
    pub fn citations(&self) -> &CitationTable {
        &self.citations
    }

    /// Country code table (empty when none was configured).
    pub fn country_codes(&self) -> &CountryCodes {
        &self.country_codes
    }

    /// Distinct country names of the canonical set.
    pub fn countries(&self) -> &CountryDirectory {
        &self.countries
    }

    /// Filter with the configured default window and every type active.
    pub fn default_filter(&self) -> ViewFilter {
        ViewFilter::new(self.default_window, Default::default())
    }

    /// Chord feed.
    pub fn flows(&self, filter: &ViewFilter) -> Aggregation<FlowSummary> {
        compute_flows(&self.events, &filter.window, &filter.active_types)
    }

    /// Trend feed for `country`, or a global trend for `None`.
    pub fn trend(&self, country: Option<&str>, filter: &ViewFilter) -> Aggregation<TrendSummary> {
        compute_trend(&self.events, country, &filter.window, &filter.active_types)
    }

    /// Sankey feed for `country`.
    pub fn country_flows(&self, country: &str, filter: &ViewFilter) -> Aggregation<CountryFlows> {
        compute_country_flows(&self.events, country, &filter.window, &filter.active_types)
    }

    /// Top counterparts of a Sankey side node, excluding the selected country.
    pub fn counterparts(
        &self,
        node: &str,
        selected: &str,
        direction: Direction,
        filter: &ViewFilter,
    ) -> Vec<CounterpartFlow> {
        counterpart_breakdown(
            &self.events,
            node,
            selected,
            direction,
            &filter.window,
            &filter.active_types,
            DEFAULT_COUNTERPART_LIMIT,
        )
    }

    /// Country names matching `term`.
    pub fn search_countries(&self, term: &str) -> Vec<&CountryName> {
        self.countries.search(term)
    }

    /// Bibliography for a set of cited ids.
    pub fn bibliography<'a, I>(&self, ids: I) -> Bibliography
    where
        I: IntoIterator<Item = &'a SourceId>,
    {
        self.citations.bibliography(ids)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alias::{AliasField, AliasRule, AliasTable};
    use crate::constants::normalize::MULTIPLE_TARGETS;
    use crate::data::YearSpan;
    use crate::source::InMemoryRowSource;

    const HEADERS: [&str; 6] = [
        "origin_name",
        "target_name",
        "year",
        "event_type",
        "mean_estimate",
        "data_source_id",
    ];

    fn events_source() -> InMemoryRowSource {
        InMemoryRowSource::new("events", HEADERS)
            .with_row(["Nigeria", "Ghana", "1983", "1", "100", "1"])
            .with_row(["Nigeria", "Ghana", "1983", "1", "300", "2"])
            .with_row(["Nigeria", "Togo", "1983", "1", "50", "NA"])
            .with_row(["Nigeria", "Ghana; Benin", "1983", "1", "70", "3"])
            .with_row(["", "Ghana", "1983", "1", "70", "3"])
    }

    #[test]
    fn load_reports_each_stage() {
        let config = PipelineConfig::new("unused.csv");
        let dataset = Dataset::from_sources(&events_source(), None, None, &config).unwrap();
        let report = dataset.report();
        assert_eq!(report.schema, Schema::PointYear);
        assert_eq!(report.rows_read, 5);
        assert_eq!(report.rejected, 1);
        assert_eq!(report.rejections_by_reason[&RejectReason::MissingOrigin], 1);
        assert_eq!(report.multi_entity_excluded, 1);
        assert_eq!(report.duplicate_groups_collapsed, 1);
        assert_eq!(report.canonical_events, 2);
        assert!(dataset.events().iter().all(|event| event.target != MULTIPLE_TARGETS));
        assert_eq!(dataset.duplicate_audits()[0].median, 200.0);
        assert_eq!(dataset.countries().names(), ["Ghana", "Nigeria", "Togo"]);
    }

    #[test]
    fn alias_rule_rescues_multi_entity_row() {
        let aliases = AliasTable::new().with_rule(
            AliasRule::new(AliasField::Target, "Ghana")
                .matching_names(["ghana"])
                .with_counterpart("Nigeria")
                .within_years(YearSpan::point(1983)),
        );
        let config = PipelineConfig::new("unused.csv").with_aliases(aliases);
        let dataset = Dataset::from_sources(&events_source(), None, None, &config).unwrap();
        assert_eq!(dataset.report().multi_entity_excluded, 0);
        // 100, 300 and the rescued 70 collapse to a median of 100.
        assert_eq!(dataset.duplicate_audits()[0].observation_count, 3);
        assert_eq!(dataset.duplicate_audits()[0].median, 100.0);
    }

    #[test]
    fn all_rows_rejected_is_an_empty_dataset() {
        let source = InMemoryRowSource::new("events", HEADERS)
            .with_row(["Nigeria", "Ghana", "1983", "9", "100", ""])
            .with_row(["Nigeria", "Ghana", "1983", "1", "0", ""]);
        let err = Dataset::from_sources(&source, None, None, &PipelineConfig::new("unused.csv"))
            .unwrap_err();
        assert!(matches!(
            err,
            PipelineError::EmptyDataset {
                rows_read: 2,
                rejected: 2,
                ..
            }
        ));
    }

    #[test]
    fn queries_share_the_canonical_set() {
        let config = PipelineConfig::new("unused.csv");
        let citations = InMemoryRowSource::new("citations", ["data_source_id", "title"])
            .with_row(["2", "Second"])
            .with_row(["1", "First"]);
        let dataset =
            Dataset::from_sources(&events_source(), Some(&citations), None, &config).unwrap();
        let filter = ViewFilter::new(YearWindow::single(1983), Default::default());

        let flows = dataset.flows(&filter).into_ready().unwrap();
        assert_eq!(flows.total, 250.0);
        let sankey = dataset.country_flows("Nigeria", &filter).into_ready().unwrap();
        assert_eq!(sankey.outflow_total, flows.total);
        let trend = dataset.trend(Some("Ghana"), &filter).into_ready().unwrap();
        let bibliography = dataset.bibliography(&trend.cited_source_ids);
        let titles: Vec<&str> = bibliography.entries.iter().map(|c| c.title.as_str()).collect();
        assert_eq!(titles, vec!["First", "Second"]);
        assert!(dataset.counterparts("Ghana", "Nigeria", Direction::Outbound, &filter).is_empty());
        assert_eq!(dataset.search_countries("tog"), vec!["Togo"]);
    }
}
