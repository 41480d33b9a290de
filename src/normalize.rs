//! Record normalization: raw table rows to canonical [`Event`]s.

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;
use tracing::debug;

use crate::alias::{AliasInput, AliasTable};
use crate::config::{ColumnMapping, Schema};
use crate::constants::normalize::{DEFAULT_EXPELLED_GROUP, MULTIPLE_ORIGINS, MULTIPLE_TARGETS};
use crate::data::{Event, EventType, RawRow, Year, YearSpan};
use crate::errors::PipelineError;
use crate::utils::{
    is_multi_entity, normalize_inline_whitespace, parse_integral, parse_magnitude,
    parse_source_ids,
};

/// Why a row was dropped.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectReason {
    /// Origin cell empty or absent.
    MissingOrigin,
    /// Target cell empty or absent.
    MissingTarget,
    /// Magnitude absent, non-numeric or non-finite.
    InvalidMagnitude,
    /// Magnitude parsed but is zero or negative.
    NonPositiveMagnitude,
    /// Year cell absent or not an integer.
    InvalidYear,
    /// Range start after range end.
    InvertedYearRange,
    /// Event type code absent or outside 1-4.
    InvalidEventType,
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            RejectReason::MissingOrigin => "missing origin",
            RejectReason::MissingTarget => "missing target",
            RejectReason::InvalidMagnitude => "invalid magnitude",
            RejectReason::NonPositiveMagnitude => "non-positive magnitude",
            RejectReason::InvalidYear => "invalid year",
            RejectReason::InvertedYearRange => "start year after end year",
            RejectReason::InvalidEventType => "invalid event type",
        };
        f.write_str(text)
    }
}

/// A dropped row and the first check it failed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct RowRejection {
    /// Zero-based row index within the source.
    pub row_index: usize,
    /// Failed check.
    pub reason: RejectReason,
}

/// Output of [`Normalizer::normalize`].
#[derive(Clone, Debug, Default, PartialEq)]
pub struct NormalizeOutcome {
    /// Accepted events, sentinel rows included, in input order.
    pub events: Vec<Event>,
    /// Dropped rows.
    pub rejections: Vec<RowRejection>,
    /// Number of rows read.
    pub rows_read: usize,
}

impl NormalizeOutcome {
    /// Rejection counts grouped by reason.
    pub fn rejection_counts(&self) -> BTreeMap<RejectReason, usize> {
        let mut counts = BTreeMap::new();
        for rejection in &self.rejections {
            *counts.entry(rejection.reason).or_insert(0) += 1;
        }
        counts
    }
}

/// Parses rows of one event table into canonical events.
#[derive(Clone, Copy, Debug)]
pub struct Normalizer<'a> {
    columns: &'a ColumnMapping,
    schema: Schema,
    aliases: &'a AliasTable,
}

impl<'a> Normalizer<'a> {
    /// Build a normalizer for a table with the given layout.
    pub fn new(columns: &'a ColumnMapping, schema: Schema, aliases: &'a AliasTable) -> Self {
        Self {
            columns,
            schema,
            aliases,
        }
    }

    /// Schema this normalizer reads.
    pub fn schema(&self) -> Schema {
        self.schema
    }

    /// Normalize every row. Malformed rows are collected, not raised; only a
    /// source with zero rows fails.
    pub fn normalize<I>(&self, source_id: &str, rows: I) -> Result<NormalizeOutcome, PipelineError>
    where
        I: IntoIterator<Item = RawRow>,
    {
        let mut outcome = NormalizeOutcome::default();
        for row in rows {
            outcome.rows_read += 1;
            match self.normalize_row(&row) {
                Ok(event) => outcome.events.push(event),
                Err(reason) => {
                    debug!(source = source_id, row = row.index, %reason, "row rejected");
                    outcome.rejections.push(RowRejection {
                        row_index: row.index,
                        reason,
                    });
                }
            }
        }
        if outcome.rows_read == 0 {
            return Err(PipelineError::EmptyDataset {
                source_id: source_id.to_string(),
                rows_read: 0,
                rejected: 0,
            });
        }
        Ok(outcome)
    }

    /// Normalize one row, or report the first check it fails.
    pub fn normalize_row(&self, row: &RawRow) -> Result<Event, RejectReason> {
        let columns = self.columns;
        let raw_origin = row
            .get_trimmed(&columns.origin)
            .ok_or(RejectReason::MissingOrigin)?;
        let raw_target = row
            .get_trimmed(&columns.target)
            .ok_or(RejectReason::MissingTarget)?;

        let magnitude = row
            .get_trimmed(&columns.magnitude)
            .and_then(parse_magnitude)
            .ok_or(RejectReason::InvalidMagnitude)?;
        if magnitude <= 0.0 {
            return Err(RejectReason::NonPositiveMagnitude);
        }

        let span = self.parse_span(row)?;

        let event_type = row
            .get_trimmed(&columns.event_type)
            .and_then(parse_integral)
            .and_then(EventType::from_code)
            .ok_or(RejectReason::InvalidEventType)?;

        let (origin, target) = self.aliases.resolve(&AliasInput {
            origin: raw_origin,
            target: raw_target,
            event_text: row.get_trimmed(&columns.event_text),
            year: span.start,
        });

        let expelled_group = row
            .get_trimmed(&columns.expelled_group)
            .map(normalize_inline_whitespace)
            .unwrap_or_else(|| DEFAULT_EXPELLED_GROUP.to_string());
        let source_ids = row
            .get(&columns.source_ids)
            .map(parse_source_ids)
            .unwrap_or_default();

        Ok(Event {
            origin: entity_name(&origin, MULTIPLE_ORIGINS),
            target: entity_name(&target, MULTIPLE_TARGETS),
            expelled_group,
            span,
            magnitude,
            event_type,
            source_ids,
        })
    }

    fn parse_span(&self, row: &RawRow) -> Result<YearSpan, RejectReason> {
        let columns = self.columns;
        let year = |column: &str| -> Option<Result<Year, RejectReason>> {
            row.get_trimmed(column).map(|text| {
                parse_integral(text)
                    .and_then(|value| Year::try_from(value).ok())
                    .ok_or(RejectReason::InvalidYear)
            })
        };
        match self.schema {
            Schema::PointYear => {
                let year = year(columns.year.as_str()).ok_or(RejectReason::InvalidYear)??;
                Ok(YearSpan::point(year))
            }
            Schema::YearRange => {
                let start = match year(columns.start_year.as_str()) {
                    Some(start) => start?,
                    None => year(columns.year.as_str()).ok_or(RejectReason::InvalidYear)??,
                };
                let end = year(columns.end_year.as_str()).transpose()?.unwrap_or(start);
                YearSpan::new(start, end).ok_or(RejectReason::InvertedYearRange)
            }
        }
    }
}

fn entity_name(value: &str, sentinel: &str) -> String {
    if is_multi_entity(value) {
        sentinel.to_string()
    } else {
        normalize_inline_whitespace(value)
    }
}

/// Split sentinel (multi-entity) events from single-entity ones.
///
/// Returns the single-entity events and the number removed.
pub fn exclude_multi_entity(events: Vec<Event>) -> (Vec<Event>, usize) {
    let before = events.len();
    let kept: Vec<Event> = events
        .into_iter()
        .filter(|event| !event.is_multi_entity())
        .collect();
    let removed = before - kept.len();
    (kept, removed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alias::{AliasField, AliasRule};

    fn point_row(index: usize, origin: &str, target: &str, year: &str, kind: &str, magnitude: &str) -> RawRow {
        RawRow::new(index)
            .with("origin_name", origin)
            .with("target_name", target)
            .with("year", year)
            .with("event_type", kind)
            .with("mean_estimate", magnitude)
    }

    fn normalize_one(schema: Schema, row: RawRow) -> Result<Event, RejectReason> {
        let columns = ColumnMapping::default();
        let aliases = AliasTable::default();
        Normalizer::new(&columns, schema, &aliases).normalize_row(&row)
    }

    #[test]
    fn accepts_point_year_row() {
        let row = point_row(0, " Nigeria ", "Ghana", "1983", "1", "100")
            .with("data_source_id", "12; NA; 7")
            .with("expelled_group", "  Ghanaian   migrants ");
        let event = normalize_one(Schema::PointYear, row).unwrap();
        assert_eq!(event.origin, "Nigeria");
        assert_eq!(event.span, YearSpan::point(1983));
        assert_eq!(event.event_type, EventType::Expulsion);
        assert_eq!(event.expelled_group, "Ghanaian migrants");
        assert_eq!(event.source_ids.len(), 2);
    }

    #[test]
    fn rejects_each_malformed_field() {
        let cases = [
            (point_row(0, "", "Ghana", "1983", "1", "100"), RejectReason::MissingOrigin),
            (point_row(0, "Nigeria", " ", "1983", "1", "100"), RejectReason::MissingTarget),
            (point_row(0, "Nigeria", "Ghana", "1983", "1", "lots"), RejectReason::InvalidMagnitude),
            (point_row(0, "Nigeria", "Ghana", "1983", "1", "0"), RejectReason::NonPositiveMagnitude),
            (point_row(0, "Nigeria", "Ghana", "c. 1983", "1", "5"), RejectReason::InvalidYear),
            (point_row(0, "Nigeria", "Ghana", "1983", "7", "5"), RejectReason::InvalidEventType),
        ];
        for (row, expected) in cases {
            assert_eq!(normalize_one(Schema::PointYear, row), Err(expected));
        }
    }

    #[test]
    fn range_schema_falls_back_to_point_year_and_start() {
        let row = point_row(0, "France", "Germany", "1945", "2", "300").with("end_year", "1947");
        let event = normalize_one(Schema::YearRange, row).unwrap();
        assert_eq!(event.span, YearSpan::new(1945, 1947).unwrap());

        let row = RawRow::new(1)
            .with("origin_name", "France")
            .with("target_name", "Germany")
            .with("start_year", "1950.0")
            .with("end_year", "")
            .with("event_type", "2")
            .with("mean_estimate", "10");
        let event = normalize_one(Schema::YearRange, row).unwrap();
        assert_eq!(event.span, YearSpan::point(1950));
    }

    #[test]
    fn range_schema_rejects_inverted_span() {
        let row = RawRow::new(0)
            .with("origin_name", "France")
            .with("target_name", "Germany")
            .with("start_year", "1950")
            .with("end_year", "1940")
            .with("event_type", "2")
            .with("mean_estimate", "10");
        assert_eq!(
            normalize_one(Schema::YearRange, row),
            Err(RejectReason::InvertedYearRange)
        );
    }

    #[test]
    fn multi_entity_fields_become_sentinels_and_are_excluded_later() {
        let event =
            normalize_one(Schema::PointYear, point_row(0, "Chad;Niger", "Ghana;Togo", "1983", "1", "5"))
                .unwrap();
        assert_eq!(event.origin, MULTIPLE_ORIGINS);
        assert_eq!(event.target, MULTIPLE_TARGETS);

        let single = normalize_one(Schema::PointYear, point_row(1, "Chad", "Niger", "1983", "1", "5")).unwrap();
        let (kept, removed) = exclude_multi_entity(vec![event, single]);
        assert_eq!(removed, 1);
        assert_eq!(kept[0].origin, "Chad");
    }

    #[test]
    fn aliases_resolve_before_sentinel_substitution() {
        let columns = ColumnMapping::default();
        let aliases = AliasTable::new().with_rule(
            AliasRule::new(AliasField::Target, "Ghana")
                .matching_names(["Ghana"])
                .with_counterpart("Nigeria")
                .within_years(YearSpan::point(1983)),
        );
        let normalizer = Normalizer::new(&columns, Schema::PointYear, &aliases);
        let event = normalizer
            .normalize_row(&point_row(0, "Nigeria", "Ghana; Togo", "1983", "1", "5"))
            .unwrap();
        assert_eq!(event.target, "Ghana");
    }

    #[test]
    fn normalize_counts_rejections_and_fails_on_empty_input() {
        let columns = ColumnMapping::default();
        let aliases = AliasTable::default();
        let normalizer = Normalizer::new(&columns, Schema::PointYear, &aliases);
        let outcome = normalizer
            .normalize(
                "inline",
                vec![
                    point_row(0, "Nigeria", "Ghana", "1983", "1", "100"),
                    point_row(1, "Nigeria", "Ghana", "1983", "1", "-3"),
                    point_row(2, "", "Ghana", "1983", "1", "3"),
                ],
            )
            .unwrap();
        assert_eq!(outcome.rows_read, 3);
        assert_eq!(outcome.events.len(), 1);
        assert_eq!(outcome.rejections.len(), 2);
        assert_eq!(outcome.rejection_counts()[&RejectReason::MissingOrigin], 1);

        let err = normalizer.normalize("inline", Vec::new()).unwrap_err();
        assert!(matches!(err, PipelineError::EmptyDataset { rows_read: 0, .. }));
    }
}
