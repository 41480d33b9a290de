use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

use crate::constants::normalize::{MULTIPLE_ORIGINS, MULTIPLE_TARGETS};
use crate::constants::window::{DEFAULT_END_YEAR, DEFAULT_START_YEAR, MAX_WINDOW_YEARS};
use crate::errors::PipelineError;

pub use crate::types::{ColumnName, CountryName, GroupName, SourceId, Year};

/// Forced-migration mechanism, encoded in source tables as integer codes 1-4.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    /// Code 1: forced removal by the origin state.
    Expulsion,
    /// Code 2: removal of foreign nationals by the host state.
    Deportation,
    /// Code 3: forced return to the country of nationality.
    Repatriation,
    /// Code 4: flight from persecution or violence.
    Escape,
}

impl EventType {
    /// Every event type in code order.
    pub const ALL: [EventType; 4] = [
        EventType::Expulsion,
        EventType::Deportation,
        EventType::Repatriation,
        EventType::Escape,
    ];

    /// Map a source-table code to its event type.
    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            1 => Some(EventType::Expulsion),
            2 => Some(EventType::Deportation),
            3 => Some(EventType::Repatriation),
            4 => Some(EventType::Escape),
            _ => None,
        }
    }

    /// Source-table code for this event type.
    pub const fn code(self) -> u8 {
        match self {
            EventType::Expulsion => 1,
            EventType::Deportation => 2,
            EventType::Repatriation => 3,
            EventType::Escape => 4,
        }
    }

    /// Display name used in legends.
    pub const fn name(self) -> &'static str {
        match self {
            EventType::Expulsion => "Expulsion",
            EventType::Deportation => "Deportation",
            EventType::Repatriation => "Repatriation",
            EventType::Escape => "Escape",
        }
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Inclusive year span covered by an event.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct YearSpan {
    /// First year, inclusive.
    pub start: Year,
    /// Last year, inclusive.
    pub end: Year,
}

impl YearSpan {
    /// Build a span, returning `None` when `start > end`.
    pub fn new(start: Year, end: Year) -> Option<Self> {
        (start <= end).then_some(Self { start, end })
    }

    /// Single-year span.
    pub fn point(year: Year) -> Self {
        Self {
            start: year,
            end: year,
        }
    }

    /// Number of years covered (`end - start + 1`), always at least 1.
    pub fn duration(&self) -> u64 {
        u64::from(self.end.abs_diff(self.start)) + 1
    }

    /// Returns `true` when `year` falls inside the span.
    pub fn contains(&self, year: Year) -> bool {
        self.start <= year && year <= self.end
    }

    /// Iterate the years of the span in ascending order.
    pub fn years(&self) -> impl Iterator<Item = Year> + use<> {
        self.start..=self.end
    }
}

/// Caller-selected inclusive `[start, end]` window applied to every aggregation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct YearWindow {
    start: Year,
    end: Year,
}

impl YearWindow {
    /// Validate and build a window.
    pub fn new(start: Year, end: Year) -> Result<Self, PipelineError> {
        if start > end {
            return Err(PipelineError::InvalidWindow {
                start,
                end,
                reason: "start year is after end year".into(),
            });
        }
        if end.abs_diff(start) >= MAX_WINDOW_YEARS {
            return Err(PipelineError::InvalidWindow {
                start,
                end,
                reason: format!("window spans more than {MAX_WINDOW_YEARS} years"),
            });
        }
        Ok(Self { start, end })
    }

    /// Single-year window.
    pub fn single(year: Year) -> Self {
        Self {
            start: year,
            end: year,
        }
    }

    /// First year of the window.
    pub fn start(&self) -> Year {
        self.start
    }

    /// Last year of the window.
    pub fn end(&self) -> Year {
        self.end
    }

    /// Returns `true` when `year` falls inside the window.
    pub fn contains(&self, year: Year) -> bool {
        self.start <= year && year <= self.end
    }

    /// Intersection with an event span, or `None` when they are disjoint.
    pub fn overlap(&self, span: YearSpan) -> Option<YearSpan> {
        YearSpan::new(span.start.max(self.start), span.end.min(self.end))
    }

    /// Iterate the window's years in ascending order.
    pub fn years(&self) -> impl Iterator<Item = Year> + use<> {
        self.start..=self.end
    }
}

impl Default for YearWindow {
    fn default() -> Self {
        Self {
            start: DEFAULT_START_YEAR,
            end: DEFAULT_END_YEAR,
        }
    }
}

/// Untyped row from a source table: column name to raw cell text.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RawRow {
    /// Zero-based position of the row within its source.
    pub index: usize,
    /// Cells keyed by column name, in header order.
    pub fields: IndexMap<ColumnName, String>,
}

impl RawRow {
    /// Create an empty row at `index`.
    pub fn new(index: usize) -> Self {
        Self {
            index,
            fields: IndexMap::new(),
        }
    }

    /// Builder-style cell insertion.
    pub fn with(mut self, column: impl Into<ColumnName>, value: impl Into<String>) -> Self {
        self.fields.insert(column.into(), value.into());
        self
    }

    /// Raw cell value for `column`, if present.
    pub fn get(&self, column: &str) -> Option<&str> {
        self.fields.get(column).map(String::as_str)
    }

    /// Trimmed cell value for `column`, treating blank cells as missing.
    pub fn get_trimmed(&self, column: &str) -> Option<&str> {
        self.get(column)
            .map(str::trim)
            .filter(|value| !value.is_empty())
    }
}

/// Canonical migration event.
///
/// Both source schemas normalize to this form: `magnitude` is the estimate for
/// the whole `span`, and a point-year row has `span.start == span.end`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Event {
    /// Country people moved from.
    pub origin: CountryName,
    /// Country people moved to.
    pub target: CountryName,
    /// Displaced population label.
    pub expelled_group: GroupName,
    /// Years the estimate covers.
    pub span: YearSpan,
    /// Estimated number of people for the whole span. Always positive.
    pub magnitude: f64,
    /// Migration mechanism.
    pub event_type: EventType,
    /// Citation ids backing the estimate.
    pub source_ids: BTreeSet<SourceId>,
}

impl Event {
    /// Build an event with no citations and the default expelled group.
    pub fn new(
        origin: impl Into<CountryName>,
        target: impl Into<CountryName>,
        span: YearSpan,
        magnitude: f64,
        event_type: EventType,
    ) -> Self {
        Self {
            origin: origin.into(),
            target: target.into(),
            expelled_group: crate::constants::normalize::DEFAULT_EXPELLED_GROUP.to_string(),
            span,
            magnitude,
            event_type,
            source_ids: BTreeSet::new(),
        }
    }

    /// Replace the expelled group.
    pub fn with_expelled_group(mut self, group: impl Into<GroupName>) -> Self {
        self.expelled_group = group.into();
        self
    }

    /// Replace the citation ids.
    pub fn with_source_ids<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<SourceId>,
    {
        self.source_ids = ids.into_iter().map(Into::into).collect();
        self
    }

    /// Key identifying duplicate observations of the same phenomenon.
    pub fn group_key(&self) -> GroupKey {
        GroupKey {
            origin: self.origin.clone(),
            target: self.target.clone(),
            expelled_group: self.expelled_group.clone(),
            year: self.span.start,
            event_type: self.event_type,
        }
    }

    /// Returns `true` when origin and target name the same country.
    pub fn is_self_loop(&self) -> bool {
        self.origin == self.target
    }

    /// Returns `true` when either side carries a multi-entity sentinel.
    pub fn is_multi_entity(&self) -> bool {
        self.origin == MULTIPLE_ORIGINS || self.target == MULTIPLE_TARGETS
    }

    /// Returns `true` when `country` is the origin or the target.
    pub fn involves(&self, country: &str) -> bool {
        self.origin == country || self.target == country
    }
}

/// Duplicate-detection key: `(origin, target, expelled group, start year, type)`.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct GroupKey {
    /// Origin country.
    pub origin: CountryName,
    /// Target country.
    pub target: CountryName,
    /// Expelled group label.
    pub expelled_group: GroupName,
    /// Start year of the event span.
    pub year: Year,
    /// Migration mechanism.
    pub event_type: EventType,
}

/// Set of event types currently enabled by the filter controls.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ActiveTypes(BTreeSet<EventType>);

impl ActiveTypes {
    /// All four event types enabled.
    pub fn all() -> Self {
        Self(EventType::ALL.into_iter().collect())
    }

    /// No event types enabled.
    pub fn none() -> Self {
        Self(BTreeSet::new())
    }

    /// Enable exactly the given types.
    pub fn only<I: IntoIterator<Item = EventType>>(types: I) -> Self {
        Self(types.into_iter().collect())
    }

    /// Returns `true` when `event_type` is enabled.
    pub fn contains(&self, event_type: EventType) -> bool {
        self.0.contains(&event_type)
    }

    /// Flip one type on or off; returns whether it is enabled afterwards.
    pub fn toggle(&mut self, event_type: EventType) -> bool {
        if self.0.remove(&event_type) {
            false
        } else {
            self.0.insert(event_type);
            true
        }
    }

    /// Iterate enabled types in code order.
    pub fn iter(&self) -> impl Iterator<Item = EventType> + '_ {
        self.0.iter().copied()
    }

    /// Returns `true` when no type is enabled.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Default for ActiveTypes {
    fn default() -> Self {
        Self::all()
    }
}

impl FromIterator<EventType> for ActiveTypes {
    fn from_iter<I: IntoIterator<Item = EventType>>(iter: I) -> Self {
        Self::only(iter)
    }
}

/// Window plus active types: the inputs every view-update shares.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ViewFilter {
    /// Inclusive year window.
    pub window: YearWindow,
    /// Enabled event types.
    pub active_types: ActiveTypes,
}

impl ViewFilter {
    /// Build a filter from a window and a type set.
    pub fn new(window: YearWindow, active_types: ActiveTypes) -> Self {
        Self {
            window,
            active_types,
        }
    }
}

/// Why an aggregation produced nothing to render.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EmptyReason {
    /// No event survived the window/type/country filters.
    NoQualifyingEvents,
    /// Events qualified but their allocated total is zero.
    ZeroTotal,
}

/// Aggregator result: either a payload or an explicit "no data" signal.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "status", content = "data", rename_all = "snake_case")]
pub enum Aggregation<T> {
    /// Payload ready to render.
    Ready(T),
    /// Nothing to render, with the reason.
    Empty(EmptyReason),
}

impl<T> Aggregation<T> {
    /// Returns `true` for the empty signal.
    pub fn is_empty(&self) -> bool {
        matches!(self, Aggregation::Empty(_))
    }

    /// Borrow the payload when ready.
    pub fn as_ready(&self) -> Option<&T> {
        match self {
            Aggregation::Ready(value) => Some(value),
            Aggregation::Empty(_) => None,
        }
    }

    /// Take the payload when ready.
    pub fn into_ready(self) -> Option<T> {
        match self {
            Aggregation::Ready(value) => Some(value),
            Aggregation::Empty(_) => None,
        }
    }

    /// Transform the payload, keeping the empty signal unchanged.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Aggregation<U> {
        match self {
            Aggregation::Ready(value) => Aggregation::Ready(f(value)),
            Aggregation::Empty(reason) => Aggregation::Empty(reason),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_type_codes_round_trip_through_lookup() {
        for event_type in EventType::ALL {
            assert_eq!(
                EventType::from_code(i64::from(event_type.code())),
                Some(event_type)
            );
        }
        assert_eq!(EventType::from_code(0), None);
        assert_eq!(EventType::from_code(5), None);
    }

    #[test]
    fn year_span_rejects_inverted_bounds() {
        assert!(YearSpan::new(1947, 1945).is_none());
        let span = YearSpan::new(1945, 1947).unwrap();
        assert_eq!(span.duration(), 3);
        assert_eq!(YearSpan::point(1983).duration(), 1);
    }

    #[test]
    fn full_range_span_duration_does_not_overflow() {
        let span = YearSpan::new(Year::MIN, Year::MAX).unwrap();
        assert_eq!(span.duration(), u64::from(u32::MAX) + 1);
    }

    #[test]
    fn window_overlap_clips_to_both_bounds() {
        let window = YearWindow::new(1946, 1950).unwrap();
        let span = YearSpan::new(1945, 1947).unwrap();
        assert_eq!(window.overlap(span), YearSpan::new(1946, 1947));
        assert_eq!(window.overlap(YearSpan::point(1960)), None);
    }

    #[test]
    fn window_validation_rejects_inverted_and_huge_ranges() {
        assert!(matches!(
            YearWindow::new(2000, 1990),
            Err(PipelineError::InvalidWindow { .. })
        ));
        assert!(YearWindow::new(0, MAX_WINDOW_YEARS as Year).is_err());
        assert!(YearWindow::new(1950, 2025).is_ok());
    }

    #[test]
    fn active_types_toggle_flips_membership() {
        let mut types = ActiveTypes::all();
        assert!(!types.toggle(EventType::Escape));
        assert!(!types.contains(EventType::Escape));
        assert!(types.toggle(EventType::Escape));
        assert!(types.contains(EventType::Escape));
        assert!(ActiveTypes::none().is_empty());
    }

    #[test]
    fn raw_row_treats_blank_cells_as_missing() {
        let row = RawRow::new(0).with("origin_name", "  ").with("year", " 1983 ");
        assert_eq!(row.get_trimmed("origin_name"), None);
        assert_eq!(row.get_trimmed("year"), Some("1983"));
        assert_eq!(row.get_trimmed("absent"), None);
    }

    #[test]
    fn aggregation_map_preserves_empty_reason() {
        let empty: Aggregation<u32> = Aggregation::Empty(EmptyReason::ZeroTotal);
        assert_eq!(empty.map(|v| v + 1), Aggregation::Empty(EmptyReason::ZeroTotal));
        assert_eq!(Aggregation::Ready(1).map(|v| v + 1).into_ready(), Some(2));
    }
}
