//! Per-country annual trend series with dyad-year uncertainty bands.
//!
//! Annual slices are grouped by `(year, origin, target)` across every event
//! type. Each group is summarized by median/min/max, and each active type
//! present in the group adds that summary to its own series point for the year.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;
use tracing::debug;

use crate::citations::compare_source_ids;
use crate::data::{
    ActiveTypes, Aggregation, CountryName, EmptyReason, Event, EventType, SourceId, Year,
    YearWindow,
};
use crate::dedup::median;
use crate::temporal::annual_slices;

/// Median/min/max of all annual observations for one `(year, origin, target)`.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct DyadYearBand {
    /// Calendar year.
    pub year: Year,
    /// Origin country.
    pub origin: CountryName,
    /// Target country.
    pub target: CountryName,
    /// Median of the annual observations.
    pub median: f64,
    /// Smallest annual observation.
    pub min: f64,
    /// Largest annual observation.
    pub max: f64,
    /// Number of annual observations.
    pub observation_count: usize,
    /// Event types observed for this dyad-year.
    pub event_types: BTreeSet<EventType>,
    /// Citation ids of the contributing events.
    pub source_ids: BTreeSet<SourceId>,
}

/// One year of one event type's series.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct YearPoint {
    /// Calendar year.
    pub year: Year,
    /// Sum of contributing dyad medians.
    pub value: f64,
    /// Sum of contributing dyad minimums, set only when `has_uncertainty`.
    pub lower: Option<f64>,
    /// Sum of contributing dyad maximums, set only when `has_uncertainty`.
    pub upper: Option<f64>,
    /// At least one contributing dyad had more than one observation.
    pub has_uncertainty: bool,
    /// Citation ids of every event behind the contributing dyad bands.
    pub source_ids: BTreeSet<SourceId>,
}

impl YearPoint {
    fn zero(year: Year) -> Self {
        Self {
            year,
            value: 0.0,
            lower: None,
            upper: None,
            has_uncertainty: false,
            source_ids: BTreeSet::new(),
        }
    }
}

/// Citation marker placed on a non-zero series point.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct CitationMarker {
    /// Series the marker belongs to.
    pub event_type: EventType,
    /// Year of the point.
    pub year: Year,
    /// Point value.
    pub value: f64,
    /// Smallest citation id behind the point.
    pub label: SourceId,
}

/// Output of [`compute_trend`].
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TrendSummary {
    /// Country the trend is scoped to, or `None` for a global trend.
    pub country: Option<CountryName>,
    /// Dense per-type series, one point per window year.
    pub series: BTreeMap<EventType, Vec<YearPoint>>,
    /// Dyad-year bands that fed at least one active series.
    pub dyad_bands: Vec<DyadYearBand>,
    /// Every citation id behind a non-zero point.
    pub cited_source_ids: BTreeSet<SourceId>,
    /// One marker per cited non-zero point.
    pub markers: Vec<CitationMarker>,
}

impl TrendSummary {
    /// Sum of all series values.
    pub fn total(&self) -> f64 {
        self.series
            .values()
            .flatten()
            .map(|point| point.value)
            .sum()
    }
}

#[derive(Default)]
struct DyadAccumulator {
    values: Vec<f64>,
    event_types: BTreeSet<EventType>,
    source_ids: BTreeSet<SourceId>,
}

#[derive(Default)]
struct PointAccumulator {
    value: f64,
    lower: f64,
    upper: f64,
    has_uncertainty: bool,
    source_ids: BTreeSet<SourceId>,
}

/// Build annual series for `country` (or globally when `None`).
pub fn compute_trend(
    events: &[Event],
    country: Option<&str>,
    window: &YearWindow,
    active_types: &ActiveTypes,
) -> Aggregation<TrendSummary> {
    if active_types.is_empty() {
        return Aggregation::Empty(EmptyReason::NoQualifyingEvents);
    }

    let mut dyads: BTreeMap<(Year, &str, &str), DyadAccumulator> = BTreeMap::new();
    for event in events {
        if let Some(country) = country
            && !event.involves(country)
        {
            continue;
        }
        for slice in annual_slices(event, window) {
            if slice.annual_value <= 0.0 {
                continue;
            }
            let dyad = dyads
                .entry((slice.year, event.origin.as_str(), event.target.as_str()))
                .or_default();
            dyad.values.push(slice.annual_value);
            dyad.event_types.insert(event.event_type);
            dyad.source_ids.extend(event.source_ids.iter().cloned());
        }
    }

    let mut points: BTreeMap<(EventType, Year), PointAccumulator> = BTreeMap::new();
    let mut dyad_bands = Vec::new();
    for ((year, origin, target), dyad) in dyads {
        if !dyad.event_types.iter().any(|kind| active_types.contains(*kind)) {
            continue;
        }
        let band = summarize_dyad(year, origin, target, dyad);
        for kind in &band.event_types {
            if !active_types.contains(*kind) {
                continue;
            }
            let point = points.entry((*kind, year)).or_default();
            point.value += band.median;
            point.lower += band.min;
            point.upper += band.max;
            point.has_uncertainty |= band.observation_count > 1;
            point.source_ids.extend(band.source_ids.iter().cloned());
        }
        dyad_bands.push(band);
    }

    if !points.values().any(|point| point.value > 0.0) {
        return Aggregation::Empty(EmptyReason::NoQualifyingEvents);
    }

    let mut series = BTreeMap::new();
    let mut cited_source_ids = BTreeSet::new();
    let mut markers = Vec::new();
    for kind in active_types.iter() {
        let mut line = Vec::new();
        for year in window.years() {
            let point = match points.remove(&(kind, year)) {
                Some(acc) => YearPoint {
                    year,
                    value: acc.value,
                    lower: acc.has_uncertainty.then_some(acc.lower),
                    upper: acc.has_uncertainty.then_some(acc.upper),
                    has_uncertainty: acc.has_uncertainty,
                    source_ids: acc.source_ids,
                },
                None => YearPoint::zero(year),
            };
            if point.value > 0.0 {
                cited_source_ids.extend(point.source_ids.iter().cloned());
                if let Some(label) = point
                    .source_ids
                    .iter()
                    .min_by(|a, b| compare_source_ids(a, b))
                {
                    markers.push(CitationMarker {
                        event_type: kind,
                        year,
                        value: point.value,
                        label: label.clone(),
                    });
                }
            }
            line.push(point);
        }
        series.insert(kind, line);
    }

    debug!(
        country = country.unwrap_or("<global>"),
        start = window.start(),
        end = window.end(),
        bands = dyad_bands.len(),
        citations = cited_source_ids.len(),
        "computed trend"
    );
    Aggregation::Ready(TrendSummary {
        country: country.map(str::to_string),
        series,
        dyad_bands,
        cited_source_ids,
        markers,
    })
}

fn summarize_dyad(year: Year, origin: &str, target: &str, dyad: DyadAccumulator) -> DyadYearBand {
    let min = dyad.values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = dyad.values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    DyadYearBand {
        year,
        origin: origin.to_string(),
        target: target.to_string(),
        median: median(&dyad.values),
        min,
        max,
        observation_count: dyad.values.len(),
        event_types: dyad.event_types,
        source_ids: dyad.source_ids,
    }
}
