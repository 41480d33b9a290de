//! Inbound/outbound split for a single country (Sankey feed).

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;
use tracing::debug;

use crate::data::{
    ActiveTypes, Aggregation, CountryName, EmptyReason, Event, EventType, SourceId, Year,
    YearWindow,
};
use crate::temporal::window_share;

/// Which side of the selected node a breakdown follows.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    /// Flows arriving at the node, grouped by origin.
    Inbound,
    /// Flows leaving the node, grouped by target.
    Outbound,
}

/// Flow between the selected country and one counterpart.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct CounterpartFlow {
    /// Counterpart country.
    pub country: CountryName,
    /// Sum of proportional contributions.
    pub value: f64,
    /// Window years overlapped by contributing events.
    pub years: BTreeSet<Year>,
    /// Event types of contributing events.
    pub event_types: BTreeSet<EventType>,
    /// Citation ids of contributing events.
    pub source_ids: BTreeSet<SourceId>,
    /// Number of contributing events.
    pub event_count: usize,
}

/// Output of [`compute_country_flows`].
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct CountryFlows {
    /// Selected country.
    pub country: CountryName,
    /// Flows into the country by origin, largest first.
    pub inflows: Vec<CounterpartFlow>,
    /// Flows out of the country by target, largest first.
    pub outflows: Vec<CounterpartFlow>,
    /// Sum of `inflows`.
    pub inflow_total: f64,
    /// Sum of `outflows`.
    pub outflow_total: f64,
}

/// Split `country`'s in-window, active-typed events into inflows and
/// outflows. Self-loops are excluded.
pub fn compute_country_flows(
    events: &[Event],
    country: &str,
    window: &YearWindow,
    active_types: &ActiveTypes,
) -> Aggregation<CountryFlows> {
    let inflows = group_counterparts(events, window, active_types, |event| {
        (event.target == country).then_some(event.origin.as_str())
    });
    let outflows = group_counterparts(events, window, active_types, |event| {
        (event.origin == country).then_some(event.target.as_str())
    });
    if inflows.is_empty() && outflows.is_empty() {
        return Aggregation::Empty(EmptyReason::NoQualifyingEvents);
    }
    let inflow_total: f64 = inflows.iter().map(|flow| flow.value).sum();
    let outflow_total: f64 = outflows.iter().map(|flow| flow.value).sum();
    if inflow_total + outflow_total <= 0.0 {
        return Aggregation::Empty(EmptyReason::ZeroTotal);
    }
    debug!(
        country,
        inflows = inflows.len(),
        outflows = outflows.len(),
        inflow_total,
        outflow_total,
        "computed country flows"
    );
    Aggregation::Ready(CountryFlows {
        country: country.to_string(),
        inflows,
        outflows,
        inflow_total,
        outflow_total,
    })
}

/// Largest `limit` counterparts of `node` in `direction`, leaving out
/// `excluding` (normally the selected country) and self-loops.
pub fn counterpart_breakdown(
    events: &[Event],
    node: &str,
    excluding: &str,
    direction: Direction,
    window: &YearWindow,
    active_types: &ActiveTypes,
    limit: usize,
) -> Vec<CounterpartFlow> {
    let mut flows = group_counterparts(events, window, active_types, |event| {
        let counterpart = match direction {
            Direction::Inbound => (event.target == node).then_some(event.origin.as_str()),
            Direction::Outbound => (event.origin == node).then_some(event.target.as_str()),
        }?;
        (counterpart != excluding).then_some(counterpart)
    });
    flows.truncate(limit);
    flows
}

fn group_counterparts<'e>(
    events: &'e [Event],
    window: &YearWindow,
    active_types: &ActiveTypes,
    counterpart_of: impl Fn(&'e Event) -> Option<&'e str>,
) -> Vec<CounterpartFlow> {
    let mut grouped: BTreeMap<&str, CounterpartFlow> = BTreeMap::new();
    for event in events {
        if event.is_self_loop() || !active_types.contains(event.event_type) {
            continue;
        }
        let Some(counterpart) = counterpart_of(event) else {
            continue;
        };
        let Some(share) = window_share(event, window) else {
            continue;
        };
        if share.value <= 0.0 {
            continue;
        }
        let flow = grouped
            .entry(counterpart)
            .or_insert_with(|| CounterpartFlow {
                country: counterpart.to_string(),
                value: 0.0,
                years: BTreeSet::new(),
                event_types: BTreeSet::new(),
                source_ids: BTreeSet::new(),
                event_count: 0,
            });
        flow.value += share.value;
        flow.years.extend(share.overlap.years());
        flow.event_types.insert(event.event_type);
        flow.source_ids.extend(event.source_ids.iter().cloned());
        flow.event_count += 1;
    }
    let mut flows: Vec<CounterpartFlow> = grouped.into_values().collect();
    flows.sort_by(|a, b| {
        b.value
            .total_cmp(&a.value)
            .then_with(|| a.country.cmp(&b.country))
    });
    flows
}
