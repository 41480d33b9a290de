//! Directed country-pair flows for the chord view.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;
use tracing::debug;

use crate::data::{ActiveTypes, Aggregation, CountryName, EmptyReason, Event, Year, YearWindow};
use crate::temporal::window_share;

/// Aggregate flow from one country to another inside a window.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct DirectedFlow {
    /// Source country.
    pub origin: CountryName,
    /// Destination country.
    pub target: CountryName,
    /// Sum of proportional contributions.
    pub value: f64,
    /// Window years overlapped by contributing events.
    pub years: BTreeSet<Year>,
    /// Number of contributing events.
    pub event_count: usize,
}

/// Output of [`compute_flows`].
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct FlowSummary {
    /// Flows sorted by `(origin, target)`.
    pub flows: Vec<DirectedFlow>,
    /// Every country appearing in `flows`, sorted ascending.
    pub nodes: Vec<CountryName>,
    /// Sum of all flow values; always positive.
    pub total: f64,
}

impl FlowSummary {
    /// Value of the `origin -> target` flow, or `0.0`.
    pub fn value(&self, origin: &str, target: &str) -> f64 {
        self.flows
            .iter()
            .find(|flow| flow.origin == origin && flow.target == target)
            .map_or(0.0, |flow| flow.value)
    }

    /// Square matrix over `nodes` for chord layout.
    pub fn matrix(&self) -> ChordMatrix {
        ChordMatrix::from_flows(self)
    }
}

/// Sum proportional window contributions into directed flows.
///
/// Self-loops are kept (they land on the chord diagonal). Returns
/// [`Aggregation::Empty`] when nothing qualifies or the total is zero.
pub fn compute_flows(
    events: &[Event],
    window: &YearWindow,
    active_types: &ActiveTypes,
) -> Aggregation<FlowSummary> {
    let mut accumulated: BTreeMap<(&str, &str), DirectedFlow> = BTreeMap::new();
    let mut qualifying = 0usize;

    for event in events {
        if !active_types.contains(event.event_type)
            || event.origin.is_empty()
            || event.target.is_empty()
        {
            continue;
        }
        let Some(share) = window_share(event, window) else {
            continue;
        };
        if share.value <= 0.0 {
            continue;
        }
        qualifying += 1;
        let flow = accumulated
            .entry((event.origin.as_str(), event.target.as_str()))
            .or_insert_with(|| DirectedFlow {
                origin: event.origin.clone(),
                target: event.target.clone(),
                value: 0.0,
                years: BTreeSet::new(),
                event_count: 0,
            });
        flow.value += share.value;
        flow.years.extend(share.overlap.years());
        flow.event_count += 1;
    }

    if qualifying == 0 {
        return Aggregation::Empty(EmptyReason::NoQualifyingEvents);
    }

    let flows: Vec<DirectedFlow> = accumulated.into_values().collect();
    let total: f64 = flows.iter().map(|flow| flow.value).sum();
    if total <= 0.0 {
        return Aggregation::Empty(EmptyReason::ZeroTotal);
    }
    let nodes: BTreeSet<&CountryName> = flows
        .iter()
        .flat_map(|flow| [&flow.origin, &flow.target])
        .collect();
    let nodes: Vec<CountryName> = nodes.into_iter().cloned().collect();

    debug!(
        start = window.start(),
        end = window.end(),
        flows = flows.len(),
        nodes = nodes.len(),
        total,
        "computed flows"
    );
    Aggregation::Ready(FlowSummary {
        flows,
        nodes,
        total,
    })
}

/// Square flow matrix over lexicographically sorted nodes.
///
/// `values[i][j]` is the flow from `nodes[i]` to `nodes[j]`.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ChordMatrix {
    /// Row/column labels.
    pub nodes: Vec<CountryName>,
    /// Row-major flow values.
    pub values: Vec<Vec<f64>>,
}

impl ChordMatrix {
    /// Build the matrix for a flow summary.
    pub fn from_flows(summary: &FlowSummary) -> Self {
        let index: BTreeMap<&str, usize> = summary
            .nodes
            .iter()
            .enumerate()
            .map(|(idx, node)| (node.as_str(), idx))
            .collect();
        let size = summary.nodes.len();
        let mut values = vec![vec![0.0; size]; size];
        for flow in &summary.flows {
            if let (Some(&row), Some(&col)) = (
                index.get(flow.origin.as_str()),
                index.get(flow.target.as_str()),
            ) {
                values[row][col] += flow.value;
            }
        }
        Self {
            nodes: summary.nodes.clone(),
            values,
        }
    }

    /// Total outgoing value of row `idx`.
    pub fn row_total(&self, idx: usize) -> f64 {
        self.values.get(idx).map_or(0.0, |row| row.iter().sum())
    }
}
