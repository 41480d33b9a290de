//! Median helper and ingestion-time duplicate collapsing.

use indexmap::IndexMap;
use serde::Serialize;
use tracing::debug;

use crate::data::{Event, GroupKey};

/// Standard median: sorted ascending, even counts average the two middle
/// values, empty input yields `0.0`.
pub fn median(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    }
}

/// Audit trail for one collapsed duplicate group.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct DuplicateAudit {
    /// Shared group key.
    pub key: GroupKey,
    /// Number of raw observations collapsed.
    pub observation_count: usize,
    /// Original magnitudes in input order.
    pub magnitudes: Vec<f64>,
    /// Representative magnitude written to the canonical event.
    pub median: f64,
}

impl DuplicateAudit {
    /// Human-readable note, e.g. `Median of 2 events. Original values: 100, 300`.
    pub fn note(&self) -> String {
        let values: Vec<String> = self.magnitudes.iter().map(f64::to_string).collect();
        format!(
            "Median of {} events. Original values: {}",
            self.observation_count,
            values.join(", ")
        )
    }
}

/// Output of [`collapse_duplicates`].
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CollapseOutcome {
    /// One event per distinct group key, in first-seen order.
    pub events: Vec<Event>,
    /// One audit entry per group that had more than one member.
    pub audits: Vec<DuplicateAudit>,
}

/// Collapse events sharing a [`GroupKey`] into one representative each.
///
/// Singleton groups pass through unchanged. Larger groups keep the first
/// member's fields, take the median magnitude and union all citation ids.
pub fn collapse_duplicates(events: Vec<Event>) -> CollapseOutcome {
    let mut groups: IndexMap<GroupKey, Vec<Event>> = IndexMap::new();
    for event in events {
        groups.entry(event.group_key()).or_default().push(event);
    }

    let mut outcome = CollapseOutcome::default();
    for (key, members) in groups {
        let mut members = members.into_iter();
        let Some(mut representative) = members.next() else {
            continue;
        };
        let rest: Vec<Event> = members.collect();
        if rest.is_empty() {
            outcome.events.push(representative);
            continue;
        }

        let magnitudes: Vec<f64> = std::iter::once(representative.magnitude)
            .chain(rest.iter().map(|event| event.magnitude))
            .collect();
        let collapsed = median(&magnitudes);
        for member in rest {
            representative.source_ids.extend(member.source_ids);
        }
        representative.magnitude = collapsed;

        debug!(
            origin = %key.origin,
            target = %key.target,
            year = key.year,
            observations = magnitudes.len(),
            median = collapsed,
            "collapsed duplicate group"
        );
        outcome.audits.push(DuplicateAudit {
            observation_count: magnitudes.len(),
            key,
            magnitudes,
            median: collapsed,
        });
        outcome.events.push(representative);
    }
    outcome
}
