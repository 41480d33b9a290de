use std::collections::BTreeMap;

use serde::Serialize;

use crate::data::{Event, EventType};

/// Aggregate balance metrics for per-event-type counts.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TypeBreakdown {
    /// Events counted.
    pub total: usize,
    /// Distinct event types present.
    pub types: usize,
    /// Smallest per-type count.
    pub min: usize,
    /// Largest per-type count.
    pub max: usize,
    /// `max / total`.
    pub max_share: f64,
    /// Sum of all magnitudes.
    pub total_magnitude: f64,
    /// Present types, most frequent first.
    pub per_type: Vec<TypeShare>,
}

/// Per-type share of the canonical event set.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TypeShare {
    /// Event type.
    pub event_type: EventType,
    /// Events of this type.
    pub count: usize,
    /// `count / total`.
    pub share: f64,
    /// Sum of magnitudes of this type.
    pub magnitude: f64,
}

/// Compute per-type counts, shares and magnitudes.
/// Only types present in `events` are listed.
pub fn type_breakdown(events: &[Event]) -> Option<TypeBreakdown> {
    if events.is_empty() {
        return None;
    }
    let mut counts: BTreeMap<EventType, (usize, f64)> = BTreeMap::new();
    for event in events {
        let entry = counts.entry(event.event_type).or_insert((0, 0.0));
        entry.0 += 1;
        entry.1 += event.magnitude;
    }
    let total = events.len();
    let min = counts.values().map(|(count, _)| *count).min().unwrap_or(0);
    let max = counts.values().map(|(count, _)| *count).max().unwrap_or(0);
    let total_magnitude: f64 = counts.values().map(|(_, magnitude)| *magnitude).sum();
    let mut per_type: Vec<TypeShare> = counts
        .iter()
        .map(|(event_type, (count, magnitude))| TypeShare {
            event_type: *event_type,
            count: *count,
            share: *count as f64 / total as f64,
            magnitude: *magnitude,
        })
        .collect();
    per_type.sort_by(|a, b| {
        b.count
            .cmp(&a.count)
            .then_with(|| a.event_type.cmp(&b.event_type))
    });
    Some(TypeBreakdown {
        total,
        types: counts.len(),
        min,
        max,
        max_share: max as f64 / total as f64,
        total_magnitude,
        per_type,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::YearSpan;

    fn event(kind: EventType, magnitude: f64) -> Event {
        Event::new("A", "B", YearSpan::point(2000), magnitude, kind)
    }

    #[test]
    fn type_breakdown_reports_balance() {
        let events = vec![event(EventType::Expulsion, 1.0), event(EventType::Escape, 3.0)];
        let breakdown = type_breakdown(&events).expect("breakdown");
        assert_eq!(breakdown.total, 2);
        assert_eq!(breakdown.types, 2);
        assert!((breakdown.max_share - 0.5).abs() < 1e-6);
        assert!((breakdown.total_magnitude - 4.0).abs() < 1e-6);
        assert_eq!(breakdown.per_type[0].event_type, EventType::Expulsion);
        assert!(
            breakdown
                .per_type
                .iter()
                .all(|entry| (entry.share - 0.5).abs() < 1e-6)
        );
    }

    #[test]
    fn type_breakdown_orders_by_count() {
        let events = vec![
            event(EventType::Deportation, 1.0),
            event(EventType::Escape, 1.0),
            event(EventType::Escape, 1.0),
        ];
        let breakdown = type_breakdown(&events).expect("breakdown");
        assert_eq!(breakdown.min, 1);
        assert_eq!(breakdown.max, 2);
        assert_eq!(breakdown.per_type[0].event_type, EventType::Escape);
        assert_eq!(breakdown.per_type[0].count, 2);
        assert!(type_breakdown(&[]).is_none());
    }
}
