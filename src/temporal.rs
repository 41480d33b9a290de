//! Temporal allocation of event magnitudes onto a year window.
//!
//! Every canonical event carries a total magnitude over an inclusive span.
//! Point-year rows have a one-year span, so the proportional rule below
//! reduces to a membership test for them and a single algorithm serves all
//! views.

use serde::Serialize;

use crate::data::{Event, Year, YearSpan, YearWindow};

/// Share of an event that falls inside a window.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct WindowShare {
    /// Years shared by the event span and the window.
    pub overlap: YearSpan,
    /// `magnitude * overlap_years / span_years`.
    pub value: f64,
}

/// One year's even share of an event.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct AllocatedYearSlice {
    /// Calendar year of the slice.
    pub year: Year,
    /// `magnitude / span_years`.
    pub annual_value: f64,
}

/// Fraction of `span` covered by `window`, in `[0, 1]`.
pub fn overlap_share(span: YearSpan, window: &YearWindow) -> f64 {
    match window.overlap(span) {
        Some(overlap) => overlap.duration() as f64 / span.duration() as f64,
        None => 0.0,
    }
}

/// Proportional contribution of `event` to `window`, or `None` when the span
/// and the window are disjoint.
pub fn window_share(event: &Event, window: &YearWindow) -> Option<WindowShare> {
    let overlap = window.overlap(event.span)?;
    let value =
        event.magnitude * overlap.duration() as f64 / event.span.duration() as f64;
    Some(WindowShare { overlap, value })
}

/// Per-year slices of `event` inside `window`, ascending by year.
pub fn annual_slices(
    event: &Event,
    window: &YearWindow,
) -> impl Iterator<Item = AllocatedYearSlice> + use<> {
    let annual_value = event.magnitude / event.span.duration() as f64;
    let years = window
        .overlap(event.span)
        .map(|overlap| overlap.start..=overlap.end);
    years
        .into_iter()
        .flatten()
        .map(move |year| AllocatedYearSlice { year, annual_value })
}
