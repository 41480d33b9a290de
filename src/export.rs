//! JSON hand-off of view payloads to renderers.

use std::fs;
use std::path::Path;

use serde::Serialize;
use serde_json::json;
use tracing::info;

use crate::citations::Bibliography;
use crate::color::{ColorAssignment, SessionColorAssignment};
use crate::constants::export::{CHORD_FILE, INDEX_FILE, INDEX_VERSION, SANKEY_FILE, TREND_FILE};
use crate::data::{Aggregation, CountryName, ViewFilter};
use crate::dataset::Dataset;
use crate::errors::PipelineError;
use crate::flows::{ChordMatrix, FlowSummary};
use crate::sankey::CountryFlows;
use crate::trend::TrendSummary;
use crate::types::ColorValue;

/// Renderer metadata for one node.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct NodeStyle {
    /// Country name.
    pub node: CountryName,
    /// Assigned color.
    pub color: ColorValue,
    /// Lower-case ISO alpha-2 code, `xx` when unknown.
    pub alpha2: String,
}

#[derive(Serialize)]
struct ChordPayload<'a> {
    filter: &'a ViewFilter,
    flows: Aggregation<FlowSummary>,
    matrix: Option<ChordMatrix>,
    nodes: Vec<NodeStyle>,
}

#[derive(Serialize)]
struct TrendPayload<'a> {
    filter: &'a ViewFilter,
    trend: Aggregation<TrendSummary>,
    bibliography: Bibliography,
}

#[derive(Serialize)]
struct SankeyPayload<'a> {
    filter: &'a ViewFilter,
    flows: Aggregation<CountryFlows>,
    nodes: Vec<NodeStyle>,
}

/// Write the view payloads for `filter` into `dir` with a fresh color session.
///
/// Returns the names of the files written, manifest last.
pub fn write_views(
    dir: &Path,
    dataset: &Dataset,
    filter: &ViewFilter,
    country: Option<&str>,
) -> Result<Vec<String>, PipelineError> {
    let mut colors = SessionColorAssignment::new();
    write_views_with_colors(dir, dataset, filter, country, &mut colors)
}

/// Write the view payloads using a caller-owned color assignment.
///
/// The Sankey payload is written only when `country` is set.
pub fn write_views_with_colors(
    dir: &Path,
    dataset: &Dataset,
    filter: &ViewFilter,
    country: Option<&str>,
    colors: &mut dyn ColorAssignment,
) -> Result<Vec<String>, PipelineError> {
    fs::create_dir_all(dir)?;
    let mut files = Vec::new();

    let flows = dataset.flows(filter);
    let matrix = flows.as_ready().map(FlowSummary::matrix);
    let chord_nodes = flows
        .as_ready()
        .map(|summary| node_styles(dataset, &mut *colors, summary.nodes.iter()))
        .unwrap_or_default();
    let chord_empty = flows.is_empty();
    write_json(
        dir.join(CHORD_FILE),
        &ChordPayload {
            filter,
            flows,
            matrix,
            nodes: chord_nodes,
        },
    )?;
    files.push(CHORD_FILE.to_string());

    let trend = dataset.trend(country, filter);
    let bibliography = trend
        .as_ready()
        .map(|summary| dataset.bibliography(&summary.cited_source_ids))
        .unwrap_or_default();
    let trend_empty = trend.is_empty();
    write_json(
        dir.join(TREND_FILE),
        &TrendPayload {
            filter,
            trend,
            bibliography,
        },
    )?;
    files.push(TREND_FILE.to_string());

    let mut sankey_empty = None;
    if let Some(country) = country {
        let flows = dataset.country_flows(country, filter);
        let nodes = flows
            .as_ready()
            .map(|split| {
                let names = std::iter::once(&split.country)
                    .chain(split.inflows.iter().map(|flow| &flow.country))
                    .chain(split.outflows.iter().map(|flow| &flow.country));
                node_styles(dataset, &mut *colors, names)
            })
            .unwrap_or_default();
        sankey_empty = Some(flows.is_empty());
        write_json(dir.join(SANKEY_FILE), &SankeyPayload { filter, flows, nodes })?;
        files.push(SANKEY_FILE.to_string());
    }

    let index = json!({
        "version": INDEX_VERSION,
        "generated_at": chrono::Utc::now().to_rfc3339(),
        "window": { "start": filter.window.start(), "end": filter.window.end() },
        "country": country,
        "canonical_events": dataset.report().canonical_events,
        "empty": {
            "chord": chord_empty,
            "trend": trend_empty,
            "sankey": sankey_empty,
        },
        "files": files,
    });
    write_json(dir.join(INDEX_FILE), &index)?;
    files.push(INDEX_FILE.to_string());

    info!(dir = %dir.display(), files = files.len(), "wrote view payloads");
    Ok(files)
}

fn node_styles<'a>(
    dataset: &Dataset,
    colors: &mut dyn ColorAssignment,
    nodes: impl Iterator<Item = &'a CountryName>,
) -> Vec<NodeStyle> {
    nodes
        .map(|node| NodeStyle {
            node: node.clone(),
            color: colors.color_for(node),
            alpha2: dataset.country_codes().alpha2(node).to_string(),
        })
        .collect()
}

fn write_json<P: AsRef<Path>, T: ?Sized + Serialize>(
    path: P,
    value: &T,
) -> Result<(), PipelineError> {
    fs::write(path, serde_json::to_vec_pretty(value)?)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PipelineConfig;
    use crate::data::YearWindow;
    use crate::source::InMemoryRowSource;
    use tempfile::tempdir;

    fn dataset() -> Dataset {
        let events = InMemoryRowSource::new(
            "events",
            ["origin_name", "target_name", "year", "event_type", "mean_estimate"],
        )
        .with_row(["Nigeria", "Ghana", "1983", "1", "200"])
        .with_row(["Nigeria", "Togo", "1983", "1", "50"]);
        let codes = InMemoryRowSource::new("codes", ["name", "alpha-2"]).with_row(["Ghana", "GH"]);
        Dataset::from_sources(&events, None, Some(&codes), &PipelineConfig::new("unused.csv"))
            .unwrap()
    }

    #[test]
    fn writes_all_payloads_and_manifest() {
        let dir = tempdir().unwrap();
        let filter = ViewFilter::new(YearWindow::single(1983), Default::default());
        let files = write_views(dir.path(), &dataset(), &filter, Some("Nigeria")).unwrap();
        assert_eq!(files, vec![CHORD_FILE, TREND_FILE, SANKEY_FILE, INDEX_FILE]);

        let chord: serde_json::Value =
            serde_json::from_slice(&fs::read(dir.path().join(CHORD_FILE)).unwrap()).unwrap();
        assert_eq!(chord["flows"]["status"], "ready");
        assert_eq!(chord["matrix"]["nodes"][0], "Ghana");
        assert_eq!(chord["nodes"][0]["alpha2"], "gh");
        assert_eq!(chord["nodes"][1]["alpha2"], "xx");

        let index: serde_json::Value =
            serde_json::from_slice(&fs::read(dir.path().join(INDEX_FILE)).unwrap()).unwrap();
        assert_eq!(index["version"], INDEX_VERSION);
        assert_eq!(index["files"].as_array().unwrap().len(), 3);
    }

    #[test]
    fn empty_views_are_written_with_status() {
        let dir = tempdir().unwrap();
        let filter = ViewFilter::new(YearWindow::single(1990), Default::default());
        let files = write_views(dir.path(), &dataset(), &filter, None).unwrap();
        assert_eq!(files.len(), 3);
        let chord: serde_json::Value =
            serde_json::from_slice(&fs::read(dir.path().join(CHORD_FILE)).unwrap()).unwrap();
        assert_eq!(chord["flows"]["status"], "empty");
        assert_eq!(chord["flows"]["data"], "no_qualifying_events");
        assert!(chord["matrix"].is_null());
        assert!(!dir.path().join(SANKEY_FILE).exists());
    }
}
