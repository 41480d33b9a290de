use std::fs;
use std::path::Path;

use migration_flows::{
    ActiveTypes, Dataset, Direction, EventType, PipelineConfig, PipelineError, Schema,
    SchemaSelection, ViewFilter, YearWindow,
};

fn write_lines(path: &Path, lines: &[&str]) {
    let mut body = lines.join("\n");
    body.push('\n');
    fs::write(path, body).expect("failed writing fixture");
}

fn filter(start: i32, end: i32, types: ActiveTypes) -> ViewFilter {
    ViewFilter::new(YearWindow::new(start, end).expect("valid window"), types)
}

#[test]
fn nigeria_duplicates_collapse_to_median_before_flows() {
    let temp = tempfile::tempdir().expect("failed creating tempdir");
    let events = temp.path().join("annualized_data.csv");
    write_lines(
        &events,
        &[
            "origin_name,target_name,year,event_type,mean_estimate,data_source_id",
            "Nigeria,Ghana,1983,1,100,1",
            "Nigeria,Ghana,1983,1,300,2",
            "Nigeria,Togo,1983,1,50,3",
        ],
    );

    let dataset = Dataset::load(&PipelineConfig::new(&events)).expect("dataset loads");
    assert_eq!(dataset.report().schema, Schema::PointYear);
    assert_eq!(dataset.report().duplicate_groups_collapsed, 1);

    let flows = dataset
        .flows(&filter(1983, 1983, ActiveTypes::only([EventType::Expulsion])))
        .into_ready()
        .expect("flows present");
    assert!((flows.value("Nigeria", "Ghana") - 200.0).abs() < 1e-9);
    assert!((flows.value("Nigeria", "Togo") - 50.0).abs() < 1e-9);
    assert_eq!(flows.nodes, vec!["Ghana", "Nigeria", "Togo"]);
    assert!((flows.total - 250.0).abs() < 1e-9);

    let trend = dataset
        .trend(Some("Ghana"), &filter(1983, 1983, ActiveTypes::all()))
        .into_ready()
        .expect("trend present");
    let band = &trend.dyad_bands[0];
    assert_eq!((band.origin.as_str(), band.target.as_str()), ("Nigeria", "Ghana"));
    assert!((band.median - 200.0).abs() < 1e-9);
    assert_eq!(
        trend.cited_source_ids.iter().collect::<Vec<_>>(),
        vec!["1", "2"]
    );
}

#[test]
fn france_germany_range_event_allocates_one_third() {
    let temp = tempfile::tempdir().expect("failed creating tempdir");
    let events = temp.path().join("range_data.csv");
    write_lines(
        &events,
        &[
            "origin_name,target_name,start_year,end_year,event_type,mean_estimate",
            "France,Germany,1945,1947,2,300",
        ],
    );

    let dataset = Dataset::load(&PipelineConfig::new(&events)).expect("dataset loads");
    assert_eq!(dataset.report().schema, Schema::YearRange);

    let flows = dataset
        .flows(&filter(1946, 1946, ActiveTypes::all()))
        .into_ready()
        .expect("flows present");
    assert!((flows.total - 100.0).abs() < 1e-9);

    let sankey = dataset
        .country_flows("Germany", &filter(1946, 1946, ActiveTypes::all()))
        .into_ready()
        .expect("sankey present");
    assert!((sankey.inflow_total - 100.0).abs() < 1e-9);
    assert!(sankey.outflows.is_empty());
}

#[test]
fn citations_and_country_codes_travel_with_the_dataset() {
    let temp = tempfile::tempdir().expect("failed creating tempdir");
    let events = temp.path().join("events.csv");
    let citations = temp.path().join("citations.csv");
    let codes = temp.path().join("codes.csv");
    write_lines(
        &events,
        &[
            "origin_name,target_name,year,event_type,mean_estimate,data_source_id",
            "Uganda,Kenya,1972,1,27000,10;2",
            "Uganda,United Kingdom,1972,1,28000,NA",
            "Uganda,Uganda,1972,4,500,unknown",
        ],
    );
    write_lines(
        &citations,
        &[
            "data_source_id,year,author,title,link",
            "2,1975,Adams,Expulsion of Asians,example.org/asians",
            "10,1990,Bell,East Africa,n/a",
        ],
    );
    write_lines(&codes, &["name,alpha-2", "Kenya,KE", "Uganda,UG"]);

    let config = PipelineConfig::new(&events)
        .with_citations(&citations)
        .with_country_codes(&codes);
    let dataset = Dataset::load(&config).expect("dataset loads");

    let window = filter(1972, 1972, ActiveTypes::all());
    let trend = dataset
        .trend(Some("Uganda"), &window)
        .into_ready()
        .expect("trend present");
    let bibliography = dataset.bibliography(&trend.cited_source_ids);
    let ids: Vec<&str> = bibliography.entries.iter().map(|c| c.id.as_str()).collect();
    assert_eq!(ids, vec!["2", "10"]);
    assert_eq!(
        bibliography.entries[0].link.as_deref(),
        Some("http://example.org/asians")
    );
    assert_eq!(bibliography.entries[1].link, None);

    assert_eq!(dataset.country_codes().alpha2("Kenya"), "ke");
    assert_eq!(dataset.country_codes().alpha2("United Kingdom"), "xx");

    let sankey = dataset
        .country_flows("Uganda", &window)
        .into_ready()
        .expect("sankey present");
    assert!((sankey.outflow_total - 55000.0).abs() < 1e-9);
    assert_eq!(sankey.outflows[0].country, "United Kingdom");

    let chord = dataset.flows(&window).into_ready().expect("flows present");
    assert!((chord.total - 55500.0).abs() < 1e-9);

    let neighbours = dataset.counterparts("Kenya", "Uganda", Direction::Inbound, &window);
    assert!(neighbours.is_empty());
}

#[test]
fn forced_schema_mismatch_is_a_configuration_error() {
    let temp = tempfile::tempdir().expect("failed creating tempdir");
    let events = temp.path().join("events.csv");
    write_lines(
        &events,
        &[
            "origin_name,target_name,year,event_type,mean_estimate",
            "Nigeria,Ghana,1983,1,100",
        ],
    );
    let config = PipelineConfig::new(&events).with_schema(SchemaSelection::YearRange);
    let err = Dataset::load(&config).expect_err("schema mismatch");
    assert!(matches!(err, PipelineError::Configuration(_)));
}

#[test]
fn header_only_table_is_an_empty_dataset() {
    let temp = tempfile::tempdir().expect("failed creating tempdir");
    let events = temp.path().join("events.csv");
    write_lines(
        &events,
        &["origin_name,target_name,year,event_type,mean_estimate"],
    );
    let err = Dataset::load(&PipelineConfig::new(&events)).expect_err("empty dataset");
    assert!(matches!(err, PipelineError::EmptyDataset { rows_read: 0, .. }));
}

#[test]
fn missing_events_file_is_unavailable() {
    let temp = tempfile::tempdir().expect("failed creating tempdir");
    let err = Dataset::load(&PipelineConfig::new(temp.path().join("missing.csv")))
        .expect_err("missing file");
    assert!(matches!(err, PipelineError::SourceUnavailable { .. }));
}

#[test]
fn extreme_year_range_row_loads_and_aggregates() {
    let temp = tempfile::tempdir().expect("failed creating tempdir");
    let events = temp.path().join("range_data.csv");
    write_lines(
        &events,
        &[
            "origin_name,target_name,start_year,end_year,event_type,mean_estimate",
            "France,Germany,-2147483648,2147483647,1,300",
            "France,Germany,1945,1947,1,300",
        ],
    );
    let dataset = Dataset::load(&PipelineConfig::new(&events)).expect("dataset loads");
    let window = filter(1950, 2025, ActiveTypes::all());

    let flows = dataset.flows(&window).into_ready().expect("flows present");
    assert!(flows.total.is_finite());
    assert!(flows.total > 0.0 && flows.total < 1e-3);

    let sankey = dataset
        .country_flows("Germany", &window)
        .into_ready()
        .expect("sankey present");
    assert!(sankey.inflow_total.is_finite());

    let trend = dataset
        .trend(Some("France"), &window)
        .into_ready()
        .expect("trend present");
    assert!(trend.total().is_finite());
}
