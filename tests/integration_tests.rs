use chartsmith::config::ChartConfiguration;
use chartsmith::data::{discover_fields, FieldType, RawDataResponse, RawRecord, RowSet};
use chartsmith::ir::{AxisSide, ChartRow, OverlayPosition};
use chartsmith::mapping::{ChartKind, FieldMapping};
use chartsmith::runtime;
use chartsmith::transform::aggregate;
use std::fs;
use std::path::Path;
use std::process::Command;

fn load_rows(path: &str) -> RowSet {
    let text = fs::read_to_string(path).expect("Failed to read test data");
    RowSet::from_json_str(&text).expect("Failed to parse test data")
}

fn load_config(path: &str) -> ChartConfiguration {
    ChartConfiguration::load(Path::new(path)).expect("Failed to load test config")
}

fn keys<'a>(data: &'a [ChartRow], field: &str) -> Vec<&'a str> {
    data.iter().filter_map(|row| row.text(field)).collect()
}

fn numbers(data: &[ChartRow], field: &str) -> Vec<Option<f64>> {
    data.iter().map(|row| row.number(field)).collect()
}

/// Run the chartsmith binary with the given arguments
fn run_chartsmith(args: &[&str]) -> Result<Vec<u8>, String> {
    let output = Command::new(env!("CARGO_BIN_EXE_chartsmith"))
        .args(args)
        .output()
        .map_err(|e| format!("Failed to spawn process: {}", e))?;

    if output.status.success() {
        Ok(output.stdout)
    } else {
        Err(String::from_utf8_lossy(&output.stderr).to_string())
    }
}

/// Check if bytes are a valid PNG
fn is_valid_png(bytes: &[u8]) -> bool {
    bytes.len() > 8 && bytes[0..8] == [137, 80, 78, 71, 13, 10, 26, 10]
}

#[test]
fn test_bar_chart_groups_in_first_seen_order() {
    let spec = runtime::build_chart(&load_config("test/bar_config.json"), &load_rows("test/teams.json"));

    assert_eq!(spec.kind, ChartKind::Bar);
    assert_eq!(spec.title, "All Team Size by Team Name");
    assert_eq!(spec.x_key.as_deref(), Some("team_name"));
    assert_eq!(keys(&spec.data, "team_name"), vec!["Core", "Mobile", "Data"]);
    assert_eq!(numbers(&spec.data, "all_team_size"), vec![Some(15.0), Some(9.0), Some(6.0)]);
    assert_eq!(numbers(&spec.data, "count"), vec![Some(2.0), Some(2.0), Some(1.0)]);
    assert_eq!(spec.series.len(), 1);
    assert_eq!(spec.series[0].label, "All Team Size");
    assert_eq!(spec.series[0].color, "#3b82f6");
}

#[test]
fn test_year_and_month_columns_make_any_x_temporal() {
    let spec = runtime::build_chart(&load_config("test/bar_config.json"), &load_rows("test/team_sizes.json"));

    assert_eq!(spec.x_key.as_deref(), Some("team_name"));
    assert_eq!(keys(&spec.data, "team_name"), vec!["Dec/2023", "Jan/2024", "Feb/2024"]);
    assert_eq!(numbers(&spec.data, "all_team_size"), vec![Some(4.0), Some(12.0), Some(14.0)]);
}

#[test]
fn test_line_chart_filters_then_sorts_months() {
    let spec = runtime::build_chart(&load_config("test/line_config.json"), &load_rows("test/team_sizes.json"));

    assert_eq!(spec.title, "Burn (Core + Mobile)");
    assert_eq!(spec.x_axis_label.as_deref(), Some("Month"));
    assert_eq!(keys(&spec.data, "month"), vec!["Dec/2023", "Jan/2024", "Feb/2024"]);
    // the null burn value counts as zero
    assert_eq!(numbers(&spec.data, "burn_team_size"), vec![Some(0.0), Some(3.0), Some(3.0)]);
    assert_eq!(numbers(&spec.data, "count"), vec![Some(1.0), Some(2.0), Some(1.0)]);
}

#[test]
fn test_composed_chart_merges_both_series() {
    let spec = runtime::build_chart(&load_config("test/composed_config.json"), &load_rows("test/team_sizes.json"));

    assert!(spec.is_composed());
    assert_eq!(spec.secondary_kind, Some(ChartKind::Line));
    assert_eq!(spec.title, "All Team Size & Burn Team Size");
    assert_eq!(keys(&spec.data, "month"), vec!["Dec/2023", "Jan/2024", "Feb/2024"]);
    assert_eq!(numbers(&spec.data, "all_team_size"), vec![Some(4.0), Some(12.0), Some(14.0)]);
    assert_eq!(numbers(&spec.data, "burn_team_size"), vec![Some(0.0), Some(3.0), Some(7.0)]);

    assert_eq!(spec.series[0].axis, AxisSide::Left);
    assert_eq!(spec.series[0].color, "#111111");
    assert_eq!(spec.series[1].axis, AxisSide::Right);
    assert_eq!(spec.series[1].color, "#222222");
}

#[test]
fn test_composed_key_missing_on_one_side_is_absent() {
    let mut config = load_config("test/composed_config.json");
    config.data_fields.primary_x = Some("team_name".to_string());
    config.data_fields.secondary_x = Some("project_key".to_string());
    let rows = RowSet::new(vec![
        RawRecord::new().with("team_name", "Core").with("all_team_size", 4),
        RawRecord::new().with("project_key", "MOB").with("burn_team_size", 2),
    ]);

    let spec = runtime::build_chart(&config, &rows);
    assert_eq!(spec.x_key.as_deref(), Some("team_name"));
    // each side sees the other's row under the "Unknown" key
    assert_eq!(keys(&spec.data, "team_name"), vec!["Core", "Unknown", "MOB"]);
    assert_eq!(numbers(&spec.data, "all_team_size"), vec![Some(4.0), Some(0.0), None]);
    assert_eq!(numbers(&spec.data, "burn_team_size"), vec![None, Some(0.0), Some(2.0)]);
}

#[test]
fn test_pie_chart_with_inset_overlay() {
    let output = runtime::build(&load_config("test/pie_config.json"), &load_rows("test/teams.json"));

    let pie = &output.chart;
    assert_eq!(pie.kind, ChartKind::Pie);
    assert_eq!(pie.title, "All Team Size Distribution");
    assert!(!pie.show_legend);
    assert_eq!(keys(&pie.data, "name"), vec!["Core", "Mobile", "Data"]);
    assert_eq!(numbers(&pie.data, "value"), vec![Some(15.0), Some(9.0), Some(6.0)]);
    assert_eq!(pie.slice_colors, vec!["#3b82f6", "#10b981", "#f59e0b"]);

    let inset = output.overlay.expect("overlay should be built");
    assert_eq!(inset.position, OverlayPosition::TopLeft);
    assert_eq!((inset.width, inset.height), (200, 150));
    assert_eq!(inset.spec.kind, ChartKind::Bar);
    assert_eq!(inset.spec.title, "Burn Team Size by Project Key");
    assert_eq!(keys(&inset.spec.data, "project_key"), vec!["CORE", "MOB", "DATA"]);
    assert_eq!(numbers(&inset.spec.data, "burn_team_size"), vec![Some(5.0), Some(1.0), Some(4.0)]);
}

#[test]
fn test_api_response_pages() {
    let text = fs::read_to_string("test/api_response.json").unwrap();
    let response = RawDataResponse::from_json_str(&text).unwrap();
    assert_eq!(response.page_count(), 3);

    let rows = response.into_rows();
    assert_eq!(rows.len(), 2);
    assert_eq!(RowSet::from_json_str(&text).unwrap(), rows);
}

#[test]
fn test_csv_data_source() {
    let file = fs::File::open("test/sales.csv").unwrap();
    let rows = RowSet::from_csv(file).unwrap();
    assert_eq!(rows.len(), 4);

    let data = aggregate(&rows, &FieldMapping::xy("region", "sales"), ChartKind::Bar);
    assert_eq!(keys(&data, "region"), vec!["North", "South", "East"]);
    assert_eq!(numbers(&data, "sales"), vec![Some(220.0), Some(80.0), Some(0.0)]);
}

#[test]
fn test_field_discovery() {
    let fields = discover_fields(&load_rows("test/team_sizes.json"));
    let ids: Vec<&str> = fields.iter().map(|f| f.id.as_str()).collect();
    assert_eq!(
        ids,
        vec!["all_team_size", "burn_team_size", "month", "project_key", "team_name", "year"]
    );
    assert_eq!(fields[0].name, "All Team Size");
    assert_eq!(fields[0].field_type, FieldType::Number);
    assert_eq!(fields[3].field_type, FieldType::String);
}

#[test]
fn test_exported_config_reproduces_the_same_chart() {
    let rows = load_rows("test/team_sizes.json");
    let teams = load_rows("test/teams.json");
    for path in [
        "test/bar_config.json",
        "test/line_config.json",
        "test/composed_config.json",
        "test/pie_config.json",
    ] {
        let config = load_config(path);
        let exported = config.to_json_string().unwrap();
        let imported = ChartConfiguration::from_json_str(&exported).unwrap();
        assert_eq!(runtime::build(&config, &rows), runtime::build(&imported, &rows), "{}", path);
        assert_eq!(runtime::build(&config, &teams), runtime::build(&imported, &teams), "{}", path);
    }
}

#[test]
fn test_aggregation_preserves_totals() {
    let rows = load_rows("test/teams.json");
    let data = aggregate(&rows, &FieldMapping::xy("team_name", "all_team_size"), ChartKind::Bar);
    let total: f64 = data.iter().filter_map(|r| r.number("all_team_size")).sum();
    let count: f64 = data.iter().filter_map(|r| r.number("count")).sum();
    assert_eq!(total, 30.0);
    assert_eq!(count, rows.len() as f64);
}

#[test]
fn test_switching_to_pie_clears_axis_roles() {
    let mut config = load_config("test/bar_config.json");
    config.set_chart_type(ChartKind::Pie);
    let spec = runtime::build_chart(&config, &load_rows("test/teams.json"));
    assert!(spec.is_empty());
    assert_eq!(spec.title, "Chart Preview");
}

#[test]
fn test_cli_prints_chart_json() {
    let stdout = run_chartsmith(&["--config", "test/bar_config.json", "--data", "test/teams.json"])
        .expect("chartsmith failed");
    let json: serde_json::Value = serde_json::from_slice(&stdout).unwrap();
    assert_eq!(json["chart"]["kind"], "bar");
    assert_eq!(json["chart"]["data"][0]["team_name"], "Core");
    assert_eq!(json["chart"]["data"][0]["all_team_size"], 15.0);
    assert!(json.get("overlay").is_none());
}

#[test]
fn test_cli_lists_csv_fields() {
    let stdout = run_chartsmith(&["--fields", "--csv", "--data", "test/sales.csv"]).expect("chartsmith failed");
    let json: serde_json::Value = serde_json::from_slice(&stdout).unwrap();
    let ids: Vec<&str> = json.as_array().unwrap().iter().filter_map(|f| f["id"].as_str()).collect();
    assert_eq!(ids, vec!["month", "profit", "region", "sales"]);
    assert_eq!(json[0]["type"], "number");
}

#[test]
fn test_cli_rejects_invalid_config() {
    let result = run_chartsmith(&["--config", "test/sales.csv", "--data", "test/team_sizes.json"]);
    let err = result.unwrap_err();
    assert!(err.contains("Invalid configuration file"), "unexpected error: {}", err);
}

#[test]
fn test_cli_refuses_to_render_unconfigured_chart() {
    let path = std::env::temp_dir().join("chartsmith-empty-config.json");
    fs::write(&path, r#"{"chart_type": "line", "dataFields": {}}"#).unwrap();
    let result = run_chartsmith(&[
        "--config",
        path.to_str().unwrap(),
        "--data",
        "test/team_sizes.json",
        "--output",
        "png",
    ]);
    assert!(result.is_err());
}

#[test]
#[ignore = "requires system fonts"]
fn test_cli_renders_png() {
    let stdout = run_chartsmith(&[
        "--config",
        "test/composed_config.json",
        "--data",
        "test/team_sizes.json",
        "--output",
        "png",
        "--width",
        "400",
        "--height",
        "300",
    ])
    .expect("chartsmith failed");
    assert!(is_valid_png(&stdout), "Output is not a valid PNG");
}

#[test]
#[ignore = "requires system fonts"]
fn test_render_pie_png() {
    let spec = runtime::build_chart(&load_config("test/pie_config.json"), &load_rows("test/teams.json"));
    let png = chartsmith::graph::render_png(&spec, 300, 300).unwrap();
    assert!(is_valid_png(&png));
}
