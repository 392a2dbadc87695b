use log::{debug, info, warn};

use epicenter_series::*;
use snafu::{prelude::*, Snafu};

use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde_json::json;
use serde_json::Value as JSValue;
use text_diff::print_diff;

use crate::args::Args;
use crate::epi::config_reader::*;

mod config_reader;
mod io_feed;
mod io_reference;

#[derive(Debug, Snafu)]
pub enum EpiError {
    #[snafu(display("Error opening file {path}"))]
    OpeningFile {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error writing file {path}"))]
    WritingFile {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error parsing JSON in {path}: {source}"))]
    ParsingJson {
        source: serde_json::Error,
        path: String,
    },
    #[snafu(display("Error serializing the report"))]
    SerializingJson { source: serde_json::Error },
    #[snafu(display("Invalid data in {path}: {source}"))]
    LoadingData { source: SeriesError, path: String },
    #[snafu(display("Could not build the chart: {source}"))]
    BuildingChart { source: SeriesError },
    #[snafu(display("The configuration file has no parent directory"))]
    MissingParentDir {},

    #[snafu(whatever, display("{message}"))]
    Whatever {
        message: String,
        #[snafu(source(from(Box<dyn std::error::Error>, Some)))]
        source: Option<Box<dyn std::error::Error>>,
    },
}

pub type EpiResult<T> = Result<T, EpiError>;

fn series_to_json<Y: Serialize + Copy>(rs: &RankedSeries<Y>) -> JSValue {
    let points: Vec<JSValue> = rs
        .series
        .points
        .iter()
        .map(|p| json!({"date": p.date, "value": p.value}))
        .collect();
    json!({
        "key": rs.series.key,
        "name": rs.series.name,
        "colorIndex": rs.color_index,
        "peak": rs.series.peak,
        "points": points,
    })
}

fn ranked_chart_to_json<Y: Serialize + Copy>(chart: &RankedChart<Y>, value_mode: &str) -> JSValue {
    let series: Vec<JSValue> = chart.series.iter().map(series_to_json).collect();
    json!({
        "title": chart.title.text,
        "lastUpdated": chart.title.last_updated,
        "selectedState": chart.title.selected_state,
        "valueMode": value_mode,
        "newCases": chart.title.new_cases,
        "metroGrouped": chart.title.metro_grouped,
        "peak": chart.peak,
        "series": series,
    })
}

fn chart_to_json(model: &Outcome<ChartModel>) -> JSValue {
    match model {
        Outcome::Data(ChartModel::Counts(c)) => ranked_chart_to_json(c, "counts"),
        Outcome::Data(ChartModel::PerCapita(c)) => ranked_chart_to_json(c, "perCapita"),
        Outcome::NoData => JSValue::Null,
    }
}

fn statistics_to_json(groups: &Outcome<Vec<StatisticsGroup>>) -> JSValue {
    let groups = match groups {
        Outcome::Data(g) => g,
        Outcome::NoData => return JSValue::Null,
    };
    let l: Vec<JSValue> = groups
        .iter()
        .map(|g| {
            let rows: Vec<JSValue> = g
                .rows
                .iter()
                .map(|r| {
                    json!({
                        "key": r.key,
                        "label": r.label,
                        "population": r.population,
                        "totalCases": r.total_cases,
                        "newCases": r.new_cases,
                        "newCasesPerCapita": r.new_cases_per_capita,
                        "detail": r.detail(),
                    })
                })
                .collect();
            json!({"title": g.title, "rows": rows})
        })
        .collect();
    JSValue::Array(l)
}

fn build_summary_js(chart: &Outcome<ChartModel>, statistics: &Outcome<Vec<StatisticsGroup>>) -> JSValue {
    json!({
        "chart": chart_to_json(chart),
        "statistics": statistics_to_json(statistics),
    })
}

// A path given on the command line is taken as is. A path from the configuration file
// is relative to that file.
fn resolve_path(
    cli_path: &Option<String>,
    config_path: &Option<String>,
    root: &Path,
    what: &str,
) -> EpiResult<String> {
    if let Some(p) = cli_path {
        return Ok(p.clone());
    }
    match config_path {
        Some(p) => {
            let full: PathBuf = root.join(p);
            Ok(full.as_path().display().to_string())
        }
        None => {
            whatever!("No {} file was provided", what)
        }
    }
}

/// Reads the inputs, builds the chart and the statistics, and writes the report.
///
/// If a reference report is given, the computed report must match it.
pub fn run_report(args: &Args) -> EpiResult<()> {
    let (config, root) = match &args.config {
        Some(config_path) => {
            let config = read_config(config_path)?;
            let root = Path::new(config_path.as_str())
                .parent()
                .context(MissingParentDirSnafu {})?
                .to_path_buf();
            (config, root)
        }
        None => (EpiConfig::default(), PathBuf::from(".")),
    };
    info!("config: {:?}", config);

    let mut chart_settings = config.chart.clone().unwrap_or_default().validate()?;
    let mut statistics_settings = config.statistics.clone().unwrap_or_default().validate()?;
    if let Some(state) = &args.state {
        chart_settings.selected_state = state.clone();
        statistics_settings.selected_state = state.clone();
    }
    debug!("chart settings: {:?}", chart_settings);
    debug!("statistics settings: {:?}", statistics_settings);

    let reference_path = resolve_path(
        &args.reference_data,
        &config.reference_data_path,
        &root,
        "reference data",
    )?;
    let cases_path = resolve_path(&args.cases, &config.cases_path, &root, "cases")?;

    let directory = io_reference::read_reference(&reference_path)?;
    let store = io_feed::read_feed(&cases_path)?;
    let dataset = Dataset::new(directory, store);

    let chart = dataset.chart(&chart_settings).context(BuildingChartSnafu {})?;
    if chart.is_no_data() {
        warn!("No series left to chart with the current settings");
    }
    let statistics = dataset.statistics(&statistics_settings);
    if statistics.is_no_data() {
        warn!("No county left in the statistics with the current settings");
    }

    // Assemble the final json
    let result_js = build_summary_js(&chart, &statistics);
    let pretty_js_stats = serde_json::to_string_pretty(&result_js).context(SerializingJsonSnafu {})?;

    match args.out.as_deref() {
        Some("stdout") => {
            println!("{}", pretty_js_stats);
        }
        Some(out_path) => {
            info!("Writing report to {}", out_path);
            fs::write(out_path, &pretty_js_stats).context(WritingFileSnafu { path: out_path })?;
        }
        None => {}
    }

    // The reference report, if provided for comparison
    if let Some(summary_p) = &args.reference {
        let summary_ref = read_summary(summary_p)?;
        let pretty_js_summary_ref =
            serde_json::to_string_pretty(&summary_ref).context(SerializingJsonSnafu {})?;
        if pretty_js_summary_ref != pretty_js_stats {
            warn!("Found differences with the reference report");
            print_diff(
                pretty_js_summary_ref.as_str(),
                pretty_js_stats.as_ref(),
                "\n",
            );
            whatever!("Difference detected between computed report and reference report")
        }
    }

    Ok(())
}

#[cfg(test)]
fn run_report_test(test_name: &str, config_lpath: &str, summary_lpath: &str) {
    let test_dir = option_env!("EPICENTER_TEST_DIR")
        .unwrap_or(concat!(env!("CARGO_MANIFEST_DIR"), "/tests/data"));
    info!("Running test {}", test_name);
    let args = Args {
        config: Some(format!("{}/{}/{}", test_dir, test_name, config_lpath)),
        reference: Some(format!("{}/{}/{}", test_dir, test_name, summary_lpath)),
        ..Args::default()
    };
    let res = run_report(&args);
    if let Err(e) = res {
        warn!("Error occured {:?}", e);
        eprintln!("An error occured {}", e);
        if let Some(bt) = snafu::ErrorCompat::backtrace(&e) {
            eprintln!("trace: {}", bt);
        }
        panic!("test {} failed: {}", test_name, e);
    }
}

#[cfg(test)]
pub fn test_wrapper(test_name: &str) {
    let _ = env_logger::builder().is_test(true).try_init();
    run_report_test(
        test_name,
        format!("{}_config.json", test_name).as_str(),
        format!("{}_expected_summary.json", test_name).as_str(),
    )
}

#[cfg(test)]
mod tests {

    use super::*;

    #[test]
    fn basic() {
        test_wrapper("basic");
    }

    #[test]
    fn per_capita_smoothed() {
        test_wrapper("per_capita_smoothed");
    }

    #[test]
    fn no_data() {
        test_wrapper("no_data");
    }

    #[test]
    fn state_override_on_the_command_line() {
        let test_dir = concat!(env!("CARGO_MANIFEST_DIR"), "/tests/data");
        let args = Args {
            config: Some(format!("{}/basic/basic_config.json", test_dir)),
            state: Some("Texas".to_string()),
            ..Args::default()
        };
        assert!(run_report(&args).is_ok());

        // The Texas-only report cannot match the nationwide one.
        let args = Args {
            reference: Some(format!("{}/basic/basic_expected_summary.json", test_dir)),
            ..args
        };
        assert!(run_report(&args).is_err());
    }

    #[test]
    fn missing_inputs() {
        let res = run_report(&Args::default());
        assert!(matches!(res, Err(EpiError::Whatever { .. })));

        let args = Args {
            reference_data: Some("does/not/exist.csv".to_string()),
            cases: Some("does/not/exist.json".to_string()),
            ..Args::default()
        };
        assert!(matches!(run_report(&args), Err(EpiError::OpeningFile { .. })));
    }

    #[test]
    fn misaligned_feed_is_rejected() {
        let test_dir = concat!(env!("CARGO_MANIFEST_DIR"), "/tests/data");
        let args = Args {
            config: Some(format!("{}/basic/basic_config.json", test_dir)),
            cases: Some(format!("{}/misaligned_feed.json", test_dir)),
            ..Args::default()
        };
        assert!(matches!(run_report(&args), Err(EpiError::LoadingData { .. })));
    }
}
