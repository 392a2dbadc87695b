use log::{debug, info};

use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};

use crate::config::*;
use crate::reference::ReferenceDirectory;
use crate::store::RawSeriesStore;

// The latest change needs two values, and the first one of a feed is often partial.
const MIN_HISTORY: usize = 3;

/// Computes the latest snapshot of every county and arranges it in sorted groups.
///
/// Groups are ordered by title. Rows are ordered by label when sorting by label, and by
/// decreasing value of the sort field otherwise.
pub fn build_rows(
    store: &RawSeriesStore,
    directory: &ReferenceDirectory,
    settings: &StatisticsSettings,
) -> Outcome<Vec<StatisticsGroup>> {
    let mut groups: BTreeMap<String, Vec<StatisticsRow>> = BTreeMap::new();
    let mut metro_rows: Vec<StatisticsRow> = Vec::new();
    let mut metro_positions: HashMap<String, usize> = HashMap::new();

    for county in store.iter() {
        let key = &county.key;
        if key.state.is_empty() || key.county.is_empty() || county.cumulative.len() < MIN_HISTORY {
            continue;
        }
        if key.is_other_category() {
            continue;
        }
        if !settings.selected_state.is_empty() && key.state != settings.selected_state {
            continue;
        }
        let (population, metro_name) = match (directory.population(key), directory.metro_name(key)) {
            (Some(p), Some(m)) => (p, m),
            _ => {
                debug!("build_rows: {} is not in the reference data", key);
                continue;
            }
        };

        let size = county.cumulative.len();
        let total_cases = county.cumulative[size - 1];
        let new_cases = total_cases - county.cumulative[size - 2];

        if settings.group_by == GroupBy::MetroFlat {
            let row = StatisticsRow {
                key: metro_name.to_string(),
                label: metro_name.to_string(),
                population,
                total_cases,
                new_cases,
                new_cases_per_capita: rate(new_cases, population),
            };
            match metro_positions.get(metro_name).copied() {
                Some(idx) => {
                    let merged = merge_metro_row(&metro_rows[idx], &row, settings.rate_aggregation);
                    metro_rows[idx] = merged;
                }
                None => {
                    metro_positions.insert(metro_name.to_string(), metro_rows.len());
                    metro_rows.push(row);
                }
            }
            continue;
        }

        let row = StatisticsRow {
            key: key.to_string(),
            label: table_label(settings, key, metro_name),
            population,
            total_cases,
            new_cases,
            new_cases_per_capita: rate(new_cases, population),
        };
        groups
            .entry(group_title(settings, key, metro_name))
            .or_insert_with(Vec::new)
            .push(row);
    }

    if !metro_rows.is_empty() {
        groups.insert(format!("{}Metro Areas", prefix(settings)), metro_rows);
    }

    let res: Vec<StatisticsGroup> = groups
        .into_iter()
        .map(|(title, mut rows)| {
            sort_rows(&mut rows, settings.sort_by);
            StatisticsGroup { title, rows }
        })
        .collect();
    info!(
        "build_rows: {} groups, {} rows",
        res.len(),
        res.iter().map(|g| g.rows.len()).sum::<usize>()
    );
    if res.is_empty() {
        Outcome::NoData
    } else {
        Outcome::Data(res)
    }
}

fn rate(new_cases: i64, population: u64) -> f64 {
    if population == 0 {
        0.0
    } else {
        new_cases as f64 / population as f64
    }
}

/// Folds a county row into the row of its metro area.
///
/// Counts and populations are added. The rate follows `aggregation`: by default the
/// county rates are added up, which is what the table has always displayed.
pub fn merge_metro_row(
    metro: &StatisticsRow,
    row: &StatisticsRow,
    aggregation: RateAggregation,
) -> StatisticsRow {
    let population = metro.population + row.population;
    let new_cases = metro.new_cases + row.new_cases;
    let new_cases_per_capita = match aggregation {
        RateAggregation::SumOfRates => metro.new_cases_per_capita + row.new_cases_per_capita,
        RateAggregation::RecomputeFromTotals => rate(new_cases, population),
    };
    StatisticsRow {
        key: metro.key.clone(),
        label: metro.label.clone(),
        population,
        total_cases: metro.total_cases + row.total_cases,
        new_cases,
        new_cases_per_capita,
    }
}

fn prefix(settings: &StatisticsSettings) -> String {
    if settings.selected_state.is_empty() {
        String::new()
    } else {
        format!("{} ", settings.selected_state)
    }
}

fn group_title(settings: &StatisticsSettings, key: &CountyKey, metro_name: &str) -> String {
    match settings.group_by {
        GroupBy::Ungrouped => format!("{}Counties", prefix(settings)),
        GroupBy::State => key.state.clone(),
        GroupBy::Metro => format!("{}, {}", key.state, metro_name),
        GroupBy::MetroFlat => format!("{}Metro Areas", prefix(settings)),
    }
}

fn table_label(settings: &StatisticsSettings, key: &CountyKey, metro_name: &str) -> String {
    match settings.group_by {
        GroupBy::Ungrouped if !settings.selected_state.is_empty() => key.county.clone(),
        GroupBy::Ungrouped if settings.sort_by == SortBy::Label => key.to_string(),
        GroupBy::Ungrouped => format!("{}, {}", key.county, key.state),
        GroupBy::State | GroupBy::Metro => key.county.clone(),
        GroupBy::MetroFlat => metro_name.to_string(),
    }
}

fn sort_value(row: &StatisticsRow, sort_by: SortBy) -> f64 {
    match sort_by {
        SortBy::Population => row.population as f64,
        SortBy::NewCases => row.new_cases as f64,
        SortBy::TotalCases => row.total_cases as f64,
        SortBy::Percent => row.new_cases_per_capita,
        SortBy::Label => 0.0,
    }
}

fn sort_rows(rows: &mut [StatisticsRow], sort_by: SortBy) {
    if sort_by == SortBy::Label {
        rows.sort_by(|a, b| a.label.cmp(&b.label));
    } else {
        rows.sort_by(|a, b| {
            sort_value(b, sort_by)
                .partial_cmp(&sort_value(a, sort_by))
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.label.cmp(&b.label))
        });
    }
}
