// ********* Input data structures ***********

use std::fmt::Display;

use snafu::prelude::*;

/// The canonical identifier joining case data to reference data.
///
/// It is rendered as `"state, county"` everywhere a string key is needed.
#[derive(Eq, PartialEq, Debug, Clone, Hash, Ord, PartialOrd)]
pub struct CountyKey {
    pub state: String,
    pub county: String,
}

impl CountyKey {
    pub fn new(state: &str, county: &str) -> CountyKey {
        CountyKey {
            state: state.to_string(),
            county: county.to_string(),
        }
    }

    /// Keys for the buckets that are not real counties ("Unassigned", "Out of TX",
    /// "Federal Correctional Institution", ...). They are accepted even when the
    /// reference table does not list them.
    pub fn is_other_category(&self) -> bool {
        let key = self.to_string();
        key.contains("Unassigned") || key.contains("Out of") || key.contains("Correction")
    }
}

impl Display for CountyKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}, {}", self.state, self.county)
    }
}

#[derive(PartialEq, Debug, Clone, Copy)]
pub struct Location {
    pub latitude: f64,
    pub longitude: f64,
}

impl Location {
    pub const ZERO: Location = Location {
        latitude: 0.0,
        longitude: 0.0,
    };

    pub fn is_zero(&self) -> bool {
        self.latitude == 0.0 || self.longitude == 0.0
    }
}

/// Cumulative counts of one county, as delivered by the feed.
#[derive(PartialEq, Debug, Clone)]
pub struct CountySeries {
    pub key: CountyKey,
    pub cumulative: Vec<i64>,
    pub location: Option<Location>,
}

/// A (lastDays, limitDays) pair.
///
/// When `limit_days` is not zero, the window starts at index `last_days` and spans
/// `limit_days + 1` dates. Otherwise only the last `last_days` dates are kept, and
/// zero keeps everything.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash)]
pub struct DayWindow {
    pub last_days: usize,
    pub limit_days: usize,
}

impl DayWindow {
    pub const ALL: DayWindow = DayWindow {
        last_days: 0,
        limit_days: 0,
    };

    /// The windows offered to the user.
    pub const SELECTIONS: [DayWindow; 5] = [
        DayWindow::ALL,
        DayWindow {
            last_days: 14,
            limit_days: 0,
        },
        DayWindow {
            last_days: 30,
            limit_days: 0,
        },
        DayWindow {
            last_days: 60,
            limit_days: 0,
        },
        DayWindow {
            last_days: 40,
            limit_days: 30,
        },
    ];

    /// Inclusive index range over a date axis of `count` dates, or None if the window
    /// does not overlap the axis.
    pub fn range(&self, count: usize) -> Option<(usize, usize)> {
        if count == 0 {
            return None;
        }
        let (min, max) = if self.limit_days != 0 {
            (self.last_days, self.last_days + self.limit_days)
        } else if self.last_days > 0 {
            (count.saturating_sub(self.last_days), count - 1)
        } else {
            (0, count - 1)
        };
        let max = max.min(count - 1);
        if min > max {
            None
        } else {
            Some((min, max))
        }
    }
}

#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash)]
pub enum ValueMode {
    /// Raw case counts.
    Counts,
    /// Case counts divided by the county population.
    PerCapita,
}

#[derive(Eq, PartialEq, Debug, Clone)]
pub struct ChartSettings {
    pub value_mode: ValueMode,
    pub new_cases: bool,
    /// Size of the trailing moving average. 0 disables smoothing.
    pub smoothing: usize,
    pub metro_grouped: bool,
    /// Drops the counties that do not belong to a metro area.
    pub metro_only: bool,
    pub top: usize,
    /// Empty for all the states.
    pub selected_state: String,
    pub days: DayWindow,
}

impl ChartSettings {
    pub const TOP_SELECTIONS: [usize; 3] = [5, 10, 25];
    pub const SMOOTHING_SELECTIONS: [usize; 3] = [0, 2, 4];

    pub fn title(&self) -> String {
        let prefix = if self.selected_state.is_empty() {
            "US"
        } else {
            self.selected_state.as_str()
        };
        let chart_type = if self.new_cases { "New Cases" } else { "Cases" };
        let suffix = match self.value_mode {
            ValueMode::PerCapita => " Per Capita",
            ValueMode::Counts => "",
        };
        let smoothing = if self.smoothing > 0 { " [Smoothed]" } else { "" };
        format!(
            "{} {}{} - Top {}{}",
            prefix, chart_type, suffix, self.top, smoothing
        )
    }
}

impl Default for ChartSettings {
    fn default() -> Self {
        ChartSettings {
            value_mode: ValueMode::Counts,
            new_cases: true,
            smoothing: 0,
            metro_grouped: true,
            metro_only: true,
            top: 5,
            selected_state: String::new(),
            days: DayWindow::ALL,
        }
    }
}

#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash)]
pub enum GroupBy {
    /// One row per county, all in a single group.
    Ungrouped,
    State,
    /// Rows bucketed under "state, metro".
    Metro,
    /// One row per metro area, summed over its counties.
    MetroFlat,
}

#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash)]
pub enum SortBy {
    Population,
    NewCases,
    TotalCases,
    Percent,
    Label,
}

/// How the per-capita rate of a metro-flat row is obtained from its counties.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash)]
pub enum RateAggregation {
    /// Adds up the rates of the member counties. This is what the table has always
    /// shown, even though it is not a rate of the metro population.
    SumOfRates,
    /// Summed new cases divided by summed population.
    RecomputeFromTotals,
}

#[derive(Eq, PartialEq, Debug, Clone)]
pub struct StatisticsSettings {
    pub selected_state: String,
    pub group_by: GroupBy,
    pub sort_by: SortBy,
    pub rate_aggregation: RateAggregation,
}

impl Default for StatisticsSettings {
    fn default() -> Self {
        StatisticsSettings {
            selected_state: String::new(),
            group_by: GroupBy::Ungrouped,
            sort_by: SortBy::Percent,
            rate_aggregation: RateAggregation::SumOfRates,
        }
    }
}

// ******** Output data structures *********

#[derive(PartialEq, Debug, Clone)]
pub struct DataPoint<Y> {
    pub date: String,
    pub value: Y,
}

/// A chartable series for a county or a metro area.
///
/// Points are ordered by date, and `peak` is the largest value (zero when there are
/// no points).
#[derive(PartialEq, Debug, Clone)]
pub struct NumericSeries<Y> {
    pub key: String,
    pub name: String,
    pub points: Vec<DataPoint<Y>>,
    pub peak: Y,
}

#[derive(PartialEq, Debug, Clone)]
pub struct RankedSeries<Y> {
    pub color_index: usize,
    pub series: NumericSeries<Y>,
}

#[derive(PartialEq, Debug, Clone)]
pub struct ChartTitle {
    pub text: String,
    pub selected_state: String,
    pub value_mode: ValueMode,
    pub new_cases: bool,
    pub metro_grouped: bool,
    pub last_updated: Option<String>,
}

#[derive(PartialEq, Debug, Clone)]
pub struct RankedChart<Y> {
    pub series: Vec<RankedSeries<Y>>,
    pub peak: Y,
    pub title: ChartTitle,
}

/// The final chart, with the value type selected by the settings.
#[derive(PartialEq, Debug, Clone)]
pub enum ChartModel {
    Counts(RankedChart<i64>),
    PerCapita(RankedChart<f64>),
}

impl ChartModel {
    pub fn title(&self) -> &ChartTitle {
        match self {
            ChartModel::Counts(c) => &c.title,
            ChartModel::PerCapita(c) => &c.title,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            ChartModel::Counts(c) => c.series.len(),
            ChartModel::PerCapita(c) => c.series.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(PartialEq, Debug, Clone)]
pub struct StatisticsRow {
    /// County key or metro name.
    pub key: String,
    pub label: String,
    pub population: u64,
    pub total_cases: i64,
    pub new_cases: i64,
    pub new_cases_per_capita: f64,
}

impl StatisticsRow {
    pub fn detail(&self) -> String {
        format!(
            "{:.2}% | New: {} | Total: {} | Pop: {}",
            self.new_cases_per_capita * 100.0,
            self.new_cases,
            self.total_cases,
            self.population
        )
    }
}

#[derive(PartialEq, Debug, Clone)]
pub struct StatisticsGroup {
    pub title: String,
    pub rows: Vec<StatisticsRow>,
}

/// The result of a pipeline run that completed without error.
///
/// `NoData` is not a failure: every county got filtered out, and the caller should
/// show an empty state.
#[derive(PartialEq, Debug, Clone)]
pub enum Outcome<T> {
    Data(T),
    NoData,
}

impl<T> Outcome<T> {
    pub fn map<U, F: FnOnce(T) -> U>(self, f: F) -> Outcome<U> {
        match self {
            Outcome::Data(x) => Outcome::Data(f(x)),
            Outcome::NoData => Outcome::NoData,
        }
    }

    pub fn data(self) -> Option<T> {
        match self {
            Outcome::Data(x) => Some(x),
            Outcome::NoData => None,
        }
    }

    pub fn is_no_data(&self) -> bool {
        matches!(self, Outcome::NoData)
    }
}

/// Errors that abort a data load or a pipeline run.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum SeriesError {
    #[snafu(display("Reference data has no header row"))]
    EmptyReference {},
    #[snafu(display("Expected reference header '{expected}' at column {index}, found '{found}'"))]
    HeaderMismatch {
        index: usize,
        expected: String,
        found: String,
    },
    #[snafu(display("Could not read reference line {lineno}"))]
    ReferenceLine { source: csv::Error, lineno: u64 },
    #[snafu(display("{key} has {found} values, expected {expected}"))]
    SeriesLengthMismatch {
        key: String,
        found: usize,
        expected: usize,
    },
    #[snafu(display("Cannot add {key} to metro {metro}: the dates do not line up"))]
    DateAxisMismatch { metro: String, key: String },
}

pub type SeriesResult<T> = Result<T, SeriesError>;
