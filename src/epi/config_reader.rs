use crate::epi::*;

use serde::{Deserialize, Serialize};

#[derive(Eq, PartialEq, Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChartConfig {
    #[serde(rename = "perCapita")]
    pub per_capita: Option<bool>,
    #[serde(rename = "newCases")]
    pub new_cases: Option<bool>,
    pub smoothing: Option<usize>,
    #[serde(rename = "metroGrouped")]
    pub metro_grouped: Option<bool>,
    #[serde(rename = "metroOnly")]
    pub metro_only: Option<bool>,
    pub top: Option<usize>,
    #[serde(rename = "selectedState")]
    pub selected_state: Option<String>,
    /// `[lastDays, limitDays]`
    pub days: Option<(usize, usize)>,
}

impl ChartConfig {
    pub fn validate(&self) -> EpiResult<ChartSettings> {
        let defaults = ChartSettings::default();

        let top = self.top.unwrap_or(defaults.top);
        if !ChartSettings::TOP_SELECTIONS.contains(&top) {
            whatever!(
                "Cannot use top {}: must be one of {:?}",
                top,
                ChartSettings::TOP_SELECTIONS
            )
        }
        let smoothing = self.smoothing.unwrap_or(defaults.smoothing);
        if !ChartSettings::SMOOTHING_SELECTIONS.contains(&smoothing) {
            whatever!(
                "Cannot use smoothing {}: must be one of {:?}",
                smoothing,
                ChartSettings::SMOOTHING_SELECTIONS
            )
        }
        let days = match self.days {
            None => defaults.days,
            Some((last_days, limit_days)) => {
                let w = DayWindow {
                    last_days,
                    limit_days,
                };
                if !DayWindow::SELECTIONS.contains(&w) {
                    whatever!("Cannot use days {:?}: not one of the day selections", self.days)
                }
                w
            }
        };

        Ok(ChartSettings {
            value_mode: match self.per_capita {
                Some(true) => ValueMode::PerCapita,
                _ => ValueMode::Counts,
            },
            new_cases: self.new_cases.unwrap_or(defaults.new_cases),
            smoothing,
            metro_grouped: self.metro_grouped.unwrap_or(defaults.metro_grouped),
            metro_only: self.metro_only.unwrap_or(defaults.metro_only),
            top,
            selected_state: self.selected_state.clone().unwrap_or_default(),
            days,
        })
    }
}

#[derive(Eq, PartialEq, Debug, Clone, Default, Serialize, Deserialize)]
pub struct StatisticsConfig {
    #[serde(rename = "selectedState")]
    pub selected_state: Option<String>,
    #[serde(rename = "groupBy")]
    pub group_by: Option<String>,
    #[serde(rename = "sortBy")]
    pub sort_by: Option<String>,
    #[serde(rename = "rateAggregation")]
    pub rate_aggregation: Option<String>,
}

impl StatisticsConfig {
    pub fn validate(&self) -> EpiResult<StatisticsSettings> {
        let defaults = StatisticsSettings::default();
        Ok(StatisticsSettings {
            selected_state: self.selected_state.clone().unwrap_or_default(),
            group_by: match self.group_by.as_deref() {
                None => defaults.group_by,
                Some("none") => GroupBy::Ungrouped,
                Some("state") => GroupBy::State,
                Some("metro") => GroupBy::Metro,
                Some("metroFlat") => GroupBy::MetroFlat,
                Some(x) => {
                    whatever!("Cannot use groupBy {:?}", x)
                }
            },
            sort_by: match self.sort_by.as_deref() {
                None => defaults.sort_by,
                Some("population") => SortBy::Population,
                Some("newCases") => SortBy::NewCases,
                Some("totalCases") => SortBy::TotalCases,
                Some("percent") => SortBy::Percent,
                Some("label") => SortBy::Label,
                Some(x) => {
                    whatever!("Cannot use sortBy {:?}", x)
                }
            },
            rate_aggregation: match self.rate_aggregation.as_deref() {
                None => defaults.rate_aggregation,
                Some("sumOfRates") => RateAggregation::SumOfRates,
                Some("recomputeFromTotals") => RateAggregation::RecomputeFromTotals,
                Some(x) => {
                    whatever!("Cannot use rateAggregation {:?}", x)
                }
            },
        })
    }
}

#[derive(Eq, PartialEq, Debug, Clone, Default, Serialize, Deserialize)]
pub struct EpiConfig {
    #[serde(rename = "referenceDataPath")]
    pub reference_data_path: Option<String>,
    #[serde(rename = "casesPath")]
    pub cases_path: Option<String>,
    pub chart: Option<ChartConfig>,
    pub statistics: Option<StatisticsConfig>,
}

pub fn read_config(path: &str) -> EpiResult<EpiConfig> {
    let contents = fs::read_to_string(path).context(OpeningFileSnafu { path })?;
    let config: EpiConfig =
        serde_json::from_str(contents.as_str()).context(ParsingJsonSnafu { path })?;
    Ok(config)
}

pub fn read_summary(path: &str) -> EpiResult<JSValue> {
    let contents = fs::read_to_string(path).context(OpeningFileSnafu { path })?;
    let js: JSValue = serde_json::from_str(contents.as_str()).context(ParsingJsonSnafu { path })?;
    debug!("read_summary: {:?}", js);
    Ok(js)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(s: &str) -> EpiConfig {
        serde_json::from_str(s).unwrap()
    }

    #[test]
    fn defaults() {
        let config = parse("{}");
        let chart = config.chart.unwrap_or_default().validate().unwrap();
        assert_eq!(chart, ChartSettings::default());
        let statistics = config.statistics.unwrap_or_default().validate().unwrap();
        assert_eq!(statistics, StatisticsSettings::default());
    }

    #[test]
    fn full_config() {
        let config = parse(
            r#"{
                "referenceDataPath": "reference.csv",
                "casesPath": "cases.json",
                "chart": {"perCapita": true, "newCases": false, "smoothing": 4, "metroGrouped": false,
                          "metroOnly": false, "top": 25, "selectedState": "Texas", "days": [40, 30]},
                "statistics": {"selectedState": "Ohio", "groupBy": "metroFlat", "sortBy": "label",
                               "rateAggregation": "recomputeFromTotals"}
            }"#,
        );
        assert_eq!(config.cases_path.as_deref(), Some("cases.json"));
        let chart = config.chart.unwrap().validate().unwrap();
        assert_eq!(chart.value_mode, ValueMode::PerCapita);
        assert!(!chart.new_cases);
        assert_eq!(chart.smoothing, 4);
        assert_eq!(chart.top, 25);
        assert_eq!(chart.selected_state, "Texas");
        assert_eq!(
            chart.days,
            DayWindow {
                last_days: 40,
                limit_days: 30
            }
        );
        let statistics = config.statistics.unwrap().validate().unwrap();
        assert_eq!(statistics.group_by, GroupBy::MetroFlat);
        assert_eq!(statistics.sort_by, SortBy::Label);
        assert_eq!(statistics.rate_aggregation, RateAggregation::RecomputeFromTotals);
        assert_eq!(statistics.selected_state, "Ohio");
    }

    #[test]
    fn values_outside_the_selections() {
        for chart in [
            r#"{"top": 7}"#,
            r#"{"smoothing": 3}"#,
            r#"{"days": [10, 0]}"#,
        ] {
            let c: ChartConfig = serde_json::from_str(chart).unwrap();
            assert!(c.validate().is_err(), "{}", chart);
        }
        for statistics in [
            r#"{"groupBy": "county"}"#,
            r#"{"sortBy": "rate"}"#,
            r#"{"rateAggregation": "average"}"#,
        ] {
            let c: StatisticsConfig = serde_json::from_str(statistics).unwrap();
            assert!(c.validate().is_err(), "{}", statistics);
        }
    }
}
