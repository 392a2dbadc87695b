/*!
Chart and statistics models for county-level epidemic case counts.

A [Dataset] joins the census reference table ([ReferenceDirectory]) with the
cumulative case counts of every county ([RawSeriesStore]). From there:

- [Dataset::chart] transforms each county series (per-capita conversion, date window,
  new cases, smoothing), optionally sums them by metro area, and keeps the series with
  the highest peaks.
- [Dataset::statistics] computes the latest totals and new cases of every county and
  arranges them in titled, sorted groups.

Both runs are pure functions of the data and the settings. Changing a setting means
running the pipeline again.

```
use epicenter_series::builder::Builder;
use epicenter_series::*;

let reference = ReferenceDirectory::load(
    "STATE,COUNTY,METRO_NAME,POPESTIMATE2019\nTexas,Dallas,Dallas-Fort Worth,2600000",
)?;
let dates: Vec<String> = vec!["04-01".into(), "04-02".into(), "04-03".into()];
let mut builder = Builder::new(&dates);
builder.add_county("Texas", "Dallas", &[10, 15, 25])?;
let dataset = Dataset::new(reference, builder.build());

let chart = dataset.chart(&ChartSettings::default())?.data().unwrap();
assert_eq!(chart.title().text, "US New Cases - Top 5");
assert_eq!(chart.len(), 1);
# Ok::<(), SeriesError>(())
```
*/

mod config;
pub mod builder;
mod metro;
mod numeric;
mod ranking;
mod reference;
mod statistics;
mod store;
mod transform;

use log::info;

pub use crate::config::*;
pub use crate::metro::aggregate;
pub use crate::numeric::{IdentityContext, NumericContext, PerCapitaContext, SeriesValue};
pub use crate::ranking::rank;
pub use crate::reference::{MetroRecord, ReferenceDirectory, ReferenceEntry, RURAL};
pub use crate::statistics::{build_rows, merge_metro_row};
pub use crate::store::RawSeriesStore;
pub use crate::transform::transform;

/// The data every pipeline run reads from.
///
/// It is built once per data refresh and never modified afterwards.
#[derive(PartialEq, Debug, Clone)]
pub struct Dataset {
    directory: ReferenceDirectory,
    store: RawSeriesStore,
}

impl Dataset {
    pub fn new(directory: ReferenceDirectory, store: RawSeriesStore) -> Dataset {
        Dataset { directory, store }
    }

    pub fn directory(&self) -> &ReferenceDirectory {
        &self.directory
    }

    pub fn store(&self) -> &RawSeriesStore {
        &self.store
    }

    /// Builds the ranked chart for the given settings.
    ///
    /// Fails only if the series of a metro area do not share the same dates. A run in
    /// which every county gets filtered out is `Outcome::NoData`.
    pub fn chart(&self, settings: &ChartSettings) -> SeriesResult<Outcome<ChartModel>> {
        let title = ChartTitle {
            text: settings.title(),
            selected_state: settings.selected_state.clone(),
            value_mode: settings.value_mode,
            new_cases: settings.new_cases,
            metro_grouped: settings.metro_grouped,
            last_updated: self.store.last_updated().map(|s| s.to_string()),
        };
        info!("chart: {}", title.text);
        let res = match settings.value_mode {
            ValueMode::Counts => {
                build_ranked(self, &IdentityContext, settings, title)?.map(ChartModel::Counts)
            }
            ValueMode::PerCapita => {
                let context = PerCapitaContext::new(&self.directory);
                build_ranked(self, &context, settings, title)?.map(ChartModel::PerCapita)
            }
        };
        Ok(res)
    }

    /// Builds the grouped statistics table for the given settings.
    pub fn statistics(&self, settings: &StatisticsSettings) -> Outcome<Vec<StatisticsGroup>> {
        build_rows(&self.store, &self.directory, settings)
    }
}

fn build_ranked<C: NumericContext>(
    dataset: &Dataset,
    context: &C,
    settings: &ChartSettings,
    title: ChartTitle,
) -> SeriesResult<Outcome<RankedChart<C::Value>>> {
    let dates = dataset.store.dates();
    let counties: Vec<(CountyKey, NumericSeries<C::Value>)> = dataset
        .store
        .iter()
        .filter_map(|county| {
            transform(county, dates, context, &dataset.directory, settings)
                .map(|s| (county.key.clone(), s))
        })
        .collect();
    info!("build_ranked: {} counties after transform", counties.len());

    let series = if settings.metro_grouped {
        aggregate(counties, &dataset.directory)?
    } else {
        counties.into_iter().map(|(_, s)| s).collect()
    };
    Ok(rank(series, settings.top, title))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::Builder;

    fn dataset() -> Dataset {
        let _ = env_logger::builder().is_test(true).try_init();
        let directory = ReferenceDirectory::load(
            &[
                "STATE,COUNTY,METRO_NAME,POPESTIMATE2019",
                "Texas,Dallas,Dallas-Fort Worth,2600000",
                "Texas,Tarrant,Dallas-Fort Worth,2100000",
                "Texas,Harris,Houston,4700000",
                "Texas,Loving,,169",
                "Oklahoma,Tulsa,Tulsa,650000",
            ]
            .join("\n"),
        )
        .unwrap();
        let dates: Vec<String> = (1..=5).map(|d| format!("2020-04-0{}", d)).collect();
        let mut b = Builder::new(&dates);
        b.add_county("Texas", "Dallas", &[10, 15, 15, 20, 30]).unwrap();
        b.add_county("Texas", "Tarrant", &[5, 10, 20, 25, 28]).unwrap();
        b.add_county("Texas", "Harris", &[20, 22, 30, 35, 50]).unwrap();
        b.add_county("Texas", "Loving", &[0, 1, 1, 2, 2]).unwrap();
        b.add_county("Oklahoma", "Tulsa", &[1, 2, 4, 8, 8]).unwrap();
        b.add_county("Texas", "Unassigned", &[0, 0, 1, 1, 3]).unwrap();
        Dataset::new(directory, b.build())
    }

    fn counts(model: Outcome<ChartModel>) -> RankedChart<i64> {
        match model {
            Outcome::Data(ChartModel::Counts(c)) => c,
            x => panic!("unexpected chart: {:?}", x),
        }
    }

    fn names<Y>(chart: &RankedChart<Y>) -> Vec<&str> {
        chart.series.iter().map(|s| s.series.name.as_str()).collect()
    }

    #[test]
    fn metro_chart() {
        let chart = counts(dataset().chart(&ChartSettings::default()).unwrap());
        assert_eq!(names(&chart), vec!["Houston", "Dallas-Fort Worth", "Tulsa"]);
        assert_eq!(chart.series[0].series.values(), vec![2, 8, 5, 15]);
        assert_eq!(chart.series[1].series.values(), vec![10, 10, 10, 13]);
        assert_eq!(chart.series[2].series.values(), vec![1, 2, 4, 0]);
        assert_eq!(chart.series[2].color_index, 2);
        assert_eq!(chart.peak, 15);
        assert_eq!(chart.title.last_updated.as_deref(), Some("2020-04-05"));
    }

    #[test]
    fn county_chart() {
        let settings = ChartSettings {
            metro_grouped: false,
            metro_only: false,
            new_cases: false,
            top: 10,
            selected_state: "Texas".to_string(),
            ..ChartSettings::default()
        };
        let chart = counts(dataset().chart(&settings).unwrap());
        // The unassigned key has a fallback population and stays in the chart.
        assert_eq!(
            names(&chart),
            vec!["Harris", "Dallas", "Tarrant", "Unassigned", "Loving"]
        );
        assert_eq!(chart.title.text, "Texas Cases - Top 10");
    }

    #[test]
    fn per_capita_chart() {
        let settings = ChartSettings {
            value_mode: ValueMode::PerCapita,
            metro_grouped: false,
            new_cases: false,
            ..ChartSettings::default()
        };
        let model = dataset().chart(&settings).unwrap();
        let chart = match model {
            Outcome::Data(ChartModel::PerCapita(c)) => c,
            x => panic!("unexpected chart: {:?}", x),
        };
        assert_eq!(
            names(&chart),
            vec!["Tarrant", "Tulsa", "Dallas", "Harris"]
        );
        assert_eq!(chart.series[0].series.peak, 28.0 / 2100000.0);
        assert_eq!(chart.title.text, "US Cases Per Capita - Top 5");
    }

    #[test]
    fn no_data_is_not_an_error() {
        let settings = ChartSettings {
            selected_state: "Utah".to_string(),
            ..ChartSettings::default()
        };
        assert!(dataset().chart(&settings).unwrap().is_no_data());
        let settings = StatisticsSettings {
            selected_state: "Utah".to_string(),
            ..StatisticsSettings::default()
        };
        assert!(dataset().statistics(&settings).is_no_data());
    }

    #[test]
    fn runs_are_repeatable() {
        let data = dataset();
        let settings = ChartSettings {
            smoothing: 2,
            top: 25,
            metro_only: false,
            ..ChartSettings::default()
        };
        let first = data.chart(&settings).unwrap();
        let second = data.chart(&settings).unwrap();
        assert_eq!(first, second);
        assert_eq!(format!("{:?}", first), format!("{:?}", second));

        let stats = StatisticsSettings::default();
        assert_eq!(data.statistics(&stats), data.statistics(&stats));
    }
}
