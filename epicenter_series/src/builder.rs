pub use crate::config::*;
use crate::store::RawSeriesStore;

use log::warn;
use snafu::prelude::*;
use std::collections::HashMap;

/// A builder for the raw series store.
///
/// Every county is checked against the date axis when it is added, so a bad feed is
/// rejected before any transform runs.
///
/// ```
/// use epicenter_series::builder::Builder;
/// # use epicenter_series::SeriesError;
///
/// let mut builder = Builder::new(&["2020-04-01".to_string(), "2020-04-02".to_string()]);
/// builder.add_county("Texas", "Dallas", &[10, 15])?;
/// let store = builder.build();
/// assert_eq!(store.len(), 1);
///
/// # Ok::<(), SeriesError>(())
/// ```
pub struct Builder {
    pub(crate) _dates: Vec<String>,
    pub(crate) _series: Vec<CountySeries>,
    pub(crate) _index: HashMap<CountyKey, usize>,
}

impl Builder {
    pub fn new(dates: &[String]) -> Builder {
        Builder {
            _dates: dates.to_vec(),
            _series: Vec::new(),
            _index: HashMap::new(),
        }
    }

    /// Adds the cumulative counts of a county without a location.
    pub fn add_county(&mut self, state: &str, county: &str, values: &[i64]) -> SeriesResult<()> {
        self.add_series(CountySeries {
            key: CountyKey::new(state, county),
            cumulative: values.to_vec(),
            location: None,
        })
    }

    /// Adds a county series. A county that is already present is replaced, keeping its
    /// original position.
    pub fn add_series(&mut self, series: CountySeries) -> SeriesResult<()> {
        ensure!(
            series.cumulative.len() == self._dates.len(),
            SeriesLengthMismatchSnafu {
                key: series.key.to_string(),
                found: series.cumulative.len(),
                expected: self._dates.len(),
            }
        );
        if let Some(&idx) = self._index.get(&series.key) {
            warn!("add_series: {} appears more than once, keeping the last one", series.key);
            self._series[idx] = series;
        } else {
            self._index.insert(series.key.clone(), self._series.len());
            self._series.push(series);
        }
        Ok(())
    }

    pub fn build(self) -> RawSeriesStore {
        RawSeriesStore {
            dates: self._dates,
            series: self._series,
            index: self._index,
        }
    }
}
