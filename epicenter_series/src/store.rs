use std::collections::HashMap;

use crate::builder::Builder;
use crate::config::*;

/// The cumulative case counts of every county, over a shared date axis.
///
/// Counties are kept in feed order, which is also the order used to break ties when
/// ranking.
#[derive(PartialEq, Debug, Clone, Default)]
pub struct RawSeriesStore {
    pub(crate) dates: Vec<String>,
    pub(crate) series: Vec<CountySeries>,
    pub(crate) index: HashMap<CountyKey, usize>,
}

impl RawSeriesStore {
    /// Fails with `SeriesLengthMismatch` if any county does not have one value per date.
    pub fn new(dates: &[String], counties: Vec<CountySeries>) -> SeriesResult<RawSeriesStore> {
        let mut builder = Builder::new(dates);
        for c in counties {
            builder.add_series(c)?;
        }
        Ok(builder.build())
    }

    pub fn dates(&self) -> &[String] {
        &self.dates
    }

    /// The most recent date of the feed.
    pub fn last_updated(&self) -> Option<&str> {
        self.dates.last().map(|s| s.as_str())
    }

    pub fn series(&self, key: &CountyKey) -> Option<&[i64]> {
        self.index
            .get(key)
            .map(|idx| self.series[*idx].cumulative.as_slice())
    }

    pub fn county(&self, key: &CountyKey) -> Option<&CountySeries> {
        self.index.get(key).map(|idx| &self.series[*idx])
    }

    pub fn iter(&self) -> impl Iterator<Item = &CountySeries> {
        self.series.iter()
    }

    pub fn len(&self) -> usize {
        self.series.len()
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }
}
