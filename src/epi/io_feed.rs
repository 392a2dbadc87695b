// Primitives for reading the JSON case feed.

use crate::epi::*;

use epicenter_series::builder::Builder;
use serde::Deserialize;

#[derive(PartialEq, Debug, Clone, Deserialize)]
struct FeedEntry {
    county: Option<String>,
    #[serde(rename = "provinceState")]
    province_state: Option<String>,
    latitude: Option<f64>,
    longitude: Option<f64>,
    values: Vec<i64>,
    #[serde(rename = "lastValue")]
    last_value: Option<i64>,
}

#[derive(PartialEq, Debug, Clone, Deserialize)]
struct Feed {
    dates: Vec<String>,
    series: Vec<FeedEntry>,
}

pub fn read_feed(path: &str) -> EpiResult<RawSeriesStore> {
    info!("Attempting to read case feed {:?}", path);
    let contents = fs::read_to_string(path).context(OpeningFileSnafu { path })?;
    parse_feed(&contents, path)
}

fn parse_feed(contents: &str, path: &str) -> EpiResult<RawSeriesStore> {
    let feed: Feed = serde_json::from_str(contents).context(ParsingJsonSnafu { path })?;
    let mut builder = Builder::new(&feed.dates);
    for entry in feed.series {
        let location = match (entry.latitude, entry.longitude) {
            (Some(latitude), Some(longitude)) => Some(Location {
                latitude,
                longitude,
            }),
            _ => None,
        };
        let key = CountyKey::new(
            entry.province_state.as_deref().unwrap_or(""),
            entry.county.as_deref().unwrap_or(""),
        );
        if let Some(last) = entry.last_value {
            if entry.values.last() != Some(&last) {
                warn!(
                    "read_feed: {}: last value {} differs from the series {:?}",
                    key,
                    last,
                    entry.values.last()
                );
            }
        }
        builder
            .add_series(CountySeries {
                key,
                cumulative: entry.values,
                location,
            })
            .context(LoadingDataSnafu { path })?;
    }
    let store = builder.build();
    debug!(
        "read_feed: {} counties over {} dates",
        store.len(),
        store.dates().len()
    );
    Ok(store)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn feed_with_optional_fields() {
        let store = parse_feed(
            r#"{"dates": ["2020-04-01", "2020-04-02"],
                "series": [
                  {"county": "Dallas", "provinceState": "Texas", "latitude": 32.7, "longitude": -96.7,
                   "values": [1, 3], "lastValue": 3},
                  {"county": null, "provinceState": "Texas", "values": [0, 0]}
                ]}"#,
            "test.json",
        )
        .unwrap();
        assert_eq!(store.len(), 2);
        assert_eq!(store.last_updated(), Some("2020-04-02"));
        let dallas = store.county(&CountyKey::new("Texas", "Dallas")).unwrap();
        assert_eq!(dallas.cumulative, vec![1, 3]);
        assert_eq!(
            dallas.location,
            Some(Location {
                latitude: 32.7,
                longitude: -96.7
            })
        );
        assert_eq!(store.series(&CountyKey::new("Texas", "")), Some(&[0, 0][..]));
    }

    #[test]
    fn length_mismatch() {
        let res = parse_feed(
            r#"{"dates": ["2020-04-01", "2020-04-02"],
                "series": [{"county": "Dallas", "provinceState": "Texas", "values": [1]}]}"#,
            "test.json",
        );
        assert!(matches!(res, Err(EpiError::LoadingData { .. })));
    }
}
