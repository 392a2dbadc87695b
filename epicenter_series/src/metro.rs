use log::debug;
use snafu::prelude::*;

use std::collections::HashMap;

use crate::config::*;
use crate::numeric::SeriesValue;
use crate::reference::{ReferenceDirectory, RURAL};

/// Sums the county series of each metro area, point by point.
///
/// Rural counties and counties without a metro are left out. Metros come out in the
/// order of their first county. All the series summed into a metro must have the same
/// dates, otherwise the run fails with `DateAxisMismatch`.
pub fn aggregate<Y: SeriesValue>(
    series: Vec<(CountyKey, NumericSeries<Y>)>,
    directory: &ReferenceDirectory,
) -> SeriesResult<Vec<NumericSeries<Y>>> {
    let mut metros: Vec<NumericSeries<Y>> = Vec::new();
    let mut positions: HashMap<String, usize> = HashMap::new();

    for (key, s) in series {
        let metro_name = match directory.metro_name(&key) {
            Some(name) if name != RURAL => name,
            _ => {
                debug!("aggregate: {} is not in a metro area", key);
                continue;
            }
        };
        match positions.get(metro_name).copied() {
            Some(idx) => {
                let merged = add_series(&metros[idx], &s, metro_name)?;
                metros[idx] = merged;
            }
            None => {
                positions.insert(metro_name.to_string(), metros.len());
                metros.push(NumericSeries::new(metro_name, metro_name, s.points));
            }
        }
    }
    debug!("aggregate: {} metro areas", metros.len());
    Ok(metros)
}

fn add_series<Y: SeriesValue>(
    metro: &NumericSeries<Y>,
    county: &NumericSeries<Y>,
    metro_name: &str,
) -> SeriesResult<NumericSeries<Y>> {
    let aligned = metro.points.len() == county.points.len()
        && metro
            .points
            .iter()
            .zip(county.points.iter())
            .all(|(a, b)| a.date == b.date);
    ensure!(
        aligned,
        DateAxisMismatchSnafu {
            metro: metro_name,
            key: county.key.as_str(),
        }
    );
    let points = metro
        .points
        .iter()
        .zip(county.points.iter())
        .map(|(a, b)| DataPoint {
            date: a.date.clone(),
            value: a.value.add(b.value),
        })
        .collect();
    Ok(NumericSeries::new(metro_name, metro_name, points))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn directory() -> ReferenceDirectory {
        ReferenceDirectory::load(
            &[
                "STATE,COUNTY,METRO_NAME,POPESTIMATE2019",
                "Texas,Dallas,Dallas-Fort Worth,2600000",
                "Texas,Tarrant,Dallas-Fort Worth,2100000",
                "Texas,Harris,Houston,4700000",
                "Texas,Loving,Rural,169",
            ]
            .join("\n"),
        )
        .unwrap()
    }

    fn series(county: &str, dates: &[&str], values: &[i64]) -> (CountyKey, NumericSeries<i64>) {
        let key = CountyKey::new("Texas", county);
        let points = dates
            .iter()
            .zip(values.iter())
            .map(|(d, v)| DataPoint {
                date: d.to_string(),
                value: *v,
            })
            .collect();
        let s = NumericSeries::new(&key.to_string(), county, points);
        (key, s)
    }

    fn run(input: Vec<(CountyKey, NumericSeries<i64>)>) -> SeriesResult<Vec<NumericSeries<i64>>> {
        aggregate(input, &directory())
    }

    #[test]
    fn counties_of_a_metro_are_summed() {
        let d = ["04-01", "04-02"];
        let res = run(vec![
            series("Dallas", &d, &[1, 2]),
            series("Tarrant", &d, &[3, 4]),
        ])
        .unwrap();
        assert_eq!(res.len(), 1);
        assert_eq!(res[0].key, "Dallas-Fort Worth");
        assert_eq!(res[0].name, "Dallas-Fort Worth");
        assert_eq!(res[0].values(), vec![4, 6]);
        assert_eq!(res[0].peak, 6);
    }

    #[test]
    fn peak_is_recomputed_not_summed() {
        let d = ["04-01", "04-02"];
        let res = run(vec![
            series("Dallas", &d, &[5, 0]),
            series("Tarrant", &d, &[0, 5]),
        ])
        .unwrap();
        assert_eq!(res[0].peak, 5);
    }

    #[test]
    fn rural_counties_are_left_out() {
        let d = ["04-01", "04-02"];
        let res = run(vec![
            series("Loving", &d, &[100, 200]),
            series("Harris", &d, &[1, 2]),
            series("Unassigned", &d, &[7, 7]),
            series("Nowhere", &d, &[7, 7]),
        ])
        .unwrap();
        assert_eq!(res.len(), 1);
        assert_eq!(res[0].key, "Houston");
        assert_eq!(res[0].values(), vec![1, 2]);
    }

    #[test]
    fn metros_keep_first_seen_order() {
        let d = ["04-01"];
        let res = run(vec![
            series("Harris", &d, &[1]),
            series("Dallas", &d, &[2]),
            series("Tarrant", &d, &[3]),
        ])
        .unwrap();
        let names: Vec<&str> = res.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["Houston", "Dallas-Fort Worth"]);
    }

    #[test]
    fn misaligned_dates_fail() {
        let res = run(vec![
            series("Dallas", &["04-01", "04-02"], &[1, 2]),
            series("Tarrant", &["04-02", "04-03"], &[3, 4]),
        ]);
        match res {
            Err(SeriesError::DateAxisMismatch { metro, key }) => {
                assert_eq!(metro, "Dallas-Fort Worth");
                assert_eq!(key, "Texas, Tarrant");
            }
            x => panic!("unexpected result {:?}", x),
        }
    }

    #[test]
    fn different_lengths_fail() {
        let res = run(vec![
            series("Dallas", &["04-01", "04-02"], &[1, 2]),
            series("Tarrant", &["04-01"], &[3]),
        ]);
        assert!(matches!(res, Err(SeriesError::DateAxisMismatch { .. })));
    }
}
