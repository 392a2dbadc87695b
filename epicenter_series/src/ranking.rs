use log::{debug, info};

use crate::config::*;
use crate::numeric::SeriesValue;

/// Keeps the `top` series with the highest peaks, highest first.
///
/// Series with the same peak stay in their input order. Each retained series gets its
/// position as color index. Nothing left to show is `NoData`.
pub fn rank<Y: SeriesValue>(
    mut series: Vec<NumericSeries<Y>>,
    top: usize,
    title: ChartTitle,
) -> Outcome<RankedChart<Y>> {
    // sort_by is stable: ties keep the insertion order.
    series.sort_by(|a, b| b.peak.compare(&a.peak));
    series.truncate(top);
    if series.is_empty() {
        info!("rank: no series left to display");
        return Outcome::NoData;
    }

    let peak = series
        .iter()
        .map(|s| s.peak)
        .reduce(|a, b| a.max_of(b))
        .unwrap_or_else(Y::zero);
    let ranked: Vec<RankedSeries<Y>> = series
        .into_iter()
        .enumerate()
        .map(|(color_index, s)| {
            debug!("rank: {} peak: {:?} color: {}", s.key, s.peak, color_index);
            RankedSeries {
                color_index,
                series: s,
            }
        })
        .collect();

    Outcome::Data(RankedChart {
        series: ranked,
        peak,
        title,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn title() -> ChartTitle {
        ChartTitle {
            text: "US New Cases - Top 2".to_string(),
            selected_state: String::new(),
            value_mode: ValueMode::Counts,
            new_cases: true,
            metro_grouped: false,
            last_updated: None,
        }
    }

    fn with_peak(name: &str, peak: i64) -> NumericSeries<i64> {
        NumericSeries::new(
            name,
            name,
            vec![DataPoint {
                date: "2020-04-01".to_string(),
                value: peak,
            }],
        )
    }

    #[test]
    fn keeps_highest_peaks_in_order() {
        let chart = rank(
            vec![with_peak("a", 5), with_peak("b", 50), with_peak("c", 20)],
            2,
            title(),
        )
        .data()
        .unwrap();
        let peaks: Vec<i64> = chart.series.iter().map(|r| r.series.peak).collect();
        assert_eq!(peaks, vec![50, 20]);
        let colors: Vec<usize> = chart.series.iter().map(|r| r.color_index).collect();
        assert_eq!(colors, vec![0, 1]);
        assert_eq!(chart.peak, 50);
    }

    #[test]
    fn ties_keep_input_order() {
        let chart = rank(
            vec![with_peak("a", 7), with_peak("b", 9), with_peak("c", 7), with_peak("d", 7)],
            5,
            title(),
        )
        .data()
        .unwrap();
        let names: Vec<&str> = chart.series.iter().map(|r| r.series.name.as_str()).collect();
        assert_eq!(names, vec!["b", "a", "c", "d"]);
    }

    #[test]
    fn nothing_to_rank_is_no_data() {
        let res: Outcome<RankedChart<i64>> = rank(vec![], 5, title());
        assert!(res.is_no_data());
    }

    #[test]
    fn fractional_peaks() {
        let s = |name: &str, v: f64| {
            NumericSeries::new(
                name,
                name,
                vec![DataPoint {
                    date: "2020-04-01".to_string(),
                    value: v,
                }],
            )
        };
        let chart = rank(vec![s("a", 0.01), s("b", 0.2), s("c", 0.05)], 10, title())
            .data()
            .unwrap();
        let names: Vec<&str> = chart.series.iter().map(|r| r.series.name.as_str()).collect();
        assert_eq!(names, vec!["b", "c", "a"]);
        assert_eq!(chart.peak, 0.2);
    }
}
