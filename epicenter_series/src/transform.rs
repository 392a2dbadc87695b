use log::debug;

use crate::config::*;
use crate::numeric::{NumericContext, SeriesValue};
use crate::reference::{ReferenceDirectory, RURAL};

impl<Y: SeriesValue> NumericSeries<Y> {
    /// Builds a series from date-ordered points. The peak is the largest value, or zero
    /// if there are no points.
    pub fn new(key: &str, name: &str, points: Vec<DataPoint<Y>>) -> NumericSeries<Y> {
        let peak = points
            .iter()
            .map(|p| p.value)
            .reduce(|a, b| a.max_of(b))
            .unwrap_or_else(Y::zero);
        NumericSeries {
            key: key.to_string(),
            name: name.to_string(),
            points,
            peak,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn values(&self) -> Vec<Y> {
        self.points.iter().map(|p| p.value).collect()
    }
}

/// Runs the value transforms on a single county, in order: conversion, date window,
/// new cases, smoothing.
///
/// Returns None when the county is filtered out or nothing is left of it.
pub fn transform<C: NumericContext>(
    county: &CountySeries,
    dates: &[String],
    context: &C,
    directory: &ReferenceDirectory,
    settings: &ChartSettings,
) -> Option<NumericSeries<C::Value>> {
    let key = &county.key;
    if key.state.is_empty() || key.county.is_empty() {
        return None;
    }

    let converted: Vec<C::Value> = match county
        .cumulative
        .iter()
        .map(|raw| context.convert(*raw, key))
        .collect::<Option<Vec<C::Value>>>()
    {
        Some(v) => v,
        None => {
            debug!(
                "transform: {} is unknown, cases: {:?}",
                key,
                county.cumulative.last()
            );
            return None;
        }
    };

    if is_filtered(key, directory, settings) {
        return None;
    }

    if converted.len() != dates.len() {
        debug!(
            "transform: {} has {} values for {} dates",
            key,
            converted.len(),
            dates.len()
        );
        return None;
    }

    let (min, max) = settings.days.range(dates.len())?;
    let points: Vec<DataPoint<C::Value>> = dates[min..=max]
        .iter()
        .zip(converted[min..=max].iter())
        .map(|(date, value)| DataPoint {
            date: date.clone(),
            value: *value,
        })
        .collect();

    let points = if settings.new_cases {
        new_cases(points)
    } else {
        points
    };
    let points = smooth(points, settings.smoothing);

    let series = NumericSeries::new(&key.to_string(), &key.county, points);
    if series.is_empty() {
        None
    } else {
        Some(series)
    }
}

fn is_filtered(key: &CountyKey, directory: &ReferenceDirectory, settings: &ChartSettings) -> bool {
    if !settings.selected_state.is_empty() && key.state != settings.selected_state {
        return true;
    }
    if settings.metro_only {
        let metro = directory.metro_name(key).unwrap_or(RURAL);
        return metro == RURAL;
    }
    false
}

/// Day over day differences. The first point has no previous value and is dropped.
pub(crate) fn new_cases<Y: SeriesValue>(points: Vec<DataPoint<Y>>) -> Vec<DataPoint<Y>> {
    points
        .windows(2)
        .map(|w| DataPoint {
            date: w[1].date.clone(),
            value: w[1].value.subtract(w[0].value),
        })
        .collect()
}

/// Trailing moving average of the current value and the `window` values before it.
///
/// A point is only emitted once `window` previous values are known, so the output is
/// `window` points shorter. The history then takes the averaged value rather than the
/// input one, so each output feeds the next average.
pub(crate) fn smooth<Y: SeriesValue>(points: Vec<DataPoint<Y>>, window: usize) -> Vec<DataPoint<Y>> {
    if window == 0 {
        return points;
    }
    let (_, smoothed) = points.into_iter().fold(
        (Vec::<Y>::with_capacity(window + 1), Vec::new()),
        |(mut history, mut out), point| {
            let next = if history.len() == window {
                let sum = history
                    .iter()
                    .fold(Y::zero(), |acc, v| acc.add(*v))
                    .add(point.value);
                let average = Y::from_comparable(sum.to_comparable() / (window + 1) as f64);
                out.push(DataPoint {
                    date: point.date,
                    value: average,
                });
                average
            } else {
                point.value
            };
            history.push(next);
            if history.len() > window {
                history.remove(0);
            }
            (history, out)
        },
    );
    smoothed
}
