use std::cmp::Ordering;
use std::fmt::Debug;

use crate::config::CountyKey;
use crate::reference::ReferenceDirectory;

/// Arithmetic needed by the pipeline on the values it outputs.
///
/// Averages are computed through `f64`, the common comparison representation.
pub trait SeriesValue: Copy + PartialOrd + Debug {
    fn zero() -> Self;
    fn add(self, other: Self) -> Self;
    fn subtract(self, other: Self) -> Self;
    fn compare(&self, other: &Self) -> Ordering;
    fn to_comparable(self) -> f64;
    fn from_comparable(value: f64) -> Self;

    fn max_of(self, other: Self) -> Self {
        if other.compare(&self) == Ordering::Greater {
            other
        } else {
            self
        }
    }
}

impl SeriesValue for i64 {
    fn zero() -> Self {
        0
    }

    fn add(self, other: Self) -> Self {
        self + other
    }

    fn subtract(self, other: Self) -> Self {
        self - other
    }

    fn compare(&self, other: &Self) -> Ordering {
        self.cmp(other)
    }

    fn to_comparable(self) -> f64 {
        self as f64
    }

    // Rounds half away from zero.
    fn from_comparable(value: f64) -> Self {
        value.round() as i64
    }
}

impl SeriesValue for f64 {
    fn zero() -> Self {
        0.0
    }

    fn add(self, other: Self) -> Self {
        self + other
    }

    fn subtract(self, other: Self) -> Self {
        self - other
    }

    fn compare(&self, other: &Self) -> Ordering {
        self.partial_cmp(other).unwrap_or(Ordering::Equal)
    }

    fn to_comparable(self) -> f64 {
        self
    }

    fn from_comparable(value: f64) -> Self {
        value
    }
}

/// Converts raw cumulative counts into the value type of a pipeline run.
///
/// Returning None for a county removes it from the run.
pub trait NumericContext {
    type Value: SeriesValue;

    fn convert(&self, raw: i64, key: &CountyKey) -> Option<Self::Value>;
}

/// Raw counts, unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct IdentityContext;

impl NumericContext for IdentityContext {
    type Value = i64;

    fn convert(&self, raw: i64, _key: &CountyKey) -> Option<i64> {
        Some(raw)
    }
}

/// Counts divided by the county population.
///
/// Counties without a known (or with a zero) population have no per-capita value.
#[derive(Debug, Clone, Copy)]
pub struct PerCapitaContext<'a> {
    directory: &'a ReferenceDirectory,
}

impl<'a> PerCapitaContext<'a> {
    pub fn new(directory: &'a ReferenceDirectory) -> PerCapitaContext<'a> {
        PerCapitaContext { directory }
    }
}

impl<'a> NumericContext for PerCapitaContext<'a> {
    type Value = f64;

    fn convert(&self, raw: i64, key: &CountyKey) -> Option<f64> {
        match self.directory.population(key) {
            Some(population) if population > 0 => Some(raw as f64 / population as f64),
            _ => None,
        }
    }
}
