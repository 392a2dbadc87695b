use log::{debug, info, warn};
use snafu::prelude::*;

use std::collections::{BTreeMap, BTreeSet, HashMap};

use crate::config::*;

/// Metro name used for the counties outside of any metro area.
pub const RURAL: &str = "Rural";

// Population given to the "other category" keys that the census table does not list.
const OTHER_CATEGORY_POPULATION: u64 = 20000;

// Metro areas at or below this population are not considered major.
const MAJOR_METRO_POPULATION: u64 = 1_000_000;

// Column positions are fixed. The last three are optional.
const STATE_COLUMN: (usize, &str) = (0, "STATE");
const COUNTY_COLUMN: (usize, &str) = (1, "COUNTY");
const METRO_NAME_COLUMN: (usize, &str) = (2, "METRO_NAME");
const POPULATION_COLUMN: (usize, &str) = (3, "POPESTIMATE2019");
const LATITUDE_COLUMN: (usize, &str) = (4, "LATITUDE");
const LONGITUDE_COLUMN: (usize, &str) = (5, "LONGITUDE");
const METRO_POPULATION_COLUMN: (usize, &str) = (6, "METRO_POPULATION");

#[derive(PartialEq, Debug, Clone)]
pub struct ReferenceEntry {
    pub population: u64,
    pub metro_name: String,
    pub location: Option<Location>,
}

/// A major metro area, located at its most populated county.
#[derive(PartialEq, Debug, Clone)]
pub struct MetroRecord {
    pub name: String,
    /// Sum of the populations of the member counties.
    pub population: u64,
    /// The METRO_POPULATION column, when the table has one.
    pub reported_population: Option<u64>,
    pub location: Location,
    pub state: String,
    pub county: String,
    largest_county: u64,
}

/// The census reference table: population and metro area of every county.
///
/// Built once per data refresh, then shared read-only.
#[derive(PartialEq, Debug, Clone, Default)]
pub struct ReferenceDirectory {
    entries: HashMap<CountyKey, ReferenceEntry>,
    states: Vec<String>,
    major_metros: BTreeMap<String, MetroRecord>,
}

impl ReferenceDirectory {
    /// Parses the comma-delimited census table.
    ///
    /// The header must list the columns in the expected order. Lines that are too short
    /// to hold every checked column are skipped.
    pub fn load(text: &str) -> SeriesResult<ReferenceDirectory> {
        let mut records = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(text.as_bytes())
            .into_records();

        let header = records
            .next()
            .context(EmptyReferenceSnafu {})?
            .context(ReferenceLineSnafu { lineno: 1_u64 })?;
        let has_location = header.len() > LONGITUDE_COLUMN.0;
        let has_metro_population = header.len() > METRO_POPULATION_COLUMN.0;

        let mut checked = vec![STATE_COLUMN, COUNTY_COLUMN, METRO_NAME_COLUMN, POPULATION_COLUMN];
        if has_location {
            checked.push(LATITUDE_COLUMN);
            checked.push(LONGITUDE_COLUMN);
        }
        if has_metro_population {
            checked.push(METRO_POPULATION_COLUMN);
        }
        for (index, expected) in checked.iter() {
            let found = header.get(*index).unwrap_or("");
            ensure!(
                found == *expected,
                HeaderMismatchSnafu {
                    index: *index,
                    expected: *expected,
                    found,
                }
            );
        }
        let min_cells = checked.iter().map(|(idx, _)| *idx).max().unwrap_or(0) + 1;
        debug!(
            "load: header validated, location: {:?}, metro population: {:?}",
            has_location, has_metro_population
        );

        let mut entries: HashMap<CountyKey, ReferenceEntry> = HashMap::new();
        let mut states: BTreeSet<String> = BTreeSet::new();
        let mut metros: BTreeMap<String, MetroRecord> = BTreeMap::new();

        for (idx, record_r) in records.enumerate() {
            let lineno = (idx + 2) as u64;
            let record = record_r.context(ReferenceLineSnafu { lineno })?;
            if record.len() < min_cells {
                debug!("load: skipping short line {}: {:?}", lineno, record);
                continue;
            }
            let cell = |idx: usize| record.get(idx).unwrap_or("");

            let state = cell(STATE_COLUMN.0);
            let county = cell(COUNTY_COLUMN.0);
            let key = CountyKey::new(state, county);
            if entries.contains_key(&key) {
                warn!(
                    "load: line {}: {} is listed more than once, keeping the first one",
                    lineno, key
                );
                continue;
            }
            let metro_name = match cell(METRO_NAME_COLUMN.0) {
                "" => RURAL,
                x => x,
            };
            let population = cell(POPULATION_COLUMN.0).parse::<u64>().unwrap_or(0);
            let location = if has_location {
                Some(Location {
                    latitude: cell(LATITUDE_COLUMN.0).parse::<f64>().unwrap_or(0.0),
                    longitude: cell(LONGITUDE_COLUMN.0).parse::<f64>().unwrap_or(0.0),
                })
            } else {
                None
            };
            let reported_population = if has_metro_population {
                cell(METRO_POPULATION_COLUMN.0).parse::<u64>().ok()
            } else {
                None
            };

            if metro_name != RURAL {
                add_to_metro(
                    &mut metros,
                    metro_name,
                    state,
                    county,
                    population,
                    location,
                    reported_population,
                );
            }

            entries.insert(
                key,
                ReferenceEntry {
                    population,
                    metro_name: metro_name.to_string(),
                    location,
                },
            );
            states.insert(state.to_string());
        }

        metros.retain(|_, m| m.population > MAJOR_METRO_POPULATION && !m.location.is_zero());
        info!(
            "Loaded reference data: {} counties, {} states, {} major metros",
            entries.len(),
            states.len(),
            metros.len()
        );

        Ok(ReferenceDirectory {
            entries,
            states: states.into_iter().collect(),
            major_metros: metros,
        })
    }

    pub fn entry(&self, key: &CountyKey) -> Option<&ReferenceEntry> {
        self.entries.get(key)
    }

    pub fn population(&self, key: &CountyKey) -> Option<u64> {
        match self.entries.get(key) {
            Some(e) => Some(e.population),
            None if key.is_other_category() => Some(OTHER_CATEGORY_POPULATION),
            None => None,
        }
    }

    pub fn metro_name(&self, key: &CountyKey) -> Option<&str> {
        match self.entries.get(key) {
            Some(e) => Some(e.metro_name.as_str()),
            None if key.is_other_category() => Some(RURAL),
            None => None,
        }
    }

    /// All the states seen in the table, sorted.
    pub fn states(&self) -> &[String] {
        &self.states
    }

    pub fn major_metros(&self) -> impl Iterator<Item = &MetroRecord> {
        self.major_metros.values()
    }

    pub fn major_metro(&self, name: &str) -> Option<&MetroRecord> {
        self.major_metros.get(name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// The representative location is the one of the largest county. On a tie, the first
// county seen keeps it.
fn add_to_metro(
    metros: &mut BTreeMap<String, MetroRecord>,
    metro_name: &str,
    state: &str,
    county: &str,
    population: u64,
    location: Option<Location>,
    reported_population: Option<u64>,
) {
    let location = location.unwrap_or(Location::ZERO);
    match metros.get_mut(metro_name) {
        Some(m) => {
            m.population += population;
            if m.reported_population.is_none() {
                m.reported_population = reported_population;
            }
            if population > m.largest_county {
                m.largest_county = population;
                m.location = location;
                m.state = state.to_string();
                m.county = county.to_string();
            }
        }
        None => {
            metros.insert(
                metro_name.to_string(),
                MetroRecord {
                    name: metro_name.to_string(),
                    population,
                    reported_population,
                    location,
                    state: state.to_string(),
                    county: county.to_string(),
                    largest_county: population,
                },
            );
        }
    }
}
