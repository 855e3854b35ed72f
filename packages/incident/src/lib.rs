#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! In-memory incident store for the crime radar dashboard.
//!
//! The store is generated once at process start from the embedded mock
//! dataset definition and is read-only afterwards, so it can be shared
//! between requests without locking. The [`tools`] module implements the
//! `get_crime_data` tool that the chat assistant invokes.

pub mod dataset;
pub mod generator;
pub mod tools;

use chrono::{DateTime, NaiveDate, Utc};
use crime_radar_incident_models::{CrimeType, DayBoundary, IncidentRecord, PoliceStation};
use thiserror::Error;

use crate::dataset::DatasetConfig;

/// Errors that can occur while building or querying the incident store.
#[derive(Debug, Error)]
pub enum IncidentError {
    /// A date filter could not be parsed.
    #[error("Invalid date '{value}': {message}")]
    InvalidDate {
        /// The rejected input.
        value: String,
        /// Why it was rejected.
        message: String,
    },

    /// The dataset definition is unusable.
    #[error("Dataset error: {message}")]
    Dataset {
        /// Description of what went wrong.
        message: String,
    },
}

/// Read-only collection of incident records.
#[derive(Debug, Clone, Default)]
pub struct IncidentStore {
    records: Vec<IncidentRecord>,
    stations: Vec<PoliceStation>,
    crime_types: Vec<CrimeType>,
    day_boundary: DayBoundary,
}

impl IncidentStore {
    /// Creates a store over an explicit set of records.
    ///
    /// Station and crime type listings are derived from the records in
    /// first-seen order.
    #[must_use]
    pub fn new(records: Vec<IncidentRecord>) -> Self {
        let mut station_names: Vec<String> = Vec::new();
        let mut crime_types: Vec<CrimeType> = Vec::new();
        for record in &records {
            if !station_names.contains(&record.police_station) {
                station_names.push(record.police_station.clone());
            }
            if !crime_types.contains(&record.crime_type) {
                crime_types.push(record.crime_type.clone());
            }
        }

        let stations = station_names
            .into_iter()
            .map(|name| PoliceStation {
                value: name.clone(),
                label: name,
            })
            .collect();

        Self {
            records,
            stations,
            crime_types,
            day_boundary: DayBoundary::default(),
        }
    }

    /// Generates the mock dataset described by `config`, anchored at
    /// `anchor`.
    #[must_use]
    pub fn generate(config: &DatasetConfig, anchor: DateTime<Utc>) -> Self {
        let records = generator::generate(config, anchor);
        log::info!(
            "Generated {} mock incidents (seed {}, {} stations, {} crime types)",
            records.len(),
            config.seed,
            config.stations.len(),
            config.crime_types.len(),
        );

        Self {
            records,
            stations: config.station_options(),
            crime_types: config.crime_types.clone(),
            day_boundary: DayBoundary::default(),
        }
    }

    /// Replaces the time zone used to split records into calendar days.
    /// Stores start on [`DayBoundary::Local`].
    #[must_use]
    pub const fn with_day_boundary(mut self, day_boundary: DayBoundary) -> Self {
        self.day_boundary = day_boundary;
        self
    }

    /// Time zone used to split records into calendar days.
    #[must_use]
    pub const fn day_boundary(&self) -> DayBoundary {
        self.day_boundary
    }

    /// Calendar day `record` falls on under this store's day boundary.
    #[must_use]
    pub fn day_of(&self, record: &IncidentRecord) -> NaiveDate {
        self.day_boundary.day_of(record.date)
    }

    /// The current calendar day under this store's day boundary.
    #[must_use]
    pub fn today(&self) -> NaiveDate {
        self.day_boundary.today()
    }

    /// All records in generation order.
    #[must_use]
    pub fn records(&self) -> &[IncidentRecord] {
        &self.records
    }

    /// Number of records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the store holds no records.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Station options for the dashboard filters.
    #[must_use]
    pub fn stations(&self) -> &[PoliceStation] {
        &self.stations
    }

    /// Crime types present in the dataset.
    #[must_use]
    pub fn crime_types(&self) -> &[CrimeType] {
        &self.crime_types
    }

    /// Returns records dated within `[from, to]` (inclusive, by calendar
    /// day under [`Self::day_boundary`]) whose type is one of `types`.
    pub fn between<'a>(
        &'a self,
        from: NaiveDate,
        to: NaiveDate,
        types: &'a [CrimeType],
    ) -> impl Iterator<Item = &'a IncidentRecord> + 'a {
        self.records.iter().filter(move |record| {
            let day = self.day_of(record);
            day >= from && day <= to && types.contains(&record.crime_type)
        })
    }
}
