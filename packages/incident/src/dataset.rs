//! Mock dataset definition, embedded at compile time.
//!
//! The dataset TOML in `packages/incident/dataset.toml` is baked into the
//! binary via [`include_str!`]. It names the police stations, crime types,
//! and city bounds that the generator draws from.

use crime_radar_incident_models::{ALL_STATIONS, CrimeType, PoliceStation};
use serde::Deserialize;

use crate::IncidentError;

/// Dataset TOML embedded at compile time.
const DATASET_TOML: &str = include_str!("../dataset.toml");

/// Latitude/longitude rectangle that generated incidents fall within.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct Bounds {
    /// Northern latitude limit.
    pub north: f64,
    /// Southern latitude limit.
    pub south: f64,
    /// Western longitude limit.
    pub west: f64,
    /// Eastern longitude limit.
    pub east: f64,
}

/// Parameters for the seeded mock incident generator.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DatasetConfig {
    /// Initial generator seed.
    pub seed: u64,
    /// Number of incidents to generate.
    pub record_count: usize,
    /// Incidents are spread over this many days before the anchor date.
    pub lookback_days: u32,
    /// Prefix for generated incident IDs.
    pub id_prefix: String,
    /// Number added to the record index to form its ID.
    pub id_offset: usize,
    /// Police station names (without the "all" sentinel).
    pub stations: Vec<String>,
    /// Crime types incidents are drawn from.
    pub crime_types: Vec<CrimeType>,
    /// City bounds.
    pub bounds: Bounds,
}

impl DatasetConfig {
    /// Loads the dataset definition embedded in the binary.
    ///
    /// # Errors
    ///
    /// Returns [`IncidentError::Dataset`] if the embedded TOML fails to
    /// parse or describes an unusable dataset.
    pub fn embedded() -> Result<Self, IncidentError> {
        Self::parse(DATASET_TOML)
    }

    /// Parses and validates a dataset definition.
    ///
    /// # Errors
    ///
    /// Returns [`IncidentError::Dataset`] if the TOML fails to parse or
    /// describes an unusable dataset.
    pub fn parse(toml_str: &str) -> Result<Self, IncidentError> {
        let config: Self = toml::de::from_str(toml_str).map_err(|e| IncidentError::Dataset {
            message: format!("failed to parse dataset definition: {e}"),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Returns a copy of this definition with a different generator seed.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Returns the station options for the dashboard filter, starting with
    /// the "all stations" sentinel.
    #[must_use]
    pub fn station_options(&self) -> Vec<PoliceStation> {
        std::iter::once(PoliceStation {
            value: ALL_STATIONS.to_string(),
            label: "All Stations".to_string(),
        })
        .chain(self.stations.iter().map(|name| PoliceStation {
            value: name.clone(),
            label: name.clone(),
        }))
        .collect()
    }

    fn validate(&self) -> Result<(), IncidentError> {
        if self.stations.is_empty() {
            return Err(IncidentError::Dataset {
                message: "dataset must name at least one police station".to_string(),
            });
        }
        if self.stations.iter().any(|s| s == ALL_STATIONS) {
            return Err(IncidentError::Dataset {
                message: format!("'{ALL_STATIONS}' is reserved and cannot be a station name"),
            });
        }
        if self.crime_types.is_empty() {
            return Err(IncidentError::Dataset {
                message: "dataset must name at least one crime type".to_string(),
            });
        }
        if self.bounds.south >= self.bounds.north || self.bounds.west >= self.bounds.east {
            return Err(IncidentError::Dataset {
                message: "dataset bounds are empty or inverted".to_string(),
            });
        }
        if self.lookback_days == 0 {
            return Err(IncidentError::Dataset {
                message: "lookback_days must be at least 1".to_string(),
            });
        }
        Ok(())
    }
}
