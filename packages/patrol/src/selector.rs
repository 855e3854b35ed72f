//! Chooses the locations a patrol route should visit.

use crime_radar_forecast_models::{CrimeTypeCount, ForecastResult, PredictedHotspot};
use crime_radar_incident::IncidentStore;
use crime_radar_incident_models::{CrimeType, IncidentRecord, station_matches};
use crime_radar_patrol_models::HotspotCandidate;

/// Most oracle hotspots kept for one route.
pub const MAX_HOTSPOTS: usize = 7;

/// Past incidents kept when deriving hotspots from the store.
pub const DERIVED_HOTSPOTS: usize = 5;

/// Predicted crime types considered when deriving hotspots.
pub const TOP_CRIME_TYPES: usize = 3;

/// Picks up to [`MAX_HOTSPOTS`] candidates for a forecast.
///
/// When the oracle supplied hotspots, those are used as-is (capped).
/// Otherwise the most-predicted crime types are ranked by count and the
/// first [`DERIVED_HOTSPOTS`] past incidents of those types at `station`
/// become candidates, higher-ranked types first. A forecast without a
/// predicted breakdown yields no candidates.
#[must_use]
pub fn select_hotspots(
    forecast: &ForecastResult,
    store: &IncidentStore,
    station: &str,
) -> Vec<HotspotCandidate> {
    if !forecast.predicted_hotspots.is_empty() {
        log::debug!(
            "Using {} oracle hotspots (cap {MAX_HOTSPOTS})",
            forecast.predicted_hotspots.len()
        );
        return forecast
            .predicted_hotspots
            .iter()
            .take(MAX_HOTSPOTS)
            .zip(1_usize..)
            .map(|(hotspot, n)| from_oracle(hotspot, n))
            .collect();
    }

    let ranked = top_crime_types(&forecast.predicted_crime_type_breakdown);
    if ranked.is_empty() {
        log::debug!("No predicted breakdown, no hotspots to derive");
        return vec![];
    }

    let mut matching: Vec<(usize, &IncidentRecord)> = store
        .records()
        .iter()
        .filter(|record| station_matches(station, &record.police_station))
        .filter_map(|record| {
            ranked
                .iter()
                .position(|crime_type| *crime_type == record.crime_type)
                .map(|rank| (rank, record))
        })
        .collect();
    matching.sort_by_key(|(rank, _)| *rank);

    let candidates: Vec<HotspotCandidate> = matching
        .into_iter()
        .take(DERIVED_HOTSPOTS)
        .map(|(_, record)| from_incident(record))
        .collect();

    log::debug!(
        "Derived {} hotspots for station '{station}' from crime types {ranked:?}",
        candidates.len()
    );

    candidates
}

/// Crime types with the highest predicted counts, most first. Equal
/// counts keep breakdown order.
fn top_crime_types(breakdown: &[CrimeTypeCount]) -> Vec<CrimeType> {
    let mut ranked: Vec<&CrimeTypeCount> = breakdown.iter().collect();
    ranked.sort_by(|a, b| b.count.cmp(&a.count));
    ranked
        .into_iter()
        .take(TOP_CRIME_TYPES)
        .map(|entry| entry.crime_type.clone())
        .collect()
}

fn from_oracle(hotspot: &PredictedHotspot, n: usize) -> HotspotCandidate {
    HotspotCandidate {
        source_id: n.to_string(),
        position: hotspot.position,
        label: hotspot.location_name.clone(),
        description: hotspot.reason.clone(),
        risk_level: Some(hotspot.risk_level),
        predicted_crime_type: Some(hotspot.predicted_crime_type.clone()),
    }
}

fn from_incident(record: &IncidentRecord) -> HotspotCandidate {
    HotspotCandidate {
        source_id: record.id.clone(),
        position: record.position,
        label: format!("{} Hotspot", record.crime_type),
        description: format!(
            "Near {} station, reported on {}.",
            record.police_station,
            record.date.format("%Y-%m-%d")
        ),
        risk_level: None,
        predicted_crime_type: Some(record.crime_type.clone()),
    }
}
