//! Great-circle distances.

use crime_radar_incident_models::Position;

/// Mean Earth radius used for all distance calculations.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Haversine distance between two positions, in kilometres.
#[must_use]
pub fn haversine_km(a: Position, b: Position) -> f64 {
    let d_lat = (b.lat - a.lat).to_radians();
    let d_lng = (b.lng - a.lng).to_radians();

    let h = (a.lat.to_radians().cos() * b.lat.to_radians().cos())
        .mul_add((d_lng / 2.0).sin().powi(2), (d_lat / 2.0).sin().powi(2));

    EARTH_RADIUS_KM * 2.0 * h.sqrt().atan2((1.0 - h).sqrt())
}

/// Sum of the legs between consecutive positions.
#[must_use]
pub fn route_distance_km(positions: &[Position]) -> f64 {
    positions
        .windows(2)
        .map(|leg| haversine_km(leg[0], leg[1]))
        .sum()
}
