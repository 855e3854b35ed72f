//! Orders hotspot candidates into a patrol route.

use crime_radar_incident_models::Position;
use crime_radar_patrol_models::{Hotspot, HotspotCandidate, PatrolRoute, RouteOrdering};

use crate::geo::{haversine_km, route_distance_km};

/// Average patrol speed used for the time estimate.
pub const PATROL_SPEED_KMH: f64 = 20.0;

/// Builds a patrol route visiting every candidate once.
///
/// Stops get contiguous 1-based `order` values in visiting order. Routes
/// with fewer than two stops report zero distance and time.
#[must_use]
pub fn build_route(candidates: Vec<HotspotCandidate>, ordering: RouteOrdering) -> PatrolRoute {
    let ordered = match ordering {
        RouteOrdering::Latitude => by_latitude(candidates),
        RouteOrdering::NearestNeighbor => nearest_neighbor(by_latitude(candidates)),
    };

    let positions: Vec<Position> = ordered.iter().map(|c| c.position).collect();
    let distance_km = if positions.len() < 2 {
        0.0
    } else {
        route_distance_km(&positions)
    };
    let minutes = estimated_minutes(distance_km);

    let hotspots: Vec<Hotspot> = ordered
        .into_iter()
        .zip(1_u32..)
        .map(|(candidate, order)| Hotspot {
            id: format!("hs-{}", candidate.source_id),
            name: format!("{order}. {}", candidate.label),
            description: candidate.description,
            position: candidate.position,
            order,
            risk_level: candidate.risk_level,
            predicted_crime_type: candidate.predicted_crime_type,
        })
        .collect();

    log::debug!(
        "Built {ordering} patrol route with {} stops over {distance_km:.1} km",
        hotspots.len()
    );

    PatrolRoute {
        hotspots,
        total_distance: format!("{distance_km:.1} km"),
        estimated_time: format!("{minutes} min"),
    }
}

/// Patrol time at [`PATROL_SPEED_KMH`], rounded to whole minutes.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn estimated_minutes(distance_km: f64) -> u64 {
    (distance_km / PATROL_SPEED_KMH * 60.0).round().max(0.0) as u64
}

/// Stable sort, south to north.
fn by_latitude(mut candidates: Vec<HotspotCandidate>) -> Vec<HotspotCandidate> {
    candidates.sort_by(|a, b| a.position.lat.total_cmp(&b.position.lat));
    candidates
}

/// Greedy tour from the first (southernmost) candidate. Ties go to the
/// earlier candidate.
fn nearest_neighbor(mut remaining: Vec<HotspotCandidate>) -> Vec<HotspotCandidate> {
    let mut tour = Vec::with_capacity(remaining.len());
    if remaining.is_empty() {
        return tour;
    }
    let mut current = remaining.remove(0);

    while !remaining.is_empty() {
        let mut best = 0;
        let mut best_km = f64::INFINITY;
        for (i, candidate) in remaining.iter().enumerate() {
            let km = haversine_km(current.position, candidate.position);
            if km < best_km {
                best = i;
                best_km = km;
            }
        }
        tour.push(std::mem::replace(&mut current, remaining.remove(best)));
    }
    tour.push(current);

    tour
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(id: &str, lat: f64, lng: f64) -> HotspotCandidate {
        HotspotCandidate {
            source_id: id.to_string(),
            position: Position::new(lat, lng),
            label: format!("{id} Hotspot"),
            description: String::new(),
            risk_level: None,
            predicted_crime_type: None,
        }
    }

    fn ids(route: &PatrolRoute) -> Vec<&str> {
        route.hotspots.iter().map(|h| h.id.as_str()).collect()
    }

    #[test]
    fn orders_three_points_south_to_north() {
        let route = build_route(
            vec![
                candidate("a", 28.60, 77.20),
                candidate("b", 28.61, 77.21),
                candidate("c", 28.59, 77.19),
            ],
            RouteOrdering::Latitude,
        );

        assert_eq!(ids(&route), ["hs-c", "hs-a", "hs-b"]);
        assert_eq!(
            route.hotspots.iter().map(|h| h.order).collect::<Vec<_>>(),
            [1, 2, 3]
        );
        assert_eq!(route.hotspots[0].name, "1. c Hotspot");

        let leg1 = haversine_km(Position::new(28.59, 77.19), Position::new(28.60, 77.20));
        let leg2 = haversine_km(Position::new(28.60, 77.20), Position::new(28.61, 77.21));
        assert_eq!(route.total_distance, format!("{:.1} km", leg1 + leg2));
        assert_eq!(route.total_distance, "3.0 km");
        assert_eq!(route.estimated_time, "9 min");
    }

    #[test]
    fn degenerate_routes_have_zero_summary() {
        let empty = build_route(vec![], RouteOrdering::Latitude);
        assert!(empty.hotspots.is_empty());
        assert_eq!(empty.total_distance, "0.0 km");
        assert_eq!(empty.estimated_time, "0 min");

        let single = build_route(
            vec![candidate("a", 28.6, 77.2)],
            RouteOrdering::NearestNeighbor,
        );
        assert_eq!(single.hotspots.len(), 1);
        assert_eq!(single.hotspots[0].order, 1);
        assert_eq!(single.total_distance, "0.0 km");
        assert_eq!(single.estimated_time, "0 min");
    }

    #[test]
    fn nearest_neighbor_starts_south_and_goes_greedy() {
        let candidates = vec![
            candidate("b", 28.60, 77.30),
            candidate("d", 28.70, 77.00),
            candidate("a", 28.50, 77.00),
            candidate("c", 28.52, 77.01),
        ];

        let latitude = build_route(candidates.clone(), RouteOrdering::Latitude);
        assert_eq!(ids(&latitude), ["hs-a", "hs-c", "hs-b", "hs-d"]);

        let greedy = build_route(candidates, RouteOrdering::NearestNeighbor);
        assert_eq!(ids(&greedy), ["hs-a", "hs-c", "hs-d", "hs-b"]);
        assert_eq!(
            greedy.hotspots.iter().map(|h| h.order).collect::<Vec<_>>(),
            [1, 2, 3, 4]
        );
    }

    #[test]
    fn estimated_minutes_rounds_to_nearest_minute() {
        assert_eq!(estimated_minutes(0.0), 0);
        assert_eq!(estimated_minutes(0.1), 0);
        assert_eq!(estimated_minutes(0.25), 1);
        assert_eq!(estimated_minutes(10.0), 30);
    }

    #[test]
    fn equal_latitudes_keep_input_order() {
        let route = build_route(
            vec![candidate("x", 28.6, 77.3), candidate("y", 28.6, 77.1)],
            RouteOrdering::Latitude,
        );
        assert_eq!(ids(&route), ["hs-x", "hs-y"]);
    }
}
