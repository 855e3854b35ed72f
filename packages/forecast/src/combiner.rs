//! Merges historical counts and oracle predictions into one series.

use std::collections::BTreeSet;

use chrono::NaiveDate;
use crime_radar_forecast_models::{
    CrimeTypeCount, DailyCountPoint, ForecastResult, OracleResponse,
};
use crime_radar_incident_models::CrimeType;

use crate::aggregator::HistoricalAggregate;

/// Combines the historical aggregate with the oracle's answer.
///
/// `oracle` is `None` when the oracle was skipped or failed. The daily
/// series always holds exactly one point per day of the requested range:
/// oracle predictions outside the future dates, and repeated dates after
/// the first, are ignored; future dates the oracle missed get a
/// prediction of zero.
///
/// The predicted breakdown is reconciled to `requested_types` (oracle
/// counts where given, zero otherwise) when the oracle answered, and is
/// empty when it did not.
#[must_use]
pub fn combine(
    aggregate: &HistoricalAggregate,
    oracle: Option<&OracleResponse>,
    requested_types: &[CrimeType],
) -> ForecastResult {
    let future: BTreeSet<NaiveDate> = aggregate.future_dates.iter().copied().collect();
    let mut covered: BTreeSet<NaiveDate> = BTreeSet::new();

    let mut daily_data: Vec<DailyCountPoint> = aggregate
        .daily
        .iter()
        .copied()
        .map(DailyCountPoint::from)
        .collect();

    if let Some(response) = oracle {
        for prediction in &response.daily_predictions {
            if future.contains(&prediction.date) && covered.insert(prediction.date) {
                daily_data.push(DailyCountPoint::predicted(
                    prediction.date,
                    prediction.predicted_count.unwrap_or(0),
                ));
            }
        }
    }

    let missing = future.difference(&covered).count();
    if oracle.is_some() && missing > 0 {
        log::debug!("Gap-filling {missing} future dates the oracle did not predict");
    }
    daily_data.extend(
        future
            .difference(&covered)
            .map(|date| DailyCountPoint::predicted(*date, 0)),
    );

    daily_data.sort_by_key(|point| point.date);

    let predicted_crime_type_breakdown = oracle
        .map(|response| reconcile_breakdown(&response.predicted_breakdown, requested_types))
        .unwrap_or_default();

    let predicted_hotspots = oracle
        .and_then(|response| response.predicted_hotspots.clone())
        .unwrap_or_default();

    ForecastResult {
        daily_data,
        predicted_crime_type_breakdown,
        historical_crime_type_breakdown: aggregate.breakdown.clone(),
        predicted_hotspots,
    }
}

/// Maps the oracle's breakdown onto the requested crime types.
///
/// Types are matched by name ignoring case; the first entry for a type
/// wins, and types the oracle did not name count zero. Entries for types
/// that were not requested are dropped.
#[must_use]
pub fn reconcile_breakdown(
    predicted: &[CrimeTypeCount],
    requested_types: &[CrimeType],
) -> Vec<CrimeTypeCount> {
    requested_types
        .iter()
        .map(|crime_type| CrimeTypeCount {
            crime_type: crime_type.clone(),
            count: predicted
                .iter()
                .find(|entry| crime_type.eq_ignore_case(entry.crime_type.as_str()))
                .map_or(0, |entry| entry.count),
        })
        .collect()
}
