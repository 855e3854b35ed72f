//! Historical aggregation over the incident store.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use crime_radar_forecast_models::{CrimeTypeCount, DailyCount, DateRangeFilter};
use crime_radar_incident::IncidentStore;
use crime_radar_incident_models::station_matches;

/// Past-day counts and the list of future days for one forecast request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoricalAggregate {
    /// One entry per past day (day <= today) of the range, in date order.
    pub daily: Vec<DailyCount>,
    /// Past-day counts per requested crime type, zero-filled, in request
    /// order.
    pub breakdown: Vec<CrimeTypeCount>,
    /// Days of the range after today, in date order.
    pub future_dates: Vec<NaiveDate>,
}

impl HistoricalAggregate {
    /// Total incidents across all past days.
    #[must_use]
    pub fn total(&self) -> u32 {
        self.daily.iter().map(|d| d.count).sum()
    }

    /// Plain-language summary handed to the forecast oracle.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn summary(&self, filter: &DateRangeFilter) -> String {
        let total = self.total();
        let days = self.daily.len().max(1);
        let types = filter
            .requested_types()
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", ");

        format!(
            "For police station '{station}' and crime types [{types}], there were a total of \
             {total} incidents over the last {days} days. The daily average was about \
             {average:.1} incidents.",
            station = filter.police_station,
            average = f64::from(total) / days as f64,
        )
    }
}

/// Counts matching incidents per past day and per crime type.
///
/// Days of the range up to and including `today` are historical; later
/// days are returned as `future_dates`. Only incidents matching the
/// station filter and one of the requested crime types, dated within
/// `[start_date, min(end_date, today)]`, are counted. Records are bucketed
/// into days by the store's day boundary, which should be the one `today`
/// was taken from.
#[must_use]
pub fn aggregate(
    store: &IncidentStore,
    filter: &DateRangeFilter,
    today: NaiveDate,
) -> HistoricalAggregate {
    let (past_days, future_dates): (Vec<NaiveDate>, Vec<NaiveDate>) =
        filter.date_range.days().partition(|day| *day <= today);

    let types = filter.requested_types();
    let mut counts: BTreeMap<NaiveDate, u32> = past_days.iter().map(|day| (*day, 0)).collect();
    let mut breakdown: Vec<CrimeTypeCount> = types
        .iter()
        .map(|crime_type| CrimeTypeCount {
            crime_type: crime_type.clone(),
            count: 0,
        })
        .collect();

    let history_end = filter.date_range.end_date.min(today);
    let matching = store
        .between(filter.date_range.start_date, history_end, &types)
        .filter(|record| station_matches(&filter.police_station, &record.police_station));

    for record in matching {
        if let Some(count) = counts.get_mut(&store.day_of(record)) {
            *count += 1;
        }
        if let Some(entry) = breakdown
            .iter_mut()
            .find(|entry| entry.crime_type == record.crime_type)
        {
            entry.count += 1;
        }
    }

    log::debug!(
        "Aggregated {} past days and {} future days for station '{}'",
        counts.len(),
        future_dates.len(),
        filter.police_station,
    );

    HistoricalAggregate {
        daily: counts
            .into_iter()
            .map(|(date, count)| DailyCount { date, count })
            .collect(),
        breakdown,
        future_dates,
    }
}
