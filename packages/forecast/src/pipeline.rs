//! The forecast request pipeline.

use std::{sync::Arc, time::Duration};

use chrono::NaiveDate;
use crime_radar_forecast_models::{DateRangeFilter, ForecastResult, OracleRequest, OracleResponse};
use crime_radar_incident::IncidentStore;

use crate::{
    ForecastOracle, OracleError,
    aggregator::{HistoricalAggregate, aggregate},
    combiner::combine,
};

/// Default upper bound on a single oracle call.
pub const DEFAULT_ORACLE_TIMEOUT: Duration = Duration::from_secs(30);

/// Tunables for [`Forecaster`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ForecastConfig {
    /// How long to wait for the oracle before falling back.
    pub oracle_timeout: Duration,
}

impl Default for ForecastConfig {
    fn default() -> Self {
        Self {
            oracle_timeout: DEFAULT_ORACLE_TIMEOUT,
        }
    }
}

/// Produces dashboard forecasts from the incident store and an oracle.
#[derive(Clone)]
pub struct Forecaster {
    store: Arc<IncidentStore>,
    oracle: Arc<dyn ForecastOracle>,
    config: ForecastConfig,
}

impl std::fmt::Debug for Forecaster {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Forecaster")
            .field("records", &self.store.len())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Forecaster {
    /// Creates a forecaster over `store` backed by `oracle`.
    #[must_use]
    pub fn new(
        store: Arc<IncidentStore>,
        oracle: Arc<dyn ForecastOracle>,
        config: ForecastConfig,
    ) -> Self {
        Self {
            store,
            oracle,
            config,
        }
    }

    /// The incident store forecasts are computed over.
    #[must_use]
    pub const fn store(&self) -> &Arc<IncidentStore> {
        &self.store
    }

    /// Runs a forecast for `filter`, treating `today` as the last
    /// historical day.
    ///
    /// Never fails: an incomplete filter yields an empty result, and any
    /// oracle failure yields the historical series with zero predictions.
    pub async fn predict(&self, filter: &DateRangeFilter, today: NaiveDate) -> ForecastResult {
        if !filter.is_complete() {
            log::warn!(
                "Incomplete forecast filter (crime types: {}, range: {} to {}), returning empty result",
                filter.crime_types.len(),
                filter.date_range.start_date,
                filter.date_range.end_date,
            );
            return ForecastResult::empty();
        }

        let requested_types = filter.requested_types();
        let historical = aggregate(&self.store, filter, today);

        if historical.future_dates.is_empty() {
            log::debug!("No future dates in range, skipping forecast oracle");
            return combine(&historical, None, &requested_types);
        }

        match self.ask_oracle(filter, &historical).await {
            Ok(response) => {
                log::info!(
                    "Forecast oracle returned {} daily predictions for {} future dates",
                    response.daily_predictions.len(),
                    historical.future_dates.len(),
                );
                combine(&historical, Some(&response), &requested_types)
            }
            Err(e) => {
                log::warn!("Falling back to historical data only: {e}");
                combine(&historical, None, &requested_types)
            }
        }
    }

    async fn ask_oracle(
        &self,
        filter: &DateRangeFilter,
        historical: &HistoricalAggregate,
    ) -> Result<OracleResponse, OracleError> {
        let request = OracleRequest {
            historical_summary: historical.summary(filter),
            future_dates: historical.future_dates.clone(),
            crime_types: filter.requested_types(),
            police_station: filter.police_station.clone(),
        };

        let response =
            tokio::time::timeout(self.config.oracle_timeout, self.oracle.forecast(&request))
                .await
                .map_err(|_| OracleError::TimedOut {
                    seconds: self.config.oracle_timeout.as_secs(),
                })??;

        if response.daily_predictions.is_empty() && response.predicted_breakdown.is_empty() {
            return Err(OracleError::Unavailable {
                message: "oracle returned no predictions".to_string(),
            });
        }

        Ok(response)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use chrono::{TimeZone as _, Utc};
    use crime_radar_forecast_models::{CrimeTypeCount, DailyPrediction, DateRange};
    use crime_radar_incident_models::{
        ALL_STATIONS, CrimeType, DayBoundary, IncidentRecord, Position,
    };

    use crate::OfflineOracle;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 9, d).unwrap()
    }

    fn store() -> Arc<IncidentStore> {
        let records = [(2, CrimeType::Theft), (2, CrimeType::Accident), (7, CrimeType::Theft)]
            .into_iter()
            .enumerate()
            .map(|(i, (d, crime_type))| IncidentRecord {
                id: format!("FIR{}", 1000 + i),
                position: Position::new(28.6, 77.2),
                crime_type,
                date: Utc.with_ymd_and_hms(2024, 9, d, 9, 0, 0).unwrap(),
                police_station: "Karol Bagh".to_string(),
            })
            .collect();
        Arc::new(IncidentStore::new(records).with_day_boundary(DayBoundary::utc()))
    }

    fn filter(types: &[CrimeType]) -> DateRangeFilter {
        DateRangeFilter {
            date_range: DateRange::new(day(1), day(20)),
            police_station: ALL_STATIONS.to_string(),
            crime_types: types.to_vec(),
        }
    }

    fn forecaster(oracle: impl ForecastOracle + 'static) -> Forecaster {
        Forecaster::new(store(), Arc::new(oracle), ForecastConfig::default())
    }

    struct FixedOracle(OracleResponse);

    #[async_trait::async_trait]
    impl ForecastOracle for FixedOracle {
        async fn forecast(&self, _request: &OracleRequest) -> Result<OracleResponse, OracleError> {
            Ok(self.0.clone())
        }
    }

    #[derive(Default)]
    struct CountingOracle(AtomicUsize);

    #[async_trait::async_trait]
    impl ForecastOracle for CountingOracle {
        async fn forecast(&self, request: &OracleRequest) -> Result<OracleResponse, OracleError> {
            self.0.fetch_add(1, Ordering::SeqCst);
            assert!(request.historical_summary.contains("total of 2 incidents"));
            Err(OracleError::Malformed {
                message: "not json".to_string(),
            })
        }
    }

    struct SlowOracle;

    #[async_trait::async_trait]
    impl ForecastOracle for SlowOracle {
        async fn forecast(&self, _request: &OracleRequest) -> Result<OracleResponse, OracleError> {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Err(OracleError::Unavailable {
                message: "unreachable".to_string(),
            })
        }
    }

    fn assert_falls_back(result: &ForecastResult) {
        assert_eq!(result.daily_data.len(), 20);
        assert!(
            result.daily_data[10..]
                .iter()
                .all(|p| p.predicted_count == Some(0) && p.historical_count.is_none())
        );
        assert!(result.predicted_crime_type_breakdown.is_empty());
    }

    #[tokio::test]
    async fn september_range_splits_at_today() {
        let oracle = FixedOracle(OracleResponse {
            daily_predictions: (11..=20)
                .map(|d| DailyPrediction {
                    date: day(d),
                    predicted_count: Some(3),
                })
                .collect(),
            predicted_breakdown: vec![CrimeTypeCount {
                crime_type: CrimeType::Theft,
                count: 30,
            }],
            predicted_hotspots: None,
        });
        let result = forecaster(oracle)
            .predict(&filter(&[CrimeType::Theft]), day(10))
            .await;

        assert_eq!(result.daily_data.len(), 20);
        for point in &result.daily_data[..10] {
            assert!(point.historical_count.is_some());
            assert!(point.predicted_count.is_none());
        }
        for point in &result.daily_data[10..] {
            assert!(point.historical_count.is_none());
            assert_eq!(point.predicted_count, Some(3));
        }
        assert_eq!(result.daily_data[1].historical_count, Some(1));
        assert_eq!(result.historical_crime_type_breakdown[0].count, 2);
        assert_eq!(result.predicted_crime_type_breakdown[0].count, 30);
    }

    #[tokio::test]
    async fn oracle_failure_falls_back_to_history() {
        let oracle = Arc::new(CountingOracle::default());
        let forecaster = Forecaster::new(store(), oracle.clone(), ForecastConfig::default());
        let result = forecaster
            .predict(&filter(&[CrimeType::Theft]), day(10))
            .await;

        assert_eq!(oracle.0.load(Ordering::SeqCst), 1);
        assert_falls_back(&result);
        assert_eq!(result.historical_crime_type_breakdown[0].count, 2);
    }

    #[tokio::test]
    async fn offline_oracle_falls_back_to_history() {
        let result = forecaster(OfflineOracle)
            .predict(&filter(&[CrimeType::Theft, CrimeType::Accident]), day(10))
            .await;
        assert_falls_back(&result);
        assert_eq!(result.daily_data[1].historical_count, Some(2));
    }

    #[tokio::test]
    async fn empty_oracle_response_is_treated_as_failure() {
        let oracle = FixedOracle(OracleResponse {
            daily_predictions: vec![],
            predicted_breakdown: vec![],
            predicted_hotspots: None,
        });
        let result = forecaster(oracle)
            .predict(&filter(&[CrimeType::Theft]), day(10))
            .await;
        assert_falls_back(&result);
    }

    #[tokio::test]
    async fn slow_oracle_times_out() {
        let config = ForecastConfig {
            oracle_timeout: Duration::from_millis(50),
        };
        let result = Forecaster::new(store(), Arc::new(SlowOracle), config)
            .predict(&filter(&[CrimeType::Theft]), day(10))
            .await;
        assert_falls_back(&result);
    }

    #[tokio::test]
    async fn oracle_is_not_called_without_future_dates() {
        let oracle = Arc::new(CountingOracle::default());
        let forecaster = Forecaster::new(store(), oracle.clone(), ForecastConfig::default());
        let result = forecaster
            .predict(&filter(&[CrimeType::Theft]), day(25))
            .await;

        assert_eq!(oracle.0.load(Ordering::SeqCst), 0);
        assert_eq!(result.daily_data.len(), 20);
        assert!(result.daily_data.iter().all(|p| p.predicted_count.is_none()));
        assert!(result.predicted_crime_type_breakdown.is_empty());
    }

    #[tokio::test]
    async fn incomplete_filter_returns_empty_result() {
        let forecaster = forecaster(OfflineOracle);

        let no_types = forecaster.predict(&filter(&[]), day(10)).await;
        assert_eq!(no_types, ForecastResult::empty());

        let mut inverted = filter(&[CrimeType::Theft]);
        inverted.date_range = DateRange::new(day(20), day(1));
        assert_eq!(
            forecaster.predict(&inverted, day(10)).await,
            ForecastResult::empty()
        );
    }
}
