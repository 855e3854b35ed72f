//! HTTP handler functions for the crime radar API.

use actix_web::{HttpResponse, web};
use chrono::Utc;
use crime_radar_ai::{agent, alerts};
use crime_radar_forecast_models::DateRangeFilter;
use crime_radar_patrol::{build_route, select_hotspots};
use crime_radar_server_models::{
    AlertsResponse, ApiError, ApiHealth, ChatRequest, ChatResponse, CrimeTypesResponse,
    GenerateRouteRequest, StationsResponse,
};

use crate::AppState;

/// `GET /health`
pub async fn health() -> HttpResponse {
    HttpResponse::Ok().json(ApiHealth {
        healthy: true,
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// `GET /stations`
pub async fn stations(state: web::Data<AppState>) -> HttpResponse {
    HttpResponse::Ok().json(StationsResponse {
        stations: state.store.stations().to_vec(),
    })
}

/// `GET /crime-types`
pub async fn crime_types(state: web::Data<AppState>) -> HttpResponse {
    HttpResponse::Ok().json(CrimeTypesResponse {
        crime_types: state.store.crime_types().to_vec(),
    })
}

/// `POST /predict-crime`
///
/// Returns the historical series for the requested range with oracle
/// predictions for the days after today, where today is the current
/// calendar day in the store's time zone. Oracle failures degrade to zero
/// predictions rather than an error response.
pub async fn predict_crime(
    state: web::Data<AppState>,
    body: web::Json<DateRangeFilter>,
) -> HttpResponse {
    let filter = body.into_inner();
    let today = state.store.today();
    log::debug!(
        "Forecast request: {} to {} at {} for {} crime types",
        filter.date_range.start_date,
        filter.date_range.end_date,
        filter.police_station,
        filter.crime_types.len(),
    );

    let result = state.forecaster.predict(&filter, today).await;
    HttpResponse::Ok().json(result)
}

/// `POST /generate-route`
///
/// Picks hotspots from a previous forecast and orders them into a patrol
/// route.
pub async fn generate_route(
    state: web::Data<AppState>,
    body: web::Json<GenerateRouteRequest>,
) -> HttpResponse {
    let request = body.into_inner();
    let candidates = select_hotspots(
        &request.predicted_data,
        &state.store,
        &request.police_station,
    );
    log::debug!(
        "Building route over {} hotspots for {}",
        candidates.len(),
        request.police_station
    );

    HttpResponse::Ok().json(build_route(candidates, state.route_ordering))
}

/// `POST /chat`
pub async fn chat(state: web::Data<AppState>, body: web::Json<ChatRequest>) -> HttpResponse {
    let question = body.into_inner().question;
    if question.trim().is_empty() {
        return HttpResponse::BadRequest().json(ApiError::new("Question is required"));
    }

    let today = state.store.today();
    match agent::ask_question(state.provider.as_ref(), &state.store, &question, today).await {
        Ok(answer) => HttpResponse::Ok().json(ChatResponse { answer }),
        Err(e) => {
            log::error!("Chat request failed: {e}");
            HttpResponse::InternalServerError()
                .json(ApiError::new("Failed to process chat request"))
        }
    }
}

/// `POST /womens-safety-alerts`
pub async fn womens_safety_alerts(state: web::Data<AppState>) -> HttpResponse {
    match alerts::generate_safety_alerts(state.provider.as_ref(), &state.store, Utc::now()).await
    {
        Ok(alerts) => HttpResponse::Ok().json(AlertsResponse { alerts }),
        Err(e) => {
            log::error!("Safety alert generation failed: {e}");
            HttpResponse::InternalServerError()
                .json(ApiError::new("Failed to generate safety alerts"))
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use actix_web::{App, test};
    use chrono::{Days, FixedOffset, Utc};
    use crime_radar_ai::{
        AiError,
        providers::{ContentBlock, LlmProvider, LlmResponse, Message, StopReason},
    };
    use crime_radar_forecast::{ForecastOracle, OracleError};
    use crime_radar_forecast_models::{OracleRequest, OracleResponse};
    use crime_radar_incident::IncidentStore;
    use crime_radar_incident_models::{CrimeType, DayBoundary, IncidentRecord, Position};

    use crate::{AppState, ServerConfig, configure};

    /// Provider that always answers with the same text, or always fails.
    struct CannedProvider(Option<String>);

    #[async_trait::async_trait]
    impl LlmProvider for CannedProvider {
        async fn chat(
            &self,
            _system_prompt: &str,
            _messages: &[Message],
            _tools: &[serde_json::Value],
        ) -> Result<LlmResponse, AiError> {
            self.0.as_ref().map_or_else(
                || {
                    Err(AiError::Provider {
                        message: "service unavailable".to_string(),
                    })
                },
                |text| {
                    Ok(LlmResponse {
                        content: vec![ContentBlock::Text { text: text.clone() }],
                        stop_reason: StopReason::EndTurn,
                    })
                },
            )
        }
    }

    struct UnreachableOracle;

    #[async_trait::async_trait]
    impl ForecastOracle for UnreachableOracle {
        async fn forecast(&self, _request: &OracleRequest) -> Result<OracleResponse, OracleError> {
            Err(OracleError::Unavailable {
                message: "connection refused".to_string(),
            })
        }
    }

    fn store() -> IncidentStore {
        let now = Utc::now();
        let records = [
            ("FIR1000", CrimeType::Theft, "Saket", 28.52),
            ("FIR1001", CrimeType::Harassment, "Saket", 28.53),
            ("FIR1002", CrimeType::Theft, "Dwarka", 28.58),
        ]
        .into_iter()
        .map(|(id, crime_type, station, lat)| IncidentRecord {
            id: id.to_string(),
            position: Position::new(lat, 77.2),
            crime_type,
            date: now - Days::new(2),
            police_station: station.to_string(),
        })
        .collect();
        IncidentStore::new(records)
    }

    fn state(reply: Option<&str>) -> actix_web::web::Data<AppState> {
        state_with(store(), reply)
    }

    fn state_with(store: IncidentStore, reply: Option<&str>) -> actix_web::web::Data<AppState> {
        actix_web::web::Data::new(AppState::new(
            Arc::new(store),
            Arc::new(CannedProvider(reply.map(str::to_string))),
            Arc::new(UnreachableOracle),
            &ServerConfig::default(),
        ))
    }

    macro_rules! app {
        ($reply:expr) => {
            test::init_service(App::new().app_data(state($reply)).configure(configure)).await
        };
    }

    #[actix_web::test]
    async fn health_reports_version() {
        let app = app!(None);
        let resp: serde_json::Value =
            test::call_and_read_body_json(&app, test::TestRequest::get().uri("/health").to_request())
                .await;
        assert_eq!(resp["healthy"], true);
        assert_eq!(resp["version"], env!("CARGO_PKG_VERSION"));
    }

    #[actix_web::test]
    async fn lists_reference_data() {
        let app = app!(None);
        let stations: serde_json::Value = test::call_and_read_body_json(
            &app,
            test::TestRequest::get().uri("/stations").to_request(),
        )
        .await;
        assert_eq!(stations["stations"][0]["value"], "Saket");
        assert_eq!(stations["stations"][1]["label"], "Dwarka");

        let types: serde_json::Value = test::call_and_read_body_json(
            &app,
            test::TestRequest::get().uri("/crime-types").to_request(),
        )
        .await;
        assert_eq!(types["crimeTypes"], serde_json::json!(["Theft", "Harassment"]));
    }

    #[actix_web::test]
    async fn forecast_survives_oracle_failure() {
        let app = app!(None);
        let today = chrono::Local::now().date_naive();
        let start = today - Days::new(4);
        let end = today + Days::new(3);

        let resp: serde_json::Value = test::call_and_read_body_json(
            &app,
            test::TestRequest::post()
                .uri("/predict-crime")
                .set_json(serde_json::json!({
                    "dateRange": {
                        "startDate": start.format("%Y-%m-%d").to_string(),
                        "endDate": end.format("%Y-%m-%d").to_string(),
                    },
                    "policeStation": "all",
                    "crimeTypes": ["Theft", "Harassment"],
                }))
                .to_request(),
        )
        .await;

        let daily = resp["dailyData"].as_array().unwrap();
        assert_eq!(daily.len(), 8);
        assert_eq!(daily[7]["predictedCount"], 0);
        assert!(daily[7]["historicalCount"].is_null());

        let historical: u64 = daily
            .iter()
            .filter_map(|p| p["historicalCount"].as_u64())
            .sum();
        assert_eq!(historical, 3);
        assert_eq!(resp["predictedCrimeTypeBreakdown"], serde_json::json!([]));
    }

    #[actix_web::test]
    async fn forecast_today_follows_the_store_calendar() {
        // At UTC+14:00 the calendar is ahead of UTC for most of the day
        let boundary = DayBoundary::Fixed(FixedOffset::east_opt(14 * 3600).unwrap());
        let store = IncidentStore::new(vec![IncidentRecord {
            id: "FIR2000".to_string(),
            position: Position::new(28.52, 77.2),
            crime_type: CrimeType::Theft,
            date: Utc::now(),
            police_station: "Saket".to_string(),
        }])
        .with_day_boundary(boundary);
        let today = boundary.today();
        let app = test::init_service(
            App::new()
                .app_data(state_with(store, None))
                .configure(configure),
        )
        .await;

        let resp: serde_json::Value = test::call_and_read_body_json(
            &app,
            test::TestRequest::post()
                .uri("/predict-crime")
                .set_json(serde_json::json!({
                    "dateRange": {
                        "startDate": today.format("%Y-%m-%d").to_string(),
                        "endDate": today.format("%Y-%m-%d").to_string(),
                    },
                    "policeStation": "all",
                    "crimeTypes": ["Theft"],
                }))
                .to_request(),
        )
        .await;

        assert_eq!(resp["dailyData"][0]["historicalCount"], 1);
    }

    #[actix_web::test]
    async fn malformed_body_is_a_bad_request() {
        let app = app!(None);
        let resp = test::call_service(
            &app,
            test::TestRequest::post()
                .uri("/predict-crime")
                .insert_header(("content-type", "application/json"))
                .set_payload("{ not json")
                .to_request(),
        )
        .await;
        assert_eq!(resp.status(), 400);
        let body: serde_json::Value = test::read_body_json(resp).await;
        assert!(body["error"].is_string());
    }

    #[actix_web::test]
    async fn route_from_store_incidents() {
        let app = app!(None);
        let resp: serde_json::Value = test::call_and_read_body_json(
            &app,
            test::TestRequest::post()
                .uri("/generate-route")
                .set_json(serde_json::json!({
                    "predictedData": {
                        "dailyData": [],
                        "predictedCrimeTypeBreakdown": [{ "crimeType": "Theft", "count": 4 }],
                        "historicalCrimeTypeBreakdown": [],
                    },
                    "policeStation": "Saket",
                }))
                .to_request(),
        )
        .await;

        let hotspots = resp["hotspots"].as_array().unwrap();
        assert_eq!(hotspots.len(), 1);
        assert_eq!(hotspots[0]["id"], "hs-FIR1000");
        assert_eq!(hotspots[0]["name"], "1. Theft Hotspot");
        assert_eq!(resp["totalDistance"], "0.0 km");
        assert_eq!(resp["estimatedTime"], "0 min");
    }

    #[actix_web::test]
    async fn chat_returns_answer() {
        let app = app!(Some("There were 2 thefts."));
        let resp: serde_json::Value = test::call_and_read_body_json(
            &app,
            test::TestRequest::post()
                .uri("/chat")
                .set_json(serde_json::json!({ "question": "How many thefts?" }))
                .to_request(),
        )
        .await;
        assert_eq!(resp["answer"], "There were 2 thefts.");
    }

    #[actix_web::test]
    async fn chat_provider_failure_is_internal_error() {
        let app = app!(None);
        let resp = test::call_service(
            &app,
            test::TestRequest::post()
                .uri("/chat")
                .set_json(serde_json::json!({ "question": "How many thefts?" }))
                .to_request(),
        )
        .await;
        assert_eq!(resp.status(), 500);
        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["error"], "Failed to process chat request");
    }

    #[actix_web::test]
    async fn blank_question_is_rejected() {
        let app = app!(Some("unused"));
        let resp = test::call_service(
            &app,
            test::TestRequest::post()
                .uri("/chat")
                .set_json(serde_json::json!({ "question": "  " }))
                .to_request(),
        )
        .await;
        assert_eq!(resp.status(), 400);
    }

    #[actix_web::test]
    async fn safety_alerts_pass_through_model_output() {
        let app = app!(Some(
            r#"{"alerts":[{"id":"alert-1","title":"High Risk: Saket","reason":"Harassment cluster","severity":"High","location":"Saket"}]}"#
        ));
        let resp: serde_json::Value = test::call_and_read_body_json(
            &app,
            test::TestRequest::post()
                .uri("/womens-safety-alerts")
                .to_request(),
        )
        .await;
        assert_eq!(resp["alerts"][0]["severity"], "High");
        assert_eq!(resp["alerts"][0]["location"], "Saket");
    }

    #[actix_web::test]
    async fn safety_alerts_empty_output_is_empty_list() {
        let app = app!(Some(""));
        let resp: serde_json::Value = test::call_and_read_body_json(
            &app,
            test::TestRequest::post()
                .uri("/womens-safety-alerts")
                .to_request(),
        )
        .await;
        assert_eq!(resp, serde_json::json!({ "alerts": [] }));
    }
}
