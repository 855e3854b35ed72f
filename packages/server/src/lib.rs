#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Actix-Web API server for the crime radar dashboard.
//!
//! Serves forecasts, patrol routes, the chat assistant, and women's safety
//! alerts over JSON. The incident store is generated once at startup and
//! shared read-only between workers. An LLM credential is required; the
//! server refuses to start without one.

mod handlers;

use std::{sync::Arc, time::Duration};

use actix_cors::Cors;
use actix_web::{App, HttpResponse, HttpServer, middleware, web};
use chrono::Utc;
use crime_radar_ai::{LlmForecastOracle, providers::LlmProvider};
use crime_radar_forecast::{ForecastConfig, ForecastOracle, Forecaster};
use crime_radar_incident::{IncidentStore, dataset::DatasetConfig};
use crime_radar_patrol_models::RouteOrdering;
use crime_radar_server_models::ApiError;

/// Default port, matching the dashboard's development proxy.
pub const DEFAULT_PORT: u16 = 9002;

/// Settings read from the environment at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// Address to bind (`BIND_ADDR`).
    pub bind_addr: String,
    /// Port to bind (`PORT`).
    pub port: u16,
    /// Upper bound on a forecast oracle call (`ORACLE_TIMEOUT_SECS`).
    pub oracle_timeout: Duration,
    /// How patrol routes are ordered (`ROUTE_ORDERING`).
    pub route_ordering: RouteOrdering,
    /// Overrides the dataset's generator seed (`INCIDENT_SEED`).
    pub incident_seed: Option<u64>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1".to_string(),
            port: DEFAULT_PORT,
            oracle_timeout: ForecastConfig::default().oracle_timeout,
            route_ordering: RouteOrdering::default(),
            incident_seed: None,
        }
    }
}

impl ServerConfig {
    /// Reads the configuration from process environment variables.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads the configuration through `lookup`. Unparseable values fall
    /// back to their defaults with a warning.
    #[must_use]
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();

        let port = parse_or(&lookup, "PORT", defaults.port);
        let oracle_timeout = lookup("ORACLE_TIMEOUT_SECS")
            .and_then(|v| parse_logged::<u64>("ORACLE_TIMEOUT_SECS", &v))
            .map_or(defaults.oracle_timeout, Duration::from_secs);
        let route_ordering = parse_or(&lookup, "ROUTE_ORDERING", defaults.route_ordering);
        let incident_seed =
            lookup("INCIDENT_SEED").and_then(|v| parse_logged::<u64>("INCIDENT_SEED", &v));

        Self {
            bind_addr: lookup("BIND_ADDR").unwrap_or(defaults.bind_addr),
            port,
            oracle_timeout,
            route_ordering,
            incident_seed,
        }
    }
}

fn parse_logged<T: std::str::FromStr>(key: &str, value: &str) -> Option<T> {
    let parsed = value.trim().parse().ok();
    if parsed.is_none() {
        log::warn!("Ignoring invalid {key}={value}");
    }
    parsed
}

fn parse_or<T: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: T,
) -> T {
    lookup(key)
        .and_then(|v| parse_logged(key, &v))
        .unwrap_or(default)
}

/// Shared application state.
pub struct AppState {
    /// Read-only incident store.
    pub store: Arc<IncidentStore>,
    /// Forecast pipeline over `store`.
    pub forecaster: Forecaster,
    /// LLM used by the chat assistant and safety alerts.
    pub provider: Arc<dyn LlmProvider>,
    /// How patrol routes are ordered.
    pub route_ordering: RouteOrdering,
}

impl AppState {
    /// Wires the state from its collaborators.
    #[must_use]
    pub fn new(
        store: Arc<IncidentStore>,
        provider: Arc<dyn LlmProvider>,
        oracle: Arc<dyn ForecastOracle>,
        config: &ServerConfig,
    ) -> Self {
        let forecaster = Forecaster::new(
            store.clone(),
            oracle,
            ForecastConfig {
                oracle_timeout: config.oracle_timeout,
            },
        );
        Self {
            store,
            forecaster,
            provider,
            route_ordering: config.route_ordering,
        }
    }
}

/// Registers the API routes and the JSON body error handler.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::JsonConfig::default().error_handler(|err, _req| {
        let message = err.to_string();
        log::debug!("Rejected request body: {message}");
        actix_web::error::InternalError::from_response(
            err,
            HttpResponse::BadRequest().json(ApiError::new(message)),
        )
        .into()
    }))
    .route("/health", web::get().to(handlers::health))
    .route("/stations", web::get().to(handlers::stations))
    .route("/crime-types", web::get().to(handlers::crime_types))
    .route("/predict-crime", web::post().to(handlers::predict_crime))
    .route("/generate-route", web::post().to(handlers::generate_route))
    .route("/chat", web::post().to(handlers::chat))
    .route(
        "/womens-safety-alerts",
        web::post().to(handlers::womens_safety_alerts),
    );
}

/// Starts the crime radar API server.
///
/// Generates the incident store, creates the LLM provider from the
/// environment, and starts the Actix-Web HTTP server. This is a regular
/// async function; the caller provides the runtime (e.g. via
/// `#[actix_web::main]`).
///
/// # Errors
///
/// Returns an `std::io::Error` if the dataset definition is unusable, no
/// LLM credential is configured, or the HTTP server fails to bind or
/// encounters a runtime error.
#[allow(clippy::future_not_send)]
pub async fn run_server() -> std::io::Result<()> {
    pretty_env_logger::init_custom_env("RUST_LOG");

    let config = ServerConfig::from_env();

    log::info!("Generating incident store...");
    let mut dataset = DatasetConfig::embedded().map_err(std::io::Error::other)?;
    if let Some(seed) = config.incident_seed {
        dataset = dataset.with_seed(seed);
    }
    let store = Arc::new(IncidentStore::generate(&dataset, Utc::now()));

    log::info!("Creating LLM provider...");
    let provider = crime_radar_ai::providers::create_provider_from_env().map_err(|e| {
        log::error!("Cannot start without an LLM provider: {e}");
        std::io::Error::other(e)
    })?;
    let oracle: Arc<dyn ForecastOracle> = Arc::new(LlmForecastOracle::new(provider.clone()));

    let state = web::Data::new(AppState::new(store, provider, oracle, &config));

    log::info!(
        "Starting server on {}:{} (route ordering: {}, oracle timeout: {}s)",
        config.bind_addr,
        config.port,
        config.route_ordering,
        config.oracle_timeout.as_secs(),
    );

    HttpServer::new(move || {
        let cors = Cors::permissive();

        App::new()
            .wrap(cors)
            .wrap(middleware::Logger::default())
            .app_data(state.clone())
            .configure(configure)
    })
    .bind((config.bind_addr.as_str(), config.port))?
    .run()
    .await
}
