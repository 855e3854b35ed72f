#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! CLI entry point for the crime radar pipeline.
//!
//! Runs the same query, forecast, and route steps as the HTTP server
//! against a freshly generated incident store and prints JSON to stdout.

use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use clap::{Args, Parser, Subcommand};
use crime_radar_ai::{LlmForecastOracle, providers::create_provider_from_env};
use crime_radar_forecast::{ForecastConfig, ForecastOracle, Forecaster, OfflineOracle};
use crime_radar_forecast_models::{DateRange, DateRangeFilter};
use crime_radar_incident::{IncidentStore, dataset::DatasetConfig, tools};
use crime_radar_incident_models::{ALL_STATIONS, CrimeDataQuery, CrimeType};
use crime_radar_patrol::{build_route, select_hotspots};
use crime_radar_patrol_models::RouteOrdering;

#[derive(Parser)]
#[command(name = "crime_radar_cli", about = "Crime forecasting and patrol planning tool")]
struct Cli {
    /// Override the mock dataset's generator seed
    #[arg(long, global = true)]
    seed: Option<u64>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the police stations and crime types in the dataset
    Stations,
    /// Query incidents, like the chat assistant's `get_crime_data` tool
    Incidents {
        /// Crime type (case-insensitive)
        #[arg(long)]
        crime_type: Option<String>,
        /// Police station (case-insensitive)
        #[arg(long)]
        station: Option<String>,
        /// Inclusive start date (`YYYY-MM-DD`)
        #[arg(long)]
        start: Option<String>,
        /// Inclusive end date (`YYYY-MM-DD`)
        #[arg(long)]
        end: Option<String>,
    },
    /// Forecast daily incident counts for a date range
    Forecast(ForecastArgs),
    /// Forecast, then plan a patrol route over the predicted hotspots
    Route {
        #[command(flatten)]
        forecast: ForecastArgs,
        /// Stop ordering (`latitude` or `nearest-neighbor`)
        #[arg(long, default_value = "latitude")]
        ordering: RouteOrdering,
    },
}

#[derive(Args)]
struct ForecastArgs {
    /// First day of the range (`YYYY-MM-DD`)
    #[arg(long)]
    start: NaiveDate,
    /// Last day of the range (`YYYY-MM-DD`)
    #[arg(long)]
    end: NaiveDate,
    /// Police station, or "all"
    #[arg(long, default_value = ALL_STATIONS)]
    station: String,
    /// Crime type to include; repeat for several. Defaults to every type
    /// in the dataset.
    #[arg(long = "crime-type")]
    crime_types: Vec<CrimeType>,
    /// Skip the LLM oracle; future days are predicted as zero
    #[arg(long)]
    offline: bool,
    /// Seconds to wait for the oracle before falling back
    #[arg(long, default_value = "30")]
    oracle_timeout: u64,
}

impl ForecastArgs {
    fn filter(&self, store: &IncidentStore) -> DateRangeFilter {
        let crime_types = if self.crime_types.is_empty() {
            store.crime_types().to_vec()
        } else {
            self.crime_types.clone()
        };
        DateRangeFilter {
            date_range: DateRange::new(self.start, self.end),
            police_station: self.station.clone(),
            crime_types,
        }
    }

    fn forecaster(
        &self,
        store: Arc<IncidentStore>,
    ) -> Result<Forecaster, Box<dyn std::error::Error>> {
        let oracle: Arc<dyn ForecastOracle> = if self.offline {
            log::info!("Running offline, predictions will be zero");
            Arc::new(OfflineOracle)
        } else {
            Arc::new(LlmForecastOracle::new(create_provider_from_env()?))
        };
        Ok(Forecaster::new(
            store,
            oracle,
            ForecastConfig {
                oracle_timeout: std::time::Duration::from_secs(self.oracle_timeout),
            },
        ))
    }
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    pretty_env_logger::init();
    let cli = Cli::parse();

    let mut dataset = DatasetConfig::embedded()?;
    if let Some(seed) = cli.seed {
        dataset = dataset.with_seed(seed);
    }
    let store = Arc::new(IncidentStore::generate(&dataset, Utc::now()));
    let today = store.today();

    match cli.command {
        Commands::Stations => {
            println!("{:<20} LABEL", "VALUE");
            println!("{}", "-".repeat(40));
            for station in store.stations() {
                println!("{:<20} {}", station.value, station.label);
            }
            println!();
            println!("CRIME TYPES");
            println!("{}", "-".repeat(40));
            for crime_type in store.crime_types() {
                println!("{crime_type}");
            }
        }
        Commands::Incidents {
            crime_type,
            station,
            start,
            end,
        } => {
            let query = CrimeDataQuery {
                crime_type,
                police_station: station,
                start_date: start,
                end_date: end,
            };
            let incidents = tools::get_crime_data(&store, &query)?;
            log::info!("Matched {} incidents", incidents.len());
            print_json(&incidents)?;
        }
        Commands::Forecast(args) => {
            let filter = args.filter(&store);
            let result = args.forecaster(store)?.predict(&filter, today).await;
            print_json(&result)?;
        }
        Commands::Route { forecast, ordering } => {
            let filter = forecast.filter(&store);
            let result = forecast
                .forecaster(store.clone())?
                .predict(&filter, today)
                .await;
            let candidates = select_hotspots(&result, &store, &filter.police_station);
            print_json(&build_route(candidates, ordering))?;
        }
    }

    Ok(())
}
