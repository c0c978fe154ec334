use address_autocomplete::config::{AppConfig, UpsConfig};
use address_autocomplete::error::AppError;
use address_autocomplete::telemetry;
use address_autocomplete::ups::{
    field_candidates, AddressQuery, AddressValidationClient, FieldSelector, Outcome,
};
use axum::extract::{Query, State};
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use axum_prometheus::PrometheusMetricLayer;
use clap::{Args, Parser, Subcommand};
use metrics_exporter_prometheus::PrometheusHandle;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Clone)]
struct AppState {
    readiness: Arc<AtomicBool>,
    metrics: PrometheusHandle,
    ups: UpsConfig,
}

#[derive(Parser, Debug)]
#[command(
    name = "Address Autocomplete",
    about = "Run the UPS-backed address autocompletion service from the command line",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Perform a one-off address lookup against the vendor
    Lookup(LookupArgs),
}

#[derive(Args, Debug, Default)]
struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    port: Option<u16>,
}

#[derive(Args, Debug)]
struct LookupArgs {
    /// Zip code to validate
    #[arg(long, default_value = "")]
    zip: String,
    /// State to validate
    #[arg(long, default_value = "")]
    state: String,
    /// City to validate
    #[arg(long, default_value = "")]
    city: String,
    /// Street line to validate
    #[arg(long, default_value = "")]
    street: String,
    /// Field to extract: 0 - zip, 1 - state, 2 - city, 3 - address
    #[arg(long, default_value_t = 3)]
    field: i64,
}

/// Query parameters of the candidates endpoint. Everything is optional;
/// missing values default to empty strings and are reported as warnings.
#[derive(Debug, Deserialize)]
struct CandidateParams {
    zip: Option<String>,
    state: Option<String>,
    city: Option<String>,
    street: Option<String>,
    #[serde(rename = "type")]
    field_type: Option<String>,
}

#[derive(Debug, Serialize)]
struct CandidateResponse {
    #[serde(rename = "Candidates")]
    candidates: Vec<String>,
    #[serde(rename = "Warning", skip_serializing_if = "Option::is_none")]
    warning: Option<u8>,
    #[serde(rename = "Messages", skip_serializing_if = "Option::is_none")]
    messages: Option<Vec<String>>,
}

#[tokio::main]
async fn main() {
    if let Err(err) = run_cli().await {
        eprintln!("application error: {err}");
        std::process::exit(1);
    }
}

async fn run_cli() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => run_server(args).await,
        Command::Lookup(args) => run_lookup(args).await,
    }
}

async fn run_server(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    telemetry::init(&config.telemetry)?;

    // Startup probe: a missing WSDL is unrecoverable, refuse to serve.
    AddressValidationClient::new(config.ups.clone())?;
    if !config.ups.has_credentials() {
        warn!("UPS credentials are not fully configured; vendor calls will be rejected");
    }

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(AtomicBool::new(false));
    let state = AppState {
        readiness: readiness_flag.clone(),
        metrics: prometheus_handle,
        ups: config.ups.clone(),
    };

    let app = app_router(state).layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, test_mode = config.ups.test_mode, "address autocompletion service ready");

    axum::serve(listener, app).await?;
    Ok(())
}

fn app_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(healthcheck))
        .route("/ready", get(readiness_endpoint))
        .route("/metrics", get(metrics_endpoint))
        .route("/api/v1/address/candidates", get(address_candidates_endpoint))
        .with_state(state)
}

async fn run_lookup(args: LookupArgs) -> Result<(), AppError> {
    let config = AppConfig::load()?;
    telemetry::init(&config.telemetry)?;

    let selector = FieldSelector::from_index(args.field)?;
    let client = AddressValidationClient::new(config.ups)?;
    let query = AddressQuery::us(args.zip, args.state, args.city, args.street);

    let outcome = client.validate(&query).await?;
    let candidates = field_candidates(&outcome, selector);

    if candidates.is_empty() {
        println!("No candidates found.");
    } else {
        for candidate in candidates {
            println!("{candidate}");
        }
    }

    Ok(())
}

async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

async fn readiness_endpoint(State(state): State<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

async fn metrics_endpoint(State(state): State<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

async fn address_candidates_endpoint(
    State(state): State<AppState>,
    Query(params): Query<CandidateParams>,
) -> Result<Json<CandidateResponse>, AppError> {
    let mut missing = Vec::new();

    let zip = take_param(params.zip, "zip", &mut missing);
    let state_param = take_param(params.state, "state", &mut missing);
    let city = take_param(params.city, "city", &mut missing);
    let street = take_param(params.street, "street", &mut missing);

    // A missing selector defaults to zip; a present but out-of-range one is
    // rejected before any vendor call is made.
    let selector = match params.field_type.as_deref() {
        None => {
            missing.push("type");
            FieldSelector::PostalCode
        }
        Some(raw) => FieldSelector::from_index(raw.trim().parse::<i64>().unwrap_or(-1))?,
    };

    let mut messages = Vec::new();
    if !missing.is_empty() {
        messages.push(missing_params_message(&missing));
    }

    let client = AddressValidationClient::new(state.ups.clone())?;
    let query = AddressQuery::us(zip, state_param, city, street);
    let outcome = client.validate(&query).await?;

    let candidates = field_candidates(&outcome, selector);
    if matches!(outcome, Outcome::NoCandidates) {
        messages.push("No candidates were found for these parameters.".to_string());
    }

    info!(candidates = candidates.len(), "address lookup complete");

    let warning = if messages.is_empty() { None } else { Some(1) };
    Ok(Json(CandidateResponse {
        candidates,
        warning,
        messages: if messages.is_empty() {
            None
        } else {
            Some(messages)
        },
    }))
}

fn take_param(
    value: Option<String>,
    name: &'static str,
    missing: &mut Vec<&'static str>,
) -> String {
    match value {
        Some(value) => value,
        None => {
            missing.push(name);
            String::new()
        }
    }
}

fn missing_params_message(missing: &[&str]) -> String {
    format!(
        "The following parameters are missing: {}. The values were taken as empty.",
        missing.join(", ")
    )
}
