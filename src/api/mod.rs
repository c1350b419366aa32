use axum::{
    Router,
    extract::{Json, Query},
    http::{StatusCode, header},
    response::{Html, IntoResponse, Response},
    routing::get,
};
use clap::{Parser, ValueEnum};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use tokio::net::TcpListener;

use crate::core::{
    MonthRow, MovementKind, ScenarioParams, TargetSearchResult, describe_months, find_target_month,
    project_final_balance,
};
use crate::rates::{self, RateSource};

const INDEX_HTML: &str = include_str!("../../web/index.html");
const STYLES_CSS: &str = include_str!("../../web/styles.css");
const APP_JS: &str = include_str!("../../web/app.js");

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum CliMovementKind {
    None,
    Contribution,
    Withdrawal,
}

impl From<CliMovementKind> for MovementKind {
    fn from(value: CliMovementKind) -> Self {
        match value {
            CliMovementKind::None => MovementKind::None,
            CliMovementKind::Contribution => MovementKind::Contribution,
            CliMovementKind::Withdrawal => MovementKind::Withdrawal,
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum CliRateSource {
    Custom,
    Selic,
    Ipca,
    Igpm,
    Cdi,
}

impl CliRateSource {
    /// The SGS reference series behind this source, when there is one.
    fn reference(self) -> Option<RateSource> {
        match self {
            CliRateSource::Custom => None,
            CliRateSource::Selic => Some(RateSource::Selic),
            CliRateSource::Ipca => Some(RateSource::Ipca),
            CliRateSource::Igpm => Some(RateSource::Igpm),
            CliRateSource::Cdi => Some(RateSource::Cdi),
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case")]
enum ApiMovementKind {
    None,
    #[serde(alias = "contributions")]
    Contribution,
    #[serde(alias = "withdrawals")]
    Withdrawal,
}

impl From<ApiMovementKind> for CliMovementKind {
    fn from(value: ApiMovementKind) -> Self {
        match value {
            ApiMovementKind::None => CliMovementKind::None,
            ApiMovementKind::Contribution => CliMovementKind::Contribution,
            ApiMovementKind::Withdrawal => CliMovementKind::Withdrawal,
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
enum ApiRateSource {
    Custom,
    Selic,
    Ipca,
    #[serde(alias = "igp-m")]
    Igpm,
    #[serde(alias = "di")]
    Cdi,
}

impl From<ApiRateSource> for CliRateSource {
    fn from(value: ApiRateSource) -> Self {
        match value {
            ApiRateSource::Custom => CliRateSource::Custom,
            ApiRateSource::Selic => CliRateSource::Selic,
            ApiRateSource::Ipca => CliRateSource::Ipca,
            ApiRateSource::Igpm => CliRateSource::Igpm,
            ApiRateSource::Cdi => CliRateSource::Cdi,
        }
    }
}

impl From<CliRateSource> for ApiRateSource {
    fn from(value: CliRateSource) -> Self {
        match value {
            CliRateSource::Custom => ApiRateSource::Custom,
            CliRateSource::Selic => ApiRateSource::Selic,
            CliRateSource::Ipca => ApiRateSource::Ipca,
            CliRateSource::Igpm => ApiRateSource::Igpm,
            CliRateSource::Cdi => ApiRateSource::Cdi,
        }
    }
}

impl From<RateSource> for ApiRateSource {
    fn from(value: RateSource) -> Self {
        match value {
            RateSource::Selic => ApiRateSource::Selic,
            RateSource::Ipca => ApiRateSource::Ipca,
            RateSource::Igpm => ApiRateSource::Igpm,
            RateSource::Cdi => ApiRateSource::Cdi,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct SimulatePayload {
    initial_capital: Option<f64>,
    monthly_rate: Option<f64>,
    horizon_months: Option<u32>,
    movement_kind: Option<ApiMovementKind>,
    movement_amount: Option<f64>,
    movement_months: Option<u32>,
    rate_source: Option<ApiRateSource>,
    rate_quote: Option<String>,
    target_balance: Option<f64>,
    include_trajectory: Option<bool>,
}

#[derive(Parser, Debug)]
#[command(
    name = "juros",
    about = "Compound-interest investment projector (monthly contributions/withdrawals, target search)"
)]
struct Cli {
    #[arg(
        long,
        default_value_t = 10_000.0,
        help = "Starting capital in currency units"
    )]
    initial_capital: f64,
    #[arg(
        long,
        default_value_t = 1.0,
        help = "Monthly interest rate in percent; used when --rate-source=custom"
    )]
    monthly_rate: f64,
    #[arg(long, default_value_t = 240, help = "Projection horizon in months")]
    horizon_months: u32,
    #[arg(
        long,
        value_enum,
        default_value_t = CliMovementKind::None,
        help = "Recurring monthly movement applied during the leading window"
    )]
    movement: CliMovementKind,
    #[arg(
        long,
        default_value_t = 1_000.0,
        help = "Magnitude of the monthly movement in currency units"
    )]
    movement_amount: f64,
    #[arg(
        long,
        default_value_t = 12,
        help = "Number of leading months the movement applies; months past the horizon never apply"
    )]
    movement_months: u32,
    #[arg(
        long,
        value_enum,
        default_value_t = CliRateSource::Custom,
        help = "Reference rate source; non-custom sources expect an SGS quote"
    )]
    rate_source: CliRateSource,
    #[arg(long, help = "Balance to search for; enables the target-month search")]
    target_balance: Option<f64>,
}

#[derive(Copy, Clone, Debug)]
struct ApiOptions {
    target_balance: Option<f64>,
    include_trajectory: bool,
}

#[derive(Debug)]
struct ApiRequest {
    params: ScenarioParams,
    rate_source: ApiRateSource,
    rate_warning: Option<String>,
    options: ApiOptions,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SimulateResponse {
    final_balance: f64,
    horizon_months: u32,
    monthly_rate_percent: f64,
    rate_source: ApiRateSource,
    rate_warning: Option<String>,
    target: Option<TargetResponse>,
    months: Option<Vec<MonthRow>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct TargetResponse {
    target_balance: f64,
    reached: bool,
    months_to_target: Option<u32>,
    years_part: Option<u32>,
    months_part: Option<u32>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RateSourceInfo {
    id: ApiRateSource,
    label: &'static str,
    sgs_series_code: Option<u32>,
    quotes_annual_rate: bool,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

fn build_params(cli: &Cli) -> Result<ScenarioParams, String> {
    if !cli.initial_capital.is_finite() || cli.initial_capital < 0.0 {
        return Err("--initial-capital must be >= 0".to_string());
    }

    if !cli.monthly_rate.is_finite() || cli.monthly_rate <= -100.0 {
        return Err("--monthly-rate must be > -100".to_string());
    }

    if cli.horizon_months == 0 {
        return Err("--horizon-months must be >= 1".to_string());
    }

    if !cli.movement_amount.is_finite() || cli.movement_amount < 0.0 {
        return Err("--movement-amount must be >= 0".to_string());
    }

    if let Some(target) = cli.target_balance {
        if !target.is_finite() {
            return Err("--target-balance must be finite".to_string());
        }
    }

    Ok(ScenarioParams {
        initial_capital: cli.initial_capital,
        monthly_rate_percent: cli.monthly_rate,
        horizon_months: cli.horizon_months,
        movement_kind: cli.movement.into(),
        movement_amount: cli.movement_amount,
        movement_months: cli.movement_months,
    })
}

pub async fn run_http_server(port: u16) -> std::io::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let app = Router::new()
        .route("/", get(index_handler))
        .route("/index.html", get(index_handler))
        .route("/styles.css", get(styles_handler))
        .route("/app.js", get(app_js_handler))
        .route(
            "/api/simulate",
            get(simulate_get_handler).post(simulate_post_handler),
        )
        .route("/api/rate-sources", get(rate_sources_handler))
        .fallback(not_found_handler);

    let listener = TcpListener::bind(addr).await?;
    println!("juros HTTP API listening on http://{addr}");
    println!("Local access: http://127.0.0.1:{port}/");

    axum::serve(listener, app).await
}

async fn index_handler() -> impl IntoResponse {
    with_cache_control(Html(INDEX_HTML))
}

async fn styles_handler() -> impl IntoResponse {
    with_cache_control((
        [(header::CONTENT_TYPE, "text/css; charset=utf-8")],
        STYLES_CSS,
    ))
}

async fn app_js_handler() -> impl IntoResponse {
    with_cache_control((
        [(
            header::CONTENT_TYPE,
            "application/javascript; charset=utf-8",
        )],
        APP_JS,
    ))
}

async fn not_found_handler() -> Response {
    error_response(StatusCode::NOT_FOUND, "Not found")
}

async fn rate_sources_handler() -> Response {
    let mut sources = vec![RateSourceInfo {
        id: ApiRateSource::Custom,
        label: "Custom",
        sgs_series_code: None,
        quotes_annual_rate: false,
    }];
    for source in RateSource::ALL {
        sources.push(RateSourceInfo {
            id: source.into(),
            label: source.label(),
            sgs_series_code: Some(source.sgs_series_code()),
            quotes_annual_rate: source.quotes_annual_rate(),
        });
    }
    json_response(StatusCode::OK, sources)
}

async fn simulate_get_handler(Query(payload): Query<SimulatePayload>) -> Response {
    simulate_handler_impl(payload).await
}

async fn simulate_post_handler(Json(payload): Json<SimulatePayload>) -> Response {
    simulate_handler_impl(payload).await
}

async fn simulate_handler_impl(payload: SimulatePayload) -> Response {
    let request = match api_request_from_payload(payload) {
        Ok(request) => request,
        Err(msg) => return error_response(StatusCode::BAD_REQUEST, &msg),
    };

    let params = &request.params;
    let final_balance = match project_final_balance(params) {
        Ok(balance) => balance,
        Err(e) => return error_response(StatusCode::BAD_REQUEST, &e.to_string()),
    };

    let months = if request.options.include_trajectory {
        match describe_months(params) {
            Ok(rows) => Some(rows),
            Err(e) => return error_response(StatusCode::BAD_REQUEST, &e.to_string()),
        }
    } else {
        None
    };

    let target = match request.options.target_balance {
        Some(target_balance) => match find_target_month(params, target_balance) {
            Ok(result) => Some(build_target_response(target_balance, result)),
            Err(e) => return error_response(StatusCode::BAD_REQUEST, &e.to_string()),
        },
        None => None,
    };

    let response = SimulateResponse {
        final_balance,
        horizon_months: params.horizon_months,
        monthly_rate_percent: params.monthly_rate_percent,
        rate_source: request.rate_source,
        rate_warning: request.rate_warning,
        target,
        months,
    };
    json_response(StatusCode::OK, response)
}

fn with_cache_control<R: IntoResponse>(response: R) -> Response {
    let mut response = response.into_response();
    response.headers_mut().insert(
        header::CACHE_CONTROL,
        "no-store".parse().expect("valid header"),
    );
    response
}

fn json_response<T: Serialize>(status: StatusCode, body: T) -> Response {
    let mut response = (status, Json(body)).into_response();
    response.headers_mut().insert(
        header::CACHE_CONTROL,
        "no-store".parse().expect("valid header"),
    );
    response
}

fn error_response(status: StatusCode, msg: &str) -> Response {
    json_response(
        status,
        ErrorResponse {
            error: msg.to_string(),
        },
    )
}

fn build_target_response(target_balance: f64, result: TargetSearchResult) -> TargetResponse {
    match result {
        TargetSearchResult::ReachedAt(month) => TargetResponse {
            target_balance,
            reached: true,
            months_to_target: Some(month),
            years_part: Some(month / 12),
            months_part: Some(month % 12),
        },
        TargetSearchResult::Unreachable => TargetResponse {
            target_balance,
            reached: false,
            months_to_target: None,
            years_part: None,
            months_part: None,
        },
    }
}

#[cfg(test)]
fn api_request_from_json(json: &str) -> Result<ApiRequest, String> {
    let payload = serde_json::from_str::<SimulatePayload>(json)
        .map_err(|e| format!("Invalid API JSON payload: {e}"))?;
    api_request_from_payload(payload)
}

fn api_request_from_payload(payload: SimulatePayload) -> Result<ApiRequest, String> {
    let mut cli = default_cli_for_api();

    if let Some(v) = payload.initial_capital {
        cli.initial_capital = v;
    }
    if let Some(v) = payload.monthly_rate {
        cli.monthly_rate = v;
    }
    if let Some(v) = payload.horizon_months {
        cli.horizon_months = v;
    }
    if let Some(v) = payload.movement_kind {
        cli.movement = v.into();
    }
    if let Some(v) = payload.movement_amount {
        cli.movement_amount = v;
    }
    if let Some(v) = payload.movement_months {
        cli.movement_months = v;
    }
    if let Some(v) = payload.rate_source {
        cli.rate_source = v.into();
    }
    if let Some(v) = payload.target_balance {
        cli.target_balance = Some(v);
    }

    // Resolve the reference quote before validation so the engine only ever
    // sees a single numeric monthly rate. Fallback policy lives here, not in
    // the engine.
    let mut rate_warning = None;
    if let Some(source) = cli.rate_source.reference() {
        let resolved = match payload.rate_quote.as_deref() {
            Some(raw) => match rates::resolve_monthly_rate(source, raw) {
                Ok(rate) => Some(rate),
                Err(e) => {
                    rate_warning = Some(format!(
                        "Could not resolve the {} quote: {e}. Using the default rate of {}% per month.",
                        source.label(),
                        rates::DEFAULT_MONTHLY_RATE_PERCENT
                    ));
                    None
                }
            },
            None => {
                rate_warning = Some(format!(
                    "No {} quote was provided. Using the default rate of {}% per month.",
                    source.label(),
                    rates::DEFAULT_MONTHLY_RATE_PERCENT
                ));
                None
            }
        };
        cli.monthly_rate = resolved.unwrap_or(rates::DEFAULT_MONTHLY_RATE_PERCENT);
    }

    let params = build_params(&cli)?;
    Ok(ApiRequest {
        params,
        rate_source: cli.rate_source.into(),
        rate_warning,
        options: ApiOptions {
            target_balance: cli.target_balance,
            include_trajectory: payload.include_trajectory.unwrap_or(true),
        },
    })
}

fn default_cli_for_api() -> Cli {
    Cli {
        initial_capital: 10_000.0,
        monthly_rate: 1.0,
        horizon_months: 240,
        movement: CliMovementKind::None,
        movement_amount: 1_000.0,
        movement_months: 12,
        rate_source: CliRateSource::Custom,
        target_balance: None,
    }
}
