mod cli;

use std::net::SocketAddr;
use std::sync::{Arc, Mutex, MutexGuard};

use axum::{
    Router,
    extract::{Json, Query, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;

use crate::core::{
    AdditionalCollateral, Allocation, AllocationCheck, AllocationUpdate, Configuration,
    InsightData, LiquidationRisk, LoanDetails, MAX_TIME_HORIZON, Projection, ProjectionCache,
    RateCurve, RatePreset,
    ValidationReport, additional_collateral_potential, adjust_allocation, classify_liquidation_risk,
    liquidation_buffer, loan_details, validate_allocation, validate_configuration,
};
use crate::error::RunwayError;

pub use cli::{Cli, Command, ConfigArgs, build_configuration, load_configuration, run};

/// Optional overrides applied on top of a base configuration.
///
/// The per-year arrays (`btcPriceRates`, `inflationRates`, `incomeGrowthRates`)
/// are only accepted in JSON bodies; query strings cannot carry them, so GET
/// requests are limited to the scalar fields and presets.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ConfigPayload {
    pub time_horizon: Option<u32>,
    pub btc_stack: Option<f64>,
    pub exchange_rate: Option<f64>,

    pub savings: Option<f64>,
    pub investments: Option<f64>,
    pub speculation: Option<f64>,

    pub investments_yield_start: Option<f64>,
    pub investments_yield_end: Option<f64>,
    pub speculation_yield_start: Option<f64>,
    pub speculation_yield_end: Option<f64>,

    pub activation_year: Option<u32>,
    pub annual_expenses: Option<f64>,

    pub btc_price_growth: Option<f64>,
    pub btc_price_preset: Option<RatePreset>,
    pub btc_price_rates: Option<Vec<f64>>,
    pub inflation: Option<f64>,
    pub inflation_rates: Option<Vec<f64>>,
    pub income_growth: Option<f64>,
    pub income_growth_rates: Option<Vec<f64>>,

    pub collateral_pct: Option<f64>,
    pub ltv: Option<f64>,
    pub loan_rate: Option<f64>,
    pub loan_term: Option<u32>,
    pub interest_only: Option<bool>,

    pub income_allocation_pct: Option<f64>,
    pub annual_reallocation: Option<bool>,
    pub strict: Option<bool>,
}

fn linear_override(curve: &RateCurve, start: Option<f64>, end: Option<f64>) -> Option<RateCurve> {
    if start.is_none() && end.is_none() {
        return None;
    }
    let (current_start, current_end) = match curve {
        RateCurve::Linear { start, end } => (*start, *end),
        RateCurve::Flat { rate } => (*rate, *rate),
        RateCurve::Preset { preset } => preset.linear_bounds(),
        RateCurve::Custom { rates } => {
            let first = rates.first().copied().unwrap_or(0.0);
            (first, rates.last().copied().unwrap_or(first))
        }
    };
    Some(RateCurve::Linear {
        start: start.unwrap_or(current_start),
        end: end.unwrap_or(current_end),
    })
}

// Custom arrays win over presets, presets over flat rates.
fn curve_override(
    flat: Option<f64>,
    preset: Option<RatePreset>,
    rates: Option<Vec<f64>>,
) -> Option<RateCurve> {
    if let Some(rates) = rates {
        return Some(RateCurve::Custom { rates });
    }
    if let Some(preset) = preset {
        return Some(RateCurve::Preset { preset });
    }
    flat.map(|rate| RateCurve::Flat { rate })
}

pub fn apply_payload(base: Configuration, payload: ConfigPayload) -> Configuration {
    let mut config = base;

    if let Some(v) = payload.time_horizon {
        config.time_horizon = v;
    }
    if let Some(v) = payload.btc_stack {
        config.btc_stack = v;
    }
    if let Some(v) = payload.exchange_rate {
        config.exchange_rate = v;
    }

    if let Some(v) = payload.savings {
        config.allocation.savings = v;
    }
    if let Some(v) = payload.investments {
        config.allocation.investments = v;
    }
    if let Some(v) = payload.speculation {
        config.allocation.speculation = v;
    }

    if let Some(curve) = linear_override(
        &config.investments_yield,
        payload.investments_yield_start,
        payload.investments_yield_end,
    ) {
        config.investments_yield = curve;
    }
    if let Some(curve) = linear_override(
        &config.speculation_yield,
        payload.speculation_yield_start,
        payload.speculation_yield_end,
    ) {
        config.speculation_yield = curve;
    }

    if let Some(v) = payload.activation_year {
        config.activation_year = v;
    }
    if let Some(v) = payload.annual_expenses {
        config.annual_expenses = v;
    }

    if let Some(curve) = curve_override(
        payload.btc_price_growth,
        payload.btc_price_preset,
        payload.btc_price_rates,
    ) {
        config.btc_price_growth = curve;
    }
    if let Some(curve) = curve_override(payload.inflation, None, payload.inflation_rates) {
        config.inflation = curve;
    }
    if let Some(curve) = curve_override(payload.income_growth, None, payload.income_growth_rates) {
        config.income_growth = curve;
    }

    if let Some(v) = payload.collateral_pct {
        config.loan.collateral_pct = v;
    }
    if let Some(v) = payload.ltv {
        config.loan.ltv = v;
    }
    if let Some(v) = payload.loan_rate {
        config.loan.interest_rate = v;
    }
    if let Some(v) = payload.loan_term {
        config.loan.term_years = v;
    }
    if let Some(v) = payload.interest_only {
        config.loan.interest_only = v;
    }

    if let Some(v) = payload.income_allocation_pct {
        config.income_allocation_pct = v;
    }
    if let Some(v) = payload.annual_reallocation {
        config.annual_reallocation = v;
    }

    config
}

// Horizons above the ceiling are refused even in lenient mode: every series
// is sized by the horizon.
pub fn checked_configuration(
    config: Configuration,
    strict: bool,
) -> Result<(Configuration, ValidationReport), RunwayError> {
    let report = validate_configuration(&config);
    let unbounded = config.time_horizon > MAX_TIME_HORIZON;
    if unbounded || (strict && !report.is_valid) {
        return Err(RunwayError::InvalidConfiguration(report.errors));
    }
    Ok((config, report))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectResponse {
    pub validation: ValidationReport,
    pub projection: Projection,
    pub insights: InsightData,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoanResponse {
    pub activation_year: u32,
    pub loan: Option<LoanDetails>,
    pub liquidation_buffer_pct: Option<f64>,
    pub liquidation_risk: Option<LiquidationRisk>,
    pub additional_collateral: Option<AdditionalCollateral>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AllocationRequest {
    pub current: Allocation,
    #[serde(default)]
    pub update: AllocationUpdate,
    #[serde(default)]
    pub min_threshold: f64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AllocationResponse {
    pub allocation: Allocation,
    pub check: AllocationCheck,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

pub fn build_project_response(
    cache: &mut ProjectionCache,
    config: &Configuration,
    validation: ValidationReport,
) -> ProjectResponse {
    let analysis = cache.analyze(config, config.activation_year);
    ProjectResponse {
        validation,
        projection: analysis.projection,
        insights: analysis.insights,
    }
}

pub fn build_loan_response(config: &Configuration) -> LoanResponse {
    let activation_year = config.activation_year;
    let liquidation_buffer_pct = liquidation_buffer(config, activation_year, config.time_horizon);
    LoanResponse {
        activation_year,
        loan: loan_details(config, activation_year),
        liquidation_buffer_pct,
        liquidation_risk: liquidation_buffer_pct.map(classify_liquidation_risk),
        additional_collateral: additional_collateral_potential(config, activation_year),
    }
}

pub fn build_allocation_response(request: AllocationRequest) -> AllocationResponse {
    let allocation = adjust_allocation(request.current, request.update, request.min_threshold);
    AllocationResponse {
        check: validate_allocation(
            allocation.savings,
            allocation.investments,
            allocation.speculation,
        ),
        allocation,
    }
}

#[derive(Clone)]
struct AppState {
    cache: Arc<Mutex<ProjectionCache>>,
}

impl AppState {
    fn cache(&self) -> MutexGuard<'_, ProjectionCache> {
        self.cache
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/project", get(project_get_handler).post(project_post_handler))
        .route("/api/validate", post(validate_handler))
        .route("/api/loan", get(loan_get_handler).post(loan_post_handler))
        .route("/api/allocation", post(allocation_handler))
        .fallback(not_found_handler)
        .with_state(state)
}

pub async fn run_http_server(port: u16) -> std::io::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let state = AppState {
        cache: Arc::new(Mutex::new(ProjectionCache::default())),
    };
    let app = router(state);

    let listener = TcpListener::bind(addr).await?;
    tracing::info!(%addr, "projection API listening");
    tracing::info!("local access: http://127.0.0.1:{port}/api/project");

    axum::serve(listener, app).await
}

async fn not_found_handler() -> Response {
    error_response(StatusCode::NOT_FOUND, "Not found")
}

async fn project_get_handler(
    State(state): State<AppState>,
    Query(payload): Query<ConfigPayload>,
) -> Response {
    project_handler_impl(&state, payload)
}

async fn project_post_handler(
    State(state): State<AppState>,
    Json(payload): Json<ConfigPayload>,
) -> Response {
    project_handler_impl(&state, payload)
}

fn project_handler_impl(state: &AppState, payload: ConfigPayload) -> Response {
    let strict = payload.strict.unwrap_or(false);
    let config = apply_payload(Configuration::default(), payload);
    let (config, validation) = match checked_configuration(config, strict) {
        Ok(checked) => checked,
        Err(e) => {
            tracing::warn!(error = %e, "rejected projection request");
            return error_response(StatusCode::BAD_REQUEST, &e.to_string());
        }
    };

    let response = {
        let mut cache = state.cache();
        let response = build_project_response(&mut cache, &config, validation);
        let stats = cache.stats();
        tracing::debug!(
            hits = stats.hits,
            misses = stats.misses,
            entries = stats.entries,
            "projection cache"
        );
        response
    };
    json_response(StatusCode::OK, response)
}

async fn validate_handler(Json(payload): Json<ConfigPayload>) -> Response {
    let config = apply_payload(Configuration::default(), payload);
    json_response(StatusCode::OK, validate_configuration(&config))
}

async fn loan_get_handler(Query(payload): Query<ConfigPayload>) -> Response {
    loan_handler_impl(payload)
}

async fn loan_post_handler(Json(payload): Json<ConfigPayload>) -> Response {
    loan_handler_impl(payload)
}

fn loan_handler_impl(payload: ConfigPayload) -> Response {
    let strict = payload.strict.unwrap_or(false);
    let config = apply_payload(Configuration::default(), payload);
    match checked_configuration(config, strict) {
        Ok((config, _)) => json_response(StatusCode::OK, build_loan_response(&config)),
        Err(e) => {
            tracing::warn!(error = %e, "rejected loan request");
            error_response(StatusCode::BAD_REQUEST, &e.to_string())
        }
    }
}

async fn allocation_handler(Json(request): Json<AllocationRequest>) -> Response {
    json_response(StatusCode::OK, build_allocation_response(request))
}

fn json_response<T: Serialize>(status: StatusCode, body: T) -> Response {
    let mut response = (status, Json(body)).into_response();
    response.headers_mut().insert(
        header::CACHE_CONTROL,
        header::HeaderValue::from_static("no-store"),
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

#[cfg(test)]
fn payload_from_json(json: &str) -> Result<ConfigPayload, RunwayError> {
    Ok(serde_json::from_str::<ConfigPayload>(json)?)
}
