use axum::{
    Router,
    extract::State,
    http::StatusCode,
    response::Json,
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::{OpenApi, ToSchema};
use utoipa_swagger_ui::SwaggerUi;

use billing_core::config::{
    CHARGE_LAG_ERROR_DAYS_ENV, CHARGE_LAG_WARNING_DAYS_ENV, MAX_DIAGNOSES_ENV, RULES_FILE_ENV,
};
use billing_core::modifiers::{parse_input_code, parse_input_diagnosis};
use billing_core::selection::{available_add_ons, required_modifiers};
use billing_core::{
    BundlingViolation, ChargeContext, ChargeSelection, ComplianceEngine, CoreConfig,
    PatientContext, ScrubReport, SelectedCode, StoredCharge, ValidationResult,
};

/// Application state shared across REST API handlers
#[derive(Clone)]
struct AppState {
    engine: ComplianceEngine,
}

type ApiError = (StatusCode, String);

#[derive(Serialize, Deserialize, ToSchema)]
struct HealthRes {
    ok: bool,
    message: String,
}

#[derive(Serialize, Deserialize, ToSchema)]
#[serde(deny_unknown_fields)]
struct BundlingReq {
    /// Billed codes; modifiers are ignored.
    codes: Vec<String>,
}

#[derive(Serialize, Deserialize, ToSchema)]
struct BundlingRes {
    #[schema(value_type = Vec<Object>)]
    violations: Vec<BundlingViolation>,
}

#[derive(Serialize, Deserialize, ToSchema)]
#[serde(deny_unknown_fields)]
struct EvaluateReq {
    codes: Vec<String>,
    #[serde(default)]
    diagnoses: Vec<String>,
    #[serde(default)]
    time_minutes: Option<u32>,
    #[serde(default)]
    #[schema(value_type = Object)]
    context: ChargeContext,
}

#[derive(Serialize, Deserialize, ToSchema)]
#[serde(deny_unknown_fields)]
struct TransitionReq {
    #[serde(default)]
    #[schema(value_type = Object)]
    selection: ChargeSelection,
    /// Code the user clicked.
    code: String,
}

#[derive(Serialize, Deserialize, ToSchema)]
struct TransitionRes {
    #[schema(value_type = Object)]
    selection: ChargeSelection,
    /// Modifier each code needs given the rest of the selection.
    required_modifiers: BTreeMap<String, String>,
    available_add_ons: Vec<String>,
}

#[derive(Serialize, Deserialize, ToSchema)]
#[serde(deny_unknown_fields)]
struct ScrubReq {
    #[schema(value_type = Vec<Object>)]
    charges: Vec<StoredCharge>,
    /// Admission context keyed by patient id.
    #[serde(default)]
    #[schema(value_type = Object)]
    patients: HashMap<String, PatientContext>,
}

#[derive(OpenApi)]
#[openapi(
    paths(health, bundling, evaluate, transition, scrub),
    components(schemas(
        HealthRes,
        BundlingReq,
        BundlingRes,
        EvaluateReq,
        TransitionReq,
        TransitionRes,
        ScrubReq
    ))
)]
struct ApiDoc;

/// Main entry point for the billing compliance service
///
/// # Environment Variables
/// - `BILLING_REST_ADDR`: REST server address (default: "0.0.0.0:3000")
/// - `BILLING_RULES_FILE`: YAML rule tables replacing the built-in set
/// - `BILLING_CHARGE_LAG_WARNING_DAYS`, `BILLING_CHARGE_LAG_ERROR_DAYS`: charge lag thresholds
/// - `BILLING_MAX_DIAGNOSES`: diagnosis cap per charge
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env().add_directive("billing=info".parse()?))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let rest_addr = std::env::var("BILLING_REST_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".into());

    let cfg = CoreConfig::from_env_values(
        std::env::var(RULES_FILE_ENV).ok(),
        std::env::var(CHARGE_LAG_WARNING_DAYS_ENV).ok(),
        std::env::var(CHARGE_LAG_ERROR_DAYS_ENV).ok(),
        std::env::var(MAX_DIAGNOSES_ENV).ok(),
    )?;
    let engine = ComplianceEngine::new(Arc::new(cfg))?;

    tracing::info!("++ Starting billing REST on {}", rest_addr);

    let listener = tokio::net::TcpListener::bind(&rest_addr).await?;
    axum::serve(listener, app(engine)).await?;

    Ok(())
}

fn app(engine: ComplianceEngine) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/bundling", post(bundling))
        .route("/evaluate", post(evaluate))
        .route("/selection/transition", post(transition))
        .route("/scrub", post(scrub))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(CorsLayer::permissive())
        .with_state(AppState { engine })
}

fn bad_request(err: impl std::fmt::Display) -> ApiError {
    (StatusCode::BAD_REQUEST, err.to_string())
}

/// Validates every code, returning them trimmed.
fn checked_codes(engine: &ComplianceEngine, codes: &[String]) -> Result<Vec<String>, ApiError> {
    codes
        .iter()
        .map(|code| {
            parse_input_code(engine.tables(), code)
                .map(|_| code.trim().to_owned())
                .map_err(bad_request)
        })
        .collect()
}

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Health check response", body = HealthRes)
    )
)]
/// Health check endpoint for the REST API
async fn health(State(_state): State<AppState>) -> Json<HealthRes> {
    Json(HealthRes {
        ok: true,
        message: "billing compliance engine is alive".into(),
    })
}

#[utoipa::path(
    post,
    path = "/bundling",
    request_body = BundlingReq,
    responses(
        (status = 200, description = "Bundling edits triggered by the codes", body = BundlingRes),
        (status = 400, description = "Malformed code")
    )
)]
/// Lists the CCI edits a set of codes triggers
async fn bundling(
    State(state): State<AppState>,
    Json(req): Json<BundlingReq>,
) -> Result<Json<BundlingRes>, ApiError> {
    let codes = checked_codes(&state.engine, &req.codes)?;
    Ok(Json(BundlingRes {
        violations: state.engine.check_bundling(&codes),
    }))
}

#[utoipa::path(
    post,
    path = "/evaluate",
    request_body = EvaluateReq,
    responses(
        (status = 200, description = "Errors, warnings and modifier suggestions for one charge"),
        (status = 400, description = "Malformed code or diagnosis")
    )
)]
/// Runs the rule pipeline over one charge
async fn evaluate(
    State(state): State<AppState>,
    Json(req): Json<EvaluateReq>,
) -> Result<Json<ValidationResult>, ApiError> {
    let codes = checked_codes(&state.engine, &req.codes)?;
    let diagnoses = req
        .diagnoses
        .iter()
        .map(|dx| parse_input_diagnosis(dx).map_err(bad_request))
        .collect::<Result<Vec<_>, _>>()?;

    let selection = ChargeSelection::from_codes(codes.into_iter().map(SelectedCode::new).collect())
        .with_time_minutes(req.time_minutes);
    let selection = state
        .engine
        .attach_diagnoses(&selection, &diagnoses)
        .map_err(bad_request)?;
    Ok(Json(state.engine.evaluate(&selection, &req.context)))
}

#[utoipa::path(
    post,
    path = "/selection/transition",
    request_body = TransitionReq,
    responses(
        (status = 200, description = "Selection after the click", body = TransitionRes),
        (status = 400, description = "Malformed code")
    )
)]
/// Applies one code click to a selection
async fn transition(
    State(state): State<AppState>,
    Json(req): Json<TransitionReq>,
) -> Result<Json<TransitionRes>, ApiError> {
    let code = parse_input_code(state.engine.tables(), &req.code).map_err(bad_request)?;
    let selection = state.engine.transition(&req.selection, &code.code);
    let tables = state.engine.tables();
    Ok(Json(TransitionRes {
        required_modifiers: required_modifiers(tables, &selection),
        available_add_ons: available_add_ons(tables, &selection),
        selection,
    }))
}

#[utoipa::path(
    post,
    path = "/scrub",
    request_body = ScrubReq,
    responses(
        (status = 200, description = "Per-charge findings and the batch summary"),
        (status = 500, description = "Internal server error")
    )
)]
/// Scrubs a batch of stored charges before submission
async fn scrub(
    State(state): State<AppState>,
    Json(req): Json<ScrubReq>,
) -> Result<Json<ScrubReport>, ApiError> {
    let engine = state.engine.clone();
    tokio::task::spawn_blocking(move || engine.scrub(&req.charges, &req.patients))
        .await
        .map(Json)
        .map_err(|e| {
            tracing::error!("Scrub task error: {:?}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "Internal error".to_owned())
        })
}
