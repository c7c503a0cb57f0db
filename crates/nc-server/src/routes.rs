//! HTTP route handlers for the NumCalc server.
//!
//! All endpoints accept/return JSON.

use std::sync::atomic::Ordering;

use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use nc_core::{Error, Params, Service, ShapeCategory};
use serde::{Deserialize, Serialize};

use crate::limits::run_guarded;
use crate::state::SharedState;

pub const WELCOME: &str = "Welcome to the NumCalc calculation server!";

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

/// Routes subject to the request budget.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/", get(root_handler))
        .route("/calculate", post(calculate_handler))
        .route("/calculations", get(calculations_handler))
}

pub fn health_router() -> Router<SharedState> {
    Router::new().route("/health", get(health_handler))
}

// ---------------------------------------------------------------------------
// POST /calculate
// ---------------------------------------------------------------------------

/// Request body for `/calculate`.
#[derive(Debug, Deserialize)]
struct CalculateRequest {
    service: Service,
    calculation: String,
    /// Flat list of numbers, or a mapping of field names to lists / tables.
    data: serde_json::Value,
    #[serde(default)]
    params: Params,
}

/// Response body for `/calculate`.
#[derive(Debug, Serialize)]
struct CalculateResponse {
    result: serde_json::Value,
}

async fn calculate_handler(
    State(state): State<SharedState>,
    body: Result<Json<CalculateRequest>, JsonRejection>,
) -> Result<Json<CalculateResponse>, AppError> {
    state.inflight.fetch_add(1, Ordering::Relaxed);
    let _dec = DecrementOnDrop(&state.inflight);
    state.total_requests.fetch_add(1, Ordering::Relaxed);

    let Json(req) = body.map_err(|rejection| {
        tracing::debug!(error = %rejection.body_text(), "malformed request body");
        AppError::from(Error::Validation(rejection.body_text()))
    })?;

    let CalculateRequest { service, calculation, data, params } = req;
    let fail = |e: Error| AppError::new(e, service, &calculation);

    let payload = nc_core::validate(&data).map_err(fail)?;
    state.limits.check_memory(&payload).map_err(fail)?;

    let name = calculation.clone();
    let result = run_guarded(&state, move || service.perform(&name, &payload, &params))
        .await
        .map_err(fail)?;

    tracing::debug!(service = %service, calculation = %calculation, "calculation completed");
    Ok(Json(CalculateResponse { result }))
}

// ---------------------------------------------------------------------------
// GET / and GET /calculations
// ---------------------------------------------------------------------------

async fn root_handler() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "message": WELCOME }))
}

#[derive(Debug, Serialize)]
struct CalculationInfo {
    name: &'static str,
    input: ShapeCategory,
}

#[derive(Debug, Serialize)]
struct CalculationsResponse {
    calculator: Vec<CalculationInfo>,
    statistics: Vec<CalculationInfo>,
}

async fn calculations_handler() -> Json<CalculationsResponse> {
    let list = |service: Service| {
        service
            .registry()
            .catalog()
            .into_iter()
            .map(|(name, input)| CalculationInfo { name, input })
            .collect()
    };
    Json(CalculationsResponse {
        calculator: list(Service::Calculator),
        statistics: list(Service::Statistics),
    })
}

// ---------------------------------------------------------------------------
// GET /health
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
    uptime_s: f64,
    inflight: u64,
    total_requests: u64,
}

async fn health_handler(State(state): State<SharedState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: nc_core::VERSION,
        uptime_s: state.started_at.elapsed().as_secs_f64(),
        inflight: state.inflight.load(Ordering::Relaxed),
        total_requests: state.total_requests.load(Ordering::Relaxed),
    })
}

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

/// Structured JSON error response.
#[derive(Debug)]
pub struct AppError {
    status: StatusCode,
    kind: &'static str,
    message: String,
    calculation: Option<String>,
}

impl AppError {
    /// Log `err` with the request it belongs to, then convert it.
    fn new(err: Error, service: Service, calculation: &str) -> Self {
        if let Error::Internal(detail) = &err {
            tracing::error!(
                service = %service,
                calculation,
                error = %detail,
                "internal error while performing calculation"
            );
        } else {
            tracing::debug!(service = %service, calculation, error_kind = err.kind(), error = %err, "request failed");
        }
        Self::from(err)
    }
}

impl From<Error> for AppError {
    fn from(err: Error) -> Self {
        let status = match &err {
            Error::Validation(_)
            | Error::UnknownCalculation { .. }
            | Error::InputShape { .. }
            | Error::Calculation { .. } => StatusCode::BAD_REQUEST,
            Error::Timeout { .. } => StatusCode::REQUEST_TIMEOUT,
            Error::Resource(_) => StatusCode::TOO_MANY_REQUESTS,
            Error::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        let message = match &err {
            Error::Internal(_) => "internal server error".to_string(),
            _ => err.to_string(),
        };
        Self {
            status,
            kind: err.kind(),
            message,
            calculation: err.calculation().map(str::to_string),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let mut body = serde_json::json!({
            "error": self.kind,
            "message": self.message,
        });
        if let Some(calculation) = self.calculation {
            body["calculation"] = serde_json::Value::String(calculation);
        }
        (self.status, Json(body)).into_response()
    }
}

/// RAII guard to decrement an atomic counter on drop.
struct DecrementOnDrop<'a>(&'a std::sync::atomic::AtomicU64);

impl Drop for DecrementOnDrop<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::Relaxed);
    }
}
