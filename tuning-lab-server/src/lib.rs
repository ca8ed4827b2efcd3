//! # Tuning Lab API
//!
//! REST API converting tuning errors to tonefield coordinates, for the
//! web console and other external clients.
//!
//! ## Routes
//! - `GET /` - welcome message and endpoint map
//! - `POST /predict` - tuning errors in, hit point out
//! - `GET /model/info` - active model metadata
//! - `GET /health` - liveness check
//! - `GET /plot.svg` - tonefield plot, optionally with a predicted hit point
//! - `POST /impact` - strike force and count for a hit point
//!
//! Every error, including a body or query string that fails to parse, is
//! answered as JSON `{"detail": ...}`.

use std::sync::Arc;

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Query, State};
use axum::http::{HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tower_http::cors::{AllowHeaders, AllowMethods, AllowOrigin, CorsLayer};
use tracing::{error, info, warn};
use tuning_lab_core::geometry::GeometryConfig;
use tuning_lab_core::impact::{ImpactPlan, PhysicsConfig, ToneMode, calculate_impact_power};
use tuning_lab_core::model::{HitModel, TuningErrors, active_model};
use tuning_lab_core::plot::tonefield_plot;
use tuning_lab_core::{LabError, ModelKind, tuning};

pub const API_VERSION: &str = "0.1.0";
pub const SERVICE_NAME: &str = "tuning-lab-api";

/// Shared, read-only state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    model: Arc<dyn HitModel>,
    geometry: Arc<GeometryConfig>,
    physics: PhysicsConfig,
}

impl AppState {
    pub fn new(kind: ModelKind, geometry: GeometryConfig, physics: PhysicsConfig) -> Self {
        Self {
            model: Arc::from(active_model(kind)),
            geometry: Arc::new(geometry),
            physics,
        }
    }

    pub fn with_model(model: Arc<dyn HitModel>) -> Self {
        Self {
            model,
            geometry: Arc::new(GeometryConfig::default()),
            physics: PhysicsConfig::default(),
        }
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(ModelKind::default(), GeometryConfig::default(), PhysicsConfig::default())
    }
}

/// Tuning error input, in cents.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TuningErrorInput {
    pub tonic: f64,
    pub octave: f64,
    pub fifth: f64,
    /// Note name (e.g. "A4", "C3").
    #[serde(default)]
    pub note_name: Option<String>,
}

impl TuningErrorInput {
    fn errors(&self) -> TuningErrors {
        TuningErrors::new(self.tonic, self.octave, self.fifth)
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct HitPointOutput {
    #[serde(rename = "L")]
    pub l: f64,
    #[serde(rename = "S")]
    pub s: f64,
    pub strength: f64,
    pub model_name: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ModelInfoOutput {
    pub name: String,
    pub version: String,
    pub description: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ImpactInput {
    /// Absolute tuning error of the target partial, in Hz.
    pub raw_hz: f64,
    pub x: f64,
    pub y: f64,
    pub mode: ToneMode,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PlotQuery {
    pub tonic: Option<f64>,
    pub octave: Option<f64>,
    pub fifth: Option<f64>,
    pub note_name: Option<String>,
}

/// Error body in the `{"detail": ...}` shape clients already expect.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    detail: String,
}

impl ApiError {
    fn unprocessable(detail: impl Into<String>) -> Self {
        Self {
            status: StatusCode::UNPROCESSABLE_ENTITY,
            detail: detail.into(),
        }
    }

    fn internal(detail: impl Into<String>) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            detail: detail.into(),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        warn!("rejected request body: {rejection}");
        Self::unprocessable(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        warn!("rejected query string: {rejection}");
        Self::unprocessable(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(serde_json::json!({ "detail": self.detail }))).into_response()
    }
}

/// Builds the API router with CORS restricted to `cors_origins`.
pub fn router(state: AppState, cors_origins: &[String]) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/predict", post(predict_hit_point))
        .route("/model/info", get(model_info))
        .route("/health", get(health_check))
        .route("/plot.svg", get(plot_svg))
        .route("/impact", post(impact_power))
        .layer(cors_layer(cors_origins))
        .with_state(state)
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(err) => {
                warn!("ignoring invalid CORS origin {origin:?}: {err}");
                None
            }
        })
        .collect();

    // Credentials rule out wildcards, so methods and headers mirror the request.
    CorsLayer::new()
        .allow_origin(AllowOrigin::list(allowed))
        .allow_credentials(true)
        .allow_methods(AllowMethods::mirror_request())
        .allow_headers(AllowHeaders::mirror_request())
}

async fn root() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "message": "Welcome to Tuning Lab API",
        "version": API_VERSION,
        "endpoints": {
            "predict": "/predict",
            "model_info": "/model/info",
            "plot": "/plot.svg",
            "impact": "/impact",
            "health": "/health"
        }
    }))
}

async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "healthy", "service": SERVICE_NAME }))
}

async fn predict_hit_point(
    State(state): State<AppState>,
    payload: Result<Json<TuningErrorInput>, JsonRejection>,
) -> Result<Json<HitPointOutput>, ApiError> {
    let Json(input) = payload?;
    if let Some(note) = input.note_name.as_deref() {
        tuning::require_note(note).map_err(|err| ApiError::unprocessable(err.to_string()))?;
    }

    let prediction = match tuning_lab_core::predict(state.model.as_ref(), input.errors()) {
        Ok(prediction) => prediction,
        Err(err @ LabError::InputOutOfRange { .. }) => {
            return Err(ApiError::unprocessable(err.to_string()));
        }
        Err(err) => {
            error!("prediction failed: {err}");
            return Err(ApiError::internal(format!("Prediction failed: {err}")));
        }
    };

    info!(
        "predicted L={:.3} S={:.3} strength={:.3} for {:?}",
        prediction.hit.l, prediction.hit.s, prediction.hit.strength, prediction.errors
    );
    Ok(Json(HitPointOutput {
        l: prediction.hit.l,
        s: prediction.hit.s,
        strength: prediction.hit.strength,
        model_name: prediction.model_name,
    }))
}

async fn model_info(State(state): State<AppState>) -> Json<ModelInfoOutput> {
    let info = state.model.info();
    Json(ModelInfoOutput {
        name: info.name,
        version: info.version,
        description: info.description,
    })
}

async fn plot_svg(
    State(state): State<AppState>,
    query: Result<Query<PlotQuery>, QueryRejection>,
) -> Result<Response, ApiError> {
    let Query(query) = query?;
    let note = query.note_name.as_deref();
    if let Some(note) = note {
        tuning::require_note(note).map_err(|err| ApiError::unprocessable(err.to_string()))?;
    }
    let geometry = state.geometry.geometry(note.unwrap_or("default"));

    let hit = match (query.tonic, query.octave, query.fifth) {
        (None, None, None) => None,
        (tonic, octave, fifth) => {
            let errors = TuningErrors::new(
                tonic.unwrap_or(0.0),
                octave.unwrap_or(0.0),
                fifth.unwrap_or(0.0),
            );
            match tuning_lab_core::predict(state.model.as_ref(), errors) {
                Ok(prediction) => Some(prediction.hit),
                Err(err @ LabError::InputOutOfRange { .. }) => {
                    return Err(ApiError::unprocessable(err.to_string()));
                }
                Err(err) => return Err(ApiError::internal(format!("Prediction failed: {err}"))),
            }
        }
    };

    let svg = tonefield_plot(hit.as_ref(), geometry, note).render().map_err(|err| {
        error!("plot rendering failed: {err}");
        ApiError::internal(format!("Plot failed: {err}"))
    })?;
    Ok(([(header::CONTENT_TYPE, "image/svg+xml")], svg).into_response())
}

async fn impact_power(
    State(state): State<AppState>,
    payload: Result<Json<ImpactInput>, JsonRejection>,
) -> Result<Json<ImpactPlan>, ApiError> {
    let Json(input) = payload?;
    for (name, value) in [("raw_hz", input.raw_hz), ("x", input.x), ("y", input.y)] {
        if !value.is_finite() {
            return Err(ApiError::unprocessable(format!("{name} must be a finite number")));
        }
    }
    let plan = calculate_impact_power(input.raw_hz, (input.x, input.y), input.mode, &state.physics);
    Ok(Json(plan))
}
