//! JSON API routes.
//!
//! - `POST /api/v1/pricing/preview`              — compute a breakdown without persisting
//! - `POST /api/v1/prechecks`                    — persist a precheck and materialize its quote
//! - `GET  /api/v1/quotes/{id}`                  — quote with line items
//! - `POST /api/v1/quotes/{id}/recalculate`      — regenerate a quote from its precheck
//! - `GET  /api/v1/integration/prechecks/{id}`   — precheck + fresh pricing for the workflow tool

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use rust_decimal::prelude::ToPrimitive;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use serde_json::json;
use thiserror::Error;
use tracing::error;

use pvquote_core::{calculate_pricing, InputError, PricingBreakdown, PricingRequest};
use pvquote_db::{
    CachedPriceCatalog, DbPool, PrecheckRecord, QuoteRecord, RepositoryError,
    SqlPrecheckRepository, SqlQuoteRepository,
};

#[derive(Clone)]
pub struct AppState {
    pub db_pool: DbPool,
    pub catalog: Arc<CachedPriceCatalog>,
    pub api_token: Option<SecretString>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/v1/pricing/preview", post(pricing_preview))
        .route("/api/v1/prechecks", post(create_precheck))
        .route("/api/v1/quotes/{id}", get(get_quote))
        .route("/api/v1/quotes/{id}/recalculate", post(recalculate_quote))
        .route("/api/v1/integration/prechecks/{id}", get(integration_precheck))
        .with_state(state)
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Input(#[from] InputError),
    #[error("{0} not found")]
    NotFound(String),
    #[error("missing or invalid API token")]
    Unauthorized,
    #[error("internal error")]
    Internal(#[source] RepositoryError),
}

impl From<RepositoryError> for ApiError {
    fn from(error: RepositoryError) -> Self {
        match error {
            RepositoryError::NotFound(what) => Self::NotFound(what),
            other => Self::Internal(other),
        }
    }
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            Self::Input(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn code(&self) -> &'static str {
        match self {
            Self::Input(_) => "invalid_input",
            Self::NotFound(_) => "not_found",
            Self::Unauthorized => "unauthorized",
            Self::Internal(_) => "internal",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if let Self::Internal(source) = &self {
            error!(error = %source, "request failed");
        }
        let body = json!({ "error": { "code": self.code(), "message": self.to_string() } });
        (self.status(), Json(body)).into_response()
    }
}

/// Flat preview payload in the shape the legacy frontend consumes.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PreviewResponse {
    package: String,
    base_price: f64,
    travel_cost: f64,
    surcharges: f64,
    inverter_cost: f64,
    storage_cost: f64,
    wallbox_cost: f64,
    material_cost: f64,
    discount: f64,
    total_net: f64,
    vat_amount: f64,
    total: f64,
}

impl From<&PricingBreakdown> for PreviewResponse {
    fn from(breakdown: &PricingBreakdown) -> Self {
        let as_float = |value: rust_decimal::Decimal| value.to_f64().unwrap_or_default();
        Self {
            package: breakdown.package.as_str().to_string(),
            base_price: as_float(breakdown.base_price),
            travel_cost: as_float(breakdown.travel_cost),
            surcharges: as_float(breakdown.surcharge_total()),
            inverter_cost: as_float(breakdown.inverter_cost),
            storage_cost: as_float(breakdown.storage_cost),
            wallbox_cost: as_float(breakdown.wallbox_total()),
            material_cost: as_float(breakdown.material_total()),
            discount: as_float(breakdown.discount),
            total_net: as_float(breakdown.net_total),
            vat_amount: as_float(breakdown.vat_amount),
            total: as_float(breakdown.gross_total),
        }
    }
}

pub async fn pricing_preview(
    State(state): State<AppState>,
    Json(request): Json<PricingRequest>,
) -> Result<Json<PreviewResponse>, ApiError> {
    let input = request.try_into_input()?;
    let catalog = state.catalog.snapshot().await?;
    let breakdown = calculate_pricing(&input, &catalog);
    Ok(Json(PreviewResponse::from(&breakdown)))
}

#[derive(Debug, Default, Deserialize)]
pub struct PrecheckSubmission {
    #[serde(flatten)]
    pub pricing: PricingRequest,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PrecheckCreated {
    precheck_id: i64,
    quote_id: i64,
    quote_number: String,
    pricing: PreviewResponse,
}

pub async fn create_precheck(
    State(state): State<AppState>,
    Json(submission): Json<PrecheckSubmission>,
) -> Result<(StatusCode, Json<PrecheckCreated>), ApiError> {
    let input = submission.pricing.try_into_input()?;
    let catalog = state.catalog.snapshot().await?;
    let breakdown = calculate_pricing(&input, &catalog);

    let precheck_id = SqlPrecheckRepository::new(state.db_pool.clone())
        .insert(&input, submission.notes.as_deref().unwrap_or(""))
        .await?;
    let quote = SqlQuoteRepository::new(state.db_pool.clone())
        .create_from_breakdown(precheck_id, &breakdown)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(PrecheckCreated {
            precheck_id,
            quote_id: quote.id,
            quote_number: quote.quote_number,
            pricing: PreviewResponse::from(&breakdown),
        }),
    ))
}

pub async fn get_quote(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<QuoteRecord>, ApiError> {
    SqlQuoteRepository::new(state.db_pool.clone())
        .find_by_id(id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("quote {id}")))
}

/// Recomputes the quote from its stored precheck against the current
/// catalog snapshot and atomically replaces its lines.
pub async fn recalculate_quote(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<QuoteRecord>, ApiError> {
    let quote_repository = SqlQuoteRepository::new(state.db_pool.clone());
    let quote = quote_repository
        .find_by_id(id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("quote {id}")))?;

    let precheck = SqlPrecheckRepository::new(state.db_pool.clone())
        .find_by_id(quote.precheck_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("precheck {}", quote.precheck_id)))?;
    let input = precheck.to_pricing_input()?;

    let catalog = state.catalog.snapshot().await?;
    let breakdown = calculate_pricing(&input, &catalog);
    let updated = quote_repository.recalculate(id, &breakdown).await?;
    Ok(Json(updated))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IntegrationPrecheck {
    precheck: PrecheckRecord,
    pricing: PreviewResponse,
}

pub async fn integration_precheck(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    headers: HeaderMap,
) -> Result<Json<IntegrationPrecheck>, ApiError> {
    authorize(&state, &headers)?;

    let precheck = SqlPrecheckRepository::new(state.db_pool.clone())
        .find_by_id(id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("precheck {id}")))?;
    let input = precheck.to_pricing_input()?;

    let catalog = state.catalog.snapshot().await?;
    let breakdown = calculate_pricing(&input, &catalog);
    Ok(Json(IntegrationPrecheck { precheck, pricing: PreviewResponse::from(&breakdown) }))
}

/// The integration endpoints stay disabled until a token is configured;
/// without one every request is rejected.
fn authorize(state: &AppState, headers: &HeaderMap) -> Result<(), ApiError> {
    let Some(expected) = state.api_token.as_ref() else {
        return Err(ApiError::Unauthorized);
    };
    let presented =
        headers.get("x-api-token").and_then(|value| value.to_str().ok()).unwrap_or("");
    if presented == expected.expose_secret() {
        Ok(())
    } else {
        Err(ApiError::Unauthorized)
    }
}
