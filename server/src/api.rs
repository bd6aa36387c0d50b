//! Request and response bodies, and the route handlers.

use crate::AppState;
use crate::error::ApiError;
use crate::validate::is_valid_email;
use axum::Json;
use axum::extract::{FromRequest, Path, Request, State};
use axum::http::StatusCode;
use chrono::{DateTime, Utc};
use keygate_license::{
    LicenseEngine, LicenseId, LicenseRecord, LicenseResult, LicenseStatus, LicenseUpdate,
    PlanType, VerificationOutcome,
};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

// ── Bodies ───────────────────────────────────────────────────────

/// Answer to a verification request.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct VerifyResponse {
    pub status: LicenseStatus,
    pub plan_type: Option<PlanType>,
    pub end_date: Option<DateTime<Utc>>,
    pub user_email: Option<String>,
    pub message: String,
}

impl From<VerificationOutcome> for VerifyResponse {
    fn from(outcome: VerificationOutcome) -> Self {
        let status = outcome.status();
        let message = status.message().to_string();
        match outcome {
            VerificationOutcome::Valid {
                plan_type,
                end_date,
                owner_email,
            } => Self {
                status,
                plan_type: Some(plan_type),
                end_date,
                user_email: owner_email,
                message,
            },
            VerificationOutcome::Expired
            | VerificationOutcome::Disabled
            | VerificationOutcome::NotFound => Self {
                status,
                plan_type: None,
                end_date: None,
                user_email: None,
                message,
            },
        }
    }
}

/// A license record as exposed to administrators.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct LicenseView {
    pub id: LicenseId,
    pub license_key: String,
    pub user_email: Option<String>,
    pub plan_type: PlanType,
    pub start_date: DateTime<Utc>,
    pub end_date: Option<DateTime<Utc>>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<LicenseRecord> for LicenseView {
    fn from(record: LicenseRecord) -> Self {
        Self {
            id: record.id,
            license_key: record.key.into(),
            user_email: record.owner_email,
            plan_type: record.plan_type,
            start_date: record.start_date,
            end_date: record.end_date,
            is_active: record.active,
            created_at: record.created_at,
            updated_at: record.updated_at,
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct GenerateRequest {
    pub plan_type: PlanType,
    #[serde(default)]
    pub user_email: Option<String>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct GenerateResponse {
    #[serde(flatten)]
    pub license: LicenseView,
    pub message: String,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct UpdateRequest {
    #[serde(default)]
    pub user_email: Option<String>,
    #[serde(default)]
    pub is_active: Option<bool>,
}

/// JSON body extractor that rejects with an [`ApiError`] body.
pub struct ApiJson<T>(pub T);

impl<S, T> FromRequest<S> for ApiJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state).await?;
        Ok(Self(value))
    }
}

/// Runs an engine call on the blocking pool. Store backends may hold a
/// lock across disk I/O.
async fn with_engine<T, F>(state: &AppState, f: F) -> Result<T, ApiError>
where
    F: FnOnce(&LicenseEngine) -> LicenseResult<T> + Send + 'static,
    T: Send + 'static,
{
    let engine = state.engine.clone();
    let result = tokio::task::spawn_blocking(move || f(&engine)).await?;
    Ok(result?)
}

fn checked_email(email: Option<String>) -> Result<Option<String>, ApiError> {
    match email.map(|e| e.trim().to_string()) {
        Some(e) if !is_valid_email(&e) => Err(ApiError::InvalidEmail),
        other => Ok(other),
    }
}

// ── Handlers ─────────────────────────────────────────────────────

pub async fn root() -> Json<Value> {
    Json(json!({
        "message": "Keygate license service",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "verify": "/verify/{license_key}",
            "generate": "/generate",
            "licenses": "/licenses",
            "health": "/health",
        },
    }))
}

pub async fn health(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    with_engine(&state, |engine| Ok(engine.health_check()))
        .await?
        .map_err(|e| {
            tracing::error!(error = %e, "health check failed");
            ApiError::Unavailable
        })?;
    Ok(Json(json!({
        "status": "healthy",
        "timestamp": Utc::now(),
        "database": "connected",
    })))
}

pub async fn verify(
    State(state): State<AppState>,
    Path(license_key): Path<String>,
) -> Result<Json<VerifyResponse>, ApiError> {
    let outcome = with_engine(&state, move |engine| engine.verify(&license_key)).await?;
    Ok(Json(outcome.into()))
}

pub async fn generate(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<GenerateRequest>,
) -> Result<(StatusCode, Json<GenerateResponse>), ApiError> {
    let email = checked_email(req.user_email)?;
    let plan_type = req.plan_type;
    let record = with_engine(&state, move |engine| engine.create_license(plan_type, email)).await?;
    let message = format!("generated {} license", record.plan_type);
    Ok((
        StatusCode::CREATED,
        Json(GenerateResponse {
            license: record.into(),
            message,
        }),
    ))
}

pub async fn list(State(state): State<AppState>) -> Result<Json<Vec<LicenseView>>, ApiError> {
    let records = with_engine(&state, LicenseEngine::list_licenses).await?;
    Ok(Json(records.into_iter().map(LicenseView::from).collect()))
}

pub async fn update(
    State(state): State<AppState>,
    Path(license_key): Path<String>,
    ApiJson(req): ApiJson<UpdateRequest>,
) -> Result<Json<LicenseView>, ApiError> {
    let update = LicenseUpdate {
        owner_email: checked_email(req.user_email)?,
        active: req.is_active,
    };
    let record = with_engine(&state, move |engine| {
        engine.update_license(&license_key, &update)
    })
    .await?;
    Ok(Json(record.into()))
}
