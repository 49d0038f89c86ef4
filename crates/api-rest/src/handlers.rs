//! Route handlers.

use axum::{
    extract::{rejection::JsonRejection, Query, State},
    http::StatusCode,
    response::Json,
};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::error::{ApiError, ErrorBody};
use crate::state::AppState;
use clinica_core::schedule::exam_time_slot_labels;
use clinica_core::{
    ClinicError, CreateExam, CreatePatient, Exam, ExamWithPatient, PageRequest, Patient,
};

/// Health check response.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct HealthRes {
    pub ok: bool,
    pub message: String,
}

/// Page-number pagination. Values arrive as text and are coerced to integers.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PageParams {
    /// 1-based page number (default 1).
    #[param(example = "1")]
    pub page: Option<String>,
    /// Items per page (default 10).
    #[serde(rename = "pageSize")]
    #[param(example = "10")]
    pub page_size: Option<String>,
}

impl PageParams {
    fn into_request(self) -> Result<PageRequest, ApiError> {
        PageRequest::from_query(self.page.as_deref(), self.page_size.as_deref())
            .map_err(|e| ApiError::from(ClinicError::from(e)))
    }
}

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service and store are reachable", body = HealthRes),
        (status = 503, description = "Store unreachable", body = HealthRes)
    )
)]
/// Health check endpoint for the REST API
///
/// Reports whether the service is up and its store answers.
#[axum::debug_handler]
pub(crate) async fn health(State(state): State<AppState>) -> (StatusCode, Json<HealthRes>) {
    match state.store.health_check().await {
        Ok(()) => (
            StatusCode::OK,
            Json(HealthRes {
                ok: true,
                message: "Clinica REST API is alive".into(),
            }),
        ),
        Err(e) => {
            tracing::error!("Health check failed: {:?}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(HealthRes {
                    ok: false,
                    message: "Store unavailable".into(),
                }),
            )
        }
    }
}

#[utoipa::path(
    post,
    path = "/patients",
    request_body = CreatePatient,
    responses(
        (status = 201, description = "Patient created", body = Patient),
        (status = 400, description = "Invalid input", body = ErrorBody),
        (status = 409, description = "Document already registered", body = ErrorBody),
        (status = 500, description = "Internal server error", body = ErrorBody)
    )
)]
/// Register a patient
///
/// The document must be a valid CPF, masked or digits only; it is stored digits only.
///
/// # Errors
/// - `400 Bad Request` for a blank name, an invalid CPF, a malformed birth date or body.
/// - `409 Conflict` if a patient with the same CPF already exists.
#[axum::debug_handler]
pub(crate) async fn create_patient(
    State(state): State<AppState>,
    payload: Result<Json<CreatePatient>, JsonRejection>,
) -> Result<(StatusCode, Json<Patient>), ApiError> {
    let Json(req) = payload?;
    let patient = state.patients.create_patient(req).await?;
    Ok((StatusCode::CREATED, Json(patient)))
}

#[utoipa::path(
    get,
    path = "/patients",
    params(PageParams),
    responses(
        (status = 200, description = "One page of patients", body = [Patient]),
        (status = 400, description = "Invalid pagination", body = ErrorBody)
    )
)]
/// List patients in registration order
#[axum::debug_handler]
pub(crate) async fn list_patients(
    State(state): State<AppState>,
    Query(params): Query<PageParams>,
) -> Result<Json<Vec<Patient>>, ApiError> {
    let page = params.into_request()?;
    Ok(Json(state.patients.list_patients(page).await?))
}

#[utoipa::path(
    post,
    path = "/exams",
    request_body = CreateExam,
    responses(
        (status = 201, description = "Exam created, or the existing exam for a repeated idempotency key", body = Exam),
        (status = 400, description = "Invalid input", body = ErrorBody),
        (status = 404, description = "Patient not found", body = ErrorBody),
        (status = 500, description = "Internal server error", body = ErrorBody)
    )
)]
/// Register an exam
///
/// Idempotent on `idempotencyKey`: a retry with a key already used returns the exam stored by
/// the first request, unchanged, with the same status code.
///
/// # Errors
/// - `400 Bad Request` for a missing key, a malformed patient id or date, or an unknown modality.
/// - `404 Not Found` if the patient does not exist.
#[axum::debug_handler]
pub(crate) async fn create_exam(
    State(state): State<AppState>,
    payload: Result<Json<CreateExam>, JsonRejection>,
) -> Result<(StatusCode, Json<Exam>), ApiError> {
    let Json(req) = payload?;
    let created = state.exams.create_exam(req).await?;
    Ok((StatusCode::CREATED, Json(created.exam)))
}

#[utoipa::path(
    get,
    path = "/exams",
    params(PageParams),
    responses(
        (status = 200, description = "One page of exams with their patients", body = [ExamWithPatient]),
        (status = 400, description = "Invalid pagination", body = ErrorBody)
    )
)]
/// List exams in registration order
#[axum::debug_handler]
pub(crate) async fn list_exams(
    State(state): State<AppState>,
    Query(params): Query<PageParams>,
) -> Result<Json<Vec<ExamWithPatient>>, ApiError> {
    let page = params.into_request()?;
    Ok(Json(state.exams.list_exams(page).await?))
}

#[utoipa::path(
    get,
    path = "/exams/time-slots",
    responses(
        (status = 200, description = "Bookable exam times (HH:MM, UTC)", body = [String])
    )
)]
/// List bookable exam times
#[axum::debug_handler]
pub(crate) async fn exam_time_slots() -> Json<Vec<String>> {
    Json(exam_time_slot_labels())
}
