//! # API REST
//!
//! REST API implementation for Clinica.
//!
//! Handles:
//! - HTTP endpoints with axum
//! - OpenAPI/Swagger documentation
//! - REST-specific concerns (JSON serialization, status codes, CORS)
//!
//! Business rules live in `clinica-core`; this crate only maps requests onto its services and
//! their errors onto status codes.

#![warn(rust_2018_idioms)]

mod error;
mod handlers;
mod state;

use axum::{routing::get, Router};
use tower_http::cors::CorsLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

pub use error::{ApiError, ErrorBody};
pub use handlers::{HealthRes, PageParams};
pub use state::AppState;

use clinica_core::{
    CreateExam, CreatePatient, Exam, ExamWithPatient, Modality, Patient, PatientSummary,
};

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::health,
        handlers::create_patient,
        handlers::list_patients,
        handlers::create_exam,
        handlers::list_exams,
        handlers::exam_time_slots,
    ),
    components(schemas(
        HealthRes,
        ErrorBody,
        Patient,
        PatientSummary,
        Exam,
        ExamWithPatient,
        Modality,
        CreatePatient,
        CreateExam,
    ))
)]
pub struct ApiDoc;

/// Builds the REST router with Swagger UI and permissive CORS.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route(
            "/patients",
            get(handlers::list_patients).post(handlers::create_patient),
        )
        .route(
            "/exams",
            get(handlers::list_exams).post(handlers::create_exam),
        )
        .route("/exams/time-slots", get(handlers::exam_time_slots))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(CorsLayer::permissive())
        .with_state(state)
}
