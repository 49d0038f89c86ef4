//! HTTP client for the Clinica REST API.

use std::fmt;

use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;

use clinica_core::{CreateExam, CreatePatient, Exam, ExamWithPatient, Patient};

/// Transport-level failure talking to the API.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("could not reach {url}: {source}")]
    Connection {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// The server answered with a non-success status.
    #[error("server returned {status}")]
    Status {
        status: StatusCode,
        message: Option<String>,
    },

    #[error("unexpected response body: {0}")]
    Decode(#[source] reqwest::Error),
}

/// What the user was trying to do, for choosing fallback messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    CreatePatient,
    ListPatients,
    CreateExam,
    ListExams,
    ListTimeSlots,
}

impl Operation {
    fn fallback(self) -> &'static str {
        match self {
            Operation::CreatePatient => "Failed to create patient.",
            Operation::ListPatients => "Failed to load patients.",
            Operation::CreateExam => "Failed to create exam.",
            Operation::ListExams => "Failed to load exams.",
            Operation::ListTimeSlots => "Failed to load time slots.",
        }
    }
}

/// A [`ClientError`] classified into the message shown to the user.
///
/// The server's own message wins when it sent one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientFailure {
    Connection,
    InvalidData(Option<String>),
    NotFound(Option<String>),
    Conflict(Option<String>),
    Other {
        operation: Operation,
        message: Option<String>,
    },
}

impl ClientFailure {
    pub fn classify(err: &ClientError, operation: Operation) -> Self {
        match err {
            ClientError::Connection { .. } => ClientFailure::Connection,
            ClientError::Status { status, message } => {
                let message = message.clone();
                match *status {
                    StatusCode::BAD_REQUEST => ClientFailure::InvalidData(message),
                    StatusCode::NOT_FOUND => ClientFailure::NotFound(message),
                    StatusCode::CONFLICT => ClientFailure::Conflict(message),
                    _ => ClientFailure::Other { operation, message },
                }
            }
            ClientError::Decode(_) => ClientFailure::Other {
                operation,
                message: None,
            },
        }
    }
}

impl fmt::Display for ClientFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (message, fallback) = match self {
            ClientFailure::Connection => {
                return f.write_str("Connection error. Check that the server is running.");
            }
            ClientFailure::InvalidData(m) => (m, "Invalid data. Check the fields provided."),
            ClientFailure::NotFound(m) => (m, "Patient not found."),
            ClientFailure::Conflict(m) => (m, "Patient already registered."),
            ClientFailure::Other { operation, message } => (message, operation.fallback()),
        };
        f.write_str(message.as_deref().unwrap_or(fallback))
    }
}

#[derive(Deserialize)]
struct ErrorBody {
    message: Option<String>,
}

/// Thin typed wrapper over the REST routes.
#[derive(Clone, Debug)]
pub struct ApiClient {
    http: Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub async fn list_patients(&self, page: u32, page_size: u32) -> Result<Vec<Patient>, ClientError> {
        let url = self.url("/patients");
        let request = self
            .http
            .get(&url)
            .query(&[("page", page), ("pageSize", page_size)]);
        decode(send(request, url).await?).await
    }

    pub async fn create_patient(&self, body: &CreatePatient) -> Result<Patient, ClientError> {
        let url = self.url("/patients");
        decode(send(self.http.post(&url).json(body), url).await?).await
    }

    pub async fn list_exams(
        &self,
        page: u32,
        page_size: u32,
    ) -> Result<Vec<ExamWithPatient>, ClientError> {
        let url = self.url("/exams");
        let request = self
            .http
            .get(&url)
            .query(&[("page", page), ("pageSize", page_size)]);
        decode(send(request, url).await?).await
    }

    pub async fn create_exam(&self, body: &CreateExam) -> Result<Exam, ClientError> {
        let url = self.url("/exams");
        decode(send(self.http.post(&url).json(body), url).await?).await
    }

    pub async fn exam_time_slots(&self) -> Result<Vec<String>, ClientError> {
        let url = self.url("/exams/time-slots");
        decode(send(self.http.get(&url), url).await?).await
    }
}

async fn send(request: reqwest::RequestBuilder, url: String) -> Result<Response, ClientError> {
    let response = request
        .send()
        .await
        .map_err(|source| ClientError::Connection { url, source })?;

    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let message = response
        .json::<ErrorBody>()
        .await
        .ok()
        .and_then(|body| body.message)
        .filter(|m| !m.trim().is_empty());
    tracing::debug!(%status, ?message, "request failed");
    Err(ClientError::Status { status, message })
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, ClientError> {
    response.json::<T>().await.map_err(ClientError::Decode)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status(code: u16, message: Option<&str>) -> ClientError {
        ClientError::Status {
            status: StatusCode::from_u16(code).unwrap(),
            message: message.map(str::to_string),
        }
    }

    #[test]
    fn test_bad_request_prefers_server_message() {
        let failure = ClientFailure::classify(
            &status(400, Some("modality: invalid modality 'X'")),
            Operation::CreateExam,
        );
        assert_eq!(failure.to_string(), "modality: invalid modality 'X'");

        let failure = ClientFailure::classify(&status(400, None), Operation::CreateExam);
        assert_eq!(
            failure.to_string(),
            "Invalid data. Check the fields provided."
        );
    }

    #[test]
    fn test_not_found_and_conflict_fallbacks() {
        let failure = ClientFailure::classify(&status(404, None), Operation::CreateExam);
        assert_eq!(failure, ClientFailure::NotFound(None));
        assert_eq!(failure.to_string(), "Patient not found.");

        let failure = ClientFailure::classify(&status(409, None), Operation::CreatePatient);
        assert_eq!(failure.to_string(), "Patient already registered.");
    }

    #[test]
    fn test_other_status_uses_operation_fallback() {
        let failure = ClientFailure::classify(&status(500, None), Operation::CreateExam);
        assert_eq!(failure.to_string(), "Failed to create exam.");

        let failure = ClientFailure::classify(&status(503, Some("Storage unavailable")), Operation::ListPatients);
        assert_eq!(failure.to_string(), "Storage unavailable");
    }

    #[tokio::test]
    async fn test_unreachable_server_is_connection_failure() {
        // Bind then drop to get a port nothing listens on.
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let client = ApiClient::new(format!("http://{addr}"));
        let err = client
            .exam_time_slots()
            .await
            .expect_err("nothing is listening");
        let failure = ClientFailure::classify(&err, Operation::ListTimeSlots);
        assert_eq!(failure, ClientFailure::Connection);
        assert_eq!(
            failure.to_string(),
            "Connection error. Check that the server is running."
        );
    }

    async fn serve_in_memory() -> ApiClient {
        let store = std::sync::Arc::new(clinica_core::MemoryDataStore::new());
        let app = api_rest::router(api_rest::AppState::new(store));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        ApiClient::new(format!("http://{addr}"))
    }

    #[tokio::test]
    async fn test_round_trip_against_running_server() {
        let client = serve_in_memory().await;

        let patient = client
            .create_patient(&CreatePatient {
                name: "Maria".into(),
                document: "123.456.789-09".into(),
                birth_date: "1990-01-15".into(),
            })
            .await
            .expect("patient should be created");

        let exam = CreateExam {
            idempotency_key: "retry-me".into(),
            patient_id: patient.id.to_string(),
            exam_date: "2024-05-02T08:30:00Z".into(),
            modality: "US".into(),
            description: None,
        };
        let first = client.create_exam(&exam).await.expect("first create");
        let second = client.create_exam(&exam).await.expect("retry");
        assert_eq!(first.id, second.id);

        let exams = client.list_exams(1, 10).await.expect("list exams");
        assert_eq!(exams.len(), 1);
        assert_eq!(exams[0].patient.name, "Maria");

        let err = client
            .create_patient(&CreatePatient {
                name: "Maria".into(),
                document: "12345678909".into(),
                birth_date: "1990-01-15".into(),
            })
            .await
            .expect_err("duplicate document");
        assert_eq!(
            ClientFailure::classify(&err, Operation::CreatePatient).to_string(),
            "patient already registered"
        );
    }

    #[test]
    fn test_base_url_trailing_slash_is_trimmed() {
        let client = ApiClient::new("http://localhost:3000/");
        assert_eq!(client.url("/patients"), "http://localhost:3000/patients");
    }
}
