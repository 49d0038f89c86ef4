//! PostgreSQL storage implementation.

use std::str::FromStr;

use async_trait::async_trait;
use sqlx::postgres::{PgPool, PgPoolOptions, PgRow};
use sqlx::Row;
use tracing::{debug, instrument};
use uuid::Uuid;

use super::{DataStore, InsertOutcome, StorageError, StorageResult, UniqueField};
use crate::config::DatabaseConfig;
use crate::constants::{
    EXAMS_IDEMPOTENCY_KEY_CONSTRAINT, EXAMS_PATIENT_FK_CONSTRAINT, PATIENTS_DOCUMENT_CONSTRAINT,
};
use crate::records::{Exam, ExamWithPatient, NewExam, NewPatient, Patient, PatientSummary};
use clinica_types::{Modality, PageWindow};

const CREATE_PATIENTS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS patients (
    id UUID PRIMARY KEY,
    name TEXT NOT NULL,
    document TEXT NOT NULL,
    birth_date DATE NOT NULL,
    created_at TIMESTAMPTZ NOT NULL,
    updated_at TIMESTAMPTZ NOT NULL,
    CONSTRAINT patients_document_key UNIQUE (document)
)
"#;

const CREATE_EXAMS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS exams (
    id UUID PRIMARY KEY,
    idempotency_key TEXT NOT NULL,
    patient_id UUID NOT NULL,
    description TEXT,
    exam_date TIMESTAMPTZ NOT NULL,
    modality TEXT NOT NULL,
    created_at TIMESTAMPTZ NOT NULL,
    updated_at TIMESTAMPTZ NOT NULL,
    CONSTRAINT exams_idempotency_key_key UNIQUE (idempotency_key),
    CONSTRAINT exams_patient_id_fkey FOREIGN KEY (patient_id) REFERENCES patients (id)
)
"#;

const PATIENT_COLUMNS: &str = "id, name, document, birth_date, created_at, updated_at";

const EXAM_COLUMNS: &str =
    "id, idempotency_key, patient_id, description, exam_date, modality, created_at, updated_at";

/// PostgreSQL implementation of [`DataStore`].
#[derive(Debug, Clone)]
pub struct PostgresDataStore {
    pool: PgPool,
}

impl PostgresDataStore {
    /// Connects a pool using `config`.
    #[instrument(skip(config))]
    pub async fn connect(config: &DatabaseConfig) -> StorageResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(config.acquire_timeout)
            .connect(&config.url)
            .await
            .map_err(|e| StorageError::ConnectionError {
                message: e.to_string(),
            })?;

        Ok(Self::from_pool(pool))
    }

    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Creates the `patients` and `exams` tables if they do not exist.
    pub async fn ensure_tables(&self) -> StorageResult<()> {
        for ddl in [CREATE_PATIENTS_TABLE, CREATE_EXAMS_TABLE] {
            sqlx::query(ddl)
                .execute(&self.pool)
                .await
                .map_err(|e| map_sqlx_error("ensure_tables", e))?;
        }
        debug!("tables ensured");
        Ok(())
    }
}

/// Maps a driver error that is not a handled unique violation.
fn map_sqlx_error(operation: &str, err: sqlx::Error) -> StorageError {
    match err {
        sqlx::Error::Database(ref db_err) if db_err.is_foreign_key_violation() => {
            StorageError::ForeignKeyViolation {
                message: format!(
                    "{operation}: {} ({})",
                    db_err.message(),
                    db_err.constraint().unwrap_or(EXAMS_PATIENT_FK_CONSTRAINT)
                ),
            }
        }
        sqlx::Error::PoolTimedOut
        | sqlx::Error::PoolClosed
        | sqlx::Error::Io(_)
        | sqlx::Error::Tls(_) => StorageError::ConnectionError {
            message: format!("{operation}: {err}"),
        },
        other => StorageError::QueryError {
            message: format!("{operation}: {other}"),
        },
    }
}

/// Returns the unique field whose named constraint `err` violated, if any.
fn unique_violation(err: &sqlx::Error) -> Option<UniqueField> {
    let sqlx::Error::Database(db_err) = err else {
        return None;
    };
    if !db_err.is_unique_violation() {
        return None;
    }
    match db_err.constraint() {
        Some(PATIENTS_DOCUMENT_CONSTRAINT) => Some(UniqueField::PatientDocument),
        Some(EXAMS_IDEMPOTENCY_KEY_CONSTRAINT) => Some(UniqueField::ExamIdempotencyKey),
        _ => None,
    }
}

fn row_to_patient(row: &PgRow) -> Result<Patient, sqlx::Error> {
    Ok(Patient {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        document: row.try_get("document")?,
        birth_date: row.try_get("birth_date")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn row_to_exam(row: &PgRow) -> StorageResult<Exam> {
    let read = |e: sqlx::Error| StorageError::SerializationError {
        message: e.to_string(),
    };
    let modality: String = row.try_get("modality").map_err(read)?;
    let modality = Modality::from_str(&modality).map_err(|e| StorageError::SerializationError {
        message: e.to_string(),
    })?;

    Ok(Exam {
        id: row.try_get("id").map_err(read)?,
        idempotency_key: row.try_get("idempotency_key").map_err(read)?,
        patient_id: row.try_get("patient_id").map_err(read)?,
        description: row.try_get("description").map_err(read)?,
        exam_date: row.try_get("exam_date").map_err(read)?,
        modality,
        created_at: row.try_get("created_at").map_err(read)?,
        updated_at: row.try_get("updated_at").map_err(read)?,
    })
}

fn patient_from_row(row: &PgRow) -> StorageResult<Patient> {
    row_to_patient(row).map_err(|e| StorageError::SerializationError {
        message: e.to_string(),
    })
}

fn bind_window(window: PageWindow) -> (i64, i64) {
    (
        i64::try_from(window.skip).unwrap_or(i64::MAX),
        i64::try_from(window.take).unwrap_or(i64::MAX),
    )
}

#[async_trait]
impl DataStore for PostgresDataStore {
    #[instrument(skip(self, patient))]
    async fn insert_patient(&self, patient: NewPatient) -> StorageResult<InsertOutcome<Patient>> {
        let record = patient.into_record(chrono::Utc::now());
        let result = sqlx::query(&format!(
            "INSERT INTO patients ({PATIENT_COLUMNS}) VALUES ($1, $2, $3, $4, $5, $6) \
             RETURNING {PATIENT_COLUMNS}"
        ))
        .bind(record.id)
        .bind(&record.name)
        .bind(&record.document)
        .bind(record.birth_date)
        .bind(record.created_at)
        .bind(record.updated_at)
        .fetch_one(&self.pool)
        .await;

        match result {
            Ok(row) => Ok(InsertOutcome::Inserted(patient_from_row(&row)?)),
            Err(e) => match unique_violation(&e) {
                Some(field) => Ok(InsertOutcome::AlreadyExists(field)),
                None => Err(map_sqlx_error("insert_patient", e)),
            },
        }
    }

    #[instrument(skip(self))]
    async fn find_patient_by_id(&self, id: Uuid) -> StorageResult<Option<Patient>> {
        let row = sqlx::query(&format!(
            "SELECT {PATIENT_COLUMNS} FROM patients WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("find_patient_by_id", e))?;

        row.as_ref().map(patient_from_row).transpose()
    }

    #[instrument(skip(self, document))]
    async fn find_patient_by_document(&self, document: &str) -> StorageResult<Option<Patient>> {
        let row = sqlx::query(&format!(
            "SELECT {PATIENT_COLUMNS} FROM patients WHERE document = $1"
        ))
        .bind(document)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("find_patient_by_document", e))?;

        row.as_ref().map(patient_from_row).transpose()
    }

    async fn patient_exists(&self, id: Uuid) -> StorageResult<bool> {
        let row = sqlx::query("SELECT EXISTS (SELECT 1 FROM patients WHERE id = $1)")
            .bind(id)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("patient_exists", e))?;

        row.try_get::<bool, _>(0)
            .map_err(|e| StorageError::SerializationError {
                message: e.to_string(),
            })
    }

    #[instrument(skip(self))]
    async fn list_patients(&self, window: PageWindow) -> StorageResult<Vec<Patient>> {
        let (offset, limit) = bind_window(window);
        let rows = sqlx::query(&format!(
            "SELECT {PATIENT_COLUMNS} FROM patients ORDER BY created_at, id OFFSET $1 LIMIT $2"
        ))
        .bind(offset)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("list_patients", e))?;

        rows.iter().map(patient_from_row).collect()
    }

    #[instrument(skip(self, exam), fields(patient_id = %exam.patient_id))]
    async fn insert_exam(&self, exam: NewExam) -> StorageResult<InsertOutcome<Exam>> {
        let record = exam.into_record(chrono::Utc::now());
        let result = sqlx::query(&format!(
            "INSERT INTO exams ({EXAM_COLUMNS}) VALUES ($1, $2, $3, $4, $5, $6, $7, $8) \
             RETURNING {EXAM_COLUMNS}"
        ))
        .bind(record.id)
        .bind(&record.idempotency_key)
        .bind(record.patient_id)
        .bind(&record.description)
        .bind(record.exam_date)
        .bind(record.modality.as_str())
        .bind(record.created_at)
        .bind(record.updated_at)
        .fetch_one(&self.pool)
        .await;

        match result {
            Ok(row) => Ok(InsertOutcome::Inserted(row_to_exam(&row)?)),
            Err(e) => match unique_violation(&e) {
                Some(field) => Ok(InsertOutcome::AlreadyExists(field)),
                None => Err(map_sqlx_error("insert_exam", e)),
            },
        }
    }

    #[instrument(skip(self, key))]
    async fn find_exam_by_idempotency_key(&self, key: &str) -> StorageResult<Option<Exam>> {
        let row = sqlx::query(&format!(
            "SELECT {EXAM_COLUMNS} FROM exams WHERE idempotency_key = $1"
        ))
        .bind(key)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("find_exam_by_idempotency_key", e))?;

        row.as_ref().map(row_to_exam).transpose()
    }

    #[instrument(skip(self))]
    async fn list_exams(&self, window: PageWindow) -> StorageResult<Vec<ExamWithPatient>> {
        let (offset, limit) = bind_window(window);
        let rows = sqlx::query(
            r#"
            SELECT e.id, e.idempotency_key, e.patient_id, e.description, e.exam_date,
                   e.modality, e.created_at, e.updated_at, p.name AS patient_name
            FROM exams e
            JOIN patients p ON p.id = e.patient_id
            ORDER BY e.created_at, e.id
            OFFSET $1 LIMIT $2
            "#,
        )
        .bind(offset)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("list_exams", e))?;

        rows.iter()
            .map(|row| -> StorageResult<ExamWithPatient> {
                let exam = row_to_exam(row)?;
                let name: String = row.try_get("patient_name").map_err(|e| {
                    StorageError::SerializationError {
                        message: e.to_string(),
                    }
                })?;
                let patient = PatientSummary {
                    id: exam.patient_id,
                    name,
                };
                Ok(ExamWithPatient { exam, patient })
            })
            .collect()
    }

    async fn health_check(&self) -> StorageResult<()> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("health_check", e))?;
        Ok(())
    }
}
