use std::sync::Arc;

use clinica_core::{DataStore, ExamService, PatientService};

/// Application state shared across REST API handlers.
///
/// Cloning is cheap: every field shares the same store.
#[derive(Clone)]
pub struct AppState {
    pub(crate) patients: PatientService,
    pub(crate) exams: ExamService,
    pub(crate) store: Arc<dyn DataStore>,
}

impl AppState {
    pub fn new(store: Arc<dyn DataStore>) -> Self {
        Self {
            patients: PatientService::new(store.clone()),
            exams: ExamService::new(store.clone()),
            store,
        }
    }
}
