//! Record services.
//!
//! Each service owns an `Arc<dyn DataStore>` and turns raw request fields into validated
//! payloads before touching storage.
//!
//! ## Pure Data Operations
//!
//! These modules contain **only** data operations: no HTTP status codes, routing or response
//! shaping. Those belong in `api-rest`.

pub mod exams;
pub mod patients;
