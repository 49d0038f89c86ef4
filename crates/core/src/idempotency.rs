//! Create-or-return for records with a natural unique key.
//!
//! The store's unique constraint is the arbiter: the insert is attempted unconditionally and a
//! uniqueness hit on the natural key turns into a read of the row that won. There is no
//! read-before-write on this path, so two concurrent requests with the same key can never both
//! write.
//!
//! [`reject_if_exists`] is the check-first alternative used where a duplicate is a caller error
//! rather than a replay. It is not race-free on its own; callers must still handle
//! [`InsertOutcome::AlreadyExists`] from the insert that follows.

use std::fmt;
use std::future::Future;

use crate::error::{ClinicError, ClinicResult};
use crate::store::{InsertOutcome, StorageError, StorageResult, UniqueField};

/// A successfully created-or-returned record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Created<T> {
    /// This call wrote the record.
    Inserted(T),
    /// A record with the same natural key already existed and is returned unchanged.
    Existing(T),
}

impl<T> Created<T> {
    pub fn into_inner(self) -> T {
        match self {
            Created::Inserted(record) | Created::Existing(record) => record,
        }
    }

    pub fn is_replay(&self) -> bool {
        matches!(self, Created::Existing(_))
    }
}

/// Progress of a single create-or-return call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreationState {
    Start,
    ReferenceValidated,
    InsertAttempted,
    Inserted,
    DuplicateDetected,
    ExistingFetched,
    Failed,
}

impl fmt::Display for CreationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CreationState::Start => "start",
            CreationState::ReferenceValidated => "reference_validated",
            CreationState::InsertAttempted => "insert_attempted",
            CreationState::Inserted => "inserted",
            CreationState::DuplicateDetected => "duplicate_detected",
            CreationState::ExistingFetched => "existing_fetched",
            CreationState::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Tracks and traces the state transitions of one creation.
#[derive(Debug)]
pub struct CreationTracker<'a> {
    key: &'a str,
    state: CreationState,
}

impl<'a> CreationTracker<'a> {
    pub fn new(key: &'a str) -> Self {
        tracing::trace!(key, state = %CreationState::Start, "creation started");
        Self {
            key,
            state: CreationState::Start,
        }
    }

    pub fn advance(&mut self, next: CreationState) {
        tracing::trace!(key = self.key, from = %self.state, to = %next, "creation transition");
        self.state = next;
    }

    pub fn state(&self) -> CreationState {
        self.state
    }
}

/// Inserts a record, or returns the existing one if `natural_key` is already taken.
///
/// `tracker` should already be at [`CreationState::ReferenceValidated`]; it is left at
/// `Inserted`, `ExistingFetched` or `Failed`.
///
/// # Errors
///
/// - `ClinicError::UniqueViolation` if a different unique constraint fired.
/// - `ClinicError::Storage` if the insert or the read-back fails, or if the existing row cannot
///   be found after the uniqueness hit.
pub async fn create_or_return<T, Insert, Fetch, FetchFut>(
    tracker: &mut CreationTracker<'_>,
    natural_key: UniqueField,
    insert: Insert,
    fetch_existing: Fetch,
) -> ClinicResult<Created<T>>
where
    Insert: Future<Output = StorageResult<InsertOutcome<T>>>,
    Fetch: FnOnce() -> FetchFut,
    FetchFut: Future<Output = StorageResult<Option<T>>>,
{
    tracker.advance(CreationState::InsertAttempted);
    let outcome = match insert.await {
        Ok(outcome) => outcome,
        Err(e) => {
            tracker.advance(CreationState::Failed);
            return Err(e.into());
        }
    };

    match outcome {
        InsertOutcome::Inserted(record) => {
            tracker.advance(CreationState::Inserted);
            Ok(Created::Inserted(record))
        }
        InsertOutcome::AlreadyExists(field) if field == natural_key => {
            tracker.advance(CreationState::DuplicateDetected);
            match fetch_existing().await {
                Ok(Some(record)) => {
                    tracker.advance(CreationState::ExistingFetched);
                    Ok(Created::Existing(record))
                }
                Ok(None) => {
                    tracker.advance(CreationState::Failed);
                    Err(StorageError::InternalError {
                        message: format!(
                            "{field} '{}' reported as duplicate but could not be read back",
                            tracker.key
                        ),
                    }
                    .into())
                }
                Err(e) => {
                    tracker.advance(CreationState::Failed);
                    Err(e.into())
                }
            }
        }
        InsertOutcome::AlreadyExists(field) => {
            tracker.advance(CreationState::Failed);
            Err(ClinicError::UniqueViolation { field })
        }
    }
}

/// Fails with `ClinicError::Conflict(message)` if `lookup` finds a record.
pub async fn reject_if_exists<T>(
    lookup: impl Future<Output = StorageResult<Option<T>>>,
    message: &str,
) -> ClinicResult<()> {
    match lookup.await? {
        Some(_) => Err(ClinicError::Conflict(message.to_owned())),
        None => Ok(()),
    }
}
