//! Validated value types shared by the Clinica crates.
//!
//! - [`NonEmptyText`]: trimmed text that is guaranteed to contain something
//! - [`Modality`]: the closed set of exam modalities
//! - [`PageRequest`] / [`PageWindow`]: page-number pagination and its skip/take translation

mod modality;
mod page;
mod text;

pub use modality::{Modality, ModalityError};
pub use page::{PageError, PageRequest, PageWindow, DEFAULT_PAGE, DEFAULT_PAGE_SIZE};
pub use text::{NonEmptyText, TextError};
