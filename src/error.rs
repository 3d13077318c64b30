//! Error taxonomy shared by the dialog, the repository and the reminder loop.
//!
//! None of these are fatal to the process: input errors re-prompt the user,
//! repository errors abandon the current dialog, transport errors are logged.

use thiserror::Error;

/// Malformed or out-of-range user input. Always recoverable by re-prompting.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InputError {
    #[error("date must look like dd.mm.yyyy HH:MM")]
    DateFormat,

    #[error("plan number must be a positive integer")]
    IndexFormat,

    #[error("plan number {index} is not between 1 and {len}")]
    /// `index` is the number as typed, which may not fit in a `usize`.
    IndexOutOfRange { index: String, len: usize },

    #[error("plan text cannot be empty")]
    EmptyPlanText,

    #[error("plan text cannot be longer than {max} characters")]
    PlanTextTooLong { max: usize },
}

/// Failures of the plan storage.
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// The referenced plan no longer exists (e.g. deleted since it was listed).
    #[error("plan {0} not found")]
    NotFound(String),

    #[error("corrupt plan row: {0}")]
    CorruptRow(String),
}

/// Failures while talking to the chat platform or fetching reminder images.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("telegram request failed: {0}")]
    Request(#[from] teloxide::RequestError),

    #[error("image fetch failed: {0}")]
    ImageFetch(String),
}
