use thiserror::Error;

/// Why a submission did not produce a task.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UploadError {
    /// The request never got a usable answer from the backend.
    #[error("network error: {message}")]
    Network { message: String },
    /// The backend refused the file; `detail` is shown to the user verbatim.
    #[error("{detail}")]
    Rejected { status: u16, detail: String },
    /// Another task is still being submitted or processed.
    #[error("a task is already in progress")]
    Busy,
}

impl UploadError {
    pub fn network(message: impl Into<String>) -> Self {
        UploadError::Network {
            message: message.into(),
        }
    }

    pub fn rejected(status: u16, detail: impl Into<String>) -> Self {
        UploadError::Rejected {
            status,
            detail: detail.into(),
        }
    }
}

/// A single status query that failed; never fatal for the task.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PollError {
    #[error("transient poll failure: {message}")]
    Transient { message: String },
}

impl PollError {
    pub fn transient(message: impl Into<String>) -> Self {
        PollError::Transient {
            message: message.into(),
        }
    }
}

/// The backend reported the task as `failed`. The contract carries no detail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("Processing failed. Check logs.")]
pub struct ProcessingFailure;

/// Errors that reach the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SurfacedError {
    #[error(transparent)]
    Upload(#[from] UploadError),
    #[error(transparent)]
    Processing(#[from] ProcessingFailure),
}
