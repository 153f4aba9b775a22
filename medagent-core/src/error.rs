use thiserror::Error;

/// Message shown when the service rejects a request without a usable detail.
pub const GENERIC_FAILURE_MESSAGE: &str = "The request could not be completed. Please try again.";

/// Failure of a single call against the analysis/messaging service.
///
/// A call either fully succeeds with a parsed payload or fails with one of
/// these; there is no partial result.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ServiceError {
    /// Transport-level failure, no response was received.
    #[error("Network failure: {0}")]
    Network(String),

    /// Non-2xx response carrying a structured detail.
    #[error("Service rejected the request ({status}): {detail}")]
    Rejected { status: u16, detail: String },

    /// Non-2xx response without a usable detail.
    #[error("Service rejected the request ({status})")]
    RejectedOpaque { status: u16 },

    /// A payload that could not be built or parsed: an upload part rejected
    /// before sending, or a 2xx body that did not match the expected shape.
    #[error("Invalid payload: {0}")]
    InvalidPayload(String),
}

impl ServiceError {
    /// The human-readable message surfaced in a `Failed` state.
    ///
    /// Never empty.
    pub fn message(&self) -> String {
        match self {
            ServiceError::Network(reason) if !reason.trim().is_empty() => reason.clone(),
            ServiceError::Rejected { detail, .. } if !detail.trim().is_empty() => detail.clone(),
            _ => GENERIC_FAILURE_MESSAGE.to_string(),
        }
    }
}

/// Rejected transition on a document workflow controller.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WorkflowError {
    #[error("No analyzed document is available to re-analyze")]
    NothingToReanalyze,

    #[error("Cannot reset while an analysis is in flight")]
    ResetWhilePending,
}

/// Rejected action on the follow-up controller.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FollowUpError {
    #[error("Phone number is required")]
    MissingPhone,

    #[error("Patient name is required")]
    MissingName,

    #[error("A request for this form is already in flight")]
    AlreadyPending,
}

pub type ServiceResult<T> = std::result::Result<T, ServiceError>;
