use thiserror::Error;

/// Everything a facade operation can fail with.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Refused locally, before any request was issued.
    #[error(transparent)]
    Validation(#[from] ValidationError),
    /// Stale local reference to a phase or payment. A programming-contract
    /// violation, not a user error.
    #[error(transparent)]
    NotFound(#[from] NotFoundError),
    /// The server answered with a non-2xx status.
    #[error("server error ({status}): {message}")]
    Remote {
        status: u16,
        message: String,
        /// Field-level validation messages when the server sent an array;
        /// each must be surfaced to the user individually.
        field_errors: Vec<String>,
    },
    /// The request never reached the server.
    #[error("network error: {0}")]
    Network(String),
}

impl ClientError {
    /// User-facing messages, one per failure. A server validation array
    /// yields one message per field; everything else yields a single one.
    pub fn user_messages(&self) -> Vec<String> {
        match self {
            ClientError::Remote { field_errors, .. } if !field_errors.is_empty() => {
                field_errors.clone()
            }
            other => vec![other.to_string()],
        }
    }

    /// HTTP status when the failure came from the server.
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Remote { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Pre-submission guard failures. Recovered locally and never retried.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Payment amount must be greater than 0")]
    NonPositiveAmount,
    #[error("Payment amount exceeds the pending balance")]
    AmountExceedsBalance,
    #[error("A cancellation reason is required")]
    EmptyCancellationReason,
    #[error("Procedure unit cost must not be negative")]
    NegativeUnitCost,
}

/// A local index or id no longer matches server state.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum NotFoundError {
    #[error("no phase at index {0}")]
    Phase(usize),
    #[error("no payment '{1}' in phase {0}")]
    Payment(usize, String),
}
