use fileselect_types::{DescriptorError, ServiceError, ServiceOperation};
use thiserror::Error;

/// The persisted selection string could not be decoded.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum DeserializationError {
    #[error("persisted selection is not valid JSON: {0}")]
    InvalidJson(String),
    #[error("persisted selection is not a resource descriptor: {0}")]
    InvalidDescriptor(#[from] DescriptorError),
}

/// Recoverable failure surfaced by the selection state machine.
///
/// None of these are fatal: the widget degrades to a stale or unselected
/// display and the user may retry.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum SelectionError {
    /// A remote call failed; state was left at its last known good value.
    #[error("could not {operation}: {source}")]
    TransientFetch {
        operation: ServiceOperation,
        #[source]
        source: ServiceError,
    },
    /// The persisted selection was malformed and has been ignored.
    #[error(transparent)]
    Deserialization(#[from] DeserializationError),
}

impl SelectionError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::TransientFetch { .. })
    }

    pub fn operation(&self) -> Option<ServiceOperation> {
        match self {
            Self::TransientFetch { operation, .. } => Some(*operation),
            Self::Deserialization(_) => None,
        }
    }
}
