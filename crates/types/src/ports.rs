//! Ports the host supplies to a widget instance.

use std::fmt::{self, Debug};

use async_trait::async_trait;
use thiserror::Error;

use crate::{ParameterId, ResourceDescriptor};

/// The two remote operations a widget performs.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ServiceOperation {
    ListResources,
    MaterializeResource,
}

impl fmt::Display for ServiceOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ListResources => f.write_str("list resources"),
            Self::MaterializeResource => f.write_str("materialize resource"),
        }
    }
}

/// Failure reported by a [`RemoteResourceService`].
///
/// Every variant is transient from the widget's point of view: the call may be
/// repeated safely.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ServiceError {
    /// The request never produced a response (connection, DNS, timeout).
    #[error("network error: {0}")]
    Network(String),
    /// The backend answered with a non-success status.
    #[error("HTTP {status}: {message}")]
    Status { status: u16, message: String },
    /// The response body could not be understood.
    #[error("invalid response: {0}")]
    InvalidResponse(String),
    /// The task running the call died before it produced an answer.
    #[error("remote call aborted: {0}")]
    Aborted(String),
}

/// Backend endpoint serving the selectable resources of a parameter.
#[async_trait]
pub trait RemoteResourceService: Send + Sync + Debug {
    /// Fetch the ordered list of resources the user may choose from.
    async fn list_resources(&self, parameter_id: ParameterId) -> Result<Vec<ResourceDescriptor>, ServiceError>;

    /// Designate `descriptor` as the active selection of the parameter.
    async fn materialize_resource(&self, parameter_id: ParameterId, descriptor: &ResourceDescriptor) -> Result<(), ServiceError>;
}

/// Opaque string channel the widget treats as its only durable store.
///
/// `load_serialized_selection` is called once, synchronously, when a widget is
/// constructed. `save_serialized_selection` is fire-and-forget; implementations
/// own their durability and must not panic on storage failures.
pub trait PersistenceBridge: Send {
    fn load_serialized_selection(&self) -> String;
    fn save_serialized_selection(&self, serialized: &str);
}
