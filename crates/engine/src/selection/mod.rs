//! Remote-backed selection widget core.
//!
//! Modules:
//! - `codec`: string form of the persisted selection
//! - `cache`: wholesale-replaced list snapshot and choice tokens
//! - `machine`: the selection state machine (functional core)
//! - `session`: Tokio shell that performs the machine's remote calls
//! - `observability`: diagnostics sink for recoverable failures

mod cache;
mod codec;
mod error;
mod machine;
mod observability;
mod session;

pub use cache::{ChoiceToken, ListState, ResourceListCache};
pub use codec::{deserialize_selection, serialize_selection};
pub use error::{DeserializationError, SelectionError};
pub use machine::{
    OverlayState, RequestId, SelectionEffect, SelectionMsg, SelectionState, SelectionStateMachine, SelectionSummary,
};
pub use observability::{DiagnosticEvent, DiagnosticKind, MemorySink, ObservabilitySink, TracingSink};
pub use session::SelectionSession;
