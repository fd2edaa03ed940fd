//! # Fileselect Engine
//!
//! Core of the remote-backed selection widget: a parameter owns one widget,
//! the widget asks a backend for the resources the user may pick, shows them
//! in an overlay, confirms the pick with a second backend call, and persists
//! the result through a host-supplied string channel.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use fileselect_engine::{SelectionSession, SelectionStateMachine, TracingSink};
//!
//! let machine = SelectionStateMachine::new(parameter_id, Box::new(bridge), Arc::new(TracingSink));
//! let mut session = SelectionSession::new(machine, service);
//! session.mount();
//! session.settle().await;
//! println!("{}", session.machine().summary());
//! ```
//!
//! ## Architecture
//!
//! - **`selection::machine`**: synchronous state machine emitting effects
//! - **`selection::session`**: Tokio driver executing those effects
//! - **`selection::cache`**: list snapshot and choice tokens
//! - **`selection::codec`**: persisted string format

pub mod selection;

pub use selection::{
    ChoiceToken, DeserializationError, DiagnosticEvent, DiagnosticKind, ListState, MemorySink, ObservabilitySink, OverlayState,
    RequestId, ResourceListCache, SelectionEffect, SelectionError, SelectionMsg, SelectionSession, SelectionState,
    SelectionStateMachine, SelectionSummary, TracingSink, deserialize_selection, serialize_selection,
};
