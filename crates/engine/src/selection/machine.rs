//! Selection state machine.
//!
//! The machine is a functional core: user and host events are methods that
//! mutate local state synchronously and return [`SelectionEffect`]s describing
//! the remote calls to perform. Completed calls are fed back through
//! [`SelectionStateMachine::apply`]. Nothing here awaits, so every transition
//! is atomic with respect to the event loop driving it.
//!
//! Ordering rules:
//! - at most one confirmation is in flight; further `choose` calls are ignored
//! - a list response that lands while a confirmation is in flight is buffered
//!   and applied once the confirmation settles
//! - only the most recent list request may replace the list
//! - after `unmount`, every late response is discarded
//! - a parameter change discards the list, its tokens and any unconfirmed choice

use std::{fmt, sync::Arc};

use fileselect_types::{ParameterId, PersistenceBridge, ResourceDescriptor, ServiceError, ServiceOperation};
use tracing::{debug, info, warn};

use super::{
    cache::{ChoiceToken, ListState, ResourceListCache},
    codec::{deserialize_selection, serialize_selection},
    error::SelectionError,
    observability::{DiagnosticEvent, DiagnosticKind, ObservabilitySink},
};

/// Identifies one remote call issued by one mount of a widget.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct RequestId {
    generation: u64,
    sequence: u64,
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.generation, self.sequence)
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub enum SelectionState {
    #[default]
    Unselected,
    Selected(ResourceDescriptor),
}

impl SelectionState {
    pub fn descriptor(&self) -> Option<&ResourceDescriptor> {
        match self {
            Self::Selected(descriptor) => Some(descriptor),
            Self::Unselected => None,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OverlayState {
    #[default]
    Closed,
    Open,
}

/// Remote call the driver must perform on the machine's behalf.
#[derive(Clone, Debug, PartialEq)]
pub enum SelectionEffect {
    FetchList {
        request_id: RequestId,
        parameter_id: ParameterId,
    },
    Materialize {
        request_id: RequestId,
        parameter_id: ParameterId,
        descriptor: ResourceDescriptor,
    },
}

/// Completion of a [`SelectionEffect`], fed back into the machine.
#[derive(Clone, Debug)]
pub enum SelectionMsg {
    ListFetched {
        request_id: RequestId,
        result: Result<Vec<ResourceDescriptor>, ServiceError>,
    },
    Materialized {
        request_id: RequestId,
        result: Result<(), ServiceError>,
    },
}

/// What the summary panel should say.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum SelectionSummary<'a> {
    /// Nothing chosen and no list yet.
    Loading,
    /// Nothing chosen; the list holds this many resources.
    FilesFound(usize),
    Selected(&'a ResourceDescriptor),
}

impl fmt::Display for SelectionSummary<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Loading => f.write_str("Loading files..."),
            Self::FilesFound(count) => write!(f, "{count} files found."),
            Self::Selected(descriptor) => write!(f, "File name: {}", descriptor.name()),
        }
    }
}

#[derive(Debug)]
struct PendingChoice {
    request_id: RequestId,
    descriptor: ResourceDescriptor,
}

#[derive(Debug)]
struct PendingFetch {
    request_id: RequestId,
    parameter_id: ParameterId,
}

pub struct SelectionStateMachine {
    parameter_id: ParameterId,
    selection: SelectionState,
    cache: ResourceListCache,
    overlay: OverlayState,
    bridge: Box<dyn PersistenceBridge>,
    sink: Arc<dyn ObservabilitySink>,
    mounted: bool,
    generation: u64,
    next_sequence: u64,
    pending_fetch: Option<PendingFetch>,
    pending_choice: Option<PendingChoice>,
    deferred_list: Option<Vec<ResourceDescriptor>>,
    last_error: Option<SelectionError>,
}

impl fmt::Debug for SelectionStateMachine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SelectionStateMachine")
            .field("parameter_id", &self.parameter_id)
            .field("selection", &self.selection)
            .field("list", self.cache.state())
            .field("overlay", &self.overlay)
            .field("mounted", &self.mounted)
            .finish()
    }
}

impl SelectionStateMachine {
    /// Build a widget for `parameter_id`, restoring the persisted selection
    /// before anything is rendered.
    pub fn new(parameter_id: ParameterId, bridge: Box<dyn PersistenceBridge>, sink: Arc<dyn ObservabilitySink>) -> Self {
        let mut machine = Self {
            parameter_id,
            selection: SelectionState::Unselected,
            cache: ResourceListCache::default(),
            overlay: OverlayState::Closed,
            bridge,
            sink,
            mounted: false,
            generation: 0,
            next_sequence: 0,
            pending_fetch: None,
            pending_choice: None,
            deferred_list: None,
            last_error: None,
        };
        let persisted = machine.bridge.load_serialized_selection();
        if let Err(error) = machine.initialize(&persisted) {
            debug!(parameter_id = %parameter_id, %error, "starting unselected");
        }
        machine
    }

    /// Restore the selection from its persisted form.
    ///
    /// Malformed input leaves the widget unselected; the error is reported to
    /// the sink, kept as [`Self::last_error`] and returned.
    pub fn initialize(&mut self, persisted: &str) -> Result<(), SelectionError> {
        match deserialize_selection(persisted) {
            Ok(Some(descriptor)) => {
                self.selection = SelectionState::Selected(descriptor);
                Ok(())
            }
            Ok(None) => {
                self.selection = SelectionState::Unselected;
                Ok(())
            }
            Err(error) => {
                self.selection = SelectionState::Unselected;
                self.sink.report(&DiagnosticEvent::new(
                    DiagnosticKind::DeserializeFailed,
                    self.parameter_id,
                    error.to_string(),
                ));
                let error = SelectionError::from(error);
                self.last_error = Some(error.clone());
                Err(error)
            }
        }
    }

    /// Attach the widget and request the first list.
    pub fn mount(&mut self) -> Vec<SelectionEffect> {
        if self.mounted {
            return self.refresh_list();
        }
        self.mounted = true;
        self.generation += 1;
        self.next_sequence = 0;
        debug!(parameter_id = %self.parameter_id, generation = self.generation, "widget mounted");
        self.refresh_list()
    }

    /// Detach the widget. Responses to calls issued before this point are
    /// dropped when they arrive.
    pub fn unmount(&mut self) {
        if !self.mounted {
            return;
        }
        self.mounted = false;
        self.generation += 1;
        self.pending_fetch = None;
        self.pending_choice = None;
        self.deferred_list = None;
        self.overlay = OverlayState::Closed;
        debug!(parameter_id = %self.parameter_id, "widget unmounted");
    }

    /// Host notification that the owning parameter may have changed.
    ///
    /// Only an actual identity change has any effect; `bridge` is dropped
    /// otherwise. On a change the old list, its tokens, the overlay and any
    /// unconfirmed choice are discarded, the selection is restored from the
    /// new parameter's `bridge`, and a fresh list is requested.
    pub fn set_parameter(&mut self, parameter_id: ParameterId, bridge: Box<dyn PersistenceBridge>) -> Vec<SelectionEffect> {
        if parameter_id == self.parameter_id {
            return Vec::new();
        }
        info!(from = %self.parameter_id, to = %parameter_id, "parameter changed");
        if let Some(pending) = self.pending_choice.take() {
            debug!(request_id = %pending.request_id, name = pending.descriptor.name(), "dropping confirmation for previous parameter");
        }
        self.parameter_id = parameter_id;
        self.bridge = bridge;
        self.cache.invalidate();
        self.overlay = OverlayState::Closed;
        self.deferred_list = None;
        self.last_error = None;

        let persisted = self.bridge.load_serialized_selection();
        if let Err(error) = self.initialize(&persisted) {
            debug!(%parameter_id, %error, "starting unselected");
        }
        self.refresh_list()
    }

    /// Request a fresh list. Redundant calls while a fetch for the same
    /// parameter is outstanding do not issue a second request.
    pub fn refresh_list(&mut self) -> Vec<SelectionEffect> {
        if !self.mounted {
            debug!(parameter_id = %self.parameter_id, "refresh ignored while unmounted");
            return Vec::new();
        }
        if let Some(pending) = &self.pending_fetch
            && pending.parameter_id == self.parameter_id
        {
            debug!(request_id = %pending.request_id, "list fetch already in flight");
            return Vec::new();
        }
        let request_id = self.next_request_id();
        self.pending_fetch = Some(PendingFetch {
            request_id,
            parameter_id: self.parameter_id,
        });
        debug!(parameter_id = %self.parameter_id, %request_id, "list fetch dispatched");
        vec![SelectionEffect::FetchList {
            request_id,
            parameter_id: self.parameter_id,
        }]
    }

    /// Show the overlay. Returns whether it is open afterwards.
    pub fn open_overlay(&mut self) -> bool {
        if !self.cache.state().is_loaded() {
            debug!(parameter_id = %self.parameter_id, "overlay stays closed until the list is loaded");
            return false;
        }
        self.overlay = OverlayState::Open;
        true
    }

    pub fn close_overlay(&mut self) {
        self.overlay = OverlayState::Closed;
    }

    /// Confirm the resource referenced by `token`.
    ///
    /// Ignored when the overlay is closed, another confirmation is in flight,
    /// or the token belongs to a list snapshot that has since been replaced.
    pub fn choose(&mut self, token: ChoiceToken) -> Vec<SelectionEffect> {
        if !self.mounted || self.overlay != OverlayState::Open {
            debug!(parameter_id = %self.parameter_id, "choice ignored: overlay not open");
            return Vec::new();
        }
        if let Some(pending) = &self.pending_choice {
            debug!(request_id = %pending.request_id, "choice ignored: confirmation already in flight");
            return Vec::new();
        }
        let Some(descriptor) = self.cache.resolve(token).cloned() else {
            warn!(parameter_id = %self.parameter_id, index = token.index(), "choice ignored: list changed since it was offered");
            return Vec::new();
        };
        let request_id = self.next_request_id();
        info!(parameter_id = %self.parameter_id, %request_id, name = descriptor.name(), "confirming choice");
        self.pending_choice = Some(PendingChoice {
            request_id,
            descriptor: descriptor.clone(),
        });
        vec![SelectionEffect::Materialize {
            request_id,
            parameter_id: self.parameter_id,
            descriptor,
        }]
    }

    /// Feed back the outcome of a remote call.
    pub fn apply(&mut self, msg: SelectionMsg) {
        match msg {
            SelectionMsg::ListFetched { request_id, result } => self.on_list_fetched(request_id, result),
            SelectionMsg::Materialized { request_id, result } => self.on_materialized(request_id, result),
        }
    }

    fn on_list_fetched(&mut self, request_id: RequestId, result: Result<Vec<ResourceDescriptor>, ServiceError>) {
        let is_current = self.mounted && self.pending_fetch.as_ref().is_some_and(|pending| pending.request_id == request_id);
        if !is_current {
            debug!(%request_id, "discarding superseded list response");
            return;
        }
        self.pending_fetch = None;

        match result {
            Ok(items) if self.pending_choice.is_some() => {
                debug!(%request_id, item_count = items.len(), "buffering list until confirmation settles");
                self.deferred_list = Some(items);
            }
            Ok(items) => self.replace_list(items),
            Err(error) => self.record_failure(ServiceOperation::ListResources, error),
        }
    }

    fn on_materialized(&mut self, request_id: RequestId, result: Result<(), ServiceError>) {
        let is_current = self.mounted && self.pending_choice.as_ref().is_some_and(|pending| pending.request_id == request_id);
        if !is_current {
            debug!(%request_id, "discarding stale confirmation response");
            return;
        }
        let Some(PendingChoice { descriptor, .. }) = self.pending_choice.take() else {
            return;
        };

        match result {
            Ok(()) => {
                let serialized = serialize_selection(&descriptor);
                self.bridge.save_serialized_selection(&serialized);
                info!(parameter_id = %self.parameter_id, name = descriptor.name(), "selection saved");
                self.selection = SelectionState::Selected(descriptor);
                self.overlay = OverlayState::Closed;
                self.clear_error_for(ServiceOperation::MaterializeResource);
            }
            Err(error) => self.record_failure(ServiceOperation::MaterializeResource, error),
        }

        if let Some(items) = self.deferred_list.take() {
            self.replace_list(items);
        }
    }

    fn replace_list(&mut self, items: Vec<ResourceDescriptor>) {
        let item_count = items.len();
        let revision = self.cache.replace(items);
        info!(parameter_id = %self.parameter_id, item_count, revision, "resource list replaced");
        self.clear_error_for(ServiceOperation::ListResources);
    }

    fn record_failure(&mut self, operation: ServiceOperation, error: ServiceError) {
        let kind = match operation {
            ServiceOperation::ListResources => DiagnosticKind::ListFetchFailed,
            ServiceOperation::MaterializeResource => DiagnosticKind::MaterializeFailed,
        };
        self.sink.report(&DiagnosticEvent::new(
            kind,
            self.parameter_id,
            format!("{operation} failed: {error}"),
        ));
        self.last_error = Some(SelectionError::TransientFetch { operation, source: error });
    }

    fn clear_error_for(&mut self, operation: ServiceOperation) {
        if self.last_error.as_ref().and_then(SelectionError::operation) == Some(operation) {
            self.last_error = None;
        }
    }

    fn next_request_id(&mut self) -> RequestId {
        self.next_sequence += 1;
        RequestId {
            generation: self.generation,
            sequence: self.next_sequence,
        }
    }

    pub fn parameter_id(&self) -> ParameterId {
        self.parameter_id
    }

    pub fn selection(&self) -> &SelectionState {
        &self.selection
    }

    pub fn list(&self) -> &ListState {
        self.cache.state()
    }

    pub fn overlay(&self) -> OverlayState {
        self.overlay
    }

    pub fn is_overlay_open(&self) -> bool {
        self.overlay == OverlayState::Open
    }

    pub fn is_mounted(&self) -> bool {
        self.mounted
    }

    pub fn is_choice_pending(&self) -> bool {
        self.pending_choice.is_some()
    }

    pub fn is_list_pending(&self) -> bool {
        self.pending_fetch.is_some()
    }

    /// Entries of the current snapshot, each paired with the token that
    /// chooses it.
    pub fn choices(&self) -> impl Iterator<Item = (ChoiceToken, &ResourceDescriptor)> {
        self.cache.tokens()
    }

    pub fn choice_at(&self, index: usize) -> Option<ChoiceToken> {
        self.cache.token_at(index)
    }

    pub fn choice_named(&self, name: &str) -> Option<ChoiceToken> {
        self.choices()
            .find(|(_, descriptor)| descriptor.name() == name)
            .map(|(token, _)| token)
    }

    /// Most recent recoverable error, cleared when the failing operation
    /// later succeeds.
    pub fn last_error(&self) -> Option<&SelectionError> {
        self.last_error.as_ref()
    }

    pub fn dismiss_error(&mut self) {
        self.last_error = None;
    }

    pub fn summary(&self) -> SelectionSummary<'_> {
        match (&self.selection, self.cache.state()) {
            (SelectionState::Selected(descriptor), _) => SelectionSummary::Selected(descriptor),
            (SelectionState::Unselected, ListState::NotLoaded) => SelectionSummary::Loading,
            (SelectionState::Unselected, list) => SelectionSummary::FilesFound(list.items().len()),
        }
    }

    pub fn action_label(&self) -> &'static str {
        match self.selection {
            SelectionState::Selected(_) => "Change file",
            SelectionState::Unselected => "Choose file",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::selection::observability::MemorySink;
    use serde_json::json;
    use std::sync::Mutex;

    #[derive(Default, Clone)]
    struct RecordingBridge {
        initial: String,
        saved: Arc<Mutex<Vec<String>>>,
    }

    impl RecordingBridge {
        fn with_initial(initial: &str) -> Self {
            Self {
                initial: initial.to_string(),
                ..Default::default()
            }
        }

        fn saved(&self) -> Vec<String> {
            self.saved.lock().unwrap().clone()
        }
    }

    impl PersistenceBridge for RecordingBridge {
        fn load_serialized_selection(&self) -> String {
            self.initial.clone()
        }

        fn save_serialized_selection(&self, serialized: &str) {
            self.saved.lock().unwrap().push(serialized.to_string());
        }
    }

    fn named(name: &str) -> ResourceDescriptor {
        ResourceDescriptor::from_value(json!({ "name": name })).unwrap()
    }

    fn machine_with(initial: &str) -> (SelectionStateMachine, RecordingBridge, Arc<MemorySink>) {
        let bridge = RecordingBridge::with_initial(initial);
        let sink = Arc::new(MemorySink::default());
        let machine = SelectionStateMachine::new(ParameterId::new(7), Box::new(bridge.clone()), sink.clone());
        (machine, bridge, sink)
    }

    fn fetch_request(effects: &[SelectionEffect]) -> RequestId {
        match effects {
            [SelectionEffect::FetchList { request_id, .. }] => *request_id,
            other => panic!("expected a single fetch, got {other:?}"),
        }
    }

    fn materialize_request(effects: &[SelectionEffect]) -> (RequestId, ResourceDescriptor) {
        match effects {
            [SelectionEffect::Materialize { request_id, descriptor, .. }] => (*request_id, descriptor.clone()),
            other => panic!("expected a single materialize, got {other:?}"),
        }
    }

    fn loaded(machine: &mut SelectionStateMachine, names: &[&str]) {
        let request_id = fetch_request(&machine.mount());
        machine.apply(SelectionMsg::ListFetched {
            request_id,
            result: Ok(names.iter().map(|name| named(name)).collect()),
        });
    }

    #[test]
    fn restores_persisted_selection_before_mount() {
        let (machine, _, sink) = machine_with(r#"{"name":"b.csv"}"#);
        assert_eq!(machine.selection(), &SelectionState::Selected(named("b.csv")));
        assert_eq!(machine.summary().to_string(), "File name: b.csv");
        assert_eq!(machine.action_label(), "Change file");
        assert!(sink.is_empty());
    }

    #[test]
    fn malformed_persisted_selection_fails_soft() {
        let (mut machine, _, sink) = machine_with("not valid json");
        assert_eq!(machine.selection(), &SelectionState::Unselected);
        assert!(matches!(machine.last_error(), Some(SelectionError::Deserialization(_))));
        assert_eq!(sink.count(DiagnosticKind::DeserializeFailed), 1);

        let result = machine.initialize("{");
        assert!(result.is_err());
        assert_eq!(machine.selection(), &SelectionState::Unselected);
    }

    #[test]
    fn empty_persisted_selection_is_unselected_without_error() {
        let (machine, _, sink) = machine_with("");
        assert_eq!(machine.selection(), &SelectionState::Unselected);
        assert!(machine.last_error().is_none());
        assert!(sink.is_empty());
        assert_eq!(machine.summary(), SelectionSummary::Loading);
    }

    #[test]
    fn mount_requests_the_list_once() {
        let (mut machine, _, _) = machine_with("");
        let first = machine.mount();
        assert_eq!(first.len(), 1);
        assert!(machine.refresh_list().is_empty(), "redundant refresh while in flight");
    }

    #[test]
    fn overlay_cannot_open_before_list_loads() {
        let (mut machine, _, _) = machine_with("");
        machine.mount();
        assert!(!machine.open_overlay());
        assert_eq!(machine.overlay(), OverlayState::Closed);
    }

    #[test]
    fn happy_path_saves_exactly_once_and_closes() {
        let (mut machine, bridge, sink) = machine_with("");
        loaded(&mut machine, &["a.csv", "b.csv"]);
        assert_eq!(machine.summary().to_string(), "2 files found.");
        assert!(machine.open_overlay());

        let token = machine.choice_named("b.csv").expect("offered");
        let (request_id, descriptor) = materialize_request(&machine.choose(token));
        assert_eq!(descriptor, named("b.csv"));
        assert!(bridge.saved().is_empty(), "nothing saved before confirmation");
        assert_eq!(machine.selection(), &SelectionState::Unselected);

        machine.apply(SelectionMsg::Materialized {
            request_id,
            result: Ok(()),
        });
        assert_eq!(bridge.saved(), vec![r#"{"name":"b.csv"}"#.to_string()]);
        assert_eq!(machine.selection(), &SelectionState::Selected(named("b.csv")));
        assert_eq!(machine.overlay(), OverlayState::Closed);
        assert!(sink.is_empty());
    }

    #[test]
    fn saved_value_restores_the_same_selection() {
        let (mut machine, bridge, _) = machine_with("");
        loaded(&mut machine, &["a.csv", "b.csv"]);
        machine.open_overlay();
        let (request_id, _) = materialize_request(&machine.choose(machine.choice_at(0).unwrap()));
        machine.apply(SelectionMsg::Materialized {
            request_id,
            result: Ok(()),
        });

        let saved = bridge.saved().pop().expect("saved value");
        let (mut remounted, _, _) = machine_with("");
        remounted.initialize(&saved).expect("valid saved value");
        assert_eq!(remounted.selection(), &SelectionState::Selected(named("a.csv")));
    }

    #[test]
    fn confirm_failure_keeps_overlay_open_and_reports_once() {
        let (mut machine, bridge, sink) = machine_with("");
        loaded(&mut machine, &["a.csv", "b.csv"]);
        machine.open_overlay();
        let (request_id, _) = materialize_request(&machine.choose(machine.choice_named("b.csv").unwrap()));

        machine.apply(SelectionMsg::Materialized {
            request_id,
            result: Err(ServiceError::Network("connection reset".into())),
        });
        assert_eq!(machine.selection(), &SelectionState::Unselected);
        assert_eq!(machine.overlay(), OverlayState::Open);
        assert_eq!(sink.count(DiagnosticKind::MaterializeFailed), 1);
        assert_eq!(sink.len(), 1);
        assert!(bridge.saved().is_empty());
        assert!(machine.last_error().is_some_and(SelectionError::is_retryable));

        // retry with the same choice succeeds
        let (retry_id, _) = materialize_request(&machine.choose(machine.choice_named("b.csv").unwrap()));
        machine.apply(SelectionMsg::Materialized {
            request_id: retry_id,
            result: Ok(()),
        });
        assert_eq!(machine.selection(), &SelectionState::Selected(named("b.csv")));
        assert!(machine.last_error().is_none());
    }

    #[test]
    fn failed_refresh_keeps_stale_list() {
        let (mut machine, _, sink) = machine_with("");
        loaded(&mut machine, &["a.csv", "b.csv"]);

        let request_id = fetch_request(&machine.refresh_list());
        machine.apply(SelectionMsg::ListFetched {
            request_id,
            result: Err(ServiceError::Status {
                status: 502,
                message: "bad gateway".into(),
            }),
        });
        let names: Vec<&str> = machine.list().items().iter().map(ResourceDescriptor::name).collect();
        assert_eq!(names, ["a.csv", "b.csv"]);
        assert_eq!(sink.count(DiagnosticKind::ListFetchFailed), 1);
    }

    #[test]
    fn empty_list_shows_zero_files_and_overlay_still_toggles() {
        let (mut machine, _, _) = machine_with("");
        loaded(&mut machine, &[]);
        assert_eq!(machine.list(), &ListState::LoadedEmpty);
        assert!(machine.summary().to_string().contains("0 files found"));
        assert!(machine.open_overlay());
        assert_eq!(machine.choices().count(), 0);
        assert!(machine.choice_at(0).is_none());
        machine.close_overlay();
        assert_eq!(machine.overlay(), OverlayState::Closed);
    }

    #[test]
    fn refresh_during_confirmation_is_buffered() {
        let (mut machine, _, _) = machine_with("");
        loaded(&mut machine, &["a.csv", "b.csv"]);
        machine.open_overlay();
        let (choice_id, _) = materialize_request(&machine.choose(machine.choice_at(1).unwrap()));

        let fetch_id = fetch_request(&machine.refresh_list());
        machine.apply(SelectionMsg::ListFetched {
            request_id: fetch_id,
            result: Ok(vec![named("c.csv")]),
        });
        assert_eq!(machine.list().items().len(), 2, "list unchanged while confirming");

        machine.apply(SelectionMsg::Materialized {
            request_id: choice_id,
            result: Ok(()),
        });
        let names: Vec<&str> = machine.list().items().iter().map(ResourceDescriptor::name).collect();
        assert_eq!(names, ["c.csv"]);
        assert_eq!(machine.selection(), &SelectionState::Selected(named("b.csv")));
    }

    #[test]
    fn second_choice_while_pending_is_ignored() {
        let (mut machine, _, _) = machine_with("");
        loaded(&mut machine, &["a.csv", "b.csv"]);
        machine.open_overlay();
        assert_eq!(machine.choose(machine.choice_at(0).unwrap()).len(), 1);
        assert!(machine.choose(machine.choice_at(1).unwrap()).is_empty());
    }

    #[test]
    fn choice_requires_open_overlay_and_fresh_token() {
        let (mut machine, _, _) = machine_with("");
        loaded(&mut machine, &["a.csv"]);
        let token = machine.choice_at(0).unwrap();
        assert!(machine.choose(token).is_empty(), "overlay closed");

        machine.open_overlay();
        let request_id = fetch_request(&machine.refresh_list());
        machine.apply(SelectionMsg::ListFetched {
            request_id,
            result: Ok(vec![named("a.csv")]),
        });
        assert!(machine.choose(token).is_empty(), "token predates the refresh");
        assert_eq!(machine.choose(machine.choice_at(0).unwrap()).len(), 1);
    }

    #[test]
    fn responses_after_unmount_are_discarded() {
        let (mut machine, bridge, sink) = machine_with("");
        loaded(&mut machine, &["a.csv"]);
        machine.open_overlay();
        let (choice_id, _) = materialize_request(&machine.choose(machine.choice_at(0).unwrap()));
        let fetch_id = fetch_request(&machine.refresh_list());

        machine.unmount();
        machine.apply(SelectionMsg::Materialized {
            request_id: choice_id,
            result: Ok(()),
        });
        machine.apply(SelectionMsg::ListFetched {
            request_id: fetch_id,
            result: Err(ServiceError::Network("late".into())),
        });
        assert!(bridge.saved().is_empty());
        assert_eq!(machine.selection(), &SelectionState::Unselected);
        assert!(sink.is_empty());

        // a remount issues fresh requests; old ids stay dead
        let remount_id = fetch_request(&machine.mount());
        assert_ne!(remount_id, fetch_id);
    }

    #[test]
    fn parameter_change_refetches_only_on_identity_change() {
        let (mut machine, _, _) = machine_with("");
        loaded(&mut machine, &["a.csv"]);
        assert!(machine.set_parameter(ParameterId::new(7), Box::new(RecordingBridge::default())).is_empty());
        assert_eq!(machine.list().items().len(), 1, "same identity keeps the list");

        let effects = machine.set_parameter(ParameterId::new(8), Box::new(RecordingBridge::default()));
        match effects.as_slice() {
            [SelectionEffect::FetchList { parameter_id, .. }] => assert_eq!(*parameter_id, ParameterId::new(8)),
            other => panic!("expected fetch for new parameter, got {other:?}"),
        }
    }

    #[test]
    fn parameter_change_invalidates_list_overlay_and_tokens() {
        let (mut machine, _, _) = machine_with("");
        loaded(&mut machine, &["param7-only.csv"]);
        assert!(machine.open_overlay());
        let token = machine.choice_at(0).unwrap();

        let request_id = fetch_request(&machine.set_parameter(ParameterId::new(8), Box::new(RecordingBridge::default())));
        assert_eq!(machine.list(), &ListState::NotLoaded);
        assert_eq!(machine.overlay(), OverlayState::Closed);
        assert_eq!(machine.summary(), SelectionSummary::Loading);
        assert!(!machine.open_overlay(), "nothing to show until the new list loads");
        assert!(machine.choose(token).is_empty());

        machine.apply(SelectionMsg::ListFetched {
            request_id,
            result: Ok(vec![named("param8.csv")]),
        });
        assert!(machine.open_overlay());
        assert!(machine.choose(token).is_empty(), "token from the previous parameter");
        let (_, descriptor) = materialize_request(&machine.choose(machine.choice_at(0).unwrap()));
        assert_eq!(descriptor, named("param8.csv"));
    }

    #[test]
    fn parameter_change_restores_and_saves_through_new_bridge() {
        let (mut machine, old_bridge, _) = machine_with(r#"{"name":"seven.csv"}"#);
        let new_bridge = RecordingBridge::with_initial(r#"{"name":"eight.csv"}"#);

        machine.mount();
        let request_id = fetch_request(&machine.set_parameter(ParameterId::new(8), Box::new(new_bridge.clone())));
        assert_eq!(machine.selection(), &SelectionState::Selected(named("eight.csv")));

        machine.apply(SelectionMsg::ListFetched {
            request_id,
            result: Ok(vec![named("nine.csv")]),
        });
        machine.open_overlay();
        let (choice_id, _) = materialize_request(&machine.choose(machine.choice_at(0).unwrap()));
        machine.apply(SelectionMsg::Materialized {
            request_id: choice_id,
            result: Ok(()),
        });
        assert!(old_bridge.saved().is_empty());
        assert_eq!(new_bridge.saved(), vec![r#"{"name":"nine.csv"}"#.to_string()]);
    }

    #[test]
    fn parameter_change_drops_pending_confirmation() {
        let (mut machine, bridge, sink) = machine_with("");
        loaded(&mut machine, &["a.csv"]);
        machine.open_overlay();
        let (choice_id, _) = materialize_request(&machine.choose(machine.choice_at(0).unwrap()));

        let fetch_id = fetch_request(&machine.set_parameter(ParameterId::new(8), Box::new(bridge.clone())));
        assert!(!machine.is_choice_pending());

        machine.apply(SelectionMsg::Materialized {
            request_id: choice_id,
            result: Ok(()),
        });
        assert!(bridge.saved().is_empty());
        assert_eq!(machine.selection(), &SelectionState::Unselected);

        // the new list is applied directly instead of waiting on the dropped choice
        machine.apply(SelectionMsg::ListFetched {
            request_id: fetch_id,
            result: Ok(vec![named("b.csv")]),
        });
        assert_eq!(machine.list().items()[0].name(), "b.csv");
        assert!(machine.open_overlay());
        assert_eq!(machine.choose(machine.choice_at(0).unwrap()).len(), 1);
        assert!(sink.is_empty());
    }

    #[test]
    fn only_latest_list_request_applies() {
        let (mut machine, _, _) = machine_with("");
        let first = fetch_request(&machine.mount());
        let second = fetch_request(&machine.set_parameter(ParameterId::new(9), Box::new(RecordingBridge::default())));

        machine.apply(SelectionMsg::ListFetched {
            request_id: first,
            result: Ok(vec![named("old.csv")]),
        });
        assert_eq!(machine.list(), &ListState::NotLoaded);

        machine.apply(SelectionMsg::ListFetched {
            request_id: second,
            result: Ok(vec![named("new.csv")]),
        });
        assert_eq!(machine.list().items()[0].name(), "new.csv");
    }
}
