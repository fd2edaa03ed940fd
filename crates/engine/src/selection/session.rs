//! Async shell around [`SelectionStateMachine`].
//!
//! The session turns [`SelectionEffect`]s into spawned Tokio tasks against a
//! [`RemoteResourceService`] and hands completed results back to the machine
//! one at a time. The machine itself is only touched from the task that owns
//! the session, so its transitions never interleave.
//!
//! Dropping or tearing down a session aborts every in-flight call; results
//! that still race in are rejected by the machine's generation check.

use std::{
    future::Future,
    pin::Pin,
    sync::Arc,
    task::{Context, Poll},
};

use fileselect_types::{ParameterId, PersistenceBridge, RemoteResourceService, ServiceError};
use futures_util::{StreamExt, stream::FuturesUnordered};
use tokio::task::{JoinError, JoinHandle};
use tracing::{debug, warn};

use super::{
    cache::ChoiceToken,
    machine::{RequestId, SelectionEffect, SelectionMsg, SelectionStateMachine},
};

#[derive(Clone, Copy, Debug)]
enum CallKind {
    FetchList,
    Materialize,
}

impl CallKind {
    /// Message standing in for a call whose task died without answering.
    fn failed(self, request_id: RequestId, error: &JoinError) -> SelectionMsg {
        let reason = ServiceError::Aborted(error.to_string());
        match self {
            Self::FetchList => SelectionMsg::ListFetched {
                request_id,
                result: Err(reason),
            },
            Self::Materialize => SelectionMsg::Materialized {
                request_id,
                result: Err(reason),
            },
        }
    }
}

/// A spawned remote call, tagged so a failed task can still be answered.
struct InFlight {
    request_id: RequestId,
    kind: CallKind,
    handle: JoinHandle<SelectionMsg>,
}

impl Future for InFlight {
    type Output = (RequestId, CallKind, Result<SelectionMsg, JoinError>);

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();
        Pin::new(&mut this.handle)
            .poll(cx)
            .map(|joined| (this.request_id, this.kind, joined))
    }
}

pub struct SelectionSession {
    machine: SelectionStateMachine,
    service: Arc<dyn RemoteResourceService>,
    in_flight: FuturesUnordered<InFlight>,
}

impl SelectionSession {
    pub fn new(machine: SelectionStateMachine, service: Arc<dyn RemoteResourceService>) -> Self {
        Self {
            machine,
            service,
            in_flight: FuturesUnordered::new(),
        }
    }

    pub fn machine(&self) -> &SelectionStateMachine {
        &self.machine
    }

    pub fn machine_mut(&mut self) -> &mut SelectionStateMachine {
        &mut self.machine
    }

    /// Spawn one task per effect. Must be called from within a Tokio runtime.
    pub fn dispatch(&mut self, effects: Vec<SelectionEffect>) {
        for effect in effects {
            let service = Arc::clone(&self.service);
            let call = match effect {
                SelectionEffect::FetchList { request_id, parameter_id } => {
                    debug!(%request_id, %parameter_id, "spawning list fetch");
                    InFlight {
                        request_id,
                        kind: CallKind::FetchList,
                        handle: tokio::spawn(async move {
                            let result = service.list_resources(parameter_id).await;
                            SelectionMsg::ListFetched { request_id, result }
                        }),
                    }
                }
                SelectionEffect::Materialize {
                    request_id,
                    parameter_id,
                    descriptor,
                } => {
                    debug!(%request_id, %parameter_id, "spawning materialize");
                    InFlight {
                        request_id,
                        kind: CallKind::Materialize,
                        handle: tokio::spawn(async move {
                            let result = service.materialize_resource(parameter_id, &descriptor).await;
                            SelectionMsg::Materialized { request_id, result }
                        }),
                    }
                }
            };
            self.in_flight.push(call);
        }
    }

    pub fn has_in_flight(&self) -> bool {
        !self.in_flight.is_empty()
    }

    /// Wait for the next completed call. Returns `None` once nothing is in
    /// flight. Cancel-safe, so it can sit in a `tokio::select!` branch.
    ///
    /// A task that panicked is answered with [`ServiceError::Aborted`] so the
    /// machine releases the request it was waiting on.
    pub async fn next_message(&mut self) -> Option<SelectionMsg> {
        while let Some((request_id, kind, joined)) = self.in_flight.next().await {
            match joined {
                Ok(msg) => return Some(msg),
                Err(error) if error.is_cancelled() => debug!(%request_id, "remote call cancelled"),
                Err(error) => {
                    warn!(%request_id, ?kind, %error, "remote call task failed");
                    return Some(kind.failed(request_id, &error));
                }
            }
        }
        None
    }

    pub fn apply(&mut self, msg: SelectionMsg) {
        self.machine.apply(msg);
    }

    /// Apply the next completed call. Returns `false` when nothing was pending.
    pub async fn settle_next(&mut self) -> bool {
        match self.next_message().await {
            Some(msg) => {
                self.machine.apply(msg);
                true
            }
            None => false,
        }
    }

    /// Apply completions until nothing is left in flight.
    pub async fn settle(&mut self) {
        while self.settle_next().await {}
    }

    pub fn mount(&mut self) {
        let effects = self.machine.mount();
        self.dispatch(effects);
    }

    pub fn refresh_list(&mut self) {
        let effects = self.machine.refresh_list();
        self.dispatch(effects);
    }

    pub fn set_parameter(&mut self, parameter_id: ParameterId, bridge: Box<dyn PersistenceBridge>) {
        let effects = self.machine.set_parameter(parameter_id, bridge);
        self.dispatch(effects);
    }

    pub fn open_overlay(&mut self) -> bool {
        self.machine.open_overlay()
    }

    pub fn close_overlay(&mut self) {
        self.machine.close_overlay();
    }

    pub fn choose(&mut self, token: ChoiceToken) {
        let effects = self.machine.choose(token);
        self.dispatch(effects);
    }

    /// Unmount the widget and abort everything still running.
    pub fn teardown(&mut self) {
        self.abort_in_flight();
        self.machine.unmount();
    }

    fn abort_in_flight(&mut self) {
        for call in self.in_flight.iter() {
            call.handle.abort();
        }
        self.in_flight.clear();
    }
}

impl Drop for SelectionSession {
    fn drop(&mut self) {
        self.abort_in_flight();
    }
}
