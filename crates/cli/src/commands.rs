//! Non-interactive subcommands. Each drives a session to quiescence and
//! returns the text to print.

use anyhow::{Result, anyhow, bail};
use fileselect_engine::{SelectionSession, deserialize_selection};
use fileselect_types::{ParameterId, ServiceOperation};
use fileselect_util::JsonSelectionStore;
use tracing::warn;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChooseTarget {
    Name(String),
    Index(usize),
}

/// Mount, wait for the list, and render it with the current selection marked.
pub async fn list(mut session: SelectionSession) -> Result<String> {
    load_list(&mut session).await?;

    let machine = session.machine();
    let current = machine.selection().descriptor();
    let mut lines = vec![machine.summary().to_string()];
    for (token, descriptor) in machine.choices() {
        let marker = if current == Some(descriptor) { '*' } else { ' ' };
        lines.push(format!("{marker} {:>3}  {}", token.index(), descriptor.name()));
    }
    Ok(lines.join("\n"))
}

/// Mount, pick `target` from the fresh list, and wait for the backend to
/// confirm it.
pub async fn choose(mut session: SelectionSession, target: ChooseTarget) -> Result<String> {
    load_list(&mut session).await?;

    if !session.open_overlay() {
        bail!("file list is not available");
    }
    let token = match &target {
        ChooseTarget::Name(name) => session.machine().choice_named(name),
        ChooseTarget::Index(index) => session.machine().choice_at(*index),
    }
    .ok_or_else(|| match &target {
        ChooseTarget::Name(name) => anyhow!("no file named '{name}'"),
        ChooseTarget::Index(index) => anyhow!("no file at index {index}"),
    })?;

    session.choose(token);
    session.settle().await;

    let machine = session.machine();
    let failure = machine
        .last_error()
        .filter(|error| error.operation() == Some(ServiceOperation::MaterializeResource))
        .map(ToString::to_string);
    let summary = machine.summary().to_string();
    session.teardown();
    match failure {
        Some(error) => bail!(error),
        None => Ok(summary),
    }
}

/// Describe the persisted selection without contacting the backend.
pub fn show(store: &JsonSelectionStore, parameter_id: ParameterId) -> String {
    match deserialize_selection(&store.load(parameter_id)) {
        Ok(Some(descriptor)) => format!("File name: {}", descriptor.name()),
        Ok(None) => "No file selected".to_string(),
        Err(error) => {
            warn!(%parameter_id, %error, "ignoring malformed persisted selection");
            "No file selected".to_string()
        }
    }
}

async fn load_list(session: &mut SelectionSession) -> Result<()> {
    session.mount();
    session.settle().await;

    let machine = session.machine();
    if machine.list().is_loaded() {
        return Ok(());
    }
    let reason = machine
        .last_error()
        .filter(|error| error.operation() == Some(ServiceOperation::ListResources))
        .map(ToString::to_string)
        .unwrap_or_else(|| "file list did not load".to_string());
    session.teardown();
    bail!(reason)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;
    use fileselect_engine::{MemorySink, SelectionStateMachine};
    use fileselect_types::{RemoteResourceService, ResourceDescriptor, ServiceError};
    use fileselect_util::StoredSelectionBridge;
    use serde_json::json;

    use super::*;

    #[derive(Debug)]
    struct StubService {
        list: Result<Vec<&'static str>, ServiceError>,
        confirm: Result<(), ServiceError>,
    }

    #[async_trait]
    impl RemoteResourceService for StubService {
        async fn list_resources(&self, _parameter_id: ParameterId) -> Result<Vec<ResourceDescriptor>, ServiceError> {
            self.list.clone().map(|names| {
                names
                    .into_iter()
                    .map(|name| ResourceDescriptor::from_value(json!({ "name": name })).unwrap())
                    .collect()
            })
        }

        async fn materialize_resource(&self, _parameter_id: ParameterId, _descriptor: &ResourceDescriptor) -> Result<(), ServiceError> {
            self.confirm.clone()
        }
    }

    fn session(store: &Arc<JsonSelectionStore>, service: StubService) -> SelectionSession {
        let parameter_id = ParameterId::new(5);
        let bridge = StoredSelectionBridge::new(store.clone(), parameter_id);
        let machine = SelectionStateMachine::new(parameter_id, Box::new(bridge), Arc::new(MemorySink::default()));
        SelectionSession::new(machine, Arc::new(service))
    }

    fn ok_service(names: Vec<&'static str>) -> StubService {
        StubService {
            list: Ok(names),
            confirm: Ok(()),
        }
    }

    #[tokio::test]
    async fn choose_by_name_persists_and_show_reports_it() {
        let store = Arc::new(JsonSelectionStore::ephemeral());
        assert_eq!(show(&store, ParameterId::new(5)), "No file selected");

        let output = choose(session(&store, ok_service(vec!["a.csv", "b.csv"])), ChooseTarget::Name("b.csv".into()))
            .await
            .unwrap();
        assert_eq!(output, "File name: b.csv");
        assert_eq!(show(&store, ParameterId::new(5)), "File name: b.csv");

        let listing = list(session(&store, ok_service(vec!["a.csv", "b.csv"]))).await.unwrap();
        assert_eq!(listing, "File name: b.csv\n    0  a.csv\n*   1  b.csv");
    }

    #[tokio::test]
    async fn choose_unknown_index_fails() {
        let store = Arc::new(JsonSelectionStore::ephemeral());
        let error = choose(session(&store, ok_service(vec!["a.csv"])), ChooseTarget::Index(4))
            .await
            .unwrap_err();
        assert_eq!(error.to_string(), "no file at index 4");
        assert_eq!(store.load(ParameterId::new(5)), "");
    }

    #[tokio::test]
    async fn rejected_confirmation_is_an_error() {
        let store = Arc::new(JsonSelectionStore::ephemeral());
        let service = StubService {
            list: Ok(vec!["a.csv"]),
            confirm: Err(ServiceError::Status {
                status: 409,
                message: "locked".into(),
            }),
        };
        let error = choose(session(&store, service), ChooseTarget::Index(0)).await.unwrap_err();
        assert!(error.to_string().contains("locked"));
        assert_eq!(store.load(ParameterId::new(5)), "");
    }

    #[tokio::test]
    async fn list_failure_surfaces_service_error() {
        let store = Arc::new(JsonSelectionStore::ephemeral());
        let service = StubService {
            list: Err(ServiceError::Network("connection refused".into())),
            confirm: Ok(()),
        };
        let error = list(session(&store, service)).await.unwrap_err();
        assert!(error.to_string().contains("connection refused"));
    }

    #[tokio::test]
    async fn empty_list_prints_zero_count() {
        let store = Arc::new(JsonSelectionStore::ephemeral());
        let listing = list(session(&store, ok_service(Vec::new()))).await.unwrap();
        assert_eq!(listing, "0 files found.");
    }

    #[test]
    fn malformed_store_entry_shows_nothing_selected() {
        let store = JsonSelectionStore::ephemeral();
        store.save(ParameterId::new(5), "{oops").unwrap();
        assert_eq!(show(&store, ParameterId::new(5)), "No file selected");
    }
}
