//! Backend resource descriptors.

use serde::{Deserialize, Serialize};
use serde_json::{Map as JsonMap, Value};
use thiserror::Error;

/// Reason a backend payload could not be accepted as a descriptor.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum DescriptorError {
    /// The payload was not a JSON object.
    #[error("resource descriptor must be a JSON object, got {0}")]
    NotAnObject(&'static str),
    /// The object had no string `name` member.
    #[error("resource descriptor is missing a string `name`")]
    MissingName,
}

/// Immutable snapshot of one selectable backend item.
///
/// The backend's JSON object is kept verbatim so it can be relayed back on
/// materialization and persisted without loss. Equality is decided by the
/// handle: the object's `id` member when the backend supplies one, otherwise
/// the whole object. Two descriptors with the same display name but different
/// handles are different resources.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(try_from = "JsonMap<String, Value>", into = "JsonMap<String, Value>")]
pub struct ResourceDescriptor {
    name: String,
    handle: Value,
    payload: JsonMap<String, Value>,
}

impl ResourceDescriptor {
    /// Accept a backend object as a descriptor.
    pub fn from_payload(payload: JsonMap<String, Value>) -> Result<Self, DescriptorError> {
        let name = payload
            .get("name")
            .and_then(Value::as_str)
            .ok_or(DescriptorError::MissingName)?
            .to_string();
        let handle = payload
            .get("id")
            .filter(|id| !id.is_null())
            .cloned()
            .unwrap_or_else(|| Value::Object(payload.clone()));
        Ok(Self { name, handle, payload })
    }

    /// Accept any JSON value, rejecting everything but objects.
    pub fn from_value(value: Value) -> Result<Self, DescriptorError> {
        match value {
            Value::Object(payload) => Self::from_payload(payload),
            other => Err(DescriptorError::NotAnObject(json_kind(&other))),
        }
    }

    /// Human-readable label shown in lists and summaries.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Opaque backend handle used for identity.
    pub fn handle(&self) -> &Value {
        &self.handle
    }

    /// The backend object exactly as received.
    pub fn payload(&self) -> &JsonMap<String, Value> {
        &self.payload
    }

    pub fn to_value(&self) -> Value {
        Value::Object(self.payload.clone())
    }
}

impl PartialEq for ResourceDescriptor {
    fn eq(&self, other: &Self) -> bool {
        self.handle == other.handle
    }
}

impl TryFrom<JsonMap<String, Value>> for ResourceDescriptor {
    type Error = DescriptorError;

    fn try_from(payload: JsonMap<String, Value>) -> Result<Self, Self::Error> {
        Self::from_payload(payload)
    }
}

impl From<ResourceDescriptor> for JsonMap<String, Value> {
    fn from(descriptor: ResourceDescriptor) -> Self {
        descriptor.payload
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
