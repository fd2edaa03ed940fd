//! String encoding of the persisted selection.
//!
//! The persisted form is the backend's descriptor object rendered as compact
//! JSON, e.g. `{"name":"b.csv"}`. The empty string means "nothing chosen yet";
//! any other input must decode to an object carrying a string `name`.

use fileselect_types::ResourceDescriptor;
use serde_json::Value;

use super::error::DeserializationError;

/// Encode a descriptor for [`fileselect_types::PersistenceBridge`].
pub fn serialize_selection(descriptor: &ResourceDescriptor) -> String {
    Value::Object(descriptor.payload().clone()).to_string()
}

/// Decode a persisted selection. `Ok(None)` means no selection was ever saved.
pub fn deserialize_selection(serialized: &str) -> Result<Option<ResourceDescriptor>, DeserializationError> {
    if serialized.trim().is_empty() {
        return Ok(None);
    }
    let value: Value = serde_json::from_str(serialized).map_err(|error| DeserializationError::InvalidJson(error.to_string()))?;
    ResourceDescriptor::from_value(value)
        .map(Some)
        .map_err(DeserializationError::InvalidDescriptor)
}
