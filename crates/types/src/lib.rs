//! Shared type definitions for the fileselect workspace.
//!
//! The widget core, the HTTP transport and the front-ends all speak in terms of
//! the values declared here: parameter identifiers, backend resource
//! descriptors, and the two ports (`RemoteResourceService`,
//! `PersistenceBridge`) the host must supply.

mod descriptor;
mod ports;

use std::{fmt, num::ParseIntError, str::FromStr};

use serde::{Deserialize, Serialize};

pub use descriptor::{DescriptorError, ResourceDescriptor};
pub use ports::{PersistenceBridge, RemoteResourceService, ServiceError, ServiceOperation};

/// Identifier of the pipeline parameter that owns a widget instance.
///
/// Allocation is the host's business; the widget only compares identifiers to
/// decide when its list must be refetched.
#[derive(Clone, Copy, Debug, Hash, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParameterId(u64);

impl ParameterId {
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ParameterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ParameterId {
    type Err = ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse::<u64>().map(Self)
    }
}

impl From<u64> for ParameterId {
    fn from(raw: u64) -> Self {
        Self(raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parameter_id_parses_and_displays() {
        let id: ParameterId = " 42 ".parse().expect("parse parameter id");
        assert_eq!(id, ParameterId::new(42));
        assert_eq!(id.to_string(), "42");
        assert!("forty-two".parse::<ParameterId>().is_err());
    }

    #[test]
    fn parameter_id_serializes_as_plain_number() {
        let json = serde_json::to_string(&ParameterId::new(7)).expect("serialize");
        assert_eq!(json, "7");
        let back: ParameterId = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back.get(), 7);
    }
}
