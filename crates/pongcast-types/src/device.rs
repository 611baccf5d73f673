//! Discoverable receiver routes.

use serde::{Deserialize, Serialize};

/// Opaque handle for a discoverable receiver, assigned by the transport layer.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RouteId(pub String);

impl RouteId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl std::fmt::Display for RouteId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// One discoverable remote receiver.
///
/// Routes are supplied by discovery and only referenced by the coordinators;
/// they never own the underlying device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceRoute {
    pub id: RouteId,
    /// Human-readable name (e.g. "Living Room TV").
    pub name: String,
    /// Optional longer description from the transport.
    #[serde(default)]
    pub description: Option<String>,
}

impl DeviceRoute {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: RouteId::new(id),
            name: name.into(),
            description: None,
        }
    }
}
