//! Service port descriptor.

use serde::{Deserialize, Serialize};

/// Describes the port an operation is performed on.
///
/// This is the small slice of a WSDL port a coder needs: where the service
/// lives and which namespace its operations belong to. Coder delegates hand it
/// out through `operation_port`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Port {
    /// Port name.
    pub name: String,
    /// Endpoint address of the service.
    pub address: Option<String>,
    /// Name of the binding the port implements.
    pub binding: Option<String>,
    /// Target namespace of the operations offered on this port.
    pub target_namespace: Option<String>,
}

impl Port {
    /// Create a port with only a name set.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Set the target namespace.
    #[must_use]
    pub fn with_target_namespace(mut self, uri: impl Into<String>) -> Self {
        self.target_namespace = Some(uri.into());
        self
    }

    /// Set the endpoint address.
    #[must_use]
    pub fn with_address(mut self, address: impl Into<String>) -> Self {
        self.address = Some(address.into());
        self
    }
}
