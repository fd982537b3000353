//! Decoded messages.

use websvc_model::{Struct, Value};
use websvc_xml::ElementTree;

/// The contents of a parsed request, response or fault.
#[derive(Debug, Clone)]
pub struct Message {
    /// Method name, when the format carries one.
    pub method: Option<String>,
    /// Parameters by name.
    pub parameters: Struct,
    /// Parameter names in document order.
    pub order: Vec<String>,
    /// Fault details, when the message is a fault.
    pub fault: Option<Struct>,
    /// SOAP header, as an independent tree.
    pub header: Option<ElementTree>,
    /// JSON-RPC request id.
    pub id: Option<Value>,
}

impl Default for Message {
    fn default() -> Self {
        Self {
            method: None,
            parameters: Struct::ordered(Vec::<(String, Value)>::new()),
            order: Vec::new(),
            fault: None,
            header: None,
            id: None,
        }
    }
}

impl Message {
    /// Returns `true` if the message reports a fault.
    #[must_use]
    pub fn is_fault(&self) -> bool {
        self.fault.is_some()
    }

    /// Look up a parameter by name.
    #[must_use]
    pub fn parameter(&self, name: &str) -> Option<&Value> {
        self.parameters.get(name)
    }

    /// Record a decoded parameter, keeping `order` and the local order of
    /// `parameters` in step.
    pub(crate) fn push_parameter(&mut self, name: String, value: Value) {
        if self.parameters.insert(name.clone(), value).is_none() {
            self.order.push(name);
        }
    }
}
