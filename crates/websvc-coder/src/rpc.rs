//! The RPC capability shared by the concrete coders.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use websvc_model::Struct;

use crate::coder::Coder;
use crate::config::CoderConfig;
use crate::error::CoderError;
use crate::formats::{JsonCoder, SoapCoder, XmlRpcCoder};
use crate::message::Message;

pub(crate) mod private {
    pub trait Sealed {}
}

/// Building and parsing of RPC messages in one wire format.
///
/// Implemented by [`XmlRpcCoder`], [`JsonCoder`] and [`SoapCoder`] only.
pub trait RpcCoder: private::Sealed + Send + fmt::Debug {
    /// The wire format this coder speaks.
    fn format(&self) -> Format;

    /// The shared coder state.
    fn coder(&self) -> &Coder;

    /// Mutable access to the shared coder state.
    fn coder_mut(&mut self) -> &mut Coder;

    /// Build a request calling `method` with `parameters`.
    ///
    /// `order`, when given, must list exactly the parameter names and fixes the
    /// sequence they are written in. When the fault flag is set a fault is
    /// built instead and `method` is not needed.
    fn build_request(
        &mut self,
        method: Option<&str>,
        parameters: &Struct,
        order: Option<&[String]>,
    ) -> Result<Vec<u8>, CoderError>;

    /// Build a response carrying `parameters`.
    ///
    /// Formats that do not name the method in a response ignore `method`.
    fn build_response(
        &mut self,
        method: Option<&str>,
        parameters: &Struct,
        order: Option<&[String]>,
    ) -> Result<Vec<u8>, CoderError>;

    /// Parse a request, response or fault.
    fn parse_message(&mut self, data: &[u8]) -> Result<Message, CoderError>;

    /// Build a fault carrying `parameters`.
    ///
    /// The fault flag is set only for the duration of the call.
    fn build_fault_with_parameters(
        &mut self,
        parameters: &Struct,
        order: Option<&[String]>,
    ) -> Result<Vec<u8>, CoderError> {
        let saved = self.fault();
        self.set_fault(true);
        let result = self.build_request(None, parameters, order);
        self.set_fault(saved);
        result
    }

    /// Whether the next message built is a fault.
    fn fault(&self) -> bool {
        self.coder().fault()
    }

    /// Mark the next message built as a fault.
    fn set_fault(&mut self, fault: bool) {
        self.coder_mut().set_fault(fault);
    }

    /// Clear the session state, keeping settings.
    fn reset(&mut self) {
        self.coder_mut().reset();
    }
}

/// The supported wire formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Format {
    /// XML-RPC.
    XmlRpc,
    /// JSON-RPC 2.0 shaped JSON.
    Json,
    /// SOAP 1.1 or 1.2 envelopes.
    Soap,
}

impl Format {
    /// Create a coder for this format.
    #[must_use]
    pub fn coder(self, config: &CoderConfig) -> Box<dyn RpcCoder> {
        match self {
            Self::XmlRpc => Box::new(XmlRpcCoder::new(config)),
            Self::Json => Box::new(JsonCoder::new(config)),
            Self::Soap => Box::new(SoapCoder::new(config)),
        }
    }

    /// Short name of the format.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::XmlRpc => "xmlrpc",
            Self::Json => "json",
            Self::Soap => "soap",
        }
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Format {
    type Err = CoderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "xmlrpc" | "xml-rpc" => Ok(Self::XmlRpc),
            "json" | "jsonrpc" | "json-rpc" => Ok(Self::Json),
            "soap" => Ok(Self::Soap),
            _ => Err(CoderError::invalid_value("format", s)),
        }
    }
}
