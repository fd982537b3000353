//! RPC message coders for websvc.
//!
//! A coder converts between native values ([`Value`], [`Struct`]) and one wire
//! format. Three formats are provided, each implementing [`RpcCoder`]:
//!
//! - [`XmlRpcCoder`]: XML-RPC method calls and responses
//! - [`JsonCoder`]: JSON shaped like JSON-RPC 2.0
//! - [`SoapCoder`]: SOAP 1.1 and 1.2 envelopes in document, rpc or wrapped
//!   style, with literal or encoded use
//!
//! Every coder dereferences to a [`Coder`] holding the session state and the
//! format-independent codecs. A [`CoderDelegate`] attached to it can steer how
//! individual elements are built and decoded.
//!
//! ```
//! use websvc_coder::{CoderConfig, Format, RpcCoder};
//! use websvc_model::{Struct, Value};
//!
//! let mut coder = Format::XmlRpc.coder(&CoderConfig::default());
//! let params = Struct::ordered([("a", 1), ("b", 2)]);
//! let request = coder.build_request(Some("add"), &params, None).expect("request builds");
//! let message = coder.parse_message(&request).expect("request parses");
//! assert_eq!(message.parameter("b"), Some(&Value::Int(2)));
//! ```

mod coder;
mod config;
mod date;
mod delegate;
mod error;
mod formats;
mod message;
mod rpc;

pub use coder::Coder;
pub use config::CoderConfig;
pub use delegate::CoderDelegate;
pub use error::{CoderError, CoderResult};
pub use formats::{
    JsonCoder, OperationStyle, SOAP11_ENCODING_NS, SOAP11_ENVELOPE_NS, SOAP12_ENCODING_NS,
    SOAP12_ENVELOPE_NS, SoapCoder, SoapHeader, SoapUse, SoapVersion, XSD_NS, XSI_NS, XmlRpcCoder,
};
pub use message::Message;
pub use rpc::{Format, RpcCoder};
pub use websvc_model::{Port, Struct, Value};
pub use websvc_xml::{ElementId, ElementTree};
