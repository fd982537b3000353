//! The concrete wire formats.

mod json;
mod soap;
mod xmlrpc;

pub use json::JsonCoder;
pub use soap::{
    OperationStyle, SOAP11_ENCODING_NS, SOAP11_ENVELOPE_NS, SOAP12_ENCODING_NS, SOAP12_ENVELOPE_NS,
    SoapCoder, SoapHeader, SoapUse, SoapVersion, XSD_NS, XSI_NS,
};
pub use xmlrpc::XmlRpcCoder;

use crate::coder::Coder;
use crate::error::CoderError;

/// The method a message is built for: the one given, else the delegate's
/// operation name. It must pass `valid`.
fn resolve_method(
    coder: &Coder,
    method: Option<&str>,
    valid: fn(&str) -> bool,
) -> Result<String, CoderError> {
    let name = match method {
        Some(name) => name.to_owned(),
        None => coder
            .delegate()
            .and_then(|d| d.operation_name())
            .ok_or(CoderError::MissingMethodName)?,
    };
    if valid(&name) {
        Ok(name)
    } else {
        Err(CoderError::InvalidMethodName(name))
    }
}
