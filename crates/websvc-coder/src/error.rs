//! Coder error types.

use websvc_model::OrderError;
use websvc_xml::XmlError;

/// Errors that can occur while building or parsing an RPC message.
#[derive(Debug, thiserror::Error)]
pub enum CoderError {
    /// A method name that the wire format cannot carry.
    #[error("invalid method name '{0}'")]
    InvalidMethodName(String),

    /// A parameter or member name that cannot be written as an element name.
    #[error("invalid element name '{0}'")]
    InvalidElementName(String),

    /// A request or response was built without a method name.
    #[error("no method name given and none supplied by the delegate")]
    MissingMethodName,

    /// A field order that does not list exactly the keys of the parameters.
    #[error("field order does not match the parameters: {0}")]
    OrderMismatch(#[from] OrderError),

    /// A document that parsed but does not have the shape of a message.
    #[error("malformed message: {0}")]
    MalformedMessage(String),

    /// A document that is not well-formed XML.
    #[error("XML error: {0}")]
    Xml(#[from] XmlError),

    /// A document that is not valid JSON.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Element text that cannot be read as the type it is declared as.
    #[error("invalid {kind} value '{value}'")]
    InvalidValue {
        /// The declared type.
        kind: String,
        /// The offending text.
        value: String,
    },
}

impl CoderError {
    pub(crate) fn malformed(message: impl Into<String>) -> Self {
        Self::MalformedMessage(message.into())
    }

    pub(crate) fn invalid_value(kind: impl Into<String>, value: impl Into<String>) -> Self {
        Self::InvalidValue {
            kind: kind.into(),
            value: value.into(),
        }
    }
}

/// Result type for coder operations.
pub type CoderResult<T> = Result<T, CoderError>;
