//! Native value model for websvc RPC message codecs.
//!
//! Every wire format handled by `websvc-coder` (XML-RPC, JSON, SOAP) converts
//! to and from the same small set of native values defined here.
//!
//! # Key components
//!
//! - [`Value`]: scalars, lists and structures exchanged in RPC parameters
//! - [`Struct`]: a string-keyed map that may carry its own local field order
//! - [`Port`]: a descriptor of the service port an operation is performed on

mod port;
mod structure;
mod value;

pub use port::Port;
pub use structure::{OrderError, Struct};
pub use value::Value;
