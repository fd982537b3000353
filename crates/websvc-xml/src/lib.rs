//! Element tree, XML output and tree parser for websvc.
//!
//! This crate provides the intermediate XML representation the websvc coders
//! build documents from and decode documents into.
//!
//! # Key components
//!
//! - [`ElementTree`] and [`ElementId`]: a mutable tree of elements held in an
//!   arena, addressed by stable handles
//! - [`XmlOutput`]: the output buffer with pretty-printing, and the three-step
//!   element encoding protocol ([`ElementTree::encode_with`])
//! - [`parse_document`] and [`TreeBuilder`]: event-driven construction of a
//!   tree from a byte buffer
//! - [`XmlError`]: parse failures

pub mod element;
pub mod error;
pub mod output;
pub mod parser;

pub use element::{ElementId, ElementTree, local_name, name_prefix};
pub use error::XmlError;
pub use output::{XmlOutput, escape_xml};
pub use parser::{TreeBuilder, parse_document};

/// The namespace permanently bound to the `xml` prefix.
pub const XML_NAMESPACE: &str = "http://www.w3.org/XML/1998/namespace";
