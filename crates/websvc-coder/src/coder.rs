//! The base coder shared by every wire format.
//!
//! [`Coder`] owns the per-session state (output buffer, fault flag, time zone,
//! delegate) and the scalar codecs that do not depend on a wire format:
//! base64, hexBinary, XML escaping, XML Schema simple types and the XML tree
//! parser. The concrete coders hold one and dereference to it.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use bytes::Bytes;
use chrono::{FixedOffset, Offset, Utc};
use websvc_model::Value;
use websvc_xml::{ElementTree, XmlError, XmlOutput, local_name, parse_document};

use crate::config::CoderConfig;
use crate::date;
use crate::delegate::CoderDelegate;
use crate::error::CoderError;

/// Session state and format-independent codecs.
pub struct Coder {
    compact: bool,
    debug: bool,
    namespace_aware: bool,
    time_zone: FixedOffset,
    fault: bool,
    output: XmlOutput,
    namespace_prefixes: HashMap<String, String>,
    delegate: Option<Arc<dyn CoderDelegate>>,
}

impl fmt::Debug for Coder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Coder")
            .field("compact", &self.compact)
            .field("debug", &self.debug)
            .field("namespace_aware", &self.namespace_aware)
            .field("time_zone", &self.time_zone)
            .field("fault", &self.fault)
            .field("output_len", &self.output.len())
            .field("namespace_prefixes", &self.namespace_prefixes)
            .field("delegate", &self.delegate.is_some())
            .finish()
    }
}

impl Default for Coder {
    fn default() -> Self {
        Self::new(&CoderConfig::default())
    }
}

impl Coder {
    /// Create a coder from configuration.
    ///
    /// An out-of-range UTC offset is logged and replaced by UTC.
    #[must_use]
    pub fn new(config: &CoderConfig) -> Self {
        let time_zone = config.time_zone().unwrap_or_else(|| {
            tracing::warn!(
                offset = config.utc_offset_seconds,
                "invalid UTC offset, using UTC"
            );
            utc()
        });
        Self {
            compact: config.compact,
            debug: config.debug,
            namespace_aware: config.namespace_aware,
            time_zone,
            fault: false,
            output: XmlOutput::new(config.compact),
            namespace_prefixes: HashMap::new(),
            delegate: None,
        }
    }

    // ---------------------------------------------------------------------
    // Settings
    // ---------------------------------------------------------------------

    /// Whether built documents are written without pretty-printing.
    #[must_use]
    pub fn compact(&self) -> bool {
        self.compact
    }

    /// Suppress or enable pretty-printing.
    pub fn set_compact(&mut self, compact: bool) {
        self.compact = compact;
        self.output.set_compact(compact);
    }

    /// Whether documents are logged as they are built and parsed.
    #[must_use]
    pub fn debug(&self) -> bool {
        self.debug
    }

    /// Turn document logging on or off.
    pub fn set_debug(&mut self, debug: bool) {
        self.debug = debug;
    }

    /// Whether namespace prefixes are resolved while parsing.
    #[must_use]
    pub fn namespace_aware(&self) -> bool {
        self.namespace_aware
    }

    /// Turn namespace resolution on or off.
    pub fn set_namespace_aware(&mut self, namespace_aware: bool) {
        self.namespace_aware = namespace_aware;
    }

    /// The time zone dates are written in, and read in when they carry no
    /// offset.
    #[must_use]
    pub fn time_zone(&self) -> FixedOffset {
        self.time_zone
    }

    /// Set the time zone.
    pub fn set_time_zone(&mut self, time_zone: FixedOffset) {
        self.time_zone = time_zone;
    }

    /// Set the time zone from an offset in seconds east of UTC.
    ///
    /// Returns `false`, leaving the zone unchanged, if the offset is out of
    /// range.
    pub fn set_utc_offset(&mut self, seconds: i32) -> bool {
        match FixedOffset::east_opt(seconds) {
            Some(tz) => {
                self.time_zone = tz;
                true
            }
            None => {
                tracing::warn!(offset = seconds, "rejecting invalid UTC offset");
                false
            }
        }
    }

    /// The attached delegate.
    #[must_use]
    pub fn delegate(&self) -> Option<&Arc<dyn CoderDelegate>> {
        self.delegate.as_ref()
    }

    /// Attach or detach a delegate.
    pub fn set_delegate(&mut self, delegate: Option<Arc<dyn CoderDelegate>>) {
        self.delegate = delegate;
    }

    /// Whether the next document built is a fault.
    #[must_use]
    pub fn fault(&self) -> bool {
        self.fault
    }

    /// Mark the next document built as a fault.
    pub fn set_fault(&mut self, fault: bool) {
        self.fault = fault;
    }

    /// The prefix preferred for a namespace URI when building documents.
    #[must_use]
    pub fn namespace_prefix(&self, uri: &str) -> Option<&str> {
        self.namespace_prefixes.get(uri).map(String::as_str)
    }

    /// Set the prefix to use for a namespace URI.
    pub fn set_namespace_prefix(&mut self, uri: impl Into<String>, prefix: impl Into<String>) {
        self.namespace_prefixes.insert(uri.into(), prefix.into());
    }

    /// Clear the session state: output, indentation and fault flag.
    ///
    /// Settings and the delegate are kept.
    pub fn reset(&mut self) {
        self.output.clear();
        self.fault = false;
    }

    // ---------------------------------------------------------------------
    // Output
    // ---------------------------------------------------------------------

    /// Increase the indentation level.
    pub fn indent(&mut self) {
        self.output.indent();
    }

    /// Decrease the indentation level.
    pub fn unindent(&mut self) {
        self.output.unindent();
    }

    /// Start a new, indented line.
    pub fn nl(&mut self) {
        self.output.nl();
    }

    /// The document written so far.
    #[must_use]
    pub fn output(&self) -> &XmlOutput {
        &self.output
    }

    /// Mutable access to the output buffer.
    pub fn output_mut(&mut self) -> &mut XmlOutput {
        &mut self.output
    }

    /// Take the document out, leaving the buffer empty.
    pub fn take_output(&mut self) -> String {
        self.output.take()
    }

    /// Hand out the built document, or clear the buffer if building failed.
    pub(crate) fn finish_build(
        &mut self,
        format: &'static str,
        result: Result<(), CoderError>,
    ) -> Result<Vec<u8>, CoderError> {
        match result {
            Ok(()) => {
                let text = self.take_output();
                if self.debug {
                    tracing::debug!(format, document = %text, "built document");
                }
                Ok(text.into_bytes())
            }
            Err(e) => {
                self.output.clear();
                Err(e)
            }
        }
    }

    // ---------------------------------------------------------------------
    // Scalar codecs
    // ---------------------------------------------------------------------

    /// Encode bytes as standard base64.
    #[must_use]
    pub fn encode_base64_from(&self, data: &[u8]) -> String {
        STANDARD.encode(data)
    }

    /// Decode standard base64, ignoring embedded whitespace.
    #[must_use]
    pub fn decode_base64_from(&self, text: &str) -> Option<Bytes> {
        let cleaned: String = text.chars().filter(|c| !c.is_whitespace()).collect();
        STANDARD.decode(cleaned).ok().map(Bytes::from)
    }

    /// Encode bytes as uppercase hexBinary.
    #[must_use]
    pub fn encode_hex_binary_from(&self, data: &[u8]) -> String {
        hex::encode_upper(data)
    }

    /// Decode hexBinary in either case, ignoring embedded whitespace.
    #[must_use]
    pub fn decode_hex_binary_from(&self, text: &str) -> Option<Bytes> {
        let cleaned: String = text.chars().filter(|c| !c.is_whitespace()).collect();
        hex::decode(cleaned).ok().map(Bytes::from)
    }

    /// Escape the five reserved XML characters.
    #[must_use]
    pub fn escape_xml_from(&self, text: &str) -> String {
        websvc_xml::escape_xml(text).into_owned()
    }

    /// Read `value` as the XML Schema simple type `xsi_type`.
    ///
    /// The type's prefix is ignored; without a type the value is a string.
    /// Returns `None` for unknown types and for text that is not a valid
    /// instance of the type.
    #[must_use]
    pub fn parse_xsi(&self, xsi_type: Option<&str>, value: &str) -> Option<Value> {
        let kind = xsi_type.map_or("string", local_name);
        match kind {
            "string" | "normalizedString" | "token" | "anyURI" | "QName" | "NCName" | "Name"
            | "NMTOKEN" | "language" | "ID" | "IDREF" | "ENTITY" | "anyType"
            | "anySimpleType" => Some(Value::String(value.to_owned())),
            "boolean" => match value.trim() {
                "true" | "1" => Some(Value::Bool(true)),
                "false" | "0" => Some(Value::Bool(false)),
                _ => None,
            },
            "decimal" | "float" | "double" => parse_double(value).map(Value::Double),
            "dateTime" => date::parse_xsd_date_time(value, self.time_zone).map(Value::DateTime),
            "date" => date::parse_xsd_date(value, self.time_zone).map(Value::DateTime),
            "base64Binary" => self.decode_base64_from(value).map(Value::Binary),
            "hexBinary" => self.decode_hex_binary_from(value).map(Value::Binary),
            other => {
                let (min, max) = integer_range(other)?;
                let n = value.trim().parse::<i64>().ok()?;
                (min..=max).contains(&n).then_some(Value::Int(n))
            }
        }
    }

    // ---------------------------------------------------------------------
    // Parsing
    // ---------------------------------------------------------------------

    /// Parse a document into an element tree.
    ///
    /// Returns `None` if the document is not well-formed; the reason is
    /// logged.
    #[must_use]
    pub fn parse_xml(&self, data: &[u8]) -> Option<ElementTree> {
        self.parse_tree(data).ok()
    }

    pub(crate) fn parse_tree(&self, data: &[u8]) -> Result<ElementTree, XmlError> {
        if self.debug {
            tracing::debug!(document = %String::from_utf8_lossy(data), "parsing document");
        }
        parse_document(data, self.namespace_aware).inspect_err(|e| {
            tracing::debug!(error = %e, "failed to parse document");
        })
    }
}

pub(crate) fn utc() -> FixedOffset {
    Utc.fix()
}

/// Read an `xsd:double`, including the `INF`, `-INF` and `NaN` spellings.
pub(crate) fn parse_double(text: &str) -> Option<f64> {
    match text.trim() {
        "INF" => Some(f64::INFINITY),
        "-INF" => Some(f64::NEG_INFINITY),
        "NaN" => Some(f64::NAN),
        other => other.parse().ok(),
    }
}

/// Write a double in the `xsd:double` lexical form.
pub(crate) fn format_double(value: f64) -> String {
    if value.is_nan() {
        "NaN".to_owned()
    } else if value == f64::INFINITY {
        "INF".to_owned()
    } else if value == f64::NEG_INFINITY {
        "-INF".to_owned()
    } else {
        value.to_string()
    }
}

fn integer_range(kind: &str) -> Option<(i64, i64)> {
    let range = match kind {
        "integer" | "long" => (i64::MIN, i64::MAX),
        "int" => (i32::MIN.into(), i32::MAX.into()),
        "short" => (i16::MIN.into(), i16::MAX.into()),
        "byte" => (i8::MIN.into(), i8::MAX.into()),
        "nonNegativeInteger" | "unsignedLong" => (0, i64::MAX),
        "positiveInteger" => (1, i64::MAX),
        "nonPositiveInteger" => (i64::MIN, 0),
        "negativeInteger" => (i64::MIN, -1),
        "unsignedInt" => (0, u32::MAX.into()),
        "unsignedShort" => (0, u16::MAX.into()),
        "unsignedByte" => (0, u8::MAX.into()),
        _ => return None,
    };
    Some(range)
}
