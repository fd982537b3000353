//! SOAP 1.1 and 1.2 envelopes.
//!
//! The body is shaped along two independent axes. The operation style decides
//! where parameters go:
//!
//! - rpc: inside a method element `m:name` (`m:nameResponse` for responses)
//!   whose prefix is bound to the method namespace,
//! - wrapped: inside a method-named wrapper,
//! - document: directly in `Body`.
//!
//! In every style the method namespace is the default namespace of the
//! parameters. The rpc prefix is the one registered for the method namespace
//! with [`Coder::set_namespace_prefix`], `m` otherwise.
//!
//! The use decides whether values carry type information: encoded use (the
//! default) adds `xsi:type` (and `soapenc:Array` for arrays), literal use
//! writes bare text. Decoding finds the parameters from the shape of the body,
//! so it yields the same values whichever style produced the document.

use std::ops::{Deref, DerefMut};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use websvc_model::{Struct, Value};
use websvc_xml::{ElementId, ElementTree, local_name, name_prefix};

use crate::coder::{Coder, format_double};
use crate::config::CoderConfig;
use crate::date;
use crate::delegate::CoderDelegate;
use crate::error::CoderError;
use crate::message::Message;
use crate::rpc::{Format, RpcCoder, private};

/// Envelope namespace of SOAP 1.1.
pub const SOAP11_ENVELOPE_NS: &str = "http://schemas.xmlsoap.org/soap/envelope/";
/// Envelope namespace of SOAP 1.2.
pub const SOAP12_ENVELOPE_NS: &str = "http://www.w3.org/2003/05/soap-envelope";
/// Encoding namespace of SOAP 1.1.
pub const SOAP11_ENCODING_NS: &str = "http://schemas.xmlsoap.org/soap/encoding/";
/// Encoding namespace of SOAP 1.2.
pub const SOAP12_ENCODING_NS: &str = "http://www.w3.org/2003/05/soap-encoding";
/// XML Schema namespace.
pub const XSD_NS: &str = "http://www.w3.org/2001/XMLSchema";
/// XML Schema instance namespace.
pub const XSI_NS: &str = "http://www.w3.org/2001/XMLSchema-instance";

/// Where parameters are placed in the SOAP body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum OperationStyle {
    /// Parameters directly in `Body`.
    Document,
    /// Parameters in a prefixed method element.
    #[default]
    Rpc,
    /// Parameters in a method-named wrapper in the method namespace.
    Wrapped,
}

/// Whether body values carry type information.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SoapUse {
    /// Bare values.
    Literal,
    /// Values typed with `xsi:type`, arrays as `soapenc:Array`.
    #[default]
    Encoded,
}

/// SOAP protocol version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SoapVersion {
    /// SOAP 1.1.
    #[default]
    V11,
    /// SOAP 1.2.
    V12,
}

impl SoapVersion {
    /// The envelope namespace of this version.
    #[must_use]
    pub fn envelope_namespace(self) -> &'static str {
        match self {
            Self::V11 => SOAP11_ENVELOPE_NS,
            Self::V12 => SOAP12_ENVELOPE_NS,
        }
    }

    /// The encoding namespace of this version.
    #[must_use]
    pub fn encoding_namespace(self) -> &'static str {
        match self {
            Self::V11 => SOAP11_ENCODING_NS,
            Self::V12 => SOAP12_ENCODING_NS,
        }
    }
}

/// The header to put in built envelopes.
#[derive(Debug, Clone, Default)]
pub enum SoapHeader {
    /// No header.
    #[default]
    None,
    /// An empty header, for a delegate to fill in.
    Empty,
    /// A copy of the root of this tree. A root that is not itself a `Header`
    /// is placed inside one.
    Element(ElementTree),
}

/// Coder for SOAP envelopes.
#[derive(Debug)]
pub struct SoapCoder {
    base: Coder,
    style: OperationStyle,
    soap_use: SoapUse,
    version: SoapVersion,
    method_namespace: Option<String>,
    header: SoapHeader,
}

impl Default for SoapCoder {
    fn default() -> Self {
        Self::new(&CoderConfig::default())
    }
}

type Delegate = Option<Arc<dyn CoderDelegate>>;

impl SoapCoder {
    /// Create a coder from configuration: rpc style, encoded use, SOAP 1.1.
    #[must_use]
    pub fn new(config: &CoderConfig) -> Self {
        let mut base = Coder::new(config);
        for (uri, prefix) in [
            (SOAP11_ENVELOPE_NS, "soapenv"),
            (SOAP12_ENVELOPE_NS, "soapenv"),
            (SOAP11_ENCODING_NS, "soapenc"),
            (SOAP12_ENCODING_NS, "soapenc"),
            (XSD_NS, "xsd"),
            (XSI_NS, "xsi"),
        ] {
            base.set_namespace_prefix(uri, prefix);
        }
        Self {
            base,
            style: OperationStyle::default(),
            soap_use: SoapUse::default(),
            version: SoapVersion::default(),
            method_namespace: None,
            header: SoapHeader::None,
        }
    }

    /// Where parameters are placed in the body.
    #[must_use]
    pub fn operation_style(&self) -> OperationStyle {
        self.style
    }

    /// Set where parameters are placed in the body.
    pub fn set_operation_style(&mut self, style: OperationStyle) {
        self.style = style;
    }

    /// Whether values carry type information.
    #[must_use]
    pub fn soap_use(&self) -> SoapUse {
        self.soap_use
    }

    /// Set whether values carry type information.
    pub fn set_soap_use(&mut self, soap_use: SoapUse) {
        self.soap_use = soap_use;
    }

    /// The SOAP version of built envelopes.
    #[must_use]
    pub fn soap_version(&self) -> SoapVersion {
        self.version
    }

    /// Set the SOAP version of built envelopes.
    pub fn set_soap_version(&mut self, version: SoapVersion) {
        self.version = version;
    }

    /// The namespace method and parameter names are placed in.
    #[must_use]
    pub fn method_namespace(&self) -> Option<&str> {
        self.method_namespace.as_deref()
    }

    /// Set the namespace for method and parameter names. Without one, the
    /// target namespace of the delegate's operation port is used.
    pub fn set_method_namespace(&mut self, uri: Option<String>) {
        self.method_namespace = uri;
    }

    /// The header put in built envelopes.
    #[must_use]
    pub fn header(&self) -> &SoapHeader {
        &self.header
    }

    /// Set the header put in built envelopes.
    pub fn set_header(&mut self, header: SoapHeader) {
        self.header = header;
    }

    /// Format an instant as `xsd:dateTime` in the coder's time zone.
    #[must_use]
    pub fn encode_date_time_from(&self, value: &DateTime<Utc>) -> String {
        date::format_xsd(value, self.time_zone())
    }

    fn prefix(&self, uri: &str, fallback: &'static str) -> String {
        self.namespace_prefix(uri)
            .filter(|p| !p.is_empty())
            .unwrap_or(fallback)
            .to_owned()
    }

    // ---------------------------------------------------------------------
    // Building
    // ---------------------------------------------------------------------

    fn build(
        &mut self,
        method: Option<&str>,
        parameters: &Struct,
        order: Option<&[String]>,
        response: bool,
    ) -> Result<(), CoderError> {
        let (tree, envelope) = self.build_tree(method, parameters, order, response)?;
        let out = self.base.output_mut();
        out.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>");
        out.nl();
        tree.encode_with(envelope, out);
        Ok(())
    }

    fn build_tree(
        &self,
        method: Option<&str>,
        parameters: &Struct,
        order: Option<&[String]>,
        response: bool,
    ) -> Result<(ElementTree, ElementId), CoderError> {
        let fault = self.fault();
        let method = if fault {
            None
        } else {
            Some(super::resolve_method(&self.base, method, is_valid_element_name)?)
        };
        let delegate = self.delegate().cloned();
        let namespace = self.method_namespace.clone().or_else(|| {
            delegate
                .as_ref()
                .and_then(|d| d.operation_port())
                .and_then(|port| port.target_namespace)
        });
        let encoded = self.soap_use == SoapUse::Encoded;
        let env_ns = self.version.envelope_namespace();
        let enc_ns = self.version.encoding_namespace();
        let env = self.prefix(env_ns, "soapenv");

        let mut tree = ElementTree::new();
        let envelope = tree.create_element("Envelope", Some(env_ns), &format!("{env}:Envelope"), &[]);
        tree.set_namespace(envelope, &env, env_ns);
        tree.set_namespace(envelope, &self.prefix(XSD_NS, "xsd"), XSD_NS);
        tree.set_namespace(envelope, &self.prefix(XSI_NS, "xsi"), XSI_NS);
        if encoded {
            tree.set_namespace(envelope, &self.prefix(enc_ns, "soapenc"), enc_ns);
            tree.set_attribute(envelope, &format!("{env}:encodingStyle"), Some(enc_ns));
        }
        let envelope = self.offer(&delegate, &mut tree, envelope);
        tree.set_root(envelope);

        let proposed = match &self.header {
            SoapHeader::None => None,
            SoapHeader::Empty => Some(tree.create_element("Header", Some(env_ns), &format!("{env}:Header"), &[])),
            SoapHeader::Element(source) => source.root().map(|root| tree.import(source, root)),
        };
        let header = match &delegate {
            Some(d) => {
                let header = d.will_encode(&self.base, &mut tree, proposed);
                if header != proposed {
                    tracing::trace!("delegate replaced the header");
                }
                header
            }
            None => proposed,
        };
        if let Some(header) = header {
            let header = if tree.name(header) == "Header" {
                header
            } else {
                let wrapper = tree.create_element("Header", Some(env_ns), &format!("{env}:Header"), &[]);
                tree.add_child(wrapper, header);
                wrapper
            };
            tree.add_child(envelope, header);
        }

        let body = tree.create_element("Body", Some(env_ns), &format!("{env}:Body"), &[]);
        let body = self.offer(&delegate, &mut tree, body);
        tree.add_child(envelope, body);

        let Some(method) = method else {
            let fault = tree.create_element("Fault", Some(env_ns), &format!("{env}:Fault"), &[]);
            let fault = self.offer(&delegate, &mut tree, fault);
            tree.add_child(body, fault);
            for (name, value) in parameters.ordered_fields(order)? {
                self.encode_item(&delegate, &mut tree, fault, name, value, false)?;
            }
            return Ok((tree, envelope));
        };

        let local = if response {
            format!("{method}Response")
        } else {
            method
        };
        let container = match self.style {
            OperationStyle::Document => {
                if let Some(ns) = &namespace {
                    tree.set_namespace(body, "", ns);
                }
                body
            }
            OperationStyle::Rpc => {
                let el = match &namespace {
                    Some(ns) => {
                        let prefix = self.prefix(ns, "m");
                        let el = tree.create_element(&local, Some(ns), &format!("{prefix}:{local}"), &[]);
                        tree.set_namespace(el, &prefix, ns);
                        tree.set_namespace(el, "", ns);
                        el
                    }
                    None => tree.create(&local),
                };
                let el = self.offer(&delegate, &mut tree, el);
                tree.add_child(body, el);
                el
            }
            OperationStyle::Wrapped => {
                let el = tree.create_element(&local, namespace.as_deref(), &local, &[]);
                if let Some(ns) = &namespace {
                    tree.set_namespace(el, "", ns);
                }
                let el = self.offer(&delegate, &mut tree, el);
                tree.add_child(body, el);
                el
            }
        };
        for (name, value) in parameters.ordered_fields(order)? {
            self.encode_item(&delegate, &mut tree, container, name, value, encoded)?;
        }
        Ok((tree, envelope))
    }

    /// Offer a newly built element to the delegate, which may replace it.
    fn offer(&self, delegate: &Delegate, tree: &mut ElementTree, proposed: ElementId) -> ElementId {
        let Some(d) = delegate else {
            return proposed;
        };
        match d.will_encode(&self.base, tree, Some(proposed)) {
            Some(el) if el != proposed => {
                tracing::trace!(element = tree.name(proposed), "delegate replaced element");
                el
            }
            _ => proposed,
        }
    }

    fn encode_item(
        &self,
        delegate: &Delegate,
        tree: &mut ElementTree,
        parent: ElementId,
        name: &str,
        value: &Value,
        typed: bool,
    ) -> Result<(), CoderError> {
        if !is_valid_element_name(name) {
            return Err(CoderError::InvalidElementName(name.to_owned()));
        }
        if let Some(d) = delegate {
            if d.encode_item(&self.base, tree, value, name, parent) {
                tracing::trace!(name, "delegate encoded item");
                return Ok(());
            }
        }

        let el = tree.create(name);
        tree.add_child(parent, el);
        let xsi = self.prefix(XSI_NS, "xsi");
        let xsd = self.prefix(XSD_NS, "xsd");
        let leaf = |tree: &mut ElementTree, kind: &str, text: &str| {
            tree.add_content(el, text);
            if typed {
                tree.set_attribute(el, &format!("{xsi}:type"), Some(format!("{xsd}:{kind}").as_str()));
            }
        };

        match value {
            Value::Null => tree.set_attribute(el, &format!("{xsi}:nil"), Some("true")),
            Value::Bool(b) => leaf(tree, "boolean", if *b { "true" } else { "false" }),
            Value::Int(n) => leaf(tree, int_kind(*n), &n.to_string()),
            Value::Double(d) => leaf(tree, "double", &format_double(*d)),
            Value::String(s) => leaf(tree, "string", s),
            Value::Other(other) => leaf(tree, "string", &other.to_string()),
            Value::DateTime(dt) => leaf(tree, "dateTime", &self.encode_date_time_from(dt)),
            Value::Binary(data) => leaf(tree, "base64Binary", &self.encode_base64_from(data)),
            Value::Array(items) => {
                if typed {
                    let enc_ns = self.version.encoding_namespace();
                    let enc = self.prefix(enc_ns, "soapenc");
                    let item_kind = common_kind(items).unwrap_or("anyType");
                    tree.set_attribute(el, &format!("{xsi}:type"), Some(format!("{enc}:Array").as_str()));
                    tree.set_attribute(
                        el,
                        &format!("{enc}:arrayType"),
                        Some(format!("{xsd}:{item_kind}[{}]", items.len()).as_str()),
                    );
                }
                for item in items {
                    self.encode_item(delegate, tree, el, "item", item, typed)?;
                }
            }
            Value::Struct(members) => {
                for (name, value) in members.ordered_fields(None)? {
                    self.encode_item(delegate, tree, el, name, value, typed)?;
                }
            }
        }
        Ok(())
    }

    // ---------------------------------------------------------------------
    // Decoding
    // ---------------------------------------------------------------------

    fn decode(&self, data: &[u8]) -> Result<Message, CoderError> {
        let mut tree = self.base.parse_tree(data)?;
        let delegate = self.delegate().cloned();
        let root = tree
            .root()
            .ok_or_else(|| CoderError::malformed("document has no root element"))?;

        let envelope = self.before_decode(&delegate, &mut tree, root);
        if tree.name(envelope) != "Envelope" {
            return Err(CoderError::malformed(format!(
                "expected Envelope, found <{}>",
                tree.qualified(envelope)
            )));
        }
        if let Some(ns) = tree.namespace(envelope) {
            if ns != SOAP11_ENVELOPE_NS && ns != SOAP12_ENVELOPE_NS {
                return Err(CoderError::malformed(format!("unknown envelope namespace {ns}")));
            }
        }

        let mut message = Message::default();
        let mut body = None;
        let children: Vec<ElementId> = tree.children(envelope).collect();
        for child in children {
            let name = tree.name(child).to_owned();
            match name.as_str() {
                "Header" if message.header.is_none() => {
                    let header = self.before_decode(&delegate, &mut tree, child);
                    message.header = Some(tree.deep_copy(header));
                }
                "Body" if body.is_none() => body = Some(self.before_decode(&delegate, &mut tree, child)),
                _ => {}
            }
        }
        let body = body.ok_or_else(|| CoderError::malformed("envelope without Body"))?;

        let first = tree.first_child(body);
        if let Some(fault) = first.filter(|f| tree.name(*f) == "Fault") {
            let fault = self.before_decode(&delegate, &mut tree, fault);
            message.fault = Some(self.decode_struct(&delegate, &tree, fault)?);
            return Ok(message);
        }

        let method = self.method_element(&delegate, &tree, body);
        let container = match method {
            Some(method) => {
                let method = self.before_decode(&delegate, &mut tree, method);
                message.method = Some(tree.name(method).to_owned());
                method
            }
            None => body,
        };
        for child in tree.children(container) {
            let name = tree.name(child);
            let value = self.decode_element(&delegate, &tree, child, name)?;
            message.push_parameter(name.to_owned(), value);
        }
        Ok(message)
    }

    /// The method element of an rpc or wrapped body, or `None` when the
    /// parameters sit directly in `Body`.
    ///
    /// The body decides where it can: a lone child declaring its own namespace
    /// or named after the delegate's operation is a method element; several
    /// children, a `Body` declaring the default namespace, or a lone typed or
    /// text-only child are parameters. Otherwise the configured style decides.
    fn method_element(&self, delegate: &Delegate, tree: &ElementTree, body: ElementId) -> Option<ElementId> {
        let first = tree.first_child(body)?;
        if tree.count_children(body) > 1 {
            return None;
        }
        let declares_own_namespace = tree
            .namespace(first)
            .is_some_and(|ns| tree.namespaces(first).values().any(|uri| uri == ns));
        if declares_own_namespace {
            return Some(first);
        }
        let operation = delegate.as_ref().and_then(|d| d.operation_name());
        if let Some(operation) = operation {
            let name = tree.name(first);
            if name == operation || name.strip_suffix("Response") == Some(operation.as_str()) {
                return Some(first);
            }
        }
        let is_value = tree.namespaces(body).contains_key("")
            || xsi_attribute(tree, first, "type").is_some()
            || xsi_attribute(tree, first, "nil").is_some()
            || (tree.count_children(first) == 0
                && tree.content(first).is_some_and(|text| !text.trim().is_empty()));
        if is_value {
            return None;
        }
        (self.style != OperationStyle::Document).then_some(first)
    }

    /// Offer an element to the delegate before it is decoded.
    fn before_decode(&self, delegate: &Delegate, tree: &mut ElementTree, element: ElementId) -> ElementId {
        let Some(d) = delegate else {
            return element;
        };
        let replacement = d.will_decode(&self.base, tree, element);
        if replacement != element {
            tracing::trace!(element = tree.name(element), "delegate replaced element before decoding");
        }
        replacement
    }

    fn decode_element(
        &self,
        delegate: &Delegate,
        tree: &ElementTree,
        el: ElementId,
        name: &str,
    ) -> Result<Value, CoderError> {
        if let Some(d) = delegate {
            if let Some(value) = d.decode_item(&self.base, tree, el, name) {
                tracing::trace!(name, "delegate decoded item");
                return Ok(value);
            }
        }
        if xsi_attribute(tree, el, "nil").is_some_and(|v| matches!(v.trim(), "true" | "1")) {
            return Ok(Value::Null);
        }

        let xsi_type = xsi_attribute(tree, el, "type");
        let is_array = xsi_type.is_some_and(|t| local_name(t) == "Array")
            || tree.attributes(el).keys().any(|k| local_name(k) == "arrayType");
        if is_array || (tree.count_children(el) > 0 && looks_like_array(tree, el)) {
            let mut items = Vec::with_capacity(tree.count_children(el));
            for child in tree.children(el) {
                items.push(self.decode_element(delegate, tree, child, tree.name(child))?);
            }
            return Ok(Value::Array(items));
        }
        if tree.count_children(el) > 0 {
            return self.decode_struct(delegate, tree, el).map(Value::Struct);
        }

        let text = tree.content(el).unwrap_or_default();
        match xsi_type {
            None => Ok(Value::String(text.to_owned())),
            Some(kind) => match self.parse_xsi(Some(kind), text) {
                Some(value) => Ok(value),
                None if is_schema_type(tree, el, kind) => Err(CoderError::invalid_value(kind, text)),
                None => Ok(Value::String(text.to_owned())),
            },
        }
    }

    fn decode_struct(
        &self,
        delegate: &Delegate,
        tree: &ElementTree,
        el: ElementId,
    ) -> Result<Struct, CoderError> {
        let mut members = Struct::ordered(Vec::<(String, Value)>::new());
        for child in tree.children(el) {
            let name = tree.name(child);
            members.insert(name, self.decode_element(delegate, tree, child, name)?);
        }
        Ok(members)
    }
}

/// The value of the XML Schema instance attribute `local` on `el`.
fn xsi_attribute<'a>(tree: &'a ElementTree, el: ElementId, local: &str) -> Option<&'a str> {
    tree.attributes(el).iter().find_map(|(key, value)| {
        let prefix = name_prefix(key)?;
        let bound = match tree.resolve_prefix(el, prefix) {
            Some(uri) => uri == XSI_NS,
            None => prefix == "xsi",
        };
        (bound && local_name(key) == local).then_some(value.as_str())
    })
}

/// Whether a qualified type name is in the XML Schema namespace.
fn is_schema_type(tree: &ElementTree, el: ElementId, kind: &str) -> bool {
    match name_prefix(kind) {
        Some(prefix) => match tree.resolve_prefix(el, prefix) {
            Some(uri) => uri == XSD_NS,
            None => matches!(prefix, "xsd" | "xs"),
        },
        None => true,
    }
}

/// Untyped elements with at least two children all sharing one name are
/// arrays.
fn looks_like_array(tree: &ElementTree, el: ElementId) -> bool {
    let mut names = tree.children(el).map(|c| tree.name(c));
    let Some(first) = names.next() else {
        return false;
    };
    tree.count_children(el) >= 2 && names.all(|n| n == first)
}

fn int_kind(n: i64) -> &'static str {
    if i32::try_from(n).is_ok() { "int" } else { "long" }
}

fn scalar_kind(value: &Value) -> Option<&'static str> {
    match value {
        Value::Bool(_) => Some("boolean"),
        Value::Int(n) => Some(int_kind(*n)),
        Value::Double(_) => Some("double"),
        Value::String(_) | Value::Other(_) => Some("string"),
        Value::DateTime(_) => Some("dateTime"),
        Value::Binary(_) => Some("base64Binary"),
        Value::Null | Value::Array(_) | Value::Struct(_) => None,
    }
}

/// The schema type shared by every item, if there is one.
fn common_kind(items: &[Value]) -> Option<&'static str> {
    let mut kinds = items.iter().map(scalar_kind);
    let first = kinds.next()??;
    kinds.all(|k| k == Some(first)).then_some(first)
}

/// Element names start with a letter or `_` and continue with letters,
/// digits, `_`, `-` or `.`.
fn is_valid_element_name(name: &str) -> bool {
    let mut chars = name.chars();
    chars
        .next()
        .is_some_and(|c| c.is_alphabetic() || c == '_')
        && chars.all(|c| c.is_alphanumeric() || matches!(c, '_' | '-' | '.'))
}

impl Deref for SoapCoder {
    type Target = Coder;

    fn deref(&self) -> &Coder {
        &self.base
    }
}

impl DerefMut for SoapCoder {
    fn deref_mut(&mut self) -> &mut Coder {
        &mut self.base
    }
}

impl private::Sealed for SoapCoder {}

impl RpcCoder for SoapCoder {
    fn format(&self) -> Format {
        Format::Soap
    }

    fn coder(&self) -> &Coder {
        &self.base
    }

    fn coder_mut(&mut self) -> &mut Coder {
        &mut self.base
    }

    fn build_request(
        &mut self,
        method: Option<&str>,
        parameters: &Struct,
        order: Option<&[String]>,
    ) -> Result<Vec<u8>, CoderError> {
        let result = self.build(method, parameters, order, false);
        self.base.finish_build("soap", result)
    }

    fn build_response(
        &mut self,
        method: Option<&str>,
        parameters: &Struct,
        order: Option<&[String]>,
    ) -> Result<Vec<u8>, CoderError> {
        let result = self.build(method, parameters, order, true);
        self.base.finish_build("soap", result)
    }

    fn parse_message(&mut self, data: &[u8]) -> Result<Message, CoderError> {
        self.decode(data)
    }
}
