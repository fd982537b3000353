//! XML-RPC.
//!
//! Documents have the shapes
//!
//! ```xml
//! <methodCall><methodName>add</methodName><params><param name="a"><value>...
//! <methodResponse><params><param name="sum"><value>...
//! <methodResponse><fault><value><struct>...
//! ```
//!
//! Parameter names travel in a `name` attribute on `<param>`; parameters
//! without one decode as `Arg0`, `Arg1` and so on.

use std::ops::{Deref, DerefMut};

use chrono::{DateTime, Utc};
use websvc_model::{Struct, Value};
use websvc_xml::{ElementId, ElementTree};

use crate::coder::{Coder, parse_double};
use crate::config::CoderConfig;
use crate::date;
use crate::error::CoderError;
use crate::message::Message;
use crate::rpc::{Format, RpcCoder, private};

/// Coder for XML-RPC.
#[derive(Debug, Default)]
pub struct XmlRpcCoder {
    base: Coder,
}

impl XmlRpcCoder {
    /// Create a coder from configuration.
    #[must_use]
    pub fn new(config: &CoderConfig) -> Self {
        Self {
            base: Coder::new(config),
        }
    }

    /// Format an instant as `dateTime.iso8601` text in the coder's time zone.
    #[must_use]
    pub fn encode_date_time_from(&self, value: &DateTime<Utc>) -> String {
        date::format_basic(value, self.time_zone())
    }

    fn build(
        &mut self,
        method: Option<&str>,
        parameters: &Struct,
        order: Option<&[String]>,
        response: bool,
    ) -> Result<(), CoderError> {
        let mut tree = ElementTree::new();
        let root = if self.fault() {
            let root = tree.create("methodResponse");
            let fault = tree.create("fault");
            tree.add_child(root, fault);
            let value = tree.create("value");
            tree.add_child(fault, value);
            let members = self.encode_struct(&mut tree, parameters, order)?;
            tree.add_child(value, members);
            root
        } else if response {
            let root = tree.create("methodResponse");
            let params = self.encode_params(&mut tree, parameters, order)?;
            tree.add_child(root, params);
            root
        } else {
            let name = super::resolve_method(&self.base, method, is_valid_method_name)?;
            let root = tree.create("methodCall");
            let method_name = tree.create("methodName");
            tree.add_content(method_name, &name);
            tree.add_child(root, method_name);
            let params = self.encode_params(&mut tree, parameters, order)?;
            tree.add_child(root, params);
            root
        };
        tree.set_root(root);

        let out = self.base.output_mut();
        out.push_str("<?xml version=\"1.0\"?>");
        out.nl();
        tree.encode_with(root, out);
        Ok(())
    }

    fn encode_params(
        &self,
        tree: &mut ElementTree,
        parameters: &Struct,
        order: Option<&[String]>,
    ) -> Result<ElementId, CoderError> {
        let params = tree.create("params");
        for (name, value) in parameters.ordered_fields(order)? {
            let param = tree.create_element("param", None, "param", &[("name", name)]);
            tree.add_child(params, param);
            self.encode_item(tree, param, name, value)?;
        }
        Ok(params)
    }

    fn encode_struct(
        &self,
        tree: &mut ElementTree,
        members: &Struct,
        order: Option<&[String]>,
    ) -> Result<ElementId, CoderError> {
        let el = tree.create("struct");
        for (name, value) in members.ordered_fields(order)? {
            let member = tree.create("member");
            let name_el = tree.create("name");
            tree.add_content(name_el, name);
            tree.add_child(member, name_el);
            tree.add_child(el, member);
            self.encode_item(tree, member, name, value)?;
        }
        Ok(el)
    }

    /// Add the `<value>` of the item `name` to `parent`, letting the delegate
    /// write it first if it wants to.
    fn encode_item(
        &self,
        tree: &mut ElementTree,
        parent: ElementId,
        name: &str,
        value: &Value,
    ) -> Result<(), CoderError> {
        if let Some(d) = self.delegate() {
            if d.encode_item(&self.base, tree, value, name, parent) {
                tracing::trace!(name, "delegate encoded item");
                return Ok(());
            }
        }
        let value = self.encode_value(tree, value)?;
        tree.add_child(parent, value);
        Ok(())
    }

    /// Encode a value as a `<value>` element.
    fn encode_value(&self, tree: &mut ElementTree, value: &Value) -> Result<ElementId, CoderError> {
        let el = tree.create("value");
        match value {
            Value::Null => self.encode_string(tree, el, ""),
            Value::String(s) => self.encode_string(tree, el, s),
            Value::Other(other) => self.encode_string(tree, el, &other.to_string()),
            Value::Bool(b) => typed(tree, el, "boolean", if *b { "1" } else { "0" }),
            Value::Int(n) => {
                let kind = if i32::try_from(*n).is_ok() { "i4" } else { "i8" };
                typed(tree, el, kind, &n.to_string());
            }
            Value::Double(d) => {
                if !d.is_finite() {
                    return Err(CoderError::invalid_value("double", d.to_string()));
                }
                typed(tree, el, "double", &d.to_string());
            }
            Value::DateTime(dt) => {
                typed(tree, el, "dateTime.iso8601", &self.encode_date_time_from(dt));
            }
            Value::Binary(data) => typed(tree, el, "base64", &self.encode_base64_from(data)),
            Value::Array(items) => {
                let array = tree.create("array");
                let data = tree.create("data");
                tree.add_child(array, data);
                for item in items {
                    let item = self.encode_value(tree, item)?;
                    tree.add_child(data, item);
                }
                tree.add_child(el, array);
            }
            Value::Struct(members) => {
                let members = self.encode_struct(tree, members, None)?;
                tree.add_child(el, members);
            }
        }
        Ok(el)
    }

    fn encode_string(&self, tree: &mut ElementTree, el: ElementId, text: &str) {
        if self.compact() {
            tree.add_content(el, text);
        } else {
            typed(tree, el, "string", text);
        }
    }

    fn decode(&self, data: &[u8]) -> Result<Message, CoderError> {
        let tree = self.base.parse_tree(data)?;
        let root = tree
            .root()
            .ok_or_else(|| CoderError::malformed("document has no root element"))?;
        let mut message = Message::default();

        match tree.name(root) {
            "methodCall" => {
                let name_el = tree
                    .find_child(root, "methodName")
                    .ok_or_else(|| CoderError::malformed("methodCall without methodName"))?;
                let name = tree.content(name_el).unwrap_or_default().trim();
                if !is_valid_method_name(name) {
                    return Err(CoderError::InvalidMethodName(name.to_owned()));
                }
                message.method = Some(name.to_owned());
                if let Some(params) = tree.find_child(root, "params") {
                    self.decode_params(&tree, params, &mut message)?;
                }
            }
            "methodResponse" => {
                if let Some(fault) = tree.find_child(root, "fault") {
                    let value = tree
                        .find_child(fault, "value")
                        .ok_or_else(|| CoderError::malformed("fault without value"))?;
                    match self.decode_value(&tree, value)? {
                        Value::Struct(details) => message.fault = Some(details),
                        other => {
                            return Err(CoderError::malformed(format!(
                                "fault value is a {}, not a struct",
                                other.kind()
                            )));
                        }
                    }
                } else if let Some(params) = tree.find_child(root, "params") {
                    self.decode_params(&tree, params, &mut message)?;
                }
            }
            other => {
                return Err(CoderError::malformed(format!(
                    "unexpected root element <{other}>"
                )));
            }
        }
        Ok(message)
    }

    fn decode_params(
        &self,
        tree: &ElementTree,
        params: ElementId,
        message: &mut Message,
    ) -> Result<(), CoderError> {
        let params = tree.children(params).filter(|p| tree.name(*p) == "param");
        for (index, param) in params.enumerate() {
            let name = tree
                .attribute(param, "name")
                .map_or_else(|| format!("Arg{index}"), str::to_owned);
            let value = tree
                .find_child(param, "value")
                .ok_or_else(|| CoderError::malformed(format!("param {name} without value")))?;
            let value = self.decode_item(tree, value, &name)?;
            message.push_parameter(name, value);
        }
        Ok(())
    }

    /// Decode the `<value>` of the item `name`, unless the delegate does.
    fn decode_item(&self, tree: &ElementTree, el: ElementId, name: &str) -> Result<Value, CoderError> {
        if let Some(d) = self.delegate() {
            if let Some(value) = d.decode_item(&self.base, tree, el, name) {
                tracing::trace!(name, "delegate decoded item");
                return Ok(value);
            }
        }
        self.decode_value(tree, el)
    }

    /// Decode a `<value>` element.
    fn decode_value(&self, tree: &ElementTree, el: ElementId) -> Result<Value, CoderError> {
        let Some(typed) = tree.first_child(el) else {
            return Ok(Value::String(tree.content(el).unwrap_or_default().to_owned()));
        };
        let kind = tree.name(typed);
        let text = tree.content(typed).unwrap_or_default();
        let invalid = || CoderError::invalid_value(kind, text);

        let value = match kind {
            "string" => Value::String(text.to_owned()),
            "i4" | "int" | "i8" => Value::Int(text.trim().parse().map_err(|_| invalid())?),
            "boolean" => match text.trim() {
                "1" | "true" => Value::Bool(true),
                "0" | "false" => Value::Bool(false),
                _ => return Err(invalid()),
            },
            "double" => Value::Double(parse_double(text).ok_or_else(invalid)?),
            "dateTime.iso8601" => {
                Value::DateTime(date::parse_basic(text, self.time_zone()).ok_or_else(invalid)?)
            }
            "base64" => Value::Binary(self.decode_base64_from(text).ok_or_else(invalid)?),
            "nil" => Value::Null,
            "array" => {
                let mut items = Vec::new();
                if let Some(data) = tree.find_child(typed, "data") {
                    for item in tree.children(data).filter(|v| tree.name(*v) == "value") {
                        items.push(self.decode_value(tree, item)?);
                    }
                }
                Value::Array(items)
            }
            "struct" => {
                let mut members = Struct::ordered(Vec::<(String, Value)>::new());
                for member in tree.children(typed).filter(|m| tree.name(*m) == "member") {
                    let name = tree
                        .find_child(member, "name")
                        .map(|n| tree.content(n).unwrap_or_default())
                        .ok_or_else(|| CoderError::malformed("struct member without name"))?;
                    let value = tree
                        .find_child(member, "value")
                        .ok_or_else(|| CoderError::malformed(format!("member {name} without value")))?;
                    members.insert(name, self.decode_item(tree, value, name)?);
                }
                Value::Struct(members)
            }
            other => {
                return Err(CoderError::malformed(format!("unknown value type <{other}>")));
            }
        };
        Ok(value)
    }
}

/// Append `<kind>text</kind>` to `el`.
fn typed(tree: &mut ElementTree, el: ElementId, kind: &str, text: &str) {
    let child = tree.create(kind);
    tree.add_content(child, text);
    tree.add_child(el, child);
}

/// Method names are non-empty and use only `A-Z a-z 0-9 _ . : /`.
fn is_valid_method_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | ':' | '/'))
}

impl Deref for XmlRpcCoder {
    type Target = Coder;

    fn deref(&self) -> &Coder {
        &self.base
    }
}

impl DerefMut for XmlRpcCoder {
    fn deref_mut(&mut self) -> &mut Coder {
        &mut self.base
    }
}

impl private::Sealed for XmlRpcCoder {}

impl RpcCoder for XmlRpcCoder {
    fn format(&self) -> Format {
        Format::XmlRpc
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
        self.base.finish_build("xmlrpc", result)
    }

    fn build_response(
        &mut self,
        method: Option<&str>,
        parameters: &Struct,
        order: Option<&[String]>,
    ) -> Result<Vec<u8>, CoderError> {
        let result = self.build(method, parameters, order, true);
        self.base.finish_build("xmlrpc", result)
    }

    fn parse_message(&mut self, data: &[u8]) -> Result<Message, CoderError> {
        self.decode(data)
    }
}
