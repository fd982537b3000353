//! JSON in the shape of JSON-RPC 2.0.
//!
//! ```json
//! {"jsonrpc": "2.0", "method": "add", "params": {"a": 1}, "id": 7}
//! {"jsonrpc": "2.0", "result": {"sum": 3}, "id": 7}
//! {"jsonrpc": "2.0", "error": {"code": -32601, "message": "..."}, "id": 7}
//! ```
//!
//! JSON has no date or binary types. Dates are written in the XML-RPC text
//! form `YYYYMMDDTHH:MM:SS`, and strings of exactly that form decode as dates.
//! Binary data is written as base64 and decodes as a string.

use std::ops::{Deref, DerefMut};

use chrono::FixedOffset;
use serde_json::{Map, Number};
use websvc_model::{Struct, Value};

use crate::coder::Coder;
use crate::config::CoderConfig;
use crate::date;
use crate::error::CoderError;
use crate::message::Message;
use crate::rpc::{Format, RpcCoder, private};

const JSONRPC_VERSION: &str = "2.0";

/// Coder for JSON-RPC shaped JSON.
#[derive(Debug, Default)]
pub struct JsonCoder {
    base: Coder,
    id: Option<Value>,
}

impl JsonCoder {
    /// Create a coder from configuration.
    #[must_use]
    pub fn new(config: &CoderConfig) -> Self {
        Self {
            base: Coder::new(config),
            id: None,
        }
    }

    /// The id written into built messages.
    #[must_use]
    pub fn id(&self) -> Option<&Value> {
        self.id.as_ref()
    }

    /// Set the id written into built messages; `None` omits it.
    pub fn set_id(&mut self, id: Option<Value>) {
        self.id = id;
    }

    fn build(
        &mut self,
        method: Option<&str>,
        parameters: &Struct,
        order: Option<&[String]>,
        response: bool,
    ) -> Result<(), CoderError> {
        let mut doc = Map::new();
        doc.insert("jsonrpc".into(), JSONRPC_VERSION.into());
        let body = self.encode_struct(parameters, order)?;
        if self.fault() {
            doc.insert("error".into(), body);
        } else if response {
            doc.insert("result".into(), body);
        } else {
            let name = super::resolve_method(&self.base, method, |name| !name.is_empty())?;
            doc.insert("method".into(), name.into());
            doc.insert("params".into(), body);
        }
        if let Some(id) = &self.id {
            doc.insert("id".into(), self.encode_value(id)?);
        }

        let doc = serde_json::Value::Object(doc);
        let text = if self.compact() {
            serde_json::to_string(&doc)?
        } else {
            serde_json::to_string_pretty(&doc)?
        };
        self.base.output_mut().push_str(&text);
        Ok(())
    }

    fn encode_struct(
        &self,
        members: &Struct,
        order: Option<&[String]>,
    ) -> Result<serde_json::Value, CoderError> {
        let mut map = Map::new();
        for (name, value) in members.ordered_fields(order)? {
            map.insert(name.to_owned(), self.encode_value(value)?);
        }
        Ok(serde_json::Value::Object(map))
    }

    fn encode_value(&self, value: &Value) -> Result<serde_json::Value, CoderError> {
        let json = match value {
            Value::Null => serde_json::Value::Null,
            Value::Bool(b) => (*b).into(),
            Value::Int(n) => (*n).into(),
            Value::Double(d) => Number::from_f64(*d).map_or(serde_json::Value::Null, Into::into),
            Value::String(s) => s.as_str().into(),
            Value::DateTime(dt) => date::format_basic(dt, self.time_zone()).into(),
            Value::Binary(data) => self.encode_base64_from(data).into(),
            Value::Array(items) => items
                .iter()
                .map(|item| self.encode_value(item))
                .collect::<Result<Vec<_>, _>>()?
                .into(),
            Value::Struct(members) => self.encode_struct(members, None)?,
            Value::Other(other) => other.to_string().into(),
        };
        Ok(json)
    }

    fn decode(&self, data: &[u8]) -> Result<Message, CoderError> {
        if self.debug() {
            tracing::debug!(document = %String::from_utf8_lossy(data), "parsing document");
        }
        let doc: serde_json::Value = serde_json::from_slice(data)?;
        let serde_json::Value::Object(doc) = doc else {
            return Err(CoderError::malformed("message is not a JSON object"));
        };
        let tz = self.time_zone();
        let mut message = Message::default();

        if let Some(method) = doc.get("method") {
            let method = method
                .as_str()
                .ok_or_else(|| CoderError::malformed("method is not a string"))?;
            message.method = Some(method.to_owned());
        }
        if let Some(id) = doc.get("id") {
            message.id = Some(decode_value(id, tz));
        }

        if let Some(error) = doc.get("error") {
            match decode_value(error, tz) {
                Value::Struct(details) => message.fault = Some(details),
                other => {
                    let mut details = Struct::ordered(Vec::<(String, Value)>::new());
                    details.insert("message", other);
                    message.fault = Some(details);
                }
            }
        } else if let Some(params) = doc.get("params") {
            match params {
                serde_json::Value::Object(map) => {
                    for (name, value) in map {
                        message.push_parameter(name.clone(), decode_value(value, tz));
                    }
                }
                serde_json::Value::Array(items) => {
                    for (index, value) in items.iter().enumerate() {
                        message.push_parameter(format!("Arg{index}"), decode_value(value, tz));
                    }
                }
                serde_json::Value::Null => {}
                _ => return Err(CoderError::malformed("params is neither an object nor an array")),
            }
        } else if let Some(result) = doc.get("result") {
            match result {
                serde_json::Value::Object(map) => {
                    for (name, value) in map {
                        message.push_parameter(name.clone(), decode_value(value, tz));
                    }
                }
                other => message.push_parameter("Result".to_owned(), decode_value(other, tz)),
            }
        }
        Ok(message)
    }
}

fn decode_value(json: &serde_json::Value, tz: FixedOffset) -> Value {
    match json {
        serde_json::Value::Null => Value::Null,
        serde_json::Value::Bool(b) => Value::Bool(*b),
        serde_json::Value::Number(n) => match n.as_i64() {
            Some(i) => Value::Int(i),
            None => Value::Double(n.as_f64().unwrap_or(f64::NAN)),
        },
        serde_json::Value::String(s) => match date::parse_basic_exact(s, tz) {
            Some(dt) => Value::DateTime(dt),
            None => Value::String(s.clone()),
        },
        serde_json::Value::Array(items) => {
            Value::Array(items.iter().map(|item| decode_value(item, tz)).collect())
        }
        serde_json::Value::Object(map) => Value::Struct(Struct::ordered(
            map.iter().map(|(k, v)| (k.clone(), decode_value(v, tz))),
        )),
    }
}

impl Deref for JsonCoder {
    type Target = Coder;

    fn deref(&self) -> &Coder {
        &self.base
    }
}

impl DerefMut for JsonCoder {
    fn deref_mut(&mut self) -> &mut Coder {
        &mut self.base
    }
}

impl private::Sealed for JsonCoder {}

impl RpcCoder for JsonCoder {
    fn format(&self) -> Format {
        Format::Json
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
        self.base.finish_build("json", result)
    }

    fn build_response(
        &mut self,
        method: Option<&str>,
        parameters: &Struct,
        order: Option<&[String]>,
    ) -> Result<Vec<u8>, CoderError> {
        let result = self.build(method, parameters, order, true);
        self.base.finish_build("json", result)
    }

    fn parse_message(&mut self, data: &[u8]) -> Result<Message, CoderError> {
        self.decode(data)
    }
}
