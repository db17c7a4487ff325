//! # Protocol Messages
//!
//! Defines the Request and Response envelopes and their JSON form.
//!
//! ## Invariants
//! - **Exactly one outcome**: a decoded Response carries either `result` or
//!   `exception`, never both and never neither.
//! - **Null is a value**: `"result": null` is a present result; only a missing key is
//!   "absent".
//! - **Forward Compatibility**: unknown keys are ignored on decode.

use std::collections::BTreeMap;

use serde::Deserialize;
use serde::Deserializer;
use serde::Serialize;
use serde_json::Value;

use crate::error::Error;
use crate::error::Result;
use crate::exception::ExceptionInfo;

/// Free-form metadata piggy-backed on every message.
pub type Extras = BTreeMap<String, String>;

/// A call addressed to one stub on the receiving side.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Request {
    pub call_id: u64,
    pub instance_id: i64,
    pub interface: String,
    pub method_id: u32,
    #[serde(default)]
    pub args: Vec<Value>,
    #[serde(default)]
    pub one_way: bool,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub extras: Extras,
}

impl Request {
    pub fn encode(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

/// The answer to a non-one-way Request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Response {
    pub call_id: u64,
    #[serde(
        default,
        deserialize_with = "present",
        skip_serializing_if = "Option::is_none"
    )]
    pub result: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exception: Option<ExceptionInfo>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub extras: Extras,
}

/// The decoded outcome of a Response.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Result(Value),
    Exception(ExceptionInfo),
}

impl Response {
    /// A successful response. `Value::Null` is a legitimate result.
    pub fn success(call_id: u64, result: Value) -> Self {
        Self {
            call_id,
            result: Some(result),
            exception: None,
            extras: Extras::new(),
        }
    }

    /// A failed response.
    pub fn failure(call_id: u64, exception: ExceptionInfo) -> Self {
        Self {
            call_id,
            result: None,
            exception: Some(exception),
            extras: Extras::new(),
        }
    }

    pub fn with_extras(mut self, extras: Extras) -> Self {
        self.extras = extras;
        self
    }

    /// Checks the exactly-one-outcome invariant.
    pub fn validate(&self) -> Result<()> {
        match (&self.result, &self.exception) {
            (Some(_), None) | (None, Some(_)) => Ok(()),
            (Some(_), Some(_)) => Err(Error::ProtocolViolation(format!(
                "response {} carries both a result and an exception",
                self.call_id
            ))),
            (None, None) => Err(Error::ProtocolViolation(format!(
                "response {} carries neither a result nor an exception",
                self.call_id
            ))),
        }
    }

    /// Splits the response into its outcome and its extras.
    pub fn into_outcome(self) -> Result<(Outcome, Extras)> {
        self.validate()?;
        let outcome = match (self.result, self.exception) {
            (_, Some(exception)) => Outcome::Exception(exception),
            (Some(result), None) => Outcome::Result(result),
            (None, None) => unreachable!("validated above"),
        };
        Ok((outcome, self.extras))
    }

    pub fn encode(&self) -> Result<String> {
        self.validate()?;
        Ok(serde_json::to_string(self)?)
    }
}

/// Any message that can arrive on a handler.
#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    Request(Request),
    Response(Response),
}

impl Message {
    /// Decodes one wire message.
    ///
    /// A JSON object with a `methodId` key is a Request; any other object is a
    /// Response and must satisfy the exactly-one-outcome invariant.
    pub fn decode(raw: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(raw)?;
        let Value::Object(map) = &value else {
            return Err(Error::ProtocolViolation("message is not a JSON object".into()));
        };

        if map.contains_key("methodId") {
            return Ok(Self::Request(serde_json::from_value(value)?));
        }

        let response: Response = serde_json::from_value(value)?;
        response.validate()?;
        Ok(Self::Response(response))
    }

    pub fn encode(&self) -> Result<String> {
        match self {
            Self::Request(request) => request.encode(),
            Self::Response(response) => response.encode(),
        }
    }

    pub fn call_id(&self) -> u64 {
        match self {
            Self::Request(request) => request.call_id,
            Self::Response(response) => response.call_id,
        }
    }
}

/// The wire form of an RPC-interface-typed value: a pointer into the sender's
/// instance registry rather than a copy of the object.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteRef {
    pub interface: String,
    pub instance_id: i64,
}

impl RemoteRef {
    pub fn new(interface: impl Into<String>, instance_id: i64) -> Self {
        Self {
            interface: interface.into(),
            instance_id,
        }
    }

    pub fn to_json(&self) -> Value {
        serde_json::json!({
            "interface": self.interface,
            "instanceId": self.instance_id,
        })
    }

    /// Reads a reference back. `null` is not a reference; callers check for it first.
    pub fn from_json(value: Value) -> Result<Self> {
        if value.is_null() {
            return Err(Error::ProtocolViolation("null is not a remote reference".into()));
        }
        Ok(serde_json::from_value(value)?)
    }
}

/// Deserializes a present field as `Some`, even when its value is `null`.
fn present<'de, D>(de: D) -> std::result::Result<Option<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Value::deserialize(de).map(Some)
}
