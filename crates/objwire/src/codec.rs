//! # Value/Reference Codec
//!
//! Turns [`Value`]s into wire JSON and back, per declared [`Kind`].
//!
//! ## Invariants
//!
//! - **References, not copies**: an `Object` value is written as a
//!   [`RemoteRef`] into this handler's registry. Local objects are registered as
//!   stubs first; proxies are re-exported as forwarding stubs.
//! - **Proxy reuse**: decoding a reference returns the cached proxy for its
//!   `(interface, instance id)` pair.

use objwire_proto::Extras;
use objwire_proto::RemoteRef;

use crate::error::Error;
use crate::error::Result;
use crate::handler::MessageHandler;
use crate::interface::Kind;
use crate::interface::Method;
use crate::stub::Stub;
use crate::value::Args;
use crate::value::Value;

impl MessageHandler {
    pub(crate) fn encode_args(
        &self,
        method: &Method,
        args: Args,
    ) -> Result<Vec<serde_json::Value>> {
        method
            .params
            .iter()
            .zip(args.into_values())
            .map(|(kind, value)| self.encode_value(*kind, value))
            .collect()
    }

    pub(crate) fn encode_value(&self, kind: Kind, value: Value) -> Result<serde_json::Value> {
        match (kind, value) {
            (Kind::Unit, _) => Ok(serde_json::Value::Null),
            (Kind::Value, Value::Json(json)) => Ok(json),
            (Kind::Value, other) => Err(Error::illegal_argument(format!(
                "an object cannot be sent by value: {:?}",
                other
            ))),
            (Kind::Object(_), Value::Json(serde_json::Value::Null)) => Ok(serde_json::Value::Null),
            (Kind::Object(interface), Value::Json(json)) => Err(Error::illegal_argument(format!(
                "expected a {} object, got {}",
                interface.name, json
            ))),
            (Kind::Object(interface), Value::Local(local)) => {
                if local.interface.name != interface.name {
                    return Err(Error::illegal_argument(format!(
                        "expected a {} object, got {}",
                        interface.name, local.interface.name
                    )));
                }
                let id = self.register_stub(Stub::from_local(&local));
                Ok(RemoteRef::new(interface.name, id).to_json())
            }
            (Kind::Object(interface), Value::Remote(proxy)) => {
                if proxy.interface().name != interface.name {
                    return Err(Error::illegal_argument(format!(
                        "expected a {} object, got a proxy to {}",
                        interface.name,
                        proxy.interface().name
                    )));
                }
                let id = self.register_stub(Stub::forwarding(proxy));
                Ok(RemoteRef::new(interface.name, id).to_json())
            }
        }
    }

    /// Decodes a request's arguments. Proxies materialized here inherit `inherited`.
    pub(crate) fn decode_args(
        &self,
        method: &Method,
        args: &[serde_json::Value],
        inherited: &Extras,
    ) -> Result<Args> {
        method
            .params
            .iter()
            .zip(args)
            .map(|(kind, json)| self.decode_value(*kind, json.clone(), inherited))
            .collect::<Result<Vec<_>>>()
            .map(Args::new)
    }

    pub(crate) fn decode_value(
        &self,
        kind: Kind,
        json: serde_json::Value,
        inherited: &Extras,
    ) -> Result<Value> {
        match kind {
            Kind::Unit => Ok(Value::null()),
            Kind::Value => Ok(Value::Json(json)),
            Kind::Object(_) if json.is_null() => Ok(Value::null()),
            Kind::Object(interface) => {
                let reference = RemoteRef::from_json(json)?;
                if reference.interface != interface.name {
                    return Err(Error::illegal_argument(format!(
                        "expected a {} reference, got {}",
                        interface.name, reference.interface
                    )));
                }
                let proxy = self
                    .inner
                    .registry
                    .proxy(interface, reference.instance_id, &self.downgrade());
                if !inherited.is_empty() {
                    proxy.inherit(inherited.clone());
                }
                Ok(Value::Remote(proxy))
            }
        }
    }
}
