//! # Stub Dispatch
//!
//! The serving side of a remote reference: one implementation object bound to one
//! instance id.
//!
//! ## Architecture
//!
//! Generated code implements [`Dispatch`] for each interface, turning
//! `(method, Args)` into a call on the implementation. A [`Stub`] wraps a dispatcher
//! with identity, hooks and the per-request pipeline:
//!
//! 1. **Lookup**: unknown methods and interface mismatches are `DISPATCH_REJECTED`.
//! 2. **Hooks**: each hook may veto (return `Err`) or answer (return `Some`).
//! 3. **Decode**: arguments are decoded per declared kind; references become proxies
//!    that inherit the request's `custom_` extras.
//! 4. **Delegate**: an active delegate runs instead of the implementation, unless it
//!    answers with the ignore sentinel.
//! 5. **Invoke**: the call runs on its own task so a panic becomes `GENERIC_RUNTIME`.
//! 6. **Encode**: the result is encoded per the declared return kind.

use std::sync::Arc;

use async_trait::async_trait;
use objwire_proto::ExceptionInfo;
use objwire_proto::ExceptionKind;
use objwire_proto::Extras;
use objwire_proto::Request;
use objwire_proto::custom_key;

use crate::error::Error;
use crate::error::Result;
use crate::extras;
use crate::handler::MessageHandler;
use crate::interface::Interface;
use crate::interface::Method;
use crate::proxy::Proxy;
use crate::remote::ObjectKey;
use crate::remote::Remote;
use crate::remote::object_key;
use crate::value::Args;
use crate::value::LocalObject;
use crate::value::Value;

/// Method-table driven dispatch onto one implementation.
#[async_trait]
pub trait Dispatch: Send + Sync + 'static {
    fn interface(&self) -> &'static Interface;

    async fn dispatch(&self, method: &'static Method, args: Args) -> Result<Value>;
}

/// Identifies one in-flight dispatch: which method, running on which object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DispatchKey {
    pub interface: &'static str,
    pub method_id: u32,
    pub object: ObjectKey,
}

impl DispatchKey {
    /// The key of `method_id` running on `obj`, an implementation or a delegate.
    pub fn new<T: Remote + ?Sized>(method_id: u32, obj: &T) -> Self {
        Self {
            interface: T::interface().name,
            method_id,
            object: object_key(obj),
        }
    }
}

/// What a hook sees of the request it is about to let through.
#[derive(Debug)]
pub struct DispatchContext<'a> {
    pub interface: &'static Interface,
    pub method: &'static Method,
    pub instance_id: i64,
    pub call_id: u64,
    pub one_way: bool,
    pub extras: &'a Extras,
    /// The request exactly as it arrived.
    pub raw: &'a str,
}

impl DispatchContext<'_> {
    /// A property the caller sent, looked up as `custom_<name>` and then as `name`.
    pub fn property(&self, name: &str) -> Option<&str> {
        self.extras
            .get(&custom_key(name))
            .or_else(|| self.extras.get(name))
            .map(String::as_str)
    }

    pub fn extra(&self, key: &str) -> Option<&str> {
        self.extras.get(key).map(String::as_str)
    }
}

/// Runs before dispatch. `Err` vetoes the call, `Ok(Some(v))` answers it with `v`.
pub type Hook = Arc<dyn Fn(&DispatchContext<'_>) -> Result<Option<Value>> + Send + Sync>;

/// An implementation bound for serving.
pub struct Stub {
    key: ObjectKey,
    interface: &'static Interface,
    target: Arc<dyn Dispatch>,
    hooks: Vec<Hook>,
    requested_id: Option<i64>,
}

impl Stub {
    pub fn new<T: Remote + ?Sized>(obj: Arc<T>) -> Self {
        Self {
            key: object_key(&*obj),
            interface: T::interface(),
            target: T::stub(obj),
            hooks: Vec::new(),
            requested_id: None,
        }
    }

    pub(crate) fn from_local(obj: &LocalObject) -> Self {
        Self {
            key: obj.key,
            interface: obj.interface,
            target: Arc::clone(&obj.dispatch),
            hooks: Vec::new(),
            requested_id: None,
        }
    }

    pub(crate) fn forwarding(proxy: Proxy) -> Self {
        Self {
            key: proxy.key(),
            interface: proxy.interface(),
            target: Arc::new(proxy),
            hooks: Vec::new(),
            requested_id: None,
        }
    }

    /// Registers under `instance_id` instead of a fresh id.
    pub fn with_id(mut self, instance_id: i64) -> Self {
        self.requested_id = Some(instance_id);
        self
    }

    pub fn with_hook<F>(mut self, hook: F) -> Self
    where
        F: Fn(&DispatchContext<'_>) -> Result<Option<Value>> + Send + Sync + 'static,
    {
        self.hooks.push(Arc::new(hook));
        self
    }

    pub fn key(&self) -> ObjectKey {
        self.key
    }

    pub fn interface(&self) -> &'static Interface {
        self.interface
    }

    pub(crate) fn requested_id(&self) -> Option<i64> {
        self.requested_id
    }

    fn dispatch_key(&self, method_id: u32) -> DispatchKey {
        DispatchKey {
            interface: self.interface.name,
            method_id,
            object: self.key,
        }
    }

    /// Serves one request and returns the encoded result.
    pub(crate) async fn invoke(
        &self,
        handler: &MessageHandler,
        request: &Request,
        raw: &str,
    ) -> Result<serde_json::Value> {
        if request.interface != self.interface.name {
            return Err(Error::dispatch_rejected(format!(
                "instance {} serves {}, not {}",
                request.instance_id, self.interface.name, request.interface
            )));
        }
        let method = self.interface.method(request.method_id).ok_or_else(|| {
            Error::dispatch_rejected(format!(
                "{} has no method {}",
                self.interface.name, request.method_id
            ))
        })?;
        if !method.supported {
            return Err(Error::not_supported(format!(
                "{}.{} is not callable over rpc",
                self.interface.name, method.name
            )));
        }
        if request.args.len() != method.params.len() {
            return Err(Error::illegal_argument(format!(
                "{}.{} takes {} arguments, got {}",
                self.interface.name,
                method.name,
                method.params.len(),
                request.args.len()
            )));
        }

        let context = DispatchContext {
            interface: self.interface,
            method,
            instance_id: request.instance_id,
            call_id: request.call_id,
            one_way: request.one_way,
            extras: &request.extras,
            raw,
        };
        for hook in &self.hooks {
            if let Some(value) = hook(&context)? {
                return handler.encode_value(method.returns, value);
            }
        }

        let inherited = extras::echoed(&request.extras);
        let args = handler.decode_args(method, &request.args, &inherited)?;

        let result = match handler.delegate(self.interface.name, method.id) {
            Some(delegate) => {
                let delegated = handler
                    .run_dispatch(
                        &delegate.target,
                        delegate.dispatch_key(),
                        method,
                        args.clone(),
                        raw,
                    )
                    .await;
                match delegated {
                    Err(Error::DelegateIgnored) => {
                        let key = self.dispatch_key(method.id);
                        handler.run_dispatch(&self.target, key, method, args, raw).await
                    }
                    other => other,
                }
            }
            None => {
                let key = self.dispatch_key(method.id);
                handler.run_dispatch(&self.target, key, method, args, raw).await
            }
        };

        let value = result.map_err(|e| classify(method, e))?;
        handler.encode_value(method.returns, value)
    }
}

impl std::fmt::Debug for Stub {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Stub({} {:?})", self.interface.name, self.key)
    }
}

/// Degrades user exceptions the method does not declare to `GENERIC_RUNTIME`.
fn classify(method: &Method, error: Error) -> Error {
    match error {
        Error::Rpc(info)
            if info.kind == ExceptionKind::UserDeclared && !method.declares(&info.class_name) =>
        {
            let message = info.message.unwrap_or_else(|| info.class_name.clone());
            Error::Rpc(ExceptionInfo::new(
                ExceptionKind::GenericRuntime,
                info.class_name,
                Some(message),
            ))
        }
        Error::DelegateIgnored => Error::runtime(format!(
            "{} ignored the call with no implementation to fall back to",
            method.name
        )),
        other => other,
    }
}
