//! # Call Values
//!
//! Arguments and results as the runtime sees them: plain data, or an object that
//! crosses the wire by reference.
//!
//! ## Invariants
//!
//! - **Tag, not type identity**: whether a value travels by copy or by reference is
//!   decided by its [`Value`] variant and the declared [`crate::Kind`], never by
//!   inspecting what it contains.
//! - **Null is a value**: an absent object is `Value::Json(Null)`, for both kinds.

use std::any::Any;
use std::sync::Arc;

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::Error;
use crate::error::Result;
use crate::interface::Interface;
use crate::proxy::Proxy;
use crate::remote::ObjectKey;
use crate::remote::Remote;
use crate::remote::object_key;
use crate::stub::Dispatch;

/// A single argument or result.
#[derive(Clone)]
pub enum Value {
    /// Plain data, copied through the codec.
    Json(serde_json::Value),
    /// An object living on this side. Registered as a stub when encoded.
    Local(LocalObject),
    /// A proxy to an object living on some peer.
    Remote(Proxy),
}

impl Value {
    pub fn null() -> Self {
        Self::Json(serde_json::Value::Null)
    }

    pub fn json<T: Serialize + ?Sized>(value: &T) -> Result<Self> {
        Ok(Self::Json(serde_json::to_value(value)?))
    }

    /// Wraps an interface-typed value. Proxies stay proxies, anything else is local.
    pub fn object<T: Remote + ?Sized>(obj: Option<Arc<T>>) -> Self {
        let Some(obj) = obj else {
            return Self::null();
        };
        if let Some(proxy) = obj.as_proxy() {
            return Self::Remote(proxy.clone());
        }
        Self::Local(LocalObject::new(obj))
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Self::Json(serde_json::Value::Null))
    }

    pub fn into_json<T: DeserializeOwned>(self) -> Result<T> {
        match self {
            Self::Json(value) => Ok(serde_json::from_value(value)?),
            other => Err(Error::illegal_argument(format!(
                "expected plain data, got {:?}",
                other
            ))),
        }
    }

    pub fn into_object<T: Remote + ?Sized>(self) -> Result<Option<Arc<T>>> {
        let expected = T::interface().name;
        match self {
            Self::Json(serde_json::Value::Null) => Ok(None),
            Self::Json(value) => Err(Error::illegal_argument(format!(
                "expected a {} reference, got {}",
                expected, value
            ))),
            Self::Remote(proxy) if proxy.interface().name == expected => Ok(Some(T::proxy(proxy))),
            Self::Remote(proxy) => Err(Error::illegal_argument(format!(
                "expected a {} reference, got a proxy to {}",
                expected,
                proxy.interface().name
            ))),
            Self::Local(local) => local.downcast::<T>().map(Some).ok_or_else(|| {
                Error::illegal_argument(format!(
                    "expected a {} object, got {}",
                    expected, local.interface.name
                ))
            }),
        }
    }
}

impl From<serde_json::Value> for Value {
    fn from(value: serde_json::Value) -> Self {
        Self::Json(value)
    }
}

impl std::fmt::Debug for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Json(value) => write!(f, "Json({})", value),
            Self::Local(local) => write!(f, "{:?}", local),
            Self::Remote(proxy) => write!(f, "{:?}", proxy),
        }
    }
}

/// A local object captured for the wire, with its dispatcher.
#[derive(Clone)]
pub struct LocalObject {
    pub(crate) key: ObjectKey,
    pub(crate) interface: &'static Interface,
    pub(crate) dispatch: Arc<dyn Dispatch>,
    // Holds the `Arc<T>` the object was captured from.
    typed: Arc<dyn Any + Send + Sync>,
}

impl LocalObject {
    pub fn new<T: Remote + ?Sized>(obj: Arc<T>) -> Self {
        Self {
            key: object_key(&*obj),
            interface: T::interface(),
            dispatch: T::stub(Arc::clone(&obj)),
            typed: Arc::new(obj),
        }
    }

    pub fn key(&self) -> ObjectKey {
        self.key
    }

    pub fn downcast<T: Remote + ?Sized>(&self) -> Option<Arc<T>> {
        self.typed.downcast_ref::<Arc<T>>().cloned()
    }
}

impl std::fmt::Debug for LocalObject {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Local({} {:?})", self.interface.name, self.key)
    }
}

/// Positional arguments of one call.
#[derive(Debug, Clone, Default)]
pub struct Args(Vec<Value>);

impl Args {
    pub fn new(values: Vec<Value>) -> Self {
        Self(values)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Value> {
        self.0.get(index)
    }

    /// Decodes the plain-data argument at `index`.
    pub fn value<T: DeserializeOwned>(&self, index: usize) -> Result<T> {
        self.take(index)?.into_json()
    }

    /// Resolves the interface-typed argument at `index`.
    pub fn object<T: Remote + ?Sized>(&self, index: usize) -> Result<Option<Arc<T>>> {
        self.take(index)?.into_object()
    }

    pub fn into_values(self) -> Vec<Value> {
        self.0
    }

    fn take(&self, index: usize) -> Result<Value> {
        self.0
            .get(index)
            .cloned()
            .ok_or_else(|| Error::illegal_argument(format!("missing argument {}", index)))
    }
}

impl From<Vec<Value>> for Args {
    fn from(values: Vec<Value>) -> Self {
        Self(values)
    }
}
