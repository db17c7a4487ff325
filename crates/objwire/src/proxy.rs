//! # Remote Object Proxy
//!
//! The calling side of a remote reference: a handle to one `(interface, instance id)`
//! on the peer, bound to the handler that created it.
//!
//! A `Proxy` is cheap to clone and compares by identity. Handlers cache one proxy per
//! `(interface, instance id)` pair, so the same remote object always decodes to the
//! same proxy.

use std::sync::Arc;
use std::sync::RwLock;
use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;
use std::time::Duration;

use async_trait::async_trait;
use objwire_proto::Extras;
use objwire_proto::RemoteRef;

use crate::error::Error;
use crate::error::Result;
use crate::handler::MessageHandler;
use crate::handler::duration_ms;
use crate::handler::WeakHandler;
use crate::interface::Interface;
use crate::interface::Method;
use crate::listener::FailureListener;
use crate::lock::read;
use crate::lock::write;
use crate::remote::ObjectKey;
use crate::stub::Dispatch;
use crate::value::Args;
use crate::value::Value;

/// A result together with the extras of the Response that carried it.
#[derive(Debug, Clone)]
pub struct Reply {
    pub value: Value,
    pub extras: Extras,
}

impl Reply {
    pub(crate) fn local(value: Value) -> Self {
        Self {
            value,
            extras: Extras::new(),
        }
    }
}

struct ProxyInner {
    handler: WeakHandler,
    interface: &'static Interface,
    instance_id: i64,
    listener: RwLock<Option<Arc<dyn FailureListener>>>,
    inherited: RwLock<Extras>,
    // Milliseconds, 0 = use the handler's default.
    timeout_ms: AtomicU64,
}

/// Client-side handle to a remote object.
#[derive(Clone)]
pub struct Proxy {
    inner: Arc<ProxyInner>,
}

impl Proxy {
    pub(crate) fn new(
        handler: WeakHandler,
        interface: &'static Interface,
        instance_id: i64,
    ) -> Self {
        Self {
            inner: Arc::new(ProxyInner {
                handler,
                interface,
                instance_id,
                listener: RwLock::new(None),
                inherited: RwLock::new(Extras::new()),
                timeout_ms: AtomicU64::new(0),
            }),
        }
    }

    pub fn interface(&self) -> &'static Interface {
        self.inner.interface
    }

    pub fn instance_id(&self) -> i64 {
        self.inner.instance_id
    }

    pub fn key(&self) -> ObjectKey {
        ObjectKey::of_ptr(Arc::as_ptr(&self.inner))
    }

    pub fn remote_ref(&self) -> RemoteRef {
        RemoteRef::new(self.inner.interface.name, self.inner.instance_id)
    }

    /// The handler this proxy sends through, if it is still alive.
    pub fn handler(&self) -> Option<MessageHandler> {
        self.inner.handler.upgrade()
    }

    /// Sets the listener told about failures of calls made through this proxy.
    /// Falls back to the handler's listener when unset.
    pub fn set_failure_listener(&self, listener: Option<Arc<dyn FailureListener>>) {
        *write(&self.inner.listener) = listener;
    }

    pub fn failure_listener(&self) -> Option<Arc<dyn FailureListener>> {
        read(&self.inner.listener).clone()
    }

    /// Overrides the handler's request timeout for calls through this proxy.
    pub fn set_timeout(&self, timeout: Option<Duration>) {
        let ms = timeout.map_or(0, duration_ms);
        self.inner.timeout_ms.store(ms, Ordering::Relaxed);
    }

    pub fn timeout(&self) -> Option<Duration> {
        match self.inner.timeout_ms.load(Ordering::Relaxed) {
            0 => None,
            ms => Some(Duration::from_millis(ms)),
        }
    }

    /// Extras this proxy adds to each of its requests.
    pub fn inherited_extras(&self) -> Extras {
        read(&self.inner.inherited).clone()
    }

    pub(crate) fn inherit(&self, extras: Extras) {
        *write(&self.inner.inherited) = extras;
    }

    pub async fn call(&self, method_id: u32, args: Vec<Value>) -> Result<Value> {
        Ok(self.call_with_reply(method_id, args, None).await?.value)
    }

    /// Calls with a deadline that overrides both the proxy and handler timeouts.
    pub async fn call_with_timeout(
        &self,
        method_id: u32,
        args: Vec<Value>,
        timeout: Duration,
    ) -> Result<Value> {
        Ok(self.call_with_reply(method_id, args, Some(timeout)).await?.value)
    }

    /// Calls and returns the Response extras along with the result.
    pub async fn call_with_reply(
        &self,
        method_id: u32,
        args: Vec<Value>,
        timeout: Option<Duration>,
    ) -> Result<Reply> {
        let handler = self
            .inner
            .handler
            .upgrade()
            .ok_or_else(|| Error::transport("message handler dropped"))?;
        handler.invoke(self, method_id, args, timeout).await
    }
}

impl PartialEq for Proxy {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl Eq for Proxy {}

impl std::fmt::Debug for Proxy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Proxy({} #{})", self.inner.interface.name, self.inner.instance_id)
    }
}

// A proxy passed on to a third party is served as a forwarding stub.
#[async_trait]
impl Dispatch for Proxy {
    fn interface(&self) -> &'static Interface {
        self.inner.interface
    }

    async fn dispatch(&self, method: &'static Method, args: Args) -> Result<Value> {
        self.call(method.id, args.into_values()).await
    }
}
