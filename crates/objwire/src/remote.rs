//! # Typed Bindings and Identity
//!
//! The seam between user interface traits and the untyped runtime.
//!
//! ## Architecture
//!
//! Every RPC interface trait has [`RemoteObject`] as a supertrait, and the binding
//! generator implements [`Remote`] for the trait object (`dyn EchoService`). That is
//! enough for the runtime to turn an `Arc<dyn EchoService>` into a stub and a
//! [`Proxy`] back into an `Arc<dyn EchoService>`.
//!
//! ## Invariants
//!
//! - **Explicit identity**: an object's [`ObjectKey`] is the address of its
//!   allocation, or the identity of the proxy it wraps. Keys are never derived from
//!   structural equality.

use std::sync::Arc;

use crate::interface::Interface;
use crate::proxy::Proxy;
use crate::stub::Dispatch;

/// Supertrait of every RPC interface trait.
pub trait RemoteObject: Send + Sync + 'static {
    /// The proxy behind this object, if it is a generated proxy.
    fn as_proxy(&self) -> Option<&Proxy> {
        None
    }
}

/// Glue between an interface trait object and the runtime.
pub trait Remote: RemoteObject {
    fn interface() -> &'static Interface;

    /// Wraps an implementation in its generated dispatcher.
    fn stub(this: Arc<Self>) -> Arc<dyn Dispatch>;

    /// Wraps a proxy in the generated typed proxy.
    fn proxy(proxy: Proxy) -> Arc<Self>;
}

/// The identity of a registered or registrable object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectKey(usize);

impl ObjectKey {
    /// Identity of a local allocation.
    pub(crate) fn of_ptr<T: ?Sized>(ptr: *const T) -> Self {
        Self(ptr.cast::<()>() as usize)
    }
}

/// The identity of `obj`. Two typed proxies wrapping the same [`Proxy`] share it.
pub fn object_key<T: RemoteObject + ?Sized>(obj: &T) -> ObjectKey {
    match obj.as_proxy() {
        Some(proxy) => proxy.key(),
        None => ObjectKey::of_ptr(obj as *const T),
    }
}

/// Whether `a` and `b` are the same logical object.
///
/// A listener passed twice over the wire decodes to two typed proxies that wrap one
/// cached [`Proxy`]; they compare equal here.
pub fn same_object<T: RemoteObject + ?Sized>(a: &T, b: &T) -> bool {
    object_key(a) == object_key(b)
}
