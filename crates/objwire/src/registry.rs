//! # Instance Registry
//!
//! One handler's view of every object that crossed its wire: stubs it serves by
//! instance id, and proxies it holds to the peer's objects.
//!
//! ## Invariants
//!
//! - **Identity-keyed**: a reverse index maps an object's [`ObjectKey`] to its id, so
//!   registering the same object twice returns the same id.
//! - **Explicit removal**: entries leave only through [`Registry::remove_object`] or
//!   [`Registry::clear`]. The peer may still hold a proxy to a removed id; its calls
//!   then fail `STUB_NOT_FOUND`.
//! - **Id 0 is reserved** for the root service and never handed out automatically.

use std::sync::Arc;
use std::sync::atomic::AtomicI64;
use std::sync::atomic::Ordering;

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;

use crate::handler::WeakHandler;
use crate::interface::Interface;
use crate::proxy::Proxy;
use crate::remote::ObjectKey;
use crate::stub::Stub;

pub(crate) struct Registry {
    stubs: DashMap<i64, Arc<Stub>>,
    reverse: DashMap<ObjectKey, i64>,
    proxies: DashMap<(&'static str, i64), Proxy>,
    next_id: AtomicI64,
}

/// What [`Registry::register`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Registered {
    New(i64),
    Existing(i64),
    /// Took the id from another object, which is no longer served.
    Replaced(i64),
}

impl Registered {
    pub(crate) fn id(self) -> i64 {
        match self {
            Self::New(id) | Self::Existing(id) | Self::Replaced(id) => id,
        }
    }
}

impl Registry {
    pub(crate) fn new() -> Self {
        Self {
            stubs: DashMap::new(),
            reverse: DashMap::new(),
            proxies: DashMap::new(),
            next_id: AtomicI64::new(1),
        }
    }

    pub(crate) fn register(&self, stub: Stub) -> Registered {
        let key = stub.key();
        if let Some(id) = self.reverse.get(&key).map(|entry| *entry) {
            return Registered::Existing(id);
        }

        let id = match stub.requested_id() {
            Some(id) => id,
            None => self.fresh_id(),
        };

        // Only the first of two racing registrations of one object gets an id.
        match self.reverse.entry(key) {
            Entry::Occupied(entry) => return Registered::Existing(*entry.get()),
            Entry::Vacant(entry) => {
                entry.insert(id);
            }
        }

        match self.stubs.insert(id, Arc::new(stub)) {
            Some(previous) if previous.key() != key => {
                self.reverse.remove_if(&previous.key(), |_, owner| *owner == id);
                Registered::Replaced(id)
            }
            _ => Registered::New(id),
        }
    }

    fn fresh_id(&self) -> i64 {
        loop {
            let id = self.next_id.fetch_add(1, Ordering::Relaxed);
            if !self.stubs.contains_key(&id) {
                return id;
            }
        }
    }

    pub(crate) fn stub(&self, instance_id: i64) -> Option<Arc<Stub>> {
        self.stubs.get(&instance_id).map(|entry| Arc::clone(entry.value()))
    }

    pub(crate) fn id_of(&self, key: ObjectKey) -> Option<i64> {
        self.reverse.get(&key).map(|entry| *entry)
    }

    /// Unregisters the object with identity `key`. Returns its former id.
    pub(crate) fn remove_object(&self, key: ObjectKey) -> Option<i64> {
        let (_, id) = self.reverse.remove(&key)?;
        self.stubs.remove_if(&id, |_, stub| stub.key() == key);
        Some(id)
    }

    /// The proxy for `(interface, instance_id)`, created on first use.
    pub(crate) fn proxy(
        &self,
        interface: &'static Interface,
        instance_id: i64,
        handler: &WeakHandler,
    ) -> Proxy {
        self.proxies
            .entry((interface.name, instance_id))
            .or_insert_with(|| Proxy::new(handler.clone(), interface, instance_id))
            .value()
            .clone()
    }

    pub(crate) fn stub_count(&self) -> usize {
        self.stubs.len()
    }

    pub(crate) fn proxy_count(&self) -> usize {
        self.proxies.len()
    }

    pub(crate) fn clear(&self) {
        self.stubs.clear();
        self.reverse.clear();
        self.proxies.clear();
    }
}
