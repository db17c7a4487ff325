//! # Message Handler
//!
//! The node-level orchestrator. One handler owns one side of a wire: the sender,
//! the instance registry, the pending-call table, the delegate table and the
//! extras pipeline. Stubs and proxies only ever talk to their handler.
//!
//! ## Architecture
//!
//! - **Outbound**: [`Proxy`] calls land in [`MessageHandler::invoke`], which encodes a
//!   Request, registers a pending entry and awaits a `oneshot` under a deadline.
//! - **Inbound**: the transport's receive loop calls [`MessageHandler::on_message`].
//!   Responses complete their pending entry in place; requests are served on a
//!   spawned task so a slow or reentrant implementation never blocks the loop. The
//!   loop may run on any thread: tasks go to the runtime captured at build time.
//!
//! ## Invariants
//!
//! - **At-most-once resolution**: a pending entry is resolved by whoever removes it
//!   from the table first (the response, the deadline or `clear()`). The others find
//!   nothing and do nothing.
//! - **No lock across await**: table guards are dropped before any `.await`.
//! - **Independent nodes**: a handler holds no global state; any number may share a
//!   process.

use std::future::Future;
use std::sync::Arc;
use std::sync::RwLock;
use std::sync::Weak;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;
use std::time::Duration;

use dashmap::DashMap;
use objwire_proto::ExceptionInfo;
use objwire_proto::ExceptionKind;
use objwire_proto::Extras;
use objwire_proto::Message;
use objwire_proto::Outcome;
use objwire_proto::ROOT_INSTANCE_ID;
use objwire_proto::Request;
use objwire_proto::Response;
use tokio::runtime::Handle;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::debug;
use tracing::warn;

use crate::config::HandlerConfig;
use crate::delegate::MethodDelegate;
use crate::error::Error;
use crate::error::Result;
use crate::extras;
use crate::extras::Property;
use crate::interface::Method;
use crate::listener::FailureListener;
use crate::listener::FailureSource;
use crate::lock::read;
use crate::lock::write;
use crate::proxy::Proxy;
use crate::proxy::Reply;
use crate::registry::Registered;
use crate::registry::Registry;
use crate::remote::Remote;
use crate::remote::object_key;
use crate::sender::MessageSender;
use crate::stub::Dispatch;
use crate::stub::DispatchKey;
use crate::stub::Stub;
use crate::value::Args;
use crate::value::Value;

/// A caller waiting for the Response to one call id.
struct Pending {
    tx: oneshot::Sender<Result<Response>>,
}

pub(crate) struct Shared {
    pub(crate) name: String,
    sender: Arc<dyn MessageSender>,
    pub(crate) registry: Registry,
    pending: DashMap<u64, Pending>,
    next_call_id: AtomicU64,
    delegates: DashMap<(&'static str, u32), MethodDelegate>,
    properties: DashMap<String, Property>,
    bulk_extras: RwLock<Extras>,
    runtime: Option<Handle>,
    request_timeout_ms: AtomicU64,
    log_enabled: AtomicBool,
    listener: RwLock<Option<Arc<dyn FailureListener>>>,
}

/// One side of an RPC wire.
///
/// Cloning is cheap and every clone is the same handler.
#[derive(Clone)]
pub struct MessageHandler {
    pub(crate) inner: Arc<Shared>,
}

/// A handle that does not keep the handler alive. Proxies and pump tasks hold these.
#[derive(Clone)]
pub struct WeakHandler {
    inner: Weak<Shared>,
}

impl WeakHandler {
    pub fn upgrade(&self) -> Option<MessageHandler> {
        self.inner.upgrade().map(|inner| MessageHandler { inner })
    }
}

/// Fluent construction of a [`MessageHandler`].
pub struct HandlerBuilder {
    sender: Arc<dyn MessageSender>,
    config: HandlerConfig,
    listener: Option<Arc<dyn FailureListener>>,
    runtime: Option<Handle>,
}

impl HandlerBuilder {
    pub fn config(mut self, config: HandlerConfig) -> Self {
        self.config = config;
        self
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.config.name = name.into();
        self
    }

    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.config.request_timeout_ms = duration_ms(timeout);
        self
    }

    pub fn log_enabled(mut self, enabled: bool) -> Self {
        self.config.log_enabled = enabled;
        self
    }

    pub fn failure_listener(mut self, listener: impl FailureListener) -> Self {
        self.listener = Some(Arc::new(listener));
        self
    }

    /// The runtime inbound requests are served on. Defaults to the runtime `build`
    /// is called from.
    pub fn runtime(mut self, runtime: Handle) -> Self {
        self.runtime = Some(runtime);
        self
    }

    pub fn build(self) -> MessageHandler {
        let runtime = self.runtime.or_else(|| Handle::try_current().ok());
        MessageHandler {
            inner: Arc::new(Shared {
                name: self.config.name,
                sender: self.sender,
                registry: Registry::new(),
                pending: DashMap::new(),
                next_call_id: AtomicU64::new(1),
                delegates: DashMap::new(),
                properties: DashMap::new(),
                bulk_extras: RwLock::new(Extras::new()),
                runtime,
                request_timeout_ms: AtomicU64::new(self.config.request_timeout_ms.max(1)),
                log_enabled: AtomicBool::new(self.config.log_enabled),
                listener: RwLock::new(self.listener),
            }),
        }
    }
}

impl MessageHandler {
    pub fn new(sender: impl MessageSender) -> Self {
        Self::builder(sender).build()
    }

    pub fn builder(sender: impl MessageSender) -> HandlerBuilder {
        HandlerBuilder {
            sender: Arc::new(sender),
            config: HandlerConfig::default(),
            listener: None,
            runtime: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    pub fn downgrade(&self) -> WeakHandler {
        WeakHandler {
            inner: Arc::downgrade(&self.inner),
        }
    }

    // --- registration ---

    /// Registers a stub and returns its instance id.
    ///
    /// Registering an object that is already registered is a no-op returning its
    /// existing id.
    pub fn register_stub(&self, stub: Stub) -> i64 {
        let interface = stub.interface().name;
        let registered = self.inner.registry.register(stub);
        match registered {
            Registered::Replaced(id) => warn!(
                handler = %self.inner.name,
                instance_id = id,
                interface,
                "instance id taken over by another object"
            ),
            Registered::New(id) if self.log_enabled() => debug!(
                handler = %self.inner.name,
                instance_id = id,
                interface,
                "stub registered"
            ),
            _ => {}
        }
        registered.id()
    }

    /// Registers `obj` under a fresh instance id.
    pub fn register<T: Remote + ?Sized>(&self, obj: Arc<T>) -> i64 {
        self.register_stub(Stub::new(obj))
    }

    /// Registers `obj` as the root service, reachable by the peer without any prior
    /// exchange.
    pub fn register_root<T: Remote + ?Sized>(&self, obj: Arc<T>) -> i64 {
        self.register_stub(Stub::new(obj).with_id(ROOT_INSTANCE_ID))
    }

    /// The instance id `obj` is registered under, if any.
    pub fn instance_id_of<T: Remote + ?Sized>(&self, obj: &T) -> Option<i64> {
        self.inner.registry.id_of(object_key(obj))
    }

    /// A typed proxy to the peer's object `instance_id`.
    pub fn proxy<T: Remote + ?Sized>(&self, instance_id: i64) -> Arc<T> {
        T::proxy(self.untyped_proxy::<T>(instance_id))
    }

    /// A typed proxy to the peer's root service.
    pub fn root<T: Remote + ?Sized>(&self) -> Arc<T> {
        self.proxy::<T>(ROOT_INSTANCE_ID)
    }

    pub fn untyped_proxy<T: Remote + ?Sized>(&self, instance_id: i64) -> Proxy {
        self.inner
            .registry
            .proxy(T::interface(), instance_id, &self.downgrade())
    }

    /// Stops serving `obj`. Later requests for its id fail `STUB_NOT_FOUND`.
    ///
    /// Returns whether `obj` was registered.
    pub fn clear_stub_of_service<T: Remote + ?Sized>(&self, obj: &T) -> bool {
        match self.inner.registry.remove_object(object_key(obj)) {
            Some(id) => {
                debug!(handler = %self.inner.name, instance_id = id, "stub cleared");
                true
            }
            None => false,
        }
    }

    pub fn stub_count(&self) -> usize {
        self.inner.registry.stub_count()
    }

    pub fn proxy_count(&self) -> usize {
        self.inner.registry.proxy_count()
    }

    pub fn pending_count(&self) -> usize {
        self.inner.pending.len()
    }

    /// Unregisters every stub and proxy, drops every delegate and fails every pending
    /// call with `TRANSPORT_FAILURE`. Responses that arrive later are dropped.
    ///
    /// Properties, bulk extras and configuration are kept.
    pub fn clear(&self) {
        let ids: Vec<u64> = self.inner.pending.iter().map(|e| *e.key()).collect();
        for id in ids {
            if let Some((_, pending)) = self.inner.pending.remove(&id) {
                let _ = pending.tx.send(Err(Error::transport("message handler cleared")));
            }
        }
        self.inner.registry.clear();
        self.inner.delegates.clear();
        debug!(handler = %self.inner.name, "handler cleared");
    }

    // --- delegates ---

    /// Installs `delegate`, replacing any delegate for the same method.
    pub fn add_method_delegate(&self, delegate: MethodDelegate) -> Option<MethodDelegate> {
        self.inner.delegates.insert(delegate.table_key(), delegate)
    }

    /// Removes the delegate of `T`'s method `method_id`.
    pub fn remove_method_delegate<T: Remote + ?Sized>(
        &self,
        method_id: u32,
    ) -> Option<MethodDelegate> {
        self.inner
            .delegates
            .remove(&(T::interface().name, method_id))
            .map(|(_, delegate)| delegate)
    }

    pub(crate) fn delegate(
        &self,
        interface: &'static str,
        method_id: u32,
    ) -> Option<MethodDelegate> {
        self.inner
            .delegates
            .get(&(interface, method_id))
            .map(|entry| entry.value().clone())
    }

    // --- configuration ---

    /// Sets the default deadline of synchronous calls.
    pub fn set_request_timeout(&self, timeout: Duration) {
        self.inner
            .request_timeout_ms
            .store(duration_ms(timeout), Ordering::Relaxed);
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.inner.request_timeout_ms.load(Ordering::Relaxed))
    }

    /// Toggles per-message tracing. Has no other effect.
    pub fn set_log_enabled(&self, enabled: bool) {
        self.inner.log_enabled.store(enabled, Ordering::Relaxed);
    }

    pub fn log_enabled(&self) -> bool {
        self.inner.log_enabled.load(Ordering::Relaxed)
    }

    /// Sets the listener for failures with no caller to surface at.
    pub fn set_failure_listener(&self, listener: Option<Arc<dyn FailureListener>>) {
        *write(&self.inner.listener) = listener;
    }

    // --- properties and extras ---

    /// Adds a property.
    ///
    /// With `send_back` the property is written to every outgoing message as
    /// `custom_<name>` and the peer echoes it. Without it the property stays local:
    /// readable through [`MessageHandler::property`] but never encoded.
    pub fn add_property(
        &self,
        name: impl Into<String>,
        value: impl Into<String>,
        send_back: bool,
    ) {
        self.inner.properties.insert(
            name.into(),
            Property {
                value: value.into(),
                send_back,
            },
        );
    }

    pub fn property(&self, name: &str) -> Option<String> {
        self.inner.properties.get(name).map(|entry| entry.value.clone())
    }

    pub fn remove_property(&self, name: &str) -> Option<Property> {
        self.inner.properties.remove(name).map(|(_, property)| property)
    }

    /// Replaces the extras merged into every outgoing message. `None` clears them.
    pub fn set_extra(&self, extras: Option<Extras>) {
        *write(&self.inner.bulk_extras) = extras.unwrap_or_default();
    }

    /// The raw text of the request being dispatched under `key`, when called from
    /// within that dispatch. Overlapping dispatches of the same method each see
    /// their own request.
    pub fn original_message(&self, key: &DispatchKey) -> Option<String> {
        CURRENT_DISPATCH
            .try_with(|current| {
                let ours = std::ptr::eq(current.handler.as_ptr(), Arc::as_ptr(&self.inner));
                (ours && current.key == *key).then(|| current.raw.to_string())
            })
            .ok()
            .flatten()
    }

    // --- inbound ---

    /// Delivers one raw message from the peer.
    ///
    /// Returns promptly: responses are matched in place, requests are served on a
    /// spawned task. Safe to call from any thread.
    pub fn on_message(&self, raw: &str) {
        let message = match Message::decode(raw) {
            Ok(message) => message,
            Err(e) => {
                warn!(handler = %self.inner.name, error = %e, "dropping undecodable message");
                return;
            }
        };
        if self.log_enabled() {
            debug!(handler = %self.inner.name, message = raw, "received");
        }

        match message {
            Message::Response(response) => self.complete(response),
            Message::Request(request) => {
                let handler = self.clone();
                let raw = raw.to_string();
                let (call_id, method_id) = (request.call_id, request.method_id);
                if self.spawn(async move { handler.serve(request, raw).await }).is_none() {
                    warn!(
                        handler = %self.inner.name,
                        call_id,
                        method_id,
                        "no tokio runtime to serve request, dropping it"
                    );
                }
            }
        }
    }

    fn complete(&self, response: Response) {
        match self.inner.pending.remove(&response.call_id) {
            Some((_, pending)) => {
                let _ = pending.tx.send(Ok(response));
            }
            None => debug!(
                handler = %self.inner.name,
                call_id = response.call_id,
                "dropping response with no pending call"
            ),
        }
    }

    async fn serve(&self, request: Request, raw: String) {
        let outcome = match self.inner.registry.stub(request.instance_id) {
            Some(stub) => stub.invoke(self, &request, &raw).await,
            None => {
                warn!(
                    handler = %self.inner.name,
                    instance_id = request.instance_id,
                    interface = %request.interface,
                    method_id = request.method_id,
                    "no stub for request"
                );
                Err(Error::stub_not_found(format!(
                    "no stub registered under instance id {}",
                    request.instance_id
                )))
            }
        };

        if request.one_way {
            if let Err(e) = outcome {
                self.report_inbound(&request, &e.into_info());
            }
            return;
        }

        let response = match outcome {
            Ok(result) => Response::success(request.call_id, result),
            Err(e) => Response::failure(request.call_id, e.into_info()),
        };
        let response = response.with_extras(extras::for_response(
            &read(&self.inner.bulk_extras),
            &request.extras,
            &self.inner.properties,
        ));

        let sent = match response.encode() {
            Ok(text) => self.send(&text).await,
            Err(e) => Err(Error::from(e)),
        };
        if let Err(e) = sent {
            warn!(
                handler = %self.inner.name,
                call_id = request.call_id,
                error = %e,
                "failed to send response"
            );
        }
    }

    /// Runs one dispatch with its raw request recorded under `key`.
    ///
    /// The dispatch runs on its own task: a panic in the implementation becomes
    /// `GENERIC_RUNTIME` instead of unwinding through the handler.
    pub(crate) async fn run_dispatch(
        &self,
        target: &Arc<dyn Dispatch>,
        key: DispatchKey,
        method: &'static Method,
        args: Args,
        raw: &str,
    ) -> Result<Value> {
        let current = CurrentDispatch {
            handler: Arc::downgrade(&self.inner),
            key,
            raw: Arc::from(raw),
        };
        let target = Arc::clone(target);
        let task = self.spawn(CURRENT_DISPATCH.scope(current, async move {
            target.dispatch(method, args).await
        }));
        let Some(task) = task else {
            return Err(Error::runtime("no tokio runtime to dispatch on"));
        };
        match task.await {
            Ok(result) => result,
            Err(join_error) if join_error.is_panic() => {
                let panic = join_error.into_panic();
                let message = panic
                    .downcast_ref::<&str>()
                    .map(|s| s.to_string())
                    .or_else(|| panic.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "implementation panicked".to_string());
                warn!(
                    handler = %self.inner.name,
                    method = method.name,
                    %message,
                    "dispatch panicked"
                );
                Err(Error::runtime(message))
            }
            Err(_) => Err(Error::runtime("dispatch task cancelled")),
        }
    }

    /// Spawns on the handler's runtime, or on the caller's when built outside one.
    fn spawn<F>(&self, future: F) -> Option<JoinHandle<F::Output>>
    where
        F: Future + Send + 'static,
        F::Output: Send + 'static,
    {
        let runtime = self.inner.runtime.clone().or_else(|| Handle::try_current().ok())?;
        Some(runtime.spawn(future))
    }

    // --- outbound ---

    pub(crate) async fn invoke(
        &self,
        proxy: &Proxy,
        method_id: u32,
        args: Vec<Value>,
        timeout: Option<Duration>,
    ) -> Result<Reply> {
        let interface = proxy.interface();
        let method = interface.method(method_id).ok_or_else(|| {
            Error::dispatch_rejected(format!("{} has no method {}", interface.name, method_id))
        })?;
        if !method.supported {
            return Err(Error::not_supported(format!(
                "{}.{} is not callable over rpc",
                interface.name, method.name
            )));
        }
        if args.len() != method.params.len() {
            return Err(Error::illegal_argument(format!(
                "{}.{} takes {} arguments, got {}",
                interface.name,
                method.name,
                method.params.len(),
                args.len()
            )));
        }
        let args = Args::new(args);

        if let Some(delegate) = self.delegate(interface.name, method.id) {
            match delegate.target.dispatch(method, args.clone()).await {
                Err(Error::DelegateIgnored) => {}
                result => return result.map(Reply::local),
            }
        }

        let call_id = self.inner.next_call_id.fetch_add(1, Ordering::Relaxed);
        let request = Request {
            call_id,
            instance_id: proxy.instance_id(),
            interface: interface.name.to_string(),
            method_id,
            args: self.encode_args(method, args)?,
            one_way: method.one_way,
            extras: extras::for_request(
                &read(&self.inner.bulk_extras),
                &proxy.inherited_extras(),
                &self.inner.properties,
            ),
        };
        let text = request.encode()?;

        if method.one_way {
            self.send(&text).await?;
            return Ok(Reply::local(Value::null()));
        }

        // Registered before sending: the response may arrive before `send` returns.
        let (tx, rx) = oneshot::channel();
        self.inner.pending.insert(call_id, Pending { tx });
        if let Err(e) = self.send(&text).await {
            self.inner.pending.remove(&call_id);
            return Err(e);
        }

        let deadline = timeout
            .or_else(|| proxy.timeout())
            .unwrap_or_else(|| self.request_timeout());
        let response = self.await_response(call_id, rx, deadline).await?;

        let (outcome, extras) = response.into_outcome()?;
        match outcome {
            Outcome::Result(result) => Ok(Reply {
                value: self.decode_value(method.returns, result, &Extras::new())?,
                extras,
            }),
            Outcome::Exception(info) => {
                if info.kind == ExceptionKind::StubNotFound {
                    self.notify_failure(proxy, method_id, &info);
                }
                Err(Error::Rpc(info))
            }
        }
    }

    async fn await_response(
        &self,
        call_id: u64,
        mut rx: oneshot::Receiver<Result<Response>>,
        deadline: Duration,
    ) -> Result<Response> {
        match tokio::time::timeout(deadline, &mut rx).await {
            Ok(Ok(result)) => result,
            Ok(Err(_)) => Err(Error::transport("response channel closed")),
            Err(_) => {
                if self.inner.pending.remove(&call_id).is_some() {
                    debug!(handler = %self.inner.name, call_id, ?deadline, "call timed out");
                    return Err(Error::timeout(format!(
                        "call {} got no response within {:?}",
                        call_id, deadline
                    )));
                }
                // The entry was already taken: a response or clear() won the race.
                match rx.await {
                    Ok(result) => result,
                    Err(_) => Err(Error::transport("response channel closed")),
                }
            }
        }
    }

    async fn send(&self, text: &str) -> Result<()> {
        if self.log_enabled() {
            debug!(handler = %self.inner.name, message = text, "sending");
        }
        self.inner.sender.send(text).await.map_err(|e| {
            warn!(handler = %self.inner.name, error = %e, "send failed");
            Error::transport(e.to_string())
        })
    }

    fn notify_failure(&self, proxy: &Proxy, method_id: u32, info: &ExceptionInfo) {
        let listener = proxy
            .failure_listener()
            .or_else(|| read(&self.inner.listener).clone());
        if let Some(listener) = listener {
            listener.on_rpc_failed(&FailureSource::Proxy(proxy.clone()), method_id, info);
        }
    }

    fn report_inbound(&self, request: &Request, info: &ExceptionInfo) {
        warn!(
            handler = %self.inner.name,
            instance_id = request.instance_id,
            method_id = request.method_id,
            error = %info,
            "one-way call failed"
        );
        let listener = read(&self.inner.listener).clone();
        if let Some(listener) = listener {
            let source = FailureSource::Inbound {
                interface: request.interface.clone(),
                instance_id: request.instance_id,
            };
            listener.on_rpc_failed(&source, request.method_id, info);
        }
    }
}

impl std::fmt::Debug for MessageHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MessageHandler")
            .field("name", &self.inner.name)
            .field("stubs", &self.stub_count())
            .field("pending", &self.pending_count())
            .finish()
    }
}

/// The request a dispatch task is serving, read back through `original_message`.
struct CurrentDispatch {
    handler: Weak<Shared>,
    key: DispatchKey,
    raw: Arc<str>,
}

tokio::task_local! {
    static CURRENT_DISPATCH: CurrentDispatch;
}

pub(crate) fn duration_ms(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX).max(1)
}
