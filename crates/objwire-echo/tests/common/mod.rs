//! Shared fixtures: a client wired to an echo server, and a listener that records
//! every callback it gets.

#![allow(dead_code)]

use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;
use std::time::Duration;

use async_trait::async_trait;
use objwire::DispatchKey;
use objwire::Extras;
use objwire::HandlerConfig;
use objwire::MessageHandler;
use objwire::RemoteObject;
use objwire::Stub;
use objwire::WeakHandler;
use objwire::channel;
use objwire::proto::ROOT_INSTANCE_ID;
use objwire_echo::EchoService;
use objwire_echo::EchoServiceImpl;
use objwire_echo::EchoServiceListener;
use objwire_echo::listener::ON_ECHO;

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub struct Fixture {
    pub client: MessageHandler,
    pub server: MessageHandler,
    pub service: Arc<EchoServiceImpl>,
    pub echo: Arc<dyn EchoService>,
}

pub fn connect() -> Fixture {
    connect_with(|stub| stub)
}

/// Connects with the server's root stub adjusted by `configure`, e.g. to add hooks.
pub fn connect_with(configure: impl FnOnce(Stub) -> Stub) -> Fixture {
    init_tracing();
    let (client, server) =
        channel::pair(HandlerConfig::named("client"), HandlerConfig::named("server"));
    client.set_log_enabled(true);
    server.set_log_enabled(true);

    let service = EchoServiceImpl::new();
    let stub = Stub::new(Arc::clone(&service) as Arc<dyn EchoService>).with_id(ROOT_INSTANCE_ID);
    server.register_stub(configure(stub));

    let echo = client.root::<dyn EchoService>();
    Fixture {
        client,
        server,
        service,
        echo,
    }
}

pub async fn wait_until(mut condition: impl FnMut() -> bool) {
    for _ in 0..400 {
        if condition() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("condition not reached within two seconds");
}

/// The `extras` map of a raw wire message.
pub fn extras_of(raw: &str) -> Extras {
    let message: serde_json::Value = serde_json::from_str(raw).unwrap();
    serde_json::from_value(message["extras"].clone()).unwrap_or_default()
}

/// Records every callback. With a handler, also records the raw request behind
/// each `on_echo`.
#[derive(Default)]
pub struct RecordingListener {
    handler: Option<WeakHandler>,
    pub registered: AtomicUsize,
    pub no_arg_calls: AtomicUsize,
    pub unregistered: Mutex<Vec<bool>>,
    pub echoes: Mutex<Vec<Option<String>>>,
    pub originals: Mutex<Vec<String>>,
}

impl RecordingListener {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn watching(handler: &MessageHandler) -> Arc<Self> {
        Arc::new(Self {
            handler: Some(handler.downgrade()),
            ..Self::default()
        })
    }

    pub fn as_listener(self: &Arc<Self>) -> Option<Arc<dyn EchoServiceListener>> {
        Some(Arc::clone(self) as Arc<dyn EchoServiceListener>)
    }

    pub fn echoes(&self) -> Vec<Option<String>> {
        self.echoes.lock().unwrap().clone()
    }

    pub fn unregistered(&self) -> Vec<bool> {
        self.unregistered.lock().unwrap().clone()
    }

    pub fn last_original(&self) -> Option<String> {
        self.originals.lock().unwrap().last().cloned()
    }
}

impl RemoteObject for RecordingListener {}

#[async_trait]
impl EchoServiceListener for RecordingListener {
    async fn on_unregistered(&self, success: bool) -> objwire::Result<()> {
        self.unregistered.lock().unwrap().push(success);
        Ok(())
    }

    async fn on_registered(&self) -> objwire::Result<()> {
        self.registered.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn on_no_arg_method_called(&self) -> objwire::Result<()> {
        self.no_arg_calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn on_echo(&self, input: Option<String>) -> objwire::Result<()> {
        if let Some(handler) = self.handler.as_ref().and_then(WeakHandler::upgrade) {
            let key = DispatchKey::new::<dyn EchoServiceListener>(ON_ECHO, self);
            if let Some(raw) = handler.original_message(&key) {
                self.originals.lock().unwrap().push(raw);
            }
        }
        self.echoes.lock().unwrap().push(input);
        Ok(())
    }
}
