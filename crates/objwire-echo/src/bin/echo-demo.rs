//! Runs a client and an echo server in one process over an in-process channel.
//!
//! `RUST_LOG=debug` shows every message on the wire.

use std::sync::Arc;

use anyhow::Context;
use async_trait::async_trait;
use objwire::HandlerConfig;
use objwire::RemoteObject;
use objwire::channel;
use objwire_echo::EchoService;
use objwire_echo::EchoServiceImpl;
use objwire_echo::EchoServiceListener;
use objwire_echo::MyObj;
use tracing::Level;
use tracing::info;
use tracing_subscriber::EnvFilter;

struct PrintingListener;

impl RemoteObject for PrintingListener {}

#[async_trait]
impl EchoServiceListener for PrintingListener {
    async fn on_registered(&self) -> objwire::Result<()> {
        info!("listener registered");
        Ok(())
    }

    async fn on_echo(&self, input: Option<String>) -> objwire::Result<()> {
        info!(?input, "server echoed");
        Ok(())
    }

    async fn on_unregistered(&self, success: bool) -> objwire::Result<()> {
        info!(success, "listener unregistered");
        Ok(())
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(Level::INFO.into()))
        .init();

    let client_config = HandlerConfig::from_json(r#"{"name": "client", "log_enabled": true}"#)
        .context("invalid client config")?;
    let (client, server) = channel::pair(client_config, HandlerConfig::named("server"));
    server.register_root(EchoServiceImpl::new() as Arc<dyn EchoService>);

    let echo = client.root::<dyn EchoService>();

    let reply = echo.echo_string(Some("World".into())).await?;
    info!(?reply, "echoString");

    let obj = echo.echo_object(Some(MyObj::new("Foo", 1))).await?;
    info!(?obj, "echoObject");

    let listener: Arc<dyn EchoServiceListener> = Arc::new(PrintingListener);
    echo.register_listener(Some(Arc::clone(&listener))).await?;
    echo.echo_string(Some("Hello".into())).await?;
    echo.unregister_listener(Some(listener)).await?;

    match echo.test_exception_thrown(0).await {
        Ok(value) => info!(value, "no failure"),
        Err(e) => info!(kind = ?e.kind(), error = %e, "remote failure"),
    }

    let same = echo
        .get_echo_service()
        .await?
        .context("server returned no service")?;
    info!(reply = ?same.echo_string(Some("again".into())).await?, "through returned reference");

    client.clear();
    server.clear();
    Ok(())
}
