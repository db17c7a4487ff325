//! In-process transport over tokio channels.
//!
//! Two handlers in one process are wired with an unbounded `mpsc` channel per
//! direction and a pump task per receiving side that feeds
//! [`MessageHandler::on_message`].

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::config::HandlerConfig;
use crate::handler::MessageHandler;
use crate::handler::WeakHandler;
use crate::sender;
use crate::sender::MessageSender;

/// Sends into an in-process channel.
#[derive(Debug, Clone)]
pub struct ChannelSender {
    tx: mpsc::UnboundedSender<String>,
}

#[async_trait::async_trait]
impl MessageSender for ChannelSender {
    async fn send(&self, message: &str) -> sender::Result<()> {
        self.tx
            .send(message.to_string())
            .map_err(|_| sender::Error::ConnectionLost("Channel closed".into()))
    }
}

/// Creates a sender and the receiver its messages arrive on.
pub fn channel() -> (ChannelSender, mpsc::UnboundedReceiver<String>) {
    let (tx, rx) = mpsc::unbounded_channel();
    (ChannelSender { tx }, rx)
}

/// Feeds every message from `rx` into `handler` until the channel closes or the
/// handler is dropped.
pub fn spawn_pump(mut rx: mpsc::UnboundedReceiver<String>, handler: WeakHandler) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(message) = rx.recv().await {
            let Some(handler) = handler.upgrade() else {
                break;
            };
            handler.on_message(&message);
        }
    })
}

/// Builds two handlers wired to each other.
///
/// Messages sent by `a` are received by `b` and vice versa.
pub fn pair(a: HandlerConfig, b: HandlerConfig) -> (MessageHandler, MessageHandler) {
    let (a_tx, a_rx) = channel();
    let (b_tx, b_rx) = channel();

    let a = MessageHandler::builder(a_tx).config(a).build();
    let b = MessageHandler::builder(b_tx).config(b).build();

    spawn_pump(a_rx, b.downgrade());
    spawn_pump(b_rx, a.downgrade());

    (a, b)
}
