//! The `EchoServiceListener` callback interface.

use async_trait::async_trait;
use objwire::Interface;
use objwire::Kind;
use objwire::Method;
use objwire::RemoteObject;
use objwire::Result;

pub const ON_UNREGISTERED: u32 = 1;
pub const ON_REGISTERED: u32 = 2;
pub const ON_NO_ARG_METHOD_CALLED: u32 = 3;
pub const ON_ECHO: u32 = 4;

pub static ECHO_SERVICE_LISTENER: Interface = Interface::new(
    "sample.EchoServiceListener",
    &[
        Method::new(ON_UNREGISTERED, "onUnRegistered").params(&[Kind::Value]),
        Method::new(ON_REGISTERED, "onRegistered"),
        Method::new(ON_NO_ARG_METHOD_CALLED, "onNoArgMethodCalled"),
        Method::new(ON_ECHO, "onEcho").params(&[Kind::Value]),
    ],
);

/// Callbacks from an [`crate::EchoService`] to a client. Each one does nothing by
/// default.
#[async_trait]
pub trait EchoServiceListener: RemoteObject {
    async fn on_unregistered(&self, _success: bool) -> Result<()> {
        Ok(())
    }

    async fn on_registered(&self) -> Result<()> {
        Ok(())
    }

    async fn on_no_arg_method_called(&self) -> Result<()> {
        Ok(())
    }

    async fn on_echo(&self, _input: Option<String>) -> Result<()> {
        Ok(())
    }
}
