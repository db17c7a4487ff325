use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::MutexGuard;
use std::sync::Weak;
use std::time::Duration;

use async_trait::async_trait;
use objwire::Error;
use objwire::RemoteObject;
use objwire::Result;
use objwire::same_object;
use tracing::debug;
use tracing::warn;

use crate::exception::CustomException;
use crate::exception::CustomException2Arg;
use crate::listener::EchoServiceListener;
use crate::model::ComplexObject;
use crate::model::MyObj;
use crate::service::EchoService;

/// The serving side of [`EchoService`].
///
/// Listeners are notified in registration order: `echo_string` reaches all of
/// them, `no_argument_method` the first and `echo_object` the second.
pub struct EchoServiceImpl {
    me: Weak<EchoServiceImpl>,
    listeners: Mutex<Vec<Arc<dyn EchoServiceListener>>>,
}

impl EchoServiceImpl {
    pub fn new() -> Arc<Self> {
        Arc::new_cyclic(|me| Self {
            me: me.clone(),
            listeners: Mutex::new(Vec::new()),
        })
    }

    pub fn listener_count(&self) -> usize {
        self.listeners().len()
    }

    fn listeners(&self) -> MutexGuard<'_, Vec<Arc<dyn EchoServiceListener>>> {
        self.listeners.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// The listener at `index`, cloned out so no lock is held across a callback.
    fn listener(&self, index: usize) -> Option<Arc<dyn EchoServiceListener>> {
        self.listeners().get(index).cloned()
    }
}

impl RemoteObject for EchoServiceImpl {}

#[async_trait]
impl EchoService for EchoServiceImpl {
    async fn get_echo_service(&self) -> Result<Option<Arc<dyn EchoService>>> {
        Ok(self.me.upgrade().map(|me| me as Arc<dyn EchoService>))
    }

    async fn get_echo_service_that_returns_null(&self) -> Result<Option<Arc<dyn EchoService>>> {
        Ok(None)
    }

    async fn no_argument_method(&self) -> Result<()> {
        if let Some(listener) = self.listener(0) {
            listener.on_no_arg_method_called().await?;
        }
        Ok(())
    }

    async fn echo_string(&self, input: Option<String>) -> Result<Option<String>> {
        let listeners = self.listeners().clone();
        for listener in listeners {
            // A listener that went away must not fail the echo.
            if let Err(e) = listener.on_echo(input.clone()).await {
                warn!(error = %e, "listener failed on echo");
            }
        }
        Ok(input.map(|input| input + "Result"))
    }

    async fn echo_varargs(&self, input: Vec<String>) -> Result<Option<String>> {
        debug!(count = input.len(), "echovarargs");
        Ok(input.into_iter().last())
    }

    async fn echo_object(&self, input: Option<MyObj>) -> Result<Option<MyObj>> {
        if let Some(obj) = &input {
            debug!(%obj, "echoObject");
            if let Some(listener) = self.listener(1) {
                listener.on_echo(Some(obj.name.clone())).await?;
            }
        }
        Ok(input)
    }

    async fn test_null_input(&self, input: Option<String>) -> Result<Option<String>> {
        Ok(Some(format!("Got Null{}", input.unwrap_or_else(|| "null".into()))))
    }

    async fn test_null_output(&self, _input: Option<String>) -> Result<Option<String>> {
        Ok(None)
    }

    async fn test_exception(&self, _input: String) -> Result<String> {
        Err(Error::runtime("Null"))
    }

    async fn test_multiple_list_params(
        &self,
        strings: Vec<String>,
        objs1: Option<Vec<MyObj>>,
        objs2: Vec<MyObj>,
    ) -> Result<Option<Vec<MyObj>>> {
        debug!(?strings, ?objs1, ?objs2, "testMultipleListParams");
        Ok(objs1)
    }

    async fn test_multiple_array_params(
        &self,
        strings: Option<Vec<String>>,
        objs1: Option<Vec<MyObj>>,
        objs2: Option<Vec<MyObj>>,
    ) -> Result<Option<Vec<MyObj>>> {
        debug!(?strings, ?objs1, ?objs2, "testMultipleArrayParams");
        Ok(objs2)
    }

    async fn test_multiple_map_params(
        &self,
        strings: BTreeMap<i32, String>,
        objs1: BTreeMap<String, MyObj>,
        objs2: Option<BTreeMap<i64, MyObj>>,
    ) -> Result<Option<BTreeMap<i64, MyObj>>> {
        debug!(?strings, ?objs1, ?objs2, "testMultipleMapParams");
        Ok(objs2)
    }

    async fn register_listener(
        &self,
        listener: Option<Arc<dyn EchoServiceListener>>,
    ) -> Result<bool> {
        let Some(listener) = listener else {
            return Ok(false);
        };
        let count = {
            let mut listeners = self.listeners();
            listeners.push(Arc::clone(&listener));
            listeners.len()
        };
        debug!(count, "listener registered");
        listener.on_registered().await?;
        Ok(true)
    }

    async fn unregister_listener(
        &self,
        listener: Option<Arc<dyn EchoServiceListener>>,
    ) -> Result<()> {
        let Some(listener) = listener else {
            return Err(Error::illegal_argument("no listener to unregister"));
        };
        let (removed, count) = {
            let mut listeners = self.listeners();
            let before = listeners.len();
            listeners.retain(|registered| !same_object(&**registered, &*listener));
            (listeners.len() < before, listeners.len())
        };
        debug!(removed, count, "listener unregistered");
        listener.on_unregistered(removed).await
    }

    async fn echo_complex_object(
        &self,
        input: Option<ComplexObject>,
    ) -> Result<Option<ComplexObject>> {
        Ok(input)
    }

    async fn test_exception_thrown(&self, input: i32) -> Result<i32> {
        match input {
            0 => Err(Error::illegal_state("Not ready")),
            1 => Err(Error::illegal_argument("Not ready")),
            2 => Err(Error::user(&CustomException::default())),
            3 => Err(Error::user(&CustomException2Arg { first: 1, second: 2 })),
            _ => Err(Error::runtime("Failed")),
        }
    }

    async fn call_that_timesout(&self, timeout_ms: u64) -> Result<u64> {
        tokio::time::sleep(Duration::from_millis(timeout_ms)).await;
        Ok(timeout_ms)
    }

    async fn non_rpc_call(&self) -> Result<i32> {
        Ok(1)
    }

    async fn test_delegate_intercept(&self) -> Result<i32> {
        Ok(100)
    }

    async fn one_way_throwing_exception(&self) -> Result<()> {
        Err(Error::illegal_state("one-way call failed"))
    }
}
