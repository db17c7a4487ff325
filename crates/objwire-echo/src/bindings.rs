//! # Bindings
//!
//! Proxies and stubs for [`EchoService`] and [`EchoServiceListener`], in the shape an
//! interface generator emits them: a proxy turns each trait method into a
//! [`Proxy::call`], a stub turns each method id back into a trait call, and
//! [`Remote`] ties both to the method table.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use objwire::Args;
use objwire::Dispatch;
use objwire::Error;
use objwire::Interface;
use objwire::Method;
use objwire::Proxy;
use objwire::Remote;
use objwire::RemoteObject;
use objwire::Result;
use objwire::Value;

use crate::listener;
use crate::listener::ECHO_SERVICE_LISTENER;
use crate::listener::EchoServiceListener;
use crate::model::ComplexObject;
use crate::model::MyObj;
use crate::service;
use crate::service::ECHO_SERVICE;
use crate::service::EchoService;

// --- EchoService ---

/// Calls an `EchoService` living on the peer.
pub struct EchoServiceProxy(Proxy);

impl RemoteObject for EchoServiceProxy {
    fn as_proxy(&self) -> Option<&Proxy> {
        Some(&self.0)
    }
}

#[async_trait]
impl EchoService for EchoServiceProxy {
    async fn get_echo_service(&self) -> Result<Option<Arc<dyn EchoService>>> {
        self.0.call(service::GET_ECHO_SERVICE, vec![]).await?.into_object()
    }

    async fn get_echo_service_that_returns_null(&self) -> Result<Option<Arc<dyn EchoService>>> {
        self.0
            .call(service::GET_ECHO_SERVICE_THAT_RETURNS_NULL, vec![])
            .await?
            .into_object()
    }

    async fn no_argument_method(&self) -> Result<()> {
        self.0.call(service::NO_ARGUMENT_METHOD, vec![]).await.map(|_| ())
    }

    async fn echo_string(&self, input: Option<String>) -> Result<Option<String>> {
        self.0
            .call(service::ECHO_STRING, vec![Value::json(&input)?])
            .await?
            .into_json()
    }

    async fn echo_varargs(&self, input: Vec<String>) -> Result<Option<String>> {
        self.0
            .call(service::ECHO_VARARGS, vec![Value::json(&input)?])
            .await?
            .into_json()
    }

    async fn echo_object(&self, input: Option<MyObj>) -> Result<Option<MyObj>> {
        self.0
            .call(service::ECHO_OBJECT, vec![Value::json(&input)?])
            .await?
            .into_json()
    }

    async fn test_null_input(&self, input: Option<String>) -> Result<Option<String>> {
        self.0
            .call(service::TEST_NULL_INPUT, vec![Value::json(&input)?])
            .await?
            .into_json()
    }

    async fn test_null_output(&self, input: Option<String>) -> Result<Option<String>> {
        self.0
            .call(service::TEST_NULL_OUTPUT, vec![Value::json(&input)?])
            .await?
            .into_json()
    }

    async fn test_exception(&self, input: String) -> Result<String> {
        self.0
            .call(service::TEST_EXCEPTION, vec![Value::json(&input)?])
            .await?
            .into_json()
    }

    async fn test_multiple_list_params(
        &self,
        strings: Vec<String>,
        objs1: Option<Vec<MyObj>>,
        objs2: Vec<MyObj>,
    ) -> Result<Option<Vec<MyObj>>> {
        let args = vec![Value::json(&strings)?, Value::json(&objs1)?, Value::json(&objs2)?];
        self.0
            .call(service::TEST_MULTIPLE_LIST_PARAMS, args)
            .await?
            .into_json()
    }

    async fn test_multiple_array_params(
        &self,
        strings: Option<Vec<String>>,
        objs1: Option<Vec<MyObj>>,
        objs2: Option<Vec<MyObj>>,
    ) -> Result<Option<Vec<MyObj>>> {
        let args = vec![Value::json(&strings)?, Value::json(&objs1)?, Value::json(&objs2)?];
        self.0
            .call(service::TEST_MULTIPLE_ARRAY_PARAMS, args)
            .await?
            .into_json()
    }

    async fn test_multiple_map_params(
        &self,
        strings: BTreeMap<i32, String>,
        objs1: BTreeMap<String, MyObj>,
        objs2: Option<BTreeMap<i64, MyObj>>,
    ) -> Result<Option<BTreeMap<i64, MyObj>>> {
        let args = vec![Value::json(&strings)?, Value::json(&objs1)?, Value::json(&objs2)?];
        self.0
            .call(service::TEST_MULTIPLE_MAP_PARAMS, args)
            .await?
            .into_json()
    }

    async fn register_listener(
        &self,
        listener: Option<Arc<dyn EchoServiceListener>>,
    ) -> Result<bool> {
        self.0
            .call(service::REGISTER_LISTENER, vec![Value::object(listener)])
            .await?
            .into_json()
    }

    async fn unregister_listener(
        &self,
        listener: Option<Arc<dyn EchoServiceListener>>,
    ) -> Result<()> {
        self.0
            .call(service::UNREGISTER_LISTENER, vec![Value::object(listener)])
            .await
            .map(|_| ())
    }

    async fn echo_complex_object(
        &self,
        input: Option<ComplexObject>,
    ) -> Result<Option<ComplexObject>> {
        self.0
            .call(service::ECHO_COMPLEX_OBJECT, vec![Value::json(&input)?])
            .await?
            .into_json()
    }

    async fn test_exception_thrown(&self, input: i32) -> Result<i32> {
        self.0
            .call(service::TEST_EXCEPTION_THROWN, vec![Value::json(&input)?])
            .await?
            .into_json()
    }

    async fn call_that_timesout(&self, timeout_ms: u64) -> Result<u64> {
        self.0
            .call(service::CALL_THAT_TIMESOUT, vec![Value::json(&timeout_ms)?])
            .await?
            .into_json()
    }

    async fn non_rpc_call(&self) -> Result<i32> {
        self.0.call(service::NON_RPC_CALL, vec![]).await?.into_json()
    }

    async fn test_delegate_intercept(&self) -> Result<i32> {
        self.0
            .call(service::TEST_DELEGATE_INTERCEPT, vec![])
            .await?
            .into_json()
    }

    async fn one_way_throwing_exception(&self) -> Result<()> {
        self.0
            .call(service::ONE_WAY_THROWING_EXCEPTION, vec![])
            .await
            .map(|_| ())
    }
}

/// Serves an `EchoService` implementation.
pub struct EchoServiceStub(Arc<dyn EchoService>);

#[async_trait]
impl Dispatch for EchoServiceStub {
    fn interface(&self) -> &'static Interface {
        &ECHO_SERVICE
    }

    async fn dispatch(&self, method: &'static Method, args: Args) -> Result<Value> {
        let target = &self.0;
        match method.id {
            service::GET_ECHO_SERVICE => Ok(Value::object(target.get_echo_service().await?)),
            service::GET_ECHO_SERVICE_THAT_RETURNS_NULL => {
                Ok(Value::object(target.get_echo_service_that_returns_null().await?))
            }
            service::NO_ARGUMENT_METHOD => {
                target.no_argument_method().await?;
                Ok(Value::null())
            }
            service::ECHO_STRING => Value::json(&target.echo_string(args.value(0)?).await?),
            service::ECHO_VARARGS => Value::json(&target.echo_varargs(args.value(0)?).await?),
            service::ECHO_OBJECT => Value::json(&target.echo_object(args.value(0)?).await?),
            service::TEST_NULL_INPUT => Value::json(&target.test_null_input(args.value(0)?).await?),
            service::TEST_NULL_OUTPUT => {
                Value::json(&target.test_null_output(args.value(0)?).await?)
            }
            service::TEST_EXCEPTION => Value::json(&target.test_exception(args.value(0)?).await?),
            service::TEST_MULTIPLE_LIST_PARAMS => {
                let result = target
                    .test_multiple_list_params(args.value(0)?, args.value(1)?, args.value(2)?)
                    .await?;
                Value::json(&result)
            }
            service::TEST_MULTIPLE_ARRAY_PARAMS => {
                let result = target
                    .test_multiple_array_params(args.value(0)?, args.value(1)?, args.value(2)?)
                    .await?;
                Value::json(&result)
            }
            service::TEST_MULTIPLE_MAP_PARAMS => {
                let result = target
                    .test_multiple_map_params(args.value(0)?, args.value(1)?, args.value(2)?)
                    .await?;
                Value::json(&result)
            }
            service::REGISTER_LISTENER => {
                Value::json(&target.register_listener(args.object(0)?).await?)
            }
            service::UNREGISTER_LISTENER => {
                target.unregister_listener(args.object(0)?).await?;
                Ok(Value::null())
            }
            service::ECHO_COMPLEX_OBJECT => {
                Value::json(&target.echo_complex_object(args.value(0)?).await?)
            }
            service::TEST_EXCEPTION_THROWN => {
                Value::json(&target.test_exception_thrown(args.value(0)?).await?)
            }
            service::CALL_THAT_TIMESOUT => {
                Value::json(&target.call_that_timesout(args.value(0)?).await?)
            }
            service::NON_RPC_CALL => Value::json(&target.non_rpc_call().await?),
            service::TEST_DELEGATE_INTERCEPT => {
                Value::json(&target.test_delegate_intercept().await?)
            }
            service::ONE_WAY_THROWING_EXCEPTION => {
                target.one_way_throwing_exception().await?;
                Ok(Value::null())
            }
            other => Err(Error::dispatch_rejected(format!(
                "{} has no method {}",
                ECHO_SERVICE.name, other
            ))),
        }
    }
}

impl Remote for dyn EchoService {
    fn interface() -> &'static Interface {
        &ECHO_SERVICE
    }

    fn stub(this: Arc<Self>) -> Arc<dyn Dispatch> {
        Arc::new(EchoServiceStub(this))
    }

    fn proxy(proxy: Proxy) -> Arc<Self> {
        Arc::new(EchoServiceProxy(proxy))
    }
}

// --- EchoServiceListener ---

/// Calls an `EchoServiceListener` living on the peer.
pub struct EchoServiceListenerProxy(Proxy);

impl RemoteObject for EchoServiceListenerProxy {
    fn as_proxy(&self) -> Option<&Proxy> {
        Some(&self.0)
    }
}

#[async_trait]
impl EchoServiceListener for EchoServiceListenerProxy {
    async fn on_unregistered(&self, success: bool) -> Result<()> {
        self.0
            .call(listener::ON_UNREGISTERED, vec![Value::json(&success)?])
            .await
            .map(|_| ())
    }

    async fn on_registered(&self) -> Result<()> {
        self.0.call(listener::ON_REGISTERED, vec![]).await.map(|_| ())
    }

    async fn on_no_arg_method_called(&self) -> Result<()> {
        self.0
            .call(listener::ON_NO_ARG_METHOD_CALLED, vec![])
            .await
            .map(|_| ())
    }

    async fn on_echo(&self, input: Option<String>) -> Result<()> {
        self.0
            .call(listener::ON_ECHO, vec![Value::json(&input)?])
            .await
            .map(|_| ())
    }
}

/// Serves an `EchoServiceListener` implementation.
pub struct EchoServiceListenerStub(Arc<dyn EchoServiceListener>);

#[async_trait]
impl Dispatch for EchoServiceListenerStub {
    fn interface(&self) -> &'static Interface {
        &ECHO_SERVICE_LISTENER
    }

    async fn dispatch(&self, method: &'static Method, args: Args) -> Result<Value> {
        let target = &self.0;
        match method.id {
            listener::ON_UNREGISTERED => target.on_unregistered(args.value(0)?).await?,
            listener::ON_REGISTERED => target.on_registered().await?,
            listener::ON_NO_ARG_METHOD_CALLED => target.on_no_arg_method_called().await?,
            listener::ON_ECHO => target.on_echo(args.value(0)?).await?,
            other => {
                return Err(Error::dispatch_rejected(format!(
                    "{} has no method {}",
                    ECHO_SERVICE_LISTENER.name, other
                )));
            }
        }
        Ok(Value::null())
    }
}

impl Remote for dyn EchoServiceListener {
    fn interface() -> &'static Interface {
        &ECHO_SERVICE_LISTENER
    }

    fn stub(this: Arc<Self>) -> Arc<dyn Dispatch> {
        Arc::new(EchoServiceListenerStub(this))
    }

    fn proxy(proxy: Proxy) -> Arc<Self> {
        Arc::new(EchoServiceListenerProxy(proxy))
    }
}
