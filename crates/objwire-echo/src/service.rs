//! The `EchoService` interface.
//!
//! Method ids are stable across a deployment: both sides must agree on them.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use objwire::Error;
use objwire::Interface;
use objwire::Kind;
use objwire::Method;
use objwire::RemoteObject;
use objwire::Result;

use crate::listener::ECHO_SERVICE_LISTENER;
use crate::listener::EchoServiceListener;
use crate::model::ComplexObject;
use crate::model::MyObj;

pub const GET_ECHO_SERVICE: u32 = 1;
pub const GET_ECHO_SERVICE_THAT_RETURNS_NULL: u32 = 2;
pub const NO_ARGUMENT_METHOD: u32 = 3;
pub const ECHO_STRING: u32 = 4;
pub const ECHO_VARARGS: u32 = 5;
pub const ECHO_OBJECT: u32 = 6;
pub const TEST_NULL_INPUT: u32 = 7;
pub const TEST_NULL_OUTPUT: u32 = 8;
pub const TEST_EXCEPTION: u32 = 9;
pub const TEST_MULTIPLE_LIST_PARAMS: u32 = 10;
pub const TEST_MULTIPLE_ARRAY_PARAMS: u32 = 11;
pub const TEST_MULTIPLE_MAP_PARAMS: u32 = 12;
pub const REGISTER_LISTENER: u32 = 13;
pub const UNREGISTER_LISTENER: u32 = 14;
pub const ECHO_COMPLEX_OBJECT: u32 = 15;
pub const TEST_EXCEPTION_THROWN: u32 = 16;
pub const CALL_THAT_TIMESOUT: u32 = 17;
pub const NON_RPC_CALL: u32 = 18;
pub const TEST_DELEGATE_INTERCEPT: u32 = 19;
pub const ONE_WAY_THROWING_EXCEPTION: u32 = 20;

pub static ECHO_SERVICE: Interface = Interface::new(
    "sample.EchoService",
    &[
        Method::new(GET_ECHO_SERVICE, "getEchoService").returns(Kind::Object(&ECHO_SERVICE)),
        Method::new(GET_ECHO_SERVICE_THAT_RETURNS_NULL, "getEchoServiceThatReturnsNull")
            .returns(Kind::Object(&ECHO_SERVICE)),
        Method::new(NO_ARGUMENT_METHOD, "noArgumentMethod"),
        Method::new(ECHO_STRING, "echoString")
            .params(&[Kind::Value])
            .returns(Kind::Value),
        Method::new(ECHO_VARARGS, "echovarargs")
            .params(&[Kind::Value])
            .returns(Kind::Value),
        Method::new(ECHO_OBJECT, "echoObject")
            .params(&[Kind::Value])
            .returns(Kind::Value),
        Method::new(TEST_NULL_INPUT, "testNullInput")
            .params(&[Kind::Value])
            .returns(Kind::Value),
        Method::new(TEST_NULL_OUTPUT, "testNullOutput")
            .params(&[Kind::Value])
            .returns(Kind::Value),
        Method::new(TEST_EXCEPTION, "testException")
            .params(&[Kind::Value])
            .returns(Kind::Value),
        Method::new(TEST_MULTIPLE_LIST_PARAMS, "testMultipleListParams")
            .params(&[Kind::Value, Kind::Value, Kind::Value])
            .returns(Kind::Value),
        Method::new(TEST_MULTIPLE_ARRAY_PARAMS, "testMultipleArrayParams")
            .params(&[Kind::Value, Kind::Value, Kind::Value])
            .returns(Kind::Value),
        Method::new(TEST_MULTIPLE_MAP_PARAMS, "testMultipleMapParams")
            .params(&[Kind::Value, Kind::Value, Kind::Value])
            .returns(Kind::Value),
        Method::new(REGISTER_LISTENER, "registerListener")
            .params(&[Kind::Object(&ECHO_SERVICE_LISTENER)])
            .returns(Kind::Value),
        Method::new(UNREGISTER_LISTENER, "unregisterListener")
            .params(&[Kind::Object(&ECHO_SERVICE_LISTENER)]),
        Method::new(ECHO_COMPLEX_OBJECT, "echoComplexObject")
            .params(&[Kind::Value])
            .returns(Kind::Value),
        Method::new(TEST_EXCEPTION_THROWN, "testExceptionThrown")
            .params(&[Kind::Value])
            .returns(Kind::Value)
            .throws(&["sample.CustomException", "sample.CustomException2Arg"]),
        Method::new(CALL_THAT_TIMESOUT, "callThatTimesout")
            .params(&[Kind::Value])
            .returns(Kind::Value),
        Method::new(NON_RPC_CALL, "nonRpcCall")
            .returns(Kind::Value)
            .unsupported(),
        Method::new(TEST_DELEGATE_INTERCEPT, "testDelegateIntercept").returns(Kind::Value),
        Method::new(ONE_WAY_THROWING_EXCEPTION, "oneWayThrowingException").one_way(),
    ],
);

/// A service that echoes its inputs and calls back registered listeners.
///
/// Every method has a default body answering `NOT_SUPPORTED`, so delegates and
/// partial implementations only write the methods they serve.
#[async_trait]
pub trait EchoService: RemoteObject {
    async fn get_echo_service(&self) -> Result<Option<Arc<dyn EchoService>>> {
        Err(unimplemented("getEchoService"))
    }

    async fn get_echo_service_that_returns_null(&self) -> Result<Option<Arc<dyn EchoService>>> {
        Err(unimplemented("getEchoServiceThatReturnsNull"))
    }

    async fn no_argument_method(&self) -> Result<()> {
        Err(unimplemented("noArgumentMethod"))
    }

    async fn echo_string(&self, _input: Option<String>) -> Result<Option<String>> {
        Err(unimplemented("echoString"))
    }

    /// Returns the last input, or `None` when called with none.
    async fn echo_varargs(&self, _input: Vec<String>) -> Result<Option<String>> {
        Err(unimplemented("echovarargs"))
    }

    async fn echo_object(&self, _input: Option<MyObj>) -> Result<Option<MyObj>> {
        Err(unimplemented("echoObject"))
    }

    async fn test_null_input(&self, _input: Option<String>) -> Result<Option<String>> {
        Err(unimplemented("testNullInput"))
    }

    async fn test_null_output(&self, _input: Option<String>) -> Result<Option<String>> {
        Err(unimplemented("testNullOutput"))
    }

    async fn test_exception(&self, _input: String) -> Result<String> {
        Err(unimplemented("testException"))
    }

    async fn test_multiple_list_params(
        &self,
        _strings: Vec<String>,
        _objs1: Option<Vec<MyObj>>,
        _objs2: Vec<MyObj>,
    ) -> Result<Option<Vec<MyObj>>> {
        Err(unimplemented("testMultipleListParams"))
    }

    async fn test_multiple_array_params(
        &self,
        _strings: Option<Vec<String>>,
        _objs1: Option<Vec<MyObj>>,
        _objs2: Option<Vec<MyObj>>,
    ) -> Result<Option<Vec<MyObj>>> {
        Err(unimplemented("testMultipleArrayParams"))
    }

    async fn test_multiple_map_params(
        &self,
        _strings: BTreeMap<i32, String>,
        _objs1: BTreeMap<String, MyObj>,
        _objs2: Option<BTreeMap<i64, MyObj>>,
    ) -> Result<Option<BTreeMap<i64, MyObj>>> {
        Err(unimplemented("testMultipleMapParams"))
    }

    /// Returns whether a listener was registered.
    async fn register_listener(
        &self,
        _listener: Option<Arc<dyn EchoServiceListener>>,
    ) -> Result<bool> {
        Err(unimplemented("registerListener"))
    }

    async fn unregister_listener(
        &self,
        _listener: Option<Arc<dyn EchoServiceListener>>,
    ) -> Result<()> {
        Err(unimplemented("unregisterListener"))
    }

    async fn echo_complex_object(
        &self,
        _input: Option<ComplexObject>,
    ) -> Result<Option<ComplexObject>> {
        Err(unimplemented("echoComplexObject"))
    }

    /// Fails with a different kind of failure for each input.
    async fn test_exception_thrown(&self, _input: i32) -> Result<i32> {
        Err(unimplemented("testExceptionThrown"))
    }

    /// Sleeps for `timeout_ms`, then echoes it.
    async fn call_that_timesout(&self, _timeout_ms: u64) -> Result<u64> {
        Err(unimplemented("callThatTimesout"))
    }

    /// Local only: never callable through a proxy.
    async fn non_rpc_call(&self) -> Result<i32> {
        Err(unimplemented("nonRpcCall"))
    }

    async fn test_delegate_intercept(&self) -> Result<i32> {
        Err(unimplemented("testDelegateIntercept"))
    }

    async fn one_way_throwing_exception(&self) -> Result<()> {
        Err(unimplemented("oneWayThrowingException"))
    }
}

fn unimplemented(method: &str) -> Error {
    Error::not_supported(format!("{}.{} is not implemented", ECHO_SERVICE.name, method))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tables_are_consistent() {
        ECHO_SERVICE.validate().unwrap();
        ECHO_SERVICE_LISTENER.validate().unwrap();
        objwire::interface::validate_compatibility(&ECHO_SERVICE, &ECHO_SERVICE).unwrap();
    }

    #[test]
    fn test_method_lookup() {
        let method = ECHO_SERVICE.method(TEST_EXCEPTION_THROWN).unwrap();
        assert_eq!(method.name, "testExceptionThrown");
        assert!(method.declares("sample.CustomException"));
        assert!(!method.declares("sample.Other"));

        assert!(!ECHO_SERVICE.method(NON_RPC_CALL).unwrap().supported);
        assert!(ECHO_SERVICE.method(ONE_WAY_THROWING_EXCEPTION).unwrap().one_way);
        assert!(ECHO_SERVICE.method(99).is_none());
    }
}
