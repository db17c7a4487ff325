//! End-to-end tests: a client handler calling an echo server over in-process
//! channels.

mod common;

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;
use std::time::Duration;

use async_trait::async_trait;
use objwire::DispatchKey;
use objwire::Error;
use objwire::ExceptionInfo;
use objwire::ExceptionKind;
use objwire::FailureListener;
use objwire::FailureSource;
use objwire::HandlerConfig;
use objwire::MessageHandler;
use objwire::MethodDelegate;
use objwire::RemoteObject;
use objwire::Stub;
use objwire::Value;
use objwire::WeakHandler;
use objwire::channel;
use objwire::same_object;
use objwire::sender;
use objwire_echo::ComplexObject;
use objwire_echo::CustomException;
use objwire_echo::CustomException2Arg;
use objwire_echo::EchoService;
use objwire_echo::EchoServiceImpl;
use objwire_echo::Family;
use objwire_echo::MyObj;
use objwire_echo::Sex;
use objwire_echo::listener::ECHO_SERVICE_LISTENER;
use objwire_echo::service;
use rand::Rng;
use rand::distributions::Alphanumeric;

use common::RecordingListener;
use common::connect;
use common::connect_with;
use common::extras_of;
use common::init_tracing;
use common::wait_until;

type FailureLog = Arc<Mutex<Vec<(FailureSource, u32, ExceptionInfo)>>>;

/// Collects every reported failure.
fn failure_log() -> (Arc<dyn FailureListener>, FailureLog) {
    let log = Arc::new(Mutex::new(Vec::new()));
    let seen = Arc::clone(&log);
    let listener: Arc<dyn FailureListener> =
        Arc::new(move |source: &FailureSource, method_id: u32, info: &ExceptionInfo| {
            seen.lock().unwrap().push((source.clone(), method_id, info.clone()));
        });
    (listener, log)
}

// --- Test 1: Plain Values ---

#[tokio::test]
async fn test_echo() {
    let f = connect();
    assert_eq!(
        f.echo.echo_string(Some("World".into())).await.unwrap().as_deref(),
        Some("WorldResult")
    );
    assert_eq!(f.echo.echo_string(None).await.unwrap(), None);
}

#[tokio::test]
async fn test_object() {
    let f = connect();
    let input = MyObj::new("Foo", 1);
    assert_eq!(f.echo.echo_object(Some(input.clone())).await.unwrap(), Some(input));
    assert_eq!(f.echo.echo_object(None).await.unwrap(), None);
}

#[tokio::test]
async fn test_null_input_and_output() {
    let f = connect();
    assert_eq!(f.echo.test_null_input(None).await.unwrap().as_deref(), Some("Got Nullnull"));
    assert_eq!(f.echo.test_null_output(Some("x".into())).await.unwrap(), None);
}

#[tokio::test]
async fn test_list() {
    let f = connect();
    let strings = vec!["1".to_string(), "2".to_string()];
    let objs1 = vec![MyObj::new("A", 1), MyObj::new("B", 2)];
    let objs2 = vec![MyObj::new("C", 10), MyObj::new("D", 20)];

    let result = f
        .echo
        .test_multiple_list_params(strings.clone(), Some(objs1.clone()), objs2.clone())
        .await
        .unwrap();
    assert_eq!(result, Some(objs1));

    let result = f.echo.test_multiple_list_params(strings, None, objs2).await.unwrap();
    assert_eq!(result, None);
}

#[tokio::test]
async fn test_array() {
    let f = connect();
    let strings = Some(vec!["1".to_string(), "2".to_string()]);
    let objs1 = Some(vec![MyObj::new("A", 1), MyObj::new("B", 2)]);
    let objs2 = vec![MyObj::new("C", 10), MyObj::new("D", 20)];

    let result = f
        .echo
        .test_multiple_array_params(strings.clone(), objs1.clone(), Some(objs2.clone()))
        .await
        .unwrap();
    assert_eq!(result, Some(objs2));

    let result = f.echo.test_multiple_array_params(strings, objs1, None).await.unwrap();
    assert_eq!(result, None);
}

#[tokio::test]
async fn test_map() {
    let f = connect();
    let strings = BTreeMap::from([(1, "1".to_string()), (2, "2".to_string())]);
    let objs1 = BTreeMap::from([
        ("1".to_string(), MyObj::new("A", 1)),
        ("2".to_string(), MyObj::new("B", 2)),
    ]);
    let objs2 = BTreeMap::from([(1i64, MyObj::new("AB", 10)), (2i64, MyObj::new("BB", 20))]);

    let result = f
        .echo
        .test_multiple_map_params(strings.clone(), objs1.clone(), Some(objs2.clone()))
        .await
        .unwrap();
    assert_eq!(result, Some(objs2));

    let result = f.echo.test_multiple_map_params(strings, objs1, None).await.unwrap();
    assert_eq!(result, None);
}

#[tokio::test]
async fn test_complex_object() {
    let f = connect();
    let input = ComplexObject {
        name: Some("Name0".into()),
        sex: Some(Sex::Male),
        family: Some(Family {
            family_name: Some("Family0".into()),
        }),
    };

    let returned = f.echo.echo_complex_object(Some(input.clone())).await.unwrap();
    assert_eq!(returned, Some(input));
    assert_eq!(f.echo.echo_complex_object(None).await.unwrap(), None);
}

#[tokio::test]
async fn test_varargs() {
    let f = connect();
    let args = vec!["1".to_string(), "2".to_string(), "3".to_string()];
    assert_eq!(f.echo.echo_varargs(args).await.unwrap().as_deref(), Some("3"));
    assert_eq!(f.echo.echo_varargs(Vec::new()).await.unwrap(), None);
}

// --- Test 2: References ---

#[tokio::test]
async fn test_get_rpc_interface() {
    let f = connect();
    let returned = f.echo.get_echo_service().await.unwrap().unwrap();

    assert!(same_object(&*returned, &*f.echo));
    assert_eq!(
        returned.echo_string(Some("World".into())).await.unwrap().as_deref(),
        Some("WorldResult")
    );
    assert_eq!(returned.echo_string(None).await.unwrap(), None);
    assert_eq!(f.server.stub_count(), 1);
}

#[tokio::test]
async fn test_null_rpc_param_and_return() {
    let f = connect();
    assert!(!f.echo.register_listener(None).await.unwrap());
    assert!(f.echo.get_echo_service_that_returns_null().await.unwrap().is_none());
    assert_eq!(f.client.stub_count(), 0);
}

#[tokio::test]
async fn test_no_arg_call() {
    let f = connect();
    let listener = RecordingListener::new();

    assert!(f.echo.register_listener(listener.as_listener()).await.unwrap());
    assert_eq!(listener.registered.load(Ordering::SeqCst), 1);

    f.echo.no_argument_method().await.unwrap();
    assert_eq!(listener.no_arg_calls.load(Ordering::SeqCst), 1);

    f.echo.unregister_listener(listener.as_listener()).await.unwrap();
    assert_eq!(listener.unregistered(), vec![true]);

    f.echo.no_argument_method().await.unwrap();
    assert_eq!(listener.no_arg_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_listener() {
    let f = connect();
    let first = RecordingListener::new();
    let second = RecordingListener::new();

    f.echo.register_listener(first.as_listener()).await.unwrap();
    f.echo.register_listener(second.as_listener()).await.unwrap();
    assert_eq!(f.service.listener_count(), 2);
    assert_eq!(f.client.stub_count(), 2);

    f.echo.echo_string(Some("Hello".into())).await.unwrap();
    f.echo.echo_object(Some(MyObj::new("World", 0))).await.unwrap();
    assert_eq!(first.echoes(), vec![Some("Hello".to_string())]);
    assert_eq!(second.echoes(), vec![Some("Hello".to_string()), Some("World".to_string())]);

    f.echo.unregister_listener(second.as_listener()).await.unwrap();
    assert_eq!(second.unregistered(), vec![true]);

    // only one listener left, so nobody hears about the object
    f.echo.echo_object(Some(MyObj::new("World", 0))).await.unwrap();
    assert_eq!(second.echoes().len(), 2);

    f.echo.unregister_listener(first.as_listener()).await.unwrap();
    f.echo.echo_string(Some("Hello".into())).await.unwrap();
    assert_eq!(first.echoes().len(), 1);
    assert_eq!(f.service.listener_count(), 0);

    // unregistering again finds nothing to remove
    f.echo.unregister_listener(first.as_listener()).await.unwrap();
    assert_eq!(first.unregistered(), vec![true, false]);
}

#[tokio::test]
async fn test_multiple_listeners_when_one_dead() {
    let f = connect();
    let (failures, reported) = failure_log();
    f.server.set_failure_listener(Some(failures));

    let first = RecordingListener::new();
    let second = RecordingListener::new();
    f.echo.register_listener(first.as_listener()).await.unwrap();
    f.echo.register_listener(second.as_listener()).await.unwrap();

    f.echo.echo_string(Some("Hello".into())).await.unwrap();

    let first_dyn = first.as_listener().unwrap();
    assert!(f.client.clear_stub_of_service(&*first_dyn));

    f.echo.echo_string(Some("Hello".into())).await.unwrap();

    assert_eq!(first.echoes().len() + second.echoes().len(), 3);
    assert_eq!(first.echoes().len(), 1);

    // the server called a listener that no longer exists: reported once
    let reported = reported.lock().unwrap();
    assert_eq!(reported.len(), 1);
    let (source, method_id, info) = &reported[0];
    assert!(matches!(
        source,
        FailureSource::Proxy(p) if p.interface().name == ECHO_SERVICE_LISTENER.name
    ));
    assert_eq!(*method_id, objwire_echo::listener::ON_ECHO);
    assert_eq!(info.kind, ExceptionKind::StubNotFound);
}

// --- Test 3: Failures ---

#[tokio::test]
async fn test_exception() {
    let f = connect();
    let err = f.echo.test_exception("hello".into()).await.unwrap_err();
    assert_eq!(err.kind(), ExceptionKind::GenericRuntime);
}

#[tokio::test]
async fn test_exception_thrown() {
    let f = connect();

    let err = f.echo.test_exception_thrown(0).await.unwrap_err();
    assert_eq!(err.kind(), ExceptionKind::IllegalState);
    assert!(err.message().is_some());

    let err = f.echo.test_exception_thrown(1).await.unwrap_err();
    assert_eq!(err.kind(), ExceptionKind::IllegalArgument);
    assert!(err.message().is_some());

    let err = f.echo.test_exception_thrown(2).await.unwrap_err();
    assert_eq!(err.kind(), ExceptionKind::UserDeclared);
    assert_eq!(err.downcast::<CustomException>(), Some(CustomException::default()));

    // two-argument exceptions cannot be rebuilt
    let err = f.echo.test_exception_thrown(3).await.unwrap_err();
    assert_eq!(err.kind(), ExceptionKind::GenericRuntime);
    assert_eq!(err.class_name(), "sample.CustomException2Arg");
    assert_eq!(err.message(), Some("custom exception (1, 2)"));
    assert_eq!(err.downcast::<CustomException2Arg>(), None);

    let err = f.echo.test_exception_thrown(100).await.unwrap_err();
    assert_eq!(err.kind(), ExceptionKind::GenericRuntime);
    assert_eq!(err.message(), Some("Failed"));
}

#[tokio::test]
async fn test_rpc_not_supported() {
    let f = connect();
    let err = f.echo.non_rpc_call().await.unwrap_err();
    assert_eq!(err.kind(), ExceptionKind::NotSupported);
}

#[tokio::test]
async fn test_stub_not_found() {
    let f = connect();
    f.server.clear();

    let (failures, reported) = failure_log();
    let proxy = f.echo.as_proxy().unwrap().clone();
    proxy.set_failure_listener(Some(failures));

    let err = f.echo.no_argument_method().await.unwrap_err();
    assert_eq!(err.kind(), ExceptionKind::StubNotFound);

    let reported = reported.lock().unwrap();
    assert_eq!(reported.len(), 1);
    assert!(matches!(&reported[0].0, FailureSource::Proxy(p) if *p == proxy));
    assert_eq!(reported[0].1, service::NO_ARGUMENT_METHOD);
}

#[tokio::test]
async fn test_one_way_exception() {
    let f = connect();
    let (client_failures, client_reported) = failure_log();
    let (server_failures, server_reported) = failure_log();
    f.client.set_failure_listener(Some(client_failures));
    f.server.set_failure_listener(Some(server_failures));

    f.echo.one_way_throwing_exception().await.unwrap();
    wait_until(|| !server_reported.lock().unwrap().is_empty()).await;

    let reported = server_reported.lock().unwrap();
    assert_eq!(reported.len(), 1);
    let (source, method_id, info) = &reported[0];
    assert!(matches!(source, FailureSource::Inbound { instance_id: 0, .. }));
    assert_eq!(*method_id, service::ONE_WAY_THROWING_EXCEPTION);
    assert_eq!(info.kind, ExceptionKind::IllegalState);

    // the caller never learns about it
    f.echo.echo_string(None).await.unwrap();
    assert!(client_reported.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_message_failure() {
    init_tracing();
    let client = MessageHandler::new(|_: &str| -> sender::Result<()> {
        Err(sender::Error::Io("Unable to send message".into()))
    });
    let echo = client.root::<dyn EchoService>();

    let err = echo.echo_string(Some("World".into())).await.unwrap_err();
    assert_eq!(err.kind(), ExceptionKind::TransportFailure);
    assert_eq!(client.pending_count(), 0);
}

// --- Test 4: Timeouts ---

#[tokio::test]
async fn test_timeout() {
    let f = connect();

    f.client.set_request_timeout(Duration::from_millis(20));
    let err = f.echo.call_that_timesout(200).await.unwrap_err();
    assert_eq!(err.kind(), ExceptionKind::Timeout);

    f.client.set_request_timeout(Duration::from_millis(2000));
    assert_eq!(f.echo.call_that_timesout(40).await.unwrap(), 40);
}

#[tokio::test]
async fn test_timeout_on_clear() {
    let f = connect();
    let echo = Arc::clone(&f.echo);
    let call = tokio::spawn(async move { echo.call_that_timesout(60_000).await });

    wait_until(|| f.client.pending_count() == 1).await;
    f.client.clear();

    let err = tokio::time::timeout(Duration::from_secs(1), call)
        .await
        .expect("clear must release the caller")
        .unwrap()
        .unwrap_err();
    assert_eq!(err.kind(), ExceptionKind::TransportFailure);
}

// --- Test 5: Interception ---

#[tokio::test]
async fn test_dispatch_intercept() {
    let veto = Arc::new(AtomicBool::new(false));
    let armed = Arc::clone(&veto);
    let f = connect_with(move |stub| {
        stub.with_hook(move |ctx| {
            if armed.load(Ordering::SeqCst) && ctx.method.id == service::ECHO_STRING {
                return Err(Error::illegal_state("Call not allowed"));
            }
            Ok(None)
        })
    });

    assert_eq!(
        f.echo.echo_string(Some("World".into())).await.unwrap().as_deref(),
        Some("WorldResult")
    );

    veto.store(true, Ordering::SeqCst);
    let input = MyObj::new("Foo", 1);
    assert_eq!(f.echo.echo_object(Some(input.clone())).await.unwrap(), Some(input));

    let err = f.echo.echo_string(Some("World".into())).await.unwrap_err();
    assert_eq!(err.kind(), ExceptionKind::IllegalState);
    assert_eq!(err.message(), Some("Call not allowed"));
}

/// Answers `testDelegateIntercept` with a fixed value, or defers.
struct InterceptDelegate {
    answer: Option<i32>,
    handler: Option<WeakHandler>,
    seen_original: Mutex<Option<String>>,
}

impl InterceptDelegate {
    fn answering(answer: i32) -> Arc<Self> {
        Arc::new(Self {
            answer: Some(answer),
            handler: None,
            seen_original: Mutex::new(None),
        })
    }

    fn deferring() -> Arc<Self> {
        Arc::new(Self {
            answer: None,
            handler: None,
            seen_original: Mutex::new(None),
        })
    }

    fn watching(handler: &MessageHandler, answer: i32) -> Arc<Self> {
        Arc::new(Self {
            answer: Some(answer),
            handler: Some(handler.downgrade()),
            seen_original: Mutex::new(None),
        })
    }
}

impl RemoteObject for InterceptDelegate {}

#[async_trait]
impl EchoService for InterceptDelegate {
    async fn test_delegate_intercept(&self) -> objwire::Result<i32> {
        if let Some(handler) = self.handler.as_ref().and_then(WeakHandler::upgrade) {
            let key = DispatchKey::new::<dyn EchoService>(service::TEST_DELEGATE_INTERCEPT, self);
            *self.seen_original.lock().unwrap() = handler.original_message(&key);
        }
        self.answer.ok_or_else(Error::ignore_delegate)
    }
}

#[tokio::test]
async fn test_delegate_proxy() {
    let f = connect();
    assert_eq!(f.echo.test_delegate_intercept().await.unwrap(), 100);

    let delegate = InterceptDelegate::answering(200);
    f.client.add_method_delegate(MethodDelegate::new::<dyn EchoService>(
        service::TEST_DELEGATE_INTERCEPT,
        delegate,
    ));
    assert_eq!(f.echo.test_delegate_intercept().await.unwrap(), 200);
}

#[tokio::test]
async fn test_delegate_proxy_intercept() {
    let f = connect();
    assert_eq!(f.echo.test_delegate_intercept().await.unwrap(), 100);

    let delegate = InterceptDelegate::deferring();
    f.client.add_method_delegate(MethodDelegate::new::<dyn EchoService>(
        service::TEST_DELEGATE_INTERCEPT,
        delegate,
    ));
    assert_eq!(f.echo.test_delegate_intercept().await.unwrap(), 100);
}

#[tokio::test]
async fn test_delegate_stub() {
    let f = connect();
    assert_eq!(f.echo.test_delegate_intercept().await.unwrap(), 100);

    let delegate = InterceptDelegate::watching(&f.server, 300);
    let method_delegate = MethodDelegate::new::<dyn EchoService>(
        service::TEST_DELEGATE_INTERCEPT,
        Arc::clone(&delegate) as Arc<dyn EchoService>,
    );
    let key = method_delegate.dispatch_key();
    f.server.add_method_delegate(method_delegate);

    assert_eq!(f.echo.test_delegate_intercept().await.unwrap(), 300);

    let original = delegate.seen_original.lock().unwrap().clone().unwrap();
    assert!(original.contains(&format!("\"methodId\":{}", service::TEST_DELEGATE_INTERCEPT)));
    assert_eq!(f.server.original_message(&key), None);
}

#[tokio::test]
async fn test_original_message_at_implementation() {
    init_tracing();
    let (client, server) =
        channel::pair(HandlerConfig::named("client"), HandlerConfig::named("server"));
    let implementation = InterceptDelegate::watching(&server, 100);
    server.register_root(Arc::clone(&implementation) as Arc<dyn EchoService>);

    let echo = client.root::<dyn EchoService>();
    assert_eq!(echo.test_delegate_intercept().await.unwrap(), 100);

    let original = implementation.seen_original.lock().unwrap().clone().unwrap();
    assert!(original.contains("\"interface\":\"sample.EchoService\""));
}

// --- Test 6: Extras and Properties ---

fn custom_extras() -> objwire::Extras {
    let mut extras = objwire::Extras::new();
    extras.insert("custom_string".into(), "Hello".into());
    extras.insert("custom_int".into(), "1".into());
    extras.insert("custom_obj".into(), serde_json::to_string(&MyObj::new("Hello", 1)).unwrap());
    extras.insert("foo".into(), "bar".into());
    extras
}

#[tokio::test]
async fn test_custom_json_entries() {
    let f = connect();
    f.client.set_extra(Some(custom_extras()));

    let proxy = f.echo.as_proxy().unwrap();
    let reply = proxy
        .call_with_reply(service::ECHO_STRING, vec![Value::json(&"World").unwrap()], None)
        .await
        .unwrap();
    assert_eq!(reply.value.into_json::<String>().unwrap(), "WorldResult");

    assert_eq!(reply.extras.get("custom_string").map(String::as_str), Some("Hello"));
    assert_eq!(reply.extras.get("custom_int").map(String::as_str), Some("1"));
    let obj: MyObj = serde_json::from_str(&reply.extras["custom_obj"]).unwrap();
    assert_eq!(obj.age, 1);
    assert!(!reply.extras.contains_key("foo"));
}

#[tokio::test]
async fn test_listener_sending_original_custom() {
    let f = connect();

    // registered with no extras set: callbacks carry none
    let plain = RecordingListener::watching(&f.client);
    f.echo.register_listener(plain.as_listener()).await.unwrap();
    f.echo.echo_string(Some("Hello".into())).await.unwrap();
    let extras = extras_of(&plain.last_original().unwrap());
    assert!(!extras.contains_key("custom_string"));
    assert!(!extras.contains_key("foo"));
    f.echo.unregister_listener(plain.as_listener()).await.unwrap();

    // registered while extras are set: callbacks carry the custom ones
    f.client.set_extra(Some(custom_extras()));
    let tagged = RecordingListener::watching(&f.client);
    f.echo.register_listener(tagged.as_listener()).await.unwrap();
    f.echo.echo_string(Some("Hello".into())).await.unwrap();

    let extras = extras_of(&tagged.last_original().unwrap());
    assert_eq!(extras.get("custom_string").map(String::as_str), Some("Hello"));
    assert_eq!(extras.get("custom_int").map(String::as_str), Some("1"));
    let obj: MyObj = serde_json::from_str(&extras["custom_obj"]).unwrap();
    assert_eq!(obj.age, 1);
    assert!(!extras.contains_key("foo"));

    f.echo.unregister_listener(tagged.as_listener()).await.unwrap();
    assert_eq!(tagged.unregistered(), vec![true]);
}

#[tokio::test]
async fn test_properties() {
    let checked = Arc::new(AtomicUsize::new(0));
    let seen = Arc::clone(&checked);
    let f = connect_with(move |stub| {
        stub.with_hook(move |ctx| {
            assert_eq!(ctx.property("B"), Some("B1"));
            assert_eq!(ctx.extra("custom_B"), Some("B1"));
            assert_eq!(ctx.property("A"), None);
            seen.fetch_add(1, Ordering::SeqCst);
            Ok(None)
        })
    });

    f.client.add_property("A", "A1", false);
    f.client.add_property("B", "B1", true);

    let proxy = f.echo.as_proxy().unwrap();
    let reply = proxy
        .call_with_reply(service::ECHO_STRING, vec![Value::json(&"World").unwrap()], None)
        .await
        .unwrap();
    assert_eq!(checked.load(Ordering::SeqCst), 1);

    assert_eq!(reply.extras.get("custom_B").map(String::as_str), Some("B1"));
    assert!(!reply.extras.contains_key("custom_A"));
    assert!(!reply.extras.contains_key("A"));

    assert_eq!(f.client.property("A").as_deref(), Some("A1"));
    assert_eq!(f.server.property("A"), None);
    assert_eq!(f.server.property("B"), None);
    assert_eq!(f.server.property("custom_B"), None);
}

// --- Test 7: Concurrency and Isolation ---

/// An echo service that prefixes instead of suffixing.
struct PrefixEcho;

impl RemoteObject for PrefixEcho {}

#[async_trait]
impl EchoService for PrefixEcho {
    async fn echo_string(&self, input: Option<String>) -> objwire::Result<Option<String>> {
        Ok(input.map(|input| format!("Result{}", input)))
    }
}

#[tokio::test]
async fn test_multiple_handler_instances() {
    let first = connect();

    init_tracing();
    let (client, server) =
        channel::pair(HandlerConfig::named("client-2"), HandlerConfig::named("server-2"));
    server.register_stub(Stub::new(Arc::new(PrefixEcho) as Arc<dyn EchoService>).with_id(7));

    let second = client.proxy::<dyn EchoService>(7);
    assert_eq!(
        second.echo_string(Some("World".into())).await.unwrap().as_deref(),
        Some("ResultWorld")
    );
    assert_eq!(second.echo_string(None).await.unwrap(), None);

    assert_eq!(
        first.echo.echo_string(Some("World".into())).await.unwrap().as_deref(),
        Some("WorldResult")
    );

    // instance ids belong to their own handler
    let err = first
        .client
        .proxy::<dyn EchoService>(7)
        .echo_string(None)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ExceptionKind::StubNotFound);
    let err = client.root::<dyn EchoService>().echo_string(None).await.unwrap_err();
    assert_eq!(err.kind(), ExceptionKind::StubNotFound);
}

fn random_words(count: usize) -> Vec<String> {
    let mut rng = rand::thread_rng();
    (0..count)
        .map(|_| {
            let len = rng.gen_range(1..16);
            (&mut rng).sample_iter(&Alphanumeric).take(len).map(char::from).collect()
        })
        .collect()
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_multiple_proxy() {
    let f = connect();
    let other = f.echo.get_echo_service().await.unwrap().unwrap();

    let tasks: Vec<_> = random_words(48)
        .into_iter()
        .enumerate()
        .map(|(i, word)| {
            let echo = if i % 2 == 0 { Arc::clone(&f.echo) } else { Arc::clone(&other) };
            tokio::spawn(async move {
                let reply = echo.echo_string(Some(word.clone())).await.unwrap();
                assert_eq!(reply, Some(format!("{}Result", word)));
                assert_eq!(echo.echo_string(None).await.unwrap(), None);
            })
        })
        .collect();

    for task in tasks {
        task.await.unwrap();
    }
    assert_eq!(f.client.pending_count(), 0);
}

#[tokio::test]
async fn test_service_without_listeners_does_not_fail() {
    let service = EchoServiceImpl::new();
    assert_eq!(service.echo_string(Some("a".into())).await.unwrap().as_deref(), Some("aResult"));
    service.no_argument_method().await.unwrap();
    assert_eq!(service.listener_count(), 0);
}
