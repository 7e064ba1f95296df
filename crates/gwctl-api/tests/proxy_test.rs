// Integration tests for `ProxyObject` call routing, arity checks and deadlines.

use std::sync::Mutex;
use std::time::Duration;

use gwctl_api::{
    Arg, BusTransport, Error, Method, MethodCall, Reply, ServiceNames, Session, TransportConfig,
};

// ── Helpers ─────────────────────────────────────────────────────────

/// Answers every call with a fixed reply and records what it was asked.
struct FixedTransport {
    reply: Reply,
    seen: Mutex<Vec<MethodCall>>,
}

impl FixedTransport {
    fn new(args: Vec<Arg>) -> Self {
        Self {
            reply: Reply::new(args),
            seen: Mutex::new(Vec::new()),
        }
    }
}

impl BusTransport for FixedTransport {
    async fn join_session(&self, _bus_name: &str, _port: u16) -> Result<u32, Error> {
        Ok(1)
    }

    async fn call(&self, call: MethodCall) -> Result<Reply, Error> {
        self.seen.lock().unwrap().push(call);
        Ok(self.reply.clone())
    }
}

/// Never answers.
struct SilentTransport;

impl BusTransport for SilentTransport {
    async fn join_session(&self, _bus_name: &str, _port: u16) -> Result<u32, Error> {
        std::future::pending::<()>().await;
        unreachable!()
    }

    async fn call(&self, _call: MethodCall) -> Result<Reply, Error> {
        std::future::pending::<()>().await;
        unreachable!()
    }
}

// ── Tests ───────────────────────────────────────────────────────────

#[tokio::test]
async fn test_call_is_addressed_from_session_and_proxy() {
    let transport = FixedTransport::new(vec![Arg::U16(0)]);
    let names = ServiceNames::default();
    let session = Session::new(&transport, 42, &names, &TransportConfig::default());

    let proxy = session.proxy(":gw.1", "/gw/app/acl1");
    let [code] = proxy
        .invoke::<1>(Method::ActivateAcl, Vec::new())
        .await
        .unwrap();
    assert_eq!(code.into_u16().unwrap(), 0);

    let seen = transport.seen.lock().unwrap();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].destination, ":gw.1");
    assert_eq!(seen[0].object_path, "/gw/app/acl1");
    assert_eq!(seen[0].session_id, 42);
    assert_eq!(seen[0].interface, "org.alljoyn.gwagent.ctrl.Acl");
    assert_eq!(seen[0].method, Method::ActivateAcl);
}

#[tokio::test]
async fn test_custom_interface_names_are_used() {
    let transport = FixedTransport::new(vec![Arg::AclInfos(Vec::new())]);
    let names = ServiceNames {
        app_interface: "com.example.gw.App".into(),
        ..ServiceNames::default()
    };
    let session = Session::new(&transport, 1, &names, &TransportConfig::default());

    session
        .proxy(":gw.1", "/gw/app")
        .invoke::<1>(Method::ListAcls, Vec::new())
        .await
        .unwrap();

    assert_eq!(
        transport.seen.lock().unwrap()[0].interface,
        "com.example.gw.App"
    );
}

#[tokio::test]
async fn test_wrong_reply_arity_fails_the_call() {
    let transport = FixedTransport::new(vec![Arg::U16(0), Arg::U16(0)]);
    let names = ServiceNames::default();
    let session = Session::new(&transport, 1, &names, &TransportConfig::default());

    let err = session
        .proxy(":gw.1", "/gw/app/acl1")
        .invoke::<1>(Method::GetAclStatus, Vec::new())
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        Error::UnexpectedArity {
            method: Method::GetAclStatus,
            expected: 1,
            got: 2
        }
    ));
}

#[tokio::test(start_paused = true)]
async fn test_silent_gateway_times_out() {
    let names = ServiceNames::default();
    let config = TransportConfig {
        timeout: Duration::from_secs(3),
    };
    let session = Session::new(&SilentTransport, 1, &names, &config);

    let err = session
        .proxy(":gw.1", "/gw/app/acl1")
        .call(Method::GetAcl, Vec::new())
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        Error::Timeout {
            method: Method::GetAcl,
            timeout_secs: 3
        }
    ));
}

#[tokio::test]
async fn test_immediate_reply_resolves_on_first_poll() {
    let transport = FixedTransport::new(vec![Arg::U16(1)]);
    let names = ServiceNames::default();
    let session = Session::new(&transport, 1, &names, &TransportConfig::default());
    let proxy = session.proxy(":gw.1", "/gw/app/acl1");

    let mut call = tokio_test::task::spawn(proxy.call(Method::GetAclStatus, Vec::new()));
    let reply = tokio_test::assert_ready_ok!(call.poll());
    assert_eq!(reply.args, vec![Arg::U16(1)]);
}
