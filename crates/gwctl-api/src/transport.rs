// ── Request/reply transport seam ──
//
// The bus itself (discovery, marshaling) lives outside this workspace. It
// is reached through `BusTransport`: joining a gateway's session and one
// async request/reply primitive. `Session` and `ProxyObject` add the
// addressing and the call deadline on top of it.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, trace};

use crate::arg::{Arg, Reply};
use crate::error::Error;
use crate::method::{Method, ServiceNames};

/// Identifier of a joined session with one gateway.
pub type SessionId = u32;

/// Port a gateway's management service accepts sessions on.
pub type SessionPort = u16;

/// A fully addressed method call, ready for the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodCall {
    /// Unique bus name of the gateway.
    pub destination: String,
    pub object_path: String,
    pub session_id: SessionId,
    pub interface: String,
    pub method: Method,
    pub args: Vec<Arg>,
}

/// Request/reply primitive provided by the bus glue.
///
/// Implementations deliver the call, wait for the reply and hand back its
/// arguments already unmarshaled. Transport failures surface as `Err`; the
/// core never retries on its own.
pub trait BusTransport: Send + Sync {
    /// Join a session with `bus_name` on `port`.
    fn join_session(
        &self,
        bus_name: &str,
        port: SessionPort,
    ) -> impl Future<Output = Result<SessionId, Error>> + Send;

    fn call(&self, call: MethodCall) -> impl Future<Output = Result<Reply, Error>> + Send;
}

impl<T: BusTransport> BusTransport for Arc<T> {
    fn join_session(
        &self,
        bus_name: &str,
        port: SessionPort,
    ) -> impl Future<Output = Result<SessionId, Error>> + Send {
        (**self).join_session(bus_name, port)
    }

    fn call(&self, call: MethodCall) -> impl Future<Output = Result<Reply, Error>> + Send {
        (**self).call(call)
    }
}

/// Call tuning shared by every proxy built from a session.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    pub timeout: Duration,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
        }
    }
}

// ── Session ─────────────────────────────────────────────────────────

/// A joined session with one gateway: transport handle, session id,
/// service names and the per-call deadline.
pub struct Session<'a, T> {
    transport: &'a T,
    id: SessionId,
    names: &'a ServiceNames,
    timeout: Duration,
}

impl<T> Clone for Session<'_, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Session<'_, T> {}

impl<'a, T: BusTransport> Session<'a, T> {
    pub fn new(
        transport: &'a T,
        id: SessionId,
        names: &'a ServiceNames,
        config: &TransportConfig,
    ) -> Self {
        Self {
            transport,
            id,
            names,
            timeout: config.timeout,
        }
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn names(&self) -> &'a ServiceNames {
        self.names
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Address a remote object on this session.
    pub fn proxy<'s>(&'s self, bus_name: &'s str, object_path: &'s str) -> ProxyObject<'s, T> {
        ProxyObject {
            transport: self.transport,
            names: self.names,
            session_id: self.id,
            timeout: self.timeout,
            bus_name,
            object_path,
        }
    }
}

// ── ProxyObject ─────────────────────────────────────────────────────

/// A remote object reachable over a session.
pub struct ProxyObject<'s, T> {
    transport: &'s T,
    names: &'s ServiceNames,
    session_id: SessionId,
    timeout: Duration,
    bus_name: &'s str,
    object_path: &'s str,
}

impl<T: BusTransport> ProxyObject<'_, T> {
    pub fn object_path(&self) -> &str {
        self.object_path
    }

    /// Issue `method` and wait for its reply, bounded by the session deadline.
    pub async fn call(&self, method: Method, args: Vec<Arg>) -> Result<Reply, Error> {
        let call = MethodCall {
            destination: self.bus_name.to_owned(),
            object_path: self.object_path.to_owned(),
            session_id: self.session_id,
            interface: self.names.interface_name(method.interface()).to_owned(),
            method,
            args,
        };
        trace!(%method, object_path = %self.object_path, "issuing method call");

        match tokio::time::timeout(self.timeout, self.transport.call(call)).await {
            Ok(Ok(reply)) => Ok(reply),
            Ok(Err(e)) => {
                debug!(%method, object_path = %self.object_path, error = %e, "method call failed");
                Err(e)
            }
            Err(_) => Err(Error::Timeout {
                method,
                timeout_secs: self.timeout.as_secs(),
            }),
        }
    }

    /// Issue `method` and destructure a reply of exactly `N` arguments.
    pub async fn invoke<const N: usize>(
        &self,
        method: Method,
        args: Vec<Arg>,
    ) -> Result<[Arg; N], Error> {
        self.call(method, args).await?.into_exact::<N>(method)
    }
}
