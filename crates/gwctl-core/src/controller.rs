// ── Gateway controller ──
//
// Explicit context object holding the transport, the configuration and
// every known gateway. Bus glue reports discovery and status signals
// here; consumers observe them through the event channel.

use std::sync::Arc;

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use gwctl_api::{BusTransport, Session, SessionId, TransportConfig};
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use crate::config::ControllerConfig;
use crate::error::CoreError;
use crate::gateway::Gateway;
use crate::model::{AboutData, AclStatus};

// ── ControllerEvent ─────────────────────────────────────────────────

/// Notifications published by a [`GatewayController`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControllerEvent {
    GatewayAdded { bus_name: String },
    GatewayRemoved { bus_name: String },
    AclStatusChanged {
        bus_name: String,
        acl_id: String,
        status: AclStatus,
    },
}

// ── GatewayController ───────────────────────────────────────────────

/// Entry point for consumers.
///
/// Cheaply cloneable via `Arc<ControllerInner>`. Any number of
/// independent controllers may coexist; dropping the last clone drops
/// every gateway, connector app and ACL it holds.
pub struct GatewayController<T> {
    inner: Arc<ControllerInner<T>>,
}

impl<T> Clone for GatewayController<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

struct ControllerInner<T> {
    config: ControllerConfig,
    transport_config: TransportConfig,
    transport: T,
    gateways: DashMap<String, Arc<Gateway>>,
    event_tx: broadcast::Sender<ControllerEvent>,
}

impl<T: BusTransport> GatewayController<T> {
    pub fn new(config: ControllerConfig, transport: T) -> Self {
        let (event_tx, _) = broadcast::channel(config.event_channel_size.max(1));
        Self {
            inner: Arc::new(ControllerInner {
                transport_config: config.transport_config(),
                config,
                transport,
                gateways: DashMap::new(),
                event_tx,
            }),
        }
    }

    pub fn config(&self) -> &ControllerConfig {
        &self.inner.config
    }

    pub fn transport(&self) -> &T {
        &self.inner.transport
    }

    /// Subscribe to the event broadcast stream.
    pub fn subscribe(&self) -> broadcast::Receiver<ControllerEvent> {
        self.inner.event_tx.subscribe()
    }

    fn emit(&self, event: ControllerEvent) {
        // No subscribers is not an error.
        let _ = self.inner.event_tx.send(event);
    }

    /// Register a gateway discovered on the bus.
    ///
    /// A bus name that is already known returns the existing gateway and
    /// emits nothing.
    pub fn add_gateway(&self, bus_name: &str, about: &AboutData) -> Arc<Gateway> {
        let gateway = match self.inner.gateways.entry(bus_name.to_owned()) {
            Entry::Occupied(existing) => {
                debug!(bus_name, "gateway already registered");
                return Arc::clone(existing.get());
            }
            Entry::Vacant(slot) => {
                let gateway = Arc::new(Gateway::new(
                    bus_name,
                    about.device_name.as_str(),
                    about.app_name.as_str(),
                ));
                slot.insert(Arc::clone(&gateway));
                gateway
            }
        };

        info!(bus_name, device_name = %about.device_name, "gateway added");
        self.emit(ControllerEvent::GatewayAdded {
            bus_name: bus_name.to_owned(),
        });
        gateway
    }

    /// Forget a gateway together with its connector apps and ACLs.
    pub fn remove_gateway(&self, bus_name: &str) -> Option<Arc<Gateway>> {
        let (_, gateway) = self.inner.gateways.remove(bus_name)?;
        info!(bus_name, "gateway removed");
        self.emit(ControllerEvent::GatewayRemoved {
            bus_name: bus_name.to_owned(),
        });
        Some(gateway)
    }

    pub fn gateway(&self, bus_name: &str) -> Option<Arc<Gateway>> {
        self.inner
            .gateways
            .get(bus_name)
            .map(|entry| Arc::clone(entry.value()))
    }

    pub fn require_gateway(&self, bus_name: &str) -> Result<Arc<Gateway>, CoreError> {
        self.gateway(bus_name)
            .ok_or_else(|| CoreError::GatewayNotFound {
                bus_name: bus_name.to_owned(),
            })
    }

    /// All known gateways, ordered by bus name.
    pub fn gateways(&self) -> Vec<Arc<Gateway>> {
        let mut gateways: Vec<_> = self
            .inner
            .gateways
            .iter()
            .map(|entry| Arc::clone(entry.value()))
            .collect();
        gateways.sort_by(|a, b| a.bus_name().cmp(b.bus_name()));
        gateways
    }

    /// Forward an ACL status signal from the bus to subscribers.
    pub fn notify_acl_status(
        &self,
        bus_name: &str,
        acl_id: &str,
        status: AclStatus,
    ) -> Result<(), CoreError> {
        self.require_gateway(bus_name)?;
        debug!(bus_name, acl_id, %status, "ACL status signal");
        self.emit(ControllerEvent::AclStatusChanged {
            bus_name: bus_name.to_owned(),
            acl_id: acl_id.to_owned(),
            status,
        });
        Ok(())
    }

    /// Join the management session of a known gateway on the configured
    /// session port. A gateway that already has a session keeps it.
    pub async fn join_session(&self, bus_name: &str) -> Result<SessionId, CoreError> {
        let gateway = self.require_gateway(bus_name)?;
        if let Some(session_id) = gateway.session_id() {
            debug!(bus_name, session_id, "session already joined");
            return Ok(session_id);
        }

        let port = self.inner.config.session_port;
        let timeout = self.inner.config.call_timeout;
        let joined = tokio::time::timeout(timeout, self.inner.transport.join_session(bus_name, port))
            .await
            .map_err(|_| CoreError::Timeout {
                timeout_secs: timeout.as_secs(),
            })?;
        let session_id = joined.map_err(|e| {
            warn!(bus_name, port, error = %e, "unable to join session");
            CoreError::from(e)
        })?;

        gateway.set_session_id(session_id);
        info!(bus_name, session_id, "session joined");
        Ok(session_id)
    }

    /// Bind a joined session with a known gateway for issuing calls.
    pub fn session(
        &self,
        bus_name: &str,
        session_id: SessionId,
    ) -> Result<Session<'_, T>, CoreError> {
        self.require_gateway(bus_name)?;
        Ok(Session::new(
            &self.inner.transport,
            session_id,
            &self.inner.config.services,
            &self.inner.transport_config,
        ))
    }
}
