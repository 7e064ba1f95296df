// ── Runtime controller configuration ──
//
// Describes how to talk to gateways: call deadline, protocol names and
// event buffering. It never touches disk; `gwctl-config` builds one from
// files and environment and hands it in.

use std::time::Duration;

use gwctl_api::{ServiceNames, TransportConfig};

/// Session port the gateway management service listens on.
pub const DEFAULT_SESSION_PORT: u16 = 1020;

/// Configuration for one `GatewayController`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControllerConfig {
    /// Deadline for every gateway method call.
    pub call_timeout: Duration,
    /// Interface names and object-path prefix of the gateway agent.
    pub services: ServiceNames,
    pub session_port: u16,
    /// Capacity of the controller's event broadcast channel.
    pub event_channel_size: usize,
}

impl ControllerConfig {
    pub fn transport_config(&self) -> TransportConfig {
        TransportConfig {
            timeout: self.call_timeout,
        }
    }
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            call_timeout: Duration::from_secs(30),
            services: ServiceNames::default(),
            session_port: DEFAULT_SESSION_PORT,
            event_channel_size: 256,
        }
    }
}
