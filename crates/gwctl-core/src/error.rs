// ── Core error types ──
//
// User-facing errors from gwctl-core. Consumers never see reply arity or
// argument shapes directly: the `From<gwctl_api::Error>` impl translates
// transport-layer errors into domain-appropriate variants.

use thiserror::Error;

use crate::model::AclResponseCode;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Transport errors ─────────────────────────────────────────────
    #[error("Gateway call timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    #[error("Gateway unreachable: {message}")]
    Transport { message: String },

    #[error("Malformed reply to {method}: {message}")]
    MalformedReply { method: String, message: String },

    // ── Data errors ──────────────────────────────────────────────────
    #[error("Gateway not found: {bus_name}")]
    GatewayNotFound { bus_name: String },

    #[error("Connector app not found: {app_id}")]
    ConnectorAppNotFound { app_id: String },

    #[error("ACL not found: {acl_id}")]
    AclNotFound { acl_id: String },

    // ── Operation errors ─────────────────────────────────────────────
    #[error("Operation failed: {message}")]
    OperationFailed { message: String },
}

impl CoreError {
    /// The response code a caller should see for this failure.
    ///
    /// Every local failure maps to `Invalid`, so a code is never left unset.
    #[allow(clippy::unused_self)]
    pub fn response_code(&self) -> AclResponseCode {
        AclResponseCode::Invalid
    }

    pub(crate) fn malformed(method: gwctl_api::Method, message: impl Into<String>) -> Self {
        Self::MalformedReply {
            method: method.to_string(),
            message: message.into(),
        }
    }
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<gwctl_api::Error> for CoreError {
    fn from(err: gwctl_api::Error) -> Self {
        match err {
            gwctl_api::Error::Transport(message) => CoreError::Transport { message },
            gwctl_api::Error::SessionLost { session_id } => CoreError::Transport {
                message: format!("session {session_id} is no longer joined"),
            },
            gwctl_api::Error::Timeout { timeout_secs, .. } => CoreError::Timeout { timeout_secs },
            gwctl_api::Error::UnexpectedArity {
                method,
                expected,
                got,
            } => CoreError::MalformedReply {
                method: method.to_string(),
                message: format!("expected {expected} reply arguments, got {got}"),
            },
            gwctl_api::Error::ArgType { expected, got } => CoreError::MalformedReply {
                method: "reply".into(),
                message: format!("expected {expected}, got {got}"),
            },
            gwctl_api::Error::Malformed(message) => CoreError::MalformedReply {
                method: "reply".into(),
                message,
            },
        }
    }
}
