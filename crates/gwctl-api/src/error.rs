use thiserror::Error;

use crate::method::Method;

/// Top-level error type for the `gwctl-api` crate.
///
/// Covers every failure mode of a single request/reply round-trip:
/// the transport itself, the call deadline, and reply shapes that do not
/// match what the method promises. `gwctl-core` maps these into
/// user-facing diagnostics.
#[derive(Debug, Error)]
pub enum Error {
    // ── Transport ───────────────────────────────────────────────────
    /// The bus refused or lost the call (peer gone, routing failure, etc.)
    #[error("Bus transport error: {0}")]
    Transport(String),

    /// The session the call was issued on is no longer joined.
    #[error("Session {session_id} is not connected")]
    SessionLost { session_id: u32 },

    /// No reply arrived before the call deadline.
    #[error("Call to {method} timed out after {timeout_secs}s")]
    Timeout { method: Method, timeout_secs: u64 },

    // ── Reply shape ─────────────────────────────────────────────────
    /// The reply carried a different number of arguments than the method defines.
    #[error("{method} returned {got} reply arguments, expected {expected}")]
    UnexpectedArity {
        method: Method,
        expected: usize,
        got: usize,
    },

    /// A reply argument had the wrong type.
    #[error("Unexpected argument type: expected {expected}, got {got}")]
    ArgType {
        expected: &'static str,
        got: &'static str,
    },

    /// A reply argument had the right type but an unusable value.
    #[error("Malformed payload: {0}")]
    Malformed(String),
}

impl Error {
    /// Returns `true` if this error came from the transport rather than from
    /// the shape of a reply.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            Self::Transport(_) | Self::SessionLost { .. } | Self::Timeout { .. }
        )
    }

    /// Returns `true` if re-issuing the same call might succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Timeout { .. } | Self::Transport(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timeout_is_transient_transport_error() {
        let err = Error::Timeout {
            method: Method::GetAcl,
            timeout_secs: 5,
        };
        assert!(err.is_transport());
        assert!(err.is_transient());
        assert_eq!(err.to_string(), "Call to GetAcl timed out after 5s");
    }

    #[test]
    fn arity_error_is_not_transport() {
        let err = Error::UnexpectedArity {
            method: Method::ActivateAcl,
            expected: 1,
            got: 0,
        };
        assert!(!err.is_transport());
        assert_eq!(
            err.to_string(),
            "ActivateAcl returned 0 reply arguments, expected 1"
        );
    }

    #[test]
    fn lost_session_is_not_transient() {
        let err = Error::SessionLost { session_id: 7 };
        assert!(err.is_transport());
        assert!(!err.is_transient());
    }
}
