//! The error taxonomy of spec.md §7, as a single `thiserror` enum. Registration and
//! argument errors are returned directly to the caller (see each manager's methods);
//! time-coordination errors additionally drive the federate into [`crate::FederateState::Error`].

use fedrt_core::InterfaceHandle;

#[derive(Debug, thiserror::Error)]
pub enum RuntimeError {
    #[error("name collision: '{0}' is already registered")]
    NameCollision(String),

    #[error("send to unresolved destination '{0}'")]
    UnknownDest(String),

    #[error("incompatible units: cannot convert '{from}' to '{to}'")]
    UnitMismatch { from: String, to: String },

    #[error("payload for handle {0:?} did not parse to the requested type")]
    TypeCoercionFail(InterfaceHandle),

    #[error("alias cycle or depth overflow resolving '{0}'")]
    InvalidAlias(String),

    #[error("conflicting API call while an async operation is outstanding")]
    ConcurrentOperation,

    #[error("requestTime did not grant within the deadline")]
    Timeout,

    #[error("callback federate's user callback failed: {0}")]
    UserException(String),

    #[error("peer disconnected unexpectedly")]
    TransportFailure,

    #[error("NO_OP aggregation is not deterministic with more than one source for input '{0}'")]
    NonDeterministicAggregation(String),

    #[error("invalid state transition: {0}")]
    InvalidTransition(&'static str),

    #[error("interface '{0}' may not be registered while EXECUTING (federate is not dynamic)")]
    RegistrationAfterExecuting(String),
}
