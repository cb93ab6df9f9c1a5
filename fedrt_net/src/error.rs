//! Transport- and routing-level errors. Mapped into `fedrt_runtime::RuntimeError` at
//! the federate boundary by the crate embedding both (spec.md §7).

use fedrt_core::frame::FrameError;

#[derive(Debug, thiserror::Error)]
pub enum NetError {
    #[error("malformed frame: {0}")]
    Frame(#[from] FrameError),

    #[error("no route to destination {0:?}")]
    UnknownDest(fedrt_core::FederateId),

    #[error("peer disconnected unexpectedly")]
    TransportFailure,

    #[error("alias cycle or depth overflow resolving '{0}'")]
    InvalidAlias(String),

    #[error("name collision: '{0}' is already registered")]
    NameCollision(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
