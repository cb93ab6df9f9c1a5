//! The `fedrt` workspace's top-level crate: re-exports the core types, the
//! time-coordination/value/message runtime, and (with the `net` feature) the
//! broker/core transport layer, plus the connector and CLI built on top of them.
#![deny(clippy::all)]

pub mod connector;

#[cfg(feature = "runner")]
pub mod cli;

pub use fedrt_core::frame::{Action, ActionMessage, Flags};
pub use fedrt_core::{FederateId, InterfaceHandle, InterfaceKind, MessageId, RouteId, Time};
pub use fedrt_runtime::{
    AggregationMethod, AsyncTimeRequest, CallbackConfig, Federate, FederateConfig, FederateState,
    Input, IterationRequest, IterationResult, IterationState, MessageFederateManager, Publication,
    RuntimeError, TimeCoordinator, Value, ValueFederateManager, ValueKind,
};

#[cfg(feature = "net")]
pub use fedrt_net::{Broker, BrokerConfig, Core, HandleRegistry, NetError, RouteEntry};

/// Bridges a transport/routing failure into the runtime's own error taxonomy, at the
/// one point where a federate's core actually touches the network (spec.md §7).
#[cfg(feature = "net")]
impl From<fedrt_net::NetError> for RuntimeError {
    fn from(err: fedrt_net::NetError) -> Self {
        match err {
            fedrt_net::NetError::UnknownDest(id) => RuntimeError::UnknownDest(format!("{id:?}")),
            fedrt_net::NetError::InvalidAlias(name) => RuntimeError::InvalidAlias(name),
            fedrt_net::NetError::NameCollision(name) => RuntimeError::NameCollision(name),
            fedrt_net::NetError::Frame(_) | fedrt_net::NetError::TransportFailure | fedrt_net::NetError::Io(_) => {
                RuntimeError::TransportFailure
            }
        }
    }
}
