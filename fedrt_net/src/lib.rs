//! Transport abstraction and adapters (spec.md §4.1), bounded buffers (§4.2), the
//! blocking priority queue (§4.3), the handle registry and name resolution (§4.4),
//! and the broker/core (§4.10).
#![deny(clippy::all)]

pub mod bincodec;
pub mod broker;
pub mod buffers;
pub mod codec;
pub mod error;
pub mod mpsc_sink;
pub mod registry;
pub mod transport;

pub use broker::{Broker, BrokerConfig, Core, RouteEntry};
pub use error::NetError;
pub use registry::{HandleRegistry, RegistrationEntry};
pub use transport::Transport;

pub use fedrt_core::frame::{Action, ActionMessage, Flags};
pub use fedrt_core::{FederateId, InterfaceHandle, InterfaceKind, MessageId, RouteId, Time};
