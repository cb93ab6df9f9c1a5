//! Transport abstraction (spec.md §4.1): every adapter exposes `connect`, `send`, and
//! a background receive loop that hands parsed frames to an upcall. All adapters
//! preserve per-route FIFO order and synthesize a `DISCONNECT` frame on peer loss;
//! cores never branch on transport kind.

use std::sync::Arc;

use fedrt_core::frame::ActionMessage;
use fedrt_core::RouteId;

use crate::NetError;

#[cfg(feature = "inprocess")]
pub mod inprocess;
#[cfg(feature = "shm")]
pub mod shm;
#[cfg(feature = "tcp")]
pub mod tcp;
#[cfg(feature = "tcp")]
pub mod tcp_ss;
#[cfg(feature = "udp")]
pub mod udp;
#[cfg(feature = "zmq-transport")]
pub mod zmq_transport;

/// Receives one decoded frame per inbound delivery, including a synthesized
/// `DISCONNECT` on peer loss. Cloned freely across an adapter's background tasks.
pub type Upcall = Arc<dyn Fn(ActionMessage) + Send + Sync>;

/// The common contract every transport adapter satisfies (spec.md §4.1). A route once
/// opened preserves FIFO order and delivers frames atomically; adapters never reorder
/// or deduplicate.
pub trait Transport: Send {
    /// Opens a route to `endpoint_spec`, returning the assigned [`RouteId`]. Frames
    /// arriving on this route are handed to `upcall` from the adapter's own I/O task.
    async fn connect(&mut self, endpoint_spec: &str, upcall: Upcall) -> Result<RouteId, NetError>;

    /// Sends one frame down an already-open route.
    async fn send(&self, route: RouteId, frame: ActionMessage) -> Result<(), NetError>;
}
