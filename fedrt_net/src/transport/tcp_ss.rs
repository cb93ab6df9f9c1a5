//! Single-socket TCP transport (spec.md §4.1 "TCP_SS"): every peer is multiplexed over
//! one connection, using `ActionMessage`'s own `source_id`/`dest_id` fields as the
//! routing key instead of one socket per peer. Cuts file-descriptor and handshake cost
//! for brokers with many children at the price of head-of-line blocking across peers.

use fedrt_core::frame::{Action, ActionMessage};
use fedrt_core::RouteId;
use futures::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio_util::codec::Framed;

use super::{Transport, Upcall};
use crate::codec::ActionCodec;
use crate::NetError;

/// `TCP_SS` has exactly one logical route: the shared socket. [`RouteId`] is still
/// returned from `connect` for API symmetry with the other transports, but every call
/// to `send` after the first resolves to the same underlying sink.
pub struct TcpSsTransport {
    sink: Option<mpsc::UnboundedSender<ActionMessage>>,
    route: Option<RouteId>,
}

impl Default for TcpSsTransport {
    fn default() -> Self {
        TcpSsTransport { sink: None, route: None }
    }
}

impl TcpSsTransport {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Transport for TcpSsTransport {
    async fn connect(&mut self, endpoint_spec: &str, upcall: Upcall) -> Result<RouteId, NetError> {
        if let Some(route) = self.route {
            return Ok(route);
        }

        let socket = TcpStream::connect(endpoint_spec).await?;
        let framed = Framed::new(socket, ActionCodec);
        let (mut write_half, mut read_half) = framed.split();
        let (tx, mut rx) = mpsc::unbounded_channel::<ActionMessage>();

        tokio::spawn(async move {
            while let Some(frame) = rx.recv().await {
                if let Err(err) = write_half.send(frame).await {
                    tracing::warn!(%err, "tcp_ss write failed");
                    break;
                }
            }
        });

        tokio::spawn(async move {
            while let Some(result) = read_half.next().await {
                match result {
                    Ok(frame) => upcall(frame),
                    Err(err) => {
                        tracing::warn!(%err, "tcp_ss read failed, synthesizing disconnect");
                        break;
                    }
                }
            }
            upcall(ActionMessage::new(Action::Disconnect));
        });

        let route = RouteId::from(0usize);
        self.sink = Some(tx);
        self.route = Some(route);
        Ok(route)
    }

    async fn send(&self, _route: RouteId, frame: ActionMessage) -> Result<(), NetError> {
        self.sink
            .as_ref()
            .ok_or(NetError::TransportFailure)?
            .send(frame)
            .map_err(|_| NetError::TransportFailure)
    }
}
