//! TCP transport: one socket per peer, framed with [`ActionCodec`] (spec.md §4.1
//! "TCP"). Distinct from `TCP_SS`, which multiplexes every peer over one connection.

use std::net::SocketAddr;

use fedrt_core::frame::{Action, ActionMessage};
use fedrt_core::RouteId;
use futures::{SinkExt, StreamExt};
use tinymap::TinyMap;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio_util::codec::Framed;

use super::{Transport, Upcall};
use crate::codec::ActionCodec;
use crate::NetError;

pub struct TcpTransport {
    routes: TinyMap<RouteId, mpsc::UnboundedSender<ActionMessage>>,
}

impl Default for TcpTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl TcpTransport {
    pub fn new() -> Self {
        TcpTransport { routes: TinyMap::new() }
    }

    /// Accepts inbound connections on `addr` forever, spawning one reader/writer task
    /// pair per peer. Each accepted peer also gets a route registered so the core can
    /// reply on the same socket.
    pub async fn listen(&mut self, addr: SocketAddr, upcall: Upcall) -> Result<(), NetError> {
        let listener = TcpListener::bind(addr).await?;
        let routes = &mut self.routes;
        loop {
            let (socket, peer) = listener.accept().await?;
            tracing::debug!(%peer, "accepted tcp transport connection");
            let route = routes.insert(Self::spawn_connection(socket, upcall.clone()));
            tracing::debug!(?route, %peer, "registered inbound route");
        }
    }

    /// Opens one outbound connection to `endpoint_spec` (a `host:port` string).
    async fn connect_inner(endpoint_spec: &str, upcall: Upcall) -> Result<mpsc::UnboundedSender<ActionMessage>, NetError> {
        let socket = TcpStream::connect(endpoint_spec).await?;
        Ok(Self::spawn_connection(socket, upcall))
    }

    /// Splits `socket` into reader/writer halves, spawning a task for each. The reader
    /// synthesizes a `DISCONNECT` frame on read error or stream end; the writer task
    /// drains `tx`'s paired receiver until every sender is dropped.
    fn spawn_connection(socket: TcpStream, upcall: Upcall) -> mpsc::UnboundedSender<ActionMessage> {
        let framed = Framed::new(socket, ActionCodec);
        let (mut sink, mut stream) = framed.split();
        let (tx, mut rx) = mpsc::unbounded_channel::<ActionMessage>();

        tokio::spawn(async move {
            while let Some(frame) = rx.recv().await {
                if let Err(err) = sink.send(frame).await {
                    tracing::warn!(%err, "tcp transport write failed");
                    break;
                }
            }
            let _ = sink.close().await;
        });

        tokio::spawn(async move {
            while let Some(result) = stream.next().await {
                match result {
                    Ok(frame) => upcall(frame),
                    Err(err) => {
                        tracing::warn!(%err, "tcp transport read failed, synthesizing disconnect");
                        break;
                    }
                }
            }
            upcall(ActionMessage::new(Action::Disconnect));
        });

        tx
    }
}

impl Transport for TcpTransport {
    async fn connect(&mut self, endpoint_spec: &str, upcall: Upcall) -> Result<RouteId, NetError> {
        let sender = Self::connect_inner(endpoint_spec, upcall).await?;
        Ok(self.routes.insert(sender))
    }

    async fn send(&self, route: RouteId, frame: ActionMessage) -> Result<(), NetError> {
        self.routes
            .get(route)
            .ok_or(NetError::TransportFailure)?
            .send(frame)
            .map_err(|_| NetError::TransportFailure)
    }
}
