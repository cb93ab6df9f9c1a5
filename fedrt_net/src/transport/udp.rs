//! UDP transport (spec.md §4.1 "UDP"): one socket per core, addressed peers. Frames
//! must fit in a single datagram; there is no retransmission, matching HELICS' own UDP
//! adapter, which trades delivery guarantees for low latency on local-network fanouts.

use std::net::SocketAddr;
use std::sync::Arc;

use bytes::BytesMut;
use fedrt_core::frame::{Action, ActionMessage};
use fedrt_core::RouteId;
use tinymap::TinyMap;
use tokio::net::UdpSocket;

use super::{Transport, Upcall};
use crate::NetError;

const MAX_DATAGRAM: usize = 65_507;

pub struct UdpTransport {
    socket: Arc<UdpSocket>,
    routes: TinyMap<RouteId, SocketAddr>,
}

impl UdpTransport {
    pub async fn bind(addr: SocketAddr) -> Result<Self, NetError> {
        let socket = Arc::new(UdpSocket::bind(addr).await?);
        Ok(UdpTransport { socket, routes: TinyMap::new() })
    }

    /// Spawns the background receive loop. A read error, which for UDP effectively
    /// means the socket itself is gone, synthesizes a `DISCONNECT` and stops the loop.
    pub fn spawn_receiver(&self, upcall: Upcall) {
        let socket = self.socket.clone();
        tokio::spawn(async move {
            let mut buf = vec![0u8; MAX_DATAGRAM];
            loop {
                match socket.recv_from(&mut buf).await {
                    Ok((len, _peer)) => {
                        let mut bytes = BytesMut::from(&buf[..len]);
                        match ActionMessage::decode(&mut bytes) {
                            Ok(Some(frame)) => upcall(frame),
                            Ok(None) => tracing::warn!("udp datagram did not contain a full frame"),
                            Err(err) => tracing::warn!(%err, "failed to decode udp datagram"),
                        }
                    }
                    Err(err) => {
                        tracing::warn!(%err, "udp transport read failed, synthesizing disconnect");
                        upcall(ActionMessage::new(Action::Disconnect));
                        break;
                    }
                }
            }
        });
    }
}

impl Transport for UdpTransport {
    async fn connect(&mut self, endpoint_spec: &str, _upcall: Upcall) -> Result<RouteId, NetError> {
        let peer: SocketAddr = endpoint_spec
            .parse()
            .map_err(|_| NetError::InvalidAlias(endpoint_spec.to_owned()))?;
        Ok(self.routes.insert(peer))
    }

    async fn send(&self, route: RouteId, frame: ActionMessage) -> Result<(), NetError> {
        let peer = *self.routes.get(route).ok_or(NetError::TransportFailure)?;
        let mut buf = BytesMut::new();
        frame.encode(&mut buf);
        self.socket.send_to(&buf, peer).await?;
        Ok(())
    }
}
