//! 0MQ transport (spec.md §4.1 "0MQ"): a `DEALER` socket per peer connection. Not
//! grounded on any teacher/example repo — HELICS' own ZMQ core is the closest analogue
//! for this adapter's existence, so it is a pack-external addition (see DESIGN.md).
//! `zmq`'s sockets are not `Send`/`Sync` and block, so each one runs on its own OS
//! thread and is bridged to the async world through an unbounded channel.

use fedrt_core::frame::{Action, ActionMessage};
use fedrt_core::RouteId;
use tinymap::TinyMap;
use tokio::sync::mpsc;

use super::{Transport, Upcall};
use crate::NetError;

pub struct ZmqTransport {
    context: zmq::Context,
    routes: TinyMap<RouteId, mpsc::UnboundedSender<Vec<u8>>>,
}

impl ZmqTransport {
    pub fn new() -> Self {
        ZmqTransport { context: zmq::Context::new(), routes: TinyMap::new() }
    }
}

impl Default for ZmqTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl Transport for ZmqTransport {
    async fn connect(&mut self, endpoint_spec: &str, upcall: Upcall) -> Result<RouteId, NetError> {
        let socket = self.context.socket(zmq::DEALER).map_err(|_| NetError::TransportFailure)?;
        socket.connect(endpoint_spec).map_err(|_| NetError::TransportFailure)?;

        let (out_tx, mut out_rx) = mpsc::unbounded_channel::<Vec<u8>>();
        std::thread::spawn(move || {
            socket.set_rcvtimeo(200).ok();
            loop {
                // Drain any queued outbound frames without blocking the poll loop.
                while let Ok(bytes) = out_rx.try_recv() {
                    if socket.send(bytes, 0).is_err() {
                        tracing::warn!("zmq send failed");
                    }
                }
                match socket.recv_bytes(0) {
                    Ok(bytes) => {
                        let mut buf = bytes::BytesMut::from(&bytes[..]);
                        match ActionMessage::decode(&mut buf) {
                            Ok(Some(frame)) => upcall(frame),
                            Ok(None) => tracing::warn!("zmq message did not contain a full frame"),
                            Err(err) => tracing::warn!(%err, "failed to decode zmq message"),
                        }
                    }
                    Err(zmq::Error::EAGAIN) => continue,
                    Err(_) => {
                        upcall(ActionMessage::new(Action::Disconnect));
                        break;
                    }
                }
            }
        });

        Ok(self.routes.insert(out_tx))
    }

    async fn send(&self, route: RouteId, frame: ActionMessage) -> Result<(), NetError> {
        let mut buf = bytes::BytesMut::new();
        frame.encode(&mut buf);
        self.routes
            .get(route)
            .ok_or(NetError::TransportFailure)?
            .send(buf.to_vec())
            .map_err(|_| NetError::TransportFailure)
    }
}
