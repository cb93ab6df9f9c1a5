//! In-process transport: peers live in the same process and exchange frames through
//! lock-guarded channels keyed by endpoint name (spec.md §4.1 "In-process"). Used for
//! single-process federations (scenario S1-S3's default core type) and tests.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crossbeam_channel::{unbounded, Receiver, Sender};
use fedrt_core::frame::ActionMessage;
use fedrt_core::RouteId;
use tinymap::TinyMap;

use super::{Transport, Upcall};
use crate::NetError;

/// A process-wide directory mapping an endpoint name to its inbound sender. Every
/// `InProcessTransport` sharing one `Directory` can `connect` to any peer that has
/// `listen`ed under a given name.
pub type Directory = Arc<Mutex<HashMap<String, Sender<ActionMessage>>>>;

pub fn new_directory() -> Directory {
    Arc::new(Mutex::new(HashMap::new()))
}

pub struct InProcessTransport {
    directory: Directory,
    routes: TinyMap<RouteId, Sender<ActionMessage>>,
}

impl InProcessTransport {
    pub fn new(directory: Directory) -> Self {
        InProcessTransport { directory, routes: TinyMap::new() }
    }

    /// Registers `name` in the shared directory and spawns the background thread that
    /// drains this endpoint's inbound channel into `upcall`.
    pub fn listen(&self, name: impl Into<String>, upcall: Upcall) {
        let (tx, rx): (Sender<ActionMessage>, Receiver<ActionMessage>) = unbounded();
        self.directory.lock().unwrap().insert(name.into(), tx);
        std::thread::spawn(move || {
            while let Ok(frame) = rx.recv() {
                upcall(frame);
            }
        });
    }
}

impl Transport for InProcessTransport {
    async fn connect(&mut self, endpoint_spec: &str, _upcall: Upcall) -> Result<RouteId, NetError> {
        let sender = self
            .directory
            .lock()
            .unwrap()
            .get(endpoint_spec)
            .cloned()
            .ok_or(NetError::TransportFailure)?;
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
