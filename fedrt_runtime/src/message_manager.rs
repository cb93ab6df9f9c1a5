//! The message federate manager: endpoints, filters, and message queues (spec.md §4.6).

use std::collections::{HashMap, VecDeque};

use fedrt_core::InterfaceHandle;
use tinymap::TinyMap;

use crate::{RuntimeError, Time};

/// A message in flight or pending delivery.
#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    pub source: String,
    pub destination: String,
    /// Preserved across cloning filters even if `source`/`destination` are rewritten en route.
    pub original_source: String,
    pub original_destination: String,
    pub send_time: Time,
    pub action_time: Time,
    pub payload: Vec<u8>,
}

/// Whether an endpoint accepts sends to any named destination or only to its
/// pre-declared peers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndpointKind {
    Untargeted,
    Targeted,
}

#[derive(Debug, Clone)]
pub struct Endpoint {
    pub name: String,
    pub kind: EndpointKind,
    pub targets: Vec<String>,
    queue: VecDeque<Message>,
    pending_unresolved: Vec<Message>,
}

impl Endpoint {
    fn new(name: String, kind: EndpointKind) -> Self {
        Endpoint { name, kind, targets: Vec::new(), queue: VecDeque::new(), pending_unresolved: Vec::new() }
    }

    fn permits(&self, dest: &str) -> bool {
        match self.kind {
            EndpointKind::Untargeted => true,
            EndpointKind::Targeted => self.targets.iter().any(|t| t == dest),
        }
    }
}

/// A cloning filter observing traffic through one endpoint (spec.md §4.6: "cloning only").
#[derive(Debug, Clone)]
pub struct Filter {
    pub name: String,
    pub observed_endpoint: String,
    clones: VecDeque<Message>,
}

/// Owns a federate's endpoints, their queues, and cloning filters.
#[derive(Debug, Default)]
pub struct MessageFederateManager {
    endpoints: TinyMap<InterfaceHandle, Endpoint>,
    endpoint_names: HashMap<String, InterfaceHandle>,
    filters: TinyMap<InterfaceHandle, Filter>,
    destinations_resolved: bool,
}

impl MessageFederateManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_endpoint(
        &mut self,
        name: impl Into<String>,
        kind: EndpointKind,
    ) -> Result<InterfaceHandle, RuntimeError> {
        let name = name.into();
        if self.endpoint_names.contains_key(&name) {
            return Err(RuntimeError::NameCollision(name));
        }
        let handle = self.endpoints.insert(Endpoint::new(name.clone(), kind));
        self.endpoint_names.insert(name, handle);
        Ok(handle)
    }

    pub fn register_filter(
        &mut self,
        name: impl Into<String>,
        observed_endpoint: impl Into<String>,
    ) -> InterfaceHandle {
        self.filters.insert(Filter { name: name.into(), observed_endpoint: observed_endpoint.into(), clones: VecDeque::new() })
    }

    pub fn add_destination(&mut self, endpoint: InterfaceHandle, dest: impl Into<String>) -> Result<(), RuntimeError> {
        let dest = dest.into();
        let ep = self.endpoints.get_mut(endpoint).ok_or_else(|| RuntimeError::UnknownDest(dest.clone()))?;
        ep.targets.push(dest);
        Ok(())
    }

    /// Marks name resolution closed; called on `enterExecutingMode` (spec.md §4.6).
    pub fn close_name_resolution(&mut self) {
        self.destinations_resolved = true;
    }

    /// `send(endpoint, dest, payload, [delay])`.
    pub fn send(
        &mut self,
        endpoint: InterfaceHandle,
        dest: impl Into<String>,
        payload: Vec<u8>,
        current_time: Time,
        delay: Time,
    ) -> Result<(), RuntimeError> {
        let dest = dest.into();
        let source_name;
        {
            let ep = self.endpoints.get(endpoint).ok_or_else(|| RuntimeError::UnknownDest(dest.clone()))?;
            if !ep.permits(&dest) {
                return Err(RuntimeError::UnknownDest(dest));
            }
            source_name = ep.name.clone();
        }

        let resolved = self.endpoint_names.contains_key(&dest);
        let message = Message {
            source: source_name.clone(),
            destination: dest.clone(),
            original_source: source_name,
            original_destination: dest.clone(),
            send_time: current_time,
            action_time: current_time.saturating_add(delay),
            payload,
        };

        if !resolved && !self.destinations_resolved {
            let ep = self.endpoints.get_mut(endpoint).expect("checked above");
            ep.pending_unresolved.push(message);
            return Ok(());
        }
        if !resolved {
            return Err(RuntimeError::UnknownDest(dest));
        }

        self.clone_through_filters(&message);
        let target = *self.endpoint_names.get(&dest).expect("resolved above");
        let ep = self.endpoints.get_mut(target).expect("endpoint_names is kept in sync");
        ep.queue.push_back(message);
        Ok(())
    }

    fn clone_through_filters(&mut self, message: &Message) {
        for filter in self.filters.values_mut() {
            if filter.observed_endpoint == message.source || filter.observed_endpoint == message.destination {
                filter.clones.push_back(message.clone());
            }
        }
    }

    /// Replays any sends queued before their destination was resolved. Call once on
    /// `enterExecutingMode`, after [`MessageFederateManager::close_name_resolution`].
    pub fn flush_pending(&mut self) -> Vec<(String, RuntimeError)> {
        let mut failures = Vec::new();
        let handles: Vec<InterfaceHandle> = self.endpoints.keys().collect();
        for handle in handles {
            let pending = std::mem::take(&mut self.endpoints.get_mut(handle).expect("from keys()").pending_unresolved);
            for message in pending {
                if let Some(&target) = self.endpoint_names.get(&message.destination) {
                    self.clone_through_filters(&message);
                    self.endpoints.get_mut(target).expect("endpoint_names is kept in sync").queue.push_back(message);
                } else {
                    failures.push((message.destination.clone(), RuntimeError::UnknownDest(message.destination)));
                }
            }
        }
        failures
    }

    pub fn has_message(&self, endpoint: InterfaceHandle, current_time: Time) -> bool {
        self.endpoints
            .get(endpoint)
            .map(|ep| ep.queue.front().map(|m| m.action_time <= current_time).unwrap_or(false))
            .unwrap_or(false)
    }

    /// Returns the oldest delivered message at or before `current_time`, if any.
    pub fn get_message(&mut self, endpoint: InterfaceHandle, current_time: Time) -> Option<Message> {
        let ep = self.endpoints.get_mut(endpoint)?;
        if ep.queue.front()?.action_time <= current_time {
            ep.queue.pop_front()
        } else {
            None
        }
    }

    pub fn get_clone(&mut self, filter: InterfaceHandle) -> Option<Message> {
        self.filters.get_mut(filter)?.clones.pop_front()
    }

    pub fn endpoint_handle(&self, name: &str) -> Option<InterfaceHandle> {
        self.endpoint_names.get(name).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn direct_send_and_receive() {
        let mut mgr = MessageFederateManager::new();
        let a = mgr.register_endpoint("a", EndpointKind::Untargeted).unwrap();
        mgr.register_endpoint("b", EndpointKind::Untargeted).unwrap();
        let b = mgr.endpoint_handle("b").unwrap();
        mgr.send(a, "b", b"hi".to_vec(), Time::ZERO, Time::from_ticks(5)).unwrap();
        assert!(!mgr.has_message(b, Time::from_ticks(4)));
        assert!(mgr.has_message(b, Time::from_ticks(5)));
        let m = mgr.get_message(b, Time::from_ticks(5)).unwrap();
        assert_eq!(m.payload, b"hi");
        assert_eq!(m.action_time, Time::from_ticks(5));
    }

    #[test]
    fn unresolved_destination_is_held_then_fails_after_executing() {
        let mut mgr = MessageFederateManager::new();
        let a = mgr.register_endpoint("a", EndpointKind::Untargeted).unwrap();
        mgr.send(a, "ghost", vec![], Time::ZERO, Time::ZERO).unwrap();
        mgr.close_name_resolution();
        let failures = mgr.flush_pending();
        assert_eq!(failures.len(), 1);
    }

    #[test]
    fn targeted_endpoint_rejects_unlisted_dest() {
        let mut mgr = MessageFederateManager::new();
        let a = mgr.register_endpoint("a", EndpointKind::Targeted).unwrap();
        mgr.register_endpoint("b", EndpointKind::Untargeted).unwrap();
        assert!(mgr.send(a, "b", vec![], Time::ZERO, Time::ZERO).is_err());
        mgr.add_destination(a, "b").unwrap();
        assert!(mgr.send(a, "b", vec![], Time::ZERO, Time::ZERO).is_ok());
    }

    #[test]
    fn cloning_filter_observes_without_affecting_delivery() {
        let mut mgr = MessageFederateManager::new();
        let a = mgr.register_endpoint("a", EndpointKind::Untargeted).unwrap();
        mgr.register_endpoint("b", EndpointKind::Untargeted).unwrap();
        let filter = mgr.register_filter("f", "a");
        mgr.send(a, "b", b"payload".to_vec(), Time::ZERO, Time::ZERO).unwrap();
        let clone = mgr.get_clone(filter).unwrap();
        assert_eq!(clone.payload, b"payload");
        let b = mgr.endpoint_handle("b").unwrap();
        let delivered = mgr.get_message(b, Time::ZERO).unwrap();
        assert_eq!(delivered.payload, b"payload");
    }
}
