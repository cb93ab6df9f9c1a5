//! Broker & Core (spec.md §4.10): the routing node and the federate-side endpoint that
//! shares its `ActionMessage` routing code. A `Broker` owns zero or more children and at
//! most one parent; the root broker is the one with no parent and is the sole assigner
//! of global `FederateId`/`InterfaceHandle`s. A `Core` is a leaf: it owns the local
//! federate registry and one link upward to its broker.
//!
//! Both types are transport-generic and deliberately side-effect-free in their state
//! transitions: `handle_frame` takes one inbound frame and returns the list of outbound
//! frames it provokes, so the routing logic can be exercised without a live transport.

use std::collections::HashMap;
use std::sync::mpsc as std_mpsc;

use fedrt_core::frame::{Action, ActionMessage, Flags};
use fedrt_core::{FederateId, InterfaceHandle, InterfaceKind, MessageId, RouteId, Time};
use fedrt_runtime::{DependencyReport, Federate, FederateConfig, IterationRequest, RuntimeError};
use tokio::sync::mpsc as tokio_mpsc;

use crate::bincodec;
use crate::registry::HandleRegistry;
use crate::transport::Transport;
use crate::NetError;

/// One entry of a broker's destination routing table: the live route a given federate
/// is currently reachable through.
#[derive(Debug, Clone, Copy)]
pub struct RouteEntry {
    pub federate: FederateId,
    pub route: RouteId,
}

#[derive(Debug, Clone)]
pub struct BrokerConfig {
    pub name: String,
    /// A root broker has no parent and is the authority for global handle assignment.
    pub is_root: bool,
    /// Whether this broker may itself spawn a parent broker on demand (spec.md §4.10
    /// "autobroker"). `Broker` only records the flag; spawning is the CLI's job.
    pub autobroker: bool,
}

struct PendingQuery {
    /// Route the original `Query` frame arrived on, so the synthesized answer can be
    /// routed back once every child has replied (or the wait times out upstream).
    origin: RouteId,
    remaining: usize,
    replies: Vec<(RouteId, Vec<u8>)>,
}

/// A routing node: owns no federate state of its own, only the tables needed to
/// forward `ActionMessage`s toward their destination (spec.md §4.10).
pub struct Broker {
    config: BrokerConfig,
    registry: HandleRegistry,
    children: Vec<RouteId>,
    parent_route: Option<RouteId>,
    routes_by_federate: HashMap<FederateId, RouteId>,
    /// `message_id -> child route` for requests this broker forwarded toward its
    /// parent, so the eventual reply can be routed back down to the right child.
    pending_upward: HashMap<MessageId, RouteId>,
    pending_queries: HashMap<u64, PendingQuery>,
    next_federate_id: usize,
    next_interface_handle: usize,
    next_query_id: u64,
}

impl Broker {
    pub fn new(config: BrokerConfig, parent_route: Option<RouteId>) -> Self {
        Broker {
            config,
            registry: HandleRegistry::new(),
            children: Vec::new(),
            parent_route,
            routes_by_federate: HashMap::new(),
            pending_upward: HashMap::new(),
            pending_queries: HashMap::new(),
            next_federate_id: 1,
            next_interface_handle: 1,
            next_query_id: 1,
        }
    }

    pub fn is_root(&self) -> bool {
        self.config.is_root
    }

    fn parent_or_err(&self) -> Result<RouteId, NetError> {
        self.parent_route.ok_or(NetError::TransportFailure)
    }

    /// Processes one inbound frame arriving on `from`, returning the `(route, frame)`
    /// pairs it provokes. Never blocks and never touches a transport directly, so the
    /// dispatcher thread described in spec.md §5 is free to own this call exclusively.
    pub fn handle_frame(&mut self, from: RouteId, frame: ActionMessage) -> Result<Vec<(RouteId, ActionMessage)>, NetError> {
        match frame.action {
            Action::RegisterCore | Action::RegisterBroker => self.handle_register_link(from, frame),
            Action::RegisterFederate => self.handle_register_federate(from, frame),
            Action::RegisterPublication => self.handle_register_interface(from, frame, InterfaceKind::Publication),
            Action::RegisterInput => self.handle_register_interface(from, frame, InterfaceKind::Input),
            Action::RegisterEndpoint => self.handle_register_interface(from, frame, InterfaceKind::Endpoint),
            Action::AddAlias => self.handle_add_alias(from, frame),
            Action::Data | Action::Message | Action::TimeRequest | Action::TimeGrant | Action::ExecRequest | Action::ExecGrant => {
                self.route_to_destination(from, frame)
            }
            Action::Query => self.handle_query(from, frame),
            Action::QueryReply => self.handle_query_reply(from, frame),
            Action::Disconnect => Ok(self.handle_disconnect(from)),
            Action::Terminate => Ok(self.cascade_to_children(frame)),
            Action::FilterClone | Action::Command | Action::ErrorMsg | Action::AddTarget => self.route_to_destination(from, frame),
        }
    }

    fn handle_register_link(&mut self, from: RouteId, frame: ActionMessage) -> Result<Vec<(RouteId, ActionMessage)>, NetError> {
        if !self.children.contains(&from) {
            self.children.push(from);
        }
        if self.config.is_root {
            return Ok(Vec::new());
        }
        Ok(vec![(self.parent_or_err()?, frame)])
    }

    fn handle_register_federate(&mut self, from: RouteId, frame: ActionMessage) -> Result<Vec<(RouteId, ActionMessage)>, NetError> {
        let name: String = bincodec::deserialize(&frame.payload).map_err(|_| NetError::TransportFailure)?;

        if self.config.is_root {
            let id = FederateId::from(self.next_federate_id);
            self.next_federate_id += 1;
            self.registry.register_federate(name.clone(), id)?;
            self.routes_by_federate.insert(id, from);

            let mut reply = ActionMessage::new(Action::RegisterFederate);
            reply.dest_id = id;
            reply.payload = bincodec::serialize(&name).map_err(|_| NetError::TransportFailure)?;
            return Ok(vec![(from, reply)]);
        }

        self.pending_upward.insert(frame.message_id, from);
        Ok(vec![(self.parent_or_err()?, frame)])
    }

    fn handle_register_interface(
        &mut self,
        from: RouteId,
        frame: ActionMessage,
        kind: InterfaceKind,
    ) -> Result<Vec<(RouteId, ActionMessage)>, NetError> {
        let name: String = bincodec::deserialize(&frame.payload).map_err(|_| NetError::TransportFailure)?;

        if self.config.is_root {
            let handle = InterfaceHandle::from(self.next_interface_handle);
            self.next_interface_handle += 1;
            self.registry.register_interface(name.clone(), frame.source_id, handle, kind)?;

            let mut reply = frame.clone();
            reply.dest_handle = handle;
            return Ok(vec![(from, reply)]);
        }

        self.pending_upward.insert(frame.message_id, from);
        Ok(vec![(self.parent_or_err()?, frame)])
    }

    fn handle_add_alias(&mut self, from: RouteId, frame: ActionMessage) -> Result<Vec<(RouteId, ActionMessage)>, NetError> {
        if self.config.is_root {
            let (alias, canonical): (String, String) =
                bincodec::deserialize(&frame.payload).map_err(|_| NetError::TransportFailure)?;
            if alias.starts_with("REGEX:") {
                self.registry.add_pattern_alias(alias.trim_start_matches("REGEX:"), canonical)?;
            } else {
                self.registry.add_alias(alias, canonical)?;
            }
            return Ok(Vec::new());
        }
        Ok(vec![(self.parent_or_err()?, frame)])
    }

    /// Looks up the live route for `frame.dest_id`, forwarding up the tree when this
    /// broker doesn't know it yet; the root replies `ErrorMsg`/unknown-dest if even it
    /// has no route, matching spec.md §7's `UnknownDestination` condition.
    fn route_to_destination(&mut self, from: RouteId, frame: ActionMessage) -> Result<Vec<(RouteId, ActionMessage)>, NetError> {
        if let Some(route) = self.routes_by_federate.get(&frame.dest_id) {
            return Ok(vec![(*route, frame)]);
        }
        if self.config.is_root {
            return Err(NetError::UnknownDest(frame.dest_id));
        }
        let _ = from;
        Ok(vec![(self.parent_or_err()?, frame)])
    }

    /// Fans a query out to every child, tracking how many replies are still owed so the
    /// answers can be fanned back in as one reply to `from` (spec.md §4.10 "query
    /// engine"). A broker with no children answers immediately with an empty result.
    fn handle_query(&mut self, from: RouteId, frame: ActionMessage) -> Result<Vec<(RouteId, ActionMessage)>, NetError> {
        if self.children.is_empty() {
            let mut reply = ActionMessage::new(Action::QueryReply);
            reply.message_id = frame.message_id;
            reply.payload = bincodec::serialize::<Vec<String>>(&Vec::new()).map_err(|_| NetError::TransportFailure)?;
            return Ok(vec![(from, reply)]);
        }

        let query_id = self.next_query_id;
        self.next_query_id += 1;
        self.pending_queries.insert(
            query_id,
            PendingQuery { origin: from, remaining: self.children.len(), replies: Vec::new() },
        );

        let mut outbound = Vec::with_capacity(self.children.len());
        for &child in &self.children {
            let mut forwarded = frame.clone();
            forwarded.message_id = MessageId::from(query_id as usize);
            outbound.push((child, forwarded));
        }
        Ok(outbound)
    }

    fn handle_query_reply(&mut self, from: RouteId, frame: ActionMessage) -> Result<Vec<(RouteId, ActionMessage)>, NetError> {
        use tinymap::Key;
        let query_id = frame.message_id.index() as u64;
        let Some(pending) = self.pending_queries.get_mut(&query_id) else {
            return Ok(Vec::new());
        };
        pending.replies.push((from, frame.payload.clone()));
        pending.remaining = pending.remaining.saturating_sub(1);
        if pending.remaining > 0 {
            return Ok(Vec::new());
        }

        let pending = self.pending_queries.remove(&query_id).expect("just matched");
        let merged: Vec<Vec<u8>> = pending.replies.into_iter().map(|(_, payload)| payload).collect();
        let mut reply = ActionMessage::new(Action::QueryReply);
        reply.message_id = frame.message_id;
        reply.payload = bincodec::serialize(&merged).map_err(|_| NetError::TransportFailure)?;
        Ok(vec![(pending.origin, reply)])
    }

    /// Removes `from`'s bookkeeping and cascades a synthesized disconnect downward to
    /// every remaining child, matching spec.md §4.10's disconnect cascade.
    fn handle_disconnect(&mut self, from: RouteId) -> Vec<(RouteId, ActionMessage)> {
        self.children.retain(|&c| c != from);
        self.routes_by_federate.retain(|_, route| *route != from);
        let mut disconnect = ActionMessage::new(Action::Disconnect);
        disconnect.action_time = Time::MAX;
        self.children.iter().map(|&child| (child, disconnect.clone())).collect()
    }

    fn cascade_to_children(&self, frame: ActionMessage) -> Vec<(RouteId, ActionMessage)> {
        self.children.iter().map(|&child| (child, frame.clone())).collect()
    }
}

/// The driving task's outcome, reported back through [`HostedFederate::driver`] once
/// [`run_federate_to_completion`] returns.
type DriverResult = Result<(), RuntimeError>;

/// A federate running in-process under a [`Core`] (spec.md §4.10 "a core also hosts
/// federates in-process"). The federate's lifecycle runs on its own blocking task —
/// its own "API thread" per spec.md §5 — since [`Federate::request_time`] blocks;
/// `Core` talks to it only across the two channels below, never by reaching for `&mut
/// Federate` directly while the driver task might be blocked inside it.
struct HostedFederate {
    /// Feeds inbound `TIME_GRANT`/`TIME_REQUEST` frames to the blocked driver task.
    dep_tx: std_mpsc::Sender<DependencyReport>,
    /// Frames the driver task wants sent upward (its own `TIME_REQUEST` broadcasts).
    outbound_rx: tokio_mpsc::UnboundedReceiver<ActionMessage>,
    driver: tokio::task::JoinHandle<DriverResult>,
}

/// The federate-side endpoint (spec.md §4.10 "Core"): owns the local federate registry,
/// the single transport link upward to a [`Broker`], and — once a federate is hosted —
/// the channels that bridge inbound/outbound frames to that federate's time coordinator.
pub struct Core<T: Transport> {
    transport: T,
    parent_route: RouteId,
    assigned_federate: Option<FederateId>,
    interface_handles: HashMap<String, InterfaceHandle>,
    federate: Option<HostedFederate>,
    inbound_rx: tokio_mpsc::UnboundedReceiver<ActionMessage>,
}

/// Runs a hosted federate end-to-end: init, execute, then step `requestTime` forward by
/// `period` (or one tick) until a grant of `timeMax`, then finalize. Each candidate time
/// is announced upward via `outbound_tx` before the call can block, matching spec.md
/// §4.9's "broadcast TIME_REQUEST, wait for dependency reports" protocol.
fn run_federate_to_completion(
    mut federate: Federate,
    outbound_tx: tokio_mpsc::UnboundedSender<ActionMessage>,
    period: Option<Time>,
    stop_time: Time,
) -> DriverResult {
    let id = federate.id();
    let announce = |candidate: Time| {
        let mut frame = ActionMessage::new(Action::TimeRequest);
        frame.source_id = id;
        frame.action_time = candidate;
        let _ = outbound_tx.send(frame);
    };

    federate.enter_initializing_mode()?;
    federate.enter_executing_mode(false)?;

    let step = period.unwrap_or(Time::from_ticks(1));
    let mut next = step;
    loop {
        if federate.state().is_terminal() {
            break;
        }
        let result = federate.request_time_with(next, IterationRequest::NoIterations, announce)?;
        if result.grant_time.is_max() || result.grant_time >= stop_time {
            break;
        }
        next = result.grant_time.saturating_add(step);
    }

    federate.finalize()
}

impl<T: Transport> Core<T> {
    pub async fn connect(mut transport: T, broker_endpoint: &str) -> Result<Self, NetError> {
        let (inbound_tx, inbound_rx) = tokio_mpsc::unbounded_channel();
        let upcall: crate::transport::Upcall = std::sync::Arc::new(move |frame: ActionMessage| {
            let _ = inbound_tx.send(frame);
        });
        let parent_route = transport.connect(broker_endpoint, upcall).await?;
        Ok(Core {
            transport,
            parent_route,
            assigned_federate: None,
            interface_handles: HashMap::new(),
            federate: None,
            inbound_rx,
        })
    }

    pub fn federate_id(&self) -> Option<FederateId> {
        self.assigned_federate
    }

    pub async fn register_federate(&mut self, name: &str) -> Result<(), NetError> {
        let mut frame = ActionMessage::new(Action::RegisterFederate);
        frame.payload = bincodec::serialize(&name.to_owned()).map_err(|_| NetError::TransportFailure)?;
        self.transport.send(self.parent_route, frame).await
    }

    pub async fn register_interface(&mut self, name: &str, kind: InterfaceKind) -> Result<(), NetError> {
        let action = match kind {
            InterfaceKind::Publication => Action::RegisterPublication,
            InterfaceKind::Input => Action::RegisterInput,
            InterfaceKind::Endpoint | InterfaceKind::Filter => Action::RegisterEndpoint,
        };
        let mut frame = ActionMessage::new(action);
        frame.source_id = self.assigned_federate.unwrap_or(FederateId::from(0usize));
        frame.payload = bincodec::serialize(&name.to_owned()).map_err(|_| NetError::TransportFailure)?;
        self.transport.send(self.parent_route, frame).await
    }

    pub async fn send(&self, frame: ActionMessage) -> Result<(), NetError> {
        self.transport.send(self.parent_route, frame).await
    }

    /// Applies a registration reply arriving from the broker, recording the globally
    /// assigned id/handle it carries.
    pub fn apply_registration_reply(&mut self, frame: &ActionMessage) {
        match frame.action {
            Action::RegisterFederate => self.assigned_federate = Some(frame.dest_id),
            Action::RegisterPublication | Action::RegisterInput | Action::RegisterEndpoint => {
                if let Ok(name) = bincodec::deserialize::<String>(&frame.payload) {
                    self.interface_handles.insert(name, frame.dest_handle);
                }
            }
            _ => {}
        }
    }

    /// Blocks until the broker has replied to `register_federate` with this core's
    /// globally assigned id, applying any interleaved registration replies along the
    /// way. Required before [`Core::host_federate`], which needs that id.
    pub async fn await_federate_registration(&mut self) -> Result<FederateId, NetError> {
        while self.assigned_federate.is_none() {
            let frame = self.inbound_rx.recv().await.ok_or(NetError::TransportFailure)?;
            self.apply_registration_reply(&frame);
        }
        Ok(self.assigned_federate.expect("checked above"))
    }

    /// Constructs a [`Federate`] for this core's already-assigned id and starts driving
    /// it on its own thread (spec.md §4.10, §5). Must be called after a
    /// `RegisterFederate` reply has set [`Core::federate_id`].
    pub fn host_federate(&mut self, config: FederateConfig, period: Option<Time>, stop_time: Time) -> Result<(), NetError> {
        let id = self.assigned_federate.ok_or(NetError::TransportFailure)?;
        let federate = Federate::new(id, config);
        let dep_tx = federate.dependency_sender();
        let (outbound_tx, outbound_rx) = tokio_mpsc::unbounded_channel();
        let driver =
            tokio::task::spawn_blocking(move || run_federate_to_completion(federate, outbound_tx, period, stop_time));
        self.federate = Some(HostedFederate { dep_tx, outbound_rx, driver });
        Ok(())
    }

    /// Runs this core's dispatch loop (spec.md §5 "dispatcher thread"): applies
    /// registration replies, feeds time-coordination frames to the hosted federate,
    /// forwards its outbound requests, and returns once the federate's driver task
    /// exits (normal finalize, `DISCONNECT`, or an upstream channel closure).
    pub async fn run(&mut self) -> Result<DriverResult, NetError> {
        let Some(mut hosted) = self.federate.take() else {
            return Ok(Ok(()));
        };

        let outcome = loop {
            tokio::select! {
                biased;

                frame = hosted.outbound_rx.recv() => {
                    if let Some(frame) = frame {
                        self.transport.send(self.parent_route, frame).await?;
                    }
                }

                result = &mut hosted.driver => {
                    break result.unwrap_or(Err(RuntimeError::TransportFailure));
                }

                frame = self.inbound_rx.recv() => {
                    let Some(frame) = frame else { break Err(RuntimeError::TransportFailure) };
                    self.apply_registration_reply(&frame);
                    let iterating = frame.flags.contains(Flags::ITERATION_REQUESTED);
                    if matches!(frame.action, Action::TimeGrant | Action::TimeRequest) {
                        let _ = hosted.dep_tx.send(DependencyReport {
                            dep: frame.source_id,
                            min_next_time: frame.action_time,
                            granted_time: frame.action_time,
                            iterating,
                        });
                    }
                    if frame.action == Action::Disconnect {
                        break hosted.driver.await.unwrap_or(Err(RuntimeError::TransportFailure));
                    }
                }
            }
        };

        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::*;
    use crate::transport::Upcall;

    fn route(n: usize) -> RouteId {
        RouteId::from(n)
    }

    /// A transport double that records every sent frame and hands back the upcall
    /// `Core::connect` installed, so a test can simulate an inbound frame by calling it
    /// directly instead of routing through a real peer.
    struct MockTransport {
        sent: Arc<Mutex<Vec<ActionMessage>>>,
        upcall: Arc<Mutex<Option<Upcall>>>,
    }

    impl Transport for MockTransport {
        async fn connect(&mut self, _endpoint_spec: &str, upcall: Upcall) -> Result<RouteId, NetError> {
            *self.upcall.lock().unwrap() = Some(upcall);
            Ok(route(1))
        }

        async fn send(&self, _route: RouteId, frame: ActionMessage) -> Result<(), NetError> {
            self.sent.lock().unwrap().push(frame);
            Ok(())
        }
    }

    #[tokio::test]
    async fn hosted_federate_with_no_dependencies_runs_to_completion() {
        let sent = Arc::new(Mutex::new(Vec::new()));
        let upcall_slot: Arc<Mutex<Option<Upcall>>> = Arc::new(Mutex::new(None));
        let transport = MockTransport { sent: sent.clone(), upcall: upcall_slot.clone() };

        let mut core = Core::connect(transport, "broker").await.unwrap();
        core.register_federate("gen1").await.unwrap();

        // Simulate the broker's RegisterFederate reply assigning global id 1.
        let mut reply = ActionMessage::new(Action::RegisterFederate);
        reply.dest_id = FederateId::from(1usize);
        let upcall = upcall_slot.lock().unwrap().clone().unwrap();
        upcall(reply);

        let federate_id = core.await_federate_registration().await.unwrap();
        assert_eq!(federate_id, FederateId::from(1usize));

        let config = FederateConfig { stop_time: Time::from_ticks(30), ..FederateConfig::default() };
        core.host_federate(config, Some(Time::from_ticks(10)), Time::from_ticks(30)).unwrap();

        let outcome = core.run().await.unwrap();
        assert!(outcome.is_ok());

        let frames = sent.lock().unwrap();
        assert!(frames.iter().any(|f| f.action == Action::TimeRequest));
    }

    #[tokio::test]
    async fn hosted_federate_is_unblocked_by_an_inbound_time_grant() {
        let sent = Arc::new(Mutex::new(Vec::new()));
        let upcall_slot: Arc<Mutex<Option<Upcall>>> = Arc::new(Mutex::new(None));
        let transport = MockTransport { sent: sent.clone(), upcall: upcall_slot.clone() };

        let mut core = Core::connect(transport, "broker").await.unwrap();
        core.register_federate("gen1").await.unwrap();

        let mut reply = ActionMessage::new(Action::RegisterFederate);
        reply.dest_id = FederateId::from(2usize);
        let upcall = upcall_slot.lock().unwrap().clone().unwrap();
        upcall(reply);
        core.await_federate_registration().await.unwrap();

        let config = FederateConfig { stop_time: Time::from_ticks(10), ..FederateConfig::default() };
        core.host_federate(config, Some(Time::from_ticks(10)), Time::from_ticks(10)).unwrap();

        // Feed back a TimeGrant from an upstream dependency so a coordinator that
        // required one could resolve; a zero-dependency federate ignores it and still
        // finishes cleanly.
        let mut grant = ActionMessage::new(Action::TimeGrant);
        grant.source_id = FederateId::from(1usize);
        grant.action_time = Time::from_ticks(10);
        upcall(grant);

        let outcome = core.run().await.unwrap();
        assert!(outcome.is_ok());
    }

    #[test]
    fn root_assigns_federate_ids_in_order() {
        let mut broker = Broker::new(
            BrokerConfig { name: "root".into(), is_root: true, autobroker: false },
            None,
        );
        let mut frame = ActionMessage::new(Action::RegisterFederate);
        frame.payload = bincodec::serialize(&"gen1".to_owned()).unwrap();
        let outbound = broker.handle_frame(route(1), frame).unwrap();
        assert_eq!(outbound.len(), 1);
        let (to, reply) = &outbound[0];
        assert_eq!(*to, route(1));
        assert_eq!(reply.dest_id, FederateId::from(1usize));
    }

    #[test]
    fn non_root_forwards_registration_toward_parent() {
        let mut broker = Broker::new(
            BrokerConfig { name: "child".into(), is_root: false, autobroker: false },
            Some(route(99)),
        );
        let mut frame = ActionMessage::new(Action::RegisterFederate);
        frame.payload = bincodec::serialize(&"gen1".to_owned()).unwrap();
        let outbound = broker.handle_frame(route(1), frame).unwrap();
        assert_eq!(outbound.len(), 1);
        assert_eq!(outbound[0].0, route(99));
        assert_eq!(outbound[0].1.action, Action::RegisterFederate);
    }

    #[test]
    fn routes_data_to_a_known_destination() {
        let mut broker = Broker::new(
            BrokerConfig { name: "root".into(), is_root: true, autobroker: false },
            None,
        );
        let mut register = ActionMessage::new(Action::RegisterFederate);
        register.payload = bincodec::serialize(&"gen1".to_owned()).unwrap();
        broker.handle_frame(route(1), register).unwrap();

        let mut data = ActionMessage::new(Action::Data);
        data.dest_id = FederateId::from(1usize);
        let outbound = broker.handle_frame(route(2), data).unwrap();
        assert_eq!(outbound[0].0, route(1));
    }

    #[test]
    fn root_reports_unknown_destination() {
        let mut broker = Broker::new(
            BrokerConfig { name: "root".into(), is_root: true, autobroker: false },
            None,
        );
        let mut data = ActionMessage::new(Action::Data);
        data.dest_id = FederateId::from(42usize);
        let err = broker.handle_frame(route(1), data).unwrap_err();
        assert!(matches!(err, NetError::UnknownDest(_)));
    }

    #[test]
    fn query_with_no_children_answers_immediately() {
        let mut broker = Broker::new(
            BrokerConfig { name: "leaf".into(), is_root: true, autobroker: false },
            None,
        );
        let query = ActionMessage::new(Action::Query);
        let outbound = broker.handle_frame(route(1), query).unwrap();
        assert_eq!(outbound.len(), 1);
        assert_eq!(outbound[0].1.action, Action::QueryReply);
    }

    #[test]
    fn disconnect_cascades_to_remaining_children() {
        let mut broker = Broker::new(
            BrokerConfig { name: "root".into(), is_root: true, autobroker: false },
            None,
        );
        let mut register_a = ActionMessage::new(Action::RegisterCore);
        register_a.source_id = FederateId::from(1usize);
        broker.handle_frame(route(1), register_a).unwrap();
        let mut register_b = ActionMessage::new(Action::RegisterCore);
        register_b.source_id = FederateId::from(2usize);
        broker.handle_frame(route(2), register_b).unwrap();

        let outbound = broker.handle_frame(route(1), ActionMessage::new(Action::Disconnect)).unwrap();
        assert_eq!(outbound.len(), 1);
        assert_eq!(outbound[0].0, route(2));
    }
}
