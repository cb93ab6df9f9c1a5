//! The federate object: state machine, time coordinator, and value/message managers
//! combined behind one owner (spec.md §4.7, §9 "Multiple-inheritance combination federate").
//!
//! A federate struct owns both managers unconditionally — "combination" is the absence
//! of restriction, not a distinct subtype (§9).

use std::sync::mpsc;

use fedrt_core::{FederateId, Time};

use crate::{
    FederateState, IterationRequest, IterationResult, MessageFederateManager, RuntimeError,
    TimeCoordinator, ValueFederateManager,
};

/// A dependency's grant report, delivered across the channel a blocked
/// [`Federate::request_time`] waits on (see [`Federate::dependency_sender`]).
#[derive(Debug, Clone, Copy)]
pub struct DependencyReport {
    pub dep: FederateId,
    pub min_next_time: Time,
    pub granted_time: Time,
    pub iterating: bool,
}

/// Construction-time configuration for a federate.
#[derive(Debug, Clone)]
pub struct FederateConfig {
    pub name: String,
    pub lookahead: Time,
    pub period: Option<Time>,
    pub offset: Time,
    pub stop_time: Time,
    pub event_triggered: bool,
}

impl Default for FederateConfig {
    fn default() -> Self {
        FederateConfig {
            name: String::new(),
            lookahead: Time::ZERO,
            period: None,
            offset: Time::ZERO,
            stop_time: Time::MAX,
            event_triggered: false,
        }
    }
}

/// Callbacks installed by a callback-driven federate (§4.7, §9). The driver loop
/// dispatches to these around each state transition and grant; a panic or returned
/// error from any of them is caught at the driver boundary and reported as
/// [`RuntimeError::UserException`], never unwound into the dispatcher.
pub struct CallbackConfig {
    pub on_initialize: Option<Box<dyn FnMut() -> Result<(), String> + Send>>,
    pub on_executing_entry: Option<Box<dyn FnMut() -> Result<(), String> + Send>>,
    pub on_time_request_return: Option<Box<dyn FnMut(IterationResult) -> Result<(), String> + Send>>,
    pub on_next_time: Option<Box<dyn FnMut(Time) -> Time + Send>>,
    pub on_finalize: Option<Box<dyn FnMut() -> Result<(), String> + Send>>,
    pub on_error: Option<Box<dyn FnMut(&RuntimeError) + Send>>,
}

impl Default for CallbackConfig {
    fn default() -> Self {
        CallbackConfig {
            on_initialize: None,
            on_executing_entry: None,
            on_time_request_return: None,
            on_next_time: None,
            on_finalize: None,
            on_error: None,
        }
    }
}

impl std::fmt::Debug for CallbackConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CallbackConfig").finish_non_exhaustive()
    }
}

/// A handle returned by an async API call (`requestTimeAsync`, `enterExecutingModeAsync`,
/// ...). Only one may be outstanding per federate; any other API call while one is
/// live is rejected with [`RuntimeError::ConcurrentOperation`] (§9 "Async method pairs").
#[derive(Debug)]
pub struct AsyncTimeRequest {
    requested: Time,
    iteration: IterationRequest,
}

/// A federate: one state machine, one time coordinator, and both managers, usable
/// either synchronously or via an installed [`CallbackConfig`] driver loop.
#[derive(Debug)]
pub struct Federate {
    pub config: FederateConfig,
    id: FederateId,
    state: FederateState,
    coordinator: TimeCoordinator,
    values: ValueFederateManager,
    messages: MessageFederateManager,
    async_outstanding: bool,
    dep_tx: mpsc::Sender<DependencyReport>,
    dep_rx: mpsc::Receiver<DependencyReport>,
}

impl Federate {
    pub fn new(id: FederateId, config: FederateConfig) -> Self {
        let mut coordinator = TimeCoordinator::new(id);
        coordinator.lookahead = config.lookahead;
        coordinator.period = config.period;
        coordinator.offset = config.offset;
        coordinator.stop_time = config.stop_time;
        coordinator.event_triggered = config.event_triggered;
        let (dep_tx, dep_rx) = mpsc::channel();
        Federate {
            config,
            id,
            state: FederateState::Startup,
            coordinator,
            values: ValueFederateManager::new(),
            messages: MessageFederateManager::new(),
            async_outstanding: false,
            dep_tx,
            dep_rx,
        }
    }

    /// A cloneable sender a dispatcher thread/task can use to report a dependency's
    /// grant without taking `&mut self` — wakes a thread parked inside
    /// [`Federate::request_time`] instead of requiring it to poll.
    pub fn dependency_sender(&self) -> mpsc::Sender<DependencyReport> {
        self.dep_tx.clone()
    }

    pub fn id(&self) -> FederateId {
        self.id
    }

    pub fn state(&self) -> FederateState {
        self.state
    }

    pub fn values(&self) -> &ValueFederateManager {
        &self.values
    }

    pub fn values_mut(&mut self) -> &mut ValueFederateManager {
        &mut self.values
    }

    pub fn messages(&self) -> &MessageFederateManager {
        &self.messages
    }

    pub fn messages_mut(&mut self) -> &mut MessageFederateManager {
        &mut self.messages
    }

    fn check_not_async(&self) -> Result<(), RuntimeError> {
        if self.async_outstanding {
            Err(RuntimeError::ConcurrentOperation)
        } else {
            Ok(())
        }
    }

    pub fn enter_initializing_mode(&mut self) -> Result<(), RuntimeError> {
        self.check_not_async()?;
        self.state.enter_initializing()
    }

    pub fn enter_executing_mode(&mut self, iterate: bool) -> Result<(), RuntimeError> {
        self.check_not_async()?;
        self.state.enter_executing(iterate)?;
        if self.state == FederateState::Executing {
            self.messages.close_name_resolution();
            self.messages.flush_pending();
        }
        Ok(())
    }

    /// Synchronous `requestTime`: blocks until the coordinator can grant. A dependency
    /// unblocks this call by reporting through the sender returned from
    /// [`Federate::dependency_sender`], not by calling back into `self` — this thread
    /// parks on that channel's receiver instead of spinning on `try_grant`.
    pub fn request_time(&mut self, t_req: Time, iteration: IterationRequest) -> Result<IterationResult, RuntimeError> {
        self.request_time_with(t_req, iteration, |_| {})
    }

    /// Same as [`Federate::request_time`], but invokes `on_candidate` with the rounded
    /// candidate time right after it is computed and before this call can block — the
    /// hook a network layer uses to broadcast the outbound `TIME_REQUEST` frame for
    /// that candidate (see `fedrt_net::Core`).
    pub fn request_time_with(
        &mut self,
        t_req: Time,
        iteration: IterationRequest,
        on_candidate: impl FnOnce(Time),
    ) -> Result<IterationResult, RuntimeError> {
        self.check_not_async()?;
        self.state.check_request_time()?;
        let candidate = self.coordinator.begin_request(t_req, iteration);
        on_candidate(candidate);
        loop {
            if self.values.any_input_updated() {
                self.coordinator.mark_inputs_changed();
            }
            if let Some(result) = self.coordinator.try_grant() {
                return Ok(result);
            }
            let report = self.dep_rx.recv().map_err(|_| RuntimeError::TransportFailure)?;
            self.coordinator.report_dependency(report.dep, report.min_next_time, report.granted_time, report.iterating);
        }
    }

    /// Begin an async `requestTimeAsync`, returning a handle that must be completed
    /// with [`Federate::request_time_complete`] before any other API call.
    pub fn request_time_async(
        &mut self,
        t_req: Time,
        iteration: IterationRequest,
    ) -> Result<AsyncTimeRequest, RuntimeError> {
        self.check_not_async()?;
        self.state.check_request_time()?;
        let candidate = self.coordinator.begin_request(t_req, iteration);
        self.async_outstanding = true;
        Ok(AsyncTimeRequest { requested: candidate, iteration })
    }

    /// Poll once for a grant on a still-outstanding async request. Returns `None` if
    /// the coordinator is still waiting on dependency reports.
    pub fn request_time_complete(&mut self, handle: AsyncTimeRequest) -> Option<IterationResult> {
        let _ = handle.requested;
        let _ = handle.iteration;
        let result = self.coordinator.try_grant();
        if result.is_some() {
            self.async_outstanding = false;
        }
        result
    }

    /// Record an updated report from a dependency and attempt to resolve the
    /// currently pending request. Used by the driver loop / dispatcher thread.
    pub fn report_dependency(&mut self, dep: FederateId, min_next_time: Time, granted_time: Time, iterating: bool) {
        self.coordinator.report_dependency(dep, min_next_time, granted_time, iterating);
    }

    pub fn add_dependency(&mut self, dep: FederateId) {
        self.coordinator.add_dependency(dep);
    }

    pub fn remove_dependency(&mut self, dep: FederateId) {
        self.coordinator.remove_dependency(dep);
    }

    pub fn add_dependent(&mut self, dep: FederateId) {
        self.coordinator.add_dependent(dep);
    }

    pub fn report_dependent_iterating(&mut self, dependent: FederateId, iterating: bool) {
        self.coordinator.report_dependent_iterating(dependent, iterating);
    }

    pub fn current_time(&self) -> Time {
        self.coordinator.current_granted()
    }

    pub fn finalize(&mut self) -> Result<(), RuntimeError> {
        self.state.finalize()
    }

    /// `disconnect()`: immediate halt, per spec.md §5 "Cancellation".
    pub fn disconnect(&mut self) -> IterationResult {
        self.async_outstanding = false;
        self.state.error();
        self.coordinator.disconnect()
    }

    /// Drive this federate end-to-end using an installed [`CallbackConfig`], looping
    /// `on_next_time` around `requestTime` until it reports `FINALIZE`/`ERROR_STATE`
    /// or the configured stop time, per spec.md §4.7 "Callback-driven".
    pub fn run_callback_driven(&mut self, mut callbacks: CallbackConfig) -> Result<(), RuntimeError> {
        self.enter_initializing_mode()?;
        if let Some(cb) = &mut callbacks.on_initialize {
            cb().map_err(RuntimeError::UserException)?;
        }
        self.enter_executing_mode(false)?;
        if let Some(cb) = &mut callbacks.on_executing_entry {
            cb().map_err(RuntimeError::UserException)?;
        }

        let mut next_time = self.coordinator.stop_time;
        loop {
            if self.state.is_terminal() {
                break;
            }
            let requested = if let Some(cb) = &mut callbacks.on_next_time {
                cb(next_time)
            } else {
                next_time
            };
            let result = self.request_time(requested, IterationRequest::NoIterations)?;
            if let Some(cb) = &mut callbacks.on_time_request_return {
                cb(result).map_err(RuntimeError::UserException)?;
            }
            if result.grant_time.is_max() {
                break;
            }
            next_time = result.grant_time;
        }

        self.finalize()?;
        if let Some(cb) = &mut callbacks.on_finalize {
            cb().map_err(RuntimeError::UserException)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ValueKind;

    fn fid(n: usize) -> FederateId {
        FederateId::from(n)
    }

    #[test]
    fn full_lifecycle_without_dependencies() {
        let mut fed = Federate::new(fid(0), FederateConfig::default());
        fed.enter_initializing_mode().unwrap();
        fed.enter_executing_mode(false).unwrap();
        let result = fed.request_time(Time::from_ticks(10), IterationRequest::NoIterations).unwrap();
        assert_eq!(result.grant_time, Time::from_ticks(10));
        fed.finalize().unwrap();
        assert_eq!(fed.state(), FederateState::Finalize);
    }

    #[test]
    fn async_pair_rejects_concurrent_call() {
        let mut fed = Federate::new(fid(0), FederateConfig::default());
        fed.enter_initializing_mode().unwrap();
        fed.enter_executing_mode(false).unwrap();
        let handle = fed.request_time_async(Time::from_ticks(5), IterationRequest::NoIterations).unwrap();
        assert!(matches!(
            fed.request_time(Time::from_ticks(5), IterationRequest::NoIterations),
            Err(RuntimeError::ConcurrentOperation)
        ));
        let result = fed.request_time_complete(handle).unwrap();
        assert_eq!(result.grant_time, Time::from_ticks(5));
    }

    #[test]
    fn disconnect_halts_and_errors() {
        let mut fed = Federate::new(fid(0), FederateConfig::default());
        fed.enter_initializing_mode().unwrap();
        fed.enter_executing_mode(false).unwrap();
        let result = fed.disconnect();
        assert!(result.grant_time.is_max());
        assert_eq!(fed.state(), FederateState::Error);
    }

    #[test]
    fn values_manager_accessible_through_federate() {
        let mut fed = Federate::new(fid(0), FederateConfig::default());
        fed.values_mut().register_publication("p", ValueKind::Double, None).unwrap();
        assert!(fed.values().publication_handle("p").is_some());
    }
}
