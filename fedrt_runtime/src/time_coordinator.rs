//! The time coordinator — the heart of the runtime (spec.md §4.9).
//!
//! Each federate owns exactly one [`TimeCoordinator`]. It does not itself perform I/O;
//! callers feed it dependency reports (typically arriving as `TIME_GRANT`/`TIME_REQUEST`
//! frames routed by [`fedrt_net`]) and poll [`TimeCoordinator::try_grant`] after each one.

use std::collections::HashMap;

use fedrt_core::FederateId;

use crate::{IterationRequest, IterationResult, Time};

/// What a dependency has reported back to this coordinator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct DependencyState {
    /// The earliest time at which this dependency might still produce a relevant event.
    last_known_min_time: Time,
    granted_time: Time,
    iterating: bool,
}

impl DependencyState {
    fn initial() -> Self {
        DependencyState { last_known_min_time: Time::ZERO, granted_time: Time::ZERO, iterating: false }
    }
}

/// Tracks dependency grant state and resolves `requestTime` calls into grants
/// (spec.md §4.9). Not `Send`/`Sync`-constrained here: ownership and cross-thread
/// handoff are the caller's concern (see §5 of the design notes).
#[derive(Debug)]
pub struct TimeCoordinator {
    federate: FederateId,
    dependencies: HashMap<FederateId, DependencyState>,
    /// Minimum time this federate may still advance past `current_granted` before its
    /// own outputs could be observed (a fixed "lookahead").
    pub lookahead: Time,
    pub period: Option<Time>,
    pub offset: Time,
    pub stop_time: Time,
    pub event_triggered: bool,
    current_granted: Time,
    pending_request: Option<(Time, IterationRequest)>,
    own_iterating: bool,
    /// Whether any of this federate's inputs changed since its last grant — one of the
    /// three ITERATING conditions of spec.md §4.8, reset once a grant is produced.
    inputs_changed: bool,
    /// Federates that depend on this one, and whether each last reported itself as
    /// iterating — the third of the three ITERATING conditions of spec.md §4.8.
    dependents: HashMap<FederateId, bool>,
}

impl TimeCoordinator {
    pub fn new(federate: FederateId) -> Self {
        TimeCoordinator {
            federate,
            dependencies: HashMap::new(),
            lookahead: Time::ZERO,
            period: None,
            offset: Time::ZERO,
            stop_time: Time::MAX,
            event_triggered: false,
            current_granted: Time::ZERO,
            pending_request: None,
            own_iterating: false,
            inputs_changed: false,
            dependents: HashMap::new(),
        }
    }

    pub fn current_granted(&self) -> Time {
        self.current_granted
    }

    pub fn add_dependency(&mut self, dep: FederateId) {
        self.dependencies.entry(dep).or_insert_with(DependencyState::initial);
    }

    /// Register `dep` as a federate that depends on this one, so its iterating status
    /// can feed this coordinator's own ITERATING decision (spec.md §4.8).
    pub fn add_dependent(&mut self, dep: FederateId) {
        self.dependents.entry(dep).or_insert(false);
    }

    /// Record whether `dependent` is currently iterating, typically fed by a
    /// `TIME_REQUEST` frame that peer sent while waiting on its own grant.
    pub fn report_dependent_iterating(&mut self, dependent: FederateId, iterating: bool) {
        self.dependents.insert(dependent, iterating);
    }

    /// Mark that one of this federate's own inputs changed since its last grant. The
    /// caller (typically [`crate::Federate`]) is responsible for noticing the change
    /// via its value manager before polling [`TimeCoordinator::try_grant`].
    pub fn mark_inputs_changed(&mut self) {
        self.inputs_changed = true;
    }

    /// Round `t` up to `offset + k*period >= t` if a period is configured, matching
    /// the rounding step of spec.md §4.9 step 1.
    fn round_to_period(&self, t: Time) -> Time {
        let Some(period) = self.period else { return t };
        if period == Time::ZERO || t <= self.offset {
            return self.offset.max(t);
        }
        let elapsed = t.saturating_sub(self.offset).ticks();
        let period_ticks = period.ticks();
        let periods = (elapsed + period_ticks - 1) / period_ticks;
        self.offset.saturating_add(Time::from_ticks(periods * period_ticks))
    }

    /// Begin a `requestTime(t_req, iteration)` call: computes the rounded candidate
    /// and records the pending request. The caller is responsible for broadcasting
    /// `TIME_REQUEST` to dependents with the returned candidate.
    pub fn begin_request(&mut self, t_req: Time, iteration: IterationRequest) -> Time {
        let candidate = self.round_to_period(t_req.min(self.stop_time));
        self.pending_request = Some((candidate, iteration));
        self.own_iterating = iteration.wants_iteration();
        candidate
    }

    /// Record an updated report from `dep` (typically from a `TIME_GRANT` or
    /// `TIME_REQUEST` frame originating at that peer).
    pub fn report_dependency(&mut self, dep: FederateId, min_next_time: Time, granted_time: Time, iterating: bool) {
        let state = self.dependencies.entry(dep).or_insert_with(DependencyState::initial);
        state.last_known_min_time = min_next_time;
        state.granted_time = granted_time;
        state.iterating = iterating;
    }

    /// Remove `dep` from all dependency tables and release this federate if it was
    /// blocked solely on `dep` (spec.md §4.9 "Cancellation").
    pub fn remove_dependency(&mut self, dep: FederateId) {
        self.dependencies.remove(&dep);
    }

    /// The minimum grant time safe for this federate, per the safety rule of §4.9:
    /// never exceeds the minimum over dependencies of their granted time plus lookahead.
    fn min_over_dependencies(&self) -> Time {
        self.dependencies
            .values()
            .map(|d| d.granted_time.saturating_add(self.lookahead))
            .fold(Time::MAX, Time::min)
    }

    fn any_dependency_iterating(&self) -> bool {
        self.dependencies.values().any(|d| d.iterating)
    }

    fn any_dependent_iterating(&self) -> bool {
        self.dependents.values().any(|&iterating| iterating)
    }

    /// Attempt to resolve the pending request into a grant. Returns `None` if the
    /// coordinator is still waiting on dependency reports. Grants `ITERATING` iff this
    /// federate wants iteration at all, and (spec.md §4.8) any one of: a dependency is
    /// also iterating, one of this federate's own inputs changed since its last grant,
    /// or a dependent is also iterating.
    pub fn try_grant(&mut self) -> Option<IterationResult> {
        let (candidate, iteration) = self.pending_request?;

        if self.dependencies.is_empty() {
            self.current_granted = candidate;
            self.pending_request = None;
            self.inputs_changed = false;
            return Some(IterationResult::next_step(candidate));
        }

        let floor = self.min_over_dependencies();
        if floor < candidate {
            return None;
        }

        let iterating = self.own_iterating
            && (self.any_dependency_iterating()
                || self.inputs_changed
                || self.any_dependent_iterating()
                || iteration == IterationRequest::ForceIteration);
        self.current_granted = candidate;
        self.pending_request = None;
        self.inputs_changed = false;
        if iterating {
            Some(IterationResult::iterating(candidate))
        } else {
            Some(IterationResult::next_step(candidate))
        }
    }

    /// `disconnect()`: release any pending request immediately with a final grant of
    /// `timeMax` and state `HALTED` (spec.md §5 "Cancellation").
    pub fn disconnect(&mut self) -> IterationResult {
        self.pending_request = None;
        self.current_granted = Time::MAX;
        IterationResult::halted(Time::MAX)
    }

    pub fn federate(&self) -> FederateId {
        self.federate
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fid(n: usize) -> FederateId {
        FederateId::from(n)
    }

    #[test]
    fn grants_immediately_with_no_dependencies() {
        let mut tc = TimeCoordinator::new(fid(0));
        let candidate = tc.begin_request(Time::from_ticks(10), IterationRequest::NoIterations);
        assert_eq!(candidate, Time::from_ticks(10));
        let result = tc.try_grant().unwrap();
        assert_eq!(result.grant_time, Time::from_ticks(10));
    }

    #[test]
    fn waits_for_slower_dependency() {
        let mut tc = TimeCoordinator::new(fid(0));
        tc.add_dependency(fid(1));
        tc.begin_request(Time::from_ticks(10), IterationRequest::NoIterations);
        assert!(tc.try_grant().is_none());
        tc.report_dependency(fid(1), Time::from_ticks(5), Time::from_ticks(5), false);
        assert!(tc.try_grant().is_none());
        tc.report_dependency(fid(1), Time::from_ticks(20), Time::from_ticks(20), false);
        let result = tc.try_grant().unwrap();
        assert_eq!(result.grant_time, Time::from_ticks(10));
    }

    #[test]
    fn period_rounds_up_candidate() {
        let mut tc = TimeCoordinator::new(fid(0));
        tc.period = Some(Time::from_ticks(5));
        tc.offset = Time::ZERO;
        let candidate = tc.begin_request(Time::from_ticks(7), IterationRequest::NoIterations);
        assert_eq!(candidate, Time::from_ticks(10));
    }

    #[test]
    fn disconnect_halts_immediately() {
        let mut tc = TimeCoordinator::new(fid(0));
        tc.add_dependency(fid(1));
        tc.begin_request(Time::from_ticks(100), IterationRequest::NoIterations);
        let result = tc.disconnect();
        assert_eq!(result.grant_time, Time::MAX);
    }

    #[test]
    fn inputs_changed_since_grant_forces_iterating() {
        let mut tc = TimeCoordinator::new(fid(0));
        tc.add_dependency(fid(1));
        tc.begin_request(Time::from_ticks(10), IterationRequest::IterateIfNeeded);
        tc.report_dependency(fid(1), Time::from_ticks(10), Time::from_ticks(10), false);
        tc.mark_inputs_changed();
        let result = tc.try_grant().unwrap();
        assert!(result.is_iterating());
    }

    #[test]
    fn dependent_iterating_forces_iterating() {
        let mut tc = TimeCoordinator::new(fid(0));
        tc.add_dependency(fid(1));
        tc.add_dependent(fid(2));
        tc.begin_request(Time::from_ticks(10), IterationRequest::IterateIfNeeded);
        tc.report_dependency(fid(1), Time::from_ticks(10), Time::from_ticks(10), false);
        tc.report_dependent_iterating(fid(2), true);
        let result = tc.try_grant().unwrap();
        assert!(result.is_iterating());
    }

    #[test]
    fn no_iterations_requested_never_iterates_even_if_dependent_is() {
        let mut tc = TimeCoordinator::new(fid(0));
        tc.add_dependency(fid(1));
        tc.add_dependent(fid(2));
        tc.begin_request(Time::from_ticks(10), IterationRequest::NoIterations);
        tc.report_dependency(fid(1), Time::from_ticks(10), Time::from_ticks(10), false);
        tc.report_dependent_iterating(fid(2), true);
        let result = tc.try_grant().unwrap();
        assert!(!result.is_iterating());
    }

    #[test]
    fn removed_dependency_unblocks_grant() {
        let mut tc = TimeCoordinator::new(fid(0));
        tc.add_dependency(fid(1));
        tc.begin_request(Time::from_ticks(10), IterationRequest::NoIterations);
        assert!(tc.try_grant().is_none());
        tc.remove_dependency(fid(1));
        let result = tc.try_grant().unwrap();
        assert_eq!(result.grant_time, Time::from_ticks(10));
    }
}
