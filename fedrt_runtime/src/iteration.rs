//! Iteration semantics (spec.md §4.8).
//!
//! A federate may request to re-execute the current time step instead of advancing,
//! either because its own convergence check failed or because a dependency iterated.
//! Obligations are retained across a switch to event-triggered mode: see
//! `SPEC_FULL.md` for the Open Question decision.

use crate::Time;

/// Passed to [`crate::Federate::request_time`] to say whether the caller wants to
/// converge on `time` before moving on, or is signalling a halt/error instead of a
/// normal request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IterationRequest {
    NoIterations,
    IterateIfNeeded,
    ForceIteration,
    HaltOperations,
    ErrorCondition,
}

impl IterationRequest {
    pub fn wants_iteration(&self) -> bool {
        matches!(self, IterationRequest::ForceIteration | IterationRequest::IterateIfNeeded)
    }
}

/// The outcome of resolving a time request against the time coordinator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IterationState {
    NextStep,
    Iterating,
    Halted,
    ErrorResult,
}

/// The `(granted_time, iteration_state)` pair returned to the requesting federate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IterationResult {
    pub grant_time: Time,
    pub state: IterationState,
}

impl IterationResult {
    pub fn next_step(grant_time: Time) -> Self {
        IterationResult { grant_time, state: IterationState::NextStep }
    }

    pub fn iterating(grant_time: Time) -> Self {
        IterationResult { grant_time, state: IterationState::Iterating }
    }

    pub fn halted(grant_time: Time) -> Self {
        IterationResult { grant_time, state: IterationState::Halted }
    }

    pub fn error(grant_time: Time) -> Self {
        IterationResult { grant_time, state: IterationState::ErrorResult }
    }

    pub fn is_iterating(&self) -> bool {
        self.state == IterationState::Iterating
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wants_iteration() {
        assert!(!IterationRequest::NoIterations.wants_iteration());
        assert!(IterationRequest::ForceIteration.wants_iteration());
        assert!(IterationRequest::IterateIfNeeded.wants_iteration());
        assert!(!IterationRequest::HaltOperations.wants_iteration());
    }

    #[test]
    fn result_helpers_roundtrip_state() {
        let t = Time::ZERO;
        assert!(IterationResult::iterating(t).is_iterating());
        assert!(!IterationResult::next_step(t).is_iterating());
    }
}
