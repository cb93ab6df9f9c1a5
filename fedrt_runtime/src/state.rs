//! The federate state machine (spec.md §4.7).
//!
//! ```text
//! STARTUP ──register*──► STARTUP
//! STARTUP ──enterInitializing──► INITIALIZING
//! INITIALIZING ──enterExecuting(next_step)──► EXECUTING
//! INITIALIZING ──enterExecuting(iterate)──► INITIALIZING   (iteration at t=0)
//! EXECUTING ──requestTime(t)──► EXECUTING                   (t > current)
//! EXECUTING ──requestTime(t, iterate)──► EXECUTING          (t may equal current)
//! <any non-terminal> ──finalize──► FINALIZE
//! <any> ──error──► ERROR_STATE
//! ```

use crate::RuntimeError;

/// One of the states a [`crate::Federate`] may be in. Monotonic except that
/// [`FederateState::Error`] is absorbing: no transition leaves it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FederateState {
    Startup,
    Initializing,
    Executing,
    Finalize,
    Error,
}

impl std::fmt::Display for FederateState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            FederateState::Startup => "STARTUP",
            FederateState::Initializing => "INITIALIZING",
            FederateState::Executing => "EXECUTING",
            FederateState::Finalize => "FINALIZE",
            FederateState::Error => "ERROR_STATE",
        };
        f.write_str(s)
    }
}

impl FederateState {
    /// `true` once the federate has left [`FederateState::Startup`] and
    /// [`FederateState::Initializing`] — i.e. interfaces may no longer be freely added
    /// (spec.md §3 "Lifecycle").
    pub fn is_executing_or_later(&self) -> bool {
        matches!(
            self,
            FederateState::Executing | FederateState::Finalize | FederateState::Error
        )
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, FederateState::Finalize | FederateState::Error)
    }

    /// Validate and perform `enterInitializingMode`.
    pub fn enter_initializing(&mut self) -> Result<(), RuntimeError> {
        match self {
            FederateState::Startup => {
                *self = FederateState::Initializing;
                Ok(())
            }
            _ => Err(RuntimeError::InvalidTransition(
                "enterInitializingMode is only valid from STARTUP",
            )),
        }
    }

    /// Validate and perform `enterExecutingMode`. `iterate` keeps the federate in
    /// `INITIALIZING` for one more round of iteration at t=0.
    pub fn enter_executing(&mut self, iterate: bool) -> Result<(), RuntimeError> {
        match self {
            FederateState::Initializing if iterate => Ok(()),
            FederateState::Initializing => {
                *self = FederateState::Executing;
                Ok(())
            }
            _ => Err(RuntimeError::InvalidTransition(
                "enterExecutingMode is only valid from INITIALIZING",
            )),
        }
    }

    /// Validate `requestTime` is callable from the current state.
    pub fn check_request_time(&self) -> Result<(), RuntimeError> {
        match self {
            FederateState::Executing => Ok(()),
            _ => Err(RuntimeError::InvalidTransition(
                "requestTime is only valid from EXECUTING",
            )),
        }
    }

    /// Validate and perform `finalize`. Valid from any non-terminal state.
    pub fn finalize(&mut self) -> Result<(), RuntimeError> {
        if self.is_terminal() {
            return Err(RuntimeError::InvalidTransition(
                "finalize is not valid from a terminal state",
            ));
        }
        *self = FederateState::Finalize;
        Ok(())
    }

    /// `error` is valid from any state and is absorbing.
    pub fn error(&mut self) {
        *self = FederateState::Error;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn happy_path() {
        let mut s = FederateState::Startup;
        s.enter_initializing().unwrap();
        assert_eq!(s, FederateState::Initializing);
        s.enter_executing(false).unwrap();
        assert_eq!(s, FederateState::Executing);
        s.check_request_time().unwrap();
        s.finalize().unwrap();
        assert_eq!(s, FederateState::Finalize);
    }

    #[test]
    fn iteration_at_t0_stays_initializing() {
        let mut s = FederateState::Initializing;
        s.enter_executing(true).unwrap();
        assert_eq!(s, FederateState::Initializing);
    }

    #[test]
    fn error_is_absorbing() {
        let mut s = FederateState::Executing;
        s.error();
        assert_eq!(s, FederateState::Error);
        assert!(s.finalize().is_err());
    }

    #[test]
    fn request_time_rejected_outside_executing() {
        let s = FederateState::Startup;
        assert!(s.check_request_time().is_err());
    }
}
