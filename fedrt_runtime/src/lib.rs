//! The federate runtime: state machine, time coordinator, and value/message managers
//! (spec.md §4.5–§4.9).
#![deny(clippy::all)]

mod aggregation;
mod error;
mod federate;
mod iteration;
mod message_manager;
mod state;
mod time_coordinator;
mod units;
mod value;
mod value_manager;

pub use aggregation::AggregationMethod;
pub use error::RuntimeError;
pub use federate::{AsyncTimeRequest, CallbackConfig, DependencyReport, Federate, FederateConfig};
pub use iteration::{IterationRequest, IterationResult, IterationState};
pub use message_manager::{Endpoint, EndpointKind, Filter, Message, MessageFederateManager};
pub use state::FederateState;
pub use time_coordinator::TimeCoordinator;
pub use units::{convert, Unit, UnitError};
pub use value::{Value, ValueKind};
pub use value_manager::{Input, Publication, ValueFederateManager};

pub use fedrt_core::{FederateId, InterfaceHandle, InterfaceKind, MessageId, RouteId, Time};
