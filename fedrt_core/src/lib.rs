//! Core types shared by every crate in the `fedrt` workspace: the four disjoint handle
//! spaces, the integer-tick [`Time`] type, and the wire-level [`frame::ActionMessage`].
#![deny(clippy::all)]

pub mod frame;
pub mod ids;
pub mod time;

pub use ids::*;
pub use time::{Time, TimeError};
