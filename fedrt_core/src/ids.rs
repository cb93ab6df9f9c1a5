//! The four disjoint 32-bit handle spaces of the federation (spec.md §3: "Identifiers").
//!
//! Each handle type is unique within the root broker's federation. `InterfaceHandle`
//! covers publications, inputs, endpoints and filters; the kind is stored alongside the
//! handle (in the registry) rather than encoded in separate key spaces, because §3
//! requires all four interface kinds to share one 32-bit handle space.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

tinymap::key_type! {
    /// Handle for a federate, unique within a federation.
    #[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
    pub FederateId
}

tinymap::key_type! {
    /// Handle for a publication, input, endpoint, or filter interface.
    ///
    /// The concrete kind is recorded alongside the handle in the handle registry; see
    /// [`InterfaceKind`].
    #[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
    pub InterfaceHandle
}

tinymap::key_type! {
    /// Handle for a transport route between two endpoints of the broker tree.
    #[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
    pub RouteId
}

tinymap::key_type! {
    /// Monotonic identifier for an in-flight [`crate::frame::ActionMessage`], unique per source.
    #[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
    pub MessageId
}

/// The four kinds of interface that share the [`InterfaceHandle`] space (spec.md §3 "Interfaces").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum InterfaceKind {
    Publication,
    Input,
    Endpoint,
    Filter,
}

impl std::fmt::Display for InterfaceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            InterfaceKind::Publication => "publication",
            InterfaceKind::Input => "input",
            InterfaceKind::Endpoint => "endpoint",
            InterfaceKind::Filter => "filter",
        };
        f.write_str(s)
    }
}
