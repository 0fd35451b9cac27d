// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Compact interface handles.
//!
//! Handles are opaque, stable identifiers assigned by the federate core at
//! registration time. The value layer never fabricates one and never reads
//! meaning into the payload; it only uses them for registry lookups. Using
//! dedicated wrappers prevents accidental mixing of input and publication
//! identities.

/// Stable identifier for an input, assigned by the federate core.
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct InputHandle(pub u32);

/// Stable identifier for a publication, assigned by the federate core.
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PublicationHandle(pub u32);

impl std::fmt::Display for InputHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "input#{}", self.0)
    }
}

impl std::fmt::Display for PublicationHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "pub#{}", self.0)
    }
}
