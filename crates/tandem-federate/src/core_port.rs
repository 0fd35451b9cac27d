// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Port to the federate core.
//!
//! The core moves raw bytes between federates and coordinates time; this
//! layer consumes it through the [`FederateCore`] trait and never looks
//! behind it. The contract is synchronous: whenever a time advance has
//! returned, the set of updated handles and their raw buffers is frozen
//! until the next advance, so a scan observes a consistent snapshot.
//!
//! Implementations may be backed by sockets, shared memory, or anything
//! else; [`crate::LoopbackCore`] is the in-process reference used by tests.

use bytes::Bytes;
use tandem_value::SimTime;

use crate::handle::{InputHandle, PublicationHandle};

/// Well-known option codes forwarded through [`FederateCore::set_option`].
///
/// Codes are small non-negative integers; the layer is agnostic to their
/// meaning beyond forwarding, except where noted.
pub mod options {
    /// Error if an input has no connected publication at execution start.
    pub const CONNECTION_REQUIRED: i32 = 1;
    /// Ask the core to suppress re-delivery of unchanged raw buffers.
    pub const ONLY_UPDATE_ON_CHANGE: i32 = 2;
    /// Report integer saturation during unit conversion as a per-input
    /// error instead of saturating silently. Consumed by this layer.
    pub const REPORT_SATURATION: i32 = 3;
}

/// Synchronous contract with the underlying federate core.
///
/// All methods are infallible from this layer's point of view: a handle the
/// core does not recognise simply yields "nothing" (`None`, `false`, empty).
/// The manager validates handles before calling down.
pub trait FederateCore {
    /// Registers an input endpoint; the returned handle is stable for the
    /// life of the federate.
    fn register_input(&mut self, name: &str, type_name: &str, units: &str) -> InputHandle;

    /// Registers a publication endpoint.
    fn register_publication(
        &mut self,
        name: &str,
        type_name: &str,
        units: &str,
    ) -> PublicationHandle;

    /// Attaches the named publication as a source of `handle`.
    fn add_target(&mut self, handle: InputHandle, target: &str);

    /// Detaches the named publication from `handle`.
    fn remove_target(&mut self, handle: InputHandle, target: &str);

    /// The most recent raw buffer delivered to `handle` (or its raw
    /// default if nothing has arrived).
    fn raw_value(&self, handle: InputHandle) -> Option<Bytes>;

    /// The latest raw buffer from every bound source, in target
    /// registration order. Sources that have never published are skipped.
    fn raw_values(&self, handle: InputHandle) -> Vec<Bytes>;

    /// `true` while an unconsumed publication is pending for `handle`.
    fn is_updated(&self, handle: InputHandle) -> bool;

    /// Consumes the pending flag for `handle`.
    fn clear_updated(&mut self, handle: InputHandle);

    /// Declared type of the publication feeding `handle`, once known.
    fn injection_type(&self, handle: InputHandle) -> Option<String>;

    /// Declared units of the publication feeding `handle`, once known.
    fn injection_units(&self, handle: InputHandle) -> Option<String>;

    /// Declared type of `handle` itself, as registered.
    fn extraction_type(&self, handle: InputHandle) -> Option<String>;

    /// Declared units of `handle` itself, as registered.
    fn extraction_units(&self, handle: InputHandle) -> Option<String>;

    /// Time of the most recent delivery to `handle`.
    fn last_update_time(&self, handle: InputHandle) -> SimTime;

    /// Forwards an opaque option for `handle`. Cores without option
    /// support may keep the default no-op.
    fn set_option(&mut self, _handle: InputHandle, _code: i32, _value: i32) {}

    /// Reads back an opaque option for `handle` (zero when never set, and
    /// by default for cores without option support).
    fn get_option(&self, _handle: InputHandle, _code: i32) -> i32 {
        0
    }

    /// Installs the raw buffer returned before any publication arrives.
    fn set_default_raw(&mut self, handle: InputHandle, data: Bytes);

    /// Publishes a raw buffer through a registered publication.
    fn publish_raw(&mut self, handle: PublicationHandle, data: Bytes);

    /// Severs `handle` from the core; no further updates will be delivered.
    /// Idempotent.
    fn close_interface(&mut self, handle: InputHandle);
}
