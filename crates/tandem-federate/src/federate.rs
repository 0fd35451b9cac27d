// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! The value-federate manager: input registry, lifecycle, and the scan.
//!
//! [`ValueFederate`] owns the federate core and every input and publication
//! registered against it, addressed by the core's stable handles. It is the
//! single mutation surface: each operation checks the federate phase before
//! touching state, so lifecycle violations fail synchronously with no
//! partial effect.
//!
//! After every time advance the application calls
//! [`ValueFederate::process_updates`]; inputs with pending buffers are
//! materialised in registration order, and callbacks are dispatched only
//! after the whole scan completes, in the same order, at most once per
//! input per cycle.

use std::collections::HashMap;

use bytes::Bytes;
use thiserror::Error;
use tracing::debug;

use tandem_value::{
    encode, DeclaredType, FromValue, PrimaryValue, SimTime, Unit, UnitError, Value, ValueKind,
};

use crate::callback::{NotificationCallback, ValueCallback};
use crate::core_port::FederateCore;
use crate::handle::{InputHandle, PublicationHandle};
use crate::input::{Input, InputError};
use crate::reduce::MultiInputMode;

/// Federate lifecycle phases. Transitions are one-way.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Phase {
    /// Interfaces are being declared; nothing flows yet.
    Startup,
    /// Initial values may be exchanged; shape is still reconfigurable.
    Initializing,
    /// Time advances and values flow; only value/option mutations remain.
    Executing,
    /// The federate has left the co-simulation; reads remain valid.
    Finalized,
}

/// Error raised synchronously by manager operations.
#[derive(Debug, Error)]
pub enum FederateError {
    /// A declared type name is not recognised.
    #[error("unrecognised type name '{0}'")]
    UnknownTypeName(String),
    /// Interface names must be unique within a federate.
    #[error("duplicate interface name '{0}'")]
    DuplicateName(String),
    /// The input handle is not registered with this federate.
    #[error("unknown {0}")]
    UnknownInput(InputHandle),
    /// The publication handle is not registered with this federate.
    #[error("unknown {0}")]
    UnknownPublication(PublicationHandle),
    /// The operation is not permitted in the current phase.
    #[error("cannot {operation} in the {phase:?} phase")]
    Lifecycle {
        /// What was attempted.
        operation: &'static str,
        /// The phase it was attempted in.
        phase: Phase,
    },
    /// Typed callbacks cannot serve a custom-typed input; custom payloads
    /// never pass through the tagged container.
    #[error("a '{callback}' callback cannot serve a custom-typed input")]
    CallbackOnCustom {
        /// The offending callback signature.
        callback: &'static str,
    },
    /// A unit expression failed to parse or bridge at configuration time.
    #[error(transparent)]
    Unit(#[from] UnitError),
    /// Publications must declare one of the nine primary types.
    #[error("publication '{0}' must declare a primary type")]
    PublicationTypeRequired(String),
}

/// A typed value source registered by this federate.
#[derive(Debug, Clone)]
pub struct Publication {
    handle: PublicationHandle,
    name: String,
    kind: ValueKind,
    units: Option<String>,
}

impl Publication {
    /// The core-assigned handle.
    pub fn handle(&self) -> PublicationHandle {
        self.handle
    }

    /// The publication's name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The declared primary type; published values are converted to it.
    pub fn kind(&self) -> ValueKind {
        self.kind
    }

    /// The declared units, if any.
    pub fn units(&self) -> Option<&str> {
        self.units.as_deref()
    }
}

/// Owns the federate core plus all inputs and publications, and runs the
/// per-cycle update scan.
pub struct ValueFederate<C> {
    core: C,
    phase: Phase,
    inputs: Vec<Input>,
    input_index: HashMap<InputHandle, usize>,
    input_by_name: HashMap<String, InputHandle>,
    input_by_target: HashMap<String, InputHandle>,
    publications: Vec<Publication>,
    publication_index: HashMap<PublicationHandle, usize>,
}

impl<C: FederateCore> ValueFederate<C> {
    /// Wraps a federate core. The federate starts in [`Phase::Startup`].
    pub fn new(core: C) -> Self {
        Self {
            core,
            phase: Phase::Startup,
            inputs: Vec::new(),
            input_index: HashMap::new(),
            input_by_name: HashMap::new(),
            input_by_target: HashMap::new(),
            publications: Vec::new(),
            publication_index: HashMap::new(),
        }
    }

    /// The current lifecycle phase.
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Direct access to the underlying core.
    pub fn core(&self) -> &C {
        &self.core
    }

    /// Mutable access to the underlying core.
    pub fn core_mut(&mut self) -> &mut C {
        &mut self.core
    }

    // ── Lifecycle ─────────────────────────────────────────────────

    /// Moves from startup into initialization.
    ///
    /// # Errors
    /// Returns a lifecycle error unless the federate is in startup.
    pub fn enter_initializing(&mut self) -> Result<(), FederateError> {
        if self.phase != Phase::Startup {
            return Err(self.lifecycle("enter initializing"));
        }
        self.phase = Phase::Initializing;
        Ok(())
    }

    /// Completes initialization and begins execution. Valid from startup
    /// (skipping the initializing phase) or from initializing.
    ///
    /// # Errors
    /// Returns a lifecycle error once executing or finalized.
    pub fn enter_executing(&mut self) -> Result<(), FederateError> {
        if !matches!(self.phase, Phase::Startup | Phase::Initializing) {
            return Err(self.lifecycle("enter executing"));
        }
        self.phase = Phase::Executing;
        Ok(())
    }

    /// Leaves the co-simulation. Idempotent; reads remain valid.
    pub fn finalize(&mut self) {
        self.phase = Phase::Finalized;
    }

    // ── Registration ──────────────────────────────────────────────

    /// Registers a named input with a declared type and optional output
    /// units.
    ///
    /// # Errors
    /// Fails outside startup, on an unrecognised type name, on a
    /// duplicate name, or on an unparseable unit expression.
    pub fn register_input(
        &mut self,
        name: &str,
        type_name: &str,
        units: &str,
    ) -> Result<InputHandle, FederateError> {
        if self.phase != Phase::Startup {
            return Err(self.lifecycle("register an input"));
        }
        let target_type = DeclaredType::parse(type_name)
            .ok_or_else(|| FederateError::UnknownTypeName(type_name.to_owned()))?;
        if self.input_by_name.contains_key(name) {
            return Err(FederateError::DuplicateName(name.to_owned()));
        }
        let output_units = if units.trim().is_empty() {
            None
        } else {
            Some(Unit::parse(units)?)
        };
        let handle = self.core.register_input(name, type_name, units);
        let index = self.inputs.len();
        self.inputs
            .push(Input::new(handle, name.to_owned(), target_type, output_units));
        self.input_index.insert(handle, index);
        self.input_by_name.insert(name.to_owned(), handle);
        debug!(name, type_name, %handle, "input registered");
        Ok(handle)
    }

    /// Registers an anonymous subscription: an unspecified-type input
    /// named after, and targeted at, the given publication.
    ///
    /// # Errors
    /// As [`ValueFederate::register_input`].
    pub fn register_subscription(
        &mut self,
        target: &str,
        units: &str,
    ) -> Result<InputHandle, FederateError> {
        let handle = self.register_input(target, "def", units)?;
        self.add_target(handle, target)?;
        Ok(handle)
    }

    /// Registers a typed publication.
    ///
    /// # Errors
    /// Fails outside startup, on a non-primary type name, on a duplicate
    /// name, or on an unparseable unit expression.
    pub fn register_publication(
        &mut self,
        name: &str,
        type_name: &str,
        units: &str,
    ) -> Result<PublicationHandle, FederateError> {
        if self.phase != Phase::Startup {
            return Err(self.lifecycle("register a publication"));
        }
        let declared = DeclaredType::parse(type_name)
            .ok_or_else(|| FederateError::UnknownTypeName(type_name.to_owned()))?;
        let DeclaredType::Primary(kind) = declared else {
            return Err(FederateError::PublicationTypeRequired(name.to_owned()));
        };
        if self.publications.iter().any(|p| p.name == name) {
            return Err(FederateError::DuplicateName(name.to_owned()));
        }
        if !units.trim().is_empty() {
            Unit::parse(units)?;
        }
        let handle = self.core.register_publication(name, type_name, units);
        let index = self.publications.len();
        self.publications.push(Publication {
            handle,
            name: name.to_owned(),
            kind,
            units: (!units.trim().is_empty()).then(|| units.to_owned()),
        });
        self.publication_index.insert(handle, index);
        debug!(name, type_name, %handle, "publication registered");
        Ok(handle)
    }

    // ── Shape configuration (until initialization completes) ──────

    /// Binds the named publication as a source of this input.
    ///
    /// # Errors
    /// Fails once executing, or on an unknown handle.
    pub fn add_target(
        &mut self,
        handle: InputHandle,
        target: &str,
    ) -> Result<(), FederateError> {
        self.require_shape_phase("add a target")?;
        let index = self.input_position(handle)?;
        self.core.add_target(handle, target);
        self.inputs[index].push_target(target.to_owned());
        self.input_by_target
            .entry(target.to_owned())
            .or_insert(handle);
        Ok(())
    }

    /// Unbinds the named publication from this input.
    ///
    /// # Errors
    /// Fails once executing, or on an unknown handle.
    pub fn remove_target(
        &mut self,
        handle: InputHandle,
        target: &str,
    ) -> Result<(), FederateError> {
        self.require_shape_phase("remove a target")?;
        let index = self.input_position(handle)?;
        self.core.remove_target(handle, target);
        self.inputs[index].drop_target(target);
        if self.input_by_target.get(target) == Some(&handle) {
            self.input_by_target.remove(target);
        }
        Ok(())
    }

    /// Installs the typed callback for this input, replacing any previous
    /// one. The signature's kind must be servable by the input's target
    /// type; every primary kind converts, so only custom targets reject.
    ///
    /// # Errors
    /// Fails once executing, on an unknown handle, or for a custom-typed
    /// input.
    pub fn set_callback(
        &mut self,
        handle: InputHandle,
        callback: ValueCallback,
    ) -> Result<(), FederateError> {
        self.require_shape_phase("install a callback")?;
        let index = self.input_position(handle)?;
        if self.inputs[index].target_type() == DeclaredType::Custom {
            return Err(FederateError::CallbackOnCustom {
                callback: callback.kind().type_name(),
            });
        }
        self.inputs[index].set_callback_slot(Some(callback));
        Ok(())
    }

    /// Installs the time-only notification callback; it fires after any
    /// typed callback for the same input, and only when the input has an
    /// observable update at the dispatch point.
    ///
    /// # Errors
    /// Fails once executing, or on an unknown handle.
    pub fn set_notification_callback(
        &mut self,
        handle: InputHandle,
        callback: NotificationCallback,
    ) -> Result<(), FederateError> {
        self.require_shape_phase("install a notification callback")?;
        let index = self.input_position(handle)?;
        self.inputs[index].set_notification_slot(Some(callback));
        Ok(())
    }

    /// Configures how multiple simultaneously bound publications reduce to
    /// one value.
    ///
    /// # Errors
    /// Fails once executing, or on an unknown handle.
    pub fn set_multi_input_mode(
        &mut self,
        handle: InputHandle,
        mode: MultiInputMode,
    ) -> Result<(), FederateError> {
        self.require_shape_phase("change the multi-input policy")?;
        let index = self.input_position(handle)?;
        self.inputs[index].set_mode(mode);
        Ok(())
    }

    /// Installs the tagged value readers see before any publication
    /// arrives.
    ///
    /// # Errors
    /// Fails once execution has begun, or on an unknown handle.
    pub fn set_default(
        &mut self,
        handle: InputHandle,
        value: impl Into<Value>,
    ) -> Result<(), FederateError> {
        if !matches!(self.phase, Phase::Startup | Phase::Initializing) {
            return Err(self.lifecycle("set a default"));
        }
        let index = self.input_position(handle)?;
        self.inputs[index].set_default(value.into());
        Ok(())
    }

    /// Installs a raw default buffer with the core, for custom-typed
    /// inputs whose payloads bypass the tagged container.
    ///
    /// # Errors
    /// Fails once execution has begun, or on an unknown handle.
    pub fn set_default_raw(
        &mut self,
        handle: InputHandle,
        data: Bytes,
    ) -> Result<(), FederateError> {
        if !matches!(self.phase, Phase::Startup | Phase::Initializing) {
            return Err(self.lifecycle("set a raw default"));
        }
        self.input_position(handle)?;
        self.core.set_default_raw(handle, data);
        Ok(())
    }

    // ── Value/option mutation (any phase before finalize) ─────────

    /// Sets the minimum delta for change detection: non-negative enables,
    /// negative disables and wipes the remembered delta.
    ///
    /// # Errors
    /// Fails on an unknown handle.
    pub fn set_minimum_change(
        &mut self,
        handle: InputHandle,
        delta: f64,
    ) -> Result<(), FederateError> {
        let index = self.input_position(handle)?;
        self.inputs[index].set_minimum_change(delta);
        Ok(())
    }

    /// Toggles change detection while preserving the configured delta.
    ///
    /// # Errors
    /// Fails on an unknown handle.
    pub fn enable_change_detection(
        &mut self,
        handle: InputHandle,
        enabled: bool,
    ) -> Result<(), FederateError> {
        let index = self.input_position(handle)?;
        self.inputs[index].enable_change_detection(enabled);
        Ok(())
    }

    /// Numeric values read as boolean compare against `threshold` instead
    /// of the plain non-zero test.
    ///
    /// # Errors
    /// Fails on an unknown handle.
    pub fn set_binary_threshold(
        &mut self,
        handle: InputHandle,
        threshold: f64,
    ) -> Result<(), FederateError> {
        let index = self.input_position(handle)?;
        self.inputs[index].set_binary_threshold(threshold);
        Ok(())
    }

    /// Restores the plain non-zero boolean test.
    ///
    /// # Errors
    /// Fails on an unknown handle.
    pub fn clear_binary_threshold(
        &mut self,
        handle: InputHandle,
    ) -> Result<(), FederateError> {
        let index = self.input_position(handle)?;
        self.inputs[index].clear_binary_threshold();
        Ok(())
    }

    /// Attaches an informational blob to the input.
    ///
    /// # Errors
    /// Fails on an unknown handle.
    pub fn set_info(&mut self, handle: InputHandle, info: &str) -> Result<(), FederateError> {
        let index = self.input_position(handle)?;
        self.inputs[index].set_info(info.to_owned());
        Ok(())
    }

    /// Forwards an opaque option to the core.
    ///
    /// # Errors
    /// Fails on an unknown handle.
    pub fn set_option(
        &mut self,
        handle: InputHandle,
        code: i32,
        value: i32,
    ) -> Result<(), FederateError> {
        self.input_position(handle)?;
        self.core.set_option(handle, code, value);
        Ok(())
    }

    /// Reads back an opaque option from the core.
    ///
    /// # Errors
    /// Fails on an unknown handle.
    pub fn get_option(&self, handle: InputHandle, code: i32) -> Result<i32, FederateError> {
        self.input_position(handle)?;
        Ok(self.core.get_option(handle, code))
    }

    // ── Updates and reads ─────────────────────────────────────────

    /// The per-cycle scan, run after a time advance returns. Materialises
    /// every pending buffer in registration order, then dispatches
    /// callbacks in the same order — typed before notification per input,
    /// at most one dispatch per input per cycle.
    ///
    /// # Errors
    /// Returns a lifecycle error outside the initializing or executing
    /// phases.
    pub fn process_updates(&mut self, time: SimTime) -> Result<(), FederateError> {
        if !matches!(self.phase, Phase::Initializing | Phase::Executing) {
            return Err(self.lifecycle("process updates"));
        }
        debug!(%time, "update scan begin");
        let mut dispatch = Vec::new();
        for index in 0..self.inputs.len() {
            if self.inputs[index].is_closed() {
                continue;
            }
            let fresh = self.core.is_updated(self.inputs[index].handle());
            if !fresh {
                continue;
            }
            let observable = self.inputs[index].ingest(&mut self.core);
            if observable && self.inputs[index].has_callback() {
                dispatch.push(index);
            }
        }
        let dispatched = dispatch.len();
        for index in dispatch {
            self.inputs[index].dispatch_callbacks(time);
        }
        debug!(dispatched, "update scan end");
        Ok(())
    }

    /// Lists the inputs currently observable as updated, in registration
    /// order.
    pub fn query_updates(&self) -> Vec<InputHandle> {
        self.inputs
            .iter()
            .filter(|input| input.is_updated(&self.core))
            .map(Input::handle)
            .collect()
    }

    /// Materialising update check: decodes, bridges, filters, and stores
    /// any pending buffer now. With `assume` set the core is not consulted
    /// and the already-materialised flag is returned.
    ///
    /// # Errors
    /// Fails on an unknown handle.
    pub fn check_update(
        &mut self,
        handle: InputHandle,
        assume: bool,
    ) -> Result<bool, FederateError> {
        let index = self.input_position(handle)?;
        Ok(self.inputs[index].check_update(&mut self.core, assume))
    }

    /// Side-effect-free update check. May over-report when a pending
    /// buffer would still be filtered by change detection (it has no
    /// permission to decode); use [`ValueFederate::check_update`] for the
    /// authoritative answer.
    ///
    /// # Errors
    /// Fails on an unknown handle.
    pub fn is_updated(&self, handle: InputHandle) -> Result<bool, FederateError> {
        let index = self.input_position(handle)?;
        Ok(self.inputs[index].is_updated(&self.core))
    }

    /// Clears the has-update flag without consuming the stored value.
    ///
    /// # Errors
    /// Fails on an unknown handle.
    pub fn clear_update(&mut self, handle: InputHandle) -> Result<(), FederateError> {
        let index = self.input_position(handle)?;
        self.inputs[index].clear_update();
        Ok(())
    }

    /// The stored value converted to `T` under the container rules.
    ///
    /// # Errors
    /// Fails on an unknown handle.
    pub fn value<T: FromValue>(&self, handle: InputHandle) -> Result<T, FederateError> {
        let index = self.input_position(handle)?;
        Ok(self.inputs[index].value::<T>())
    }

    /// Borrows the stored value as primary type `T`, converting in place
    /// first if needed. The borrow is valid until the next decode on the
    /// same input.
    ///
    /// # Errors
    /// Fails on an unknown handle.
    pub fn value_ref<T: PrimaryValue>(
        &mut self,
        handle: InputHandle,
    ) -> Result<&T, FederateError> {
        let index = self.input_position(handle)?;
        Ok(self.inputs[index].value_ref::<T>())
    }

    /// The most recent raw buffer delivered to this input.
    ///
    /// # Errors
    /// Fails on an unknown handle.
    pub fn raw_value(&self, handle: InputHandle) -> Result<Option<Bytes>, FederateError> {
        self.input_position(handle)?;
        Ok(self.core.raw_value(handle))
    }

    /// The size of the most recent raw buffer, zero when none has
    /// arrived.
    ///
    /// # Errors
    /// Fails on an unknown handle.
    pub fn raw_size(&self, handle: InputHandle) -> Result<usize, FederateError> {
        Ok(self.raw_value(handle)?.map_or(0, |b| b.len()))
    }

    /// The time of the most recent delivery to this input.
    ///
    /// # Errors
    /// Fails on an unknown handle.
    pub fn last_update_time(&self, handle: InputHandle) -> Result<SimTime, FederateError> {
        self.input_position(handle)?;
        Ok(self.core.last_update_time(handle))
    }

    /// Takes (and clears) the input's most recent recorded error.
    ///
    /// # Errors
    /// Fails on an unknown handle.
    pub fn take_last_error(
        &mut self,
        handle: InputHandle,
    ) -> Result<Option<InputError>, FederateError> {
        let index = self.input_position(handle)?;
        Ok(self.inputs[index].take_last_error())
    }

    /// Severs the input from the core. Idempotent; subsequent reads return
    /// the last stored value and updates stop.
    ///
    /// # Errors
    /// Fails on an unknown handle.
    pub fn close_input(&mut self, handle: InputHandle) -> Result<(), FederateError> {
        let index = self.input_position(handle)?;
        if !self.inputs[index].is_closed() {
            self.core.close_interface(handle);
            self.inputs[index].mark_closed();
        }
        Ok(())
    }

    // ── Publication surface ───────────────────────────────────────

    /// Publishes a typed value: converted to the publication's declared
    /// kind, encoded, and handed to the core as raw bytes.
    ///
    /// # Errors
    /// Fails outside the initializing/executing phases, or on an unknown
    /// handle.
    pub fn publish(
        &mut self,
        handle: PublicationHandle,
        value: impl Into<Value>,
    ) -> Result<(), FederateError> {
        if !matches!(self.phase, Phase::Initializing | Phase::Executing) {
            return Err(self.lifecycle("publish"));
        }
        let index = self
            .publication_index
            .get(&handle)
            .copied()
            .ok_or(FederateError::UnknownPublication(handle))?;
        let value = value.into().convert_to(self.publications[index].kind);
        self.core.publish_raw(handle, encode(&value));
        Ok(())
    }

    /// The publication registered under this handle.
    ///
    /// # Errors
    /// Fails on an unknown handle.
    pub fn publication(
        &self,
        handle: PublicationHandle,
    ) -> Result<&Publication, FederateError> {
        self.publication_index
            .get(&handle)
            .map(|&index| &self.publications[index])
            .ok_or(FederateError::UnknownPublication(handle))
    }

    // ── Lookup ────────────────────────────────────────────────────

    /// The input registered under this handle.
    ///
    /// # Errors
    /// Fails on an unknown handle.
    pub fn input(&self, handle: InputHandle) -> Result<&Input, FederateError> {
        let index = self.input_position(handle)?;
        Ok(&self.inputs[index])
    }

    /// Looks an input up by its registered name.
    pub fn input_by_name(&self, name: &str) -> Option<InputHandle> {
        self.input_by_name.get(name).copied()
    }

    /// Looks an input up by a bound target name (first binding wins).
    pub fn input_by_target(&self, target: &str) -> Option<InputHandle> {
        self.input_by_target.get(target).copied()
    }

    /// Number of registered inputs.
    pub fn input_count(&self) -> usize {
        self.inputs.len()
    }

    /// Number of registered publications.
    pub fn publication_count(&self) -> usize {
        self.publications.len()
    }

    // ── Internals ─────────────────────────────────────────────────

    fn input_position(&self, handle: InputHandle) -> Result<usize, FederateError> {
        self.input_index
            .get(&handle)
            .copied()
            .ok_or(FederateError::UnknownInput(handle))
    }

    fn require_shape_phase(&self, operation: &'static str) -> Result<(), FederateError> {
        if matches!(self.phase, Phase::Startup | Phase::Initializing) {
            Ok(())
        } else {
            Err(FederateError::Lifecycle {
                operation,
                phase: self.phase,
            })
        }
    }

    fn lifecycle(&self, operation: &'static str) -> FederateError {
        FederateError::Lifecycle {
            operation,
            phase: self.phase,
        }
    }
}
