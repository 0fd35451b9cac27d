// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! The input object: per-subscription state and the materialisation path.
//!
//! An [`Input`] holds everything a subscription accumulates over its life:
//! the declared target type, the lazily loaded source information, the most
//! recent decoded value, the change-detection policy, unit bridging state,
//! and the callback slots. The pipeline for a pending raw buffer is fixed:
//! decode → reduce (multi-input) → unit bridge → target conversion →
//! change detection → store.
//!
//! Mutating operations that need the federate core take it as an explicit
//! argument; the manager owns both and addresses inputs by handle, so no
//! back-reference exists (and no cycle of owning references can form).

use bytes::Bytes;
use thiserror::Error;
use tracing::warn;

use tandem_value::{
    change_detected, decode, CodecError, DeclaredType, FromValue, LinearMap, PrimaryValue,
    SimTime, Unit, UnitError, Value, ValueKind,
};

use crate::callback::{NotificationCallback, ValueCallback};
use crate::core_port::{options, FederateCore};
use crate::handle::InputHandle;
use crate::reduce::MultiInputMode;

/// Per-input error recorded by a scan or read and surfaced at the next
/// read through [`Input::last_error`].
#[derive(Debug, Clone, PartialEq, Error)]
pub enum InputError {
    /// A raw buffer did not decode.
    #[error("input '{name}': {len}-byte buffer does not decode as {claimed}: {source}")]
    Decode {
        /// Input display name.
        name: String,
        /// Length of the offending buffer.
        len: usize,
        /// The injection type the buffer claimed to carry.
        claimed: &'static str,
        /// The codec failure.
        source: CodecError,
    },
    /// A buffer decoded cleanly but contradicted the declared injection
    /// type.
    #[error("input '{name}': decoded {found} but the publication declares {claimed}")]
    InjectionMismatch {
        /// Input display name.
        name: String,
        /// Kind actually found in the buffer.
        found: &'static str,
        /// Kind the source metadata declares.
        claimed: &'static str,
    },
    /// A string value failed to parse as the target's numeric kind; the
    /// zero fallback was stored.
    #[error("input '{name}': cannot interpret '{text}' as {target}")]
    Conversion {
        /// Input display name.
        name: String,
        /// The unparseable text.
        text: String,
        /// The requested kind.
        target: &'static str,
    },
    /// Unit parsing or bridging failed for this input's unit pair.
    #[error("input '{name}': {source}")]
    Unit {
        /// Input display name.
        name: String,
        /// The unit failure.
        source: UnitError,
    },
    /// Unit conversion saturated an integer value (reported only when the
    /// [`options::REPORT_SATURATION`] option is set).
    #[error("input '{name}': integer saturated during unit conversion")]
    IntegerSaturation {
        /// Input display name.
        name: String,
    },
}

/// A federate-local endpoint receiving typed values from one or more
/// publications.
///
/// Reads are available directly; every shape or policy mutation flows
/// through [`crate::ValueFederate`], which enforces the lifecycle rules.
pub struct Input {
    handle: InputHandle,
    name: String,
    info: String,
    target_type: DeclaredType,
    injection_type: DeclaredType,
    source_loaded: bool,
    mode: MultiInputMode,
    targets: Vec<String>,
    value: Option<Value>,
    custom_raw: Option<Bytes>,
    has_update: bool,
    change_detection: bool,
    delta: f64,
    threshold: Option<f64>,
    output_units: Option<Unit>,
    input_units: Option<Unit>,
    unit_map: Option<LinearMap>,
    unit_error: Option<UnitError>,
    last_error: Option<InputError>,
    callback: Option<ValueCallback>,
    notify: Option<NotificationCallback>,
    closed: bool,
}

impl Input {
    pub(crate) fn new(
        handle: InputHandle,
        name: String,
        target_type: DeclaredType,
        output_units: Option<Unit>,
    ) -> Self {
        Self {
            handle,
            name,
            info: String::new(),
            target_type,
            injection_type: DeclaredType::Unknown,
            source_loaded: false,
            mode: MultiInputMode::default(),
            targets: Vec::new(),
            value: None,
            custom_raw: None,
            has_update: false,
            change_detection: false,
            delta: -1.0,
            threshold: None,
            output_units,
            input_units: None,
            unit_map: None,
            unit_error: None,
            last_error: None,
            callback: None,
            notify: None,
            closed: false,
        }
    }

    // ── Read surface ──────────────────────────────────────────────

    /// The core-assigned handle.
    pub fn handle(&self) -> InputHandle {
        self.handle
    }

    /// The input's registered local name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The display name: the local name, or the first bound target when
    /// the local name is empty.
    pub fn display_name(&self) -> &str {
        if self.name.is_empty() {
            self.targets.first().map_or("", String::as_str)
        } else {
            &self.name
        }
    }

    /// The informational blob attached to this input.
    pub fn info(&self) -> &str {
        &self.info
    }

    /// The declared target type.
    pub fn target_type(&self) -> DeclaredType {
        self.target_type
    }

    /// The type of the connected publication; `Unknown` until the first
    /// byte of source information has been loaded.
    pub fn injection_type(&self) -> DeclaredType {
        self.injection_type
    }

    /// The configured multi-input policy.
    pub fn multi_input_mode(&self) -> MultiInputMode {
        self.mode
    }

    /// The publication names this input is bound to, in registration
    /// order.
    pub fn targets(&self) -> &[String] {
        &self.targets
    }

    /// The units the connected publication declares, once loaded.
    pub fn input_units(&self) -> Option<&Unit> {
        self.input_units.as_ref()
    }

    /// The units this federate requested at registration.
    pub fn output_units(&self) -> Option<&Unit> {
        self.output_units.as_ref()
    }

    /// `true` after [`close`](crate::ValueFederate::close_input).
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// The most recent per-input error, if a scan or read recorded one.
    pub fn last_error(&self) -> Option<&InputError> {
        self.last_error.as_ref()
    }

    /// Takes (and clears) the most recent per-input error.
    pub fn take_last_error(&mut self) -> Option<InputError> {
        self.last_error.take()
    }

    /// The stored value converted to `T` under the container rules.
    ///
    /// Before any publication or default arrives this reads as the zero of
    /// the target type.
    pub fn value<T: FromValue>(&self) -> T {
        T::from_value(&self.stored_or_default())
    }

    /// Borrows the stored value as primary type `T`, converting it in
    /// place first if necessary. The borrow is valid until the next decode
    /// on this input.
    pub fn value_ref<T: PrimaryValue>(&mut self) -> &T {
        if self.value.is_none() {
            self.value = Some(self.default_value());
        }
        let ready = self
            .value
            .as_ref()
            .is_some_and(|v| T::peek(v).is_some());
        if !ready {
            if let Some(v) = self.value.as_mut() {
                v.convert_in_place(T::KIND);
            }
        }
        match self.value.as_ref().and_then(T::peek) {
            Some(payload) => payload,
            None => unreachable!("value was just converted to the requested kind"),
        }
    }

    /// The payload size of the stored value if read as a string.
    pub fn string_size(&self) -> usize {
        self.stored_or_default().to_text().len()
    }

    /// The element count of the stored value if read as a vector.
    pub fn vector_size(&self) -> usize {
        self.stored_or_default().to_vector().len()
    }

    /// The opaquely stored buffer for a `custom`-typed input.
    pub fn custom_payload(&self) -> Option<&Bytes> {
        self.custom_raw.as_ref()
    }

    // ── Policy mutation (lifecycle-gated by the manager) ──────────

    /// Installs the value returned by readers before any publication
    /// arrives.
    pub(crate) fn set_default(&mut self, value: Value) {
        self.value = Some(value);
    }

    /// Sets the minimum delta. A non-negative delta enables change
    /// detection; a negative one disables it and wipes the remembered
    /// delta.
    pub(crate) fn set_minimum_change(&mut self, delta: f64) {
        if self.delta < 0.0 {
            self.change_detection = true;
        }
        self.delta = delta;
        if self.delta < 0.0 {
            self.change_detection = false;
        }
    }

    /// Toggles change detection while preserving the delta.
    pub(crate) fn enable_change_detection(&mut self, enabled: bool) {
        self.change_detection = enabled;
    }

    /// Numeric values read as boolean compare against `threshold` instead
    /// of the plain non-zero test.
    pub(crate) fn set_binary_threshold(&mut self, threshold: f64) {
        self.threshold = Some(threshold);
    }

    /// Restores the plain non-zero boolean test.
    pub(crate) fn clear_binary_threshold(&mut self) {
        self.threshold = None;
    }

    pub(crate) fn set_info(&mut self, info: String) {
        self.info = info;
    }

    pub(crate) fn set_mode(&mut self, mode: MultiInputMode) {
        self.mode = mode;
    }

    pub(crate) fn set_callback_slot(&mut self, callback: Option<ValueCallback>) {
        self.callback = callback;
    }

    pub(crate) fn set_notification_slot(&mut self, notify: Option<NotificationCallback>) {
        self.notify = notify;
    }

    pub(crate) fn push_target(&mut self, target: String) {
        if !self.targets.contains(&target) {
            self.targets.push(target);
        }
    }

    pub(crate) fn drop_target(&mut self, target: &str) {
        self.targets.retain(|t| t != target);
    }

    pub(crate) fn mark_closed(&mut self) {
        self.closed = true;
    }

    pub(crate) fn has_callback(&self) -> bool {
        self.callback.is_some() || self.notify.is_some()
    }

    // ── Update pipeline ───────────────────────────────────────────

    /// `true` iff a new value is observable. Side-effect free; may
    /// over-report when a pending buffer would still be filtered by
    /// change detection, because this form has no permission to decode.
    /// [`Input::check_update`] is the authoritative, materialising form.
    pub(crate) fn is_updated<C: FederateCore>(&self, core: &C) -> bool {
        if self.closed {
            return self.has_update;
        }
        self.has_update || core.is_updated(self.handle)
    }

    /// Clears the has-update flag without consuming the stored value.
    pub(crate) fn clear_update(&mut self) {
        self.has_update = false;
    }

    /// Materialising update check. With `assume` set the core is not
    /// consulted (the registry has already decoded this cycle) and the
    /// current flag is returned; otherwise any pending buffer is decoded,
    /// bridged, filtered, and stored now.
    pub(crate) fn check_update<C: FederateCore>(&mut self, core: &mut C, assume: bool) -> bool {
        if assume {
            return self.has_update;
        }
        self.ingest(core)
    }

    /// Consumes a pending raw buffer, if any, through the full pipeline.
    /// Returns `true` when an update is observable afterwards.
    pub(crate) fn ingest<C: FederateCore>(&mut self, core: &mut C) -> bool {
        if self.closed || !core.is_updated(self.handle) {
            return self.has_update;
        }
        self.load_source_information(core);
        core.clear_updated(self.handle);

        if let Some(unit_error) = &self.unit_error {
            // Misconfigured unit pair: consume the buffer, store nothing.
            self.last_error = Some(InputError::Unit {
                name: self.name.clone(),
                source: unit_error.clone(),
            });
            warn!(input = %self.name, error = %unit_error, "dropping update: unit bridge unavailable");
            return self.has_update;
        }

        if self.target_type == DeclaredType::Custom {
            if let Some(raw) = core.raw_value(self.handle) {
                self.custom_raw = Some(raw);
                self.has_update = true;
            }
            return self.has_update;
        }

        let Some(candidate) = self.collect_candidate(core) else {
            return self.has_update;
        };
        let report_saturation = core.get_option(self.handle, options::REPORT_SATURATION) != 0;
        let candidate = self.apply_units(candidate, report_saturation);
        let candidate = self.apply_target_conversion(candidate);

        if self.change_detection && self.delta >= 0.0 {
            // Before any store, the comparison baseline is the same typed
            // zero that readers see.
            let previous = self.stored_or_default();
            if !change_detected(&previous, &candidate, self.delta) {
                return self.has_update;
            }
        }
        self.value = Some(candidate);
        self.has_update = true;
        true
    }

    /// Fires the typed callback, then the notification callback, when an
    /// observable update is pending. Called by the registry after its scan
    /// completes, so a callback reading this input sees the value that
    /// triggered it.
    pub(crate) fn dispatch_callbacks(&mut self, time: SimTime) {
        if !self.has_update {
            return;
        }
        let value = self.stored_or_default();
        if let Some(callback) = self.callback.as_mut() {
            callback.invoke(&value, time);
        }
        if let Some(notify) = self.notify.as_mut() {
            notify(time);
        }
    }

    // ── Pipeline stages ───────────────────────────────────────────

    /// Loads injection type and units from the core the first time a value
    /// arrives. Publications may connect after the input is declared, so
    /// this cannot run at construction.
    fn load_source_information<C: FederateCore>(&mut self, core: &C) {
        if self.source_loaded {
            return;
        }
        let Some(type_name) = core.injection_type(self.handle) else {
            return;
        };
        self.injection_type =
            DeclaredType::parse(&type_name).unwrap_or(DeclaredType::Custom);
        self.source_loaded = true;

        let units_text = core
            .injection_units(self.handle)
            .filter(|text| !text.trim().is_empty());
        let Some(units_text) = units_text else {
            return;
        };
        match Unit::parse(&units_text) {
            Ok(unit) => {
                if let Some(output) = &self.output_units {
                    match unit.conversion_to(output) {
                        Ok(map) if map.is_identity() => {}
                        Ok(map) => self.unit_map = Some(map),
                        Err(err) => self.unit_error = Some(err),
                    }
                }
                self.input_units = Some(unit);
            }
            Err(err) => {
                if self.output_units.is_some() {
                    self.unit_error = Some(err);
                }
            }
        }
    }

    /// Decodes this cycle's raw buffers and reduces them to one candidate.
    fn collect_candidate<C: FederateCore>(&mut self, core: &C) -> Option<Value> {
        if self.targets.len() > 1 && self.mode != MultiInputMode::Passthrough {
            let mut decoded = Vec::new();
            for raw in core.raw_values(self.handle) {
                match decode(&raw) {
                    Ok(value) => decoded.push(value),
                    Err(err) => self.record_decode_error(raw.len(), err),
                }
            }
            self.mode.reduce(decoded)
        } else {
            let raw = core.raw_value(self.handle)?;
            match decode(&raw) {
                Ok(value) => {
                    if let DeclaredType::Primary(claimed) = self.injection_type {
                        if value.kind() != claimed {
                            self.last_error = Some(InputError::InjectionMismatch {
                                name: self.name.clone(),
                                found: value.kind().type_name(),
                                claimed: claimed.type_name(),
                            });
                            warn!(
                                input = %self.name,
                                found = value.kind().type_name(),
                                claimed = claimed.type_name(),
                                "dropping update: injection type mismatch"
                            );
                            return None;
                        }
                    }
                    Some(value)
                }
                Err(err) => {
                    self.record_decode_error(raw.len(), err);
                    None
                }
            }
        }
    }

    fn record_decode_error(&mut self, len: usize, source: CodecError) {
        warn!(input = %self.name, len, error = %source, "dropping update: decode failed");
        self.last_error = Some(InputError::Decode {
            name: self.name.clone(),
            len,
            claimed: self.injection_type.type_name(),
            source,
        });
    }

    /// Applies the unit bridge to the numeric shapes it covers.
    fn apply_units(&mut self, mut value: Value, report_saturation: bool) -> Value {
        let Some(map) = self.unit_map else {
            return value;
        };
        match &mut value {
            Value::Double(d) => *d = map.apply(*d),
            Value::Integer(i) => {
                let (converted, saturated) = map.apply_integer(*i);
                *i = converted;
                if saturated && report_saturation {
                    self.last_error = Some(InputError::IntegerSaturation {
                        name: self.name.clone(),
                    });
                }
            }
            Value::Vector(v) => map.apply_slice(v),
            _ => {}
        }
        value
    }

    /// Converts the candidate to the declared target type, recording (but
    /// surviving) string-parse failures; the binary threshold overrides
    /// the boolean conversion for numeric candidates.
    fn apply_target_conversion(&mut self, value: Value) -> Value {
        let DeclaredType::Primary(kind) = self.target_type else {
            return value;
        };
        if kind == ValueKind::Boolean {
            if let Some(threshold) = self.threshold {
                if value.kind() != ValueKind::Text && value.kind() != ValueKind::Boolean {
                    return Value::Boolean(value.as_double() > threshold);
                }
            }
        }
        match value.convert_to_checked(kind) {
            Ok(converted) => converted,
            Err(err) => {
                self.last_error = Some(InputError::Conversion {
                    name: self.name.clone(),
                    text: err.text,
                    target: err.target.type_name(),
                });
                value.convert_to(kind)
            }
        }
    }

    fn default_value(&self) -> Value {
        match self.target_type {
            DeclaredType::Primary(kind) => kind.default_value(),
            _ => Value::Double(0.0),
        }
    }

    fn stored_or_default(&self) -> Value {
        self.value.clone().unwrap_or_else(|| self.default_value())
    }
}

impl std::fmt::Debug for Input {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Input")
            .field("handle", &self.handle)
            .field("name", &self.name)
            .field("target_type", &self.target_type)
            .field("injection_type", &self.injection_type)
            .field("mode", &self.mode)
            .field("value", &self.value)
            .field("has_update", &self.has_update)
            .field("closed", &self.closed)
            .finish_non_exhaustive()
    }
}
