// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! In-process federate core.
//!
//! `LoopbackCore` routes published buffers straight to the inputs whose
//! targets name the publication, with no transport underneath. It honours
//! the full [`FederateCore`] contract — per-source latest buffers, pending
//! flags, defaults, options, close — so the whole value layer can be
//! exercised end-to-end in tests and demos. Time does not advance by
//! itself: the harness moves the clock with [`LoopbackCore::advance_time`]
//! and deliveries are stamped with the current value.

use std::collections::HashMap;

use bytes::Bytes;
use tandem_value::SimTime;

use crate::core_port::FederateCore;
use crate::handle::{InputHandle, PublicationHandle};

#[derive(Debug, Default)]
struct CoreInput {
    type_name: String,
    units: String,
    targets: Vec<String>,
    latest_per_source: Vec<Option<Bytes>>,
    last_arrival: Option<Bytes>,
    default_raw: Option<Bytes>,
    pending: bool,
    last_update: SimTime,
    options: HashMap<i32, i32>,
    closed: bool,
}

#[derive(Debug)]
struct CorePublication {
    name: String,
    type_name: String,
    units: String,
}

/// An in-memory [`FederateCore`]: publications loop straight back to the
/// local inputs that target them.
#[derive(Debug, Default)]
pub struct LoopbackCore {
    time: SimTime,
    inputs: Vec<CoreInput>,
    publications: Vec<CorePublication>,
}

impl LoopbackCore {
    /// Creates an empty core at time zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Moves the core's clock; subsequent deliveries are stamped with the
    /// new time. Stands in for the time-coordination layer, which is out
    /// of scope here.
    pub fn advance_time(&mut self, time: SimTime) {
        self.time = time;
    }

    /// The core's current clock.
    pub fn now(&self) -> SimTime {
        self.time
    }

    fn input(&self, handle: InputHandle) -> Option<&CoreInput> {
        self.inputs.get(handle.0 as usize)
    }

    fn input_mut(&mut self, handle: InputHandle) -> Option<&mut CoreInput> {
        self.inputs.get_mut(handle.0 as usize)
    }

    /// Publication metadata for the first bound source of `handle`.
    fn first_source(&self, handle: InputHandle) -> Option<&CorePublication> {
        let input = self.input(handle)?;
        input.targets.iter().find_map(|target| {
            self.publications.iter().find(|p| &p.name == target)
        })
    }
}

impl FederateCore for LoopbackCore {
    fn register_input(&mut self, _name: &str, type_name: &str, units: &str) -> InputHandle {
        let handle = InputHandle(self.inputs.len() as u32);
        self.inputs.push(CoreInput {
            type_name: type_name.to_owned(),
            units: units.to_owned(),
            ..CoreInput::default()
        });
        handle
    }

    fn register_publication(
        &mut self,
        name: &str,
        type_name: &str,
        units: &str,
    ) -> PublicationHandle {
        let handle = PublicationHandle(self.publications.len() as u32);
        self.publications.push(CorePublication {
            name: name.to_owned(),
            type_name: type_name.to_owned(),
            units: units.to_owned(),
        });
        handle
    }

    fn add_target(&mut self, handle: InputHandle, target: &str) {
        if let Some(input) = self.input_mut(handle) {
            if !input.targets.iter().any(|t| t == target) {
                input.targets.push(target.to_owned());
                input.latest_per_source.push(None);
            }
        }
    }

    fn remove_target(&mut self, handle: InputHandle, target: &str) {
        if let Some(input) = self.input_mut(handle) {
            if let Some(position) = input.targets.iter().position(|t| t == target) {
                input.targets.remove(position);
                input.latest_per_source.remove(position);
            }
        }
    }

    fn raw_value(&self, handle: InputHandle) -> Option<Bytes> {
        let input = self.input(handle)?;
        input
            .last_arrival
            .clone()
            .or_else(|| input.default_raw.clone())
    }

    fn raw_values(&self, handle: InputHandle) -> Vec<Bytes> {
        self.input(handle).map_or_else(Vec::new, |input| {
            input
                .latest_per_source
                .iter()
                .filter_map(Clone::clone)
                .collect()
        })
    }

    fn is_updated(&self, handle: InputHandle) -> bool {
        self.input(handle)
            .is_some_and(|input| input.pending && !input.closed)
    }

    fn clear_updated(&mut self, handle: InputHandle) {
        if let Some(input) = self.input_mut(handle) {
            input.pending = false;
        }
    }

    fn injection_type(&self, handle: InputHandle) -> Option<String> {
        self.first_source(handle).map(|p| p.type_name.clone())
    }

    fn injection_units(&self, handle: InputHandle) -> Option<String> {
        self.first_source(handle).map(|p| p.units.clone())
    }

    fn extraction_type(&self, handle: InputHandle) -> Option<String> {
        self.input(handle).map(|input| input.type_name.clone())
    }

    fn extraction_units(&self, handle: InputHandle) -> Option<String> {
        self.input(handle).map(|input| input.units.clone())
    }

    fn last_update_time(&self, handle: InputHandle) -> SimTime {
        self.input(handle)
            .map_or(SimTime::ZERO, |input| input.last_update)
    }

    fn set_option(&mut self, handle: InputHandle, code: i32, value: i32) {
        if let Some(input) = self.input_mut(handle) {
            input.options.insert(code, value);
        }
    }

    fn get_option(&self, handle: InputHandle, code: i32) -> i32 {
        self.input(handle)
            .and_then(|input| input.options.get(&code).copied())
            .unwrap_or(0)
    }

    fn set_default_raw(&mut self, handle: InputHandle, data: Bytes) {
        if let Some(input) = self.input_mut(handle) {
            input.default_raw = Some(data);
        }
    }

    fn publish_raw(&mut self, handle: PublicationHandle, data: Bytes) {
        let Some(publication) = self.publications.get(handle.0 as usize) else {
            return;
        };
        let name = publication.name.clone();
        let time = self.time;
        for input in &mut self.inputs {
            if input.closed {
                continue;
            }
            let mut delivered = false;
            for (slot, target) in input.latest_per_source.iter_mut().zip(&input.targets) {
                if target == &name {
                    *slot = Some(data.clone());
                    delivered = true;
                }
            }
            if delivered {
                input.last_arrival = Some(data.clone());
                input.pending = true;
                input.last_update = time;
            }
        }
    }

    fn close_interface(&mut self, handle: InputHandle) {
        if let Some(input) = self.input_mut(handle) {
            input.closed = true;
            input.pending = false;
        }
    }
}
