// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! tandem-federate: the value-federate interface layer.
//!
//! A federate declares typed subscriptions ("inputs") and publications
//! against an underlying [`FederateCore`], which moves raw self-describing
//! byte buffers between federates. This crate materialises those buffers
//! into typed values: per-input decode, unit bridging, change detection,
//! multi-input reduction, and typed callback dispatch in a fixed phase of
//! the time-advancement cycle.
//!
//! The layer is single-threaded cooperative: every input mutation and the
//! per-cycle scan run on the federate's own thread, and the core's updated
//! set is frozen whenever a time advance returns (see [`ValueFederate::process_updates`]).
//!
//! Wire transport and time coordination live below the [`FederateCore`]
//! boundary and are out of scope; [`LoopbackCore`] provides an in-process
//! implementation for tests and demos.
#![forbid(unsafe_code)]
#![deny(missing_docs, rust_2018_idioms, unused_must_use)]
#![deny(
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    clippy::cargo,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::todo,
    clippy::unimplemented,
    clippy::dbg_macro,
    clippy::print_stdout,
    clippy::print_stderr
)]
#![allow(
    clippy::must_use_candidate,
    clippy::return_self_not_must_use,
    clippy::unreadable_literal,
    clippy::missing_const_for_fn,
    clippy::suboptimal_flops,
    clippy::redundant_pub_crate,
    clippy::many_single_char_names,
    clippy::module_name_repetitions,
    clippy::cast_possible_truncation,
    clippy::cast_precision_loss,
    clippy::cast_sign_loss,
    clippy::float_cmp,
    clippy::option_if_let_else,
    clippy::cargo_common_metadata,
    clippy::multiple_crate_versions,
    clippy::use_self
)]

mod callback;
mod core_port;
mod federate;
mod handle;
mod input;
mod loopback;
mod reduce;

pub use callback::{NotificationCallback, ValueCallback};
pub use core_port::{options, FederateCore};
pub use federate::{FederateError, Phase, Publication, ValueFederate};
pub use handle::{InputHandle, PublicationHandle};
pub use input::{Input, InputError};
pub use loopback::LoopbackCore;
pub use reduce::MultiInputMode;
