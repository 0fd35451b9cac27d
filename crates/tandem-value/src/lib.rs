// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! tandem-value: typed value plumbing for the tandem co-simulation layer.
//!
//! This crate is the data plane of the value-federate interface: the tagged
//! container over the nine primary co-simulation types, the self-describing
//! byte codec used at the federate-core boundary, the unit bridge that maps
//! scalars between commensurable units, and the change detector that decides
//! whether a freshly decoded value is observable.
//!
//! Everything here is deterministic and side-effect free: no I/O, no clocks,
//! no ambient state. The federate layer (`tandem-federate`) composes these
//! pieces into inputs, publications, and the per-cycle update scan.
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

mod change;
mod codec;
mod time;
mod unit;
mod value;

pub use change::change_detected;
pub use codec::{decode, encode, peek_kind, CodecError};
pub use time::SimTime;
pub use unit::{LinearMap, Unit, UnitError};
pub use value::{
    Complex, ConversionError, DeclaredType, FromValue, NamedPoint, PrimaryValue, Value, ValueKind,
};
