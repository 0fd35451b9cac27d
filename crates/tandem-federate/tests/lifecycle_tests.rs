// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Lifecycle gating and close semantics.
//!
//! Shape mutations are only legal until initialization completes; defaults
//! only before execution begins; violations fail synchronously with no
//! partial effect. `close` is idempotent: updates stop, reads survive.

#![allow(clippy::unwrap_used)]

use tandem_federate::{
    FederateError, LoopbackCore, MultiInputMode, Phase, ValueCallback, ValueFederate,
};
use tandem_value::SimTime;

fn step(fed: &mut ValueFederate<LoopbackCore>, seconds: f64) {
    let time = SimTime::from_secs(seconds);
    fed.core_mut().advance_time(time);
    fed.process_updates(time).unwrap();
}

#[test]
fn phases_advance_one_way() {
    let mut fed = ValueFederate::new(LoopbackCore::new());
    assert_eq!(fed.phase(), Phase::Startup);
    fed.enter_initializing().unwrap();
    assert_eq!(fed.phase(), Phase::Initializing);
    assert!(matches!(
        fed.enter_initializing(),
        Err(FederateError::Lifecycle { .. })
    ));
    fed.enter_executing().unwrap();
    assert_eq!(fed.phase(), Phase::Executing);
    assert!(matches!(
        fed.enter_executing(),
        Err(FederateError::Lifecycle { .. })
    ));
    fed.finalize();
    fed.finalize(); // idempotent
    assert_eq!(fed.phase(), Phase::Finalized);
}

#[test]
fn executing_can_be_entered_straight_from_startup() {
    let mut fed = ValueFederate::new(LoopbackCore::new());
    fed.enter_executing().unwrap();
    assert_eq!(fed.phase(), Phase::Executing);
}

#[test]
fn registration_is_a_startup_only_operation() {
    let mut fed = ValueFederate::new(LoopbackCore::new());
    fed.enter_initializing().unwrap();
    assert!(matches!(
        fed.register_input("late", "double", ""),
        Err(FederateError::Lifecycle { .. })
    ));
    assert!(matches!(
        fed.register_publication("late", "double", ""),
        Err(FederateError::Lifecycle { .. })
    ));
}

#[test]
fn shape_mutations_lock_when_execution_begins() {
    let mut fed = ValueFederate::new(LoopbackCore::new());
    let input = fed.register_input("load", "double", "").unwrap();
    fed.register_publication("gen", "double", "").unwrap();
    fed.add_target(input, "gen").unwrap();
    fed.enter_initializing().unwrap();
    // still open during initialization
    fed.set_callback(input, ValueCallback::Double(Box::new(|_, _| {})))
        .unwrap();
    fed.set_multi_input_mode(input, MultiInputMode::Sum).unwrap();
    fed.set_default(input, 1.0).unwrap();
    fed.enter_executing().unwrap();

    assert!(matches!(
        fed.add_target(input, "other"),
        Err(FederateError::Lifecycle { .. })
    ));
    assert!(matches!(
        fed.remove_target(input, "gen"),
        Err(FederateError::Lifecycle { .. })
    ));
    assert!(matches!(
        fed.set_callback(input, ValueCallback::Double(Box::new(|_, _| {}))),
        Err(FederateError::Lifecycle { .. })
    ));
    assert!(matches!(
        fed.set_multi_input_mode(input, MultiInputMode::Max),
        Err(FederateError::Lifecycle { .. })
    ));
    assert!(matches!(
        fed.set_default(input, 2.0),
        Err(FederateError::Lifecycle { .. })
    ));
    // the failed default left the earlier one in place
    assert_eq!(fed.value::<f64>(input).unwrap(), 1.0);
    // value/option mutations stay legal
    fed.set_minimum_change(input, 0.25).unwrap();
    fed.enable_change_detection(input, false).unwrap();
    fed.set_option(input, 7, 1).unwrap();
    assert_eq!(fed.get_option(input, 7).unwrap(), 1);
}

#[test]
fn process_updates_requires_an_active_phase() {
    let mut fed = ValueFederate::new(LoopbackCore::new());
    assert!(matches!(
        fed.process_updates(SimTime::ZERO),
        Err(FederateError::Lifecycle { .. })
    ));
    fed.enter_executing().unwrap();
    fed.process_updates(SimTime::ZERO).unwrap();
    fed.finalize();
    assert!(matches!(
        fed.process_updates(SimTime::ZERO),
        Err(FederateError::Lifecycle { .. })
    ));
}

#[test]
fn publish_requires_an_active_phase() {
    let mut fed = ValueFederate::new(LoopbackCore::new());
    let publication = fed.register_publication("gen", "double", "").unwrap();
    assert!(matches!(
        fed.publish(publication, 1.0),
        Err(FederateError::Lifecycle { .. })
    ));
    fed.enter_initializing().unwrap();
    fed.publish(publication, 1.0).unwrap();
}

#[test]
fn unrecognised_declarations_fail_synchronously() {
    let mut fed = ValueFederate::new(LoopbackCore::new());
    assert!(matches!(
        fed.register_input("load", "quaternion", ""),
        Err(FederateError::UnknownTypeName(_))
    ));
    assert!(matches!(
        fed.register_input("load", "double", "furlong"),
        Err(FederateError::Unit(_))
    ));
    assert!(matches!(
        fed.register_publication("gen", "custom", ""),
        Err(FederateError::PublicationTypeRequired(_))
    ));
    // nothing was registered by the failed calls
    assert_eq!(fed.input_count(), 0);
    assert_eq!(fed.publication_count(), 0);
}

#[test]
fn duplicate_names_are_rejected() {
    let mut fed = ValueFederate::new(LoopbackCore::new());
    fed.register_input("load", "double", "").unwrap();
    assert!(matches!(
        fed.register_input("load", "int", ""),
        Err(FederateError::DuplicateName(_))
    ));
}

#[test]
fn callbacks_cannot_serve_custom_inputs() {
    let mut fed = ValueFederate::new(LoopbackCore::new());
    let input = fed.register_input("blob", "custom", "").unwrap();
    assert!(matches!(
        fed.set_callback(input, ValueCallback::Double(Box::new(|_, _| {}))),
        Err(FederateError::CallbackOnCustom { .. })
    ));
}

#[test]
fn unknown_handles_are_rejected() {
    let mut fed = ValueFederate::new(LoopbackCore::new());
    let bogus = tandem_federate::InputHandle(42);
    assert!(matches!(
        fed.value::<f64>(bogus),
        Err(FederateError::UnknownInput(_))
    ));
    assert!(matches!(
        fed.clear_update(bogus),
        Err(FederateError::UnknownInput(_))
    ));
}

#[test]
fn close_is_idempotent_and_reads_survive() {
    let mut fed = ValueFederate::new(LoopbackCore::new());
    let input = fed.register_input("load", "double", "").unwrap();
    let publication = fed.register_publication("gen", "double", "").unwrap();
    fed.add_target(input, "gen").unwrap();
    fed.enter_executing().unwrap();

    fed.publish(publication, 5.0).unwrap();
    step(&mut fed, 1.0);
    assert_eq!(fed.value::<f64>(input).unwrap(), 5.0);
    fed.clear_update(input).unwrap();

    fed.close_input(input).unwrap();
    fed.close_input(input).unwrap();

    fed.publish(publication, 9.0).unwrap();
    step(&mut fed, 2.0);
    assert!(!fed.is_updated(input).unwrap());
    assert_eq!(fed.value::<f64>(input).unwrap(), 5.0);
}

#[test]
fn lookup_by_name_and_target() {
    let mut fed = ValueFederate::new(LoopbackCore::new());
    let input = fed.register_input("load", "double", "").unwrap();
    fed.register_publication("gen", "double", "").unwrap();
    fed.add_target(input, "gen").unwrap();

    assert_eq!(fed.input_by_name("load"), Some(input));
    assert_eq!(fed.input_by_target("gen"), Some(input));
    assert_eq!(fed.input_by_name("gen"), None);

    let subscription = fed.register_subscription("gen", "").unwrap();
    // first binding wins for target lookup
    assert_eq!(fed.input_by_target("gen"), Some(input));
    assert_eq!(fed.input_by_name("gen"), Some(subscription));
}

#[test]
fn info_blob_round_trips() {
    let mut fed = ValueFederate::new(LoopbackCore::new());
    let input = fed.register_input("load", "double", "").unwrap();
    fed.set_info(input, "feeder 12 apparent power").unwrap();
    assert_eq!(fed.input(input).unwrap().info(), "feeder 12 apparent power");
}
