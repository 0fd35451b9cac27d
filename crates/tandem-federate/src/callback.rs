// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Typed update callbacks.
//!
//! An input carries at most one typed callback: a tagged union of nine
//! function objects, one per primary value type, set exclusively.
//! Invocation converts the stored tagged value to the callback's declared
//! type under the container rules, so the installed signature does not have
//! to match the injection type exactly.

use tandem_value::{Complex, NamedPoint, SimTime, Value, ValueKind};

/// A time-only notification callback: fired when an input has an observable
/// update at the dispatch point, after any typed callback for the same
/// input in the same cycle. It receives the timestamp but not the value.
pub type NotificationCallback = Box<dyn FnMut(SimTime)>;

/// The typed callback slot: exactly one of nine signatures.
pub enum ValueCallback {
    /// Receives the double view of the update.
    Double(Box<dyn FnMut(f64, SimTime)>),
    /// Receives the integer view of the update.
    Integer(Box<dyn FnMut(i64, SimTime)>),
    /// Receives the string view of the update.
    Text(Box<dyn FnMut(&str, SimTime)>),
    /// Receives the complex view of the update.
    Complex(Box<dyn FnMut(Complex, SimTime)>),
    /// Receives the double-sequence view of the update.
    Vector(Box<dyn FnMut(&[f64], SimTime)>),
    /// Receives the complex-sequence view of the update.
    ComplexVector(Box<dyn FnMut(&[Complex], SimTime)>),
    /// Receives the named-point view of the update.
    NamedPoint(Box<dyn FnMut(&NamedPoint, SimTime)>),
    /// Receives the boolean view of the update.
    Boolean(Box<dyn FnMut(bool, SimTime)>),
    /// Receives the time view of the update.
    Time(Box<dyn FnMut(SimTime, SimTime)>),
}

impl ValueCallback {
    /// The primary kind this callback's signature declares.
    pub fn kind(&self) -> ValueKind {
        match self {
            ValueCallback::Double(_) => ValueKind::Double,
            ValueCallback::Integer(_) => ValueKind::Integer,
            ValueCallback::Text(_) => ValueKind::Text,
            ValueCallback::Complex(_) => ValueKind::Complex,
            ValueCallback::Vector(_) => ValueKind::Vector,
            ValueCallback::ComplexVector(_) => ValueKind::ComplexVector,
            ValueCallback::NamedPoint(_) => ValueKind::NamedPoint,
            ValueCallback::Boolean(_) => ValueKind::Boolean,
            ValueCallback::Time(_) => ValueKind::Time,
        }
    }

    /// Invokes the callback with `value` converted to the declared kind.
    pub(crate) fn invoke(&mut self, value: &Value, time: SimTime) {
        match self {
            ValueCallback::Double(f) => f(value.as_double(), time),
            ValueCallback::Integer(f) => f(value.as_integer(), time),
            ValueCallback::Text(f) => f(&value.to_text(), time),
            ValueCallback::Complex(f) => f(value.as_complex(), time),
            ValueCallback::Vector(f) => f(&value.to_vector(), time),
            ValueCallback::ComplexVector(f) => f(&value.to_complex_vector(), time),
            ValueCallback::NamedPoint(f) => f(&value.to_named_point(), time),
            ValueCallback::Boolean(f) => f(value.as_boolean(), time),
            ValueCallback::Time(f) => f(value.as_time(), time),
        }
    }
}

impl std::fmt::Debug for ValueCallback {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ValueCallback::{:?}", self.kind())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn invoke_converts_to_the_declared_kind() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        let mut cb = ValueCallback::Double(Box::new(move |v, _| sink.borrow_mut().push(v)));
        assert_eq!(cb.kind(), ValueKind::Double);

        cb.invoke(&Value::Text("2.5".into()), SimTime::ZERO);
        cb.invoke(&Value::Integer(4), SimTime::ZERO);
        assert_eq!(*seen.borrow(), vec![2.5, 4.0]);
    }

    #[test]
    fn text_callback_sees_named_point_label() {
        let seen = Rc::new(RefCell::new(String::new()));
        let sink = Rc::clone(&seen);
        let mut cb =
            ValueCallback::Text(Box::new(move |s, _| sink.borrow_mut().push_str(s)));
        cb.invoke(
            &Value::NamedPoint(NamedPoint::new("breaker", 1.0)),
            SimTime::ZERO,
        );
        assert_eq!(*seen.borrow(), "breaker");
    }
}
