// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Change detection over tagged values.
//!
//! An input with change detection enabled only accepts a freshly decoded
//! value when it differs from the stored one by more than the configured
//! minimum delta. The rules here are the single source of truth for what
//! "differs enough" means per kind; `delta = 0` degenerates to strict
//! inequality, so exact re-publications of the same value never trigger.

use crate::value::Value;

/// Decides whether `candidate` differs from `previous` by more than `delta`.
///
/// - Differing tags always count as a change.
/// - Numeric scalars compare `|candidate − previous| > delta` (time in
///   seconds).
/// - Complex values and sequences compare the L∞ norm of the difference;
///   a length mismatch is always a change.
/// - Strings, named points, and booleans compare by equality; `delta` is
///   ignored.
#[must_use]
pub fn change_detected(previous: &Value, candidate: &Value, delta: f64) -> bool {
    match (previous, candidate) {
        (Value::Double(p), Value::Double(c)) => (c - p).abs() > delta,
        (Value::Integer(p), Value::Integer(c)) => {
            let diff = (i128::from(*c) - i128::from(*p)).unsigned_abs();
            diff as f64 > delta
        }
        (Value::Time(p), Value::Time(c)) => (c.to_secs() - p.to_secs()).abs() > delta,
        (Value::Complex(p), Value::Complex(c)) => {
            (c.re - p.re).abs() > delta || (c.im - p.im).abs() > delta
        }
        (Value::Vector(p), Value::Vector(c)) => {
            p.len() != c.len()
                || p.iter()
                    .zip(c.iter())
                    .any(|(a, b)| (b - a).abs() > delta)
        }
        (Value::ComplexVector(p), Value::ComplexVector(c)) => {
            p.len() != c.len()
                || p.iter().zip(c.iter()).any(|(a, b)| {
                    (b.re - a.re).abs() > delta || (b.im - a.im).abs() > delta
                })
        }
        (Value::Text(p), Value::Text(c)) => p != c,
        (Value::NamedPoint(p), Value::NamedPoint(c)) => p != c,
        (Value::Boolean(p), Value::Boolean(c)) => p != c,
        _ => true,
    }
}
