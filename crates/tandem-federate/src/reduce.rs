// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Multi-input reduction.
//!
//! An input bound to several publications collects one decoded value per
//! source each cycle and folds them into a single value under its
//! configured policy. The reduced value is then treated exactly as a
//! single publication would be: change detection, storage, callbacks.
//!
//! # Algebraic Categories
//!
//! **Commutative** (permutation-invariant): `And`, `Or`, `Sum`, `Max`,
//! `Min`, `Average` — the result is identical regardless of source order.
//!
//! **Order-dependent**: `Passthrough` (last value wins), `Diff` (left
//! fold `x₁ − x₂ − … − xₙ`), `Vectorize` (concatenation in target
//! registration order).
//!
//! # Empty Input Behaviour
//!
//! Reducing zero values yields `None`; the cycle simply produces no
//! candidate and the stored value is untouched.

use tandem_value::{Value, ValueKind};

/// Policy folding multiple simultaneously-bound publications into one value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum MultiInputMode {
    /// No reduction: the most recent arrival wins.
    #[default]
    Passthrough,
    /// Boolean conjunction; non-boolean sources coerce through the
    /// container rules.
    And,
    /// Boolean disjunction; non-boolean sources coerce likewise.
    Or,
    /// Numeric sum. All-integer sources stay integer (saturating),
    /// otherwise the fold runs in doubles.
    Sum,
    /// Left fold subtraction `x₁ − x₂ − … − xₙ`.
    Diff,
    /// Numeric maximum.
    Max,
    /// Numeric minimum.
    Min,
    /// Arithmetic mean in doubles: `sum / n` under IEEE-754 rounding.
    Average,
    /// Concatenates the sources' vector forms in target registration
    /// order.
    Vectorize,
}

impl MultiInputMode {
    /// Parses a policy name. Both the short names (`"and"`, `"sum"`) and
    /// the `_operation`-suffixed config spellings (`"and_operation"`) are
    /// accepted, case-insensitively; `"none"` and `""` mean passthrough.
    pub fn parse(name: &str) -> Option<MultiInputMode> {
        let lower = name.trim().to_ascii_lowercase();
        let stem = lower.strip_suffix("_operation").unwrap_or(&lower);
        match stem {
            "" | "none" | "passthrough" | "no_op" => Some(MultiInputMode::Passthrough),
            "and" => Some(MultiInputMode::And),
            "or" => Some(MultiInputMode::Or),
            "sum" => Some(MultiInputMode::Sum),
            "diff" => Some(MultiInputMode::Diff),
            "max" => Some(MultiInputMode::Max),
            "min" => Some(MultiInputMode::Min),
            "average" => Some(MultiInputMode::Average),
            "vectorize" => Some(MultiInputMode::Vectorize),
            _ => None,
        }
    }

    /// Returns `true` if the fold is permutation-invariant.
    pub fn is_commutative(self) -> bool {
        matches!(
            self,
            MultiInputMode::And
                | MultiInputMode::Or
                | MultiInputMode::Sum
                | MultiInputMode::Max
                | MultiInputMode::Min
                | MultiInputMode::Average
        )
    }

    /// Folds the cycle's decoded values (in target registration order)
    /// into the single value the input stores. Returns `None` when there
    /// is nothing to reduce.
    pub fn reduce(self, mut values: Vec<Value>) -> Option<Value> {
        if values.is_empty() {
            return None;
        }
        let all_integer = values.iter().all(|v| v.kind() == ValueKind::Integer);
        Some(match self {
            MultiInputMode::Passthrough => values.pop()?,
            MultiInputMode::And => Value::Boolean(values.iter().all(Value::as_boolean)),
            MultiInputMode::Or => Value::Boolean(values.iter().any(Value::as_boolean)),
            MultiInputMode::Sum => {
                if all_integer {
                    Value::Integer(
                        values
                            .iter()
                            .map(Value::as_integer)
                            .fold(0i64, i64::saturating_add),
                    )
                } else {
                    Value::Double(values.iter().map(Value::as_double).sum())
                }
            }
            MultiInputMode::Diff => {
                if all_integer {
                    let mut iter = values.iter().map(Value::as_integer);
                    let first = iter.next()?;
                    Value::Integer(iter.fold(first, i64::saturating_sub))
                } else {
                    let mut iter = values.iter().map(Value::as_double);
                    let first = iter.next()?;
                    Value::Double(iter.fold(first, |acc, x| acc - x))
                }
            }
            MultiInputMode::Max => {
                if all_integer {
                    Value::Integer(values.iter().map(Value::as_integer).max()?)
                } else {
                    Value::Double(
                        values
                            .iter()
                            .map(Value::as_double)
                            .fold(f64::NEG_INFINITY, f64::max),
                    )
                }
            }
            MultiInputMode::Min => {
                if all_integer {
                    Value::Integer(values.iter().map(Value::as_integer).min()?)
                } else {
                    Value::Double(
                        values
                            .iter()
                            .map(Value::as_double)
                            .fold(f64::INFINITY, f64::min),
                    )
                }
            }
            MultiInputMode::Average => {
                let sum: f64 = values.iter().map(Value::as_double).sum();
                Value::Double(sum / values.len() as f64)
            }
            MultiInputMode::Vectorize => Value::Vector(
                values
                    .iter()
                    .flat_map(Value::to_vector)
                    .collect(),
            ),
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn doubles(values: &[f64]) -> Vec<Value> {
        values.iter().copied().map(Value::Double).collect()
    }

    #[test]
    fn parse_accepts_both_spellings() {
        assert_eq!(MultiInputMode::parse("and"), Some(MultiInputMode::And));
        assert_eq!(
            MultiInputMode::parse("and_operation"),
            Some(MultiInputMode::And)
        );
        assert_eq!(
            MultiInputMode::parse("VECTORIZE_OPERATION"),
            Some(MultiInputMode::Vectorize)
        );
        assert_eq!(MultiInputMode::parse(""), Some(MultiInputMode::Passthrough));
        assert_eq!(MultiInputMode::parse("median"), None);
    }

    #[test]
    fn empty_input_reduces_to_none() {
        for mode in [
            MultiInputMode::Passthrough,
            MultiInputMode::And,
            MultiInputMode::Sum,
            MultiInputMode::Vectorize,
        ] {
            assert_eq!(mode.reduce(Vec::new()), None, "{mode:?}");
        }
    }

    #[test]
    fn and_or_coerce_non_booleans() {
        let values = vec![Value::Boolean(true), Value::Double(1.0)];
        assert_eq!(
            MultiInputMode::And.reduce(values.clone()),
            Some(Value::Boolean(true))
        );
        let with_zero = vec![Value::Boolean(true), Value::Integer(0)];
        assert_eq!(
            MultiInputMode::And.reduce(with_zero.clone()),
            Some(Value::Boolean(false))
        );
        assert_eq!(
            MultiInputMode::Or.reduce(with_zero),
            Some(Value::Boolean(true))
        );
    }

    #[test]
    fn sum_stays_integer_for_integer_sources() {
        let values = vec![Value::Integer(2), Value::Integer(3)];
        assert_eq!(MultiInputMode::Sum.reduce(values), Some(Value::Integer(5)));
        let mixed = vec![Value::Integer(2), Value::Double(0.5)];
        assert_eq!(MultiInputMode::Sum.reduce(mixed), Some(Value::Double(2.5)));
    }

    #[test]
    fn diff_folds_left() {
        assert_eq!(
            MultiInputMode::Diff.reduce(doubles(&[10.0, 3.0, 2.0])),
            Some(Value::Double(5.0))
        );
    }

    #[test]
    fn max_min_over_doubles() {
        assert_eq!(
            MultiInputMode::Max.reduce(doubles(&[1.0, 3.0, 2.0])),
            Some(Value::Double(3.0))
        );
        assert_eq!(
            MultiInputMode::Min.reduce(doubles(&[1.0, 3.0, 2.0])),
            Some(Value::Double(1.0))
        );
    }

    #[test]
    fn average_is_sum_over_n() {
        let xs = [1.0, 2.0, 4.0];
        let expected = xs.iter().sum::<f64>() / xs.len() as f64;
        assert_eq!(
            MultiInputMode::Average.reduce(doubles(&xs)),
            Some(Value::Double(expected))
        );
    }

    #[test]
    fn vectorize_concatenates_in_order() {
        let values = vec![Value::Double(1.0), Value::Vector(vec![2.0, 3.0])];
        assert_eq!(
            MultiInputMode::Vectorize.reduce(values),
            Some(Value::Vector(vec![1.0, 2.0, 3.0]))
        );
    }

    #[test]
    fn passthrough_takes_the_last_arrival() {
        let values = vec![Value::Double(1.0), Value::Double(2.0)];
        assert_eq!(
            MultiInputMode::Passthrough.reduce(values),
            Some(Value::Double(2.0))
        );
    }

    #[test]
    fn commutative_classification() {
        assert!(MultiInputMode::Sum.is_commutative());
        assert!(MultiInputMode::Average.is_commutative());
        assert!(!MultiInputMode::Diff.is_commutative());
        assert!(!MultiInputMode::Vectorize.is_commutative());
        assert!(!MultiInputMode::Passthrough.is_commutative());
    }
}
