// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Unit bridge: commensurability and linear maps between measurement units.
//!
//! Publication metadata declares units as compact expressions (`m`, `kW`,
//! `m/s^2`, `degC`). A [`Unit`] resolves such an expression to a dimension
//! vector over the seven SI base dimensions plus an affine map into SI; two
//! units are commensurable exactly when their dimension vectors match, and
//! the bridge between them is the linear map `y = a·x + b`. The offset `b`
//! is non-zero only for the bare affine temperature units.
//!
//! The grammar is deliberately small: an optional SI prefix on a known
//! symbol, `*` products, a single `/` quotient, and integer `^` exponents.
//! Affine units are only valid standing alone; `degC/s` is rejected rather
//! than silently mis-scaled.

use thiserror::Error;

/// Number of base dimensions tracked: m, kg, s, A, K, mol, cd.
const DIMS: usize = 7;

/// Error raised while parsing unit expressions or bridging units.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UnitError {
    /// A symbol in the expression is not in the unit table.
    #[error("unknown unit symbol '{symbol}' in '{expression}'")]
    UnknownSymbol {
        /// The unresolvable token.
        symbol: String,
        /// The full expression it came from.
        expression: String,
    },
    /// The expression does not follow the unit grammar.
    #[error("malformed unit expression '{0}'")]
    Malformed(String),
    /// An affine unit (degC, degF) was used inside a product or quotient.
    #[error("affine unit may not appear in a compound expression: '{0}'")]
    AffineCompound(String),
    /// The two units measure different dimensions; no bridge exists.
    #[error("units '{from}' and '{to}' are not commensurable")]
    Incommensurable {
        /// Source unit expression.
        from: String,
        /// Destination unit expression.
        to: String,
    },
}

/// A parsed unit: a dimension vector and an affine map into SI.
///
/// `si = scale · x + offset` for a quantity `x` expressed in this unit.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Unit {
    name: String,
    dims: [i8; DIMS],
    scale: f64,
    offset: f64,
}

impl Unit {
    /// Parses a unit expression.
    ///
    /// # Errors
    /// Returns a [`UnitError`] for unknown symbols, a malformed expression,
    /// or an affine unit inside a compound.
    pub fn parse(expression: &str) -> Result<Unit, UnitError> {
        let text = expression.trim();
        if text.is_empty() {
            return Err(UnitError::Malformed(expression.to_owned()));
        }

        let mut parts = text.splitn(3, '/');
        let numerator = parts.next().unwrap_or_default();
        let denominator = parts.next();
        if parts.next().is_some() {
            return Err(UnitError::Malformed(expression.to_owned()));
        }

        let mut dims = [0i8; DIMS];
        let mut scale = 1.0f64;
        let mut offset = 0.0f64;
        let mut factor_count = 0usize;
        let mut saw_affine = false;

        let mut accumulate = |side: &str, sign: i8| -> Result<(), UnitError> {
            for token in side.split('*') {
                let token = token.trim();
                if token.is_empty() {
                    return Err(UnitError::Malformed(expression.to_owned()));
                }
                let (symbol, exponent) = split_exponent(token, expression)?;
                let resolved = resolve(symbol).ok_or_else(|| UnitError::UnknownSymbol {
                    symbol: symbol.to_owned(),
                    expression: expression.to_owned(),
                })?;
                factor_count += 1;
                let applied = i32::from(sign) * exponent;
                if resolved.offset != 0.0 {
                    saw_affine = true;
                    if applied != 1 {
                        return Err(UnitError::AffineCompound(expression.to_owned()));
                    }
                    offset = resolved.offset;
                }
                for (dim, base) in dims.iter_mut().zip(resolved.dims) {
                    *dim += base * sign * exponent as i8;
                }
                scale *= resolved.scale.powi(applied);
            }
            Ok(())
        };

        accumulate(numerator, 1)?;
        if let Some(denominator) = denominator {
            accumulate(denominator, -1)?;
        }
        if saw_affine && factor_count > 1 {
            return Err(UnitError::AffineCompound(expression.to_owned()));
        }

        Ok(Unit {
            name: text.to_owned(),
            dims,
            scale,
            offset,
        })
    }

    /// The expression this unit was parsed from.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns `true` if both units measure the same dimensions.
    pub fn commensurable_with(&self, other: &Unit) -> bool {
        self.dims == other.dims
    }

    /// Produces the linear map taking quantities in `self` to quantities in
    /// `target`.
    ///
    /// # Errors
    /// Returns [`UnitError::Incommensurable`] when the dimension vectors
    /// differ; the bridge never silently drops a conversion.
    pub fn conversion_to(&self, target: &Unit) -> Result<LinearMap, UnitError> {
        if !self.commensurable_with(target) {
            return Err(UnitError::Incommensurable {
                from: self.name.clone(),
                to: target.name.clone(),
            });
        }
        Ok(LinearMap {
            scale: self.scale / target.scale,
            offset: (self.offset - target.offset) / target.scale,
        })
    }
}

impl std::fmt::Display for Unit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.name)
    }
}

/// The bridge between two commensurable units: `y = scale·x + offset`.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LinearMap {
    /// Multiplicative factor `a`.
    pub scale: f64,
    /// Additive offset `b`; non-zero only for affine unit pairs.
    pub offset: f64,
}

impl LinearMap {
    /// The identity map.
    pub const IDENTITY: LinearMap = LinearMap {
        scale: 1.0,
        offset: 0.0,
    };

    /// Returns `true` when applying the map cannot change any value.
    #[inline]
    pub fn is_identity(&self) -> bool {
        self.scale == 1.0 && self.offset == 0.0
    }

    /// Applies the map to a scalar.
    #[inline]
    pub fn apply(&self, x: f64) -> f64 {
        self.scale * x + self.offset
    }

    /// Applies the map element-wise in place.
    pub fn apply_slice(&self, values: &mut [f64]) {
        for v in values.iter_mut() {
            *v = self.apply(*v);
        }
    }

    /// Applies the map to an integer through double, rounding half-to-even
    /// on the way back. The second field reports saturation at the `i64`
    /// extremes.
    pub fn apply_integer(&self, x: i64) -> (i64, bool) {
        let mapped = self.apply(x as f64).round_ties_even();
        let saturated = mapped > i64::MAX as f64 || mapped < i64::MIN as f64;
        (mapped as i64, saturated)
    }
}

// ── Symbol table ──────────────────────────────────────────────────────

struct Symbol {
    text: &'static str,
    dims: [i8; DIMS],
    scale: f64,
    offset: f64,
    prefixable: bool,
}

const fn base(text: &'static str, dims: [i8; DIMS], scale: f64) -> Symbol {
    Symbol {
        text,
        dims,
        scale,
        offset: 0.0,
        prefixable: true,
    }
}

const fn plain(text: &'static str, dims: [i8; DIMS], scale: f64, offset: f64) -> Symbol {
    Symbol {
        text,
        dims,
        scale,
        offset,
        prefixable: false,
    }
}

// Dimension order: [m, kg, s, A, K, mol, cd].
#[rustfmt::skip]
const SYMBOLS: &[Symbol] = &[
    base("m",   [1, 0, 0, 0, 0, 0, 0], 1.0),
    base("g",   [0, 1, 0, 0, 0, 0, 0], 1e-3),
    base("s",   [0, 0, 1, 0, 0, 0, 0], 1.0),
    base("A",   [0, 0, 0, 1, 0, 0, 0], 1.0),
    base("K",   [0, 0, 0, 0, 1, 0, 0], 1.0),
    base("mol", [0, 0, 0, 0, 0, 1, 0], 1.0),
    base("cd",  [0, 0, 0, 0, 0, 0, 1], 1.0),
    base("Hz",  [0, 0, -1, 0, 0, 0, 0], 1.0),
    base("N",   [1, 1, -2, 0, 0, 0, 0], 1.0),
    base("Pa",  [-1, 1, -2, 0, 0, 0, 0], 1.0),
    base("J",   [2, 1, -2, 0, 0, 0, 0], 1.0),
    base("W",   [2, 1, -3, 0, 0, 0, 0], 1.0),
    base("V",   [2, 1, -3, -1, 0, 0, 0], 1.0),
    base("Wh",  [2, 1, -2, 0, 0, 0, 0], 3600.0),
    plain("min",  [0, 0, 1, 0, 0, 0, 0], 60.0, 0.0),
    plain("h",    [0, 0, 1, 0, 0, 0, 0], 3600.0, 0.0),
    plain("degC", [0, 0, 0, 0, 1, 0, 0], 1.0, 273.15),
    plain("degF", [0, 0, 0, 0, 1, 0, 0], 5.0 / 9.0, 273.15 - 32.0 * 5.0 / 9.0),
    plain("pu",   [0, 0, 0, 0, 0, 0, 0], 1.0, 0.0),
    plain("%",    [0, 0, 0, 0, 0, 0, 0], 0.01, 0.0),
];

#[rustfmt::skip]
const PREFIXES: &[(&str, f64)] = &[
    ("Y", 1e24), ("Z", 1e21), ("E", 1e18), ("P", 1e15), ("T", 1e12),
    ("G", 1e9), ("M", 1e6), ("k", 1e3), ("h", 1e2), ("da", 1e1),
    ("d", 1e-1), ("c", 1e-2), ("m", 1e-3), ("u", 1e-6), ("µ", 1e-6),
    ("n", 1e-9), ("p", 1e-12), ("f", 1e-15), ("a", 1e-18),
    ("z", 1e-21), ("y", 1e-24),
];

struct Resolved {
    dims: [i8; DIMS],
    scale: f64,
    offset: f64,
}

/// Resolves a single symbol: exact table match wins over a prefix split, so
/// `m` is the metre and `mm` the millimetre.
fn resolve(symbol: &str) -> Option<Resolved> {
    if let Some(entry) = SYMBOLS.iter().find(|entry| entry.text == symbol) {
        return Some(Resolved {
            dims: entry.dims,
            scale: entry.scale,
            offset: entry.offset,
        });
    }
    for (prefix, factor) in PREFIXES {
        if let Some(rest) = symbol.strip_prefix(prefix) {
            if let Some(entry) = SYMBOLS
                .iter()
                .find(|entry| entry.prefixable && entry.text == rest)
            {
                return Some(Resolved {
                    dims: entry.dims,
                    scale: entry.scale * factor,
                    offset: 0.0,
                });
            }
        }
    }
    None
}

fn split_exponent<'a>(token: &'a str, expression: &str) -> Result<(&'a str, i32), UnitError> {
    match token.split_once('^') {
        None => Ok((token.trim(), 1)),
        Some((symbol, exp)) => {
            let exponent = exp
                .trim()
                .parse::<i32>()
                .map_err(|_| UnitError::Malformed(expression.to_owned()))?;
            if exponent == 0 || exponent.unsigned_abs() > 4 {
                return Err(UnitError::Malformed(expression.to_owned()));
            }
            Ok((symbol.trim(), exponent))
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn bridge(from: &str, to: &str) -> LinearMap {
        Unit::parse(from)
            .unwrap()
            .conversion_to(&Unit::parse(to).unwrap())
            .unwrap()
    }

    #[test]
    fn metre_to_kilometre() {
        let map = bridge("m", "km");
        assert_eq!(map.apply(1500.0), 1.5);
        assert_eq!(map.offset, 0.0);
    }

    #[test]
    fn watt_prefixes() {
        let map = bridge("W", "MW");
        assert!((map.apply(2.5e6) - 2.5).abs() < 1e-12);
    }

    #[test]
    fn exact_symbol_beats_prefix_split() {
        // "min" is the minute, not milli-inch-nonsense; "mm" is the millimetre.
        let map = bridge("min", "s");
        assert_eq!(map.apply(2.0), 120.0);
        let map = bridge("mm", "m");
        assert_eq!(map.apply(1000.0), 1.0);
    }

    #[test]
    fn celsius_to_fahrenheit_is_affine() {
        let map = bridge("degC", "degF");
        assert!((map.apply(100.0) - 212.0).abs() < 1e-9);
        assert!((map.apply(0.0) - 32.0).abs() < 1e-9);
    }

    #[test]
    fn celsius_to_kelvin_offset() {
        let map = bridge("degC", "K");
        assert!((map.apply(0.0) - 273.15).abs() < 1e-12);
    }

    #[test]
    fn compound_quotient() {
        // 1 m/s = 3.6 km/h
        let map = bridge("m/s", "km/h");
        assert!((map.apply(1.0) - 3.6).abs() < 1e-12);
    }

    #[test]
    fn exponents() {
        let map = bridge("m^2", "cm^2");
        assert!((map.apply(1.0) - 1e4).abs() < 1e-6);
    }

    #[test]
    fn energy_aliases_are_commensurable() {
        let map = bridge("kWh", "J");
        assert!((map.apply(1.0) - 3.6e6).abs() < 1e-6);
    }

    #[test]
    fn percent_and_per_unit() {
        let map = bridge("%", "pu");
        assert_eq!(map.apply(50.0), 0.5);
    }

    #[test]
    fn incommensurable_is_an_error() {
        let m = Unit::parse("m").unwrap();
        let s = Unit::parse("s").unwrap();
        assert!(matches!(
            m.conversion_to(&s),
            Err(UnitError::Incommensurable { .. })
        ));
    }

    #[test]
    fn affine_compound_is_rejected() {
        assert!(matches!(
            Unit::parse("degC/s"),
            Err(UnitError::AffineCompound(_))
        ));
        assert!(matches!(
            Unit::parse("degF^2"),
            Err(UnitError::AffineCompound(_))
        ));
    }

    #[test]
    fn unknown_symbol_is_an_error() {
        assert!(matches!(
            Unit::parse("furlong"),
            Err(UnitError::UnknownSymbol { .. })
        ));
    }

    #[test]
    fn malformed_expressions_are_errors() {
        for bad in ["", "m/s/s", "m^x", "m^0", "*m"] {
            assert!(Unit::parse(bad).is_err(), "{bad}");
        }
    }

    #[test]
    fn integer_conversion_rounds_half_to_even() {
        // 1 m = 0.001 km; 1500 m = 1.5 km rounds to 2 km (even).
        let map = bridge("m", "km");
        assert_eq!(map.apply_integer(1500), (2, false));
        assert_eq!(map.apply_integer(2500), (2, false));
        assert_eq!(map.apply_integer(3500), (4, false));
    }

    #[test]
    fn integer_conversion_reports_saturation() {
        let map = bridge("km", "mm");
        let (value, saturated) = map.apply_integer(i64::MAX / 2);
        assert!(saturated);
        assert_eq!(value, i64::MAX);
    }

    #[test]
    fn round_trip_is_near_identity() {
        let forward = bridge("degF", "degC");
        let back = bridge("degC", "degF");
        for x in [-40.0, 0.0, 98.6, 451.0] {
            assert!((back.apply(forward.apply(x)) - x).abs() < 1e-9);
        }
    }
}
