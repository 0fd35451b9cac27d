// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Tagged container over the nine primary co-simulation value types.
//!
//! A [`Value`] holds exactly one primary payload; the tag always matches the
//! inhabited variant. Conversion between variants is deterministic and total:
//! every primary type converts to every other primary type under the fixed
//! rules documented on [`Value::convert_to`]. Conversion to the already-held
//! kind is a no-op.
//!
//! The ordering of [`ValueKind`] discriminants is part of the serialized
//! format (the codec's kind-tag byte) and must never be re-ordered.

use thiserror::Error;

use crate::time::SimTime;

// ── Payload structs ───────────────────────────────────────────────────

/// A complex number: two doubles.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Complex {
    /// Real part.
    pub re: f64,
    /// Imaginary part.
    pub im: f64,
}

impl Complex {
    /// Constructs a complex number from its parts.
    #[inline]
    pub fn new(re: f64, im: f64) -> Self {
        Self { re, im }
    }
}

impl std::fmt::Display for Complex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.im < 0.0 || (self.im == 0.0 && self.im.is_sign_negative()) {
            write!(f, "{}{}i", self.re, self.im)
        } else {
            write!(f, "{}+{}i", self.re, self.im)
        }
    }
}

/// A named point: a string label paired with a double.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct NamedPoint {
    /// The label. String conversions use this field, never the number.
    pub name: String,
    /// The numeric field. Double conversions use this field.
    pub value: f64,
}

impl NamedPoint {
    /// Constructs a named point.
    pub fn new(name: impl Into<String>, value: f64) -> Self {
        Self {
            name: name.into(),
            value,
        }
    }
}

// ── Kind tags ─────────────────────────────────────────────────────────

/// The closed, ordered set of primary value types.
///
/// The discriminants are the serialized kind-tag bytes; the order is frozen.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ValueKind {
    /// IEEE-754 double.
    Double = 0,
    /// Signed 64-bit integer.
    Integer = 1,
    /// UTF-8 string.
    Text = 2,
    /// Complex number (two doubles).
    Complex = 3,
    /// Ordered sequence of doubles.
    Vector = 4,
    /// Ordered sequence of complex numbers.
    ComplexVector = 5,
    /// Named point (string + double).
    NamedPoint = 6,
    /// Boolean.
    Boolean = 7,
    /// Simulation time.
    Time = 8,
}

impl ValueKind {
    /// All kinds in tag order.
    pub const ALL: [ValueKind; 9] = [
        ValueKind::Double,
        ValueKind::Integer,
        ValueKind::Text,
        ValueKind::Complex,
        ValueKind::Vector,
        ValueKind::ComplexVector,
        ValueKind::NamedPoint,
        ValueKind::Boolean,
        ValueKind::Time,
    ];

    /// Returns the serialized tag byte for this kind.
    #[inline]
    pub fn index(self) -> u8 {
        self as u8
    }

    /// Looks a kind up by its serialized tag byte.
    pub fn from_index(index: u8) -> Option<ValueKind> {
        ValueKind::ALL.get(usize::from(index)).copied()
    }

    /// The declaration-string name for this kind (see [`DeclaredType::parse`]).
    pub fn type_name(self) -> &'static str {
        match self {
            ValueKind::Double => "double",
            ValueKind::Integer => "int",
            ValueKind::Text => "string",
            ValueKind::Complex => "complex",
            ValueKind::Vector => "vector",
            ValueKind::ComplexVector => "complex_vector",
            ValueKind::NamedPoint => "named_point",
            ValueKind::Boolean => "bool",
            ValueKind::Time => "time",
        }
    }

    /// The zero value of this kind.
    pub fn default_value(self) -> Value {
        match self {
            ValueKind::Double => Value::Double(0.0),
            ValueKind::Integer => Value::Integer(0),
            ValueKind::Text => Value::Text(String::new()),
            ValueKind::Complex => Value::Complex(Complex::default()),
            ValueKind::Vector => Value::Vector(Vec::new()),
            ValueKind::ComplexVector => Value::ComplexVector(Vec::new()),
            ValueKind::NamedPoint => Value::NamedPoint(NamedPoint::default()),
            ValueKind::Boolean => Value::Boolean(false),
            ValueKind::Time => Value::Time(SimTime::ZERO),
        }
    }

    /// Returns `true` for the scalar numeric kinds (double, integer, time),
    /// the kinds eligible for scalar unit conversion.
    pub fn is_numeric_scalar(self) -> bool {
        matches!(
            self,
            ValueKind::Double | ValueKind::Integer | ValueKind::Time
        )
    }
}

/// A declared interface type: a primary kind, or one of the special
/// declaration states.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum DeclaredType {
    /// One of the nine primary kinds.
    Primary(ValueKind),
    /// Unspecified; infer from the connected publication (`"def"`).
    #[default]
    Unspecified,
    /// Not yet known; resolved when source information loads (`"unknown"`).
    Unknown,
    /// A user-defined non-primary type; bytes pass through opaquely.
    Custom,
}

impl DeclaredType {
    /// Parses a declaration string (case-insensitive).
    ///
    /// Recognised names: the nine primary type names, `custom`, `unknown`,
    /// and `def` (plus the empty string) meaning "unspecified".
    /// Returns `None` for anything else; an unrecognised declaration is a
    /// configuration error at the layer above.
    pub fn parse(name: &str) -> Option<DeclaredType> {
        let lower = name.trim().to_ascii_lowercase();
        if lower.is_empty() || lower == "def" {
            return Some(DeclaredType::Unspecified);
        }
        match lower.as_str() {
            "unknown" => Some(DeclaredType::Unknown),
            "custom" => Some(DeclaredType::Custom),
            _ => ValueKind::ALL
                .into_iter()
                .find(|k| k.type_name() == lower)
                .map(DeclaredType::Primary),
        }
    }

    /// The declaration string for this type.
    pub fn type_name(self) -> &'static str {
        match self {
            DeclaredType::Primary(kind) => kind.type_name(),
            DeclaredType::Unspecified => "def",
            DeclaredType::Unknown => "unknown",
            DeclaredType::Custom => "custom",
        }
    }
}

// ── The tagged value ──────────────────────────────────────────────────

/// A tagged value: exactly one primary variant and its payload.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Value {
    /// IEEE-754 double.
    Double(f64),
    /// Signed 64-bit integer.
    Integer(i64),
    /// UTF-8 string.
    Text(String),
    /// Complex number.
    Complex(Complex),
    /// Ordered sequence of doubles.
    Vector(Vec<f64>),
    /// Ordered sequence of complex numbers.
    ComplexVector(Vec<Complex>),
    /// Named point.
    NamedPoint(NamedPoint),
    /// Boolean.
    Boolean(bool),
    /// Simulation time.
    Time(SimTime),
}

impl Value {
    /// Returns the tag of the inhabited variant.
    pub fn kind(&self) -> ValueKind {
        match self {
            Value::Double(_) => ValueKind::Double,
            Value::Integer(_) => ValueKind::Integer,
            Value::Text(_) => ValueKind::Text,
            Value::Complex(_) => ValueKind::Complex,
            Value::Vector(_) => ValueKind::Vector,
            Value::ComplexVector(_) => ValueKind::ComplexVector,
            Value::NamedPoint(_) => ValueKind::NamedPoint,
            Value::Boolean(_) => ValueKind::Boolean,
            Value::Time(_) => ValueKind::Time,
        }
    }

    /// The double view of this value.
    ///
    /// Strings parse (zero on failure), complex takes the real part,
    /// sequences take element 0 (zero if empty), named points take the
    /// numeric field, booleans map to 0/1, and time converts to seconds.
    pub fn as_double(&self) -> f64 {
        match self {
            Value::Double(d) => *d,
            Value::Integer(i) => *i as f64,
            Value::Text(s) => parse_double(s).unwrap_or(0.0),
            Value::Complex(c) => c.re,
            Value::Vector(v) => v.first().copied().unwrap_or(0.0),
            Value::ComplexVector(v) => v.first().map_or(0.0, |c| c.re),
            Value::NamedPoint(p) => p.value,
            Value::Boolean(b) => f64::from(*b),
            Value::Time(t) => t.to_secs(),
        }
    }

    /// The integer view of this value.
    ///
    /// Doubles truncate toward zero and saturate at the `i64` extremes;
    /// time converts to its nanosecond count (the lossless pairing).
    pub fn as_integer(&self) -> i64 {
        match self {
            Value::Integer(i) => *i,
            Value::Text(s) => parse_integer(s),
            Value::Time(t) => t.nanos(),
            Value::Boolean(b) => i64::from(*b),
            other => other.as_double() as i64,
        }
    }

    /// The boolean view of this value: non-zero numerics are true; strings
    /// follow the {"true","1","on"} / {"false","0","off"} sets
    /// (case-insensitive, anything else is false).
    pub fn as_boolean(&self) -> bool {
        match self {
            Value::Boolean(b) => *b,
            Value::Text(s) => parse_boolean(s),
            Value::NamedPoint(p) => p.value != 0.0,
            Value::Integer(i) => *i != 0,
            Value::Time(t) => t.nanos() != 0,
            other => other.as_double() != 0.0,
        }
    }

    /// The complex view of this value. A two-element vector maps to
    /// `(v[0], v[1])`; every other widening sets the imaginary part to zero.
    pub fn as_complex(&self) -> Complex {
        match self {
            Value::Complex(c) => *c,
            Value::ComplexVector(v) => v.first().copied().unwrap_or_default(),
            Value::Vector(v) => Complex::new(
                v.first().copied().unwrap_or(0.0),
                v.get(1).copied().unwrap_or(0.0),
            ),
            Value::Text(s) => parse_complex(s).unwrap_or_default(),
            other => Complex::new(other.as_double(), 0.0),
        }
    }

    /// The time view of this value. Integers count nanoseconds; every other
    /// numeric converts through seconds.
    pub fn as_time(&self) -> SimTime {
        match self {
            Value::Time(t) => *t,
            Value::Integer(i) => SimTime::from_nanos(*i),
            other => SimTime::from_secs(other.as_double()),
        }
    }

    /// The string view of this value, in canonical decimal form with full
    /// round-tripping precision for doubles. A named point yields its
    /// string field, never the numeric field.
    pub fn to_text(&self) -> String {
        match self {
            Value::Double(d) => format!("{d}"),
            Value::Integer(i) => format!("{i}"),
            Value::Text(s) => s.clone(),
            Value::Complex(c) => format!("{c}"),
            Value::Vector(v) => format_seq(v.iter()),
            Value::ComplexVector(v) => format_seq(v.iter()),
            Value::NamedPoint(p) => p.name.clone(),
            Value::Boolean(b) => (if *b { "true" } else { "false" }).to_owned(),
            Value::Time(t) => format!("{}", t.to_secs()),
        }
    }

    /// The double-sequence view of this value. Scalars widen to one
    /// element, a complex number contributes `[re, im]`, and a complex
    /// vector contributes its real parts.
    pub fn to_vector(&self) -> Vec<f64> {
        match self {
            Value::Vector(v) => v.clone(),
            Value::ComplexVector(v) => v.iter().map(|c| c.re).collect(),
            Value::Complex(c) => vec![c.re, c.im],
            Value::Text(s) => parse_vector(s),
            other => vec![other.as_double()],
        }
    }

    /// The complex-sequence view of this value.
    pub fn to_complex_vector(&self) -> Vec<Complex> {
        match self {
            Value::ComplexVector(v) => v.clone(),
            Value::Vector(v) => v.iter().map(|d| Complex::new(*d, 0.0)).collect(),
            Value::Text(s) => parse_vector(s)
                .into_iter()
                .map(|d| Complex::new(d, 0.0))
                .collect(),
            other => vec![other.as_complex()],
        }
    }

    /// The named-point view of this value. A string becomes the label with
    /// a zero numeric field; numerics become the label `"value"`.
    pub fn to_named_point(&self) -> NamedPoint {
        match self {
            Value::NamedPoint(p) => p.clone(),
            Value::Text(s) => NamedPoint::new(s.clone(), 0.0),
            other => NamedPoint::new("value", other.as_double()),
        }
    }

    /// The single-character view of this value: the first byte of the
    /// string form, or `'\0'` for an empty string.
    pub fn first_char(&self) -> char {
        self.to_text().bytes().next().map_or('\0', char::from)
    }

    /// Converts to the requested kind under the container rules, returning
    /// a new value. Converting to the held kind is a clone.
    pub fn convert_to(&self, kind: ValueKind) -> Value {
        if self.kind() == kind {
            return self.clone();
        }
        match kind {
            ValueKind::Double => Value::Double(self.as_double()),
            ValueKind::Integer => Value::Integer(self.as_integer()),
            ValueKind::Text => Value::Text(self.to_text()),
            ValueKind::Complex => Value::Complex(self.as_complex()),
            ValueKind::Vector => Value::Vector(self.to_vector()),
            ValueKind::ComplexVector => Value::ComplexVector(self.to_complex_vector()),
            ValueKind::NamedPoint => Value::NamedPoint(self.to_named_point()),
            ValueKind::Boolean => Value::Boolean(self.as_boolean()),
            ValueKind::Time => Value::Time(self.as_time()),
        }
    }

    /// In-place form of [`Value::convert_to`]; a no-op when the tag already
    /// matches.
    pub fn convert_in_place(&mut self, kind: ValueKind) {
        if self.kind() != kind {
            *self = self.convert_to(kind);
        }
    }

    /// Like [`Value::convert_to`], but reports the conversions that fall
    /// back to zero: a string that does not parse as the requested scalar
    /// numeric kind. The fallback result itself is still available through
    /// the unchecked form.
    ///
    /// # Errors
    /// Returns [`ConversionError`] when `self` is text that fails to parse
    /// as a double, integer, complex, or time.
    pub fn convert_to_checked(&self, kind: ValueKind) -> Result<Value, ConversionError> {
        if let Value::Text(s) = self {
            let parses = match kind {
                ValueKind::Double | ValueKind::Time => parse_double(s).is_some(),
                ValueKind::Integer => {
                    s.trim().parse::<i64>().is_ok() || parse_double(s).is_some()
                }
                ValueKind::Complex => parse_complex(s).is_some(),
                _ => true,
            };
            if !parses {
                return Err(ConversionError {
                    text: s.clone(),
                    target: kind,
                });
            }
        }
        Ok(self.convert_to(kind))
    }
}

/// Error from the checked conversion: text that does not parse as the
/// requested numeric kind. The unchecked conversion defines the zero
/// fallback the caller may still use.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("cannot interpret '{text}' as {}", .target.type_name())]
pub struct ConversionError {
    /// The text that failed to parse.
    pub text: String,
    /// The kind it was asked to become.
    pub target: ValueKind,
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_text())
    }
}

fn format_seq<T: std::fmt::Display>(items: impl Iterator<Item = T>) -> String {
    let body = items
        .map(|x| x.to_string())
        .collect::<Vec<_>>()
        .join(", ");
    format!("[{body}]")
}

// ── Text parsing helpers ──────────────────────────────────────────────

fn parse_double(text: &str) -> Option<f64> {
    text.trim().parse::<f64>().ok()
}

/// Integer parse with a double fallback so `"3.9"` reads as `3`.
fn parse_integer(text: &str) -> i64 {
    let trimmed = text.trim();
    trimmed
        .parse::<i64>()
        .unwrap_or_else(|_| trimmed.parse::<f64>().map_or(0, |d| d as i64))
}

fn parse_boolean(text: &str) -> bool {
    matches!(
        text.trim().to_ascii_lowercase().as_str(),
        "true" | "1" | "on"
    )
}

/// Parses `a+bi` / `a-bi` / `bi` / `a` forms (`j` accepted for `i`).
fn parse_complex(text: &str) -> Option<Complex> {
    let trimmed = text.trim();
    let Some(body) = trimmed
        .strip_suffix('i')
        .or_else(|| trimmed.strip_suffix('j'))
    else {
        return parse_double(trimmed).map(|re| Complex::new(re, 0.0));
    };
    // Split at the sign that separates the real and imaginary terms; skip
    // position 0 and exponent signs.
    let split = body
        .char_indices()
        .skip(1)
        .filter(|&(idx, ch)| {
            (ch == '+' || ch == '-')
                && !matches!(body.as_bytes().get(idx - 1), Some(&(b'e' | b'E')))
        })
        .map(|(idx, _)| idx)
        .last();
    match split {
        Some(idx) => {
            let re = parse_double(&body[..idx])?;
            let im_text = &body[idx..];
            let im = if im_text == "+" || im_text == "-" {
                // bare sign, as in "1+i"
                if im_text == "+" {
                    1.0
                } else {
                    -1.0
                }
            } else {
                parse_double(im_text)?
            };
            Some(Complex::new(re, im))
        }
        None => parse_double(body).map(|im| Complex::new(0.0, im)),
    }
}

/// Parses `[1, 2.5]`-style sequences; a bare scalar reads as one element.
/// Unparseable elements read as zero.
fn parse_vector(text: &str) -> Vec<f64> {
    let trimmed = text.trim();
    let body = trimmed
        .strip_prefix('[')
        .and_then(|rest| rest.strip_suffix(']'));
    match body {
        Some(inner) => {
            if inner.trim().is_empty() {
                Vec::new()
            } else {
                inner
                    .split(',')
                    .map(|part| parse_double(part).unwrap_or(0.0))
                    .collect()
            }
        }
        None => vec![parse_double(trimmed).unwrap_or(0.0)],
    }
}

// ── Typed extraction ──────────────────────────────────────────────────

/// Extraction of a typed copy from a [`Value`].
///
/// Implemented for the nine primary payload types and for the common
/// convertible scalars (`f32`, `i32`, `u32`, `i16`, `u64`, `char`), which
/// widen through `f64`/`i64` first and saturate on narrowing.
pub trait FromValue: Sized {
    /// Extracts `Self` from the value under the container conversion rules.
    fn from_value(value: &Value) -> Self;
}

impl FromValue for f64 {
    fn from_value(value: &Value) -> Self {
        value.as_double()
    }
}

impl FromValue for i64 {
    fn from_value(value: &Value) -> Self {
        value.as_integer()
    }
}

impl FromValue for String {
    fn from_value(value: &Value) -> Self {
        value.to_text()
    }
}

impl FromValue for Complex {
    fn from_value(value: &Value) -> Self {
        value.as_complex()
    }
}

impl FromValue for Vec<f64> {
    fn from_value(value: &Value) -> Self {
        value.to_vector()
    }
}

impl FromValue for Vec<Complex> {
    fn from_value(value: &Value) -> Self {
        value.to_complex_vector()
    }
}

impl FromValue for NamedPoint {
    fn from_value(value: &Value) -> Self {
        value.to_named_point()
    }
}

impl FromValue for bool {
    fn from_value(value: &Value) -> Self {
        value.as_boolean()
    }
}

impl FromValue for SimTime {
    fn from_value(value: &Value) -> Self {
        value.as_time()
    }
}

impl FromValue for f32 {
    fn from_value(value: &Value) -> Self {
        value.as_double() as f32
    }
}

impl FromValue for i32 {
    fn from_value(value: &Value) -> Self {
        value
            .as_integer()
            .clamp(i64::from(i32::MIN), i64::from(i32::MAX)) as i32
    }
}

impl FromValue for u32 {
    fn from_value(value: &Value) -> Self {
        value.as_integer().clamp(0, i64::from(u32::MAX)) as u32
    }
}

impl FromValue for i16 {
    fn from_value(value: &Value) -> Self {
        value
            .as_integer()
            .clamp(i64::from(i16::MIN), i64::from(i16::MAX)) as i16
    }
}

impl FromValue for u64 {
    fn from_value(value: &Value) -> Self {
        value.as_integer().max(0) as u64
    }
}

impl FromValue for char {
    fn from_value(value: &Value) -> Self {
        value.first_char()
    }
}

/// A primary payload type that can be borrowed in place from a [`Value`].
///
/// Used by the by-reference read path: the input converts its stored value
/// to `KIND` in place, then hands out a borrow that stays valid until the
/// next decode on the same input.
pub trait PrimaryValue {
    /// The kind whose payload is `Self`.
    const KIND: ValueKind;

    /// Borrows the payload if the inhabited variant can serve a `&Self`.
    fn peek(value: &Value) -> Option<&Self>;
}

impl PrimaryValue for f64 {
    const KIND: ValueKind = ValueKind::Double;
    fn peek(value: &Value) -> Option<&Self> {
        match value {
            Value::Double(d) => Some(d),
            _ => None,
        }
    }
}

impl PrimaryValue for i64 {
    const KIND: ValueKind = ValueKind::Integer;
    fn peek(value: &Value) -> Option<&Self> {
        match value {
            Value::Integer(i) => Some(i),
            _ => None,
        }
    }
}

impl PrimaryValue for String {
    const KIND: ValueKind = ValueKind::Text;
    fn peek(value: &Value) -> Option<&Self> {
        match value {
            Value::Text(s) => Some(s),
            // A named point serves its string field directly; no conversion.
            Value::NamedPoint(p) => Some(&p.name),
            _ => None,
        }
    }
}

impl PrimaryValue for Complex {
    const KIND: ValueKind = ValueKind::Complex;
    fn peek(value: &Value) -> Option<&Self> {
        match value {
            Value::Complex(c) => Some(c),
            _ => None,
        }
    }
}

impl PrimaryValue for Vec<f64> {
    const KIND: ValueKind = ValueKind::Vector;
    fn peek(value: &Value) -> Option<&Self> {
        match value {
            Value::Vector(v) => Some(v),
            _ => None,
        }
    }
}

impl PrimaryValue for Vec<Complex> {
    const KIND: ValueKind = ValueKind::ComplexVector;
    fn peek(value: &Value) -> Option<&Self> {
        match value {
            Value::ComplexVector(v) => Some(v),
            _ => None,
        }
    }
}

impl PrimaryValue for NamedPoint {
    const KIND: ValueKind = ValueKind::NamedPoint;
    fn peek(value: &Value) -> Option<&Self> {
        match value {
            Value::NamedPoint(p) => Some(p),
            _ => None,
        }
    }
}

impl PrimaryValue for bool {
    const KIND: ValueKind = ValueKind::Boolean;
    fn peek(value: &Value) -> Option<&Self> {
        match value {
            Value::Boolean(b) => Some(b),
            _ => None,
        }
    }
}

impl PrimaryValue for SimTime {
    const KIND: ValueKind = ValueKind::Time;
    fn peek(value: &Value) -> Option<&Self> {
        match value {
            Value::Time(t) => Some(t),
            _ => None,
        }
    }
}

// ── Construction conversions ──────────────────────────────────────────

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Double(v)
    }
}

impl From<f32> for Value {
    fn from(v: f32) -> Self {
        Value::Double(f64::from(v))
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Integer(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Integer(i64::from(v))
    }
}

impl From<u32> for Value {
    fn from(v: u32) -> Self {
        Value::Integer(i64::from(v))
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_owned())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

impl From<Complex> for Value {
    fn from(v: Complex) -> Self {
        Value::Complex(v)
    }
}

impl From<Vec<f64>> for Value {
    fn from(v: Vec<f64>) -> Self {
        Value::Vector(v)
    }
}

impl From<Vec<Complex>> for Value {
    fn from(v: Vec<Complex>) -> Self {
        Value::ComplexVector(v)
    }
}

impl From<NamedPoint> for Value {
    fn from(v: NamedPoint) -> Self {
        Value::NamedPoint(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Boolean(v)
    }
}

impl From<SimTime> for Value {
    fn from(v: SimTime) -> Self {
        Value::Time(v)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn kind_matches_variant() {
        for kind in ValueKind::ALL {
            assert_eq!(kind.default_value().kind(), kind);
            assert_eq!(ValueKind::from_index(kind.index()), Some(kind));
        }
        assert_eq!(ValueKind::from_index(9), None);
    }

    #[test]
    fn declared_type_parse_round_trips() {
        for kind in ValueKind::ALL {
            assert_eq!(
                DeclaredType::parse(kind.type_name()),
                Some(DeclaredType::Primary(kind))
            );
        }
        assert_eq!(DeclaredType::parse("DEF"), Some(DeclaredType::Unspecified));
        assert_eq!(DeclaredType::parse(""), Some(DeclaredType::Unspecified));
        assert_eq!(DeclaredType::parse("custom"), Some(DeclaredType::Custom));
        assert_eq!(DeclaredType::parse("unknown"), Some(DeclaredType::Unknown));
        assert_eq!(DeclaredType::parse("quaternion"), None);
    }

    #[test]
    fn conversion_to_same_kind_is_identity() {
        let v = Value::Vector(vec![1.0, 2.0]);
        assert_eq!(v.convert_to(ValueKind::Vector), v);
    }

    #[test]
    fn string_parses_to_numerics_with_zero_fallback() {
        assert_eq!(Value::Text("42.25".into()).as_double(), 42.25);
        assert_eq!(Value::Text("oops".into()).as_double(), 0.0);
        assert_eq!(Value::Text("17".into()).as_integer(), 17);
        assert_eq!(Value::Text("3.9".into()).as_integer(), 3);
        assert_eq!(Value::Text("oops".into()).as_integer(), 0);
    }

    #[test]
    fn double_text_round_trips_precisely() {
        let d = 0.1 + 0.2;
        let text = Value::Double(d).to_text();
        assert_eq!(text.parse::<f64>().unwrap(), d);
    }

    #[test]
    fn boolean_string_sets() {
        for text in ["true", "TRUE", "1", "on", "On"] {
            assert!(Value::Text(text.into()).as_boolean(), "{text}");
        }
        for text in ["false", "0", "off", "maybe", ""] {
            assert!(!Value::Text(text.into()).as_boolean(), "{text}");
        }
    }

    #[test]
    fn boolean_numeric_round_trip() {
        assert!(Value::Double(-2.5).as_boolean());
        assert!(!Value::Integer(0).as_boolean());
        assert_eq!(Value::Boolean(true).as_double(), 1.0);
        assert_eq!(Value::Boolean(false).as_integer(), 0);
    }

    #[test]
    fn complex_narrows_to_real_part() {
        let c = Value::Complex(Complex::new(3.0, -4.0));
        assert_eq!(c.as_double(), 3.0);
        assert_eq!(
            Value::Double(3.0).as_complex(),
            Complex::new(3.0, 0.0)
        );
    }

    #[test]
    fn complex_text_round_trip() {
        for c in [
            Complex::new(1.5, 2.5),
            Complex::new(-1.0, -2.0),
            Complex::new(1e-3, -4.5e2),
        ] {
            let text = Value::Complex(c).to_text();
            assert_eq!(Value::Text(text).as_complex(), c);
        }
        assert_eq!(
            Value::Text("2.5".into()).as_complex(),
            Complex::new(2.5, 0.0)
        );
        assert_eq!(
            Value::Text("3i".into()).as_complex(),
            Complex::new(0.0, 3.0)
        );
    }

    #[test]
    fn vector_scalar_widening_and_narrowing() {
        assert_eq!(Value::Double(2.5).to_vector(), vec![2.5]);
        assert_eq!(Value::Vector(vec![7.0, 8.0]).as_double(), 7.0);
        assert_eq!(Value::Vector(Vec::new()).as_double(), 0.0);
    }

    #[test]
    fn vector_text_round_trip() {
        let v = vec![1.0, -2.5, 3.25];
        let text = Value::Vector(v.clone()).to_text();
        assert_eq!(Value::Text(text).to_vector(), v);
        assert_eq!(Value::Text("[]".into()).to_vector(), Vec::<f64>::new());
        assert_eq!(Value::Text("5.5".into()).to_vector(), vec![5.5]);
    }

    #[test]
    fn named_point_string_uses_label_not_number() {
        let p = Value::NamedPoint(NamedPoint::new("setpoint", 99.0));
        assert_eq!(p.to_text(), "setpoint");
        assert_eq!(p.as_double(), 99.0);
        let back = Value::Text("setpoint".into()).to_named_point();
        assert_eq!(back.name, "setpoint");
        assert_eq!(back.value, 0.0);
    }

    #[test]
    fn time_pairs_with_integer_in_nanos_and_double_in_seconds() {
        let t = Value::Time(SimTime::from_secs(1.5));
        assert_eq!(t.as_integer(), 1_500_000_000);
        assert_eq!(t.as_double(), 1.5);
        assert_eq!(
            Value::Integer(2_000_000_000).as_time(),
            SimTime::from_secs(2.0)
        );
        assert_eq!(Value::Double(2.0).as_time(), SimTime::from_secs(2.0));
    }

    #[test]
    fn double_to_integer_saturates() {
        assert_eq!(Value::Double(1e300).as_integer(), i64::MAX);
        assert_eq!(Value::Double(-1e300).as_integer(), i64::MIN);
    }

    #[test]
    fn narrowing_extraction_saturates() {
        assert_eq!(i32::from_value(&Value::Integer(i64::MAX)), i32::MAX);
        assert_eq!(u32::from_value(&Value::Integer(-5)), 0);
        assert_eq!(u64::from_value(&Value::Integer(-5)), 0);
        assert_eq!(i16::from_value(&Value::Integer(40_000)), i16::MAX);
    }

    #[test]
    fn char_extraction_takes_first_byte_of_string_form() {
        assert_eq!(char::from_value(&Value::Text("hello".into())), 'h');
        assert_eq!(char::from_value(&Value::Text(String::new())), '\0');
        assert_eq!(char::from_value(&Value::Integer(42)), '4');
    }

    #[test]
    fn primary_peek_serves_named_point_label_as_string() {
        let v = Value::NamedPoint(NamedPoint::new("label", 1.0));
        assert_eq!(String::peek(&v).map(String::as_str), Some("label"));
        assert!(f64::peek(&v).is_none());
    }

    #[test]
    fn complex_vector_narrows_elementwise_to_real_parts() {
        let cv = Value::ComplexVector(vec![Complex::new(1.0, 9.0), Complex::new(2.0, 8.0)]);
        assert_eq!(cv.to_vector(), vec![1.0, 2.0]);
    }
}
