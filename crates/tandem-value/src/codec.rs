// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Self-describing byte encoding for primary values.
//!
//! Every raw buffer crossing the federate-core boundary carries its own type:
//! a one-byte kind tag (the frozen [`ValueKind`] ordering) followed by a
//! little-endian payload. Decoding is strict and deterministic: unknown tags,
//! truncation, trailing bytes, and invalid UTF-8 are each distinct errors,
//! and `decode(encode(v)) == v` for every primary value.
//!
//! # Buffer Format
//!
//! ```text
//! byte 0        = kind tag (0..=8)
//! bytes 1..     = payload:
//!   double          f64[8]
//!   integer         i64[8]
//!   string          len[4] ‖ utf-8 bytes
//!   complex         re f64[8] ‖ im f64[8]
//!   vector          count[4] ‖ count × f64[8]
//!   complex_vector  count[4] ‖ count × (f64[8] ‖ f64[8])
//!   named_point     len[4] ‖ utf-8 bytes ‖ f64[8]
//!   boolean         u8 (0 or 1)
//!   time            i64[8] (nanoseconds)
//! ```
//!
//! All multi-byte integers are **little-endian**.

use bytes::Bytes;
use thiserror::Error;

use crate::time::SimTime;
use crate::value::{Complex, NamedPoint, Value, ValueKind};

/// Error returned by strict decoding.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodecError {
    /// The buffer was empty; there is no kind tag to read.
    #[error("empty buffer")]
    Empty,
    /// The kind tag is not one of the nine primary tags.
    #[error("unknown kind tag {0:#04x}")]
    UnknownTag(u8),
    /// The buffer ended before the payload did.
    #[error("truncated buffer: needed {needed} bytes, had {available}")]
    Truncated {
        /// Bytes the payload required from the cursor position.
        needed: usize,
        /// Bytes actually remaining.
        available: usize,
    },
    /// The buffer continued past the end of the payload.
    #[error("trailing bytes: {trailing} past the end of the payload")]
    TrailingBytes {
        /// Extra byte count.
        trailing: usize,
    },
    /// A string payload was not valid UTF-8.
    #[error("string payload is not valid utf-8")]
    InvalidUtf8,
}

/// Encodes a primary value into its canonical self-describing buffer.
#[must_use]
pub fn encode(value: &Value) -> Bytes {
    let mut buf = Vec::with_capacity(1 + payload_len(value));
    buf.push(value.kind().index());
    match value {
        Value::Double(d) => buf.extend_from_slice(&d.to_le_bytes()),
        Value::Integer(i) => buf.extend_from_slice(&i.to_le_bytes()),
        Value::Text(s) => {
            buf.extend_from_slice(&(s.len() as u32).to_le_bytes());
            buf.extend_from_slice(s.as_bytes());
        }
        Value::Complex(c) => {
            buf.extend_from_slice(&c.re.to_le_bytes());
            buf.extend_from_slice(&c.im.to_le_bytes());
        }
        Value::Vector(v) => {
            buf.extend_from_slice(&(v.len() as u32).to_le_bytes());
            for d in v {
                buf.extend_from_slice(&d.to_le_bytes());
            }
        }
        Value::ComplexVector(v) => {
            buf.extend_from_slice(&(v.len() as u32).to_le_bytes());
            for c in v {
                buf.extend_from_slice(&c.re.to_le_bytes());
                buf.extend_from_slice(&c.im.to_le_bytes());
            }
        }
        Value::NamedPoint(p) => {
            buf.extend_from_slice(&(p.name.len() as u32).to_le_bytes());
            buf.extend_from_slice(p.name.as_bytes());
            buf.extend_from_slice(&p.value.to_le_bytes());
        }
        Value::Boolean(b) => buf.push(u8::from(*b)),
        Value::Time(t) => buf.extend_from_slice(&t.nanos().to_le_bytes()),
    }
    Bytes::from(buf)
}

fn payload_len(value: &Value) -> usize {
    match value {
        Value::Double(_) | Value::Integer(_) | Value::Time(_) => 8,
        Value::Text(s) => 4 + s.len(),
        Value::Complex(_) => 16,
        Value::Vector(v) => 4 + v.len() * 8,
        Value::ComplexVector(v) => 4 + v.len() * 16,
        Value::NamedPoint(p) => 4 + p.name.len() + 8,
        Value::Boolean(_) => 1,
    }
}

/// Reads the kind tag without decoding the payload.
///
/// # Errors
/// Returns [`CodecError::Empty`] on an empty buffer or
/// [`CodecError::UnknownTag`] on an unrecognised tag byte.
pub fn peek_kind(bytes: &[u8]) -> Result<ValueKind, CodecError> {
    let tag = *bytes.first().ok_or(CodecError::Empty)?;
    ValueKind::from_index(tag).ok_or(CodecError::UnknownTag(tag))
}

/// Strictly decodes a self-describing buffer back into a primary value.
///
/// # Errors
/// Returns a [`CodecError`] if the buffer is empty, tagged with an unknown
/// kind, truncated, carries trailing bytes, or holds invalid UTF-8.
pub fn decode(bytes: &[u8]) -> Result<Value, CodecError> {
    let kind = peek_kind(bytes)?;
    let mut reader = Reader::new(&bytes[1..]);
    let value = match kind {
        ValueKind::Double => Value::Double(reader.read_f64()?),
        ValueKind::Integer => Value::Integer(reader.read_i64()?),
        ValueKind::Text => Value::Text(reader.read_string()?),
        ValueKind::Complex => {
            let re = reader.read_f64()?;
            let im = reader.read_f64()?;
            Value::Complex(Complex::new(re, im))
        }
        ValueKind::Vector => {
            let count = reader.read_count()?;
            let mut v = Vec::with_capacity(count.min(MAX_PREALLOC));
            for _ in 0..count {
                v.push(reader.read_f64()?);
            }
            Value::Vector(v)
        }
        ValueKind::ComplexVector => {
            let count = reader.read_count()?;
            let mut v = Vec::with_capacity(count.min(MAX_PREALLOC));
            for _ in 0..count {
                let re = reader.read_f64()?;
                let im = reader.read_f64()?;
                v.push(Complex::new(re, im));
            }
            Value::ComplexVector(v)
        }
        ValueKind::NamedPoint => {
            let name = reader.read_string()?;
            let value = reader.read_f64()?;
            Value::NamedPoint(NamedPoint { name, value })
        }
        ValueKind::Boolean => Value::Boolean(reader.read_u8()? != 0),
        ValueKind::Time => Value::Time(SimTime::from_nanos(reader.read_i64()?)),
    };
    reader.finish()?;
    Ok(value)
}

/// Cap on speculative `Vec` preallocation so a hostile count field cannot
/// force a huge reservation before the length check catches it.
const MAX_PREALLOC: usize = 4096;

struct Reader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    fn take(&mut self, len: usize) -> Result<&'a [u8], CodecError> {
        let available = self.buf.len() - self.pos;
        if available < len {
            return Err(CodecError::Truncated {
                needed: len,
                available,
            });
        }
        let slice = &self.buf[self.pos..self.pos + len];
        self.pos += len;
        Ok(slice)
    }

    fn read_u8(&mut self) -> Result<u8, CodecError> {
        Ok(self.take(1)?[0])
    }

    fn read_f64(&mut self) -> Result<f64, CodecError> {
        let raw = self.take(8)?;
        let mut arr = [0u8; 8];
        arr.copy_from_slice(raw);
        Ok(f64::from_le_bytes(arr))
    }

    fn read_i64(&mut self) -> Result<i64, CodecError> {
        let raw = self.take(8)?;
        let mut arr = [0u8; 8];
        arr.copy_from_slice(raw);
        Ok(i64::from_le_bytes(arr))
    }

    fn read_count(&mut self) -> Result<usize, CodecError> {
        let raw = self.take(4)?;
        let mut arr = [0u8; 4];
        arr.copy_from_slice(raw);
        Ok(u32::from_le_bytes(arr) as usize)
    }

    fn read_string(&mut self) -> Result<String, CodecError> {
        let len = self.read_count()?;
        let raw = self.take(len)?;
        String::from_utf8(raw.to_vec()).map_err(|_| CodecError::InvalidUtf8)
    }

    fn finish(self) -> Result<(), CodecError> {
        if self.pos == self.buf.len() {
            Ok(())
        } else {
            Err(CodecError::TrailingBytes {
                trailing: self.buf.len() - self.pos,
            })
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;

    fn samples() -> Vec<Value> {
        vec![
            Value::Double(3.5),
            Value::Double(-0.0),
            Value::Integer(i64::MIN),
            Value::Text(String::new()),
            Value::Text("grüß".into()),
            Value::Complex(Complex::new(1.0, -2.0)),
            Value::Vector(Vec::new()),
            Value::Vector(vec![1.5, -2.5, 0.0]),
            Value::ComplexVector(vec![Complex::new(0.5, 0.25)]),
            Value::NamedPoint(NamedPoint::new("setpoint", 42.0)),
            Value::Boolean(true),
            Value::Boolean(false),
            Value::Time(SimTime::from_secs(2.5)),
        ]
    }

    #[test]
    fn round_trip_preserves_every_sample() {
        for v in samples() {
            let buf = encode(&v);
            assert_eq!(decode(&buf).unwrap(), v, "{v:?}");
        }
    }

    #[test]
    fn nan_round_trips_bit_exactly() {
        let buf = encode(&Value::Double(f64::NAN));
        match decode(&buf).unwrap() {
            Value::Double(d) => assert_eq!(d.to_bits(), f64::NAN.to_bits()),
            other => panic!("wrong variant: {other:?}"),
        }
    }

    #[test]
    fn tag_byte_is_the_kind_index() {
        for v in samples() {
            assert_eq!(encode(&v)[0], v.kind().index());
            assert_eq!(peek_kind(&encode(&v)).unwrap(), v.kind());
        }
    }

    #[test]
    fn empty_buffer_is_an_error() {
        assert_eq!(decode(&[]), Err(CodecError::Empty));
        assert_eq!(peek_kind(&[]), Err(CodecError::Empty));
    }

    #[test]
    fn unknown_tag_is_an_error() {
        assert_eq!(decode(&[0x2A]), Err(CodecError::UnknownTag(0x2A)));
    }

    #[test]
    fn truncated_payload_is_an_error() {
        let buf = encode(&Value::Double(1.0));
        let result = decode(&buf[..buf.len() - 1]);
        assert!(matches!(result, Err(CodecError::Truncated { .. })));
    }

    #[test]
    fn truncated_vector_body_is_an_error() {
        // Count says 2 elements but only one follows.
        let mut buf = Vec::new();
        buf.push(ValueKind::Vector.index());
        buf.extend_from_slice(&2u32.to_le_bytes());
        buf.extend_from_slice(&1.0f64.to_le_bytes());
        assert!(matches!(decode(&buf), Err(CodecError::Truncated { .. })));
    }

    #[test]
    fn trailing_bytes_are_an_error() {
        let mut buf = encode(&Value::Boolean(true)).to_vec();
        buf.push(0);
        assert_eq!(decode(&buf), Err(CodecError::TrailingBytes { trailing: 1 }));
    }

    #[test]
    fn invalid_utf8_is_an_error() {
        let mut buf = Vec::new();
        buf.push(ValueKind::Text.index());
        buf.extend_from_slice(&2u32.to_le_bytes());
        buf.extend_from_slice(&[0xFF, 0xFE]);
        assert_eq!(decode(&buf), Err(CodecError::InvalidUtf8));
    }

    #[test]
    fn hostile_count_fails_without_reserving() {
        let mut buf = Vec::new();
        buf.push(ValueKind::Vector.index());
        buf.extend_from_slice(&u32::MAX.to_le_bytes());
        assert!(matches!(decode(&buf), Err(CodecError::Truncated { .. })));
    }
}
