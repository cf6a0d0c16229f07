//! The tagged value codec.
//!
//! Every value on the wire starts with a one-byte tag that indexes the
//! type table below, followed by a payload whose size the tag (and, for
//! strings and buffers, a single length byte) fully determines:
//!
//! ```text
//! tag  type       payload
//! 0    u8         1 byte
//! 1    u16        2 bytes LE
//! 2    u32        4 bytes LE
//! 3    s8         1 byte
//! 4    s16        2 bytes LE
//! 5    s32        4 bytes LE
//! 6    f16        (reserved, rejected both ways)
//! 7    f32        4 bytes LE
//! 8    f64        8 bytes LE
//! 9    string     u8 length + UTF-8 bytes, no terminator
//! 10   buffer     u8 length + raw bytes
//! 11   undefined  nothing
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{DecodeError, EncodeError, Reader};

/// Longest string or buffer payload: one length byte's worth.
pub const MAX_VARIABLE_LEN: usize = u8::MAX as usize;

/// The wire type table. The discriminant is the tag byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum ValueType {
    U8 = 0,
    U16 = 1,
    U32 = 2,
    S8 = 3,
    S16 = 4,
    S32 = 5,
    /// Reserved for wire compatibility; there is no half-float value.
    F16 = 6,
    F32 = 7,
    F64 = 8,
    String = 9,
    Buffer = 10,
    Undefined = 11,
}

impl ValueType {
    /// Every type in tag order.
    pub const ALL: [ValueType; 12] = [
        Self::U8,
        Self::U16,
        Self::U32,
        Self::S8,
        Self::S16,
        Self::S32,
        Self::F16,
        Self::F32,
        Self::F64,
        Self::String,
        Self::Buffer,
        Self::Undefined,
    ];

    /// Looks up a tag byte.
    pub fn from_tag(tag: u8) -> Option<Self> {
        Self::ALL.get(usize::from(tag)).copied()
    }

    pub fn tag(self) -> u8 {
        self as u8
    }

    /// Payload width for fixed-size types, `None` for length-prefixed ones.
    pub fn fixed_width(self) -> Option<usize> {
        match self {
            Self::U8 | Self::S8 => Some(1),
            Self::U16 | Self::S16 | Self::F16 => Some(2),
            Self::U32 | Self::S32 | Self::F32 => Some(4),
            Self::F64 => Some(8),
            Self::Undefined => Some(0),
            Self::String | Self::Buffer => None,
        }
    }

    /// `false` only for `f16`, which is in the table but cannot be carried.
    pub fn is_supported(self) -> bool {
        !matches!(self, Self::F16)
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::U8 => "u8",
            Self::U16 => "u16",
            Self::U32 => "u32",
            Self::S8 => "s8",
            Self::S16 => "s16",
            Self::S32 => "s32",
            Self::F16 => "f16",
            Self::F32 => "f32",
            Self::F64 => "f64",
            Self::String => "string",
            Self::Buffer => "buffer",
            Self::Undefined => "undefined",
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One typed value carried in a packet.
///
/// The variant is the wire type: converting from a Rust integer with
/// [`From`] keeps that integer's exact width, while [`Value::narrow`]
/// picks the smallest type that holds the number.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    U8(u8),
    U16(u16),
    U32(u32),
    S8(i8),
    S16(i16),
    S32(i32),
    F32(f32),
    F64(f64),
    String(String),
    Buffer(Vec<u8>),
    /// The explicit "no value" marker.
    Undefined,
}

impl Value {
    /// Narrowest-fit integer encoding.
    ///
    /// Negative numbers become `s8` when `|n| <= 127`, `s16` when
    /// `|n| <= 32767`, otherwise `s32`. Non-negative numbers become `u8`,
    /// `u16` or `u32` by the same rule. Anything outside `i32::MIN..=u32::MAX`
    /// fails with [`EncodeError::OutOfRange`].
    pub fn narrow(n: i64) -> Result<Self, EncodeError> {
        if n < 0 {
            let magnitude = n.unsigned_abs();
            if magnitude <= 127 {
                Ok(Self::S8(n as i8))
            } else if magnitude <= 32_767 {
                Ok(Self::S16(n as i16))
            } else {
                i32::try_from(n).map(Self::S32).map_err(|_| EncodeError::OutOfRange {
                    value: n as f64,
                    ty: ValueType::S32,
                })
            }
        } else if n <= 255 {
            Ok(Self::U8(n as u8))
        } else if n <= 65_535 {
            Ok(Self::U16(n as u16))
        } else {
            u32::try_from(n).map(Self::U32).map_err(|_| EncodeError::OutOfRange {
                value: n as f64,
                ty: ValueType::U32,
            })
        }
    }

    /// Builds a value of an explicitly chosen numeric wire type.
    ///
    /// Integer types require `n` to be integral and in range. Non-numeric
    /// types and `f16` are rejected with [`EncodeError::UnsupportedType`].
    pub fn numeric(ty: ValueType, n: f64) -> Result<Self, EncodeError> {
        let integral = |min: f64, max: f64| {
            if n.fract() == 0.0 && n >= min && n <= max {
                Ok(n)
            } else {
                Err(EncodeError::OutOfRange { value: n, ty })
            }
        };
        match ty {
            ValueType::U8 => integral(0.0, f64::from(u8::MAX)).map(|v| Self::U8(v as u8)),
            ValueType::U16 => integral(0.0, f64::from(u16::MAX)).map(|v| Self::U16(v as u16)),
            ValueType::U32 => integral(0.0, f64::from(u32::MAX)).map(|v| Self::U32(v as u32)),
            ValueType::S8 => {
                integral(f64::from(i8::MIN), f64::from(i8::MAX)).map(|v| Self::S8(v as i8))
            }
            ValueType::S16 => {
                integral(f64::from(i16::MIN), f64::from(i16::MAX)).map(|v| Self::S16(v as i16))
            }
            ValueType::S32 => {
                integral(f64::from(i32::MIN), f64::from(i32::MAX)).map(|v| Self::S32(v as i32))
            }
            ValueType::F32 => Ok(Self::F32(n as f32)),
            ValueType::F64 => Ok(Self::F64(n)),
            ValueType::F16 | ValueType::String | ValueType::Buffer | ValueType::Undefined => {
                Err(EncodeError::UnsupportedType(ty))
            }
        }
    }

    pub fn value_type(&self) -> ValueType {
        match self {
            Self::U8(_) => ValueType::U8,
            Self::U16(_) => ValueType::U16,
            Self::U32(_) => ValueType::U32,
            Self::S8(_) => ValueType::S8,
            Self::S16(_) => ValueType::S16,
            Self::S32(_) => ValueType::S32,
            Self::F32(_) => ValueType::F32,
            Self::F64(_) => ValueType::F64,
            Self::String(_) => ValueType::String,
            Self::Buffer(_) => ValueType::Buffer,
            Self::Undefined => ValueType::Undefined,
        }
    }

    /// Bytes after the tag: the natural width, or `1 + length` for strings
    /// and buffers.
    pub fn payload_len(&self) -> usize {
        match self {
            Self::String(s) => 1 + s.len(),
            Self::Buffer(b) => 1 + b.len(),
            other => other.value_type().fixed_width().unwrap_or(0),
        }
    }

    /// Total encoded size, tag included.
    pub fn encoded_len(&self) -> usize {
        1 + self.payload_len()
    }

    /// Appends `[tag][payload]` to `out` and returns the number of bytes
    /// written. Nothing is appended on error.
    pub fn encode(&self, out: &mut Vec<u8>) -> Result<usize, EncodeError> {
        let ty = self.value_type();
        if let Self::String(s) = self {
            check_len(ty, s.len())?;
        }
        if let Self::Buffer(b) = self {
            check_len(ty, b.len())?;
        }

        let start = out.len();
        out.push(ty.tag());
        match self {
            Self::U8(v) => out.push(*v),
            Self::U16(v) => out.extend_from_slice(&v.to_le_bytes()),
            Self::U32(v) => out.extend_from_slice(&v.to_le_bytes()),
            Self::S8(v) => out.extend_from_slice(&v.to_le_bytes()),
            Self::S16(v) => out.extend_from_slice(&v.to_le_bytes()),
            Self::S32(v) => out.extend_from_slice(&v.to_le_bytes()),
            Self::F32(v) => out.extend_from_slice(&v.to_le_bytes()),
            Self::F64(v) => out.extend_from_slice(&v.to_le_bytes()),
            Self::String(s) => write_prefixed(out, s.as_bytes()),
            Self::Buffer(b) => write_prefixed(out, b),
            Self::Undefined => {}
        }
        Ok(out.len() - start)
    }

    /// Encodes into a fresh buffer.
    pub fn to_bytes(&self) -> Result<Vec<u8>, EncodeError> {
        let mut out = Vec::with_capacity(self.encoded_len());
        self.encode(&mut out)?;
        Ok(out)
    }

    /// Decodes one value and returns it with the number of bytes it took
    /// from `reader`, tag included.
    ///
    /// On error the reader is left where it was.
    pub fn decode(reader: &mut Reader<'_>) -> Result<(Self, usize), DecodeError> {
        let start = reader.position();
        let mut probe = reader.clone();

        let tag = probe.read_u8()?;
        let ty = ValueType::from_tag(tag).ok_or(DecodeError::UnknownType(tag))?;
        let value = match ty {
            ValueType::U8 => Self::U8(probe.read_u8()?),
            ValueType::U16 => Self::U16(u16::from_le_bytes(probe.read_array()?)),
            ValueType::U32 => Self::U32(u32::from_le_bytes(probe.read_array()?)),
            ValueType::S8 => Self::S8(i8::from_le_bytes(probe.read_array()?)),
            ValueType::S16 => Self::S16(i16::from_le_bytes(probe.read_array()?)),
            ValueType::S32 => Self::S32(i32::from_le_bytes(probe.read_array()?)),
            ValueType::F16 => return Err(DecodeError::UnsupportedType(ty)),
            ValueType::F32 => Self::F32(f32::from_le_bytes(probe.read_array()?)),
            ValueType::F64 => Self::F64(f64::from_le_bytes(probe.read_array()?)),
            ValueType::String => {
                let len = usize::from(probe.read_u8()?);
                let offset = probe.position();
                let body = probe.read_slice(len)?;
                let text = std::str::from_utf8(body)
                    .map_err(|_| DecodeError::InvalidUtf8 { offset })?;
                Self::String(text.to_owned())
            }
            ValueType::Buffer => {
                let len = usize::from(probe.read_u8()?);
                Self::Buffer(probe.read_slice(len)?.to_vec())
            }
            ValueType::Undefined => Self::Undefined,
        };

        let consumed = probe.position() - start;
        *reader = probe;
        Ok((value, consumed))
    }

    /// Decodes one value from the start of `bytes`.
    pub fn from_bytes(bytes: &[u8]) -> Result<(Self, usize), DecodeError> {
        Self::decode(&mut Reader::new(bytes))
    }

    /// Any integer variant, widened.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::U8(v) => Some(i64::from(*v)),
            Self::U16(v) => Some(i64::from(*v)),
            Self::U32(v) => Some(i64::from(*v)),
            Self::S8(v) => Some(i64::from(*v)),
            Self::S16(v) => Some(i64::from(*v)),
            Self::S32(v) => Some(i64::from(*v)),
            _ => None,
        }
    }

    /// Any numeric variant as a double.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::F32(v) => Some(f64::from(*v)),
            Self::F64(v) => Some(*v),
            other => other.as_i64().map(|v| v as f64),
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Self::Buffer(b) => Some(b),
            _ => None,
        }
    }

    pub fn is_undefined(&self) -> bool {
        matches!(self, Self::Undefined)
    }
}

fn check_len(ty: ValueType, len: usize) -> Result<(), EncodeError> {
    if len > MAX_VARIABLE_LEN {
        return Err(EncodeError::TooLong { ty, len });
    }
    Ok(())
}

// Callers check the length first.
fn write_prefixed(out: &mut Vec<u8>, body: &[u8]) {
    out.push(body.len() as u8);
    out.extend_from_slice(body);
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let ty = self.value_type();
        match self {
            Self::U8(v) => write!(f, "{ty}({v})"),
            Self::U16(v) => write!(f, "{ty}({v})"),
            Self::U32(v) => write!(f, "{ty}({v})"),
            Self::S8(v) => write!(f, "{ty}({v})"),
            Self::S16(v) => write!(f, "{ty}({v})"),
            Self::S32(v) => write!(f, "{ty}({v})"),
            Self::F32(v) => write!(f, "{ty}({v})"),
            Self::F64(v) => write!(f, "{ty}({v})"),
            Self::String(s) => write!(f, "{ty}({s:?})"),
            Self::Buffer(b) => write!(f, "{ty}[{} bytes]", b.len()),
            Self::Undefined => f.write_str("undefined"),
        }
    }
}

// Explicitly typed inputs keep their exact wire type.
macro_rules! impl_from_exact {
    ($($source:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$source> for Value {
                fn from(v: $source) -> Self {
                    Self::$variant(v)
                }
            }
        )*
    };
}

impl_from_exact! {
    u8 => U8,
    u16 => U16,
    u32 => U32,
    i8 => S8,
    i16 => S16,
    i32 => S32,
    f32 => F32,
    f64 => F64,
    String => String,
    Vec<u8> => Buffer,
}

/// `true` is `u8(1)`, `false` is `u8(0)`.
impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Self::U8(u8::from(v))
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::String(v.to_owned())
    }
}

impl From<&[u8]> for Value {
    fn from(v: &[u8]) -> Self {
        Self::Buffer(v.to_vec())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Self::Undefined, Into::into)
    }
}

impl TryFrom<i64> for Value {
    type Error = EncodeError;

    fn try_from(n: i64) -> Result<Self, Self::Error> {
        Self::narrow(n)
    }
}

impl TryFrom<u64> for Value {
    type Error = EncodeError;

    fn try_from(n: u64) -> Result<Self, Self::Error> {
        let n = i64::try_from(n).map_err(|_| EncodeError::OutOfRange {
            value: n as f64,
            ty: ValueType::U32,
        })?;
        Self::narrow(n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn round_trip(value: Value) {
        let bytes = value.to_bytes().expect("encode");
        assert_eq!(bytes.len(), value.encoded_len());
        let (decoded, consumed) = Value::from_bytes(&bytes).expect("decode");
        assert_eq!(decoded, value);
        assert_eq!(consumed, bytes.len());
    }

    #[test]
    fn test_tag_table_matches_discriminants() {
        for (index, ty) in ValueType::ALL.iter().enumerate() {
            assert_eq!(usize::from(ty.tag()), index);
            assert_eq!(ValueType::from_tag(ty.tag()), Some(*ty));
        }
        assert_eq!(ValueType::from_tag(12), None);
        assert_eq!(ValueType::Buffer.to_string(), "buffer");
    }

    #[test]
    fn test_narrowest_fit_picks_smallest_type() {
        assert_eq!(Value::narrow(0).unwrap(), Value::U8(0));
        assert_eq!(Value::narrow(200).unwrap(), Value::U8(200));
        assert_eq!(Value::narrow(255).unwrap(), Value::U8(255));
        assert_eq!(Value::narrow(300).unwrap(), Value::U16(300));
        assert_eq!(Value::narrow(65_535).unwrap(), Value::U16(65_535));
        assert_eq!(Value::narrow(70_000).unwrap(), Value::U32(70_000));
        assert_eq!(Value::narrow(-1).unwrap(), Value::S8(-1));
        assert_eq!(Value::narrow(-127).unwrap(), Value::S8(-127));
        assert_eq!(Value::narrow(-200).unwrap(), Value::S16(-200));
        assert_eq!(Value::narrow(-40_000).unwrap(), Value::S32(-40_000));
    }

    #[test]
    fn test_narrowing_uses_magnitude_rule_at_the_signed_edges() {
        // |-128| > 127, so it does not narrow to s8.
        assert_eq!(Value::narrow(-128).unwrap(), Value::S16(-128));
        assert_eq!(Value::narrow(-32_768).unwrap(), Value::S32(-32_768));
        assert_eq!(
            Value::narrow(i64::from(i32::MIN)).unwrap(),
            Value::S32(i32::MIN)
        );
    }

    #[test]
    fn test_narrowing_rejects_numbers_outside_32_bits() {
        assert!(matches!(
            Value::narrow(i64::from(u32::MAX) + 1),
            Err(EncodeError::OutOfRange { ty: ValueType::U32, .. })
        ));
        assert!(matches!(
            Value::narrow(i64::from(i32::MIN) - 1),
            Err(EncodeError::OutOfRange { ty: ValueType::S32, .. })
        ));
        assert!(Value::try_from(u64::MAX).is_err());
        assert_eq!(Value::try_from(70_000u64).unwrap(), Value::U32(70_000));
        assert_eq!(Value::try_from(-5i64).unwrap(), Value::S8(-5));
    }

    #[test]
    fn test_explicit_types_bypass_narrowing() {
        assert_eq!(Value::from(5u32), Value::U32(5));
        assert_eq!(Value::from(5i16), Value::S16(5));
        assert_eq!(Value::from(1.5f32).value_type(), ValueType::F32);
        assert_eq!(Value::from(1.5f64).value_type(), ValueType::F64);
        assert_eq!(Value::from(true), Value::U8(1));
        assert_eq!(Value::from(false), Value::U8(0));
        assert_eq!(Value::from(None::<u8>), Value::Undefined);
        assert_eq!(Value::from(Some("hi")), Value::String("hi".into()));
    }

    #[test]
    fn test_numeric_builds_requested_type() {
        assert_eq!(Value::numeric(ValueType::U16, 300.0).unwrap(), Value::U16(300));
        assert_eq!(Value::numeric(ValueType::S8, -3.0).unwrap(), Value::S8(-3));
        assert_eq!(Value::numeric(ValueType::F32, 0.5).unwrap(), Value::F32(0.5));
        assert!(matches!(
            Value::numeric(ValueType::U8, 256.0),
            Err(EncodeError::OutOfRange { .. })
        ));
        assert!(matches!(
            Value::numeric(ValueType::S16, 1.25),
            Err(EncodeError::OutOfRange { .. })
        ));
        assert_eq!(
            Value::numeric(ValueType::F16, 1.0),
            Err(EncodeError::UnsupportedType(ValueType::F16))
        );
        assert_eq!(
            Value::numeric(ValueType::String, 1.0),
            Err(EncodeError::UnsupportedType(ValueType::String))
        );
    }

    #[test]
    fn test_multi_byte_numbers_are_little_endian() {
        assert_eq!(Value::U16(0x1234).to_bytes().unwrap(), vec![1, 0x34, 0x12]);
        assert_eq!(
            Value::S32(-2).to_bytes().unwrap(),
            vec![5, 0xFE, 0xFF, 0xFF, 0xFF]
        );
        assert_eq!(
            Value::F32(1.0).to_bytes().unwrap(),
            vec![7, 0x00, 0x00, 0x80, 0x3F]
        );
    }

    #[test]
    fn test_round_trip_each_representation() {
        round_trip(Value::U32(u32::MAX));
        round_trip(Value::S8(i8::MIN));
        round_trip(Value::S16(-12_345));
        round_trip(Value::F32(-0.125));
        round_trip(Value::F64(std::f64::consts::PI));
        round_trip(Value::String("héllo".into()));
        round_trip(Value::String(String::new()));
        round_trip(Value::Buffer(vec![0, 255, 7]));
        round_trip(Value::Undefined);
    }

    #[test]
    fn test_floats_keep_full_precision() {
        let (value, _) = Value::from_bytes(&Value::F64(1.23456789).to_bytes().unwrap()).unwrap();
        assert_eq!(value, Value::F64(1.23456789));
    }

    #[test]
    fn test_string_layout_is_tag_length_bytes() {
        let bytes = Value::from("hi").to_bytes().unwrap();
        assert_eq!(bytes, vec![9, 2, b'h', b'i']);
        let value = Value::from("hi");
        assert_eq!(value.payload_len(), 3);
        assert_eq!(value.encoded_len(), 4);
    }

    #[test]
    fn test_undefined_is_a_bare_tag() {
        assert_eq!(Value::Undefined.to_bytes().unwrap(), vec![11]);
        let (value, consumed) = Value::from_bytes(&[11]).unwrap();
        assert!(value.is_undefined());
        assert_eq!(consumed, 1);
    }

    #[test]
    fn test_variable_payload_limit() {
        let max = "x".repeat(MAX_VARIABLE_LEN);
        assert_eq!(Value::from(max.as_str()).to_bytes().unwrap().len(), 257);

        let mut out = vec![0xAA];
        let err = Value::String("x".repeat(256)).encode(&mut out).unwrap_err();
        assert_eq!(
            err,
            EncodeError::TooLong {
                ty: ValueType::String,
                len: 256
            }
        );
        assert_eq!(out, vec![0xAA], "nothing appended on error");
        assert!(matches!(
            Value::Buffer(vec![0; 300]).to_bytes(),
            Err(EncodeError::TooLong { ty: ValueType::Buffer, len: 300 })
        ));
    }

    #[test]
    fn test_decode_rejects_unknown_and_unsupported_tags() {
        assert_eq!(Value::from_bytes(&[42]), Err(DecodeError::UnknownType(42)));
        assert_eq!(
            Value::from_bytes(&[6, 0, 0]),
            Err(DecodeError::UnsupportedType(ValueType::F16))
        );
    }

    #[test]
    fn test_decode_rejects_truncated_input() {
        assert_eq!(
            Value::from_bytes(&[2, 1, 2]),
            Err(DecodeError::Truncated {
                needed: 4,
                available: 2
            })
        );
        assert_eq!(
            Value::from_bytes(&[10, 5, 1, 2]),
            Err(DecodeError::Truncated {
                needed: 5,
                available: 2
            })
        );
        assert!(matches!(
            Value::from_bytes(&[]),
            Err(DecodeError::Truncated { .. })
        ));
    }

    #[test]
    fn test_decode_rejects_invalid_utf8() {
        assert_eq!(
            Value::from_bytes(&[9, 2, 0xC3, 0x28]),
            Err(DecodeError::InvalidUtf8 { offset: 2 })
        );
    }

    #[test]
    fn test_failed_decode_leaves_reader_in_place() {
        let bytes = [0, 9, 1, 0xFF];
        let mut reader = Reader::new(&bytes);
        let (first, consumed) = Value::decode(&mut reader).unwrap();
        assert_eq!((first, consumed), (Value::U8(9), 2));
        assert!(Value::decode(&mut reader).is_err());
        assert_eq!(reader.position(), 2);
    }

    #[test]
    fn test_accessors() {
        assert_eq!(Value::S16(-4).as_i64(), Some(-4));
        assert_eq!(Value::U8(3).as_f64(), Some(3.0));
        assert_eq!(Value::F32(0.5).as_i64(), None);
        assert_eq!(Value::from("a").as_str(), Some("a"));
        assert_eq!(Value::from(&[1u8, 2][..]).as_bytes(), Some(&[1u8, 2][..]));
        assert_eq!(Value::U8(1).as_str(), None);
    }

    #[test]
    fn test_serde_representation_is_externally_tagged() {
        let json = serde_json::to_string(&Value::U16(300)).unwrap();
        assert_eq!(json, r#"{"U16":300}"#);
        let back: Value = serde_json::from_str(r#"{"String":"hi"}"#).unwrap();
        assert_eq!(back, Value::String("hi".into()));
    }

    #[test]
    fn test_display() {
        assert_eq!(Value::U8(5).to_string(), "u8(5)");
        assert_eq!(Value::from("hi").to_string(), r#"string("hi")"#);
        assert_eq!(Value::Buffer(vec![1, 2]).to_string(), "buffer[2 bytes]");
    }
}
