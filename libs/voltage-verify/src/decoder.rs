//! Value decoding
//!
//! Maps a canonical [`ValueType`] plus the raw words of a read onto a typed
//! [`DecodedValue`] and its display string. The output variant is chosen by the
//! declared type alone, never inferred from the register contents.
//!
//! Fixed-width types decode only when exactly their register count is present.
//! Anything else (unrecognised type, truncated or oversized word list) falls back
//! to [`DecodedValue::Raw`], which cannot fail.

use serde::Serialize;
use std::fmt;

use crate::bytes::{decode_int16, decode_uint16, decode_uint32, ByteEndian, WordOrder};

/// Canonical register value type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueType {
    /// Signed 16-bit, one register
    Int16,
    /// Unsigned 16-bit, one register
    UInt16,
    /// Unsigned 32-bit, two registers
    UInt32,
    /// Unsigned word list, any register count
    Raw,
}

impl ValueType {
    /// Canonicalize a declared type string against the declared register count
    ///
    /// Aliases (case-insensitive):
    /// - "int", "int16" → `Int16` (quantity 1)
    /// - "uint", "uint16" → `UInt16` (quantity 1)
    /// - "uint32", or any "custom_*" type → `UInt32` (quantity 2)
    ///
    /// Any other type, or a quantity that does not match the type's register
    /// count, canonicalizes to `Raw`.
    pub fn canonicalize(declared: &str, quantity: u16) -> Self {
        let normalized = declared.trim().to_lowercase();
        let candidate = match normalized.as_str() {
            "int" | "int16" => Self::Int16,
            "uint" | "uint16" => Self::UInt16,
            "uint32" => Self::UInt32,
            t if t.starts_with("custom_") => Self::UInt32,
            _ => return Self::Raw,
        };

        match candidate.register_count() {
            Some(count) if count == quantity => candidate,
            _ => Self::Raw,
        }
    }

    /// Number of registers this type consumes, `None` for `Raw`
    pub fn register_count(&self) -> Option<u16> {
        match self {
            Self::Int16 | Self::UInt16 => Some(1),
            Self::UInt32 => Some(2),
            Self::Raw => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Int16 => "int16",
            Self::UInt16 => "uint16",
            Self::UInt32 => "uint32",
            Self::Raw => "raw",
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Decoded register value
///
/// Serializes untagged: a JSON number for the scalar variants, an array of
/// numbers for `Raw`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum DecodedValue {
    Int16(i16),
    UInt16(u16),
    UInt32(u32),
    Raw(Vec<u16>),
}

impl DecodedValue {
    /// Raw fallback over whatever words are available
    pub fn raw(words: &[u16]) -> Self {
        Self::Raw(words.iter().copied().map(decode_uint16).collect())
    }
}

/// Display form: plain integer, or `[a, b, c]` for raw word lists
impl fmt::Display for DecodedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int16(v) => write!(f, "{}", v),
            Self::UInt16(v) => write!(f, "{}", v),
            Self::UInt32(v) => write!(f, "{}", v),
            Self::Raw(words) => {
                write!(f, "[")?;
                for (i, w) in words.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", w)?;
                }
                write!(f, "]")
            },
        }
    }
}

/// Decode `words` as `value_type`, returning `(display, value)`
///
/// Never fails: a word count that does not fit the type degrades to `Raw`.
pub fn select_and_decode(
    value_type: ValueType,
    words: &[u16],
    order: WordOrder,
    endian: ByteEndian,
) -> (String, DecodedValue) {
    let value = match (value_type, words) {
        (ValueType::Int16, [word]) => DecodedValue::Int16(decode_int16(*word)),
        (ValueType::UInt16, [word]) => DecodedValue::UInt16(decode_uint16(*word)),
        (ValueType::UInt32, _) => match <&[u16; 2]>::try_from(words) {
            Ok(pair) => DecodedValue::UInt32(decode_uint32(pair, order, endian)),
            Err(_) => DecodedValue::raw(words),
        },
        _ => DecodedValue::raw(words),
    };

    (value.to_string(), value)
}
