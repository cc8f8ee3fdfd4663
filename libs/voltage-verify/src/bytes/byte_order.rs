//! Byte endianness and word order selection for multi-register values

use serde::{Deserialize, Serialize};

/// Byte order inside a single 16-bit register
///
/// For a register received as bytes `[0x12, 0x34]`:
/// - `Big`: word value `0x1234` (as received)
/// - `Little`: word value `0x3412` (bytes swapped)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
pub enum ByteEndian {
    /// AB - most significant byte first, Modbus wire order
    #[default]
    Big,
    /// BA - bytes swapped within each word
    Little,
}

/// Order of the two words that make up a 32-bit value
///
/// For registers `[0x0001, 0x0002]`:
/// - `Big`: `0x0001_0002` (first word is the high half)
/// - `Little`: `0x0002_0001` (first word is the low half, a.k.a. CDAB)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
pub enum WordOrder {
    /// First word is the high half
    #[default]
    Big,
    /// First word is the low half
    Little,
}

impl ByteEndian {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Big => "big",
            Self::Little => "little",
        }
    }

    /// Whether bytes inside each word must be swapped before combination
    pub fn swaps_bytes(&self) -> bool {
        matches!(self, Self::Little)
    }
}

impl WordOrder {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Big => "big",
            Self::Little => "little",
        }
    }

    /// Whether the first received word is the high half
    pub fn high_word_first(&self) -> bool {
        matches!(self, Self::Big)
    }
}

impl std::fmt::Display for ByteEndian {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::fmt::Display for WordOrder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
