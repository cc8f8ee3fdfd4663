//! Register to integer conversions
//!
//! Pure functions; no I/O and no shared state.

use super::{ByteEndian, WordOrder};

// ============================================================================
// Single Register Conversions
// ============================================================================

/// Interpret a register as two's-complement signed, range [-32768, 32767]
pub fn decode_int16(word: u16) -> i16 {
    word as i16
}

/// Interpret a register as unsigned, range [0, 65535]
pub fn decode_uint16(word: u16) -> u16 {
    word
}

/// Apply byte endianness to one received word
pub fn apply_byte_endian(word: u16, endian: ByteEndian) -> u16 {
    if endian.swaps_bytes() {
        word.swap_bytes()
    } else {
        word
    }
}

// ============================================================================
// Register Pair Conversions
// ============================================================================

/// Combine 2 registers into a u32, range [0, 4294967295]
///
/// Bytes inside each word are swapped first when `endian` is little, then
/// `order` picks which word is the high half. Exactly two words are required;
/// callers holding a slice convert with `<&[u16; 2]>::try_from` and handle the
/// mismatch themselves.
pub fn decode_uint32(regs: &[u16; 2], order: WordOrder, endian: ByteEndian) -> u32 {
    let w0 = apply_byte_endian(regs[0], endian) as u32;
    let w1 = apply_byte_endian(regs[1], endian) as u32;

    if order.high_word_first() {
        (w0 << 16) | w1
    } else {
        (w1 << 16) | w0
    }
}
