//! Register word handling
//!
//! Byte endianness / word order selection and the integer reconstructions
//! built on them.
//!
//! # Conventions
//!
//! - Registers arrive from the transport as big-endian 16-bit words
//! - **Byte endian** decides whether the two bytes inside each word are swapped
//! - **Word order** decides which word of a pair carries the high half

pub mod byte_order;
pub mod conversions;

pub use byte_order::{ByteEndian, WordOrder};
pub use conversions::*;
