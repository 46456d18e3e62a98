//! Wire protocol definitions
//!
//! Records travel in the standard tag-based binary encoding: every field is a
//! varint key (`tag << 3 | wire_type`) followed by a varint, a fixed 8-byte
//! value or a length-prefixed byte run. Field numbers are part of the
//! contract and must never be reused for a different meaning.

pub mod error;
pub mod wire;
