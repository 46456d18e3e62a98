//! Record codec shared by `Point` and `Aux`.
//!
//! Encoding walks the known fields in ascending tag order and then appends
//! the unknown-field buffer untouched. Decoding accepts fields in any order;
//! a tag the record does not know is copied (key and payload, exactly as
//! received) into the unknown-field buffer so that a re-encode forwards it
//! to the next hop.
//!
//! Scalars follow the usual last-one-wins rule when a tag repeats; repeated
//! message fields append.

use crate::config::CodecConfig;
use crate::protocol::error::{Malformed, WireError};
use crate::utils::bytes_to_hex;
use bytes::{Buf, BufMut};
use prost::encoding::{
    decode_key, decode_varint, encode_key, encode_varint, encoded_len_varint, key_len,
    skip_field, DecodeContext, WireType,
};
use tracing::{debug, trace};

/// A record with a fixed field schema and a buffer of retained unknown fields.
pub trait WireRecord: Default {
    /// Fully qualified schema name.
    const FULL_NAME: &'static str;

    /// Fails with `MissingRequiredField` naming the first absent required field.
    fn check_required(&self) -> Result<(), WireError>;

    /// Write every present known field, ascending by tag.
    fn encode_fields<B: BufMut>(&self, buf: &mut B);

    /// Exact number of bytes `encode_fields` writes.
    fn fields_len(&self) -> usize;

    /// Consume the payload of one field whose key has already been read.
    ///
    /// Returns `Ok(false)` without touching `buf` when `tag` is not part of
    /// the schema.
    fn merge_field(
        &mut self,
        tag: u32,
        wire_type: WireType,
        buf: &mut &[u8],
    ) -> Result<bool, WireError>;

    /// Raw bytes of fields this build does not know about.
    fn unknown_fields(&self) -> &[u8];

    /// Append one raw unknown field (key and payload).
    fn push_unknown(&mut self, raw: &[u8]);

    /// Size of the encoded record, unknown fields included.
    fn encoded_len(&self) -> usize {
        self.fields_len() + self.unknown_fields().len()
    }

    /// Write the record without checking required fields.
    fn encode_raw<B: BufMut>(&self, buf: &mut B) {
        self.encode_fields(buf);
        buf.put_slice(self.unknown_fields());
    }

    /// Write the record, refusing to emit anything if a required field is
    /// absent or `buf` cannot hold the whole record.
    fn encode<B: BufMut>(&self, buf: &mut B) -> Result<(), WireError> {
        self.check_required()?;
        let required = self.encoded_len();
        let remaining = buf.remaining_mut();
        if required > remaining {
            return Err(WireError::InsufficientCapacity {
                required,
                remaining,
            });
        }
        self.encode_raw(buf);
        Ok(())
    }

    /// Serialize the record into a freshly allocated buffer.
    fn to_bytes(&self) -> Result<Vec<u8>, WireError> {
        let mut buf = Vec::with_capacity(self.encoded_len());
        self.encode(&mut buf)?;
        Ok(buf)
    }

    /// Merge encoded fields into `self`.
    ///
    /// Present scalars overwrite, repeated messages append and unknown fields
    /// accumulate. Required fields of `self` are not checked, but nested
    /// records are decoded in full and must carry theirs.
    fn merge(&mut self, mut buf: &[u8]) -> Result<(), WireError> {
        while buf.has_remaining() {
            let field = buf;
            let (tag, wire_type) = decode_key(&mut buf).map_err(Malformed::from)?;
            if self.merge_field(tag, wire_type, &mut buf)? {
                continue;
            }

            skip_field(wire_type, tag, &mut buf, DecodeContext::default())
                .map_err(Malformed::from)?;
            let raw = &field[..field.len() - buf.len()];
            trace!(
                record = Self::FULL_NAME,
                tag,
                wire_type = ?wire_type,
                bytes = %bytes_to_hex(raw),
                "retaining unknown field"
            );
            self.push_unknown(raw);
        }
        Ok(())
    }

    /// Decode a complete record, rejecting input that lacks a required field.
    fn decode(buf: &[u8]) -> Result<Self, WireError> {
        let mut record = Self::default();
        record.merge(buf)?;
        record.check_required()?;
        Ok(record)
    }

    /// Decode with the default `CodecConfig` limits.
    fn from_bytes(bytes: &[u8]) -> Result<Self, WireError> {
        Self::from_bytes_with(bytes, &CodecConfig::default())
    }

    /// Decode after checking the payload against `config`.
    fn from_bytes_with(bytes: &[u8], config: &CodecConfig) -> Result<Self, WireError> {
        if bytes.len() > config.max_message_size {
            debug!(
                "{} payload of {} bytes exceeds limit of {}",
                Self::FULL_NAME,
                bytes.len(),
                config.max_message_size
            );
            return Err(WireError::MessageTooLarge {
                size: bytes.len(),
                limit: config.max_message_size,
            });
        }

        Self::decode(bytes).map_err(|e| {
            debug!("{} decode failed: {}", Self::FULL_NAME, e);
            e
        })
    }

    /// Reset to the empty record.
    fn clear(&mut self) {
        *self = Self::default();
    }
}

// ---------------------------------------------------------------------------
// Field readers
// ---------------------------------------------------------------------------

fn expect_wire_type(tag: u32, expected: WireType, actual: WireType) -> Result<(), Malformed> {
    if expected == actual {
        Ok(())
    } else {
        Err(Malformed::UnexpectedWireType {
            tag,
            expected,
            actual,
        })
    }
}

pub(crate) fn read_varint(
    tag: u32,
    wire_type: WireType,
    buf: &mut &[u8],
) -> Result<u64, Malformed> {
    expect_wire_type(tag, WireType::Varint, wire_type)?;
    Ok(decode_varint(buf)?)
}

/// Any nonzero varint reads as `true`.
pub(crate) fn read_bool(
    tag: u32,
    wire_type: WireType,
    buf: &mut &[u8],
) -> Result<bool, Malformed> {
    read_varint(tag, wire_type, buf).map(|v| v != 0)
}

/// Sign-extended two's complement, not zig-zag.
pub(crate) fn read_int64(
    tag: u32,
    wire_type: WireType,
    buf: &mut &[u8],
) -> Result<i64, Malformed> {
    read_varint(tag, wire_type, buf).map(|v| v as i64)
}

pub(crate) fn read_fixed64(
    tag: u32,
    wire_type: WireType,
    buf: &mut &[u8],
) -> Result<f64, Malformed> {
    expect_wire_type(tag, WireType::SixtyFourBit, wire_type)?;
    if buf.remaining() < 8 {
        return Err(Malformed::Truncated {
            tag,
            needed: 8,
            remaining: buf.remaining(),
        });
    }
    Ok(f64::from_bits(buf.get_u64_le()))
}

pub(crate) fn read_bytes<'a>(
    tag: u32,
    wire_type: WireType,
    buf: &mut &'a [u8],
) -> Result<&'a [u8], Malformed> {
    expect_wire_type(tag, WireType::LengthDelimited, wire_type)?;
    let len = decode_varint(buf)?;
    if len > buf.len() as u64 {
        return Err(Malformed::LengthOverrun {
            tag,
            len,
            remaining: buf.len(),
        });
    }
    let input: &'a [u8] = *buf;
    let (payload, rest) = input.split_at(len as usize);
    *buf = rest;
    Ok(payload)
}

// ---------------------------------------------------------------------------
// Field writers
// ---------------------------------------------------------------------------

pub(crate) fn put_varint<B: BufMut>(tag: u32, value: u64, buf: &mut B) {
    encode_key(tag, WireType::Varint, buf);
    encode_varint(value, buf);
}

/// Canonical form: only 0 or 1 is ever emitted.
pub(crate) fn put_bool<B: BufMut>(tag: u32, value: bool, buf: &mut B) {
    put_varint(tag, u64::from(value), buf);
}

pub(crate) fn put_int64<B: BufMut>(tag: u32, value: i64, buf: &mut B) {
    put_varint(tag, value as u64, buf);
}

pub(crate) fn put_fixed64<B: BufMut>(tag: u32, value: f64, buf: &mut B) {
    encode_key(tag, WireType::SixtyFourBit, buf);
    buf.put_u64_le(value.to_bits());
}

pub(crate) fn put_bytes<B: BufMut>(tag: u32, value: &[u8], buf: &mut B) {
    encode_key(tag, WireType::LengthDelimited, buf);
    encode_varint(value.len() as u64, buf);
    buf.put_slice(value);
}

pub(crate) fn put_message<M: WireRecord, B: BufMut>(tag: u32, msg: &M, buf: &mut B) {
    encode_key(tag, WireType::LengthDelimited, buf);
    encode_varint(msg.encoded_len() as u64, buf);
    msg.encode_raw(buf);
}

// ---------------------------------------------------------------------------
// Encoded sizes
// ---------------------------------------------------------------------------

pub(crate) fn varint_len(tag: u32, value: u64) -> usize {
    key_len(tag) + encoded_len_varint(value)
}

pub(crate) fn bool_len(tag: u32) -> usize {
    key_len(tag) + 1
}

pub(crate) fn int64_len(tag: u32, value: i64) -> usize {
    varint_len(tag, value as u64)
}

pub(crate) fn fixed64_len(tag: u32) -> usize {
    key_len(tag) + 8
}

pub(crate) fn bytes_len(tag: u32, len: usize) -> usize {
    key_len(tag) + encoded_len_varint(len as u64) + len
}

pub(crate) fn message_len<M: WireRecord>(tag: u32, msg: &M) -> usize {
    bytes_len(tag, msg.encoded_len())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_bytes_overrun() {
        let data = [0x05, b'a'];
        let mut buf = &data[..];
        let err = read_bytes(1, WireType::LengthDelimited, &mut buf).unwrap_err();
        assert_eq!(
            err,
            Malformed::LengthOverrun {
                tag: 1,
                len: 5,
                remaining: 1
            }
        );
    }

    #[test]
    fn test_read_bytes_advances() {
        let data = [0x02, b'h', b'i', 0xff];
        let mut buf = &data[..];
        let payload = read_bytes(9, WireType::LengthDelimited, &mut buf).unwrap();
        assert_eq!(payload, b"hi");
        assert_eq!(buf, &[0xff]);
    }

    #[test]
    fn test_read_fixed64_truncated() {
        let data = [1, 2, 3];
        let mut buf = &data[..];
        let err = read_fixed64(7, WireType::SixtyFourBit, &mut buf).unwrap_err();
        assert_eq!(
            err,
            Malformed::Truncated {
                tag: 7,
                needed: 8,
                remaining: 3
            }
        );
    }

    #[test]
    fn test_wrong_wire_type() {
        let data = [0x01];
        let mut buf = &data[..];
        let err = read_varint(3, WireType::LengthDelimited, &mut buf).unwrap_err();
        assert!(matches!(
            err,
            Malformed::UnexpectedWireType {
                tag: 3,
                expected: WireType::Varint,
                actual: WireType::LengthDelimited
            }
        ));
    }

    #[test]
    fn test_truncated_varint() {
        let data = [0x80];
        let mut buf = &data[..];
        assert!(matches!(
            read_varint(3, WireType::Varint, &mut buf),
            Err(Malformed::Decode(_))
        ));
    }

    #[test]
    fn test_bool_tolerance() {
        let data = [0x02];
        let mut buf = &data[..];
        assert!(read_bool(4, WireType::Varint, &mut buf).unwrap());
    }

    #[test]
    fn test_negative_int64_is_ten_bytes() {
        let mut buf = Vec::new();
        put_int64(3, -1, &mut buf);
        assert_eq!(buf.len(), 11);
        assert_eq!(buf.len(), int64_len(3, -1));

        let mut rd = &buf[1..];
        assert_eq!(read_int64(3, WireType::Varint, &mut rd).unwrap(), -1);
    }

    #[test]
    fn test_writer_lengths_match() {
        let mut buf = Vec::new();
        put_bytes(1, b"cpu", &mut buf);
        assert_eq!(buf, vec![0x0a, 0x03, b'c', b'p', b'u']);
        assert_eq!(bytes_len(1, 3), buf.len());

        buf.clear();
        put_fixed64(7, 1.5, &mut buf);
        assert_eq!(buf.len(), fixed64_len(7));
        assert_eq!(buf[0], 0x39);

        buf.clear();
        put_bool(10, true, &mut buf);
        assert_eq!(buf, vec![0x50, 0x01]);
        assert_eq!(bool_len(10), buf.len());
    }
}
