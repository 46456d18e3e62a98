//! Auxiliary values attached to a point.

use crate::protocol::error::WireError;
use crate::protocol::wire::{self, WireRecord};
use crate::types::value::Value;
use bytes::BufMut;
use prost::encoding::WireType;

mod field {
    pub const DATA_TYPE: u32 = 1;
    pub const FLOAT_VALUE: u32 = 2;
    pub const INTEGER_VALUE: u32 = 3;
    pub const STRING_VALUE: u32 = 4;
    pub const BOOLEAN_VALUE: u32 = 5;
}

/// Side-channel typed value.
///
/// `data_type` selects which value field is authoritative. The code is
/// owned by the query engine and passed through untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Aux {
    /// Type discriminator (required)
    pub data_type: Option<i32>,
    pub float_value: Option<f64>,
    pub integer_value: Option<i64>,
    /// Raw bytes, no text encoding enforced
    pub string_value: Option<Vec<u8>>,
    pub boolean_value: Option<bool>,
    unknown_fields: Vec<u8>,
}

impl Aux {
    /// Create an aux with the given discriminator and no value.
    pub fn new(data_type: i32) -> Self {
        Self {
            data_type: Some(data_type),
            ..Self::default()
        }
    }

    /// Builder form of `set_value`.
    pub fn with_value(mut self, value: impl Into<Value>) -> Self {
        self.set_value(Some(value.into()));
        self
    }

    pub fn data_type(&self) -> i32 {
        self.data_type.unwrap_or(0)
    }

    pub fn float_value(&self) -> f64 {
        self.float_value.unwrap_or(0.0)
    }

    pub fn integer_value(&self) -> i64 {
        self.integer_value.unwrap_or(0)
    }

    pub fn string_value(&self) -> &[u8] {
        self.string_value.as_deref().unwrap_or_default()
    }

    pub fn boolean_value(&self) -> bool {
        self.boolean_value.unwrap_or(false)
    }

    /// First present value field, in tag order.
    pub fn value(&self) -> Option<Value> {
        Value::from_slots(
            self.float_value,
            self.integer_value,
            self.string_value.as_deref(),
            self.boolean_value,
        )
    }

    /// Replace all value fields with `value`.
    pub fn set_value(&mut self, value: Option<Value>) {
        let (float, integer, string, boolean) = Value::into_slots(value);
        self.float_value = float;
        self.integer_value = integer;
        self.string_value = string;
        self.boolean_value = boolean;
    }
}

impl WireRecord for Aux {
    const FULL_NAME: &'static str = "internal.Aux";

    fn check_required(&self) -> Result<(), WireError> {
        if self.data_type.is_none() {
            return Err(WireError::missing("Aux", "DataType"));
        }
        Ok(())
    }

    fn encode_fields<B: BufMut>(&self, buf: &mut B) {
        if let Some(v) = self.data_type {
            wire::put_int64(field::DATA_TYPE, i64::from(v), buf);
        }
        if let Some(v) = self.float_value {
            wire::put_fixed64(field::FLOAT_VALUE, v, buf);
        }
        if let Some(v) = self.integer_value {
            wire::put_int64(field::INTEGER_VALUE, v, buf);
        }
        if let Some(v) = &self.string_value {
            wire::put_bytes(field::STRING_VALUE, v, buf);
        }
        if let Some(v) = self.boolean_value {
            wire::put_bool(field::BOOLEAN_VALUE, v, buf);
        }
    }

    fn fields_len(&self) -> usize {
        self.data_type
            .map_or(0, |v| wire::int64_len(field::DATA_TYPE, i64::from(v)))
            + self.float_value.map_or(0, |_| wire::fixed64_len(field::FLOAT_VALUE))
            + self
                .integer_value
                .map_or(0, |v| wire::int64_len(field::INTEGER_VALUE, v))
            + self
                .string_value
                .as_ref()
                .map_or(0, |v| wire::bytes_len(field::STRING_VALUE, v.len()))
            + self.boolean_value.map_or(0, |_| wire::bool_len(field::BOOLEAN_VALUE))
    }

    fn merge_field(
        &mut self,
        tag: u32,
        wire_type: WireType,
        buf: &mut &[u8],
    ) -> Result<bool, WireError> {
        match tag {
            // int32 travels sign-extended; keep the low 32 bits
            field::DATA_TYPE => {
                self.data_type = Some(wire::read_varint(tag, wire_type, buf)? as i32);
            }
            field::FLOAT_VALUE => {
                self.float_value = Some(wire::read_fixed64(tag, wire_type, buf)?);
            }
            field::INTEGER_VALUE => {
                self.integer_value = Some(wire::read_int64(tag, wire_type, buf)?);
            }
            field::STRING_VALUE => {
                self.string_value = Some(wire::read_bytes(tag, wire_type, buf)?.to_vec());
            }
            field::BOOLEAN_VALUE => {
                self.boolean_value = Some(wire::read_bool(tag, wire_type, buf)?);
            }
            _ => return Ok(false),
        }
        Ok(true)
    }

    fn unknown_fields(&self) -> &[u8] {
        &self.unknown_fields
    }

    fn push_unknown(&mut self, raw: &[u8]) {
        self.unknown_fields.extend_from_slice(raw);
    }
}
