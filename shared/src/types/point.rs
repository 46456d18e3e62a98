//! Point records
//!
//! A point is one row of a query result stream: a series name, its encoded
//! tag set, a nanosecond timestamp and at most one value. `nil` is the
//! producer's statement that the value slot is empty, which is a different
//! thing from any single value field being absent on the wire.

use crate::protocol::error::WireError;
use crate::protocol::wire::{self, WireRecord};
use crate::types::auxiliary::Aux;
use crate::types::value::Value;
use crate::utils::time::nanos_to_datetime;
use bytes::BufMut;
use chrono::{DateTime, Utc};
use prost::encoding::WireType;

/// Field numbers. Reserved forever; never reuse one for another meaning.
mod field {
    pub const NAME: u32 = 1;
    pub const TAGS: u32 = 2;
    pub const TIME: u32 = 3;
    pub const NIL: u32 = 4;
    pub const AUX: u32 = 5;
    pub const AGGREGATED: u32 = 6;
    pub const FLOAT_VALUE: u32 = 7;
    pub const INTEGER_VALUE: u32 = 8;
    pub const STRING_VALUE: u32 = 9;
    pub const BOOLEAN_VALUE: u32 = 10;
}

/// One row of a query result stream.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Point {
    /// Series or measurement name (required)
    pub name: Option<Vec<u8>>,

    /// Opaque serialized tag set (required)
    pub tags: Option<Vec<u8>>,

    /// Timestamp in nanoseconds (required)
    pub time: Option<i64>,

    /// True when the value slot is empty (required)
    pub nil: Option<bool>,

    /// Auxiliary values, in producer order
    pub aux: Vec<Aux>,

    /// Number of inputs behind an aggregate; 0 or absent for raw points
    pub aggregated: Option<u32>,

    pub float_value: Option<f64>,
    pub integer_value: Option<i64>,
    pub string_value: Option<Vec<u8>>,
    pub boolean_value: Option<bool>,

    unknown_fields: Vec<u8>,
}

impl Point {
    /// Create a nil point with all required fields set.
    pub fn new(name: impl Into<Vec<u8>>, tags: impl Into<Vec<u8>>, time: i64) -> Self {
        Self {
            name: Some(name.into()),
            tags: Some(tags.into()),
            time: Some(time),
            nil: Some(true),
            ..Self::default()
        }
    }

    /// Builder form of `set_value`.
    pub fn with_value(mut self, value: impl Into<Value>) -> Self {
        self.set_value(Some(value.into()));
        self
    }

    pub fn with_aux(mut self, aux: Aux) -> Self {
        self.aux.push(aux);
        self
    }

    pub fn with_aggregated(mut self, count: u32) -> Self {
        self.aggregated = Some(count);
        self
    }

    pub fn name(&self) -> &[u8] {
        self.name.as_deref().unwrap_or_default()
    }

    pub fn tags(&self) -> &[u8] {
        self.tags.as_deref().unwrap_or_default()
    }

    pub fn time(&self) -> i64 {
        self.time.unwrap_or(0)
    }

    pub fn is_nil(&self) -> bool {
        self.nil.unwrap_or(false)
    }

    pub fn aux(&self) -> &[Aux] {
        &self.aux
    }

    pub fn aggregated(&self) -> u32 {
        self.aggregated.unwrap_or(0)
    }

    pub fn is_aggregated(&self) -> bool {
        self.aggregated() != 0
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

    /// Timestamp as a UTC datetime.
    pub fn datetime(&self) -> DateTime<Utc> {
        nanos_to_datetime(self.time())
    }

    /// The point's value, or `None` for a nil point.
    ///
    /// When a producer set more than one value field the first in tag order
    /// wins.
    pub fn value(&self) -> Option<Value> {
        if self.is_nil() {
            return None;
        }
        Value::from_slots(
            self.float_value,
            self.integer_value,
            self.string_value.as_deref(),
            self.boolean_value,
        )
    }

    /// Replace all value fields with `value` and set `nil` to match.
    pub fn set_value(&mut self, value: Option<Value>) {
        self.nil = Some(value.is_none());
        let (float, integer, string, boolean) = Value::into_slots(value);
        self.float_value = float;
        self.integer_value = integer;
        self.string_value = string;
        self.boolean_value = boolean;
    }
}

impl WireRecord for Point {
    const FULL_NAME: &'static str = "internal.Point";

    fn check_required(&self) -> Result<(), WireError> {
        let missing = if self.name.is_none() {
            Some("Name")
        } else if self.tags.is_none() {
            Some("Tags")
        } else if self.time.is_none() {
            Some("Time")
        } else if self.nil.is_none() {
            Some("Nil")
        } else {
            None
        };
        if let Some(field) = missing {
            return Err(WireError::missing("Point", field));
        }
        self.aux.iter().try_for_each(Aux::check_required)
    }

    fn encode_fields<B: BufMut>(&self, buf: &mut B) {
        if let Some(v) = &self.name {
            wire::put_bytes(field::NAME, v, buf);
        }
        if let Some(v) = &self.tags {
            wire::put_bytes(field::TAGS, v, buf);
        }
        if let Some(v) = self.time {
            wire::put_int64(field::TIME, v, buf);
        }
        if let Some(v) = self.nil {
            wire::put_bool(field::NIL, v, buf);
        }
        for aux in &self.aux {
            wire::put_message(field::AUX, aux, buf);
        }
        if let Some(v) = self.aggregated {
            wire::put_varint(field::AGGREGATED, u64::from(v), buf);
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
        let mut len = 0;
        if let Some(v) = &self.name {
            len += wire::bytes_len(field::NAME, v.len());
        }
        if let Some(v) = &self.tags {
            len += wire::bytes_len(field::TAGS, v.len());
        }
        if let Some(v) = self.time {
            len += wire::int64_len(field::TIME, v);
        }
        if self.nil.is_some() {
            len += wire::bool_len(field::NIL);
        }
        len += self
            .aux
            .iter()
            .map(|aux| wire::message_len(field::AUX, aux))
            .sum::<usize>();
        if let Some(v) = self.aggregated {
            len += wire::varint_len(field::AGGREGATED, u64::from(v));
        }
        if self.float_value.is_some() {
            len += wire::fixed64_len(field::FLOAT_VALUE);
        }
        if let Some(v) = self.integer_value {
            len += wire::int64_len(field::INTEGER_VALUE, v);
        }
        if let Some(v) = &self.string_value {
            len += wire::bytes_len(field::STRING_VALUE, v.len());
        }
        if self.boolean_value.is_some() {
            len += wire::bool_len(field::BOOLEAN_VALUE);
        }
        len
    }

    fn merge_field(
        &mut self,
        tag: u32,
        wire_type: WireType,
        buf: &mut &[u8],
    ) -> Result<bool, WireError> {
        match tag {
            field::NAME => {
                self.name = Some(wire::read_bytes(tag, wire_type, buf)?.to_vec());
            }
            field::TAGS => {
                self.tags = Some(wire::read_bytes(tag, wire_type, buf)?.to_vec());
            }
            field::TIME => {
                self.time = Some(wire::read_int64(tag, wire_type, buf)?);
            }
            field::NIL => {
                self.nil = Some(wire::read_bool(tag, wire_type, buf)?);
            }
            field::AUX => {
                let payload = wire::read_bytes(tag, wire_type, buf)?;
                self.aux.push(Aux::decode(payload)?);
            }
            field::AGGREGATED => {
                // uint32 on the wire; keep the low 32 bits of an overlong varint
                self.aggregated = Some(wire::read_varint(tag, wire_type, buf)? as u32);
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::error::Malformed;

    fn cpu_point() -> Point {
        Point::new("cpu", "host=a", 1_700_000_000_000_000_000)
    }

    #[test]
    fn test_new_point_is_nil() {
        let p = cpu_point();
        assert!(p.is_nil());
        assert_eq!(p.value(), None);
        assert_eq!(p.name(), b"cpu");
        assert_eq!(p.tags(), b"host=a");
        assert!(!p.is_aggregated());
    }

    #[test]
    fn test_set_value_tracks_nil() {
        let mut p = cpu_point().with_value(42i64);
        assert_eq!(p.nil, Some(false));
        assert_eq!(p.value(), Some(Value::Integer(42)));

        p.set_value(None);
        assert_eq!(p.nil, Some(true));
        assert_eq!(p.integer_value, None);
    }

    #[test]
    fn test_nil_hides_stray_value() {
        let mut p = cpu_point();
        p.float_value = Some(3.0);
        assert_eq!(p.value(), None);
        assert_eq!(p.float_value(), 3.0);
    }

    #[test]
    fn test_encoded_len_matches_output() {
        let p = cpu_point()
            .with_value("busy")
            .with_aggregated(300)
            .with_aux(Aux::new(1).with_value(-5i64))
            .with_aux(Aux::new(3).with_value(0.25));
        let bytes = p.to_bytes().unwrap();
        assert_eq!(p.encoded_len(), bytes.len());
        assert_eq!(Point::decode(&bytes).unwrap(), p);
    }

    #[test]
    fn test_required_fields_checked_in_order() {
        let mut p = Point::default();
        assert_eq!(p.to_bytes().unwrap_err().missing_field(), Some("Name"));
        p.name = Some(b"m".to_vec());
        assert_eq!(p.to_bytes().unwrap_err().missing_field(), Some("Tags"));
        p.tags = Some(Vec::new());
        assert_eq!(p.to_bytes().unwrap_err().missing_field(), Some("Time"));
        p.time = Some(0);
        assert_eq!(p.to_bytes().unwrap_err().missing_field(), Some("Nil"));
        p.nil = Some(true);
        assert!(p.to_bytes().is_ok());
    }

    #[test]
    fn test_encode_rejects_aux_without_data_type() {
        let p = cpu_point().with_aux(Aux::default());
        let mut buf = Vec::new();
        let err = p.encode(&mut buf).unwrap_err();
        assert_eq!(
            err,
            WireError::MissingRequiredField {
                record: "Aux",
                field: "DataType"
            }
        );
        assert!(buf.is_empty());
    }

    #[test]
    fn test_encode_into_short_slice() {
        let p = Point::new("cpu", "", 0).with_value(1.5);
        let mut storage = [0u8; 4];
        let mut slice = &mut storage[..];
        let err = p.encode(&mut slice).unwrap_err();
        assert_eq!(
            err,
            WireError::InsufficientCapacity {
                required: p.encoded_len(),
                remaining: 4
            }
        );
        assert_eq!(storage, [0u8; 4]);
    }

    #[test]
    fn test_encode_into_exact_slice() {
        let p = Point::new("cpu", "", 0).with_value(1.5);
        let mut storage = vec![0u8; p.encoded_len()];
        let mut slice = &mut storage[..];
        p.encode(&mut slice).unwrap();
        assert_eq!(storage, p.to_bytes().unwrap());
    }

    #[test]
    fn test_merge_checks_nested_aux() {
        // Aux{IntegerValue=7}, no DataType
        let mut p = Point::default();
        let err = p.merge(&[0x2a, 0x02, 0x18, 0x07]).unwrap_err();
        assert_eq!(err.missing_field(), Some("DataType"));
    }

    #[test]
    fn test_aggregated_keeps_low_bits() {
        // Aggregated = 2^32 + 3
        let mut p = Point::default();
        p.merge(&[0x30, 0x83, 0x80, 0x80, 0x80, 0x10]).unwrap();
        assert_eq!(p.aggregated, Some(3));
    }

    #[test]
    fn test_known_tag_with_wrong_wire_type() {
        // Name as a varint
        let err = Point::decode(&[0x08, 0x01]).unwrap_err();
        assert!(matches!(
            err,
            WireError::MalformedInput(Malformed::UnexpectedWireType { tag: 1, .. })
        ));
    }

    #[test]
    fn test_merge_overwrites_scalars_and_appends_aux() {
        let first = cpu_point()
            .with_value(1.0)
            .with_aux(Aux::new(1).with_value(1i64));
        let second = Point::new("mem", "", 5).with_aux(Aux::new(2).with_value(2i64));

        let mut merged = Point::decode(&first.to_bytes().unwrap()).unwrap();
        merged.merge(&second.to_bytes().unwrap()).unwrap();

        assert_eq!(merged.name(), b"mem");
        assert_eq!(merged.time(), 5);
        assert!(merged.is_nil());
        // value fields the second point did not carry survive the merge
        assert_eq!(merged.float_value, Some(1.0));
        assert_eq!(
            merged.aux().iter().map(Aux::data_type).collect::<Vec<_>>(),
            vec![1, 2]
        );
    }

    #[test]
    fn test_clear() {
        // Name="x", Tags="", Time=0, Nil=false, unknown tag 15
        let input = [0x0a, 0x01, b'x', 0x12, 0x00, 0x18, 0x00, 0x20, 0x00, 0x78, 0x01];
        let mut p = Point::decode(&input).unwrap();
        assert!(!p.unknown_fields().is_empty());
        p.clear();
        assert_eq!(p, Point::default());
    }

    #[test]
    fn test_datetime() {
        let p = Point::new("cpu", "", 1_500_000_000);
        assert_eq!(p.datetime().timestamp(), 1);
        assert_eq!(p.datetime().timestamp_subsec_nanos(), 500_000_000);
    }
}
