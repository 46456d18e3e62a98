//! Codec error types.

use prost::encoding::WireType;

/// Errors returned by the record codec.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum WireError {
    /// A required field was absent on encode or decode.
    #[error("missing required field {record}.{field}")]
    MissingRequiredField {
        /// Record type that lacks the field (`Point` or `Aux`).
        record: &'static str,
        /// Field name as listed in the schema.
        field: &'static str,
    },

    /// The input bytes do not form a valid record.
    #[error("malformed input: {0}")]
    MalformedInput(#[from] Malformed),

    /// Input rejected by `CodecConfig::max_message_size` before parsing.
    #[error("message too large: {size} bytes exceeds limit of {limit}")]
    MessageTooLarge { size: usize, limit: usize },

    /// The output buffer cannot hold the encoded record.
    #[error("insufficient buffer capacity: {required} bytes required, {remaining} remaining")]
    InsufficientCapacity { required: usize, remaining: usize },
}

impl WireError {
    pub(crate) fn missing(record: &'static str, field: &'static str) -> Self {
        Self::MissingRequiredField { record, field }
    }

    /// Name of the missing field, if this is a `MissingRequiredField` error.
    pub fn missing_field(&self) -> Option<&'static str> {
        match self {
            Self::MissingRequiredField { field, .. } => Some(field),
            _ => None,
        }
    }
}

/// Structural decode failures.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum Malformed {
    /// Truncated or overlong varint, or an invalid field key.
    #[error("{0}")]
    Decode(#[from] prost::DecodeError),

    /// Length prefix points past the end of the input.
    #[error("field {tag}: length {len} exceeds remaining {remaining} bytes")]
    LengthOverrun { tag: u32, len: u64, remaining: usize },

    /// Fixed-width payload cut short.
    #[error("field {tag}: needs {needed} bytes, {remaining} remaining")]
    Truncated {
        tag: u32,
        needed: usize,
        remaining: usize,
    },

    /// A known tag arrived with a wire type other than the schema's.
    #[error("field {tag}: expected {expected:?} wire type, got {actual:?}")]
    UnexpectedWireType {
        tag: u32,
        expected: WireType,
        actual: WireType,
    },
}
